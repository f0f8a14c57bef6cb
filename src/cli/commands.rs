//! Command parsing and execution for `series_access_cli`.

use std::sync::Arc;

use serde_json::json;

use super::{json_output_requested, policy_table, role_table, template_table};
use crate::acl::{self, template, TemplateFlags};
use crate::client::AdminApi;
use crate::config::{AdminConfig, AdminConfigOverride};
use crate::error::{AppError, AppResult};
use crate::notify::{NotificationCenter, Notifications};
use crate::series::{SaveOutcome, SeriesAccessEditor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Templates,
    Show { series: String },
    Apply { series: String, template: String, flags: TemplateFlags, override_events: bool },
    Roles { search: Option<String> },
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub command: Command,
    /// Connection flags given on the command line; these win over file and env.
    pub overrides: AdminConfigOverride,
}

pub fn usage(program: &str) -> String {
    format!(
        "Usage:\n  {program} [flags] templates\n  {program} [flags] show <series-id>\n  {program} [flags] apply <series-id> <template-key> [--download] [--annotate] [--override]\n  {program} [flags] roles [search]\n\nFlags:\n  --url <url>              Admin node base URL (env SERIES_ACCESS_URL)\n  --user <u>               Username (env SERIES_ACCESS_USER)\n  --password <p>           Password (env SERIES_ACCESS_PASSWORD)\n  --timeout-ms <n>         Request timeout in milliseconds\n  -h, --help               Show this help\n\nApply flags:\n  --download               Grant cast-download to the template role\n  --annotate               Grant cast-annotate to the template role\n  --override               Also rewrite the ACLs of the series' events\n\nOutput:\n  Tables by default; set SERIES_ACCESS_OUTPUT=json for JSON."
    )
}

/// Parse arguments (without the program name).
pub fn parse(args: &[String]) -> AppResult<Invocation> {
    let mut overrides = AdminConfigOverride::default();
    let mut positional: Vec<String> = Vec::new();
    let mut flags = TemplateFlags::default();
    let mut override_events = false;

    let mut i = 0;
    while i < args.len() {
        let value = |i: usize| -> AppResult<String> {
            args.get(i + 1)
                .cloned()
                .ok_or_else(|| AppError::user("missing_value", format!("{} requires a value", args[i])))
        };
        match args[i].as_str() {
            "--url" => { overrides.base_url = Some(value(i)?); i += 2; continue; }
            "--user" => { overrides.user = Some(value(i)?); i += 2; continue; }
            "--password" => { overrides.password = Some(value(i)?); i += 2; continue; }
            "--timeout-ms" => {
                let v = value(i)?;
                let ms = v.parse::<u64>().map_err(|e| AppError::user("invalid_value", format!("--timeout-ms {}: {}", v, e)))?;
                overrides.request_timeout_ms = Some(ms);
                i += 2; continue;
            }
            "--download" => { flags.allow_download = true; i += 1; continue; }
            "--annotate" => { flags.allow_annotate = true; i += 1; continue; }
            "--override" => { override_events = true; i += 1; continue; }
            "-h" | "--help" => return Ok(Invocation { command: Command::Help, overrides }),
            unk if unk.starts_with("--") => {
                return Err(AppError::user("unknown_flag", format!("Unrecognized argument: {}", unk)));
            }
            other => { positional.push(other.to_string()); i += 1; }
        }
    }

    let mut rest = positional.into_iter();
    let command = match rest.next().as_deref() {
        None => Command::Help,
        Some("templates") => Command::Templates,
        Some("show") => Command::Show { series: required(rest.next(), "show needs a series id")? },
        Some("apply") => Command::Apply {
            series: required(rest.next(), "apply needs a series id")?,
            template: required(rest.next(), "apply needs a template key")?,
            flags,
            override_events,
        },
        Some("roles") => Command::Roles { search: rest.next() },
        Some(other) => return Err(AppError::user("unknown_command", format!("unknown command: {}", other))),
    };
    if let Some(extra) = rest.next() {
        return Err(AppError::user("unexpected_argument", format!("unexpected argument: {}", extra)));
    }
    Ok(Invocation { command, overrides })
}

fn required(v: Option<String>, msg: &str) -> AppResult<String> {
    v.ok_or_else(|| AppError::user("missing_argument", msg))
}

/// Execute `cmd` and return what should be printed.
pub async fn run<A: AdminApi>(api: Arc<A>, cfg: &AdminConfig, cmd: &Command) -> AppResult<String> {
    let json = json_output_requested();
    match cmd {
        Command::Help => Ok(usage("series_access_cli")),
        Command::Templates => {
            let org = api.current_user().await.ok().and_then(|u| u.aai_org().map(str::to_string));
            if json {
                let list: Vec<_> = template::catalog()
                    .iter()
                    .map(|t| json!({"id": t.id, "key": t.key, "role": t.role_for(org.as_deref()), "name": t.name}))
                    .collect();
                return Ok(serde_json::to_string_pretty(&list)?);
            }
            Ok(template_table(template::catalog(), org.as_deref()))
        }
        Command::Show { series } => {
            let notes: Arc<dyn Notifications> = Arc::new(NotificationCenter::new());
            let mut editor = SeriesAccessEditor::new(api, notes, series.as_str(), cfg.role_page_size);
            editor.load().await?;
            let kind = match editor.selected_template() {
                Some(t) if !editor.is_custom_template() => t.key,
                _ => template::custom().key,
            };
            if json {
                return Ok(serde_json::to_string_pretty(&json!({
                    "series": series,
                    "template": kind,
                    "flags": {"download": editor.flags().allow_download, "annotate": editor.flags().allow_annotate},
                    "locked": editor.is_locked(),
                    "policies": editor.policies(),
                }))?);
            }
            let mut out = format!(
                "series: {}\ntemplate: {} (download={}, annotate={}){}\n",
                series,
                kind,
                editor.flags().allow_download,
                editor.flags().allow_annotate,
                if editor.is_locked() { " [locked]" } else { "" }
            );
            out.push_str(&policy_table(editor.policies()));
            Ok(out)
        }
        Command::Apply { series, template: key, flags, override_events } => {
            let tpl = template::by_key(key)
                .ok_or_else(|| AppError::user("unknown_template", format!("no ACL template named {}", key)))?;
            let notes: Arc<dyn Notifications> = Arc::new(NotificationCenter::new());
            let mut editor = SeriesAccessEditor::new(api, notes, series.as_str(), cfg.role_page_size);
            editor.load().await?;
            if editor.is_locked() {
                return Err(AppError::conflict("series_locked", format!("access of series {} is locked", series)));
            }
            editor.set_flags(*flags);
            match editor.change_base_acl_switch_with(tpl.id, *override_events).await? {
                SaveOutcome::Rejected(v) => Err(AppError::user(
                    "invalid_acl",
                    format!("ACL not saved: rules_valid={} has_rights={}", v.rules_valid, v.has_rights),
                )),
                _ => {
                    let entries = acl::to_aces(editor.policies()).len();
                    Ok(format!("applied template {} to series {} ({} entries)\n{}", tpl.key, series, entries, policy_table(editor.policies())))
                }
            }
        }
        Command::Roles { search } => {
            let dir = crate::client::RoleDirectory::new(cfg.role_page_size, crate::client::roles::Paging::Advance);
            dir.more(&*api, search.as_deref()).await?;
            if json {
                return Ok(serde_json::to_string_pretty(&dir.snapshot())?);
            }
            Ok(role_table(&dir.snapshot()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_apply_with_flags() {
        let inv = parse(&args(&["--url", "https://admin.example.org", "apply", "s1", "public", "--download", "--override"])).unwrap();
        assert_eq!(inv.overrides.base_url.as_deref(), Some("https://admin.example.org"));
        assert_eq!(
            inv.command,
            Command::Apply {
                series: "s1".into(),
                template: "public".into(),
                flags: TemplateFlags { allow_download: true, allow_annotate: false },
                override_events: true,
            }
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse(&args(&["show"])).is_err());
        assert!(parse(&args(&["--user"])).is_err());
        assert!(parse(&args(&["frobnicate"])).is_err());
        assert!(parse(&args(&["--bogus", "templates"])).is_err());
        assert!(parse(&args(&["templates", "extra"])).is_err());
    }

    #[test]
    fn empty_and_help_show_usage() {
        assert_eq!(parse(&[]).unwrap().command, Command::Help);
        assert_eq!(parse(&args(&["roles", "--help"])).unwrap().command, Command::Help);
        assert_eq!(parse(&args(&["roles", "ROLE_A"])).unwrap().command, Command::Roles { search: Some("ROLE_A".into()) });
    }
}
