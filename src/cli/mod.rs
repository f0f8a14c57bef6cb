use std::collections::BTreeMap;

use crate::acl::{Policy, Template};

pub mod commands;

pub const ENV_OUTPUT: &str = "SERIES_ACCESS_OUTPUT";

/// Honor env override to force JSON output.
pub fn json_output_requested() -> bool {
    std::env::var(ENV_OUTPUT).map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false)
}

// Render rows as an ASCII table with a one-line footer.
pub fn render_table(cols: &[&str], rows: &[Vec<String>]) -> String {
    let max_col_width: usize = 60; // cap to keep output readable
    let mut widths: Vec<usize> = cols.iter().map(|s| s.chars().count().min(max_col_width)).collect();
    for r in rows {
        for (i, cell) in r.iter().enumerate().take(cols.len()) {
            let w = display_len(cell);
            if w > widths[i] { widths[i] = w.min(max_col_width); }
        }
    }

    let header: Vec<String> = cols.iter().map(|c| c.to_string()).collect();
    let sep = build_separator(&widths);
    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&build_row(&header, &widths));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for r in rows {
        out.push_str(&build_row(r, &widths));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&format!("rows: {}\n", rows.len()));
    out
}

fn check(flag: bool) -> String {
    if flag { "x".to_string() } else { String::new() }
}

pub fn policy_table(policies: &[Policy]) -> String {
    let rows: Vec<Vec<String>> = policies
        .iter()
        .map(|p| {
            vec![
                p.role_str().unwrap_or("<unset>").to_string(),
                check(p.read),
                check(p.write),
                p.actions.value.join(", "),
            ]
        })
        .collect();
    render_table(&["role", "read", "write", "actions"], &rows)
}

pub fn template_table(templates: &[Template], org: Option<&str>) -> String {
    let rows: Vec<Vec<String>> = templates
        .iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                t.key.to_string(),
                t.role_for(org).unwrap_or_default(),
                t.name.clone(),
            ]
        })
        .collect();
    render_table(&["id", "key", "role", "name"], &rows)
}

pub fn role_table(roles: &BTreeMap<String, String>) -> String {
    let rows: Vec<Vec<String>> = roles.iter().map(|(name, label)| vec![name.clone(), label.clone()]).collect();
    render_table(&["role", "label"], &rows)
}

fn display_len(s: &str) -> usize { s.chars().count() }

fn build_separator(widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('+');
    for w in widths {
        s.push_str(&"-".repeat(*w + 2));
        s.push('+');
    }
    s
}

fn build_row(cells: &[String], widths: &[usize]) -> String {
    let mut s = String::new();
    s.push('|');
    for (i, w) in widths.iter().enumerate() {
        let cell = cells.get(i).cloned().unwrap_or_default();
        let (text, align_right) = (truncate(&cell, *w), is_numeric_like(&cell));
        let pad = w.saturating_sub(display_len(&text));
        s.push(' ');
        if align_right {
            s.push_str(&" ".repeat(pad));
            s.push_str(&text);
        } else {
            s.push_str(&text);
            s.push_str(&" ".repeat(pad));
        }
        s.push(' ');
        s.push('|');
    }
    s
}

fn truncate(s: &str, max: usize) -> String {
    let len = s.chars().count();
    if len <= max { return s.to_string(); }
    if max <= 1 { return "…".to_string(); }
    s.chars().take(max - 1).collect::<String>() + "…"
}

fn is_numeric_like(s: &str) -> bool {
    let st = s.trim();
    !st.is_empty() && st.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::policy::SERIES_ACTIONS_FIELD;

    #[test]
    fn table_pads_and_counts_rows() {
        let out = render_table(&["id", "key"], &[vec!["1".into(), "public".into()], vec!["12".into(), "x".into()]]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "+----+--------+");
        assert_eq!(lines[1], "| id | key    |");
        assert_eq!(lines[3], "|  1 | public |");
        assert_eq!(lines.last().copied(), Some("rows: 2"));
    }

    #[test]
    fn long_cells_are_truncated() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
    }

    #[test]
    fn policy_rows_mark_flags() {
        let mut p = Policy::read_write("ROLE_A", SERIES_ACTIONS_FIELD);
        p.push_action("cast-view");
        let out = policy_table(&[p, Policy::new(None, SERIES_ACTIONS_FIELD)]);
        assert!(out.contains("| ROLE_A  | x    | x     | cast-view |"));
        assert!(out.contains("<unset>"));
    }
}
