//! Built-in ACL templates offered when creating or editing a series.
//!
//! The catalog is seed data: it is never mutated at runtime. The organization
//! template carries a `<org-domain>` placeholder that is resolved against the
//! caller's AAI home organization when a template is expanded.

use once_cell::sync::Lazy;
use serde::Serialize;

use super::model::AccessControlEntry;
use super::{actions, roles};

pub const ORG_DOMAIN_PLACEHOLDER: &str = "<org-domain>";
pub const CUSTOM_TEMPLATE_ID: u32 = 7;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Template {
    pub id: u32,
    /// Stable key, also used by the `switch.acl.default_template` org property.
    pub key: &'static str,
    pub name: String,
    pub description: String,
    /// Role the template grants to; `None` for the custom sentinel.
    pub role: Option<&'static str>,
    pub acls: Vec<AccessControlEntry>,
}

/// Optional extras layered on top of a template's own entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemplateFlags {
    pub allow_download: bool,
    pub allow_annotate: bool,
}

impl Template {
    fn builtin(id: u32, key: &'static str, role: &'static str, entries: &[(&str, bool)]) -> Self {
        let upper = key.to_ascii_uppercase();
        Self {
            id,
            key,
            name: format!("SWITCHCAST.ACL.TEMPLATE.{}.NAME", upper),
            description: format!("SWITCHCAST.ACL.TEMPLATE.{}.DESCRIPTION", upper),
            role: Some(role),
            acls: entries.iter().map(|(a, allow)| AccessControlEntry::new(role, *a, *allow)).collect(),
        }
    }

    pub fn is_custom(&self) -> bool {
        self.id == CUSTOM_TEMPLATE_ID
    }

    /// Template role with the organization placeholder resolved.
    pub fn role_for(&self, org: Option<&str>) -> Option<String> {
        self.role.map(|r| substitute_org(r, org))
    }

    /// Concrete entries for this template: its own entries, then the download
    /// and annotate grants when requested, all with the org placeholder resolved.
    pub fn expand(&self, org: Option<&str>, flags: TemplateFlags) -> Vec<AccessControlEntry> {
        let mut out: Vec<AccessControlEntry> = self.acls.clone();
        if let Some(role) = self.role {
            if flags.allow_download {
                out.push(AccessControlEntry::allow(role, actions::CAST_DOWNLOAD));
            }
            if flags.allow_annotate {
                out.push(AccessControlEntry::allow(role, actions::CAST_ANNOTATE));
            }
        }
        for ace in out.iter_mut() {
            ace.role = substitute_org(&ace.role, org);
        }
        out
    }
}

/// Replace the first `<org-domain>` placeholder. Without an organization the
/// placeholder is left in place so the unresolved role is visible downstream.
pub fn substitute_org(role: &str, org: Option<&str>) -> String {
    match org {
        Some(o) if role.contains(ORG_DOMAIN_PLACEHOLDER) => role.replacen(ORG_DOMAIN_PLACEHOLDER, o, 1),
        _ => role.to_string(),
    }
}

static CATALOG: Lazy<Vec<Template>> = Lazy::new(|| {
    let listed = [(actions::CAST_VIEW, true), (actions::CAST_DISCOVER, true), (actions::READ, false), (actions::WRITE, false)];
    vec![
        Template::builtin(1, "public", roles::ANONYMOUS, &listed),
        Template::builtin(2, "federation", roles::FEDERATION_MEMBER, &listed),
        Template::builtin(3, "organization", "ROLE_AAI_ORG_<org-domain>_MEMBER", &listed),
        Template::builtin(4, "private", roles::PRIVATE_MEMBER, &listed),
        Template::builtin(5, "lms", roles::EXTERNAL_APPLICATION, &[(actions::CAST_VIEW, true), (actions::READ, true), (actions::WRITE, true)]),
        Template::builtin(
            6,
            "hidden",
            roles::ANONYMOUS,
            &[(actions::CAST_VIEW, true), (actions::CAST_DISCOVER, false), (actions::READ, false), (actions::WRITE, false)],
        ),
    ]
});

static CUSTOM: Lazy<Template> = Lazy::new(|| Template {
    id: CUSTOM_TEMPLATE_ID,
    key: "custom",
    name: "SWITCHCAST.ACL.TEMPLATE.CUSTOM.NAME".to_string(),
    description: "SWITCHCAST.ACL.TEMPLATE.CUSTOM.DESCRIPTION".to_string(),
    role: None,
    acls: Vec::new(),
});

/// The six selectable templates, in classification priority order.
pub fn catalog() -> &'static [Template] {
    &CATALOG
}

pub fn custom() -> &'static Template {
    &CUSTOM
}

pub fn by_id(id: u32) -> Option<&'static Template> {
    if id == CUSTOM_TEMPLATE_ID {
        return Some(custom());
    }
    catalog().iter().find(|t| t.id == id)
}

pub fn by_key(key: &str) -> Option<&'static Template> {
    if key == custom().key {
        return Some(custom());
    }
    catalog().iter().find(|t| t.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_shape() {
        let ids: Vec<u32> = catalog().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(by_key("lms").unwrap().acls.len(), 3);
        assert_eq!(by_key("public").unwrap().name, "SWITCHCAST.ACL.TEMPLATE.PUBLIC.NAME");
        assert!(by_id(7).unwrap().is_custom());
        assert!(by_id(7).unwrap().acls.is_empty());
        assert!(by_id(8).is_none());
        assert!(by_key("nope").is_none());
    }

    #[test]
    fn organization_role_is_resolved_on_expand() {
        let t = by_key("organization").unwrap();
        assert_eq!(t.role_for(Some("ethz.ch")).as_deref(), Some("ROLE_AAI_ORG_ethz.ch_MEMBER"));
        let aces = t.expand(Some("ethz.ch"), TemplateFlags::default());
        assert!(aces.iter().all(|a| a.role == "ROLE_AAI_ORG_ethz.ch_MEMBER"));
        // without an organization the placeholder stays visible
        assert!(t.expand(None, TemplateFlags::default())[0].role.contains(ORG_DOMAIN_PLACEHOLDER));
    }

    #[test]
    fn flags_append_download_and_annotate() {
        let t = by_key("hidden").unwrap();
        let aces = t.expand(None, TemplateFlags { allow_download: true, allow_annotate: true });
        assert_eq!(aces.len(), 6);
        assert_eq!(aces[4], AccessControlEntry::allow(roles::ANONYMOUS, actions::CAST_DOWNLOAD));
        assert_eq!(aces[5], AccessControlEntry::allow(roles::ANONYMOUS, actions::CAST_ANNOTATE));
        assert!(custom().expand(None, TemplateFlags { allow_download: true, allow_annotate: false }).is_empty());
    }
}
