//! Typed views over the organization properties that steer ACL editing.

use serde::Serialize;

use super::principal::Organization;
use crate::acl::template::{self, Template, TemplateFlags};

pub const AAI_ORG: &str = "aai.org";
pub const DEFAULT_TEMPLATE: &str = "switch.acl.default_template";
pub const DEFAULT_DOWNLOAD: &str = "switch.acl.default_download";
pub const DEFAULT_ANNOTATE: &str = "switch.acl.default_annotate";
pub const EVENT_UPDATE_MODE: &str = "admin.series.acl.event.update.mode";

/// Whether saving a series ACL also rewrites the ACLs of its events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    Always,
    Never,
    #[default]
    Optional,
}

impl UpdateMode {
    /// Unknown or missing values fall back to `optional`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("always") => UpdateMode::Always,
            Some("never") => UpdateMode::Never,
            _ => UpdateMode::Optional,
        }
    }

    pub fn from_org(org: &Organization) -> Self {
        Self::parse(org.property(EVENT_UPDATE_MODE))
    }

    /// Effective override flag for a save.
    pub fn override_for(self, requested: bool) -> bool {
        requested || self == UpdateMode::Always
    }
}

/// Organization defaults for the new-series wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclDefaults {
    pub template: Option<&'static Template>,
    pub flags: TemplateFlags,
}

impl AclDefaults {
    pub fn from_org(org: &Organization) -> Self {
        Self {
            template: org.property(DEFAULT_TEMPLATE).and_then(template::by_key),
            flags: TemplateFlags {
                allow_download: org.property(DEFAULT_DOWNLOAD) == Some("true"),
                allow_annotate: org.property(DEFAULT_ANNOTATE) == Some("true"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org(props: &[(&str, &str)]) -> Organization {
        Organization {
            id: "mh_default_org".into(),
            name: None,
            properties: props.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }
    }

    #[test]
    fn update_mode_defaults_to_optional() {
        assert_eq!(UpdateMode::from_org(&org(&[])), UpdateMode::Optional);
        assert_eq!(UpdateMode::from_org(&org(&[(EVENT_UPDATE_MODE, "sometimes")])), UpdateMode::Optional);
        assert_eq!(UpdateMode::from_org(&org(&[(EVENT_UPDATE_MODE, "always")])), UpdateMode::Always);
        assert_eq!(UpdateMode::parse(Some("never")), UpdateMode::Never);
    }

    #[test]
    fn always_forces_override() {
        assert!(UpdateMode::Always.override_for(false));
        assert!(!UpdateMode::Optional.override_for(false));
        assert!(UpdateMode::Never.override_for(true));
    }

    #[test]
    fn defaults_read_template_and_flags() {
        let d = AclDefaults::from_org(&org(&[
            (DEFAULT_TEMPLATE, "federation"),
            (DEFAULT_DOWNLOAD, "true"),
            (DEFAULT_ANNOTATE, "TRUE"),
        ]));
        assert_eq!(d.template.map(|t| t.id), Some(2));
        assert!(d.flags.allow_download);
        // only the exact string "true" enables a flag
        assert!(!d.flags.allow_annotate);

        let none = AclDefaults::from_org(&org(&[(DEFAULT_TEMPLATE, "bogus")]));
        assert!(none.template.is_none());
    }
}
