//! Series access control lists: the ACE wire model, per-role policies, the
//! built-in template catalog and the functions that move between them.
//!
//! Everything in here is pure data massaging; network access lives in
//! `crate::client` and editor state in `crate::series` / `crate::wizard`.

pub mod model;
pub mod policy;
pub mod template;
pub mod reconcile;
pub mod serialize;
pub mod validate;

// Re-exports for thin public surface
pub use model::{AccessControlEntry, Acl, AclDocument, AccessUpdate, ManagedAcl, SeriesAccess, SeriesAccessEnvelope};
pub use policy::{Policy, PolicyActions, group_policies};
pub use template::{Template, TemplateFlags, ORG_DOMAIN_PLACEHOLDER};
pub use reconcile::{Classification, classify};
pub use serialize::{to_aces, compose_switch_acl};
pub use validate::{AclValidation, ValidationMode, validate};

/// Well-known action names.
pub mod actions {
    pub const READ: &str = "read";
    pub const WRITE: &str = "write";
    pub const CAST_VIEW: &str = "cast-view";
    pub const CAST_DISCOVER: &str = "cast-discover";
    pub const CAST_DOWNLOAD: &str = "cast-download";
    pub const CAST_ANNOTATE: &str = "cast-annotate";
}

/// Synthetic roles the templates are built around.
pub mod roles {
    pub const ANONYMOUS: &str = "ROLE_ANONYMOUS";
    pub const FEDERATION_MEMBER: &str = "ROLE_AAI_FEDERATION_MEMBER";
    pub const PRIVATE_MEMBER: &str = "ROLE_AAI_PRIVATE_MEMBER";
    pub const EXTERNAL_APPLICATION: &str = "ROLE_EXTERNAL_APPLICATION";

    /// Organization member role for a concrete AAI home organization.
    pub fn org_member(org: &str) -> String {
        format!("ROLE_AAI_ORG_{}_MEMBER", org)
    }

    /// True when `role` is one of the roles owned by the template catalog.
    pub fn is_template_role(role: &str, org: Option<&str>) -> bool {
        if role == ANONYMOUS || role == FEDERATION_MEMBER || role == PRIVATE_MEMBER || role == EXTERNAL_APPLICATION {
            return true;
        }
        match org {
            Some(o) => role == org_member(o),
            None => false,
        }
    }
}
