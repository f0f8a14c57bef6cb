//! Decide which built-in template, if any, a policy set corresponds to.
//!
//! This is an ordered list of predicates, not a lookup: several templates
//! share roles and marker actions, so the first rule that holds wins.

use serde::Serialize;

use super::policy::{find, Policy};
use super::template::{self, Template, TemplateFlags};
use super::{actions, roles};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classification {
    Template { template_id: u32, allow_download: bool, allow_annotate: bool },
    Custom,
}

impl Classification {
    pub fn template(&self) -> Option<&'static Template> {
        match self {
            Classification::Template { template_id, .. } => template::by_id(*template_id),
            Classification::Custom => None,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Classification::Custom)
    }

    pub fn flags(&self) -> TemplateFlags {
        match self {
            Classification::Template { allow_download, allow_annotate, .. } => {
                TemplateFlags { allow_download: *allow_download, allow_annotate: *allow_annotate }
            }
            Classification::Custom => TemplateFlags::default(),
        }
    }
}

type Predicate = fn(&Policy) -> bool;

struct Rule {
    template_id: u32,
    role: RoleRef,
    holds: Predicate,
}

enum RoleRef {
    Fixed(&'static str),
    OrgMember,
}

const RULES: &[Rule] = &[
    Rule { template_id: 1, role: RoleRef::Fixed(roles::ANONYMOUS), holds: |p| p.has_action(actions::CAST_DISCOVER) },
    Rule { template_id: 2, role: RoleRef::Fixed(roles::FEDERATION_MEMBER), holds: |p| p.has_action(actions::CAST_VIEW) },
    Rule { template_id: 3, role: RoleRef::OrgMember, holds: |p| p.has_action(actions::CAST_VIEW) },
    Rule { template_id: 4, role: RoleRef::Fixed(roles::PRIVATE_MEMBER), holds: |p| p.has_action(actions::CAST_VIEW) },
    Rule { template_id: 5, role: RoleRef::Fixed(roles::EXTERNAL_APPLICATION), holds: |p| p.read && p.write },
    Rule { template_id: 6, role: RoleRef::Fixed(roles::ANONYMOUS), holds: |p| !p.has_action(actions::CAST_DISCOVER) },
];

/// Classify a policy set against the template catalog. `org` is the caller's
/// AAI home organization; without it the organization rule never matches.
pub fn classify(policies: &[Policy], org: Option<&str>) -> Classification {
    for rule in RULES {
        let role = match (&rule.role, org) {
            (RoleRef::Fixed(r), _) => r.to_string(),
            (RoleRef::OrgMember, Some(o)) => roles::org_member(o),
            (RoleRef::OrgMember, None) => continue,
        };
        if let Some(policy) = find(policies, &role) {
            if (rule.holds)(policy) {
                return Classification::Template {
                    template_id: rule.template_id,
                    allow_download: policy.has_action(actions::CAST_DOWNLOAD),
                    allow_annotate: policy.has_action(actions::CAST_ANNOTATE),
                };
            }
        }
    }
    Classification::Custom
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod reconcile_tests;
