//! Policy rows back to flat ACE lists.

use super::model::AccessControlEntry;
use super::policy::Policy;
use super::template::{Template, TemplateFlags};
use super::{actions, roles};

/// Expand policies into ACEs: `read`/`write` only when granted, then one
/// allowed entry per action. Rows that name no role or grant nothing are skipped.
pub fn to_aces(policies: &[Policy]) -> Vec<AccessControlEntry> {
    let mut out = Vec::new();
    for policy in policies.iter().filter(|p| p.is_retainable()) {
        let Some(role) = policy.role_str() else { continue };
        if policy.read {
            out.push(AccessControlEntry::allow(role, actions::READ));
        }
        if policy.write {
            out.push(AccessControlEntry::allow(role, actions::WRITE));
        }
        for action in &policy.actions.value {
            out.push(AccessControlEntry::allow(role, action.as_str()));
        }
    }
    out
}

/// Entries for switching a series to `template`: every policy that does not
/// belong to a template role is carried over with explicit read/write values,
/// followed by the template's own expansion.
pub fn compose_switch_acl(
    current: &[Policy],
    template: &Template,
    org: Option<&str>,
    flags: TemplateFlags,
) -> Vec<AccessControlEntry> {
    let mut out = Vec::new();
    for policy in current {
        let Some(role) = policy.role_str() else { continue };
        if roles::is_template_role(role, org) {
            continue;
        }
        out.push(AccessControlEntry::new(role, actions::READ, policy.read));
        out.push(AccessControlEntry::new(role, actions::WRITE, policy.write));
        for action in &policy.actions.value {
            out.push(AccessControlEntry::allow(role, action.as_str()));
        }
    }
    out.extend(template.expand(org, flags));
    out
}
