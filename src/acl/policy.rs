//! Per-role policy rows: the editable projection of a flat ACE list.

use serde::{Deserialize, Serialize};

use super::actions;
use super::model::AccessControlEntry;

/// Field tag of the actions multi-select on the series permissions tab.
pub const SERIES_ACTIONS_FIELD: &str = "series-acl-actions";
/// Field tag of the actions multi-select in the new-series wizard.
pub const NEW_SERIES_ACTIONS_FIELD: &str = "new-series-acl-actions";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyActions {
    pub name: String,
    #[serde(default)]
    pub value: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Policy {
    /// `None` for a freshly added row the user has not filled in yet.
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
    pub actions: PolicyActions,
}

impl Policy {
    pub fn new(role: Option<String>, actions_name: &str) -> Self {
        Self {
            role,
            read: false,
            write: false,
            actions: PolicyActions { name: actions_name.to_string(), value: Vec::new() },
        }
    }

    pub fn for_role(role: impl Into<String>, actions_name: &str) -> Self {
        Self::new(Some(role.into()), actions_name)
    }

    /// Full read/write policy, used for the creating user and for user tags.
    pub fn read_write(role: impl Into<String>, actions_name: &str) -> Self {
        let mut p = Self::for_role(role, actions_name);
        p.read = true;
        p.write = true;
        p
    }

    pub fn role_str(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn has_action(&self, action: &str) -> bool {
        self.actions.value.iter().any(|a| a == action)
    }

    pub fn push_action(&mut self, action: &str) {
        if !self.has_action(action) {
            self.actions.value.push(action.to_string());
        }
    }

    /// A row worth persisting: it names a role and grants something.
    pub fn is_retainable(&self) -> bool {
        self.role.is_some() && (self.read || self.write || !self.actions.value.is_empty())
    }

    /// Identity used when deleting a row: role plus the read/write projection.
    pub fn same_row(&self, other: &Policy) -> bool {
        self.role == other.role && self.read == other.read && self.write == other.write
    }

    fn apply(&mut self, ace: &AccessControlEntry) {
        match ace.action.as_str() {
            actions::READ => self.read = ace.allow,
            actions::WRITE => self.write = ace.allow,
            other if ace.allow => self.push_action(other),
            _ => {}
        }
    }
}

/// Group a flat ACE list into one policy per role, in first-seen role order.
pub fn group_policies(aces: &[AccessControlEntry], actions_name: &str) -> Vec<Policy> {
    let mut out: Vec<Policy> = Vec::new();
    for ace in aces {
        let idx = match out.iter().position(|p| p.role_str() == Some(ace.role.as_str())) {
            Some(i) => i,
            None => {
                out.push(Policy::for_role(ace.role.clone(), actions_name));
                out.len() - 1
            }
        };
        out[idx].apply(ace);
    }
    out
}

/// Look a policy up by role.
pub fn find<'a>(policies: &'a [Policy], role: &str) -> Option<&'a Policy> {
    policies.iter().find(|p| p.role_str() == Some(role))
}

/// Remove the last row matching `target` on role/read/write. Returns whether a row was removed.
pub fn remove_last_matching(policies: &mut Vec<Policy>, target: &Policy) -> bool {
    match policies.iter().rposition(|p| p.same_row(target)) {
        Some(idx) => {
            policies.remove(idx);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_by_role_in_first_seen_order() {
        let aces = vec![
            AccessControlEntry::allow("ROLE_B", "read"),
            AccessControlEntry::allow("ROLE_A", "cast-view"),
            AccessControlEntry::allow("ROLE_B", "write"),
            AccessControlEntry::deny("ROLE_A", "read"),
        ];
        let ps = group_policies(&aces, SERIES_ACTIONS_FIELD);
        assert_eq!(ps.len(), 2);
        assert_eq!(ps[0].role_str(), Some("ROLE_B"));
        assert!(ps[0].read && ps[0].write);
        assert_eq!(ps[1].role_str(), Some("ROLE_A"));
        assert!(!ps[1].read);
        assert_eq!(ps[1].actions.value, vec!["cast-view".to_string()]);
        assert_eq!(ps[1].actions.name, SERIES_ACTIONS_FIELD);
    }

    #[test]
    fn denied_custom_actions_are_dropped_and_duplicates_collapse() {
        let aces = vec![
            AccessControlEntry::allow("ROLE_A", "cast-view"),
            AccessControlEntry::allow("ROLE_A", "cast-view"),
            AccessControlEntry::deny("ROLE_A", "cast-discover"),
        ];
        let ps = group_policies(&aces, SERIES_ACTIONS_FIELD);
        assert_eq!(ps[0].actions.value, vec!["cast-view".to_string()]);
    }

    #[test]
    fn last_read_write_entry_wins() {
        let aces = vec![
            AccessControlEntry::allow("ROLE_A", "read"),
            AccessControlEntry::deny("ROLE_A", "read"),
        ];
        assert!(!group_policies(&aces, SERIES_ACTIONS_FIELD)[0].read);
    }

    #[test]
    fn remove_last_matching_picks_the_last_duplicate() {
        let mut ps = vec![
            Policy::read_write("ROLE_A", SERIES_ACTIONS_FIELD),
            Policy::for_role("ROLE_B", SERIES_ACTIONS_FIELD),
            Policy::read_write("ROLE_A", SERIES_ACTIONS_FIELD),
        ];
        ps[0].push_action("cast-view");
        assert!(remove_last_matching(&mut ps, &Policy::read_write("ROLE_A", SERIES_ACTIONS_FIELD)));
        assert_eq!(ps.len(), 2);
        assert!(ps[0].has_action("cast-view"));
        assert!(!remove_last_matching(&mut ps, &Policy::read_write("ROLE_C", SERIES_ACTIONS_FIELD)));
    }
}
