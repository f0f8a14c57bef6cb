use serde::Serialize;

use super::policy::Policy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// At least one role must hold both read and write.
    Strict,
    /// Read/write holder not required; used by the series permissions tab
    /// where access is expressed through cast actions. The list replaces the
    /// stored ACL as a whole, so it must not be empty.
    Relaxed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AclValidation {
    /// Every row names a role and grants at least one thing.
    pub rules_valid: bool,
    /// Some row grants both read and write.
    pub has_rights: bool,
    pub mode: ValidationMode,
}

impl AclValidation {
    pub fn is_valid(&self) -> bool {
        match self.mode {
            ValidationMode::Strict => self.rules_valid && self.has_rights,
            ValidationMode::Relaxed => self.rules_valid,
        }
    }
}

pub fn validate(policies: &[Policy], mode: ValidationMode) -> AclValidation {
    let complete = policies.iter().all(Policy::is_retainable);
    let rules_valid = match mode {
        ValidationMode::Strict => complete,
        ValidationMode::Relaxed => complete && !policies.is_empty(),
    };
    AclValidation {
        rules_valid,
        has_rights: policies.iter().any(|p| p.read && p.write),
        mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::policy::NEW_SERIES_ACTIONS_FIELD as F;

    #[test]
    fn missing_read_write_holder_is_strict_only() {
        let mut viewer = Policy::for_role("ROLE_ANONYMOUS", F);
        viewer.push_action("cast-view");
        let strict = validate(std::slice::from_ref(&viewer), ValidationMode::Strict);
        assert!(strict.rules_valid);
        assert!(!strict.has_rights);
        assert!(!strict.is_valid());
        assert!(validate(&[viewer], ValidationMode::Relaxed).is_valid());
    }

    #[test]
    fn blank_rows_break_rules_in_any_mode() {
        let owner = Policy::read_write("ROLE_USER_1", F);
        let blank = Policy::new(None, F);
        let v = validate(&[owner.clone(), blank], ValidationMode::Relaxed);
        assert!(v.has_rights);
        assert!(!v.rules_valid);
        assert!(!v.is_valid());

        // a role with nothing granted is just as invalid
        let idle = Policy::for_role("ROLE_IDLE", F);
        assert!(!validate(&[idle, owner], ValidationMode::Strict).rules_valid);
    }

    #[test]
    fn empty_list_is_never_valid() {
        let strict = validate(&[], ValidationMode::Strict);
        assert!(strict.rules_valid);
        assert!(!strict.has_rights);
        assert!(!strict.is_valid());

        let relaxed = validate(&[], ValidationMode::Relaxed);
        assert!(!relaxed.rules_valid);
        assert!(!relaxed.is_valid());
    }
}
