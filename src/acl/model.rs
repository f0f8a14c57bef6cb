use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// One `(role, action, allow)` triple as exchanged with the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccessControlEntry {
    pub action: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub allow: bool,
    pub role: String,
}

impl AccessControlEntry {
    pub fn new(role: impl Into<String>, action: impl Into<String>, allow: bool) -> Self {
        Self { role: role.into(), action: action.into(), allow }
    }

    pub fn allow(role: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(role, action, true)
    }

    pub fn deny(role: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(role, action, false)
    }
}

// The backend is not consistent about booleans: `true` and `"true"` both occur.
fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    match Value::deserialize(d)? {
        Value::Bool(b) => Ok(b),
        Value::String(s) => Ok(s.eq_ignore_ascii_case("true")),
        Value::Number(n) => Ok(n.as_i64().unwrap_or(0) != 0),
        Value::Null => Ok(false),
        other => Err(serde::de::Error::custom(format!("invalid allow value: {}", other))),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Acl {
    #[serde(default)]
    pub ace: Vec<AccessControlEntry>,
}

/// `{"acl": {"ace": [...]}}`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AclDocument {
    #[serde(default)]
    pub acl: Acl,
}

impl AclDocument {
    pub fn new(ace: Vec<AccessControlEntry>) -> Self {
        Self { acl: Acl { ace } }
    }
}

/// Payload of a replace-whole-ACL save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessUpdate {
    pub acl: Acl,
    #[serde(rename = "override")]
    pub override_events: bool,
}

impl AccessUpdate {
    /// Form fields as the access endpoint expects them: the ACL as a JSON
    /// document plus the override flag.
    pub fn form_fields(&self) -> AppResult<Vec<(&'static str, String)>> {
        let doc = AclDocument { acl: self.acl.clone() };
        Ok(vec![
            ("acl", serde_json::to_string(&doc)?),
            ("override", self.override_events.to_string()),
        ])
    }
}

/// Response of `GET /admin-ng/series/{id}/access.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SeriesAccessEnvelope {
    #[serde(default)]
    pub series_access: Option<SeriesAccess>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SeriesAccess {
    /// Either a JSON-encoded `AclDocument` or the document itself.
    #[serde(default)]
    pub acl: Value,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub privileges: BTreeMap<String, Value>,
}

impl SeriesAccess {
    pub fn document(&self) -> AppResult<AclDocument> {
        match &self.acl {
            Value::String(s) => Ok(serde_json::from_str(s)?),
            Value::Null => Ok(AclDocument::default()),
            v @ Value::Object(_) => Ok(serde_json::from_value(v.clone())?),
            other => Err(AppError::decode("invalid_acl", format!("unexpected acl payload: {}", other))),
        }
    }

    pub fn entries(&self) -> AppResult<Vec<AccessControlEntry>> {
        Ok(self.document()?.acl.ace)
    }
}

/// A named ACL managed by the organization (`/acl-manager/acl/{id}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ManagedAcl {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub acl: Acl,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_accepts_strings_and_bools() {
        let raw = r#"[
            {"action":"read","allow":true,"role":"ROLE_A"},
            {"action":"cast-view","allow":"true","role":"ROLE_A"},
            {"action":"write","allow":"false","role":"ROLE_A"}
        ]"#;
        let aces: Vec<AccessControlEntry> = serde_json::from_str(raw).unwrap();
        assert!(aces[0].allow);
        assert!(aces[1].allow);
        assert!(!aces[2].allow);
    }

    #[test]
    fn series_access_acl_may_be_string_or_object() {
        let as_string = r#"{"series_access":{"acl":"{\"acl\":{\"ace\":[{\"action\":\"read\",\"allow\":true,\"role\":\"ROLE_X\"}]}}","locked":true}}"#;
        let env: SeriesAccessEnvelope = serde_json::from_str(as_string).unwrap();
        let access = env.series_access.unwrap();
        assert!(access.locked);
        assert_eq!(access.entries().unwrap(), vec![AccessControlEntry::allow("ROLE_X", "read")]);

        let as_object = r#"{"series_access":{"acl":{"acl":{"ace":[]}},"privileges":{"ROLE_X":true}}}"#;
        let env: SeriesAccessEnvelope = serde_json::from_str(as_object).unwrap();
        let access = env.series_access.unwrap();
        assert!(access.entries().unwrap().is_empty());
        assert!(access.privileges.contains_key("ROLE_X"));
    }

    #[test]
    fn update_form_fields_carry_document_and_flag() {
        let up = AccessUpdate { acl: Acl { ace: vec![AccessControlEntry::allow("ROLE_X", "read")] }, override_events: true };
        let fields = up.form_fields().unwrap();
        assert_eq!(fields[0].0, "acl");
        assert_eq!(fields[0].1, r#"{"acl":{"ace":[{"action":"read","allow":true,"role":"ROLE_X"}]}}"#);
        assert_eq!(fields[1], ("override", "true".to_string()));
    }
}
