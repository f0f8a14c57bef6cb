use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Organization block of `/info/me.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Organization {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Organization {
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserInfo {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// The signed-in user as reported by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentUser {
    #[serde(default)]
    pub user: UserInfo,
    #[serde(default)]
    pub org: Organization,
    #[serde(default)]
    pub roles: Vec<String>,
    /// The user's own role, e.g. `ROLE_USER_JDOE`.
    #[serde(default, rename = "userRole")]
    pub user_role: Option<String>,
}

impl CurrentUser {
    pub fn user_role(&self) -> Option<&str> {
        self.user_role.as_deref().filter(|r| !r.is_empty())
    }

    /// The AAI home organization (`aai.org` property) templates are resolved against.
    pub fn aai_org(&self) -> Option<&str> {
        self.org.property(super::org_settings::AAI_ORG).filter(|o| !o.is_empty())
    }
}
