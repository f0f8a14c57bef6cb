//! REST boundary to the `/admin-ng` backend.
//!
//! Editors are generic over `AdminApi` so they can run against the real
//! HTTP client (`HttpAdminApi`) or an in-memory backend in tests.

use std::collections::BTreeMap;
use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::acl::{AccessUpdate, ManagedAcl, SeriesAccessEnvelope};
use crate::error::AppResult;
use crate::feeds::FeedDescriptor;
use crate::identity::CurrentUser;
use crate::series::metadata::{Catalog, SeriesMetadata};

mod http;
pub mod memory;
pub mod roles;

pub use http::HttpAdminApi;
pub use memory::InMemoryAdminApi;
pub use roles::{RoleDirectory, RoleQuery};

/// Named resource lists served under `/admin-ng/resources/{name}.json`.
pub mod resources {
    pub const ACL_ACTIONS: &str = "ACL.ACTIONS";
    pub const THEMES_NAME: &str = "THEMES.NAME";
    pub const THEMES_DESCRIPTION: &str = "THEMES.DESCRIPTION";
    pub const SWITCH_USERS: &str = "USERS.SWITCH.ROLE";
    pub const ROLES: &str = "ROLES";
}

/// Key/label pairs of a resource list, without the `$`-prefixed bookkeeping keys.
pub type ResourceList = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleEntry {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// An entry of the SWITCH user directory, shown as a tag on the permissions tab.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserTag {
    pub key: String,
    pub name: String,
    /// The user's role; a tag is selected when a policy carries this role.
    pub value: String,
}

/// Response of the series theme endpoint: keys are theme ids.
pub type SeriesTheme = BTreeMap<String, Value>;

pub trait AdminApi: Send + Sync {
    fn current_user(&self) -> impl Future<Output = AppResult<CurrentUser>> + Send;

    fn series_access(&self, series_id: &str) -> impl Future<Output = AppResult<SeriesAccessEnvelope>> + Send;

    fn save_series_access(&self, series_id: &str, update: &AccessUpdate) -> impl Future<Output = AppResult<()>> + Send;

    fn managed_acl(&self, acl_id: i64) -> impl Future<Output = AppResult<ManagedAcl>> + Send;

    fn list_roles(&self, query: &RoleQuery) -> impl Future<Output = AppResult<Vec<RoleEntry>>> + Send;

    fn resource_list(&self, name: &str) -> impl Future<Output = AppResult<ResourceList>> + Send;

    fn switch_users(&self) -> impl Future<Output = AppResult<Vec<UserTag>>> + Send;

    fn series_metadata(&self, series_id: &str) -> impl Future<Output = AppResult<SeriesMetadata>> + Send;

    fn save_series_metadata(&self, series_id: &str, catalog: &Catalog) -> impl Future<Output = AppResult<()>> + Send;

    fn series_theme(&self, series_id: &str) -> impl Future<Output = AppResult<SeriesTheme>> + Send;

    fn save_series_theme(&self, series_id: &str, theme_id: &str) -> impl Future<Output = AppResult<()>> + Send;

    fn delete_series_theme(&self, series_id: &str) -> impl Future<Output = AppResult<()>> + Send;

    fn feeds(&self) -> impl Future<Output = AppResult<Vec<FeedDescriptor>>> + Send;
}

/// Turn a raw resource-list object into key/label pairs, dropping `$` keys.
pub fn resource_list_from_value(v: Value) -> ResourceList {
    let mut out = ResourceList::new();
    if let Value::Object(map) = v {
        for (k, val) in map {
            if k.starts_with('$') {
                continue;
            }
            let label = match val {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            out.insert(k, label);
        }
    }
    out
}

/// The SWITCH directory maps a display key to the user's role.
pub fn user_tags_from_value(v: Value) -> Vec<UserTag> {
    let mut out = Vec::new();
    if let Value::Object(map) = v {
        for (k, val) in map {
            if let Value::String(role) = val {
                out.push(UserTag { key: k.clone(), name: k, value: role });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_lists_drop_dollar_keys() {
        let v = serde_json::json!({"$promise": {}, "$resolved": true, "cast-view": "View", "flag": true});
        let list = resource_list_from_value(v);
        assert_eq!(list.len(), 2);
        assert_eq!(list.get("cast-view").map(String::as_str), Some("View"));
        assert_eq!(list.get("flag").map(String::as_str), Some("true"));
    }

    #[test]
    fn user_tags_keep_string_roles_only() {
        let v = serde_json::json!({"Jane Doe": "ROLE_USER_JANE", "broken": 5});
        let tags = user_tags_from_value(v);
        assert_eq!(tags, vec![UserTag { key: "Jane Doe".into(), name: "Jane Doe".into(), value: "ROLE_USER_JANE".into() }]);
    }
}
