//! In-memory `AdminApi` used by the tests and for offline runs of the CLI.
//! Saves are recorded and applied so a later read sees them.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;

use super::{AdminApi, ResourceList, RoleEntry, RoleQuery, SeriesTheme, UserTag};
use crate::acl::{AccessControlEntry, AccessUpdate, AclDocument, ManagedAcl, SeriesAccess, SeriesAccessEnvelope};
use crate::error::{AppError, AppResult};
use crate::feeds::FeedDescriptor;
use crate::identity::CurrentUser;
use crate::series::metadata::{Catalog, SeriesMetadata};

#[derive(Debug, Default)]
pub struct MemoryState {
    pub user: CurrentUser,
    pub access: HashMap<String, SeriesAccess>,
    pub managed: HashMap<i64, ManagedAcl>,
    pub roles: Vec<RoleEntry>,
    pub resources: HashMap<String, ResourceList>,
    pub users: Vec<UserTag>,
    pub metadata: HashMap<String, SeriesMetadata>,
    pub themes: HashMap<String, SeriesTheme>,
    pub feeds: Vec<FeedDescriptor>,
    /// Operation names that should fail with a remote error.
    pub failing: HashSet<&'static str>,
    /// Delay before a roles page is answered.
    pub role_latency: Option<Duration>,

    pub saved_access: Vec<(String, AccessUpdate)>,
    pub saved_metadata: Vec<(String, Catalog)>,
    pub theme_changes: Vec<(String, Option<String>)>,
    pub role_queries: Vec<RoleQuery>,
}

#[derive(Debug, Default)]
pub struct InMemoryAdminApi {
    state: Mutex<MemoryState>,
}

impl InMemoryAdminApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the backing state, e.g. to seed data or inspect saves.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut MemoryState) -> R) -> R {
        f(&mut self.state.lock())
    }

    pub fn put_series_acl(&self, series_id: &str, aces: Vec<AccessControlEntry>, locked: bool) {
        let acl = serde_json::to_value(AclDocument::new(aces)).unwrap_or(Value::Null);
        self.state
            .lock()
            .access
            .insert(series_id.to_string(), SeriesAccess { acl, locked, privileges: BTreeMap::new() });
    }

    pub fn saved_access(&self) -> Vec<(String, AccessUpdate)> {
        self.state.lock().saved_access.clone()
    }

    fn check(&self, op: &'static str) -> AppResult<()> {
        if self.state.lock().failing.contains(op) {
            return Err(AppError::remote("http_500", format!("{} failed", op)));
        }
        Ok(())
    }
}

impl AdminApi for InMemoryAdminApi {
    async fn current_user(&self) -> AppResult<CurrentUser> {
        self.check("current_user")?;
        Ok(self.state.lock().user.clone())
    }

    async fn series_access(&self, series_id: &str) -> AppResult<SeriesAccessEnvelope> {
        self.check("series_access")?;
        let st = self.state.lock();
        match st.access.get(series_id) {
            Some(a) => Ok(SeriesAccessEnvelope { series_access: Some(a.clone()) }),
            None => Err(AppError::not_found("http_404", format!("series {} not found", series_id))),
        }
    }

    async fn save_series_access(&self, series_id: &str, update: &AccessUpdate) -> AppResult<()> {
        self.check("save_series_access")?;
        let mut st = self.state.lock();
        st.saved_access.push((series_id.to_string(), update.clone()));
        let acl = serde_json::to_value(AclDocument { acl: update.acl.clone() })?;
        st.access.entry(series_id.to_string()).or_default().acl = acl;
        Ok(())
    }

    async fn managed_acl(&self, acl_id: i64) -> AppResult<ManagedAcl> {
        self.check("managed_acl")?;
        self.state
            .lock()
            .managed
            .get(&acl_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("http_404", format!("acl {} not found", acl_id)))
    }

    async fn list_roles(&self, query: &RoleQuery) -> AppResult<Vec<RoleEntry>> {
        self.check("list_roles")?;
        let latency = {
            let mut st = self.state.lock();
            st.role_queries.push(query.clone());
            st.role_latency
        };
        if let Some(d) = latency {
            tokio::time::sleep(d).await;
        }
        let st = self.state.lock();
        let name_filter = query
            .filter
            .split(',')
            .find_map(|part| part.strip_prefix("role_name:"))
            .map(str::to_lowercase);
        Ok(st
            .roles
            .iter()
            .filter(|r| name_filter.as_ref().map(|n| r.name.to_lowercase().contains(n)).unwrap_or(true))
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn resource_list(&self, name: &str) -> AppResult<ResourceList> {
        self.check("resource_list")?;
        Ok(self.state.lock().resources.get(name).cloned().unwrap_or_default())
    }

    async fn switch_users(&self) -> AppResult<Vec<UserTag>> {
        self.check("switch_users")?;
        Ok(self.state.lock().users.clone())
    }

    async fn series_metadata(&self, series_id: &str) -> AppResult<SeriesMetadata> {
        self.check("series_metadata")?;
        self.state
            .lock()
            .metadata
            .get(series_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("http_404", format!("series {} not found", series_id)))
    }

    async fn save_series_metadata(&self, series_id: &str, catalog: &Catalog) -> AppResult<()> {
        self.check("save_series_metadata")?;
        self.state.lock().saved_metadata.push((series_id.to_string(), catalog.clone()));
        Ok(())
    }

    async fn series_theme(&self, series_id: &str) -> AppResult<SeriesTheme> {
        self.check("series_theme")?;
        Ok(self.state.lock().themes.get(series_id).cloned().unwrap_or_default())
    }

    async fn save_series_theme(&self, series_id: &str, theme_id: &str) -> AppResult<()> {
        self.check("save_series_theme")?;
        let mut st = self.state.lock();
        st.theme_changes.push((series_id.to_string(), Some(theme_id.to_string())));
        let mut theme = SeriesTheme::new();
        theme.insert(theme_id.to_string(), Value::String(String::new()));
        st.themes.insert(series_id.to_string(), theme);
        Ok(())
    }

    async fn delete_series_theme(&self, series_id: &str) -> AppResult<()> {
        self.check("delete_series_theme")?;
        let mut st = self.state.lock();
        st.theme_changes.push((series_id.to_string(), None));
        st.themes.remove(series_id);
        Ok(())
    }

    async fn feeds(&self) -> AppResult<Vec<FeedDescriptor>> {
        self.check("feeds")?;
        Ok(self.state.lock().feeds.clone())
    }
}
