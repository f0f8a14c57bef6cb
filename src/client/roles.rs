//! Paged access to the role directory used by the ACL role pickers.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use super::AdminApi;
use crate::error::AppResult;

pub const DEFAULT_ROLE_PAGE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleQuery {
    pub limit: usize,
    pub offset: usize,
    pub filter: String,
}

impl RoleQuery {
    /// ACL-targeted roles, optionally narrowed by a name search. A search always
    /// starts from the first page.
    pub fn new(limit: usize, offset: usize, search: Option<&str>) -> Self {
        match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => Self { limit, offset: 0, filter: format!("role_name:{},role_target:ACL", name) },
            None => Self { limit, offset, filter: "role_target:ACL".to_string() },
        }
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
            ("filter", self.filter.clone()),
        ]
    }
}

/// How the next page offset is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    /// Continue after the roles already known.
    Advance,
    /// Always ask for the first page (the wizard's picker filters server side).
    FirstPage,
}

/// Known roles (name → label) plus an in-flight guard that drops overlapping
/// fetches instead of queueing them.
#[derive(Debug)]
pub struct RoleDirectory {
    page_size: usize,
    paging: Paging,
    roles: RwLock<BTreeMap<String, String>>,
    offset: AtomicUsize,
    loading: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RoleDirectory {
    pub fn new(page_size: usize, paging: Paging) -> Self {
        Self {
            page_size: page_size.max(1),
            paging,
            roles: RwLock::new(BTreeMap::new()),
            offset: AtomicUsize::new(0),
            loading: AtomicBool::new(false),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Fetch the next page. Returns `Ok(None)` when a fetch is already running,
    /// otherwise the number of roles received.
    pub async fn more<A: AdminApi>(&self, api: &A, search: Option<&str>) -> AppResult<Option<usize>> {
        if self.loading.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            debug!(target: "series_access", "role fetch already in flight; skipping");
            return Ok(None);
        }
        let _guard = InFlight(&self.loading);

        let offset = match self.paging {
            Paging::Advance => self.offset.load(Ordering::Acquire),
            Paging::FirstPage => 0,
        };
        let query = RoleQuery::new(self.page_size, offset, search);
        let page = api.list_roles(&query).await?;
        let received = page.len();
        {
            let mut roles = self.roles.write();
            for r in page {
                let label = r.value.unwrap_or_else(|| r.name.clone());
                roles.insert(r.name, label);
            }
            self.offset.store(roles.len(), Ordering::Release);
        }
        debug!(target: "series_access", "roles page: offset={} received={}", offset, received);
        Ok(Some(received))
    }

    /// Make a role selectable even if it has not been paged in yet.
    pub fn ensure(&self, role: &str) {
        let mut roles = self.roles.write();
        if !roles.contains_key(role) {
            roles.insert(role.to_string(), role.to_string());
            self.offset.store(roles.len(), Ordering::Release);
        }
    }

    pub fn clear(&self) {
        self.roles.write().clear();
        self.offset.store(0, Ordering::Release);
    }

    pub fn contains(&self, role: &str) -> bool {
        self.roles.read().contains_key(role)
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.roles.read().clone()
    }

    pub fn len(&self) -> usize {
        self.roles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.read().is_empty()
    }

    pub fn next_offset(&self) -> usize {
        self.offset.load(Ordering::Acquire)
    }
}

impl Default for RoleDirectory {
    fn default() -> Self {
        Self::new(DEFAULT_ROLE_PAGE, Paging::Advance)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::client::{InMemoryAdminApi, RoleEntry};

    #[test]
    fn query_filters() {
        let q = RoleQuery::new(100, 200, None);
        assert_eq!(q.filter, "role_target:ACL");
        assert_eq!(q.offset, 200);

        let q = RoleQuery::new(100, 200, Some("ROLE_USER"));
        assert_eq!(q.filter, "role_name:ROLE_USER,role_target:ACL");
        assert_eq!(q.offset, 0);

        let q = RoleQuery::new(50, 10, Some("   "));
        assert_eq!(q.filter, "role_target:ACL");
        assert_eq!(q.params()[0], ("limit", "50".to_string()));
    }

    #[test]
    fn ensure_registers_unknown_roles_once() {
        let d = RoleDirectory::default();
        d.ensure("ROLE_X");
        d.ensure("ROLE_X");
        assert_eq!(d.len(), 1);
        assert_eq!(d.next_offset(), 1);
        d.clear();
        assert!(d.is_empty());
        assert_eq!(d.next_offset(), 0);
    }

    fn directory_backend(latency: Option<Duration>) -> InMemoryAdminApi {
        let api = InMemoryAdminApi::new();
        api.with_state(|st| {
            st.roles = ["ROLE_A", "ROLE_B", "ROLE_C"]
                .iter()
                .map(|n| RoleEntry { name: n.to_string(), value: None })
                .collect();
            st.role_latency = latency;
        });
        api
    }

    #[tokio::test]
    async fn overlapping_fetch_is_dropped_and_offset_advances() {
        let api = directory_backend(Some(Duration::from_millis(50)));
        let d = RoleDirectory::new(100, Paging::Advance);

        let (first, second) = tokio::join!(d.more(&api, None), d.more(&api, None));
        assert_eq!(first.unwrap(), Some(3));
        assert_eq!(second.unwrap(), None);
        assert_eq!(api.with_state(|st| st.role_queries.len()), 1);
        assert!(!d.is_loading());
        assert_eq!(d.next_offset(), 3);

        assert_eq!(d.more(&api, None).await.unwrap(), Some(0));
        let queries = api.with_state(|st| st.role_queries.clone());
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[1].offset, 3);
        assert_eq!(d.len(), 3);
    }

    #[tokio::test]
    async fn first_page_paging_never_advances() {
        let api = directory_backend(None);
        let d = RoleDirectory::new(2, Paging::FirstPage);
        assert_eq!(d.more(&api, None).await.unwrap(), Some(2));
        assert_eq!(d.more(&api, None).await.unwrap(), Some(2));
        let offsets: Vec<usize> = api.with_state(|st| st.role_queries.iter().map(|q| q.offset).collect());
        assert_eq!(offsets, vec![0, 0]);
        assert_eq!(d.len(), 2);
    }
}
