//! User-visible notifications (warnings, confirmations) raised by the editors.
//!
//! The console shows these as dismissible banners grouped by context. The
//! editors only talk to the `Notifications` trait; `NotificationCenter` is the
//! in-process implementation used by the CLI and the tests.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const SERIES_ACL_CONTEXT: &str = "series-acl";
pub const SERIES_THEME_CONTEXT: &str = "series-theme";

pub mod keys {
    pub const INVALID_ACL_RULES: &str = "INVALID_ACL_RULES";
    pub const MISSING_ACL_RULES: &str = "MISSING_ACL_RULES";
    pub const SERIES_ACL_MISSING_READWRITE_ROLE: &str = "SERIES_ACL_MISSING_READWRITE_ROLE";
    pub const SERIES_ACL_LOCKED: &str = "SERIES_ACL_LOCKED";
    pub const SAVED_ACL_RULES: &str = "SAVED_ACL_RULES";
    pub const SERIES_THEME_REPROCESS_EXISTING_EVENTS: &str = "SERIES_THEME_REPROCESS_EXISTING_EVENTS";
}

/// Per-series context used for the lock warning.
pub fn series_lock_context(series_id: &str) -> String {
    format!("{}-{}", SERIES_ACL_CONTEXT, series_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NotificationId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: Level,
    pub key: String,
    pub context: String,
    /// `None` keeps the banner until it is removed explicitly.
    pub duration: Option<Duration>,
}

impl Notification {
    pub fn warning(key: &str, context: &str) -> Self {
        Self { level: Level::Warning, key: key.to_string(), context: context.to_string(), duration: None }
    }

    pub fn info(key: &str, context: &str, duration: Duration) -> Self {
        Self { level: Level::Info, key: key.to_string(), context: context.to_string(), duration: Some(duration) }
    }
}

pub trait Notifications: Send + Sync {
    fn add(&self, n: Notification) -> NotificationId;
    fn remove(&self, id: &NotificationId, context: &str) -> bool;
}

#[derive(Debug, Clone)]
struct Entry {
    id: NotificationId,
    notification: Notification,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map(|at| now < at).unwrap_or(true)
    }
}

/// In-memory notification store, grouped by context. Timed banners disappear
/// from reads once their duration has passed and are purged on the next add.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    by_context: RwLock<HashMap<String, Vec<Entry>>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self, context: &str) -> Vec<Notification> {
        let now = Instant::now();
        self.by_context
            .read()
            .get(context)
            .map(|v| v.iter().filter(|e| e.is_live(now)).map(|e| e.notification.clone()).collect())
            .unwrap_or_default()
    }

    pub fn has(&self, context: &str, key: &str) -> bool {
        self.active(context).iter().any(|n| n.key == key)
    }

    pub fn all(&self) -> Vec<Notification> {
        let now = Instant::now();
        let mut out: Vec<Notification> = self
            .by_context
            .read()
            .values()
            .flatten()
            .filter(|e| e.is_live(now))
            .map(|e| e.notification.clone())
            .collect();
        out.sort_by(|a, b| a.context.cmp(&b.context).then(a.key.cmp(&b.key)));
        out
    }
}

impl Notifications for NotificationCenter {
    fn add(&self, n: Notification) -> NotificationId {
        let id = NotificationId(Uuid::new_v4().to_string());
        match n.level {
            Level::Info => info!(target: "series_access", "notify {} [{}]", n.key, n.context),
            Level::Warning | Level::Error => warn!(target: "series_access", "notify {} [{}]", n.key, n.context),
        }
        let now = Instant::now();
        let mut map = self.by_context.write();
        for list in map.values_mut() {
            list.retain(|e| e.is_live(now));
        }
        map.retain(|_, list| !list.is_empty());
        let expires_at = n.duration.map(|d| now + d);
        map.entry(n.context.clone()).or_default().push(Entry { id: id.clone(), notification: n, expires_at });
        id
    }

    fn remove(&self, id: &NotificationId, context: &str) -> bool {
        let mut map = self.by_context.write();
        let Some(list) = map.get_mut(context) else { return false };
        let before = list.len();
        list.retain(|e| &e.id != id);
        let removed = list.len() != before;
        if removed {
            debug!(target: "series_access", "notify removed {} [{}]", id.0, context);
        }
        removed
    }
}

/// Holds at most one live banner of a kind, replacing it on every raise.
#[derive(Debug, Default, Clone)]
pub struct NotificationSlot {
    current: Option<(NotificationId, String)>,
}

impl NotificationSlot {
    pub fn is_raised(&self) -> bool {
        self.current.is_some()
    }

    pub fn raise(&mut self, sink: &dyn Notifications, n: Notification) {
        self.clear(sink);
        let context = n.context.clone();
        self.current = Some((sink.add(n), context));
    }

    /// Raise only when nothing is showing yet.
    pub fn ensure(&mut self, sink: &dyn Notifications, n: Notification) {
        if self.current.is_none() {
            self.raise(sink, n);
        }
    }

    pub fn clear(&mut self, sink: &dyn Notifications) {
        if let Some((id, context)) = self.current.take() {
            sink.remove(&id, &context);
        }
    }

    /// Raise when `condition` holds, clear otherwise.
    pub fn toggle(&mut self, sink: &dyn Notifications, condition: bool, n: Notification) {
        if condition { self.raise(sink, n) } else { self.clear(sink) }
    }
}
