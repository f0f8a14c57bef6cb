//! Permissions tab of an existing series.
//!
//! Every edit is saved immediately, so most mutating operations end in
//! `access_save`. Template selection works on top of the grouped policies:
//! whatever the user changes, the policies are re-classified so the template
//! picker reflects the ACL actually stored.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::acl::policy::{self, SERIES_ACTIONS_FIELD};
use crate::acl::{
    classify, compose_switch_acl, group_policies, template, to_aces, validate, AccessControlEntry, AccessUpdate, Acl,
    AclValidation, Policy, Template, TemplateFlags, ValidationMode,
};
use crate::client::{resources, AdminApi, ResourceList, RoleDirectory, UserTag};
use crate::client::roles::Paging;
use crate::error::{AppError, AppResult};
use crate::identity::UpdateMode;
use crate::notify::{keys, series_lock_context, Notification, NotificationSlot, Notifications, SERIES_ACL_CONTEXT};

const SAVED_NOTICE: Duration = Duration::from_millis(1200);

/// Result of a save attempt that did not fail on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved,
    /// Nothing was sent; the policies did not pass validation.
    Rejected(AclValidation),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved)
    }
}

pub struct SeriesAccessEditor<A: AdminApi> {
    api: Arc<A>,
    notes: Arc<dyn Notifications>,
    series_id: String,
    policies: Vec<Policy>,
    selected: Option<&'static Template>,
    flags: TemplateFlags,
    is_custom_template: bool,
    tags: Vec<UserTag>,
    users: Vec<UserTag>,
    acl_locked: bool,
    valid_acl: bool,
    request_pending: bool,
    update_mode: UpdateMode,
    org: Option<String>,
    roles: RoleDirectory,
    actions: ResourceList,
    rules_notice: NotificationSlot,
    lock_notice: NotificationSlot,
}

impl<A: AdminApi> SeriesAccessEditor<A> {
    pub fn new(api: Arc<A>, notes: Arc<dyn Notifications>, series_id: impl Into<String>, role_page: usize) -> Self {
        Self {
            api,
            notes,
            series_id: series_id.into(),
            policies: Vec::new(),
            selected: None,
            flags: TemplateFlags::default(),
            is_custom_template: false,
            tags: Vec::new(),
            users: Vec::new(),
            acl_locked: false,
            valid_acl: true,
            request_pending: false,
            update_mode: UpdateMode::default(),
            org: None,
            roles: RoleDirectory::new(role_page, Paging::Advance),
            actions: ResourceList::new(),
            rules_notice: NotificationSlot::default(),
            lock_notice: NotificationSlot::default(),
        }
    }

    pub fn series_id(&self) -> &str {
        &self.series_id
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    /// Direct row access for inline edits; follow up with `access_changed`.
    pub fn policies_mut(&mut self) -> &mut Vec<Policy> {
        &mut self.policies
    }

    pub fn selected_template(&self) -> Option<&'static Template> {
        self.selected
    }

    pub fn flags(&self) -> TemplateFlags {
        self.flags
    }

    /// Checkbox values used by the next `change_base_acl_switch`.
    pub fn set_flags(&mut self, flags: TemplateFlags) {
        self.flags = flags;
    }

    pub fn is_custom_template(&self) -> bool {
        self.is_custom_template
    }

    pub fn tags(&self) -> &[UserTag] {
        &self.tags
    }

    pub fn users(&self) -> &[UserTag] {
        &self.users
    }

    pub fn is_locked(&self) -> bool {
        self.acl_locked
    }

    pub fn is_valid_acl(&self) -> bool {
        self.valid_acl
    }

    pub fn is_request_pending(&self) -> bool {
        self.request_pending
    }

    pub fn update_mode(&self) -> UpdateMode {
        self.update_mode
    }

    pub fn org(&self) -> Option<&str> {
        self.org.as_deref()
    }

    pub fn roles(&self) -> &RoleDirectory {
        &self.roles
    }

    pub fn actions(&self) -> &ResourceList {
        &self.actions
    }

    /// Load user, directory and ACL for the series. Only a failure to read the
    /// ACL itself is reported; the rest degrades to empty lists.
    pub async fn load(&mut self) -> AppResult<()> {
        let (me, users) = futures_util::join!(self.api.current_user(), self.api.switch_users());
        match me {
            Ok(me) => {
                self.org = me.aai_org().map(str::to_string);
                self.update_mode = UpdateMode::from_org(&me.org);
            }
            Err(e) => warn!(target: "series_access", "current user unavailable: {}", e),
        }
        self.users = users.unwrap_or_else(|e| {
            warn!(target: "series_access", "user directory unavailable: {}", e);
            Vec::new()
        });

        let envelope = self.api.series_access(&self.series_id).await?;
        if let Some(access) = envelope.series_access {
            let aces = access.entries()?;
            self.change_policies(aces, true).await?;
            self.acl_locked = access.locked;
            let ctx = series_lock_context(&self.series_id);
            self.lock_notice.toggle(&*self.notes, access.locked, Notification::warning(keys::SERIES_ACL_LOCKED, &ctx));
            for role in access.privileges.keys() {
                self.roles.ensure(role);
            }
        }

        match self.api.resource_list(resources::ACL_ACTIONS).await {
            Ok(list) => self.actions = list,
            Err(e) => warn!(target: "series_access", "acl actions unavailable: {}", e),
        }
        if let Err(e) = self.more_roles(None).await {
            warn!(target: "series_access", "roles unavailable: {}", e);
        }
        info!(target: "series_access", "loaded access for series {}: {} policies", self.series_id, self.policies.len());
        Ok(())
    }

    /// Replace the policies with `aces`. Outside of loading the result is saved
    /// right away and its outcome returned.
    pub async fn change_policies(&mut self, aces: Vec<AccessControlEntry>, loading: bool) -> AppResult<Option<SaveOutcome>> {
        self.replace_policies(aces);
        if loading {
            self.valid_acl = true;
            return Ok(None);
        }
        self.access_save(false, false).await.map(Some)
    }

    fn replace_policies(&mut self, aces: Vec<AccessControlEntry>) {
        let policies = group_policies(&aces, SERIES_ACTIONS_FIELD);
        let class = classify(&policies, self.org.as_deref());
        if class.is_custom() {
            self.is_custom_template = true;
        } else {
            self.is_custom_template = false;
            self.selected = class.template();
            self.flags = class.flags();
        }
        debug!(target: "series_access", "series {} classified as {:?}", self.series_id, class);
        self.policies = policies;
        self.tags = tags_for(&self.policies, &self.users);
    }

    /// Switch the series to a built-in template, keeping non-template roles.
    pub async fn change_base_acl_switch(&mut self, template_id: u32) -> AppResult<Option<SaveOutcome>> {
        self.change_base_acl_switch_with(template_id, false).await.map(Some)
    }

    /// Template switch saved in one request that also carries the event
    /// override flag.
    pub async fn change_base_acl_switch_with(&mut self, template_id: u32, override_events: bool) -> AppResult<SaveOutcome> {
        let tpl = template::by_id(template_id)
            .ok_or_else(|| AppError::user("unknown_template", format!("no ACL template with id {}", template_id)))?;
        self.selected = Some(tpl);
        let aces = compose_switch_acl(&self.policies, tpl, self.org.as_deref(), self.flags);
        self.replace_policies(aces);
        self.access_save(false, override_events).await
    }

    /// Apply an organization-managed ACL.
    pub async fn change_base_acl(&mut self, managed_acl_id: i64) -> AppResult<Option<SaveOutcome>> {
        let managed = self.api.managed_acl(managed_acl_id).await?;
        debug!(target: "series_access", "applying managed acl {} ({})", managed.id, managed.name);
        self.change_policies(managed.acl.ace, false).await
    }

    /// Append an empty row. Not saved until it names a role.
    pub fn add_policy(&mut self) {
        self.policies.push(Policy::new(None, SERIES_ACTIONS_FIELD));
        self.valid_acl = false;
    }

    pub async fn delete_policy(&mut self, target: &Policy) -> AppResult<SaveOutcome> {
        policy::remove_last_matching(&mut self.policies, target);
        self.access_save(true, false).await
    }

    pub async fn add_user_tag(&mut self, tag: &UserTag) -> AppResult<SaveOutcome> {
        self.policies.push(Policy::read_write(tag.value.clone(), SERIES_ACTIONS_FIELD));
        self.roles.ensure(&tag.value);
        if !self.tags.contains(tag) {
            self.tags.push(tag.clone());
        }
        self.access_save(false, false).await
    }

    pub async fn remove_user_tag(&mut self, tag: &UserTag) -> AppResult<SaveOutcome> {
        self.policies.retain(|p| p.role_str() != Some(tag.value.as_str()));
        self.tags.retain(|t| t != tag);
        self.access_save(false, false).await
    }

    /// A row was edited; save once it names a role.
    pub async fn access_changed(&mut self, role: Option<&str>) -> AppResult<Option<SaveOutcome>> {
        match role {
            Some(r) if !r.is_empty() => self.access_save(true, false).await.map(Some),
            _ => Ok(None),
        }
    }

    pub fn reload_selected_tags(&mut self) {
        self.tags = tags_for(&self.policies, &self.users);
    }

    /// Validate and persist the current policies. `override_events` asks the
    /// backend to rewrite event ACLs too; the organization's update mode may
    /// force it on.
    pub async fn access_save(&mut self, reload_tags: bool, override_events: bool) -> AppResult<SaveOutcome> {
        self.valid_acl = false;
        let check = validate(&self.policies, ValidationMode::Relaxed);
        self.valid_acl = check.rules_valid;
        self.rules_notice.toggle(
            &*self.notes,
            !check.rules_valid,
            Notification::warning(keys::INVALID_ACL_RULES, SERIES_ACL_CONTEXT),
        );
        if !check.is_valid() {
            debug!(target: "series_access", "series {} acl not saved: {:?}", self.series_id, check);
            return Ok(SaveOutcome::Rejected(check));
        }

        let update = AccessUpdate {
            acl: Acl { ace: to_aces(&self.policies) },
            override_events: self.update_mode.override_for(override_events),
        };
        self.request_pending = true;
        let sent = self.api.save_series_access(&self.series_id, &update).await;
        self.request_pending = false;
        if let Err(e) = sent {
            warn!(target: "series_access", "saving acl of series {} failed: {}", self.series_id, e);
            return Err(e);
        }

        self.notes.add(Notification::info(keys::SAVED_ACL_RULES, SERIES_ACL_CONTEXT, SAVED_NOTICE));
        if reload_tags {
            self.reload_selected_tags();
        }
        info!(
            target: "series_access",
            "saved {} entries for series {} (override={})",
            update.acl.ace.len(),
            self.series_id,
            update.override_events
        );
        Ok(SaveOutcome::Saved)
    }

    /// Next page of roles for the picker.
    pub async fn more_roles(&self, search: Option<&str>) -> AppResult<Option<usize>> {
        self.roles.more(&*self.api, search).await
    }
}

/// Directory users whose role has a policy, each at most once.
fn tags_for(policies: &[Policy], users: &[UserTag]) -> Vec<UserTag> {
    let mut out: Vec<UserTag> = Vec::new();
    for p in policies {
        let Some(role) = p.role_str() else { continue };
        if let Some(user) = users.iter().find(|u| u.value == role) {
            if !out.contains(user) {
                out.push(user.clone());
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "access_tests.rs"]
mod access_tests;
