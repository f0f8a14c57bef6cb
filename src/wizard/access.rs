//! Access step of the new-series wizard.
//!
//! Unlike the series permissions tab nothing is saved here; the wizard keeps
//! the policies until the series is created and then submits
//! `access_request()`.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::acl::policy::{self, NEW_SERIES_ACTIONS_FIELD};
use crate::acl::{group_policies, template, to_aces, validate, AclDocument, Policy, Template, TemplateFlags, ValidationMode};
use crate::client::roles::Paging;
use crate::client::{resources, AdminApi, ResourceList, RoleDirectory, UserTag};
use crate::error::{AppError, AppResult};
use crate::identity::{AclDefaults, CurrentUser};
use crate::notify::{keys, Notification, NotificationSlot, Notifications, SERIES_ACL_CONTEXT};

pub struct NewSeriesAccess<A: AdminApi> {
    api: Arc<A>,
    notes: Arc<dyn Notifications>,
    user: CurrentUser,
    policies: Vec<Policy>,
    selected: Option<&'static Template>,
    switch_role: Option<u32>,
    flags: TemplateFlags,
    tags: Vec<UserTag>,
    users: Vec<UserTag>,
    roles: RoleDirectory,
    actions: ResourceList,
    invalid_rule: bool,
    has_rights: bool,
    rights_notice: NotificationSlot,
    rules_notice: NotificationSlot,
    missing_notice: NotificationSlot,
}

impl<A: AdminApi> NewSeriesAccess<A> {
    pub fn new(api: Arc<A>, notes: Arc<dyn Notifications>, user: CurrentUser, role_page: usize) -> Self {
        let mut out = Self {
            api,
            notes,
            user,
            policies: Vec::new(),
            selected: None,
            switch_role: None,
            flags: TemplateFlags::default(),
            tags: Vec::new(),
            users: Vec::new(),
            roles: RoleDirectory::new(role_page, Paging::FirstPage),
            actions: ResourceList::new(),
            invalid_rule: false,
            has_rights: false,
            rights_notice: NotificationSlot::default(),
            rules_notice: NotificationSlot::default(),
            missing_notice: NotificationSlot::default(),
        };
        out.reset();
        out
    }

    /// Fetch the user directory, the action labels and the first roles page.
    /// Failures leave the affected list empty.
    pub async fn load(&mut self) {
        if let Err(e) = self.load_users().await {
            warn!(target: "series_access", "user directory unavailable: {}", e);
        }
        if let Err(e) = self.load_actions().await {
            warn!(target: "series_access", "acl actions unavailable: {}", e);
        }
        if let Err(e) = self.more_roles(None).await {
            warn!(target: "series_access", "roles unavailable: {}", e);
        }
    }

    /// Back to the organization defaults with only the creator's policy and
    /// the default template applied.
    pub fn reset(&mut self) {
        let defaults = AclDefaults::from_org(&self.user.org);
        self.tags.clear();
        self.policies = self.user_policy().into_iter().collect();
        self.selected = defaults.template;
        self.switch_role = defaults.template.map(|t| t.id);
        self.flags = defaults.flags;
        debug!(target: "series_access", "wizard reset to template {:?}", self.selected.map(|t| t.key));
        self.apply_selected();
    }

    fn user_policy(&self) -> Option<Policy> {
        self.user.user_role().map(|r| Policy::read_write(r, NEW_SERIES_ACTIONS_FIELD))
    }

    pub fn select_template(&mut self, template_id: u32) -> AppResult<()> {
        let tpl = template::by_id(template_id)
            .ok_or_else(|| AppError::user("unknown_template", format!("no ACL template with id {}", template_id)))?;
        self.switch_role = Some(tpl.id);
        self.selected = Some(tpl);
        Ok(())
    }

    pub fn set_flags(&mut self, flags: TemplateFlags) {
        self.flags = flags;
    }

    /// Rebuild the policies from the selected template. With `preset` the
    /// current selection is used as is; otherwise the template last chosen by
    /// id is looked up again.
    pub fn change_base_acl(&mut self, preset: bool) -> AppResult<()> {
        if !preset {
            if let Some(id) = self.switch_role {
                self.selected = Some(
                    template::by_id(id)
                        .ok_or_else(|| AppError::user("unknown_template", format!("no ACL template with id {}", id)))?,
                );
            }
        }
        self.apply_selected();
        Ok(())
    }

    /// Policies of the selected template, with the creator's policy in front
    /// when the template does not grant it already.
    fn apply_selected(&mut self) {
        let Some(tpl) = self.selected else { return };
        self.switch_role = Some(tpl.id);

        let grouped = group_policies(&tpl.expand(self.user.aai_org(), self.flags), NEW_SERIES_ACTIONS_FIELD);
        let mut policies = Vec::with_capacity(grouped.len() + 1);
        if let Some(own) = self.user_policy() {
            if policy::find(&grouped, own.role_str().unwrap_or_default()).is_none() {
                policies.push(own);
            }
        }
        policies.extend(grouped);
        self.policies = policies;
    }

    pub fn add_policy(&mut self) {
        self.policies.push(Policy::new(None, NEW_SERIES_ACTIONS_FIELD));
    }

    pub fn delete_policy(&mut self, target: &Policy) {
        policy::remove_last_matching(&mut self.policies, target);
    }

    pub fn add_user_tag(&mut self, tag: &UserTag) {
        self.policies.push(Policy::read_write(tag.value.clone(), NEW_SERIES_ACTIONS_FIELD));
        if !self.tags.contains(tag) {
            self.tags.push(tag.clone());
        }
    }

    pub fn remove_user_tag(&mut self, tag: &UserTag) {
        self.delete_policy(&Policy::read_write(tag.value.clone(), NEW_SERIES_ACTIONS_FIELD));
        self.tags.retain(|t| t != tag);
    }

    /// Directory users whose name contains `query`, ignoring case.
    pub fn load_tags(&self, query: &str) -> Vec<UserTag> {
        let needle = query.to_lowercase();
        self.users.iter().filter(|u| u.name.to_lowercase().contains(&needle)).cloned().collect()
    }

    /// Whether the step may be left. Keeps the missing read/write warning in
    /// sync with the answer.
    pub fn is_valid(&mut self) -> bool {
        let check = validate(&self.policies, ValidationMode::Strict);
        self.invalid_rule = !check.rules_valid;
        self.has_rights = check.has_rights;
        if check.has_rights {
            self.rights_notice.clear(&*self.notes);
        } else {
            self.rights_notice.ensure(
                &*self.notes,
                Notification::warning(keys::SERIES_ACL_MISSING_READWRITE_ROLE, SERIES_ACL_CONTEXT),
            );
        }
        check.is_valid()
    }

    /// Refresh the rule warnings from the last `is_valid` result.
    pub fn check_notifications(&mut self) {
        let notes = &*self.notes;
        self.rules_notice.toggle(
            notes,
            self.invalid_rule,
            Notification::warning(keys::INVALID_ACL_RULES, SERIES_ACL_CONTEXT),
        );
        self.missing_notice.toggle(
            notes,
            !self.has_rights,
            Notification::warning(keys::MISSING_ACL_RULES, SERIES_ACL_CONTEXT),
        );
    }

    /// Forget the known roles and fetch the first page again.
    pub async fn reload(&mut self) -> AppResult<Option<usize>> {
        self.roles.clear();
        self.more_roles(None).await
    }

    /// Roles for the picker; always the first page, narrowed by `search`.
    pub async fn more_roles(&self, search: Option<&str>) -> AppResult<Option<usize>> {
        self.roles.more(&*self.api, search).await
    }

    pub async fn load_actions(&mut self) -> AppResult<()> {
        self.actions = self.api.resource_list(resources::ACL_ACTIONS).await?;
        Ok(())
    }

    pub async fn load_users(&mut self) -> AppResult<()> {
        self.users = self.api.switch_users().await?;
        Ok(())
    }

    /// The ACL to submit together with the new series.
    pub fn access_request(&self) -> AclDocument {
        AclDocument::new(to_aces(&self.policies))
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    pub fn policies_mut(&mut self) -> &mut Vec<Policy> {
        &mut self.policies
    }

    pub fn selected_template(&self) -> Option<&'static Template> {
        self.selected
    }

    pub fn flags(&self) -> TemplateFlags {
        self.flags
    }

    pub fn tags(&self) -> &[UserTag] {
        &self.tags
    }

    pub fn users(&self) -> &[UserTag] {
        &self.users
    }

    pub fn roles(&self) -> &RoleDirectory {
        &self.roles
    }

    pub fn actions(&self) -> &ResourceList {
        &self.actions
    }

    pub fn has_actions(&self) -> bool {
        !self.actions.is_empty()
    }
}

#[cfg(test)]
#[path = "access_tests.rs"]
mod access_tests;
