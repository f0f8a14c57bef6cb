//! Theme selection for a series.

use tracing::info;

use crate::client::{resources, AdminApi, ResourceList};
use crate::error::AppResult;
use crate::notify::{keys, Notification, Notifications, SERIES_THEME_CONTEXT};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeSelection {
    /// Theme id → display name.
    pub themes: ResourceList,
    /// Theme id → description.
    pub descriptions: ResourceList,
    pub selected: Option<String>,
    pub description: Option<String>,
}

impl ThemeSelection {
    /// Fetch the available themes, the series' current theme and the theme
    /// descriptions. The current theme is the first known theme id present in
    /// the series theme response.
    pub async fn load<A: AdminApi>(api: &A, series_id: &str) -> AppResult<Self> {
        let themes = api.resource_list(resources::THEMES_NAME).await?;
        let current = api.series_theme(series_id).await?;
        let selected = themes.keys().find(|id| current.contains_key(id.as_str())).cloned();
        let descriptions = api.resource_list(resources::THEMES_DESCRIPTION).await?;
        let mut out = Self { themes, descriptions, selected, description: None };
        out.update_description();
        Ok(out)
    }

    pub fn select(&mut self, theme_id: Option<String>) {
        self.selected = theme_id.filter(|id| !id.is_empty());
        self.update_description();
    }

    pub fn update_description(&mut self) {
        self.description = self.selected.as_ref().and_then(|id| self.descriptions.get(id)).cloned();
    }

    /// Persist the selection: no theme deletes the assignment. Either way the
    /// user is reminded that existing events keep their old theme until reprocessed.
    pub async fn save<A: AdminApi>(&self, api: &A, notes: &dyn Notifications, series_id: &str) -> AppResult<()> {
        match &self.selected {
            None => api.delete_series_theme(series_id).await?,
            Some(id) => api.save_series_theme(series_id, id).await?,
        }
        info!(target: "series_access", "series {} theme set to {:?}", series_id, self.selected);
        notes.add(Notification::warning(keys::SERIES_THEME_REPROCESS_EXISTING_EVENTS, SERIES_THEME_CONTEXT));
        Ok(())
    }
}
