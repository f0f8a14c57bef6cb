//! Series details screen: metadata, theme, feeds and permissions of one series.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::access::SeriesAccessEditor;
use super::metadata::{self, CatalogRef, MainCatalog, MetadataForms, SeriesMetadata};
use super::themes::ThemeSelection;
use crate::client::AdminApi;
use crate::error::{AppError, AppResult};
use crate::feeds::{series_feed_links, FeedDescriptor, FeedLink};
use crate::notify::Notifications;

pub struct SeriesScreen<A: AdminApi> {
    api: Arc<A>,
    notes: Arc<dyn Notifications>,
    series_id: String,
    pub access: SeriesAccessEditor<A>,
    metadata: SeriesMetadata,
    main: Option<MainCatalog>,
    forms: MetadataForms,
    themes: Option<ThemeSelection>,
    feeds: Option<Vec<FeedDescriptor>>,
    feed_links: Vec<FeedLink>,
}

impl<A: AdminApi> SeriesScreen<A> {
    pub fn new(api: Arc<A>, notes: Arc<dyn Notifications>, series_id: impl Into<String>, role_page: usize) -> Self {
        let series_id = series_id.into();
        Self {
            access: SeriesAccessEditor::new(api.clone(), notes.clone(), series_id.clone(), role_page),
            api,
            notes,
            series_id,
            metadata: SeriesMetadata::default(),
            main: None,
            forms: MetadataForms::default(),
            themes: None,
            feeds: None,
            feed_links: Vec::new(),
        }
    }

    /// Load every section. Metadata, themes and permissions are fetched
    /// concurrently; a section that fails to load is left empty. Only a
    /// failure of the permissions section is returned.
    pub async fn open(&mut self) -> AppResult<()> {
        let api = self.api.clone();
        let series_id = self.series_id.clone();
        let (meta, themes, access) = futures_util::join!(
            load_metadata(&*api, &series_id),
            ThemeSelection::load(&*api, &series_id),
            self.access.load(),
        );

        self.forms.reset();
        match meta {
            Ok((rest, main, feeds)) => {
                self.feed_links = match (&main, &feeds) {
                    (Some(m), Some(f)) => m
                        .series_uid
                        .as_deref()
                        .map(|uid| series_feed_links(f, uid))
                        .transpose()
                        .unwrap_or_else(|e| {
                            warn!(target: "series_access", "feed links for {}: {}", series_id, e);
                            None
                        })
                        .unwrap_or_default(),
                    _ => Vec::new(),
                };
                self.metadata = rest;
                self.main = main;
                self.feeds = feeds;
            }
            Err(e) => {
                warn!(target: "series_access", "metadata of series {} unavailable: {}", series_id, e);
                self.metadata = SeriesMetadata::default();
                self.main = None;
                self.feeds = None;
                self.feed_links.clear();
            }
        }
        self.themes = themes
            .map_err(|e| warn!(target: "series_access", "themes of series {} unavailable: {}", series_id, e))
            .ok();
        access?;
        info!(target: "series_access", "opened series {}", series_id);
        Ok(())
    }

    /// Show another series on the same screen.
    pub async fn change(&mut self, series_id: impl Into<String>, role_page: usize) -> AppResult<()> {
        *self = Self::new(self.api.clone(), self.notes.clone(), series_id, role_page);
        self.open().await
    }

    pub fn series_id(&self) -> &str {
        &self.series_id
    }

    pub fn main_catalog(&self) -> Option<&MainCatalog> {
        self.main.as_ref()
    }

    /// Catalogs other than the main one.
    pub fn extended_metadata(&self) -> &SeriesMetadata {
        &self.metadata
    }

    pub fn themes(&self) -> Option<&ThemeSelection> {
        self.themes.as_ref()
    }

    pub fn themes_mut(&mut self) -> Option<&mut ThemeSelection> {
        self.themes.as_mut()
    }

    pub fn feed_content(&self) -> Option<&[FeedDescriptor]> {
        self.feeds.as_deref()
    }

    pub fn feed_links(&self) -> &[FeedLink] {
        &self.feed_links
    }

    /// Set a field value locally before saving it.
    pub fn set_field_value(&mut self, flavor: &str, field_id: &str, value: serde_json::Value) -> AppResult<()> {
        let catalog = self.catalog_mut(flavor)?;
        let field = catalog
            .fields
            .iter_mut()
            .find(|f| f.id == field_id)
            .ok_or_else(|| AppError::not_found("unknown_field", format!("{} has no field {}", flavor, field_id)))?;
        field.value = value;
        Ok(())
    }

    /// Submit one field of a catalog and mark it saved.
    pub async fn save_metadata(&mut self, flavor: &str, field_id: &str) -> AppResult<()> {
        let payload = self.catalog_mut(flavor)?.prepare_for_save(field_id);
        self.api.save_series_metadata(&self.series_id, &payload).await?;
        self.catalog_mut(flavor)?.mark_saved(field_id);
        debug!(target: "series_access", "saved {}#{} of series {}", flavor, field_id, self.series_id);
        Ok(())
    }

    pub async fn save_theme(&mut self, theme_id: Option<String>) -> AppResult<()> {
        let themes = self
            .themes
            .as_mut()
            .ok_or_else(|| AppError::conflict("themes_not_loaded", "themes were not loaded for this series"))?;
        themes.select(theme_id);
        themes.save(&*self.api, &*self.notes, &self.series_id).await
    }

    pub fn statistics_csv_file_name(&self, stats_title: &str) -> String {
        metadata::statistics_csv_file_name(&self.series_id, stats_title)
    }

    fn catalog_mut(&mut self, flavor: &str) -> AppResult<&mut metadata::Catalog> {
        let found = self.forms.resolve(flavor, self.main.as_ref(), &self.metadata);
        let catalog = match found {
            Some(CatalogRef::Main) => self.main.as_mut().map(|m| &mut m.catalog),
            Some(CatalogRef::Extended(i)) => self.metadata.entries.get_mut(i),
            None => None,
        };
        catalog.ok_or_else(|| AppError::not_found("unknown_catalog", format!("no metadata catalog {}", flavor)))
    }
}

/// Metadata split into main and extended catalogs, plus the feed catalogue
/// when the series has a uid to build links for.
async fn load_metadata<A: AdminApi>(
    api: &A,
    series_id: &str,
) -> AppResult<(SeriesMetadata, Option<MainCatalog>, Option<Vec<FeedDescriptor>>)> {
    let mut md = api.series_metadata(series_id).await?;
    let main = metadata::split_main_catalog(&mut md);
    let feeds = match main.as_ref().and_then(|m| m.series_uid.as_ref()) {
        Some(_) => match api.feeds().await {
            Ok(f) => Some(f),
            Err(e) => {
                warn!(target: "series_access", "feeds unavailable: {}", e);
                None
            }
        },
        None => None,
    };
    Ok((md, main, feeds))
}
