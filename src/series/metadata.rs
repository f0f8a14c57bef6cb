//! Series metadata catalogs as served by the admin API, plus the small amount
//! of shaping the series screen does before showing and saving them.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};

pub const MAIN_CATALOG_FLAVOR: &str = "dublincore/series";
const TITLE_PARAM_CHARS: usize = 70;
const FIRST_TABINDEX: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Field {
    pub id: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tabindex: Option<u32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub saved: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Catalog {
    pub flavor: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Id of the field a save is meant for.
    #[serde(rename = "attributeToSend", default, skip_serializing_if = "Option::is_none")]
    pub attribute_to_send: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Catalog {
    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Copy to submit for `field_id`: marks the attribute and empties every
    /// option collection, which the backend does not accept back.
    pub fn prepare_for_save(&self, field_id: &str) -> Catalog {
        let mut out = self.clone();
        out.attribute_to_send = Some(field_id.to_string());
        for f in out.fields.iter_mut() {
            if f.collection.is_some() {
                f.collection = Some(Value::Array(Vec::new()));
            }
        }
        out
    }

    pub fn mark_saved(&mut self, field_id: &str) {
        for f in self.fields.iter_mut().filter(|f| f.id == field_id) {
            f.saved = true;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SeriesMetadata {
    #[serde(default)]
    pub entries: Vec<Catalog>,
    /// Set when any field of the main catalog is locked.
    #[serde(default)]
    pub locked: bool,
}

impl SeriesMetadata {
    /// The endpoint returns a bare array of catalogs; an `{"entries": [...]}`
    /// object is accepted too.
    pub fn from_value(v: Value) -> AppResult<Self> {
        match v {
            Value::Array(_) => Ok(Self { entries: serde_json::from_value(v)?, locked: false }),
            Value::Object(_) => Ok(serde_json::from_value(v)?),
            other => Err(AppError::decode("invalid_metadata", format!("unexpected metadata payload: {}", other))),
        }
    }
}

/// The series' own dublincore catalog, lifted out of the metadata list.
#[derive(Debug, Clone, PartialEq)]
pub struct MainCatalog {
    pub catalog: Catalog,
    /// Title shortened for the screen header.
    pub title_param: Option<String>,
    pub series_uid: Option<String>,
}

/// Remove the main catalog from `metadata`, number its fields for tab order
/// and derive the header title, lock flag and series uid.
pub fn split_main_catalog(metadata: &mut SeriesMetadata) -> Option<MainCatalog> {
    let idx = metadata.entries.iter().rposition(|c| c.flavor == MAIN_CATALOG_FLAVOR)?;
    let mut catalog = metadata.entries.remove(idx);

    let mut title_param = None;
    let mut lock_seen = false;
    for (i, field) in catalog.fields.iter_mut().enumerate() {
        if field.id == "title" {
            if let Value::String(s) = &field.value {
                title_param = Some(s.chars().take(TITLE_PARAM_CHARS).collect());
            }
        }
        if !lock_seen && field.locked {
            metadata.locked = true;
            lock_seen = true;
        }
        field.tabindex = Some(FIRST_TABINDEX + i as u32);
    }
    let series_uid = catalog.field("identifier").and_then(|f| f.value.as_str()).map(str::to_string);
    Some(MainCatalog { catalog, title_param, series_uid })
}

/// Where a flavor's catalog lives on the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogRef {
    Main,
    Extended(usize),
}

/// Resolves a flavor to its catalog once and remembers the answer.
#[derive(Debug, Default)]
pub struct MetadataForms {
    resolved: HashMap<String, CatalogRef>,
}

impl MetadataForms {
    pub fn resolve(&mut self, flavor: &str, main: Option<&MainCatalog>, rest: &SeriesMetadata) -> Option<CatalogRef> {
        if let Some(r) = self.resolved.get(flavor) {
            return Some(*r);
        }
        let found = if main.map(|m| m.catalog.flavor == flavor).unwrap_or(false) {
            Some(CatalogRef::Main)
        } else {
            rest.entries.iter().rposition(|c| c.flavor == flavor).map(CatalogRef::Extended)
        }?;
        self.resolved.insert(flavor.to_string(), found);
        Some(found)
    }

    pub fn reset(&mut self) {
        self.resolved.clear();
    }
}

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)[^0-9a-z]").expect("static pattern"));

/// File name for a statistics CSV export of a series.
pub fn statistics_csv_file_name(series_id: &str, stats_title: &str) -> String {
    let sanitized = NON_ALNUM.replace_all(stats_title, "_").to_lowercase();
    format!("export_series_{}_{}.csv", series_id, sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> SeriesMetadata {
        SeriesMetadata::from_value(json!([
            {"flavor": "dublincore/extended", "title": "EXT", "fields": [{"id": "x", "value": "1"}]},
            {"flavor": "dublincore/series", "title": "EVENTS.SERIES.DETAILS.CATALOG", "fields": [
                {"id": "title", "value": "A".repeat(90)},
                {"id": "subject", "value": "", "collection": {"a": "b"}},
                {"id": "creator", "value": [], "locked": true, "readOnly": false},
                {"id": "identifier", "value": "series-uid-1"}
            ]}
        ]))
        .unwrap()
    }

    #[test]
    fn main_catalog_is_lifted_and_numbered() {
        let mut md = sample();
        let main = split_main_catalog(&mut md).unwrap();
        assert_eq!(md.entries.len(), 1);
        assert!(md.locked);
        assert_eq!(main.title_param.as_deref().map(|t| t.len()), Some(70));
        assert_eq!(main.series_uid.as_deref(), Some("series-uid-1"));
        let idx: Vec<Option<u32>> = main.catalog.fields.iter().map(|f| f.tabindex).collect();
        assert_eq!(idx, vec![Some(2), Some(3), Some(4), Some(5)]);
        // unknown attributes are kept for the round trip
        assert!(main.catalog.field("creator").unwrap().extra.contains_key("readOnly"));
    }

    #[test]
    fn save_copy_marks_attribute_and_clears_collections() {
        let mut md = sample();
        let mut main = split_main_catalog(&mut md).unwrap();
        let payload = main.catalog.prepare_for_save("subject");
        assert_eq!(payload.attribute_to_send.as_deref(), Some("subject"));
        assert_eq!(payload.field("subject").unwrap().collection, Some(json!([])));
        assert!(main.catalog.field("subject").unwrap().collection.is_some());

        main.catalog.mark_saved("subject");
        assert!(main.catalog.field("subject").unwrap().saved);
        assert!(!main.catalog.field("title").unwrap().saved);
    }

    #[test]
    fn forms_resolve_by_flavor() {
        let mut md = sample();
        let main = split_main_catalog(&mut md);
        let mut forms = MetadataForms::default();
        assert_eq!(forms.resolve("dublincore/series", main.as_ref(), &md), Some(CatalogRef::Main));
        assert_eq!(forms.resolve("dublincore/extended", main.as_ref(), &md), Some(CatalogRef::Extended(0)));
        assert_eq!(forms.resolve("missing", main.as_ref(), &md), None);
    }

    #[test]
    fn csv_file_name_is_sanitized() {
        assert_eq!(statistics_csv_file_name("s1", "Views per Day!"), "export_series_s1_views_per_day_.csv");
    }
}
