//! Public feed links for a series, derived from the backend's feed catalogue.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

const SERIES_FEED: &str = "Series";
const SERIES_ID_TOKEN: &str = "<series_id>";
const TYPE_TOKEN: &str = "<type>";
const VERSION_TOKEN: &str = "<version>";

/// One entry of `/admin-ng/feeds/feeds`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedDescriptor {
    pub name: String,
    pub identifier: String,
    pub pattern: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedLink {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    pub link: String,
}

/// Build the atom 0.3, atom 1.0 and rss 2.0 links for `series_uid` from the
/// `Series` feed entry. No entry means no links.
pub fn series_feed_links(feeds: &[FeedDescriptor], series_uid: &str) -> AppResult<Vec<FeedLink>> {
    let Some(feed) = feeds.iter().rev().find(|f| f.name == SERIES_FEED) else {
        return Ok(Vec::new());
    };
    let host = feed.identifier.split("/series").next().unwrap_or_default();
    let pattern = format!("{}{}", host, feed.pattern);
    let uid_link = format!("{}{}", pattern.split(SERIES_ID_TOKEN).next().unwrap_or_default(), series_uid);

    let (head, after_type) = uid_link
        .split_once(TYPE_TOKEN)
        .ok_or_else(|| AppError::decode("invalid_feed_pattern", format!("no {} in {}", TYPE_TOKEN, feed.pattern)))?;
    let mut parts = after_type.split(VERSION_TOKEN);
    let middle = parts.next().unwrap_or_default();
    let tail = parts
        .next()
        .ok_or_else(|| AppError::decode("invalid_feed_pattern", format!("no {} in {}", VERSION_TOKEN, feed.pattern)))?;

    let link = |kind: &str, version: &str| FeedLink {
        kind: kind.to_string(),
        version: version.to_string(),
        link: format!("{}{}{}{}{}", head, kind, middle, version, tail),
    };
    Ok(vec![link("atom", "0.3"), link("atom", "1.0"), link("rss", "2.0")])
}
