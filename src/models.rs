//! Frontend Models
//!
//! Remote records as delivered by the catalog provider, curator overrides,
//! and the merged records the UI renders.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Record identifier.
///
/// The provider sends numeric ids while curated lists are hand-written, so
/// both `123` and `"123"` deserialize to the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct RecordId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Str(String),
}

impl From<RawId> for RecordId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Int(n) => RecordId(n.to_string()),
            RawId::Str(s) => RecordId(s.trim().to_string()),
        }
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId(n.to_string())
    }
}

impl From<i32> for RecordId {
    fn from(n: i32) -> Self {
        RecordId(n.to_string())
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.trim().to_string())
    }
}

#[cfg(test)]
impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Record as returned by the catalog provider. Everything but the id is untrusted:
/// a field with an unexpected shape reads as absent instead of failing the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub short_text: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub cover_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub still_cover_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub views_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub published: Option<bool>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub published_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub classification: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub tags: Option<Vec<String>>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value::<Option<T>>(value).ok().flatten())
}

/// Text field that may arrive as a number (e.g. epoch timestamps)
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Decode a provider list record by record. Entries without a usable id are
/// skipped so one bad record cannot hide the rest.
pub fn decode_records(values: Vec<Value>) -> Vec<RemoteRecord> {
    let total = values.len();
    values
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| match serde_json::from_value::<RemoteRecord>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("[MODELS] skipping record {} of {}: {}", i, total, e);
                None
            }
        })
        .collect()
}

/// `deserialize_with` form of [`decode_records`]
pub fn deserialize_records<'de, D>(deserializer: D) -> Result<Vec<RemoteRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<Value>::deserialize(deserializer).map(decode_records)
}

#[cfg(test)]
impl RemoteRecord {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            title: None,
            short_text: None,
            cover_url: None,
            still_cover_url: None,
            url: None,
            views_count: None,
            created_at: None,
            published: None,
            published_at: None,
            classification: None,
            tags: None,
        }
    }
}

/// How the detail panel presents a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayType {
    /// Playable build embedded in the panel
    Embed,
    /// Screenshot gallery with a writeup
    Gallery,
    /// Plain outbound link
    Link,
}

/// Long-form curator content shown in the detail panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichDetail {
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Markdown
    pub body: String,
    #[serde(default)]
    pub gallery: Vec<String>,
}

/// Curator-authored metadata for one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub id: RecordId,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tools: Option<Vec<String>>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub detail: Option<RichDetail>,
    #[serde(default)]
    pub display: Option<DisplayType>,
}

#[cfg(test)]
impl OverrideRecord {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            tags: None,
            description: None,
            tools: None,
            repository: None,
            detail: None,
            display: None,
        }
    }
}

/// Remote record with curator overrides applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub id: RecordId,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub tools: Vec<String>,
    pub repository: Option<String>,
    pub detail: Option<RichDetail>,
    pub display: Option<DisplayType>,
    // Volatile provider fields, never overridden
    pub cover_url: Option<String>,
    pub still_cover_url: Option<String>,
    pub url: Option<String>,
    pub views_count: Option<u64>,
    pub created_at: Option<String>,
}

/// The two curated catalogs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    Games,
    Works,
}

impl CatalogKind {
    pub fn label(&self) -> &'static str {
        match self {
            CatalogKind::Games => "Games",
            CatalogKind::Works => "Other Works",
        }
    }
}
