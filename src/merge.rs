//! Catalog Merge
//!
//! Overlays curated metadata onto provider records. The curated list decides
//! which records appear and in what order.

use std::collections::HashMap;

use crate::curation::Curation;
use crate::models::{CatalogKind, MergedRecord, OverrideRecord, RecordId, RemoteRecord};

/// Classifications that keep a record hidden
const HIDDEN_CLASSIFICATIONS: &[&str] = &["draft", "restricted"];

/// A provider record is public if any visibility signal says so
pub fn is_public(record: &RemoteRecord) -> bool {
    if record.published == Some(true) {
        return true;
    }
    if record.published_at.as_deref().is_some_and(|s| !s.trim().is_empty()) {
        return true;
    }
    match record.classification.as_deref() {
        Some(c) => {
            let c = c.trim();
            !c.is_empty() && !HIDDEN_CLASSIFICATIONS.iter().any(|h| h.eq_ignore_ascii_case(c))
        }
        None => false,
    }
}

/// Merge `remote` into `overrides`, keeping override order.
///
/// Overrides with no public remote counterpart are dropped.
pub fn merge(remote: &[RemoteRecord], overrides: &[OverrideRecord]) -> Vec<MergedRecord> {
    // First occurrence wins if the provider repeats an id
    let mut by_id: HashMap<&RecordId, &RemoteRecord> = HashMap::new();
    for record in remote.iter().filter(|r| is_public(r)) {
        by_id.entry(&record.id).or_insert(record);
    }

    overrides
        .iter()
        .filter_map(|ov| match by_id.get(&ov.id) {
            Some(record) => Some(apply_override(record, ov)),
            None => {
                log::warn!("[MERGE] no public remote record for curated id {}, skipping", ov.id);
                None
            }
        })
        .collect()
}

/// Merge the curated list for one catalog
pub fn merge_catalog(remote: &[RemoteRecord], curation: &Curation, kind: CatalogKind) -> Vec<MergedRecord> {
    merge(remote, curation.overrides(kind))
}

fn apply_override(remote: &RemoteRecord, ov: &OverrideRecord) -> MergedRecord {
    MergedRecord {
        id: remote.id.clone(),
        title: remote.title.clone(),
        description: ov.description.clone().or_else(|| remote.short_text.clone()),
        tags: ov
            .tags
            .clone()
            .or_else(|| remote.tags.clone())
            .unwrap_or_default(),
        tools: ov.tools.clone().unwrap_or_default(),
        repository: ov.repository.clone(),
        detail: ov.detail.clone(),
        display: ov.display,
        cover_url: remote.cover_url.clone(),
        still_cover_url: remote.still_cover_url.clone(),
        url: remote.url.clone(),
        views_count: remote.views_count,
        created_at: remote.created_at.clone(),
    }
}
