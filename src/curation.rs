//! Curated Catalogs
//!
//! Hand-authored override lists, one per catalog. List order is display order.

use std::collections::HashSet;

use crate::config::ConfigError;
use crate::models::{CatalogKind, OverrideRecord};

const GAMES_JSON: &str = include_str!("../curation/games.json");
const WORKS_JSON: &str = include_str!("../curation/works.json");

/// Immutable override lists for every catalog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Curation {
    games: Vec<OverrideRecord>,
    works: Vec<OverrideRecord>,
}

impl Curation {
    pub fn new(games: Vec<OverrideRecord>, works: Vec<OverrideRecord>) -> Self {
        Self { games, works }
    }

    pub fn from_json(games: &str, works: &str) -> Result<Self, ConfigError> {
        let games = parse_list("games curation", games)?;
        let works = parse_list("works curation", works)?;
        Ok(Self::new(games, works))
    }

    /// Lists compiled into the binary
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_json(GAMES_JSON, WORKS_JSON)
    }

    pub fn overrides(&self, kind: CatalogKind) -> &[OverrideRecord] {
        match kind {
            CatalogKind::Games => &self.games,
            CatalogKind::Works => &self.works,
        }
    }
}

fn parse_list(name: &'static str, raw: &str) -> Result<Vec<OverrideRecord>, ConfigError> {
    let list: Vec<OverrideRecord> =
        serde_json::from_str(raw).map_err(|source| ConfigError::Parse { name, source })?;

    let mut seen = HashSet::new();
    for ov in &list {
        if !seen.insert(&ov.id) {
            log::warn!("[CURATION] {} lists id {} more than once", name, ov.id);
        }
    }
    Ok(list)
}
