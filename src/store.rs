//! Global Application State Store
//!
//! Uses Leptos reactive_stores for fine-grained reactivity. The catalog
//! service is the only writer; components read fields.

use leptos::prelude::*;
use reactive_stores::Store;

use crate::models::{CatalogKind, MergedRecord};
use crate::service::CatalogState;

/// Catalog data as the views see it
#[derive(Clone, Debug, Default, Store)]
pub struct AppState {
    /// Curated games, in curation order
    pub games: Vec<MergedRecord>,
    /// Curated other works, in curation order
    pub works: Vec<MergedRecord>,
    pub loading: bool,
    /// Display text of the last fetch failure
    pub error: Option<String>,
    /// Showing an expired cache payload
    pub stale: bool,
}

/// Type alias for the store
pub type AppStore = Store<AppState>;

/// Get the app store from context
pub fn use_app_store() -> AppStore {
    expect_context::<AppStore>()
}

/// Records for one catalog (tracked)
pub fn store_records(store: &AppStore, kind: CatalogKind) -> Vec<MergedRecord> {
    match kind {
        CatalogKind::Games => store.games().get(),
        CatalogKind::Works => store.works().get(),
    }
}

/// Copy a service snapshot into the store, touching only changed fields
pub fn store_apply_catalog(store: &AppStore, state: &CatalogState) {
    if store.games().get_untracked() != state.games {
        *store.games().write() = state.games.clone();
    }
    if store.works().get_untracked() != state.works {
        *store.works().write() = state.works.clone();
    }
    let error = state.error.as_ref().map(|e| e.to_string());
    if store.error().get_untracked() != error {
        *store.error().write() = error;
    }
    if store.loading().get_untracked() != state.loading {
        *store.loading().write() = state.loading;
    }
    if store.stale().get_untracked() != state.stale {
        *store.stale().write() = state.stale;
    }
}
