//! Catalog Service
//!
//! Drives mount → cache lookup → fetch → cache write → merge and publishes
//! the resulting `CatalogState` to subscribers.
//!
//! Fetches are identified by a `FetchTicket`. Only the most recently issued
//! ticket may change state; anything older, or anything resolving after
//! `unmount`, is dropped.

use std::cell::RefCell;
use std::rc::Rc;

use crate::api::{CatalogSource, FetchError};
use crate::cache::{now_ms, CacheEnvelope, ItemCache, KeyValueStore};
use crate::config::{AppConfig, FallbackPolicy};
use crate::curation::Curation;
use crate::merge::merge_catalog;
use crate::models::{CatalogKind, MergedRecord, RemoteRecord};

/// Snapshot published to the UI
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogState {
    pub games: Vec<MergedRecord>,
    pub works: Vec<MergedRecord>,
    pub loading: bool,
    pub error: Option<FetchError>,
    /// Records come from an expired cache entry
    pub stale: bool,
}

/// Identifies one issued fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

type Listener = Rc<dyn Fn(&CatalogState)>;

struct Inner {
    state: CatalogState,
    generation: u64,
    mounted: bool,
    listeners: Vec<Listener>,
}

pub struct CatalogService<S> {
    cache: ItemCache<S>,
    cache_key: String,
    curation: Rc<Curation>,
    fallback: FallbackPolicy,
    inner: RefCell<Inner>,
}

impl<S: KeyValueStore> CatalogService<S> {
    pub fn new(cache: ItemCache<S>, cache_key: impl Into<String>, curation: Rc<Curation>, fallback: FallbackPolicy) -> Self {
        Self {
            cache,
            cache_key: cache_key.into(),
            curation,
            fallback,
            inner: RefCell::new(Inner {
                state: CatalogState::default(),
                generation: 0,
                mounted: false,
                listeners: Vec::new(),
            }),
        }
    }

    pub fn from_config(store: S, config: &AppConfig, curation: Rc<Curation>) -> Self {
        let cache = ItemCache::with_ttl(store, config.cache_ttl());
        Self::new(cache, config.cache_key.clone(), curation, config.fallback)
    }

    /// Current snapshot
    pub fn state(&self) -> CatalogState {
        self.inner.borrow().state.clone()
    }

    /// Call `listener` with the current state and on every change
    pub fn subscribe(&self, listener: impl Fn(&CatalogState) + 'static) {
        let listener: Listener = Rc::new(listener);
        let snapshot = {
            let mut inner = self.inner.borrow_mut();
            inner.listeners.push(listener.clone());
            inner.state.clone()
        };
        listener(&snapshot);
    }

    /// Show whatever the cache allows and decide whether to fetch.
    ///
    /// Returns the ticket of the fetch to run, or `None` when the cache is
    /// fresh and no request is needed.
    pub fn mount(&self, now: u64) -> Option<FetchTicket> {
        self.inner.borrow_mut().mounted = true;

        match self.cache.read(&self.cache_key) {
            Some(envelope) if self.cache.is_fresh(&envelope, now) => {
                log::info!("[CATALOG] serving {} cached records", envelope.payload.len());
                self.update(|state| {
                    self.apply_payload(state, &envelope.payload);
                    state.loading = false;
                    state.error = None;
                    state.stale = false;
                });
                None
            }
            Some(envelope) if self.fallback == FallbackPolicy::ServeStale => {
                log::info!("[CATALOG] cache expired, showing stale records while refreshing");
                self.update(|state| {
                    self.apply_payload(state, &envelope.payload);
                    state.stale = true;
                });
                Some(self.begin_fetch())
            }
            _ => Some(self.begin_fetch()),
        }
    }

    /// Stop accepting results; in-flight fetches will be dropped
    pub fn unmount(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.mounted = false;
        inner.generation += 1;
    }

    /// Issue a new fetch, superseding any in flight
    pub fn begin_fetch(&self) -> FetchTicket {
        let ticket = {
            let mut inner = self.inner.borrow_mut();
            inner.generation += 1;
            FetchTicket(inner.generation)
        };
        self.update(|state| state.loading = true);
        ticket
    }

    /// Drop the cached payload and fetch. A failure afterwards has no stale
    /// copy to fall back on, so the records on screen are left as they are.
    pub fn hard_refresh(&self) -> FetchTicket {
        log::info!("[CATALOG] hard refresh, clearing {}", self.cache_key);
        self.cache.clear(&self.cache_key);
        self.begin_fetch()
    }

    /// Apply a fetch result. Returns false if the result was discarded.
    pub fn complete(&self, ticket: FetchTicket, result: Result<Vec<RemoteRecord>, FetchError>, now: u64) -> bool {
        {
            let inner = self.inner.borrow();
            if !inner.mounted || ticket.0 != inner.generation {
                log::debug!("[CATALOG] dropping result of superseded fetch {:?}", ticket);
                return false;
            }
        }

        match result {
            Ok(payload) => {
                log::info!("[CATALOG] fetched {} records", payload.len());
                self.cache.write(&self.cache_key, &payload, now);
                self.update(|state| {
                    self.apply_payload(state, &payload);
                    state.loading = false;
                    state.error = None;
                    state.stale = false;
                });
            }
            Err(e) => self.fail(e),
        }
        true
    }

    /// Run the fetch for `ticket` against `source` and apply its result
    pub async fn run_fetch(&self, ticket: FetchTicket, source: &dyn CatalogSource) -> bool {
        let result = source.fetch().await;
        self.complete(ticket, result, now_ms())
    }

    fn fail(&self, error: FetchError) {
        let fallback = match self.fallback {
            FallbackPolicy::ServeStale => self.cache.read(&self.cache_key),
            FallbackPolicy::SurfaceError => None,
        };

        match fallback {
            Some(CacheEnvelope { payload, .. }) => {
                log::warn!("[CATALOG] {}; keeping cached records", error);
                self.update(|state| {
                    self.apply_payload(state, &payload);
                    state.loading = false;
                    state.error = None;
                    state.stale = true;
                });
            }
            None => {
                log::error!("[CATALOG] {}", error);
                self.update(|state| {
                    state.loading = false;
                    state.error = Some(error);
                });
            }
        }
    }

    fn apply_payload(&self, state: &mut CatalogState, payload: &[RemoteRecord]) {
        state.games = merge_catalog(payload, &self.curation, CatalogKind::Games);
        state.works = merge_catalog(payload, &self.curation, CatalogKind::Works);
    }

    fn update(&self, f: impl FnOnce(&mut CatalogState)) {
        let (snapshot, listeners) = {
            let mut inner = self.inner.borrow_mut();
            f(&mut inner.state);
            (inner.state.clone(), inner.listeners.clone())
        };
        // Listeners run outside the borrow so they may call back in
        for listener in listeners {
            listener(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::models::OverrideRecord;
    use std::cell::Cell;

    const KEY: &str = "catalog-test";
    const T0: u64 = 1_700_000_000_000;
    const HOUR: u64 = 3_600_000;

    fn public(id: &str) -> RemoteRecord {
        let mut r = RemoteRecord::new(id);
        r.short_text = Some(format!("remote {}", id));
        r.tags = Some(vec!["remote".to_string()]);
        r.published = Some(true);
        r
    }

    fn curated(id: &str) -> OverrideRecord {
        let mut ov = OverrideRecord::new(id);
        ov.description = Some(format!("curated {}", id));
        ov.tags = Some(vec![format!("tag-{}", id)]);
        ov
    }

    fn curation() -> Rc<Curation> {
        Rc::new(Curation::new(
            vec![curated("c"), curated("a"), curated("b")],
            vec![curated("w")],
        ))
    }

    fn service(store: MemoryStore, fallback: FallbackPolicy) -> CatalogService<MemoryStore> {
        CatalogService::new(ItemCache::new(store), KEY, curation(), fallback)
    }

    fn nine_records() -> Vec<RemoteRecord> {
        ["a", "b", "c", "d", "e", "f", "g", "h", "w"].iter().map(|id| public(id)).collect()
    }

    fn game_ids(state: &CatalogState) -> Vec<&str> {
        state.games.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_end_to_end_curated_order() {
        let svc = service(MemoryStore::new(), FallbackPolicy::SurfaceError);
        let ticket = svc.mount(T0).expect("empty cache must fetch");
        assert!(svc.state().loading);

        assert!(svc.complete(ticket, Ok(nine_records()), T0));
        let state = svc.state();
        assert!(!state.loading);
        assert_eq!(game_ids(&state), vec!["c", "a", "b"]);
        for record in &state.games {
            assert_eq!(record.description, Some(format!("curated {}", record.id)));
            assert_eq!(record.tags, vec![format!("tag-{}", record.id)]);
        }
        assert_eq!(state.works.len(), 1);
    }

    #[test]
    fn test_fresh_cache_skips_fetch() {
        let svc = service(MemoryStore::new(), FallbackPolicy::SurfaceError);
        let ticket = svc.mount(T0).unwrap();
        svc.complete(ticket, Ok(nine_records()), T0);
        svc.unmount();

        assert!(svc.mount(T0 + HOUR - 1).is_none());
        let state = svc.state();
        assert!(!state.loading);
        assert_eq!(game_ids(&state), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_expired_cache_fetches_again() {
        let svc = service(MemoryStore::new(), FallbackPolicy::SurfaceError);
        let ticket = svc.mount(T0).unwrap();
        svc.complete(ticket, Ok(nine_records()), T0);
        svc.unmount();

        assert!(svc.mount(T0 + HOUR).is_some());
    }

    #[test]
    fn test_last_issued_wins() {
        let svc = service(MemoryStore::new(), FallbackPolicy::SurfaceError);
        let first = svc.mount(T0).unwrap();
        let second = svc.begin_fetch();

        // The newer request resolves first, the older one arrives late
        assert!(svc.complete(second, Ok(vec![public("a")]), T0));
        assert!(!svc.complete(first, Ok(nine_records()), T0));

        assert_eq!(game_ids(&svc.state()), vec!["a"]);
    }

    #[test]
    fn test_superseded_result_dropped_even_if_first() {
        let svc = service(MemoryStore::new(), FallbackPolicy::SurfaceError);
        let first = svc.mount(T0).unwrap();
        let second = svc.begin_fetch();

        assert!(!svc.complete(first, Ok(nine_records()), T0));
        assert!(svc.state().loading);
        assert!(svc.state().games.is_empty());

        assert!(svc.complete(second, Ok(vec![public("b")]), T0));
        assert_eq!(game_ids(&svc.state()), vec!["b"]);
        assert!(!svc.state().loading);
    }

    #[test]
    fn test_result_after_unmount_dropped() {
        let svc = service(MemoryStore::new(), FallbackPolicy::SurfaceError);
        let ticket = svc.mount(T0).unwrap();
        svc.unmount();

        assert!(!svc.complete(ticket, Ok(nine_records()), T0));
        assert!(svc.state().games.is_empty());
        assert!(svc.cache.read(KEY).is_none());
    }

    #[test]
    fn test_error_surfaced_without_cache() {
        let svc = service(MemoryStore::new(), FallbackPolicy::ServeStale);
        let ticket = svc.mount(T0).unwrap();
        let err = FetchError::Status { status: 503, message: None };

        assert!(svc.complete(ticket, Err(err.clone()), T0));
        let state = svc.state();
        assert_eq!(state.error, Some(err));
        assert!(!state.loading);
        assert!(state.games.is_empty());
    }

    #[test]
    fn test_serve_stale_on_failure() {
        let svc = service(MemoryStore::new(), FallbackPolicy::ServeStale);
        let ticket = svc.mount(T0).unwrap();
        svc.complete(ticket, Ok(nine_records()), T0);
        svc.unmount();

        let ticket = svc.mount(T0 + 2 * HOUR).expect("expired cache must refetch");
        // Stale records are visible while the refresh is in flight
        let state = svc.state();
        assert!(state.loading && state.stale);
        assert_eq!(game_ids(&state), vec!["c", "a", "b"]);

        svc.complete(ticket, Err(FetchError::Network("offline".to_string())), T0 + 2 * HOUR);
        let state = svc.state();
        assert!(!state.loading);
        assert!(state.stale);
        assert!(state.error.is_none());
        assert_eq!(game_ids(&state), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_serve_stale_recovers_on_success() {
        let svc = service(MemoryStore::new(), FallbackPolicy::ServeStale);
        let ticket = svc.mount(T0).unwrap();
        svc.complete(ticket, Ok(nine_records()), T0);
        svc.unmount();

        let later = T0 + 2 * HOUR;
        let ticket = svc.mount(later).unwrap();
        assert!(svc.state().stale);

        assert!(svc.complete(ticket, Ok(vec![public("b"), public("a")]), later));
        let state = svc.state();
        assert!(!state.stale);
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert_eq!(game_ids(&state), vec!["a", "b"]);
        assert!(state.works.is_empty());

        let envelope = svc.cache.read(KEY).unwrap();
        assert_eq!(envelope.captured_at, later);
        assert_eq!(envelope.payload.len(), 2);
    }

    #[test]
    fn test_hard_refresh_clears_cache() {
        let svc = service(MemoryStore::new(), FallbackPolicy::ServeStale);
        let ticket = svc.mount(T0).unwrap();
        svc.complete(ticket, Ok(nine_records()), T0);

        let ticket = svc.hard_refresh();
        assert!(svc.state().loading);
        assert!(svc.cache.read(KEY).is_none());

        // Nothing cached to fall back on: the error shows, records stay
        let err = FetchError::Network("offline".to_string());
        svc.complete(ticket, Err(err.clone()), T0 + 10);
        let state = svc.state();
        assert_eq!(state.error, Some(err));
        assert!(!state.stale);
        assert_eq!(game_ids(&state), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_bad_remote_record_does_not_blank_catalog() {
        let body = r#"{"games": [
            {"id": "c", "published": true},
            {"title": "missing id"},
            {"id": "a", "published": true, "views_count": -3, "created_at": 1700000000},
            {"id": null}
        ]}"#;
        let payload = crate::api::decode_response(200, body).unwrap();

        let svc = service(MemoryStore::new(), FallbackPolicy::SurfaceError);
        let ticket = svc.mount(T0).unwrap();
        assert!(svc.complete(ticket, Ok(payload), T0));
        let state = svc.state();
        assert!(state.error.is_none());
        assert_eq!(game_ids(&state), vec!["c", "a"]);
        assert_eq!(state.games[1].views_count, None);
        assert_eq!(state.games[1].created_at.as_deref(), Some("1700000000"));

        // The cached copy round-trips the surviving records
        svc.unmount();
        assert!(svc.mount(T0 + 1).is_none());
        assert_eq!(game_ids(&svc.state()), vec!["c", "a"]);
    }

    #[test]
    fn test_surface_error_ignores_stale_cache() {
        let store = MemoryStore::new();
        ItemCache::new(&store).write(KEY, &nine_records(), T0);
        let svc = service(store, FallbackPolicy::SurfaceError);

        let ticket = svc.mount(T0 + 2 * HOUR).unwrap();
        assert!(svc.state().games.is_empty());

        svc.complete(ticket, Err(FetchError::Network("offline".to_string())), T0 + 2 * HOUR);
        let state = svc.state();
        assert!(state.games.is_empty());
        assert_eq!(state.error, Some(FetchError::Network("offline".to_string())));
    }

    #[test]
    fn test_success_clears_error_and_replaces_cache() {
        let svc = service(MemoryStore::new(), FallbackPolicy::SurfaceError);
        let ticket = svc.mount(T0).unwrap();
        svc.complete(ticket, Err(FetchError::Network("offline".to_string())), T0);

        let ticket = svc.begin_fetch();
        svc.complete(ticket, Ok(vec![public("a"), public("b")]), T0 + 5);
        let state = svc.state();
        assert!(state.error.is_none());
        assert_eq!(game_ids(&state), vec!["a", "b"]);

        let envelope = svc.cache.read(KEY).unwrap();
        assert_eq!(envelope.payload.len(), 2);
        assert_eq!(envelope.captured_at, T0 + 5);
    }

    #[test]
    fn test_storage_failure_does_not_surface() {
        let svc = service(MemoryStore::unavailable(), FallbackPolicy::ServeStale);
        let ticket = svc.mount(T0).unwrap();
        assert!(svc.complete(ticket, Ok(nine_records()), T0));
        let state = svc.state();
        assert!(state.error.is_none());
        assert_eq!(state.games.len(), 3);
    }

    #[test]
    fn test_subscribers_see_every_change() {
        let svc = service(MemoryStore::new(), FallbackPolicy::SurfaceError);
        let calls = Rc::new(Cell::new(0));
        let last_loading = Rc::new(Cell::new(false));
        {
            let calls = calls.clone();
            let last_loading = last_loading.clone();
            svc.subscribe(move |state| {
                calls.set(calls.get() + 1);
                last_loading.set(state.loading);
            });
        }
        assert_eq!(calls.get(), 1);

        let ticket = svc.mount(T0).unwrap();
        assert!(last_loading.get());
        svc.complete(ticket, Ok(nine_records()), T0);
        assert!(!last_loading.get());
        assert_eq!(calls.get(), 3);
    }
}
