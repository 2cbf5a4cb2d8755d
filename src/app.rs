//! Catalog Frontend App
//!
//! Wires configuration, the catalog service and the detail panel together.

use leptos::prelude::*;
use leptos_slide_panel::use_slide_panel;
use reactive_stores::Store;
use std::rc::Rc;

use crate::api::HttpSource;
use crate::cache::BrowserStorage;
use crate::components::{CatalogGrid, CatalogTabs, DetailPanel};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::curation::Curation;
use crate::models::{CatalogKind, MergedRecord};
use crate::service::CatalogService;
use crate::store::{store_apply_catalog, AppState};

#[component]
pub fn App() -> impl IntoView {
    let config = AppConfig::load();
    let curation = Curation::embedded().unwrap_or_else(|e| {
        log::error!("[APP] {}, showing no curated records", e);
        Curation::default()
    });

    // State
    let store = Store::new(AppState::default());
    let (kind, set_kind) = signal(CatalogKind::Games);
    let panel = use_slide_panel::<MergedRecord>(config.close_delay_ms);

    let service = Rc::new(CatalogService::from_config(BrowserStorage, &config, Rc::new(curation)));
    service.subscribe(move |state| store_apply_catalog(&store, state));
    let source = Rc::new(HttpSource::new(config.endpoint.clone()));

    // Provide context to all children
    let ctx = AppContext::new(panel, service, source);
    provide_context(store);
    provide_context(ctx);

    ctx.mount_catalog();
    on_cleanup(move || ctx.unmount_catalog());

    // Switching catalogs closes the panel
    Effect::new(move |prev: Option<CatalogKind>| {
        let current = kind.get();
        if prev.is_some_and(|p| p != current) {
            panel.close();
        }
        current
    });

    view! {
        <div class="app-layout">
            <header class="masthead">
                <h1>"Portfolio"</h1>
                <CatalogTabs kind=kind set_kind=set_kind />
            </header>
            <main class="main-content">
                <CatalogGrid kind=kind />
            </main>
            <DetailPanel />
        </div>
    }
}
