//! Application Context
//!
//! Shared handles provided via Leptos Context API.

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_slide_panel::SlidePanel;
use std::rc::Rc;

use crate::api::HttpSource;
use crate::cache::{now_ms, BrowserStorage};
use crate::models::MergedRecord;
use crate::service::{CatalogService, FetchTicket};

/// App-wide handles provided via context
#[derive(Clone, Copy)]
pub struct AppContext {
    /// Detail panel for the selected record
    pub panel: SlidePanel<MergedRecord>,
    service: StoredValue<Rc<CatalogService<BrowserStorage>>, LocalStorage>,
    source: StoredValue<Rc<HttpSource>, LocalStorage>,
}

impl AppContext {
    pub fn new(panel: SlidePanel<MergedRecord>, service: Rc<CatalogService<BrowserStorage>>, source: Rc<HttpSource>) -> Self {
        Self {
            panel,
            service: StoredValue::new_local(service),
            source: StoredValue::new_local(source),
        }
    }

    /// Show cached data and fetch if the cache is not fresh
    pub fn mount_catalog(&self) {
        if let Some(ticket) = self.service.with_value(|s| s.mount(now_ms())) {
            self.run(ticket);
        }
    }

    /// Drop any in-flight result
    pub fn unmount_catalog(&self) {
        self.service.try_with_value(|s| s.unmount());
    }

    /// Drop the cache and fetch
    pub fn refresh(&self) {
        let ticket = self.service.with_value(|s| s.hard_refresh());
        self.run(ticket);
    }

    fn run(&self, ticket: FetchTicket) {
        let service = self.service.get_value();
        let source = self.source.get_value();
        spawn_local(async move {
            service.run_fetch(ticket, &*source).await;
        });
    }
}

/// Get the app context
pub fn use_app_context() -> AppContext {
    expect_context::<AppContext>()
}
