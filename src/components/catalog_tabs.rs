//! Catalog Tab Bar Component
//!
//! Switches between the curated catalogs and shows fetch status.

use leptos::prelude::*;

use crate::context::use_app_context;
use crate::models::CatalogKind;
use crate::store::{use_app_store, AppStateStoreFields};

const KINDS: [CatalogKind; 2] = [CatalogKind::Games, CatalogKind::Works];

#[component]
pub fn CatalogTabs(kind: ReadSignal<CatalogKind>, set_kind: WriteSignal<CatalogKind>) -> impl IntoView {
    let store = use_app_store();
    let ctx = use_app_context();

    view! {
        <nav class="catalog-tabs">
            {KINDS.into_iter().map(|k| {
                let class = move || if kind.get() == k { "catalog-tab active" } else { "catalog-tab" };
                view! {
                    <button class=class on:click=move |_| set_kind.set(k)>{k.label()}</button>
                }
            }).collect_view()}

            <span class="catalog-status">
                <Show when=move || store.loading().get()>
                    <span class="status-loading">"Updating…"</span>
                </Show>
                <Show when=move || store.stale().get() && !store.loading().get()>
                    <span class="status-stale">"Showing saved copy"</span>
                </Show>
                {move || store.error().get().map(|e| view! { <span class="status-error">{e}</span> })}
            </span>

            <button
                class="catalog-refresh"
                disabled=move || store.loading().get()
                on:click=move |_| ctx.refresh()
            >
                "Refresh"
            </button>
        </nav>
    }
}
