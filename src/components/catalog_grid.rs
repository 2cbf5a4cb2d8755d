//! Catalog Grid Component
//!
//! Newspaper-style grid. Each card's classes come from its grid position.

use leptos::prelude::*;

use crate::components::CatalogCard;
use crate::layout::layout;
use crate::models::CatalogKind;
use crate::store::{store_records, use_app_store, AppStateStoreFields};

#[component]
pub fn CatalogGrid(kind: ReadSignal<CatalogKind>) -> impl IntoView {
    let store = use_app_store();

    let placed = move || {
        let records = store_records(&store, kind.get());
        let total = records.len();
        layout(total).zip(records).collect::<Vec<_>>()
    };

    let is_empty = move || store_records(&store, kind.get()).is_empty();

    view! {
        <section class="catalog-grid">
            <Show when=move || is_empty() && !store.loading().get()>
                <p class="catalog-empty">"Nothing to show yet."</p>
            </Show>
            <For
                each=placed
                // Position is part of the key so cards re-render when they shift rows
                key=|(position, record)| (record.id.clone(), position.class_name())
                children=move |(position, record)| {
                    view! {
                        <div class=position.class_name()>
                            <CatalogCard record=record />
                        </div>
                    }
                }
            />
        </section>
    }
}
