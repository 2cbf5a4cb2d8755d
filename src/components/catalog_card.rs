//! Catalog Card Component

use leptos::prelude::*;

use crate::context::use_app_context;
use crate::markdown::encode_url;
use crate::models::MergedRecord;

/// Presentation fallbacks for fields neither source filled in
pub(crate) fn display_title(record: &MergedRecord) -> String {
    record.title.clone().unwrap_or_else(|| "Untitled".to_string())
}

pub(crate) fn display_cover(record: &MergedRecord) -> Option<String> {
    record
        .still_cover_url
        .as_deref()
        .or(record.cover_url.as_deref())
        .map(encode_url)
}

#[component]
pub fn CatalogCard(record: MergedRecord) -> impl IntoView {
    let ctx = use_app_context();

    let title = display_title(&record);
    let cover = display_cover(&record);
    let description = record.description.clone().unwrap_or_default();
    let views = record.views_count.map(|n| format!("{} views", n));
    let tags = record.tags.clone();

    let on_click = move |_| ctx.panel.select(record.clone());

    view! {
        <article class="catalog-card" on:click=on_click>
            {cover.map(|src| view! { <img class="card-cover" src=src alt=title.clone() loading="lazy" /> })}
            <h3 class="card-title">{title.clone()}</h3>
            <p class="card-description">{description}</p>
            <div class="card-meta">
                {views.map(|v| view! { <span class="card-views">{v}</span> })}
                <ul class="card-tags">
                    {tags.into_iter().map(|t| view! { <li class="tag">{t}</li> }).collect_view()}
                </ul>
            </div>
        </article>
    }
}
