//! Detail Panel Component
//!
//! Slide-in panel for the selected record. The content stays mounted while
//! the panel slides out; the lifecycle lives in leptos-slide-panel.

use leptos::ev;
use leptos::prelude::*;

use crate::components::catalog_card::{display_cover, display_title};
use crate::context::use_app_context;
use crate::markdown::{encode_url, render_markdown};
use crate::models::{DisplayType, MergedRecord};

#[component]
pub fn DetailPanel() -> impl IntoView {
    let ctx = use_app_context();
    let panel = ctx.panel;

    // Escape closes
    let handle = window_event_listener(ev::keydown, move |ev| {
        if ev.key() == "Escape" {
            panel.close();
        }
    });
    on_cleanup(move || handle.remove());

    let panel_class = move || {
        let state = panel.state.get();
        let mut c = String::from("detail-panel");
        if state.is_open { c.push_str(" open"); }
        if state.is_closing { c.push_str(" closing"); }
        c
    };

    let mounted = move || panel.state.with(|s| s.selected.is_some());
    // Only a new selection re-renders the content, not open/close flags
    let selected = Memo::new(move |_| panel.state.with(|s| s.selected.clone()));

    view! {
        <Show when=mounted>
            <div
                class=move || if panel.state.get().is_open { "panel-backdrop visible" } else { "panel-backdrop" }
                on:click=move |_| panel.close()
            />
            <aside class=panel_class>
                <button class="panel-close" on:click=move |_| panel.close()>"×"</button>
                {move || selected.get().map(|record| view! { <DetailContent record=record /> })}
            </aside>
        </Show>
    }
}

#[component]
fn DetailContent(record: MergedRecord) -> impl IntoView {
    let title = display_title(&record);
    let cover = display_cover(&record);
    let subtitle = record.detail.as_ref().and_then(|d| d.subtitle.clone());
    let body_html = record.detail.as_ref().map(|d| render_markdown(&d.body));
    let gallery: Vec<String> = record
        .detail
        .as_ref()
        .map(|d| d.gallery.iter().map(|u| encode_url(u)).collect())
        .unwrap_or_default();
    let url = record.url.clone();

    let media = match (record.display, url.clone()) {
        (Some(DisplayType::Embed), Some(url)) => Some(view! {
            <iframe class="detail-embed" src=url allowfullscreen=true></iframe>
        }.into_any()),
        (Some(DisplayType::Gallery), _) if !gallery.is_empty() => Some(view! {
            <div class="detail-gallery">
                {gallery.into_iter().map(|src| view! { <img src=src loading="lazy" /> }).collect_view()}
            </div>
        }.into_any()),
        _ => cover.map(|src| view! { <img class="detail-cover" src=src alt=title.clone() /> }.into_any()),
    };

    view! {
        <header class="detail-header">
            <h2>{title.clone()}</h2>
            {subtitle.map(|s| view! { <p class="detail-subtitle">{s}</p> })}
        </header>
        {media}
        {record.description.clone().map(|d| view! { <p class="detail-description">{d}</p> })}
        {body_html.map(|html| view! { <div class="detail-body" inner_html=html></div> })}
        <dl class="detail-facts">
            {(!record.tools.is_empty()).then(|| view! {
                <dt>"Built with"</dt>
                <dd>{record.tools.join(", ")}</dd>
            })}
            {(!record.tags.is_empty()).then(|| view! {
                <dt>"Tags"</dt>
                <dd>{record.tags.join(", ")}</dd>
            })}
            {record.created_at.clone().map(|c| view! {
                <dt>"Released"</dt>
                <dd>{c}</dd>
            })}
        </dl>
        <nav class="detail-links">
            {url.map(|u| view! { <a href=u target="_blank" rel="noopener noreferrer">"Open page"</a> })}
            {record.repository.clone().map(|r| view! { <a href=r target="_blank" rel="noopener noreferrer">"Source"</a> })}
        </nav>
    }
}
