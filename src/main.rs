//! Catalog Frontend Entry Point

mod api;
mod app;
mod cache;
mod components;
mod config;
mod context;
mod curation;
mod layout;
mod logging;
mod markdown;
mod merge;
mod models;
mod service;
mod store;

use app::App;
use leptos::prelude::*;

fn main() {
    console_error_panic_hook::set_once();
    logging::init();
    mount_to_body(App);
}
