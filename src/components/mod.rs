//! UI Components
//!
//! Leptos components for the catalog page.

mod catalog_card;
mod catalog_grid;
mod catalog_tabs;
mod detail_panel;

pub use catalog_card::CatalogCard;
pub use catalog_grid::CatalogGrid;
pub use catalog_tabs::CatalogTabs;
pub use detail_panel::DetailPanel;
