#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod cache;
pub mod cart;
pub mod catalog;
pub mod csv;
pub mod currency;
pub mod view;

pub use cache::{CacheEnvelope, FRESHNESS_WINDOW_MS};
pub use cart::{cart_count, cart_total, CartEntry};
pub use catalog::{collect_categories, collect_types, fallback_items, CatalogItem, CatalogSnapshot};
pub use csv::{parse_catalog, split_record};
pub use currency::format_idr;
pub use view::{CatalogStatistics, CatalogView, SortKey};
