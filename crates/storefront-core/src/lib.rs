#![deny(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

pub mod acquire;
pub mod cart;
mod commands;
pub mod config;
pub mod effects;
mod outcome;
pub mod store;

pub use crate::acquire::{CatalogLoader, LoadReport, LoadSource};
pub use crate::cart::{CartBadge, CartEvent, CartStore, CartSubscription, CART_KEY};
pub use crate::commands::{
    format_status_message, to_json_response, CatalogQuery, CommandGroup, CommandInfo, Storefront,
};
pub use crate::config::{Config, GlobalOptions};
pub use crate::outcome::{CommandStatus, ExecutionOutcome, StorefrontUserError};

pub use storefront_domain::SortKey;
