//! Catalog acquisition: sheet export URLs, CORS relays, relay payload
//! decoding and the cache → remote → local → fallback pipeline.

mod error;
mod loader;
mod payload;
mod relay;
mod source;

pub use error::{CsvRejection, FetchError, LoadError};
pub use loader::{CatalogLoader, LoadReport, LoadSource};
pub use payload::{check_csv, decode_data_url, decode_relay_body};
pub use relay::{default_relays, parse_relays, Relay};
pub use source::{sheet_variants, SheetVariant, VariantKind};
