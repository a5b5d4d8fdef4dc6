mod cache;
mod local;

pub use cache::{CacheStore, CATALOG_CACHE_KEY};
pub use local::{EventOrigin, LocalStore, StorageEvent};
