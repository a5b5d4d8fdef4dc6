use serde::{Deserialize, Serialize};

use crate::catalog::CatalogItem;

/// How long a cached catalog suppresses network refreshes: five minutes.
pub const FRESHNESS_WINDOW_MS: i64 = 5 * 60 * 1000;

/// Catalog snapshot plus the epoch-millisecond time it was captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEnvelope {
    pub games: Vec<CatalogItem>,
    pub last_fetch_time: i64,
}

impl CacheEnvelope {
    pub fn new(games: Vec<CatalogItem>, last_fetch_time: i64) -> Self {
        Self {
            games,
            last_fetch_time,
        }
    }

    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.last_fetch_time)
    }

    /// True while the envelope is younger than [`FRESHNESS_WINDOW_MS`].
    pub fn is_fresh(&self, now_ms: i64) -> bool {
        self.age_ms(now_ms) < FRESHNESS_WINDOW_MS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fallback_items;

    const MINUTE: i64 = 60 * 1000;

    #[test]
    fn freshness_follows_the_five_minute_window() {
        let captured = 1_700_000_000_000;
        let envelope = CacheEnvelope::new(fallback_items(), captured);
        assert!(envelope.is_fresh(captured + 4 * MINUTE));
        assert!(!envelope.is_fresh(captured + 5 * MINUTE));
        assert!(!envelope.is_fresh(captured + 6 * MINUTE));
    }

    #[test]
    fn envelope_uses_camel_case_keys() {
        let envelope = CacheEnvelope::new(Vec::new(), 42);
        let value = serde_json::to_value(&envelope).expect("serialize");
        assert_eq!(value["lastFetchTime"], 42);
        assert!(value["games"].as_array().expect("games").is_empty());
    }
}
