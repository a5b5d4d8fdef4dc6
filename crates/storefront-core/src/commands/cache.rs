use anyhow::{Context, Result};
use serde_json::json;
use storefront_domain::{CacheEnvelope, FRESHNESS_WINDOW_MS};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::Storefront;
use crate::effects::{Clock, Transport};
use crate::outcome::ExecutionOutcome;
use crate::store::CATALOG_CACHE_KEY;

impl<T: Transport, C: Clock> Storefront<T, C> {
    pub fn cache_show(&self) -> Result<ExecutionOutcome> {
        let Some(envelope) = self.cache.get::<CacheEnvelope>(CATALOG_CACHE_KEY) else {
            return Ok(ExecutionOutcome::success(
                "no cached catalog",
                json!({ "status": "empty", "key": CATALOG_CACHE_KEY }),
            ));
        };
        let now = self.loader.clock().now_ms();
        let age_ms = envelope.age_ms(now);
        let fresh = envelope.is_fresh(now);
        let captured = timestamp(envelope.last_fetch_time);
        Ok(ExecutionOutcome::success(
            format!(
                "{} items cached {}s ago ({})",
                envelope.games.len(),
                age_ms / 1000,
                if fresh { "fresh" } else { "stale" }
            ),
            json!({
                "status": if fresh { "fresh" } else { "stale" },
                "key": CATALOG_CACHE_KEY,
                "items": envelope.games.len(),
                "last_fetch_time": envelope.last_fetch_time,
                "captured_at": captured,
                "age_ms": age_ms,
                "fresh": fresh,
                "freshness_window_ms": FRESHNESS_WINDOW_MS,
            }),
        ))
    }

    pub fn cache_clear(&self) -> Result<ExecutionOutcome> {
        let existed = self.cache.get::<CacheEnvelope>(CATALOG_CACHE_KEY).is_some();
        self.cache
            .remove(CATALOG_CACHE_KEY)
            .context("unable to clear the catalog cache")?;
        Ok(ExecutionOutcome::success(
            if existed {
                "cached catalog removed"
            } else {
                "nothing to clear"
            },
            json!({ "status": "cleared", "key": CATALOG_CACHE_KEY, "removed": existed }),
        ))
    }

    pub fn cache_path(&self) -> Result<ExecutionOutcome> {
        let store = self.config.store();
        let path = store.root.display().to_string();
        Ok(ExecutionOutcome::success(
            format!("data directory: {path}"),
            json!({
                "status": "path",
                "path": path,
                "source": store.source,
            }),
        ))
    }
}

fn timestamp(epoch_ms: i64) -> Option<String> {
    let nanos = i128::from(epoch_ms) * 1_000_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()?
        .format(&Rfc3339)
        .ok()
}
