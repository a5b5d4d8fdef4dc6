use serde::Serialize;
use storefront_domain::{fallback_items, parse_catalog, CacheEnvelope, CatalogSnapshot, CatalogView};
use tracing::{debug, error, info, warn};

use super::error::{FetchError, LoadError};
use super::payload::{check_csv, decode_relay_body};
use super::relay::Relay;
use super::source::{sheet_variants, VariantKind};
use crate::config::{NetworkConfig, SourceConfig};
use crate::effects::{Clock, Transport};
use crate::store::{CacheStore, CATALOG_CACHE_KEY};

/// Where the adopted catalog came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadSource {
    /// A fresh cache envelope; no request was made.
    Cache,
    Remote { variant: VariantKind, relay: String },
    Local { path: String },
    /// The built-in three-item dataset.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub source: LoadSource,
    /// Epoch milliseconds of the catalog data that was adopted, if known.
    pub fetched_at: Option<i64>,
    /// A cache envelope was adopted before any network work started.
    pub used_cache: bool,
    pub error: Option<String>,
}

struct FetchedCsv {
    text: String,
    source: LoadSource,
}

/// Fills a [`CatalogView`] from the best source available: fresh cache,
/// sheet through relays, local file, and finally the built-in dataset.
pub struct CatalogLoader<T, C> {
    transport: T,
    clock: C,
    cache: CacheStore,
    source: SourceConfig,
    network: NetworkConfig,
}

impl<T: Transport, C: Clock> CatalogLoader<T, C> {
    pub fn new(
        transport: T,
        clock: C,
        cache: CacheStore,
        source: SourceConfig,
        network: NetworkConfig,
    ) -> Self {
        Self {
            transport,
            clock,
            cache,
            source,
            network,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Populate `view`. Never fails: when every source is exhausted the
    /// error message is recorded and the fallback dataset is adopted.
    pub async fn load(&self, view: &mut CatalogView) -> LoadReport {
        let mut used_cache = false;
        if let Some(envelope) = self.cache.get::<CacheEnvelope>(CATALOG_CACHE_KEY) {
            let now = self.clock.now_ms();
            let fresh = envelope.is_fresh(now);
            info!(
                last_fetch_time = envelope.last_fetch_time,
                age_ms = envelope.age_ms(now),
                fresh,
                "loaded catalog from cache"
            );
            let fetched_at = envelope.last_fetch_time;
            view.adopt(CatalogSnapshot::from_items(envelope.games));
            view.last_fetch_time = Some(fetched_at);
            view.is_loading = false;
            if fresh {
                return LoadReport {
                    source: LoadSource::Cache,
                    fetched_at: Some(fetched_at),
                    used_cache: true,
                    error: None,
                };
            }
            used_cache = true;
        }

        view.is_loading = true;
        view.error_message = None;

        match self.fetch_csv().await {
            Ok(fetched) => {
                let snapshot = parse_catalog(&fetched.text);
                let fetched_at = self.clock.now_ms();
                let envelope = CacheEnvelope::new(snapshot.items.clone(), fetched_at);
                if let Err(err) = self.cache.set(CATALOG_CACHE_KEY, &envelope) {
                    warn!(%err, "failed to cache catalog");
                }
                info!(items = snapshot.items.len(), source = ?fetched.source, "catalog loaded");
                view.adopt(snapshot);
                view.last_fetch_time = Some(fetched_at);
                view.is_loading = false;
                LoadReport {
                    source: fetched.source,
                    fetched_at: Some(fetched_at),
                    used_cache,
                    error: None,
                }
            }
            Err(err) => {
                let message = err.user_message();
                error!(%err, "error loading games");
                view.error_message = Some(message.clone());
                view.adopt(CatalogSnapshot::from_items(fallback_items()));
                view.is_loading = false;
                LoadReport {
                    source: LoadSource::Fallback,
                    fetched_at: None,
                    used_cache,
                    error: Some(message),
                }
            }
        }
    }

    async fn fetch_csv(&self) -> Result<FetchedCsv, LoadError> {
        if !self.source.uses_sheet() {
            return self
                .read_local()
                .await
                .map_err(|err| LoadError::LocalOnly {
                    local: err.to_string(),
                });
        }

        let remote_failure = if self.network.online {
            match self.fetch_remote().await {
                Ok(fetched) => return Ok(fetched),
                Err(err) => err.map_or_else(
                    || FetchError::RelaysExhausted.to_string(),
                    |err| err.to_string(),
                ),
            }
        } else {
            info!("offline, skipping the sheet");
            "offline mode".to_string()
        };

        warn!("all sheet url formats failed, trying local fallback");
        match self.read_local().await {
            Ok(fetched) => Ok(fetched),
            Err(err) => Err(LoadError::Exhausted {
                remote: remote_failure,
                local: err.to_string(),
            }),
        }
    }

    /// Try every URL variant through the relays. On failure returns the last
    /// relay-level error, if any variant got that far.
    async fn fetch_remote(&self) -> Result<FetchedCsv, Option<FetchError>> {
        let mut last_error = None;
        for variant in sheet_variants(&self.source.sheet_id, &self.source.sheet_name) {
            debug!(variant = %variant.kind, url = %variant.url, "trying sheet url");
            let (text, relay) = match self.fetch_via_relays(&variant.url).await {
                Ok(hit) => hit,
                Err(err) => {
                    warn!(variant = %variant.kind, %err, "relay fetch failed for url format");
                    last_error = Some(err);
                    continue;
                }
            };
            if let Err(rejection) = check_csv(&text) {
                warn!(variant = %variant.kind, %rejection, "trying next url format");
                continue;
            }
            info!(variant = %variant.kind, relay = %relay, "loaded from sheet");
            return Ok(FetchedCsv {
                text,
                source: LoadSource::Remote {
                    variant: variant.kind,
                    relay,
                },
            });
        }
        Err(last_error)
    }

    async fn fetch_via_relays(&self, target: &str) -> Result<(String, String), FetchError> {
        for relay in &self.source.relays {
            match self.fetch_via(relay, target).await {
                Ok(text) => {
                    debug!(relay = %relay.name, bytes = text.len(), "relay succeeded");
                    return Ok((text, relay.name.clone()));
                }
                Err(err) => warn!(relay = %relay.name, %err, "relay failed"),
            }
        }
        Err(FetchError::RelaysExhausted)
    }

    async fn fetch_via(&self, relay: &Relay, target: &str) -> Result<String, FetchError> {
        let url = relay.url_for(target);
        debug!(relay = %relay.name, "trying relay");
        let response = self.transport.get(&url).await?;
        if !response.is_success() {
            return Err(FetchError::Status {
                url,
                status: response.status,
            });
        }
        decode_relay_body(response.body, relay.expects_json(&url))
    }

    async fn read_local(&self) -> Result<FetchedCsv, FetchError> {
        let path = &self.source.local_csv;
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| FetchError::Local {
                path: path.clone(),
                message: err.to_string(),
            })?;
        info!(path = %path.display(), "loaded from local csv fallback");
        Ok(FetchedCsv {
            text,
            source: LoadSource::Local {
                path: path.display().to_string(),
            },
        })
    }
}
