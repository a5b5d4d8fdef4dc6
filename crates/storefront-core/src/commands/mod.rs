//! Command surface shared by the CLI: every operation returns an
//! [`ExecutionOutcome`] whose `details` carry the machine-readable result.

mod cache;
mod cart;
mod catalog;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use storefront_domain::{format_idr, CartEntry, CatalogItem, CatalogView};
use strum::Display;

pub use catalog::CatalogQuery;

use crate::acquire::{CatalogLoader, LoadReport};
use crate::cart::CartStore;
use crate::config::Config;
use crate::effects::{Clock, ReqwestTransport, SystemClock, Transport};
use crate::outcome::{CommandStatus, ExecutionOutcome};
use crate::store::{CacheStore, LocalStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CommandGroup {
    Catalog,
    Categories,
    Stats,
    Cart,
    Checkout,
    Cache,
}

#[derive(Clone, Copy, Debug)]
pub struct CommandInfo {
    pub group: CommandGroup,
    pub name: &'static str,
}

impl CommandInfo {
    #[must_use]
    pub const fn new(group: CommandGroup, name: &'static str) -> Self {
        Self { group, name }
    }
}

/// Catalog, cart and cache behind one handle.
pub struct Storefront<T = ReqwestTransport, C = SystemClock> {
    config: Config,
    cart: CartStore,
    cache: CacheStore,
    loader: CatalogLoader<T, C>,
}

impl Storefront {
    /// Open the store described by `config` with the real HTTP client and
    /// wall clock.
    ///
    /// # Errors
    /// Returns an error if the data directory or the HTTP client cannot be
    /// set up.
    pub fn from_config(config: Config) -> Result<Self> {
        let transport = ReqwestTransport::new(config.network().timeout)?;
        Self::with_parts(config, transport, SystemClock)
    }
}

impl<T: Transport, C: Clock> Storefront<T, C> {
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn with_parts(config: Config, transport: T, clock: C) -> Result<Self> {
        let store = LocalStore::open(&config.store().root)?;
        let cache = CacheStore::new(store.clone());
        let loader = CatalogLoader::new(
            transport,
            clock,
            cache.clone(),
            config.source().clone(),
            *config.network(),
        );
        Ok(Self {
            cart: CartStore::new(store),
            cache,
            loader,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// Load the catalog into a fresh view.
    pub async fn load_view(&self) -> (CatalogView, LoadReport) {
        let mut view = CatalogView::new();
        let report = self.loader.load(&mut view).await;
        (view, report)
    }
}

fn item_details(item: &CatalogItem) -> Value {
    json!({
        "id": item.id,
        "name": item.name,
        "category": item.category,
        "type": item.kind,
        "price": item.price,
        "price_display": format_idr(item.price),
        "rating": item.rating,
        "platform": item.platform,
        "description": item.description,
    })
}

fn entry_details(entry: &CartEntry) -> Value {
    let mut value = item_details(&entry.item);
    if let Value::Object(map) = &mut value {
        map.insert("quantity".into(), json!(entry.quantity));
        map.insert("line_total".into(), json!(format_idr(entry.line_total())));
    }
    value
}

fn report_details(report: &LoadReport) -> Value {
    json!({
        "source": report.source,
        "fetched_at": report.fetched_at,
        "used_cache": report.used_cache,
    })
}

#[must_use]
pub fn to_json_response(info: CommandInfo, outcome: &ExecutionOutcome, _code: i32) -> Value {
    let status = match outcome.status {
        CommandStatus::Ok => "ok",
        CommandStatus::UserError => "user-error",
        CommandStatus::Failure => "error",
    };
    let details = match &outcome.details {
        Value::Object(_) => outcome.details.clone(),
        Value::Null => json!({}),
        other => json!({ "value": other }),
    };
    json!({
        "status": status,
        "message": format_status_message(info, &outcome.message),
        "details": details,
    })
}

#[must_use]
pub fn format_status_message(info: CommandInfo, message: &str) -> String {
    let group_name = info.group.to_string();
    let prefix = if group_name == info.name {
        format!("storefront {}", info.name)
    } else {
        format!("storefront {} {}", group_name, info.name)
    };
    if message.is_empty() {
        prefix
    } else if message.starts_with(&prefix) {
        message.to_string()
    } else {
        format!("{prefix}: {message}")
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    use super::Storefront;
    use crate::acquire::FetchError;
    use crate::config::{Config, EnvSnapshot, GlobalOptions};
    use crate::effects::{Clock, HttpResponse, Transport};

    pub(crate) const NOW: i64 = 1_700_000_000_000;
    pub(crate) const CSV: &str = "id,name,category,type,price,rating,platform,description\n\
        1,Hades,Roguelike,Action,24.99,4.9,PC,Escape the underworld\n\
        2,Celeste,Platformer,Indie,19.99,4.8,Switch,Climb the mountain\n\
        3,Stardew Valley,Simulation,Indie,14.99,4.9,PC,Farm life\n";

    pub(crate) struct FixedClock;

    impl Clock for FixedClock {
        fn now_ms(&self) -> i64 {
            NOW
        }
    }

    /// Every request fails; calls are counted per URL.
    #[derive(Default)]
    pub(crate) struct OfflineTransport {
        pub(crate) calls: Mutex<HashMap<String, usize>>,
    }

    impl Transport for OfflineTransport {
        async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
            *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
            Err(FetchError::transport(url, &"connection refused"))
        }
    }

    /// A storefront reading `csv` from a local file, with the network off.
    pub(crate) fn storefront(root: &Path, csv: Option<&str>) -> Storefront<OfflineTransport, FixedClock> {
        let local = root.join("games.csv");
        if let Some(csv) = csv {
            std::fs::write(&local, csv).expect("write csv");
        }
        let data = root.join("data");
        let snapshot = EnvSnapshot::testing(&[
            ("STOREFRONT_DATA_PATH", data.to_str().expect("utf-8 path")),
            ("STOREFRONT_LOCAL_CSV", local.to_str().expect("utf-8 path")),
            ("STOREFRONT_ONLINE", "0"),
        ]);
        let config = Config::from_snapshot(&snapshot, &GlobalOptions::default()).expect("config");
        Storefront::with_parts(config, OfflineTransport::default(), FixedClock).expect("storefront")
    }
}
