use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::acquire::{default_relays, parse_relays, Relay};

pub const DEFAULT_SHEET_ID: &str = "1a5j9jRPAa1K5qBbQuPzrmx7C9qBGew9vpZuJhC2E-C8";
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";
pub const DEFAULT_LOCAL_CSV: &str = "games.csv";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalOptions {
    pub quiet: bool,
    pub verbose: u8,
    pub trace: bool,
    pub json: bool,
    pub offline: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub(crate) fn flag_is_disabled(&self, key: &str) -> bool {
        self.var(key).is_some_and(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            )
        })
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) store: StoreConfig,
    pub(crate) source: SourceConfig,
    pub(crate) network: NetworkConfig,
}

impl Config {
    /// Builds a configuration snapshot from the current process environment.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be resolved or the relay
    /// override is malformed.
    pub fn from_env(global: &GlobalOptions) -> Result<Self> {
        let snapshot = EnvSnapshot::capture();
        Self::from_snapshot(&snapshot, global)
    }

    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot, global: &GlobalOptions) -> Result<Self> {
        let relays = match snapshot.var("STOREFRONT_RELAYS") {
            Some(raw) if !raw.trim().is_empty() => parse_relays(raw)?,
            _ => default_relays(),
        };
        let timeout = match snapshot.var("STOREFRONT_HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse().with_context(|| {
                format!("STOREFRONT_HTTP_TIMEOUT_SECS must be a whole number of seconds, got {raw:?}")
            })?),
            None => DEFAULT_HTTP_TIMEOUT,
        };

        Ok(Self {
            store: resolve_store_config(snapshot)?,
            source: SourceConfig {
                sheet_id: snapshot
                    .var("STOREFRONT_SHEET_ID")
                    .unwrap_or(DEFAULT_SHEET_ID)
                    .trim()
                    .to_string(),
                sheet_name: snapshot
                    .var("STOREFRONT_SHEET_NAME")
                    .unwrap_or(DEFAULT_SHEET_NAME)
                    .to_string(),
                relays,
                local_csv: PathBuf::from(
                    snapshot
                        .var("STOREFRONT_LOCAL_CSV")
                        .unwrap_or(DEFAULT_LOCAL_CSV),
                ),
            },
            network: NetworkConfig {
                online: !global.offline && !snapshot.flag_is_disabled("STOREFRONT_ONLINE"),
                timeout,
            },
        })
    }

    #[must_use]
    pub fn store(&self) -> &StoreConfig {
        &self.store
    }

    #[must_use]
    pub fn source(&self) -> &SourceConfig {
        &self.source
    }

    #[must_use]
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }
}

/// Where the key/value store lives and which setting chose it.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub root: PathBuf,
    pub source: &'static str,
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub sheet_id: String,
    pub sheet_name: String,
    pub relays: Vec<Relay>,
    pub local_csv: PathBuf,
}

impl SourceConfig {
    /// The remote sheet is skipped entirely when no id is configured.
    pub fn uses_sheet(&self) -> bool {
        !self.sheet_id.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NetworkConfig {
    pub online: bool,
    pub timeout: Duration,
}

fn resolve_store_config(snapshot: &EnvSnapshot) -> Result<StoreConfig> {
    if let Some(raw) = snapshot.var("STOREFRONT_DATA_PATH") {
        return Ok(StoreConfig {
            root: absolutize(Path::new(raw))?,
            source: "STOREFRONT_DATA_PATH",
        });
    }
    if let Some(data) = dirs_next::data_dir() {
        return Ok(StoreConfig {
            root: data.join("storefront"),
            source: "platform data dir",
        });
    }
    let home = dirs_next::home_dir()
        .ok_or_else(|| anyhow!("unable to determine a data directory for storefront"))?;
    Ok(StoreConfig {
        root: home.join(".storefront"),
        source: "home dir",
    })
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().context("unable to read the current directory")?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_public_sheet() {
        let snapshot = EnvSnapshot::testing(&[("STOREFRONT_DATA_PATH", "/tmp/storefront-test")]);
        let config = Config::from_snapshot(&snapshot, &GlobalOptions::default()).expect("config");

        assert_eq!(config.source().sheet_id, DEFAULT_SHEET_ID);
        assert_eq!(config.source().sheet_name, DEFAULT_SHEET_NAME);
        assert_eq!(config.source().relays.len(), 3);
        assert_eq!(config.source().local_csv, PathBuf::from("games.csv"));
        assert!(config.network().online);
        assert_eq!(config.network().timeout, DEFAULT_HTTP_TIMEOUT);
        assert_eq!(config.store().root, PathBuf::from("/tmp/storefront-test"));
        assert_eq!(config.store().source, "STOREFRONT_DATA_PATH");
    }

    #[test]
    fn offline_comes_from_flag_or_env() {
        let snapshot = EnvSnapshot::testing(&[
            ("STOREFRONT_DATA_PATH", "/tmp/storefront-test"),
            ("STOREFRONT_ONLINE", "off"),
        ]);
        let config = Config::from_snapshot(&snapshot, &GlobalOptions::default()).expect("config");
        assert!(!config.network().online);

        let snapshot = EnvSnapshot::testing(&[("STOREFRONT_DATA_PATH", "/tmp/storefront-test")]);
        let global = GlobalOptions {
            offline: true,
            ..GlobalOptions::default()
        };
        let config = Config::from_snapshot(&snapshot, &global).expect("config");
        assert!(!config.network().online);
    }

    #[test]
    fn blank_sheet_id_disables_the_sheet() {
        let snapshot = EnvSnapshot::testing(&[
            ("STOREFRONT_DATA_PATH", "/tmp/storefront-test"),
            ("STOREFRONT_SHEET_ID", "  "),
        ]);
        let config = Config::from_snapshot(&snapshot, &GlobalOptions::default()).expect("config");
        assert!(!config.source().uses_sheet());
    }

    #[test]
    fn relay_and_timeout_overrides_are_parsed() {
        let snapshot = EnvSnapshot::testing(&[
            ("STOREFRONT_DATA_PATH", "/tmp/storefront-test"),
            (
                "STOREFRONT_RELAYS",
                "json:http://127.0.0.1:9/wrap?u={url}; http://127.0.0.1:9/raw?{url}",
            ),
            ("STOREFRONT_HTTP_TIMEOUT_SECS", "5"),
        ]);
        let config = Config::from_snapshot(&snapshot, &GlobalOptions::default()).expect("config");
        let relays = &config.source().relays;
        assert_eq!(relays.len(), 2);
        assert!(relays[0].json_wrapped);
        assert!(!relays[1].json_wrapped);
        assert_eq!(config.network().timeout, Duration::from_secs(5));
    }

    #[test]
    fn malformed_timeout_is_an_error() {
        let snapshot = EnvSnapshot::testing(&[
            ("STOREFRONT_DATA_PATH", "/tmp/storefront-test"),
            ("STOREFRONT_HTTP_TIMEOUT_SECS", "soon"),
        ]);
        let err = Config::from_snapshot(&snapshot, &GlobalOptions::default()).unwrap_err();
        assert!(err.to_string().contains("STOREFRONT_HTTP_TIMEOUT_SECS"));
    }
}
