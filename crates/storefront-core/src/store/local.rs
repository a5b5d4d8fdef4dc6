use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const KEY_SUFFIX: &str = "json";
const EVENT_CAPACITY: usize = 64;

/// Who changed a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOrigin {
    /// A handle sharing this store wrote it.
    Local,
    /// Another process wrote it; seen by [`LocalStore::poll_external`].
    External,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub origin: EventOrigin,
}

/// Directory-backed string store, one `<key>.json` file per key.
///
/// Clones share one change channel. Writes are atomic renames, so readers
/// never see partial values; concurrent writers race and the last rename
/// wins.
#[derive(Debug, Clone)]
pub struct LocalStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    root: PathBuf,
    events: broadcast::Sender<StorageEvent>,
    /// Content hash of every key as this store last saw it. Held across
    /// writes and rescans so the two never interleave.
    fingerprints: Mutex<HashMap<String, String>>,
}

impl LocalStore {
    /// Open (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("failed to create data directory {}", root.display()))?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            inner: Arc::new(Inner {
                root,
                events,
                fingerprints: Mutex::new(HashMap::new()),
            }),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    /// # Errors
    /// Returns an error for an invalid key or an unreadable file.
    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    /// # Errors
    /// Returns an error for an invalid key or when the write fails.
    pub fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        let mut seen = self.fingerprints();
        let mut tmp = tempfile::NamedTempFile::new_in(self.root())
            .with_context(|| format!("failed to stage a write in {}", self.root().display()))?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(&path)
            .map_err(|err| err.error)
            .with_context(|| format!("failed to write {}", path.display()))?;
        seen.insert(key.to_string(), fingerprint(value));
        drop(seen);

        self.publish(key, EventOrigin::Local);
        Ok(())
    }

    /// Delete a key. Missing keys are fine.
    ///
    /// # Errors
    /// Returns an error for an invalid key or when the file cannot be removed.
    pub fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        let mut seen = self.fingerprints();
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to remove {}", path.display()))
            }
        }
        seen.remove(key);
        drop(seen);

        self.publish(key, EventOrigin::Local);
        Ok(())
    }

    /// Announce `key` as changed locally without writing it.
    pub fn notify(&self, key: &str) {
        self.publish(key, EventOrigin::Local);
    }

    /// Keys currently present, sorted.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be listed.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let entries = fs::read_dir(self.root())
            .with_context(|| format!("failed to list {}", self.root().display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(KEY_SUFFIX) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                if valid_key(stem) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.inner.events.subscribe()
    }

    /// Compare every key on disk against what this store last saw and
    /// publish an [`EventOrigin::External`] event for each difference.
    /// Returns the changed keys.
    ///
    /// # Errors
    /// Returns an error if the directory or a key cannot be read.
    pub fn poll_external(&self) -> Result<Vec<String>> {
        let changed = self.rescan()?;
        for key in &changed {
            self.publish(key, EventOrigin::External);
        }
        Ok(changed)
    }

    /// Poll for changes made by other processes every `period`.
    ///
    /// The current contents are taken as the baseline before the task
    /// starts, so only later changes are announced.
    ///
    /// # Errors
    /// Returns an error if the baseline scan fails.
    pub fn watch_external(&self, period: Duration) -> Result<JoinHandle<()>> {
        self.rescan()?;
        let store = self.clone();
        Ok(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let poller = store.clone();
                match tokio::task::spawn_blocking(move || poller.poll_external()).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(err)) => {
                        tracing::debug!(%err, root = %store.root().display(), "storage poll failed");
                    }
                    Err(err) => tracing::debug!(%err, "storage poll task failed"),
                }
            }
        }))
    }

    fn rescan(&self) -> Result<Vec<String>> {
        let mut seen = self.fingerprints();
        let mut current = HashMap::new();
        for key in self.keys()? {
            if let Some(contents) = self.get_raw(&key)? {
                current.insert(key, fingerprint(&contents));
            }
        }

        let mut changed: Vec<String> = current
            .iter()
            .filter(|(key, hash)| seen.get(*key) != Some(*hash))
            .map(|(key, _)| key.clone())
            .collect();
        changed.extend(seen.keys().filter(|key| !current.contains_key(*key)).cloned());
        changed.sort();
        for key in &changed {
            match current.remove(key) {
                Some(hash) => seen.insert(key.clone(), hash),
                None => seen.remove(key),
            };
        }
        Ok(changed)
    }

    fn fingerprints(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.inner
            .fingerprints
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, key: &str, origin: EventOrigin) {
        // no subscribers is fine
        let _ = self.inner.events.send(StorageEvent {
            key: key.to_string(),
            origin,
        });
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        if !valid_key(key) {
            bail!("invalid storage key {key:?}: use ASCII letters, digits, '-' or '_'");
        }
        Ok(self.root().join(format!("{key}.{KEY_SUFFIX}")))
    }
}

fn valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

fn fingerprint(contents: &str) -> String {
    hex::encode(Sha256::digest(contents.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_round_trip_and_missing_keys_are_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = LocalStore::open(temp.path()).expect("store");

        assert_eq!(store.get_raw("gamesData").unwrap(), None);
        store.set_raw("gamesData", "{\"games\":[]}").unwrap();
        assert_eq!(
            store.get_raw("gamesData").unwrap().as_deref(),
            Some("{\"games\":[]}")
        );
        assert!(temp.path().join("gamesData.json").exists());
        assert_eq!(store.keys().unwrap(), vec!["gamesData"]);

        store.remove("gamesData").unwrap();
        store.remove("gamesData").unwrap();
        assert_eq!(store.get_raw("gamesData").unwrap(), None);
    }

    #[test]
    fn keys_cannot_escape_the_root() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = LocalStore::open(temp.path()).expect("store");
        for key in ["", "../outside", "a/b", "dotted.key"] {
            assert!(store.set_raw(key, "x").is_err(), "key {key:?}");
        }
    }

    #[test]
    fn clones_share_local_change_events() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = LocalStore::open(temp.path()).expect("store");
        let other = store.clone();
        let mut events = store.subscribe();

        other.set_raw("gameStoreCart", "[]").unwrap();
        let event = events.try_recv().expect("event");
        assert_eq!(event.key, "gameStoreCart");
        assert_eq!(event.origin, EventOrigin::Local);
    }

    #[test]
    fn poll_reports_writes_from_another_store() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = LocalStore::open(temp.path()).expect("store");
        let elsewhere = LocalStore::open(temp.path()).expect("second store");
        let mut events = store.subscribe();

        store.set_raw("gameStoreCart", "[]").unwrap();
        assert!(store.poll_external().unwrap().is_empty());
        let _ = events.try_recv();

        elsewhere.set_raw("gameStoreCart", "[{}]").unwrap();
        assert_eq!(store.poll_external().unwrap(), vec!["gameStoreCart"]);
        let event = events.try_recv().expect("external event");
        assert_eq!(event.origin, EventOrigin::External);

        elsewhere.remove("gameStoreCart").unwrap();
        assert_eq!(store.poll_external().unwrap(), vec!["gameStoreCart"]);
        assert!(store.poll_external().unwrap().is_empty());
    }

    #[test]
    fn own_writes_during_polls_are_never_external() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = LocalStore::open(temp.path()).expect("store");
        let writer = store.clone();

        let handle = std::thread::spawn(move || {
            for round in 0..200 {
                writer
                    .set_raw("gameStoreCart", &format!("[{round}]"))
                    .unwrap();
            }
        });
        while !handle.is_finished() {
            assert!(store.poll_external().unwrap().is_empty());
        }
        handle.join().expect("writer thread");
        assert!(store.poll_external().unwrap().is_empty());
    }

    #[tokio::test]
    async fn watcher_announces_writes_from_another_store() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = LocalStore::open(temp.path()).expect("store");
        let elsewhere = LocalStore::open(temp.path()).expect("second store");
        let mut events = store.subscribe();
        let watcher = store.watch_external(Duration::from_millis(10)).unwrap();

        elsewhere.set_raw("gameStoreCart", "[]").unwrap();
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("watcher tick")
            .expect("event");
        watcher.abort();

        assert_eq!(event.key, "gameStoreCart");
        assert_eq!(event.origin, EventOrigin::External);
    }
}
