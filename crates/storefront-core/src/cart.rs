//! Persisted shopping cart with change notifications.
//!
//! Cart events ride on the [`LocalStore`] change channel, so every cart built
//! over the same store (or a clone of it) sees each mutation as it happens.
//! Writes from other processes reach subscribers through the storage poller
//! ([`LocalStore::watch_external`]); subscribers re-read the cart on every
//! event instead of trusting anything they held before.

use serde::Serialize;
use storefront_domain::{cart_count, cart_total, CartEntry, CatalogItem};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, error};

use crate::store::{EventOrigin, LocalStore, StorageEvent};

/// Storage key holding the cart's JSON entry array.
pub const CART_KEY: &str = "gameStoreCart";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CartEvent {
    /// A cart sharing this store mutated it.
    Updated,
    /// Another process rewrote the cart.
    ExternalChange,
}

#[derive(Debug, Clone)]
pub struct CartStore {
    store: LocalStore,
}

impl CartStore {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Current entries. A missing, unreadable or corrupt cart reads as empty.
    pub fn get(&self) -> Vec<CartEntry> {
        let raw = match self.store.get_raw(CART_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                error!(%err, "error reading cart");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            error!(%err, "error reading cart");
            Vec::new()
        })
    }

    /// Add one unit of `item`, merging with an existing entry of the same id.
    pub fn add(&self, item: CatalogItem) -> Vec<CartEntry> {
        let mut entries = self.get();
        match entries.iter_mut().find(|entry| entry.id() == item.id) {
            Some(entry) => entry.quantity = entry.quantity.saturating_add(1),
            None => entries.push(CartEntry::new(item)),
        }
        self.commit(entries)
    }

    pub fn remove(&self, id: i64) -> Vec<CartEntry> {
        let mut entries = self.get();
        entries.retain(|entry| entry.id() != id);
        self.commit(entries)
    }

    /// Set the quantity for `id`; zero or less removes the entry. An unknown
    /// id leaves the entries unchanged but still counts as a mutation.
    pub fn set_quantity(&self, id: i64, quantity: i64) -> Vec<CartEntry> {
        if quantity <= 0 {
            return self.remove(id);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let mut entries = self.get();
        if let Some(entry) = entries.iter_mut().find(|entry| entry.id() == id) {
            entry.quantity = quantity;
        }
        self.commit(entries)
    }

    pub fn clear(&self) -> Vec<CartEntry> {
        self.commit(Vec::new())
    }

    pub fn total(&self) -> f64 {
        cart_total(&self.get())
    }

    pub fn count(&self) -> u64 {
        cart_count(&self.get())
    }

    pub fn contains(&self, id: i64) -> bool {
        self.get().iter().any(|entry| entry.id() == id)
    }

    /// Units of `id` in the cart, 0 when absent.
    pub fn quantity_of(&self, id: i64) -> u32 {
        self.get()
            .iter()
            .find(|entry| entry.id() == id)
            .map_or(0, |entry| entry.quantity)
    }

    pub fn subscribe(&self) -> CartSubscription {
        CartSubscription {
            storage: self.store.subscribe(),
        }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    fn commit(&self, entries: Vec<CartEntry>) -> Vec<CartEntry> {
        let saved = serde_json::to_string(&entries)
            .map_err(anyhow::Error::from)
            .and_then(|encoded| self.store.set_raw(CART_KEY, &encoded));
        if let Err(err) = saved {
            error!(%err, "error saving cart");
            // observers still re-read after a failed write
            self.store.notify(CART_KEY);
        }
        debug!(entries = entries.len(), "cart updated");
        entries
    }
}

/// Changes to the cart key, from any cart sharing the store or from another
/// process seen by the storage poller.
#[derive(Debug)]
pub struct CartSubscription {
    storage: broadcast::Receiver<StorageEvent>,
}

impl CartSubscription {
    /// Wait for the next change. `None` once the store is gone.
    pub async fn recv(&mut self) -> Option<CartEvent> {
        loop {
            match self.storage.recv().await {
                Ok(event) => {
                    if let Some(event) = cart_change(&event) {
                        return Some(event);
                    }
                }
                // missed events collapse into one re-read
                Err(RecvError::Lagged(_)) => return Some(CartEvent::Updated),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// The next already-delivered change, if any.
    pub fn try_recv(&mut self) -> Option<CartEvent> {
        loop {
            match self.storage.try_recv() {
                Ok(event) => {
                    if let Some(event) = cart_change(&event) {
                        return Some(event);
                    }
                }
                Err(TryRecvError::Lagged(_)) => return Some(CartEvent::Updated),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}

fn cart_change(event: &StorageEvent) -> Option<CartEvent> {
    if event.key != CART_KEY {
        return None;
    }
    Some(match event.origin {
        EventOrigin::Local => CartEvent::Updated,
        EventOrigin::External => CartEvent::ExternalChange,
    })
}

/// Item count shown next to the cart link; hidden while the cart is empty.
#[derive(Debug)]
pub struct CartBadge {
    cart: CartStore,
    count: u64,
}

impl CartBadge {
    pub fn new(cart: CartStore) -> Self {
        let count = cart.count();
        Self { cart, count }
    }

    /// Re-read the cart. Call on every [`CartEvent`].
    pub fn refresh(&mut self) -> u64 {
        self.count = self.cart.count();
        self.count
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn visible(&self) -> bool {
        self.count > 0
    }
}
