use serde::{Deserialize, Serialize};

use crate::catalog::CatalogItem;

/// A catalog item placed in the cart. Serialises flat: the item fields
/// followed by `quantity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub quantity: u32,
}

impl CartEntry {
    /// One unit of `item`. A sheet column named `quantity` is dropped so the
    /// cart's own count is the only one serialised.
    pub fn new(mut item: CatalogItem) -> Self {
        item.extra.remove("quantity");
        Self { item, quantity: 1 }
    }

    pub fn id(&self) -> i64 {
        self.item.id
    }

    pub fn line_total(&self) -> f64 {
        self.item.price * f64::from(self.quantity)
    }
}

/// Sum of `price * quantity` across entries.
pub fn cart_total(entries: &[CartEntry]) -> f64 {
    entries.iter().map(CartEntry::line_total).sum()
}

/// Sum of quantities across entries.
pub fn cart_count(entries: &[CartEntry]) -> u64 {
    entries.iter().map(|entry| u64::from(entry.quantity)).sum()
}
