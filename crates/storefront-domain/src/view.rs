use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::catalog::{collect_types, CatalogItem, CatalogSnapshot};
use crate::currency::format_idr;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortKey {
    /// Ascending, case-insensitive.
    #[default]
    Name,
    /// Cheapest first.
    Price,
    /// Highest rated first.
    Rating,
}

impl SortKey {
    fn compare(self, a: &CatalogItem, b: &CatalogItem) -> Ordering {
        match self {
            SortKey::Name => locale_compare(&a.name, &b.name),
            SortKey::Price => a.price.total_cmp(&b.price),
            SortKey::Rating => b.rating.total_cmp(&a.rating),
        }
    }
}

/// Statistics over the whole catalog, ignoring filters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStatistics {
    pub total: usize,
    pub average_price: String,
    pub top_rated: String,
}

impl Default for CatalogStatistics {
    fn default() -> Self {
        Self {
            total: 0,
            average_price: format_idr(0.0),
            top_rated: "N/A".to_string(),
        }
    }
}

/// Filter and sort state over one catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogView {
    items: Vec<CatalogItem>,
    filtered: Vec<CatalogItem>,
    categories: Vec<String>,
    types: Vec<String>,
    pub search_term: String,
    pub selected_category: Option<String>,
    pub selected_type: Option<String>,
    pub sort_by: SortKey,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub last_fetch_time: Option<i64>,
}

impl CatalogView {
    pub fn new() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }

    /// Replace the catalog wholesale. The filtered view resets to every item
    /// in source order; call [`CatalogView::apply_filters`] to re-apply
    /// criteria.
    pub fn adopt(&mut self, snapshot: CatalogSnapshot) {
        self.types = collect_types(&snapshot.items);
        self.categories = snapshot.categories;
        self.items = snapshot.items;
        self.filtered = self.items.clone();
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn filtered(&self) -> &[CatalogItem] {
        &self.filtered
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn find(&self, id: i64) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Recompute the filtered subset from the current criteria, then sort it.
    pub fn apply_filters(&mut self) {
        let term = self.search_term.to_lowercase();
        let category = self.selected_category.as_deref().filter(|c| !c.is_empty());
        let kind = self.selected_type.as_deref().filter(|t| !t.is_empty());

        self.filtered = self
            .items
            .iter()
            .filter(|item| term.is_empty() || matches_term(item, &term))
            .filter(|item| category.map_or(true, |category| item.category == category))
            .filter(|item| kind.map_or(true, |kind| item.kind.as_deref() == Some(kind)))
            .cloned()
            .collect();
        self.sort();
    }

    /// Stable sort of the filtered subset by [`CatalogView::sort_by`].
    pub fn sort(&mut self) {
        let key = self.sort_by;
        self.filtered.sort_by(|a, b| key.compare(a, b));
    }

    pub fn statistics(&self) -> CatalogStatistics {
        if self.items.is_empty() {
            return CatalogStatistics::default();
        }
        let total_price: f64 = self.items.iter().map(|item| item.price).sum();
        #[allow(clippy::cast_precision_loss)]
        let average = total_price / self.items.len() as f64;

        let mut top = &self.items[0];
        for item in &self.items[1..] {
            if item.rating > top.rating {
                top = item;
            }
        }

        CatalogStatistics {
            total: self.items.len(),
            average_price: format_idr(average),
            top_rated: top.name.clone(),
        }
    }
}

fn matches_term(item: &CatalogItem, term: &str) -> bool {
    item.name.to_lowercase().contains(term)
        || item.description.to_lowercase().contains(term)
        || item.category.to_lowercase().contains(term)
}

/// Case-insensitive ordering with the raw strings as tie-break, so `apple`
/// sorts next to `Apple` rather than after `Zebra`.
fn locale_compare(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
