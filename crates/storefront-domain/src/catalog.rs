use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// One sellable game as read from the catalog sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    /// Optional sub-category used by the type filter.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub description: String,
    /// Columns the sheet carries beyond the known ones.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

/// Items plus the derived, sorted category list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    pub items: Vec<CatalogItem>,
    pub categories: Vec<String>,
}

impl CatalogSnapshot {
    pub fn from_items(items: Vec<CatalogItem>) -> Self {
        let categories = collect_categories(&items);
        Self { items, categories }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Distinct category values, sorted ascending.
pub fn collect_categories(items: &[CatalogItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct non-empty type values, sorted ascending.
pub fn collect_types(items: &[CatalogItem]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.kind.as_deref())
        .filter(|kind| !kind.is_empty())
        .map(ToOwned::to_owned)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Fixed dataset shown when every source failed.
pub fn fallback_items() -> Vec<CatalogItem> {
    vec![
        CatalogItem {
            id: 1,
            name: "Cyberpunk 2077".into(),
            category: "RPG".into(),
            kind: None,
            price: 59.99,
            rating: 4.2,
            platform: "PC".into(),
            description: "Futuristic open-world RPG set in Night City".into(),
            extra: BTreeMap::new(),
        },
        CatalogItem {
            id: 2,
            name: "The Legend of Zelda: Breath of the Wild".into(),
            category: "Adventure".into(),
            kind: None,
            price: 59.99,
            rating: 4.8,
            platform: "Nintendo Switch".into(),
            description: "Epic adventure in the kingdom of Hyrule".into(),
            extra: BTreeMap::new(),
        },
        CatalogItem {
            id: 3,
            name: "Minecraft".into(),
            category: "Sandbox".into(),
            kind: None,
            price: 26.95,
            rating: 4.7,
            platform: "Multi-platform".into(),
            description: "Creative sandbox game with endless possibilities".into(),
            extra: BTreeMap::new(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_dataset_has_three_items_with_unique_ids() {
        let items = fallback_items();
        assert_eq!(items.len(), 3);
        let ids: BTreeSet<_> = items.iter().map(|item| item.id).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn snapshot_collects_sorted_categories() {
        let snapshot = CatalogSnapshot::from_items(fallback_items());
        assert_eq!(snapshot.categories, vec!["Adventure", "RPG", "Sandbox"]);
    }

    #[test]
    fn type_field_round_trips_under_its_wire_name() {
        let mut item = fallback_items().remove(0);
        item.kind = Some("Action".into());
        let value = serde_json::to_value(&item).expect("serialize");
        assert_eq!(value["type"], "Action");

        let plain = serde_json::to_value(fallback_items().remove(0)).expect("serialize");
        assert!(plain.get("type").is_none());
    }
}
