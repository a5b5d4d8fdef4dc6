use anyhow::Result;
use serde_json::{json, Value};
use storefront_domain::{CatalogView, SortKey};

use super::{item_details, report_details, Storefront};
use crate::acquire::LoadReport;
use crate::effects::{Clock, Transport};
use crate::outcome::ExecutionOutcome;

/// Filter and sort criteria for `catalog`.
#[derive(Clone, Debug, Default)]
pub struct CatalogQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub kind: Option<String>,
    pub sort: SortKey,
}

impl<T: Transport, C: Clock> Storefront<T, C> {
    /// The filtered, sorted catalog.
    pub async fn catalog(&self, query: &CatalogQuery) -> Result<ExecutionOutcome> {
        let (mut view, report) = self.load_view().await;
        view.search_term = query.search.clone().unwrap_or_default();
        view.selected_category = query.category.clone();
        view.selected_type = query.kind.clone();
        view.sort_by = query.sort;
        view.apply_filters();

        let items: Vec<Value> = view.filtered().iter().map(item_details).collect();
        let message = if view.filtered().len() == view.items().len() {
            format!("{} items", view.items().len())
        } else {
            format!("{} of {} items", view.filtered().len(), view.items().len())
        };
        Ok(ExecutionOutcome::success(
            message,
            with_load(
                json!({
                    "items": items,
                    "shown": view.filtered().len(),
                    "total": view.items().len(),
                    "filters": {
                        "search": view.search_term,
                        "category": view.selected_category,
                        "type": view.selected_type,
                        "sort": view.sort_by,
                    },
                }),
                &view,
                &report,
            ),
        ))
    }

    /// Distinct categories and types in the catalog.
    pub async fn categories(&self) -> Result<ExecutionOutcome> {
        let (view, report) = self.load_view().await;
        Ok(ExecutionOutcome::success(
            format!(
                "{} categories, {} types",
                view.categories().len(),
                view.types().len()
            ),
            with_load(
                json!({
                    "categories": view.categories(),
                    "types": view.types(),
                }),
                &view,
                &report,
            ),
        ))
    }

    pub async fn stats(&self) -> Result<ExecutionOutcome> {
        let (view, report) = self.load_view().await;
        let stats = view.statistics();
        Ok(ExecutionOutcome::success(
            format!(
                "{} items, average {}, top rated {}",
                stats.total, stats.average_price, stats.top_rated
            ),
            with_load(json!({ "statistics": stats }), &view, &report),
        ))
    }
}

/// Attach where the catalog came from, plus the load error when the
/// fallback dataset is being shown.
fn with_load(mut details: Value, view: &CatalogView, report: &LoadReport) -> Value {
    if let Value::Object(map) = &mut details {
        map.insert("load".into(), report_details(report));
        if let Some(error) = &view.error_message {
            map.insert("warning".into(), json!(error));
        }
    }
    details
}
