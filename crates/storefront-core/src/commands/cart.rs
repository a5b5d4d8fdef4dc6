use anyhow::Result;
use serde_json::{json, Value};
use storefront_domain::{cart_count, cart_total, format_idr, CartEntry};

use super::{entry_details, Storefront};
use crate::effects::{Clock, Transport};
use crate::outcome::{ExecutionOutcome, StorefrontUserError};

/// Where checkout hands off to.
pub const PAYMENT_DESTINATION: &str = "payment.html";

impl<T: Transport, C: Clock> Storefront<T, C> {
    pub fn cart_show(&self) -> Result<ExecutionOutcome> {
        let entries = self.cart.get();
        let message = if entries.is_empty() {
            "cart is empty".to_string()
        } else {
            summary(&entries)
        };
        Ok(ExecutionOutcome::success(message, cart_details(&entries)))
    }

    /// Add one unit of a catalog item. The catalog is loaded to resolve `id`.
    pub async fn cart_add(&self, id: i64) -> Result<ExecutionOutcome> {
        let (view, _) = self.load_view().await;
        let item = view.find(id).cloned().ok_or_else(|| {
            StorefrontUserError::new(
                format!("no catalog item with id {id}"),
                json!({
                    "reason": "unknown_item",
                    "id": id,
                    "hint": "run `storefront catalog` to list item ids",
                }),
            )
        })?;
        let name = item.name.clone();
        let entries = self.cart.add(item);
        Ok(ExecutionOutcome::success(
            format!("added {name} ({})", summary(&entries)),
            cart_details(&entries),
        ))
    }

    pub fn cart_remove(&self, id: i64) -> Result<ExecutionOutcome> {
        let had_item = self.cart.contains(id);
        let entries = self.cart.remove(id);
        let message = if had_item {
            format!("removed item {id}")
        } else {
            format!("item {id} was not in the cart")
        };
        Ok(ExecutionOutcome::success(message, cart_details(&entries)))
    }

    /// Set the quantity of an item already in the cart; zero or less
    /// removes it.
    pub fn cart_set(&self, id: i64, quantity: i64) -> Result<ExecutionOutcome> {
        if quantity > 0 && !self.cart.contains(id) {
            return Err(StorefrontUserError::new(
                format!("item {id} is not in the cart"),
                json!({
                    "reason": "not_in_cart",
                    "id": id,
                    "hint": format!("add it first with `storefront cart add {id}`"),
                }),
            )
            .into());
        }
        let entries = self.cart.set_quantity(id, quantity);
        let message = if quantity > 0 {
            format!("item {id} quantity set to {quantity}")
        } else {
            format!("removed item {id}")
        };
        Ok(ExecutionOutcome::success(message, cart_details(&entries)))
    }

    pub fn cart_clear(&self) -> Result<ExecutionOutcome> {
        let entries = self.cart.clear();
        Ok(ExecutionOutcome::success("cart cleared", cart_details(&entries)))
    }

    /// Hand the cart off to the payment page. Refused while the cart is empty.
    pub fn checkout(&self) -> Result<ExecutionOutcome> {
        let entries = self.cart.get();
        if entries.is_empty() {
            return Ok(ExecutionOutcome::user_error(
                "cart is empty",
                json!({
                    "reason": "empty_cart",
                    "hint": "add items with `storefront cart add <ID>` before checking out",
                }),
            ));
        }
        let mut details = cart_details(&entries);
        if let Value::Object(map) = &mut details {
            map.insert("destination".into(), json!(PAYMENT_DESTINATION));
        }
        Ok(ExecutionOutcome::success(
            format!("proceed to {PAYMENT_DESTINATION} ({})", summary(&entries)),
            details,
        ))
    }
}

fn summary(entries: &[CartEntry]) -> String {
    let count = cart_count(entries);
    let noun = if count == 1 { "item" } else { "items" };
    format!("{count} {noun}, total {}", format_idr(cart_total(entries)))
}

fn cart_details(entries: &[CartEntry]) -> Value {
    let items: Vec<Value> = entries.iter().map(entry_details).collect();
    json!({
        "entries": items,
        "count": cart_count(entries),
        "total": cart_total(entries),
        "total_display": format_idr(cart_total(entries)),
    })
}

#[cfg(test)]
mod tests {
    use super::super::testing::{storefront, CSV};
    use super::*;
    use crate::outcome::CommandStatus;

    #[tokio::test]
    async fn adding_resolves_items_from_the_catalog() {
        let temp = tempfile::tempdir().expect("tempdir");
        let storefront = storefront(temp.path(), Some(CSV));

        storefront.cart_add(2).await.unwrap();
        let outcome = storefront.cart_add(2).await.unwrap();

        assert_eq!(outcome.message, "added Celeste (2 items, total Rp 40)");
        assert_eq!(outcome.details["count"], 2);
        assert_eq!(outcome.details["entries"][0]["quantity"], 2);
        assert_eq!(storefront.cart().quantity_of(2), 2);
    }

    #[tokio::test]
    async fn unknown_ids_are_user_errors() {
        let temp = tempfile::tempdir().expect("tempdir");
        let storefront = storefront(temp.path(), Some(CSV));

        let err = storefront.cart_add(42).await.unwrap_err();
        let user = err.downcast_ref::<StorefrontUserError>().expect("user error");
        assert_eq!(user.message(), "no catalog item with id 42");
        assert_eq!(user.details()["reason"], "unknown_item");
        assert_eq!(storefront.cart().count(), 0);
    }

    #[tokio::test]
    async fn set_and_remove_update_the_cart() {
        let temp = tempfile::tempdir().expect("tempdir");
        let storefront = storefront(temp.path(), Some(CSV));
        storefront.cart_add(1).await.unwrap();

        let outcome = storefront.cart_set(1, 3).unwrap();
        assert_eq!(outcome.details["count"], 3);

        assert!(storefront.cart_set(2, 1).is_err());

        let outcome = storefront.cart_set(1, 0).unwrap();
        assert_eq!(outcome.message, "removed item 1");
        assert_eq!(outcome.details["count"], 0);

        let outcome = storefront.cart_remove(1).unwrap();
        assert_eq!(outcome.message, "item 1 was not in the cart");
    }

    #[tokio::test]
    async fn checkout_requires_items() {
        let temp = tempfile::tempdir().expect("tempdir");
        let storefront = storefront(temp.path(), Some(CSV));

        let outcome = storefront.checkout().unwrap();
        assert_eq!(outcome.status, CommandStatus::UserError);
        assert_eq!(outcome.details["reason"], "empty_cart");

        storefront.cart_add(3).await.unwrap();
        let outcome = storefront.checkout().unwrap();
        assert_eq!(outcome.status, CommandStatus::Ok);
        assert_eq!(outcome.details["destination"], "payment.html");
        assert_eq!(outcome.details["total_display"], "Rp 15");

        let outcome = storefront.cart_clear().unwrap();
        assert_eq!(outcome.details["count"], 0);
        assert!(storefront.cart_show().unwrap().message.contains("empty"));
    }
}
