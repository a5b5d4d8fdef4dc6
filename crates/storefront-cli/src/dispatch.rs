use std::time::Duration;

use serde_json::json;
use storefront_core::{
    CartBadge, CartEvent, CatalogQuery, CommandGroup, CommandInfo, ExecutionOutcome, Storefront,
    StorefrontUserError,
};

use crate::cli::{CacheCommand, CartCommand, CommandGroupCli, WatchArgs};
use crate::output::OutputOptions;
use crate::style::Style;

pub fn command_info(group: &CommandGroupCli) -> CommandInfo {
    match group {
        CommandGroupCli::Catalog(_) => CommandInfo::new(CommandGroup::Catalog, "catalog"),
        CommandGroupCli::Categories => CommandInfo::new(CommandGroup::Categories, "categories"),
        CommandGroupCli::Stats => CommandInfo::new(CommandGroup::Stats, "stats"),
        CommandGroupCli::Checkout => CommandInfo::new(CommandGroup::Checkout, "checkout"),
        CommandGroupCli::Cart(cmd) => {
            let name = match cmd {
                CartCommand::Show => "show",
                CartCommand::Add(_) => "add",
                CartCommand::Remove(_) => "remove",
                CartCommand::Set(_) => "set",
                CartCommand::Clear => "clear",
                CartCommand::Watch(_) => "watch",
            };
            CommandInfo::new(CommandGroup::Cart, name)
        }
        CommandGroupCli::Cache(cmd) => {
            let name = match cmd {
                CacheCommand::Show => "show",
                CacheCommand::Clear => "clear",
                CacheCommand::Path => "path",
            };
            CommandInfo::new(CommandGroup::Cache, name)
        }
    }
}

pub async fn dispatch_command(
    storefront: &Storefront,
    group: &CommandGroupCli,
    opts: &OutputOptions,
) -> ExecutionOutcome {
    let result = match group {
        CommandGroupCli::Catalog(args) => {
            let query = CatalogQuery {
                search: args.search.clone(),
                category: args.category.clone(),
                kind: args.kind.clone(),
                sort: args.sort,
            };
            storefront.catalog(&query).await
        }
        CommandGroupCli::Categories => storefront.categories().await,
        CommandGroupCli::Stats => storefront.stats().await,
        CommandGroupCli::Checkout => storefront.checkout(),
        CommandGroupCli::Cart(cmd) => match cmd {
            CartCommand::Show => storefront.cart_show(),
            CartCommand::Add(args) => storefront.cart_add(args.id).await,
            CartCommand::Remove(args) => storefront.cart_remove(args.id),
            CartCommand::Set(args) => storefront.cart_set(args.id, args.quantity),
            CartCommand::Clear => storefront.cart_clear(),
            CartCommand::Watch(args) => watch_cart(storefront, args, opts).await,
        },
        CommandGroupCli::Cache(cmd) => match cmd {
            CacheCommand::Show => storefront.cache_show(),
            CacheCommand::Clear => storefront.cache_clear(),
            CacheCommand::Path => storefront.cache_path(),
        },
    };
    outcome_from_result(result)
}

/// Turn an error into the outcome the user sees: request problems become
/// user errors, everything else a failure.
pub fn outcome_from_result(result: anyhow::Result<ExecutionOutcome>) -> ExecutionOutcome {
    match result {
        Ok(outcome) => outcome,
        Err(err) => {
            if let Some(user) = err.downcast_ref::<StorefrontUserError>() {
                ExecutionOutcome::user_error(user.message().to_string(), user.details().clone())
            } else {
                let issues: Vec<String> =
                    err.chain().map(std::string::ToString::to_string).collect();
                ExecutionOutcome::failure(
                    err.to_string(),
                    json!({
                        "reason": "internal_error",
                        "error": err.to_string(),
                        "issues": issues,
                        "hint": "Re-run with `-vv` for more detail.",
                    }),
                )
            }
        }
    }
}

/// Follow the cart until Ctrl-C, printing the badge after every change.
async fn watch_cart(
    storefront: &Storefront,
    args: &WatchArgs,
    opts: &OutputOptions,
) -> anyhow::Result<ExecutionOutcome> {
    let cart = storefront.cart();
    let mut events = cart.subscribe();
    let poller = cart
        .store()
        .watch_external(Duration::from_millis(args.interval_ms.max(1)))?;
    let mut badge = CartBadge::new(cart.clone());
    let style = Style::from_options(opts);
    let mut changes = 0_u64;
    print_badge(&style, opts, &badge, None)?;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                badge.refresh();
                changes += 1;
                print_badge(&style, opts, &badge, Some(event))?;
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    tracing::warn!(%err, "unable to listen for Ctrl-C");
                }
                break;
            }
        }
    }
    poller.abort();

    Ok(ExecutionOutcome::success(
        format!("stopped after {changes} changes"),
        json!({ "changes": changes, "count": badge.count() }),
    ))
}

fn print_badge(
    style: &Style,
    opts: &OutputOptions,
    badge: &CartBadge,
    event: Option<CartEvent>,
) -> anyhow::Result<()> {
    if opts.json {
        let line = json!({
            "event": event,
            "count": badge.count(),
            "visible": badge.visible(),
        });
        println!("{}", serde_json::to_string(&line)?);
    } else if !opts.quiet {
        let origin = match event {
            None => "now",
            Some(CartEvent::Updated) => "updated",
            Some(CartEvent::ExternalChange) => "changed elsewhere",
        };
        let badge_text = if badge.visible() {
            format!("{} in cart", badge.count())
        } else {
            "cart is empty".to_string()
        };
        println!("{}", style.info(&format!("cart ({origin}): {badge_text}")));
    }
    Ok(())
}
