use color_eyre::Result;
use serde_json::Value;
use storefront_core::{CommandGroup, CommandInfo, CommandStatus, ExecutionOutcome};

use crate::style::Style;

#[derive(Clone, Copy, Debug)]
pub struct OutputOptions {
    pub quiet: bool,
    pub json: bool,
    pub no_color: bool,
}

pub fn emit_output(opts: &OutputOptions, info: CommandInfo, outcome: &ExecutionOutcome) -> Result<i32> {
    let code = outcome.status.exit_code();
    let style = Style::from_options(opts);

    if opts.json {
        let payload = storefront_core::to_json_response(info, outcome, code);
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if outcome.status == CommandStatus::Ok {
        if !opts.quiet {
            let message = storefront_core::format_status_message(info, &outcome.message);
            println!("{}", style.status(&outcome.status, &message));
            if let Some(warning) = str_field(&outcome.details, "warning") {
                println!("{}", style.warning(&format!("Warning: {warning}")));
            }
            if let Some(body) = render_details(&style, info, &outcome.details) {
                println!("{body}");
            }
        }
    } else {
        // errors are shown even with --quiet
        let message = storefront_core::format_status_message(info, &outcome.message);
        eprintln!("{}", style.status(&outcome.status, &message));
        if let Some(hint) = str_field(&outcome.details, "hint") {
            eprintln!("{}", style.info(&format!("Tip: {hint}")));
        }
    }

    Ok(code)
}

fn str_field<'a>(details: &'a Value, key: &str) -> Option<&'a str> {
    details
        .as_object()
        .and_then(|map| map.get(key))
        .and_then(Value::as_str)
}

fn render_details(style: &Style, info: CommandInfo, details: &Value) -> Option<String> {
    match info.group {
        CommandGroup::Catalog => render_catalog(style, details),
        CommandGroup::Categories => render_categories(details),
        CommandGroup::Stats => render_stats(details),
        CommandGroup::Cart | CommandGroup::Checkout => render_cart(style, details),
        CommandGroup::Cache => None,
    }
}

fn render_catalog(style: &Style, details: &Value) -> Option<String> {
    let items = details.get("items")?.as_array()?;
    if items.is_empty() {
        return Some(style.muted("no games match"));
    }
    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|item| {
            vec![
                cell(item, "id"),
                cell(item, "name"),
                cell(item, "category"),
                cell(item, "type"),
                cell(item, "price_display"),
                cell(item, "rating"),
                cell(item, "platform"),
            ]
        })
        .collect();
    Some(format_table(
        style,
        &["ID", "Name", "Category", "Type", "Price", "Rating", "Platform"],
        &rows,
    ))
}

fn render_categories(details: &Value) -> Option<String> {
    let join = |key: &str| -> Option<String> {
        let names: Vec<&str> = details
            .get(key)?
            .as_array()?
            .iter()
            .filter_map(Value::as_str)
            .collect();
        Some(if names.is_empty() {
            "-".to_string()
        } else {
            names.join(", ")
        })
    };
    Some(format!(
        "Categories: {}\nTypes: {}",
        join("categories")?,
        join("types")?
    ))
}

fn render_stats(details: &Value) -> Option<String> {
    let stats = details.get("statistics")?;
    Some(format!(
        "Total games:   {}\nAverage price: {}\nTop rated:     {}",
        cell(stats, "total"),
        cell(stats, "average_price"),
        cell(stats, "top_rated"),
    ))
}

fn render_cart(style: &Style, details: &Value) -> Option<String> {
    let entries = details.get("entries")?.as_array()?;
    if entries.is_empty() {
        return None;
    }
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|entry| {
            vec![
                cell(entry, "id"),
                cell(entry, "name"),
                cell(entry, "quantity"),
                cell(entry, "price_display"),
                cell(entry, "line_total"),
            ]
        })
        .collect();
    let table = format_table(style, &["ID", "Name", "Qty", "Price", "Subtotal"], &rows);
    Some(format!(
        "{table}\n{}",
        style.table_header(&format!("Total: {}", cell(details, "total_display")))
    ))
}

fn cell(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn format_table(style: &Style, headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|header| header.chars().count()).collect();
    for row in rows {
        for (width, text) in widths.iter_mut().zip(row) {
            *width = (*width).max(text.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(style.table_header(&render_row(headers, &widths)));
    lines.push(
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        lines.push(render_row(&cells, &widths));
    }
    lines.join("\n")
}

fn render_row(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(text, width)| {
            let pad = width.saturating_sub(text.chars().count());
            format!("{text}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
