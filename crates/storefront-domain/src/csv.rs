//! Permissive catalog CSV reader.
//!
//! This is not an RFC 4180 parser. Every `"` toggles the quoted state and is
//! dropped from the output, so a doubled quote inside a quoted field (`""`)
//! is two toggles rather than an escaped quote character. Line breaks inside
//! quotes are not supported either: records are split on `\n` first.

use std::collections::BTreeMap;

use crate::catalog::{CatalogItem, CatalogSnapshot};

/// Parse a catalog export into items and the sorted category list.
///
/// Blank lines are skipped. The first remaining line is the header row; each
/// later line becomes one item with fields assigned positionally. A header
/// that appears twice is assigned twice, the last value wins.
pub fn parse_catalog(text: &str) -> CatalogSnapshot {
    let mut lines = text.split('\n').filter(|line| !line.trim().is_empty());
    let Some(header_line) = lines.next() else {
        return CatalogSnapshot::default();
    };
    let headers: Vec<&str> = header_line.split(',').map(str::trim).collect();

    let items: Vec<CatalogItem> = lines
        .enumerate()
        .map(|(index, line)| build_item(&headers, &split_record(line), index + 1))
        .collect();
    tracing::debug!(
        columns = headers.len(),
        records = items.len(),
        "parsed catalog csv"
    );
    CatalogSnapshot::from_items(items)
}

/// Split one record on commas that sit outside double quotes.
pub fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

fn build_item(headers: &[&str], values: &[String], ordinal: usize) -> CatalogItem {
    let mut id = "";
    let mut price = "";
    let mut rating = "";
    let mut item = CatalogItem {
        id: 0,
        name: String::new(),
        category: String::new(),
        kind: None,
        price: 0.0,
        rating: 0.0,
        platform: String::new(),
        description: String::new(),
        extra: BTreeMap::new(),
    };

    for (position, header) in headers.iter().enumerate() {
        let value = values.get(position).map_or("", |value| value.trim());
        match *header {
            "id" => id = value,
            "price" => price = value,
            "rating" => rating = value,
            "name" => item.name = value.to_string(),
            "category" => item.category = value.to_string(),
            "type" => item.kind = (!value.is_empty()).then(|| value.to_string()),
            "platform" => item.platform = value.to_string(),
            "description" => item.description = value.to_string(),
            other => {
                item.extra.insert(other.to_string(), value.to_string());
            }
        }
    }

    item.price = leading_float(price).unwrap_or(0.0);
    item.rating = leading_float(rating).unwrap_or(0.0);
    // a zero id counts as absent, same as an unparsable one
    item.id = leading_int(id)
        .filter(|id| *id != 0)
        .unwrap_or_else(|| i64::try_from(ordinal).unwrap_or(i64::MAX));
    item
}

/// Longest numeric prefix as a float: `"12.5 USD"` reads as `12.5`.
fn leading_float(raw: &str) -> Option<f64> {
    let bytes = raw.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    raw[..end].parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Longest integer prefix: `"12.7"` reads as `12`.
fn leading_int(raw: &str) -> Option<i64> {
    let bytes = raw.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    raw[..end].parse::<i64>().ok()
}
