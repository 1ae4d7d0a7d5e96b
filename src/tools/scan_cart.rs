//! `scanCart` (spec §4.3): layered cart extraction plus Portuguese-locale
//! price parsing (`"1 234,56 €"` → `1234.56`).

use crate::error::CopilotError;
use crate::models::{CartItem, CartSnapshot};
use crate::tools::{ToolContext, ToolOutcome};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Already-extracted row data for one cart line, independent of DOM
/// traversal strategy (name-based rows, data-testid rows, or a JSON
/// state blob all normalize to this shape before reaching this module).
/// Also the wire shape of `cart.scan`'s payload, for the same reason
/// `RawOrderCard` is: `Page` has no attribute-read primitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCartRow {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub name_text: Option<String>,
    #[serde(default)]
    pub quantity_text: Option<String>,
    #[serde(default)]
    pub unit_price_text: Option<String>,
    #[serde(default)]
    pub availability_text: Option<String>,
}

/// Parses a Portuguese-locale price string: thousands separated by spaces
/// or dots, decimal comma, trailing currency symbol.
/// `"1 234,56 €"` → `1234.56`, `"23,45€"` → `23.45`, `"7 €"` → `7.0`.
pub fn parse_pt_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let (integer_part, decimal_part) = match cleaned.rfind(',') {
        Some(idx) => (&cleaned[..idx], Some(&cleaned[idx + 1..])),
        None => (cleaned.as_str(), None),
    };
    let integer_digits: String = integer_part.chars().filter(|c| c.is_ascii_digit()).collect();
    if integer_digits.is_empty() && decimal_part.is_none() {
        return None;
    }
    let integer_value: f64 = if integer_digits.is_empty() {
        0.0
    } else {
        integer_digits.parse().ok()?
    };
    let decimal_value: f64 = match decimal_part {
        Some(d) if !d.is_empty() => {
            let scale = 10f64.powi(d.len() as i32);
            d.parse::<f64>().ok()? / scale
        }
        _ => 0.0,
    };
    Some(integer_value + decimal_value)
}

fn parse_quantity(text: &str) -> u32 {
    text.chars()
        .filter(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .unwrap_or(1)
}

const UNAVAILABLE_MARKERS: &[&str] = &[
    "indisponível",
    "esgotado",
    "sem stock",
    "fora de stock",
];

fn parse_row(row: &RawCartRow) -> Option<CartItem> {
    let name = row.name_text.as_ref()?.trim();
    if name.is_empty() {
        return None;
    }
    let quantity = row
        .quantity_text
        .as_deref()
        .map(parse_quantity)
        .unwrap_or(1);
    let unit_price = row
        .unit_price_text
        .as_deref()
        .and_then(parse_pt_price)
        .unwrap_or(0.0);
    let available = row
        .availability_text
        .as_deref()
        .map(|t| {
            let lower = t.to_lowercase();
            !UNAVAILABLE_MARKERS.iter().any(|m| lower.contains(m))
        })
        .unwrap_or(true);

    Some(CartItem {
        product_id: row.product_id.clone().filter(|p| !p.is_empty()),
        name: name.to_string(),
        quantity,
        unit_price,
        available,
    })
}

pub fn build_snapshot(rows: &[RawCartRow]) -> (CartSnapshot, Vec<String>) {
    let mut items = Vec::new();
    let mut warnings = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        match parse_row(row) {
            Some(item) => items.push(item),
            None => {
                warn!(index, "skipped malformed cart row");
                warnings.push(format!("skipped malformed cart row at index {index}"));
            }
        }
    }

    let item_count = items.len() as u32;
    let total_price = items
        .iter()
        .map(|i| i.unit_price * i.quantity as f64)
        .sum();

    (
        CartSnapshot {
            timestamp: Utc::now(),
            items,
            item_count,
            total_price,
        },
        warnings,
    )
}

pub fn scan_cart(_ctx: &ToolContext<'_>, rows: &[RawCartRow]) -> ToolOutcome<CartSnapshot> {
    if rows.is_empty() {
        return ToolOutcome::ok(CartSnapshot::empty(Utc::now()))
            .with_warning("cart page reported no rows");
    }

    let (snapshot, warnings) = build_snapshot(rows);
    if snapshot.items.is_empty() {
        return ToolOutcome::err(CopilotError::validation(
            "all cart rows were malformed; refusing to report an empty cart as authoritative",
        ));
    }

    let mut outcome = ToolOutcome::ok(snapshot);
    for w in warnings {
        outcome = outcome.with_warning(w);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_thousands_and_decimal_comma() {
        assert_eq!(parse_pt_price("1 234,56 €"), Some(1234.56));
    }

    #[test]
    fn parses_simple_price() {
        assert_eq!(parse_pt_price("23,45€"), Some(23.45));
    }

    #[test]
    fn parses_integer_price() {
        assert_eq!(parse_pt_price("7 €"), Some(7.0));
    }

    #[test]
    fn rejects_empty_price() {
        assert_eq!(parse_pt_price("€"), None);
    }

    fn row(name: &str, qty: &str, price: &str, avail: &str) -> RawCartRow {
        RawCartRow {
            product_id: Some(format!("sku-{name}")),
            name_text: Some(name.to_string()),
            quantity_text: Some(qty.to_string()),
            unit_price_text: Some(price.to_string()),
            availability_text: Some(avail.to_string()),
        }
    }

    #[test]
    fn marks_items_unavailable_from_text() {
        let rows = vec![row("Leite", "2", "1,09 €", "Indisponível")];
        let (snap, _) = build_snapshot(&rows);
        assert!(!snap.items[0].available);
    }

    #[test]
    fn computes_item_count_and_total() {
        let rows = vec![
            row("Leite", "2", "1,00 €", ""),
            row("Pão", "1", "2,50 €", ""),
        ];
        let (snap, warnings) = build_snapshot(&rows);
        assert!(warnings.is_empty());
        assert_eq!(snap.item_count, 2);
        assert!((snap.total_price - 4.50).abs() < 1e-9);
    }
}
