//! `loadOrderHistory` (spec §4.3): enumerate order cards on the order
//! history page, skipping malformed ones with a warning rather than
//! failing the whole tool.

use crate::error::CopilotError;
use crate::models::OrderSummary;
use crate::tools::{ToolContext, ToolOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderHistoryPage {
    pub orders: Vec<OrderSummary>,
    pub total_available: usize,
    pub has_more: bool,
}

/// Raw per-card text the caller extracted from the DOM before this
/// function is invoked; keeps the parsing logic testable without a `Page`.
/// Also the wire shape of `order.extractHistory`'s payload — `Page`
/// exposes text and visibility but not attributes, so the extension-side
/// collaborator extracts these fields itself and sends them up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawOrderCard {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub date_text: Option<String>,
    #[serde(default)]
    pub product_count_text: Option<String>,
    #[serde(default)]
    pub total_price_text: Option<String>,
    #[serde(default)]
    pub detail_url: Option<String>,
}

fn parse_card(card: &RawOrderCard) -> Option<OrderSummary> {
    let order_id = card.order_id.as_ref()?.trim();
    if order_id.is_empty() {
        return None;
    }
    let detail_url = card.detail_url.as_ref()?.trim();
    if detail_url.is_empty() {
        return None;
    }
    let date = card
        .date_text
        .as_deref()
        .and_then(parse_pt_date)
        .unwrap_or_else(Utc::now);
    let product_count = card
        .product_count_text
        .as_deref()
        .and_then(extract_first_int)
        .unwrap_or(0);
    let total_price = card
        .total_price_text
        .as_deref()
        .and_then(crate::tools::scan_cart::parse_pt_price)
        .unwrap_or(0.0);

    Some(OrderSummary {
        order_id: order_id.to_string(),
        date,
        product_count,
        total_price,
        detail_url: detail_url.to_string(),
    })
}

fn extract_first_int(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Accepts `dd/mm/yyyy` (the Auchan.pt order list date format); falls back
/// to `None` on anything else, letting the caller default the date.
fn parse_pt_date(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    let parts: Vec<&str> = trimmed.split('/').collect();
    if parts.len() != 3 {
        return None;
    }
    let day: u32 = parts[0].parse().ok()?;
    let month: u32 = parts[1].parse().ok()?;
    let year: i32 = parts[2].parse().ok()?;
    let naive = chrono::NaiveDate::from_ymd_opt(year, month, day)?;
    let naive_time = naive.and_hms_opt(0, 0, 0)?;
    Some(DateTime::from_naive_utc_and_offset(naive_time, Utc))
}

pub fn parse_order_cards(
    cards: &[RawOrderCard],
    max_orders: usize,
) -> (Vec<OrderSummary>, Vec<String>) {
    let mut orders = Vec::new();
    let mut warnings = Vec::new();

    for (index, card) in cards.iter().enumerate() {
        if orders.len() >= max_orders {
            break;
        }
        match parse_card(card) {
            Some(summary) => orders.push(summary),
            None => {
                let msg = format!("skipped malformed order card at index {index}");
                warn!(index, "skipped malformed order card");
                warnings.push(msg);
            }
        }
    }

    (orders, warnings)
}

/// `ctx` is accepted for symmetry with the other tools and to leave room
/// for a future DOM-driven card extraction; this entry point operates on
/// already-extracted `cards` because `Page::query_all` only yields flat
/// element snapshots, not structured cards.
pub fn load_order_history(
    _ctx: &ToolContext<'_>,
    cards: &[RawOrderCard],
    total_available: usize,
) -> ToolOutcome<OrderHistoryPage> {
    if cards.is_empty() && total_available > 0 {
        return ToolOutcome::err(CopilotError::validation(
            "order history page reported orders but no cards were extracted",
        ));
    }

    let (orders, warnings) = parse_order_cards(cards, _ctx.config.max_orders);
    let has_more = total_available > orders.len();

    let mut outcome = ToolOutcome::ok(OrderHistoryPage {
        orders,
        total_available,
        has_more,
    });
    for w in warnings {
        outcome = outcome.with_warning(w);
    }
    outcome
}
