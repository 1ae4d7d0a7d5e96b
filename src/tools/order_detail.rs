//! `loadOrderDetail` (spec §4.3): parse one order's line items, delivery
//! info, and cost summary, then validate internal consistency.

use crate::error::CopilotError;
use crate::models::{CostSummary, DeliveryInfo, OrderDetail, OrderLineItem, OrderSummary};
use crate::tools::scan_cart::parse_pt_price;
use crate::tools::{ToolContext, ToolOutcome};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLineItem {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub name_text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub quantity_text: Option<String>,
    #[serde(default)]
    pub unit_price_text: Option<String>,
}

/// Also the wire shape of `order.extractDetail`'s payload (the teacher's
/// one-row-per-line-item extraction idiom applied to a full order rather
/// than a cart).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawOrderDetail {
    pub summary: OrderSummary,
    pub items: Vec<RawLineItem>,
    #[serde(default)]
    pub delivery_window: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub subtotal_text: Option<String>,
    #[serde(default)]
    pub delivery_fee_text: Option<String>,
    #[serde(default)]
    pub total_text: Option<String>,
}

fn parse_line_item(raw: &RawLineItem) -> Option<OrderLineItem> {
    let name = raw.name_text.as_ref()?.trim();
    if name.is_empty() {
        return None;
    }
    let quantity = raw
        .quantity_text
        .as_deref()
        .and_then(|t| t.chars().filter(|c| c.is_ascii_digit()).collect::<String>().parse().ok())
        .unwrap_or(1u32);
    let unit_price = raw
        .unit_price_text
        .as_deref()
        .and_then(parse_pt_price)
        .unwrap_or(0.0);

    Some(OrderLineItem {
        product_id: raw.product_id.clone().filter(|p| !p.is_empty()),
        name: name.to_string(),
        url: raw.url.clone(),
        image: raw.image.clone(),
        quantity,
        unit_price,
    })
}

pub fn parse_order_detail(raw: &RawOrderDetail) -> (OrderDetail, Vec<String>) {
    let mut items = Vec::new();
    let mut warnings = Vec::new();

    for (index, raw_item) in raw.items.iter().enumerate() {
        match parse_line_item(raw_item) {
            Some(item) => items.push(item),
            None => {
                warn!(index, "skipped malformed order line item");
                warnings.push(format!("skipped malformed line item at index {index}"));
            }
        }
    }

    let subtotal = raw
        .subtotal_text
        .as_deref()
        .and_then(parse_pt_price)
        .unwrap_or_else(|| items.iter().map(OrderLineItem::derived_total).sum());
    let delivery_fee = raw
        .delivery_fee_text
        .as_deref()
        .and_then(parse_pt_price)
        .unwrap_or(0.0);
    let total = raw
        .total_text
        .as_deref()
        .and_then(parse_pt_price)
        .unwrap_or(subtotal + delivery_fee);

    let detail = OrderDetail {
        summary: raw.summary.clone(),
        items,
        delivery: DeliveryInfo {
            window: raw.delivery_window.clone(),
            address: raw.delivery_address.clone(),
        },
        cost_summary: CostSummary {
            subtotal,
            delivery_fee,
            total,
        },
    };

    (detail, warnings)
}

pub fn load_order_detail(_ctx: &ToolContext<'_>, raw: &RawOrderDetail) -> ToolOutcome<OrderDetail> {
    if raw.items.is_empty() {
        return ToolOutcome::err(CopilotError::validation(format!(
            "order {} has no extractable line items",
            raw.summary.order_id
        )));
    }

    let (detail, warnings) = parse_order_detail(raw);

    if detail.items.is_empty() {
        return ToolOutcome::err(CopilotError::validation(format!(
            "order {} had only malformed line items",
            detail.summary.order_id
        )));
    }

    let mut outcome = if detail.subtotal_within_tolerance() {
        ToolOutcome::ok(detail)
    } else {
        ToolOutcome::ok(detail).with_warning("computed subtotal did not reconcile with page total")
    };

    for w in warnings {
        outcome = outcome.with_warning(w);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::SelectorRegistry;
    use crate::testutil::FakePage;
    use crate::tools::ToolConfig;
    use chrono::Utc;

    fn summary() -> OrderSummary {
        OrderSummary {
            order_id: "ORD-1".to_string(),
            date: Utc::now(),
            product_count: 2,
            total_price: 10.0,
            detail_url: "/orders/ORD-1".to_string(),
        }
    }

    fn item(name: &str, qty: &str, price: &str) -> RawLineItem {
        RawLineItem {
            product_id: Some(format!("sku-{name}")),
            name_text: Some(name.to_string()),
            url: None,
            image: None,
            quantity_text: Some(qty.to_string()),
            unit_price_text: Some(price.to_string()),
        }
    }

    #[test]
    fn reconciling_subtotal_produces_no_warning() {
        let raw = RawOrderDetail {
            summary: summary(),
            items: vec![item("Leite", "2", "1,00 €"), item("Pão", "1", "2,50 €")],
            delivery_window: Some("18h-20h".to_string()),
            delivery_address: Some("Lisboa".to_string()),
            subtotal_text: Some("4,50 €".to_string()),
            delivery_fee_text: Some("0,00 €".to_string()),
            total_text: Some("4,50 €".to_string()),
        };
        let ctx_page = FakePage::new();
        let registry = SelectorRegistry::new();
        let config = ToolConfig::default();
        let ctx = ToolContext {
            page: &ctx_page,
            registry: &registry,
            config: &config,
        };
        let outcome = load_order_detail(&ctx, &raw);
        assert!(outcome.is_success());
        assert!(outcome.meta.warnings.is_empty());
    }

    #[test]
    fn mismatched_subtotal_is_warned_not_failed() {
        let raw = RawOrderDetail {
            summary: summary(),
            items: vec![item("Leite", "2", "1,00 €")],
            delivery_window: None,
            delivery_address: None,
            subtotal_text: Some("99,00 €".to_string()),
            delivery_fee_text: Some("0,00 €".to_string()),
            total_text: Some("99,00 €".to_string()),
        };
        let ctx_page = FakePage::new();
        let registry = SelectorRegistry::new();
        let config = ToolConfig::default();
        let ctx = ToolContext {
            page: &ctx_page,
            registry: &registry,
            config: &config,
        };
        let outcome = load_order_detail(&ctx, &raw);
        assert!(outcome.is_success());
        assert!(!outcome.meta.warnings.is_empty());
    }

    #[test]
    fn no_items_is_validation_error() {
        let raw = RawOrderDetail {
            summary: summary(),
            items: vec![],
            delivery_window: None,
            delivery_address: None,
            subtotal_text: None,
            delivery_fee_text: None,
            total_text: None,
        };
        let ctx_page = FakePage::new();
        let registry = SelectorRegistry::new();
        let config = ToolConfig::default();
        let ctx = ToolContext {
            page: &ctx_page,
            registry: &registry,
            config: &config,
        };
        let outcome = load_order_detail(&ctx, &raw);
        assert!(!outcome.is_success());
    }
}
