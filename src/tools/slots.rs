//! `extractSlots` (spec §4.3 / protocol `slots.extract`): read the visible
//! delivery-slot picker, if any, for display in the review pack. Read-only
//! — this tool never selects or books a slot, since doing so would step
//! toward checkout.

use crate::selectors::Resolver;
use crate::tools::{ToolContext, ToolOutcome};
use serde::{Deserialize, Serialize};

const DELIVERY_PAGE_ID: &str = "delivery_slots";
const SLOT_CONTAINER_KEY: &str = "slot_container";
const SLOT_ITEM_SELECTOR: &str = "[data-testid='delivery-slot']";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliverySlot {
    pub label: String,
    pub available: bool,
}

fn parse_slot_text(text: &str) -> DeliverySlot {
    let lower = text.to_lowercase();
    let available = !lower.contains("indisponível") && !lower.contains("esgotado");
    DeliverySlot {
        label: text.trim().to_string(),
        available,
    }
}

pub async fn extract_slots(ctx: &ToolContext<'_>) -> ToolOutcome<Vec<DeliverySlot>> {
    if ctx.registry.has_page(DELIVERY_PAGE_ID) {
        let resolver = Resolver::new(ctx.registry);
        match resolver
            .try_resolve(
                ctx.page,
                DELIVERY_PAGE_ID,
                SLOT_CONTAINER_KEY,
                ctx.config.element_visibility_timeout,
            )
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) => return ToolOutcome::ok(Vec::new()).with_warning("no slot picker found"),
            Err(e) => return ToolOutcome::err(e),
        }
    }

    let elements = ctx.page.query_all(SLOT_ITEM_SELECTOR).await;
    let slots: Vec<DeliverySlot> = elements
        .iter()
        .filter(|e| e.visible)
        .map(|e| parse_slot_text(&e.text))
        .collect();

    ToolOutcome::ok(slots)
}
