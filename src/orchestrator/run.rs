//! Batch-run driving (spec §4.7/§8 scenario 2). Owns the oldest-first,
//! replace-then-merge ordering policy for multi-order reorder batches —
//! a single `reorder` call only ever knows its own `MergeMode`, the
//! orchestrator is what decides which order gets which mode.

use crate::models::OrderSummary;
use crate::orchestrator::state_machine::{RunEvent, StateMachine};
use crate::tools::reorder::{reorder, MergeMode, ReorderInput, ReorderResult};
use crate::tools::{ToolContext, ToolOutcome};

/// Sorts oldest-first by order date, matching §8 scenario 2's
/// `[B=older, A=newer] → replace(B); merge(A)`.
pub fn oldest_first(mut orders: Vec<OrderSummary>) -> Vec<OrderSummary> {
    orders.sort_by_key(|o| o.date);
    orders
}

/// First order in processing order replaces the cart; every subsequent
/// order merges into it.
pub fn merge_mode_for_index(index: usize) -> MergeMode {
    if index == 0 {
        MergeMode::Replace
    } else {
        MergeMode::Merge
    }
}

pub struct BatchReorderOutcome {
    pub order_id: String,
    pub outcome: ToolOutcome<ReorderResult>,
}

/// Runs a batch of reorders oldest-first. Stops at the first failure: a
/// merge that follows an unverified replace would build on top of a cart
/// state nobody confirmed, so later orders in the batch are not attempted.
pub async fn run_reorder_batch(
    ctx: &ToolContext<'_>,
    orders: Vec<OrderSummary>,
) -> Vec<BatchReorderOutcome> {
    let ordered = oldest_first(orders);
    let mut results = Vec::with_capacity(ordered.len());

    for (index, order) in ordered.into_iter().enumerate() {
        let input = ReorderInput {
            order_id: order.order_id.clone(),
            detail_url: order.detail_url.clone(),
            merge_mode: merge_mode_for_index(index),
        };
        let outcome = reorder(ctx, &input).await;
        let failed = outcome.result.is_err();
        results.push(BatchReorderOutcome {
            order_id: order.order_id,
            outcome,
        });
        if failed {
            break;
        }
    }

    results
}

/// Drives `sm` through the batch: `PhaseComplete` after each order,
/// `ReachReview` once every order in the batch verified, or a recoverable
/// `Error` event (pausing the run) on the first failure — reorder never
/// cancels the whole run outright, since the operator may fix the
/// underlying cause (e.g. dismiss an unrelated popup) and resume.
pub async fn run_reorder_batch_with_state(
    ctx: &ToolContext<'_>,
    sm: &mut StateMachine,
    orders: Vec<OrderSummary>,
) -> Result<Vec<BatchReorderOutcome>, crate::error::CopilotError> {
    let ordered = oldest_first(orders);
    let mut results = Vec::with_capacity(ordered.len());

    for (index, order) in ordered.into_iter().enumerate() {
        let input = ReorderInput {
            order_id: order.order_id.clone(),
            detail_url: order.detail_url.clone(),
            merge_mode: merge_mode_for_index(index),
        };
        let outcome = reorder(ctx, &input).await;

        match &outcome.result {
            Ok(_) => {
                sm.apply(RunEvent::PhaseComplete(format!(
                    "reordered:{}",
                    order.order_id
                )))?;
            }
            Err(e) => {
                sm.apply(RunEvent::Error {
                    recoverable: e.recoverable,
                    message: e.message.clone(),
                })?;
                results.push(BatchReorderOutcome {
                    order_id: order.order_id,
                    outcome,
                });
                return Ok(results);
            }
        }

        results.push(BatchReorderOutcome {
            order_id: order.order_id,
            outcome,
        });
    }

    sm.apply(RunEvent::ReachReview)?;
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SelectorDef, SelectorEntry};
    use crate::selectors::SelectorRegistry;
    use crate::testutil::FakePage;
    use crate::tools::ToolConfig;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    fn order(id: &str, days_ago: i64) -> OrderSummary {
        OrderSummary {
            order_id: id.to_string(),
            date: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() - chrono::Duration::days(days_ago),
            product_count: 1,
            total_price: 1.0,
            detail_url: format!("https://www.auchan.pt/orders/{id}"),
        }
    }

    #[test]
    fn oldest_first_sorts_by_date_ascending() {
        let orders = vec![order("A", 1), order("B", 30)];
        let sorted = oldest_first(orders);
        assert_eq!(sorted[0].order_id, "B");
        assert_eq!(sorted[1].order_id, "A");
    }

    #[test]
    fn first_order_replaces_rest_merge() {
        assert_eq!(merge_mode_for_index(0), MergeMode::Replace);
        assert_eq!(merge_mode_for_index(1), MergeMode::Merge);
        assert_eq!(merge_mode_for_index(2), MergeMode::Merge);
    }

    fn entry(primary: &str) -> SelectorEntry {
        SelectorEntry {
            description: "test".to_string(),
            element_type: "button".to_string(),
            primary: primary.to_string(),
            fallbacks: vec![],
            strategy: "visible-unique".to_string(),
            stability_score: 90,
        }
    }

    fn registry() -> SelectorRegistry {
        let mut reg = SelectorRegistry::new();
        let mut global_selectors = HashMap::new();
        global_selectors.insert("cart_count_badge".to_string(), entry("#cart-count"));
        global_selectors.insert("cart_total_badge".to_string(), entry("#cart-total"));
        reg.insert(SelectorDef {
            page_id: "global".to_string(),
            version: 1,
            url_pattern: "*".to_string(),
            created_at: Utc::now(),
            created_by: "test".to_string(),
            selectors: global_selectors,
        });

        let mut detail_selectors = HashMap::new();
        detail_selectors.insert("reorder_trigger".to_string(), entry("#reorder-btn"));
        reg.insert(SelectorDef {
            page_id: "order_detail".to_string(),
            version: 1,
            url_pattern: "*".to_string(),
            created_at: Utc::now(),
            created_by: "test".to_string(),
            selectors: detail_selectors,
        });
        reg
    }

    #[tokio::test]
    async fn batch_stops_after_first_failure() {
        let page = FakePage::new();
        page.set_visible_with_text("#cart-count", 1, "0");
        page.set_visible_with_text("#cart-total", 1, "0,00 €");
        page.set_visible("#reorder-btn", 1);
        // never shows a modal, so the first reorder times out

        let reg = registry();
        let config = ToolConfig {
            modal_timeout: std::time::Duration::from_millis(10),
            ..ToolConfig::default()
        };
        let ctx = ToolContext {
            page: &page,
            registry: &reg,
            config: &config,
        };

        let orders = vec![order("B", 30), order("A", 1)];
        let results = run_reorder_batch(&ctx, orders).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].order_id, "B");
        assert!(results[0].outcome.result.is_err());
    }

    #[tokio::test]
    async fn state_machine_reaches_review_after_successful_batch() {
        let page = FakePage::new();
        page.set_visible_with_text("#cart-count", 1, "0");
        page.set_visible_with_text("#cart-total", 1, "0,00 €");
        page.set_visible("#reorder-btn", 1);
        page.on_click("#reorder-btn", |inner| {
            inner.set_visible("[data-testid='reorder-modal']", 1);
            inner.set_visible_with_text(
                "[data-testid='reorder-modal'] button",
                1,
                "Encomendar de Novo",
            );
        });
        {
            let buttons = page.query_all("[data-testid='reorder-modal'] button").await;
            if let Some(btn) = buttons.first() {
                let sel = btn.handle.selector.clone();
                page.on_click(&sel, |inner| {
                    inner.set_visible_with_text("#cart-count", 1, "5");
                    inner.set_visible_with_text("#cart-total", 1, "20,00 €");
                });
            }
        }

        let reg = registry();
        let config = ToolConfig::default();
        let ctx = ToolContext {
            page: &page,
            registry: &reg,
            config: &config,
        };

        let mut sm = StateMachine::new("run-1");
        sm.apply(RunEvent::StartRun).unwrap();

        let results = run_reorder_batch_with_state(&ctx, &mut sm, vec![order("A", 1)])
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].outcome.result.is_ok());
        assert_eq!(sm.status(), crate::models::RunStatus::Review);
    }
}
