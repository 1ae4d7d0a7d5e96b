//! `reorder` (spec §4.3): the hardest operation. Drives
//! `navigate → locate reorder button → click → wait-for-modal → classify
//! modal → act → wait-cart-update → verify → done|fail`, never mimicking
//! a human beyond normal use and never clicking danger text (spec §7).

use crate::error::{CopilotError, ErrorCode};
use crate::interactor::modal::{find_button_by_text, wait_for_modal};
use crate::interactor::popups::{dismiss_popups, PopupPattern};
use crate::interactor::{is_danger_text, simulate_real_click};
use crate::selectors::Resolver;
use crate::tools::{ToolContext, ToolOutcome};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

const ORDER_DETAIL_PAGE_ID: &str = "order_detail";
const REORDER_TRIGGER_KEY: &str = "reorder_trigger";
const GLOBAL_PAGE_ID: &str = "global";
const CART_COUNT_BADGE_KEY: &str = "cart_count_badge";
const CART_TOTAL_BADGE_KEY: &str = "cart_total_badge";
const MODAL_CONTAINER_SELECTOR: &str = "[data-testid='reorder-modal']";
const MODAL_BUTTON_CONTAINER_SELECTOR: &str = "[data-testid='reorder-modal'] button";

const CART_REMOVAL_WARNING_MARKER: &str = "remover produtos do carrinho";
const MERGE_BUTTON_CANDIDATES: &[&str] = &["juntar", "adicionar"];
const CONFIRM_BUTTON_CANDIDATES: &[&str] = &["encomendar de novo", "confirmar"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    Replace,
    Merge,
}

#[derive(Debug, Clone)]
pub struct ReorderInput {
    pub order_id: String,
    pub detail_url: String,
    pub merge_mode: MergeMode,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CartCounts {
    pub count: u32,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    CountDelta,
    TotalDelta,
    RedirectToCart,
    NonZeroAfterReplace,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderResult {
    pub order_id: String,
    pub cart_before: CartCounts,
    pub cart_after: CartCounts,
    pub verified_by: VerificationMethod,
}

async fn read_cart_counts(ctx: &ToolContext<'_>) -> CartCounts {
    let resolver = Resolver::new(ctx.registry);

    let count = match resolver
        .try_resolve(
            ctx.page,
            GLOBAL_PAGE_ID,
            CART_COUNT_BADGE_KEY,
            ctx.config.element_visibility_timeout,
        )
        .await
    {
        Ok(Some((handle, _))) => ctx
            .page
            .text_of(&handle)
            .await
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect::<String>()
            .parse()
            .unwrap_or(0),
        _ => 0,
    };

    let total = match resolver
        .try_resolve(
            ctx.page,
            GLOBAL_PAGE_ID,
            CART_TOTAL_BADGE_KEY,
            ctx.config.element_visibility_timeout,
        )
        .await
    {
        Ok(Some((handle, _))) => crate::tools::scan_cart::parse_pt_price(
            &ctx.page.text_of(&handle).await,
        )
        .unwrap_or(0.0),
        _ => 0.0,
    };

    CartCounts { count, total }
}

enum ModalAction {
    CartRemovalWarning,
    ClickMerge,
    ClickConfirm,
    Unrecognized,
}

fn classify_modal_text(text: &str, merge_mode: MergeMode) -> ModalAction {
    let lower = text.to_lowercase();
    if lower.contains(CART_REMOVAL_WARNING_MARKER) {
        return ModalAction::CartRemovalWarning;
    }
    if merge_mode == MergeMode::Merge {
        let has_merge_word = MERGE_BUTTON_CANDIDATES.iter().any(|w| lower.contains(w));
        if has_merge_word && !is_danger_text(&lower) {
            return ModalAction::ClickMerge;
        }
    }
    ModalAction::Unrecognized
}

async fn click_reorder_trigger(ctx: &ToolContext<'_>) -> Result<(), CopilotError> {
    let resolver = Resolver::new(ctx.registry);
    let resolved = resolver
        .try_resolve(
            ctx.page,
            ORDER_DETAIL_PAGE_ID,
            REORDER_TRIGGER_KEY,
            ctx.config.element_visibility_timeout,
        )
        .await?;
    let (handle, _) = resolved.ok_or_else(|| {
        CopilotError::selector_error("reorder trigger never became visible-and-unique")
    })?;
    simulate_real_click(ctx.page, &handle)
        .await
        .map_err(|e| CopilotError::new(ErrorCode::WrongPage, e.to_string(), true))
}

pub async fn reorder(ctx: &ToolContext<'_>, input: &ReorderInput) -> ToolOutcome<ReorderResult> {
    if let Err(e) = ctx
        .page
        .navigate(&input.detail_url, ctx.config.navigation_timeout)
        .await
    {
        return ToolOutcome::err(CopilotError::timeout(format!(
            "navigation to order detail failed: {e}"
        )));
    }

    let cart_before = read_cart_counts(ctx).await;

    if let Err(e) = click_reorder_trigger(ctx).await {
        return ToolOutcome::err(e);
    }

    let mut modal = wait_for_modal(
        ctx.page,
        &[MODAL_CONTAINER_SELECTOR],
        ctx.config.modal_timeout,
    )
    .await;

    let mut outcome_meta_warnings = Vec::new();

    if modal.is_none() {
        outcome_meta_warnings.push("modal did not appear, retrying once".to_string());
        let popup_patterns = [PopupPattern {
            dismiss_selector: "[data-testid='popup-close']".to_string(),
            cancel_selector: None,
        }];
        dismiss_popups(ctx.page, &popup_patterns, ctx.config.popup_dismiss_rounds).await;

        if let Err(e) = click_reorder_trigger(ctx).await {
            return ToolOutcome::err(e);
        }
        modal = wait_for_modal(
            ctx.page,
            &[MODAL_CONTAINER_SELECTOR],
            ctx.config.modal_timeout,
        )
        .await;
    }

    let Some(modal_element) = modal else {
        return ToolOutcome::err(CopilotError::validation(
            "no modal appeared after retry; reorder cannot proceed blind",
        ));
    };

    match classify_modal_text(&modal_element.text, input.merge_mode) {
        ModalAction::CartRemovalWarning => {
            warn!(order_id = %input.order_id, "cart-removal warning modal, cancelling");
            if let Some(cancel) = find_button_by_text(
                ctx.page,
                MODAL_BUTTON_CONTAINER_SELECTOR,
                &["cancelar", "não", "fechar"],
            )
            .await
            {
                let _ = simulate_real_click(ctx.page, &cancel.handle).await;
            }
            return ToolOutcome::err(CopilotError::new(
                ErrorCode::ValidationError,
                "cart-removal warning modal appeared; not authorized to clear the cart",
                false,
            ));
        }
        ModalAction::ClickMerge => {
            let Some(button) =
                find_button_by_text(ctx.page, MODAL_BUTTON_CONTAINER_SELECTOR, MERGE_BUTTON_CANDIDATES)
                    .await
            else {
                return ToolOutcome::err(CopilotError::selector_error(
                    "merge button expected but not found in modal",
                ));
            };
            if is_danger_text(&button.text) {
                return ToolOutcome::err(CopilotError::new(
                    ErrorCode::ValidationError,
                    "merge button text matched the danger list; refusing to click",
                    false,
                ));
            }
            if let Err(e) = simulate_real_click(ctx.page, &button.handle).await {
                return ToolOutcome::err(CopilotError::new(ErrorCode::WrongPage, e.to_string(), true));
            }
        }
        ModalAction::Unrecognized => {
            let Some(button) = find_button_by_text(
                ctx.page,
                MODAL_BUTTON_CONTAINER_SELECTOR,
                CONFIRM_BUTTON_CANDIDATES,
            )
            .await
            else {
                return ToolOutcome::err(CopilotError::selector_error(
                    "no recognized confirm button in reorder modal",
                ));
            };
            if is_danger_text(&button.text) {
                return ToolOutcome::err(CopilotError::new(
                    ErrorCode::ValidationError,
                    "confirm button text matched the danger list; refusing to click",
                    false,
                ));
            }
            if let Err(e) = simulate_real_click(ctx.page, &button.handle).await {
                return ToolOutcome::err(CopilotError::new(ErrorCode::WrongPage, e.to_string(), true));
            }
        }
    }

    tokio::time::sleep(ctx.config.cart_update_window).await;

    let cart_after = read_cart_counts(ctx).await;
    let current_url = ctx.page.current_url().await;
    let redirected_to_cart = current_url.to_lowercase().contains("/cart");

    let verified_by = if cart_after.count > cart_before.count {
        Some(VerificationMethod::CountDelta)
    } else if cart_after.total > cart_before.total {
        Some(VerificationMethod::TotalDelta)
    } else if redirected_to_cart {
        Some(VerificationMethod::RedirectToCart)
    } else if input.merge_mode == MergeMode::Replace
        && cart_before.total == 0.0
        && cart_after.total > 0.0
    {
        Some(VerificationMethod::NonZeroAfterReplace)
    } else {
        None
    };

    let Some(verified_by) = verified_by else {
        return ToolOutcome::err(CopilotError::validation(format!(
            "reorder for {} could not be verified by any method",
            input.order_id
        )));
    };

    info!(order_id = %input.order_id, ?verified_by, "reorder verified");

    let mut outcome = ToolOutcome::ok(ReorderResult {
        order_id: input.order_id.clone(),
        cart_before,
        cart_after,
        verified_by,
    });
    for w in outcome_meta_warnings.drain(..) {
        outcome = outcome.with_warning(w);
    }
    outcome
}
