//! `dismissPopups` (spec §4.2): run a configured set of matchers
//! repeatedly until a round dismisses nothing or `maxRounds` is reached.
//! Never click danger text (spec §7) — click the paired cancel control
//! instead.

use crate::interactor::is_danger_text;
use crate::page::Page;
use tracing::warn;

/// One configured popup matcher: the selector for its dismiss control, and
/// (optionally) the selector for a cancel control to use instead when the
/// dismiss control's visible text is on the danger list.
#[derive(Debug, Clone)]
pub struct PopupPattern {
    pub dismiss_selector: String,
    pub cancel_selector: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DismissOutcome {
    pub rounds_run: u32,
    pub dismissed: u32,
    pub safety_triggered: bool,
}

pub async fn dismiss_popups(
    page: &dyn Page,
    patterns: &[PopupPattern],
    max_rounds: u32,
) -> DismissOutcome {
    let mut outcome = DismissOutcome::default();

    for _round in 0..max_rounds {
        outcome.rounds_run += 1;
        let mut dismissed_this_round = 0u32;

        for pattern in patterns {
            let elements = page.query_all(&pattern.dismiss_selector).await;
            for element in elements.into_iter().filter(|e| e.visible) {
                if is_danger_text(&element.text) {
                    outcome.safety_triggered = true;
                    warn!(
                        selector = %pattern.dismiss_selector,
                        text = %element.text,
                        "refused to click danger text in popup; using cancel control"
                    );
                    if let Some(cancel_selector) = &pattern.cancel_selector {
                        if let Some(cancel) = page
                            .query_all(cancel_selector)
                            .await
                            .into_iter()
                            .find(|e| e.visible)
                        {
                            let _ = page.click(&cancel.handle).await;
                            dismissed_this_round += 1;
                        }
                    }
                    continue;
                }

                if page.click(&element.handle).await.is_ok() {
                    dismissed_this_round += 1;
                }
            }
        }

        outcome.dismissed += dismissed_this_round;
        if dismissed_this_round == 0 {
            break;
        }
    }

    outcome
}
