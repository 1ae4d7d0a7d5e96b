//! `waitForModal` and `findButtonByText` (spec §4.2).

use crate::page::{ElementSnapshot, Page};
use std::time::Duration;

/// First visible element matching any modal-container selector, or `None`
/// at timeout. Implemented as polling visibility (a real `Page` would
/// observe DOM mutations; the poll loop is the portable fallback every
/// implementation can satisfy).
pub async fn wait_for_modal(
    page: &dyn Page,
    modal_selectors: &[&str],
    timeout: Duration,
) -> Option<ElementSnapshot> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        for selector in modal_selectors {
            if let Some(visible) = page
                .query_all(selector)
                .await
                .into_iter()
                .find(|e| e.visible)
            {
                return Some(visible);
            }
        }
        if tokio::time::Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// Case-insensitive partial match against visible buttons within
/// `container_selector`.
pub async fn find_button_by_text(
    page: &dyn Page,
    container_selector: &str,
    candidates: &[&str],
) -> Option<ElementSnapshot> {
    let buttons = page.query_all(container_selector).await;
    for candidate in candidates {
        let needle = candidate.to_lowercase();
        if let Some(button) = buttons
            .iter()
            .find(|b| b.visible && b.text.to_lowercase().contains(&needle))
        {
            return Some(button.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakePage;

    #[tokio::test]
    async fn finds_first_visible_modal_selector() {
        let page = FakePage::new();
        page.set_visible_with_text(".modal-container", 1, "Juntar ao carrinho?");

        let modal = wait_for_modal(&page, &[".modal-container", ".dialog"], Duration::from_millis(200))
            .await;
        assert!(modal.is_some());
    }

    #[tokio::test]
    async fn times_out_when_no_modal_appears() {
        let page = FakePage::new();
        let modal = wait_for_modal(&page, &[".modal-container"], Duration::from_millis(100)).await;
        assert!(modal.is_none());
    }

    #[tokio::test]
    async fn button_lookup_is_case_insensitive_partial() {
        let page = FakePage::new();
        page.set_visible_with_text(".modal-buttons", 1, "Encomendar de Novo");

        let button = find_button_by_text(
            &page,
            ".modal-buttons",
            &["encomendar de novo", "confirmar"],
        )
        .await;
        assert!(button.is_some());
    }
}
