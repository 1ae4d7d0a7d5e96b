//! The DOM seam. Tools, the Interactor, and the Resolver never talk to a
//! real browser directly — they go through `Page`, so "runtime reflection
//! on DOM shapes" (design note §9) never leaks past this trait. A real
//! implementation drives an actual tab (CDP/WebDriver, external to this
//! crate); `FakePage` under `#[cfg(test)]` drives a tiny in-memory DOM
//! model for unit/property tests.

use async_trait::async_trait;
use std::time::Duration;

/// A single matched DOM element, opaque outside of `Page` impls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub selector: String,
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementSnapshot {
    pub handle: ElementHandle,
    pub text: String,
    pub visible: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("element not found: {0}")]
    NotFound(String),
}

pub type PageResult<T> = Result<T, PageError>;

/// Abstraction over one browser tab. All methods that touch the page are
/// suspension points (spec §5) and must accept/respect a timeout.
#[async_trait]
pub trait Page: Send + Sync {
    async fn current_url(&self) -> String;

    async fn navigate(&self, url: &str, timeout: Duration) -> PageResult<()>;

    /// Count of elements currently matching `selector`, visible or not.
    async fn count_matches(&self, selector: &str) -> usize;

    /// Count of elements matching `selector` that are presently visible.
    async fn count_visible(&self, selector: &str) -> usize;

    /// Poll until exactly one visible match exists, or timeout.
    async fn wait_visible_unique(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> PageResult<ElementHandle> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.count_visible(selector).await == 1 {
                let snaps = self.query_all(selector).await;
                if let Some(s) = snaps.into_iter().find(|s| s.visible) {
                    return Ok(s.handle);
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(PageError::Timeout(timeout));
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    async fn query_all(&self, selector: &str) -> Vec<ElementSnapshot>;

    async fn text_of(&self, handle: &ElementHandle) -> String;

    async fn click(&self, handle: &ElementHandle) -> PageResult<()>;

    /// Scroll into view, dispatch mousedown/mouseup/click, then fall back
    /// to the native click (spec §4.2 `simulateRealClick`).
    async fn simulate_real_click(&self, handle: &ElementHandle) -> PageResult<()> {
        self.click(handle).await
    }

    async fn screenshot(&self) -> Option<String>;
}
