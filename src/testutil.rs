//! In-memory `Page` double used by unit and property tests across the
//! selector/interactor/tool layers. Not gated behind `#[cfg(test)]` since
//! integration tests under `tests/` link against this crate as a library
//! and need the same double.

use crate::page::{ElementHandle, ElementSnapshot, Page, PageError, PageResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
struct FakeElement {
    id: u64,
    text: String,
    visible: bool,
}

/// A tiny scripted DOM: selectors map to a count of matching elements,
/// each with text/visibility controllable per-test. Clicking a handle can
/// be scripted to mutate other selectors (e.g. a confirm click that makes
/// a modal disappear and the cart total change).
#[derive(Clone)]
pub struct FakePage {
    inner: Arc<Mutex<Inner>>,
}

pub struct Inner {
    elements: HashMap<String, Vec<FakeElement>>,
    url: String,
    click_effects: HashMap<u64, Box<dyn Fn(&mut Inner) + Send + Sync>>,
    next_id: u64,
    clicks: Vec<u64>,
}

static NEXT_GLOBAL_ID: AtomicU64 = AtomicU64::new(1);

impl FakePage {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                elements: HashMap::new(),
                url: "https://www.auchan.pt/".to_string(),
                click_effects: HashMap::new(),
                next_id: 1,
                clicks: Vec::new(),
            })),
        }
    }

    /// Set `count` visible elements matching `selector`, each with empty text.
    pub fn set_visible(&self, selector: &str, count: usize) {
        self.set_visible_with_text(selector, count, "");
    }

    pub fn set_visible_with_text(&self, selector: &str, count: usize, text: &str) {
        let mut inner = self.inner.lock();
        let els = (0..count)
            .map(|_| {
                let id = NEXT_GLOBAL_ID.fetch_add(1, Ordering::Relaxed);
                FakeElement {
                    id,
                    text: text.to_string(),
                    visible: true,
                }
            })
            .collect();
        inner.elements.insert(selector.to_string(), els);
    }

    pub fn hide(&self, selector: &str) {
        let mut inner = self.inner.lock();
        if let Some(els) = inner.elements.get_mut(selector) {
            for e in els.iter_mut() {
                e.visible = false;
            }
        }
    }

    pub fn set_url(&self, url: &str) {
        self.inner.lock().url = url.to_string();
    }

    pub fn clicked_selectors(&self) -> Vec<u64> {
        self.inner.lock().clicks.clone()
    }

    /// Schedule a side effect to run the next time `selector`'s (first)
    /// element is clicked.
    pub fn on_click<F>(&self, selector: &str, effect: F)
    where
        F: Fn(&mut Inner) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        if let Some(first) = inner.elements.get(selector).and_then(|v| v.first()) {
            let id = first.id;
            inner.click_effects.insert(id, Box::new(effect));
        }
    }
}

impl Default for FakePage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Page for FakePage {
    async fn current_url(&self) -> String {
        self.inner.lock().url.clone()
    }

    async fn navigate(&self, url: &str, _timeout: Duration) -> PageResult<()> {
        self.inner.lock().url = url.to_string();
        Ok(())
    }

    async fn count_matches(&self, selector: &str) -> usize {
        self.inner
            .lock()
            .elements
            .get(selector)
            .map(Vec::len)
            .unwrap_or(0)
    }

    async fn count_visible(&self, selector: &str) -> usize {
        self.inner
            .lock()
            .elements
            .get(selector)
            .map(|v| v.iter().filter(|e| e.visible).count())
            .unwrap_or(0)
    }

    async fn query_all(&self, selector: &str) -> Vec<ElementSnapshot> {
        self.inner
            .lock()
            .elements
            .get(selector)
            .map(|v| {
                v.iter()
                    .map(|e| ElementSnapshot {
                        handle: ElementHandle {
                            selector: selector.to_string(),
                            id: e.id,
                        },
                        text: e.text.clone(),
                        visible: e.visible,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn text_of(&self, handle: &ElementHandle) -> String {
        self.inner
            .lock()
            .elements
            .get(&handle.selector)
            .and_then(|v| v.iter().find(|e| e.id == handle.id))
            .map(|e| e.text.clone())
            .unwrap_or_default()
    }

    async fn click(&self, handle: &ElementHandle) -> PageResult<()> {
        let mut inner = self.inner.lock();
        let exists = inner
            .elements
            .get(&handle.selector)
            .map(|v| v.iter().any(|e| e.id == handle.id))
            .unwrap_or(false);
        if !exists {
            return Err(PageError::NotFound(handle.selector.clone()));
        }
        inner.clicks.push(handle.id);
        if let Some(effect) = inner.click_effects.remove(&handle.id) {
            effect(&mut inner);
        }
        Ok(())
    }

    async fn screenshot(&self) -> Option<String> {
        Some("data:image/png;base64,fake".to_string())
    }
}

/// Test-only helper: directly mutate the fake DOM from within a scripted
/// click effect (see `FakePage::on_click`).
impl Inner {
    pub fn set_visible(&mut self, selector: &str, count: usize) {
        let els = (0..count)
            .map(|_| FakeElement {
                id: NEXT_GLOBAL_ID.fetch_add(1, Ordering::Relaxed),
                text: String::new(),
                visible: true,
            })
            .collect();
        self.elements.insert(selector.to_string(), els);
    }

    pub fn hide(&mut self, selector: &str) {
        if let Some(els) = self.elements.get_mut(selector) {
            for e in els.iter_mut() {
                e.visible = false;
            }
        }
    }

    pub fn set_text(&mut self, selector: &str, text: &str) {
        if let Some(els) = self.elements.get_mut(selector) {
            for e in els.iter_mut() {
                e.text = text.to_string();
            }
        }
    }

    pub fn set_url(&mut self, url: &str) {
        self.url = url.to_string();
    }
}
