//! Resolves a `(pageId, key)` against a live `Page`, racing each fallback
//! candidate's "wait until visible and unique" against a timeout (spec
//! §4.1).

use crate::error::{CopilotError, CopilotResult};
use crate::models::ResolveResult;
use crate::page::{ElementHandle, Page, PageError};
use crate::selectors::registry::SelectorRegistry;
use std::time::Duration;
use tracing::warn;

pub struct Resolver<'a> {
    registry: &'a SelectorRegistry,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a SelectorRegistry) -> Self {
        Self { registry }
    }

    pub fn resolve(&self, page_id: &str, key: &str) -> Option<String> {
        self.registry.resolve_primary(page_id, key)
    }

    pub fn has_page(&self, page_id: &str) -> bool {
        self.registry.has_page(page_id)
    }

    pub fn keys(&self, page_id: &str) -> Vec<String> {
        self.registry.get_keys(page_id)
    }

    /// Try each candidate in `[primary, ...fallbacks]` order. The first
    /// candidate that becomes visible-and-unique within `timeout` wins.
    /// `None` if none do within the budget — never a partial result
    /// (spec §8 invariant).
    pub async fn try_resolve(
        &self,
        page: &dyn Page,
        page_id: &str,
        key: &str,
        timeout: Duration,
    ) -> CopilotResult<Option<(ElementHandle, ResolveResult)>> {
        let chain = self.registry.candidate_chain(page_id, key)?;

        for (index, selector) in chain.iter().enumerate() {
            match page.wait_visible_unique(selector, timeout).await {
                Ok(handle) => {
                    let used_fallback = index > 0;
                    if used_fallback {
                        warn!(
                            page_id,
                            key,
                            selector,
                            fallback_index = index - 1,
                            "selector resolved via fallback"
                        );
                    }
                    return Ok(Some((
                        handle,
                        ResolveResult {
                            selector: selector.clone(),
                            used_fallback,
                            fallback_index: used_fallback.then_some(index - 1),
                        },
                    )));
                }
                Err(PageError::Timeout(_)) => continue,
                Err(PageError::NotFound(_)) => continue,
                Err(PageError::Navigation(msg)) => {
                    return Err(CopilotError::selector_error(msg));
                }
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SelectorDef, SelectorEntry};
    use crate::testutil::FakePage;
    use chrono::Utc;
    use std::collections::HashMap;

    fn registry_with(primary: &str, fallbacks: Vec<&str>) -> SelectorRegistry {
        let mut selectors = HashMap::new();
        selectors.insert(
            "search".to_string(),
            SelectorEntry {
                description: "search".to_string(),
                element_type: "input".to_string(),
                primary: primary.to_string(),
                fallbacks: fallbacks.into_iter().map(String::from).collect(),
                strategy: "visible-unique".to_string(),
                stability_score: 95,
            },
        );
        let mut reg = SelectorRegistry::new();
        reg.insert(SelectorDef {
            page_id: "home".to_string(),
            version: 1,
            url_pattern: "*".to_string(),
            created_at: Utc::now(),
            created_by: "test".to_string(),
            selectors,
        });
        reg
    }

    #[tokio::test]
    async fn resolves_primary_when_unique_and_visible() {
        let reg = registry_with("#search-input", vec!["input[type='search']"]);
        let resolver = Resolver::new(&reg);
        let page = FakePage::new();
        page.set_visible("#search-input", 1);

        let result = resolver
            .try_resolve(&page, "home", "search", Duration::from_millis(200))
            .await
            .unwrap()
            .unwrap();
        assert!(!result.1.used_fallback);
    }

    #[tokio::test]
    async fn falls_back_when_primary_missing() {
        let reg = registry_with("#search-input", vec!["input[type='search']"]);
        let resolver = Resolver::new(&reg);
        let page = FakePage::new();
        page.set_visible("#search-input", 0);
        page.set_visible("input[type='search']", 1);

        let (_, result) = resolver
            .try_resolve(&page, "home", "search", Duration::from_millis(200))
            .await
            .unwrap()
            .unwrap();
        assert!(result.used_fallback);
        assert_eq!(result.fallback_index, Some(0));
        assert_eq!(result.selector, "input[type='search']");
    }

    #[tokio::test]
    async fn returns_none_when_nothing_resolves() {
        let reg = registry_with("#search-input", vec!["input[type='search']"]);
        let resolver = Resolver::new(&reg);
        let page = FakePage::new();

        let result = resolver
            .try_resolve(&page, "home", "search", Duration::from_millis(100))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn unknown_page_is_selector_error() {
        let reg = registry_with("#search-input", vec![]);
        let resolver = Resolver::new(&reg);
        let page = FakePage::new();
        let result = resolver
            .try_resolve(&page, "missing", "search", Duration::from_millis(50))
            .await;
        assert!(result.is_err());
    }
}
