//! Selector Registry: versioned, authored `SelectorDef`s loaded from disk.
//!
//! File layout matches spec §6: `selectors/<pageId>/v<n>.json`. Exactly
//! one version is "active" per `pageId` — the highest version number
//! found on disk, loaded once at startup. Registry entries are never
//! mutated in place; a new version is a new file.

use crate::error::{CopilotError, CopilotResult};
use crate::models::SelectorDef;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct SelectorRegistry {
    pages: HashMap<String, SelectorDef>,
}

impl SelectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `<pageId>/v<n>.json` under `dir`, keeping only the
    /// highest version per `pageId`.
    pub fn load_from_dir(dir: &Path) -> CopilotResult<Self> {
        let mut best: HashMap<String, SelectorDef> = HashMap::new();

        let entries = std::fs::read_dir(dir).map_err(|e| {
            CopilotError::selector_error(format!("cannot read selector dir {dir:?}: {e}"))
        })?;

        for page_dir in entries.flatten() {
            let page_path = page_dir.path();
            if !page_path.is_dir() {
                continue;
            }
            let Ok(files) = std::fs::read_dir(&page_path) else {
                continue;
            };
            for file in files.flatten() {
                let path = file.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                let raw = match std::fs::read_to_string(&path) {
                    Ok(r) => r,
                    Err(e) => {
                        warn!(?path, %e, "failed to read selector file");
                        continue;
                    }
                };
                let def: SelectorDef = match serde_json::from_str(&raw) {
                    Ok(d) => d,
                    Err(e) => {
                        warn!(?path, %e, "failed to parse selector file, skipping");
                        continue;
                    }
                };
                if def.selectors.values().any(|e| e.primary.trim().is_empty()) {
                    warn!(?path, "selector def has an empty primary selector, skipping");
                    continue;
                }
                match best.get(&def.page_id) {
                    Some(existing) if existing.version >= def.version => {}
                    _ => {
                        info!(page_id = %def.page_id, version = def.version, "loaded selector def");
                        best.insert(def.page_id.clone(), def);
                    }
                }
            }
        }

        Ok(Self { pages: best })
    }

    pub fn insert(&mut self, def: SelectorDef) {
        self.pages.insert(def.page_id.clone(), def);
    }

    pub fn has_page(&self, page_id: &str) -> bool {
        self.pages.contains_key(page_id)
    }

    pub fn get_keys(&self, page_id: &str) -> Vec<String> {
        self.pages
            .get(page_id)
            .map(|d| d.selectors.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Primary-only lookup; `None` if the page or key is unknown.
    pub fn resolve_primary(&self, page_id: &str, key: &str) -> Option<String> {
        self.pages
            .get(page_id)
            .and_then(|d| d.selectors.get(key))
            .map(|e| e.primary.clone())
    }

    /// Full `[primary, ...fallbacks]` candidate chain, in descending
    /// stability-score order (registry authoring invariant, not
    /// re-sorted here — callers trust the authored order).
    pub fn candidate_chain(&self, page_id: &str, key: &str) -> CopilotResult<Vec<String>> {
        let def = self
            .pages
            .get(page_id)
            .ok_or_else(|| CopilotError::selector_error(format!("unknown page {page_id}")))?;
        let entry = def.selectors.get(key).ok_or_else(|| {
            CopilotError::selector_error(format!("unknown selector key {page_id}/{key}"))
        })?;
        let mut chain = vec![entry.primary.clone()];
        chain.extend(entry.fallbacks.iter().cloned());
        Ok(chain)
    }
}
