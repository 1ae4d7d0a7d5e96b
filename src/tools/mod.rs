//! Tool Layer (spec §4.3): the CartBuilder surface. Every tool shares a
//! `ToolContext` and returns a `ToolOutcome` — result-shaped, never a
//! panic, per design note §9 ("standardise on result-shaped returns at
//! tool boundaries").

pub mod navigate;
pub mod order_detail;
pub mod order_history;
pub mod reorder;
pub mod scan_cart;
pub mod slots;

use crate::error::CopilotError;
use crate::page::Page;
use crate::selectors::SelectorRegistry;
use std::time::Duration;

pub struct ToolConfig {
    pub element_visibility_timeout: Duration,
    pub navigation_timeout: Duration,
    pub modal_timeout: Duration,
    pub cart_update_window: Duration,
    pub popup_dismiss_rounds: u32,
    pub max_orders: usize,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            element_visibility_timeout: Duration::from_millis(2500),
            navigation_timeout: Duration::from_secs(15),
            modal_timeout: Duration::from_secs(5),
            cart_update_window: Duration::from_secs(3),
            popup_dismiss_rounds: 3,
            max_orders: 50,
        }
    }
}

pub struct ToolContext<'a> {
    pub page: &'a dyn Page,
    pub registry: &'a SelectorRegistry,
    pub config: &'a ToolConfig,
}

#[derive(Debug, Clone, Default)]
pub struct ToolOutcomeMeta {
    pub screenshots: Vec<String>,
    pub warnings: Vec<String>,
}

pub struct ToolOutcome<T> {
    pub result: Result<T, CopilotError>,
    pub meta: ToolOutcomeMeta,
}

impl<T> ToolOutcome<T> {
    pub fn ok(value: T) -> Self {
        Self {
            result: Ok(value),
            meta: ToolOutcomeMeta::default(),
        }
    }

    pub fn err(error: CopilotError) -> Self {
        Self {
            result: Err(error),
            meta: ToolOutcomeMeta::default(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.meta.warnings.push(warning.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}
