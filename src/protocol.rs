//! UI ↔ orchestrator message protocol (spec §6). Request envelopes carry
//! `{id, action, payload?, timestamp}`; responses carry
//! `{id, success, data|error{code,message,cause?}, timing}`. Modeled on
//! the teacher's `#[serde(tag = "type")]` `WsMessage` enum in
//! `api/routes.rs`, generalized to the full action surface this crate
//! needs instead of one fixed variant per message kind.

use crate::error::{CopilotError, ErrorCode};
use crate::models::{CartSnapshot, UserOverride};
use crate::tools::order_detail::RawOrderDetail;
use crate::tools::order_history::RawOrderCard;
use crate::tools::reorder::MergeMode;
use crate::tools::scan_cart::RawCartRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The action surface. Two variants (`OrderExtractDetail`,
/// `RunSubmitHistory`) aren't named in the protocol's one-line action
/// summary but fill a gap it leaves open: `Page` exposes text and
/// visibility, never attributes, so card/row/line-item extraction happens
/// on the extension side and rides up as payload rather than being
/// re-derived here from a bare URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "camelCase")]
pub enum Action {
    #[serde(rename = "state.get")]
    StateGet,
    #[serde(rename = "state.update")]
    StateUpdate,
    #[serde(rename = "run.start")]
    RunStart {
        #[serde(default)]
        order_id: Option<String>,
    },
    /// Delivers the scraped order history + live cart once `run.start`
    /// has moved the run into `running`; triggers review-pack assembly.
    #[serde(rename = "run.submitHistory")]
    RunSubmitHistory {
        orders: Vec<RawOrderDetail>,
        live_cart: CartSnapshot,
        #[serde(default)]
        overrides: Vec<UserOverride>,
    },
    #[serde(rename = "run.pause")]
    RunPause,
    #[serde(rename = "run.resume")]
    RunResume,
    #[serde(rename = "run.cancel")]
    RunCancel,
    #[serde(rename = "run.approveReview")]
    RunApproveReview,
    #[serde(rename = "run.rejectReview")]
    RunRejectReview,
    #[serde(rename = "llm.setApiKey")]
    LlmSetApiKey { api_key: String },
    #[serde(rename = "llm.checkAvailable")]
    LlmCheckAvailable,
    #[serde(rename = "page.detect")]
    PageDetect,
    #[serde(rename = "login.check")]
    LoginCheck,
    #[serde(rename = "order.extractHistory")]
    OrderExtractHistory {
        #[serde(default)]
        limit: Option<usize>,
        #[serde(default)]
        cards: Vec<RawOrderCard>,
        #[serde(default)]
        total_available: usize,
    },
    #[serde(rename = "order.extractDetail")]
    OrderExtractDetail { raw: RawOrderDetail },
    #[serde(rename = "order.reorder")]
    OrderReorder {
        order_id: String,
        detail_url: String,
        mode: MergeMode,
    },
    #[serde(rename = "cart.scan")]
    CartScan {
        #[serde(default)]
        include_out_of_stock: Option<bool>,
        #[serde(default)]
        rows: Vec<RawCartRow>,
    },
    #[serde(rename = "slots.extract")]
    SlotsExtract,
    #[serde(rename = "system.ping")]
    SystemPing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    #[serde(flatten)]
    pub action: Action,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseTiming {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseError {
    pub code: ErrorCode,
    pub message: String,
    pub cause: Option<String>,
}

impl From<&CopilotError> for ResponseError {
    fn from(err: &CopilotError) -> Self {
        Self {
            code: err.code,
            message: err.message.clone(),
            cause: err.cause.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: String,
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<ResponseError>,
    pub timing: ResponseTiming,
}

impl Response {
    pub fn ok(id: impl Into<String>, data: serde_json::Value, timing: ResponseTiming) -> Self {
        Self {
            id: id.into(),
            success: true,
            data: Some(data),
            error: None,
            timing,
        }
    }

    pub fn err(id: impl Into<String>, error: &CopilotError, timing: ResponseTiming) -> Self {
        Self {
            id: id.into(),
            success: false,
            data: None,
            error: Some(error.into()),
            timing,
        }
    }
}

impl ResponseTiming {
    pub fn since(started_at: DateTime<Utc>) -> Self {
        let duration_ms = (Utc::now() - started_at).num_milliseconds().max(0) as u64;
        Self {
            started_at,
            duration_ms,
        }
    }
}
