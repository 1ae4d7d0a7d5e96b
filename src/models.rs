//! Core data model (spec §3). Owned collaboratively: the Orchestrator owns
//! `RunState`, Analytics owns its derived maps, the Preference Store is
//! shared-read / explicit-write-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------
// Selector registry
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorEntry {
    pub description: String,
    pub element_type: String,
    pub primary: String,
    #[serde(default)]
    pub fallbacks: Vec<String>,
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// 0-100, higher is more stable (data-testid=95 .. text match=50).
    pub stability_score: u8,
}

fn default_strategy() -> String {
    "visible-unique".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorDef {
    pub page_id: String,
    pub version: u32,
    pub url_pattern: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub selectors: HashMap<String, SelectorEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolveResult {
    pub selector: String,
    pub used_fallback: bool,
    pub fallback_index: Option<usize>,
}

// ---------------------------------------------------------------------
// Run state machine
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Idle,
    Running,
    Paused,
    Review,
    Complete,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunError {
    pub message: String,
    pub recoverable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: String,
    pub status: RunStatus,
    pub phase: String,
    pub checkpoint: serde_json::Value,
    pub recovery_needed: bool,
    pub error: Option<RunError>,
    pub updated_at: DateTime<Utc>,
}

impl RunState {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            status: RunStatus::Idle,
            phase: "idle".to_string(),
            checkpoint: serde_json::json!({}),
            recovery_needed: false,
            error: None,
            updated_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------
// Order history / detail
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: String,
    pub date: DateTime<Utc>,
    pub product_count: u32,
    pub total_price: f64,
    pub detail_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub product_id: Option<String>,
    pub name: String,
    pub url: Option<String>,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: f64,
}

impl OrderLineItem {
    pub fn derived_total(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryInfo {
    pub window: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostSummary {
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    pub summary: OrderSummary,
    pub items: Vec<OrderLineItem>,
    pub delivery: DeliveryInfo,
    pub cost_summary: CostSummary,
}

impl OrderDetail {
    /// Σ items.qty*unit ≈ costSummary.subtotal, tolerance 1¢×n (spec §3).
    pub fn subtotal_within_tolerance(&self) -> bool {
        let computed: f64 = self.items.iter().map(OrderLineItem::derived_total).sum();
        let tolerance = 0.01 * self.items.len().max(1) as f64;
        (computed - self.cost_summary.subtotal).abs() <= tolerance
    }
}

// ---------------------------------------------------------------------
// Cart
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub product_id: Option<String>,
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub available: bool,
}

impl CartItem {
    /// Identity: `productId` when present else normalized name (spec §3/§4.4).
    pub fn identity(&self) -> String {
        match &self.product_id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => crate::analytics::identity::normalize_name(&self.name),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub timestamp: DateTime<Utc>,
    pub items: Vec<CartItem>,
    pub item_count: u32,
    pub total_price: f64,
}

impl CartSnapshot {
    pub fn empty(at: DateTime<Utc>) -> Self {
        Self {
            timestamp: at,
            items: Vec::new(),
            item_count: 0,
            total_price: 0.0,
        }
    }

    pub fn quantity_sum(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

// ---------------------------------------------------------------------
// Purchase history / analytics
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub product_id: Option<String>,
    pub product_name: String,
    pub purchase_date: DateTime<Utc>,
    pub quantity: u32,
    pub order_id: String,
}

impl PurchaseRecord {
    pub fn identity(&self) -> String {
        match &self.product_id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => crate::analytics::identity::normalize_name(&self.product_name),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IntervalStats {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub cv: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QuantityStats {
    pub mean: f64,
    pub std_dev: f64,
    pub mode: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VelocityTrend {
    Accelerating,
    Decelerating,
    Stable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendStats {
    pub delta: f64,
    pub slope: f64,
    pub r_squared: f64,
    pub velocity_trend: VelocityTrend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonalityStats {
    pub score: f64,
    pub peak_month: u32,
    pub trough_month: u32,
    pub is_currently_peak_season: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoPurchaseEdge {
    pub product_identity: String,
    pub co_occurrence_count: u32,
    pub lift: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductAnalytics {
    pub identity: String,
    pub interval_stats: IntervalStats,
    pub quantity_stats: QuantityStats,
    pub trend: Option<TrendStats>,
    pub seasonality: Option<SeasonalityStats>,
    pub frequently_bought_with: Vec<CoPurchaseEdge>,
    pub analytics_confidence: f64,
    pub last_purchase_date: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------
// Decisions / preferences
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruneDecision {
    pub product_identity: String,
    pub prune: bool,
    pub confidence: f64,
    pub reason: String,
    pub context: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OverrideKind {
    AlwaysPrune,
    NeverPrune,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserOverride {
    pub product_identity: String,
    pub kind: Option<OverrideKind>,
    pub custom_cadence_days: Option<u32>,
}

// ---------------------------------------------------------------------
// Diff / review
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffItem {
    pub identity: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantityChange {
    pub identity: String,
    pub name: String,
    pub before_quantity: u32,
    pub after_quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffSummary {
    pub price_difference: f64,
    pub before_total: f64,
    pub after_total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartDiff {
    pub added: Vec<DiffItem>,
    pub removed: Vec<DiffItem>,
    pub quantity_changed: Vec<QuantityChange>,
    pub unchanged: Vec<DiffItem>,
    pub summary: DiffSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewPack {
    pub run_id: String,
    pub diff: CartDiff,
    pub decisions: Vec<PruneDecision>,
    pub warnings: Vec<String>,
    pub screenshots: Vec<String>,
    pub confidence: f64,
    pub generated_at: DateTime<Utc>,
}
