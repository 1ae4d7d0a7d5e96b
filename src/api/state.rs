//! Shared application state, modeled on the teacher's `AppState` in
//! `main.rs`: one struct bundling every long-lived collaborator the HTTP
//! and WebSocket handlers need, passed around as `axum::extract::State`.

use crate::config::Config;
use crate::models::{OrderDetail, ReviewPack, RunState};
use crate::orchestrator::{PipelineConfig, StateMachine};
use crate::page::Page;
use crate::persistence::RunStateStore;
use crate::preferences::PreferenceStore;
use crate::selectors::SelectorRegistry;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Latest review pack produced by `run.submitHistory`, held until the
/// user approves or rejects it (spec §4.6/§4.7 — the review state is the
/// only point at which decisions are surfaced, never auto-applied).
pub type ReviewPackSlot = Arc<Mutex<Option<ReviewPack>>>;

#[derive(Clone)]
pub struct AppState {
    pub page: Arc<dyn Page>,
    pub registry: Arc<SelectorRegistry>,
    pub config: Arc<Config>,
    pub preferences: Arc<PreferenceStore>,
    pub run_state_store: Arc<RunStateStore>,
    pub state_machine: Arc<Mutex<StateMachine>>,
    pub pending_orders: Arc<Mutex<Vec<OrderDetail>>>,
    pub review_pack: ReviewPackSlot,
    pub llm_api_key: Arc<Mutex<Option<String>>>,
    /// Broadcasts every accepted `RunState` change to connected UIs —
    /// the wire-level counterpart of `state.update` (spec §6).
    pub state_broadcast: broadcast::Sender<RunState>,
}

impl AppState {
    pub fn new(
        page: Arc<dyn Page>,
        registry: SelectorRegistry,
        config: Config,
        preferences: PreferenceStore,
        run_state_store: RunStateStore,
        state_machine: StateMachine,
    ) -> Self {
        let (state_broadcast, _) = broadcast::channel(64);
        Self {
            page,
            registry: Arc::new(registry),
            config: Arc::new(config),
            preferences: Arc::new(preferences),
            run_state_store: Arc::new(run_state_store),
            state_machine: Arc::new(Mutex::new(state_machine)),
            pending_orders: Arc::new(Mutex::new(Vec::new())),
            review_pack: Arc::new(Mutex::new(None)),
            llm_api_key: Arc::new(Mutex::new(None)),
            state_broadcast,
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            analytics: crate::analytics::AnalyticsConfig::default(),
            min_prune_confidence: self.config.min_prune_confidence,
            conservative_mode: self.config.conservative_mode,
        }
    }

    /// Persists `state` and broadcasts it to every subscribed UI. Called
    /// after every accepted state-machine transition (spec §4.7
    /// invariant: "every state change is persisted before the event loop
    /// yields").
    pub fn persist_and_broadcast(&self, state: &RunState) -> anyhow::Result<()> {
        self.run_state_store.save(state)?;
        let _ = self.state_broadcast.send(state.clone());
        Ok(())
    }
}
