//! Process-wide configuration (spec §5/§9). Values come from the
//! environment, loaded the way the teacher's `main.rs` loads its own —
//! `dotenv().ok()` first, then `std::env::var` with a fallback per
//! setting, not a single parsed config file.

use std::time::Duration;

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Port the control/WebSocket server binds to.
    pub port: u16,
    /// SQLite path for `UserOverride`s.
    pub preferences_db_path: String,
    /// SQLite path for `RunState` checkpoints.
    pub run_state_db_path: String,
    /// Directory holding versioned selector JSON files.
    pub selectors_dir: String,
    /// Never auto-prune below this confidence; falls back to keep.
    pub min_prune_confidence: f64,
    /// When true, the pruner's conservative-mode downgrade is active
    /// (spec §4.5 precedence step 5): borderline items are kept, not
    /// pruned, whenever the heuristic and LLM disagree or evidence is
    /// thin.
    pub conservative_mode: bool,
    /// LLM decision overrides the heuristic one only at or above this
    /// confidence (spec §9 OQ3); below it, the heuristic stands.
    pub llm_confidence_threshold: f64,
    /// Seconds between orchestrator keep-alive ticks while a run is
    /// active.
    pub keepalive_interval: Duration,
    /// Cap on how many historical orders one run will reconstruct from.
    pub max_orders: usize,
    pub element_visibility_timeout: Duration,
    pub navigation_timeout: Duration,
    pub modal_timeout: Duration,
    pub cart_update_window: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            port: env_u64("PORT", 8787) as u16,
            preferences_db_path: env_string("PREFERENCES_DB_PATH", "copilot_preferences.db"),
            run_state_db_path: env_string("RUN_STATE_DB_PATH", "copilot_run_state.db"),
            selectors_dir: env_string("SELECTORS_DIR", "selectors"),
            min_prune_confidence: env_f64("MIN_PRUNE_CONFIDENCE", 0.6).clamp(0.0, 1.0),
            conservative_mode: env_bool("CONSERVATIVE_MODE", false),
            llm_confidence_threshold: env_f64("LLM_CONFIDENCE_THRESHOLD", 0.75).clamp(0.0, 1.0),
            keepalive_interval: Duration::from_secs(env_u64("KEEPALIVE_INTERVAL_SECS", 20)),
            max_orders: env_usize("MAX_ORDERS", 50),
            element_visibility_timeout: Duration::from_millis(env_u64(
                "ELEMENT_VISIBILITY_TIMEOUT_MS",
                2500,
            )),
            navigation_timeout: Duration::from_secs(env_u64("NAVIGATION_TIMEOUT_SECS", 15)),
            modal_timeout: Duration::from_secs(env_u64("MODAL_TIMEOUT_SECS", 5)),
            cart_update_window: Duration::from_secs(env_u64("CART_UPDATE_WINDOW_SECS", 3)),
        }
    }

    pub fn tool_config(&self) -> crate::tools::ToolConfig {
        crate::tools::ToolConfig {
            element_visibility_timeout: self.element_visibility_timeout,
            navigation_timeout: self.navigation_timeout,
            modal_timeout: self.modal_timeout,
            cart_update_window: self.cart_update_window,
            popup_dismiss_rounds: 3,
            max_orders: self.max_orders,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8787,
            preferences_db_path: "copilot_preferences.db".to_string(),
            run_state_db_path: "copilot_run_state.db".to_string(),
            selectors_dir: "selectors".to_string(),
            min_prune_confidence: 0.6,
            conservative_mode: false,
            llm_confidence_threshold: 0.75,
            keepalive_interval: Duration::from_secs(20),
            max_orders: 50,
            element_visibility_timeout: Duration::from_millis(2500),
            navigation_timeout: Duration::from_secs(15),
            modal_timeout: Duration::from_secs(5),
            cart_update_window: Duration::from_secs(3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_GUARD: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();
        assert_eq!(cfg.min_prune_confidence, 0.6);
        assert_eq!(cfg.llm_confidence_threshold, 0.75);
        assert!(!cfg.conservative_mode);
    }

    #[test]
    fn from_env_clamps_out_of_range_confidence() {
        let _guard = ENV_GUARD.lock().unwrap();
        std::env::set_var("MIN_PRUNE_CONFIDENCE", "1.5");
        let cfg = Config::from_env();
        assert_eq!(cfg.min_prune_confidence, 1.0);
        std::env::remove_var("MIN_PRUNE_CONFIDENCE");
    }

    #[test]
    fn from_env_falls_back_on_missing_vars() {
        let _guard = ENV_GUARD.lock().unwrap();
        std::env::remove_var("PORT");
        let cfg = Config::from_env();
        assert_eq!(cfg.port, 8787);
    }
}
