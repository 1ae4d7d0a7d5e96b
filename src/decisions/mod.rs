//! Decision Engines (spec §4.5): category detection, cadence estimation,
//! timing classification, and the StockPruner's decision precedence
//! ladder, plus an optional LLM batch reviewer.

pub mod cadence;
pub mod category;
pub mod llm_reviewer;
pub mod pruner;
pub mod timing;

pub use pruner::{decide_prune, PruneContext};
