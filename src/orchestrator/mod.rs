//! Orchestrator / Run State Machine (spec §4.7). Owns `RunState`,
//! sequences tool calls into phases, and is the single place batch
//! reorder ordering (oldest-first, replace-then-merge) is decided — the
//! decisions layer never orders batches, it only judges single items.

pub mod keepalive;
pub mod pipeline;
pub mod recovery;
pub mod run;
pub mod state_machine;

pub use pipeline::{build_review_pack, PipelineConfig};
pub use state_machine::{RunEvent, StateMachine};
