//! Pure `RunState` transition table (spec §4.7). Never touches the page
//! or persistence directly — [`run::RunDriver`](super::run::RunDriver)
//! wires this to tools and to a persisted checkpoint writer.

use crate::error::CopilotError;
use crate::models::{RunError, RunState, RunStatus};
use chrono::Utc;

#[derive(Debug, Clone)]
pub enum RunEvent {
    StartRun,
    PauseRun,
    ResumeRun,
    CancelRun,
    PhaseComplete(String),
    Error { recoverable: bool, message: String },
    RecoveryComplete,
    ReachReview,
    ApproveReview,
    RejectReview,
}

/// Wraps a `RunState` with the one legal transition table (spec §4.7).
/// `apply` rejects any transition not in that table with
/// `INVALID_STATE`, matching §5's "starting a new run from a non-idle
/// state is rejected with INVALID_STATE".
pub struct StateMachine {
    state: RunState,
}

impl StateMachine {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            state: RunState::new(run_id),
        }
    }

    pub fn from_state(state: RunState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn status(&self) -> RunStatus {
        self.state.status
    }

    /// Applies one event, mutating `state` only on success. Touches
    /// `updated_at` on every accepted transition — callers persist the
    /// checkpoint immediately after (spec §4.7 invariant: "every state
    /// change is persisted before the event loop yields").
    pub fn apply(&mut self, event: RunEvent) -> Result<(), CopilotError> {
        use RunStatus::*;

        match (self.state.status, &event) {
            (Idle, RunEvent::StartRun) => {
                self.state.status = Running;
                self.state.phase = "running".to_string();
                self.state.error = None;
            }
            (Running, RunEvent::PauseRun) => {
                self.state.status = Paused;
            }
            (Paused, RunEvent::ResumeRun) => {
                self.state.status = Running;
            }
            (Running, RunEvent::CancelRun) | (Paused, RunEvent::CancelRun) => {
                self.state.status = Cancelled;
                self.state.phase = "cancelled".to_string();
            }
            (Running, RunEvent::PhaseComplete(phase)) => {
                self.state.phase = phase.clone();
            }
            (Running, RunEvent::Error { recoverable: true, message }) => {
                self.state.status = Paused;
                self.state.error = Some(RunError {
                    message: message.clone(),
                    recoverable: true,
                });
            }
            (Running, RunEvent::Error { recoverable: false, message })
            | (Paused, RunEvent::Error { recoverable: false, message }) => {
                self.state.status = Cancelled;
                self.state.phase = "cancelled".to_string();
                self.state.error = Some(RunError {
                    message: message.clone(),
                    recoverable: false,
                });
            }
            (Running | Paused, RunEvent::RecoveryComplete) if self.state.recovery_needed => {
                self.state.recovery_needed = false;
            }
            (Running, RunEvent::ReachReview) => {
                self.state.status = Review;
                self.state.phase = "review".to_string();
            }
            (Review, RunEvent::ApproveReview) => {
                self.state.status = Complete;
                self.state.phase = "complete".to_string();
            }
            (Review, RunEvent::RejectReview) => {
                self.state.status = Cancelled;
                self.state.phase = "cancelled".to_string();
            }
            _ => {
                return Err(CopilotError::invalid_state(format!(
                    "event {event:?} not valid from status {:?}",
                    self.state.status
                )));
            }
        }

        self.state.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_reaches_complete_via_review() {
        let mut sm = StateMachine::new("run-1");
        sm.apply(RunEvent::StartRun).unwrap();
        assert_eq!(sm.status(), RunStatus::Running);
        sm.apply(RunEvent::PhaseComplete("scanning_cart".to_string()))
            .unwrap();
        assert_eq!(sm.state().phase, "scanning_cart");
        sm.apply(RunEvent::ReachReview).unwrap();
        assert_eq!(sm.status(), RunStatus::Review);
        sm.apply(RunEvent::ApproveReview).unwrap();
        assert_eq!(sm.status(), RunStatus::Complete);
    }

    #[test]
    fn starting_a_run_from_non_idle_is_rejected() {
        let mut sm = StateMachine::new("run-1");
        sm.apply(RunEvent::StartRun).unwrap();
        let err = sm.apply(RunEvent::StartRun).unwrap_err();
        assert_eq!(sm.status(), RunStatus::Running);
        assert_eq!(err.code, crate::error::ErrorCode::InvalidState);
    }

    #[test]
    fn review_only_transitions_to_complete_or_cancelled() {
        let mut sm = StateMachine::new("run-1");
        sm.apply(RunEvent::StartRun).unwrap();
        sm.apply(RunEvent::ReachReview).unwrap();

        for event in [
            RunEvent::StartRun,
            RunEvent::PauseRun,
            RunEvent::ResumeRun,
            RunEvent::CancelRun,
            RunEvent::PhaseComplete("x".to_string()),
            RunEvent::Error {
                recoverable: true,
                message: "x".to_string(),
            },
            RunEvent::RecoveryComplete,
            RunEvent::ReachReview,
        ] {
            let mut probe = StateMachine::from_state(sm.state().clone());
            assert!(probe.apply(event).is_err());
        }

        sm.apply(RunEvent::RejectReview).unwrap();
        assert_eq!(sm.status(), RunStatus::Cancelled);
    }

    #[test]
    fn recoverable_error_while_running_pauses_with_error_set() {
        let mut sm = StateMachine::new("run-1");
        sm.apply(RunEvent::StartRun).unwrap();
        sm.apply(RunEvent::Error {
            recoverable: true,
            message: "login redirect detected".to_string(),
        })
        .unwrap();
        assert_eq!(sm.status(), RunStatus::Paused);
        assert!(sm.state().error.as_ref().unwrap().recoverable);
    }

    #[test]
    fn non_recoverable_error_cancels_the_run() {
        let mut sm = StateMachine::new("run-1");
        sm.apply(RunEvent::StartRun).unwrap();
        sm.apply(RunEvent::Error {
            recoverable: false,
            message: "danger text encountered".to_string(),
        })
        .unwrap();
        assert_eq!(sm.status(), RunStatus::Cancelled);
    }

    #[test]
    fn recovery_complete_requires_recovery_needed_flag() {
        let mut sm = StateMachine::new("run-1");
        sm.apply(RunEvent::StartRun).unwrap();
        assert!(sm.apply(RunEvent::RecoveryComplete).is_err());

        let mut state = sm.state().clone();
        state.recovery_needed = true;
        let mut sm2 = StateMachine::from_state(state);
        sm2.apply(RunEvent::RecoveryComplete).unwrap();
        assert!(!sm2.state().recovery_needed);
        assert_eq!(sm2.status(), RunStatus::Running);
    }

    #[test]
    fn cancel_from_paused_is_accepted() {
        let mut sm = StateMachine::new("run-1");
        sm.apply(RunEvent::StartRun).unwrap();
        sm.apply(RunEvent::PauseRun).unwrap();
        sm.apply(RunEvent::CancelRun).unwrap();
        assert_eq!(sm.status(), RunStatus::Cancelled);
    }
}
