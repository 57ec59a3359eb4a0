//! Session lifecycle states and the transitions between them.

use thiserror::Error;

/// Lifecycle of one streaming session.
///
/// The observable cycle is `Idle -> Starting -> Active -> Idle`; `Stopping`
/// exists only while `stop` runs so a concurrent caller fails fast instead of
/// racing the teardown. A failed or cancelled start falls back from
/// `Starting` to `Idle` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Starting,
    Active,
    Stopping,
}

/// Rejected transition, carrying both endpoints.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid session transition: {from:?} -> {to:?}")]
pub struct SessionStateError {
    pub from: SessionState,
    pub to: SessionState,
}

impl SessionState {
    /// Validates a transition and returns the next state.
    pub fn transition(self, next: SessionState) -> Result<SessionState, SessionStateError> {
        use SessionState::*;
        match (self, next) {
            (Idle, Starting)
            | (Starting, Active)
            | (Starting, Idle)
            | (Starting, Stopping)
            | (Active, Stopping)
            | (Stopping, Idle) => Ok(next),
            (from, to) => Err(SessionStateError { from, to }),
        }
    }
}
