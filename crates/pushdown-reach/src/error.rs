//! Analysis error types.

use thiserror::Error;

/// An error raised at the query surface.
///
/// Everything else the engine can encounter (empty results, a
/// not-yet-closed analysis) is represented by an empty or incomplete
/// result sequence rather than by failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError<St> {
    /// `reachable_states` was called for a `(state, actions)` pair that
    /// was never registered via `add_start_state`.
    #[error("reachability requested for non-start state {state}")]
    ReachabilityRequestForNonStartState { state: St },
}

/// Result type for analysis queries.
pub type AnalysisResult<T, St> = Result<T, AnalysisError<St>>;
