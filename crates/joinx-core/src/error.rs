//! Planner error types.
//!
//! All planning failures are immediate and non-retryable. Selection
//! validates a join specification before touching any expression DAG, so a
//! returned error always leaves the logical step exactly as it was.

use thiserror::Error;

/// Errors raised while planning a join.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JoinPlanError {
    /// The ON/USING expression violates a structural rule (an inequality
    /// outside ASOF, a malformed ASOF shape, keys on a structural join).
    /// The message names the offending clause.
    #[error("invalid JOIN ON expression: {0}")]
    InvalidCondition(String),

    /// No runtime join engine exists for the requested combination of
    /// kind, strictness and algorithm.
    #[error("join is not supported: {0}")]
    Unsupported(String),

    /// A planner invariant was broken, e.g. trying to execute a logical
    /// join placeholder. Always a programming error, never user input.
    #[error("logical error: {0}")]
    Internal(String),
}
