//! Planner settings.
//!
//! The knobs the join planner reads from the query context: the preferred
//! algorithm, sizing of the produced physical step, the ANY-join tie-break
//! policy, and in-memory limits forwarded to the runtime engine.

use serde::{Deserialize, Serialize};

/// Join algorithm requested by the user. `Auto` lets the planner decide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinAlgorithm {
    Auto,
    Hash,
    /// Accepted in settings for compatibility; no engine is provided, so
    /// requesting it fails algorithm selection.
    FullSortingMerge,
}

/// Settings consulted during join planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSettings {
    pub algorithm: JoinAlgorithm,
    /// Block size of the produced physical join step.
    pub max_block_size: usize,
    /// Degree of parallelism of the produced physical join step.
    pub max_threads: usize,
    /// ANY-join tie-break: keep the last matching row instead of the first.
    pub join_any_take_last_row: bool,
    /// Row limit for the build side; 0 means unlimited.
    pub max_rows_in_join: u64,
    /// Byte limit for the build side; 0 means unlimited.
    pub max_bytes_in_join: u64,
}

impl Default for JoinSettings {
    fn default() -> Self {
        Self {
            algorithm: JoinAlgorithm::Auto,
            max_block_size: 65409,
            max_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            join_any_take_last_row: false,
            max_rows_in_join: 0,
            max_bytes_in_join: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = JoinSettings::default();
        assert_eq!(settings.algorithm, JoinAlgorithm::Auto);
        assert_eq!(settings.max_block_size, 65409);
        assert!(settings.max_threads >= 1);
        assert!(!settings.join_any_take_last_row);
    }
}
