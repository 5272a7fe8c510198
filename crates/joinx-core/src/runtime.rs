//! # Runtime Join Handle
//!
//! The fully configured description of a join that the execution engine
//! consumes. Algorithm selection turns a logical `JoinInfo` into one of
//! these; nothing here performs any row matching -- the handle is pure
//! configuration for the engine's build(right)/probe(left) protocol.
//!
//! ## Clauses
//!
//! Each OR-alternative of the join condition becomes one `JoinClause`: its
//! equality (and, for ASOF, inequality) key pairs, plus any per-side filter
//! that could not be pushed below the join and therefore must be evaluated
//! while matching against that specific clause.
//!
//! ## Mixed expression
//!
//! Residual conditions that cannot be factored into a single post-join
//! filter (because several OR'd clauses each carry their own) are bound to
//! the engine as a "mixed" expression, evaluated per candidate matched
//! pair during matching rather than on accepted matches only.

use crate::expr::{ActionsDag, Header};
use crate::join::{AsofInequality, JoinKind, JoinLocality, JoinStrictness};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One key pair of a join clause. Null-safety is tracked per key, not per
/// join: `a = b AND c <=> d` compares `a`/`b` null-rejecting and `c`/`d`
/// null-matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinKey {
    pub left_name: String,
    pub right_name: String,
    pub null_safe: bool,
}

impl JoinKey {
    pub fn new(left_name: impl Into<String>, right_name: impl Into<String>, null_safe: bool) -> Self {
        Self {
            left_name: left_name.into(),
            right_name: right_name.into(),
            null_safe,
        }
    }
}

impl fmt::Display for JoinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.null_safe { "<=>" } else { "=" };
        write!(f, "{} {} {}", self.left_name, op, self.right_name)
    }
}

/// Key set and clause-scoped filters for one OR-alternative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinClause {
    pub keys: Vec<JoinKey>,
    /// Left-side filter evaluated only when matching against this clause.
    pub left_filter_column: Option<String>,
    /// Right-side filter evaluated only when matching against this clause.
    pub right_filter_column: Option<String>,
    /// Residual condition evaluated on candidate pairs matched through
    /// this clause. The column lives in the mixed expression's DAG.
    pub residual_filter_column: Option<String>,
}

/// Residual conditions bound to the engine for per-candidate evaluation.
/// The DAG computes every clause's residual column from the concatenated
/// left and right outputs; clauses name their column in
/// `residual_filter_column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixedJoinExpression {
    pub actions: ActionsDag,
}

/// An externally prepared build side, e.g. a persisted join table or a
/// key-value source that can answer lookups directly. Carried opaquely;
/// the engine resolves the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreparedJoinSource {
    JoinStorage(String),
    KeyValue(String),
}

/// Everything the runtime engine needs to know about the join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeJoinConfig {
    pub kind: JoinKind,
    pub strictness: JoinStrictness,
    pub locality: JoinLocality,
    /// One entry per OR-alternative of the join condition.
    pub clauses: Vec<JoinClause>,
    /// Match direction of the ASOF inequality key, for ASOF strictness.
    pub asof_inequality: Option<AsofInequality>,
    /// Input columns of the two sides, after pre-join expressions.
    pub left_columns: Header,
    pub right_columns: Header,
    /// Output columns the query actually needs, for pruning.
    pub used_columns: Vec<String>,
    pub mixed_filter: Option<MixedJoinExpression>,
    pub prepared_source: Option<PreparedJoinSource>,
    /// Build-side limits; 0 means unlimited.
    pub max_rows_in_join: u64,
    pub max_bytes_in_join: u64,
}

/// Hash-based join: builds a table over the right input keyed by the
/// clauses' key columns, then probes with the left input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashJoin {
    pub config: RuntimeJoinConfig,
    /// Header of the build side.
    pub right_header: Header,
    /// ANY-join tie-break: keep the last matching build row.
    pub any_take_last_row: bool,
}

/// Positional join: pairs the inputs row by row, no keys involved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasteJoin {
    pub config: RuntimeJoinConfig,
    pub right_header: Header,
}

/// A fully configured join handle, ready for the execution engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuntimeJoin {
    Hash(HashJoin),
    Paste(PasteJoin),
}

impl RuntimeJoin {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hash(_) => "HashJoin",
            Self::Paste(_) => "PasteJoin",
        }
    }

    pub fn config(&self) -> &RuntimeJoinConfig {
        match self {
            Self::Hash(join) => &join.config,
            Self::Paste(join) => &join.config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        assert_eq!(JoinKey::new("a", "b", false).to_string(), "a = b");
        assert_eq!(JoinKey::new("a", "b", true).to_string(), "a <=> b");
    }
}
