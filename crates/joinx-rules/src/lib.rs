//! # joinx-rules: Join Planning Passes
//!
//! This crate turns the logical join description from `joinx-core` into an
//! executable plan subtree. The work is split into small passes:
//!
//! - **`classify`**: Splits one AND-clause of the join condition into key
//!   pairs, the ASOF inequality, and conjoined per-side/residual filter
//!   columns registered in the expression DAGs.
//! - **`pushdown`**: The decision table answering whether a filter from
//!   the ON clause may run before the join, given the join's kind,
//!   strictness and the filter's side.
//! - **`select`**: Orchestrates classification and pushdown across all
//!   OR-alternatives, validates the expression shape, and constructs the
//!   fully configured runtime join handle plus any leftover filters.
//! - **`rewrite`**: The one-shot graph rewrite replacing the logical join
//!   node with pre-join expression nodes, the physical join node and a
//!   post-join expression node.
//!
//! All passes are synchronous and operate on structures exclusively owned
//! by the logical join node; they perform no I/O and emit progress only
//! through `tracing`.

pub mod classify;
pub mod pushdown;
pub mod rewrite;
pub mod select;

pub use classify::{classify_condition, concat_conditions, ClassifiedCondition};
pub use pushdown::can_push_down_from_on;
pub use rewrite::{estimate_read_rows, optimize_join, RewriteOutcome};
pub use select::{choose_join_algorithm, SelectedJoin};
