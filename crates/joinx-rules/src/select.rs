//! # Join Algorithm Selection
//!
//! Turns the logical join description carried by a `JoinStepLogical` into
//! a fully configured runtime join handle plus the filters that may run
//! outside the join:
//!
//! 1. The whole expression is validated up front -- operator legality per
//!    clause, the ASOF shape, and engine availability. Validation reads
//!    but never writes, so a failed selection leaves the step and its
//!    DAGs exactly as they were.
//! 2. Each OR-alternative is classified into a key clause. Per-side
//!    filters either surface as algorithm-level pre-filters (single
//!    disjunct, pushdown table permitting) or bind to their clause;
//!    residual conditions either surface as one post-filter or bind to
//!    the engine's mixed expression, evaluated per candidate pair.
//! 3. The handle is constructed: a positional paste join for PASTE kind,
//!    a hash join keyed on the accumulated clauses otherwise.
//!
//! Construction is pure -- no I/O, no row processing. The caller receives
//! either a complete handle or an error, never something in between.

use crate::classify::classify_condition;
use crate::pushdown::can_push_down_from_on;
use joinx_core::error::JoinPlanError;
use joinx_core::join::{
    JoinActionRef, JoinInfo, JoinKind, JoinStrictness, JoinTableSide,
};
use joinx_core::plan::JoinStepLogical;
use joinx_core::runtime::{
    HashJoin, JoinClause, MixedJoinExpression, PasteJoin, RuntimeJoin, RuntimeJoinConfig,
};
use joinx_core::settings::{JoinAlgorithm, JoinSettings};
use tracing::{debug, trace};

/// The outcome of algorithm selection: the runtime handle and the filters
/// the caller must materialize as plan nodes outside the join.
#[derive(Debug, Clone)]
pub struct SelectedJoin {
    pub join: RuntimeJoin,
    /// Filter to apply to the left input before the join.
    pub left_pre_filter: Option<JoinActionRef>,
    /// Filter to apply to the right input before the join.
    pub right_pre_filter: Option<JoinActionRef>,
    /// Filter to apply to the joined output.
    pub post_filter: Option<JoinActionRef>,
}

/// Validate the join expression against the requested kind, strictness
/// and algorithm. Read-only; every selection error originates here.
fn validate_join(join_info: &JoinInfo, settings: &JoinSettings) -> Result<(), JoinPlanError> {
    if settings.algorithm == JoinAlgorithm::FullSortingMerge {
        return Err(JoinPlanError::Unsupported(
            "no runtime engine for full sorting merge join".to_string(),
        ));
    }

    let kind = join_info.kind;
    let strictness = join_info.strictness;
    let conditions = &join_info.expression.disjunctive_conditions;

    if kind.requires_keys() && conditions.is_empty() {
        return Err(JoinPlanError::InvalidCondition(format!(
            "{} join requires a join condition",
            kind
        )));
    }

    for condition in conditions {
        let mut inequalities = 0usize;
        for predicate in &condition.predicates {
            if predicate.op.is_equality() {
                continue;
            }
            if strictness != JoinStrictness::Asof {
                return Err(JoinPlanError::InvalidCondition(format!(
                    "inequality predicate is only allowed in ASOF join: {}",
                    condition
                )));
            }
            inequalities += 1;
            if inequalities > 1 {
                return Err(JoinPlanError::InvalidCondition(format!(
                    "multiple inequality predicates in join condition: {}",
                    condition
                )));
            }
        }

        if !kind.requires_keys() && !condition.predicates.is_empty() {
            return Err(JoinPlanError::InvalidCondition(format!(
                "{} join cannot carry key predicates: {}",
                kind, condition
            )));
        }
        if kind.requires_keys() && condition.predicates.is_empty() {
            return Err(JoinPlanError::InvalidCondition(format!(
                "no key predicates in join condition: {}",
                condition
            )));
        }
    }

    if strictness == JoinStrictness::Asof {
        if conditions.len() != 1 {
            return Err(JoinPlanError::InvalidCondition(
                "ASOF join does not support multiple disjuncts in JOIN ON expression".to_string(),
            ));
        }
        let inequalities = conditions[0]
            .predicates
            .iter()
            .filter(|p| !p.op.is_equality())
            .count();
        if inequalities == 0 {
            return Err(JoinPlanError::InvalidCondition(
                "ASOF join requires one inequality predicate in JOIN ON expression".to_string(),
            ));
        }
        if !matches!(kind, JoinKind::Inner | JoinKind::Left) {
            return Err(JoinPlanError::Unsupported(format!(
                "ASOF strictness is not supported for {} join",
                kind
            )));
        }
    }

    Ok(())
}

/// Choose and configure the runtime join for a logical join step.
///
/// On success the step's DAGs have the conjoined filter columns exported
/// and the returned handle is complete. On error nothing was modified.
pub fn choose_join_algorithm(
    step: &mut JoinStepLogical,
    settings: &JoinSettings,
) -> Result<SelectedJoin, JoinPlanError> {
    validate_join(&step.join_info, settings)?;

    let join_info = step.join_info.clone();
    let kind = join_info.kind;
    let strictness = join_info.strictness;
    let single_disjunct = join_info.expression.disjunctive_conditions.len() == 1;

    let mut clauses = Vec::with_capacity(join_info.expression.disjunctive_conditions.len());
    let mut asof_inequality = None;
    let mut left_pre_filter = None;
    let mut right_pre_filter = None;
    let mut post_filter = None;
    let mut engine_bound_residual = false;

    for condition in &join_info.expression.disjunctive_conditions {
        let classified = classify_condition(condition, strictness, &mut step.expression_actions)?;
        let mut clause = JoinClause {
            keys: classified.keys,
            ..Default::default()
        };
        if classified.asof_inequality.is_some() {
            asof_inequality = classified.asof_inequality;
        }

        if let Some(filter) = classified.left_filter {
            if single_disjunct && can_push_down_from_on(kind, strictness, Some(JoinTableSide::Left))
            {
                trace!("Left filter '{}' runs before the join", filter.column_name);
                left_pre_filter = Some(filter);
            } else {
                trace!("Left filter '{}' bound to its clause", filter.column_name);
                clause.left_filter_column = Some(filter.column_name);
            }
        }

        if let Some(filter) = classified.right_filter {
            if single_disjunct
                && can_push_down_from_on(kind, strictness, Some(JoinTableSide::Right))
            {
                trace!("Right filter '{}' runs before the join", filter.column_name);
                right_pre_filter = Some(filter);
            } else {
                trace!("Right filter '{}' bound to its clause", filter.column_name);
                clause.right_filter_column = Some(filter.column_name);
            }
        }

        if let Some(filter) = classified.residual_filter {
            if single_disjunct && can_push_down_from_on(kind, strictness, None) {
                trace!("Residual condition '{}' runs after the join", filter.column_name);
                post_filter = Some(filter);
            } else {
                trace!(
                    "Residual condition '{}' bound to the join engine",
                    filter.column_name
                );
                clause.residual_filter_column = Some(filter.column_name);
                engine_bound_residual = true;
            }
        }

        clauses.push(clause);
    }

    if strictness == JoinStrictness::Asof {
        debug_assert_eq!(clauses.len(), 1);
    }

    // Residual columns live in the post-join DAG; the engine gets its own
    // copy since the DAG also feeds the post-join expression node.
    let mixed_filter = engine_bound_residual.then(|| MixedJoinExpression {
        actions: step.expression_actions.post_join_actions.clone(),
    });

    let config = RuntimeJoinConfig {
        kind,
        strictness,
        locality: join_info.locality,
        clauses,
        asof_inequality,
        left_columns: step.expression_actions.left_pre_join_actions.output_header(),
        right_columns: step.expression_actions.right_pre_join_actions.output_header(),
        used_columns: step.output_header().names(),
        mixed_filter,
        prepared_source: step.prepared_join_source.clone(),
        max_rows_in_join: settings.max_rows_in_join,
        max_bytes_in_join: settings.max_bytes_in_join,
    };

    let right_header = config.right_columns.clone();
    let join = if kind == JoinKind::Paste {
        RuntimeJoin::Paste(PasteJoin { config, right_header })
    } else {
        RuntimeJoin::Hash(HashJoin {
            config,
            right_header,
            any_take_last_row: settings.join_any_take_last_row,
        })
    };

    debug!(
        "Configured {} for {} {} join with {} clause(s)",
        join.name(),
        strictness,
        kind,
        join.config().clauses.len()
    );

    Ok(SelectedJoin {
        join,
        left_pre_filter,
        right_pre_filter,
        post_filter,
    })
}
