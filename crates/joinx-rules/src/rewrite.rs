//! # Logical-to-Physical Join Rewrite
//!
//! The one-shot graph rewrite that replaces a logical join placeholder
//! with its executable subtree:
//!
//! ```text
//! Before:                      After:
//!   JoinLogical                  Expression (post-join actions)
//!     left subplan                 Join (runtime handle)
//!     right subplan                  Expression (left pre-join actions)
//!                                      left subplan
//!                                    Expression (right pre-join actions)
//!                                      right subplan
//! ```
//!
//! When algorithm selection surfaced a pushed-down filter, the matching
//! Expression node above is a Filter node instead, filtering on the
//! conjoined condition column the selection exported.
//!
//! The rewrite touches only the node itself and its two direct children.
//! The original node keeps its arena index -- it *becomes* the post-join
//! expression -- so parent edges stay valid without being visited. Running
//! the rewrite a second time finds an Expression step in place of the
//! logical join and does nothing.

use crate::select::{choose_join_algorithm, SelectedJoin};
use joinx_core::error::JoinPlanError;
use joinx_core::expr::ActionsDag;
use joinx_core::join::{JoinActionRef, JoinExpressionActions};
use joinx_core::plan::{
    ExpressionStep, FilterStep, JoinStep, PlanNodeId, PlanStep, QueryPlan,
};
use joinx_core::settings::JoinSettings;
use tracing::debug;

/// What the rewrite did to the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteOutcome {
    /// The node is not a logical join with two inputs; nothing happened.
    NotApplicable,
    /// Selection ran for feasibility only; the logical node was kept.
    LogicalOnly,
    /// The node was replaced by the physical join subtree.
    Rewritten,
}

/// Estimate how many rows a subplan reads, by classifying its nodes.
///
/// Scans report their own counts; expression and filter nodes are
/// transparent. Anything else -- including joins -- is unknown.
pub fn estimate_read_rows(plan: &QueryPlan, node_id: PlanNodeId) -> Option<u64> {
    let node = plan.node(node_id);
    match &node.step {
        PlanStep::TableScan(step) => step.selected_rows,
        PlanStep::MemoryScan(step) => Some(step.total_rows),
        PlanStep::Expression(_) | PlanStep::Filter(_) if node.children.len() == 1 => {
            estimate_read_rows(plan, node.children[0])
        }
        _ => None,
    }
}

fn expression_or_filter_step(actions: ActionsDag, filter: Option<&JoinActionRef>) -> PlanStep {
    match filter {
        Some(filter) => PlanStep::Filter(FilterStep::new(actions, filter.column_name.clone())),
        None => PlanStep::Expression(ExpressionStep::new(actions)),
    }
}

/// Replace a logical join node with pre-join expression nodes, a physical
/// join node and a post-join expression node.
///
/// With `keep_logical` the rewrite stops after algorithm selection: the
/// plan keeps its logical node and the caller only learns whether a
/// runtime join could be configured (EXPLAIN and cost estimation mode).
///
/// On error the plan is unchanged: selection validates the join before it
/// modifies anything.
pub fn optimize_join(
    plan: &mut QueryPlan,
    node_id: PlanNodeId,
    settings: &JoinSettings,
    keep_logical: bool,
) -> Result<RewriteOutcome, JoinPlanError> {
    let children = plan.node(node_id).children.clone();
    if children.len() != 2 {
        return Ok(RewriteOutcome::NotApplicable);
    }

    let (selected, actions) = match &mut plan.node_mut(node_id).step {
        PlanStep::JoinLogical(step) => {
            let selected = choose_join_algorithm(step, settings)?;
            if keep_logical {
                return Ok(RewriteOutcome::LogicalOnly);
            }
            let actions = step.take_expression_actions();
            (selected, actions)
        }
        _ => return Ok(RewriteOutcome::NotApplicable),
    };

    let left_rows = estimate_read_rows(plan, children[0]);
    let right_rows = estimate_read_rows(plan, children[1]);
    debug!(
        "Rewriting logical join: estimated input rows left={:?} right={:?}",
        left_rows, right_rows
    );

    let SelectedJoin {
        join,
        left_pre_filter,
        right_pre_filter,
        post_filter,
    } = selected;
    let JoinExpressionActions {
        left_pre_join_actions,
        right_pre_join_actions,
        post_join_actions,
    } = actions;

    let left_top = plan.add_node(
        expression_or_filter_step(left_pre_join_actions, left_pre_filter.as_ref()),
        vec![children[0]],
    );
    let right_top = plan.add_node(
        expression_or_filter_step(right_pre_join_actions, right_pre_filter.as_ref()),
        vec![children[1]],
    );

    let left_header = plan.node(left_top).step.output_header();
    let right_header = plan.node(right_top).step.output_header();
    let join_node = plan.add_node(
        PlanStep::Join(Box::new(JoinStep::new(
            left_header,
            right_header,
            join,
            settings.max_block_size,
            settings.max_threads,
        ))),
        vec![left_top, right_top],
    );

    // The node keeps its arena index: parents now see the post-join
    // expression where the logical join used to be.
    let node = plan.node_mut(node_id);
    node.step = expression_or_filter_step(post_join_actions, post_filter.as_ref());
    node.children = vec![join_node];

    Ok(RewriteOutcome::Rewritten)
}
