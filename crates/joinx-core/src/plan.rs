//! # Query Plan Graph and Step Types
//!
//! A query plan is an arena of nodes; each node holds a step (what the
//! node computes) and the arena indices of its children. Steps form a
//! closed set of variants -- code that needs to distinguish step kinds
//! pattern-matches on `PlanStep` instead of downcasting.
//!
//! The join-related steps come in two flavors:
//!
//! - `JoinStepLogical` is a placeholder: the serializable description of a
//!   join with no algorithm attached. It cannot be executed; plan
//!   optimization replaces it with a physical step.
//! - `JoinStep` is the physical operator: it carries the fully configured
//!   runtime join handle plus block-size/thread-count sizing.
//!
//! Because children are referenced by arena index, replacing a node's step
//! in place rewires every parent automatically -- the rewrite that turns a
//! logical join into a physical subtree relies on this.

use crate::error::JoinPlanError;
use crate::expr::{ActionsDag, Header, TableRef};
use crate::join::{JoinExpressionActions, JoinInfo};
use crate::runtime::{PreparedJoinSource, RuntimeJoin};
use serde::{Deserialize, Serialize};

/// Index of a node inside a `QueryPlan` arena.
pub type PlanNodeId = usize;

/// Scan of a catalog table. `selected_rows` is the row estimate produced
/// by range analysis, when available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableScanStep {
    pub table: TableRef,
    pub header: Header,
    pub selected_rows: Option<u64>,
}

/// Scan of an in-memory table; the row count is always known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryScanStep {
    pub header: Header,
    pub total_rows: u64,
}

/// Applies an expression DAG to its single child's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionStep {
    pub actions: ActionsDag,
}

impl ExpressionStep {
    pub fn new(actions: ActionsDag) -> Self {
        Self { actions }
    }
}

/// Applies an expression DAG and keeps only rows where `filter_column`
/// evaluates to true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStep {
    pub actions: ActionsDag,
    pub filter_column: String,
}

impl FilterStep {
    pub fn new(actions: ActionsDag, filter_column: impl Into<String>) -> Self {
        Self {
            actions,
            filter_column: filter_column.into(),
        }
    }
}

/// Logical join placeholder.
///
/// Holds the join description (`JoinInfo`), the three expression DAGs the
/// condition refers into, and the output columns the query needs. The
/// description can be rendered for EXPLAIN, but executing it is an error:
/// plan optimization must first replace it with pre-join expression steps,
/// a physical `JoinStep` and a post-join expression step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinStepLogical {
    pub left_header: Header,
    pub right_header: Header,
    pub join_info: JoinInfo,
    pub expression_actions: JoinExpressionActions,
    pub required_output_columns: Vec<String>,
    pub prepared_join_source: Option<PreparedJoinSource>,
}

impl JoinStepLogical {
    pub fn new(
        left_header: Header,
        right_header: Header,
        join_info: JoinInfo,
        expression_actions: JoinExpressionActions,
        required_output_columns: Vec<String>,
    ) -> Self {
        Self {
            left_header,
            right_header,
            join_info,
            expression_actions,
            required_output_columns,
            prepared_join_source: None,
        }
    }

    pub fn set_prepared_join_source(&mut self, source: PreparedJoinSource) {
        self.prepared_join_source = Some(source);
    }

    /// Left-then-right columns restricted to the required output list.
    pub fn output_header(&self) -> Header {
        stack_headers(
            &[&self.left_header, &self.right_header],
            &self.required_output_columns,
        )
    }

    /// Move the three expression DAGs out of the step. Called once, when
    /// the DAGs are materialized into plan nodes; the emptied step is
    /// discarded right after.
    pub fn take_expression_actions(&mut self) -> JoinExpressionActions {
        std::mem::take(&mut self.expression_actions)
    }

    /// Key/value description of the join for EXPLAIN output.
    pub fn describe(&self) -> Vec<(String, String)> {
        vec![
            ("Type".to_string(), self.join_info.kind.to_string()),
            ("Strictness".to_string(), self.join_info.strictness.to_string()),
            ("Locality".to_string(), self.join_info.locality.to_string()),
            ("Expression".to_string(), self.join_info.expression.to_string()),
        ]
    }
}

/// Physical join operator holding the configured runtime handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinStep {
    pub left_header: Header,
    pub right_header: Header,
    pub join: RuntimeJoin,
    pub max_block_size: usize,
    pub max_threads: usize,
}

impl JoinStep {
    pub fn new(
        left_header: Header,
        right_header: Header,
        join: RuntimeJoin,
        max_block_size: usize,
        max_threads: usize,
    ) -> Self {
        Self {
            left_header,
            right_header,
            join,
            max_block_size,
            max_threads,
        }
    }

    pub fn output_header(&self) -> Header {
        stack_headers(
            &[&self.left_header, &self.right_header],
            &self.join.config().used_columns,
        )
    }
}

/// Closed set of plan step kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanStep {
    TableScan(TableScanStep),
    MemoryScan(MemoryScanStep),
    Expression(ExpressionStep),
    Filter(FilterStep),
    JoinLogical(Box<JoinStepLogical>),
    Join(Box<JoinStep>),
}

impl PlanStep {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TableScan(_) => "TableScan",
            Self::MemoryScan(_) => "MemoryScan",
            Self::Expression(_) => "Expression",
            Self::Filter(_) => "Filter",
            Self::JoinLogical(_) => "JoinLogical",
            Self::Join(_) => "Join",
        }
    }

    /// The header this step produces. Self-contained: join steps remember
    /// their input headers, expression steps derive theirs from the DAG.
    pub fn output_header(&self) -> Header {
        match self {
            Self::TableScan(step) => step.header.clone(),
            Self::MemoryScan(step) => step.header.clone(),
            Self::Expression(step) => step.actions.output_header(),
            Self::Filter(step) => step.actions.output_header(),
            Self::JoinLogical(step) => step.output_header(),
            Self::Join(step) => step.output_header(),
        }
    }
}

/// A plan node: a step plus the arena indices of its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanNode {
    pub step: PlanStep,
    pub children: Vec<PlanNodeId>,
}

/// Arena of plan nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub nodes: Vec<PlanNode>,
}

impl QueryPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, step: PlanStep, children: Vec<PlanNodeId>) -> PlanNodeId {
        self.nodes.push(PlanNode { step, children });
        self.nodes.len() - 1
    }

    pub fn node(&self, id: PlanNodeId) -> &PlanNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: PlanNodeId) -> &mut PlanNode {
        &mut self.nodes[id]
    }

    /// Indented tree rendering of the plan, for EXPLAIN output. Logical
    /// join placeholders include their full description.
    pub fn explain(&self, root: PlanNodeId) -> String {
        let mut out = String::new();
        self.explain_node(root, 0, &mut out);
        out
    }

    fn explain_node(&self, id: PlanNodeId, depth: usize, out: &mut String) {
        let node = &self.nodes[id];
        let indent = "  ".repeat(depth);
        match &node.step {
            PlanStep::TableScan(step) => {
                out.push_str(&format!("{}TableScan {}\n", indent, step.table));
            }
            PlanStep::MemoryScan(_) => {
                out.push_str(&format!("{}MemoryScan\n", indent));
            }
            PlanStep::Expression(_) => {
                out.push_str(&format!("{}Expression\n", indent));
            }
            PlanStep::Filter(step) => {
                out.push_str(&format!("{}Filter ({})\n", indent, step.filter_column));
            }
            PlanStep::JoinLogical(step) => {
                out.push_str(&format!("{}JoinLogical\n", indent));
                for (key, value) in step.describe() {
                    out.push_str(&format!("{}  {}: {}\n", indent, key, value));
                }
            }
            PlanStep::Join(step) => {
                out.push_str(&format!("{}Join ({})\n", indent, step.join.name()));
            }
        }
        for &child in &node.children {
            self.explain_node(child, depth + 1, out);
        }
    }

    /// Reject plans that still contain logical join placeholders. The
    /// execution engine calls this before building pipelines.
    pub fn ensure_executable(&self, root: PlanNodeId) -> Result<(), JoinPlanError> {
        let node = &self.nodes[root];
        if matches!(node.step, PlanStep::JoinLogical(_)) {
            return Err(JoinPlanError::Internal(
                "cannot execute a logical join step; it must be converted to a physical step first"
                    .to_string(),
            ));
        }
        for &child in &node.children {
            self.ensure_executable(child)?;
        }
        Ok(())
    }
}

/// Stack input headers left to right, keeping the columns named in
/// `required` (deduplicated by name). With an empty required list, the
/// first encountered column alone is kept as a degenerate default.
pub fn stack_headers(headers: &[&Header], required: &[String]) -> Header {
    let mut result = Header::default();
    for header in headers {
        for column in header.columns() {
            if required.iter().any(|name| *name == column.name) {
                result.insert(column.clone());
            } else if required.is_empty() {
                result.insert(column.clone());
                return result;
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Column, DataType};
    use crate::join::{
        JoinExpression, JoinExpressionActions, JoinInfo, JoinKind, JoinLocality, JoinStrictness,
    };

    fn header(names: &[&str]) -> Header {
        Header::new(names.iter().map(|n| Column::new(*n, DataType::Int64)).collect())
    }

    fn logical_join_node(required: &[&str]) -> JoinStepLogical {
        let left = header(&["id", "x"]);
        let right = header(&["id", "y"]);
        let actions = JoinExpressionActions::from_headers(&left, &right);
        JoinStepLogical::new(
            left,
            right,
            JoinInfo {
                expression: JoinExpression::default(),
                kind: JoinKind::Inner,
                strictness: JoinStrictness::All,
                locality: JoinLocality::Local,
            },
            actions,
            required.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_output_header_left_then_right_restricted() {
        let step = logical_join_node(&["y", "id", "x"]);
        // Order follows the stacked inputs, not the required list; "id"
        // appears once even though both sides carry it.
        assert_eq!(step.output_header().names(), vec!["id", "x", "y"]);
    }

    #[test]
    fn test_output_header_empty_required_keeps_first_column() {
        let step = logical_join_node(&[]);
        assert_eq!(step.output_header().names(), vec!["id"]);
    }

    #[test]
    fn test_output_header_subset() {
        let step = logical_join_node(&["x", "y"]);
        assert_eq!(step.output_header().names(), vec!["x", "y"]);
    }

    #[test]
    fn test_ensure_executable_rejects_logical_join() {
        let mut plan = QueryPlan::new();
        let left = plan.add_node(
            PlanStep::MemoryScan(MemoryScanStep { header: header(&["id", "x"]), total_rows: 1 }),
            vec![],
        );
        let right = plan.add_node(
            PlanStep::MemoryScan(MemoryScanStep { header: header(&["id", "y"]), total_rows: 1 }),
            vec![],
        );
        let join = plan.add_node(
            PlanStep::JoinLogical(Box::new(logical_join_node(&["id"]))),
            vec![left, right],
        );

        let err = plan.ensure_executable(join).unwrap_err();
        assert!(matches!(err, JoinPlanError::Internal(_)));
        assert!(plan.ensure_executable(left).is_ok());
    }

    #[test]
    fn test_explain_renders_join_description() {
        let mut plan = QueryPlan::new();
        let left = plan.add_node(
            PlanStep::MemoryScan(MemoryScanStep { header: header(&["id", "x"]), total_rows: 1 }),
            vec![],
        );
        let right = plan.add_node(
            PlanStep::MemoryScan(MemoryScanStep { header: header(&["id", "y"]), total_rows: 1 }),
            vec![],
        );
        let join = plan.add_node(
            PlanStep::JoinLogical(Box::new(logical_join_node(&["id"]))),
            vec![left, right],
        );

        let rendered = plan.explain(join);
        assert!(rendered.contains("JoinLogical"));
        assert!(rendered.contains("Type: INNER"));
        assert!(rendered.contains("Strictness: ALL"));
        assert!(rendered.contains("Locality: LOCAL"));
        assert_eq!(rendered.matches("MemoryScan").count(), 2);
    }
}
