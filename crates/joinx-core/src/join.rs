//! # Join Specification Types
//!
//! The logical description of a join's ON/USING condition, independent of
//! any algorithm:
//!
//! - `JoinInfo` pairs the condition tree with the join topology
//!   (kind/strictness/locality).
//! - `JoinExpression` is a disjunction of `JoinCondition`s: alternative
//!   AND-clauses connected by OR. Rows may be joined if *any* clause holds.
//! - Each `JoinCondition` splits its conjuncts into key predicates
//!   (comparisons between one left-side and one right-side column),
//!   per-side pre-filters, and residual conditions that need columns from
//!   both sides.
//! - `JoinExpressionActions` owns the three expression DAGs the condition
//!   refers into: left pre-join, right pre-join, and post-join.
//!
//! Values of these types are built once by the analyzer, carried by the
//! logical join plan step, and consumed when the join algorithm is chosen.
//! They are never mutated in place after construction, only replaced.

use crate::expr::{ActionNodeId, ActionsDag, Column, Header};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operator of a single join predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredicateOperator {
    /// Equality (`=`). NULLs never compare equal.
    Equal,
    /// Null-safe equality (`<=>`). NULL matches NULL.
    NullSafeEqual,
    Less,
    LessOrEquals,
    Greater,
    GreaterOrEquals,
}

impl PredicateOperator {
    /// Map an analyzer function name to a predicate operator.
    pub fn from_function_name(name: &str) -> Option<Self> {
        match name {
            "equals" => Some(Self::Equal),
            "isNotDistinctFrom" => Some(Self::NullSafeEqual),
            "less" => Some(Self::Less),
            "greater" => Some(Self::Greater),
            "lessOrEquals" => Some(Self::LessOrEquals),
            "greaterOrEquals" => Some(Self::GreaterOrEquals),
            _ => None,
        }
    }

    /// The operator with operand order swapped: `a < b` is `b > a`.
    /// Equality operators are their own reverse.
    pub fn reverse(self) -> Self {
        match self {
            Self::Equal => Self::Equal,
            Self::NullSafeEqual => Self::NullSafeEqual,
            Self::Less => Self::Greater,
            Self::Greater => Self::Less,
            Self::LessOrEquals => Self::GreaterOrEquals,
            Self::GreaterOrEquals => Self::LessOrEquals,
        }
    }

    /// The ASOF match direction this operator encodes, if it is one of the
    /// four inequalities.
    pub fn asof_inequality(self) -> Option<AsofInequality> {
        match self {
            Self::Less => Some(AsofInequality::Less),
            Self::LessOrEquals => Some(AsofInequality::LessOrEquals),
            Self::Greater => Some(AsofInequality::Greater),
            Self::GreaterOrEquals => Some(AsofInequality::GreaterOrEquals),
            Self::Equal | Self::NullSafeEqual => None,
        }
    }

    pub fn is_equality(self) -> bool {
        matches!(self, Self::Equal | Self::NullSafeEqual)
    }
}

impl fmt::Display for PredicateOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Equal => "=",
            Self::NullSafeEqual => "<=>",
            Self::Less => "<",
            Self::LessOrEquals => "<=",
            Self::Greater => ">",
            Self::GreaterOrEquals => ">=",
        };
        write!(f, "{}", s)
    }
}

/// Direction of the "nearest match" lookup in an ASOF join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AsofInequality {
    Less,
    LessOrEquals,
    Greater,
    GreaterOrEquals,
}

impl fmt::Display for AsofInequality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Less => "<",
            Self::LessOrEquals => "<=",
            Self::Greater => ">",
            Self::GreaterOrEquals => ">=",
        };
        write!(f, "{}", s)
    }
}

/// Join topology: which side's unmatched rows survive, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    /// All rows from the left, null-padded right on no match.
    Left,
    /// All rows from the right, null-padded left on no match.
    Right,
    /// All rows from both sides.
    Full,
    /// Cartesian product.
    Cross,
    /// Comma-separated tables in FROM; cross product with filters applied
    /// from the WHERE clause.
    Comma,
    /// Positional pairing of the two inputs, row by row.
    Paste,
}

impl JoinKind {
    /// Whether this kind matches rows through key predicates. Cross, Comma
    /// and Paste pair rows structurally and carry no keys.
    pub fn requires_keys(self) -> bool {
        !matches!(self, Self::Cross | Self::Comma | Self::Paste)
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Full => "FULL",
            Self::Cross => "CROSS",
            Self::Comma => "COMMA",
            Self::Paste => "PASTE",
        };
        write!(f, "{}", s)
    }
}

/// One of the two inputs of a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinTableSide {
    Left,
    Right,
}

/// Row-multiplicity policy of the join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinStrictness {
    /// Every matching pair is produced.
    All,
    /// At most one match per left row.
    Any,
    /// At most one match per right row.
    RightAny,
    /// Left rows with at least one match, right columns not produced.
    Semi,
    /// Left rows with no match.
    Anti,
    /// Nearest match along one inequality key.
    Asof,
}

impl fmt::Display for JoinStrictness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::All => "ALL",
            Self::Any => "ANY",
            Self::RightAny => "RIGHT_ANY",
            Self::Semi => "SEMI",
            Self::Anti => "ANTI",
            Self::Asof => "ASOF",
        };
        write!(f, "{}", s)
    }
}

/// Where the join runs relative to the initiating node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinLocality {
    Local,
    /// The right side is collected and shipped to every participant.
    Global,
}

impl fmt::Display for JoinLocality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Local => "LOCAL",
            Self::Global => "GLOBAL",
        };
        write!(f, "{}", s)
    }
}

/// Handle to a node inside one specific expression DAG.
///
/// Which DAG the node lives in is determined by where the reference is
/// used: predicate sides point into the left/right pre-join DAGs, residual
/// conditions into the post-join DAG. The produced column name is cached
/// so consumers don't need the DAG to identify the column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinActionRef {
    pub node: ActionNodeId,
    pub column_name: String,
}

impl JoinActionRef {
    pub fn new(dag: &ActionsDag, node: ActionNodeId) -> Self {
        Self {
            node,
            column_name: dag.node(node).result_name.clone(),
        }
    }
}

/// A single comparison between a left-side and a right-side computed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinPredicate {
    pub left: JoinActionRef,
    pub right: JoinActionRef,
    pub op: PredicateOperator,
}

impl fmt::Display for JoinPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left.column_name, self.op, self.right.column_name)
    }
}

/// One AND-clause of the join condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinCondition {
    /// Key predicates that must hold for rows to be joined.
    pub predicates: Vec<JoinPredicate>,
    /// Pre-join filters evaluated on the left table alone.
    pub left_filter_conditions: Vec<JoinActionRef>,
    /// Pre-join filters evaluated on the right table alone.
    pub right_filter_conditions: Vec<JoinActionRef>,
    /// Conditions over columns from both sides that are not key
    /// comparisons; evaluated against matched pairs after the join.
    pub residual_conditions: Vec<JoinActionRef>,
}

impl fmt::Display for JoinCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn quoted(refs: &[JoinActionRef]) -> String {
            refs.iter()
                .map(|r| format!("({})", r.column_name))
                .collect::<Vec<_>>()
                .join(" AND ")
        }

        let keys = self
            .predicates
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(" AND ");
        let mut parts = vec![format!("Keys: ({})", keys)];
        if !self.left_filter_conditions.is_empty() {
            parts.push(format!("Left: ({})", quoted(&self.left_filter_conditions)));
        }
        if !self.right_filter_conditions.is_empty() {
            parts.push(format!("Right: ({})", quoted(&self.right_filter_conditions)));
        }
        if !self.residual_conditions.is_empty() {
            parts.push(format!("Residual: ({})", quoted(&self.residual_conditions)));
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Disjunction of alternative join conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinExpression {
    /// Alternative conditions connected by OR. Rows from the two tables
    /// can be joined if any of the conditions holds.
    pub disjunctive_conditions: Vec<JoinCondition>,
    /// Whether the expression came from a USING clause. Output column
    /// deduplication downstream depends on this; the planner itself only
    /// carries it.
    pub is_using: bool,
}

impl fmt::Display for JoinExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let conditions = self
            .disjunctive_conditions
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(" | ");
        write!(f, "{} {}", if self.is_using { "USING" } else { "ON" }, conditions)
    }
}

/// Complete logical description of one join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinInfo {
    /// The ON/USING condition.
    pub expression: JoinExpression,
    pub kind: JoinKind,
    pub strictness: JoinStrictness,
    pub locality: JoinLocality,
}

/// The three expression DAGs a join condition refers into.
///
/// Each DAG is independently owned: the left and right pre-join DAGs are
/// seeded from their input's columns and run before the join on their own
/// side; the post-join DAG is seeded from the concatenation of both
/// outputs and runs on joined rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinExpressionActions {
    pub left_pre_join_actions: ActionsDag,
    pub right_pre_join_actions: ActionsDag,
    pub post_join_actions: ActionsDag,
}

impl JoinExpressionActions {
    pub fn new(left_columns: &[Column], right_columns: &[Column]) -> Self {
        let mut concat: Vec<Column> = Vec::with_capacity(left_columns.len() + right_columns.len());
        concat.extend_from_slice(left_columns);
        concat.extend_from_slice(right_columns);
        Self {
            left_pre_join_actions: ActionsDag::from_columns(left_columns),
            right_pre_join_actions: ActionsDag::from_columns(right_columns),
            post_join_actions: ActionsDag::from_columns(&concat),
        }
    }

    pub fn from_headers(left: &Header, right: &Header) -> Self {
        Self::new(left.columns(), right.columns())
    }
}
