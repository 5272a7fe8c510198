//! # Scalar and Expression DAG Types
//!
//! This module defines the value-level building blocks of the planner:
//!
//! ## Scalar Values (`ScalarValue`)
//! Constant values that appear inside computed expressions (e.g., the `10`
//! in `x > 10`). Uses `OrderedFloat` for `f64` so that floating-point
//! constants can participate in Eq/Hash comparisons.
//!
//! ## Columns and Headers (`Column`, `Header`)
//! A `Header` is the ordered set of named, typed columns a relation (or any
//! plan step's output) produces. Headers flow through the plan: every step
//! can report its output header without looking at its children.
//!
//! ## Expression DAG (`ActionsDag`)
//! A directed acyclic graph of per-row computations: inputs (one per seed
//! column), constants, and named function applications. The planner only
//! *builds and rearranges* these DAGs -- evaluation is the job of the
//! expression engine that consumes the finished plan. Nodes are stored in
//! an arena `Vec` and referenced by index, so the DAG is freely movable
//! between plan nodes without any aliasing.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Reference to a table in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Scalar value for constant expression nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScalarValue {
    /// SQL NULL value.
    Null,
    /// Boolean true/false.
    Bool(bool),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit floating point, wrapped in OrderedFloat for Eq/Hash support.
    Float64(OrderedFloat<f64>),
    /// UTF-8 string.
    Utf8(String),
    /// Date as days since Unix epoch (1970-01-01).
    Date(i32),
}

impl ScalarValue {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Null | Self::Bool(_) => DataType::Bool,
            Self::Int64(_) => DataType::Int64,
            Self::Float64(_) => DataType::Float64,
            Self::Utf8(_) => DataType::Utf8,
            Self::Date(_) => DataType::Date,
        }
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int64(a), Self::Int64(b)) => a == b,
            (Self::Float64(a), Self::Float64(b)) => a == b,
            (Self::Utf8(a), Self::Utf8(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ScalarValue {}

impl Hash for ScalarValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(v) => v.hash(state),
            Self::Int64(v) => v.hash(state),
            Self::Float64(v) => v.hash(state),
            Self::Utf8(v) => v.hash(state),
            Self::Date(v) => v.hash(state),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::Float64(v) => write!(f, "{}", v.into_inner()),
            Self::Utf8(v) => write!(f, "'{}'", v),
            Self::Date(v) => write!(f, "date({})", v),
        }
    }
}

/// Column data types recognized by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Bool,
    Int64,
    Float64,
    Utf8,
    Date,
}

/// A named, typed column in a relation header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self { name: name.into(), data_type }
    }
}

/// The ordered set of columns produced by a relation or plan step.
///
/// Insertion is deduplicated by name: the first column with a given name
/// wins. This mirrors how headers are stacked when two join inputs carry
/// columns with the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    columns: Vec<Column>,
}

impl Header {
    pub fn new(columns: Vec<Column>) -> Self {
        let mut header = Self::default();
        for column in columns {
            header.insert(column);
        }
        header
    }

    /// Insert a column unless one with the same name is already present.
    pub fn insert(&mut self, column: Column) {
        if !self.contains(&column.name) {
            self.columns.push(column);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        write!(f, "{}", names.join(", "))
    }
}

/// Index of a node inside an `ActionsDag` arena.
pub type ActionNodeId = usize;

/// The computation a single DAG node performs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionNodeKind {
    /// A column taken verbatim from the input block.
    Input,
    /// A constant value materialized as a column.
    Constant(ScalarValue),
    /// A named function applied to other nodes' results.
    Function {
        name: String,
        arguments: Vec<ActionNodeId>,
    },
}

/// One node of an expression DAG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionNode {
    pub kind: ActionNodeKind,
    /// Name of the column this node produces.
    pub result_name: String,
    pub result_type: DataType,
}

/// A DAG of per-row computations over an input block.
///
/// The `outputs` list selects which nodes' results form the produced
/// header, in order. Freshly seeded DAGs output every input column; the
/// planner then appends computed nodes (e.g., conjoined filter conditions)
/// as it prepares the join.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionsDag {
    nodes: Vec<ActionNode>,
    outputs: Vec<ActionNodeId>,
}

impl ActionsDag {
    /// Seed a DAG with one input node per column; all inputs are outputs.
    pub fn from_columns(columns: &[Column]) -> Self {
        let nodes: Vec<ActionNode> = columns
            .iter()
            .map(|c| ActionNode {
                kind: ActionNodeKind::Input,
                result_name: c.name.clone(),
                result_type: c.data_type,
            })
            .collect();
        let outputs = (0..nodes.len()).collect();
        Self { nodes, outputs }
    }

    pub fn node(&self, id: ActionNodeId) -> &ActionNode {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[ActionNode] {
        &self.nodes
    }

    pub fn outputs(&self) -> &[ActionNodeId] {
        &self.outputs
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find an output node by its result name.
    pub fn find_output(&self, name: &str) -> Option<ActionNodeId> {
        self.outputs
            .iter()
            .copied()
            .find(|&id| self.nodes[id].result_name == name)
    }

    /// Add a constant node. Not an output until explicitly exported.
    pub fn add_constant(&mut self, value: ScalarValue) -> ActionNodeId {
        let node = ActionNode {
            result_name: value.to_string(),
            result_type: value.data_type(),
            kind: ActionNodeKind::Constant(value),
        };
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Add a function node over existing nodes. The result name is the
    /// conventional `name(arg, ...)` rendering of the call.
    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        arguments: Vec<ActionNodeId>,
        result_type: DataType,
    ) -> ActionNodeId {
        let name = name.into();
        let arg_names: Vec<&str> = arguments
            .iter()
            .map(|&id| self.nodes[id].result_name.as_str())
            .collect();
        let result_name = format!("{}({})", name, arg_names.join(", "));
        self.nodes.push(ActionNode {
            kind: ActionNodeKind::Function { name, arguments },
            result_name,
            result_type,
        });
        self.nodes.len() - 1
    }

    /// Export a node's result, replacing any existing output with the same
    /// result name.
    pub fn add_or_replace_in_outputs(&mut self, id: ActionNodeId) {
        let name = &self.nodes[id].result_name;
        if let Some(pos) = self
            .outputs
            .iter()
            .position(|&out| self.nodes[out].result_name == *name)
        {
            self.outputs[pos] = id;
        } else {
            self.outputs.push(id);
        }
    }

    /// The header this DAG produces when applied to its input block.
    pub fn output_header(&self) -> Header {
        Header::new(
            self.outputs
                .iter()
                .map(|&id| Column::new(self.nodes[id].result_name.clone(), self.nodes[id].result_type))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> Vec<Column> {
        vec![
            Column::new("id", DataType::Int64),
            Column::new("ts", DataType::Date),
        ]
    }

    #[test]
    fn test_seeded_dag_outputs_inputs() {
        let dag = ActionsDag::from_columns(&sample_header());
        assert_eq!(dag.outputs().len(), 2);
        assert_eq!(dag.output_header().names(), vec!["id", "ts"]);
        assert!(dag.find_output("id").is_some());
        assert!(dag.find_output("missing").is_none());
    }

    #[test]
    fn test_function_node_naming() {
        let mut dag = ActionsDag::from_columns(&sample_header());
        let id = dag.find_output("id").unwrap();
        let ten = dag.add_constant(ScalarValue::Int64(10));
        let gt = dag.add_function("greater", vec![id, ten], DataType::Bool);
        assert_eq!(dag.node(gt).result_name, "greater(id, 10)");

        // Computed nodes stay private until exported.
        assert!(dag.find_output("greater(id, 10)").is_none());
        dag.add_or_replace_in_outputs(gt);
        assert_eq!(dag.find_output("greater(id, 10)"), Some(gt));
        assert_eq!(dag.output_header().names(), vec!["id", "ts", "greater(id, 10)"]);
    }

    #[test]
    fn test_replace_output_same_name() {
        let mut dag = ActionsDag::from_columns(&sample_header());
        let id = dag.find_output("id").unwrap();
        dag.add_or_replace_in_outputs(id);
        assert_eq!(dag.outputs().len(), 2);
    }

    #[test]
    fn test_header_dedup_by_name() {
        let header = Header::new(vec![
            Column::new("id", DataType::Int64),
            Column::new("id", DataType::Utf8),
            Column::new("name", DataType::Utf8),
        ]);
        assert_eq!(header.len(), 2);
        assert_eq!(header.get("id").unwrap().data_type, DataType::Int64);
    }
}
