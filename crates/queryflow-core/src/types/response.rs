//! Response types for the dataflow compilation API.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::common::{Attribution, LineRange, OptimizationHint, Severity, Summary};

/// The result of compiling a batch of SQL statements.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    /// One entry per statement, in source order
    pub queries: Vec<QueryResult>,

    /// Summary statistics
    pub summary: Summary,
}

impl BatchResult {
    pub fn has_errors(&self) -> bool {
        self.queries.iter().any(|q| q.error.is_some())
    }
}

/// Kind of SQL statement a result describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Merge,
    CreateView,
    CreateTable,
    CreateTableAs,
    #[default]
    Other,
}

/// The immutable compilation result for one statement.
///
/// When `error` is set the graph, stats and hints are empty or default.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Zero-based index of the statement in the input SQL
    pub statement_index: usize,

    /// Kind of statement
    pub statement_type: StatementKind,

    /// Optional source name (file path or script identifier)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,

    /// SQL text of the statement
    pub sql: String,

    /// Top-level graph nodes
    pub nodes: Vec<FlowNode>,

    /// Top-level graph edges
    pub edges: Vec<FlowEdge>,

    /// Counters and complexity metrics
    pub stats: QueryStats,

    /// Optimization hints in emission order
    pub hints: Vec<OptimizationHint>,

    /// Error message when the statement could not be compiled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Output column to source column mapping
    #[serde(default)]
    pub column_lineage: Vec<ColumnLineage>,

    /// Step-by-step lineage paths, one per (output column, source column) pair
    #[serde(default)]
    pub column_flows: Vec<ColumnFlow>,

    /// Lowercased physical table name to reference count
    #[serde(default)]
    pub table_usage: BTreeMap<String, u32>,

    /// True when any projection uses an unqualified or qualified wildcard
    #[serde(default)]
    pub has_select_star: bool,

    /// True when no LIMIT/OFFSET/FETCH/TOP clause appears anywhere in the statement
    #[serde(default)]
    pub has_no_limit: bool,
}

impl QueryResult {
    /// Builds a result for a statement that failed to compile.
    pub fn failed(statement_index: usize, sql: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            statement_index,
            sql: sql.into(),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Finds a node by id, searching container children depth-first.
    pub fn find_node(&self, id: &str) -> Option<&FlowNode> {
        find_in(&self.nodes, id)
    }

    /// Top-level edges leaving `id`.
    pub fn edges_from<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a FlowEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == id)
    }

    /// Top-level edges entering `id`.
    pub fn edges_to<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a FlowEdge> + 'a {
        self.edges.iter().filter(move |e| e.target == id)
    }

    /// Distinct physical tables read or written, lowercased and sorted.
    pub fn source_tables(&self) -> impl Iterator<Item = &str> {
        self.table_usage.keys().map(String::as_str)
    }
}

fn find_in<'a>(nodes: &'a [FlowNode], id: &str) -> Option<&'a FlowNode> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = find_in(&node.children, id) {
            return Some(found);
        }
    }
    None
}

/// Logical operation represented by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Table,
    Filter,
    Join,
    Aggregate,
    Sort,
    Limit,
    Select,
    Result,
    Cte,
    SetOp,
    Subquery,
    Window,
    Case,
}

impl NodeKind {
    /// Short id prefix used by the id generator.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Filter => "filter",
            Self::Join => "join",
            Self::Aggregate => "aggregate",
            Self::Sort => "sort",
            Self::Limit => "limit",
            Self::Select => "select",
            Self::Result => "result",
            Self::Cte => "cte",
            Self::SetOp => "setop",
            Self::Subquery => "subquery",
            Self::Window => "window",
            Self::Case => "case",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    Read,
    Write,
    Derived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum OperationType {
    Select,
    Insert,
    Update,
    Delete,
    Merge,
    CreateTable,
    CreateTableAs,
    CreateView,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum TableCategory {
    /// A stored table or view
    Physical,
    /// A relation produced inline, such as a table-valued function or VALUES list
    Derived,
    /// A reference to a CTE defined in an enclosing scope or to itself
    CteReference,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl From<Severity> for ComplexityLevel {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Low => Self::Low,
            Severity::Medium => Self::Medium,
            Severity::High => Self::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum WarningKind {
    FanOut,
    Complex,
    CrossJoin,
    MissingWhere,
    UnboundedSort,
}

/// A node-scoped finding, mirrored from the node's hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NodeWarning {
    #[serde(rename = "type")]
    pub kind: WarningKind,
    pub severity: Severity,
    pub message: String,
}

/// A logical operation instance in the flow graph.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlowNode {
    /// Unique within one parse; issued in strictly increasing order
    pub id: String,

    #[serde(rename = "type")]
    pub kind: NodeKind,

    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,

    /// Alias the relation was referenced by, when different from the label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Nested sub-graph nodes of a container
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FlowNode>,

    /// Nested sub-graph edges of a container
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_edges: Vec<FlowEdge>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_mode: Option<AccessMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<OperationType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_category: Option<TableCategory>,

    /// Best-effort source lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_range: Option<LineRange>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<NodeWarning>,

    #[serde(default)]
    pub complexity_level: ComplexityLevel,

    /// Projected columns (Select and Window nodes)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnInfo>,

    /// Readable predicates (Filter and Join nodes, DML targets)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,

    /// Nesting depth of a container (1 for a top-level CTE)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nesting_depth: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_details: Option<WindowDetails>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate_details: Option<AggregateDetails>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_details: Option<CaseDetails>,
}

impl FlowNode {
    pub fn new(id: impl Into<String>, kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            description: None,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            alias: None,
            children: Vec::new(),
            child_edges: Vec::new(),
            access_mode: None,
            operation_type: None,
            table_category: None,
            line_range: None,
            warnings: Vec::new(),
            complexity_level: ComplexityLevel::Low,
            columns: Vec::new(),
            conditions: Vec::new(),
            nesting_depth: None,
            window_details: None,
            aggregate_details: None,
            case_details: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias;
        self
    }

    pub fn with_access(mut self, mode: AccessMode) -> Self {
        self.access_mode = Some(mode);
        self
    }

    pub fn with_operation(mut self, operation: OperationType) -> Self {
        self.operation_type = Some(operation);
        self
    }

    pub fn with_category(mut self, category: TableCategory) -> Self {
        self.table_category = Some(category);
        self
    }

    /// Whether this node is a relation that rows originate from.
    pub fn is_relation(&self) -> bool {
        self.kind == NodeKind::Table
    }

    /// Whether `name` refers to this node by label or alias (case-insensitive).
    pub fn answers_to(&self, name: &str) -> bool {
        let bare = |s: &str| s.rsplit('.').next().unwrap_or(s).to_ascii_lowercase();
        let wanted = bare(name);
        self.alias
            .as_deref()
            .is_some_and(|alias| alias.eq_ignore_ascii_case(name))
            || self.label.eq_ignore_ascii_case(name)
            || bare(&self.label) == wanted
    }
}

/// Part of the statement that produced an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ClauseType {
    From,
    Join,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Limit,
    Select,
    Cte,
    SetOp,
    Subquery,
    Insert,
    Update,
    Delete,
    Merge,
    Create,
    Result,
}

/// A directed data-flow edge.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FlowEdge {
    pub id: String,
    pub source: String,
    pub target: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Verbatim text of the clause that produced the edge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_clause: Option<String>,

    pub clause_type: ClauseType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_range: Option<LineRange>,
}

/// How a projected column relates to its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransformationType {
    #[default]
    Passthrough,
    Renamed,
    Aggregated,
    Calculated,
}

/// A column referenced inside an expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnReference {
    /// Qualifier as written (alias or table name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub column: String,
}

/// Per-projected-column descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,
    pub expression: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_column: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_table: Option<String>,

    #[serde(default)]
    pub is_aggregate: bool,

    #[serde(default)]
    pub is_window_func: bool,

    pub transformation_type: TransformationType,

    /// Every column the expression reads, in first-seen order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<ColumnReference>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WindowDetails {
    pub functions: Vec<WindowFunctionDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WindowFunctionDetail {
    pub name: Attribution<String>,
    pub expression: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partition_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AggregateDetails {
    pub functions: Vec<AggregateFunctionDetail>,
    #[serde(default)]
    pub group_by: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateFunctionDetail {
    /// Uppercased function name
    pub name: String,
    pub expression: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub distinct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_column: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CaseDetails {
    pub cases: Vec<CaseDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CaseDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operand: Option<String>,
    pub branches: Vec<CaseBranch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub else_result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CaseBranch {
    pub condition: String,
    pub result: String,
}

/// Output column to source column mapping.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnLineage {
    pub output_column: String,
    pub sources: Vec<LineageSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LineageSource {
    pub node_id: String,
    pub column_name: String,
}

/// The ordered path one output column takes from a source column.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnFlow {
    pub id: String,
    pub output_column: String,
    pub lineage_path: Vec<LineageStep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LineageTransformation {
    Source,
    Passthrough,
    Renamed,
    Aggregated,
    Calculated,
    Joined,
}

impl From<TransformationType> for LineageTransformation {
    fn from(value: TransformationType) -> Self {
        match value {
            TransformationType::Passthrough => Self::Passthrough,
            TransformationType::Renamed => Self::Renamed,
            TransformationType::Aggregated => Self::Aggregated,
            TransformationType::Calculated => Self::Calculated,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LineageStep {
    pub node_id: String,
    pub node_name: String,
    pub column_name: String,
    pub transformation: LineageTransformation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

/// Coarse complexity classification derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub enum ComplexityClass {
    #[default]
    Simple,
    Moderate,
    Complex,
    VeryComplex,
}

/// Statement counters and derived complexity metrics.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryStats {
    pub tables: u32,
    pub joins: u32,
    pub subqueries: u32,
    pub ctes: u32,
    pub aggregations: u32,
    pub window_functions: u32,
    pub unions: u32,
    pub conditions: u32,

    pub complexity: ComplexityClass,
    pub complexity_score: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cte_depth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fan_out: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_path_length: Option<u32>,
    /// Weighted contribution of each counter to the score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity_breakdown: Option<BTreeMap<String, f64>>,
}
