//! Types for the dataflow compilation API.
//!
//! This module defines the request and response types. The API accepts SQL text (or an
//! already-parsed statement) and returns, per statement, a flow graph of logical
//! operations, column lineage paths, complexity metrics and optimization hints.

mod common;
mod request;
mod response;

pub use common::{
    Attribution, HintCategory, HintKind, LineRange, OptimizationHint, Severity, Summary,
};
pub use request::{
    AnalysisOptions, AnalyzeRequest, Dialect, ExpressionFormat, LayoutAlgorithm,
    LayoutDirection, LayoutOptions, DEFAULT_MAX_DEPTH,
};
pub use response::{
    AccessMode, AggregateDetails, AggregateFunctionDetail, BatchResult, CaseBranch, CaseDetail,
    CaseDetails, ClauseType, ColumnFlow, ColumnInfo, ColumnLineage, ColumnReference,
    ComplexityClass, ComplexityLevel, FlowEdge, FlowNode, LineageSource, LineageStep,
    LineageTransformation, NodeKind, NodeWarning, OperationType, QueryResult, QueryStats,
    StatementKind, TableCategory, TransformationType, WarningKind, WindowDetails,
    WindowFunctionDetail,
};
