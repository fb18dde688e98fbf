//! Compiles SQL statements into dataflow graphs.
//!
//! Each statement becomes a graph of logical operations (table reads, joins, filters,
//! aggregations, projections, writes) together with per-column lineage, complexity metrics
//! and optimization hints. Parsing is delegated to `sqlparser`; [`analyze`] takes SQL text
//! and [`compile_statement`] takes an already-parsed statement.

pub mod analyzer;
pub mod error;
pub mod extractors;
pub mod functions;
pub mod layout;
pub mod lineage;
pub mod parser;
mod topology;
pub mod types;

use schemars::generate::SchemaSettings;
use serde_json::json;

// Re-export main types and functions
pub use analyzer::complexity::{classify, complexity_breakdown, complexity_score};
pub use analyzer::{analyze, compile_statement};
pub use error::{suggest_dialect, CompileError, ParseError, ParseErrorKind, Position};
pub use extractors::{extract_column_infos, extract_tables_from_statement};
pub use functions::{classify_function, FunctionClass};
pub use layout::apply_layout;
pub use lineage::build_lineage;
pub use parser::{parse_sql, parse_sql_with_dialect, split_statements, StatementSlice};

pub use types::{
    // Request types
    AnalysisOptions,
    AnalyzeRequest,
    Dialect,
    ExpressionFormat,
    LayoutAlgorithm,
    LayoutDirection,
    LayoutOptions,
    // Response types
    AccessMode,
    BatchResult,
    ClauseType,
    ColumnFlow,
    ColumnInfo,
    ColumnLineage,
    ComplexityClass,
    ComplexityLevel,
    FlowEdge,
    FlowNode,
    HintCategory,
    HintKind,
    LineageStep,
    LineageTransformation,
    NodeKind,
    OperationType,
    OptimizationHint,
    QueryResult,
    QueryStats,
    Severity,
    StatementKind,
    Summary,
    TableCategory,
    TransformationType,
};

/// JSON Schema (draft-07) of the request and result types, keyed by type name.
pub fn api_schema() -> serde_json::Value {
    let generator = SchemaSettings::draft07().into_generator();
    json!({
        "AnalyzeRequest": generator.clone().into_root_schema_for::<AnalyzeRequest>(),
        "BatchResult": generator.into_root_schema_for::<BatchResult>(),
    })
}
