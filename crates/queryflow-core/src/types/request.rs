//! Request types for the dataflow compilation API.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default recursion ceiling for statement processing and lineage walking.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// A request to compile SQL text into dataflow graphs.
///
/// The SQL may contain several statements; each one is compiled independently and
/// reported as its own entry in the batch result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// The SQL code to analyze (UTF-8 string, multi-statement supported)
    pub sql: String,

    /// SQL dialect
    #[serde(default)]
    pub dialect: Dialect,

    /// Optional source name (file path or script identifier)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,

    /// Optional analysis options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<AnalysisOptions>,
}

impl AnalyzeRequest {
    pub fn new(sql: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            sql: sql.into(),
            dialect,
            source_name: None,
            options: None,
        }
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }
}

/// SQL dialect for parsing and function classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Generic,
    Mysql,
    Postgres,
    Mssql,
    Snowflake,
    Bigquery,
    Redshift,
    Hive,
    Athena,
    Trino,
    Mariadb,
    Sqlite,
}

impl Dialect {
    /// Every dialect, in declaration order.
    pub const ALL: [Dialect; 12] = [
        Self::Generic,
        Self::Mysql,
        Self::Postgres,
        Self::Mssql,
        Self::Snowflake,
        Self::Bigquery,
        Self::Redshift,
        Self::Hive,
        Self::Athena,
        Self::Trino,
        Self::Mariadb,
        Self::Sqlite,
    ];

    pub fn to_sqlparser_dialect(&self) -> Box<dyn sqlparser::dialect::Dialect> {
        use sqlparser::dialect::{
            BigQueryDialect, GenericDialect, HiveDialect, MsSqlDialect, MySqlDialect,
            PostgreSqlDialect, RedshiftSqlDialect, SQLiteDialect, SnowflakeDialect,
        };
        match self {
            // Presto-family engines have no dedicated grammar; the generic one accepts their syntax.
            Self::Generic | Self::Athena | Self::Trino => Box::new(GenericDialect {}),
            Self::Mysql | Self::Mariadb => Box::new(MySqlDialect {}),
            Self::Postgres => Box::new(PostgreSqlDialect {}),
            Self::Mssql => Box::new(MsSqlDialect {}),
            Self::Snowflake => Box::new(SnowflakeDialect {}),
            Self::Bigquery => Box::new(BigQueryDialect {}),
            Self::Redshift => Box::new(RedshiftSqlDialect {}),
            Self::Hive => Box::new(HiveDialect {}),
            Self::Sqlite => Box::new(SQLiteDialect {}),
        }
    }

    /// Human-facing dialect name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Generic => "Generic SQL",
            Self::Mysql => "MySQL",
            Self::Postgres => "PostgreSQL",
            Self::Mssql => "TransactSQL",
            Self::Snowflake => "Snowflake",
            Self::Bigquery => "BigQuery",
            Self::Redshift => "Redshift",
            Self::Hive => "Hive",
            Self::Athena => "Athena",
            Self::Trino => "Trino",
            Self::Mariadb => "MariaDB",
            Self::Sqlite => "SQLite",
        }
    }
}

/// Rendering used for [`crate::ColumnInfo::expression`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionFormat {
    /// Canonical SQL text of the expression
    #[default]
    Sql,
    /// Serialized AST fragment
    Json,
}

/// Layout algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum LayoutAlgorithm {
    #[default]
    Hierarchical,
    Force,
    Radial,
}

/// Rank direction for the hierarchical layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub enum LayoutDirection {
    #[default]
    TopToBottom,
    LeftToRight,
}

/// Geometry options consumed by the layout module.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutOptions {
    pub algorithm: LayoutAlgorithm,
    pub direction: LayoutDirection,
    /// Minimum gap between nodes of the same rank
    pub node_spacing: f64,
    /// Minimum gap between consecutive ranks
    pub rank_spacing: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            algorithm: LayoutAlgorithm::Hierarchical,
            direction: LayoutDirection::TopToBottom,
            node_spacing: 40.0,
            rank_spacing: 80.0,
        }
    }
}

/// Options controlling the analysis behavior.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOptions {
    /// Recursion ceiling for nested queries (default 64)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,

    /// Rendering of projected column expressions (default sql)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression_format: Option<ExpressionFormat>,

    /// Compute column lineage and flows (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_column_lineage: Option<bool>,

    /// Assign node geometry (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_layout: Option<bool>,

    /// Layout configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutOptions>,
}

impl AnalysisOptions {
    pub fn max_depth(&self) -> usize {
        self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH)
    }

    pub fn expression_format(&self) -> ExpressionFormat {
        self.expression_format.unwrap_or_default()
    }

    pub fn column_lineage_enabled(&self) -> bool {
        self.enable_column_lineage.unwrap_or(true)
    }

    pub fn layout_enabled(&self) -> bool {
        self.enable_layout.unwrap_or(true)
    }

    pub fn layout(&self) -> LayoutOptions {
        self.layout.unwrap_or_default()
    }
}
