//! CLI argument parsing using clap.

use clap::{Parser, ValueEnum};
use queryflow_core::{AnalysisOptions, Dialect, LayoutAlgorithm, LayoutDirection, LayoutOptions};
use std::path::PathBuf;

/// QueryFlow - SQL dataflow compiler
#[derive(Parser, Debug)]
#[command(name = "queryflow")]
#[command(about = "Compile SQL statements into dataflow graphs", long_about = None)]
#[command(version)]
pub struct Args {
    /// SQL files to compile (reads from stdin if none provided)
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// SQL dialect
    #[arg(short, long, default_value = "generic", value_enum)]
    pub dialect: DialectArg,

    /// Output format
    #[arg(short, long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print only the per-statement summary lines (no node chains or hints)
    #[arg(short, long)]
    pub quiet: bool,

    /// Compact JSON output (no pretty-printing)
    #[arg(short, long)]
    pub compact: bool,

    /// Skip column lineage
    #[arg(long)]
    pub no_lineage: bool,

    /// Layout algorithm for node positions
    #[arg(long, value_enum)]
    pub layout: Option<LayoutArg>,

    /// Primary layout direction
    #[arg(long, value_enum)]
    pub direction: Option<DirectionArg>,

    /// Nesting depth ceiling for statement processing and lineage
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Print the JSON Schema of the request and result types and exit
    #[arg(long)]
    pub schema: bool,

    /// Increase log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Analysis options assembled from the flags.
    pub fn analysis_options(&self) -> AnalysisOptions {
        let layout = (self.layout.is_some() || self.direction.is_some()).then(|| {
            let defaults = LayoutOptions::default();
            LayoutOptions {
                algorithm: self.layout.map_or(defaults.algorithm, Into::into),
                direction: self.direction.map_or(defaults.direction, Into::into),
                ..defaults
            }
        });
        AnalysisOptions {
            max_depth: self.max_depth,
            enable_column_lineage: self.no_lineage.then_some(false),
            layout,
            ..AnalysisOptions::default()
        }
    }

    /// Default `tracing` filter directive for the `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// SQL dialect options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DialectArg {
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

impl From<DialectArg> for Dialect {
    fn from(d: DialectArg) -> Self {
        match d {
            DialectArg::Generic => Dialect::Generic,
            DialectArg::Mysql => Dialect::Mysql,
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Mssql => Dialect::Mssql,
            DialectArg::Snowflake => Dialect::Snowflake,
            DialectArg::Bigquery => Dialect::Bigquery,
            DialectArg::Redshift => Dialect::Redshift,
            DialectArg::Hive => Dialect::Hive,
            DialectArg::Athena => Dialect::Athena,
            DialectArg::Trino => Dialect::Trino,
            DialectArg::Mariadb => Dialect::Mariadb,
            DialectArg::Sqlite => Dialect::Sqlite,
        }
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary per statement
    Table,
    /// Serialized batch results
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    Hierarchical,
    Force,
    Radial,
}

impl From<LayoutArg> for LayoutAlgorithm {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Hierarchical => LayoutAlgorithm::Hierarchical,
            LayoutArg::Force => LayoutAlgorithm::Force,
            LayoutArg::Radial => LayoutAlgorithm::Radial,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    /// Top to bottom
    Tb,
    /// Left to right
    Lr,
}

impl From<DirectionArg> for LayoutDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Tb => LayoutDirection::TopToBottom,
            DirectionArg::Lr => LayoutDirection::LeftToRight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let args = Args::parse_from(["queryflow", "test.sql"]);
        assert_eq!(args.files.len(), 1);
        assert_eq!(args.dialect, DialectArg::Generic);
        assert_eq!(args.format, OutputFormat::Table);
        assert_eq!(args.log_level(), "warn");
        assert!(!args.schema);
    }

    #[test]
    fn test_parse_full_options() {
        let args = Args::parse_from([
            "queryflow",
            "-d",
            "postgres",
            "-f",
            "json",
            "-o",
            "out.json",
            "-c",
            "-q",
            "--no-lineage",
            "--max-depth",
            "12",
            "-vv",
            "a.sql",
            "b.sql",
        ]);
        assert_eq!(args.dialect, DialectArg::Postgres);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
        assert!(args.compact);
        assert!(args.quiet);
        assert_eq!(args.files.len(), 2);
        assert_eq!(args.log_level(), "debug");

        let options = args.analysis_options();
        assert_eq!(options.max_depth, Some(12));
        assert_eq!(options.enable_column_lineage, Some(false));
        assert!(options.layout.is_none());
    }

    #[test]
    fn test_layout_flags_build_layout_options() {
        let args = Args::parse_from(["queryflow", "--layout", "radial", "--direction", "lr"]);
        let layout = args.analysis_options().layout.unwrap();
        assert_eq!(layout.algorithm, LayoutAlgorithm::Radial);
        assert_eq!(layout.direction, LayoutDirection::LeftToRight);
    }

    #[test]
    fn test_dialect_conversion() {
        let dialect: Dialect = DialectArg::Snowflake.into();
        assert_eq!(dialect, Dialect::Snowflake);
    }

    #[test]
    fn test_unknown_dialect_is_rejected() {
        assert!(Args::try_parse_from(["queryflow", "-d", "oracle"]).is_err());
    }
}
