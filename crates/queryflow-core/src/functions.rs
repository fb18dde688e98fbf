//! Dialect-aware function classification.
//!
//! Answers whether a function name is an aggregate, a window (ranking/value) function or a
//! table-valued function for a given dialect. The base sets cover functions every engine
//! agrees on; each dialect layers its own names on top.

use crate::types::Dialect;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Behavioral class of a SQL function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionClass {
    /// Combines many rows into one value (SUM, COUNT, ...)
    Aggregate,
    /// Only meaningful with an OVER clause (RANK, LAG, ...)
    Window,
    /// Produces rows and may appear in FROM (UNNEST, FLATTEN, ...)
    TableValued,
    /// Anything else
    Scalar,
}

static BASE_AGGREGATES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "any_value",
        "approx_count_distinct",
        "array_agg",
        "avg",
        "bit_and",
        "bit_or",
        "bool_and",
        "bool_or",
        "corr",
        "count",
        "count_if",
        "covar_pop",
        "covar_samp",
        "every",
        "json_agg",
        "json_object_agg",
        "max",
        "median",
        "min",
        "mode",
        "percentile_cont",
        "percentile_disc",
        "regr_slope",
        "stddev",
        "stddev_pop",
        "stddev_samp",
        "sum",
        "var_pop",
        "var_samp",
        "variance",
    ]
    .into_iter()
    .collect()
});

static BASE_WINDOWS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "cume_dist",
        "dense_rank",
        "first_value",
        "lag",
        "last_value",
        "lead",
        "nth_value",
        "ntile",
        "percent_rank",
        "rank",
        "row_number",
    ]
    .into_iter()
    .collect()
});

static BASE_TABLE_VALUED: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ["unnest"].into_iter().collect());

/// Names a dialect adds on top of the base sets.
#[derive(Debug, Default)]
struct DialectFunctions {
    aggregate: &'static [&'static str],
    window: &'static [&'static str],
    table_valued: &'static [&'static str],
}

static DIALECT_FUNCTIONS: LazyLock<HashMap<Dialect, DialectFunctions>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    map.insert(
        Dialect::Postgres,
        DialectFunctions {
            aggregate: &["string_agg", "jsonb_agg", "jsonb_object_agg", "xmlagg"],
            window: &[],
            table_valued: &[
                "generate_series",
                "jsonb_array_elements",
                "jsonb_each",
                "json_array_elements",
                "json_each",
                "regexp_split_to_table",
                "jsonb_to_recordset",
            ],
        },
    );
    map.insert(
        Dialect::Redshift,
        DialectFunctions {
            aggregate: &["listagg", "approximate_percentile_disc"],
            window: &["ratio_to_report"],
            table_valued: &[],
        },
    );
    map.insert(
        Dialect::Mssql,
        DialectFunctions {
            aggregate: &["string_agg", "count_big", "checksum_agg", "stdev", "stdevp", "var", "varp"],
            window: &[],
            table_valued: &["openjson", "string_split", "openrowset", "openquery", "generate_series"],
        },
    );
    let mysql = || DialectFunctions {
        aggregate: &["group_concat", "json_arrayagg", "json_objectagg", "bit_xor", "std"],
        window: &[],
        table_valued: &["json_table"],
    };
    map.insert(Dialect::Mysql, mysql());
    map.insert(Dialect::Mariadb, mysql());
    map.insert(
        Dialect::Snowflake,
        DialectFunctions {
            aggregate: &[
                "listagg",
                "array_unique_agg",
                "object_agg",
                "approx_top_k",
                "hll",
                "kurtosis",
                "skew",
            ],
            window: &["conditional_change_event", "conditional_true_event", "ratio_to_report"],
            table_valued: &["flatten", "split_to_table", "generator", "result_scan"],
        },
    );
    map.insert(
        Dialect::Bigquery,
        DialectFunctions {
            aggregate: &["string_agg", "array_concat_agg", "logical_and", "logical_or", "approx_quantiles", "approx_top_count"],
            window: &[],
            table_valued: &[],
        },
    );
    map.insert(
        Dialect::Hive,
        DialectFunctions {
            aggregate: &["collect_list", "collect_set", "percentile", "percentile_approx", "histogram_numeric"],
            window: &[],
            table_valued: &["explode", "explode_outer", "posexplode", "inline", "json_tuple", "stack"],
        },
    );
    let presto = || DialectFunctions {
        aggregate: &[
            "approx_distinct",
            "approx_percentile",
            "arbitrary",
            "array_agg",
            "map_agg",
            "multimap_agg",
            "max_by",
            "min_by",
            "histogram",
            "listagg",
        ],
        window: &[],
        table_valued: &["sequence"],
    };
    map.insert(Dialect::Trino, presto());
    map.insert(Dialect::Athena, presto());
    map.insert(
        Dialect::Sqlite,
        DialectFunctions {
            aggregate: &["group_concat", "total"],
            window: &[],
            table_valued: &["json_each", "json_tree", "generate_series", "pragma_table_info"],
        },
    );
    map
});

/// Lowercases a possibly qualified, possibly quoted function name down to its final segment.
fn normalize(name: &str) -> String {
    let last = name.rsplit('.').next().unwrap_or(name);
    last.trim_matches(|c| c == '"' || c == '`' || c == '[' || c == ']')
        .to_ascii_lowercase()
}

fn dialect_has(dialect: Dialect, name: &str, pick: fn(&DialectFunctions) -> &[&str]) -> bool {
    DIALECT_FUNCTIONS
        .get(&dialect)
        .is_some_and(|functions| pick(functions).contains(&name))
}

/// Classifies `name` under `dialect`.
///
/// Table-valued wins over aggregate, which wins over window. Unknown names are scalar.
pub fn classify_function(name: &str, dialect: Dialect) -> FunctionClass {
    let name = normalize(name);
    let name = name.as_str();
    if BASE_TABLE_VALUED.contains(name) || dialect_has(dialect, name, |f| f.table_valued) {
        FunctionClass::TableValued
    } else if BASE_AGGREGATES.contains(name) || dialect_has(dialect, name, |f| f.aggregate) {
        FunctionClass::Aggregate
    } else if BASE_WINDOWS.contains(name) || dialect_has(dialect, name, |f| f.window) {
        FunctionClass::Window
    } else {
        FunctionClass::Scalar
    }
}

pub fn is_aggregate_function(name: &str, dialect: Dialect) -> bool {
    classify_function(name, dialect) == FunctionClass::Aggregate
}

pub fn is_window_function(name: &str, dialect: Dialect) -> bool {
    classify_function(name, dialect) == FunctionClass::Window
}

pub fn is_table_valued_function(name: &str, dialect: Dialect) -> bool {
    classify_function(name, dialect) == FunctionClass::TableValued
}

/// Every window-only function name known for `dialect`, sorted.
pub fn window_function_names(dialect: Dialect) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = BASE_WINDOWS.iter().copied().collect();
    if let Some(functions) = DIALECT_FUNCTIONS.get(&dialect) {
        names.extend(functions.window.iter().copied());
    }
    names.sort_unstable();
    names.dedup();
    names
}

/// Argument positions holding unit keywords (`DATEDIFF(day, a, b)`) rather than columns.
static UNIT_ARGUMENTS: LazyLock<HashMap<&'static str, &'static [usize]>> = LazyLock::new(|| {
    let mut rules: HashMap<&'static str, &'static [usize]> = HashMap::new();
    rules.insert("datediff", &[0]);
    rules.insert("date_diff", &[2]);
    rules.insert("dateadd", &[0]);
    rules.insert("datepart", &[0]);
    rules.insert("date_part", &[0]);
    rules.insert("timestampdiff", &[0]);
    rules.insert("timestampadd", &[0]);
    rules.insert("date_trunc", &[0]);
    rules
});

/// Whether argument `index` of `name` is a unit keyword and must not be read as a column.
pub(crate) fn is_unit_argument(name: &str, index: usize) -> bool {
    UNIT_ARGUMENTS
        .get(normalize(name).as_str())
        .is_some_and(|indices| indices.contains(&index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_classification_is_case_insensitive() {
        assert_eq!(classify_function("COUNT", Dialect::Generic), FunctionClass::Aggregate);
        assert_eq!(classify_function("Row_Number", Dialect::Generic), FunctionClass::Window);
        assert_eq!(classify_function("unnest", Dialect::Postgres), FunctionClass::TableValued);
        assert_eq!(classify_function("upper", Dialect::Generic), FunctionClass::Scalar);
    }

    #[test]
    fn test_dialect_overrides() {
        assert!(is_aggregate_function("string_agg", Dialect::Postgres));
        assert!(!is_aggregate_function("string_agg", Dialect::Mysql));
        assert!(is_aggregate_function("group_concat", Dialect::Mariadb));
        assert!(is_table_valued_function("FLATTEN", Dialect::Snowflake));
        assert!(!is_table_valued_function("flatten", Dialect::Postgres));
        assert!(is_table_valued_function("explode", Dialect::Hive));
        assert!(is_aggregate_function("approx_distinct", Dialect::Athena));
        assert!(is_window_function("ratio_to_report", Dialect::Redshift));
    }

    #[test]
    fn test_qualified_and_quoted_names() {
        assert!(is_aggregate_function("pg_catalog.sum", Dialect::Postgres));
        assert!(is_table_valued_function("[openjson]", Dialect::Mssql));
        assert!(is_table_valued_function("\"generate_series\"", Dialect::Postgres));
    }

    #[test]
    fn test_window_function_names_sorted_and_extended() {
        let names = window_function_names(Dialect::Snowflake);
        assert!(names.contains(&"rank"));
        assert!(names.contains(&"conditional_true_event"));
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert!(!window_function_names(Dialect::Generic).contains(&"conditional_true_event"));
    }

    #[test]
    fn test_unit_arguments() {
        assert!(is_unit_argument("DATEDIFF", 0));
        assert!(!is_unit_argument("DATEDIFF", 1));
        assert!(is_unit_argument("date_diff", 2));
        assert!(!is_unit_argument("coalesce", 0));
    }
}
