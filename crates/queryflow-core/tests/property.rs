use queryflow_core::{
    analyze, complexity_score, extract_column_infos, extract_tables_from_statement, parse_sql,
    AnalyzeRequest, Dialect, ExpressionFormat, QueryStats,
};
use proptest::prelude::*;
use sqlparser::ast::{SetExpr, Statement};

mod common;
use common::{all_ids, assert_edges_resolve, id_number, shape};

const TABLES: [&str; 5] = ["orders", "customers", "items", "events", "users"];

/// Random but always valid SELECT statements built from common clauses.
fn select_statement() -> impl Strategy<Value = String> {
    (
        prop::sample::select(TABLES.to_vec()),
        prop::option::of(prop::sample::select(TABLES.to_vec())),
        "col_[a-z]{1,4}",
        any::<bool>(),
        any::<bool>(),
        prop::option::of(1u32..500),
        any::<bool>(),
    )
        .prop_map(|(base, joined, column, filtered, grouped, limit, nested)| {
            let from = if nested {
                format!("(SELECT {column}, k FROM {base}) s")
            } else {
                format!("{base} s")
            };
            let mut sql = if grouped {
                format!("SELECT s.k, COUNT(s.{column}) AS n FROM {from}")
            } else {
                format!("SELECT s.{column} FROM {from}")
            };
            if let Some(joined) = joined {
                sql.push_str(&format!(" JOIN {joined} j ON s.k = j.k"));
            }
            if filtered {
                sql.push_str(&format!(" WHERE s.{column} IN (SELECT k FROM {base})"));
            }
            if grouped {
                sql.push_str(" GROUP BY s.k");
            }
            if let Some(limit) = limit {
                sql.push_str(&format!(" ORDER BY 1 LIMIT {limit}"));
            }
            sql
        })
}

fn counters() -> impl Strategy<Value = QueryStats> {
    prop::array::uniform8(0u32..50).prop_map(|c| QueryStats {
        tables: c[0],
        joins: c[1],
        subqueries: c[2],
        ctes: c[3],
        aggregations: c[4],
        window_functions: c[5],
        unions: c[6],
        conditions: c[7],
        ..QueryStats::default()
    })
}

proptest! {
    #[test]
    fn generated_selects_compile_to_valid_graphs(sql in select_statement()) {
        let batch = analyze(&AnalyzeRequest::new(sql.clone(), Dialect::Generic));

        prop_assert_eq!(batch.queries.len(), 1);
        let result = &batch.queries[0];
        prop_assert!(result.error.is_none(), "{} failed: {:?}", sql, result.error);
        assert_edges_resolve(&result.nodes, &result.edges);

        let ids = all_ids(result);
        let mut numbers: Vec<u64> = ids.iter().map(|id| id_number(id)).collect();
        numbers.sort_unstable();
        numbers.dedup();
        prop_assert_eq!(numbers.len(), ids.len(), "duplicate id in {:?}", ids);

        for window in result.nodes.windows(2) {
            prop_assert!(id_number(&window[0].id) < id_number(&window[1].id));
        }
    }

    #[test]
    fn compilation_is_deterministic(sql in select_statement()) {
        let request = AnalyzeRequest::new(sql, Dialect::Generic);
        let first = analyze(&request);
        let second = analyze(&request);

        prop_assert_eq!(shape(&first.queries[0]), shape(&second.queries[0]));
        prop_assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn score_never_decreases_when_a_counter_grows(stats in counters(), which in 0usize..8) {
        let mut grown = stats.clone();
        let slot = match which {
            0 => &mut grown.tables,
            1 => &mut grown.joins,
            2 => &mut grown.subqueries,
            3 => &mut grown.ctes,
            4 => &mut grown.aggregations,
            5 => &mut grown.window_functions,
            6 => &mut grown.unions,
            _ => &mut grown.conditions,
        };
        *slot += 1;
        prop_assert!(complexity_score(&grown) >= complexity_score(&stats));
    }

    #[test]
    fn one_column_info_per_projection_item(columns in prop::collection::vec("col_[a-z]{1,4}", 1..8)) {
        let sql = format!("SELECT {}, COUNT(*) AS total, t.* FROM t", columns.join(", "));
        let statements = parse_sql(&sql).unwrap();
        let Statement::Query(query) = &statements[0] else {
            panic!("expected a query");
        };
        let SetExpr::Select(select) = query.body.as_ref() else {
            panic!("expected a SELECT");
        };

        let infos = extract_column_infos(&select.projection, Dialect::Generic, ExpressionFormat::Sql);
        prop_assert_eq!(infos.len(), select.projection.len());
        prop_assert_eq!(infos.len(), columns.len() + 2);
    }

    #[test]
    fn extracted_tables_are_ones_the_statement_names(sql in select_statement()) {
        let statements = parse_sql(&sql).unwrap();
        let tables = extract_tables_from_statement(&statements[0]);

        prop_assert!(!tables.is_empty());
        for table in &tables {
            prop_assert!(TABLES.contains(&table.as_str()), "unexpected table {}", table);
        }
        prop_assert!(!tables.iter().any(|table| table == "s"));
    }
}
