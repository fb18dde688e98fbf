use queryflow_core::{
    AccessMode, ClauseType, ComplexityClass, ComplexityLevel, Dialect, HintCategory, HintKind,
    NodeKind, OperationType, Severity, StatementKind, TableCategory,
};
use queryflow_core::types::WarningKind;

mod common;
use common::{assert_edges_resolve, compile, compile_with, kinds, nodes_of};

#[test]
fn single_table_select() {
    let result = compile("SELECT id FROM users");

    assert_eq!(
        kinds(&result.nodes),
        vec![NodeKind::Table, NodeKind::Select, NodeKind::Result]
    );
    assert_eq!(result.nodes[0].label, "users");
    assert_eq!(result.edges.len(), 2);
    assert_eq!(result.edges[0].source, result.nodes[0].id);
    assert_eq!(result.edges[0].target, result.nodes[1].id);
    assert_eq!(result.edges[1].source, result.nodes[1].id);
    assert_eq!(result.edges[1].target, result.nodes[2].id);
    assert_eq!(result.stats.tables, 1);
    assert_eq!(result.stats.complexity, ComplexityClass::Simple);
    assert_eq!(result.statement_type, StatementKind::Select);
    assert!(result.hints.is_empty());
    assert!(result.has_no_limit);
    assert!(!result.has_select_star);
}

#[test]
fn join_condition_is_carried_on_inbound_edges() {
    let result = compile("SELECT a.id FROM a JOIN b ON a.id = b.id");

    let joins = nodes_of(&result, NodeKind::Join);
    assert_eq!(joins.len(), 1);
    let join = joins[0];
    assert_eq!(join.label, "JOIN");
    assert_eq!(join.conditions, vec!["a.id = b.id"]);

    let inbound: Vec<_> = result.edges_to(&join.id).collect();
    assert_eq!(inbound.len(), 2);
    for edge in inbound {
        assert_eq!(edge.sql_clause.as_deref(), Some("a.id = b.id"));
        assert_eq!(edge.clause_type, ClauseType::Join);
    }
    assert_eq!(result.stats.joins, 1);
    assert_eq!(result.stats.conditions, 1);
}

#[test]
fn clause_text_is_kept_verbatim() {
    let result = compile_with(
        "SELECT a.id FROM a JOIN b ON a.ts > b.ts - INTERVAL '1' DAY AND a.k = b.k::int \
         WHERE a.created_at > now() - INTERVAL '7' DAY",
        Dialect::Postgres,
    );

    let join = nodes_of(&result, NodeKind::Join)[0];
    let edge = result.edges_to(&join.id).next().expect("join input");
    let clause = edge.sql_clause.as_deref().unwrap_or_default();
    assert!(clause.starts_with("a.ts > b.ts - INTERVAL '1' DAY AND a.k = b.k::"), "{clause}");
    assert!(!clause.contains('?'), "{clause}");
    assert_eq!(join.description.as_deref(), Some(format!("ON {clause}").as_str()));

    let filter = nodes_of(&result, NodeKind::Filter)[0];
    assert_eq!(
        filter.description.as_deref(),
        Some("a.created_at > now() - INTERVAL '7' DAY")
    );
}

#[test]
fn cte_becomes_container_with_its_own_graph() {
    let result = compile("WITH c AS (SELECT id FROM t) SELECT * FROM c");

    assert_eq!(
        kinds(&result.nodes),
        vec![NodeKind::Cte, NodeKind::Select, NodeKind::Result]
    );
    let cte = &result.nodes[0];
    assert_eq!(cte.label, "c");
    assert_eq!(kinds(&cte.children), vec![NodeKind::Table, NodeKind::Select]);
    assert_eq!(cte.child_edges.len(), 1);
    assert_eq!(cte.nesting_depth, Some(1));
    assert_eq!(cte.columns[0].name, "id");

    // The outer SELECT reads the CTE directly rather than through a new table node
    assert_eq!(result.edges[0].source, cte.id);
    assert!(result.has_select_star);
    assert_eq!(result.stats.ctes, 1);
    assert_eq!(result.stats.max_cte_depth, Some(1));
    assert!(result.table_usage.contains_key("t"));
    assert!(!result.table_usage.contains_key("c"));
    assert_edges_resolve(&result.nodes, &result.edges);
}

#[test]
fn aggregate_captures_functions_and_group_keys() {
    let result = compile("SELECT COUNT(*) AS n FROM t GROUP BY t.k");

    let aggregates = nodes_of(&result, NodeKind::Aggregate);
    assert_eq!(aggregates.len(), 1);
    let aggregate = aggregates[0];
    assert_eq!(aggregate.label, "GROUP BY k");
    let details = aggregate.aggregate_details.as_ref().unwrap();
    assert_eq!(details.functions.len(), 1);
    assert_eq!(details.functions[0].name, "COUNT");
    assert_eq!(details.functions[0].expression, "COUNT(*)");
    assert_eq!(details.functions[0].alias.as_deref(), Some("n"));
    assert_eq!(details.group_by, vec!["k"]);
    assert_eq!(result.stats.aggregations, 1);
}

#[test]
fn six_joins_and_a_subquery_is_very_complex() {
    let result = compile(
        "SELECT a.x FROM a \
         JOIN b ON a.id = b.id \
         JOIN c ON b.id = c.id \
         JOIN d ON c.id = d.id \
         JOIN e ON d.id = e.id \
         JOIN f ON e.id = f.id \
         JOIN g ON f.id = g.id \
         WHERE a.x IN (SELECT y FROM h)",
    );

    assert_eq!(result.stats.joins, 6);
    assert_eq!(result.stats.subqueries, 1);
    assert!(result.stats.complexity_score >= 30);
    assert_eq!(result.stats.complexity, ComplexityClass::VeryComplex);

    let last_join = nodes_of(&result, NodeKind::Join).last().map(|n| n.id.clone());
    let complex = result
        .hints
        .iter()
        .find(|hint| hint.category == HintCategory::Complexity)
        .expect("join count hint");
    assert_eq!(complex.node_id, last_join);
}

#[test]
fn where_subquery_feeds_filter() {
    let result = compile("SELECT name FROM users WHERE id IN (SELECT user_id FROM orders)");

    assert_eq!(
        kinds(&result.nodes),
        vec![
            NodeKind::Table,
            NodeKind::Subquery,
            NodeKind::Filter,
            NodeKind::Select,
            NodeKind::Result
        ]
    );
    let filter = &result.nodes[2];
    assert_eq!(filter.conditions, vec!["id IN (subquery)"]);
    let subquery_edge = result
        .edges_to(&filter.id)
        .find(|edge| edge.clause_type == ClauseType::Subquery)
        .expect("subquery edge");
    assert_eq!(subquery_edge.source, result.nodes[1].id);
    assert_eq!(result.nodes[1].nesting_depth, Some(1));
    assert_eq!(result.stats.subqueries, 1);
    assert_eq!(
        result.source_tables().collect::<Vec<_>>(),
        vec!["orders", "users"]
    );
}

#[test]
fn subquery_under_distinct_comparison_is_found() {
    let result = compile(
        "SELECT name FROM users WHERE (SELECT MAX(id) FROM orders) IS NOT DISTINCT FROM users.id",
    );

    assert_eq!(nodes_of(&result, NodeKind::Subquery).len(), 1);
    assert_eq!(result.stats.subqueries, 1);
    assert_eq!(
        result.source_tables().collect::<Vec<_>>(),
        vec!["orders", "users"]
    );
}

#[test]
fn union_all_merges_every_branch() {
    let result = compile("SELECT id FROM a UNION ALL SELECT id FROM b UNION ALL SELECT id FROM c");

    let setops = nodes_of(&result, NodeKind::SetOp);
    assert_eq!(setops.len(), 1);
    assert_eq!(setops[0].label, "UNION ALL");
    assert_eq!(result.edges_to(&setops[0].id).count(), 3);
    assert_eq!(result.stats.unions, 2);
    assert_eq!(result.stats.tables, 3);
}

#[test]
fn sort_and_limit_precede_projection() {
    let result = compile("SELECT id FROM t WHERE id > 1 ORDER BY id DESC LIMIT 10");

    assert_eq!(
        kinds(&result.nodes),
        vec![
            NodeKind::Table,
            NodeKind::Filter,
            NodeKind::Sort,
            NodeKind::Limit,
            NodeKind::Select,
            NodeKind::Result
        ]
    );
    assert_eq!(result.nodes[3].label, "LIMIT 10");
    assert!(!result.has_no_limit);
}

#[test]
fn implicit_cross_join_is_flagged() {
    let result = compile("SELECT * FROM a, b");

    let join = &nodes_of(&result, NodeKind::Join)[0];
    assert_eq!(join.label, "CROSS JOIN");
    assert_eq!(join.warnings.len(), 1);
    assert_eq!(join.warnings[0].kind, WarningKind::CrossJoin);
    assert_eq!(join.complexity_level, ComplexityLevel::High);

    let categories: Vec<_> = result.hints.iter().map(|hint| hint.category).collect();
    assert_eq!(
        categories,
        vec![
            HintCategory::Quality,
            HintCategory::BestPractice,
            HintCategory::Performance
        ]
    );
    assert_eq!(result.hints[2].severity, Severity::High);
    assert_eq!(result.hints[2].node_id.as_deref(), Some(join.id.as_str()));
}

#[test]
fn shared_cte_fans_out() {
    let result = compile(
        "WITH c AS (SELECT id FROM t) \
         SELECT c1.id FROM c c1 JOIN c c2 ON c1.id = c2.id JOIN c c3 ON c2.id = c3.id",
    );

    assert_eq!(result.stats.max_fan_out, Some(3));
    let fan_out = result
        .hints
        .iter()
        .find(|hint| hint.category == HintCategory::Performance)
        .expect("fan-out hint");
    assert_eq!(fan_out.severity, Severity::Medium);
    assert_eq!(fan_out.node_id.as_deref(), Some(result.nodes[0].id.as_str()));
    assert_eq!(result.nodes[0].warnings[0].kind, WarningKind::FanOut);
}

#[test]
fn sort_inside_subquery_without_limit_is_reported() {
    let result = compile("SELECT x FROM (SELECT x FROM t ORDER BY x) s");

    let hint = result
        .hints
        .iter()
        .find(|hint| hint.kind == HintKind::Info && hint.message.starts_with("ORDER BY inside"))
        .expect("unbounded sort hint");
    let sort_id = hint.node_id.as_deref().expect("node-scoped hint");
    let sort = result.find_node(sort_id).expect("sort inside the subquery");
    assert_eq!(sort.kind, NodeKind::Sort);
}

#[test]
fn deep_subquery_nesting_is_reported() {
    let result = compile(
        "SELECT a FROM (SELECT a FROM (SELECT a FROM (SELECT a FROM (SELECT a FROM t) s1) s2) s3) s4",
    );

    assert_eq!(result.stats.subqueries, 4);
    assert!(result
        .hints
        .iter()
        .any(|hint| hint.category == HintCategory::Complexity && hint.message.contains("4 levels")));
}

#[test]
fn window_only_projection_becomes_window_node() {
    let result = compile("SELECT ROW_NUMBER() OVER (PARTITION BY g ORDER BY ts) AS rn FROM t");

    let windows = nodes_of(&result, NodeKind::Window);
    assert_eq!(windows.len(), 1);
    let details = windows[0].window_details.as_ref().unwrap();
    assert_eq!(details.functions.len(), 1);
    assert_eq!(details.functions[0].partition_by, vec!["g"]);
    assert_eq!(result.stats.window_functions, 1);
}

#[test]
fn mixed_window_projection_stays_select() {
    let result = compile("SELECT id, name, RANK() OVER (ORDER BY score) AS r FROM t");

    assert!(nodes_of(&result, NodeKind::Window).is_empty());
    let select = &nodes_of(&result, NodeKind::Select)[0];
    assert!(select.window_details.is_some());
    assert!(select.columns[2].is_window_func);
}

#[test]
fn case_expression_is_a_projection_payload() {
    let result = compile("SELECT CASE WHEN x > 0 THEN 'pos' ELSE 'neg' END AS sign FROM t");

    let select = &nodes_of(&result, NodeKind::Select)[0];
    let cases = &select.case_details.as_ref().unwrap().cases;
    assert_eq!(cases.len(), 1);
    assert_eq!(cases[0].branches.len(), 1);
    assert_eq!(cases[0].alias.as_deref(), Some("sign"));
}

#[test]
fn insert_select_feeds_write_target() {
    let result = compile("INSERT INTO archive (id) SELECT id FROM orders WHERE total > 100");

    assert_eq!(result.statement_type, StatementKind::Insert);
    assert_eq!(
        kinds(&result.nodes),
        vec![NodeKind::Table, NodeKind::Filter, NodeKind::Select, NodeKind::Table]
    );
    let target = &result.nodes[3];
    assert_eq!(target.label, "archive");
    assert_eq!(target.access_mode, Some(AccessMode::Write));
    assert_eq!(target.operation_type, Some(OperationType::Insert));
    assert_eq!(result.nodes[0].access_mode, Some(AccessMode::Read));

    let edge = result.edges_to(&target.id).next().expect("insert edge");
    assert_eq!(edge.clause_type, ClauseType::Insert);
    assert_eq!(edge.sql_clause.as_deref(), Some("INSERT INTO archive (id)"));
    assert_eq!(result.table_usage.len(), 2);
}

#[test]
fn insert_values_is_a_single_write() {
    let result = compile("INSERT INTO t (a, b) VALUES (1, 2), (3, 4)");

    assert_eq!(kinds(&result.nodes), vec![NodeKind::Table]);
    assert!(result.edges.is_empty());
    assert_eq!(
        result.nodes[0].description.as_deref(),
        Some("INSERT INTO t (a, b) VALUES (2 rows)")
    );
}

#[test]
fn update_without_where_is_flagged() {
    let result = compile("UPDATE users SET active = false");

    assert_eq!(result.statement_type, StatementKind::Update);
    let target = &result.nodes[0];
    assert_eq!(target.operation_type, Some(OperationType::Update));
    assert_eq!(target.description.as_deref(), Some("SET active = false"));
    assert_eq!(target.warnings[0].kind, WarningKind::MissingWhere);
    assert_eq!(target.complexity_level, ComplexityLevel::High);
    assert_eq!(
        result.hints[0].message,
        "UPDATE without WHERE affects every row of the table"
    );
}

#[test]
fn update_from_reads_into_target() {
    let result = compile_with(
        "UPDATE orders SET status = s.status FROM shipments s WHERE orders.id = s.order_id",
        Dialect::Postgres,
    );

    let tables = nodes_of(&result, NodeKind::Table);
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0].label, "shipments");
    assert_eq!(tables[0].access_mode, Some(AccessMode::Read));
    assert_eq!(tables[1].label, "orders");
    assert_eq!(tables[1].conditions, vec!["orders.id = s.order_id"]);
    assert_eq!(result.edges[0].clause_type, ClauseType::From);
    assert!(result.hints.is_empty());
}

#[test]
fn delete_where_becomes_target_conditions() {
    let result = compile("DELETE FROM logs WHERE created < '2020-01-01'");

    assert_eq!(result.statement_type, StatementKind::Delete);
    assert_eq!(result.nodes.len(), 1);
    let target = &result.nodes[0];
    assert_eq!(target.label, "logs");
    assert_eq!(target.operation_type, Some(OperationType::Delete));
    assert_eq!(target.conditions, vec!["created < '2020-01-01'"]);
    assert!(result.hints.is_empty());
}

#[test]
fn merge_source_feeds_target() {
    let result = compile(
        "MERGE INTO inventory i USING shipments s ON i.sku = s.sku \
         WHEN MATCHED THEN UPDATE SET qty = i.qty + s.qty \
         WHEN NOT MATCHED THEN INSERT (sku, qty) VALUES (s.sku, s.qty)",
    );

    assert_eq!(result.statement_type, StatementKind::Merge);
    assert_eq!(kinds(&result.nodes), vec![NodeKind::Table, NodeKind::Table]);
    let target = &result.nodes[1];
    assert_eq!(target.label, "inventory");
    assert_eq!(target.operation_type, Some(OperationType::Merge));
    assert_eq!(target.conditions, vec!["i.sku = s.sku"]);
    assert!(target
        .description
        .as_deref()
        .is_some_and(|d| d.starts_with("WHEN MATCHED THEN UPDATE")));
    assert_eq!(result.edges[0].clause_type, ClauseType::Merge);
    assert_eq!(result.edges[0].sql_clause.as_deref(), Some("i.sku = s.sku"));
}

#[test]
fn create_view_ends_in_write_result() {
    let result = compile("CREATE VIEW recent AS SELECT id FROM orders WHERE placed > 10");

    assert_eq!(result.statement_type, StatementKind::CreateView);
    let terminal = result.nodes.last().unwrap();
    assert_eq!(terminal.kind, NodeKind::Result);
    assert_eq!(terminal.label, "recent");
    assert_eq!(terminal.access_mode, Some(AccessMode::Write));
    assert_eq!(terminal.operation_type, Some(OperationType::CreateView));
    assert_eq!(terminal.table_category, Some(TableCategory::Physical));
    assert_eq!(terminal.columns[0].name, "id");
    assert_eq!(nodes_of(&result, NodeKind::Result).len(), 1);

    let edge = result.edges_to(&terminal.id).next().unwrap();
    assert_eq!(edge.clause_type, ClauseType::Create);
    assert_eq!(edge.sql_clause.as_deref(), Some("CREATE VIEW recent"));
}

#[test]
fn create_table_as_select() {
    let result = compile("CREATE TABLE totals AS SELECT k, SUM(v) AS total FROM t GROUP BY k");

    assert_eq!(result.statement_type, StatementKind::CreateTableAs);
    let terminal = result.nodes.last().unwrap();
    assert_eq!(terminal.operation_type, Some(OperationType::CreateTableAs));
    assert_eq!(result.stats.aggregations, 1);
}

#[test]
fn plain_create_table_lists_columns() {
    let result = compile("CREATE TABLE people (id INT, name TEXT)");

    assert_eq!(result.statement_type, StatementKind::CreateTable);
    assert_eq!(result.nodes.len(), 1);
    let node = &result.nodes[0];
    assert_eq!(node.operation_type, Some(OperationType::CreateTable));
    let columns: Vec<_> = node
        .columns
        .iter()
        .map(|c| (c.name.as_str(), c.expression.as_str()))
        .collect();
    assert_eq!(columns, vec![("id", "INT"), ("name", "TEXT")]);
}

#[test]
fn unsupported_statement_yields_info_hint() {
    let result = compile("DROP TABLE users");

    assert_eq!(result.statement_type, StatementKind::Other);
    assert!(result.nodes.is_empty());
    assert_eq!(result.hints.len(), 1);
    assert_eq!(result.hints[0].kind, HintKind::Info);
    assert_eq!(result.hints[0].category, HintCategory::Other);
    assert_eq!(result.hints[0].message, "Statement type DROP TABLE is not analyzed");
}

#[test]
fn line_ranges_follow_the_source() {
    let result = compile("SELECT id\nFROM users\nWHERE id > 1");

    let line = |kind| nodes_of(&result, kind)[0].line_range.map(|(start, _)| start);
    assert_eq!(line(NodeKind::Table), Some(2));
    assert_eq!(line(NodeKind::Filter), Some(3));
    assert_eq!(line(NodeKind::Select), Some(1));
    assert_eq!(line(NodeKind::Result), Some(3));
}

#[test]
fn recursive_cte_reference_stays_inside() {
    let result = compile(
        "WITH RECURSIVE nums AS (SELECT 1 AS n UNION ALL SELECT n + 1 FROM nums WHERE n < 5) \
         SELECT n FROM nums",
    );

    let cte = &result.nodes[0];
    assert_eq!(cte.kind, NodeKind::Cte);
    let reference = cte
        .children
        .iter()
        .find(|child| child.table_category == Some(TableCategory::CteReference))
        .expect("self reference");
    assert_eq!(reference.label, "nums");
    assert!(result.table_usage.is_empty());
    assert_edges_resolve(&result.nodes, &result.edges);
}
