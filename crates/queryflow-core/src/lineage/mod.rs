//! Column lineage over a finished flow graph.
//!
//! Each output column of the statement's final projection is traced backwards through
//! the graph. Filters, sorts and limits pass columns through untouched; joins pick the
//! branch the column's qualifier names; containers are entered through their terminal
//! node; set operations map columns by position. A path ends at a table node, which is
//! the `Source` step, and paths that cannot be attributed are dropped rather than guessed.

use crate::types::{
    ClauseType, ColumnFlow, ColumnInfo, ColumnLineage, FlowEdge, FlowNode, LineageSource,
    LineageStep, LineageTransformation, NodeKind, TableCategory, TransformationType,
};
#[cfg(feature = "tracing")]
use tracing::debug;

type Path = Vec<LineageStep>;

/// Builds lineage entries and step-by-step flows for the statement's output columns.
///
/// Only container entries (CTEs and subqueries) count against `max_depth`; a column whose
/// trace would enter more than `max_depth` nested containers gets no lineage.
pub fn build_lineage(
    nodes: &[FlowNode],
    edges: &[FlowEdge],
    max_depth: usize,
) -> (Vec<ColumnLineage>, Vec<ColumnFlow>) {
    let scope = Scope { nodes, edges };
    let mut tracer = Tracer {
        root: nodes,
        max_depth,
        visiting: Vec::new(),
        overflowed: false,
    };

    let Some(terminal) = output_node(scope) else {
        return (Vec::new(), Vec::new());
    };

    let mut traced: Vec<(String, Vec<Path>)> = Vec::new();
    match projection_of(scope, terminal) {
        Some(projection) => {
            for column in projection.columns.iter().filter(|c| !is_wildcard(c)) {
                tracer.overflowed = false;
                let paths = tracer.trace_projection(scope, projection, column, 0);
                traced.push((column.name.clone(), tracer.settle(paths)));
            }
        }
        None => {
            for name in output_names(scope, terminal) {
                tracer.overflowed = false;
                let paths = tracer.trace(scope, &terminal.id, None, &name, 0);
                let paths = tracer.settle(paths);
                traced.push((name, paths));
            }
        }
    }

    let mut lineage = Vec::new();
    let mut flows = Vec::new();
    for (output_column, paths) in traced {
        if paths.is_empty() {
            continue;
        }
        let mut sources: Vec<LineageSource> = Vec::new();
        for path in &paths {
            if let Some(first) = path.first() {
                let source = LineageSource {
                    node_id: first.node_id.clone(),
                    column_name: first.column_name.clone(),
                };
                if !sources.contains(&source) {
                    sources.push(source);
                }
            }
        }
        lineage.push(ColumnLineage {
            output_column: output_column.clone(),
            sources,
        });
        for path in paths {
            flows.push(ColumnFlow {
                id: format!("flow_{}", flows.len() + 1),
                output_column: output_column.clone(),
                lineage_path: path,
            });
        }
    }
    (lineage, flows)
}

/// One graph level: the top level or a container's children.
#[derive(Clone, Copy)]
struct Scope<'g> {
    nodes: &'g [FlowNode],
    edges: &'g [FlowEdge],
}

impl<'g> Scope<'g> {
    fn node(&self, id: &str) -> Option<&'g FlowNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Data inputs of `id` in edge order; subquery edges feed predicates, not rows.
    fn inputs(&self, id: &str) -> Vec<&'g FlowEdge> {
        self.edges
            .iter()
            .filter(|edge| edge.target == id && edge.clause_type != ClauseType::Subquery)
            .collect()
    }

    fn first_input(&self, id: &str) -> Option<&'g FlowNode> {
        self.inputs(id)
            .first()
            .and_then(|edge| self.node(&edge.source))
    }

    /// The node rows leave the scope through: the last node with no outgoing edge.
    fn terminal(&self) -> Option<&'g FlowNode> {
        self.nodes
            .iter()
            .rev()
            .find(|node| !self.edges.iter().any(|edge| edge.source == node.id))
    }
}

/// The node whose columns are the statement's output.
fn output_node(scope: Scope<'_>) -> Option<&FlowNode> {
    let sink = scope
        .nodes
        .iter()
        .find(|node| node.kind == NodeKind::Result)
        .or_else(|| {
            // INSERT ... SELECT ends in the written table
            scope.nodes.iter().find(|node| {
                scope
                    .inputs(&node.id)
                    .iter()
                    .any(|edge| edge.clause_type == ClauseType::Insert)
            })
        })?;
    scope.first_input(&sink.id)
}

/// Walks through row-preserving stages to the projection that names the columns.
fn projection_of<'g>(scope: Scope<'g>, node: &'g FlowNode) -> Option<&'g FlowNode> {
    let mut current = node;
    for _ in 0..scope.nodes.len() {
        match current.kind {
            NodeKind::Select | NodeKind::Window => return Some(current),
            NodeKind::Filter | NodeKind::Sort | NodeKind::Limit | NodeKind::Aggregate => {
                current = scope.first_input(&current.id)?;
            }
            _ => return None,
        }
    }
    None
}

/// Output column names of `node`, in order.
fn output_names(scope: Scope<'_>, node: &FlowNode) -> Vec<String> {
    match node.kind {
        NodeKind::Select | NodeKind::Window | NodeKind::Cte | NodeKind::Subquery => node
            .columns
            .iter()
            .filter(|column| !is_wildcard(column))
            .map(|column| column.name.clone())
            .collect(),
        NodeKind::Table | NodeKind::Result => Vec::new(),
        _ => scope
            .first_input(&node.id)
            .filter(|input| input.id != node.id)
            .map(|input| output_names(scope, input))
            .unwrap_or_default(),
    }
}

fn is_wildcard(column: &ColumnInfo) -> bool {
    column.name == "*" || column.name.ends_with(".*")
}

/// Whether a projection passes through columns it does not list.
fn exposes_unlisted(node: &FlowNode) -> bool {
    node.columns.is_empty() || node.columns.iter().any(is_wildcard)
}

fn declares(node: &FlowNode, column: &str) -> bool {
    node.columns
        .iter()
        .any(|info| info.name.eq_ignore_ascii_case(column))
}

fn step(
    node: &FlowNode,
    column: &str,
    transformation: LineageTransformation,
    expression: Option<String>,
) -> LineageStep {
    LineageStep {
        node_id: node.id.clone(),
        node_name: node.label.clone(),
        column_name: column.to_string(),
        transformation,
        expression,
    }
}

struct Tracer<'g> {
    root: &'g [FlowNode],
    max_depth: usize,
    /// Containers currently being traced, to stop at recursive CTE references
    visiting: Vec<String>,
    /// Set when the current column's trace ran past `max_depth` containers
    overflowed: bool,
}

impl<'g> Tracer<'g> {
    /// Drops every path of a column whose trace overflowed, so no partial lineage is kept.
    fn settle(&self, paths: Vec<Path>) -> Vec<Path> {
        if !self.overflowed {
            return paths;
        }
        #[cfg(feature = "tracing")]
        debug!(max_depth = self.max_depth, "lineage dropped: containers nested too deeply");
        Vec::new()
    }

    /// `depth` counts the containers entered so far; plain hops within a scope are free.
    fn trace(
        &mut self,
        scope: Scope<'g>,
        node_id: &str,
        qualifier: Option<&str>,
        column: &str,
        depth: usize,
    ) -> Vec<Path> {
        let Some(node) = scope.node(node_id) else {
            return Vec::new();
        };

        match node.kind {
            NodeKind::Table => {
                if node.table_category == Some(TableCategory::CteReference) {
                    if let Some(cte) = find_cte(self.root, &node.label) {
                        if !self.visiting.contains(&cte.id) {
                            return self.trace_container(cte, column, depth);
                        }
                    }
                }
                vec![vec![step(node, column, LineageTransformation::Source, None)]]
            }
            NodeKind::Cte | NodeKind::Subquery => self.trace_container(node, column, depth),
            NodeKind::Select | NodeKind::Window => {
                match node
                    .columns
                    .iter()
                    .find(|info| info.name.eq_ignore_ascii_case(column))
                {
                    Some(info) => self.trace_projection(scope, node, info, depth),
                    None if exposes_unlisted(node) => {
                        self.trace_first_input(scope, node, qualifier, column, depth)
                    }
                    None => Vec::new(),
                }
            }
            NodeKind::Join => self.trace_join(scope, node, qualifier, column, depth),
            NodeKind::SetOp => self.trace_set_op(scope, node, column, depth),
            _ => self.trace_first_input(scope, node, qualifier, column, depth),
        }
    }

    fn trace_first_input(
        &mut self,
        scope: Scope<'g>,
        node: &FlowNode,
        qualifier: Option<&str>,
        column: &str,
        depth: usize,
    ) -> Vec<Path> {
        match scope.inputs(&node.id).first() {
            Some(edge) => self.trace(scope, &edge.source, qualifier, column, depth),
            None => Vec::new(),
        }
    }

    /// Traces every column `info` reads and records how the projection derives it.
    fn trace_projection(
        &mut self,
        scope: Scope<'g>,
        node: &FlowNode,
        info: &ColumnInfo,
        depth: usize,
    ) -> Vec<Path> {
        let mut paths = Vec::new();
        for reference in &info.references {
            let traced = self.trace_first_input(
                scope,
                node,
                reference.table.as_deref(),
                &reference.column,
                depth,
            );
            for mut path in traced {
                let upstream = path
                    .last()
                    .map(|last| last.column_name.clone())
                    .unwrap_or_default();
                let transformation = match info.transformation_type {
                    TransformationType::Passthrough
                        if info.references.len() == 1
                            && info.name.eq_ignore_ascii_case(&upstream) =>
                    {
                        None
                    }
                    TransformationType::Passthrough => Some(LineageTransformation::Calculated),
                    other => Some(LineageTransformation::from(other)),
                };
                if let Some(transformation) = transformation {
                    path.push(step(
                        node,
                        &info.name,
                        transformation,
                        Some(info.expression.clone()),
                    ));
                }
                paths.push(path);
            }
        }
        paths
    }

    fn trace_join(
        &mut self,
        scope: Scope<'g>,
        node: &FlowNode,
        qualifier: Option<&str>,
        column: &str,
        depth: usize,
    ) -> Vec<Path> {
        let inputs = scope.inputs(&node.id);
        let branch = match qualifier {
            Some(qualifier) => inputs
                .iter()
                .find(|edge| provides(scope, edge, qualifier))
                .copied(),
            // Unqualified: only a branch that visibly declares the column is certain
            None => {
                let declaring: Vec<_> = inputs
                    .iter()
                    .filter(|edge| {
                        scope
                            .node(&edge.source)
                            .is_some_and(|source| declares(source, column))
                    })
                    .collect();
                match declaring.as_slice() {
                    [only] => Some(**only),
                    _ => None,
                }
            }
        };
        let Some(branch) = branch else {
            return Vec::new();
        };

        let mut paths = self.trace(scope, &branch.source, qualifier, column, depth);
        for path in &mut paths {
            path.push(step(node, column, LineageTransformation::Joined, None));
        }
        paths
    }

    fn trace_set_op(
        &mut self,
        scope: Scope<'g>,
        node: &FlowNode,
        column: &str,
        depth: usize,
    ) -> Vec<Path> {
        let inputs = scope.inputs(&node.id);
        let position = inputs
            .first()
            .and_then(|edge| scope.node(&edge.source))
            .and_then(|first| {
                output_names(scope, first)
                    .iter()
                    .position(|name| name.eq_ignore_ascii_case(column))
            });

        let mut paths = Vec::new();
        for edge in inputs {
            let name = match (position, scope.node(&edge.source)) {
                (Some(position), Some(branch)) => output_names(scope, branch)
                    .into_iter()
                    .nth(position)
                    .unwrap_or_else(|| column.to_string()),
                _ => column.to_string(),
            };
            paths.extend(self.trace(scope, &edge.source, None, &name, depth));
        }
        for path in &mut paths {
            path.push(step(node, column, LineageTransformation::Passthrough, None));
        }
        paths
    }

    fn trace_container(
        &mut self,
        container: &'g FlowNode,
        column: &str,
        depth: usize,
    ) -> Vec<Path> {
        if depth >= self.max_depth {
            self.overflowed = true;
            return Vec::new();
        }
        let inner = Scope {
            nodes: &container.children,
            edges: &container.child_edges,
        };
        let Some(terminal) = inner.terminal() else {
            return vec![vec![step(
                container,
                column,
                LineageTransformation::Source,
                None,
            )]];
        };

        self.visiting.push(container.id.clone());
        let mut paths = self.trace(inner, &terminal.id, None, column, depth + 1);
        self.visiting.pop();

        for path in &mut paths {
            path.push(step(container, column, LineageTransformation::Passthrough, None));
        }
        paths
    }
}

/// Whether the relation feeding `edge` is, or contains, the one `qualifier` names.
fn provides(scope: Scope<'_>, edge: &FlowEdge, qualifier: &str) -> bool {
    if edge
        .label
        .as_deref()
        .is_some_and(|label| label.eq_ignore_ascii_case(qualifier))
    {
        return true;
    }
    let Some(source) = scope.node(&edge.source) else {
        return false;
    };
    match source.kind {
        NodeKind::Join => scope
            .inputs(&source.id)
            .iter()
            .any(|inner| provides(scope, inner, qualifier)),
        _ => source.answers_to(qualifier),
    }
}

fn find_cte<'g>(nodes: &'g [FlowNode], name: &str) -> Option<&'g FlowNode> {
    for node in nodes {
        if node.kind == NodeKind::Cte && node.label.eq_ignore_ascii_case(name) {
            return Some(node);
        }
        if let Some(found) = find_cte(&node.children, name) {
            return Some(found);
        }
    }
    None
}
