use super::context::ParseContext;
use crate::types::{ClauseType, FlowEdge, FlowNode};

/// A relation as seen by its consumer: the node rows come from plus an optional edge label.
///
/// A CTE consumed in its own scope has no node of its own; the consumer connects to the
/// CTE container directly and the edge carries the alias it was referenced by.
#[derive(Debug, Clone)]
pub(crate) struct Relation {
    pub(crate) node_id: String,
    pub(crate) edge_label: Option<String>,
}

impl Relation {
    pub(crate) fn node(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            edge_label: None,
        }
    }
}

/// Nodes and edges of one graph scope (the top level or one container's body).
#[derive(Debug)]
pub(crate) struct GraphBuilder {
    pub(crate) scope_id: usize,
    nodes: Vec<FlowNode>,
    edges: Vec<FlowEdge>,
}

impl GraphBuilder {
    pub(crate) fn new(scope_id: usize) -> Self {
        Self {
            scope_id,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub(crate) fn add_node(&mut self, node: FlowNode) -> String {
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    /// Connects two nodes already in this scope and returns the edge for decoration.
    pub(crate) fn connect(
        &mut self,
        ctx: &mut ParseContext,
        from: &Relation,
        target: &str,
        clause_type: ClauseType,
    ) -> &mut FlowEdge {
        debug_assert!(self.contains(&from.node_id), "edge source must exist");
        debug_assert!(self.contains(target), "edge target must exist");
        self.edges.push(FlowEdge {
            id: ctx.next_id("edge"),
            source: from.node_id.clone(),
            target: target.to_string(),
            label: from.edge_label.clone(),
            sql_clause: None,
            clause_type,
            line_range: None,
        });
        let last = self.edges.len() - 1;
        &mut self.edges[last]
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|node| node.id == id)
    }

    pub(crate) fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut FlowNode> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    pub(crate) fn into_parts(self) -> (Vec<FlowNode>, Vec<FlowEdge>) {
        (self.nodes, self.edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnalysisOptions, Dialect, NodeKind};

    #[test]
    fn test_connect_labels_edge_from_relation() {
        let mut ctx = ParseContext::new(Dialect::Generic, &AnalysisOptions::default(), "", 1);
        let mut graph = GraphBuilder::new(ctx.next_scope());
        let cte = graph.add_node(FlowNode::new(ctx.node_id(NodeKind::Cte), NodeKind::Cte, "recent"));
        let select = graph.add_node(FlowNode::new(ctx.node_id(NodeKind::Select), NodeKind::Select, "SELECT"));
        let relation = Relation {
            node_id: cte.clone(),
            edge_label: Some("r".to_string()),
        };
        graph
            .connect(&mut ctx, &relation, &select, ClauseType::From)
            .sql_clause = Some("recent AS r".to_string());

        let (nodes, edges) = graph.into_parts();
        assert_eq!(nodes.len(), 2);
        assert_eq!(edges[0].source, cte);
        assert_eq!(edges[0].target, select);
        assert_eq!(edges[0].label.as_deref(), Some("r"));
        assert_eq!(edges[0].id, "edge_3");
    }
}
