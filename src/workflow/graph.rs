/// Dependency ordering for workflow graphs
///
/// Builds a petgraph DiGraph from the submitted nodes and edges and computes a
/// Kahn-style topological order. Ties between nodes that become ready at the same
/// time are broken FIFO: initial roots in node-list order, later nodes in the order
/// their last incoming edge is released, so an unchanged graph always yields the
/// same order.

use crate::error::GraphError;
use crate::workflow::types::{Node, WorkflowGraph};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, VecDeque};

/// Validated graph with index lookups in both directions
#[derive(Debug)]
pub struct ExecutionGraph<'a> {
    /// Node weights borrow the caller's nodes; edge weights are positions in the edge list
    graph: DiGraph<&'a Node, usize>,
    node_id_to_index: HashMap<&'a str, NodeIndex>,
}

impl<'a> ExecutionGraph<'a> {
    /// Build the DiGraph, rejecting duplicate ids and edges to unknown nodes
    pub fn build(workflow: &'a WorkflowGraph) -> Result<Self, GraphError> {
        tracing::debug!(
            "🏗️ Building execution graph with {} nodes and {} edges",
            workflow.nodes.len(),
            workflow.edges.len()
        );

        let mut graph = DiGraph::with_capacity(workflow.nodes.len(), workflow.edges.len());
        let mut node_id_to_index = HashMap::with_capacity(workflow.nodes.len());

        for node in &workflow.nodes {
            if node_id_to_index.contains_key(node.id.as_str()) {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
            let index = graph.add_node(node);
            node_id_to_index.insert(node.id.as_str(), index);
        }

        for (position, edge) in workflow.edges.iter().enumerate() {
            let lookup = |id: &str| {
                node_id_to_index.get(id).copied().ok_or_else(|| GraphError::UnknownNode {
                    edge_source: edge.source.clone(),
                    edge_target: edge.target.clone(),
                    missing: id.to_string(),
                })
            };
            let from = lookup(&edge.source)?;
            let to = lookup(&edge.target)?;
            graph.add_edge(from, to, position);
        }

        Ok(Self {
            graph,
            node_id_to_index,
        })
    }

    pub fn node(&self, id: &str) -> Option<&'a Node> {
        self.node_id_to_index.get(id).map(|&index| self.graph[index])
    }

    /// Count of incoming edges per node id; parallel edges count separately
    pub fn in_degrees(&self) -> HashMap<&'a str, usize> {
        self.graph
            .node_indices()
            .map(|index| {
                let degree = self.graph.edges_directed(index, Direction::Incoming).count();
                (self.id_of(index), degree)
            })
            .collect()
    }

    /// Targets of every edge leaving `id`, in edge-list order
    pub fn successors(&self, id: &str) -> Vec<&'a str> {
        let Some(&index) = self.node_id_to_index.get(id) else {
            return Vec::new();
        };
        let mut outgoing: Vec<(usize, NodeIndex)> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .map(|edge| (*edge.weight(), edge.target()))
            .collect();
        outgoing.sort_unstable_by_key(|&(position, _)| position);
        outgoing
            .into_iter()
            .map(|(_, target)| self.id_of(target))
            .collect()
    }

    fn id_of(&self, index: NodeIndex) -> &'a str {
        let node: &'a Node = self.graph[index];
        node.id.as_str()
    }

    /// Kahn's algorithm with a FIFO ready queue
    pub fn execution_order(&self) -> Result<Vec<&'a str>, GraphError> {
        let mut in_degree = self.in_degrees();
        let mut queue: VecDeque<&'a str> = self
            .graph
            .node_indices()
            .map(|index| self.id_of(index))
            .filter(|id| in_degree.get(id) == Some(&0))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(id) = queue.pop_front() {
            order.push(id);
            for target in self.successors(id) {
                if let Some(degree) = in_degree.get_mut(target) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(target);
                    }
                }
            }
        }

        if order.len() < self.graph.node_count() {
            let nodes = self.cyclic_nodes(&order);
            tracing::error!("❌ Workflow contains a cycle among nodes: {:?}", nodes);
            return Err(GraphError::Cycle { nodes });
        }

        Ok(order)
    }

    /// Nodes left unordered, cycle members first, each group in node-list order
    fn cyclic_nodes(&self, ordered: &[&str]) -> Vec<String> {
        let mut on_cycle: Vec<NodeIndex> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&index| self.graph.contains_edge(index, index))
            })
            .flatten()
            .collect();
        on_cycle.sort_unstable();

        let mut blocked: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|index| {
                !on_cycle.contains(index) && !ordered.contains(&self.id_of(*index))
            })
            .collect();
        blocked.sort_unstable();

        on_cycle
            .into_iter()
            .chain(blocked)
            .map(|index| self.id_of(index).to_string())
            .collect()
    }
}

/// Compute a dependency-respecting execution order for a whole graph
pub fn execution_order(workflow: &WorkflowGraph) -> Result<Vec<String>, GraphError> {
    let graph = ExecutionGraph::build(workflow)?;
    Ok(graph.execution_order()?.into_iter().map(str::to_string).collect())
}
