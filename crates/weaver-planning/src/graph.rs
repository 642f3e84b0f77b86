//! Dependency graph construction
//!
//! Folds a flat task list into a directed graph: parent/child edges from
//! the tree structure, feature-dependency edges from `Depends on:` lines,
//! with adjacency indexes in both directions and a precomputed cycle flag.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use weaver_core::{Task, TaskId};

/// Why an edge exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Parent task must run before its subtask
    ParentChild,
    /// A feature declared a dependency on another feature
    FeatureDependency,
}

/// How binding an edge is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStrength {
    Hard,
    Soft,
}

/// Directed must-precede relationship between two tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: TaskId,
    pub to: TaskId,
    pub kind: EdgeKind,
    pub strength: EdgeStrength,
}

/// Directed graph over tasks
///
/// `node_order` records insertion order; the planner's deterministic
/// tie-breaking iterates it instead of the hash maps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub nodes: HashMap<TaskId, Task>,
    pub node_order: Vec<TaskId>,
    pub edges: Vec<DependencyEdge>,
    /// Successors of each node; every node id is a key
    pub adjacency: HashMap<TaskId, Vec<TaskId>>,
    /// Predecessors of each node; every node id is a key
    pub reverse_adjacency: HashMap<TaskId, Vec<TaskId>>,
    pub has_cycle: bool,
    /// One concrete cycle, first repeated node last, when `has_cycle`
    pub cycle_info: Option<Vec<TaskId>>,
}

impl DependencyGraph {
    pub fn successors(&self, id: &str) -> &[TaskId] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn predecessors(&self, id: &str) -> &[TaskId] {
        self.reverse_adjacency
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Diagnostic counts and shape measures
    ///
    /// `max_depth` is the longest dependency chain (edges, not nodes); it
    /// is reported as 0 for a cyclic graph.
    pub fn stats(&self) -> GraphStats {
        let root_nodes: Vec<TaskId> = self
            .node_order
            .iter()
            .filter(|id| self.predecessors(id).is_empty())
            .cloned()
            .collect();

        let leaf_nodes: Vec<TaskId> = self
            .node_order
            .iter()
            .filter(|id| self.successors(id).is_empty())
            .cloned()
            .collect();

        let max_depth = if self.has_cycle {
            0
        } else {
            let mut memo: HashMap<&TaskId, usize> = HashMap::new();
            self.node_order
                .iter()
                .map(|id| self.chain_depth(id, &mut memo))
                .max()
                .unwrap_or(0)
        };

        GraphStats {
            total_nodes: self.nodes.len(),
            total_edges: self.edges.len(),
            root_nodes,
            leaf_nodes,
            max_depth,
        }
    }

    /// Longest predecessor chain ending at `id`, memoized. Only called on
    /// acyclic graphs.
    fn chain_depth<'a>(&'a self, id: &'a TaskId, memo: &mut HashMap<&'a TaskId, usize>) -> usize {
        if let Some(&depth) = memo.get(id) {
            return depth;
        }

        let depth = self
            .predecessors(id)
            .iter()
            .map(|pred| 1 + self.chain_depth(pred, memo))
            .max()
            .unwrap_or(0);

        memo.insert(id, depth);
        depth
    }
}

/// Statistics about a dependency graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    /// Nodes with no predecessors (can start immediately)
    pub root_nodes: Vec<TaskId>,
    /// Nodes nothing depends on
    pub leaf_nodes: Vec<TaskId>,
    /// Longest dependency chain in edges; 0 for cyclic graphs
    pub max_depth: usize,
}

/// Builds a [`DependencyGraph`] from a flat task list
pub struct DependencyGraphBuilder;

impl DependencyGraphBuilder {
    /// Build the graph. Total: any task list, including an empty one,
    /// produces a graph; unresolved feature dependencies are ignored.
    pub fn build(tasks: &[Task]) -> DependencyGraph {
        let mut graph = DependencyGraph::default();

        for task in tasks {
            graph.node_order.push(task.id.clone());
            graph.adjacency.insert(task.id.clone(), Vec::new());
            graph.reverse_adjacency.insert(task.id.clone(), Vec::new());
            graph.nodes.insert(task.id.clone(), task.clone());
        }

        // Parent before each of its direct subtasks
        for task in tasks {
            for child_id in &task.subtasks {
                if graph.nodes.contains_key(child_id) {
                    push_edge(
                        &mut graph,
                        task.id.clone(),
                        child_id.clone(),
                        EdgeKind::ParentChild,
                        EdgeStrength::Hard,
                    );
                }
            }
        }

        // Feature dependencies resolve between root tasks by feature name
        let roots_by_name: HashMap<&str, &TaskId> = tasks
            .iter()
            .filter(|t| t.is_root())
            .map(|t| (t.name.as_str(), &t.id))
            .collect();

        for task in tasks.iter().filter(|t| t.is_root()) {
            for dep_name in &task.depends_on {
                match roots_by_name.get(dep_name.as_str()) {
                    Some(dep_id) if **dep_id != task.id => {
                        push_edge(
                            &mut graph,
                            (*dep_id).clone(),
                            task.id.clone(),
                            EdgeKind::FeatureDependency,
                            EdgeStrength::Soft,
                        );
                    }
                    Some(_) => {
                        warn!(task = %task.name, "Ignoring self-referential feature dependency");
                    }
                    None => {
                        warn!(
                            task = %task.name,
                            dependency = %dep_name,
                            "Ignoring dependency on unknown feature"
                        );
                    }
                }
            }
        }

        let (has_cycle, cycle_info) = detect_cycle(&graph);
        graph.has_cycle = has_cycle;
        graph.cycle_info = cycle_info;

        if graph.has_cycle {
            warn!(cycle = ?graph.cycle_info, "Dependency graph contains a cycle");
        }
        debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "Dependency graph built"
        );

        graph
    }
}

fn push_edge(
    graph: &mut DependencyGraph,
    from: TaskId,
    to: TaskId,
    kind: EdgeKind,
    strength: EdgeStrength,
) {
    if let Some(successors) = graph.adjacency.get_mut(&from) {
        successors.push(to.clone());
    }
    if let Some(predecessors) = graph.reverse_adjacency.get_mut(&to) {
        predecessors.push(from.clone());
    }
    graph.edges.push(DependencyEdge {
        from,
        to,
        kind,
        strength,
    });
}

/// Three-color depth-first search for a back-edge
///
/// White = unvisited, gray = on the current recursion stack, black = done.
/// Returns the first cycle found as a path whose first and last entries are
/// the repeated node.
fn detect_cycle(graph: &DependencyGraph) -> (bool, Option<Vec<TaskId>>) {
    let mut visited: HashSet<&TaskId> = HashSet::new();
    let mut on_stack: HashSet<&TaskId> = HashSet::new();
    let mut path: Vec<&TaskId> = Vec::new();

    for node in &graph.node_order {
        if !visited.contains(node) {
            if let Some(cycle) = dfs_visit(graph, node, &mut visited, &mut on_stack, &mut path) {
                return (true, Some(cycle.into_iter().cloned().collect()));
            }
        }
    }

    (false, None)
}

fn dfs_visit<'a>(
    graph: &'a DependencyGraph,
    node: &'a TaskId,
    visited: &mut HashSet<&'a TaskId>,
    on_stack: &mut HashSet<&'a TaskId>,
    path: &mut Vec<&'a TaskId>,
) -> Option<Vec<&'a TaskId>> {
    visited.insert(node);
    on_stack.insert(node);
    path.push(node);

    for successor in graph.successors(node) {
        if on_stack.contains(successor) {
            // Back-edge: the cycle runs from the repeated node to here
            let start = path
                .iter()
                .position(|n| *n == successor)
                .unwrap_or(path.len() - 1);
            let mut cycle: Vec<&TaskId> = path[start..].to_vec();
            cycle.push(successor);
            return Some(cycle);
        }

        if !visited.contains(successor) {
            if let Some(cycle) = dfs_visit(graph, successor, visited, on_stack, path) {
                return Some(cycle);
            }
        }
    }

    on_stack.remove(node);
    path.pop();
    None
}
