//! Execution planning
//!
//! Orders a [`DependencyGraph`] topologically and partitions it into
//! phases that maximize parallelism. Phases are a synchronization barrier
//! for the external executor: everything in phase `k` completes before
//! phase `k + 1` starts; tasks inside a phase are free to run concurrently.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, BTreeMap, HashMap};
use tracing::{debug, info};
use weaver_core::{AgentType, PlannerConfig, Result, Task, TaskId, WeaverError};

use crate::graph::DependencyGraph;

/// One synchronization window of the plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPhase {
    /// 1-based, contiguous
    pub phase_number: u32,
    pub tasks: Vec<Task>,
    pub can_parallelize: bool,
}

/// Phased, dependency-correct execution plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub phases: Vec<ExecutionPhase>,
    pub total_tasks: usize,
    /// Wall-clock estimate: phases run sequentially, tasks in a phase run
    /// in parallel, so each phase contributes its slowest task
    pub estimated_duration: f64,
    /// Total effort divided by estimated duration; 1 when nothing runs
    pub parallelization_factor: f64,
}

impl ExecutionPlan {
    /// Aggregate counts for reporting
    pub fn summary(&self) -> PlanSummary {
        let mut by_agent: HashMap<AgentType, usize> = HashMap::new();
        for phase in &self.phases {
            for task in &phase.tasks {
                *by_agent.entry(task.agent_type).or_default() += 1;
            }
        }
        let mut tasks_by_agent: Vec<(AgentType, usize)> = by_agent.into_iter().collect();
        tasks_by_agent.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.to_string().cmp(&b.0.to_string())));

        PlanSummary {
            total_tasks: self.total_tasks,
            total_phases: self.phases.len(),
            parallel_phases: self.phases.iter().filter(|p| p.can_parallelize).count(),
            estimated_duration: self.estimated_duration,
            parallelization_factor: self.parallelization_factor,
            tasks_by_agent,
        }
    }
}

/// Summary of a plan for reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummary {
    pub total_tasks: usize,
    pub total_phases: usize,
    pub parallel_phases: usize,
    pub estimated_duration: f64,
    pub parallelization_factor: f64,
    pub tasks_by_agent: Vec<(AgentType, usize)>,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Plan: {} tasks across {} phases ({} parallel)",
            self.total_tasks, self.total_phases, self.parallel_phases
        )?;
        writeln!(f, "  Estimated duration: {:.1}", self.estimated_duration)?;
        writeln!(
            f,
            "  Parallelization factor: {:.2}",
            self.parallelization_factor
        )?;
        if !self.tasks_by_agent.is_empty() {
            writeln!(f, "  Tasks by team:")?;
            for (agent, count) in &self.tasks_by_agent {
                writeln!(f, "    {}: {}", agent, count)?;
            }
        }
        Ok(())
    }
}

/// Produces execution orders and phased plans from a dependency graph
pub struct ExecutionPlanner {
    config: PlannerConfig,
}

impl ExecutionPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Deterministic topological ordering of all tasks
    ///
    /// Fails with [`WeaverError::CycleDetected`] when the graph has a
    /// cycle; check `graph.has_cycle` first to pre-empt the error path.
    pub fn execution_order(&self, graph: &DependencyGraph) -> Result<Vec<Task>> {
        ensure_acyclic(graph)?;

        let order = kahn_order(graph);
        debug!(tasks = order.len(), "Computed execution order");

        Ok(order
            .iter()
            .filter_map(|id| graph.nodes.get(id))
            .cloned()
            .collect())
    }

    /// Partition the graph into maximally parallel phases
    ///
    /// Each node's phase is its longest path from a source. Same cyclic
    /// precondition as [`execution_order`](Self::execution_order).
    pub fn create_plan(&self, graph: &DependencyGraph) -> Result<ExecutionPlan> {
        ensure_acyclic(graph)?;

        // Longest-path level per node, over a topological order
        let mut levels: HashMap<&TaskId, u32> = HashMap::new();
        for id in &kahn_order(graph) {
            let level = graph
                .predecessors(id)
                .iter()
                .filter_map(|pred| levels.get(pred))
                .max()
                .copied()
                .unwrap_or(0)
                + 1;
            // Key by the graph-owned id so the map outlives this loop
            if let Some((key, _)) = graph.nodes.get_key_value(id) {
                levels.insert(key, level);
            }
        }

        // Group by level; iterating node_order keeps the insertion-order
        // tie-break inside each group
        let mut grouped: BTreeMap<u32, Vec<&TaskId>> = BTreeMap::new();
        for id in &graph.node_order {
            if let Some(level) = levels.get(id) {
                grouped.entry(*level).or_default().push(id);
            }
        }

        let phases: Vec<ExecutionPhase> = if self.config.enable_parallelization {
            grouped
                .values()
                .enumerate()
                .map(|(i, ids)| ExecutionPhase {
                    phase_number: (i + 1) as u32,
                    tasks: resolve_tasks(graph, ids),
                    can_parallelize: ids.len() > 1,
                })
                .collect()
        } else {
            grouped
                .values()
                .flatten()
                .copied()
                .enumerate()
                .map(|(i, id)| ExecutionPhase {
                    phase_number: (i + 1) as u32,
                    tasks: resolve_tasks(graph, &[id]),
                    can_parallelize: false,
                })
                .collect()
        };

        let estimated_duration: f64 = phases
            .iter()
            .map(|phase| {
                phase
                    .tasks
                    .iter()
                    .map(|t| t.estimated_effort)
                    .fold(0.0, f64::max)
            })
            .sum();

        let total_effort: f64 = phases
            .iter()
            .flat_map(|p| &p.tasks)
            .map(|t| t.estimated_effort)
            .sum();

        let parallelization_factor = if estimated_duration > 0.0 {
            (total_effort / estimated_duration).max(1.0)
        } else {
            1.0
        };

        let plan = ExecutionPlan {
            total_tasks: graph.nodes.len(),
            estimated_duration,
            parallelization_factor,
            phases,
        };

        info!(
            total_tasks = plan.total_tasks,
            phases = plan.phases.len(),
            duration = plan.estimated_duration,
            factor = plan.parallelization_factor,
            "Execution plan created"
        );

        Ok(plan)
    }

    /// Sum of estimated effort over a task list; 0 for an empty list
    pub fn estimate_effort(tasks: &[Task]) -> f64 {
        tasks.iter().map(|t| t.estimated_effort).sum()
    }
}

fn ensure_acyclic(graph: &DependencyGraph) -> Result<()> {
    if graph.has_cycle {
        return Err(WeaverError::CycleDetected {
            cycle: graph.cycle_info.clone().unwrap_or_default(),
        });
    }
    Ok(())
}

/// Kahn's algorithm with the ready set ordered by node insertion index
fn kahn_order(graph: &DependencyGraph) -> Vec<TaskId> {
    let index: HashMap<&TaskId, usize> = graph
        .node_order
        .iter()
        .enumerate()
        .map(|(i, id)| (id, i))
        .collect();

    let mut in_degree: HashMap<&TaskId, usize> = graph
        .node_order
        .iter()
        .map(|id| (id, graph.predecessors(id).len()))
        .collect();

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .filter_map(|(id, _)| index.get(*id).map(|i| Reverse(*i)))
        .collect();

    let mut order: Vec<TaskId> = Vec::with_capacity(graph.node_order.len());

    while let Some(Reverse(i)) = ready.pop() {
        let id = &graph.node_order[i];
        order.push(id.clone());

        for successor in graph.successors(id) {
            if let Some(degree) = in_degree.get_mut(successor) {
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    if let Some(succ_index) = index.get(successor) {
                        ready.push(Reverse(*succ_index));
                    }
                }
            }
        }
    }

    order
}

fn resolve_tasks(graph: &DependencyGraph, ids: &[&TaskId]) -> Vec<Task> {
    ids.iter()
        .filter_map(|id| graph.nodes.get(*id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DependencyGraphBuilder;
    use weaver_core::Task;

    fn task(id: &str, name: &str, effort: f64, deps: &[&str]) -> Task {
        Task::new(id, name)
            .with_effort(effort)
            .with_depends_on(deps.iter().map(|s| s.to_string()).collect())
    }

    fn diamond_graph() -> DependencyGraph {
        DependencyGraphBuilder::build(&[
            task("a", "Base", 2.0, &[]),
            task("b", "Left", 5.0, &["Base"]),
            task("c", "Right", 3.0, &["Base"]),
            task("d", "Join", 1.0, &["Left", "Right"]),
        ])
    }

    fn cyclic_graph() -> DependencyGraph {
        DependencyGraphBuilder::build(&[
            task("a", "A", 1.0, &["B"]),
            task("b", "B", 1.0, &["A"]),
        ])
    }

    fn planner() -> ExecutionPlanner {
        ExecutionPlanner::new(PlannerConfig::default())
    }

    #[test]
    fn test_execution_order_respects_edges() {
        let graph = diamond_graph();
        let order = planner().execution_order(&graph).unwrap();

        assert_eq!(order.len(), 4);
        let position = |id: &str| order.iter().position(|t| t.id == id).unwrap();
        for edge in &graph.edges {
            assert!(
                position(&edge.from) < position(&edge.to),
                "edge {} -> {} violated",
                edge.from,
                edge.to
            );
        }
    }

    #[test]
    fn test_execution_order_is_deterministic() {
        let graph = diamond_graph();
        let planner = planner();
        let first: Vec<TaskId> = planner
            .execution_order(&graph)
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        let second: Vec<TaskId> = planner
            .execution_order(&graph)
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_independent_nodes_keep_insertion_order() {
        let graph = DependencyGraphBuilder::build(&[
            task("z", "Z", 1.0, &[]),
            task("m", "M", 1.0, &[]),
            task("a", "A", 1.0, &[]),
        ]);
        let order = planner().execution_order(&graph).unwrap();
        let ids: Vec<&str> = order.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["z", "m", "a"]);
    }

    #[test]
    fn test_cycle_fails_both_contracts() {
        let graph = cyclic_graph();
        let planner = planner();

        let err = planner.execution_order(&graph).unwrap_err();
        assert!(matches!(err, WeaverError::CycleDetected { .. }));

        let err = planner.create_plan(&graph).unwrap_err();
        match err {
            WeaverError::CycleDetected { cycle } => {
                assert!(!cycle.is_empty());
                assert_eq!(cycle.first(), cycle.last());
            }
            other => panic!("expected CycleDetected, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_partitions_all_tasks() {
        let graph = diamond_graph();
        let plan = planner().create_plan(&graph).unwrap();

        let phase_task_count: usize = plan.phases.iter().map(|p| p.tasks.len()).sum();
        assert_eq!(phase_task_count, graph.nodes.len());
        assert_eq!(plan.total_tasks, 4);

        // Phase numbers are exactly 1..N
        let numbers: Vec<u32> = plan.phases.iter().map(|p| p.phase_number).collect();
        assert_eq!(numbers, (1..=plan.phases.len() as u32).collect::<Vec<_>>());
    }

    #[test]
    fn test_plan_respects_edge_phases() {
        let graph = diamond_graph();
        let plan = planner().create_plan(&graph).unwrap();

        let phase_of = |id: &str| {
            plan.phases
                .iter()
                .find(|p| p.tasks.iter().any(|t| t.id == id))
                .map(|p| p.phase_number)
                .unwrap()
        };

        for edge in &graph.edges {
            assert!(phase_of(&edge.from) < phase_of(&edge.to));
        }
    }

    #[test]
    fn test_duration_is_sum_of_phase_maxima() {
        // Phase 1: a (2.0); phase 2: b (5.0), c (3.0); phase 3: d (1.0)
        let graph = diamond_graph();
        let plan = planner().create_plan(&graph).unwrap();

        assert_eq!(plan.phases.len(), 3);
        assert!(plan.phases[1].can_parallelize);
        assert!((plan.estimated_duration - 8.0).abs() < 1e-9);

        // Total effort 11.0 over duration 8.0
        assert!((plan.parallelization_factor - 11.0 / 8.0).abs() < 1e-9);
        assert!(plan.parallelization_factor >= 1.0);
    }

    #[test]
    fn test_parallelization_disabled_forces_singleton_phases() {
        let config = PlannerConfig {
            enable_parallelization: false,
            ..Default::default()
        };
        let graph = diamond_graph();
        let plan = ExecutionPlanner::new(config).create_plan(&graph).unwrap();

        assert_eq!(plan.phases.len(), 4);
        for phase in &plan.phases {
            assert_eq!(phase.tasks.len(), 1);
            assert!(!phase.can_parallelize);
        }
        // Serial execution: duration equals total effort
        assert!((plan.estimated_duration - 11.0).abs() < 1e-9);
        assert!((plan.parallelization_factor - 1.0).abs() < 1e-9);

        // Dependency order still holds across singleton phases
        let phase_of = |id: &str| {
            plan.phases
                .iter()
                .find(|p| p.tasks.iter().any(|t| t.id == id))
                .map(|p| p.phase_number)
                .unwrap()
        };
        for edge in &graph.edges {
            assert!(phase_of(&edge.from) < phase_of(&edge.to));
        }
    }

    #[test]
    fn test_empty_graph_plan() {
        let graph = DependencyGraphBuilder::build(&[]);
        let plan = planner().create_plan(&graph).unwrap();

        assert!(plan.phases.is_empty());
        assert_eq!(plan.total_tasks, 0);
        assert_eq!(plan.estimated_duration, 0.0);
        assert_eq!(plan.parallelization_factor, 1.0);
    }

    #[test]
    fn test_estimate_effort() {
        assert_eq!(ExecutionPlanner::estimate_effort(&[]), 0.0);

        let tasks = vec![
            task("a", "A", 2.5, &[]),
            task("b", "B", 1.5, &[]),
        ];
        assert!((ExecutionPlanner::estimate_effort(&tasks) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_counts() {
        let graph = diamond_graph();
        let plan = planner().create_plan(&graph).unwrap();
        let summary = plan.summary();

        assert_eq!(summary.total_tasks, 4);
        assert_eq!(summary.total_phases, 3);
        assert_eq!(summary.parallel_phases, 1);
        let rendered = summary.to_string();
        assert!(rendered.contains("4 tasks across 3 phases"));
    }
}
