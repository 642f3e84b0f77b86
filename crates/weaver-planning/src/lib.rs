//! Weaver Planning - PRD-driven execution planning
//!
//! This crate turns a raw Product Requirements Document into a phased,
//! dependency-correct execution plan for agent teams. The pipeline has four
//! stages, each a pure transformation of the previous stage's output:
//!
//! 1. [`PrdAnalyzer`] - raw PRD text to a structured [`PrdAnalysis`]
//! 2. [`TaskDecomposer`] - analysis to a hierarchical [`TaskTree`]
//! 3. [`DependencyGraphBuilder`] - tasks to a [`DependencyGraph`]
//! 4. [`ExecutionPlanner`] - graph to an ordered, phased [`ExecutionPlan`]
//!
//! Malformed input degrades gracefully; the only failure the pipeline can
//! raise is a dependency cycle, surfaced by the planner stage.

pub mod analyzer;
pub mod decomposer;
pub mod graph;
pub mod planner;
pub mod prd;
pub mod templates;

pub use analyzer::{Heuristics, PrdAnalyzer};
pub use decomposer::{TaskDecomposer, TaskTree};
pub use graph::{
    DependencyEdge, DependencyGraph, DependencyGraphBuilder, EdgeKind, EdgeStrength, GraphStats,
};
pub use planner::{ExecutionPhase, ExecutionPlan, ExecutionPlanner, PlanSummary};
pub use prd::{AnalysisMetadata, Feature, PrdAnalysis};
pub use templates::{example_prd_text, minimal_prd_text};
