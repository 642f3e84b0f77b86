//! # weaver-core
//!
//! Core types for the Weaver planning system.
//!
//! Weaver is the planning half of a multi-agent software-development
//! orchestrator: it turns a product requirements document into a
//! dependency-ordered, parallelizable execution plan that agent teams
//! execute. This crate holds the vocabulary shared by every stage of that
//! pipeline.
//!
//! ## Core Paradigm
//!
//! - Tasks are the unit of work; agent teams are the unit of execution
//! - Dependencies are explicit edges, never implicit ordering
//! - Plans are immutable snapshots - every pipeline run produces fresh ones

mod config;
mod error;
mod ids;
mod types;

pub use config::{PlannerConfig, PlannerConfigOverrides};
pub use error::{Result, WeaverError};
pub use ids::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use types::{AgentType, ComplexityLevel, Task, TaskId, TaskPriority};
