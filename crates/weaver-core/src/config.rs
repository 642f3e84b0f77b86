//! Planner configuration
//!
//! A fully populated [`PlannerConfig`] drives decomposition and planning.
//! Callers that only want to tweak a field or two build a
//! [`PlannerConfigOverrides`] and merge it onto the defaults with
//! [`PlannerConfig::with_overrides`] - downstream code never sees a
//! partially specified configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::ComplexityLevel;
use crate::{Result, WeaverError};

/// Configuration for task decomposition and execution planning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Maximum depth of the task tree, feature roots at depth 1
    #[serde(default = "default_max_task_depth")]
    pub max_task_depth: usize,

    /// Signal level a feature must exceed before it is split into subtasks
    #[serde(default = "default_min_task_granularity")]
    pub min_task_granularity: usize,

    /// Maximum subtasks created per tree level
    #[serde(default = "default_max_task_granularity")]
    pub max_task_granularity: usize,

    /// When false, every execution phase holds at most one task
    #[serde(default = "default_enable_parallelization")]
    pub enable_parallelization: bool,

    /// Complexity assigned when no signal supports an estimate
    #[serde(default)]
    pub default_complexity: ComplexityLevel,

    /// Effort multiplier per complexity level; must cover all five levels
    /// with positive values
    #[serde(default = "default_complexity_weights")]
    pub complexity_weights: HashMap<ComplexityLevel, f64>,

    /// Base effort unit the complexity weight is multiplied by
    #[serde(default = "default_effort_base_unit")]
    pub effort_base_unit: f64,
}

// Default value providers
fn default_max_task_depth() -> usize {
    5
}

fn default_min_task_granularity() -> usize {
    1
}

fn default_max_task_granularity() -> usize {
    16
}

fn default_enable_parallelization() -> bool {
    true
}

fn default_complexity_weights() -> HashMap<ComplexityLevel, f64> {
    HashMap::from([
        (ComplexityLevel::Trivial, 1.0),
        (ComplexityLevel::Low, 2.0),
        (ComplexityLevel::Medium, 4.0),
        (ComplexityLevel::High, 8.0),
        (ComplexityLevel::VeryHigh, 16.0),
    ])
}

fn default_effort_base_unit() -> f64 {
    1.0
}

impl PlannerConfig {
    /// Merge overrides onto the default configuration
    pub fn with_overrides(overrides: PlannerConfigOverrides) -> Self {
        let mut config = Self::default();

        if let Some(v) = overrides.max_task_depth {
            config.max_task_depth = v;
        }
        if let Some(v) = overrides.min_task_granularity {
            config.min_task_granularity = v;
        }
        if let Some(v) = overrides.max_task_granularity {
            config.max_task_granularity = v;
        }
        if let Some(v) = overrides.enable_parallelization {
            config.enable_parallelization = v;
        }
        if let Some(v) = overrides.default_complexity {
            config.default_complexity = v;
        }
        if let Some(v) = overrides.complexity_weights {
            config.complexity_weights = v;
        }
        if let Some(v) = overrides.effort_base_unit {
            config.effort_base_unit = v;
        }

        config
    }

    /// Check the configuration is usable for decomposition
    ///
    /// `complexity_weights` must map every [`ComplexityLevel`] to a positive
    /// multiplier and `effort_base_unit` must be positive.
    pub fn validate(&self) -> Result<()> {
        for level in ComplexityLevel::ALL {
            match self.complexity_weights.get(&level) {
                None => {
                    return Err(WeaverError::Configuration(format!(
                        "complexity_weights is missing level '{}'",
                        level
                    )));
                }
                Some(w) if *w <= 0.0 => {
                    return Err(WeaverError::Configuration(format!(
                        "complexity weight for '{}' must be positive, got {}",
                        level, w
                    )));
                }
                Some(_) => {}
            }
        }

        if self.effort_base_unit <= 0.0 {
            return Err(WeaverError::Configuration(format!(
                "effort_base_unit must be positive, got {}",
                self.effort_base_unit
            )));
        }

        if self.max_task_depth == 0 {
            return Err(WeaverError::Configuration(
                "max_task_depth must be at least 1".to_string(),
            ));
        }

        if self.max_task_granularity == 0 {
            return Err(WeaverError::Configuration(
                "max_task_granularity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Effort multiplier for a complexity level
    ///
    /// Only valid on a validated configuration; falls back to the Medium
    /// weight if the map was mutated after validation.
    pub fn weight_for(&self, level: ComplexityLevel) -> f64 {
        self.complexity_weights
            .get(&level)
            .or_else(|| self.complexity_weights.get(&ComplexityLevel::Medium))
            .copied()
            .unwrap_or(1.0)
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_task_depth: default_max_task_depth(),
            min_task_granularity: default_min_task_granularity(),
            max_task_granularity: default_max_task_granularity(),
            enable_parallelization: default_enable_parallelization(),
            default_complexity: ComplexityLevel::default(),
            complexity_weights: default_complexity_weights(),
            effort_base_unit: default_effort_base_unit(),
        }
    }
}

/// Partial configuration for callers that only set some fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerConfigOverrides {
    pub max_task_depth: Option<usize>,
    pub min_task_granularity: Option<usize>,
    pub max_task_granularity: Option<usize>,
    pub enable_parallelization: Option<bool>,
    pub default_complexity: Option<ComplexityLevel>,
    pub complexity_weights: Option<HashMap<ComplexityLevel, f64>>,
    pub effort_base_unit: Option<f64>,
}
