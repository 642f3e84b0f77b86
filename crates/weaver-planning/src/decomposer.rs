//! Task decomposition
//!
//! Converts a [`PrdAnalysis`] into a [`TaskTree`]: one root task per
//! feature, recursively split into subtasks while the configured depth and
//! granularity allow.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use weaver_core::{
    AgentType, ComplexityLevel, IdGenerator, PlannerConfig, Result, Task, TaskId, TaskPriority,
    UuidIdGenerator,
};

use crate::prd::{Feature, PrdAnalysis};

/// Keyword table for routing work to agent teams. The type with the most
/// keyword hits wins; earlier entries win ties.
const AGENT_KEYWORDS: &[(AgentType, &[&str])] = &[
    (
        AgentType::Security,
        &[
            "security", "auth", "login", "encrypt", "permission", "oauth", "token", "vulnerab",
        ],
    ),
    (
        AgentType::Frontend,
        &[
            "ui", "frontend", "page", "screen", "component", "render", "display", "form", "css",
            "responsive",
        ],
    ),
    (
        AgentType::Database,
        &[
            "database", "schema", "migration", "sql", "persist", "storage", "cache", "index",
        ],
    ),
    (
        AgentType::Backend,
        &[
            "api", "endpoint", "server", "service", "backend", "queue", "webhook", "integration",
        ],
    ),
    (
        AgentType::Devops,
        &[
            "deploy", "docker", "pipeline", "infrastructure", "kubernetes", "monitoring",
            "provision",
        ],
    ),
    (AgentType::Qa, &["test", "qa", "verify", "regression", "coverage"]),
    (AgentType::Docs, &["document", "readme", "guide", "tutorial", "changelog"]),
    (
        AgentType::Research,
        &["research", "investigate", "evaluate", "prototype", "spike", "benchmark"],
    ),
];

/// Infer the agent team for a piece of work from its text
pub fn infer_agent_type(text: &str) -> AgentType {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric() && c != '/')
        .filter(|w| !w.is_empty())
        .collect();

    let mut best = AgentType::General;
    let mut best_hits = 0usize;

    for (agent_type, keywords) in AGENT_KEYWORDS {
        let hits = keywords
            .iter()
            .filter(|k| {
                if k.contains(' ') {
                    lower.contains(**k)
                } else {
                    words.iter().any(|w| w.starts_with(**k))
                }
            })
            .count();
        if hits > best_hits {
            best = *agent_type;
            best_hits = hits;
        }
    }

    best
}

/// Hierarchical decomposition of one analysis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskTree {
    /// Feature root task ids, in feature order
    pub root_tasks: Vec<TaskId>,
    pub all_tasks: HashMap<TaskId, Task>,
    /// Creation order of every task; downstream stages iterate this for
    /// deterministic output
    pub task_order: Vec<TaskId>,
    /// Feature index to the ids of its root task and all descendants
    pub feature_to_tasks: HashMap<usize, Vec<TaskId>>,
    pub total_estimated_effort: f64,
}

impl TaskTree {
    pub fn len(&self) -> usize {
        self.all_tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_tasks.is_empty()
    }

    /// All tasks cloned out in creation order
    pub fn tasks_in_order(&self) -> Vec<Task> {
        self.task_order
            .iter()
            .filter_map(|id| self.all_tasks.get(id))
            .cloned()
            .collect()
    }

    fn insert(&mut self, task: Task) {
        self.task_order.push(task.id.clone());
        self.all_tasks.insert(task.id.clone(), task);
    }
}

/// A unit of work queued for subtask expansion
struct WorkItem {
    name: String,
    description: String,
    agent_hint: Option<AgentType>,
}

/// Converts a [`PrdAnalysis`] into a [`TaskTree`]
///
/// Construction validates the configuration (every complexity level needs a
/// positive weight); [`decompose`](Self::decompose) itself never fails.
pub struct TaskDecomposer {
    config: PlannerConfig,
    ids: Arc<dyn IdGenerator>,
}

impl std::fmt::Debug for TaskDecomposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskDecomposer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TaskDecomposer {
    pub fn new(config: PlannerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ids: Arc::new(UuidIdGenerator::new()),
        })
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Decompose an analysis into a task tree
    ///
    /// Pure function of the analysis and this decomposer's configuration,
    /// apart from id generation. Ids stay unique across repeated calls on
    /// the same decomposer.
    pub fn decompose(&self, analysis: &PrdAnalysis) -> TaskTree {
        let mut tree = TaskTree::default();

        for (index, feature) in analysis.features.iter().enumerate() {
            let before = tree.task_order.len();
            let root_id = self.build_feature_tasks(feature, &mut tree);
            tree.root_tasks.push(root_id);
            tree.feature_to_tasks
                .insert(index, tree.task_order[before..].to_vec());
        }

        tree.total_estimated_effort = tree.all_tasks.values().map(|t| t.estimated_effort).sum();

        info!(
            features = analysis.features.len(),
            tasks = tree.len(),
            total_effort = tree.total_estimated_effort,
            "Decomposition complete"
        );

        tree
    }

    fn build_feature_tasks(&self, feature: &Feature, tree: &mut TaskTree) -> TaskId {
        let root_id = self.ids.next_id("task");
        let agent_type = infer_agent_type(&feature.combined_text());

        let root = Task::new(&root_id, &feature.name)
            .with_description(feature_description(feature))
            .with_agent_type(agent_type)
            .with_priority(feature.priority)
            .with_complexity(feature.estimated_complexity)
            .with_effort(self.effort_for(feature.estimated_complexity))
            .with_depends_on(feature.depends_on.clone());

        debug!(task_id = %root_id, feature = %feature.name, %agent_type, "Created root task");

        // Combined signal: list items plus the complexity estimate. Only
        // features that exceed the granularity floor get split.
        let signal = feature.signal_count() + feature.estimated_complexity.rank() as usize;
        if feature.signal_count() == 0 || signal <= self.config.min_task_granularity {
            tree.insert(root);
            return root_id;
        }

        let items = work_items(feature);
        tree.insert(root);
        self.expand(
            &root_id,
            feature.estimated_complexity,
            feature.priority,
            agent_type,
            items,
            1,
            tree,
        );

        root_id
    }

    /// Create children of `parent_id` for `items`, splitting oversized item
    /// lists into grouped subtrees until depth or granularity caps apply
    #[allow(clippy::too_many_arguments)]
    fn expand(
        &self,
        parent_id: &TaskId,
        parent_complexity: ComplexityLevel,
        priority: TaskPriority,
        fallback_agent: AgentType,
        items: Vec<WorkItem>,
        parent_depth: usize,
        tree: &mut TaskTree,
    ) {
        if parent_depth >= self.config.max_task_depth || items.is_empty() {
            return;
        }

        let complexity = parent_complexity.reduced();

        if items.len() <= self.config.max_task_granularity {
            for item in items {
                let id = self.ids.next_id("task");
                let agent_type = item.agent_hint.unwrap_or_else(|| {
                    let inferred = infer_agent_type(&item.description);
                    if inferred == AgentType::General {
                        fallback_agent
                    } else {
                        inferred
                    }
                });

                let task = Task::new(&id, item.name)
                    .with_description(item.description)
                    .with_agent_type(agent_type)
                    .with_parent(parent_id.clone())
                    .with_priority(priority)
                    .with_complexity(complexity)
                    .with_effort(self.effort_for(complexity));

                tree.insert(task);
                link_child(tree, parent_id, &id);
            }
            return;
        }

        // Too many items for one level: partition into at most
        // max_task_granularity groups and push each group one level down.
        let chunk_size = items.len().div_ceil(self.config.max_task_granularity);
        let parent_name = tree
            .all_tasks
            .get(parent_id)
            .map(|t| t.name.clone())
            .unwrap_or_default();

        let mut remaining = items;
        let mut part = 1;
        while !remaining.is_empty() {
            let rest = remaining.split_off(remaining.len().min(chunk_size));
            let group = std::mem::replace(&mut remaining, rest);

            let id = self.ids.next_id("task");
            let task = Task::new(&id, format!("{} (part {})", parent_name, part))
                .with_description(format!(
                    "Grouped work for {}: {} items",
                    parent_name,
                    group.len()
                ))
                .with_agent_type(fallback_agent)
                .with_parent(parent_id.clone())
                .with_priority(priority)
                .with_complexity(complexity)
                .with_effort(self.effort_for(complexity));

            tree.insert(task);
            link_child(tree, parent_id, &id);

            self.expand(
                &id,
                complexity,
                priority,
                fallback_agent,
                group,
                parent_depth + 1,
                tree,
            );
            part += 1;
        }
    }

    fn effort_for(&self, complexity: ComplexityLevel) -> f64 {
        self.config.weight_for(complexity) * self.config.effort_base_unit
    }
}

fn link_child(tree: &mut TaskTree, parent_id: &TaskId, child_id: &TaskId) {
    if let Some(parent) = tree.all_tasks.get_mut(parent_id) {
        parent.subtasks.push(child_id.clone());
    }
}

fn feature_description(feature: &Feature) -> String {
    let mut description = String::new();

    if !feature.requirements.is_empty() {
        description.push_str("Requirements:\n");
        for req in &feature.requirements {
            description.push_str(&format!("- {}\n", req));
        }
    }

    if !feature.acceptance_criteria.is_empty() {
        description.push_str("\nAcceptance Criteria:\n");
        for criterion in &feature.acceptance_criteria {
            description.push_str(&format!("- [ ] {}\n", criterion));
        }
    }

    if let Some(notes) = &feature.technical_notes {
        description.push_str(&format!("\nTechnical Notes:\n{}\n", notes));
    }

    if description.is_empty() {
        description = format!("Implement the {} feature", feature.name);
    }

    description
}

/// One work item per requirement, plus one verification item covering the
/// acceptance-criteria group
fn work_items(feature: &Feature) -> Vec<WorkItem> {
    let mut items: Vec<WorkItem> = feature
        .requirements
        .iter()
        .map(|req| WorkItem {
            name: short_name(req),
            description: req.clone(),
            agent_hint: None,
        })
        .collect();

    if !feature.acceptance_criteria.is_empty() {
        let criteria = feature
            .acceptance_criteria
            .iter()
            .map(|c| format!("- [ ] {}", c))
            .collect::<Vec<_>>()
            .join("\n");
        items.push(WorkItem {
            name: format!("Verify acceptance criteria: {}", feature.name),
            description: format!("Verify all acceptance criteria hold:\n{}", criteria),
            agent_hint: Some(AgentType::Qa),
        });
    }

    items
}

/// Clip an item's text to a task-name length
fn short_name(text: &str) -> String {
    const MAX: usize = 60;
    if text.chars().count() <= MAX {
        return text.to_string();
    }
    let clipped: String = text.chars().take(MAX).collect();
    format!("{}...", clipped.trim_end())
}
