//! Core type definitions for Weaver planning

use serde::{Deserialize, Serialize};

/// Task priority levels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Critical = 0,
    High = 1,
    #[default]
    Medium = 2,
    Low = 3,
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" | "0" => Ok(Self::Critical),
            "high" | "1" => Ok(Self::High),
            "medium" | "2" => Ok(Self::Medium),
            "low" | "3" => Ok(Self::Low),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

/// Complexity estimate for a feature or task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Trivial = 0,
    Low = 1,
    #[default]
    Medium = 2,
    High = 3,
    VeryHigh = 4,
}

impl ComplexityLevel {
    /// All levels, lowest first. Configuration validation iterates this.
    pub const ALL: [ComplexityLevel; 5] = [
        Self::Trivial,
        Self::Low,
        Self::Medium,
        Self::High,
        Self::VeryHigh,
    ];

    /// Numeric rank, Trivial = 0 .. VeryHigh = 4
    pub fn rank(self) -> u32 {
        self as u32
    }

    /// One level up, saturating at VeryHigh
    pub fn escalated(self) -> Self {
        match self {
            Self::Trivial => Self::Low,
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High | Self::VeryHigh => Self::VeryHigh,
        }
    }

    /// One level down, saturating at Trivial
    pub fn reduced(self) -> Self {
        match self {
            Self::Trivial | Self::Low => Self::Trivial,
            Self::Medium => Self::Low,
            Self::High => Self::Medium,
            Self::VeryHigh => Self::High,
        }
    }
}

impl std::fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trivial => write!(f, "trivial"),
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::VeryHigh => write!(f, "very_high"),
        }
    }
}

impl std::str::FromStr for ComplexityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trivial" => Ok(Self::Trivial),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "very_high" | "veryhigh" | "very-high" => Ok(Self::VeryHigh),
            _ => Err(format!("Invalid complexity level: {}", s)),
        }
    }
}

/// Category of agent team a task is routed to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Frontend,
    Backend,
    Database,
    Devops,
    Qa,
    Security,
    Docs,
    Research,
    #[default]
    General,
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Frontend => write!(f, "frontend"),
            Self::Backend => write!(f, "backend"),
            Self::Database => write!(f, "database"),
            Self::Devops => write!(f, "devops"),
            Self::Qa => write!(f, "qa"),
            Self::Security => write!(f, "security"),
            Self::Docs => write!(f, "docs"),
            Self::Research => write!(f, "research"),
            Self::General => write!(f, "general"),
        }
    }
}

impl std::str::FromStr for AgentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "frontend" => Ok(Self::Frontend),
            "backend" => Ok(Self::Backend),
            "database" => Ok(Self::Database),
            "devops" => Ok(Self::Devops),
            "qa" => Ok(Self::Qa),
            "security" => Ok(Self::Security),
            "docs" => Ok(Self::Docs),
            "research" => Ok(Self::Research),
            "general" => Ok(Self::General),
            _ => Err(format!("Invalid agent type: {}", s)),
        }
    }
}

/// Task identifier (unique across a task tree)
pub type TaskId = String;

/// A unit of work routed to an agent team
///
/// A task with no `parent_task_id` is a feature root. If `parent_task_id`
/// is set, the parent exists in the same tree and its `subtasks` contains
/// this task's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier
    pub id: TaskId,
    /// Short task name
    pub name: String,
    /// What the executing agent should do
    pub description: String,
    /// Agent team this task is routed to
    pub agent_type: AgentType,
    /// Parent task, if this is a subtask
    pub parent_task_id: Option<TaskId>,
    /// Direct subtask ids
    pub subtasks: Vec<TaskId>,
    /// Effort estimate in abstract units
    pub estimated_effort: f64,
    pub priority: TaskPriority,
    pub complexity: ComplexityLevel,
    /// Feature names this task's feature declared a dependency on.
    /// Populated only on feature root tasks; the graph builder resolves
    /// the names against other root tasks.
    pub depends_on: Vec<String>,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            agent_type: AgentType::default(),
            parent_task_id: None,
            subtasks: Vec::new(),
            estimated_effort: 0.0,
            priority: TaskPriority::default(),
            complexity: ComplexityLevel::default(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_agent_type(mut self, agent_type: AgentType) -> Self {
        self.agent_type = agent_type;
        self
    }

    pub fn with_parent(mut self, parent: impl Into<TaskId>) -> Self {
        self.parent_task_id = Some(parent.into());
        self
    }

    pub fn with_effort(mut self, effort: f64) -> Self {
        self.estimated_effort = effort;
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_complexity(mut self, complexity: ComplexityLevel) -> Self {
        self.complexity = complexity;
        self
    }

    pub fn with_depends_on(mut self, depends_on: Vec<String>) -> Self {
        self.depends_on = depends_on;
        self
    }

    /// Whether this task is a feature root (has no parent)
    pub fn is_root(&self) -> bool {
        self.parent_task_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(TaskPriority::Critical < TaskPriority::High);
        assert!(TaskPriority::High < TaskPriority::Medium);
        assert!(TaskPriority::Medium < TaskPriority::Low);
    }

    #[test]
    fn test_priority_parsing() {
        let p: TaskPriority = "critical".parse().unwrap();
        assert_eq!(p, TaskPriority::Critical);
        assert_eq!(p.to_string(), "critical");
        assert!("urgent".parse::<TaskPriority>().is_err());
    }

    #[test]
    fn test_complexity_ordering_and_rank() {
        assert!(ComplexityLevel::Trivial < ComplexityLevel::VeryHigh);
        assert_eq!(ComplexityLevel::Trivial.rank(), 0);
        assert_eq!(ComplexityLevel::VeryHigh.rank(), 4);
    }

    #[test]
    fn test_complexity_escalation_saturates() {
        assert_eq!(ComplexityLevel::High.escalated(), ComplexityLevel::VeryHigh);
        assert_eq!(
            ComplexityLevel::VeryHigh.escalated(),
            ComplexityLevel::VeryHigh
        );
        assert_eq!(ComplexityLevel::Trivial.reduced(), ComplexityLevel::Trivial);
    }

    #[test]
    fn test_agent_type_parsing() {
        let a: AgentType = "backend".parse().unwrap();
        assert_eq!(a, AgentType::Backend);
        assert_eq!(AgentType::default(), AgentType::General);
    }

    #[test]
    fn test_task_builder() {
        let task = Task::new("task-1", "Build login form")
            .with_agent_type(AgentType::Frontend)
            .with_parent("task-0")
            .with_effort(4.0)
            .with_priority(TaskPriority::High);

        assert_eq!(task.id, "task-1");
        assert_eq!(task.parent_task_id.as_deref(), Some("task-0"));
        assert!(!task.is_root());
        assert_eq!(task.estimated_effort, 4.0);
    }
}
