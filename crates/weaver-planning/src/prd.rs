//! Structured PRD analysis data

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use weaver_core::{ComplexityLevel, TaskPriority};

/// Title used when a PRD has no level-1 heading
pub const UNTITLED_PROJECT: &str = "Untitled Project";

/// Structured result of analyzing one PRD
///
/// Created once per [`analyze`](crate::PrdAnalyzer::analyze) call and
/// immutable afterward. Two analyses of identical text get distinct ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrdAnalysis {
    /// Unique per analysis run
    pub id: String,
    pub title: String,
    /// Semver-style version string, if the document declares one
    pub version: Option<String>,
    pub goals: Vec<String>,
    pub features: Vec<Feature>,
    /// Requirements that apply to the whole project
    pub global_requirements: Vec<String>,
    pub constraints: Vec<String>,
    pub metadata: AnalysisMetadata,
}

impl PrdAnalysis {
    /// Empty analysis skeleton with the default title
    pub fn empty(id: impl Into<String>, raw_length: usize) -> Self {
        Self {
            id: id.into(),
            title: UNTITLED_PROJECT.to_string(),
            version: None,
            goals: Vec::new(),
            features: Vec::new(),
            global_requirements: Vec::new(),
            constraints: Vec::new(),
            metadata: AnalysisMetadata::new(raw_length),
        }
    }

    /// Look up a feature index by name
    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|f| f.name == name)
    }
}

/// Analysis provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Byte length of the raw PRD text
    pub raw_length: usize,
    /// When the analysis ran
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisMetadata {
    pub fn new(raw_length: usize) -> Self {
        Self {
            raw_length,
            analyzed_at: Utc::now(),
        }
    }
}

/// One feature extracted from the PRD's Features section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub requirements: Vec<String>,
    pub acceptance_criteria: Vec<String>,
    pub technical_notes: Option<String>,
    pub estimated_complexity: ComplexityLevel,
    pub priority: TaskPriority,
    /// Names of other features this one declared a `Depends on:` line for
    pub depends_on: Vec<String>,
}

impl Feature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requirements: Vec::new(),
            acceptance_criteria: Vec::new(),
            technical_notes: None,
            estimated_complexity: ComplexityLevel::default(),
            priority: TaskPriority::default(),
            depends_on: Vec::new(),
        }
    }

    /// Count of requirements plus acceptance criteria
    pub fn signal_count(&self) -> usize {
        self.requirements.len() + self.acceptance_criteria.len()
    }

    /// All of the feature's text, lowercased, for keyword matching
    pub fn combined_text(&self) -> String {
        let mut text = self.name.to_lowercase();
        for item in self.requirements.iter().chain(&self.acceptance_criteria) {
            text.push(' ');
            text.push_str(&item.to_lowercase());
        }
        if let Some(notes) = &self.technical_notes {
            text.push(' ');
            text.push_str(&notes.to_lowercase());
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_analysis_defaults() {
        let analysis = PrdAnalysis::empty("analysis-0001", 0);
        assert_eq!(analysis.title, UNTITLED_PROJECT);
        assert!(analysis.features.is_empty());
        assert_eq!(analysis.metadata.raw_length, 0);
    }

    #[test]
    fn test_feature_signal_count() {
        let mut feature = Feature::new("Auth");
        feature.requirements.push("Support login".to_string());
        feature.requirements.push("Support logout".to_string());
        feature
            .acceptance_criteria
            .push("Session expires after 24h".to_string());

        assert_eq!(feature.signal_count(), 3);
    }

    #[test]
    fn test_combined_text_is_lowercased() {
        let mut feature = Feature::new("Checkout Flow");
        feature.requirements.push("Validate CART contents".to_string());
        feature.technical_notes = Some("Uses the Payments API".to_string());

        let text = feature.combined_text();
        assert!(text.contains("checkout flow"));
        assert!(text.contains("validate cart contents"));
        assert!(text.contains("payments api"));
    }

    #[test]
    fn test_feature_index_lookup() {
        let mut analysis = PrdAnalysis::empty("analysis-0001", 10);
        analysis.features.push(Feature::new("Auth"));
        analysis.features.push(Feature::new("Catalog"));

        assert_eq!(analysis.feature_index("Catalog"), Some(1));
        assert_eq!(analysis.feature_index("Missing"), None);
    }
}
