//! PRD text analysis
//!
//! Turns raw markdown-ish PRD text into a [`PrdAnalysis`]. The analyzer
//! never fails: malformed or empty input degrades to a smaller structure
//! with defaults filled in.

use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};
use weaver_core::{ComplexityLevel, IdGenerator, PlannerConfig, TaskPriority, UuidIdGenerator};

use crate::prd::{Feature, PrdAnalysis};

static VERSION_PATTERN: OnceLock<Regex> = OnceLock::new();
static DEPENDS_PATTERN: OnceLock<Regex> = OnceLock::new();
static ACCEPTANCE_PATTERN: OnceLock<Regex> = OnceLock::new();
static NOTES_PATTERN: OnceLock<Regex> = OnceLock::new();

fn version_pattern() -> &'static Regex {
    VERSION_PATTERN
        .get_or_init(|| Regex::new(r"(?i)\bversion\s*:?\s*v?(\d+\.\d+(?:\.\d+)?)").unwrap())
}

fn depends_pattern() -> &'static Regex {
    DEPENDS_PATTERN.get_or_init(|| Regex::new(r"(?i)^depends\s+on\s*:\s*(.+)$").unwrap())
}

fn acceptance_pattern() -> &'static Regex {
    ACCEPTANCE_PATTERN.get_or_init(|| Regex::new(r"(?i)^acceptance\s+criteria\s*:?\s*$").unwrap())
}

fn notes_pattern() -> &'static Regex {
    NOTES_PATTERN.get_or_init(|| Regex::new(r"(?i)^technical\s+notes\s*:?\s*(.*)$").unwrap())
}

/// Tunable thresholds and keyword tables for complexity/priority inference
///
/// Product tuning, not contract: tests pin only closed-form properties
/// (enum membership, monotonic growth with signal count).
#[derive(Debug, Clone)]
pub struct Heuristics {
    /// Signal count at or below which a feature is Low complexity
    pub low_signal_max: usize,
    /// Signal count at or below which a feature is Medium complexity
    pub medium_signal_max: usize,
    /// Signal count at or below which a feature is High complexity;
    /// anything above is VeryHigh
    pub high_signal_max: usize,
    /// Terms that bump complexity one level when present
    pub complexity_keywords: Vec<String>,
    /// Terms that raise priority; one hit -> High, two or more -> Critical
    pub priority_keywords: Vec<String>,
    /// Terms that mark a feature as deferrable -> Low priority
    pub deprioritize_keywords: Vec<String>,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            low_signal_max: 1,
            medium_signal_max: 4,
            high_signal_max: 7,
            complexity_keywords: to_strings(&[
                "security",
                "performance",
                "scalab",
                "distributed",
                "concurren",
                "real-time",
                "encryption",
                "migration",
                "third-party",
            ]),
            priority_keywords: to_strings(&[
                "critical",
                "security",
                "payment",
                "compliance",
                "authentication",
                "data loss",
                "must",
            ]),
            deprioritize_keywords: to_strings(&["nice to have", "optional", "stretch goal"]),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Heuristics {
    /// Infer complexity from signal density and keyword hits
    pub fn infer_complexity(&self, feature: &Feature, default: ComplexityLevel) -> ComplexityLevel {
        let signals = feature.signal_count();
        if signals == 0 {
            return default;
        }

        let base = if signals <= self.low_signal_max {
            ComplexityLevel::Low
        } else if signals <= self.medium_signal_max {
            ComplexityLevel::Medium
        } else if signals <= self.high_signal_max {
            ComplexityLevel::High
        } else {
            ComplexityLevel::VeryHigh
        };

        let text = feature.combined_text();
        if self.complexity_keywords.iter().any(|k| text.contains(k)) {
            base.escalated()
        } else {
            base
        }
    }

    /// Infer priority from keyword hits
    pub fn infer_priority(&self, feature: &Feature) -> TaskPriority {
        let text = feature.combined_text();

        if self.deprioritize_keywords.iter().any(|k| text.contains(k)) {
            return TaskPriority::Low;
        }

        let hits = self
            .priority_keywords
            .iter()
            .filter(|k| text.contains(k.as_str()))
            .count();

        match hits {
            0 => TaskPriority::Medium,
            1 => TaskPriority::High,
            _ => TaskPriority::Critical,
        }
    }
}

/// Recognized level-2 sections of a PRD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Overview,
    Goals,
    Features,
    Requirements,
    Constraints,
    Other,
}

impl Section {
    fn from_heading(text: &str) -> Self {
        match text.to_lowercase().as_str() {
            "overview" => Self::Overview,
            "goals" => Self::Goals,
            "features" => Self::Features,
            "requirements" => Self::Requirements,
            "constraints" => Self::Constraints,
            _ => Self::Other,
        }
    }
}

/// Labeled block currently open inside a feature body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeatureBlock {
    Requirements,
    Acceptance,
    Notes,
}

/// Parses raw PRD text into a [`PrdAnalysis`]
///
/// Holds an [`IdGenerator`] so repeated calls - including concurrent ones -
/// produce analyses with distinct ids.
pub struct PrdAnalyzer {
    config: PlannerConfig,
    heuristics: Heuristics,
    ids: Arc<dyn IdGenerator>,
}

impl PrdAnalyzer {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            heuristics: Heuristics::default(),
            ids: Arc::new(UuidIdGenerator::new()),
        }
    }

    pub fn with_heuristics(mut self, heuristics: Heuristics) -> Self {
        self.heuristics = heuristics;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Analyze raw PRD text. Never fails; degenerate input yields a
    /// best-effort structure with defaults.
    pub fn analyze(&self, text: &str) -> PrdAnalysis {
        let id = self.ids.next_id("analysis");

        if text.trim().is_empty() {
            debug!(analysis_id = %id, "Empty PRD text, returning default analysis");
            return PrdAnalysis::empty(id, text.len());
        }

        let mut analysis = PrdAnalysis::empty(&id, text.len());
        analysis.version = version_pattern()
            .captures(text)
            .map(|c| c[1].to_string());

        let mut saw_title = false;
        let mut section = Section::Preamble;
        let mut block = FeatureBlock::Requirements;

        for raw_line in text.lines() {
            let line = raw_line.trim();

            if let Some((level, heading)) = parse_heading(line) {
                match level {
                    1 => {
                        if !saw_title {
                            analysis.title = heading.to_string();
                            saw_title = true;
                        }
                        section = Section::Preamble;
                    }
                    2 => {
                        section = Section::from_heading(heading);
                        debug!(?section, heading, "Entered section");
                    }
                    3 if section == Section::Features => {
                        analysis.features.push(Feature::new(heading));
                        block = FeatureBlock::Requirements;
                        debug!(feature = heading, "Started feature");
                    }
                    _ => {}
                }
                continue;
            }

            match section {
                Section::Goals => {
                    if let Some(item) = parse_list_item(line) {
                        analysis.goals.push(item);
                    }
                }
                Section::Requirements => {
                    if let Some(item) = parse_list_item(line) {
                        analysis.global_requirements.push(item);
                    }
                }
                Section::Constraints => {
                    if let Some(item) = parse_list_item(line) {
                        analysis.constraints.push(item);
                    }
                }
                Section::Features => {
                    if let Some(feature) = analysis.features.last_mut() {
                        block = scan_feature_line(feature, line, block);
                    }
                }
                Section::Preamble | Section::Overview | Section::Other => {}
            }
        }

        for feature in &mut analysis.features {
            feature.estimated_complexity = self
                .heuristics
                .infer_complexity(feature, self.config.default_complexity);
            feature.priority = self.heuristics.infer_priority(feature);
        }

        info!(
            analysis_id = %id,
            title = %analysis.title,
            features = analysis.features.len(),
            goals = analysis.goals.len(),
            "PRD analysis complete"
        );

        analysis
    }
}

impl Default for PrdAnalyzer {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

/// Route one body line of a feature into the right bucket, returning the
/// labeled block that is open afterwards
fn scan_feature_line(feature: &mut Feature, line: &str, block: FeatureBlock) -> FeatureBlock {
    // Bold label markers carry no meaning beyond the label itself
    let plain = line.replace("**", "");
    let plain = plain.trim();

    if let Some(caps) = depends_pattern().captures(plain) {
        feature.depends_on.extend(
            caps[1]
                .split(',')
                .map(|s| s.trim().trim_end_matches('.').to_string())
                .filter(|s| !s.is_empty()),
        );
        return block;
    }

    if acceptance_pattern().is_match(plain) {
        return FeatureBlock::Acceptance;
    }

    if let Some(caps) = notes_pattern().captures(plain) {
        let inline = caps[1].trim();
        if !inline.is_empty() {
            push_note(feature, inline);
        }
        return FeatureBlock::Notes;
    }

    if let Some(item) = parse_list_item(line) {
        match block {
            FeatureBlock::Requirements => feature.requirements.push(item),
            FeatureBlock::Acceptance => feature.acceptance_criteria.push(item),
            FeatureBlock::Notes => push_note(feature, &item),
        }
        return block;
    }

    if block == FeatureBlock::Notes && !plain.is_empty() {
        push_note(feature, plain);
    }

    block
}

fn push_note(feature: &mut Feature, text: &str) {
    match &mut feature.technical_notes {
        Some(notes) => {
            notes.push('\n');
            notes.push_str(text);
        }
        None => feature.technical_notes = Some(text.to_string()),
    }
}

/// Parse an ATX heading, returning (level, text)
fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with(' ') {
        return None;
    }
    let text = rest.trim();
    if text.is_empty() {
        None
    } else {
        Some((hashes, text))
    }
}

/// Parse a bullet (`-`, `*`, `+`) or numbered (`1.` / `1)`) list item
fn parse_list_item(line: &str) -> Option<String> {
    for marker in ["- ", "* ", "+ "] {
        if let Some(rest) = line.strip_prefix(marker) {
            let item = rest.trim();
            if !item.is_empty() {
                return Some(item.to_string());
            }
            return None;
        }
    }

    let digits = line.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(item) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            let item = item.trim();
            if !item.is_empty() {
                return Some(item.to_string());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use weaver_core::SequentialIdGenerator;

    fn analyzer() -> PrdAnalyzer {
        PrdAnalyzer::default().with_id_generator(Arc::new(SequentialIdGenerator::new()))
    }

    #[test]
    fn test_empty_input_yields_defaults() {
        let analysis = analyzer().analyze("");
        assert_eq!(analysis.title, "Untitled Project");
        assert!(analysis.features.is_empty());
        assert_eq!(analysis.metadata.raw_length, 0);
    }

    #[test]
    fn test_title_only() {
        let analysis = analyzer().analyze("# My Project");
        assert_eq!(analysis.title, "My Project");
        assert!(analysis.features.is_empty());
    }

    #[test]
    fn test_first_h1_wins() {
        let analysis = analyzer().analyze("# First\n\nsome text\n\n# Second\n");
        assert_eq!(analysis.title, "First");
    }

    #[test]
    fn test_version_extraction() {
        let analysis = analyzer().analyze("# App\n\nVersion: 2.1.0\n");
        assert_eq!(analysis.version.as_deref(), Some("2.1.0"));

        let analysis = analyzer().analyze("# App\n\nversion 1.2\n");
        assert_eq!(analysis.version.as_deref(), Some("1.2"));

        let analysis = analyzer().analyze("# App\n");
        assert!(analysis.version.is_none());
    }

    #[test]
    fn test_goals_and_constraints_sections() {
        let text = "# App\n\n## Goals\n\n- Ship fast\n- Stay reliable\n\n## Constraints\n\n- Budget is fixed\n";
        let analysis = analyzer().analyze(text);
        assert_eq!(analysis.goals, vec!["Ship fast", "Stay reliable"]);
        assert_eq!(analysis.constraints, vec!["Budget is fixed"]);
    }

    #[test]
    fn test_section_headings_are_case_insensitive() {
        let text = "# App\n\n## GOALS\n\n- One goal\n\n## requirements\n\n- A requirement\n";
        let analysis = analyzer().analyze(text);
        assert_eq!(analysis.goals.len(), 1);
        assert_eq!(analysis.global_requirements.len(), 1);
    }

    #[test]
    fn test_feature_parsing() {
        let text = r#"# Shop

## Features

### Checkout

- Validate cart contents
- Process payment
1. Send confirmation email

**Acceptance Criteria:**

- Order appears in history
- Email arrives within a minute

**Technical Notes:** Uses the payments gateway sandbox.

Depends on: Catalog, Auth
"#;
        let analysis = analyzer().analyze(text);
        assert_eq!(analysis.features.len(), 1);

        let feature = &analysis.features[0];
        assert_eq!(feature.name, "Checkout");
        assert_eq!(feature.requirements.len(), 3);
        assert_eq!(feature.acceptance_criteria.len(), 2);
        assert_eq!(
            feature.technical_notes.as_deref(),
            Some("Uses the payments gateway sandbox.")
        );
        assert_eq!(feature.depends_on, vec!["Catalog", "Auth"]);
    }

    #[test]
    fn test_feature_with_no_items() {
        let text = "# App\n\n## Features\n\n### Bare Feature\n";
        let analysis = analyzer().analyze(text);
        assert_eq!(analysis.features.len(), 1);
        assert!(analysis.features[0].requirements.is_empty());
        assert!(analysis.features[0].acceptance_criteria.is_empty());
    }

    #[test]
    fn test_h3_outside_features_is_not_a_feature() {
        let text = "# App\n\n## Other Stuff\n\n### Not A Feature\n\n## Features\n\n### Real Feature\n";
        let analysis = analyzer().analyze(text);
        assert_eq!(analysis.features.len(), 1);
        assert_eq!(analysis.features[0].name, "Real Feature");
    }

    #[test]
    fn test_distinct_ids_per_call() {
        let analyzer = analyzer();
        let a = analyzer.analyze("# Same");
        let b = analyzer.analyze("# Same");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_never_panics_on_garbage() {
        let analyzer = analyzer();
        for text in [
            "####### too deep",
            "- bullet before any heading",
            "## Features\n- item with no feature",
            "### orphan feature heading",
            "# \n## \n### ",
            "Depends on: nothing",
            "1.2.3.4.5",
        ] {
            let _ = analyzer.analyze(text);
        }
    }

    #[test]
    fn test_complexity_grows_with_signal_count() {
        let heuristics = Heuristics::default();
        let mut small = Feature::new("Plain A");
        small.requirements.push("one item".to_string());

        let mut large = Feature::new("Plain B");
        for i in 0..10 {
            large.requirements.push(format!("item {}", i));
        }

        let small_level = heuristics.infer_complexity(&small, ComplexityLevel::Medium);
        let large_level = heuristics.infer_complexity(&large, ComplexityLevel::Medium);
        assert!(small_level <= large_level);
        assert_eq!(large_level, ComplexityLevel::VeryHigh);
    }

    #[test]
    fn test_no_signal_uses_default_complexity() {
        let heuristics = Heuristics::default();
        let feature = Feature::new("Plain");
        assert_eq!(
            heuristics.infer_complexity(&feature, ComplexityLevel::High),
            ComplexityLevel::High
        );
    }

    #[test]
    fn test_keyword_bumps_complexity() {
        let heuristics = Heuristics::default();
        let mut plain = Feature::new("List rendering");
        plain.requirements.push("Render a list".to_string());

        let mut risky = Feature::new("List rendering");
        risky
            .requirements
            .push("Render a list with encryption at rest".to_string());

        let base = heuristics.infer_complexity(&plain, ComplexityLevel::Medium);
        let bumped = heuristics.infer_complexity(&risky, ComplexityLevel::Medium);
        assert!(bumped > base);
    }

    #[test]
    fn test_priority_inference_bounds() {
        let heuristics = Heuristics::default();

        let plain = Feature::new("Plain widget");
        assert_eq!(heuristics.infer_priority(&plain), TaskPriority::Medium);

        let mut hot = Feature::new("Payment processing");
        hot.requirements
            .push("Handle payment and compliance rules".to_string());
        assert_eq!(heuristics.infer_priority(&hot), TaskPriority::Critical);

        let mut cold = Feature::new("Theming");
        cold.requirements
            .push("Dark mode would be nice to have".to_string());
        assert_eq!(heuristics.infer_priority(&cold), TaskPriority::Low);
    }
}
