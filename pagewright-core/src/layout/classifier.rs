//! Rule-based role classification of text runs

use crate::config::ClassifierThresholds;
use crate::types::{ClassifiedRun, ContentRole, TextRun};

/// Condition a run must satisfy for a rule to fire
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Predicate {
    /// Distance from the run to the bottom edge is below `margin`
    NearBottom { margin: f32 },

    /// Font size is at least `size`
    MinFontSize { size: f32 },

    /// Font size is at least `size` and the run is bold
    MinBoldFontSize { size: f32 },
}

impl Predicate {
    fn matches(&self, run: &TextRun, page_height: f32) -> bool {
        match *self {
            Predicate::NearBottom { margin } => page_height - run.position.y < margin,
            Predicate::MinFontSize { size } => run.font_size >= size,
            Predicate::MinBoldFontSize { size } => run.is_bold && run.font_size >= size,
        }
    }
}

/// A predicate paired with the role it assigns
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub predicate: Predicate,
    pub role: ContentRole,
}

impl Rule {
    pub fn new(predicate: Predicate, role: ContentRole) -> Self {
        Self { predicate, role }
    }
}

/// Assigns a [`ContentRole`] to each run
///
/// Rules are evaluated top to bottom and the first match wins. Runs that
/// match nothing are paragraphs.
#[derive(Debug, Clone)]
pub struct ContentClassifier {
    rules: Vec<Rule>,
}

impl ContentClassifier {
    /// Build the standard rule list from thresholds
    pub fn new(thresholds: &ClassifierThresholds) -> Self {
        Self::with_rules(vec![
            Rule::new(
                Predicate::NearBottom {
                    margin: thresholds.footer_margin,
                },
                ContentRole::Footer,
            ),
            Rule::new(
                Predicate::MinFontSize {
                    size: thresholds.title_size,
                },
                ContentRole::Title,
            ),
            Rule::new(
                Predicate::MinBoldFontSize {
                    size: thresholds.heading_size,
                },
                ContentRole::Heading,
            ),
            Rule::new(
                Predicate::MinBoldFontSize {
                    size: thresholds.author_size,
                },
                ContentRole::Author,
            ),
        ])
    }

    /// Use a custom rule list
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classify a single run
    pub fn classify(&self, run: &TextRun, page_height: f32) -> ContentRole {
        self.rules
            .iter()
            .find(|rule| rule.predicate.matches(run, page_height))
            .map(|rule| rule.role)
            .unwrap_or(ContentRole::Paragraph)
    }

    /// Classify all runs of a page, dropping blank ones
    pub fn classify_page(&self, runs: &[TextRun], page_height: f32) -> Vec<ClassifiedRun> {
        runs.iter()
            .filter(|run| !run.is_blank())
            .map(|run| ClassifiedRun::new(self.classify(run, page_height), run.text.clone()))
            .collect()
    }
}

impl Default for ContentClassifier {
    fn default() -> Self {
        Self::new(&ClassifierThresholds::default())
    }
}
