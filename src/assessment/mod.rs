use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{CategoryConfig, ExamLevel, LevelConfig};
use crate::error::{PlanError, PlanResult};

/// One exam skill area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Reading,
    Listening,
    Grammar,
    Writing,
    Speaking,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Reading,
        Category::Listening,
        Category::Grammar,
        Category::Writing,
        Category::Speaking,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Reading => "reading",
            Category::Listening => "listening",
            Category::Grammar => "grammar",
            Category::Writing => "writing",
            Category::Speaking => "speaking",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Reading => "Reading",
            Category::Listening => "Listening",
            Category::Grammar => "Grammar",
            Category::Writing => "Writing",
            Category::Speaking => "Speaking",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryLevel {
    Weak,
    Moderate,
    Strong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallLevel {
    Beginner,
    Intermediate,
    Advanced,
}

/// Diagnostic result for a single category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionAssessment {
    pub category: Category,
    pub score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub level: CategoryLevel,
}

impl SectionAssessment {
    /// Score a category against its configured thresholds.
    pub fn scored(config: &CategoryConfig, score: f64, max_score: f64) -> Self {
        let percentage = if max_score > 0.0 { score / max_score * 100.0 } else { 0.0 };
        let level = if percentage < config.thresholds.weak {
            CategoryLevel::Weak
        } else if percentage < config.thresholds.moderate {
            CategoryLevel::Moderate
        } else {
            CategoryLevel::Strong
        };
        SectionAssessment {
            category: config.category,
            score,
            max_score,
            percentage,
            level,
        }
    }
}

/// One-time scored pre-test. Read-only input to the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticAssessment {
    pub assessment_id: String,
    pub completed_at: DateTime<Utc>,
    pub exam_level: ExamLevel,
    pub sections: Vec<SectionAssessment>,
    pub overall_score: f64,
    pub overall_max_score: f64,
    pub overall_percentage: f64,
    pub overall_level: OverallLevel,
    pub strengths: Vec<Category>,
    pub weaknesses: Vec<Category>,
}

impl DiagnosticAssessment {
    /// Build an assessment from raw `(category, score, max)` results.
    ///
    /// Categories are visited in the level's configured order so that the
    /// strengths and weaknesses lists come out in a stable order. Results for
    /// categories the level does not enable are ignored.
    pub fn from_sections(
        assessment_id: impl Into<String>,
        completed_at: DateTime<Utc>,
        config: &LevelConfig,
        results: &[(Category, f64, f64)],
    ) -> PlanResult<Self> {
        let mut sections = Vec::new();
        for cat in config.enabled_categories() {
            if let Some((_, score, max)) = results.iter().find(|(c, _, _)| *c == cat.category) {
                if *score < 0.0 || *max < 0.0 || score > max {
                    return Err(PlanError::InvalidConfig(format!(
                        "{}: score {} out of range for max {}",
                        cat.category, score, max
                    )));
                }
                sections.push(SectionAssessment::scored(cat, *score, *max));
            }
        }
        for (c, _, _) in results {
            if config.category(*c).is_none() {
                tracing::debug!(category = %c, level = %config.level, "Ignoring result for disabled category");
            }
        }

        let overall_score: f64 = sections.iter().map(|s| s.score).sum();
        let overall_max_score: f64 = sections.iter().map(|s| s.max_score).sum();
        let overall_percentage = if overall_max_score > 0.0 {
            overall_score / overall_max_score * 100.0
        } else {
            0.0
        };
        let overall_level = if overall_percentage < config.overall_thresholds.beginner {
            OverallLevel::Beginner
        } else if overall_percentage < config.overall_thresholds.intermediate {
            OverallLevel::Intermediate
        } else {
            OverallLevel::Advanced
        };

        let strengths = sections
            .iter()
            .filter(|s| s.level == CategoryLevel::Strong)
            .map(|s| s.category)
            .collect();
        let weaknesses = sections
            .iter()
            .filter(|s| s.level == CategoryLevel::Weak)
            .map(|s| s.category)
            .collect();

        Ok(DiagnosticAssessment {
            assessment_id: assessment_id.into(),
            completed_at,
            exam_level: config.level,
            sections,
            overall_score,
            overall_max_score,
            overall_percentage,
            overall_level,
            strengths,
            weaknesses,
        })
    }

    pub fn section(&self, category: Category) -> Option<&SectionAssessment> {
        self.sections.iter().find(|s| s.category == category)
    }

    /// Diagnosed level used for time allocation. Weakness wins if a category is in both lists.
    pub fn level_of(&self, category: Category) -> CategoryLevel {
        crate::plan::priority::classify(category, &self.weaknesses, &self.strengths)
    }
}
