use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::Context;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::assessment::{Category, CategoryLevel};
use crate::error::{PlanError, PlanResult};

const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExamLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
}

impl fmt::Display for ExamLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExamLevel::A1 => "A1",
            ExamLevel::A2 => "A2",
            ExamLevel::B1 => "B1",
            ExamLevel::B2 => "B2",
            ExamLevel::C1 => "C1",
        };
        f.write_str(name)
    }
}

/// Percentage cut-offs for classifying one category of the diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Below this percentage the category is weak.
    pub weak: f64,
    /// Below this percentage (and at or above `weak`) the category is moderate.
    pub moderate: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds { weak: 50.0, moderate: 70.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub category: Category,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Ordered exam sub-parts tasks rotate through. Empty means the category has no parts.
    #[serde(default)]
    pub parts: Vec<u8>,
    pub average_task_minutes: u32,
    #[serde(default)]
    pub thresholds: Thresholds,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverallThresholds {
    pub beginner: f64,
    pub intermediate: f64,
}

impl Default for OverallThresholds {
    fn default() -> Self {
        OverallThresholds { beginner: 50.0, intermediate: 70.0 }
    }
}

/// Share of the weekly budget each diagnosed level receives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskDistribution {
    pub weakness: f64,
    pub moderate: f64,
    pub strength: f64,
}

impl TaskDistribution {
    pub fn weight_for(&self, level: CategoryLevel) -> f64 {
        match level {
            CategoryLevel::Weak => self.weakness,
            CategoryLevel::Moderate => self.moderate,
            CategoryLevel::Strong => self.strength,
        }
    }
}

impl Default for TaskDistribution {
    fn default() -> Self {
        TaskDistribution { weakness: 0.6, moderate: 0.3, strength: 0.1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MockExamPolicy {
    /// Plans shorter than this never get mock exams.
    pub minimum_plan_weeks: u32,
    pub minutes: u32,
}

impl Default for MockExamPolicy {
    fn default() -> Self {
        MockExamPolicy { minimum_plan_weeks: 6, minutes: 120 }
    }
}

/// Static planning configuration for one exam level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub level: ExamLevel,
    pub display_name: String,
    pub categories: Vec<CategoryConfig>,
    #[serde(default)]
    pub overall_thresholds: OverallThresholds,
    pub minimum_weeks: u32,
    #[serde(default)]
    pub task_distribution: TaskDistribution,
    #[serde(default)]
    pub mock_exam: MockExamPolicy,
}

impl LevelConfig {
    /// Built-in configuration for a level, if the level is supported.
    pub fn builtin(level: ExamLevel) -> PlanResult<&'static LevelConfig> {
        BUILTIN_LEVELS
            .get(&level)
            .ok_or(PlanError::UnsupportedLevel(level))
    }

    /// All built-in configurations keyed by level.
    pub fn builtins() -> HashMap<ExamLevel, LevelConfig> {
        BUILTIN_LEVELS.clone()
    }

    pub fn enabled_categories(&self) -> impl Iterator<Item = &CategoryConfig> {
        self.categories.iter().filter(|c| c.enabled)
    }

    pub fn category(&self, category: Category) -> Option<&CategoryConfig> {
        self.enabled_categories().find(|c| c.category == category)
    }

    pub fn validate(&self) -> PlanResult<()> {
        if self.minimum_weeks == 0 {
            return Err(PlanError::InvalidConfig(format!(
                "{}: minimum_weeks must be at least 1",
                self.level
            )));
        }

        let d = &self.task_distribution;
        for (name, weight) in [("weakness", d.weakness), ("moderate", d.moderate), ("strength", d.strength)] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(PlanError::InvalidConfig(format!(
                    "{}: {} weight {} is outside 0..=1",
                    self.level, name, weight
                )));
            }
        }
        let sum = d.weakness + d.moderate + d.strength;
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(PlanError::InvalidConfig(format!(
                "{}: priority weights sum to {}, expected 1.0",
                self.level, sum
            )));
        }

        if self.enabled_categories().next().is_none() {
            return Err(PlanError::InvalidConfig(format!(
                "{}: no enabled categories",
                self.level
            )));
        }
        for c in self.enabled_categories() {
            if c.average_task_minutes == 0 {
                return Err(PlanError::InvalidConfig(format!(
                    "{}: {} has a zero average task duration",
                    self.level, c.category
                )));
            }
            if c.thresholds.weak > c.thresholds.moderate {
                return Err(PlanError::InvalidConfig(format!(
                    "{}: {} weak threshold exceeds moderate threshold",
                    self.level, c.category
                )));
            }
        }

        if self.mock_exam.minutes == 0 {
            return Err(PlanError::InvalidConfig(format!(
                "{}: mock exam duration must be positive",
                self.level
            )));
        }
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> PlanResult<Self> {
        let config: LevelConfig =
            toml::from_str(content).map_err(|e| PlanError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Load a level configuration override from a TOML file.
pub fn load_level_config(path: &Path) -> anyhow::Result<LevelConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read level config from {:?}", path))?;
    let config = LevelConfig::from_toml_str(&content)
        .with_context(|| format!("Failed to parse level config {:?}", path))?;
    tracing::info!(path = ?path, level = %config.level, "Loaded level config");
    Ok(config)
}

fn category(category: Category, parts: &[u8], average_task_minutes: u32) -> CategoryConfig {
    CategoryConfig {
        category,
        enabled: true,
        parts: parts.to_vec(),
        average_task_minutes,
        thresholds: Thresholds::default(),
    }
}

fn standard_categories(with_grammar: bool) -> Vec<CategoryConfig> {
    let mut grammar = category(Category::Grammar, &[1, 2], 20);
    grammar.enabled = with_grammar;
    vec![
        category(Category::Reading, &[1, 2, 3], 25),
        category(Category::Listening, &[1, 2, 3], 30),
        grammar,
        category(Category::Writing, &[], 45),
        category(Category::Speaking, &[1, 2, 3], 30),
    ]
}

fn builtin_level(level: ExamLevel, with_grammar: bool) -> LevelConfig {
    LevelConfig {
        level,
        display_name: format!("TELC {}", level),
        categories: standard_categories(with_grammar),
        overall_thresholds: OverallThresholds::default(),
        minimum_weeks: 4,
        task_distribution: TaskDistribution::default(),
        mock_exam: MockExamPolicy::default(),
    }
}

lazy_static! {
    static ref BUILTIN_LEVELS: HashMap<ExamLevel, LevelConfig> = {
        let mut levels = HashMap::new();
        // A1 has no grammar section
        levels.insert(ExamLevel::A1, builtin_level(ExamLevel::A1, false));
        levels.insert(ExamLevel::B1, builtin_level(ExamLevel::B1, true));
        levels.insert(ExamLevel::B2, builtin_level(ExamLevel::B2, true));
        levels
    };
}
