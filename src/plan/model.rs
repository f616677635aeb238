use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::assessment::{Category, DiagnosticAssessment};
use crate::config::ExamLevel;
use crate::schedule::ScheduleConfig;

/// Ordered easy < medium < hard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    Reading,
    Listening,
    Grammar,
    Writing,
    Speaking,
    MockExam,
}

impl TaskKind {
    pub fn category(&self) -> Option<Category> {
        match self {
            TaskKind::Reading => Some(Category::Reading),
            TaskKind::Listening => Some(Category::Listening),
            TaskKind::Grammar => Some(Category::Grammar),
            TaskKind::Writing => Some(Category::Writing),
            TaskKind::Speaking => Some(Category::Speaking),
            TaskKind::MockExam => None,
        }
    }
}

impl From<Category> for TaskKind {
    fn from(category: Category) -> Self {
        match category {
            Category::Reading => TaskKind::Reading,
            Category::Listening => TaskKind::Listening,
            Category::Grammar => TaskKind::Grammar,
            Category::Writing => TaskKind::Writing,
            Category::Speaking => TaskKind::Speaking,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskScore {
    pub score: f64,
    pub max_score: f64,
}

impl TaskScore {
    pub fn percentage(&self) -> Option<f64> {
        (self.max_score > 0.0).then(|| self.score / self.max_score * 100.0)
    }
}

/// One atomic unit of study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    /// Week the task was generated for. Zero only in documents written before the field existed.
    #[serde(default)]
    pub week_number: u32,
    pub kind: TaskKind,
    pub section: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub estimated_minutes: u32,
    pub difficulty: Difficulty,
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub score: Option<TaskScore>,
}

impl Task {
    pub fn estimated_hours(&self) -> f64 {
        self.estimated_minutes as f64 / 60.0
    }

    /// Owning week, falling back to the `task-w<week>-...` id convention for legacy documents.
    pub fn week(&self) -> Option<u32> {
        if self.week_number > 0 {
            Some(self.week_number)
        } else {
            parse_week_from_id(&self.id)
        }
    }
}

fn parse_week_from_id(id: &str) -> Option<u32> {
    let marker = id.find("-w")?;
    let digits: String = id[marker + 2..].chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok().filter(|w| *w > 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FocusArea {
    Reading,
    Listening,
    Grammar,
    Writing,
    Speaking,
    MockExam,
    Review,
}

impl FocusArea {
    pub fn label(&self) -> &'static str {
        match self {
            FocusArea::Reading => "reading",
            FocusArea::Listening => "listening",
            FocusArea::Grammar => "grammar",
            FocusArea::Writing => "writing",
            FocusArea::Speaking => "speaking",
            FocusArea::MockExam => "mock-exam",
            FocusArea::Review => "review",
        }
    }
}

impl From<Category> for FocusArea {
    fn from(category: Category) -> Self {
        match category {
            Category::Reading => FocusArea::Reading,
            Category::Listening => FocusArea::Listening,
            Category::Grammar => FocusArea::Grammar,
            Category::Writing => FocusArea::Writing,
            Category::Speaking => FocusArea::Speaking,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyGoal {
    pub week_number: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub focus: Vec<FocusArea>,
    pub focus_description: String,
    pub tasks: Vec<Task>,
    pub completed: bool,
    /// Rounded 0-100.
    pub completion_percentage: u32,
    pub total_estimated_hours: f64,
    pub completed_hours: f64,
}

impl WeeklyGoal {
    /// Recompute completion figures from the task list.
    pub fn refresh_completion(&mut self) {
        let done: Vec<&Task> = self.tasks.iter().filter(|t| t.completed).collect();
        self.completed_hours = done.iter().map(|t| t.estimated_hours()).sum();
        self.completion_percentage = if self.tasks.is_empty() {
            0
        } else {
            (done.len() as f64 / self.tasks.len() as f64 * 100.0).round() as u32
        };
        self.completed = !self.tasks.is_empty() && done.len() == self.tasks.len();
        self.total_estimated_hours = self.tasks.iter().map(|t| t.estimated_hours()).sum();
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start_date && at < self.end_date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryProgress {
    pub category: Category,
    pub initial_score: f64,
    pub current_score: f64,
    pub improvement: f64,
    pub tasks_completed: u32,
    pub total_tasks: u32,
    #[serde(default)]
    pub last_practice_date: Option<NaiveDate>,
    /// Number of scores folded into `current_score`, the diagnostic counting as the first.
    #[serde(default = "default_score_samples")]
    pub score_samples: u32,
}

fn default_score_samples() -> u32 {
    1
}

impl CategoryProgress {
    pub fn seeded(category: Category, diagnostic_percentage: f64) -> Self {
        CategoryProgress {
            category,
            initial_score: diagnostic_percentage,
            current_score: diagnostic_percentage,
            improvement: 0.0,
            tasks_completed: 0,
            total_tasks: 0,
            last_practice_date: None,
            score_samples: 1,
        }
    }

    /// Fold a practice score into the rolling average.
    pub fn record_score(&mut self, percentage: f64) {
        let samples = self.score_samples.max(1) as f64;
        self.current_score = (self.current_score * samples + percentage) / (samples + 1.0);
        self.score_samples = self.score_samples.max(1) + 1;
        self.improvement = self.current_score - self.initial_score;
    }
}

/// All tasks completed on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySession {
    pub session_id: String,
    pub date: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_minutes: u32,
    pub task_ids: Vec<String>,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyPlanProgress {
    pub total_tasks: u32,
    pub completed_tasks: u32,
    pub total_study_hours: f64,
    pub completed_study_hours: f64,
    pub current_streak: u32,
    pub longest_streak: u32,
    #[serde(default)]
    pub last_study_date: Option<NaiveDate>,
    pub category_progress: Vec<CategoryProgress>,
    #[serde(default)]
    pub study_sessions: Vec<StudySession>,
    /// Seeded from the diagnostic's overall percentage, then replaced by the
    /// readiness score on every completion and every reconciliation of a plan
    /// with completed work.
    pub exam_readiness_score: f64,
}

/// Aggregate root: one user's multi-week plan for one exam attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyPlan {
    pub plan_id: String,
    pub user_id: String,
    pub exam_level: ExamLevel,
    pub schedule: ScheduleConfig,
    pub assessment: DiagnosticAssessment,
    pub weeks: Vec<WeeklyGoal>,
    pub total_weeks: u32,
    pub current_week: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub is_paused: bool,
    pub progress: StudyPlanProgress,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub ai_insights: Vec<String>,
    /// Bumped on every successful write; used for compare-and-set.
    #[serde(default)]
    pub version: u64,
}

impl StudyPlan {
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.weeks.iter().flat_map(|w| w.tasks.iter())
    }

    pub fn find_task(&self, task_id: &str) -> Option<&Task> {
        self.tasks().find(|t| t.id == task_id)
    }

    pub fn week(&self, week_number: u32) -> Option<&WeeklyGoal> {
        self.weeks.iter().find(|w| w.week_number == week_number)
    }

    pub fn completed_weeks(&self) -> u32 {
        self.weeks.iter().filter(|w| w.completed).count() as u32
    }

    /// Recompute plan-level task and hour counters from the weeks.
    ///
    /// `total_study_hours` is the schedule's time budget and is left alone.
    pub fn refresh_totals(&mut self) {
        self.progress.total_tasks = self.tasks().count() as u32;
        self.progress.completed_tasks = self.tasks().filter(|t| t.completed).count() as u32;
        self.progress.completed_study_hours = self
            .tasks()
            .filter(|t| t.completed)
            .map(|t| t.estimated_hours())
            .sum();

        let counts: Vec<(Category, u32, u32)> = self
            .progress
            .category_progress
            .iter()
            .map(|cp| {
                let of_category = self
                    .tasks()
                    .filter(|t| t.kind.category() == Some(cp.category));
                let (total, done) = of_category.fold((0, 0), |(total, done), t| {
                    (total + 1, done + u32::from(t.completed))
                });
                (cp.category, total, done)
            })
            .collect();
        for (cp, (_, total, done)) in self.progress.category_progress.iter_mut().zip(counts) {
            cp.total_tasks = total;
            cp.tasks_completed = done;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, week_number: u32, minutes: u32, completed: bool) -> Task {
        Task {
            id: id.to_string(),
            week_number,
            kind: TaskKind::Reading,
            section: "reading-part1".into(),
            title: "Reading Part 1".into(),
            description: None,
            estimated_minutes: minutes,
            difficulty: Difficulty::Easy,
            completed,
            completed_at: None,
            score: None,
        }
    }

    #[test]
    fn test_difficulty_ordering() {
        assert!(Difficulty::Easy < Difficulty::Medium);
        assert!(Difficulty::Medium < Difficulty::Hard);
    }

    #[test]
    fn test_week_falls_back_to_id() {
        assert_eq!(task("task-w3-reading-1", 0, 25, false).week(), Some(3));
        assert_eq!(task("task-mock-exam-w7", 0, 120, false).week(), Some(7));
        assert_eq!(task("custom", 0, 25, false).week(), None);
        assert_eq!(task("task-w3-reading-1", 5, 25, false).week(), Some(5));
    }

    #[test]
    fn test_refresh_completion() {
        let now = Utc::now();
        let mut week = WeeklyGoal {
            week_number: 1,
            start_date: now,
            end_date: now + chrono::Duration::days(7),
            focus: vec![],
            focus_description: String::new(),
            tasks: vec![
                task("a", 1, 30, true),
                task("b", 1, 30, false),
                task("c", 1, 30, false),
            ],
            completed: false,
            completion_percentage: 0,
            total_estimated_hours: 0.0,
            completed_hours: 0.0,
        };
        week.refresh_completion();
        assert_eq!(week.completion_percentage, 33);
        assert_eq!(week.completed_hours, 0.5);
        assert_eq!(week.total_estimated_hours, 1.5);
        assert!(!week.completed);
    }

    #[test]
    fn test_rolling_score() {
        let mut progress = CategoryProgress::seeded(Category::Reading, 40.0);
        progress.record_score(80.0);
        assert_eq!(progress.current_score, 60.0);
        assert_eq!(progress.improvement, 20.0);
        progress.record_score(90.0);
        assert_eq!(progress.current_score, 70.0);
    }

    #[test]
    fn test_task_serializes_kind_kebab_case() {
        let mut t = task("task-mock-exam-w5", 5, 120, false);
        t.kind = TaskKind::MockExam;
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains("\"mock-exam\""));
    }
}
