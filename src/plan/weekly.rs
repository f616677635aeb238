use chrono::{DateTime, Duration, Utc};

use crate::assessment::{Category, DiagnosticAssessment};
use crate::config::{LevelConfig, MockExamPolicy};
use crate::plan::budget::TimeBudget;
use crate::plan::model::{Difficulty, FocusArea, Task, WeeklyGoal};
use crate::plan::priority::resolve_priorities;
use crate::plan::tasks::{mock_exam_task, synthesize_tasks};

/// Easy for the first third of the plan, medium for the second, hard after that.
pub fn difficulty_for_week(week_number: u32, total_weeks: u32) -> Difficulty {
    let progress = week_number as f64 / total_weeks.max(1) as f64 * 100.0;
    if progress <= 33.0 {
        Difficulty::Easy
    } else if progress <= 66.0 {
        Difficulty::Medium
    } else {
        Difficulty::Hard
    }
}

/// Early weeks drill up to two weaknesses, middle weeks pair a weakness with a
/// strength, and the last two weeks are mock exams and review.
pub fn focus_for_week(
    week_number: u32,
    total_weeks: u32,
    weaknesses: &[Category],
    strengths: &[Category],
) -> Vec<FocusArea> {
    if week_number as f64 <= total_weeks as f64 / 2.0 {
        weaknesses.iter().take(2).copied().map(FocusArea::from).collect()
    } else if week_number + 2 <= total_weeks {
        weaknesses
            .iter()
            .take(1)
            .chain(strengths.iter().take(1))
            .copied()
            .map(FocusArea::from)
            .collect()
    } else {
        vec![FocusArea::MockExam, FocusArea::Review]
    }
}

pub fn focus_description(focus: &[FocusArea]) -> String {
    if focus.contains(&FocusArea::MockExam) {
        return "Mock exams and final preparation".to_string();
    }
    if focus.is_empty() {
        return "Balanced practice across all sections".to_string();
    }
    let labels: Vec<&str> = focus.iter().map(|f| f.label()).collect();
    format!("Focus on {}", labels.join(" and "))
}

/// Sequence number of the mock exam held in this week, if any.
///
/// Plans of at least `minimum_plan_weeks` hold one mock exam in each of weeks
/// `total - 2` and `total - 1`, numbered 1 and 2.
pub fn mock_exam_number(week_number: u32, total_weeks: u32, policy: &MockExamPolicy) -> Option<u32> {
    if total_weeks < policy.minimum_plan_weeks.max(3) {
        return None;
    }
    let first = total_weeks - 2;
    (week_number >= first && week_number < total_weeks).then(|| week_number - first + 1)
}

/// Everything needed to generate any week of one plan.
pub struct WeekPlanner<'a> {
    pub level: &'a LevelConfig,
    pub assessment: &'a DiagnosticAssessment,
    pub budget: TimeBudget,
    pub plan_start: DateTime<Utc>,
}

impl<'a> WeekPlanner<'a> {
    pub fn total_weeks(&self) -> u32 {
        self.budget.weeks_until_exam
    }

    /// Build one week's goal with freshly generated, incomplete tasks.
    pub fn build_week(&self, week_number: u32) -> WeeklyGoal {
        let total = self.total_weeks();
        let difficulty = difficulty_for_week(week_number, total);
        let focus = focus_for_week(
            week_number,
            total,
            &self.assessment.weaknesses,
            &self.assessment.strengths,
        );

        let categories: Vec<Category> = self.level.enabled_categories().map(|c| c.category).collect();
        let allocations = resolve_priorities(
            &categories,
            &self.assessment.weaknesses,
            &self.assessment.strengths,
            self.budget.minutes_per_week(),
            &self.level.task_distribution,
        );

        let mut tasks: Vec<Task> = Vec::new();
        for allocation in &allocations {
            if let Some(config) = self.level.category(allocation.category) {
                tasks.extend(synthesize_tasks(config, week_number, allocation.minutes, difficulty));
            }
        }
        if let Some(number) = mock_exam_number(week_number, total, &self.level.mock_exam) {
            tasks.push(mock_exam_task(week_number, number, &self.level.mock_exam));
        }

        let start_date = self.plan_start + Duration::days(7 * (week_number as i64 - 1));
        let mut week = WeeklyGoal {
            week_number,
            start_date,
            end_date: start_date + Duration::days(7),
            focus_description: focus_description(&focus),
            focus,
            tasks,
            completed: false,
            completion_percentage: 0,
            total_estimated_hours: 0.0,
            completed_hours: 0.0,
        };
        week.refresh_completion();
        week
    }

    /// Weeks 1..=total in order.
    pub fn build_weeks(&self) -> Vec<WeeklyGoal> {
        (1..=self.total_weeks()).map(|w| self.build_week(w)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_thirds() {
        use Difficulty::*;
        let tiers: Vec<Difficulty> = (1..=9).map(|w| difficulty_for_week(w, 9)).collect();
        // 3/9 is 33.3%, already past the first third
        assert_eq!(tiers, vec![Easy, Easy, Medium, Medium, Medium, Hard, Hard, Hard, Hard]);
        let tiers: Vec<Difficulty> = (1..=6).map(|w| difficulty_for_week(w, 6)).collect();
        assert_eq!(tiers, vec![Easy, Medium, Medium, Hard, Hard, Hard]);
    }

    #[test]
    fn test_focus_phases() {
        let weak = [Category::Listening, Category::Writing, Category::Grammar];
        let strong = [Category::Reading];
        assert_eq!(
            focus_for_week(1, 10, &weak, &strong),
            vec![FocusArea::Listening, FocusArea::Writing]
        );
        assert_eq!(
            focus_for_week(6, 10, &weak, &strong),
            vec![FocusArea::Listening, FocusArea::Reading]
        );
        assert_eq!(focus_for_week(9, 10, &weak, &strong), vec![FocusArea::MockExam, FocusArea::Review]);
        assert_eq!(focus_for_week(10, 10, &weak, &strong), vec![FocusArea::MockExam, FocusArea::Review]);
    }

    #[test]
    fn test_focus_description() {
        assert_eq!(
            focus_description(&[FocusArea::Listening, FocusArea::Writing]),
            "Focus on listening and writing"
        );
        assert_eq!(
            focus_description(&[FocusArea::MockExam, FocusArea::Review]),
            "Mock exams and final preparation"
        );
    }

    #[test]
    fn test_mock_exam_weeks() {
        let policy = MockExamPolicy::default();
        let numbers: Vec<Option<u32>> = (1..=8).map(|w| mock_exam_number(w, 8, &policy)).collect();
        assert_eq!(numbers, vec![None, None, None, None, None, Some(1), Some(2), None]);
        assert!((1..=5).all(|w| mock_exam_number(w, 5, &policy).is_none()));
    }
}
