use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::assessment::Category;
use crate::error::{PlanError, PlanResult};
use crate::plan::model::{StudyPlan, StudySession, TaskScore};
use crate::plan::reconcile::current_week;

const TASK_WEIGHT: f64 = 40.0;
const HOURS_WEIGHT: f64 = 30.0;
const WEEKS_WEIGHT: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadinessBand {
    Excellent,
    Good,
    Fair,
    NeedsWork,
}

impl ReadinessBand {
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 80 => ReadinessBand::Excellent,
            s if s >= 60 => ReadinessBand::Good,
            s if s >= 40 => ReadinessBand::Fair,
            _ => ReadinessBand::NeedsWork,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streaks {
    pub current: u32,
    pub longest: u32,
    pub last_study_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub readiness_score: u32,
    pub band: ReadinessBand,
    pub completion_percentage: f64,
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Share of scheduled study days so far on which something was completed, 0-100.
    pub consistency: f64,
}

fn ratio(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole
    } else {
        0.0
    }
}

pub fn completion_percentage(plan: &StudyPlan) -> f64 {
    ratio(plan.progress.completed_tasks as f64, plan.progress.total_tasks as f64) * 100.0
}

/// 40% task completion, 30% hours invested (capped), 30% weeks completed.
pub fn readiness_score(plan: &StudyPlan) -> u32 {
    let p = &plan.progress;
    let tasks = ratio(p.completed_tasks as f64, p.total_tasks as f64);
    let hours = ratio(p.completed_study_hours, p.total_study_hours).min(1.0);
    let weeks = ratio(plan.completed_weeks() as f64, plan.total_weeks as f64);
    (TASK_WEIGHT * tasks + HOURS_WEIGHT * hours + WEEKS_WEIGHT * weeks).round() as u32
}

fn study_dates(plan: &StudyPlan) -> BTreeSet<NaiveDate> {
    plan.tasks()
        .filter_map(|t| t.completed_at)
        .map(|at| at.date_naive())
        .collect()
}

/// Streaks over the calendar days on which at least one task was completed.
///
/// The current streak only counts if its last day is today or yesterday.
pub fn streaks(plan: &StudyPlan, today: NaiveDate) -> Streaks {
    let dates = study_dates(plan);
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for date in &dates {
        run = match previous {
            Some(prev) if *date - prev == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(*date);
    }

    let last = dates.iter().next_back().copied();
    let current = match last {
        Some(day) if today - day <= Duration::days(1) && day <= today => run,
        _ => 0,
    };
    Streaks { current, longest, last_study_date: last }
}

/// Percentage of scheduled study days from plan start to `today` with any completion.
pub fn consistency(plan: &StudyPlan, today: NaiveDate) -> f64 {
    let dates = study_dates(plan);
    let mut scheduled = 0u32;
    let mut studied = 0u32;
    let mut day = plan.start_date.date_naive();
    while day <= today {
        if plan.schedule.is_study_day(day) {
            scheduled += 1;
            if dates.contains(&day) {
                studied += 1;
            }
        }
        day += Duration::days(1);
    }
    ratio(studied as f64, scheduled as f64) * 100.0
}

pub fn readiness_report(plan: &StudyPlan, today: NaiveDate) -> ReadinessReport {
    let score = readiness_score(plan);
    let streaks = streaks(plan, today);
    ReadinessReport {
        readiness_score: score,
        band: ReadinessBand::from_score(score),
        completion_percentage: completion_percentage(plan),
        current_streak: streaks.current,
        longest_streak: streaks.longest,
        consistency: consistency(plan, today),
    }
}

/// Mark a task complete and roll the change up through the week and the plan.
///
/// Returns `Ok(false)` without touching the plan if the task was already complete.
pub fn complete_task(
    plan: &mut StudyPlan,
    task_id: &str,
    score: Option<TaskScore>,
    now: DateTime<Utc>,
) -> PlanResult<bool> {
    let week = plan
        .weeks
        .iter_mut()
        .find(|w| w.tasks.iter().any(|t| t.id == task_id))
        .ok_or_else(|| PlanError::TaskNotFound { task_id: task_id.to_string() })?;
    let task = week
        .tasks
        .iter_mut()
        .find(|t| t.id == task_id)
        .ok_or_else(|| PlanError::TaskNotFound { task_id: task_id.to_string() })?;
    if task.completed {
        return Ok(false);
    }

    task.completed = true;
    task.completed_at = Some(now);
    if score.is_some() {
        task.score = score;
    }
    let task = task.clone();
    week.refresh_completion();

    let today = now.date_naive();
    if let Some(category) = task.kind.category() {
        if let Some(cp) = plan
            .progress
            .category_progress
            .iter_mut()
            .find(|cp| cp.category == category)
        {
            cp.last_practice_date = Some(today);
            if let Some(pct) = task.score.and_then(|s| s.percentage()) {
                cp.record_score(pct);
            }
        }
    }

    record_session(
        &mut plan.progress.study_sessions,
        &task.id,
        task.kind.category(),
        task.estimated_minutes,
        now,
    );
    plan.refresh_totals();

    let streaks = streaks(plan, today);
    plan.progress.current_streak = streaks.current;
    plan.progress.longest_streak = plan.progress.longest_streak.max(streaks.longest);
    plan.progress.last_study_date = streaks.last_study_date;
    plan.progress.exam_readiness_score = readiness_score(plan) as f64;
    plan.current_week = current_week(&plan.weeks, now);
    plan.last_updated = now;

    tracing::debug!(plan_id = %plan.plan_id, task_id = task_id, "Task completed");
    Ok(true)
}

fn record_session(
    sessions: &mut Vec<StudySession>,
    task_id: &str,
    category: Option<Category>,
    minutes: u32,
    now: DateTime<Utc>,
) {
    let date = now.date_naive();
    let index = match sessions.iter().position(|s| s.date == date) {
        Some(i) => i,
        None => {
            sessions.push(StudySession {
                session_id: format!("session-{}", date),
                date,
                started_at: now,
                ended_at: now,
                duration_minutes: 0,
                task_ids: Vec::new(),
                categories: Vec::new(),
            });
            sessions.len() - 1
        }
    };
    let session = &mut sessions[index];
    session.task_ids.push(task_id.to_string());
    session.duration_minutes += minutes;
    session.ended_at = now;
    if let Some(c) = category {
        if !session.categories.contains(&c) {
            session.categories.push(c);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands() {
        assert_eq!(ReadinessBand::from_score(85), ReadinessBand::Excellent);
        assert_eq!(ReadinessBand::from_score(60), ReadinessBand::Good);
        assert_eq!(ReadinessBand::from_score(43), ReadinessBand::Fair);
        assert_eq!(ReadinessBand::from_score(0), ReadinessBand::NeedsWork);
    }

    #[test]
    fn test_ratio_guards_zero() {
        assert_eq!(ratio(5.0, 0.0), 0.0);
        assert_eq!(ratio(1.0, 4.0), 0.25);
    }
}
