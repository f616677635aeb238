use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};

use crate::config::LevelConfig;
use crate::error::{PlanError, PlanResult};
use crate::plan::budget::compute_time_budget;
use crate::plan::model::{StudyPlan, Task, WeeklyGoal};
use crate::plan::progress::readiness_score;
use crate::plan::weekly::WeekPlanner;
use crate::schedule::ScheduleConfig;

/// Result of applying a schedule change to a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub plan: StudyPlan,
    /// Completed tasks carried into the new plan.
    pub preserved: usize,
    /// Completed tasks whose week lies beyond the new plan horizon.
    pub dropped: Vec<Task>,
}

/// Rebuild a plan for a new schedule, keeping completed work in its original week.
///
/// The existing plan is never modified. Future weeks are regenerated from the
/// plan's original diagnostic, then every completed task whose week still exists
/// is placed at the front of that week. Fresh tasks that share an id with a
/// re-inserted one are discarded so ids stay unique. Given the same plan,
/// schedule and `now`, the output is always identical.
pub fn reconcile_plan(
    existing: &StudyPlan,
    plan_id: &str,
    schedule: ScheduleConfig,
    level: &LevelConfig,
    now: DateTime<Utc>,
) -> PlanResult<ReconcileOutcome> {
    if !existing.is_active || existing.plan_id != plan_id {
        return Err(PlanError::PlanNotFound { plan_id: plan_id.to_string() });
    }
    level.validate()?;

    let budget = compute_time_budget(&schedule, level, now)?;
    let num_weeks = budget.weeks_until_exam;

    let mut by_week: BTreeMap<u32, Vec<Task>> = BTreeMap::new();
    let mut dropped = Vec::new();
    for task in existing.tasks().filter(|t| t.completed) {
        match task.week() {
            Some(week) if week <= num_weeks => by_week.entry(week).or_default().push(task.clone()),
            _ => dropped.push(task.clone()),
        }
    }

    let mut weeks = WeekPlanner {
        level,
        assessment: &existing.assessment,
        budget,
        plan_start: now,
    }
    .build_weeks();

    let mut preserved = 0;
    for (week_number, completed) in by_week {
        if let Some(week) = weeks.get_mut(week_number as usize - 1) {
            preserved += completed.len();
            merge_completed(week, completed);
        }
    }

    let mut plan = existing.clone();
    plan.current_week = current_week(&weeks, now);
    plan.weeks = weeks;
    plan.total_weeks = num_weeks;
    plan.start_date = now;
    plan.end_date = schedule.exam_date;
    plan.schedule = schedule;
    plan.progress.total_study_hours = budget.total_study_hours;
    plan.last_updated = now;
    plan.refresh_totals();
    if plan.progress.completed_tasks > 0 {
        plan.progress.exam_readiness_score = readiness_score(&plan) as f64;
    }

    if !dropped.is_empty() {
        tracing::warn!(
            plan_id = %plan.plan_id,
            dropped = dropped.len(),
            new_weeks = num_weeks,
            "Completed tasks fall beyond the new plan horizon"
        );
    }
    tracing::info!(
        plan_id = %plan.plan_id,
        old_weeks = existing.total_weeks,
        new_weeks = num_weeks,
        preserved = preserved,
        "Plan reconciled with new schedule"
    );

    Ok(ReconcileOutcome { plan, preserved, dropped })
}

fn merge_completed(week: &mut WeeklyGoal, mut completed: Vec<Task>) {
    let kept: HashSet<&str> = completed.iter().map(|t| t.id.as_str()).collect();
    let fresh: Vec<Task> = week
        .tasks
        .drain(..)
        .filter(|t| !kept.contains(t.id.as_str()))
        .collect();
    for task in &mut completed {
        task.week_number = week.week_number;
    }
    completed.extend(fresh);
    week.tasks = completed;
    week.refresh_completion();
}

/// Week containing `now`, else the first incomplete week, else week 1.
pub fn current_week(weeks: &[WeeklyGoal], now: DateTime<Utc>) -> u32 {
    weeks
        .iter()
        .find(|w| w.contains(now))
        .or_else(|| weeks.iter().find(|w| !w.completed))
        .map(|w| w.week_number)
        .unwrap_or(1)
}
