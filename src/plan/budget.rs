use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::LevelConfig;
use crate::error::{PlanError, PlanResult};
use crate::schedule::ScheduleConfig;

const DAY_MS: f64 = 86_400_000.0;

/// Study time available between now and the exam.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeBudget {
    pub days_until_exam: i64,
    pub weeks_until_exam: u32,
    pub total_study_hours: f64,
}

impl TimeBudget {
    pub fn hours_per_week(&self) -> f64 {
        self.total_study_hours / self.weeks_until_exam as f64
    }

    pub fn minutes_per_week(&self) -> f64 {
        self.hours_per_week() * 60.0
    }
}

/// Whole days until the exam, rounded up. An exam today or in the past counts as one day away.
pub fn days_until_exam(exam_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = (exam_date - now).num_milliseconds() as f64;
    ((ms / DAY_MS).ceil() as i64).max(1)
}

/// Convert a schedule into a time budget, rejecting it if the exam is too close for the level.
pub fn compute_time_budget(
    schedule: &ScheduleConfig,
    level: &LevelConfig,
    now: DateTime<Utc>,
) -> PlanResult<TimeBudget> {
    schedule.validate()?;

    let days = days_until_exam(schedule.exam_date, now);
    let weeks = ((days + 6) / 7) as u32;
    if weeks < level.minimum_weeks {
        return Err(PlanError::invalid_schedule(format!(
            "not enough time: minimum {} weeks required for {} preparation, exam is in {} week(s)",
            level.minimum_weeks, level.level, weeks
        )));
    }

    let total_study_hours =
        (days as f64 / 7.0) * schedule.daily_study_hours * schedule.study_days_per_week() as f64;
    if total_study_hours <= 0.0 {
        return Err(PlanError::invalid_schedule("computed study time is not positive"));
    }

    Ok(TimeBudget {
        days_until_exam: days,
        weeks_until_exam: weeks,
        total_study_hours,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExamLevel;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap()
    }

    fn b1() -> &'static LevelConfig {
        LevelConfig::builtin(ExamLevel::B1).unwrap()
    }

    #[test]
    fn test_eight_week_budget() {
        let schedule = ScheduleConfig::with_days_per_week(now() + Duration::weeks(8), 1.5, 5);
        let budget = compute_time_budget(&schedule, b1(), now()).unwrap();
        assert_eq!(budget.days_until_exam, 56);
        assert_eq!(budget.weeks_until_exam, 8);
        assert_eq!(budget.total_study_hours, 60.0);
        assert_eq!(budget.minutes_per_week(), 450.0);
    }

    #[test]
    fn test_partial_day_rounds_up() {
        let exam = now() + Duration::days(29) + Duration::hours(1);
        assert_eq!(days_until_exam(exam, now()), 30);
        let schedule = ScheduleConfig::with_days_per_week(exam, 1.0, 7);
        assert_eq!(compute_time_budget(&schedule, b1(), now()).unwrap().weeks_until_exam, 5);
    }

    #[test]
    fn test_past_exam_clamps_to_one_day() {
        assert_eq!(days_until_exam(now() - Duration::days(3), now()), 1);
        assert_eq!(days_until_exam(now(), now()), 1);
    }

    #[test]
    fn test_past_exam_is_rejected() {
        let schedule = ScheduleConfig::with_days_per_week(now() - Duration::days(3), 1.0, 5);
        let err = compute_time_budget(&schedule, b1(), now()).unwrap_err();
        assert!(matches!(err, PlanError::InvalidSchedule { .. }));
    }

    #[test]
    fn test_too_close_is_rejected() {
        let schedule = ScheduleConfig::with_days_per_week(now() + Duration::weeks(2), 2.0, 5);
        let err = compute_time_budget(&schedule, b1(), now()).unwrap_err();
        assert!(err.to_string().contains("minimum 4 weeks"));
    }
}
