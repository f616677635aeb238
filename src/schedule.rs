use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, PlanResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyTime {
    Morning,
    Afternoon,
    Evening,
    Flexible,
}

/// The user's study schedule. Replaced wholesale when the plan is reconciled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub exam_date: DateTime<Utc>,
    /// Hours per study day, in half-hour steps.
    pub daily_study_hours: f64,
    /// Monday first.
    pub study_days: [bool; 7],
    #[serde(default)]
    pub preferred_study_time: Option<StudyTime>,
}

impl ScheduleConfig {
    pub fn new(exam_date: DateTime<Utc>, daily_study_hours: f64, study_days: [bool; 7]) -> Self {
        ScheduleConfig {
            exam_date,
            daily_study_hours,
            study_days,
            preferred_study_time: None,
        }
    }

    /// Schedule studying on the first `days` weekdays starting Monday.
    pub fn with_days_per_week(exam_date: DateTime<Utc>, daily_study_hours: f64, days: usize) -> Self {
        let mut study_days = [false; 7];
        for day in study_days.iter_mut().take(days) {
            *day = true;
        }
        Self::new(exam_date, daily_study_hours, study_days)
    }

    pub fn preferred_time(mut self, time: StudyTime) -> Self {
        self.preferred_study_time = Some(time);
        self
    }

    pub fn study_days_per_week(&self) -> u32 {
        self.study_days.iter().filter(|d| **d).count() as u32
    }

    pub fn is_study_day(&self, date: NaiveDate) -> bool {
        self.study_days[date.weekday().num_days_from_monday() as usize]
    }

    pub fn validate(&self) -> PlanResult<()> {
        let hours = self.daily_study_hours;
        if !hours.is_finite() || hours <= 0.0 {
            return Err(PlanError::invalid_schedule(format!(
                "daily study hours must be positive, got {}",
                hours
            )));
        }
        if hours > 24.0 || (hours * 2.0).fract() != 0.0 {
            return Err(PlanError::invalid_schedule(format!(
                "daily study hours must be a half-hour step up to 24, got {}",
                hours
            )));
        }
        if self.study_days_per_week() == 0 {
            return Err(PlanError::invalid_schedule("at least one study day per week is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_study_days_per_week() {
        let schedule = ScheduleConfig::with_days_per_week(Utc::now(), 1.5, 5);
        assert_eq!(schedule.study_days_per_week(), 5);
        assert_eq!(schedule.study_days, [true, true, true, true, true, false, false]);
    }

    #[test]
    fn test_is_study_day_uses_weekday() {
        let schedule = ScheduleConfig::with_days_per_week(Utc::now(), 1.0, 5);
        // 2026-10-17 is a Saturday
        let saturday = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert!(!schedule.is_study_day(saturday));
        assert!(schedule.is_study_day(monday));
    }

    #[test]
    fn test_validate_rejects_bad_hours() {
        let now = Utc::now();
        assert!(ScheduleConfig::with_days_per_week(now, 0.0, 5).validate().is_err());
        assert!(ScheduleConfig::with_days_per_week(now, 1.25, 5).validate().is_err());
        assert!(ScheduleConfig::with_days_per_week(now, 2.5, 5).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_no_study_days() {
        let schedule = ScheduleConfig::new(Utc::now(), 1.0, [false; 7]);
        assert!(matches!(schedule.validate(), Err(PlanError::InvalidSchedule { .. })));
    }
}
