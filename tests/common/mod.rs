#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use prep_plan_lib::assessment::{Category, DiagnosticAssessment};
use prep_plan_lib::config::{ExamLevel, LevelConfig};
use prep_plan_lib::plan::{generate_study_plan, PlanRequest, StudyPlan};
use prep_plan_lib::schedule::ScheduleConfig;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap()
}

pub fn b1() -> &'static LevelConfig {
    LevelConfig::builtin(ExamLevel::B1).unwrap()
}

/// Exam exactly `weeks` weeks from `now()`.
pub fn schedule(weeks: i64, hours: f64, days: usize) -> ScheduleConfig {
    ScheduleConfig::with_days_per_week(now() + Duration::weeks(weeks), hours, days)
}

/// Reading strong, listening and writing weak, grammar and speaking moderate.
pub fn assessment() -> DiagnosticAssessment {
    DiagnosticAssessment::from_sections(
        "diag-1",
        now(),
        b1(),
        &[
            (Category::Reading, 12.0, 15.0),
            (Category::Listening, 3.0, 15.0),
            (Category::Grammar, 6.0, 10.0),
            (Category::Writing, 20.0, 45.0),
            (Category::Speaking, 9.0, 15.0),
        ],
    )
    .unwrap()
}

/// Reading weak, everything else moderate.
pub fn weak_reading_assessment() -> DiagnosticAssessment {
    DiagnosticAssessment::from_sections(
        "diag-2",
        now(),
        b1(),
        &[
            (Category::Reading, 3.0, 15.0),
            (Category::Listening, 9.0, 15.0),
            (Category::Grammar, 6.0, 10.0),
            (Category::Writing, 27.0, 45.0),
            (Category::Speaking, 9.0, 15.0),
        ],
    )
    .unwrap()
}

pub fn request(schedule: ScheduleConfig, assessment: DiagnosticAssessment) -> PlanRequest {
    PlanRequest {
        plan_id: "plan-1".into(),
        user_id: "user-1".into(),
        schedule,
        assessment,
        ai_insights: vec!["Practice listening daily".into()],
    }
}

pub fn plan(weeks: i64) -> StudyPlan {
    generate_study_plan(request(schedule(weeks, 1.5, 5), assessment()), b1(), now()).unwrap()
}

/// Every id appears once and every task sits in a week that exists.
pub fn assert_ids_unique_and_in_range(plan: &StudyPlan) {
    let mut seen = std::collections::HashSet::new();
    for week in &plan.weeks {
        for task in &week.tasks {
            assert!(seen.insert(task.id.as_str()), "duplicate task id {}", task.id);
            assert_eq!(task.week_number, week.week_number, "{} is in the wrong week", task.id);
            assert_eq!(task.week(), Some(week.week_number));
            assert!(task.week_number >= 1 && task.week_number <= plan.total_weeks);
        }
    }
    assert_eq!(seen.len(), plan.progress.total_tasks as usize);
}
