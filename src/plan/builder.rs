use chrono::{DateTime, Utc};
use rand::Rng;

use crate::assessment::DiagnosticAssessment;
use crate::config::LevelConfig;
use crate::error::{PlanError, PlanResult};
use crate::plan::budget::compute_time_budget;
use crate::plan::model::{CategoryProgress, StudyPlan, StudyPlanProgress};
use crate::plan::weekly::WeekPlanner;
use crate::schedule::ScheduleConfig;

/// Inputs for a brand new plan.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub plan_id: String,
    pub user_id: String,
    pub schedule: ScheduleConfig,
    pub assessment: DiagnosticAssessment,
    pub ai_insights: Vec<String>,
}

/// Fresh plan id: creation time plus a random suffix.
pub fn new_plan_id(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::thread_rng().gen();
    format!("plan-{}-{:08x}", now.timestamp_millis(), suffix)
}

/// Build a complete plan in memory.
///
/// The schedule is checked against the level's minimum before any week is
/// generated, so an invalid schedule never yields a partial plan.
pub fn generate_study_plan(
    request: PlanRequest,
    level: &LevelConfig,
    now: DateTime<Utc>,
) -> PlanResult<StudyPlan> {
    level.validate()?;
    if request.assessment.exam_level != level.level {
        return Err(PlanError::InvalidConfig(format!(
            "assessment is for {} but the level config is for {}",
            request.assessment.exam_level, level.level
        )));
    }

    let budget = compute_time_budget(&request.schedule, level, now)?;
    let weeks = WeekPlanner {
        level,
        assessment: &request.assessment,
        budget,
        plan_start: now,
    }
    .build_weeks();

    let category_progress = level
        .enabled_categories()
        .filter_map(|c| {
            request
                .assessment
                .section(c.category)
                .map(|s| CategoryProgress::seeded(c.category, s.percentage))
        })
        .collect();

    let mut plan = StudyPlan {
        plan_id: request.plan_id,
        user_id: request.user_id,
        exam_level: level.level,
        end_date: request.schedule.exam_date,
        schedule: request.schedule,
        total_weeks: budget.weeks_until_exam,
        current_week: 1,
        start_date: now,
        is_active: true,
        is_paused: false,
        progress: StudyPlanProgress {
            total_tasks: 0,
            completed_tasks: 0,
            total_study_hours: budget.total_study_hours,
            completed_study_hours: 0.0,
            current_streak: 0,
            longest_streak: 0,
            last_study_date: None,
            category_progress,
            study_sessions: Vec::new(),
            exam_readiness_score: request.assessment.overall_percentage,
        },
        assessment: request.assessment,
        weeks,
        created_at: now,
        last_updated: now,
        ai_insights: request.ai_insights,
        version: 0,
    };
    plan.refresh_totals();

    tracing::info!(
        plan_id = %plan.plan_id,
        level = %plan.exam_level,
        total_weeks = plan.total_weeks,
        total_tasks = plan.progress.total_tasks,
        total_hours = plan.progress.total_study_hours,
        "Study plan generated"
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::Category;
    use crate::config::ExamLevel;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap()
    }

    fn request(level: &LevelConfig, weeks: i64) -> PlanRequest {
        let assessment = DiagnosticAssessment::from_sections(
            "diag",
            now(),
            level,
            &[
                (Category::Reading, 12.0, 15.0),
                (Category::Listening, 3.0, 15.0),
                (Category::Grammar, 6.0, 10.0),
                (Category::Writing, 20.0, 45.0),
                (Category::Speaking, 9.0, 15.0),
            ],
        )
        .unwrap();
        PlanRequest {
            plan_id: "plan-test".into(),
            user_id: "user-1".into(),
            schedule: ScheduleConfig::with_days_per_week(now() + Duration::weeks(weeks), 1.5, 5),
            assessment,
            ai_insights: vec![],
        }
    }

    #[test]
    fn test_plan_shape() {
        let level = LevelConfig::builtin(ExamLevel::B1).unwrap();
        let plan = generate_study_plan(request(level, 8), level, now()).unwrap();
        assert_eq!(plan.total_weeks, 8);
        assert_eq!(plan.weeks.len(), 8);
        assert_eq!(plan.current_week, 1);
        assert!(plan.is_active && !plan.is_paused);
        assert_eq!(plan.progress.total_study_hours, 60.0);
        assert_eq!(plan.progress.exam_readiness_score, plan.assessment.overall_percentage);
        assert_eq!(plan.progress.category_progress.len(), 5);
        let total: usize = plan.weeks.iter().map(|w| w.tasks.len()).sum();
        assert_eq!(plan.progress.total_tasks as usize, total);
    }

    #[test]
    fn test_category_progress_counts_tasks() {
        let level = LevelConfig::builtin(ExamLevel::B1).unwrap();
        let plan = generate_study_plan(request(level, 8), level, now()).unwrap();
        for cp in &plan.progress.category_progress {
            let count = plan.tasks().filter(|t| t.kind.category() == Some(cp.category)).count();
            assert_eq!(cp.total_tasks as usize, count);
            assert_eq!(cp.initial_score, cp.current_score);
        }
    }

    #[test]
    fn test_level_mismatch_rejected() {
        let b1 = LevelConfig::builtin(ExamLevel::B1).unwrap();
        let b2 = LevelConfig::builtin(ExamLevel::B2).unwrap();
        let err = generate_study_plan(request(b1, 8), b2, now()).unwrap_err();
        assert!(matches!(err, PlanError::InvalidConfig(_)));
    }

    #[test]
    fn test_new_plan_id_format() {
        let id = new_plan_id(now());
        assert!(id.starts_with(&format!("plan-{}-", now().timestamp_millis())));
    }
}
