//! Study plan generation, reconciliation and progress tracking.
//!
//! Data flows leaf-first: `budget` turns a schedule into hours, `priority`
//! splits a week's minutes across categories, `tasks` expands each share into
//! concrete tasks, `weekly` assembles one week, and `builder` / `reconcile`
//! drive the whole timeline. `progress` holds the read-side figures and task
//! completion.

pub mod budget;
pub mod builder;
pub mod model;
pub mod priority;
pub mod progress;
pub mod reconcile;
pub mod tasks;
pub mod weekly;

pub use builder::{generate_study_plan, new_plan_id, PlanRequest};
pub use model::{
    CategoryProgress, Difficulty, FocusArea, StudyPlan, StudyPlanProgress, StudySession, Task,
    TaskKind, TaskScore, WeeklyGoal,
};
pub use progress::{complete_task, readiness_report, readiness_score, ReadinessBand, ReadinessReport};
pub use reconcile::{reconcile_plan, ReconcileOutcome};
