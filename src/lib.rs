//! Study-plan engine for language-exam preparation.
//!
//! Turns a diagnostic assessment and a study schedule into a week-by-week plan,
//! rebuilds that plan when the schedule changes without losing completed work,
//! and tracks progress and exam readiness.

pub mod assessment;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod plan;
pub mod schedule;
pub mod service;
pub mod store;

pub use assessment::{Category, CategoryLevel, DiagnosticAssessment, OverallLevel};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ExamLevel, LevelConfig};
pub use error::{PlanError, PlanResult, StoreError};
pub use plan::{StudyPlan, Task, TaskScore, WeeklyGoal};
pub use schedule::{ScheduleConfig, StudyTime};
pub use service::PrepPlanService;
pub use store::{FilePlanStore, MemoryPlanStore, PlanStore, WriteOutcome};
