use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use tokio::sync::OwnedMutexGuard;

use crate::assessment::DiagnosticAssessment;
use crate::clock::{Clock, SystemClock};
use crate::config::{ExamLevel, LevelConfig};
use crate::error::{PlanError, PlanResult};
use crate::metrics::PlanMetrics;
use crate::plan::progress::{complete_task, readiness_report, ReadinessReport};
use crate::plan::reconcile::{current_week, reconcile_plan, ReconcileOutcome};
use crate::plan::{generate_study_plan, new_plan_id, PlanRequest, StudyPlan, Task, TaskScore};
use crate::schedule::ScheduleConfig;
use crate::store::{PlanStore, WriteOutcome};

const PLAN_CACHE_SIZE: usize = 64;

type UserLocks = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

struct UserLockGuard<'a> {
    locks: &'a UserLocks,
    user_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UserLockGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.locks.lock();
        // Waiters clone the Arc under this map lock, so a count of one means nobody else wants it
        if locks.get(&self.user_id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&self.user_id);
        }
    }
}

/// Entry point for everything a client does with a study plan.
///
/// Owns the store, the level configurations and all mutable state explicitly.
/// Mutating operations hold a per-user lock for their whole read-modify-write
/// sequence and always read from the store, never from the cache; writes are
/// compare-and-set on the plan version, so a writer in another process shows
/// up as `PlanError::ConcurrentModification` instead of a lost update.
pub struct PrepPlanService<S: PlanStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    levels: HashMap<ExamLevel, LevelConfig>,
    /// Active plans by user id
    cache: Arc<RwLock<LruCache<String, StudyPlan>>>,
    user_locks: UserLocks,
    metrics: PlanMetrics,
}

impl<S: PlanStore> PrepPlanService<S> {
    /// Service over `store` with the built-in level configurations and the system clock.
    pub fn new(store: Arc<S>) -> Self {
        PrepPlanService {
            store,
            clock: Arc::new(SystemClock),
            levels: LevelConfig::builtins(),
            cache: Arc::new(RwLock::new(LruCache::new(
                NonZeroUsize::new(PLAN_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN),
            ))),
            user_locks: Mutex::new(HashMap::new()),
            metrics: PlanMetrics::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Install or replace the configuration for one exam level.
    pub fn with_level_config(mut self, config: LevelConfig) -> PlanResult<Self> {
        config.validate()?;
        self.levels.insert(config.level, config);
        Ok(self)
    }

    pub fn level_config(&self, level: ExamLevel) -> PlanResult<&LevelConfig> {
        self.levels.get(&level).ok_or(PlanError::UnsupportedLevel(level))
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn metrics(&self) -> &PlanMetrics {
        &self.metrics
    }

    /// Generate a fresh plan and make it the user's active plan.
    ///
    /// Replaces whatever plan the user had before. Nothing is written if
    /// generation fails.
    pub async fn create_plan(
        &self,
        user_id: &str,
        level: ExamLevel,
        schedule: ScheduleConfig,
        assessment: DiagnosticAssessment,
        ai_insights: Vec<String>,
    ) -> PlanResult<StudyPlan> {
        let config = self.level_config(level)?;
        let _guard = self.lock_user(user_id).await;

        let now = self.clock.now();
        let request = PlanRequest {
            plan_id: new_plan_id(now),
            user_id: user_id.to_string(),
            schedule,
            assessment,
            ai_insights,
        };
        let mut plan = generate_study_plan(request, config, now)?;

        let expected = self.read(user_id).await?.map(|p| p.version);
        plan.version = expected.map_or(1, |v| v + 1);
        self.persist(user_id, &plan, expected).await?;

        self.metrics.record_plan_generated();
        Ok(plan)
    }

    /// The user's active plan, if any. Served from the cache when possible.
    pub async fn get_active_plan(&self, user_id: &str) -> PlanResult<Option<StudyPlan>> {
        let cached = self.cache.read().peek(user_id).cloned();
        if cached.is_some() {
            self.metrics.record_cache_hit();
            return Ok(cached);
        }
        self.metrics.record_cache_miss();

        let plan = self.read(user_id).await?.filter(|p| p.is_active);
        if let Some(ref plan) = plan {
            self.cache.write().put(user_id.to_string(), plan.clone());
        }
        Ok(plan)
    }

    /// Apply a new schedule to the active plan, keeping completed work.
    pub async fn update_schedule(
        &self,
        user_id: &str,
        plan_id: &str,
        schedule: ScheduleConfig,
    ) -> PlanResult<ReconcileOutcome> {
        let _guard = self.lock_user(user_id).await;

        let existing = self.load_active(user_id, plan_id).await?;
        let config = self.level_config(existing.exam_level)?;
        let mut outcome = reconcile_plan(&existing, plan_id, schedule, config, self.clock.now())?;

        outcome.plan.version = existing.version + 1;
        self.persist(user_id, &outcome.plan, Some(existing.version)).await?;

        self.metrics.record_reconciliation();
        Ok(outcome)
    }

    /// Mark one task complete and persist the updated plan.
    ///
    /// Completing a task that is already complete returns the plan without writing.
    pub async fn complete_task(
        &self,
        user_id: &str,
        plan_id: &str,
        task_id: &str,
        score: Option<TaskScore>,
    ) -> PlanResult<StudyPlan> {
        let _guard = self.lock_user(user_id).await;

        let mut plan = self.load_active(user_id, plan_id).await?;
        let expected = plan.version;
        if !complete_task(&mut plan, task_id, score, self.clock.now())? {
            return Ok(plan);
        }

        plan.version = expected + 1;
        self.persist(user_id, &plan, Some(expected)).await?;

        self.metrics.record_task_completed();
        Ok(plan)
    }

    /// Incomplete tasks of the week the clock is currently in.
    pub async fn todays_tasks(&self, user_id: &str) -> PlanResult<Vec<Task>> {
        let plan = match self.get_active_plan(user_id).await? {
            Some(plan) => plan,
            None => return Ok(Vec::new()),
        };
        let week_number = current_week(&plan.weeks, self.clock.now());
        Ok(plan
            .week(week_number)
            .map(|w| w.tasks.iter().filter(|t| !t.completed).cloned().collect())
            .unwrap_or_default())
    }

    pub async fn readiness(&self, user_id: &str) -> PlanResult<Option<ReadinessReport>> {
        let today = self.clock.now().date_naive();
        Ok(self
            .get_active_plan(user_id)
            .await?
            .map(|plan| readiness_report(&plan, today)))
    }

    /// Serialize mutations for one user. The lock entry is dropped once no one holds or awaits it.
    async fn lock_user(&self, user_id: &str) -> UserLockGuard<'_> {
        let lock = self
            .user_locks
            .lock()
            .entry(user_id.to_string())
            .or_default()
            .clone();
        UserLockGuard {
            locks: &self.user_locks,
            user_id: user_id.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    async fn read(&self, user_id: &str) -> PlanResult<Option<StudyPlan>> {
        self.store.read_plan(user_id).await.map_err(|e| {
            self.metrics.record_store_failure();
            tracing::warn!(user_id = user_id, error = %e, "Failed to read plan");
            PlanError::Store(e)
        })
    }

    async fn load_active(&self, user_id: &str, plan_id: &str) -> PlanResult<StudyPlan> {
        self.read(user_id)
            .await?
            .filter(|p| p.is_active && p.plan_id == plan_id)
            .ok_or_else(|| PlanError::PlanNotFound { plan_id: plan_id.to_string() })
    }

    async fn persist(&self, user_id: &str, plan: &StudyPlan, expected: Option<u64>) -> PlanResult<()> {
        let outcome = self
            .store
            .write_plan(user_id, plan, expected)
            .await
            .map_err(|e| {
                self.metrics.record_store_failure();
                tracing::error!(user_id = user_id, plan_id = %plan.plan_id, error = %e, "Failed to write plan");
                PlanError::Store(e)
            });

        match outcome {
            Ok(WriteOutcome::Written) => {
                self.cache.write().put(user_id.to_string(), plan.clone());
                Ok(())
            }
            Ok(WriteOutcome::Conflict { current }) => {
                self.metrics.record_version_conflict();
                self.cache.write().pop(user_id);
                tracing::warn!(
                    plan_id = %plan.plan_id,
                    expected = ?expected,
                    found = ?current,
                    "Plan was modified concurrently"
                );
                Err(PlanError::ConcurrentModification {
                    plan_id: plan.plan_id.clone(),
                    expected,
                    found: current,
                })
            }
            Err(e) => {
                self.cache.write().pop(user_id);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::Category;
    use crate::clock::FixedClock;
    use crate::store::MemoryPlanStore;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap()
    }

    fn service() -> PrepPlanService<MemoryPlanStore> {
        PrepPlanService::new(Arc::new(MemoryPlanStore::new())).with_clock(Arc::new(FixedClock::new(now())))
    }

    fn assessment() -> DiagnosticAssessment {
        let b1 = LevelConfig::builtin(ExamLevel::B1).unwrap();
        DiagnosticAssessment::from_sections(
            "diag",
            now(),
            b1,
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

    #[tokio::test]
    async fn test_user_locks_released_after_each_operation() {
        let service = service();
        let schedule = ScheduleConfig::with_days_per_week(now() + Duration::weeks(8), 1.5, 5);
        let plan = service
            .create_plan("user-1", ExamLevel::B1, schedule, assessment(), vec![])
            .await
            .unwrap();
        assert!(service.user_locks.lock().is_empty());

        let err = service
            .complete_task("user-1", &plan.plan_id, "task-w1-unknown-1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::TaskNotFound { .. }));
        assert!(service.user_locks.lock().is_empty());

        for user in ["user-2", "user-3"] {
            let _ = service.complete_task(user, "plan-x", "task-w1-reading-1", None).await;
        }
        assert!(service.user_locks.lock().is_empty());
    }

    #[tokio::test]
    async fn test_user_lock_kept_while_contended() {
        let service = service();
        let first = service.lock_user("user-1").await;
        let waiting = service.user_locks.lock().get("user-1").cloned().unwrap();
        drop(first);
        assert!(service.user_locks.lock().contains_key("user-1"));
        drop(waiting);

        let second = service.lock_user("user-1").await;
        drop(second);
        assert!(service.user_locks.lock().is_empty());
    }
}
