use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::StoreError;
use crate::plan::StudyPlan;
use crate::store::{check_version, PlanStore, WriteOutcome};

/// In-process store. Can be switched offline to exercise failure paths.
#[derive(Default)]
pub struct MemoryPlanStore {
    plans: RwLock<HashMap<String, StudyPlan>>,
    unavailable: AtomicBool,
}

impl MemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every read and write fails with an `unavailable` store error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Replace a document directly, bypassing the version check.
    pub fn insert(&self, user_id: &str, plan: StudyPlan) {
        self.plans.write().insert(user_id.to_string(), plan);
    }

    pub fn len(&self) -> usize {
        self.plans.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.read().is_empty()
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::new("Plan store is unavailable", "unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl PlanStore for MemoryPlanStore {
    async fn read_plan(&self, user_id: &str) -> Result<Option<StudyPlan>, StoreError> {
        self.ensure_available()?;
        Ok(self.plans.read().get(user_id).cloned())
    }

    async fn write_plan(
        &self,
        user_id: &str,
        plan: &StudyPlan,
        expected_version: Option<u64>,
    ) -> Result<WriteOutcome, StoreError> {
        self.ensure_available()?;
        let mut plans = self.plans.write();
        let outcome = check_version(plans.get(user_id).map(|p| p.version), expected_version);
        if outcome == WriteOutcome::Written {
            plans.insert(user_id.to_string(), plan.clone());
        }
        Ok(outcome)
    }
}
