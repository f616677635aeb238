//! Persistence boundary for study plans.
//!
//! A store holds one whole plan document per user. Writes are compare-and-set
//! on `StudyPlan::version`: the caller passes the version it read (or `None`
//! if it read nothing) and the store refuses the write if the document has
//! moved on since.

mod file;
mod memory;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::plan::StudyPlan;

pub use file::{default_data_dir, FilePlanStore};
pub use memory::MemoryPlanStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The stored version did not match the expected one. Nothing was written.
    Conflict { current: Option<u64> },
}

#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn read_plan(&self, user_id: &str) -> Result<Option<StudyPlan>, StoreError>;

    async fn write_plan(
        &self,
        user_id: &str,
        plan: &StudyPlan,
        expected_version: Option<u64>,
    ) -> Result<WriteOutcome, StoreError>;
}

pub(crate) fn check_version(current: Option<u64>, expected: Option<u64>) -> WriteOutcome {
    if current == expected {
        WriteOutcome::Written
    } else {
        WriteOutcome::Conflict { current }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_version() {
        assert_eq!(check_version(None, None), WriteOutcome::Written);
        assert_eq!(check_version(Some(3), Some(3)), WriteOutcome::Written);
        assert_eq!(check_version(Some(4), Some(3)), WriteOutcome::Conflict { current: Some(4) });
        assert_eq!(check_version(None, Some(1)), WriteOutcome::Conflict { current: None });
        assert_eq!(check_version(Some(1), None), WriteOutcome::Conflict { current: Some(1) });
    }
}
