use serde::{Serialize, Deserialize};
use std::fmt;
use thiserror::Error;

use crate::config::ExamLevel;

/// Failure raised by a persistence adapter.
///
/// Store errors are carried to the caller untouched so that "the input was
/// invalid" can always be told apart from "the store is unavailable".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreError {
    pub message: String,
    pub stage: String,
    pub context: Option<String>,
    pub source: Option<String>,
}

impl StoreError {
    /// Create a new error with stage and message
    pub fn new<S: Into<String>>(message: S, stage: &'static str) -> Self {
        StoreError {
            message: message.into(),
            stage: stage.to_string(),
            context: None,
            source: None,
        }
    }

    /// Add additional context information (usually the document path)
    pub fn with_context<S: Into<String>>(mut self, context: S) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add source error information
    pub fn with_source<S: Into<String>>(mut self, source: S) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage, self.message)?;
        if let Some(ref context) = self.context {
            write!(f, " (context: {})", context)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (source: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::new(format!("I/O error: {}", err), "io").with_source("std::io")
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::new(format!("JSON error: {}", err), "json_parse").with_source("serde_json")
    }
}

/// Errors returned by plan generation, reconciliation and task completion.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Invalid schedule: {reason}")]
    InvalidSchedule { reason: String },

    #[error("Plan '{plan_id}' not found")]
    PlanNotFound { plan_id: String },

    #[error("Task '{task_id}' not found")]
    TaskNotFound { task_id: String },

    #[error("Plan '{plan_id}' was modified concurrently (expected version {expected:?}, found {found:?})")]
    ConcurrentModification {
        plan_id: String,
        expected: Option<u64>,
        found: Option<u64>,
    },

    #[error("Prep plan not supported for level: {0}")]
    UnsupportedLevel(ExamLevel),

    #[error("Invalid level configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PlanError {
    pub fn invalid_schedule<S: Into<String>>(reason: S) -> Self {
        PlanError::InvalidSchedule { reason: reason.into() }
    }

    /// True when the failure came from the persistence adapter rather than from input validation.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, PlanError::Store(_))
    }
}

pub type PlanResult<T> = Result<T, PlanError>;
