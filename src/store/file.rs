use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::plan::StudyPlan;
use crate::store::{check_version, PlanStore, WriteOutcome};

const APP_DIR: &str = "com.prepplan.app";

/// Platform app-data directory for plan documents.
pub fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.push("Library/Application Support");
            dir.push(APP_DIR);
            dir.push("plans");
            return dir;
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            let mut dir = PathBuf::from(appdata);
            dir.push(APP_DIR);
            dir.push("plans");
            return dir;
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.push(".local/share");
            dir.push(APP_DIR);
            dir.push("plans");
            return dir;
        }
    }

    // Fallback
    PathBuf::from("data/plans")
}

/// One pretty-printed JSON document per user under `base_dir`.
///
/// The version check and the write happen under one lock, so writers inside
/// this process cannot interleave. Documents are written to a temporary file
/// and renamed into place.
pub struct FilePlanStore {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FilePlanStore {
    pub fn new<P: Into<PathBuf>>(base_dir: P) -> Self {
        FilePlanStore {
            base_dir: base_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn in_app_data() -> Self {
        Self::new(default_data_dir())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn plan_path(&self, user_id: &str) -> Result<PathBuf, StoreError> {
        let valid = !user_id.is_empty()
            && user_id != "."
            && user_id != ".."
            && !user_id.contains(['/', '\\']);
        if !valid {
            return Err(StoreError::new(
                format!("Invalid user id for file store: {:?}", user_id),
                "path",
            ));
        }
        Ok(self.base_dir.join(format!("{}.json", user_id)))
    }

    async fn load(path: &Path) -> Result<Option<StudyPlan>, StoreError> {
        let context = || format!("path: {:?}", path);
        match tokio::fs::read_to_string(path).await {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| StoreError::from(e).with_context(context()))
                .map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::from(e).with_context(context())),
        }
    }
}

#[async_trait]
impl PlanStore for FilePlanStore {
    async fn read_plan(&self, user_id: &str) -> Result<Option<StudyPlan>, StoreError> {
        let path = self.plan_path(user_id)?;
        Self::load(&path).await
    }

    async fn write_plan(
        &self,
        user_id: &str,
        plan: &StudyPlan,
        expected_version: Option<u64>,
    ) -> Result<WriteOutcome, StoreError> {
        let path = self.plan_path(user_id)?;
        let _guard = self.write_lock.lock().await;

        let current = Self::load(&path).await?.map(|p| p.version);
        let outcome = check_version(current, expected_version);
        if outcome != WriteOutcome::Written {
            return Ok(outcome);
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::from(e).with_context(format!("path: {:?}", parent)))?;
        }

        let json = serde_json::to_string_pretty(plan).map_err(|e| {
            StoreError::new(format!("Failed to serialize plan: {}", e), "json_serialize")
        })?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StoreError::from(e).with_context(format!("path: {:?}", tmp)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::from(e).with_context(format!("path: {:?}", path)))?;

        tracing::debug!(user_id = user_id, version = plan.version, "Plan document written");
        Ok(WriteOutcome::Written)
    }
}
