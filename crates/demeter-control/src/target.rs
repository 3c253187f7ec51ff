use crate::error::Result;
use demeter_timeseries::write_json_atomic;
use demeter_types::TargetValues;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// 目标值存储
///
/// 单个 JSON 对象文件。每个控制周期都重新读取，不做缓存。
#[derive(Debug, Clone)]
pub struct TargetStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl TargetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取目标值
    ///
    /// 文件缺失、为空、无法解析、缺少字段或取值不合法时返回默认值。
    pub async fn load(&self) -> TargetValues {
        let _guard = self.lock.lock().await;

        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), error = %e, "Failed to read target values, using defaults");
                }
                return TargetValues::default();
            }
        };

        let targets = match serde_json::from_slice::<TargetValues>(&bytes) {
            Ok(targets) => targets,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Target values unreadable, using defaults");
                return TargetValues::default();
            }
        };

        if let Err(e) = targets.validate() {
            warn!(path = %self.path.display(), error = %e, "Stored target values invalid, using defaults");
            return TargetValues::default();
        }

        targets
    }

    /// 校验后整体覆盖写入
    pub async fn save(&self, targets: &TargetValues) -> Result<()> {
        targets.validate()?;

        let _guard = self.lock.lock().await;
        write_json_atomic(&self.path, targets).await?;

        info!(
            low_ph = targets.low_ph,
            high_ph = targets.high_ph,
            low_ec = targets.low_ec,
            "Target values updated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ControlError;

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = TargetStore::new(dir.path().join("target_values.json"));

        assert_eq!(store.load().await, TargetValues::new(5.5, 6.4, 1000.0));
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = TargetStore::new(dir.path().join("target_values.json"));

        store.save(&TargetValues::new(5.0, 6.0, 900.0)).await.unwrap();
        assert_eq!(store.load().await, TargetValues::new(5.0, 6.0, 900.0));

        let raw: serde_json::Value =
            serde_json::from_slice(&tokio::fs::read(store.path()).await.unwrap()).unwrap();
        assert_eq!(
            raw,
            serde_json::json!({"low_pH": 5.0, "high_pH": 6.0, "low_EC": 900.0})
        );
    }

    #[tokio::test]
    async fn test_unusable_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("target_values.json");
        let store = TargetStore::new(&path);

        for content in ["", "not json", r#"{"low_pH": 5.0, "high_pH": 6.0}"#, r#"{"low_pH": 7.0, "high_pH": 6.0, "low_EC": 900}"#] {
            tokio::fs::write(&path, content).await.unwrap();
            assert_eq!(store.load().await, TargetValues::default(), "content: {content}");
        }
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_and_keeps_old() {
        let dir = tempfile::tempdir().unwrap();
        let store = TargetStore::new(dir.path().join("target_values.json"));
        store.save(&TargetValues::new(5.0, 6.0, 900.0)).await.unwrap();

        let err = store.save(&TargetValues::new(6.0, 5.0, 900.0)).await.unwrap_err();
        assert!(matches!(err, ControlError::InvalidTargets(_)));
        assert_eq!(store.load().await, TargetValues::new(5.0, 6.0, 900.0));
    }
}
