use crate::error::{HistoryError, Result};
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 原子写入 JSON 文件
///
/// 先写同目录下的临时文件，再重命名覆盖目标文件；读者只会看到旧文件或完整的新文件。
pub async fn write_json_atomic<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let bytes = serde_json::to_vec_pretty(value)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| HistoryError::io(parent, e))?;
    }

    let tmp = temp_path(path);
    fs::write(&tmp, &bytes)
        .await
        .map_err(|e| HistoryError::io(&tmp, e))?;

    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(HistoryError::io(path, e));
    }

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.json");

        write_json_atomic(&path, &vec![1, 2, 3]).await.unwrap();
        write_json_atomic(&path, &vec![4]).await.unwrap();

        let stored: Vec<i32> = serde_json::from_slice(&fs::read(&path).await.unwrap()).unwrap();
        assert_eq!(stored, vec![4]);
        assert!(!temp_path(&path).exists());
    }

    #[tokio::test]
    async fn test_write_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("values.json");

        write_json_atomic(&path, &serde_json::json!({"a": 1})).await.unwrap();
        assert!(path.exists());
    }
}
