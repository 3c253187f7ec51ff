use std::path::PathBuf;
use thiserror::Error;

/// 历史存储错误类型
#[derive(Error, Debug)]
pub enum HistoryError {
    /// 文件读写失败
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 历史文件内容无法解析
    #[error("History file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// 序列化失败
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HistoryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HistoryError::Io {
            path: path.into(),
            source,
        }
    }
}

/// 历史存储结果类型
pub type Result<T> = std::result::Result<T, HistoryError>;
