use crate::error::{HistoryError, Result};
use crate::persist::write_json_atomic;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use demeter_types::{round2, DailyAverage, Role, Snapshot};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// 最多保留的记录数：7 天 × 每小时 1 条
pub const MAX_RECORDS: usize = 168;

/// 文件存储的传感器历史
///
/// 整个日志是一个 JSON 数组，旧的在前。每次追加都重写整个文件。
/// 同一实例的所有克隆共享一把文件锁。
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    max_records: usize,
    lock: Arc<Mutex<()>>,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_records: MAX_RECORDS,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加一条快照
    ///
    /// 文件缺失或损坏时视为空日志，损坏的内容会被覆盖。
    pub async fn append(&self, snapshot: Snapshot) -> Result<()> {
        let _guard = self.lock.lock().await;

        let mut log = match self.read_log().await {
            Ok(Some(log)) => log,
            Ok(None) => Vec::new(),
            Err(HistoryError::Corrupt { path, source }) => {
                warn!(path = %path.display(), error = %source, "History file corrupt, starting a new log");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        log.push(snapshot);
        let evicted = retain_latest(&mut log, self.max_records);

        write_json_atomic(&self.path, &log).await?;

        debug!(records = log.len(), evicted, "Snapshot appended to history");
        Ok(())
    }

    /// 全部保留的记录；文件从未写入过时返回 `None`
    pub async fn all(&self) -> Result<Option<Vec<Snapshot>>> {
        let _guard = self.lock.lock().await;
        self.read_log().await
    }

    /// 最近 24 小时的记录
    pub async fn last_24h(&self) -> Result<Option<Vec<Snapshot>>> {
        self.last_24h_at(Utc::now()).await
    }

    pub async fn last_24h_at(&self, now: DateTime<Utc>) -> Result<Option<Vec<Snapshot>>> {
        let cutoff = now - Duration::hours(24);

        Ok(self.all().await?.map(|log| {
            log.into_iter()
                .filter(|s| s.timestamp() >= cutoff)
                .collect()
        }))
    }

    /// 最近 7 个自然日（含今天）的每日平均值
    pub async fn daily_average_7d(&self) -> Result<Option<Vec<DailyAverage>>> {
        self.daily_average_7d_at(Utc::now().date_naive()).await
    }

    pub async fn daily_average_7d_at(&self, today: NaiveDate) -> Result<Option<Vec<DailyAverage>>> {
        let since = today - Duration::days(6);

        Ok(self.all().await?.map(|log| {
            let recent: Vec<Snapshot> = log.into_iter().filter(|s| s.date() >= since).collect();
            daily_averages(&recent)
        }))
    }

    async fn read_log(&self) -> Result<Option<Vec<Snapshot>>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(HistoryError::io(&self.path, e)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| HistoryError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }
}

/// 从头部丢弃记录直到不超过上限，返回丢弃的条数
pub fn retain_latest(log: &mut Vec<Snapshot>, max_records: usize) -> usize {
    let excess = log.len().saturating_sub(max_records);
    log.drain(..excess);
    excess
}

/// 按 UTC 日期分组求平均
///
/// 每个角色只对有值的读数取算术平均，结果保留两位小数。
/// 某天某角色没有任何有效读数时该键不出现。
pub fn daily_averages(snapshots: &[Snapshot]) -> Vec<DailyAverage> {
    let mut days: BTreeMap<NaiveDate, BTreeMap<Role, (f64, u32)>> = BTreeMap::new();

    for snapshot in snapshots {
        let day = days.entry(snapshot.date()).or_default();
        for (role, value) in snapshot.readings() {
            if let Some(value) = value {
                let (sum, count) = day.entry(*role).or_insert((0.0, 0));
                *sum += value;
                *count += 1;
            }
        }
    }

    days.into_iter()
        .map(|(date, sums)| DailyAverage {
            date,
            averages: sums
                .into_iter()
                .map(|(role, (sum, count))| (role, round2(sum / f64::from(count))))
                .collect(),
        })
        .collect()
}
