use crate::role::Role;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// 快照解析错误
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// 一次采集得到的传感器快照
///
/// 缺失或无效的读数以 `None` 表示，不使用哨兵值。创建后不可修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSnapshot", into = "RawSnapshot")]
pub struct Snapshot {
    timestamp: DateTime<Utc>,
    readings: BTreeMap<Role, Option<f64>>,
}

impl Snapshot {
    /// 时间戳截断到微秒，与持久化格式的精度一致
    pub fn new(timestamp: DateTime<Utc>, readings: BTreeMap<Role, Option<f64>>) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(6),
            readings,
        }
    }

    /// 以当前 UTC 时间创建
    pub fn now(readings: BTreeMap<Role, Option<f64>>) -> Self {
        Self::new(Utc::now(), readings)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// 快照所属的 UTC 日历日期
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub fn readings(&self) -> &BTreeMap<Role, Option<f64>> {
        &self.readings
    }

    /// 获取某个角色的有效读数
    pub fn get(&self, role: Role) -> Option<f64> {
        self.readings.get(&role).copied().flatten()
    }
}

/// 持久化格式：`timestamp` 加上以角色名为键的扁平字段
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSnapshot {
    timestamp: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl From<Snapshot> for RawSnapshot {
    fn from(snapshot: Snapshot) -> Self {
        let fields = snapshot
            .readings
            .into_iter()
            .map(|(role, value)| {
                let value = value
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null);
                (role.as_str().to_string(), value)
            })
            .collect();

        Self {
            timestamp: snapshot
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Micros, true),
            fields,
        }
    }
}

impl TryFrom<RawSnapshot> for Snapshot {
    type Error = SnapshotError;

    fn try_from(raw: RawSnapshot) -> Result<Self, Self::Error> {
        let timestamp = parse_timestamp(&raw.timestamp)?;

        // 未知键与非数值字段直接忽略
        let readings = raw
            .fields
            .iter()
            .filter_map(|(key, value)| {
                let role = Role::from_name(key)?;
                match value {
                    Value::Null => Some((role, None)),
                    Value::Number(n) => Some((role, n.as_f64())),
                    _ => None,
                }
            })
            .collect();

        Ok(Self {
            timestamp,
            readings,
        })
    }
}

/// 解析 ISO-8601 时间戳，不带时区偏移的按 UTC 处理
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, SnapshotError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }

    s.parse::<NaiveDateTime>()
        .map(|naive| naive.and_utc())
        .map_err(|_| SnapshotError::InvalidTimestamp(s.to_string()))
}
