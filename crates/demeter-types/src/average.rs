use crate::role::Role;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 单日平均值记录（按需计算，不落盘）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAverage {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub averages: BTreeMap<Role, f64>,
}

impl DailyAverage {
    pub fn get(&self, role: Role) -> Option<f64> {
        self.averages.get(&role).copied()
    }
}

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_average_serializes_flat() {
        let mut averages = BTreeMap::new();
        averages.insert(Role::Ph, 6.05);
        averages.insert(Role::Temperature, 21.33);
        let record = DailyAverage {
            date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            averages,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"date": "2026-10-16", "pH": 6.05, "Temperature": 21.33})
        );
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(15.0), 15.0);
        assert_eq!(round2(6.666_666), 6.67);
        assert_eq!(round2(1234.5649), 1234.56);
    }
}
