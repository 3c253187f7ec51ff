use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 目标值校验错误
#[derive(Error, Debug, PartialEq)]
pub enum TargetError {
    #[error("{0} must be a finite number")]
    NotFinite(&'static str),

    #[error("low_pH ({low}) must be lower than high_pH ({high})")]
    InvertedBand { low: f64, high: f64 },
}

/// 控制目标值
///
/// 持久化为只含三个键的 JSON 对象，键名与前端保持一致。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetValues {
    #[serde(rename = "low_pH")]
    pub low_ph: f64,
    #[serde(rename = "high_pH")]
    pub high_ph: f64,
    #[serde(rename = "low_EC")]
    pub low_ec: f64,
}

impl TargetValues {
    pub fn new(low_ph: f64, high_ph: f64, low_ec: f64) -> Self {
        Self {
            low_ph,
            high_ph,
            low_ec,
        }
    }

    /// 校验目标值
    pub fn validate(&self) -> Result<(), TargetError> {
        if !self.low_ph.is_finite() {
            return Err(TargetError::NotFinite("low_pH"));
        }
        if !self.high_ph.is_finite() {
            return Err(TargetError::NotFinite("high_pH"));
        }
        if !self.low_ec.is_finite() {
            return Err(TargetError::NotFinite("low_EC"));
        }
        if self.low_ph >= self.high_ph {
            return Err(TargetError::InvertedBand {
                low: self.low_ph,
                high: self.high_ph,
            });
        }
        Ok(())
    }
}

impl Default for TargetValues {
    fn default() -> Self {
        Self {
            low_ph: 5.5,
            high_ph: 6.4,
            low_ec: 1000.0,
        }
    }
}
