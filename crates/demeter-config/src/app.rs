use crate::error::{ConfigError, Result};
use demeter_control::{DosingConfig, PumpBindings};
use demeter_device::AcquisitionTiming;
use demeter_timeseries::MAX_RECORDS;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

/// 应用配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub bus: BusConfig,
    pub storage: StorageConfig,
    pub collector: CollectorConfig,
    pub dosing: DosingSection,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 总线配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// I2C 设备路径
    pub device: String,
    /// 扫描的起止地址
    pub scan_start: u8,
    pub scan_end: u8,
    pub preroll_ms: u64,
    pub settle_ms: u64,
    pub query_settle_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub history_file: PathBuf,
    pub target_file: PathBuf,
    pub max_records: usize,
}

/// 定时采集配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

/// 投加控制配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DosingSection {
    pub enabled: bool,
    pub interval_secs: u64,
    pub settle_secs: u64,
    pub startup_delay_secs: u64,
    pub ph_dose_ml: f64,
    pub nutrient_dose_ml: f64,
    pub ec_floor: f64,
    pub pumps: PumpConfig,
}

/// 泵地址
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PumpConfig {
    pub ph_up: u8,
    pub ph_down: u8,
    pub nutrient_a: u8,
    pub nutrient_b: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            device: "/dev/i2c-1".to_string(),
            scan_start: 1,
            scan_end: 127,
            preroll_ms: 5000,
            settle_ms: 1000,
            query_settle_ms: 300,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            history_file: PathBuf::from("sensor_data.json"),
            target_file: PathBuf::from("target_values.json"),
            max_records: MAX_RECORDS,
        }
    }
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 3600,
        }
    }
}

impl Default for DosingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 1800,
            settle_secs: 5,
            startup_delay_secs: 5,
            ph_dose_ml: 2.0,
            nutrient_dose_ml: 1.0,
            ec_floor: 300.0,
            pumps: PumpConfig::default(),
        }
    }
}

impl Default for PumpConfig {
    fn default() -> Self {
        let bindings = PumpBindings::default();
        Self {
            ph_up: bindings.ph_up,
            ph_down: bindings.ph_down,
            nutrient_a: bindings.nutrient_a,
            nutrient_b: bindings.nutrient_b,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl BusConfig {
    pub fn scan_range(&self) -> RangeInclusive<u8> {
        self.scan_start..=self.scan_end
    }

    pub fn timing(&self) -> AcquisitionTiming {
        AcquisitionTiming {
            preroll: Duration::from_millis(self.preroll_ms),
            settle: Duration::from_millis(self.settle_ms),
            query_settle: Duration::from_millis(self.query_settle_ms),
        }
    }
}

impl DosingSection {
    pub fn to_dosing_config(&self) -> DosingConfig {
        DosingConfig {
            interval: Duration::from_secs(self.interval_secs),
            settle: Duration::from_secs(self.settle_secs),
            startup_delay: Duration::from_secs(self.startup_delay_secs),
            ph_dose_ml: self.ph_dose_ml,
            nutrient_dose_ml: self.nutrient_dose_ml,
            ec_floor: self.ec_floor,
            pumps: PumpBindings {
                ph_up: self.pumps.ph_up,
                ph_down: self.pumps.ph_down,
                nutrient_a: self.pumps.nutrient_a,
                nutrient_b: self.pumps.nutrient_b,
            },
        }
    }
}

impl AppConfig {
    /// 验证配置
    pub fn validate(&self) -> Result<()> {
        if self.bus.scan_start == 0 || self.bus.scan_start > self.bus.scan_end || self.bus.scan_end > 127 {
            return Err(ConfigError::Invalid(format!(
                "bus scan range {}..={} must lie within 1..=127",
                self.bus.scan_start, self.bus.scan_end
            )));
        }

        if self.storage.max_records == 0 {
            return Err(ConfigError::Invalid("storage.max_records must be greater than 0".into()));
        }

        if self.collector.interval_secs == 0 {
            return Err(ConfigError::Invalid("collector.interval_secs must be greater than 0".into()));
        }

        if self.dosing.interval_secs == 0 {
            return Err(ConfigError::Invalid("dosing.interval_secs must be greater than 0".into()));
        }

        for (name, value) in [
            ("dosing.ph_dose_ml", self.dosing.ph_dose_ml),
            ("dosing.nutrient_dose_ml", self.dosing.nutrient_dose_ml),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be a positive number, got {value}")));
            }
        }

        if !self.dosing.ec_floor.is_finite() {
            return Err(ConfigError::Invalid("dosing.ec_floor must be a finite number".into()));
        }

        let pumps = &self.dosing.pumps;
        for (name, address) in [
            ("ph_up", pumps.ph_up),
            ("ph_down", pumps.ph_down),
            ("nutrient_a", pumps.nutrient_a),
            ("nutrient_b", pumps.nutrient_b),
        ] {
            if !(1..=127).contains(&address) {
                return Err(ConfigError::Invalid(format!(
                    "dosing.pumps.{name} address {address} must lie within 1..=127"
                )));
            }
        }

        Ok(())
    }

    /// 渲染为 TOML，用于生成配置模板
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
