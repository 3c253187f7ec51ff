use crate::catalog::{DeviceCatalog, DeviceDescriptor};
use crate::coordinator::BusCoordinator;
use crate::error::Result;
use crate::transport::strip_control;
use demeter_types::{Role, Snapshot};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// 读数触发指令
const READ_COMMAND: &str = "R";

/// EC 探头以小于等于该值表示错误
const EC_ERROR_CEILING: f64 = 300.0;

/// 非 EC 探头的错误码
const ERROR_CODE: f64 = 255.0;

/// 采集时序
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcquisitionTiming {
    /// 目录扫描后、发出读数指令前的等待
    pub preroll: Duration,
    /// 读数指令到读取应答之间的等待，探头需要处理时间
    pub settle: Duration,
    /// 标识查询的等待
    pub query_settle: Duration,
}

impl AcquisitionTiming {
    /// 全部为零，用于测试
    pub fn immediate() -> Self {
        Self {
            preroll: Duration::ZERO,
            settle: Duration::ZERO,
            query_settle: Duration::ZERO,
        }
    }
}

impl Default for AcquisitionTiming {
    fn default() -> Self {
        Self {
            preroll: Duration::from_secs(5),
            settle: Duration::from_secs(1),
            query_settle: Duration::from_millis(300),
        }
    }
}

/// 单个读数的结果
///
/// 对外都表现为“无值”，但解析失败和有效性过滤在诊断上需要区分。
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingOutcome {
    /// 有效读数
    Valid { value: f64 },
    /// 应答不是合法的非负小数
    Malformed { raw: String },
    /// 读数被有效性过滤剔除（错误码或超出范围）
    Rejected { value: f64 },
    /// 总线通信失败
    BusError { message: String },
}

impl ReadingOutcome {
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Valid { value } => Some(*value),
            _ => None,
        }
    }
}

/// 单个传感器的读数
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub address: u8,
    pub role: Role,
    pub outcome: ReadingOutcome,
}

/// 一次采集的完整结果
#[derive(Debug, Clone)]
pub struct AcquisitionReport {
    pub snapshot: Snapshot,
    pub devices: Vec<DeviceDescriptor>,
    pub readings: Vec<SensorReading>,
}

/// 快照采集器
#[derive(Clone)]
pub struct SnapshotAcquirer {
    bus: BusCoordinator,
    catalog: DeviceCatalog,
    timing: AcquisitionTiming,
}

impl SnapshotAcquirer {
    pub fn new(bus: BusCoordinator, timing: AcquisitionTiming) -> Self {
        Self {
            bus,
            catalog: DeviceCatalog::new(timing.query_settle),
            timing,
        }
    }

    pub fn bus(&self) -> &BusCoordinator {
        &self.bus
    }

    /// 采集一个快照
    pub async fn acquire(&self) -> Result<Snapshot> {
        Ok(self.acquire_report().await?.snapshot)
    }

    /// 采集一个快照并保留每个读数的诊断信息
    ///
    /// 整个过程（扫描、触发、等待、读取）在同一个总线会话中完成。
    /// 单个设备的总线错误只让该读数缺失，不会中断本次采集。
    pub async fn acquire_report(&self) -> Result<AcquisitionReport> {
        let mut bus = self.bus.lock("acquisition").await;

        let devices = self.catalog.scan(&mut *bus).await?;
        let sensors: Vec<&DeviceDescriptor> =
            devices.iter().filter(|d| d.role.is_sensor()).collect();

        sleep(self.timing.preroll).await;

        let mut write_failures = HashMap::new();
        for device in &sensors {
            if let Err(e) = bus.write(device.address, READ_COMMAND).await {
                write_failures.insert(device.address, e.to_string());
            }
        }

        sleep(self.timing.settle).await;

        let mut readings = Vec::with_capacity(sensors.len());
        for device in &sensors {
            let outcome = match write_failures.remove(&device.address) {
                Some(message) => ReadingOutcome::BusError { message },
                None => match bus.read(device.address).await {
                    Ok(raw) => classify(device.role, &raw),
                    Err(e) => ReadingOutcome::BusError {
                        message: e.to_string(),
                    },
                },
            };

            log_outcome(device, &outcome);
            readings.push(SensorReading {
                address: device.address,
                role: device.role,
                outcome,
            });
        }
        drop(bus);

        // 不在总线上的传感器同样记为无值
        let mut values: BTreeMap<Role, Option<f64>> =
            Role::SENSORS.iter().map(|&role| (role, None)).collect();
        for reading in &readings {
            values.insert(reading.role, reading.outcome.value());
        }
        let snapshot = Snapshot::now(values);

        info!(
            sensors = readings.len(),
            valid = readings.iter().filter(|r| r.outcome.value().is_some()).count(),
            "Snapshot acquired"
        );

        Ok(AcquisitionReport {
            snapshot,
            devices,
            readings,
        })
    }
}

/// 解析探头应答
///
/// 去掉控制字符后取最后一个冒号之后的部分并去掉首尾空白；
/// 只接受不带符号、最多一个小数点的数字，中间夹有空白的视为无效。
pub fn parse_reading(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| !c.is_control()).collect();
    let value = cleaned.rsplit(':').next().unwrap_or_default().trim();

    let mut digits = 0;
    let mut dots = 0;
    for c in value.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return None,
        }
    }
    if digits == 0 || dots > 1 {
        return None;
    }

    value.parse().ok()
}

/// 按角色判断读数是否有效
fn is_valid_reading(role: Role, value: f64) -> bool {
    if role == Role::Ec && value <= EC_ERROR_CEILING {
        return false;
    }
    if role != Role::Ec && value == ERROR_CODE {
        return false;
    }
    match role {
        Role::Temperature => (0.0..=50.0).contains(&value),
        Role::Ph => (0.0..=14.0).contains(&value),
        _ => true,
    }
}

fn classify(role: Role, raw: &str) -> ReadingOutcome {
    match parse_reading(raw) {
        None => ReadingOutcome::Malformed {
            raw: strip_control(raw),
        },
        Some(value) if is_valid_reading(role, value) => ReadingOutcome::Valid { value },
        Some(value) => ReadingOutcome::Rejected { value },
    }
}

fn log_outcome(device: &DeviceDescriptor, outcome: &ReadingOutcome) {
    match outcome {
        ReadingOutcome::Valid { value } => {
            debug!(address = device.address, role = %device.role, value, "Reading accepted");
        }
        ReadingOutcome::Rejected { value } => {
            debug!(address = device.address, role = %device.role, value, "Reading rejected by validity filter");
        }
        ReadingOutcome::Malformed { raw } => {
            warn!(address = device.address, role = %device.role, raw = %raw, "Malformed reading");
        }
        ReadingOutcome::BusError { message } => {
            warn!(address = device.address, role = %device.role, error = %message, "Bus error while reading");
        }
    }
}
