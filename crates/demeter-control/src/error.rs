use demeter_device::DeviceError;
use demeter_timeseries::HistoryError;
use demeter_types::TargetError;
use thiserror::Error;

/// 控制层错误类型
#[derive(Error, Debug)]
pub enum ControlError {
    /// 目标值不合法
    #[error("Invalid target values: {0}")]
    InvalidTargets(#[from] TargetError),

    /// 持久化失败
    #[error("Failed to persist target values: {0}")]
    Persist(#[from] HistoryError),

    /// 设备错误
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// 控制层结果类型
pub type Result<T> = std::result::Result<T, ControlError>;
