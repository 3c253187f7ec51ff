use thiserror::Error;

/// 总线传输错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// 打开总线设备失败
    #[error("Failed to open bus {path}: {message}")]
    Open { path: String, message: String },

    /// 底层 I/O 错误
    #[error("Bus I/O error at address {address}: {message}")]
    Io { address: u8, message: String },

    /// 设备返回语法错误
    #[error("Device at address {address} rejected the command")]
    Syntax { address: u8 },

    /// 设备仍在处理上一条指令
    #[error("Device at address {address} is still processing")]
    Pending { address: u8 },

    /// 设备没有可返回的数据
    #[error("Device at address {address} has no data to send")]
    NoData { address: u8 },

    /// 未知状态码
    #[error("Device at address {address} returned status code {code}")]
    Status { address: u8, code: u8 },

    /// 地址上没有设备
    #[error("No device at address {address}")]
    NotPresent { address: u8 },
}

/// 设备层错误类型
#[derive(Error, Debug)]
pub enum DeviceError {
    /// 传输错误
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// 设备层结果类型
pub type Result<T> = std::result::Result<T, DeviceError>;

