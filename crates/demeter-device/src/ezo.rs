use crate::error::TransportError;
use crate::transport::DeviceTransport;
use async_trait::async_trait;
use embedded_hal::i2c::{Error as _, I2c};
use std::ops::RangeInclusive;
use tracing::{debug, info};

/// 应答缓冲区长度：1 字节状态码 + 最多 30 字节 ASCII 数据
const RESPONSE_LEN: usize = 31;

/// EZO 应答状态码
const STATUS_SUCCESS: u8 = 1;
const STATUS_SYNTAX_ERROR: u8 = 2;
const STATUS_PENDING: u8 = 254;
const STATUS_NO_DATA: u8 = 255;

/// EZO 系列设备的 I2C 传输
///
/// 指令以 NUL 结尾的 ASCII 写入；应答首字节为状态码，其后是以 NUL 结尾的数据。
/// 每次读写都是很短的阻塞系统调用，直接在当前任务中执行。
pub struct EzoI2cTransport<I> {
    bus: I,
    scan_range: RangeInclusive<u8>,
}

impl EzoI2cTransport<linux_embedded_hal::I2cdev> {
    /// 打开 Linux I2C 设备，例如 `/dev/i2c-1`
    pub fn open(path: &str, scan_range: RangeInclusive<u8>) -> Result<Self, TransportError> {
        let bus = linux_embedded_hal::I2cdev::new(path).map_err(|e| TransportError::Open {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        info!(path = %path, "Opened I2C bus");
        Ok(Self::new(bus, scan_range))
    }
}

impl<I> EzoI2cTransport<I>
where
    I: I2c + Send,
{
    pub fn new(bus: I, scan_range: RangeInclusive<u8>) -> Self {
        Self { bus, scan_range }
    }

    fn io_error(address: u8, error: I::Error) -> TransportError {
        TransportError::Io {
            address,
            message: format!("{:?}", error.kind()),
        }
    }
}

/// 解析 EZO 应答帧
pub(crate) fn decode_response(address: u8, raw: &[u8]) -> Result<String, TransportError> {
    let (&status, payload) = raw
        .split_first()
        .ok_or(TransportError::NoData { address })?;

    match status {
        STATUS_SUCCESS => Ok(payload
            .iter()
            .take_while(|&&b| b != 0)
            // 部分主机会把最高位置 1，这里屏蔽掉
            .map(|&b| (b & 0x7f) as char)
            .collect()),
        STATUS_SYNTAX_ERROR => Err(TransportError::Syntax { address }),
        STATUS_PENDING => Err(TransportError::Pending { address }),
        STATUS_NO_DATA => Err(TransportError::NoData { address }),
        code => Err(TransportError::Status { address, code }),
    }
}

#[async_trait]
impl<I> DeviceTransport for EzoI2cTransport<I>
where
    I: I2c + Send,
{
    async fn list_addresses(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut probe = [0u8; 1];
        let addresses: Vec<u8> = self
            .scan_range
            .clone()
            .filter(|&address| self.bus.read(address, &mut probe).is_ok())
            .collect();

        debug!(count = addresses.len(), "Scanned I2C bus");
        Ok(addresses)
    }

    async fn write(&mut self, address: u8, command: &str) -> Result<(), TransportError> {
        let mut frame = command.as_bytes().to_vec();
        frame.push(0);

        self.bus
            .write(address, &frame)
            .map_err(|e| Self::io_error(address, e))
    }

    async fn read(&mut self, address: u8) -> Result<String, TransportError> {
        let mut buf = [0u8; RESPONSE_LEN];
        self.bus
            .read(address, &mut buf)
            .map_err(|e| Self::io_error(address, e))?;

        decode_response(address, &buf)
    }

    /// 未设置名称的设备以十进制地址作为设备信息，出厂地址因此对应固定角色表
    async fn device_info(&mut self, address: u8) -> Result<String, TransportError> {
        Ok(address.to_string())
    }
}
