use crate::error::TransportError;
use async_trait::async_trait;
use std::time::Duration;

/// 设备传输接口
///
/// 向总线上某个地址的设备发送文本指令并读回原始应答，是唯一的物理 I/O 原语。
/// 调用方负责互斥，实现本身不做加锁（见 [`BusCoordinator`](crate::BusCoordinator)）。
#[async_trait]
pub trait DeviceTransport: Send {
    /// 列出总线上有应答的地址
    async fn list_addresses(&mut self) -> Result<Vec<u8>, TransportError>;

    /// 发送指令
    async fn write(&mut self, address: u8, command: &str) -> Result<(), TransportError>;

    /// 读取应答
    async fn read(&mut self, address: u8) -> Result<String, TransportError>;

    /// 查询设备信息（用于生成命名键）
    async fn device_info(&mut self, address: u8) -> Result<String, TransportError>;

    /// 总线会话开始，由 [`BusCoordinator`](crate::BusCoordinator) 在拿到锁后调用
    fn session_started(&mut self, _session: u64) {}

    /// 总线会话结束，在释放锁之前调用
    fn session_ended(&mut self, _session: u64) {}

    /// 发送指令，等待处理后读取应答
    async fn query(
        &mut self,
        address: u8,
        command: &str,
        settle: Duration,
    ) -> Result<String, TransportError> {
        self.write(address, command).await?;
        tokio::time::sleep(settle).await;
        self.read(address).await
    }
}

/// 去掉控制字符（含 NUL）与首尾空白
pub fn strip_control(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_control() {
        assert_eq!(strip_control("\0\0 7.012\r\n\0"), "7.012");
        assert_eq!(strip_control("?I,pH,2.16\0\0\0"), "?I,pH,2.16");
        assert_eq!(strip_control("\0\0"), "");
    }
}
