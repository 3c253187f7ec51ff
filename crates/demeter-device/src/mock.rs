use crate::error::TransportError;
use crate::transport::DeviceTransport;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// 记录下来的一次总线操作
///
/// 通过协调器使用时，每个会话的读写都夹在一对会话标记之间。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusOp {
    SessionStarted { session: u64 },
    Write { address: u8, command: String },
    Read { address: u8 },
    SessionEnded { session: u64 },
}

#[derive(Debug, Clone)]
struct MockDevice {
    identity: String,
    info: String,
    reading: String,
}

#[derive(Debug, Default)]
struct MockState {
    devices: BTreeMap<u8, MockDevice>,
    last_command: HashMap<u8, String>,
    failing_reads: HashSet<u8>,
    failing_writes: HashSet<u8>,
    failing_triggers: HashSet<u8>,
    ops: Vec<BusOp>,
}

/// 脚本化的模拟传输
///
/// 按地址预置应答，并记录每一次读写，供测试检查总线序列。
/// 可克隆：测试保留一个句柄，另一个交给 [`BusCoordinator`](crate::BusCoordinator)。
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个出厂默认配置的 EZO 设备（命名键即地址）
    pub fn with_ezo(self, address: u8, module: &str, reading: &str) -> Self {
        self.with_device(
            address,
            &format!("?I,{},2.16", module),
            &address.to_string(),
            reading,
        )
    }

    /// 添加设备，完整指定标识应答、信息应答和读数应答
    pub fn with_device(self, address: u8, identity: &str, info: &str, reading: &str) -> Self {
        self.lock().devices.insert(
            address,
            MockDevice {
                identity: identity.to_string(),
                info: info.to_string(),
                reading: reading.to_string(),
            },
        );
        self
    }

    /// 修改读数应答
    pub fn set_reading(&self, address: u8, reading: &str) {
        if let Some(device) = self.lock().devices.get_mut(&address) {
            device.reading = reading.to_string();
        }
    }

    /// 让某个地址的读取失败
    pub fn fail_reads(&self, address: u8) {
        self.lock().failing_reads.insert(address);
    }

    /// 让某个地址的写入失败
    pub fn fail_writes(&self, address: u8) {
        self.lock().failing_writes.insert(address);
    }

    /// 只让某个地址的读数触发指令（`R`）失败，标识查询照常
    pub fn fail_read_trigger(&self, address: u8) {
        self.lock().failing_triggers.insert(address);
    }

    /// 已记录的总线操作
    pub fn ops(&self) -> Vec<BusOp> {
        self.lock().ops.clone()
    }

    /// 发往某个地址的全部指令
    pub fn writes_to(&self, address: u8) -> Vec<String> {
        self.lock()
            .ops
            .iter()
            .filter_map(|op| match op {
                BusOp::Write { address: a, command } if *a == address => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // 测试线程 panic 后锁会中毒，这里直接沿用内部数据
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DeviceTransport for MockTransport {
    async fn list_addresses(&mut self) -> Result<Vec<u8>, TransportError> {
        Ok(self.lock().devices.keys().copied().collect())
    }

    async fn write(&mut self, address: u8, command: &str) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.ops.push(BusOp::Write {
            address,
            command: command.to_string(),
        });

        if !state.devices.contains_key(&address) {
            return Err(TransportError::NotPresent { address });
        }
        if state.failing_writes.contains(&address)
            || (command == "R" && state.failing_triggers.contains(&address))
        {
            return Err(TransportError::Io {
                address,
                message: "simulated write failure".to_string(),
            });
        }

        state.last_command.insert(address, command.to_string());
        Ok(())
    }

    async fn read(&mut self, address: u8) -> Result<String, TransportError> {
        let mut state = self.lock();
        state.ops.push(BusOp::Read { address });

        if state.failing_reads.contains(&address) {
            return Err(TransportError::Io {
                address,
                message: "simulated read failure".to_string(),
            });
        }

        let device = state
            .devices
            .get(&address)
            .cloned()
            .ok_or(TransportError::NotPresent { address })?;
        let command = state
            .last_command
            .remove(&address)
            .ok_or(TransportError::NoData { address })?;

        match command.as_str() {
            "I" => Ok(device.identity),
            "R" => Ok(device.reading),
            _ => Ok(String::new()),
        }
    }

    async fn device_info(&mut self, address: u8) -> Result<String, TransportError> {
        self.lock()
            .devices
            .get(&address)
            .map(|d| d.info.clone())
            .ok_or(TransportError::NotPresent { address })
    }

    fn session_started(&mut self, session: u64) {
        self.lock().ops.push(BusOp::SessionStarted { session });
    }

    fn session_ended(&mut self, session: u64) {
        self.lock().ops.push(BusOp::SessionEnded { session });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_mock_replies_follow_last_command() {
        let mut mock = MockTransport::new().with_ezo(99, "pH", "7.01");

        let identity = mock.query(99, "I", Duration::ZERO).await.unwrap();
        assert_eq!(identity, "?I,pH,2.16");

        let reading = mock.query(99, "R", Duration::ZERO).await.unwrap();
        assert_eq!(reading, "7.01");

        // 没有先写指令就读取
        assert_eq!(
            mock.read(99).await,
            Err(TransportError::NoData { address: 99 })
        );
        assert_eq!(mock.device_info(99).await.unwrap(), "99");
    }

    #[tokio::test]
    async fn test_mock_records_ops() {
        let handle = MockTransport::new().with_ezo(103, "PMP", "0.00");
        let mut mock = handle.clone();

        mock.write(103, "D,2").await.unwrap();
        assert_eq!(handle.writes_to(103), vec!["D,2".to_string()]);
        assert_eq!(handle.ops().len(), 1);
    }
}
