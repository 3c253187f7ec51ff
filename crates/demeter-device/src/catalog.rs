use crate::error::Result;
use crate::transport::{strip_control, DeviceTransport};
use demeter_types::Role;
use std::time::Duration;
use tracing::{debug, warn};

/// 标识查询指令
const IDENTIFY_COMMAND: &str = "I";

/// 设备描述
///
/// 每次扫描重新生成，不持久化，也不保证跨扫描的身份一致。
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescriptor {
    pub address: u8,
    pub module_type: String,
    pub name: String,
    pub role: Role,
}

/// 设备目录
///
/// 每次采集都重新扫描总线：设备可能被重新编址，缓存结果换来的只是少几次查询。
#[derive(Debug, Clone)]
pub struct DeviceCatalog {
    query_settle: Duration,
}

impl DeviceCatalog {
    /// # 参数
    /// * `query_settle` - 标识查询写入后到读取应答的等待时间
    pub fn new(query_settle: Duration) -> Self {
        Self { query_settle }
    }

    /// 扫描总线并分类设备
    ///
    /// 标识应答无法解析的设备直接跳过，本轮不再访问该地址。
    /// 调用方必须已持有总线会话。
    pub async fn scan(&self, transport: &mut dyn DeviceTransport) -> Result<Vec<DeviceDescriptor>> {
        let addresses = transport.list_addresses().await?;
        let mut devices = Vec::with_capacity(addresses.len());

        for address in addresses {
            let reply = match transport
                .query(address, IDENTIFY_COMMAND, self.query_settle)
                .await
            {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(address, error = %e, "Identification query failed, skipping device");
                    continue;
                }
            };

            let Some(module_type) = parse_module_type(&reply) else {
                debug!(address, reply = %reply, "Not an EZO device, skipping");
                continue;
            };

            let info = match transport.device_info(address).await {
                Ok(info) => info,
                Err(e) => {
                    warn!(address, error = %e, "Device info query failed, skipping device");
                    continue;
                }
            };

            let name = naming_key(&info);
            let role = Role::from_tag(&name);

            debug!(
                address,
                module_type = %module_type,
                name = %name,
                role = %role,
                "Device identified"
            );

            devices.push(DeviceDescriptor {
                address,
                module_type,
                name,
                role,
            });
        }

        Ok(devices)
    }
}

/// 标识应答形如 `?I,pH,2.16`，第二个字段为模块类型
fn parse_module_type(reply: &str) -> Option<String> {
    strip_control(reply)
        .split(',')
        .nth(1)
        .map(|field| field.trim().to_string())
}

/// 设备信息去掉控制字符后按逗号拆分，再以空格拼接
fn naming_key(info: &str) -> String {
    strip_control(info).split(',').collect::<Vec<_>>().join(" ")
}
