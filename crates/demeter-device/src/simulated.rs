use crate::error::TransportError;
use crate::transport::DeviceTransport;
use async_trait::async_trait;
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

#[derive(Debug, Clone)]
enum SimKind {
    Probe { module: &'static str, base: f64, jitter: f64 },
    Pump { dispensed: f64 },
}

/// 模拟总线
///
/// 无硬件时使用：出厂地址上挂 pH、EC、RTD 探头和四个蠕动泵。
/// 探头读数在基准值附近随机抖动，泵累计投加量。
pub struct SimulatedBus {
    devices: BTreeMap<u8, SimKind>,
    last_command: HashMap<u8, String>,
}

impl SimulatedBus {
    pub fn new() -> Self {
        let mut devices = BTreeMap::new();
        devices.insert(99, SimKind::Probe { module: "pH", base: 6.0, jitter: 0.4 });
        devices.insert(100, SimKind::Probe { module: "EC", base: 1100.0, jitter: 150.0 });
        devices.insert(102, SimKind::Probe { module: "RTD", base: 21.0, jitter: 1.5 });
        for address in 103..=106 {
            devices.insert(address, SimKind::Pump { dispensed: 0.0 });
        }

        Self {
            devices,
            last_command: HashMap::new(),
        }
    }

    fn respond(&mut self, address: u8, command: &str) -> Result<String, TransportError> {
        let device = self
            .devices
            .get_mut(&address)
            .ok_or(TransportError::NotPresent { address })?;

        let reply = match (device, command) {
            (SimKind::Probe { module, .. }, "I") => format!("?I,{},2.16", module),
            (SimKind::Pump { .. }, "I") => "?I,PMP,1.06".to_string(),
            (SimKind::Probe { base, jitter, .. }, "R") => {
                let value = *base + rand::thread_rng().gen_range(-*jitter..=*jitter);
                format!("{:.3}", value)
            }
            (SimKind::Pump { dispensed }, "R") => format!("{:.2}", dispensed),
            _ => String::new(),
        };

        Ok(reply)
    }
}

impl Default for SimulatedBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceTransport for SimulatedBus {
    async fn list_addresses(&mut self) -> Result<Vec<u8>, TransportError> {
        Ok(self.devices.keys().copied().collect())
    }

    async fn write(&mut self, address: u8, command: &str) -> Result<(), TransportError> {
        let device = self
            .devices
            .get_mut(&address)
            .ok_or(TransportError::NotPresent { address })?;

        // 投加指令 D,<ml>
        if let (SimKind::Pump { dispensed }, Some(volume)) = (device, command.strip_prefix("D,")) {
            if let Ok(ml) = volume.parse::<f64>() {
                *dispensed += ml;
                debug!(address, ml, total = *dispensed, "Simulated pump dispensed");
            }
        }

        self.last_command.insert(address, command.to_string());
        Ok(())
    }

    async fn read(&mut self, address: u8) -> Result<String, TransportError> {
        let command = self
            .last_command
            .remove(&address)
            .ok_or(TransportError::NoData { address })?;
        self.respond(address, &command)
    }

    async fn device_info(&mut self, address: u8) -> Result<String, TransportError> {
        if self.devices.contains_key(&address) {
            Ok(address.to_string())
        } else {
            Err(TransportError::NotPresent { address })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_simulated_probe_reading_in_range() {
        let mut bus = SimulatedBus::new();
        let raw = bus.query(99, "R", Duration::ZERO).await.unwrap();
        let value: f64 = raw.parse().unwrap();
        assert!((5.6..=6.4).contains(&value));
    }

    #[tokio::test]
    async fn test_simulated_pump_accumulates() {
        let mut bus = SimulatedBus::new();
        bus.write(103, "D,2").await.unwrap();
        bus.write(103, "D,1.5").await.unwrap();
        let raw = bus.query(103, "R", Duration::ZERO).await.unwrap();
        assert_eq!(raw, "3.50");
    }

    #[tokio::test]
    async fn test_simulated_identity() {
        let mut bus = SimulatedBus::new();
        assert_eq!(bus.query(102, "I", Duration::ZERO).await.unwrap(), "?I,RTD,2.16");
        assert_eq!(bus.query(105, "I", Duration::ZERO).await.unwrap(), "?I,PMP,1.06");
        assert!(bus.write(42, "R").await.is_err());
    }
}
