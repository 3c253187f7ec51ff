use serde::{Deserialize, Serialize};
use std::fmt;

/// 设备角色
///
/// 由设备目录扫描时的标识应答推导而来，序列化名称与历史文件中的键一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "pH")]
    Ph,
    #[serde(rename = "EC")]
    Ec,
    Temperature,
    #[serde(rename = "Pump_pH_low")]
    PumpPhLow,
    #[serde(rename = "Pump_pH_high")]
    PumpPhHigh,
    #[serde(rename = "Pump_nutr1")]
    PumpNutr1,
    #[serde(rename = "Pump_nutr2")]
    PumpNutr2,
    Unknown,
}

impl Role {
    /// 传感器角色（参与快照采集）
    pub const SENSORS: [Role; 3] = [Role::Ph, Role::Ec, Role::Temperature];

    /// 根据设备命名键分类
    ///
    /// 只有固定表中的数字键才有语义角色，其余一律为 `Unknown`。
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "99" => Self::Ph,
            "100" => Self::Ec,
            "102" => Self::Temperature,
            "103" => Self::PumpPhLow,
            "104" => Self::PumpPhHigh,
            "105" => Self::PumpNutr1,
            "106" => Self::PumpNutr2,
            _ => Self::Unknown,
        }
    }

    /// 根据序列化名称解析（历史文件中的键）
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pH" => Some(Self::Ph),
            "EC" => Some(Self::Ec),
            "Temperature" => Some(Self::Temperature),
            "Pump_pH_low" => Some(Self::PumpPhLow),
            "Pump_pH_high" => Some(Self::PumpPhHigh),
            "Pump_nutr1" => Some(Self::PumpNutr1),
            "Pump_nutr2" => Some(Self::PumpNutr2),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ph => "pH",
            Self::Ec => "EC",
            Self::Temperature => "Temperature",
            Self::PumpPhLow => "Pump_pH_low",
            Self::PumpPhHigh => "Pump_pH_high",
            Self::PumpNutr1 => "Pump_nutr1",
            Self::PumpNutr2 => "Pump_nutr2",
            Self::Unknown => "Unknown",
        }
    }

    pub fn is_sensor(&self) -> bool {
        matches!(self, Self::Ph | Self::Ec | Self::Temperature)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_tag() {
        assert_eq!(Role::from_tag("99"), Role::Ph);
        assert_eq!(Role::from_tag("100"), Role::Ec);
        assert_eq!(Role::from_tag("102"), Role::Temperature);
        assert_eq!(Role::from_tag("103"), Role::PumpPhLow);
        assert_eq!(Role::from_tag("104"), Role::PumpPhHigh);
        assert_eq!(Role::from_tag("105"), Role::PumpNutr1);
        assert_eq!(Role::from_tag("106"), Role::PumpNutr2);
        assert_eq!(Role::from_tag("101"), Role::Unknown);
        assert_eq!(Role::from_tag("RTD 102"), Role::Unknown);
    }

    #[test]
    fn test_role_name_roundtrip() {
        for role in [
            Role::Ph,
            Role::Ec,
            Role::Temperature,
            Role::PumpPhLow,
            Role::PumpPhHigh,
            Role::PumpNutr1,
            Role::PumpNutr2,
        ] {
            assert_eq!(Role::from_name(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_name("Unknown"), None);
    }

    #[test]
    fn test_role_serde_name() {
        let json = serde_json::to_string(&Role::Ph).unwrap();
        assert_eq!(json, "\"pH\"");
        let role: Role = serde_json::from_str("\"Pump_nutr2\"").unwrap();
        assert_eq!(role, Role::PumpNutr2);
    }

    #[test]
    fn test_sensor_roles() {
        assert!(Role::SENSORS.iter().all(Role::is_sensor));
        assert!(!Role::PumpPhLow.is_sensor());
        assert!(!Role::Unknown.is_sensor());
    }
}
