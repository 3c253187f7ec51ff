use demeter_types::{Snapshot, TargetValues};
use std::fmt;
use std::time::Duration;

/// 泵的控制用途
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PumpRole {
    /// 升 pH
    PhUp,
    /// 降 pH
    PhDown,
    /// 营养液 A
    NutrientA,
    /// 营养液 B
    NutrientB,
}

impl fmt::Display for PumpRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PumpRole::PhUp => "ph_up",
            PumpRole::PhDown => "ph_down",
            PumpRole::NutrientA => "nutrient_a",
            PumpRole::NutrientB => "nutrient_b",
        };
        f.write_str(name)
    }
}

/// 泵的总线地址绑定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpBindings {
    pub ph_up: u8,
    pub ph_down: u8,
    pub nutrient_a: u8,
    pub nutrient_b: u8,
}

impl PumpBindings {
    pub fn address(&self, pump: PumpRole) -> u8 {
        match pump {
            PumpRole::PhUp => self.ph_up,
            PumpRole::PhDown => self.ph_down,
            PumpRole::NutrientA => self.nutrient_a,
            PumpRole::NutrientB => self.nutrient_b,
        }
    }
}

impl Default for PumpBindings {
    /// 出厂地址：103 Pump_pH_low，104 Pump_pH_high，105/106 营养液
    fn default() -> Self {
        Self {
            ph_up: 103,
            ph_down: 104,
            nutrient_a: 105,
            nutrient_b: 106,
        }
    }
}

/// 投加控制参数
#[derive(Debug, Clone, PartialEq)]
pub struct DosingConfig {
    /// 控制周期
    pub interval: Duration,
    /// 每次投加后的等待
    pub settle: Duration,
    /// 首个周期前的等待
    pub startup_delay: Duration,
    pub ph_dose_ml: f64,
    pub nutrient_dose_ml: f64,
    /// EC 不高于该值时不补营养液
    pub ec_floor: f64,
    pub pumps: PumpBindings,
}

impl Default for DosingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1800),
            settle: Duration::from_secs(5),
            startup_delay: Duration::from_secs(5),
            ph_dose_ml: 2.0,
            nutrient_dose_ml: 1.0,
            ec_floor: 300.0,
            pumps: PumpBindings::default(),
        }
    }
}

/// 一次投加
#[derive(Debug, Clone, PartialEq)]
pub struct Dose {
    pub pump: PumpRole,
    pub address: u8,
    pub volume_ml: f64,
}

impl Dose {
    /// EZO-PMP 定量投加指令
    pub fn command(&self) -> String {
        format!("D,{}", self.volume_ml)
    }
}

/// 投加失败记录
#[derive(Debug, Clone, PartialEq)]
pub struct DoseFailure {
    pub dose: Dose,
    pub error: String,
}

/// 一个控制周期的结果
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub targets: TargetValues,
    pub snapshot: Snapshot,
    pub dispensed: Vec<Dose>,
    pub failed: Vec<DoseFailure>,
}

impl CycleReport {
    pub fn pumps_dispensed(&self) -> Vec<PumpRole> {
        self.dispensed.iter().map(|d| d.pump).collect()
    }
}
