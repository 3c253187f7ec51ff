use super::model::{Dose, DosingConfig, PumpRole};
use demeter_types::{Role, Snapshot, TargetValues};

/// 根据目标值和快照决定本周期的投加
///
/// 纯阈值控制，没有回差：
/// - pH 低于下限投加升 pH，高于上限投加降 pH，缺失则跳过；
/// - EC 低于下限且高于下限保护值时依次投加两种营养液，缺失则跳过。
pub fn plan_doses(targets: &TargetValues, snapshot: &Snapshot, config: &DosingConfig) -> Vec<Dose> {
    let mut doses = Vec::new();
    let dose = |pump: PumpRole, volume_ml: f64| Dose {
        pump,
        address: config.pumps.address(pump),
        volume_ml,
    };

    if let Some(ph) = snapshot.get(Role::Ph) {
        if ph < targets.low_ph {
            doses.push(dose(PumpRole::PhUp, config.ph_dose_ml));
        } else if ph > targets.high_ph {
            doses.push(dose(PumpRole::PhDown, config.ph_dose_ml));
        }
    }

    if let Some(ec) = snapshot.get(Role::Ec) {
        if ec < targets.low_ec && ec > config.ec_floor {
            doses.push(dose(PumpRole::NutrientA, config.nutrient_dose_ml));
            doses.push(dose(PumpRole::NutrientB, config.nutrient_dose_ml));
        }
    }

    doses
}
