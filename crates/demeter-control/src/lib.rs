pub mod dosing;
pub mod error;
pub mod target;

pub use dosing::{
    plan_doses, CycleReport, Dose, DoseFailure, DosingConfig, DosingController, PumpBindings,
    PumpRole,
};
pub use error::{ControlError, Result};
pub use target::TargetStore;
