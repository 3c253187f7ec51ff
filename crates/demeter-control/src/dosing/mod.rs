pub mod controller;
pub mod model;
pub mod planner;

pub use controller::DosingController;
pub use model::{CycleReport, Dose, DoseFailure, DosingConfig, PumpBindings, PumpRole};
pub use planner::plan_doses;
