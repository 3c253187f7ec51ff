pub mod logging;
pub mod service;
pub mod signal;

pub use service::{build_bus, run};
pub use signal::{ShutdownSignal, SignalHandler};
