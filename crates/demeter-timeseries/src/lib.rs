pub mod collector;
pub mod error;
pub mod persist;
pub mod store;

pub use collector::DataCollector;
pub use error::{HistoryError, Result};
pub use persist::write_json_atomic;
pub use store::{daily_averages, retain_latest, HistoryStore, MAX_RECORDS};
