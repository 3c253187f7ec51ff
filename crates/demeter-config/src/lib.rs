pub mod app;
pub mod error;
pub mod loader;

pub use app::{
    AppConfig, BusConfig, CollectorConfig, DosingSection, LogFormat, LoggingConfig, PumpConfig,
    ServerConfig, StorageConfig,
};
pub use error::{ConfigError, Result};
pub use loader::ConfigLoader;
