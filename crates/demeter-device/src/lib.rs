pub mod acquirer;
pub mod catalog;
pub mod coordinator;
pub mod error;
pub mod mock;
pub mod simulated;
pub mod transport;

#[cfg(feature = "i2c")]
pub mod ezo;

pub use acquirer::{
    parse_reading, AcquisitionReport, AcquisitionTiming, ReadingOutcome, SensorReading,
    SnapshotAcquirer,
};
pub use catalog::{DeviceCatalog, DeviceDescriptor};
pub use coordinator::{BusCoordinator, BusSession};
pub use error::{DeviceError, Result, TransportError};
pub use mock::{BusOp, MockTransport};
pub use simulated::SimulatedBus;
pub use transport::{strip_control, DeviceTransport};

#[cfg(feature = "i2c")]
pub use ezo::EzoI2cTransport;
