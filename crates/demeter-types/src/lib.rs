pub mod average;
pub mod role;
pub mod snapshot;
pub mod target;

pub use average::{round2, DailyAverage};
pub use role::Role;
pub use snapshot::{Snapshot, SnapshotError};
pub use target::{TargetError, TargetValues};
