use demeter_control::TargetStore;
use demeter_device::SnapshotAcquirer;
use demeter_timeseries::HistoryStore;

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub acquirer: SnapshotAcquirer,
    pub history: HistoryStore,
    pub targets: TargetStore,
}

impl AppState {
    pub fn new(acquirer: SnapshotAcquirer, history: HistoryStore, targets: TargetStore) -> Self {
        Self {
            acquirer,
            history,
            targets,
        }
    }
}
