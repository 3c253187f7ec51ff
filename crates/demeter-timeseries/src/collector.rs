use crate::store::HistoryStore;
use demeter_device::SnapshotAcquirer;
use demeter_types::Snapshot;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// 数据采集任务
///
/// 启动时立即采集一次，之后按固定周期采集并追加到历史记录。
pub struct DataCollector {
    acquirer: SnapshotAcquirer,
    history: HistoryStore,
    interval: Duration,
}

impl DataCollector {
    pub fn new(acquirer: SnapshotAcquirer, history: HistoryStore, interval: Duration) -> Self {
        Self {
            acquirer,
            history,
            interval,
        }
    }

    /// 采集一次并写入历史
    pub async fn collect_once(&self) -> anyhow::Result<Snapshot> {
        let snapshot = self.acquirer.acquire().await?;
        self.history.append(snapshot.clone()).await?;
        Ok(snapshot)
    }

    /// 运行采集循环，直到 `shutdown` 完成
    ///
    /// 关闭信号只在两次采集之间生效，不会打断正在进行的总线序列。
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = self.interval.as_secs(), "Data collector started");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Data collector stopped");
                    break;
                }
                _ = ticker.tick() => {
                    match self.collect_once().await {
                        Ok(snapshot) => {
                            info!(timestamp = %snapshot.timestamp(), "Collected snapshot");
                        }
                        Err(e) => {
                            error!(error = %e, "Data collection failed");
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use demeter_device::{AcquisitionTiming, BusCoordinator, MockTransport};
    use demeter_types::Role;
    use tokio::sync::oneshot;

    fn collector(dir: &tempfile::TempDir, interval: Duration) -> (DataCollector, HistoryStore) {
        let transport = MockTransport::new()
            .with_ezo(99, "pH", "6.10")
            .with_ezo(100, "EC", "1250");
        let acquirer = SnapshotAcquirer::new(
            BusCoordinator::new(transport),
            AcquisitionTiming::immediate(),
        );
        let history = HistoryStore::new(dir.path().join("history.json"));
        (DataCollector::new(acquirer, history.clone(), interval), history)
    }

    #[tokio::test]
    async fn test_collect_once_appends() {
        let dir = tempfile::tempdir().unwrap();
        let (collector, history) = collector(&dir, Duration::from_secs(3600));

        let snapshot = collector.collect_once().await.unwrap();
        assert_eq!(snapshot.get(Role::Ec), Some(1250.0));

        let log = history.all().await.unwrap().unwrap();
        assert_eq!(log, vec![snapshot]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_collects_immediately_then_periodically() {
        let dir = tempfile::tempdir().unwrap();
        let (collector, history) = collector(&dir, Duration::from_secs(3600));
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(collector.run(async move {
            let _ = stop_rx.await;
        }));

        // 首次采集 + 两个周期
        tokio::time::sleep(Duration::from_secs(2 * 3600 + 60)).await;
        stop_tx.send(()).unwrap();
        task.await.unwrap();

        assert_eq!(history.all().await.unwrap().unwrap().len(), 3);
    }
}
