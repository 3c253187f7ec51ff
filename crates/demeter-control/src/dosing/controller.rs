use super::model::{CycleReport, Dose, DoseFailure, DosingConfig};
use super::planner::plan_doses;
use crate::error::Result;
use crate::target::TargetStore;
use demeter_device::SnapshotAcquirer;
use demeter_types::Role;
use std::future::Future;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// 投加控制器
///
/// 每个周期：读取目标值 → 采集快照 → 比较 pH 区间与 EC 下限 → 投加 → 休眠。
/// 一个周期的失败只记录日志，不会终止循环。
pub struct DosingController {
    acquirer: SnapshotAcquirer,
    targets: TargetStore,
    config: DosingConfig,
}

impl DosingController {
    pub fn new(acquirer: SnapshotAcquirer, targets: TargetStore, config: DosingConfig) -> Self {
        Self {
            acquirer,
            targets,
            config,
        }
    }

    /// 执行一个控制周期
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let targets = self.targets.load().await;
        let snapshot = self.acquirer.acquire().await?;

        let doses = plan_doses(&targets, &snapshot, &self.config);
        let (dispensed, failed) = self.dispense(doses).await;

        Ok(CycleReport {
            targets,
            snapshot,
            dispensed,
            failed,
        })
    }

    /// 在一个总线会话内依次投加，每次投加后等待
    ///
    /// 单个泵写入失败不影响后续投加。
    async fn dispense(&self, doses: Vec<Dose>) -> (Vec<Dose>, Vec<DoseFailure>) {
        let mut dispensed = Vec::new();
        let mut failed = Vec::new();
        if doses.is_empty() {
            return (dispensed, failed);
        }

        let mut bus = self.acquirer.bus().lock("dosing").await;
        for dose in doses {
            match bus.write(dose.address, &dose.command()).await {
                Ok(()) => {
                    info!(
                        pump = %dose.pump,
                        address = dose.address,
                        volume_ml = dose.volume_ml,
                        "Dose dispensed"
                    );
                    dispensed.push(dose);
                    sleep(self.config.settle).await;
                }
                Err(e) => {
                    warn!(pump = %dose.pump, address = dose.address, error = %e, "Dose failed");
                    failed.push(DoseFailure {
                        dose,
                        error: e.to_string(),
                    });
                }
            }
        }

        (dispensed, failed)
    }

    /// 运行控制循环，直到 `shutdown` 完成
    ///
    /// 关闭信号只在周期之间生效。
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);

        info!(
            interval_secs = self.config.interval.as_secs(),
            startup_delay_secs = self.config.startup_delay.as_secs(),
            "Dosing controller started"
        );

        let mut delay = self.config.startup_delay;
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Dosing controller stopped");
                    break;
                }
                _ = sleep(delay) => {}
            }

            match self.run_cycle().await {
                Ok(report) => {
                    info!(
                        ph = ?report.snapshot.get(Role::Ph),
                        ec = ?report.snapshot.get(Role::Ec),
                        dispensed = ?report.pumps_dispensed(),
                        failed = report.failed.len(),
                        "Dosing cycle completed"
                    );
                }
                Err(e) => {
                    error!(error = %e, "Dosing cycle failed");
                }
            }

            delay = self.config.interval;
        }
    }
}
