use crate::signal::SignalHandler;
use anyhow::Context;
use demeter_config::{AppConfig, BusConfig};
use demeter_control::{DosingController, TargetStore};
use demeter_control_api::{create_router, AppState};
use demeter_device::{BusCoordinator, SimulatedBus, SnapshotAcquirer};
use demeter_timeseries::{DataCollector, HistoryStore};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 创建总线：模拟总线或 I2C 硬件
pub fn build_bus(config: &BusConfig, simulate: bool) -> anyhow::Result<BusCoordinator> {
    if simulate {
        info!("Using simulated bus");
        return Ok(BusCoordinator::new(SimulatedBus::new()));
    }

    #[cfg(feature = "i2c")]
    {
        let transport = demeter_device::EzoI2cTransport::open(&config.device, config.scan_range())
            .with_context(|| format!("failed to open I2C bus {}", config.device))?;
        Ok(BusCoordinator::new(transport))
    }

    #[cfg(not(feature = "i2c"))]
    {
        anyhow::bail!(
            "built without I2C support, cannot open {}; run with --simulate",
            config.device
        )
    }
}

/// 运行服务直到收到关闭信号
///
/// 启动后台采集与投加任务，然后在 `listener` 上提供 HTTP 接口。
/// 关闭时先停止接受请求，再等待后台任务在当前序列结束后退出。
pub async fn run(
    config: AppConfig,
    bus: BusCoordinator,
    listener: TcpListener,
    signals: SignalHandler,
) -> anyhow::Result<()> {
    let acquirer = SnapshotAcquirer::new(bus, config.bus.timing());
    let history = HistoryStore::new(&config.storage.history_file)
        .with_max_records(config.storage.max_records);
    let targets = TargetStore::new(&config.storage.target_file);

    let mut tasks: Vec<(&'static str, JoinHandle<()>)> = Vec::new();

    if config.collector.enabled {
        let collector = DataCollector::new(
            acquirer.clone(),
            history.clone(),
            Duration::from_secs(config.collector.interval_secs),
        );
        tasks.push(("collector", tokio::spawn(collector.run(signals.on_shutdown()))));
    } else {
        info!("Data collector disabled");
    }

    if config.dosing.enabled {
        let controller = DosingController::new(
            acquirer.clone(),
            targets.clone(),
            config.dosing.to_dosing_config(),
        );
        tasks.push(("dosing", tokio::spawn(controller.run(signals.on_shutdown()))));
    } else {
        info!("Dosing controller disabled");
    }

    let app = create_router(AppState::new(acquirer, history, targets));
    let addr = listener.local_addr().context("listener has no local address")?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(signals.on_shutdown())
        .await
        .context("HTTP server failed")?;

    for (name, task) in tasks {
        if let Err(e) = task.await {
            error!(task = name, error = %e, "Background task panicked");
        }
    }

    info!("Shutdown complete");
    Ok(())
}
