use demeter_config::AppConfig;
use demeter_device::{BusCoordinator, SimulatedBus};
use demeter_server::{run, SignalHandler};
use std::time::Duration;
use tokio::net::TcpListener;

fn test_config(dir: &tempfile::TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.bus.preroll_ms = 0;
    config.bus.settle_ms = 0;
    config.bus.query_settle_ms = 0;
    config.storage.history_file = dir.path().join("sensor_data.json");
    config.storage.target_file = dir.path().join("target_values.json");
    config.dosing.startup_delay_secs = 3600;
    config
}

#[tokio::test]
async fn collects_on_startup_and_shuts_down_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let history_file = config.storage.history_file.clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let signals = SignalHandler::new();
    let server = tokio::spawn(run(
        config,
        BusCoordinator::new(SimulatedBus::new()),
        listener,
        signals.clone(),
    ));

    let mut waited = Duration::ZERO;
    while !history_file.exists() && waited < Duration::from_secs(5) {
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += Duration::from_millis(20);
    }
    assert!(history_file.exists(), "first collection should run at startup");

    signals.trigger_shutdown();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop")
        .unwrap()
        .unwrap();

    let log: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&history_file).unwrap()).unwrap();
    let first = &log[0];
    assert!(first["pH"].as_f64().is_some());
    assert!(first["EC"].as_f64().is_some());
    assert!(first["Temperature"].as_f64().is_some());
}

#[tokio::test]
async fn disabled_loops_do_not_touch_storage() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir);
    config.collector.enabled = false;
    config.dosing.enabled = false;
    let history_file = config.storage.history_file.clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let signals = SignalHandler::new();
    let server = tokio::spawn(run(
        config,
        BusCoordinator::new(SimulatedBus::new()),
        listener,
        signals.clone(),
    ));

    tokio::time::sleep(Duration::from_millis(100)).await;
    signals.trigger_shutdown();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop")
        .unwrap()
        .unwrap();

    assert!(!history_file.exists());
}
