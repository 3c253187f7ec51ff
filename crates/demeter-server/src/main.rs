use anyhow::Context;
use clap::Parser;
use demeter_config::{AppConfig, ConfigLoader};
use demeter_server::{build_bus, logging, run, SignalHandler};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the HTTP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Use the simulated bus instead of I2C hardware
    #[arg(long)]
    simulate: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", AppConfig::default().to_toml()?);
        return Ok(());
    }

    let mut config = ConfigLoader::new(&args.config)
        .load()
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    logging::init(&config.logging)?;
    info!(
        config = %args.config.display(),
        simulate = args.simulate,
        "Starting DeMeter"
    );

    let bus = build_bus(&config.bus, args.simulate)?;

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.server.host, config.server.port))?;

    let signals = SignalHandler::new();
    let watcher = signals.clone();
    tokio::spawn(async move {
        if let Err(e) = watcher.wait_for_system_signal().await {
            error!(error = %e, "Failed to install signal handlers");
        }
    });

    run(config, bus, listener, signals).await
}
