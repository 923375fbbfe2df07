//! Beacon oracle node entry point

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tracing::{error, info};

use oracle_runtime::telemetry::init_tracing;
use oracle_runtime::{OracleNodeConfig, OracleRuntime};

#[tokio::main]
async fn main() -> Result<()> {
    let config = OracleNodeConfig::from_env().context("Failed to load configuration")?;
    init_tracing(&config.logging)?;

    info!("===========================================");
    info!("  Beacon Oracle v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");
    info!(
        epochs_per_frame = config.beacon.epochs_per_frame,
        slots_per_epoch = config.beacon.slots_per_epoch,
        seconds_per_slot = config.beacon.seconds_per_slot,
        genesis_time = config.beacon.genesis_time,
        "Beacon spec (seed)"
    );

    let mut runtime = OracleRuntime::open(&config)?;
    let background = runtime.spawn_background();

    let handler = runtime.command_handler();
    let shutdown = runtime.shutdown_signal();
    let commands = tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        handler.run(stdin, tokio::io::stdout(), shutdown).await
    });

    info!("Oracle is running. Commands are read from stdin, Ctrl+C to stop.");
    tokio::pin!(commands);
    tokio::select! {
        result = &mut commands => {
            match result {
                Ok(Err(e)) => error!("Command loop failed: {:#}", e),
                Err(e) => error!("Command loop panicked: {}", e),
                Ok(Ok(())) => {}
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            info!("Ctrl+C received");
        }
    }

    runtime.shutdown();
    for task in background {
        if let Err(e) = task.await {
            error!("Background task failed: {}", e);
        }
    }

    info!("Shutdown complete");
    // A pending stdin read would hold the runtime open until the next line
    std::process::exit(0)
}
