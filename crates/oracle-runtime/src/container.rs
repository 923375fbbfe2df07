//! # Runtime Container
//!
//! Wires the oracle service to its production adapters:
//!
//! - `RocksDbStateStore` for durable state
//! - `AccountingChannelReceiver` for completed frames
//! - `SystemTimeSource` for frame timing

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use qc_18_beacon_oracle::{OracleEvent, OracleService, SystemTimeSource};

use crate::adapters::{AccountingChannelReceiver, AccountingNotice, RocksDbStateStore};
use crate::config::OracleNodeConfig;
use crate::handlers::CommandHandler;

/// Pending notices before deliveries start waiting on accounting
pub const ACCOUNTING_CHANNEL_CAPACITY: usize = 64;

pub type RuntimeService =
    OracleService<AccountingChannelReceiver, RocksDbStateStore, SystemTimeSource>;

pub struct OracleRuntime {
    service: Arc<RuntimeService>,
    time: Arc<SystemTimeSource>,
    notices: Option<mpsc::Receiver<AccountingNotice>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl OracleRuntime {
    /// Open storage and build the service
    ///
    /// Persisted state wins over the seed configuration.
    pub fn open(config: &OracleNodeConfig) -> Result<Self> {
        let store = RocksDbStateStore::open(&config.storage.path, config.storage.sync_writes)
            .with_context(|| format!("Failed to open state store at {}", config.storage.path))?;
        let (receiver, notices) = AccountingChannelReceiver::channel(ACCOUNTING_CHANNEL_CAPACITY);
        let time = Arc::new(SystemTimeSource);

        let service = OracleService::new(
            config.to_oracle_config()?,
            Arc::new(receiver),
            Arc::new(store),
            Arc::clone(&time),
        )
        .context("Failed to start oracle service")?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        info!(path = %config.storage.path, "Beacon oracle opened");

        Ok(Self {
            service: Arc::new(service),
            time,
            notices: Some(notices),
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub fn service(&self) -> Arc<RuntimeService> {
        Arc::clone(&self.service)
    }

    pub fn command_handler(&self) -> CommandHandler<RuntimeService, SystemTimeSource> {
        CommandHandler::new(Arc::clone(&self.service), Arc::clone(&self.time))
    }

    /// Accounting side of the delivery channel, if not yet taken
    pub fn take_notices(&mut self) -> Option<mpsc::Receiver<AccountingNotice>> {
        self.notices.take()
    }

    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// Start the accounting consumer and the event logger
    pub fn spawn_background(&mut self) -> Vec<JoinHandle<()>> {
        let mut tasks = Vec::new();

        if let Some(notices) = self.notices.take() {
            tasks.push(tokio::spawn(consume_notices(notices, self.shutdown_signal())));
        }
        tasks.push(tokio::spawn(log_events(
            self.service.subscribe(),
            self.shutdown_signal(),
        )));

        tasks
    }

    pub fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        if self.shutdown_tx.send(true).is_err() {
            debug!("No shutdown listeners left");
        }
    }
}

async fn consume_notices(
    mut notices: mpsc::Receiver<AccountingNotice>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            notice = notices.recv() => match notice {
                Some(notice) => info!(
                    epoch_id = notice.epoch_id,
                    beacon_balance = %notice.beacon_balance,
                    beacon_validators = notice.beacon_validators,
                    "Accounting applied beacon report"
                ),
                None => break,
            },
            _ = shutdown.changed() => {
                info!("[accounting] Shutdown signal received");
                break;
            }
        }
    }
}

async fn log_events(
    mut events: broadcast::Receiver<OracleEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => debug!(event = event.name(), ?event, "Oracle event"),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event logger lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = shutdown.changed() => {
                info!("[events] Shutdown signal received");
                break;
            }
        }
    }
}
