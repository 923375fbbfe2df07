//! Driven Ports (SPI - Outbound Dependencies)

use crate::domain::{OracleSnapshot, Timestamp};
use crate::error::OracleResult;
use async_trait::async_trait;

/// Consumer of agreed beacon data (the accounting layer)
///
/// Invoked at most once per completed frame, from the oracle's delivery task,
/// in completion order. A failure is surfaced to the caller that triggered
/// completion if it is still waiting; the frame stays completed and the call
/// is not retried.
#[async_trait]
pub trait BeaconReportReceiver: Send + Sync {
    async fn on_frame_completed(
        &self,
        epoch_id: u64,
        beacon_balance: u128,
        beacon_validators: u64,
    ) -> OracleResult<()>;
}

/// Durable storage for the engine snapshot
///
/// Called with the engine lock held, so implementations must not block on
/// anything that re-enters the oracle.
pub trait OracleStateStore: Send + Sync {
    /// Last saved snapshot, `None` on first boot
    fn load(&self) -> OracleResult<Option<OracleSnapshot>>;

    fn save(&self, snapshot: &OracleSnapshot) -> OracleResult<()>;
}

/// Wall-clock source for operations that do not carry a timestamp
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Timestamp;
}
