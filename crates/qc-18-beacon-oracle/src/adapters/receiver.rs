//! Recording downstream receiver
//!
//! Collects every delivered completion. Useful for hosts that poll rather than
//! push, and for asserting exactly-once delivery in tests.

use crate::domain::ReportData;
use crate::error::{OracleError, OracleResult};
use crate::ports::outbound::BeaconReportReceiver;
use async_trait::async_trait;
use parking_lot::RwLock;

#[derive(Default)]
pub struct RecordingReceiver {
    delivered: RwLock<Vec<ReportData>>,
    reject_reason: RwLock<Option<String>>,
}

impl RecordingReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delivery attempt, including rejected ones, in call order
    pub fn delivered(&self) -> Vec<ReportData> {
        self.delivered.read().clone()
    }

    pub fn delivery_count(&self) -> usize {
        self.delivered.read().len()
    }

    /// Reject subsequent deliveries with `reason`, or accept again with `None`
    pub fn reject_with(&self, reason: Option<&str>) {
        *self.reject_reason.write() = reason.map(str::to_string);
    }
}

#[async_trait]
impl BeaconReportReceiver for RecordingReceiver {
    async fn on_frame_completed(
        &self,
        epoch_id: u64,
        beacon_balance: u128,
        beacon_validators: u64,
    ) -> OracleResult<()> {
        self.delivered
            .write()
            .push(ReportData::new(epoch_id, beacon_balance, beacon_validators));

        match self.reject_reason.read().clone() {
            Some(reason) => Err(OracleError::DownstreamRejected { epoch_id, reason }),
            None => Ok(()),
        }
    }
}
