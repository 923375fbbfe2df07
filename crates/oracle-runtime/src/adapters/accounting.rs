//! Accounting channel receiver
//!
//! Forwards completed frames to the accounting layer over a bounded channel.
//! The accounting side owns the receiving half; a closed channel counts as a
//! downstream rejection.

use async_trait::async_trait;
use qc_18_beacon_oracle::{BeaconReportReceiver, OracleError, OracleResult};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use tokio::sync::mpsc;
use tracing::info;

/// Agreed beacon data for one completed frame
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingNotice {
    pub epoch_id: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub beacon_balance: u128,
    pub beacon_validators: u64,
}

pub struct AccountingChannelReceiver {
    sender: mpsc::Sender<AccountingNotice>,
}

impl AccountingChannelReceiver {
    /// Create the receiver and the accounting side of its channel
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AccountingNotice>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl BeaconReportReceiver for AccountingChannelReceiver {
    async fn on_frame_completed(
        &self,
        epoch_id: u64,
        beacon_balance: u128,
        beacon_validators: u64,
    ) -> OracleResult<()> {
        let notice = AccountingNotice {
            epoch_id,
            beacon_balance,
            beacon_validators,
        };
        self.sender
            .send(notice)
            .await
            .map_err(|_| OracleError::DownstreamRejected {
                epoch_id,
                reason: "accounting channel closed".to_string(),
            })?;

        info!(
            epoch_id,
            beacon_balance = %beacon_balance,
            beacon_validators,
            "Forwarded beacon report to accounting"
        );
        Ok(())
    }
}
