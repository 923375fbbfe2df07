//! Beacon report values

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

/// A single observation of the beacon chain
///
/// Equality is structural; two reports with equal fields are the same variant.
#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportData {
    pub epoch_id: u64,
    /// Total balance of the observed validators (gwei)
    #[serde_as(as = "DisplayFromStr")]
    pub beacon_balance: u128,
    pub beacon_validators: u64,
}

impl ReportData {
    pub fn new(epoch_id: u64, beacon_balance: u128, beacon_validators: u64) -> Self {
        Self {
            epoch_id,
            beacon_balance,
            beacon_validators,
        }
    }
}

/// Support for one report variant in the active frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSupport {
    pub report: ReportData,
    pub support: u32,
}

/// Agreed value of a frame that reached quorum
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedFrame {
    pub frame_id: u64,
    pub report: ReportData,
    /// Matching reports at the moment of completion
    pub support: u32,
}

impl CompletedFrame {
    pub fn epoch_id(&self) -> u64 {
        self.report.epoch_id
    }
}
