//! Beacon chain time geometry

use crate::error::{OracleError, OracleResult};
use serde::{Deserialize, Serialize};

/// Window geometry of the observed beacon chain
///
/// All rate fields must be non-zero. `genesis_time` is a unix timestamp and
/// may be any value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconSpec {
    pub epochs_per_frame: u64,
    pub slots_per_epoch: u64,
    pub seconds_per_slot: u64,
    pub genesis_time: u64,
}

impl Default for BeaconSpec {
    fn default() -> Self {
        Self {
            epochs_per_frame: 225, // one day of 6.4 minute epochs
            slots_per_epoch: 32,
            seconds_per_slot: 12,
            genesis_time: 1_606_824_023,
        }
    }
}

impl BeaconSpec {
    /// Build a validated spec
    pub fn new(
        epochs_per_frame: u64,
        slots_per_epoch: u64,
        seconds_per_slot: u64,
        genesis_time: u64,
    ) -> OracleResult<Self> {
        let spec = Self {
            epochs_per_frame,
            slots_per_epoch,
            seconds_per_slot,
            genesis_time,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Reject zero rate fields
    pub fn validate(&self) -> OracleResult<()> {
        if self.epochs_per_frame == 0 {
            return Err(OracleError::InvalidConfig {
                field: "epochs_per_frame",
            });
        }
        if self.slots_per_epoch == 0 {
            return Err(OracleError::InvalidConfig {
                field: "slots_per_epoch",
            });
        }
        if self.seconds_per_slot == 0 {
            return Err(OracleError::InvalidConfig {
                field: "seconds_per_slot",
            });
        }
        Ok(())
    }

    pub fn seconds_per_epoch(&self) -> u64 {
        self.slots_per_epoch.saturating_mul(self.seconds_per_slot)
    }

    pub fn frame_duration_secs(&self) -> u64 {
        self.seconds_per_epoch().saturating_mul(self.epochs_per_frame)
    }
}
