//! Outgoing events
//!
//! Broadcast to subscribers after each successful operation. Completion is
//! published after the downstream receiver has been invoked.

use crate::domain::{BeaconSpec, CompletedFrame, MemberAddress, ReportData};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OracleEvent {
    MemberAdded {
        member: MemberAddress,
    },
    MemberRemoved {
        member: MemberAddress,
    },
    QuorumChanged {
        quorum: u32,
    },
    BeaconSpecSet {
        spec: BeaconSpec,
    },
    BeaconReported {
        member: MemberAddress,
        epoch_id: u64,
        #[serde_as(as = "DisplayFromStr")]
        beacon_balance: u128,
        beacon_validators: u64,
    },
    Completed {
        frame_id: u64,
        epoch_id: u64,
        #[serde_as(as = "DisplayFromStr")]
        beacon_balance: u128,
        beacon_validators: u64,
    },
}

impl OracleEvent {
    pub fn reported(member: MemberAddress, report: &ReportData) -> Self {
        OracleEvent::BeaconReported {
            member,
            epoch_id: report.epoch_id,
            beacon_balance: report.beacon_balance,
            beacon_validators: report.beacon_validators,
        }
    }

    pub fn completed(frame: &CompletedFrame) -> Self {
        OracleEvent::Completed {
            frame_id: frame.frame_id,
            epoch_id: frame.report.epoch_id,
            beacon_balance: frame.report.beacon_balance,
            beacon_validators: frame.report.beacon_validators,
        }
    }

    /// Short event name, used for logging
    pub fn name(&self) -> &'static str {
        match self {
            OracleEvent::MemberAdded { .. } => "MemberAdded",
            OracleEvent::MemberRemoved { .. } => "MemberRemoved",
            OracleEvent::QuorumChanged { .. } => "QuorumChanged",
            OracleEvent::BeaconSpecSet { .. } => "BeaconSpecSet",
            OracleEvent::BeaconReported { .. } => "BeaconReported",
            OracleEvent::Completed { .. } => "Completed",
        }
    }
}
