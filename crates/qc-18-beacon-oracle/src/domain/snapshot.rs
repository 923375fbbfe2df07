//! Durable engine state
//!
//! Everything needed to resume mid-frame after a restart: spec, members,
//! quorum, last completed report and the active frame's ledger.
//!
//! Format: \[MAGIC\]\[BINCODE(OracleSnapshot)\]

use super::frame_clock::FrameWindow;
use super::ledger::MemberReport;
use super::{BeaconSpec, CompletedFrame, FrameStatus, MemberAddress};
use crate::error::{OracleError, OracleResult};
use serde::{Deserialize, Serialize};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Magic bytes prefixed to every encoded snapshot
const SNAPSHOT_MAGIC: &[u8; 8] = b"QCORACL\x01";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleSnapshot {
    pub version: u32,
    pub spec: BeaconSpec,
    pub members: Vec<MemberAddress>,
    pub quorum: u32,
    pub last_completed: Option<CompletedFrame>,
    /// Pinned window of the active frame
    pub frame: FrameWindow,
    pub status: FrameStatus,
    /// Active frame's reports in arrival order
    pub reports: Vec<MemberReport>,
}

impl OracleSnapshot {
    pub fn to_bytes(&self) -> OracleResult<Vec<u8>> {
        let body = bincode::serialize(self).map_err(OracleError::storage)?;
        let mut buf = Vec::with_capacity(SNAPSHOT_MAGIC.len() + body.len());
        buf.extend_from_slice(SNAPSHOT_MAGIC);
        buf.extend_from_slice(&body);
        Ok(buf)
    }

    pub fn from_bytes(data: &[u8]) -> OracleResult<Self> {
        let body = data
            .strip_prefix(SNAPSHOT_MAGIC.as_slice())
            .ok_or_else(|| OracleError::storage("invalid snapshot magic"))?;
        bincode::deserialize(body).map_err(OracleError::storage)
    }
}
