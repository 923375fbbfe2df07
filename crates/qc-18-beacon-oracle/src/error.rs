//! Error types for the Beacon Oracle subsystem
//!
//! Every rejection is a typed result. No operation in this crate is fatal;
//! the caller inspects the error and retries with corrected input, waits for
//! a later frame, or escalates to the operator.

use crate::domain::MemberAddress;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Coarse classification of an [`OracleError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Rejected management call, state unchanged
    Configuration,
    /// Rejected report, ledger unchanged
    ReportValidation,
    /// Consensus succeeded but the accounting layer refused the result
    Downstream,
    /// Snapshot could not be loaded or saved
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::ReportValidation => "report_validation",
            ErrorKind::Downstream => "downstream",
            ErrorKind::Storage => "storage",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Beacon Oracle errors
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum OracleError {
    /// A beacon spec rate field is zero
    #[error("Invalid beacon spec: {field} must be greater than zero")]
    InvalidConfig { field: &'static str },

    /// Quorum of zero requested
    #[error("Invalid quorum: {quorum} (must be at least 1)")]
    InvalidQuorum { quorum: u32 },

    /// Member set is at capacity
    #[error("Member limit exceeded: at most {max} members allowed")]
    MemberLimitExceeded { max: usize },

    /// Member is already registered
    #[error("Duplicate member: {member}")]
    DuplicateMember { member: MemberAddress },

    /// Member is not registered
    #[error("Unknown member: {member}")]
    UnknownMember { member: MemberAddress },

    /// Report from an address outside the member set
    #[error("Member not authorized to report: {member}")]
    MemberNotAuthorized { member: MemberAddress },

    /// Reported epoch is too early or too late for the current frame
    #[error("Epoch {epoch_id} outside reportable range [{min_epoch}, {max_epoch}]")]
    EpochOutOfRange {
        epoch_id: u64,
        min_epoch: u64,
        max_epoch: u64,
    },

    /// Frame already reached quorum
    #[error("Frame {frame_id} already completed")]
    FrameAlreadyCompleted { frame_id: u64 },

    /// Member already reported in this frame
    #[error("Member {member} already reported in frame {frame_id}")]
    AlreadyReported { member: MemberAddress, frame_id: u64 },

    /// Downstream receiver refused the completed report.
    ///
    /// The frame stays completed; this is surfaced, never retried.
    #[error("Downstream receiver rejected completed epoch {epoch_id}: {reason}")]
    DownstreamRejected { epoch_id: u64, reason: String },

    /// Snapshot persistence failure
    #[error("Storage error: {reason}")]
    Storage { reason: String },
}

impl OracleError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            OracleError::InvalidConfig { .. }
            | OracleError::InvalidQuorum { .. }
            | OracleError::MemberLimitExceeded { .. }
            | OracleError::DuplicateMember { .. }
            | OracleError::UnknownMember { .. } => ErrorKind::Configuration,
            OracleError::MemberNotAuthorized { .. }
            | OracleError::EpochOutOfRange { .. }
            | OracleError::FrameAlreadyCompleted { .. }
            | OracleError::AlreadyReported { .. } => ErrorKind::ReportValidation,
            OracleError::DownstreamRejected { .. } => ErrorKind::Downstream,
            OracleError::Storage { .. } => ErrorKind::Storage,
        }
    }

    /// Short stable label, used for metrics
    pub fn label(&self) -> &'static str {
        match self {
            OracleError::InvalidConfig { .. } => "invalid_config",
            OracleError::InvalidQuorum { .. } => "invalid_quorum",
            OracleError::MemberLimitExceeded { .. } => "member_limit_exceeded",
            OracleError::DuplicateMember { .. } => "duplicate_member",
            OracleError::UnknownMember { .. } => "unknown_member",
            OracleError::MemberNotAuthorized { .. } => "member_not_authorized",
            OracleError::EpochOutOfRange { .. } => "epoch_out_of_range",
            OracleError::FrameAlreadyCompleted { .. } => "frame_already_completed",
            OracleError::AlreadyReported { .. } => "already_reported",
            OracleError::DownstreamRejected { .. } => "downstream_rejected",
            OracleError::Storage { .. } => "storage",
        }
    }

    /// Storage failure with a free-form reason
    pub fn storage(reason: impl fmt::Display) -> Self {
        OracleError::Storage {
            reason: reason.to_string(),
        }
    }
}

/// Result type for oracle operations
pub type OracleResult<T> = Result<T, OracleError>;
