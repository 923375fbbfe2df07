//! Domain module for the beacon oracle
//!
//! ## Core Modules
//! - beacon_spec: Chain time geometry
//! - frame_clock: Epoch and frame derivation from wall-clock time
//! - membership: Authorized reporters and quorum
//! - ledger: Per-frame report bookkeeping
//! - engine: Frame state machine and completion
//! - snapshot: Durable engine state

pub mod beacon_spec;
pub mod engine;
pub mod frame_clock;
pub mod ledger;
pub mod membership;
pub mod report;
pub mod snapshot;

pub use beacon_spec::BeaconSpec;
pub use engine::{CompletionStatus, ConsensusEngine, FrameStatus};
pub use frame_clock::{EpochRange, FrameWindow, Timestamp};
pub use ledger::{MemberReport, ReportLedger, SubmitOutcome};
pub use membership::{
    AddressParseError, MemberAddress, MembershipRegistry, DEFAULT_QUORUM, MAX_MEMBERS,
};
pub use report::{CompletedFrame, ReportData, VariantSupport};
pub use snapshot::{OracleSnapshot, SNAPSHOT_VERSION};
