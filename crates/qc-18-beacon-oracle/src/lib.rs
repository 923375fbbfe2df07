//! # qc-18-beacon-oracle
//!
//! Quorum-based consensus over beacon chain reports.
//!
//! ## Overview
//!
//! A permissioned set of oracle members independently observe the beacon
//! chain and submit periodic reports `(epoch, balance, validators)`. This
//! subsystem turns those possibly conflicting observations into one agreed
//! value per frame and hands it downstream exactly once.
//!
//! - **Frames**: fixed windows of epochs derived lazily from wall-clock time
//! - **Quorum**: a frame completes when one report variant gathers enough
//!   identical reports
//! - **Exactly-once**: a completed frame rejects further reports and is never
//!   re-opened, not even by a spec change
//!
//! ## Architecture
//!
//! ```text
//! Oracle members ──ReportSubmission──→ Beacon Oracle (18)
//!                                          │
//!                                          ├── on_frame_completed ──→ Accounting
//!                                          │
//!                                          ├── OracleSnapshot ──→ State store
//!                                          │
//!                                          └── OracleEvent ──→ Subscribers
//! ```
//!
//! ## Frame State Machine
//!
//! ```text
//! [COLLECTING] ──support >= quorum──→ [COMPLETED]
//!      ↑                                   │
//!      └────── clock passes frame end ─────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use qc_18_beacon_oracle::{OracleService, OracleConfig, ReportSubmission};
//! use qc_18_beacon_oracle::ports::inbound::OracleApi;
//!
//! let service = OracleService::new(
//!     OracleConfig::default(),
//!     receiver,
//!     store,
//!     Arc::new(SystemTimeSource),
//! )?;
//!
//! let status = service.submit_report(ReportSubmission::new(member, report, now)).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adapters::{InMemoryStateStore, RecordingReceiver, SystemTimeSource};
pub use domain::{
    BeaconSpec, CompletedFrame, CompletionStatus, ConsensusEngine, EpochRange, FrameStatus,
    FrameWindow, MemberAddress, MembershipRegistry, OracleSnapshot, ReportData, Timestamp,
    VariantSupport, MAX_MEMBERS,
};
pub use error::{ErrorKind, OracleError, OracleResult};
pub use events::{OracleEvent, ReportSubmission};
pub use ports::inbound::OracleApi;
pub use ports::outbound::{BeaconReportReceiver, OracleStateStore, TimeSource};
pub use service::OracleService;
pub use types::OracleConfig;
