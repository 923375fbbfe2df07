//! Events module for the beacon oracle

pub mod incoming;
pub mod outgoing;

pub use incoming::ReportSubmission;
pub use outgoing::OracleEvent;
