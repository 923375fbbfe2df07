//! Ports module for the beacon oracle

pub mod inbound;
pub mod outbound;

pub use inbound::OracleApi;
pub use outbound::{BeaconReportReceiver, OracleStateStore, TimeSource};
