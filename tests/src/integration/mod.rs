//! # Integration Flows
//!
//! Shared fixtures. All scenarios use 10 epochs per frame and 10 second
//! epochs with genesis at t=1000, so frame N covers epochs `10N..=10N+9`.

pub mod churn;
pub mod commands;
pub mod downstream;

use std::path::Path;
use std::sync::Arc;

use oracle_runtime::adapters::RocksDbStateStore;
use qc_18_beacon_oracle::test_utils::ManualTimeSource;
use qc_18_beacon_oracle::{
    BeaconReportReceiver, BeaconSpec, MemberAddress, OracleConfig, OracleResult, OracleService,
    ReportData, ReportSubmission, Timestamp,
};

pub const GENESIS: u64 = 1_000;

pub type DurableService<R> = OracleService<R, RocksDbStateStore, ManualTimeSource>;

pub fn spec() -> BeaconSpec {
    BeaconSpec {
        epochs_per_frame: 10,
        slots_per_epoch: 2,
        seconds_per_slot: 5,
        genesis_time: GENESIS,
    }
}

/// First second of `epoch`
pub fn at_epoch(epoch: u64) -> Timestamp {
    GENESIS + epoch * 10
}

pub fn member(n: u8) -> MemberAddress {
    let mut bytes = [0u8; 20];
    bytes[19] = n;
    MemberAddress::new(bytes)
}

pub fn config(members: &[u8], quorum: u32) -> OracleConfig {
    OracleConfig {
        spec: spec(),
        members: members.iter().map(|n| member(*n)).collect(),
        quorum,
        event_capacity: 64,
    }
}

pub fn report(
    n: u8,
    epoch: u64,
    balance: u128,
    validators: u64,
    now: Timestamp,
) -> ReportSubmission {
    ReportSubmission::new(member(n), ReportData::new(epoch, balance, validators), now)
}

/// Service backed by RocksDB under `dir`
pub fn open_durable<R: BeaconReportReceiver + 'static>(
    dir: &Path,
    config: OracleConfig,
    receiver: Arc<R>,
    clock: Arc<ManualTimeSource>,
) -> OracleResult<DurableService<R>> {
    let store = RocksDbStateStore::open(dir.join("oracle"), false)?;
    OracleService::new(config, receiver, Arc::new(store), clock)
}
