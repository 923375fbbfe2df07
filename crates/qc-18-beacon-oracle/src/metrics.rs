//! # Oracle Metrics
//!
//! Prometheus metrics for report intake and frame completion.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-18-beacon-oracle = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `oracle_reports_accepted_total` - Counter of accepted reports
//! - `oracle_reports_rejected_total` - Counter of rejected reports (by reason)
//! - `oracle_frames_completed_total` - Counter of completed frames
//! - `oracle_downstream_failures_total` - Counter of receiver failures
//! - `oracle_quorum` - Gauge of the current quorum
//! - `oracle_members` - Gauge of the current member count

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total reports accepted into a frame
    pub static ref REPORTS_ACCEPTED: IntCounter = register_int_counter!(
        "oracle_reports_accepted_total",
        "Total number of beacon reports accepted"
    )
    .expect("Failed to create REPORTS_ACCEPTED metric");

    /// Total reports rejected, labeled by reason
    pub static ref REPORTS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "oracle_reports_rejected_total",
        "Total number of beacon reports rejected",
        &["reason"]
    )
    .expect("Failed to create REPORTS_REJECTED metric");

    /// Total frames completed
    pub static ref FRAMES_COMPLETED: IntCounter = register_int_counter!(
        "oracle_frames_completed_total",
        "Total number of frames that reached quorum"
    )
    .expect("Failed to create FRAMES_COMPLETED metric");

    /// Total downstream receiver failures
    pub static ref DOWNSTREAM_FAILURES: IntCounter = register_int_counter!(
        "oracle_downstream_failures_total",
        "Total number of completed frames rejected downstream"
    )
    .expect("Failed to create DOWNSTREAM_FAILURES metric");

    pub static ref QUORUM: IntGauge = register_int_gauge!(
        "oracle_quorum",
        "Current quorum threshold"
    )
    .expect("Failed to create QUORUM metric");

    pub static ref MEMBERS: IntGauge = register_int_gauge!(
        "oracle_members",
        "Current number of oracle members"
    )
    .expect("Failed to create MEMBERS metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_report_accepted() {
    REPORTS_ACCEPTED.inc();
}

/// Record report rejected with reason
#[cfg(feature = "metrics")]
pub fn record_report_rejected(reason: &str) {
    REPORTS_REJECTED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_frame_completed() {
    FRAMES_COMPLETED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_downstream_failure() {
    DOWNSTREAM_FAILURES.inc();
}

#[cfg(feature = "metrics")]
pub fn set_quorum(quorum: u32) {
    QUORUM.set(i64::from(quorum));
}

#[cfg(feature = "metrics")]
pub fn set_member_count(count: usize) {
    MEMBERS.set(count as i64);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_report_accepted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_report_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_frame_completed() {}

#[cfg(not(feature = "metrics"))]
pub fn record_downstream_failure() {}

#[cfg(not(feature = "metrics"))]
pub fn set_quorum(_quorum: u32) {}

#[cfg(not(feature = "metrics"))]
pub fn set_member_count(_count: usize) {}
