//! Driving Ports (API - Inbound)

use crate::domain::{
    BeaconSpec, CompletedFrame, CompletionStatus, EpochRange, FrameStatus, FrameWindow,
    MemberAddress, Timestamp, VariantSupport,
};
use crate::error::OracleResult;
use crate::events::ReportSubmission;
use async_trait::async_trait;

/// Primary oracle API
///
/// Management operations are assumed to be authorized by the caller. Those
/// that can complete the active frame return the completion they triggered;
/// the downstream receiver has already been invoked by the time they return.
#[async_trait]
pub trait OracleApi: Send + Sync {
    /// Submit a member's report for the frame containing `submission.now`
    ///
    /// # Returns
    /// * `Collecting` with the variant's support, or `Completed` if this report
    ///   reached the quorum
    async fn submit_report(&self, submission: ReportSubmission)
        -> OracleResult<CompletionStatus>;

    async fn add_member(&self, member: MemberAddress) -> OracleResult<()>;

    /// Remove a member, evicting its report from the collecting frame
    async fn remove_member(&self, member: MemberAddress) -> OracleResult<Option<CompletedFrame>>;

    /// Change the quorum; may complete the collecting frame retroactively
    async fn set_quorum(&self, quorum: u32) -> OracleResult<Option<CompletedFrame>>;

    async fn set_beacon_spec(&self, spec: BeaconSpec) -> OracleResult<()>;

    async fn get_beacon_spec(&self) -> BeaconSpec;

    /// Epochs a report may name at `now`
    async fn get_reportable_epoch_range(&self, now: Timestamp) -> EpochRange;

    async fn get_current_frame(&self) -> FrameWindow;

    async fn get_current_frame_status(&self) -> FrameStatus;

    /// Epoch of the last completed report, zero if none completed yet
    async fn get_last_completed_epoch(&self) -> u64;

    async fn get_last_completed_report(&self) -> Option<CompletedFrame>;

    async fn get_quorum(&self) -> u32;

    async fn get_members(&self) -> Vec<MemberAddress>;

    /// Distinct reports in the current frame with their support
    async fn get_current_variants(&self) -> Vec<VariantSupport>;

    /// Members that reported in the current frame
    async fn get_current_reporters(&self) -> Vec<MemberAddress>;
}
