//! Frame clock
//!
//! Pure derivations from a [`BeaconSpec`] and wall-clock time. Nothing here
//! holds state; frame advancement is detected lazily by whoever calls in.
//!
//! ```text
//! genesis                                                       now
//!    │ epoch 0 │ epoch 1 │ ... │ epoch E │ ...
//!    ├─────────────── frame 0 ───────────┼──── frame 1 ────┤
//!    frame_id = epoch_id / epochs_per_frame
//! ```
//!
//! All arithmetic saturates; extreme specs never panic.

use super::BeaconSpec;
use serde::{Deserialize, Serialize};

/// Unix timestamp in seconds
pub type Timestamp = u64;

/// Inclusive range of epoch ids a report may currently name
///
/// Empty when `min_epoch > max_epoch` (e.g. the frame just completed at the
/// latest epoch).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochRange {
    pub min_epoch: u64,
    pub max_epoch: u64,
}

impl EpochRange {
    pub fn contains(&self, epoch_id: u64) -> bool {
        epoch_id >= self.min_epoch && epoch_id <= self.max_epoch
    }

    pub fn is_empty(&self) -> bool {
        self.min_epoch > self.max_epoch
    }
}

/// Epoch window of one frame, pinned when the frame starts collecting
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameWindow {
    pub frame_id: u64,
    pub first_epoch: u64,
    pub last_epoch: u64,
    /// Start time of the first epoch
    pub start_time: Timestamp,
    /// Last second belonging to the frame
    pub end_time: Timestamp,
}

impl FrameWindow {
    pub fn contains_epoch(&self, epoch_id: u64) -> bool {
        epoch_id >= self.first_epoch && epoch_id <= self.last_epoch
    }
}

/// Epoch at `now`, zero before genesis
pub fn current_epoch_id(now: Timestamp, spec: &BeaconSpec) -> u64 {
    now.saturating_sub(spec.genesis_time)
        .checked_div(spec.seconds_per_epoch())
        .unwrap_or(0)
}

pub fn current_frame_id(now: Timestamp, spec: &BeaconSpec) -> u64 {
    frame_of_epoch(current_epoch_id(now, spec), spec)
}

pub fn frame_of_epoch(epoch_id: u64, spec: &BeaconSpec) -> u64 {
    epoch_id.checked_div(spec.epochs_per_frame).unwrap_or(0)
}

pub fn frame_start_epoch(frame_id: u64, spec: &BeaconSpec) -> u64 {
    frame_id.saturating_mul(spec.epochs_per_frame)
}

pub fn frame_last_epoch(frame_id: u64, spec: &BeaconSpec) -> u64 {
    frame_start_epoch(frame_id, spec).saturating_add(spec.epochs_per_frame.saturating_sub(1))
}

pub fn epoch_start_time(epoch_id: u64, spec: &BeaconSpec) -> Timestamp {
    spec.genesis_time
        .saturating_add(epoch_id.saturating_mul(spec.seconds_per_epoch()))
}

/// Window of the frame containing `now`
pub fn current_frame(now: Timestamp, spec: &BeaconSpec) -> FrameWindow {
    frame_window(current_frame_id(now, spec), spec)
}

pub fn frame_window(frame_id: u64, spec: &BeaconSpec) -> FrameWindow {
    let first_epoch = frame_start_epoch(frame_id, spec);
    let last_epoch = frame_last_epoch(frame_id, spec);
    let start_time = epoch_start_time(first_epoch, spec);
    let end_time = start_time
        .saturating_add(spec.frame_duration_secs())
        .saturating_sub(1);
    FrameWindow {
        frame_id,
        first_epoch,
        last_epoch,
        start_time,
        end_time,
    }
}

/// Epochs a report may name at `now`
///
/// `max = current epoch`, `min = max(last_completed + 1, first epoch of the
/// current frame)`. Anything below `min` belongs to a completed or closed
/// frame; anything above `max` has not happened yet.
pub fn reportable_epoch_range(
    now: Timestamp,
    spec: &BeaconSpec,
    last_completed_epoch: Option<u64>,
) -> EpochRange {
    let frame_start = frame_start_epoch(current_frame_id(now, spec), spec);
    EpochRange {
        min_epoch: after_completed(last_completed_epoch).max(frame_start),
        max_epoch: current_epoch_id(now, spec),
    }
}

/// Same as [`reportable_epoch_range`], bounded by a pinned frame window
///
/// Used for a frame that started collecting under an earlier spec: its
/// reports stay valid for the window it was opened with.
pub fn reportable_epoch_range_within(
    window: &FrameWindow,
    now: Timestamp,
    spec: &BeaconSpec,
    last_completed_epoch: Option<u64>,
) -> EpochRange {
    EpochRange {
        min_epoch: after_completed(last_completed_epoch).max(window.first_epoch),
        max_epoch: current_epoch_id(now, spec).min(window.last_epoch),
    }
}

fn after_completed(last_completed_epoch: Option<u64>) -> u64 {
    last_completed_epoch.map_or(0, |epoch| epoch.saturating_add(1))
}
