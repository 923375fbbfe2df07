//! Consensus engine
//!
//! Owns the single active frame and turns member reports into at most one
//! agreed value per frame.
//!
//! ## State machine
//!
//! ```text
//!             report (support < quorum)
//!               ┌──────┐
//!               ↓      │
//! ──new frame──→ [COLLECTING] ──support >= quorum──→ [COMPLETED]
//!                    ↑                                    │
//!                    └──────── time passes frame end ─────┘
//! ```
//!
//! Frame advancement is lazy: every entry point first checks whether the
//! clock has left the active frame. A frame nobody reported in never
//! materializes and is skipped silently.
//!
//! The active frame's epoch window is pinned when it starts collecting. It
//! stays active only while the current epoch, under the current spec, lies
//! inside that window; leaving it in either direction (clock or spec change)
//! starts a fresh frame. Epochs up to the last completed one stay
//! unreportable, so a closed frame is never re-opened.
//!
//! All operations validate before mutating; a rejected call leaves members,
//! quorum, spec and reports untouched.

use super::frame_clock::{self, EpochRange, FrameWindow, Timestamp};
use super::ledger::{MemberReport, ReportLedger};
use super::snapshot::{OracleSnapshot, SNAPSHOT_VERSION};
use super::{
    BeaconSpec, CompletedFrame, MemberAddress, MembershipRegistry, ReportData, VariantSupport,
};
use crate::error::{OracleError, OracleResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Status of the active frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameStatus {
    Collecting,
    Completed,
}

/// Result of an accepted report
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    /// Report recorded, quorum not reached yet
    Collecting {
        frame_id: u64,
        /// Support of the submitted variant
        support: u32,
        quorum: u32,
    },
    /// This report completed the frame
    Completed(CompletedFrame),
}

impl CompletionStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, CompletionStatus::Completed(_))
    }
}

#[derive(Clone, Debug)]
struct ActiveFrame {
    window: FrameWindow,
    status: FrameStatus,
    ledger: ReportLedger,
}

impl ActiveFrame {
    fn collecting(window: FrameWindow) -> Self {
        Self {
            window,
            status: FrameStatus::Collecting,
            ledger: ReportLedger::new(window.frame_id),
        }
    }
}

/// Quorum-based report consensus over lazily derived frames
#[derive(Clone, Debug)]
pub struct ConsensusEngine {
    spec: BeaconSpec,
    membership: MembershipRegistry,
    last_completed: Option<CompletedFrame>,
    active: ActiveFrame,
}

impl ConsensusEngine {
    /// Fresh engine with no members, collecting the frame that contains `now`
    pub fn new(spec: BeaconSpec, now: Timestamp) -> OracleResult<Self> {
        Self::with_membership(spec, MembershipRegistry::new(), now)
    }

    pub fn with_membership(
        spec: BeaconSpec,
        membership: MembershipRegistry,
        now: Timestamp,
    ) -> OracleResult<Self> {
        spec.validate()?;
        Ok(Self {
            spec,
            membership,
            last_completed: None,
            active: ActiveFrame::collecting(frame_clock::current_frame(now, &spec)),
        })
    }

    // =========================================================================
    // FRAME ROLLOVER
    // =========================================================================

    /// Whether the current epoch at `now` lies outside the active frame's
    /// pinned window
    fn is_superseded(&self, now: Timestamp) -> bool {
        !self
            .active
            .window
            .contains_epoch(frame_clock::current_epoch_id(now, &self.spec))
    }

    /// Start a fresh frame if the clock left the active one
    fn sync_frame(&mut self, now: Timestamp) {
        if !self.is_superseded(now) {
            return;
        }
        let window = frame_clock::current_frame(now, &self.spec);
        debug!(
            previous_frame = self.active.window.frame_id,
            previous_status = ?self.active.status,
            frame_id = window.frame_id,
            first_epoch = window.first_epoch,
            last_epoch = window.last_epoch,
            "Frame rolled over"
        );
        self.active = ActiveFrame::collecting(window);
    }

    /// Active frame as it would look at `now`, without mutating
    fn view(&self, now: Timestamp) -> Option<&ActiveFrame> {
        if self.is_superseded(now) {
            None
        } else {
            Some(&self.active)
        }
    }

    // =========================================================================
    // REPORTING
    // =========================================================================

    /// Accept a member's report for the current frame
    ///
    /// Checks, in order: frame rollover, membership, frame already completed,
    /// epoch range, one report per member. Completion happens in the same call
    /// once the best variant's support reaches the quorum.
    pub fn submit_report(
        &mut self,
        member: MemberAddress,
        report: ReportData,
        now: Timestamp,
    ) -> OracleResult<CompletionStatus> {
        self.sync_frame(now);

        if !self.membership.contains(&member) {
            return Err(OracleError::MemberNotAuthorized { member });
        }

        if self.active.status == FrameStatus::Completed {
            return Err(OracleError::FrameAlreadyCompleted {
                frame_id: self.active.window.frame_id,
            });
        }

        let range = self.active_range(now);
        if !range.contains(report.epoch_id) {
            return Err(OracleError::EpochOutOfRange {
                epoch_id: report.epoch_id,
                min_epoch: range.min_epoch,
                max_epoch: range.max_epoch,
            });
        }

        let outcome = self.active.ledger.submit(member, report)?;
        debug!(
            %member,
            frame_id = self.active.window.frame_id,
            epoch_id = report.epoch_id,
            support = outcome.support,
            quorum = self.membership.quorum(),
            "Beacon report accepted"
        );

        match self.try_complete() {
            Some(completed) => Ok(CompletionStatus::Completed(completed)),
            None => Ok(CompletionStatus::Collecting {
                frame_id: self.active.window.frame_id,
                support: outcome.support,
                quorum: self.membership.quorum(),
            }),
        }
    }

    /// Complete the active frame if its best variant meets the quorum
    fn try_complete(&mut self) -> Option<CompletedFrame> {
        if self.active.status != FrameStatus::Collecting {
            return None;
        }
        let best = self.active.ledger.best()?;
        if best.support < self.membership.quorum() {
            return None;
        }

        let completed = CompletedFrame {
            frame_id: self.active.window.frame_id,
            report: best.report,
            support: best.support,
        };
        self.active.status = FrameStatus::Completed;
        self.last_completed = Some(completed);

        info!(
            frame_id = completed.frame_id,
            epoch_id = completed.report.epoch_id,
            beacon_balance = %completed.report.beacon_balance,
            beacon_validators = completed.report.beacon_validators,
            support = completed.support,
            "Frame completed"
        );
        Some(completed)
    }

    fn active_range(&self, now: Timestamp) -> EpochRange {
        frame_clock::reportable_epoch_range_within(
            &self.active.window,
            now,
            &self.spec,
            self.last_completed_epoch(),
        )
    }

    // =========================================================================
    // MANAGEMENT
    // =========================================================================

    /// Register a member; it may report from the current frame on
    pub fn add_member(&mut self, member: MemberAddress) -> OracleResult<()> {
        self.membership.add(member)?;
        info!(%member, members = self.membership.len(), "Oracle member added");
        Ok(())
    }

    /// Remove a member and evict its report from the collecting frame
    ///
    /// Quorum is re-evaluated against the remaining reports in the same call.
    /// A quorum above the remaining member count is tolerated and logged.
    pub fn remove_member(
        &mut self,
        member: MemberAddress,
        now: Timestamp,
    ) -> OracleResult<Option<CompletedFrame>> {
        self.membership.remove(&member)?;
        self.sync_frame(now);

        if self.active.status == FrameStatus::Collecting {
            if let Some(evicted) = self.active.ledger.evict(&member) {
                debug!(
                    %member,
                    frame_id = self.active.window.frame_id,
                    epoch_id = evicted.report.epoch_id,
                    "Evicted report of removed member"
                );
            }
        }

        info!(%member, members = self.membership.len(), "Oracle member removed");
        self.warn_if_unreachable();
        Ok(self.try_complete())
    }

    /// Change the quorum, completing the collecting frame at once if an
    /// existing variant already meets the new threshold
    pub fn set_quorum(
        &mut self,
        quorum: u32,
        now: Timestamp,
    ) -> OracleResult<Option<CompletedFrame>> {
        if quorum == 0 {
            return Err(OracleError::InvalidQuorum { quorum });
        }
        self.sync_frame(now);
        self.membership.set_quorum(quorum)?;

        info!(quorum, "Quorum changed");
        self.warn_if_unreachable();
        Ok(self.try_complete())
    }

    /// Replace the beacon spec
    ///
    /// Reports already recorded keep their epoch ids. The active frame keeps
    /// its pinned window for as long as the current epoch under the new spec
    /// stays inside it.
    pub fn set_beacon_spec(&mut self, spec: BeaconSpec, now: Timestamp) -> OracleResult<()> {
        spec.validate()?;
        // Roll over under the old geometry first
        self.sync_frame(now);
        self.spec = spec;
        info!(
            epochs_per_frame = spec.epochs_per_frame,
            slots_per_epoch = spec.slots_per_epoch,
            seconds_per_slot = spec.seconds_per_slot,
            genesis_time = spec.genesis_time,
            "Beacon spec set"
        );
        Ok(())
    }

    fn warn_if_unreachable(&self) {
        if !self.membership.is_quorum_reachable() {
            warn!(
                quorum = self.membership.quorum(),
                members = self.membership.len(),
                "Quorum exceeds member count; frames cannot complete until reconfigured"
            );
        }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn spec(&self) -> BeaconSpec {
        self.spec
    }

    pub fn membership(&self) -> &MembershipRegistry {
        &self.membership
    }

    pub fn quorum(&self) -> u32 {
        self.membership.quorum()
    }

    pub fn members(&self) -> Vec<MemberAddress> {
        self.membership.members()
    }

    pub fn last_completed_report(&self) -> Option<CompletedFrame> {
        self.last_completed
    }

    pub fn last_completed_epoch(&self) -> Option<u64> {
        self.last_completed.map(|c| c.epoch_id())
    }

    /// Epochs a report may name at `now`
    pub fn reportable_epoch_range(&self, now: Timestamp) -> EpochRange {
        match self.view(now) {
            Some(active) => frame_clock::reportable_epoch_range_within(
                &active.window,
                now,
                &self.spec,
                self.last_completed_epoch(),
            ),
            None => frame_clock::reportable_epoch_range(now, &self.spec, self.last_completed_epoch()),
        }
    }

    pub fn current_frame(&self, now: Timestamp) -> FrameWindow {
        match self.view(now) {
            Some(active) => active.window,
            None => frame_clock::current_frame(now, &self.spec),
        }
    }

    pub fn current_frame_status(&self, now: Timestamp) -> FrameStatus {
        self.view(now)
            .map(|active| active.status)
            .unwrap_or(FrameStatus::Collecting)
    }

    pub fn current_variants(&self, now: Timestamp) -> Vec<VariantSupport> {
        self.view(now)
            .map(|active| active.ledger.variants())
            .unwrap_or_default()
    }

    pub fn current_reporters(&self, now: Timestamp) -> Vec<MemberAddress> {
        self.view(now)
            .map(|active| active.ledger.reporters())
            .unwrap_or_default()
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Full reconstruction input for resuming mid-frame
    pub fn snapshot(&self) -> OracleSnapshot {
        OracleSnapshot {
            version: SNAPSHOT_VERSION,
            spec: self.spec,
            members: self.membership.members(),
            quorum: self.membership.quorum(),
            last_completed: self.last_completed,
            frame: self.active.window,
            status: self.active.status,
            reports: self.active.ledger.reports(),
        }
    }

    /// Rebuild an engine from a snapshot
    pub fn restore(snapshot: OracleSnapshot) -> OracleResult<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(OracleError::storage(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        snapshot.spec.validate()?;
        let membership = MembershipRegistry::from_parts(snapshot.members, snapshot.quorum)?;

        if let Some(stray) = snapshot
            .reports
            .iter()
            .find(|r: &&MemberReport| !membership.contains(&r.member))
        {
            return Err(OracleError::storage(format!(
                "snapshot holds a report from non-member {}",
                stray.member
            )));
        }

        let ledger = ReportLedger::from_reports(snapshot.frame.frame_id, snapshot.reports)
            .map_err(|e| OracleError::storage(format!("corrupt snapshot ledger: {}", e)))?;
        Ok(Self {
            spec: snapshot.spec,
            membership,
            last_completed: snapshot.last_completed,
            active: ActiveFrame {
                window: snapshot.frame,
                status: snapshot.status,
                ledger,
            },
        })
    }
}
