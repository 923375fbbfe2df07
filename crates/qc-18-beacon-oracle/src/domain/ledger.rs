//! Per-frame report ledger
//!
//! Keeps one report per member plus an incremental support count per report
//! variant. Counts are derived from the reports and never persisted on their
//! own; a ledger rebuilt from its reports is identical to the one it came from.
//!
//! ## Best variant
//!
//! The best variant has the highest support. On a tie, the variant that
//! reached that support first wins. "Reached at" is the submission sequence
//! of the newest report currently backing the variant, so the rule holds
//! after evictions as well.
//!
//! Submitting is O(1): only the touched variant can overtake the current best.
//! Eviction rescans the (member-bounded) variant list.

use super::{MemberAddress, ReportData, VariantSupport};
use crate::error::{OracleError, OracleResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A member's accepted report, stamped with its submission sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberReport {
    pub member: MemberAddress,
    pub report: ReportData,
    pub sequence: u64,
}

/// Result of a successful submission
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Support of the submitted variant after this report
    pub support: u32,
    /// Best variant after this report
    pub best: VariantSupport,
}

#[derive(Clone, Debug)]
struct VariantEntry {
    report: ReportData,
    support: u32,
    reached_at: u64,
}

/// Reports of one frame
#[derive(Clone, Debug)]
pub struct ReportLedger {
    frame_id: u64,
    reports: HashMap<MemberAddress, MemberReport>,
    /// First-seen order
    variants: Vec<VariantEntry>,
    variant_index: HashMap<ReportData, usize>,
    best: Option<usize>,
    next_sequence: u64,
}

impl ReportLedger {
    pub fn new(frame_id: u64) -> Self {
        Self {
            frame_id,
            reports: HashMap::new(),
            variants: Vec::new(),
            variant_index: HashMap::new(),
            best: None,
            next_sequence: 0,
        }
    }

    /// Rebuild a ledger from persisted reports
    pub fn from_reports(
        frame_id: u64,
        reports: impl IntoIterator<Item = MemberReport>,
    ) -> OracleResult<Self> {
        let mut ordered: Vec<MemberReport> = reports.into_iter().collect();
        ordered.sort_by_key(|r| r.sequence);

        let mut ledger = Self::new(frame_id);
        for entry in ordered {
            ledger.insert(entry.member, entry.report, entry.sequence)?;
        }
        Ok(ledger)
    }

    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// Record a member's report for this frame
    ///
    /// A member reports once per frame; revisions are rejected with
    /// `AlreadyReported`.
    pub fn submit(
        &mut self,
        member: MemberAddress,
        report: ReportData,
    ) -> OracleResult<SubmitOutcome> {
        let sequence = self.next_sequence;
        self.insert(member, report, sequence)
    }

    fn insert(
        &mut self,
        member: MemberAddress,
        report: ReportData,
        sequence: u64,
    ) -> OracleResult<SubmitOutcome> {
        if self.reports.contains_key(&member) {
            return Err(OracleError::AlreadyReported {
                member,
                frame_id: self.frame_id,
            });
        }

        self.reports.insert(
            member,
            MemberReport {
                member,
                report,
                sequence,
            },
        );
        self.next_sequence = self.next_sequence.max(sequence.saturating_add(1));

        let idx = match self.variant_index.get(&report) {
            Some(&idx) => idx,
            None => {
                self.variants.push(VariantEntry {
                    report,
                    support: 0,
                    reached_at: sequence,
                });
                let idx = self.variants.len() - 1;
                self.variant_index.insert(report, idx);
                idx
            }
        };

        let entry = &mut self.variants[idx];
        entry.support += 1;
        entry.reached_at = sequence;
        let support = entry.support;

        // A tie leaves the incumbent in place: it reached this support earlier
        let overtakes = match self.best {
            Some(best) => best != idx && self.variants[best].support < support,
            None => true,
        };
        if overtakes {
            self.best = Some(idx);
        }

        let best = self
            .best()
            .unwrap_or(VariantSupport { report, support });
        Ok(SubmitOutcome { support, best })
    }

    /// Drop a member's report and its contribution to variant support
    pub fn evict(&mut self, member: &MemberAddress) -> Option<MemberReport> {
        let removed = self.reports.remove(member)?;

        if let Some(&idx) = self.variant_index.get(&removed.report) {
            let entry = &mut self.variants[idx];
            entry.support = entry.support.saturating_sub(1);

            if entry.support == 0 {
                self.variants.remove(idx);
                self.variant_index = self
                    .variants
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (v.report, i))
                    .collect();
            } else {
                let report = entry.report;
                let reached_at = self
                    .reports
                    .values()
                    .filter(|r| r.report == report)
                    .map(|r| r.sequence)
                    .max()
                    .unwrap_or(0);
                self.variants[idx].reached_at = reached_at;
            }
        }

        self.recompute_best();
        Some(removed)
    }

    fn recompute_best(&mut self) {
        self.best = self
            .variants
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                a.support
                    .cmp(&b.support)
                    .then_with(|| b.reached_at.cmp(&a.reached_at))
            })
            .map(|(idx, _)| idx);
    }

    /// Highest-support variant, earliest-reached on ties
    pub fn best(&self) -> Option<VariantSupport> {
        self.best.map(|idx| {
            let entry = &self.variants[idx];
            VariantSupport {
                report: entry.report,
                support: entry.support,
            }
        })
    }

    pub fn support_for(&self, report: &ReportData) -> u32 {
        self.variant_index
            .get(report)
            .map(|&idx| self.variants[idx].support)
            .unwrap_or(0)
    }

    /// Variants with their support, in first-seen order
    pub fn variants(&self) -> Vec<VariantSupport> {
        self.variants
            .iter()
            .map(|v| VariantSupport {
                report: v.report,
                support: v.support,
            })
            .collect()
    }

    pub fn has_reported(&self, member: &MemberAddress) -> bool {
        self.reports.contains_key(member)
    }

    pub fn report_of(&self, member: &MemberAddress) -> Option<&ReportData> {
        self.reports.get(member).map(|r| &r.report)
    }

    /// Accepted reports in submission order
    pub fn reports(&self) -> Vec<MemberReport> {
        let mut reports: Vec<MemberReport> = self.reports.values().copied().collect();
        reports.sort_by_key(|r| r.sequence);
        reports
    }

    /// Members that reported, in submission order
    pub fn reporters(&self) -> Vec<MemberAddress> {
        self.reports().into_iter().map(|r| r.member).collect()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}
