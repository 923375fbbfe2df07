//! Incoming report submissions

use crate::domain::{MemberAddress, ReportData, Timestamp};
use serde::{Deserialize, Serialize};

/// A member's report as it arrives at the oracle
///
/// `now` is the submission time the frame clock evaluates the report against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSubmission {
    pub member: MemberAddress,
    pub report: ReportData,
    pub now: Timestamp,
}

impl ReportSubmission {
    pub fn new(member: MemberAddress, report: ReportData, now: Timestamp) -> Self {
        Self {
            member,
            report,
            now,
        }
    }
}
