//! Run report: counters of one digest run, logged and attached to the outcome.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestRunReport {
    /// The day the run reported on.
    pub day: NaiveDate,
    pub candidate_projects: usize,
    pub recipients_matched: usize,
    /// Users without a profile or with nothing to report.
    pub users_skipped: usize,
    pub emails_sent: usize,
    pub emails_failed: usize,
    pub next_run_at: DateTime<Utc>,
}
