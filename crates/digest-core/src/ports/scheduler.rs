//! JobScheduler port - the scheduling ledger of named jobs.
//!
//! A run is one planned execution of a job. The runtime claims due runs, the
//! job handler decides when the next one happens and marks its own run done.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{RunId, SchedulerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleOptions {
    pub date: DateTime<Utc>,
    /// Do not enqueue when a pending run of the same job already exists.
    pub singular: bool,
}

impl ScheduleOptions {
    pub fn at(date: DateTime<Utc>) -> Self {
        Self {
            date,
            singular: false,
        }
    }

    pub fn singular(mut self) -> Self {
        self.singular = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledRun {
    pub id: RunId,
    pub job: String,
    pub run_at: DateTime<Utc>,
    pub state: RunState,
    pub last_error: Option<String>,
}

#[async_trait]
pub trait JobScheduler: Send + Sync {
    /// Enqueues a future run of `job`. Returns `None` when suppressed by `singular`.
    async fn schedule(
        &self,
        job: &str,
        options: ScheduleOptions,
    ) -> Result<Option<RunId>, SchedulerError>;

    async fn mark_success(&self, run: RunId) -> Result<(), SchedulerError>;

    async fn mark_failure(&self, run: RunId, reason: String) -> Result<(), SchedulerError>;

    /// Moves every pending run with `run_at <= now` to running, earliest first.
    async fn claim_due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledRun>, SchedulerError>;
}
