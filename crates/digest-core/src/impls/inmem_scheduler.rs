//! InMemoryScheduler - 開発用のスケジューラ
//!
//! Keeps scheduled runs (the ledger) behind one `tokio::sync::Mutex`. Pending
//! and running runs are always kept; finished runs are capped, oldest dropped first.
//! No lock is held across an `.await` on anything but the mutex itself.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::{RunId, SchedulerError};
use crate::ports::{
    IdGenerator, JobScheduler, RunState, ScheduleOptions, ScheduledRun, SystemClock, UlidGenerator,
};

/// Finished runs kept in the ledger by default.
pub const DEFAULT_FINISHED_RETENTION: usize = 32;

pub struct InMemoryScheduler {
    runs: Mutex<Vec<ScheduledRun>>,
    ids: Box<dyn IdGenerator>,
    keep_finished: usize,
}

impl InMemoryScheduler {
    pub fn new() -> Self {
        Self::with_id_generator(Box::new(UlidGenerator::new(SystemClock)))
    }

    pub fn with_id_generator(ids: Box<dyn IdGenerator>) -> Self {
        Self {
            runs: Mutex::new(Vec::new()),
            ids,
            keep_finished: DEFAULT_FINISHED_RETENTION,
        }
    }

    /// Keeps at most `keep` succeeded or failed runs, dropping the oldest first.
    pub fn with_retention(mut self, keep: usize) -> Self {
        self.keep_finished = keep;
        self
    }

    /// Snapshot of the ledger, in scheduling order.
    pub async fn runs(&self) -> Vec<ScheduledRun> {
        self.runs.lock().await.clone()
    }

    pub async fn pending(&self, job: &str) -> Vec<ScheduledRun> {
        self.runs
            .lock()
            .await
            .iter()
            .filter(|r| r.job == job && r.state == RunState::Pending)
            .cloned()
            .collect()
    }

    async fn transition(
        &self,
        run: RunId,
        state: RunState,
        error: Option<String>,
    ) -> Result<(), SchedulerError> {
        let mut runs = self.runs.lock().await;
        let record = runs
            .iter_mut()
            .find(|r| r.id == run)
            .ok_or(SchedulerError::RunNotFound(run))?;
        record.state = state;
        record.last_error = error;
        prune_finished(&mut runs, self.keep_finished);
        Ok(())
    }
}

impl Default for InMemoryScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobScheduler for InMemoryScheduler {
    async fn schedule(
        &self,
        job: &str,
        options: ScheduleOptions,
    ) -> Result<Option<RunId>, SchedulerError> {
        let mut runs = self.runs.lock().await;
        if options.singular
            && runs
                .iter()
                .any(|r| r.job == job && r.state == RunState::Pending)
        {
            debug!(job, "singular run already pending, not scheduling");
            return Ok(None);
        }

        let id = self.ids.generate_run_id();
        runs.push(ScheduledRun {
            id,
            job: job.to_string(),
            run_at: options.date,
            state: RunState::Pending,
            last_error: None,
        });
        debug!(job, run_id = %id, run_at = %options.date, "run scheduled");
        Ok(Some(id))
    }

    async fn mark_success(&self, run: RunId) -> Result<(), SchedulerError> {
        self.transition(run, RunState::Succeeded, None).await
    }

    async fn mark_failure(&self, run: RunId, reason: String) -> Result<(), SchedulerError> {
        self.transition(run, RunState::Failed, Some(reason)).await
    }

    async fn claim_due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledRun>, SchedulerError> {
        let mut runs = self.runs.lock().await;
        let mut due: Vec<&mut ScheduledRun> = runs
            .iter_mut()
            .filter(|r| r.state == RunState::Pending && r.run_at <= now)
            .collect();
        due.sort_by_key(|r| r.run_at);

        Ok(due
            .into_iter()
            .map(|r| {
                r.state = RunState::Running;
                r.clone()
            })
            .collect())
    }
}

fn is_finished(run: &ScheduledRun) -> bool {
    matches!(run.state, RunState::Succeeded | RunState::Failed)
}

/// Drops the oldest finished runs until at most `keep` remain.
fn prune_finished(runs: &mut Vec<ScheduledRun>, keep: usize) {
    let finished = runs.iter().filter(|r| is_finished(r)).count();
    let mut excess = finished.saturating_sub(keep);
    if excess == 0 {
        return;
    }
    runs.retain(|r| {
        if excess > 0 && is_finished(r) {
            excess -= 1;
            false
        } else {
            true
        }
    });
    debug!(kept = keep, "pruned finished runs");
}
