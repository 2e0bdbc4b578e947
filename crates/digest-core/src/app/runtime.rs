//! Runtime - 期限が来た run を Handler に渡すループ
//!
//! A handler that succeeds owns the bookkeeping of its run (the digest job
//! marks itself successful after rescheduling). A handler that errors or
//! returns a failure outcome, and a run with no handler, are marked failed here.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::domain::{JobError, Outcome, SchedulerError};
use crate::ports::{Clock, JobScheduler, ScheduledRun};
use crate::typed::{RunPayload, TypedRegistry};

pub struct Runtime {
    registry: Arc<TypedRegistry>,
    scheduler: Arc<dyn JobScheduler>,
    clock: Arc<dyn Clock>,
}

/// Counters of one `tick`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub claimed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl Runtime {
    pub fn new(
        registry: Arc<TypedRegistry>,
        scheduler: Arc<dyn JobScheduler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            scheduler,
            clock,
        }
    }

    pub fn registry(&self) -> &TypedRegistry {
        &self.registry
    }

    /// Claims every due run and executes them one after the other.
    ///
    /// A run is failed when its handler errors, is missing, or reports a
    /// failure outcome. Failing to record that does not stop the remaining runs.
    pub async fn tick(&self) -> Result<TickSummary, SchedulerError> {
        let due = self.scheduler.claim_due(self.clock.now()).await?;
        let mut summary = TickSummary {
            claimed: due.len(),
            ..TickSummary::default()
        };

        for run in due {
            let reason = match self.execute(&run).await {
                Ok(outcome) if outcome.is_success() => {
                    summary.succeeded += 1;
                    continue;
                }
                Ok(outcome) => outcome
                    .reason
                    .unwrap_or_else(|| "handler reported failure".to_string()),
                Err(err) => err.to_string(),
            };

            summary.failed += 1;
            error!(run_id = %run.id, job = %run.job, reason = %reason, "job run failed");
            if let Err(err) = self.scheduler.mark_failure(run.id, reason).await {
                error!(run_id = %run.id, error = %err, "could not record run failure");
            }
        }
        Ok(summary)
    }

    async fn execute(&self, run: &ScheduledRun) -> Result<Outcome, JobError> {
        let handler = self
            .registry
            .get(&run.job)
            .ok_or_else(|| JobError::HandlerNotFound(run.job.clone()))?;

        let payload = serde_json::to_value(RunPayload { run_id: run.id })
            .map_err(|e| JobError::Payload(e.to_string()))?;

        debug!(run_id = %run.id, job = %run.job, "executing job run");
        handler.handle_dyn(payload).await
    }

    /// Polls for due runs every `poll_interval` until `shutdown` flips to `true`.
    /// A run in flight is finished before returning.
    pub async fn run_until(&self, mut shutdown: watch::Receiver<bool>, poll_interval: Duration) {
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    // sender dropped: nobody can stop us anymore, treat as shutdown
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                _ = interval.tick() => {}
            }

            match self.tick().await {
                Ok(summary) if summary.claimed > 0 => {
                    info!(
                        claimed = summary.claimed,
                        succeeded = summary.succeeded,
                        failed = summary.failed,
                        "scheduler tick"
                    );
                }
                Ok(_) => {}
                Err(err) => error!(error = %err, "scheduler unavailable"),
            }
        }
        info!("runtime stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RunId;
    use crate::impls::InMemoryScheduler;
    use crate::ports::{FixedClock, RunState, ScheduleOptions};
    use crate::typed::Handler;
    use crate::typed::handler::test_support::{PingHandler, PingTask};
    use crate::typed::Task;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    struct FailingPing;

    #[async_trait]
    impl Handler<PingTask> for FailingPing {
        async fn handle(&self, _task: PingTask) -> Result<Outcome, JobError> {
            Err(JobError::Payload("boom".into()))
        }
    }

    struct RejectingPing;

    #[async_trait]
    impl Handler<PingTask> for RejectingPing {
        async fn handle(&self, _task: PingTask) -> Result<Outcome, JobError> {
            Ok(Outcome::failure("quota exceeded"))
        }
    }

    /// Delegates to an in-memory scheduler but cannot record failures.
    struct ReadOnlyFailures(InMemoryScheduler);

    #[async_trait]
    impl JobScheduler for ReadOnlyFailures {
        async fn schedule(
            &self,
            job: &str,
            options: ScheduleOptions,
        ) -> Result<Option<RunId>, SchedulerError> {
            self.0.schedule(job, options).await
        }

        async fn mark_success(&self, run: RunId) -> Result<(), SchedulerError> {
            self.0.mark_success(run).await
        }

        async fn mark_failure(&self, _run: RunId, _reason: String) -> Result<(), SchedulerError> {
            Err(SchedulerError::Unavailable("write refused".into()))
        }

        async fn claim_due(
            &self,
            now: chrono::DateTime<Utc>,
        ) -> Result<Vec<ScheduledRun>, SchedulerError> {
            self.0.claim_due(now).await
        }
    }

    fn clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 10, 6, 0, 0).unwrap()))
    }

    fn runtime(registry: TypedRegistry, scheduler: Arc<InMemoryScheduler>, clock: Arc<FixedClock>) -> Runtime {
        Runtime::new(Arc::new(registry), scheduler, clock)
    }

    async fn schedule_now(scheduler: &InMemoryScheduler, job: &str) -> RunId {
        scheduler
            .schedule(job, ScheduleOptions::at(Utc.with_ymd_and_hms(2024, 3, 10, 5, 0, 0).unwrap()))
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn tick_hands_due_runs_to_their_handler() {
        let handler = Arc::new(PingHandler::default());
        let mut registry = TypedRegistry::new();
        registry.register::<PingTask, _>(Arc::clone(&handler)).unwrap();
        let scheduler = Arc::new(InMemoryScheduler::new());
        let run = schedule_now(&scheduler, PingTask::TYPE).await;

        let rt = runtime(registry, Arc::clone(&scheduler), clock());
        let summary = rt.tick().await.unwrap();

        assert_eq!(summary, TickSummary { claimed: 1, succeeded: 1, failed: 0 });
        assert_eq!(*handler.seen.lock().unwrap(), vec![run]);

        // claimed runs are not handed out twice
        assert_eq!(rt.tick().await.unwrap().claimed, 0);
    }

    #[tokio::test]
    async fn failing_handler_marks_run_failed() {
        let mut registry = TypedRegistry::new();
        registry.register::<PingTask, _>(FailingPing).unwrap();
        let scheduler = Arc::new(InMemoryScheduler::new());
        let run = schedule_now(&scheduler, PingTask::TYPE).await;

        let summary = runtime(registry, Arc::clone(&scheduler), clock()).tick().await.unwrap();
        assert_eq!(summary.failed, 1);

        let record = scheduler.runs().await.into_iter().find(|r| r.id == run).unwrap();
        assert_eq!(record.state, RunState::Failed);
        assert!(record.last_error.unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn failure_outcome_marks_run_failed() {
        let mut registry = TypedRegistry::new();
        registry.register::<PingTask, _>(RejectingPing).unwrap();
        let scheduler = Arc::new(InMemoryScheduler::new());
        let run = schedule_now(&scheduler, PingTask::TYPE).await;

        let summary = runtime(registry, Arc::clone(&scheduler), clock()).tick().await.unwrap();
        assert_eq!(summary, TickSummary { claimed: 1, succeeded: 0, failed: 1 });

        let record = scheduler.runs().await.into_iter().find(|r| r.id == run).unwrap();
        assert_eq!(record.state, RunState::Failed);
        assert_eq!(record.last_error.as_deref(), Some("quota exceeded"));
    }

    #[tokio::test]
    async fn unrecorded_failure_does_not_drop_remaining_runs() {
        let handler = Arc::new(PingHandler::default());
        let mut registry = TypedRegistry::new();
        registry.register::<PingTask, _>(Arc::clone(&handler)).unwrap();
        let scheduler = ReadOnlyFailures(InMemoryScheduler::new());
        schedule_now(&scheduler.0, "unknown.job.run.v1").await;
        let ping = schedule_now(&scheduler.0, PingTask::TYPE).await;

        let rt = Runtime::new(Arc::new(registry), Arc::new(scheduler), clock());
        let summary = rt.tick().await.unwrap();

        assert_eq!(summary, TickSummary { claimed: 2, succeeded: 1, failed: 1 });
        assert_eq!(*handler.seen.lock().unwrap(), vec![ping]);
    }

    #[tokio::test]
    async fn run_without_handler_is_marked_failed() {
        let scheduler = Arc::new(InMemoryScheduler::new());
        let run = schedule_now(&scheduler, "unknown.job.run.v1").await;

        let summary = runtime(TypedRegistry::new(), Arc::clone(&scheduler), clock())
            .tick()
            .await
            .unwrap();
        assert_eq!(summary.failed, 1);

        let record = scheduler.runs().await.into_iter().find(|r| r.id == run).unwrap();
        assert_eq!(record.state, RunState::Failed);
        assert!(record.last_error.unwrap().contains("unknown.job.run.v1"));
    }

    #[tokio::test]
    async fn runs_in_the_future_are_left_alone() {
        let handler = Arc::new(PingHandler::default());
        let mut registry = TypedRegistry::new();
        registry.register::<PingTask, _>(Arc::clone(&handler)).unwrap();
        let scheduler = Arc::new(InMemoryScheduler::new());
        scheduler
            .schedule(
                PingTask::TYPE,
                ScheduleOptions::at(Utc.with_ymd_and_hms(2024, 3, 11, 6, 0, 0).unwrap()),
            )
            .await
            .unwrap();

        let summary = runtime(registry, Arc::clone(&scheduler), clock()).tick().await.unwrap();
        assert_eq!(summary.claimed, 0);
        assert!(handler.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn run_until_stops_on_shutdown() {
        let scheduler = Arc::new(InMemoryScheduler::new());
        let rt = runtime(TypedRegistry::new(), scheduler, clock());
        let (tx, rx) = watch::channel(false);

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tx.send(true).unwrap();
        });

        tokio::time::timeout(Duration::from_secs(2), rt.run_until(rx, Duration::from_millis(5)))
            .await
            .expect("runtime did not stop");
        stopper.await.unwrap();
    }
}
