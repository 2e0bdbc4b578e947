//! DigestDispatcher - 日次ダイジェストの集計と送信
//!
//! One run:
//! 1. target day = start of today (local) minus one day
//! 2. candidate projects = projects with at least one event that day
//! 3. recipients = users subscribed to a candidate project and not opted out
//! 4. per user, per subscribed project: access-filtered lookup, four buckets,
//!    empty projects dropped; one email when anything is left
//! 5. schedule tomorrow's run, mark this run successful
//!
//! A mail failure only affects its recipient. Any other error aborts the run
//! before step 5, so nothing gets rescheduled.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use crate::config::DigestSettings;
use crate::domain::calendar::{first_run_at, format_day, next_run_at, target_day};
use crate::domain::{
    Artifact, DigestBucket, DigestBundle, DigestError, JobError, MailError, Outcome, ProjectDigest,
    RunId, User,
};
use crate::impls::{DIGEST_TEMPLATE, html_to_text};
use crate::observability::DigestRunReport;
use crate::ports::{
    Clock, EventStore, JobScheduler, Mailer, OutgoingEmail, PermissionService, ProjectStore,
    ScheduleOptions, TemplateRenderer, UserStore,
};
use crate::typed::{Handler, SendDigest, Task};

/// Collaborators of the dispatcher, all injected.
#[derive(Clone)]
pub struct DigestDeps {
    pub events: Arc<dyn EventStore>,
    pub projects: Arc<dyn ProjectStore>,
    pub permissions: Arc<dyn PermissionService>,
    pub users: Arc<dyn UserStore>,
    pub mailer: Arc<dyn Mailer>,
    pub renderer: Arc<dyn TemplateRenderer>,
    pub scheduler: Arc<dyn JobScheduler>,
    pub clock: Arc<dyn Clock>,
}

/// Template context of the digest email.
#[derive(Serialize)]
struct DigestEmailContext<'a> {
    user: &'a User,
    digests: &'a DigestBundle,
    date: &'a str,
    #[serde(rename = "emailSettingsUrl")]
    email_settings_url: &'a str,
}

pub struct DigestDispatcher {
    deps: DigestDeps,
    settings: DigestSettings,
}

/// What happened to one matched user.
enum Delivery {
    Sent,
    Failed,
    Skipped,
}

impl DigestDispatcher {
    pub fn new(deps: DigestDeps, settings: DigestSettings) -> Self {
        Self { deps, settings }
    }

    pub fn settings(&self) -> &DigestSettings {
        &self.settings
    }

    /// Runs the daily digest for `run_id`, then reschedules the job.
    #[instrument(skip(self), fields(run_id = %run_id))]
    pub async fn run_daily_digest(&self, run_id: RunId) -> Result<DigestRunReport, DigestError> {
        let now = self.deps.clock.now();
        let day = target_day(now, self.settings.timezone);
        let date = format_day(day);

        let candidates = self.deps.events.project_ids_on(day).await?;
        let users = self.deps.users.find_digest_recipients(&candidates).await?;
        info!(
            %day,
            candidate_projects = candidates.len(),
            recipients = users.len(),
            "starting daily digest"
        );

        let mut report = DigestRunReport {
            day,
            candidate_projects: candidates.len(),
            recipients_matched: users.len(),
            users_skipped: 0,
            emails_sent: 0,
            emails_failed: 0,
            next_run_at: next_run_at(now, self.settings.timezone, self.settings.send_hour),
        };

        for user in &users {
            match self.deliver(user, day, &date).await? {
                Delivery::Sent => report.emails_sent += 1,
                Delivery::Failed => report.emails_failed += 1,
                Delivery::Skipped => report.users_skipped += 1,
            }
        }

        self.deps
            .scheduler
            .schedule(SendDigest::TYPE, ScheduleOptions::at(report.next_run_at))
            .await?;
        self.deps.scheduler.mark_success(run_id).await?;

        info!(
            %day,
            sent = report.emails_sent,
            failed = report.emails_failed,
            skipped = report.users_skipped,
            next_run_at = %report.next_run_at,
            "daily digest done"
        );
        Ok(report)
    }

    /// Builds the bundle of `user` for `day`. Projects the user cannot see and
    /// projects without activity are left out.
    pub async fn build_bundle(&self, user: &User, day: NaiveDate) -> Result<DigestBundle, DigestError> {
        let mut bundle = DigestBundle::new();
        if user.subscriptions().is_empty() {
            return Ok(bundle);
        }

        let is_admin = self.deps.permissions.is_admin(&user.id).await?;
        let member = if is_admin { None } else { Some(&user.id) };

        for project_id in user.subscriptions() {
            let Some(project) = self.deps.projects.find_project(project_id, member).await? else {
                debug!(user_id = %user.id, project_id = %project_id, "project not visible, skipped");
                continue;
            };

            let mut digest = ProjectDigest::new(project);
            for bucket in DigestBucket::ALL {
                let events = self
                    .deps
                    .events
                    .events_for(project_id, day, bucket.event_types())
                    .await?;
                *digest.bucket_mut(bucket) = events;
            }

            if !bundle.push(digest) {
                debug!(user_id = %user.id, project_id = %project_id, "no activity, skipped");
            }
        }
        Ok(bundle)
    }

    async fn deliver(&self, user: &User, day: NaiveDate, date: &str) -> Result<Delivery, DigestError> {
        if user.profile.is_none() {
            return Ok(Delivery::Skipped);
        }

        let bundle = self.build_bundle(user, day).await?;
        if bundle.is_empty() {
            debug!(user_id = %user.id, "empty bundle, no email");
            return Ok(Delivery::Skipped);
        }

        let email = self.render_email(user, &bundle, date)?;
        match self.send(user, email).await {
            Ok(()) => {
                debug!(user_id = %user.id, projects = bundle.len(), "digest sent");
                Ok(Delivery::Sent)
            }
            Err(err) => {
                error!(user_id = %user.id, error = %err, "failed to send digest email");
                Ok(Delivery::Failed)
            }
        }
    }

    fn render_email(
        &self,
        user: &User,
        bundle: &DigestBundle,
        date: &str,
    ) -> Result<PendingEmail, DigestError> {
        let settings_url = self.settings.email_settings_url();
        let context = serde_json::to_value(DigestEmailContext {
            user,
            digests: bundle,
            date,
            email_settings_url: &settings_url,
        })
        .map_err(crate::domain::RenderError::from)?;

        let html = self.deps.renderer.render(DIGEST_TEMPLATE, &context)?;
        let text = html_to_text(&html)?;
        Ok(PendingEmail {
            subject: format!("Rapport du {date}"),
            text,
            html,
        })
    }

    async fn send(&self, user: &User, email: PendingEmail) -> Result<(), MailError> {
        let to = user.primary_email().ok_or(MailError::NoRecipient)?;
        self.deps
            .mailer
            .send(OutgoingEmail {
                to: to.to_string(),
                subject: email.subject,
                text: email.text,
                html: email.html,
            })
            .await
    }
}

/// Rendered email, recipient not yet resolved.
struct PendingEmail {
    subject: String,
    text: String,
    html: String,
}

#[async_trait]
impl Handler<SendDigest> for DigestDispatcher {
    async fn handle(&self, task: SendDigest) -> Result<Outcome, JobError> {
        let report = self.run_daily_digest(task.run_id).await?;
        let report = serde_json::to_value(&report).map_err(|e| JobError::Payload(e.to_string()))?;
        Ok(Outcome::success().with_artifact(Artifact::Json(report)))
    }
}

/// Registers the first run of the digest job: today at the send hour, singular,
/// so restarting the process never queues a second pending run.
pub async fn schedule_first_run(
    scheduler: &dyn JobScheduler,
    clock: &dyn Clock,
    settings: &DigestSettings,
) -> Result<Option<RunId>, DigestError> {
    let date = first_run_at(clock.now(), settings.timezone, settings.send_hour);
    let run = scheduler
        .schedule(SendDigest::TYPE, ScheduleOptions::at(date).singular())
        .await?;
    match run {
        Some(id) => info!(run_id = %id, run_at = %date, "daily digest registered"),
        None => debug!("daily digest already pending"),
    }
    Ok(run)
}
