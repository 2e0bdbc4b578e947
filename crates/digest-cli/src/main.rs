//! digest-cli - 日次ダイジェストの実行
//!
//! `run-once` dispatches one digest immediately; `serve` registers the daily job
//! and drives the scheduler until Ctrl-C. Stores are loaded from a JSON fixture.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use digest_core::app::{AppBuilder, DigestDeps, DigestDispatcher, schedule_first_run};
use digest_core::config::DigestConfig;
use digest_core::impls::{Fixtures, HandlebarsRenderer, InMemoryScheduler, LogMailer, SmtpMailer};
use digest_core::ports::{
    Clock, FixedClock, JobScheduler, Mailer, ScheduleOptions, SystemClock, TemplateRenderer,
};
use digest_core::typed::{SendDigest, Task};

#[derive(Parser)]
#[command(name = "digest-cli")]
#[command(about = "Daily task digest emails")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send yesterday's digests now
    RunOnce {
        /// JSON snapshot with projects, users, admins and events
        #[arg(long)]
        fixtures: PathBuf,

        /// Log emails instead of sending them
        #[arg(long)]
        dry_run: bool,

        /// Pretend the current time is this RFC 3339 instant
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },

    /// Register the daily job and run the scheduler until Ctrl-C
    Serve {
        #[arg(long)]
        fixtures: PathBuf,

        #[arg(long)]
        dry_run: bool,

        /// Seconds between two scheduler polls
        #[arg(long, default_value_t = 30)]
        poll_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = DigestConfig::from_env().context("invalid configuration")?;

    match cli.command {
        Commands::RunOnce {
            fixtures,
            dry_run,
            now,
        } => {
            let clock: Arc<dyn Clock> = match now {
                Some(now) => Arc::new(FixedClock::new(now)),
                None => Arc::new(SystemClock),
            };
            let scheduler = Arc::new(InMemoryScheduler::new());
            let dispatcher = dispatcher(&config, &fixtures, dry_run, scheduler.clone(), clock.clone())?;

            let run = scheduler
                .schedule(SendDigest::TYPE, ScheduleOptions::at(clock.now()))
                .await?
                .context("scheduler refused the run")?;
            let report = dispatcher.run_daily_digest(run).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Serve {
            fixtures,
            dry_run,
            poll_secs,
        } => {
            let clock: Arc<dyn Clock> = Arc::new(SystemClock);
            let scheduler = Arc::new(InMemoryScheduler::new());
            let dispatcher = dispatcher(&config, &fixtures, dry_run, scheduler.clone(), clock.clone())?;

            schedule_first_run(scheduler.as_ref(), clock.as_ref(), &config.digest).await?;

            let app = AppBuilder::new()
                .register::<SendDigest, _>(Arc::new(dispatcher))?
                .expect_tasks(&[SendDigest::TYPE])
                .build()?;
            let runtime = app.runtime(scheduler, clock);

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Ctrl-C received, shutting down");
                }
                let _ = shutdown_tx.send(true);
            });

            info!(poll_secs, "serving daily digests");
            runtime
                .run_until(shutdown_rx, Duration::from_secs(poll_secs.max(1)))
                .await;
        }
    }
    Ok(())
}

fn dispatcher(
    config: &DigestConfig,
    fixtures: &Path,
    dry_run: bool,
    scheduler: Arc<dyn JobScheduler>,
    clock: Arc<dyn Clock>,
) -> Result<DigestDispatcher> {
    let data = Fixtures::load(fixtures).context("failed to load fixtures")?;

    let mailer: Arc<dyn Mailer> = if dry_run {
        Arc::new(LogMailer)
    } else {
        let smtp = config
            .smtp
            .as_ref()
            .context("SMTP_HOST is not set; use --dry-run or configure SMTP")?;
        Arc::new(SmtpMailer::new(smtp).context("failed to set up SMTP transport")?)
    };

    let renderer: Arc<dyn TemplateRenderer> = match &config.template_path {
        Some(path) => Arc::new(
            HandlebarsRenderer::from_template_file(path)
                .with_context(|| format!("failed to load template {}", path.display()))?,
        ),
        None => Arc::new(HandlebarsRenderer::new().context("failed to compile digest template")?),
    };

    let deps = DigestDeps {
        events: Arc::new(data.event_store()),
        projects: Arc::new(data.project_store()),
        permissions: Arc::new(data.permissions()),
        users: Arc::new(data.user_store()),
        mailer,
        renderer,
        scheduler,
        clock,
    };
    Ok(DigestDispatcher::new(deps, config.digest.clone()))
}
