//! Errors and their operational split.
//!
//! Mail failures are per-recipient and never abort a run. Everything else that
//! reaches `DigestError` aborts the run before it reschedules itself.

use thiserror::Error;

use super::ids::RunId;

/// Failure of a read-side store (events, projects, users, permissions).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("run not found: {0}")]
    RunNotFound(RunId),

    #[error("scheduler unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("recipient has no email address")]
    NoRecipient,

    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("message build failed: {0}")]
    Build(String),

    #[error("transport failed: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("template {name} failed to render: {reason}")]
    Template { name: String, reason: String },

    #[error("template context: {0}")]
    Context(#[from] serde_json::Error),

    #[error("html to text conversion failed: {0}")]
    Text(String),
}

/// Errors that abort a digest run.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Errors at the job handler boundary.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("handler not found for job={0}")]
    HandlerNotFound(String),

    #[error("payload: {0}")]
    Payload(String),

    #[error(transparent)]
    Digest(#[from] DigestError),
}
