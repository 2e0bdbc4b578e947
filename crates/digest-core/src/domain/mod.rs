//! Domain model: ids, digest events, projects, users, bundles, calendar math, errors.

pub mod bundle;
pub mod calendar;
pub mod errors;
pub mod event;
pub mod ids;
pub mod outcome;
pub mod project;
pub mod user;

pub use bundle::{DigestBundle, ProjectDigest};
pub use errors::{DigestError, JobError, MailError, RenderError, SchedulerError, StoreError};
pub use event::{DigestBucket, DigestEvent, DigestEventType};
pub use ids::{DigestEventId, ProjectId, RunId, UserId};
pub use outcome::{Artifact, Outcome, OutcomeKind};
pub use project::Project;
pub use user::{DigestEmailSettings, EmailAddress, EmailSettings, Profile, User};
