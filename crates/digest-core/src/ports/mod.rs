//! Ports - 抽象化レイヤー
//!
//! Each trait is the seam to an external collaborator of the digest job
//! (application database, permission checks, mail transport, templating,
//! job scheduling). Implementations live in `impls`.

pub mod clock;
pub mod id_generator;
pub mod mailer;
pub mod renderer;
pub mod scheduler;
pub mod stores;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::mailer::{Mailer, OutgoingEmail};
pub use self::renderer::TemplateRenderer;
pub use self::scheduler::{JobScheduler, RunState, ScheduleOptions, ScheduledRun};
pub use self::stores::{EventStore, PermissionService, ProjectStore, UserStore};
