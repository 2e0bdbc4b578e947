//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemory*Store / StaticPermissions / Fixtures**: snapshot stores
//! - **InMemoryScheduler**: run ledger with the singular rule
//! - **RecordingMailer / LogMailer**: mailers for tests and dry runs
//! - **SmtpMailer**: lettre over STARTTLS
//! - **HandlebarsRenderer**: digest template + `html_to_text`

pub mod handlebars_renderer;
pub mod inmem_scheduler;
pub mod mail;
pub mod memory;
pub mod smtp;

pub use self::handlebars_renderer::{DIGEST_TEMPLATE, HandlebarsRenderer, html_to_text};
pub use self::inmem_scheduler::InMemoryScheduler;
pub use self::mail::{LogMailer, RecordingMailer};
pub use self::memory::{
    Fixtures, InMemoryEventStore, InMemoryProjectStore, InMemoryUserStore, StaticPermissions,
};
pub use self::smtp::SmtpMailer;
