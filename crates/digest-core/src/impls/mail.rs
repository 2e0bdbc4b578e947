//! Mailer implementations without a network: recording (tests, dry runs) and logging.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::info;

use crate::domain::MailError;
use crate::ports::{Mailer, OutgoingEmail};

/// Keeps every accepted email in memory. Addresses passed to `fail_for` are
/// rejected with a transport error.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, address: impl Into<String>) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(address.into());
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn sent_to(&self, address: &str) -> Vec<OutgoingEmail> {
        self.sent()
            .into_iter()
            .filter(|e| e.to == address)
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        let failing = self
            .failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&email.to);
        if failing {
            return Err(MailError::Transport(format!("rejected recipient {}", email.to)));
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(email);
        Ok(())
    }
}

/// Logs emails instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        info!(
            to = %email.to,
            subject = %email.subject,
            html_bytes = email.html.len(),
            "dry run, email not sent"
        );
        tracing::debug!(to = %email.to, "{}", email.text);
        Ok(())
    }
}
