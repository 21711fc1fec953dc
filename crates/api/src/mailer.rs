//! Outbound mail collaborator.
//!
//! Delivery is best-effort: a welcome email that fails to send is logged and
//! never fails the user-creation request that triggered it.

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("mail delivery failed: {0}")]
pub struct MailError(pub String);

/// Credentials email sent to a freshly created user. The temporary password
/// equals the email; the body tells the user to change it on first login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeEmail {
    pub to: String,
    pub usuario: String,
    pub password: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_welcome(&self, mail: &WelcomeEmail) -> Result<(), MailError>;
}

/// Logs the send instead of delivering. Used when no SMTP relay is wired up.
#[derive(Default)]
pub struct LoggingMailer;

#[async_trait]
impl Mailer for LoggingMailer {
    async fn send_welcome(&self, mail: &WelcomeEmail) -> Result<(), MailError> {
        tracing::info!(target: "mail", to = %mail.to, "welcome email (logged, not delivered)");
        Ok(())
    }
}

/// Records sent mails so tests can assert on them.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<WelcomeEmail>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<WelcomeEmail> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_welcome(&self, mail: &WelcomeEmail) -> Result<(), MailError> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(mail.clone());
        Ok(())
    }
}
