//! Outbound notification SPI for invite emails.
//!
//! # Responsibility
//! - Define the mail-send contract the invite flow depends on.
//! - Build the invitation message from venue state and directory lookups.
//!
//! # Invariants
//! - Delivery is best-effort: a failing mailer never fails the operation
//!   that triggered it; callers log and continue.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// One outbound email, fully rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    /// Inviter's contact address when known, so replies reach a person.
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

/// Mail delivery error surfaced by a `Mailer` implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailerError {
    Send(String),
}

impl Display for MailerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Send(message) => write!(f, "mail send failed: {message}"),
        }
    }
}

impl Error for MailerError {}

/// Delivery contract for outbound notifications.
///
/// Transport (SMTP, provider API, queue) lives behind this trait and is out
/// of scope for the core; the core only decides when a message is due.
pub trait Mailer {
    fn send(&self, message: &EmailMessage) -> Result<(), MailerError>;
}

/// Mailer that drops every message. Useful where notifications are not
/// wired up (smoke binaries, most tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMailer;

impl Mailer for NullMailer {
    fn send(&self, _message: &EmailMessage) -> Result<(), MailerError> {
        Ok(())
    }
}

/// Mailer that records sends to the diagnostic log instead of delivering.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        log::info!(
            "event=invite_email module=notify status=ok to={} subject={}",
            message.to,
            message.subject
        );
        Ok(())
    }
}

/// Sender identity and link target used when rendering invite emails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteEmailConfig {
    /// Address invite mail is sent from.
    pub sender: String,
    /// Absolute URL included in the invitation body.
    pub base_url: String,
}

impl Default for InviteEmailConfig {
    fn default() -> Self {
        Self {
            sender: "noreply@venuebook.local".to_string(),
            base_url: "https://venuebook.local/".to_string(),
        }
    }
}

/// Renders the invitation email for one venue.
pub fn invite_email(
    config: &InviteEmailConfig,
    venue_title: &str,
    to: impl Into<String>,
    reply_to: Option<String>,
) -> EmailMessage {
    EmailMessage {
        from: config.sender.clone(),
        to: to.into(),
        reply_to,
        subject: format!("Venue: {venue_title}"),
        body: format!(
            "Hey, I just invited you to '{venue_title}' on Venuebook.\n\nCome check it out: {}\n",
            config.base_url
        ),
    }
}
