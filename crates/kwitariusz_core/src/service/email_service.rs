//! Outgoing email: invoices and reminders sent to parents.
//!
//! # Responsibility
//! - Model sender credentials as injected configuration.
//! - Hide the mail transport behind `MailTransport` so callers and tests do
//!   not depend on a live SMTP server.
//! - Turn every failure into an `EmailOutcome` instead of an error.
//!
//! # Invariants
//! - The password never appears in `Debug` output or log lines.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::time::Duration;

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
const SMTP_TIMEOUT: Duration = Duration::from_secs(30);
const TEST_EMAIL_SUBJECT: &str = "Kwitariusz: test email";
const TEST_EMAIL_HTML: &str = "<p>Email configuration works.</p>";

/// Sender account used for outgoing mail (STARTTLS submission).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailConfig {
    pub sender: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
}

fn default_smtp_host() -> String {
    DEFAULT_SMTP_HOST.to_string()
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            sender: String::new(),
            password: String::new(),
            smtp_host: default_smtp_host(),
            smtp_port: DEFAULT_SMTP_PORT,
        }
    }
}

impl Debug for EmailConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("sender", &self.sender)
            .field("password", &"<redacted>")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .finish()
    }
}

impl EmailConfig {
    pub fn new(sender: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn has_password(&self) -> bool {
        !self.password.is_empty()
    }

    /// Checks that the config is complete enough to attempt a send.
    pub fn validate(&self) -> Result<(), MailError> {
        if self.sender.trim().is_empty() {
            return Err(MailError::InvalidConfig("sender is required".to_string()));
        }
        if self.password.is_empty() {
            return Err(MailError::InvalidConfig("password is required".to_string()));
        }
        if self.smtp_host.trim().is_empty() {
            return Err(MailError::InvalidConfig("smtp host is required".to_string()));
        }
        if self.smtp_port == 0 {
            return Err(MailError::InvalidConfig("smtp port must be non-zero".to_string()));
        }
        parse_mailbox("sender", &self.sender)?;
        Ok(())
    }
}

/// One HTML message. `to` may hold several comma-separated addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl OutgoingEmail {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            html: html.into(),
        }
    }

    /// Recipient addresses, trimmed, blanks dropped.
    pub fn recipients(&self) -> Vec<&str> {
        self.to
            .split(',')
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailError {
    InvalidConfig(String),
    InvalidAddress { field: &'static str, value: String },
    NoRecipients,
    Build(String),
    Transport(String),
}

impl Display for MailError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfig(message) => write!(f, "invalid email configuration: {message}"),
            Self::InvalidAddress { field, value } => {
                write!(f, "invalid email address in `{field}`: `{value}`")
            }
            Self::NoRecipients => write!(f, "no recipients given"),
            Self::Build(message) => write!(f, "failed to build email: {message}"),
            Self::Transport(message) => write!(f, "failed to send email: {message}"),
        }
    }
}

impl Error for MailError {}

impl MailError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "invalid_config",
            Self::InvalidAddress { .. } => "invalid_address",
            Self::NoRecipients => "no_recipients",
            Self::Build(_) => "build_failed",
            Self::Transport(_) => "transport_failed",
        }
    }
}

/// Delivery seam for the external mail collaborator.
pub trait MailTransport {
    fn send(&self, config: &EmailConfig, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// SMTP delivery over STARTTLS.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmtpMailer;

impl MailTransport for SmtpMailer {
    fn send(&self, config: &EmailConfig, email: &OutgoingEmail) -> Result<(), MailError> {
        let message = build_message(config, email)?;
        let transport = SmtpTransport::starttls_relay(config.smtp_host.trim())
            .map_err(|err| MailError::Transport(err.to_string()))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.sender.trim().to_string(),
                config.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        transport
            .send(&message)
            .map_err(|err| MailError::Transport(err.to_string()))?;
        Ok(())
    }
}

/// Builds the MIME message without touching the network.
pub fn build_message(config: &EmailConfig, email: &OutgoingEmail) -> Result<Message, MailError> {
    let recipients = email.recipients();
    if recipients.is_empty() {
        return Err(MailError::NoRecipients);
    }

    let mut builder = Message::builder()
        .from(parse_mailbox("sender", &config.sender)?)
        .subject(email.subject.as_str())
        .header(ContentType::TEXT_HTML);
    for recipient in recipients {
        builder = builder.to(parse_mailbox("to", recipient)?);
    }

    builder
        .body(email.html.clone())
        .map_err(|err| MailError::Build(err.to_string()))
}

fn parse_mailbox(field: &'static str, value: &str) -> Result<Mailbox, MailError> {
    value
        .trim()
        .parse::<Mailbox>()
        .map_err(|_| MailError::InvalidAddress {
            field,
            value: value.trim().to_string(),
        })
}

/// Result envelope reported back to the UI; never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailOutcome {
    pub success: bool,
    pub message: String,
}

impl EmailOutcome {
    fn sent(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn failed(err: &MailError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
        }
    }
}

/// Email use-cases over an injected transport.
pub struct EmailService<T: MailTransport> {
    transport: T,
}

impl<T: MailTransport> EmailService<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Sends one message with the given sender config.
    pub fn send_email(&self, config: &EmailConfig, email: &OutgoingEmail) -> EmailOutcome {
        let result = config
            .validate()
            .and_then(|()| self.transport.send(config, email));
        match result {
            Ok(()) => {
                info!(
                    "event=email_send module=service status=ok recipients={}",
                    email.recipients().len()
                );
                EmailOutcome::sent("Email sent")
            }
            Err(err) => {
                warn!(
                    "event=email_send module=service status=error error_code={}",
                    err.code()
                );
                EmailOutcome::failed(&err)
            }
        }
    }

    /// Sends a short probe message from the sender to itself.
    pub fn test_email(&self, config: &EmailConfig) -> EmailOutcome {
        let probe = OutgoingEmail::new(config.sender.trim(), TEST_EMAIL_SUBJECT, TEST_EMAIL_HTML);
        let outcome = self.send_email(config, &probe);
        if outcome.success {
            return EmailOutcome::sent("Test email sent");
        }
        outcome
    }
}
