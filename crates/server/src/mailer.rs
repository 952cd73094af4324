//! Outbound mail for the OTP handshake.

use async_trait::async_trait;
use lettre::{
    Message, SmtpTransport, Transport,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("invalid mail address: {0}")]
    Address(String),
    #[error("mail transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError>;
}

/// Logs instead of sending. Local runs and tests.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError> {
        tracing::info!(to, subject, "mail (log only): {body}");
        Ok(())
    }
}

/// SMTP relay mailer.
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        username: Option<String>,
        password: Option<String>,
        from: &str,
    ) -> Result<Self, MailerError> {
        let from = from
            .parse::<Mailbox>()
            .map_err(|_| MailerError::Address(from.to_string()))?;
        let mut builder =
            SmtpTransport::relay(host).map_err(|err| MailerError::Transport(err.to_string()))?;
        if let (Some(username), Some(password)) = (username, password) {
            builder = builder.credentials(Credentials::new(username, password));
        }
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .parse::<Mailbox>()
                .map_err(|_| MailerError::Address(to.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|err| MailerError::Transport(err.to_string()))?;

        self.transport
            .send(&message)
            .map_err(|err| MailerError::Transport(err.to_string()))?;
        Ok(())
    }
}
