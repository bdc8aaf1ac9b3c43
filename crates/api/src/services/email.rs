//! Outbound mail.
//!
//! Uses SMTP via lettre with Askama templates when SMTP is configured.
//! Otherwise messages are kept in an in-process outbox and logged, which is
//! what tests and local development use.

use std::sync::{Arc, Mutex, PoisonError};

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::user::RESET_TOKEN_TTL_SECONDS;

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetEmailHtml<'a> {
    name: &'a str,
    reset_link: &'a str,
    valid_minutes: i64,
}

#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetEmailText<'a> {
    name: &'a str,
    reset_link: &'a str,
    valid_minutes: i64,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// A message captured by the outbox transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

#[derive(Clone)]
enum Transport {
    Smtp {
        mailer: AsyncSmtpTransport<Tokio1Executor>,
        from_address: String,
    },
    Outbox(Arc<Mutex<Vec<OutgoingEmail>>>),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    transport: Transport,
}

impl EmailService {
    /// Create an SMTP-backed email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn smtp(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport: Transport::Smtp {
                mailer,
                from_address: config.from_address.clone(),
            },
        })
    }

    /// Create an email service that records messages instead of sending them.
    #[must_use]
    pub fn outbox() -> Self {
        Self {
            transport: Transport::Outbox(Arc::default()),
        }
    }

    /// Messages recorded by the outbox transport. Empty for SMTP.
    #[must_use]
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        match &self.transport {
            Transport::Smtp { .. } => Vec::new(),
            Transport::Outbox(outbox) => outbox
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }

    /// Send the password reset link.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_password_reset(
        &self,
        to: &str,
        name: &str,
        reset_link: &str,
    ) -> Result<(), EmailError> {
        let valid_minutes = RESET_TOKEN_TTL_SECONDS / 60;
        let html = PasswordResetEmailHtml {
            name,
            reset_link,
            valid_minutes,
        }
        .render()?;
        let text = PasswordResetEmailText {
            name,
            reset_link,
            valid_minutes,
        }
        .render()?;

        self.send_multipart_email(to, "Your Fitshop password reset link", &text, &html)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let (mailer, from_address) = match &self.transport {
            Transport::Smtp {
                mailer,
                from_address,
            } => (mailer, from_address),
            Transport::Outbox(outbox) => {
                outbox
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(OutgoingEmail {
                        to: to.to_string(),
                        subject: subject.to_string(),
                        text_body: text_body.to_string(),
                        html_body: html_body.to_string(),
                    });
                tracing::info!(to = %to, subject = %subject, "Email recorded in outbox");
                return Ok(());
            }
        };

        let email = Message::builder()
            .from(
                from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

impl std::fmt::Debug for EmailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let transport = match self.transport {
            Transport::Smtp { .. } => "smtp",
            Transport::Outbox(_) => "outbox",
        };
        f.debug_struct("EmailService")
            .field("transport", &transport)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_outbox_records_reset_email() {
        let email = EmailService::outbox();
        email
            .send_password_reset("a@x.com", "Ann", "https://shop.test/reset?resetToken=abc")
            .await
            .unwrap();

        let sent = email.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@x.com");
        assert!(sent[0].text_body.contains("https://shop.test/reset?resetToken=abc"));
        assert!(sent[0].text_body.contains("60 minutes"));
        assert!(sent[0].html_body.contains("Ann"));
    }

    #[tokio::test]
    async fn test_outbox_clones_share_messages() {
        let email = EmailService::outbox();
        let clone = email.clone();
        clone
            .send_password_reset("a@x.com", "Ann", "https://shop.test/reset?resetToken=abc")
            .await
            .unwrap();

        assert_eq!(email.sent().len(), 1);
    }
}
