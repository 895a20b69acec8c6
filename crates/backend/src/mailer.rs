//! Outgoing account emails.
//!
//! Message bodies are plain text with a single link; delivery goes through
//! the `Mailer` trait so a real transport can be swapped in.

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> anyhow::Result<()>;
}

/// Writes every message to the log instead of delivering it.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> anyhow::Result<()> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "Outgoing email:\n{}",
            email.body
        );
        Ok(())
    }
}

pub fn verification_email(to: &str, name: &str, link: &str) -> Email {
    Email {
        to: to.to_string(),
        subject: "Verify Your Email - Taskfyer".to_string(),
        body: format!(
            "Hello {name},\n\n\
             Please verify your email address by opening the link below. \
             The link expires in 24 hours.\n\n{link}\n"
        ),
    }
}

pub fn password_reset_email(to: &str, name: &str, link: &str) -> Email {
    Email {
        to: to.to_string(),
        subject: "Reset Your Password - Taskfyer".to_string(),
        body: format!(
            "Hello {name},\n\n\
             A password reset was requested for your account. \
             The link below expires in 1 hour.\n\n{link}\n\n\
             If you did not request this, you can ignore this email.\n"
        ),
    }
}
