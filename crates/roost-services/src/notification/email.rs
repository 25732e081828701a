//! SMTP delivery of verification and password reset links.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use roost_core::Config;

use super::{reset_link, verification_link, Notifier, NotifyError};

#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
    base_url: String,
}

impl SmtpNotifier {
    /// `None` when email is disabled or SMTP is not configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        if !config.email_enabled() {
            tracing::debug!("Email disabled (EMAIL_ENABLED=false)");
            return None;
        }
        let host = config.smtp_host()?;
        let from = config.smtp_from()?.to_string();
        let port = config.smtp_port().unwrap_or(587);

        let builder = if config.smtp_tls() {
            match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host) {
                Ok(builder) => builder,
                Err(e) => {
                    tracing::error!(host = %host, error = %e, "Invalid SMTP relay");
                    return None;
                }
            }
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        let builder = builder.port(port);
        let builder = match (config.smtp_user(), config.smtp_password()) {
            (Some(user), Some(password)) => {
                builder.credentials(Credentials::new(user.to_string(), password.to_string()))
            }
            _ => builder,
        };

        tracing::info!(
            host = %host,
            port = port,
            tls = config.smtp_tls(),
            "Email notifier initialized"
        );

        Some(Self {
            mailer: Arc::new(builder.build()),
            from,
            base_url: config.public_base_url().to_string(),
        })
    }

    async fn send(&self, address: &str, subject: &str, body: String) -> Result<(), NotifyError> {
        let to: Mailbox = address
            .parse()
            .map_err(|_| NotifyError::InvalidAddress(address.to_string()))?;
        let from: Mailbox = self
            .from
            .parse()
            .map_err(|_| NotifyError::InvalidAddress(self.from.clone()))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        self.mailer
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        tracing::info!(to = %address, subject = subject, "Email sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_verification(&self, address: &str, token: &str) -> Result<(), NotifyError> {
        let body = format!(
            "Welcome to Roost!\n\nConfirm your email address by opening this link:\n{}\n",
            verification_link(&self.base_url, token)
        );
        self.send(address, "Verify your email address", body).await
    }

    async fn send_password_reset(&self, address: &str, token: &str) -> Result<(), NotifyError> {
        let body = format!(
            "A password reset was requested for your Roost account.\n\n\
             Choose a new password here:\n{}\n\n\
             If you did not ask for this, ignore this message.\n",
            reset_link(&self.base_url, token)
        );
        self.send(address, "Reset your password", body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(extra: &[(&str, &str)]) -> Config {
        let values: HashMap<String, String> = [
            ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
            ("DATABASE_BACKEND", "memory"),
            ("LOCAL_STORAGE_PATH", "/tmp/roost-test"),
        ]
        .into_iter()
        .chain(extra.iter().copied())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Config::from_map(&values).unwrap()
    }

    #[test]
    fn test_disabled_email_yields_none() {
        assert!(SmtpNotifier::from_config(&config(&[("EMAIL_ENABLED", "false")])).is_none());
    }

    #[tokio::test]
    async fn test_configured_smtp_builds() {
        let cfg = config(&[
            ("EMAIL_ENABLED", "true"),
            ("SMTP_HOST", "localhost"),
            ("SMTP_FROM", "Roost <noreply@roost.example>"),
            ("SMTP_TLS", "false"),
        ]);
        assert!(SmtpNotifier::from_config(&cfg).is_some());
    }
}
