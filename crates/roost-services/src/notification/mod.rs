//! Outbound account notifications.
//!
//! Senders are called from spawned tasks after the account change committed;
//! their failures are logged by the caller and never undo that change.

#[cfg(feature = "email")]
mod email;

#[cfg(feature = "email")]
pub use email::SmtpNotifier;

use std::sync::Arc;

use async_trait::async_trait;
use roost_core::Config;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("delivery failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_verification(&self, address: &str, token: &str) -> Result<(), NotifyError>;

    async fn send_password_reset(&self, address: &str, token: &str) -> Result<(), NotifyError>;
}

pub(crate) fn verification_link(base_url: &str, token: &str) -> String {
    format!(
        "{}/api/v1/auth/verify/{}",
        base_url.trim_end_matches('/'),
        token
    )
}

pub(crate) fn reset_link(base_url: &str, token: &str) -> String {
    format!(
        "{}/api/v1/auth/reset-password/{}",
        base_url.trim_end_matches('/'),
        token
    )
}

/// Writes links to the log instead of sending mail. Used when email is disabled.
pub struct LogNotifier {
    base_url: String,
}

impl LogNotifier {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_verification(&self, address: &str, token: &str) -> Result<(), NotifyError> {
        tracing::info!(
            to = %address,
            link = %verification_link(&self.base_url, token),
            "Email disabled; verification link not sent"
        );
        Ok(())
    }

    async fn send_password_reset(&self, address: &str, token: &str) -> Result<(), NotifyError> {
        tracing::info!(
            to = %address,
            link = %reset_link(&self.base_url, token),
            "Email disabled; password reset link not sent"
        );
        Ok(())
    }
}

/// SMTP when `EMAIL_ENABLED` is set and the transport builds, the log otherwise.
pub fn create_notifier(config: &Config) -> Arc<dyn Notifier> {
    #[cfg(feature = "email")]
    if let Some(smtp) = SmtpNotifier::from_config(config) {
        return Arc::new(smtp);
    }

    Arc::new(LogNotifier::new(config.public_base_url()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_point_at_api_routes() {
        assert_eq!(
            verification_link("http://localhost:4000/", "abc"),
            "http://localhost:4000/api/v1/auth/verify/abc"
        );
        assert_eq!(
            reset_link("https://roost.example", "abc"),
            "https://roost.example/api/v1/auth/reset-password/abc"
        );
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let notifier = LogNotifier::new("http://localhost:4000");
        assert!(notifier.send_verification("ana@x.com", "t").await.is_ok());
        assert!(notifier.send_password_reset("ana@x.com", "t").await.is_ok());
    }
}
