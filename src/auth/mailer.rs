use async_trait::async_trait;
use tracing::info;

/// Delivers password-reset links to account holders.
#[async_trait]
pub trait PasswordResetMailer: Send + Sync {
    async fn send_reset_link(&self, email: &str, link: &str) -> anyhow::Result<()>;
}

/// Writes the link to the log instead of sending mail.
pub struct LogMailer;

#[async_trait]
impl PasswordResetMailer for LogMailer {
    async fn send_reset_link(&self, email: &str, link: &str) -> anyhow::Result<()> {
        info!(%email, reset_url = %link, "password reset link issued");
        Ok(())
    }
}
