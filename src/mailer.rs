use axum::async_trait;
use tracing::{debug, info};

/// Outbound mail capability. Delivery either succeeds or fails; retries are
/// the caller's concern.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// Delivery sink that writes messages to the log stream instead of a mail
/// relay. Stands in wherever no SMTP relay is wired up; a real transport
/// implements `Mailer` behind the same seam.
#[derive(Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        info!(from = %self.from, to = %to, subject = %subject, "mail delivered to log sink");
        debug!(body = %body, "mail body");
        Ok(())
    }
}
