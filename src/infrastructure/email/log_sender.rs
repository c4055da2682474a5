use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    entities::email::OutboundEmail,
    repositories::email_sender::EmailSender,
    utils::mask::mask_email,
};

/// Stand-in provider for local development: logs the email instead of
/// sending it.
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, email: &OutboundEmail) -> anyhow::Result<String> {
        let id = format!("log-{}", Uuid::new_v4());
        let recipients = email.to.iter().map(|to| mask_email(to)).collect::<Vec<_>>();

        tracing::debug!(
            id = %id,
            to = ?recipients,
            subject = %email.subject,
            "Email not sent, no provider configured"
        );

        Ok(id)
    }

    fn provider(&self) -> &'static str {
        "log"
    }
}
