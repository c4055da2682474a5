use std::sync::Arc;

use async_trait::async_trait;

use crate::entities::email::OutboundEmail;

pub type DynEmailSender = Arc<dyn EmailSender>;

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Hands one email to the provider and returns the provider's id for it
    async fn send(&self, email: &OutboundEmail) -> anyhow::Result<String>;

    /// Short name of the provider, reported by the health endpoint
    fn provider(&self) -> &'static str;
}

#[async_trait]
impl<T> EmailSender for Arc<T>
where
    T: EmailSender + ?Sized,
{
    async fn send(&self, email: &OutboundEmail) -> anyhow::Result<String> {
        (**self).send(email).await
    }

    fn provider(&self) -> &'static str {
        (**self).provider()
    }
}
