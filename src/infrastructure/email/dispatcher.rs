use chrono::Utc;
use tokio::time::timeout;

use crate::{
    email::templates,
    entities::{
        contact::SubmissionRequest,
        email::{DispatchAtomicity, DispatchConfig, EmailDispatchResult, OutboundEmail},
    },
    errors::{DispatchError, DispatchStage},
    repositories::email_sender::EmailSender,
};

/// Sends the two contact emails: the team notification first, then the
/// confirmation to the submitter. The confirmation is never attempted when
/// the notification fails.
pub struct EmailDispatcher<E>
where
    E: EmailSender,
{
    pub sender: E,
    config: DispatchConfig,
}

impl<E> EmailDispatcher<E>
where
    E: EmailSender,
{
    pub fn new(sender: E, config: DispatchConfig) -> Self {
        EmailDispatcher { sender, config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub async fn send_contact_email(
        &self,
        request: &SubmissionRequest,
    ) -> Result<EmailDispatchResult, DispatchError> {
        let received_at = Utc::now().with_timezone(&self.config.timezone);

        let team_email = templates::team_notification(request, &self.config, received_at);
        let team_email_id = self.send_stage(DispatchStage::TeamNotification, &team_email).await?;

        let user_email = templates::user_confirmation(request, &self.config);
        match self.send_stage(DispatchStage::UserConfirmation, &user_email).await {
            Ok(user_email_id) => Ok(EmailDispatchResult {
                team_email_id,
                user_email_id: Some(user_email_id),
                confirmation_error: None,
            }),
            Err(e) => match self.config.atomicity {
                DispatchAtomicity::AllOrNothing => Err(e),
                DispatchAtomicity::BestEffort => Ok(EmailDispatchResult {
                    team_email_id,
                    user_email_id: None,
                    confirmation_error: Some(e),
                }),
            },
        }
    }

    async fn send_stage(
        &self,
        stage: DispatchStage,
        email: &OutboundEmail,
    ) -> Result<String, DispatchError> {
        match timeout(self.config.timeout, self.sender.send(email)).await {
            Ok(Ok(id)) => Ok(id),
            Ok(Err(e)) => Err(DispatchError::Provider { stage, detail: format!("{e:#}") }),
            Err(_) => Err(DispatchError::Timeout { stage, after: self.config.timeout }),
        }
    }
}
