use chrono::Utc;
use serde_json::Value;

use crate::{
    email::dispatcher::EmailDispatcher,
    entities::{
        contact::{ContactForm, SubmissionRequest},
        email::EmailDispatchResult,
    },
    errors::AppError,
    limiter::rate_limiter::{RateLimitDecision, RateLimiter},
    repositories::email_sender::EmailSender,
    spam::is_spam,
    utils::mask::mask_email,
};

/// How an accepted submission was handled. Both are reported to the caller
/// as success.
#[derive(Debug)]
pub enum SubmissionOutcome {
    Delivered(EmailDispatchResult),
    /// Flagged as spam: nothing was sent.
    Suppressed,
}

pub struct ContactHandler<E>
where
    E: EmailSender,
{
    pub limiter: RateLimiter,
    pub dispatcher: EmailDispatcher<E>,
}

impl<E> ContactHandler<E>
where
    E: EmailSender,
{
    pub fn new(limiter: RateLimiter, dispatcher: EmailDispatcher<E>) -> Self {
        ContactHandler { limiter, dispatcher }
    }

    /// Runs one contact form submission through rate limiting, parsing,
    /// validation, the spam check and email dispatch.
    pub async fn submit(&self, client_ip: &str, body: &[u8]) -> Result<SubmissionOutcome, AppError> {
        let decision = self.check_rate_limit(client_ip).await;
        if !decision.allowed {
            // A store that rejects without a reset time is treated as a full window
            let reset_time = decision
                .reset_time
                .unwrap_or_else(|| self.limiter.policy().reset_time(Utc::now()));
            tracing::info!(
                client_ip = %client_ip,
                reset_time = %reset_time.to_rfc3339(),
                "Contact form rate limit exceeded"
            );
            return Err(AppError::RateLimited { reset_time });
        }

        let payload: Value = serde_json::from_slice(body).map_err(|e| {
            tracing::error!(client_ip = %client_ip, error = %e, "Contact form error: malformed body");
            AppError::from(e)
        })?;

        let request = ContactForm::parse(&payload).map_err(|errors| {
            tracing::info!(
                client_ip = %client_ip,
                fields = ?errors.fields().collect::<Vec<_>>(),
                "Contact form validation failed"
            );
            AppError::from(errors)
        })?;

        if is_spam(&request.name, &request.email, &request.message) {
            tracing::warn!(
                name = %request.name,
                email = %mask_email(&request.email),
                client_ip = %client_ip,
                "Potential spam submission"
            );
            return Ok(SubmissionOutcome::Suppressed);
        }

        self.dispatch(client_ip, &request).await
    }

    async fn check_rate_limit(&self, client_ip: &str) -> RateLimitDecision {
        match self.limiter.check(client_ip).await {
            Ok(decision) => decision,
            Err(e) => {
                // A broken store should not take the contact form down with it
                tracing::error!(client_ip = %client_ip, error = %e, "Rate limit check failed, admitting request");
                RateLimitDecision::allowed()
            }
        }
    }

    async fn dispatch(
        &self,
        client_ip: &str,
        request: &SubmissionRequest,
    ) -> Result<SubmissionOutcome, AppError> {
        let masked_email = mask_email(&request.email);

        let result = self.dispatcher.send_contact_email(request).await.map_err(|e| {
            tracing::error!(
                client_ip = %client_ip,
                email = %masked_email,
                stage = %e.stage(),
                error = %e,
                "Contact form email dispatch failed"
            );
            AppError::from(e)
        })?;

        match &result.confirmation_error {
            Some(e) => tracing::warn!(
                name = %request.name,
                email = %masked_email,
                timestamp = %Utc::now().to_rfc3339(),
                client_ip = %client_ip,
                team_email_id = %result.team_email_id,
                error = %e,
                "Contact form submission delivered to team, confirmation email failed"
            ),
            None => tracing::info!(
                name = %request.name,
                email = %masked_email,
                timestamp = %Utc::now().to_rfc3339(),
                client_ip = %client_ip,
                team_email_id = %result.team_email_id,
                user_email_id = %result.user_email_id.as_deref().unwrap_or_default(),
                "Contact form submission successful"
            ),
        }

        Ok(SubmissionOutcome::Delivered(result))
    }
}
