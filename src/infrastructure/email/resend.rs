use anyhow::{bail, Context};
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use crate::{
    entities::email::OutboundEmail,
    errors::AppError,
    repositories::email_sender::EmailSender,
    settings::AppConfig,
};

/// Sends through the Resend transactional email HTTP API.
pub struct ResendEmailSender {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Zeroizing<String>,
}

#[derive(Deserialize)]
struct SendEmailResponse {
    id: String,
}

impl ResendEmailSender {
    pub fn new(config: &AppConfig, api_key: Zeroizing<String>) -> Result<Self, AppError> {
        let endpoint = emails_endpoint(&config.resend_api_url)
            .map_err(|e| AppError::InternalError(format!("Invalid email API URL: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(config.email_timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::InternalError(format!("HTTP client error: {}", e)))?;

        Ok(Self { client, endpoint, api_key })
    }
}

/// `{base}/emails`, keeping any path prefix on the base URL.
fn emails_endpoint(base: &str) -> Result<Url, url::ParseError> {
    let mut base = Url::parse(base)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("emails")
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    async fn send(&self, email: &OutboundEmail) -> anyhow::Result<String> {
        let response = self.client
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.as_str())
            .json(email)
            .send()
            .await
            .context("email API request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("email API returned {}: {}", status, body);
        }

        let sent: SendEmailResponse = response
            .json()
            .await
            .context("email API returned an unexpected body")?;

        Ok(sent.id)
    }

    fn provider(&self) -> &'static str {
        "resend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_base_path() {
        for (base, expected) in [
            ("https://api.resend.com", "https://api.resend.com/emails"),
            ("https://api.resend.com/", "https://api.resend.com/emails"),
            ("https://proxy.internal/v1", "https://proxy.internal/v1/emails"),
            ("https://proxy.internal/v1/", "https://proxy.internal/v1/emails"),
        ] {
            assert_eq!(emails_endpoint(base).unwrap().as_str(), expected, "{base}");
        }
    }
}
