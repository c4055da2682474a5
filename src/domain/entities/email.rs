use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::errors::DispatchError;

/// One transactional email, shaped the way the provider API expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// What to do when the team was notified but the confirmation to the
/// submitter could not be sent.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchAtomicity {
    /// Report the whole dispatch as failed.
    #[default]
    AllOrNothing,
    /// Report success as long as the team notification went out.
    BestEffort,
}

#[derive(Debug)]
pub struct EmailDispatchResult {
    pub team_email_id: String,
    pub user_email_id: Option<String>,
    /// Set only under [`DispatchAtomicity::BestEffort`] when the
    /// confirmation failed.
    pub confirmation_error: Option<DispatchError>,
}

impl EmailDispatchResult {
    pub fn is_partial(&self) -> bool {
        self.user_email_id.is_none()
    }
}

/// Published contact channels restated in the confirmation email.
#[derive(Debug, Clone)]
pub struct OrganizationProfile {
    pub name: String,
    pub tagline: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub footer: String,
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub team_recipient: String,
    pub team_sender: String,
    pub user_sender: String,
    pub timeout: Duration,
    pub atomicity: DispatchAtomicity,
    pub timezone: Tz,
    pub organization: OrganizationProfile,
}
