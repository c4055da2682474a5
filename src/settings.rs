use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use chrono::TimeDelta;
use chrono_tz::Tz;
use std::{env, fmt, str::FromStr, time::Duration};
use url::Url;
use zeroize::Zeroizing;

use crate::{
    constants::MAX_RATE_LIMIT_WINDOW,
    entities::email::{DispatchAtomicity, DispatchConfig, OrganizationProfile},
    limiter::rate_limiter::RateLimitPolicy,
};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: String,

    #[serde(default)]
    pub redis_url: Option<String>,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    #[serde(default = "default_contact_email")]
    pub contact_email: String,

    #[serde(default)]
    pub resend_api_key: Option<String>,

    #[serde(default = "default_resend_api_url")]
    pub resend_api_url: String,

    #[serde(default = "default_team_sender")]
    pub team_sender: String,

    #[serde(default = "default_user_sender")]
    pub user_sender: String,

    #[serde(default = "default_email_timeout")]
    pub email_timeout_secs: u64,

    #[serde(default)]
    pub dispatch_atomicity: DispatchAtomicity,

    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max_requests: u32,

    #[serde(default = "default_rate_limit_window")]
    pub rate_limit_window: String,

    #[serde(default = "default_sweep_interval")]
    pub rate_limit_sweep_interval: String,

    #[serde(default = "default_notification_timezone")]
    pub notification_timezone: String,

    #[serde(default = "default_org_name")]
    pub organization_name: String,

    #[serde(default = "default_org_tagline")]
    pub organization_tagline: String,

    #[serde(default = "default_org_email")]
    pub organization_email: String,

    #[serde(default = "default_org_phone")]
    pub organization_phone: String,

    #[serde(default = "default_org_address")]
    pub organization_address: String,

    #[serde(default = "default_org_footer")]
    pub organization_footer: String,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Contact-API".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_cors_origins() -> String {
    "*".to_string()
}
fn default_max_body_bytes() -> usize {
    16 * 1024
}
fn default_contact_email() -> String {
    "alonso.molina@cypcore.com".to_string()
}
fn default_resend_api_url() -> String {
    "https://api.resend.com".to_string()
}
fn default_team_sender() -> String {
    "Contact Form <contact@data.cypcore.com>".to_string()
}
fn default_user_sender() -> String {
    "CyP Data <contact@data.cypcore.com>".to_string()
}
fn default_email_timeout() -> u64 {
    5
}
fn default_rate_limit_max() -> u32 {
    5
}
fn default_rate_limit_window() -> String {
    "1h".to_string()
}
fn default_sweep_interval() -> String {
    "5m".to_string()
}
fn default_notification_timezone() -> String {
    "Europe/Madrid".to_string()
}
fn default_org_name() -> String {
    "CyP Data".to_string()
}
fn default_org_tagline() -> String {
    "Digital Solutions & Business Intelligence".to_string()
}
fn default_org_email() -> String {
    "alonso.molina@cypcore.com".to_string()
}
fn default_org_phone() -> String {
    "+34 659 160 145".to_string()
}
fn default_org_address() -> String {
    "Ctra. Piera, 7A, Martorell, Barcelona".to_string()
}
fn default_org_footer() -> String {
    "Specializing in AI, Mobile Apps, Web Development & Business Intelligence".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            env: default_env(),
            name: default_name(),
            port: default_port(),
            host: default_host(),
            worker_count: default_worker_count(),
            cors_allowed_origins: default_cors_origins(),
            redis_url: None,
            max_body_bytes: default_max_body_bytes(),
            contact_email: default_contact_email(),
            resend_api_key: None,
            resend_api_url: default_resend_api_url(),
            team_sender: default_team_sender(),
            user_sender: default_user_sender(),
            email_timeout_secs: default_email_timeout(),
            dispatch_atomicity: DispatchAtomicity::default(),
            rate_limit_max_requests: default_rate_limit_max(),
            rate_limit_window: default_rate_limit_window(),
            rate_limit_sweep_interval: default_sweep_interval(),
            notification_timezone: default_notification_timezone(),
            organization_name: default_org_name(),
            organization_tagline: default_org_tagline(),
            organization_email: default_org_email(),
            organization_phone: default_org_phone(),
            organization_address: default_org_address(),
            organization_footer: default_org_footer(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(Environment::with_prefix("APP").prefix_separator("_").ignore_empty(true));

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        // Hosting dashboards commonly set these without the APP_ prefix
        if config.resend_api_key.is_none() {
            config.resend_api_key = env::var("RESEND_API_KEY").ok();
        }
        if let Ok(contact_email) = env::var("CONTACT_EMAIL") {
            if env::var("APP_CONTACT_EMAIL").is_err() && !contact_email.trim().is_empty() {
                config.contact_email = contact_email;
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.contact_email.trim().is_empty() {
            errors.push("CONTACT_EMAIL cannot be empty".to_string());
        }
        if self.rate_limit_max_requests == 0 {
            errors.push("RATE_LIMIT_MAX_REQUESTS must be at least 1".to_string());
        }
        if self.email_timeout_secs == 0 {
            errors.push("EMAIL_TIMEOUT_SECS must be at least 1".to_string());
        }
        if let Err(e) = self.rate_limit_window() {
            errors.push(e.to_string());
        }
        if let Err(e) = self.rate_limit_sweep_interval() {
            errors.push(e.to_string());
        }
        if let Err(e) = self.notification_timezone() {
            errors.push(e.to_string());
        }
        if Url::parse(&self.resend_api_url).is_err() {
            errors.push(format!("RESEND_API_URL is not a valid URL: {}", self.resend_api_url));
        }
        if self.is_production() && self.resend_api_key().is_none() {
            errors.push("RESEND_API_KEY must be set in production".to_string());
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// The provider credential, if one is configured and non-blank.
    pub fn resend_api_key(&self) -> Option<Zeroizing<String>> {
        self.resend_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| Zeroizing::new(key.to_string()))
    }

    pub fn email_timeout(&self) -> Duration {
        Duration::from_secs(self.email_timeout_secs)
    }

    pub fn rate_limit_window(&self) -> Result<Duration, ConfigError> {
        let window = parse_non_zero_duration("RATE_LIMIT_WINDOW", &self.rate_limit_window)?;

        if window > MAX_RATE_LIMIT_WINDOW {
            return Err(ConfigError::Message(format!(
                "RATE_LIMIT_WINDOW must be at most {}",
                humantime::format_duration(MAX_RATE_LIMIT_WINDOW)
            )));
        }
        Ok(window)
    }

    pub fn rate_limit_sweep_interval(&self) -> Result<Duration, ConfigError> {
        parse_non_zero_duration("RATE_LIMIT_SWEEP_INTERVAL", &self.rate_limit_sweep_interval)
    }

    /// IANA zone the team notification timestamp is rendered in.
    pub fn notification_timezone(&self) -> Result<Tz, ConfigError> {
        self.notification_timezone.trim().parse::<Tz>().map_err(|e| {
            ConfigError::Message(format!(
                "NOTIFICATION_TIMEZONE is not a known time zone ({}): {}",
                self.notification_timezone, e
            ))
        })
    }

    pub fn rate_limit_policy(&self) -> Result<RateLimitPolicy, ConfigError> {
        let window = TimeDelta::from_std(self.rate_limit_window()?)
            .map_err(|e| ConfigError::Message(format!("RATE_LIMIT_WINDOW too large: {e}")))?;

        Ok(RateLimitPolicy::new(self.rate_limit_max_requests, window))
    }

    pub fn dispatch_config(&self) -> Result<DispatchConfig, ConfigError> {
        Ok(DispatchConfig {
            team_recipient: self.contact_email.clone(),
            team_sender: self.team_sender.clone(),
            user_sender: self.user_sender.clone(),
            timeout: self.email_timeout(),
            atomicity: self.dispatch_atomicity,
            timezone: self.notification_timezone()?,
            organization: OrganizationProfile {
                name: self.organization_name.clone(),
                tagline: self.organization_tagline.clone(),
                email: self.organization_email.clone(),
                phone: self.organization_phone.clone(),
                address: self.organization_address.clone(),
                footer: self.organization_footer.clone(),
            },
        })
    }
}

fn parse_non_zero_duration(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    let duration = humantime::parse_duration(raw.trim())
        .map_err(|e| ConfigError::Message(format!("{key} is not a valid duration ({raw}): {e}")))?;

    if duration.is_zero() {
        return Err(ConfigError::Message(format!("{key} must be greater than zero")));
    }
    Ok(duration)
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for Option<String> {
    fn redact(&self) -> &str {
        match self.as_deref().map(str::trim) {
            None | Some("") => "[MISSING]",
            Some(_) => "[REDACTED]",
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("redis_url", &self.redis_url.redact())
            .field("max_body_bytes", &self.max_body_bytes)
            .field("contact_email", &self.contact_email)
            .field("resend_api_key", &self.resend_api_key.redact())
            .field("resend_api_url", &self.resend_api_url)
            .field("team_sender", &self.team_sender)
            .field("user_sender", &self.user_sender)
            .field("email_timeout_secs", &self.email_timeout_secs)
            .field("dispatch_atomicity", &self.dispatch_atomicity)
            .field("rate_limit_max_requests", &self.rate_limit_max_requests)
            .field("rate_limit_window", &self.rate_limit_window)
            .field("rate_limit_sweep_interval", &self.rate_limit_sweep_interval)
            .field("notification_timezone", &self.notification_timezone)
            .field("organization_name", &self.organization_name)
            .finish()
    }
}
