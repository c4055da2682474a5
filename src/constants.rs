use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use std::time::Duration;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Address used for rate limiting when no proxy header names the client.
pub const FALLBACK_CLIENT_IP: &str = "127.0.0.1";

/// Longest rate limit window the configuration accepts.
pub const MAX_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(30 * 24 * 60 * 60);

pub const SUCCESS_MESSAGE: &str =
    "Thank you for your message! We'll get back to you within 24 hours.";
pub const SPAM_ACK_MESSAGE: &str = "Thank you for your message!";
pub const RATE_LIMITED_MESSAGE: &str = "Too many requests. Please try again later.";
pub const VALIDATION_FAILED_MESSAGE: &str = "Validation failed";
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Sorry, there was an issue sending your message. Please try again or contact us directly.";

pub const SPAM_KEYWORDS: [&str; 7] = [
    "viagra", "casino", "lottery", "winner", "urgent", "crypto", "bitcoin",
];
