use std::sync::Arc;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod background_task;

pub use domain::{entities, spam, use_cases};
pub use interfaces::{handlers, middlewares, repositories, routes};
pub use infrastructure::{email, limiter, utils};

use email::{dispatcher::EmailDispatcher, log_sender::LogEmailSender, resend::ResendEmailSender};
use errors::AppError;
use limiter::{
    rate_limiter::{InMemoryRateLimitStore, RateLimiter},
    redis_store::RedisRateLimitStore,
};
use repositories::{email_sender::DynEmailSender, rate_limit::DynRateLimitStore};
use use_cases::contact::ContactHandler;

pub struct AppState {
    pub contact_handler: AppContactHandler,
}

pub type AppContactHandler = ContactHandler<DynEmailSender>;

impl AppState {
    /// Builds the state from configuration, picking the email provider and
    /// the rate limit store that the configuration asks for.
    pub fn new(config: &settings::AppConfig) -> Result<Self, AppError> {
        let sender: DynEmailSender = match config.resend_api_key() {
            Some(api_key) => Arc::new(ResendEmailSender::new(config, api_key)?),
            None => {
                tracing::warn!("No email API key configured, emails will only be logged");
                Arc::new(LogEmailSender)
            }
        };

        let store: DynRateLimitStore = match config.redis_url.as_deref() {
            Some(url) => match RedisRateLimitStore::connect(url) {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    tracing::error!("Redis connection error, using in-memory rate limits: {}", e);
                    Arc::new(InMemoryRateLimitStore::new())
                }
            },
            None => Arc::new(InMemoryRateLimitStore::new()),
        };

        Self::from_parts(config, sender, store)
    }

    /// Builds the state around an already constructed sender and store.
    pub fn from_parts(
        config: &settings::AppConfig,
        sender: DynEmailSender,
        store: DynRateLimitStore,
    ) -> Result<Self, AppError> {
        let limiter = RateLimiter::new(store, config.rate_limit_policy()?);
        let dispatcher = EmailDispatcher::new(sender, config.dispatch_config()?);

        Ok(AppState {
            contact_handler: ContactHandler::new(limiter, dispatcher),
        })
    }
}
