use actix_web::{web, get, HttpResponse, Responder};
use humantime::format_duration;
use chrono::Utc;
use std::time::Duration;
use serde::Serialize;

use crate::{constants::START_TIME, repositories::email_sender::EmailSender, AppState};

#[derive(Serialize, Clone)]
struct HealthCheckResponse {
    status: &'static str,
    uptime: String,
    timestamp: String,
    start_at: String,
    version: &'static str,
    email_provider: &'static str,
    rate_limit_store: &'static str,
}

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let now_utc = Utc::now();
    let uptime_duration = now_utc.signed_duration_since(*START_TIME);
    let human_uptime = format_duration(Duration::from_secs(uptime_duration.num_seconds().max(0) as u64));
    let handler = &state.contact_handler;

    HttpResponse::Ok().json(HealthCheckResponse {
        status: "healthy",
        uptime: human_uptime.to_string(),
        timestamp: now_utc.to_rfc3339(),
        start_at: START_TIME.to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
        email_provider: handler.dispatcher.sender.provider(),
        rate_limit_store: handler.limiter.store_kind(),
    })
}
