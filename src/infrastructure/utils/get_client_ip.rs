use actix_web::{http::header::HeaderMap, HttpRequest};

use crate::constants::FALLBACK_CLIENT_IP;

/// Extract the client's address for rate limiting from `X-Forwarded-For`
/// (first hop) or `X-Real-IP`, falling back to loopback.
///
/// Both headers are client-controlled unless a reverse proxy overwrites them.
pub fn get_client_ip(req: &HttpRequest) -> String {
    client_ip_from_headers(req.headers())
}

pub fn client_ip_from_headers(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or(FALLBACK_CLIENT_IP)
        .to_string()
}
