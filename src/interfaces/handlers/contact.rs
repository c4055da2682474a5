use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;

use crate::{
    constants::{SPAM_ACK_MESSAGE, SUCCESS_MESSAGE},
    errors::AppError,
    use_cases::contact::SubmissionOutcome,
    utils::get_client_ip::get_client_ip,
    AppState,
};

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: &'static str,
}

/// `POST /api/contact`. The body is taken raw so the rate limit is checked
/// before any parsing happens.
pub async fn submit_contact(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let client_ip = get_client_ip(&req);

    let message = match state.contact_handler.submit(&client_ip, &body).await? {
        SubmissionOutcome::Delivered(_) => SUCCESS_MESSAGE,
        // Spam gets the same shape of answer so senders can't tell it was caught
        SubmissionOutcome::Suppressed => SPAM_ACK_MESSAGE,
    };

    Ok(HttpResponse::Ok().json(ContactResponse {
        success: true,
        message,
    }))
}
