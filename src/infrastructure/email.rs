pub mod dispatcher;
pub mod log_sender;
pub mod resend;
pub mod templates;
