pub mod email_sender;
pub mod rate_limit;
