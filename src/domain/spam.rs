use crate::constants::SPAM_KEYWORDS;

/// Flags a submission when any denylisted keyword shows up, case-insensitively,
/// anywhere in the name, email or message.
pub fn is_spam(name: &str, email: &str, message: &str) -> bool {
    let text = format!("{} {} {}", name, email, message).to_lowercase();

    SPAM_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}
