/// Hides most of an email's local part for logging: `jane@example.com`
/// becomes `ja***@example.com`. Shorter local parts never show in full.
pub fn mask_email(email: &str) -> String {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return "***".to_string();
    };

    let local_len = local.chars().count();
    let visible = if local_len > 2 { 2 } else { local_len.saturating_sub(1).min(1) };
    let prefix: String = local.chars().take(visible).collect();

    format!("{}***@{}", prefix, domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_two_characters_and_domain() {
        assert_eq!(mask_email("jane@example.com"), "ja***@example.com");
    }

    #[test]
    fn never_reveals_short_local_parts() {
        assert_eq!(mask_email("ab@example.com"), "a***@example.com");
        assert_eq!(mask_email("a@example.com"), "***@example.com");
    }

    #[test]
    fn handles_missing_at_sign() {
        assert_eq!(mask_email("not-an-email"), "***");
    }
}
