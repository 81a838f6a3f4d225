// Helper functions for safe logging and username derivation

use rand::Rng;

/// Base36 alphabet used for randomized username suffixes
const SUFFIX_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Masks email addresses for safe logging
/// Prevents sensitive data exposure while preserving debugging utility
///
/// # Example
/// ```
/// use gallery_client::common::safe_email_log;
/// let masked = safe_email_log("user@example.com");
/// assert_eq!(masked, "u***@example.com");
/// ```
pub fn safe_email_log(email: &str) -> String {
    if email.len() > 3 {
        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() == 2 {
            // First char, not first byte: the local part may be multi-byte.
            let first = parts[0].chars().next().map(String::from).unwrap_or_default();
            format!("{}***@{}", first, parts[1])
        } else {
            "***@***.***".to_string()
        }
    } else {
        "***@***.***".to_string()
    }
}

/// Default username for an identity with no usable display name:
/// `user_` followed by the first 8 characters of the identity id.
pub fn default_username(user_id: &str) -> String {
    let short: String = user_id.chars().take(8).collect();
    format!("user_{}", short)
}

/// Username derived from a provider display name: lowercased, runs of
/// whitespace collapsed to a single underscore. Falls back to
/// [`default_username`] when the name is empty.
pub fn derived_username(user_id: &str, display_name: Option<&str>) -> String {
    match display_name {
        Some(name) if !name.trim().is_empty() => name
            .trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_"),
        _ => default_username(user_id),
    }
}

/// Random 6-character base36 suffix for username-collision retries
pub fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..6)
        .map(|_| {
            let idx = rng.gen_range(0..SUFFIX_ALPHABET.len());
            SUFFIX_ALPHABET[idx] as char
        })
        .collect()
}

/// Loose email shape check used by forms before any network call
pub fn looks_like_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_email_log_masks_local_part() {
        assert_eq!(safe_email_log("alice@example.com"), "a***@example.com");
        assert_eq!(safe_email_log("ab"), "***@***.***");
        assert_eq!(safe_email_log("not-an-email"), "***@***.***");
    }

    #[test]
    fn test_safe_email_log_handles_multibyte_local_part() {
        assert_eq!(safe_email_log("émile@example.com"), "é***@example.com");
        assert_eq!(safe_email_log("日本@example.com"), "日***@example.com");
    }

    #[test]
    fn test_default_username_uses_short_id() {
        assert_eq!(
            default_username("550e8400-e29b-41d4-a716-446655440000"),
            "user_550e8400"
        );
    }

    #[test]
    fn test_derived_username_from_display_name() {
        let id = "550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(derived_username(id, Some("Alice Smith")), "alice_smith");
        assert_eq!(derived_username(id, Some("  Bob   Q  Jones ")), "bob_q_jones");
        assert_eq!(derived_username(id, Some("   ")), "user_550e8400");
        assert_eq!(derived_username(id, None), "user_550e8400");
    }

    #[test]
    fn test_random_suffix_shape() {
        let suffix = random_suffix();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("a@x.com"));
        assert!(!looks_like_email("a@x"));
        assert!(!looks_like_email("ax.com"));
        assert!(!looks_like_email("@x.com"));
        assert!(!looks_like_email("a@b@c.com"));
    }
}
