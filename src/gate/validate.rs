//! Identifier validation
//!
//! Runs before any store access. Error messages are fixed strings so the
//! submitted value can never be reflected back to the client.

use crate::error::{AppError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidateEmail;

/// RFC 5321 path length ceiling
pub const MAX_IDENTIFIER_LEN: usize = 254;

lazy_static! {
    /// Markup and script fragments that have no business in an address
    static ref MARKUP_PATTERN: Regex = Regex::new(r"(?i)[<>]|javascript:").unwrap();
    /// Percent-encoded CR/LF, any case (header-injection probes)
    static ref ENCODED_CRLF_PATTERN: Regex = Regex::new(r"(?i)%0d|%0a").unwrap();
}

/// Validate and normalize a raw identifier.
///
/// Returns the normalized (trimmed, lowercased) form on success. The checks
/// run cheapest-first and every rejection uses a generic message.
pub fn validate_identifier(raw: &str) -> Result<String> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(AppError::Validation("Email address is required"));
    }

    if trimmed.len() > MAX_IDENTIFIER_LEN {
        return Err(AppError::Validation("Email address is too long"));
    }

    if trimmed
        .chars()
        .any(|c| c.is_control() || c == '\u{7f}')
    {
        return Err(AppError::Validation(
            "Email address contains invalid characters",
        ));
    }

    if ENCODED_CRLF_PATTERN.is_match(trimmed) {
        return Err(AppError::Validation(
            "Email address contains invalid characters",
        ));
    }

    // Catch injection sequences hidden behind other percent-escapes too
    if let Ok(decoded) = urlencoding::decode(trimmed) {
        if decoded.chars().any(|c| c == '\r' || c == '\n') {
            return Err(AppError::Validation(
                "Email address contains invalid characters",
            ));
        }
    }

    if MARKUP_PATTERN.is_match(trimmed) || trimmed.contains('\'') || trimmed.contains(';') {
        return Err(AppError::Validation(
            "Email address contains invalid characters",
        ));
    }

    if !trimmed.validate_email() {
        return Err(AppError::Validation("Invalid email address format"));
    }

    Ok(trimmed.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_valid_address_is_normalized() {
        let result = validate_identifier("  User@Example.COM ").unwrap();
        assert_eq!(result, "user@example.com");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("not-an-email")]
    #[case("missing-at.example.com")]
    #[case("a@b@c@example.com")]
    fn test_malformed_addresses_rejected(#[case] input: &str) {
        assert!(validate_identifier(input).is_err());
    }

    #[rstest]
    #[case("user@example.com\r\nBcc: victim@example.com")]
    #[case("user\n@example.com")]
    #[case("user@example.com%0d%0aBcc:x@y.com")]
    #[case("user@example.com%0D%0A")]
    #[case("user\x00@example.com")]
    #[case("user\x1f@example.com")]
    #[case("user\x7f@example.com")]
    fn test_injection_sequences_rejected(#[case] input: &str) {
        assert!(validate_identifier(input).is_err());
    }

    #[rstest]
    #[case("<script>alert(1)</script>@example.com")]
    #[case("user<b>@example.com")]
    #[case("javascript:alert(1)@example.com")]
    #[case("user';drop--@example.com")]
    #[case("user;@example.com")]
    fn test_markup_and_sql_meta_rejected(#[case] input: &str) {
        assert!(validate_identifier(input).is_err());
    }

    #[test]
    fn test_overlong_address_rejected() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(long.len() > MAX_IDENTIFIER_LEN);
        assert!(validate_identifier(&long).is_err());
    }

    #[test]
    fn test_boundary_length_accepted() {
        // 242 + '@' + 11 = 254 chars total
        let local = "a".repeat(242);
        let addr = format!("{}@example.com", local);
        assert_eq!(addr.len(), MAX_IDENTIFIER_LEN);
        assert!(validate_identifier(&addr).is_ok());
    }

    #[test]
    fn test_error_message_never_contains_input() {
        let hostile = "<script>alert('x')</script>@example.com";
        let err = validate_identifier(hostile).unwrap_err();
        assert!(!err.to_string().contains("script"));
        assert!(!err.to_string().contains(hostile));
    }
}
