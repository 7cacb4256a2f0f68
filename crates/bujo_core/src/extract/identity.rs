//! Position identity for scanned lines.
//!
//! # Invariants
//! - Output depends only on the trimmed, lowercased line and its line number.
//! - Output is a 64-char lowercase hex SHA-256 digest and never changes across
//!   releases; stored rows are matched against it on re-extraction.

use sha2::{Digest, Sha256};

const SEPARATOR: char = '|';

/// Computes the de-duplication fingerprint for `content` on `line_number`.
pub fn position_identity(content: &str, line_number: u32) -> String {
    let normalized = content.trim().to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hasher.update(SEPARATOR.to_string().as_bytes());
    hasher.update(line_number.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::position_identity;

    #[test]
    fn ignores_case_and_surrounding_whitespace() {
        assert_eq!(
            position_identity("Buy milk", 3),
            position_identity("buy milk  ", 3)
        );
    }

    #[test]
    fn differs_by_line_number() {
        assert_ne!(
            position_identity("Buy milk", 3),
            position_identity("Buy milk", 4)
        );
    }

    #[test]
    fn is_lowercase_hex_sha256() {
        let hash = position_identity("• buy milk", 1);
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn separator_prevents_digit_bleed() {
        assert_ne!(position_identity("item 1", 12), position_identity("item 11", 2));
    }
}
