//! Encoding utilities for base58 and base64.
//!
//! Ledger addresses, receipts and secret keys all travel as base58 or base64
//! text. These helpers give the decoding errors a consistent, contextual shape.

use anyhow::{anyhow, Result};

// =============================================================================
// Base58
// =============================================================================

/// Encode bytes to a base58 string (Bitcoin alphabet).
pub fn base58_encode(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

/// Decode a base58 string with a context-aware error message.
///
/// # Arguments
/// * `text` - Base58 encoded string
/// * `context` - Description for error messages (e.g., "owner address", "secret key")
pub fn base58_decode(text: &str, context: &str) -> Result<Vec<u8>> {
    bs58::decode(text.trim())
        .into_vec()
        .map_err(|e| anyhow!("Failed to decode {} from base58: {}", context, e))
}

/// Check that a string decodes to a 32-byte base58 address.
pub fn is_valid_address(text: &str) -> bool {
    bs58::decode(text.trim())
        .into_vec()
        .map(|bytes| bytes.len() == 32)
        .unwrap_or(false)
}

// =============================================================================
// Base64
// =============================================================================

/// Encode bytes to a standard base64 string.
pub fn base64_encode(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Decode a standard base64 string with a context-aware error message.
pub fn base64_decode(text: &str, context: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(text.trim())
        .map_err(|e| anyhow!("Failed to decode {} from base64: {}", context, e))
}

// =============================================================================
// Display
// =============================================================================

/// Shorten a long address or signature for log lines: `AbCd…WxYz`.
pub fn short_id(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() <= 12 {
        return id.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base58_decode_error_has_context() {
        let result = base58_decode("0OIl", "owner address");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("owner address"));
    }

    #[test]
    fn test_is_valid_address() {
        let addr = base58_encode(&[7u8; 32]);
        assert!(is_valid_address(&addr));
        assert!(!is_valid_address(&base58_encode(&[7u8; 31])));
        assert!(!is_valid_address("not base58!"));
    }

    #[test]
    fn test_base64_decode_error() {
        let result = base64_decode("not-valid-base64!!!", "secret key");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("secret key"));
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id("ABCDEFGHIJKLMNOP"), "ABCD…MNOP");
    }
}
