use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::engine::Engine as _;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeBase64Error;

impl fmt::Display for DecodeBase64Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to decode base64url string")
    }
}

impl std::error::Error for DecodeBase64Error {}

/// Encode bytes with the URL-safe alphabet and no padding, the alphabet
/// signed identity tokens use.
pub fn base64_url_encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode a URL-safe base64 string. Trailing padding is tolerated because
/// some token issuers emit it and some strip it.
pub fn base64_url_decode(input: &str) -> Result<Vec<u8>, DecodeBase64Error> {
    let normalized = input.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(normalized.as_bytes())
        .map_err(|_err| DecodeBase64Error)
}
