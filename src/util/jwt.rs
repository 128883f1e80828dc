use crate::util::base64::base64_url_decode;
use serde_json::{Map, Value};
use std::fmt;

/// Claims decoded from a token payload. Ephemeral, never persisted.
pub type Claims = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedTokenError {
    message: String,
}

impl MalformedTokenError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for MalformedTokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for MalformedTokenError {}

/// Decodes the payload segment of a dot-delimited signed token into its
/// claims mapping.
///
/// The signature is not verified; that is the issuer's/consumer's concern.
/// Fails when the token has fewer than three segments, the payload is not
/// valid base64url, or it does not decode to a JSON object.
pub fn decode_payload(token: &str) -> Result<Claims, MalformedTokenError> {
    let mut segments = token.split('.');
    let _header = segments.next();
    let payload = match (segments.next(), segments.next()) {
        (Some(payload), Some(_signature)) => payload,
        _ => {
            return Err(MalformedTokenError::new(
                "token has fewer than three segments",
            ))
        }
    };

    let bytes = base64_url_decode(payload)
        .map_err(|err| MalformedTokenError::new(format!("payload segment: {err}")))?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|err| MalformedTokenError::new(format!("payload is not valid JSON: {err}")))?;
    match value {
        Value::Object(claims) => Ok(claims),
        _ => Err(MalformedTokenError::new("payload is not a JSON object")),
    }
}
