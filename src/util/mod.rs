pub mod base64;
pub mod jwt;

pub use base64::{base64_url_decode, base64_url_encode, DecodeBase64Error};
pub use jwt::{decode_payload, Claims, MalformedTokenError};
