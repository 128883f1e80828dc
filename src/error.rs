use crate::types::Provider;
use crate::util::jwt::MalformedTokenError;
use std::fmt;

pub type SocialLoginResult<T> = Result<T, SocialLoginError>;

/// Error type shared by the façade and every provider adapter.
///
/// Vendor-reported failures are carried in `LoginFailed` with the vendor
/// message unchanged; nothing is retried internally.
#[derive(Debug, Clone)]
pub enum SocialLoginError {
    /// An operation that needs provider configuration ran before
    /// `initialize` supplied it.
    NotInitialized(Provider),
    /// Injecting the vendor SDK script failed, or no injector is registered.
    ScriptLoad { provider: Provider, message: String },
    /// The operation requires the vendor script to be loaded first.
    ScriptNotLoaded(Provider),
    /// A signed token's payload segment could not be decoded.
    MalformedToken(String),
    /// No credential/authorization code could be obtained from the vendor.
    NoAuthorizationCode(Provider),
    /// The vendor SDK reported a sign-in failure.
    LoginFailed { provider: Provider, message: String },
    /// The vendor exposes no API for this operation on this platform.
    NotAvailable {
        provider: Provider,
        operation: &'static str,
    },
    /// The provider/operation pair has no implementation (e.g. the vendor
    /// capability was never injected).
    NotImplemented {
        provider: Provider,
        operation: &'static str,
    },
    Network(String),
}

impl fmt::Display for SocialLoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocialLoginError::NotInitialized(provider) => {
                let credential = match provider {
                    Provider::Google => "Google Client ID",
                    Provider::Apple => "Apple Client ID",
                    Provider::Facebook => "Facebook App ID",
                };
                write!(f, "{credential} not set. Call initialize() first.")
            }
            SocialLoginError::ScriptLoad { provider, message } => {
                write!(f, "failed to load the {provider} SDK script: {message}")
            }
            SocialLoginError::ScriptNotLoaded(provider) => {
                write!(f, "{provider} SDK script not loaded")
            }
            SocialLoginError::MalformedToken(message) => {
                write!(f, "malformed identity token: {message}")
            }
            SocialLoginError::NoAuthorizationCode(provider) => {
                write!(f, "no {provider} authorization code available")
            }
            SocialLoginError::LoginFailed { provider, message } => {
                write!(f, "{provider} login failed: {message}")
            }
            SocialLoginError::NotAvailable {
                provider,
                operation,
            } => {
                write!(f, "{operation} is not available for {provider}")
            }
            SocialLoginError::NotImplemented {
                provider,
                operation,
            } => {
                write!(f, "{operation} for {provider} is not implemented")
            }
            SocialLoginError::Network(message) => write!(f, "Network error: {message}"),
        }
    }
}

impl std::error::Error for SocialLoginError {}

impl From<MalformedTokenError> for SocialLoginError {
    fn from(error: MalformedTokenError) -> Self {
        SocialLoginError::MalformedToken(error.to_string())
    }
}
