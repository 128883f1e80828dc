use std::sync::{Arc, Mutex};

use super::{callback_dropped, pending_settlement};
use crate::error::{SocialLoginError, SocialLoginResult};
use crate::loader::ScriptLoader;
use crate::types::{
    AccessToken, AppleConfig, AppleProfile, AuthorizationCode, LoginOptions, LoginResult,
    LoginStatus, Profile, Provider,
};

/// Scope requested when the caller supplies none.
pub const DEFAULT_APPLE_SCOPE: &str = "name email";

/// Configuration handed to the vendor auth client before sign-in.
#[derive(Debug, Clone)]
pub struct AppleAuthConfig {
    pub client_id: String,
    /// Space-joined scope list.
    pub scope: String,
    pub redirect_uri: String,
    pub state: Option<String>,
    pub nonce: Option<String>,
    pub use_popup: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AppleSignInResponse {
    pub user: Option<AppleUser>,
    pub authorization: AppleAuthorization,
}

#[derive(Debug, Clone, Default)]
pub struct AppleAuthorization {
    pub code: String,
    pub id_token: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AppleUser {
    pub name: Option<AppleName>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AppleName {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub type SignInCallback = Box<dyn FnMut(Result<AppleSignInResponse, String>) + Send>;

/// Surface of the Apple sign-in widget consumed by the adapter. Vendor
/// errors are delivered as their message and passed through unchanged.
pub trait AppleSignInApi: Send + Sync {
    /// `AppleID.auth.init`.
    fn init(&self, config: AppleAuthConfig);
    /// `AppleID.auth.signIn`.
    fn sign_in(&self, callback: SignInCallback);
}

/// Adapter for Sign in with Apple.
///
/// The vendor exposes no session, refresh or logout API on this platform,
/// so everything besides `login` is a documented stub.
pub struct AppleAdapter {
    sdk: Option<Arc<dyn AppleSignInApi>>,
    loader: Arc<ScriptLoader>,
    config: Mutex<Option<AppleConfig>>,
}

impl AppleAdapter {
    pub(crate) fn new(sdk: Option<Arc<dyn AppleSignInApi>>, loader: Arc<ScriptLoader>) -> Self {
        Self {
            sdk,
            loader,
            config: Mutex::new(None),
        }
    }

    pub(crate) fn configure(&self, config: AppleConfig) {
        *self.config.lock().unwrap() = Some(config);
    }

    fn config(&self) -> SocialLoginResult<AppleConfig> {
        self.config
            .lock()
            .unwrap()
            .clone()
            .ok_or(SocialLoginError::NotInitialized(Provider::Apple))
    }

    fn sdk(&self, operation: &'static str) -> SocialLoginResult<Arc<dyn AppleSignInApi>> {
        self.sdk.clone().ok_or(SocialLoginError::NotImplemented {
            provider: Provider::Apple,
            operation,
        })
    }

    pub async fn login(&self, options: &LoginOptions) -> SocialLoginResult<LoginResult> {
        let config = self.config()?;
        if !self.loader.is_loaded(Provider::Apple).await {
            return Err(SocialLoginError::ScriptNotLoaded(Provider::Apple));
        }
        let sdk = self.sdk("login")?;

        let scope = if options.scopes.is_empty() {
            DEFAULT_APPLE_SCOPE.to_owned()
        } else {
            options.scopes.join(" ")
        };
        let redirect_uri = options
            .redirect_url
            .clone()
            .or(config.redirect_url)
            .unwrap_or_default();
        sdk.init(AppleAuthConfig {
            client_id: config.client_id,
            scope,
            redirect_uri,
            state: options.state.clone(),
            nonce: options.nonce.clone(),
            use_popup: true,
        });

        let (settlement, completion) = pending_settlement();
        sdk.sign_in(Box::new(move |outcome| settlement.settle(outcome)));

        let response = completion
            .await
            .map_err(|_| callback_dropped(Provider::Apple))?
            .map_err(|message| SocialLoginError::LoginFailed {
                provider: Provider::Apple,
                message,
            })?;
        Ok(normalize(response))
    }

    /// No vendor session API exists; the caller tracks its own state.
    pub async fn is_logged_in(&self) -> SocialLoginResult<LoginStatus> {
        log::debug!("apple login status must be tracked by the caller");
        Ok(LoginStatus {
            is_logged_in: false,
        })
    }

    /// The authorization code is only issued during `login`; there is no way
    /// to request one afterwards.
    pub async fn get_authorization_code(&self) -> SocialLoginResult<AuthorizationCode> {
        Err(SocialLoginError::NotAvailable {
            provider: Provider::Apple,
            operation: "getAuthorizationCode",
        })
    }

    pub async fn refresh(&self) -> SocialLoginResult<()> {
        log::debug!("apple refresh is not available on this platform");
        Ok(())
    }

    pub async fn logout(&self) -> SocialLoginResult<()> {
        log::debug!("apple sessions are a client-side concern");
        Ok(())
    }
}

fn normalize(response: AppleSignInResponse) -> LoginResult {
    let name = response.user.as_ref().and_then(|user| user.name.as_ref());
    let given_name = name.and_then(|name| name.first_name.clone());
    let family_name = name.and_then(|name| name.last_name.clone());
    let user = match (&given_name, &family_name) {
        (Some(first), Some(last)) => format!("{first} {last}"),
        (Some(first), None) => first.clone(),
        _ => String::new(),
    };

    LoginResult {
        provider: Provider::Apple,
        profile: Profile::Apple(AppleProfile {
            user,
            email: response.user.and_then(|user| user.email),
            given_name,
            family_name,
        }),
        // No true access token is issued in the popup flow; the
        // authorization code stands in for one.
        access_token: Some(AccessToken {
            token: response.authorization.code,
            user_id: None,
        }),
        id_token: response.authorization.id_token,
    }
}
