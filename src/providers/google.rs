use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use super::{callback_dropped, pending_settlement};
use crate::error::{SocialLoginError, SocialLoginResult};
use crate::types::{
    AccessToken, AuthorizationCode, GoogleConfig, GoogleProfile, LoginOptions, LoginResult,
    LoginStatus, Profile, Provider,
};
use crate::util::jwt::{decode_payload, Claims};

/// Endpoint used by the OAuth token fallback to turn an access token into
/// profile claims.
pub const GOOGLE_USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

const OPENID_SCOPE: &str = "openid";

/// Configuration for the one-tap widget.
#[derive(Debug, Clone)]
pub struct GoogleIdConfig {
    pub client_id: String,
    pub auto_select: bool,
}

/// Payload of the one-tap credential callback. Exactly one of the fields is
/// set by a well-behaved vendor.
#[derive(Debug, Clone, Default)]
pub struct GoogleCredentialResponse {
    /// Signed identity token.
    pub credential: Option<String>,
    pub error: Option<String>,
}

/// Display moment reported by the one-tap prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMoment {
    Displayed,
    NotDisplayed,
    Skipped,
    Dismissed,
}

impl PromptMoment {
    /// Whether the prompt never reached the user, which triggers the OAuth
    /// fallback during `login`.
    pub fn suppressed(self) -> bool {
        matches!(self, PromptMoment::NotDisplayed | PromptMoment::Skipped)
    }
}

/// Configuration for the OAuth token-client flow.
#[derive(Debug, Clone)]
pub struct TokenClientConfig {
    pub client_id: String,
    /// Space-joined scope list.
    pub scope: String,
}

#[derive(Debug, Clone, Default)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub error: Option<String>,
}

pub type CredentialCallback = Box<dyn FnMut(GoogleCredentialResponse) + Send>;
pub type MomentCallback = Box<dyn FnMut(PromptMoment) + Send>;
pub type TokenCallback = Box<dyn FnMut(TokenResponse) + Send>;

/// Surface of the Google Identity Services global consumed by the adapter.
///
/// The real object is injected into the page by the loaded vendor script;
/// embedders supply a binding to it (or a fake in tests). Callbacks may be
/// invoked synchronously or on a later tick; a vendor that never invokes a
/// callback leaves the pending operation unresolved.
pub trait GoogleIdentityServices: Send + Sync {
    /// `google.accounts.id.initialize`.
    fn initialize(&self, config: GoogleIdConfig, callback: CredentialCallback);
    /// `google.accounts.id.prompt`. The listener may fire for several
    /// moments of the prompt lifecycle.
    fn prompt(&self, listener: MomentCallback);
    /// `google.accounts.oauth2.initTokenClient(...).requestAccessToken()`.
    fn request_access_token(&self, config: TokenClientConfig, callback: TokenCallback);
}

/// Fetches profile claims from the user-info endpoint during the OAuth
/// token fallback.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait UserInfoFetcher: Send + Sync {
    async fn fetch(&self, access_token: &str) -> SocialLoginResult<Claims>;
}

/// Default [`UserInfoFetcher`] backed by `reqwest`.
pub struct HttpUserInfoFetcher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpUserInfoFetcher {
    pub fn new() -> Self {
        Self::with_endpoint(GOOGLE_USERINFO_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

impl Default for HttpUserInfoFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl UserInfoFetcher for HttpUserInfoFetcher {
    async fn fetch(&self, access_token: &str) -> SocialLoginResult<Claims> {
        let response = self
            .client
            .get(&self.endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|err| SocialLoginError::Network(err.to_string()))?;
        if !response.status().is_success() {
            return Err(SocialLoginError::Network(format!(
                "user-info endpoint returned {}",
                response.status()
            )));
        }
        response
            .json::<Claims>()
            .await
            .map_err(|err| SocialLoginError::Network(err.to_string()))
    }
}

enum OneTapOutcome {
    Credential(GoogleCredentialResponse),
    Suppressed,
}

/// Adapter for Google sign-in.
///
/// `login` runs a two-tier strategy: a silent one-tap attempt first, falling
/// back to the explicit OAuth token flow when the prompt is suppressed or
/// when the caller requests custom scopes (one-tap cannot carry them).
pub struct GoogleAdapter {
    sdk: Option<Arc<dyn GoogleIdentityServices>>,
    fetcher: Arc<dyn UserInfoFetcher>,
    config: Mutex<Option<GoogleConfig>>,
}

impl GoogleAdapter {
    pub(crate) fn new(
        sdk: Option<Arc<dyn GoogleIdentityServices>>,
        fetcher: Arc<dyn UserInfoFetcher>,
    ) -> Self {
        Self {
            sdk,
            fetcher,
            config: Mutex::new(None),
        }
    }

    pub(crate) fn configure(&self, config: GoogleConfig) {
        *self.config.lock().unwrap() = Some(config);
    }

    fn client_id(&self) -> SocialLoginResult<String> {
        self.config
            .lock()
            .unwrap()
            .as_ref()
            .map(|config| config.web_client_id.clone())
            .ok_or(SocialLoginError::NotInitialized(Provider::Google))
    }

    fn sdk(&self, operation: &'static str) -> SocialLoginResult<Arc<dyn GoogleIdentityServices>> {
        self.sdk
            .clone()
            .ok_or(SocialLoginError::NotImplemented {
                provider: Provider::Google,
                operation,
            })
    }

    pub async fn login(&self, options: &LoginOptions) -> SocialLoginResult<LoginResult> {
        let client_id = self.client_id()?;
        let sdk = self.sdk("login")?;

        // One-tap cannot carry custom scopes, so any caller-specified scope
        // goes straight to the token flow.
        if !options.scopes.is_empty() {
            log::debug!("explicit scopes requested; skipping the one-tap prompt");
            return self.oauth_token_flow(&sdk, &client_id, &options.scopes).await;
        }

        let (settlement, completion) = pending_settlement::<OneTapOutcome>();

        let on_credential = settlement.clone();
        sdk.initialize(
            GoogleIdConfig {
                client_id: client_id.clone(),
                auto_select: true,
            },
            Box::new(move |response| on_credential.settle(OneTapOutcome::Credential(response))),
        );
        sdk.prompt(Box::new(move |moment| {
            if moment.suppressed() {
                settlement.settle(OneTapOutcome::Suppressed);
            }
        }));

        match completion
            .await
            .map_err(|_| callback_dropped(Provider::Google))?
        {
            OneTapOutcome::Credential(response) => result_from_credential(response),
            OneTapOutcome::Suppressed => {
                log::debug!("one-tap prompt not displayed or skipped; falling back to OAuth");
                self.oauth_token_flow(&sdk, &client_id, &options.scopes).await
            }
        }
    }

    /// Explicit OAuth token flow, used directly for custom scopes and as the
    /// fallback when the one-tap prompt is suppressed.
    async fn oauth_token_flow(
        &self,
        sdk: &Arc<dyn GoogleIdentityServices>,
        client_id: &str,
        scopes: &[String],
    ) -> SocialLoginResult<LoginResult> {
        let mut scope_list: Vec<String> = scopes.to_vec();
        if !scope_list.iter().any(|scope| scope == OPENID_SCOPE) {
            scope_list.push(OPENID_SCOPE.to_owned());
        }

        let (settlement, completion) = pending_settlement::<TokenResponse>();
        sdk.request_access_token(
            TokenClientConfig {
                client_id: client_id.to_owned(),
                scope: scope_list.join(" "),
            },
            Box::new(move |response| settlement.settle(response)),
        );

        let response = completion
            .await
            .map_err(|_| callback_dropped(Provider::Google))?;
        if let Some(message) = response.error {
            return Err(SocialLoginError::LoginFailed {
                provider: Provider::Google,
                message,
            });
        }
        let access_token = response
            .access_token
            .ok_or_else(|| SocialLoginError::LoginFailed {
                provider: Provider::Google,
                message: "token client returned no access token".into(),
            })?;

        let claims = self.fetcher.fetch(&access_token).await?;
        // This path yields no signed token; the subject identifier stands in
        // for one.
        let id_token = string_claim(&claims, "sub");
        Ok(LoginResult {
            provider: Provider::Google,
            profile: Profile::Google(profile_from_claims(&claims)),
            access_token: Some(AccessToken {
                token: access_token,
                user_id: None,
            }),
            id_token,
        })
    }

    /// Fresh one-tap initialize+prompt cycle. Resolves `None` when the
    /// prompt never reached the user.
    async fn probe_credential(
        &self,
        operation: &'static str,
    ) -> SocialLoginResult<Option<String>> {
        let client_id = self.client_id()?;
        let sdk = self.sdk(operation)?;

        let (settlement, completion) = pending_settlement::<Option<String>>();
        let on_credential = settlement.clone();
        sdk.initialize(
            GoogleIdConfig {
                client_id,
                auto_select: false,
            },
            Box::new(move |response| on_credential.settle(response.credential)),
        );
        sdk.prompt(Box::new(move |moment| {
            if moment.suppressed() {
                settlement.settle(None);
            }
        }));

        completion
            .await
            .map_err(|_| callback_dropped(Provider::Google))
    }

    pub async fn get_authorization_code(&self) -> SocialLoginResult<AuthorizationCode> {
        match self.probe_credential("getAuthorizationCode").await? {
            Some(jwt) => Ok(AuthorizationCode { jwt }),
            None => Err(SocialLoginError::NoAuthorizationCode(Provider::Google)),
        }
    }

    pub async fn is_logged_in(&self) -> SocialLoginResult<LoginStatus> {
        let credential = self.probe_credential("isLoggedIn").await?;
        Ok(LoginStatus {
            is_logged_in: credential.is_some(),
        })
    }

    /// The vendor exposes no revocation call on this platform; any stored
    /// token must be revoked by the caller.
    pub async fn logout(&self) -> SocialLoginResult<()> {
        log::debug!("google logout: tokens must be revoked by the caller");
        Ok(())
    }

    /// Re-runs the login flow; the refreshed result is discarded.
    pub async fn refresh(&self, options: &LoginOptions) -> SocialLoginResult<()> {
        self.login(options).await.map(|_result| ())
    }
}

fn result_from_credential(response: GoogleCredentialResponse) -> SocialLoginResult<LoginResult> {
    if let Some(message) = response.error {
        return Err(SocialLoginError::LoginFailed {
            provider: Provider::Google,
            message,
        });
    }
    let credential = response
        .credential
        .ok_or_else(|| SocialLoginError::LoginFailed {
            provider: Provider::Google,
            message: "credential callback fired without a credential".into(),
        })?;
    let claims = decode_payload(&credential)?;
    Ok(LoginResult {
        provider: Provider::Google,
        profile: Profile::Google(profile_from_claims(&claims)),
        access_token: None,
        id_token: Some(credential),
    })
}

fn profile_from_claims(claims: &Claims) -> GoogleProfile {
    GoogleProfile {
        id: string_claim(claims, "sub"),
        name: string_claim(claims, "name"),
        email: string_claim(claims, "email"),
        given_name: string_claim(claims, "given_name"),
        family_name: string_claim(claims, "family_name"),
        image_url: string_claim(claims, "picture"),
    }
}

fn string_claim(claims: &Claims, key: &str) -> Option<String> {
    claims.get(key).and_then(Value::as_str).map(str::to_owned)
}
