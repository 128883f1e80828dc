use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{callback_dropped, pending_settlement};
use crate::error::{SocialLoginError, SocialLoginResult};
use crate::types::{
    AccessToken, AuthorizationCode, FacebookConfig, FacebookProfile, LoginOptions, LoginResult,
    LoginStatus, Profile, Provider,
};

/// Graph API version pinned at vendor init.
pub const FACEBOOK_API_VERSION: &str = "v17.0";

/// The minimal field set requested from the graph API during login.
pub const FACEBOOK_PROFILE_FIELDS: &str = "id,name,email,picture";

/// Parameters for the vendor `FB.init` call.
#[derive(Debug, Clone)]
pub struct FacebookInitConfig {
    pub app_id: String,
    pub version: String,
    pub xfbml: bool,
    pub cookie: bool,
}

/// Login state reported by the vendor status callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacebookStatus {
    Connected,
    NotAuthorized,
    Unknown,
}

impl fmt::Display for FacebookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            FacebookStatus::Connected => "connected",
            FacebookStatus::NotAuthorized => "not_authorized",
            FacebookStatus::Unknown => "unknown",
        };
        f.write_str(tag)
    }
}

#[derive(Debug, Clone)]
pub struct FacebookLoginStatus {
    pub status: FacebookStatus,
    pub auth_response: Option<FacebookAuthResponse>,
}

#[derive(Debug, Clone)]
pub struct FacebookAuthResponse {
    pub access_token: String,
    pub user_id: String,
}

pub type StatusCallback = Box<dyn FnMut(FacebookLoginStatus) + Send>;
pub type GraphCallback = Box<dyn FnMut(Value) + Send>;
pub type LogoutCallback = Box<dyn FnMut() + Send>;

/// Surface of the Facebook JS SDK global consumed by the adapter.
pub trait FacebookSdk: Send + Sync {
    /// `FB.init`.
    fn init(&self, config: FacebookInitConfig);
    /// `FB.login` with a comma-joined permission scope.
    fn login(&self, scope: &str, callback: StatusCallback);
    /// `FB.logout`.
    fn logout(&self, callback: LogoutCallback);
    /// `FB.getLoginStatus`.
    fn get_login_status(&self, callback: StatusCallback);
    /// `FB.api`, yielding the raw graph response.
    fn api(&self, path: &str, fields: &str, callback: GraphCallback);
}

/// Adapter for Facebook login.
pub struct FacebookAdapter {
    sdk: Option<Arc<dyn FacebookSdk>>,
    config: Mutex<Option<FacebookConfig>>,
}

impl FacebookAdapter {
    pub(crate) fn new(sdk: Option<Arc<dyn FacebookSdk>>) -> Self {
        Self {
            sdk,
            config: Mutex::new(None),
        }
    }

    pub(crate) fn configure(&self, config: FacebookConfig) {
        *self.config.lock().unwrap() = Some(config);
    }

    fn app_id(&self) -> SocialLoginResult<String> {
        self.config
            .lock()
            .unwrap()
            .as_ref()
            .map(|config| config.app_id.clone())
            .ok_or(SocialLoginError::NotInitialized(Provider::Facebook))
    }

    fn sdk(&self, operation: &'static str) -> SocialLoginResult<Arc<dyn FacebookSdk>> {
        self.sdk.clone().ok_or(SocialLoginError::NotImplemented {
            provider: Provider::Facebook,
            operation,
        })
    }

    /// Vendor-side init, run by the façade once the SDK script has loaded.
    pub(crate) fn init_vendor(&self) -> SocialLoginResult<()> {
        let app_id = self.app_id()?;
        let sdk = self.sdk("initialize")?;
        sdk.init(FacebookInitConfig {
            app_id,
            version: FACEBOOK_API_VERSION.to_owned(),
            xfbml: true,
            cookie: true,
        });
        Ok(())
    }

    pub async fn login(&self, options: &LoginOptions) -> SocialLoginResult<LoginResult> {
        self.app_id()?;
        let sdk = self.sdk("login")?;

        let (settlement, completion) = pending_settlement::<FacebookLoginStatus>();
        sdk.login(
            &options.permissions.join(","),
            Box::new(move |status| settlement.settle(status)),
        );
        let status = completion
            .await
            .map_err(|_| callback_dropped(Provider::Facebook))?;

        if status.status != FacebookStatus::Connected {
            return Err(SocialLoginError::LoginFailed {
                provider: Provider::Facebook,
                message: format!("login ended with status {}", status.status),
            });
        }
        let auth = status
            .auth_response
            .ok_or_else(|| SocialLoginError::LoginFailed {
                provider: Provider::Facebook,
                message: "connected status without an auth response".into(),
            })?;

        let (settlement, completion) = pending_settlement::<Value>();
        sdk.api(
            "/me",
            FACEBOOK_PROFILE_FIELDS,
            Box::new(move |user_info| settlement.settle(user_info)),
        );
        let user_info = completion
            .await
            .map_err(|_| callback_dropped(Provider::Facebook))?;

        Ok(LoginResult {
            provider: Provider::Facebook,
            profile: Profile::Facebook(profile_from_graph(&user_info)),
            access_token: Some(AccessToken {
                token: auth.access_token,
                user_id: Some(auth.user_id),
            }),
            // The vendor issues no identity token.
            id_token: None,
        })
    }

    pub async fn logout(&self) -> SocialLoginResult<()> {
        let sdk = self.sdk("logout")?;
        let (settlement, completion) = pending_settlement::<()>();
        sdk.logout(Box::new(move || settlement.settle(())));
        completion
            .await
            .map_err(|_| callback_dropped(Provider::Facebook))
    }

    pub async fn is_logged_in(&self) -> SocialLoginResult<LoginStatus> {
        let status = self.login_status("isLoggedIn").await?;
        Ok(LoginStatus {
            is_logged_in: status.status == FacebookStatus::Connected,
        })
    }

    pub async fn get_authorization_code(&self) -> SocialLoginResult<AuthorizationCode> {
        let status = self.login_status("getAuthorizationCode").await?;
        if status.status != FacebookStatus::Connected {
            return Err(SocialLoginError::NoAuthorizationCode(Provider::Facebook));
        }
        Ok(AuthorizationCode {
            jwt: status
                .auth_response
                .map(|auth| auth.access_token)
                .unwrap_or_default(),
        })
    }

    /// Re-invokes the login flow unconditionally.
    pub async fn refresh(&self, options: &LoginOptions) -> SocialLoginResult<LoginResult> {
        self.login(options).await
    }

    async fn login_status(
        &self,
        operation: &'static str,
    ) -> SocialLoginResult<FacebookLoginStatus> {
        let sdk = self.sdk(operation)?;
        let (settlement, completion) = pending_settlement::<FacebookLoginStatus>();
        sdk.get_login_status(Box::new(move |status| settlement.settle(status)));
        completion
            .await
            .map_err(|_| callback_dropped(Provider::Facebook))
    }
}

fn profile_from_graph(user_info: &Value) -> FacebookProfile {
    FacebookProfile {
        user_id: string_field(user_info, "id").unwrap_or_default(),
        name: string_field(user_info, "name").unwrap_or_default(),
        email: string_field(user_info, "email"),
        image_url: user_info
            .pointer("/picture/data/url")
            .and_then(Value::as_str)
            .map(str::to_owned),
        // Only the minimal field set was requested; everything below is a
        // stable placeholder.
        friend_ids: Vec::new(),
        birthday: None,
        age_range: None,
        gender: None,
        location: None,
        hometown: None,
        profile_url: None,
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_owned)
}
