//! The provider-agnostic entry point.

use std::sync::Arc;

use futures::future::OptionFuture;

use crate::error::{SocialLoginError, SocialLoginResult};
use crate::loader::{ScriptInjector, ScriptLoader};
use crate::providers::apple::{AppleAdapter, AppleSignInApi};
use crate::providers::facebook::{FacebookAdapter, FacebookSdk};
use crate::providers::google::{
    GoogleAdapter, GoogleIdentityServices, HttpUserInfoFetcher, UserInfoFetcher,
};
use crate::types::{
    AuthorizationCode, InitializeOptions, LoginOptions, LoginResult, LoginStatus, Provider,
};

/// Single façade over the Google, Apple and Facebook sign-in flows.
///
/// Every operation takes the target [`Provider`] and routes to the matching
/// adapter. Providers whose vendor capability was never registered on the
/// builder reject their operations with
/// [`SocialLoginError::NotImplemented`].
pub struct SocialLogin {
    loader: Arc<ScriptLoader>,
    google: GoogleAdapter,
    apple: AppleAdapter,
    facebook: FacebookAdapter,
}

/// Assembles a [`SocialLogin`] from the host environment's capabilities.
///
/// In a browser the script injector is [`crate::loader::web::DomScriptInjector`]
/// and each `with_*` capability wraps the corresponding vendor global. Tests
/// and non-browser hosts substitute their own implementations.
#[derive(Default)]
pub struct SocialLoginBuilder {
    google_sdk: Option<Arc<dyn GoogleIdentityServices>>,
    apple_sdk: Option<Arc<dyn AppleSignInApi>>,
    facebook_sdk: Option<Arc<dyn FacebookSdk>>,
    injector: Option<Arc<dyn ScriptInjector>>,
    fetcher: Option<Arc<dyn UserInfoFetcher>>,
}

impl SocialLoginBuilder {
    pub fn with_google(mut self, sdk: Arc<dyn GoogleIdentityServices>) -> Self {
        self.google_sdk = Some(sdk);
        self
    }

    pub fn with_apple(mut self, sdk: Arc<dyn AppleSignInApi>) -> Self {
        self.apple_sdk = Some(sdk);
        self
    }

    pub fn with_facebook(mut self, sdk: Arc<dyn FacebookSdk>) -> Self {
        self.facebook_sdk = Some(sdk);
        self
    }

    pub fn with_script_injector(mut self, injector: Arc<dyn ScriptInjector>) -> Self {
        self.injector = Some(injector);
        self
    }

    /// Overrides the fetcher used to resolve the Google user profile after an
    /// OAuth token grant. Defaults to the reqwest-backed fetcher.
    pub fn with_user_info_fetcher(mut self, fetcher: Arc<dyn UserInfoFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn build(self) -> SocialLogin {
        let fetcher = self
            .fetcher
            .unwrap_or_else(|| Arc::new(HttpUserInfoFetcher::new()));
        let loader = Arc::new(ScriptLoader::new(self.injector));
        SocialLogin {
            google: GoogleAdapter::new(self.google_sdk, fetcher),
            apple: AppleAdapter::new(self.apple_sdk, loader.clone()),
            facebook: FacebookAdapter::new(self.facebook_sdk),
            loader,
        }
    }
}

impl SocialLogin {
    pub fn builder() -> SocialLoginBuilder {
        SocialLoginBuilder::default()
    }

    /// Stores the per-provider configuration and loads each configured
    /// provider's SDK script. Loads run concurrently; one provider's failure
    /// does not block the others from completing, though the first error is
    /// the one reported.
    ///
    /// The only operation that may be called repeatedly: later calls
    /// overwrite the stored configuration and re-run the (idempotent) loads.
    pub async fn initialize(&self, options: InitializeOptions) -> SocialLoginResult<()> {
        let load_google = options.google.is_some();
        if let Some(config) = options.google {
            self.google.configure(config);
        }
        let load_apple = options.apple.is_some();
        if let Some(config) = options.apple {
            self.apple.configure(config);
        }
        let load_facebook = options.facebook.is_some();
        if let Some(config) = options.facebook {
            self.facebook.configure(config);
        }

        let google: OptionFuture<_> = load_google
            .then(|| self.loader.ensure_loaded(Provider::Google))
            .into();
        let apple: OptionFuture<_> = load_apple
            .then(|| self.loader.ensure_loaded(Provider::Apple))
            .into();
        // Facebook needs the vendor init call once its script is in place.
        let facebook: OptionFuture<_> = load_facebook
            .then(|| async {
                self.loader.ensure_loaded(Provider::Facebook).await?;
                self.facebook.init_vendor()
            })
            .into();

        let (google, apple, facebook) = futures::join!(google, apple, facebook);
        google.transpose()?;
        apple.transpose()?;
        facebook.transpose()?;
        Ok(())
    }

    pub async fn login(
        &self,
        provider: Provider,
        options: LoginOptions,
    ) -> SocialLoginResult<LoginResult> {
        match provider {
            Provider::Google => self.google.login(&options).await,
            Provider::Apple => self.apple.login(&options).await,
            Provider::Facebook => self.facebook.login(&options).await,
        }
    }

    pub async fn logout(&self, provider: Provider) -> SocialLoginResult<()> {
        match provider {
            Provider::Google => self.google.logout().await,
            Provider::Apple => self.apple.logout().await,
            Provider::Facebook => self.facebook.logout().await,
        }
    }

    pub async fn is_logged_in(&self, provider: Provider) -> SocialLoginResult<LoginStatus> {
        match provider {
            Provider::Google => self.google.is_logged_in().await,
            Provider::Apple => self.apple.is_logged_in().await,
            Provider::Facebook => self.facebook.is_logged_in().await,
        }
    }

    pub async fn get_authorization_code(
        &self,
        provider: Provider,
    ) -> SocialLoginResult<AuthorizationCode> {
        match provider {
            Provider::Google => self.google.get_authorization_code().await,
            Provider::Apple => self.apple.get_authorization_code().await,
            Provider::Facebook => self.facebook.get_authorization_code().await,
        }
    }

    /// Renews the provider session where the vendor supports it.
    ///
    /// Only Facebook yields a fresh [`LoginResult`]. Google re-runs its login
    /// flow for the side effect of a fresh grant, and Apple has nothing to
    /// renew client-side, so both resolve to `None`.
    pub async fn refresh(
        &self,
        provider: Provider,
        options: LoginOptions,
    ) -> SocialLoginResult<Option<LoginResult>> {
        match provider {
            Provider::Google => {
                self.google.refresh(&options).await?;
                Ok(None)
            }
            Provider::Apple => {
                self.apple.refresh().await?;
                Ok(None)
            }
            Provider::Facebook => Ok(Some(self.facebook.refresh(&options).await?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::facebook::{
        FacebookAuthResponse, FacebookInitConfig, FacebookLoginStatus, FacebookStatus,
        GraphCallback, LogoutCallback, StatusCallback,
    };
    use crate::types::{AppleConfig, FacebookConfig, GoogleConfig};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingInjector {
        injected: Mutex<Vec<Provider>>,
    }

    #[async_trait::async_trait]
    impl ScriptInjector for RecordingInjector {
        async fn inject(&self, provider: Provider, _url: &str) -> SocialLoginResult<()> {
            self.injected.lock().unwrap().push(provider);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeFb {
        init_configs: Mutex<Vec<FacebookInitConfig>>,
    }

    impl FacebookSdk for FakeFb {
        fn init(&self, config: FacebookInitConfig) {
            self.init_configs.lock().unwrap().push(config);
        }

        fn login(&self, _scope: &str, mut callback: StatusCallback) {
            callback(FacebookLoginStatus {
                status: FacebookStatus::Connected,
                auth_response: Some(FacebookAuthResponse {
                    access_token: "fb-token".into(),
                    user_id: "fb-user".into(),
                }),
            });
        }

        fn logout(&self, mut callback: LogoutCallback) {
            callback();
        }

        fn get_login_status(&self, mut callback: StatusCallback) {
            callback(FacebookLoginStatus {
                status: FacebookStatus::Unknown,
                auth_response: None,
            });
        }

        fn api(&self, _path: &str, _fields: &str, mut callback: GraphCallback) {
            callback(json!({ "id": "fb-user", "name": "Ada Lovelace" }));
        }
    }

    fn all_providers_options() -> InitializeOptions {
        InitializeOptions {
            google: Some(GoogleConfig {
                web_client_id: "google-client".into(),
            }),
            apple: Some(AppleConfig {
                client_id: "apple-client".into(),
                redirect_url: None,
            }),
            facebook: Some(FacebookConfig {
                app_id: "app-123".into(),
            }),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn initialize_loads_only_configured_providers() {
        let injector = Arc::new(RecordingInjector::default());
        let social = SocialLogin::builder()
            .with_script_injector(injector.clone())
            .build();

        social
            .initialize(InitializeOptions {
                google: Some(GoogleConfig {
                    web_client_id: "google-client".into(),
                }),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(
            injector.injected.lock().unwrap().as_slice(),
            [Provider::Google]
        );
        assert!(!social.loader.is_loaded(Provider::Apple).await);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn initialize_runs_the_facebook_vendor_init() {
        let injector = Arc::new(RecordingInjector::default());
        let fb = Arc::new(FakeFb::default());
        let social = SocialLogin::builder()
            .with_script_injector(injector.clone())
            .with_facebook(fb.clone())
            .build();

        social.initialize(all_providers_options()).await.unwrap();

        let mut injected = injector.injected.lock().unwrap().clone();
        injected.sort_by_key(|provider| provider.as_str());
        assert_eq!(
            injected,
            [Provider::Apple, Provider::Facebook, Provider::Google]
        );

        let configs = fb.init_configs.lock().unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].app_id, "app-123");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn reinitialize_overwrites_config_without_reloading_scripts() {
        let injector = Arc::new(RecordingInjector::default());
        let fb = Arc::new(FakeFb::default());
        let social = SocialLogin::builder()
            .with_script_injector(injector.clone())
            .with_facebook(fb.clone())
            .build();

        let options = |app_id: &str| InitializeOptions {
            facebook: Some(FacebookConfig {
                app_id: app_id.into(),
            }),
            ..Default::default()
        };
        social.initialize(options("first")).await.unwrap();
        social.initialize(options("second")).await.unwrap();

        assert_eq!(injector.injected.lock().unwrap().len(), 1);
        let configs = fb.init_configs.lock().unwrap();
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[1].app_id, "second");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn unregistered_capability_is_not_implemented() {
        let social = SocialLogin::builder()
            .with_script_injector(Arc::new(RecordingInjector::default()))
            .build();
        social.initialize(all_providers_options()).await.unwrap();

        let error = social
            .login(Provider::Google, LoginOptions::default())
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "login for google is not implemented");

        let error = social.logout(Provider::Facebook).await.unwrap_err();
        assert_eq!(error.to_string(), "logout for facebook is not implemented");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn refresh_yields_a_result_only_for_facebook() {
        let social = SocialLogin::builder()
            .with_script_injector(Arc::new(RecordingInjector::default()))
            .with_facebook(Arc::new(FakeFb::default()))
            .build();
        social.initialize(all_providers_options()).await.unwrap();

        let renewed = social
            .refresh(Provider::Facebook, LoginOptions::default())
            .await
            .unwrap();
        assert_eq!(
            renewed.unwrap().provider,
            Provider::Facebook
        );

        let renewed = social
            .refresh(Provider::Apple, LoginOptions::default())
            .await
            .unwrap();
        assert!(renewed.is_none());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn operations_before_initialize_require_configuration() {
        let social = SocialLogin::builder()
            .with_facebook(Arc::new(FakeFb::default()))
            .build();
        let error = social
            .login(Provider::Facebook, LoginOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            SocialLoginError::NotInitialized(Provider::Facebook)
        ));
    }
}
