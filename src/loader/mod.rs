//! Idempotent, single-flight loading of the vendor SDK scripts.

use std::sync::Arc;

use async_lock::Mutex;
use async_trait::async_trait;

use crate::error::{SocialLoginError, SocialLoginResult};
use crate::types::Provider;

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
pub mod web;

/// Capability that places one vendor `<script>` tag (or its non-browser
/// equivalent) into the host environment and resolves once it has loaded.
///
/// Implementations must fail with [`SocialLoginError::ScriptLoad`] when the
/// resource cannot be fetched. The loader guarantees at most one in-flight
/// call per provider, so implementations need no dedup logic of their own.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait ScriptInjector: Send + Sync {
    async fn inject(&self, provider: Provider, url: &str) -> SocialLoginResult<()>;
}

/// Per-provider script load state machine.
///
/// Each provider slot is an async mutex around the loaded flag: a held lock
/// with the flag still `false` is the "loading" state, so a second concurrent
/// `ensure_loaded` call parks on the lock and observes the outcome of the
/// single injection instead of issuing another one. A failed injection leaves
/// the flag `false`, which lets a later call retry.
pub struct ScriptLoader {
    injector: Option<Arc<dyn ScriptInjector>>,
    google: Mutex<bool>,
    apple: Mutex<bool>,
    facebook: Mutex<bool>,
}

impl ScriptLoader {
    pub fn new(injector: Option<Arc<dyn ScriptInjector>>) -> Self {
        Self {
            injector,
            google: Mutex::new(false),
            apple: Mutex::new(false),
            facebook: Mutex::new(false),
        }
    }

    fn slot(&self, provider: Provider) -> &Mutex<bool> {
        match provider {
            Provider::Google => &self.google,
            Provider::Apple => &self.apple,
            Provider::Facebook => &self.facebook,
        }
    }

    /// Resolves once the provider's script is loaded, injecting it if needed.
    ///
    /// Safe to call repeatedly and concurrently; while loaded, calls are
    /// no-ops.
    pub async fn ensure_loaded(&self, provider: Provider) -> SocialLoginResult<()> {
        let mut loaded = self.slot(provider).lock().await;
        if *loaded {
            return Ok(());
        }
        let injector = self
            .injector
            .as_ref()
            .ok_or_else(|| SocialLoginError::ScriptLoad {
                provider,
                message: "no script injector registered".into(),
            })?;
        injector.inject(provider, provider.script_url()).await?;
        *loaded = true;
        log::debug!("{provider} SDK script loaded");
        Ok(())
    }

    /// Whether the provider's script load has completed successfully.
    pub async fn is_loaded(&self, provider: Provider) -> bool {
        *self.slot(provider).lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingInjector {
        calls: AtomicUsize,
        fail_first: bool,
    }

    impl CountingInjector {
        fn new(fail_first: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail_first,
            })
        }
    }

    #[async_trait]
    impl ScriptInjector for CountingInjector {
        async fn inject(&self, provider: Provider, url: &str) -> SocialLoginResult<()> {
            assert_eq!(url, provider.script_url());
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            // Yield so a concurrent ensure_loaded call gets polled while
            // this injection is still in flight.
            tokio::task::yield_now().await;
            if self.fail_first && call == 0 {
                return Err(SocialLoginError::ScriptLoad {
                    provider,
                    message: "network error".into(),
                });
            }
            Ok(())
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn concurrent_calls_share_a_single_injection() {
        let injector = CountingInjector::new(false);
        let loader = ScriptLoader::new(Some(injector.clone()));

        let (first, second) = futures::join!(
            loader.ensure_loaded(Provider::Google),
            loader.ensure_loaded(Provider::Google)
        );
        first.unwrap();
        second.unwrap();
        assert_eq!(injector.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn repeated_calls_after_load_are_noops() {
        let injector = CountingInjector::new(false);
        let loader = ScriptLoader::new(Some(injector.clone()));

        loader.ensure_loaded(Provider::Facebook).await.unwrap();
        loader.ensure_loaded(Provider::Facebook).await.unwrap();
        assert_eq!(injector.calls.load(Ordering::SeqCst), 1);
        assert!(loader.is_loaded(Provider::Facebook).await);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn failed_load_reverts_and_allows_retry() {
        let injector = CountingInjector::new(true);
        let loader = ScriptLoader::new(Some(injector.clone()));

        let error = loader.ensure_loaded(Provider::Apple).await.unwrap_err();
        assert!(matches!(
            error,
            SocialLoginError::ScriptLoad {
                provider: Provider::Apple,
                ..
            }
        ));
        assert!(!loader.is_loaded(Provider::Apple).await);

        loader.ensure_loaded(Provider::Apple).await.unwrap();
        assert_eq!(injector.calls.load(Ordering::SeqCst), 2);
        assert!(loader.is_loaded(Provider::Apple).await);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn missing_injector_fails_with_script_load_error() {
        let loader = ScriptLoader::new(None);
        let error = loader.ensure_loaded(Provider::Google).await.unwrap_err();
        match error {
            SocialLoginError::ScriptLoad { message, .. } => {
                assert!(message.contains("no script injector registered"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn providers_load_independently() {
        let injector = CountingInjector::new(false);
        let loader = ScriptLoader::new(Some(injector.clone()));

        let (google, apple) = futures::join!(
            loader.ensure_loaded(Provider::Google),
            loader.ensure_loaded(Provider::Apple)
        );
        google.unwrap();
        apple.unwrap();
        assert_eq!(injector.calls.load(Ordering::SeqCst), 2);
        assert!(!loader.is_loaded(Provider::Facebook).await);
    }
}
