#![cfg(target_arch = "wasm32")]

use social_login_sdk::{InitializeOptions, LoginOptions, Provider, SocialLogin, SocialLoginError};
use wasm_bindgen_test::wasm_bindgen_test;

wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn provider_tags_serialize_lowercase() {
    let tag = serde_json::to_string(&Provider::Google).unwrap();
    assert_eq!(tag, "\"google\"");
}

#[wasm_bindgen_test]
async fn missing_injector_is_reported() {
    let social = SocialLogin::builder().build();
    let error = social
        .initialize(InitializeOptions {
            google: Some(social_login_sdk::types::GoogleConfig {
                web_client_id: "client".into(),
            }),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        SocialLoginError::ScriptLoad {
            provider: Provider::Google,
            ..
        }
    ));
}

#[wasm_bindgen_test]
async fn login_before_initialize_is_rejected() {
    let social = SocialLogin::builder().build();
    let error = social
        .login(Provider::Facebook, LoginOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        SocialLoginError::NotInitialized(Provider::Facebook)
    ));
}
