use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity providers supported by the façade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Apple,
    Facebook,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Google, Provider::Apple, Provider::Facebook];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Apple => "apple",
            Provider::Facebook => "facebook",
        }
    }

    /// URL of the vendor SDK script the loader injects for this provider.
    pub fn script_url(&self) -> &'static str {
        match self {
            Provider::Google => "https://accounts.google.com/gsi/client",
            Provider::Apple => {
                "https://appleid.cdn-apple.com/appleauth/static/jsapi/appleid/1/en_US/appleid.auth.js"
            }
            Provider::Facebook => "https://connect.facebook.net/en_US/sdk.js",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-provider configuration accepted by `initialize`.
///
/// The façade owns the stored configuration; adapters read it and never
/// mutate it. A later `initialize` call overwrites it wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google: Option<GoogleConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apple: Option<AppleConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<FacebookConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleConfig {
    pub web_client_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppleConfig {
    pub client_id: String,
    /// Default redirect URI for the popup flow. Browser embedders usually
    /// pass the current page URL here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacebookConfig {
    pub app_id: String,
}

/// Caller-supplied options for `login`/`refresh`.
///
/// The field set is the union of what the three providers accept: `scopes`
/// for Google/Apple, `permissions` for Facebook, the remainder Apple-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginOptions {
    pub scopes: Vec<String>,
    pub permissions: Vec<String>,
    pub redirect_url: Option<String>,
    pub state: Option<String>,
    pub nonce: Option<String>,
}

/// The normalized result every adapter produces, whatever the vendor's
/// native response shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub provider: Provider,
    pub profile: Profile,
    pub access_token: Option<AccessToken>,
    pub id_token: Option<String>,
}

/// Provider-specific profile field sets.
///
/// Untagged on the wire; variants are ordered most-constrained first so
/// deserialization picks the right one (`GoogleProfile` is all-optional and
/// would otherwise swallow every shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Profile {
    Facebook(FacebookProfile),
    Apple(AppleProfile),
    Google(GoogleProfile),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleProfile {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppleProfile {
    /// `"<first> <last>"` when the vendor returned name data, else empty.
    pub user: String,
    pub email: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

/// Facebook profile. Only `id,name,email,picture` are requested from the
/// graph API; the remaining fields are always emitted as empty placeholders
/// so consumers see a stable shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacebookProfile {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<String>,
    #[serde(rename = "friendIDs")]
    pub friend_ids: Vec<String>,
    pub birthday: Option<String>,
    pub age_range: Option<AgeRange>,
    pub gender: Option<String>,
    pub location: Option<NamedPlace>,
    pub hometown: Option<NamedPlace>,
    #[serde(rename = "profileURL")]
    pub profile_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgeRange {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedPlace {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Carrier for `get_authorization_code` results. `jwt` is a generic field
/// name: Google puts a signed identity token here, Facebook an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationCode {
    pub jwt: String,
}

/// Derived from a live vendor query, never cached.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginStatus {
    pub is_logged_in: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn provider_tags_are_lowercase() {
        assert_eq!(serde_json::to_value(Provider::Google).unwrap(), json!("google"));
        assert_eq!(Provider::Facebook.to_string(), "facebook");
    }

    #[test]
    fn initialize_options_parse_the_wire_shape() {
        let options: InitializeOptions = serde_json::from_value(json!({
            "google": { "webClientId": "g-123" },
            "facebook": { "appId": "fb-456" }
        }))
        .unwrap();
        assert_eq!(options.google.unwrap().web_client_id, "g-123");
        assert_eq!(options.facebook.unwrap().app_id, "fb-456");
        assert!(options.apple.is_none());
    }

    #[test]
    fn facebook_placeholders_serialize_as_present_nulls() {
        let profile = FacebookProfile {
            user_id: "42".into(),
            name: "Test User".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["friendIDs"], json!([]));
        assert_eq!(value["birthday"], json!(null));
        assert_eq!(value["profileURL"], json!(null));
    }

    #[test]
    fn profiles_round_trip_to_their_own_variant() {
        let apple = Profile::Apple(AppleProfile {
            user: "Ada Lovelace".into(),
            email: Some("ada@example.com".into()),
            given_name: Some("Ada".into()),
            family_name: Some("Lovelace".into()),
        });
        let decoded: Profile =
            serde_json::from_value(serde_json::to_value(&apple).unwrap()).unwrap();
        assert!(matches!(decoded, Profile::Apple(_)));

        let facebook = Profile::Facebook(FacebookProfile {
            user_id: "42".into(),
            name: "Test User".into(),
            ..Default::default()
        });
        let decoded: Profile =
            serde_json::from_value(serde_json::to_value(&facebook).unwrap()).unwrap();
        assert!(matches!(decoded, Profile::Facebook(_)));

        let google = Profile::Google(GoogleProfile {
            id: Some("10".into()),
            name: Some("Ada Lovelace".into()),
            ..Default::default()
        });
        let decoded: Profile =
            serde_json::from_value(serde_json::to_value(&google).unwrap()).unwrap();
        assert!(matches!(decoded, Profile::Google(_)));
    }

    #[test]
    fn login_options_default_to_empty() {
        let options: LoginOptions = serde_json::from_value(json!({})).unwrap();
        assert!(options.scopes.is_empty());
        assert!(options.permissions.is_empty());
        assert!(options.nonce.is_none());
    }
}
