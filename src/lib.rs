#![doc = include_str!("RUSTDOC.md")]

mod api;

pub mod error;
pub mod loader;
pub mod providers;
pub mod types;
pub mod util;

#[doc(inline)]
pub use api::{SocialLogin, SocialLoginBuilder};
#[doc(inline)]
pub use error::{SocialLoginError, SocialLoginResult};
#[doc(inline)]
pub use types::{
    InitializeOptions, LoginOptions, LoginResult, LoginStatus, Profile, Provider,
};
