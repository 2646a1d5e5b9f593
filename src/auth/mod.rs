//! Authentication: bearer tokens and Google sign-in

pub mod google;
pub mod jwt;

pub use google::{GoogleOAuth, GoogleToken, GoogleUserInfo, OAuthError};
pub use jwt::{AuthService, Claims};
