//! Seam for the interactive (browser-automation) login step.
//!
//! The core never drives a browser itself. When the arm ladder reaches the
//! full re-authentication step it hands the provider a login-form URL and
//! the account credentials, and expects back the URL the browser ended up
//! on after the provider completed the form flow. The `bidstream-webdriver`
//! crate supplies a W3C WebDriver implementation.

use async_trait::async_trait;

use crate::error::AuthError;

/// External capability: complete an interactive OAuth login.
#[async_trait]
pub trait InteractiveLoginProvider: Send + Sync {
    /// Drive the login form at `login_url` with the given account
    /// credentials and return the final redirected URL.
    ///
    /// # Errors
    /// Any driver-level failure surfaces as [`AuthError::Login`].
    async fn login(
        &self,
        login_url: &str,
        login: &str,
        password: &str,
    ) -> Result<String, AuthError>;
}
