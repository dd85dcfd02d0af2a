//! Client configuration.
//!
//! [`AuthConfig`] is set once at construction and shared by the auth
//! controller for every request. Only `login`/`password` can change after
//! construction, and only through
//! [`AuthController::change_login`](crate::auth::AuthController::change_login),
//! which invalidates all cached credentials.

use std::time::Duration;

/// Default API origin for all endpoint URLs.
pub const DEFAULT_ORIGIN: &str = "https://api.some-auction-service.com";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Immutable identity and transport options for the auth controller.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    client_id: String,
    client_secret: Option<String>,
    login: Option<String>,
    password: Option<String>,
    redirect_uri: Option<String>,
    origin: String,
    proxy: Option<String>,
    timeout: Duration,
    connect_timeout: Duration,
}

impl AuthConfig {
    /// Create a configuration with the given OAuth client id.
    ///
    /// The client id alone is enough for `ClientId`-authenticated endpoints;
    /// token acquisition additionally needs the secret, and the full
    /// interactive flow needs login, password and redirect URI.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            login: None,
            password: None,
            redirect_uri: None,
            origin: DEFAULT_ORIGIN.to_string(),
            proxy: None,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Set the client secret used for Basic-authenticated token endpoints.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Set the initial account login and password.
    #[must_use]
    pub fn with_login(mut self, login: impl Into<String>, password: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self.password = Some(password.into());
        self
    }

    /// Set the OAuth redirect URI registered for this client.
    #[must_use]
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    /// Override the API origin (scheme + host), mainly for tests.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Route all requests through the given proxy URL.
    #[must_use]
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Set the per-request and connect timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, timeout: Duration, connect_timeout: Duration) -> Self {
        self.timeout = timeout;
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    pub fn login(&self) -> Option<&str> {
        self.login.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn redirect_uri(&self) -> Option<&str> {
        self.redirect_uri.as_deref()
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_transport_options() {
        let config = AuthConfig::new("client123");

        assert_eq!(config.client_id(), "client123");
        assert_eq!(config.origin(), DEFAULT_ORIGIN);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert!(config.client_secret().is_none());
        assert!(config.proxy().is_none());
    }

    #[test]
    fn builder_methods_set_identity() {
        let config = AuthConfig::new("client123")
            .with_client_secret("s3cret")
            .with_login("user@example.com", "hunter2")
            .with_redirect_uri("https://app.example.com/callback")
            .with_origin("http://127.0.0.1:9000");

        assert_eq!(config.client_secret(), Some("s3cret"));
        assert_eq!(config.login(), Some("user@example.com"));
        assert_eq!(config.password(), Some("hunter2"));
        assert_eq!(config.redirect_uri(), Some("https://app.example.com/callback"));
        assert_eq!(config.origin(), "http://127.0.0.1:9000");
    }
}
