//! Credential state and auth-type dispatch types.

/// Authentication scheme an endpoint requires.
///
/// Each endpoint declares exactly one; the controller guarantees the
/// matching credential is present before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    /// No authentication attached.
    None,
    /// HTTP Basic with client id and secret (token endpoints).
    Basic,
    /// Client id passed as an `appid` request parameter (public API).
    ClientId,
    /// Bearer access token (user-scoped API).
    OAuth,
}

/// The one access/refresh token pair the controller holds.
///
/// An empty string means the token is absent. A non-empty token is *usable*,
/// never known-unexpired: expiry is only discovered through a 401.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
}

impl Credentials {
    /// Usability predicate for the access token.
    #[must_use]
    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// Usability predicate for the refresh token.
    #[must_use]
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    pub fn invalidate_access_token(&mut self) {
        self.access_token.clear();
    }

    pub fn invalidate_refresh_token(&mut self) {
        self.refresh_token.clear();
    }
}
