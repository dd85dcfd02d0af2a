//! Error types for the client crate.
//!
//! `AuthError` covers everything that can go wrong inside the credential
//! state machine; the dispatcher converts it (and every other failure) into
//! an [`ErrorKind`](crate::results::ErrorKind) on the result object, so no
//! error crosses the dispatcher's public boundary.

use thiserror::Error;

/// Failures raised by the auth layer and its collaborators.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A static credential or required setting is missing or unusable.
    #[error("auth configuration error: {0}")]
    Config(String),

    /// A 401 on an endpoint whose auth type has no recovery path.
    #[error("unauthorized request to '{endpoint}' endpoint: {message}")]
    Unauthorized { endpoint: String, message: String },

    /// The arm ladder ran out of recovery options.
    #[error("unable to arm access token with power = {0}")]
    RecoveryExhausted(u32),

    /// Transport-level failure (connect, timeout, TLS, request build).
    #[error("connection problem while requesting '{endpoint}' endpoint: {message}")]
    Transport { endpoint: String, message: String },

    /// The upstream answered with an unexpected status.
    #[error("'{endpoint}' endpoint returned {status} (expected {expected}): {message}")]
    UnexpectedStatus { endpoint: String, status: u16, expected: u16, message: String },

    /// The authorization endpoint redirected back with an error, or the
    /// redirect chain produced an unusable URL.
    #[error("OAuth login failed: {0}")]
    Redirect(String),

    /// The `state` query parameter on the final redirect did not match the
    /// CSRF token generated for this flow.
    #[error("CSRF token {expected} mismatching with {received}")]
    CsrfMismatch { expected: String, received: String },

    /// The interactive login provider (browser automation) failed.
    #[error("interactive login error: {0}")]
    Login(String),

    /// A token endpoint answered 200 but the payload was unusable.
    #[error("cannot parse '{endpoint}' endpoint response: {message}")]
    Parse { endpoint: String, message: String },

    /// Contextual wrapper added at public entry points.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<AuthError>,
    },
}

impl AuthError {
    /// Wrap an error with entry-point context, preserving the cause.
    pub fn context(context: impl Into<String>, source: AuthError) -> Self {
        Self::Context { context: context.into(), source: Box::new(source) }
    }

    /// The innermost error, unwrapping any contextual layers.
    pub fn root_cause(&self) -> &AuthError {
        match self {
            Self::Context { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_preserves_cause_and_chains_messages() {
        let inner = AuthError::Config("clientId is not valid".into());
        let wrapped = AuthError::context("interactive login failed", inner);

        let message = wrapped.to_string();
        assert!(message.starts_with("interactive login failed"));
        assert!(message.contains("clientId is not valid"));
        assert!(matches!(wrapped.root_cause(), AuthError::Config(_)));
    }

    #[test]
    fn root_cause_unwraps_nested_context() {
        let err = AuthError::context(
            "outer",
            AuthError::context("inner", AuthError::RecoveryExhausted(3)),
        );
        assert!(matches!(err.root_cause(), AuthError::RecoveryExhausted(3)));
    }

    #[test]
    fn csrf_mismatch_display_names_both_tokens() {
        let err = AuthError::CsrfMismatch { expected: "abc".into(), received: "xyz".into() };
        let message = err.to_string();
        assert!(message.contains("abc"));
        assert!(message.contains("xyz"));
    }
}
