//! Request dispatch with bounded 401 recovery.
//!
//! The dispatcher turns every outcome into a typed result object. It never
//! surfaces an `Err`: transport failures, auth exhaustion, decode failures
//! and upstream error statuses all land in the result's
//! [`ResultState`](crate::results::ResultState), classified by
//! [`ErrorKind`](crate::results::ErrorKind).

use std::sync::Arc;

use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::auth::AuthController;
use crate::endpoint::{DecodeError, Endpoint};
use crate::error::AuthError;
use crate::results::{ApiResult, ErrorKind};

/// A failure on its way into a result object.
struct Failure {
    kind: ErrorKind,
    message: String,
}

impl From<AuthError> for Failure {
    fn from(err: AuthError) -> Self {
        let kind = match err.root_cause() {
            AuthError::Transport { .. } => ErrorKind::Connection,
            _ => ErrorKind::Auth,
        };
        Self { kind, message: err.to_string() }
    }
}

impl From<DecodeError> for Failure {
    fn from(err: DecodeError) -> Self {
        Self { kind: ErrorKind::Result, message: err.to_string() }
    }
}

/// Executes endpoints against the API and shapes responses into results.
pub struct RequestDispatcher {
    auth: Arc<AuthController>,
}

impl RequestDispatcher {
    #[must_use]
    pub fn new(auth: Arc<AuthController>) -> Self {
        Self { auth }
    }

    pub fn auth(&self) -> &Arc<AuthController> {
        &self.auth
    }

    /// Execute an endpoint and map the response into a result of type `R`.
    ///
    /// A 401 triggers credential recovery and a retry of the same request;
    /// retries are bounded by the recovery ladder itself, which goes fatal
    /// once its options are spent. All other statuses resolve in a single
    /// pass.
    pub async fn execute<R: ApiResult>(&self, endpoint: &Endpoint) -> R {
        let mut result = R::default();
        match self.run(endpoint, &mut result).await {
            Ok(()) => {
                result.state_mut().raw_response.clear();
            }
            Err(failure) if failure.kind == ErrorKind::Auth => {
                // Auth failures are terminal for the whole request and
                // carry their own context chain.
                result.state_mut().raw_response.clear();
                result.state_mut().set_error(failure.kind, failure.message);
                warn!(endpoint = endpoint.name(), "request failed: credentials unrecoverable");
            }
            Err(failure) => {
                let upstream = result.state().error_message.clone();
                let message = if upstream.is_empty() {
                    failure.message
                } else {
                    format!("{}. {upstream}", failure.message)
                };
                result.state_mut().set_error(failure.kind, message);
                warn!(
                    endpoint = endpoint.name(),
                    kind = ?result.state().error_kind,
                    "request failed"
                );
            }
        }
        result
    }

    async fn run<R: ApiResult>(&self, endpoint: &Endpoint, result: &mut R) -> Result<(), Failure> {
        let mut tries = 0u32;
        loop {
            let response = self.auth.authenticated_request(endpoint).await?;
            result.state_mut().raw_response = response.body.clone();

            let payload = endpoint.decode(&response.body)?;
            let populated = payload.as_object().is_some_and(|obj| !obj.is_empty());
            // A 404 body that decoded to nothing is not ingested, so the
            // result stays in its initial empty state for the check below.
            if response.status != StatusCode::NOT_FOUND || populated {
                result.set(&payload);
            }

            match response.status {
                StatusCode::OK => return Ok(()),
                StatusCode::BAD_REQUEST => {
                    return Err(Failure {
                        kind: ErrorKind::Input,
                        message: format!("invalid input for '{}' endpoint", endpoint.name()),
                    });
                }
                StatusCode::UNAUTHORIZED => {
                    debug!(endpoint = endpoint.name(), tries, "unauthorized, recovering");
                    self.auth.handle_auth_failure(endpoint, tries).await?;
                    tries += 1;
                }
                StatusCode::FORBIDDEN => {
                    return Err(Failure {
                        kind: ErrorKind::Forbidden,
                        message: format!(
                            "forbidden request to '{}' endpoint: access not allowed or usage limit exceeded",
                            endpoint.name()
                        ),
                    });
                }
                StatusCode::NOT_FOUND => {
                    if result.is_empty() {
                        return Err(Failure {
                            kind: ErrorKind::Connection,
                            message: format!("'{}' endpoint was not found", endpoint.name()),
                        });
                    }
                    return Ok(());
                }
                StatusCode::INTERNAL_SERVER_ERROR | StatusCode::SERVICE_UNAVAILABLE => {
                    return Err(Failure {
                        kind: ErrorKind::Source,
                        message: format!(
                            "request to '{}' endpoint failed with status {}",
                            endpoint.name(),
                            response.status.as_u16()
                        ),
                    });
                }
                status => {
                    return Err(Failure {
                        kind: ErrorKind::Other,
                        message: format!(
                            "request to '{}' endpoint failed with unexpected status {}",
                            endpoint.name(),
                            status.as_u16()
                        ),
                    });
                }
            }
        }
    }
}
