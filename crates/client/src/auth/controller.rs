//! Credential lifecycle state machine and authenticated transport.
//!
//! [`AuthController`] owns the single access/refresh token pair and every
//! way of (re)obtaining it. Recovery is an escalating ladder: reload from
//! the credential store, exchange the refresh token, run the interactive
//! browser login, and finally give up with
//! [`AuthError::RecoveryExhausted`]. After each step the ladder re-checks
//! whether a usable access token appeared, so a cheap step that succeeds
//! short-circuits the expensive ones.
//!
//! All token state lives behind one async mutex. Public entry points take
//! the lock once and call `*_locked` internals with the guard's
//! `&mut AuthState`, so no path can re-enter the lock. The token endpoints
//! themselves are Basic-authenticated, never bearer-authenticated, which
//! keeps recovery from recursing into itself.

use std::sync::Arc;

use reqwest::redirect::Policy;
use reqwest::StatusCode;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::csrf::{generate_state_token, CSRF_TOKEN_LENGTH};
use crate::auth::login::InteractiveLoginProvider;
use crate::auth::store::CredentialStore;
use crate::auth::types::{AuthType, Credentials};
use crate::config::AuthConfig;
use crate::endpoint::{Endpoint, HttpMethod};
use crate::endpoints;
use crate::error::AuthError;
use crate::results::{AcquireTokenResult, ApiResult, RefreshTokenResult};

/// Highest ladder step that still has a recovery action.
const MAX_ARM_POWER: u32 = 2;

/// Raw HTTP outcome handed back to the dispatcher. Status classification
/// happens there, not here.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

/// Credential material attached to one outgoing request.
enum RequestAuth {
    None,
    Basic { username: String, password: String },
    AppId(String),
    Bearer(String),
}

/// Mutable credential state guarded by the controller's mutex.
#[derive(Debug)]
struct AuthState {
    login: Option<String>,
    password: Option<String>,
    credentials: Credentials,
}

/// Owns credentials, recovers them when they expire, and sends
/// authenticated requests on behalf of the dispatcher.
pub struct AuthController {
    config: AuthConfig,
    state: Mutex<AuthState>,
    store: Option<Arc<dyn CredentialStore>>,
    login_provider: Option<Arc<dyn InteractiveLoginProvider>>,
}

impl AuthController {
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        let state = AuthState {
            login: config.login().map(str::to_string),
            password: config.password().map(str::to_string),
            credentials: Credentials::default(),
        };
        Self { config, state: Mutex::new(state), store: None, login_provider: None }
    }

    /// Attach a credential store used by the load and persist hooks.
    #[must_use]
    pub fn with_credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Attach the provider that drives the interactive login form.
    #[must_use]
    pub fn with_login_provider(mut self, provider: Arc<dyn InteractiveLoginProvider>) -> Self {
        self.login_provider = Some(provider);
        self
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Snapshot of the current token pair.
    pub async fn credentials(&self) -> Credentials {
        self.state.lock().await.credentials.clone()
    }

    /// Send one request with the credential the endpoint's auth type
    /// requires, arming the access token first when it is a bearer call.
    ///
    /// # Errors
    /// Arm-ladder failures for bearer endpoints, configuration gaps, and
    /// transport failures.
    pub async fn authenticated_request(&self, endpoint: &Endpoint) -> Result<RawResponse, AuthError> {
        let mut state = self.state.lock().await;
        self.authorized_request_locked(&mut state, endpoint).await
    }

    /// React to a 401 from the dispatcher.
    ///
    /// Non-bearer endpoints have no recovery path; their 401 is final. For
    /// bearer endpoints the first failure of a previously usable token is
    /// treated as ordinary expiry and enters the ladder at the refresh
    /// step; each further failure enters one step higher, so a server that
    /// keeps answering 401 exhausts the ladder instead of looping.
    ///
    /// # Errors
    /// [`AuthError::Unauthorized`] for unrecoverable auth types, or
    /// whatever the arm ladder raises.
    pub async fn handle_auth_failure(&self, endpoint: &Endpoint, tries: u32) -> Result<(), AuthError> {
        match endpoint.auth_type() {
            AuthType::None | AuthType::Basic | AuthType::ClientId => {
                let message = match endpoint.auth_type() {
                    AuthType::Basic => "provide a correct client id and secret",
                    AuthType::ClientId => "provide a correct client id",
                    _ => "the endpoint rejected an unauthenticated request",
                };
                Err(AuthError::Unauthorized {
                    endpoint: endpoint.name().to_string(),
                    message: message.to_string(),
                })
            }
            AuthType::OAuth => {
                let mut state = self.state.lock().await;
                // The starting power tracks the retry count, so repeated
                // failures escalate instead of cycling through the same
                // steps. A first failure of a token that just worked is
                // plain expiry; start at the refresh step, reloading the
                // same token from the store makes no sense.
                let power = if state.credentials.has_access_token() && tries == 0 {
                    1
                } else {
                    tries
                };
                state.credentials.invalidate_access_token();
                debug!(endpoint = endpoint.name(), power, "recovering from auth failure");
                self.arm_access_token(&mut state, power).await
            }
        }
    }

    /// Switch to a different account. Both cached tokens are dropped and
    /// the store is consulted for the new account's credentials.
    pub async fn change_login(&self, login: impl Into<String>, password: impl Into<String>) {
        let mut state = self.state.lock().await;
        state.login = Some(login.into());
        state.password = Some(password.into());
        state.credentials.invalidate_access_token();
        state.credentials.invalidate_refresh_token();
        info!("login changed, cached credentials dropped");
        self.load_credentials_locked(&mut state).await;
    }

    /// Run the full interactive authorization flow now.
    ///
    /// # Errors
    /// Flow failures, wrapped with the login in use for diagnostics.
    pub async fn interactive_login(&self) -> Result<(), AuthError> {
        let mut state = self.state.lock().await;
        let login = state.login.clone().unwrap_or_default();
        self.interactive_auth_locked(&mut state)
            .await
            .map_err(|err| AuthError::context(format!("interactive login failed, used login: {login}"), err))
    }

    /// Exchange the refresh token for a fresh access token now, loading
    /// the refresh token from the store first if none is cached.
    ///
    /// # Errors
    /// Missing refresh token, transport failures, or a non-200/401 answer
    /// from the token endpoint.
    pub async fn refresh(&self, extra: &[(String, String)]) -> Result<(), AuthError> {
        let mut state = self.state.lock().await;
        let login = state.login.clone().unwrap_or_default();
        self.arm_refresh_token(&mut state)
            .await
            .map_err(|err| AuthError::context(format!("token refresh failed, used login: {login}"), err))?;
        self.refresh_token_locked(&mut state, extra)
            .await
            .map_err(|err| AuthError::context(format!("token refresh failed, used login: {login}"), err))
    }

    /// Exchange an authorization code obtained out of band.
    ///
    /// # Errors
    /// Empty code, transport failures, or a rejection from the token
    /// endpoint.
    pub async fn acquire_token_by_code(&self, code: &str) -> Result<(), AuthError> {
        let mut state = self.state.lock().await;
        let login = state.login.clone().unwrap_or_default();
        self.acquire_tokens_locked(&mut state, code)
            .await
            .map_err(|err| AuthError::context(format!("token acquisition failed, used login: {login}"), err))
    }

    async fn authorized_request_locked(
        &self,
        state: &mut AuthState,
        endpoint: &Endpoint,
    ) -> Result<RawResponse, AuthError> {
        let auth = match endpoint.auth_type() {
            AuthType::None => RequestAuth::None,
            AuthType::Basic => self.basic_auth()?,
            AuthType::ClientId => RequestAuth::AppId(self.config.client_id().to_string()),
            AuthType::OAuth => {
                if !state.credentials.has_access_token() {
                    self.arm_access_token(state, 0).await?;
                }
                RequestAuth::Bearer(state.credentials.access_token.clone())
            }
        };
        self.send_request(endpoint, auth).await
    }

    /// Climb the recovery ladder starting at `power` until an access token
    /// is available.
    ///
    /// Step 0 reloads from the store, step 1 exchanges the refresh token,
    /// step 2 runs the interactive login. A refresh failure is logged and
    /// the ladder escalates; an interactive failure is fatal.
    async fn arm_access_token(&self, state: &mut AuthState, mut power: u32) -> Result<(), AuthError> {
        while !state.credentials.has_access_token() {
            if power > MAX_ARM_POWER {
                return Err(AuthError::RecoveryExhausted(power));
            }
            debug!(power, "arming access token");
            match power {
                0 => self.load_credentials_locked(state).await,
                1 => {
                    if let Err(err) = self.refresh_step_locked(state).await {
                        warn!(error = %err, "token refresh failed, escalating");
                    }
                }
                _ => self.interactive_auth_locked(state).await?,
            }
            power += 1;
        }
        Ok(())
    }

    /// Make sure a refresh token is cached, consulting the store once.
    async fn arm_refresh_token(&self, state: &mut AuthState) -> Result<(), AuthError> {
        if !state.credentials.has_refresh_token() {
            self.load_credentials_locked(state).await;
        }
        if state.credentials.has_refresh_token() {
            Ok(())
        } else {
            Err(AuthError::Config("refresh token is missing".to_string()))
        }
    }

    /// Ladder step 1: arm the refresh token, then exchange it.
    async fn refresh_step_locked(&self, state: &mut AuthState) -> Result<(), AuthError> {
        self.arm_refresh_token(state).await?;
        self.refresh_token_locked(state, &[]).await
    }

    /// Exchange the cached refresh token for a new access token.
    ///
    /// A 401 means the refresh token itself is dead: it is dropped and the
    /// call returns Ok so the ladder can escalate. Any other non-200 is an
    /// error.
    async fn refresh_token_locked(
        &self,
        state: &mut AuthState,
        extra: &[(String, String)],
    ) -> Result<(), AuthError> {
        if !state.credentials.has_refresh_token() {
            return Err(AuthError::Config("refresh token is missing".to_string()));
        }
        let endpoint =
            endpoints::refresh_token(self.config.origin(), &state.credentials.refresh_token, extra);
        let auth = self.basic_auth()?;
        let response = self.send_request(&endpoint, auth).await?;

        match response.status {
            StatusCode::OK => {
                let payload = endpoint
                    .decode(&response.body)
                    .map_err(|err| AuthError::Parse {
                        endpoint: endpoint.name().to_string(),
                        message: err.to_string(),
                    })?;
                let mut result = RefreshTokenResult::default();
                result.set(&payload);
                if result.access_token.is_empty() {
                    return Err(AuthError::Parse {
                        endpoint: endpoint.name().to_string(),
                        message: "response carries no access token".to_string(),
                    });
                }
                state.credentials.access_token = result.access_token;
                info!("access token refreshed");
                self.persist_credentials_locked(state).await;
                Ok(())
            }
            StatusCode::UNAUTHORIZED => {
                warn!("refresh token rejected, dropping it");
                state.credentials.invalidate_refresh_token();
                Ok(())
            }
            status => Err(AuthError::UnexpectedStatus {
                endpoint: endpoint.name().to_string(),
                status: status.as_u16(),
                expected: 200,
                message: extract_oauth_error(&response.body),
            }),
        }
    }

    /// Ladder step 2: the full authorization-code flow.
    ///
    /// Generates a CSRF state token, follows the authorization redirect to
    /// the login form, hands the form to the login provider, validates the
    /// final redirect (including the CSRF echo), and exchanges the code.
    async fn interactive_auth_locked(&self, state: &mut AuthState) -> Result<(), AuthError> {
        let login = state
            .login
            .clone()
            .ok_or_else(|| AuthError::Config("login is not set".to_string()))?;
        let password = state
            .password
            .clone()
            .ok_or_else(|| AuthError::Config("password is not set".to_string()))?;
        let redirect_uri = self
            .config
            .redirect_uri()
            .ok_or_else(|| AuthError::Config("redirect URI is not set".to_string()))?
            .to_string();
        let provider = self
            .login_provider
            .clone()
            .ok_or_else(|| AuthError::Config("interactive login provider is not set".to_string()))?;

        let csrf_token = generate_state_token(CSRF_TOKEN_LENGTH);
        let endpoint = endpoints::authorization(
            self.config.origin(),
            self.config.client_id(),
            &redirect_uri,
            &csrf_token,
        );
        info!("starting interactive authorization flow");
        let response = self.send_request(&endpoint, RequestAuth::None).await?;
        if response.status != StatusCode::FOUND {
            return Err(AuthError::UnexpectedStatus {
                endpoint: endpoint.name().to_string(),
                status: response.status.as_u16(),
                expected: 302,
                message: extract_oauth_error(&response.body),
            });
        }
        let location = response
            .location
            .ok_or_else(|| AuthError::Redirect("authorization redirect has no location".to_string()))?;
        if location.contains(&redirect_uri) {
            // Bounced straight back to the callback instead of a login
            // form; an aborted flow even when no error params survived.
            check_error_redirect(&location)?;
            return Err(AuthError::Redirect(format!(
                "authorization ended at '{location}' before the login form"
            )));
        }
        check_error_redirect(&location)?;

        let final_url = provider.login(&location, &login, &password).await?;
        if !final_url.contains(&redirect_uri) {
            check_error_redirect(&final_url)?;
            return Err(AuthError::Redirect(format!(
                "login ended at '{final_url}' instead of the redirect URI"
            )));
        }
        check_error_redirect(&final_url)?;

        let (code, returned_state) = extract_code_and_state(&final_url)?;
        if returned_state != csrf_token {
            return Err(AuthError::CsrfMismatch { expected: csrf_token, received: returned_state });
        }
        self.acquire_tokens_locked(state, &code).await
    }

    /// Exchange an authorization code for the token pair and persist it.
    async fn acquire_tokens_locked(&self, state: &mut AuthState, code: &str) -> Result<(), AuthError> {
        let redirect_uri = self
            .config
            .redirect_uri()
            .ok_or_else(|| AuthError::Config("redirect URI is not set".to_string()))?;
        let endpoint = endpoints::acquire_token(self.config.origin(), code, redirect_uri)?;
        let auth = self.basic_auth()?;
        let response = self.send_request(&endpoint, auth).await?;

        if response.status != StatusCode::OK {
            return Err(AuthError::UnexpectedStatus {
                endpoint: endpoint.name().to_string(),
                status: response.status.as_u16(),
                expected: 200,
                message: extract_oauth_error(&response.body),
            });
        }
        let payload = endpoint.decode(&response.body).map_err(|err| AuthError::Parse {
            endpoint: endpoint.name().to_string(),
            message: err.to_string(),
        })?;
        let mut result = AcquireTokenResult::default();
        result.set(&payload);
        if result.access_token.is_empty() {
            return Err(AuthError::Parse {
                endpoint: endpoint.name().to_string(),
                message: "response carries no access token".to_string(),
            });
        }
        state.credentials.access_token = result.access_token;
        if !result.refresh_token.is_empty() {
            state.credentials.refresh_token = result.refresh_token;
        }
        info!("token pair acquired");
        self.persist_credentials_locked(state).await;
        Ok(())
    }

    /// Load hook. A miss leaves the cached credentials untouched.
    async fn load_credentials_locked(&self, state: &mut AuthState) {
        let Some(store) = &self.store else {
            debug!("no credential store configured, load skipped");
            return;
        };
        let stored = store.load().await;
        if let Some(access) = stored.access_token.filter(|t| !t.is_empty()) {
            state.credentials.access_token = access;
        }
        if let Some(refresh) = stored.refresh_token.filter(|t| !t.is_empty()) {
            state.credentials.refresh_token = refresh;
        }
        debug!(
            access = state.credentials.has_access_token(),
            refresh = state.credentials.has_refresh_token(),
            "credentials loaded from store"
        );
    }

    async fn persist_credentials_locked(&self, state: &AuthState) {
        if let Some(store) = &self.store {
            store
                .persist(&state.credentials.access_token, &state.credentials.refresh_token)
                .await;
        }
    }

    fn basic_auth(&self) -> Result<RequestAuth, AuthError> {
        let secret = self
            .config
            .client_secret()
            .ok_or_else(|| AuthError::Config("client secret is not set".to_string()))?;
        Ok(RequestAuth::Basic {
            username: self.config.client_id().to_string(),
            password: secret.to_string(),
        })
    }

    /// Low-level transport. Builds a fresh client per call so redirect
    /// policy, proxy and timeouts always match the current configuration
    /// and no connection state leaks between calls.
    async fn send_request(
        &self,
        endpoint: &Endpoint,
        auth: RequestAuth,
    ) -> Result<RawResponse, AuthError> {
        let transport = |err: reqwest::Error| AuthError::Transport {
            endpoint: endpoint.name().to_string(),
            message: err.to_string(),
        };

        let mut builder = reqwest::Client::builder()
            .redirect(Policy::none())
            .timeout(self.config.timeout())
            .connect_timeout(self.config.connect_timeout());
        if let Some(proxy) = self.config.proxy() {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|err| AuthError::Config(format!("invalid proxy '{proxy}': {err}")))?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build().map_err(transport)?;

        let mut params: Vec<(String, String)> = endpoint.params().to_vec();
        if let RequestAuth::AppId(app_id) = &auth {
            params.push(("appid".to_string(), app_id.clone()));
        }

        let mut request = match endpoint.method() {
            // Redirect endpoints carry their query in the URL itself so the
            // exact target survives into the Location chain.
            HttpMethod::Get if endpoint.query_in_url() => client.get(endpoint.request_url()),
            HttpMethod::Get => client.get(endpoint.url()).query(&params),
            HttpMethod::Post => client.post(endpoint.url()).form(&params),
        };
        request = request.header(reqwest::header::CONNECTION, "close");
        request = match auth {
            RequestAuth::None | RequestAuth::AppId(_) => request,
            RequestAuth::Basic { username, password } => request.basic_auth(username, Some(password)),
            RequestAuth::Bearer(token) => request.bearer_auth(token),
        };

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(transport)?;
        debug!(endpoint = endpoint.name(), status = status.as_u16(), "response received");
        Ok(RawResponse { status, location, body })
    }
}

/// Fail if a redirect URL carries OAuth error parameters.
fn check_error_redirect(location: &str) -> Result<(), AuthError> {
    let Ok(url) = Url::parse(location) else {
        return Ok(());
    };
    let mut error_code = None;
    let mut description = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "error" | "error_code" => error_code = Some(value.into_owned()),
            "error_description" => description = Some(value.into_owned()),
            _ => {}
        }
    }
    match (error_code, description) {
        (None, None) => Ok(()),
        (code, description) => {
            let code = code.unwrap_or_default();
            let description = description.unwrap_or_default();
            Err(AuthError::Redirect(format!("{description} (error code: {code})")))
        }
    }
}

/// Pull `code` and `state` out of the final redirect URL.
fn extract_code_and_state(final_url: &str) -> Result<(String, String), AuthError> {
    let url = Url::parse(final_url)
        .map_err(|err| AuthError::Redirect(format!("unparsable redirect URL '{final_url}': {err}")))?;
    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            _ => {}
        }
    }
    match (code, state) {
        (Some(code), Some(state)) => Ok((code, state)),
        _ => Err(AuthError::Redirect(format!(
            "redirect URL '{final_url}' is missing the code or state parameter"
        ))),
    }
}

/// Best-effort error message from a token endpoint's failure body.
fn extract_oauth_error(body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(description) = payload.get("error_description").and_then(|v| v.as_str()) {
            return description.to_string();
        }
        if let Some(error) = payload.get("error").and_then(|v| v.as_str()) {
            return error.to_string();
        }
        if let Some(message) = payload
            .get("Error")
            .and_then(|e| e.get("Message"))
            .and_then(|v| v.as_str())
        {
            return message.to_string();
        }
    }
    // Truncate on characters, not bytes; upstream bodies may be
    // multibyte text.
    body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_redirect_detection() {
        assert!(check_error_redirect("https://cb.test/done?code=1&state=2").is_ok());
        let err = check_error_redirect(
            "https://cb.test/done?error_code=invalid_scope&error_description=bad%20scope",
        )
        .expect_err("must fail");
        let message = err.to_string();
        assert!(message.contains("bad scope"));
        assert!(message.contains("invalid_scope"));
    }

    #[test]
    fn non_url_locations_are_not_error_redirects() {
        assert!(check_error_redirect("/relative/login").is_ok());
    }

    #[test]
    fn code_and_state_extraction() {
        let (code, state) =
            extract_code_and_state("https://cb.test/done?code=abc&state=xyz").expect("parse");
        assert_eq!(code, "abc");
        assert_eq!(state, "xyz");

        assert!(extract_code_and_state("https://cb.test/done?code=abc").is_err());
        assert!(extract_code_and_state("not a url").is_err());
    }

    #[test]
    fn oauth_error_extraction_prefers_description() {
        let body = r#"{"error":"invalid_grant","error_description":"refresh token expired"}"#;
        assert_eq!(extract_oauth_error(body), "refresh token expired");
        assert_eq!(extract_oauth_error(r#"{"error":"invalid_grant"}"#), "invalid_grant");
        assert_eq!(extract_oauth_error("plain text"), "plain text");
    }

    #[test]
    fn oauth_error_truncation_respects_multibyte_text() {
        // Character 200 falls inside a multibyte sequence.
        let body = format!("{}日本語のエラー", "x".repeat(199));
        let message = extract_oauth_error(&body);
        assert_eq!(message.chars().count(), 200);
        assert!(message.ends_with('日'));
    }
}
