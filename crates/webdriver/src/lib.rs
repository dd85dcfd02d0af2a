//! W3C WebDriver implementation of the interactive login step.
//!
//! Talks plain HTTP to a WebDriver server (chromedriver, Selenium) to
//! drive the marketplace's login form: navigate, fill the form, submit,
//! read the URL the browser lands on. One session is created per login
//! attempt and always deleted afterwards, pass or fail.
//!
//! ```no_run
//! use bidstream_webdriver::{WebDriverLogin, WebDriverOptions};
//!
//! # fn run() -> Result<(), bidstream_webdriver::WebDriverError> {
//! let provider = WebDriverLogin::new("http://localhost:9515", WebDriverOptions::default())?;
//! // provider implements bidstream_client::InteractiveLoginProvider
//! # Ok(())
//! # }
//! ```

mod session;

pub use session::WebDriverSession;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use bidstream_client::error::AuthError;
use bidstream_client::InteractiveLoginProvider;

/// Failures talking to the WebDriver server.
#[derive(Debug, Error)]
pub enum WebDriverError {
    /// The provider is misconfigured (empty host, bad option).
    #[error("webdriver configuration error: {0}")]
    Config(String),

    /// The driver server could not be reached.
    #[error("webdriver connection failed: {0}")]
    Connection(String),

    /// The driver answered, but with a protocol-level error.
    #[error("webdriver error: {error}: {message}")]
    Protocol { error: String, message: String },

    /// The driver's answer did not have the expected shape.
    #[error("unexpected webdriver response: {0}")]
    Response(String),
}

impl From<WebDriverError> for AuthError {
    fn from(err: WebDriverError) -> Self {
        AuthError::Login(err.to_string())
    }
}

/// CSS selectors for the three login-form controls.
///
/// Defaults match the marketplace's current markup; override them when the
/// form changes or a staging environment differs.
#[derive(Debug, Clone)]
pub struct LoginFormSelectors {
    pub login_field: String,
    pub password_field: String,
    pub submit_button: String,
}

impl Default for LoginFormSelectors {
    fn default() -> Self {
        Self {
            login_field: "#login_handle".to_string(),
            password_field: "#password".to_string(),
            submit_button: "#btn_submit".to_string(),
        }
    }
}

/// Tunables for the driver session.
#[derive(Debug, Clone)]
pub struct WebDriverOptions {
    /// Timeout for reaching the driver server itself.
    pub driver_timeout: Duration,
    /// Page-load timeout applied to the created session.
    pub page_load_timeout: Duration,
    /// Run the browser headless. On by default.
    pub headless: bool,
    pub selectors: LoginFormSelectors,
}

impl Default for WebDriverOptions {
    fn default() -> Self {
        Self {
            driver_timeout: Duration::from_secs(3),
            page_load_timeout: Duration::from_secs(10),
            headless: true,
            selectors: LoginFormSelectors::default(),
        }
    }
}

/// Login provider backed by a WebDriver server.
#[derive(Debug)]
pub struct WebDriverLogin {
    host: String,
    options: WebDriverOptions,
}

impl WebDriverLogin {
    /// Create a provider talking to the driver at `host`
    /// (e.g. `http://localhost:9515`).
    ///
    /// # Errors
    /// [`WebDriverError::Config`] when the host is empty.
    pub fn new(host: impl Into<String>, options: WebDriverOptions) -> Result<Self, WebDriverError> {
        let host = host.into();
        if host.is_empty() {
            return Err(WebDriverError::Config("driver host is not provided".to_string()));
        }
        Ok(Self { host: host.trim_end_matches('/').to_string(), options })
    }

    /// Run the full form flow in a fresh session and return the final URL.
    ///
    /// # Errors
    /// Connection, protocol and response-shape failures from the driver.
    pub async fn run_login_flow(
        &self,
        login_url: &str,
        login: &str,
        password: &str,
    ) -> Result<String, WebDriverError> {
        let session = WebDriverSession::connect(&self.host, &self.options).await?;
        info!(session = session.id(), "webdriver session created");

        let outcome = self.fill_and_submit(&session, login_url, login, password).await;

        // The session is deleted even when the flow failed; a leaked
        // session pins a browser process on the driver host.
        if let Err(err) = session.delete().await {
            warn!(error = %err, "failed to delete webdriver session");
        }
        outcome
    }

    async fn fill_and_submit(
        &self,
        session: &WebDriverSession,
        login_url: &str,
        login: &str,
        password: &str,
    ) -> Result<String, WebDriverError> {
        let selectors = &self.options.selectors;
        session.navigate(login_url).await?;
        debug!(url = login_url, "login page opened");

        let login_field = session.find_element(&selectors.login_field).await?;
        session.send_keys(&login_field, login).await?;

        let password_field = session.find_element(&selectors.password_field).await?;
        session.send_keys(&password_field, password).await?;

        let submit = session.find_element(&selectors.submit_button).await?;
        session.click(&submit).await?;

        let final_url = session.current_url().await?;
        debug!(url = %final_url, "login form submitted");
        Ok(final_url)
    }
}

#[async_trait]
impl InteractiveLoginProvider for WebDriverLogin {
    async fn login(
        &self,
        login_url: &str,
        login: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        self.run_login_flow(login_url, login, password).await.map_err(AuthError::from)
    }
}
