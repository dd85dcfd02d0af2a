//! Minimal W3C WebDriver session over HTTP.
//!
//! Only the handful of commands the login flow needs: new session with
//! Chrome capabilities, timeouts, navigate, find element by CSS selector,
//! send keys, click, read URL, delete session.

use serde_json::{json, Value};

use crate::{WebDriverError, WebDriverOptions};

/// W3C element identifier key in `Find Element` responses.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// One live driver session.
pub struct WebDriverSession {
    client: reqwest::Client,
    base: String,
    session_id: String,
}

impl WebDriverSession {
    /// Create a session on the driver at `host` and apply the page-load
    /// timeout.
    ///
    /// # Errors
    /// Connection failures, a driver-side error creating the session, or a
    /// response without a session id.
    pub async fn connect(host: &str, options: &WebDriverOptions) -> Result<Self, WebDriverError> {
        let client = reqwest::Client::builder()
            .connect_timeout(options.driver_timeout)
            .build()
            .map_err(|err| WebDriverError::Connection(err.to_string()))?;

        let mut args: Vec<&str> = vec!["--disable-gpu", "--no-sandbox"];
        if options.headless {
            args.push("--headless");
        }
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                }
            }
        });

        let value =
            execute(client.post(format!("{host}/session")).json(&capabilities)).await?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                WebDriverError::Response("new-session response carries no session id".to_string())
            })?;

        let session = Self { client, base: format!("{host}/session/{session_id}"), session_id };
        session
            .command(
                "timeouts",
                json!({ "pageLoad": options.page_load_timeout.as_millis() as u64 }),
            )
            .await?;
        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.session_id
    }

    /// Point the browser at `url` and wait for the page load.
    pub async fn navigate(&self, url: &str) -> Result<(), WebDriverError> {
        self.command("url", json!({ "url": url })).await.map(|_| ())
    }

    /// Locate one element by CSS selector and return its element id.
    pub async fn find_element(&self, css_selector: &str) -> Result<String, WebDriverError> {
        let value = self
            .command("element", json!({ "using": "css selector", "value": css_selector }))
            .await?;
        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                WebDriverError::Response(format!("no element id for selector '{css_selector}'"))
            })
    }

    pub async fn send_keys(&self, element_id: &str, text: &str) -> Result<(), WebDriverError> {
        self.command(&format!("element/{element_id}/value"), json!({ "text": text }))
            .await
            .map(|_| ())
    }

    pub async fn click(&self, element_id: &str) -> Result<(), WebDriverError> {
        self.command(&format!("element/{element_id}/click"), json!({})).await.map(|_| ())
    }

    /// URL of the page the browser is currently on.
    pub async fn current_url(&self) -> Result<String, WebDriverError> {
        let value = execute(self.client.get(format!("{}/url", self.base))).await?;
        value.as_str().map(str::to_string).ok_or_else(|| {
            WebDriverError::Response("current-url response is not a string".to_string())
        })
    }

    /// End the session, releasing the browser on the driver host.
    pub async fn delete(&self) -> Result<(), WebDriverError> {
        execute(self.client.delete(&self.base)).await.map(|_| ())
    }

    async fn command(&self, path: &str, body: Value) -> Result<Value, WebDriverError> {
        execute(self.client.post(format!("{}/{path}", self.base)).json(&body)).await
    }
}

/// Send one driver command and unwrap the W3C `value` envelope.
async fn execute(request: reqwest::RequestBuilder) -> Result<Value, WebDriverError> {
    let response = request
        .send()
        .await
        .map_err(|err| WebDriverError::Connection(err.to_string()))?;
    let status = response.status();
    let payload: Value = response
        .json()
        .await
        .map_err(|err| WebDriverError::Response(err.to_string()))?;
    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    if !status.is_success() {
        let error = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(WebDriverError::Protocol { error, message });
    }
    Ok(value)
}
