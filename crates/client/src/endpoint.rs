//! Declarative description of one API operation.
//!
//! An [`Endpoint`] carries everything the auth controller needs to issue a
//! request (URL, method, auth type, ordered params) plus a pure `decode`
//! for the expected response format. Descriptors are immutable once built;
//! the constructors live in [`crate::endpoints`].

use serde_json::{Map, Value};
use thiserror::Error;

use crate::auth::AuthType;

/// HTTP request method for an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Response body format an endpoint declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// No decodable body expected (redirect endpoints).
    None,
    Json,
    /// Declared by the upstream API but not supported by this client.
    Xml,
}

/// Failure decoding a response body. Maps to
/// [`ErrorKind::Result`](crate::results::ErrorKind::Result) at the
/// dispatcher boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("XML response parsing is not implemented")]
    XmlUnsupported,
}

/// One API operation: where to send it, how to authenticate it, and how to
/// decode what comes back.
#[derive(Debug, Clone)]
pub struct Endpoint {
    name: &'static str,
    url: String,
    method: HttpMethod,
    auth_type: AuthType,
    output_format: OutputFormat,
    params: Vec<(String, String)>,
    query_in_url: bool,
}

impl Endpoint {
    pub(crate) fn new(
        name: &'static str,
        url: impl Into<String>,
        method: HttpMethod,
        auth_type: AuthType,
        output_format: OutputFormat,
    ) -> Self {
        Self {
            name,
            url: url.into(),
            method,
            auth_type,
            output_format,
            params: Vec::new(),
            query_in_url: false,
        }
    }

    /// Send this endpoint's params inside the URL instead of as a request
    /// query. Redirect endpoints need the full URL in the `Location` chain.
    #[must_use]
    pub(crate) fn send_query_in_url(mut self) -> Self {
        self.query_in_url = true;
        self
    }

    /// Append a request parameter, preserving insertion order.
    #[must_use]
    pub(crate) fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Append caller-supplied extra parameters.
    #[must_use]
    pub(crate) fn extra_params(mut self, extra: &[(String, String)]) -> Self {
        self.params.extend(extra.iter().cloned());
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn auth_type(&self) -> AuthType {
        self.auth_type
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Whether GET requests must carry the params in the URL itself rather
    /// than as client-side query parameters.
    pub fn query_in_url(&self) -> bool {
        self.query_in_url
    }

    /// The URL with this endpoint's own query string appended.
    ///
    /// Requests for endpoints flagged with [`Endpoint::query_in_url`] are
    /// sent to this URL verbatim; the authorization flow relies on it so the
    /// exact redirect target appears in the `Location` chain.
    #[must_use]
    pub fn request_url(&self) -> String {
        if self.params.is_empty() {
            return self.url.clone();
        }
        let query = self
            .params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.url, query)
    }

    /// Decode a raw response body according to the declared output format.
    ///
    /// Pure function of `(output_format, raw)`:
    /// - `None` → empty object;
    /// - `Json` → parsed object, with a non-standard `loaded(...)` wrapper
    ///   stripped first; a body that fails to parse yields an empty object
    ///   rather than an error;
    /// - `Xml` → [`DecodeError::XmlUnsupported`].
    ///
    /// # Errors
    /// Only the unsupported-format arm fails; malformed JSON does not.
    pub fn decode(&self, raw: &str) -> Result<Value, DecodeError> {
        match self.output_format {
            OutputFormat::None => Ok(Value::Object(Map::new())),
            OutputFormat::Json => {
                let body = strip_loaded_wrapper(raw);
                Ok(serde_json::from_str(body).unwrap_or_else(|_| Value::Object(Map::new())))
            }
            OutputFormat::Xml => Err(DecodeError::XmlUnsupported),
        }
    }
}

/// Some endpoints wrap their JSON in a `loaded(...)` JSONP-style shell.
fn strip_loaded_wrapper(raw: &str) -> &str {
    raw.strip_prefix("loaded(").and_then(|rest| rest.strip_suffix(')')).unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_endpoint() -> Endpoint {
        Endpoint::new("test", "https://api.test/op", HttpMethod::Get, AuthType::None, OutputFormat::Json)
    }

    #[test]
    fn decode_none_format_yields_empty_object() {
        let endpoint = Endpoint::new(
            "redirect",
            "https://api.test/op",
            HttpMethod::Get,
            AuthType::None,
            OutputFormat::None,
        );
        let decoded = endpoint.decode(r#"{"ignored":true}"#).expect("decode");
        assert_eq!(decoded, Value::Object(Map::new()));
    }

    #[test]
    fn decode_strips_loaded_wrapper() {
        let decoded = json_endpoint().decode(r#"loaded({"a":1})"#).expect("decode");
        assert_eq!(decoded["a"], 1);
    }

    #[test]
    fn decode_plain_json_passes_through() {
        let decoded = json_endpoint().decode(r#"{"a":1}"#).expect("decode");
        assert_eq!(decoded["a"], 1);
    }

    #[test]
    fn decode_invalid_json_yields_empty_object_not_error() {
        let decoded = json_endpoint().decode("not json at all").expect("decode");
        assert_eq!(decoded, Value::Object(Map::new()));
    }

    #[test]
    fn decode_is_idempotent() {
        let endpoint = json_endpoint();
        let raw = r#"loaded({"a":1,"b":[2,3]})"#;
        let first = endpoint.decode(raw).expect("decode");
        let second = endpoint.decode(raw).expect("decode");
        assert_eq!(first, second);
    }

    #[test]
    fn decode_xml_fails_explicitly() {
        let endpoint = Endpoint::new(
            "legacy",
            "https://api.test/op",
            HttpMethod::Get,
            AuthType::None,
            OutputFormat::Xml,
        );
        assert_eq!(endpoint.decode("<xml/>"), Err(DecodeError::XmlUnsupported));
    }

    #[test]
    fn request_url_appends_encoded_query() {
        let endpoint = json_endpoint().param("q", "vintage camera").param("page", "2");
        assert_eq!(endpoint.request_url(), "https://api.test/op?q=vintage%20camera&page=2");
    }

    #[test]
    fn request_url_without_params_is_bare() {
        assert_eq!(json_endpoint().request_url(), "https://api.test/op");
    }

    #[test]
    fn loaded_wrapper_requires_both_ends() {
        // A prefix without the closing paren is left alone.
        assert_eq!(strip_loaded_wrapper("loaded({\"a\":1}"), "loaded({\"a\":1}");
        assert_eq!(strip_loaded_wrapper("{\"a\":1}"), "{\"a\":1}");
    }
}
