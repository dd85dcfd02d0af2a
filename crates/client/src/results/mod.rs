//! Typed result objects for API responses.
//!
//! Every API call produces a result value rather than an error: the
//! dispatcher records failures inside the result's [`ResultState`] and the
//! caller inspects [`ApiResult::is_success`]. Decoded payloads are mapped
//! into typed fields by each result's [`ApiResult::map_values`].

mod search;
mod token;

pub use search::{SearchItem, SearchResult, WatchListResult};
pub use token::{AcquireTokenResult, RefreshTokenResult};

use serde_json::Value;

use crate::source_error;

/// Failure classification carried by every result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorKind {
    /// The call succeeded.
    None,
    /// No response has been recorded yet. Initial state of every result.
    #[default]
    EmptyResult,
    /// The request was malformed (HTTP 400).
    Input,
    /// Authentication failed and could not be recovered.
    Auth,
    /// The request was understood but refused (HTTP 403).
    Forbidden,
    /// The endpoint could not be reached, or returned 404 with no prior data.
    Connection,
    /// The upstream service reported an internal failure (HTTP 5xx).
    Source,
    /// The response could not be decoded into this result type.
    Result,
    /// Anything that fits no other category.
    Other,
}

/// Error state plus the raw response, embedded in every result type.
#[derive(Debug, Clone, Default)]
pub struct ResultState {
    pub error_kind: ErrorKind,
    pub error_message: String,
    pub source_error_code: Option<i64>,
    pub source_error_message: String,
    pub raw_response: String,
}

impl ResultState {
    pub fn set_error(&mut self, kind: ErrorKind, message: impl Into<String>) {
        self.error_kind = kind;
        self.error_message = message.into();
    }

    fn set_success(&mut self) {
        self.error_kind = ErrorKind::None;
        self.error_message.clear();
        self.source_error_code = None;
        self.source_error_message.clear();
    }
}

/// Behavior shared by all typed results.
///
/// Implementors supply storage for [`ResultState`] and a `map_values` that
/// pulls typed fields out of the decoded payload. The provided [`set`]
/// handles upstream error envelopes before mapping.
///
/// [`set`]: ApiResult::set
pub trait ApiResult: Default + Send {
    fn state(&self) -> &ResultState;

    fn state_mut(&mut self) -> &mut ResultState;

    /// Map the decoded payload into this result's typed fields.
    fn map_values(&mut self, payload: &Value);

    /// Ingest a decoded payload: detect an upstream `Error` envelope, set
    /// success or source-error state accordingly, then map values.
    fn set(&mut self, payload: &Value) {
        if let Some(error) = payload.get("Error") {
            let code = lenient_i64(error.get("Code"));
            let message = lenient_str(error.get("Message")).unwrap_or_default();
            let state = self.state_mut();
            state.source_error_code = code;
            state.source_error_message = code
                .and_then(source_error::message_for_code)
                .map(str::to_string)
                .unwrap_or(message);
            let code_text = code.map_or_else(|| "unknown".to_string(), |c| c.to_string());
            let summary = format!(
                "Source error: '{}'. Source error code: {}",
                state.source_error_message, code_text
            );
            state.set_error(ErrorKind::Source, summary);
        } else {
            self.state_mut().set_success();
        }
        self.map_values(payload);
    }

    fn is_success(&self) -> bool {
        self.state().error_kind == ErrorKind::None
    }

    fn is_empty(&self) -> bool {
        self.state().error_kind == ErrorKind::EmptyResult
    }
}

/// Read an integer that the upstream may serialize as a number or a string.
pub(crate) fn lenient_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub(crate) fn lenient_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Booleans arrive as true/false, 0/1, or "true"/"false" strings.
pub(crate) fn lenient_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => match s.as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn lenient_str(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
