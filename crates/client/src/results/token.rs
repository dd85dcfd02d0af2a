//! Token endpoint result mappings.

use serde_json::Value;

use super::{lenient_i64, lenient_str, ApiResult, ResultState};

/// Response of the refresh-token exchange.
#[derive(Debug, Clone, Default)]
pub struct RefreshTokenResult {
    state: ResultState,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Option<i64>,
}

impl ApiResult for RefreshTokenResult {
    fn state(&self) -> &ResultState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ResultState {
        &mut self.state
    }

    fn map_values(&mut self, payload: &Value) {
        self.access_token = lenient_str(payload.get("access_token")).unwrap_or_default();
        self.token_type = lenient_str(payload.get("token_type")).unwrap_or_default();
        self.expires_in = lenient_i64(payload.get("expires_in"));
    }
}

/// Response of the authorization-code exchange. Unlike a refresh, this
/// grant also returns a refresh token and an ID token.
#[derive(Debug, Clone, Default)]
pub struct AcquireTokenResult {
    state: ResultState,
    pub access_token: String,
    pub refresh_token: String,
    pub id_token: String,
    pub token_type: String,
    pub expires_in: Option<i64>,
}

impl ApiResult for AcquireTokenResult {
    fn state(&self) -> &ResultState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ResultState {
        &mut self.state
    }

    fn map_values(&mut self, payload: &Value) {
        self.access_token = lenient_str(payload.get("access_token")).unwrap_or_default();
        self.refresh_token = lenient_str(payload.get("refresh_token")).unwrap_or_default();
        self.id_token = lenient_str(payload.get("id_token")).unwrap_or_default();
        self.token_type = lenient_str(payload.get("token_type")).unwrap_or_default();
        self.expires_in = lenient_i64(payload.get("expires_in"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn refresh_result_maps_fields() {
        let mut result = RefreshTokenResult::default();
        result.set(&json!({
            "access_token": "AT2",
            "token_type": "Bearer",
            "expires_in": "3600"
        }));
        assert!(result.is_success());
        assert_eq!(result.access_token, "AT2");
        assert_eq!(result.token_type, "Bearer");
        assert_eq!(result.expires_in, Some(3600));
    }

    #[test]
    fn acquire_result_maps_refresh_and_id_tokens() {
        let mut result = AcquireTokenResult::default();
        result.set(&json!({
            "access_token": "AT1",
            "refresh_token": "RT1",
            "id_token": "ID1",
            "token_type": "Bearer",
            "expires_in": 3600
        }));
        assert!(result.is_success());
        assert_eq!(result.refresh_token, "RT1");
        assert_eq!(result.id_token, "ID1");
    }

    #[test]
    fn missing_fields_stay_empty() {
        let mut result = RefreshTokenResult::default();
        result.set(&json!({}));
        assert!(result.access_token.is_empty());
        assert_eq!(result.expires_in, None);
    }
}
