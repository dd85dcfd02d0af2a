//! Constructors for every API operation this client speaks.
//!
//! Each function builds an immutable [`Endpoint`] with the upstream path,
//! method, authentication type, and ordered parameters baked in.

use crate::auth::AuthType;
use crate::endpoint::{Endpoint, HttpMethod, OutputFormat};
use crate::error::AuthError;

/// Default page size for search when the caller passes 0.
pub const DEFAULT_SEARCH_RESULTS: u32 = 20;

/// Auction search. App-id authenticated, JSON response.
pub fn search(origin: &str, query: &str, per_page: u32, page: u32, extra: &[(String, String)]) -> Endpoint {
    let per_page = if per_page == 0 { DEFAULT_SEARCH_RESULTS } else { per_page };
    Endpoint::new(
        "search",
        format!("{origin}/v1/search"),
        HttpMethod::Get,
        AuthType::ClientId,
        OutputFormat::Json,
    )
    .param("query", query)
    .param("output", "json")
    .param("results", per_page.to_string())
    .param("page", page.to_string())
    .extra_params(extra)
}

/// The authenticated user's watch list. Bearer authenticated, JSON
/// response; the only way to recover its 401s is the full arm ladder.
pub fn watch_list(origin: &str, page: u32, extra: &[(String, String)]) -> Endpoint {
    Endpoint::new(
        "watch_list",
        format!("{origin}/v1/watch_list"),
        HttpMethod::Get,
        AuthType::OAuth,
        OutputFormat::Json,
    )
    .param("output", "json")
    .param("page", page.to_string())
    .extra_params(extra)
}

/// OAuth authorization redirect. Unauthenticated; the response of interest
/// is a 302 with a `Location` header, not a body.
pub fn authorization(origin: &str, client_id: &str, redirect_uri: &str, state: &str) -> Endpoint {
    Endpoint::new(
        "authorization",
        format!("{origin}/yconnect/v2/authorization"),
        HttpMethod::Get,
        AuthType::None,
        OutputFormat::None,
    )
    .param("response_type", "code")
    .param("client_id", client_id)
    .param("redirect_uri", redirect_uri)
    .param("bail", "1")
    .param("scope", "openid")
    .param("state", state)
    .send_query_in_url()
}

/// Exchange an authorization code for tokens. Basic authenticated.
///
/// # Errors
/// Rejects an empty `code` or `redirect_uri` before any network traffic.
pub fn acquire_token(origin: &str, code: &str, redirect_uri: &str) -> Result<Endpoint, AuthError> {
    if code.is_empty() {
        return Err(AuthError::Config("authorization code must not be empty".into()));
    }
    if redirect_uri.is_empty() {
        return Err(AuthError::Config("redirect URI must not be empty".into()));
    }
    Ok(Endpoint::new(
        "acquire_token",
        format!("{origin}/auth/v1/token"),
        HttpMethod::Post,
        AuthType::Basic,
        OutputFormat::Json,
    )
    .param("grant_type", "authorization_code")
    .param("redirect_uri", redirect_uri)
    .param("code", code))
}

/// Exchange a refresh token for a new access token. Basic authenticated.
pub fn refresh_token(origin: &str, token: &str, extra: &[(String, String)]) -> Endpoint {
    Endpoint::new(
        "refresh_token",
        format!("{origin}/yconnect/v2/token"),
        HttpMethod::Post,
        AuthType::Basic,
        OutputFormat::Json,
    )
    .param("grant_type", "refresh_token")
    .param("refresh_token", token)
    .extra_params(extra)
}
