//! Authenticated client for an auction marketplace HTTP API.
//!
//! The crate is built around three pieces:
//!
//! - [`auth::AuthController`] owns the access/refresh token pair and an
//!   escalating recovery ladder (store reload, refresh exchange,
//!   interactive browser login) that arms the access token on demand;
//! - [`dispatcher::RequestDispatcher`] executes [`endpoint::Endpoint`]
//!   descriptors, retries once-recoverable 401s, and maps every outcome
//!   into a typed [`results::ApiResult`] instead of returning errors;
//! - [`client::Client`] is the thin facade consumers hold.
//!
//! Interactive login is a trait seam
//! ([`auth::InteractiveLoginProvider`]); the `bidstream-webdriver` crate
//! ships a W3C WebDriver implementation.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bidstream_client::auth::{AuthController, MemoryCredentialStore};
//! use bidstream_client::client::Client;
//! use bidstream_client::config::AuthConfig;
//! use bidstream_client::results::ApiResult;
//!
//! # async fn run() {
//! let config = AuthConfig::new("my-client-id");
//! let auth = AuthController::new(config)
//!     .with_credential_store(Arc::new(MemoryCredentialStore::new()));
//! let client = Client::new(auth);
//!
//! let result = client.search("vintage camera", 0, 1, &[]).await;
//! if result.is_success() {
//!     for item in &result.items {
//!         println!("{} {:?}", item.title, item.current_price);
//!     }
//! }
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod endpoint;
pub mod endpoints;
pub mod error;
pub mod results;
mod source_error;

pub use auth::{AuthController, Credentials, InteractiveLoginProvider};
pub use client::Client;
pub use config::AuthConfig;
pub use dispatcher::RequestDispatcher;
pub use error::AuthError;
