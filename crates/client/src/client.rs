//! High-level facade over the dispatcher and auth controller.

use std::sync::Arc;

use crate::auth::AuthController;
use crate::dispatcher::RequestDispatcher;
use crate::endpoints;
use crate::results::{SearchResult, WatchListResult};

/// Entry point for API consumers.
///
/// Wraps one [`AuthController`] and one [`RequestDispatcher`]; all calls
/// share the same credential state.
pub struct Client {
    dispatcher: RequestDispatcher,
}

impl Client {
    #[must_use]
    pub fn new(auth: AuthController) -> Self {
        Self { dispatcher: RequestDispatcher::new(Arc::new(auth)) }
    }

    pub fn auth(&self) -> &Arc<AuthController> {
        self.dispatcher.auth()
    }

    /// Search auction listings.
    ///
    /// `per_page == 0` selects the upstream default page size. Extra
    /// upstream parameters (sort order, category filters) pass through
    /// `extra` untouched.
    pub async fn search(
        &self,
        query: &str,
        per_page: u32,
        page: u32,
        extra: &[(String, String)],
    ) -> SearchResult {
        let endpoint =
            endpoints::search(self.auth().config().origin(), query, per_page, page, extra);
        self.dispatcher.execute(&endpoint).await
    }

    /// Fetch the authenticated user's watch list. Arms the access token
    /// on demand and recovers from expiry transparently.
    pub async fn watch_list(&self, page: u32, extra: &[(String, String)]) -> WatchListResult {
        let endpoint = endpoints::watch_list(self.auth().config().origin(), page, extra);
        self.dispatcher.execute(&endpoint).await
    }

    /// Switch the account used for bearer-authenticated calls.
    pub async fn change_login(&self, login: impl Into<String>, password: impl Into<String>) {
        self.auth().change_login(login, password).await;
    }
}
