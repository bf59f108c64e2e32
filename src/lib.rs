//! PH-Shoes Client Library
//!
//! A headless Rust client for the PH-Shoes storefront services, providing
//! catalog search, price alerts, user accounts and service-status probing,
//! plus the async controllers the widget shell drives its UI from.

pub mod alerts;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod redirect;
pub mod search;
pub mod shell;
pub mod status;

use std::sync::Arc;

use reqwest::Client;

use crate::alerts::{AlertsClient, AlertsTracker};
use crate::auth::{AccountsClient, SessionController, TokenStore};
use crate::catalog::{CatalogClient, TextSearchClient};
use crate::config::ClientOptions;
use crate::search::{LayoutMode, SearchControls};
use crate::status::{StatusClient, StatusPoller};

/// The main entry point for the PH-Shoes client
pub struct PhShoes {
    /// HTTP client shared by all service clients
    pub http_client: Client,
    /// Client options
    pub options: ClientOptions,
    tokens: TokenStore,
    accounts: Arc<AccountsClient>,
    alerts: Arc<AlertsClient>,
    catalog: CatalogClient,
    text_search: TextSearchClient,
    status: Arc<StatusClient>,
}

impl PhShoes {
    /// Create a client from the three backend service URLs
    ///
    /// # Example
    ///
    /// ```
    /// use ph_shoes_client::PhShoes;
    ///
    /// let shoes = PhShoes::new(
    ///     "https://catalog.ph-shoes.example.com",
    ///     "https://alerts.ph-shoes.example.com",
    ///     "https://accounts.ph-shoes.example.com",
    /// );
    /// ```
    pub fn new(catalog_url: &str, alerts_url: &str, accounts_url: &str) -> Self {
        Self::new_with_options(ClientOptions::new(catalog_url, alerts_url, accounts_url))
    }

    /// Create a client with custom options
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use ph_shoes_client::{config::ClientOptions, PhShoes};
    ///
    /// let options = ClientOptions::new(
    ///     "https://catalog.ph-shoes.example.com",
    ///     "https://alerts.ph-shoes.example.com",
    ///     "https://accounts.ph-shoes.example.com",
    /// )
    /// .with_request_timeout(Some(Duration::from_secs(10)));
    /// let shoes = PhShoes::new_with_options(options);
    /// ```
    pub fn new_with_options(options: ClientOptions) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        // Builder construction only fails on TLS backend misconfiguration.
        let http_client = builder.build().unwrap_or_default();

        let tokens = TokenStore::new();
        let accounts = Arc::new(AccountsClient::new(
            &options.accounts_base_url,
            http_client.clone(),
            tokens.clone(),
        ));
        let alerts = Arc::new(AlertsClient::new(
            &options.alerts_base_url,
            http_client.clone(),
            tokens.clone(),
        ));
        let catalog = CatalogClient::new(&options.catalog_base_url, http_client.clone());
        let text_search =
            TextSearchClient::new(options.effective_search_base_url(), http_client.clone());
        let status = Arc::new(StatusClient::new(http_client.clone()));

        Self {
            http_client,
            options,
            tokens,
            accounts,
            alerts,
            catalog,
            text_search,
            status,
        }
    }

    /// Token store backing authenticated requests
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// User-accounts service client
    pub fn accounts(&self) -> &Arc<AccountsClient> {
        &self.accounts
    }

    /// Alerts service client
    pub fn alerts(&self) -> &Arc<AlertsClient> {
        &self.alerts
    }

    /// Catalog service client
    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    /// AI text-search client
    pub fn text_search(&self) -> &TextSearchClient {
        &self.text_search
    }

    /// Raw status client; usually consumed through [`status_poller`](Self::status_poller)
    pub fn status(&self) -> &Arc<StatusClient> {
        &self.status
    }

    /// Session controller over the accounts client. Call
    /// [`SessionController::start`] to restore an existing session.
    pub fn session_controller(&self) -> Arc<SessionController> {
        SessionController::new(self.accounts.clone())
    }

    /// Search state controller for the given layout
    pub fn search_controls(&self, layout: LayoutMode) -> Arc<SearchControls> {
        SearchControls::new(layout)
    }

    /// Alerts tracker; `enabled` typically mirrors whether a user is
    /// signed in
    pub fn alerts_tracker(&self, enabled: bool) -> AlertsTracker {
        AlertsTracker::new(self.alerts.clone(), enabled)
    }

    /// Status poller over the configured status targets
    pub fn status_poller(&self) -> Arc<StatusPoller> {
        StatusPoller::new(self.status.clone(), self.options.status_targets())
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::PhShoes;
}
