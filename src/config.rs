//! Configuration options for the PH-Shoes client

use std::time::Duration;

use crate::status::StatusTarget;

/// Configuration options for the PH-Shoes client
///
/// Base URLs point at the three backend microservices plus the optional
/// text-search service; when the search URL is absent the catalog URL is
/// used as a fallback, matching how the deployed shell is configured.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the catalog service
    pub catalog_base_url: String,

    /// Base URL of the alerts service
    pub alerts_base_url: String,

    /// Base URL of the user-accounts service
    pub accounts_base_url: String,

    /// Base URL of the text-search service, if deployed separately
    pub search_base_url: Option<String>,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Overrides the status targets derived from the service base URLs
    pub status_targets: Option<Vec<StatusTarget>>,
}

impl ClientOptions {
    /// Create options from the three required service base URLs
    pub fn new(catalog: &str, alerts: &str, accounts: &str) -> Self {
        Self {
            catalog_base_url: normalize_base_url(catalog),
            alerts_base_url: normalize_base_url(alerts),
            accounts_base_url: normalize_base_url(accounts),
            search_base_url: None,
            request_timeout: Some(Duration::from_secs(30)),
            status_targets: None,
        }
    }

    /// Set the text-search base URL
    pub fn with_search_base_url(mut self, value: &str) -> Self {
        self.search_base_url = Some(normalize_base_url(value));
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Replace the derived status targets
    pub fn with_status_targets(mut self, value: Vec<StatusTarget>) -> Self {
        self.status_targets = Some(value);
        self
    }

    /// Base URL used for text search, falling back to the catalog service
    pub fn effective_search_base_url(&self) -> &str {
        self.search_base_url
            .as_deref()
            .unwrap_or(&self.catalog_base_url)
    }

    /// Status targets for the service-status panel: one per backend, each
    /// probed at `{base}/api/v1/system/status`.
    pub fn status_targets(&self) -> Vec<StatusTarget> {
        if let Some(targets) = &self.status_targets {
            return targets.clone();
        }
        vec![
            StatusTarget::new("accounts", "User Accounts", &api_base(&self.accounts_base_url)),
            StatusTarget::new("catalog", "Shoe Catalog", &api_base(&self.catalog_base_url)),
            StatusTarget::new("alerts", "Alerts", &api_base(&self.alerts_base_url)),
        ]
    }
}

/// Strip trailing slashes so path joins stay predictable
pub(crate) fn normalize_base_url(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}

/// Ensure a base URL carries the `/api/v1` prefix exactly once
pub(crate) fn api_base(base: &str) -> String {
    let trimmed = normalize_base_url(base);
    if trimmed.ends_with("/api/v1") {
        trimmed
    } else {
        format!("{}/api/v1", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_trimmed() {
        let options = ClientOptions::new(
            "https://catalog.example.com//",
            "https://alerts.example.com/",
            "https://accounts.example.com",
        );
        assert_eq!(options.catalog_base_url, "https://catalog.example.com");
        assert_eq!(options.alerts_base_url, "https://alerts.example.com");
    }

    #[test]
    fn api_prefix_is_not_duplicated() {
        assert_eq!(
            api_base("https://alerts.example.com/api/v1/"),
            "https://alerts.example.com/api/v1"
        );
        assert_eq!(
            api_base("https://alerts.example.com"),
            "https://alerts.example.com/api/v1"
        );
    }

    #[test]
    fn search_falls_back_to_catalog() {
        let options = ClientOptions::new("https://catalog", "https://alerts", "https://accounts");
        assert_eq!(options.effective_search_base_url(), "https://catalog");
        let options = options.with_search_base_url("https://search/");
        assert_eq!(options.effective_search_base_url(), "https://search");
    }

    #[test]
    fn derives_one_status_target_per_service() {
        let options = ClientOptions::new("https://catalog", "https://alerts", "https://accounts");
        let targets = options.status_targets();
        let ids: Vec<_> = targets.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["accounts", "catalog", "alerts"]);
        assert_eq!(targets[1].base_url, "https://catalog/api/v1");
    }
}
