//! Price-alerts service client

mod tracker;
mod types;

use reqwest::Client;

use crate::auth::TokenStore;
use crate::error::Error;
use crate::fetch::Fetch;

pub use tracker::*;
pub use types::*;

/// Client for the alerts service; every call carries the bearer token
pub struct AlertsClient {
    base_url: String,
    client: Client,
    tokens: TokenStore,
}

impl AlertsClient {
    pub(crate) fn new(base_url: &str, client: Client, tokens: TokenStore) -> Self {
        Self {
            base_url: crate::config::api_base(base_url),
            client,
            tokens,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn token(&self) -> Option<String> {
        self.tokens.get()
    }

    /// Fetch every alert for the signed-in user.
    ///
    /// The service has answered with both a bare array and a `{content: []}`
    /// page wrapper across versions; both are accepted, anything else is an
    /// empty list.
    pub async fn list(&self) -> Result<Vec<AlertResponse>, Error> {
        let value: serde_json::Value = Fetch::get(&self.client, &self.endpoint("/alerts"))
            .maybe_bearer_auth(self.token().as_deref())
            .execute()
            .await?;
        Ok(normalize_alert_list(value))
    }

    /// Server-side alert search
    pub async fn search(
        &self,
        q: Option<&str>,
        page: Option<u32>,
        size: Option<u32>,
    ) -> Result<serde_json::Value, Error> {
        let mut request = Fetch::get(&self.client, &self.endpoint("/alerts/search"))
            .maybe_bearer_auth(self.token().as_deref());
        if let Some(q) = q {
            request = request.query("q", q);
        }
        if let Some(page) = page {
            request = request.query("page", page);
        }
        if let Some(size) = size {
            request = request.query("size", size);
        }
        request.execute().await
    }

    pub async fn get(&self, product_id: &str) -> Result<AlertResponse, Error> {
        Fetch::get(&self.client, &self.endpoint(&format!("/alerts/{}", product_id)))
            .maybe_bearer_auth(self.token().as_deref())
            .execute()
            .await
    }

    pub async fn create(&self, request: &AlertCreateRequest) -> Result<AlertResponse, Error> {
        Fetch::post(&self.client, &self.endpoint("/alerts"))
            .maybe_bearer_auth(self.token().as_deref())
            .json(request)?
            .execute()
            .await
    }

    pub async fn update(
        &self,
        product_id: &str,
        request: &AlertUpdateRequest,
    ) -> Result<AlertResponse, Error> {
        Fetch::put(&self.client, &self.endpoint(&format!("/alerts/{}", product_id)))
            .maybe_bearer_auth(self.token().as_deref())
            .json(request)?
            .execute()
            .await
    }

    pub async fn remove(&self, product_id: &str) -> Result<(), Error> {
        Fetch::delete(&self.client, &self.endpoint(&format!("/alerts/{}", product_id)))
            .maybe_bearer_auth(self.token().as_deref())
            .execute_empty()
            .await
    }
}

fn normalize_alert_list(value: serde_json::Value) -> Vec<AlertResponse> {
    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("content") {
            Some(serde_json::Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };
    items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn alert_json(product_id: &str) -> serde_json::Value {
        json!({
            "productId": product_id,
            "userId": "u1",
            "productName": "Pegasus 41",
            "status": "ACTIVE"
        })
    }

    #[test]
    fn accepts_bare_array() {
        let alerts = normalize_alert_list(json!([alert_json("p1"), alert_json("p2")]));
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].product_id, "p1");
    }

    #[test]
    fn accepts_page_wrapper() {
        let alerts = normalize_alert_list(json!({"content": [alert_json("p1")], "totalElements": 1}));
        assert_eq!(alerts.len(), 1);
    }

    #[test]
    fn unknown_shapes_become_empty() {
        assert!(normalize_alert_list(json!({"items": []})).is_empty());
        assert!(normalize_alert_list(json!("nope")).is_empty());
        assert!(normalize_alert_list(serde_json::Value::Null).is_empty());
    }
}
