//! Wire types for the alerts service

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertStatus {
    Active,
    Triggered,
    Paused,
}

/// Server-owned alert record, keyed by `product_id` per user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertResponse {
    pub product_id: String,
    pub user_id: String,
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_original_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_current_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_if_sale: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<String>>,
    pub status: AlertStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_triggered_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertCreateRequest {
    pub product_id: String,
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
    pub product_current_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_original_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_if_sale: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertUpdateRequest {
    #[serde(flatten)]
    pub alert: AlertCreateRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_status: Option<bool>,
}

/// Minimal product reference used to open the alert editor without a full
/// catalog record in hand
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertTarget {
    pub id: String,
    pub title: String,
    pub price_sale: f64,
    pub price_original: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl From<&crate::catalog::ProductShoe> for AlertTarget {
    fn from(shoe: &crate::catalog::ProductShoe) -> Self {
        Self {
            id: shoe.id.clone(),
            title: shoe.title.clone(),
            price_sale: shoe.price_sale,
            price_original: shoe.price_original,
            brand: Some(shoe.brand.clone()),
            image: shoe.image.clone(),
            product_image_url: None,
            url: Some(shoe.url.clone()),
        }
    }
}
