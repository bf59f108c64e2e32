//! Service-status probing for the three backend microservices

mod poller;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::fetch::Fetch;

pub use poller::*;

const DEFAULT_STATUS_PATH: &str = "/system/status";

/// Health reported by a service about itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceState {
    Up,
    Degraded,
    Down,
}

/// One backend endpoint the status panel watches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTarget {
    pub id: String,
    pub label: String,
    pub base_url: String,
    pub status_path: Option<String>,
}

impl StatusTarget {
    pub fn new(id: &str, label: &str, base_url: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            base_url: base_url.to_string(),
            status_path: None,
        }
    }

    fn status_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url,
            self.status_path.as_deref().unwrap_or(DEFAULT_STATUS_PATH)
        )
    }
}

/// Body of a `/system/status` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatusResponse {
    pub service_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub state: ServiceState,
    pub checked_at: String,
    pub uptime_seconds: f64,
}

/// Where a target's most recent probe stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Idle,
    Loading,
    Success,
    Error,
}

/// Latest known status for one target
#[derive(Debug, Clone)]
pub struct ServiceStatusEntry {
    pub target: StatusTarget,
    pub state: ProbeState,
    pub service_state: Option<ServiceState>,
    pub response: Option<ServiceStatusResponse>,
    pub error: Option<String>,
    pub last_checked: Option<DateTime<Utc>>,
}

impl ServiceStatusEntry {
    fn idle(target: StatusTarget) -> Self {
        Self {
            target,
            state: ProbeState::Idle,
            service_state: None,
            response: None,
            error: None,
            last_checked: None,
        }
    }
}

/// Seam between the poller and the network, so the loop can be driven by a
/// fake in tests
#[async_trait]
pub trait StatusProbe: Send + Sync {
    async fn probe(&self, target: &StatusTarget) -> Result<ServiceStatusResponse, Error>;
}

/// Probes targets over HTTP; status endpoints are public, so no bearer
/// token is attached
pub struct StatusClient {
    client: Client,
}

impl StatusClient {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusProbe for StatusClient {
    async fn probe(&self, target: &StatusTarget) -> Result<ServiceStatusResponse, Error> {
        Fetch::get(&self.client, &target.status_url()).execute().await
    }
}
