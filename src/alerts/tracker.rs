//! Cached alerts list with optimistic local updates

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::Error;

use super::{AlertCreateRequest, AlertResponse, AlertStatus, AlertUpdateRequest, AlertsClient};

/// Observable snapshot of the alerts cache
#[derive(Debug, Clone, Default)]
pub struct AlertsState {
    pub alerts: Vec<AlertResponse>,
    pub loading: bool,
    pub error: Option<String>,
}

/// CRUD cache over the alerts list.
///
/// Mutations merge the server's response into the local list instead of
/// refetching; the server record is authoritative for the entry it returns.
/// The tracker is gated by an `enabled` flag so nothing is fetched (or
/// retained) while signed out.
pub struct AlertsTracker {
    client: Arc<AlertsClient>,
    enabled: std::sync::atomic::AtomicBool,
    state_tx: watch::Sender<AlertsState>,
    state_rx: watch::Receiver<AlertsState>,
}

impl AlertsTracker {
    pub fn new(client: Arc<AlertsClient>, enabled: bool) -> Self {
        let (state_tx, state_rx) = watch::channel(AlertsState::default());
        Self {
            client,
            enabled: std::sync::atomic::AtomicBool::new(enabled),
            state_tx,
            state_rx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AlertsState> {
        self.state_rx.clone()
    }

    pub fn alerts(&self) -> Vec<AlertResponse> {
        self.state_rx.borrow().alerts.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.state_rx.borrow().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state_rx.borrow().loading
    }

    /// Count of alerts the backend has marked as triggered
    pub fn triggered_count(&self) -> usize {
        self.state_rx
            .borrow()
            .alerts
            .iter()
            .filter(|alert| alert.status == AlertStatus::Triggered)
            .count()
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(std::sync::atomic::Ordering::Relaxed)
    }

    /// Flip the authenticated gate; disabling clears the cached list
    pub async fn set_enabled(&self, enabled: bool) {
        self.enabled
            .store(enabled, std::sync::atomic::Ordering::Relaxed);
        if enabled {
            self.refresh().await;
        } else {
            self.state_tx.send_replace(AlertsState::default());
        }
    }

    /// Fetch the full list.
    ///
    /// A failed fetch records a display string but leaves the previously
    /// loaded list in place; stale data beats an empty panel on a blip.
    pub async fn refresh(&self) {
        if !self.is_enabled() {
            self.state_tx.send_replace(AlertsState::default());
            return;
        }
        self.state_tx.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
        match self.client.list().await {
            Ok(alerts) => self.state_tx.send_modify(|state| {
                state.alerts = alerts;
                state.loading = false;
            }),
            Err(err) => {
                log::warn!("failed to load alerts: {}", err);
                self.state_tx.send_modify(|state| {
                    state.error = Some(err.user_message());
                    state.loading = false;
                });
            }
        }
    }

    /// Create an alert and merge the server's record into the cache
    pub async fn create(&self, request: &AlertCreateRequest) -> Result<AlertResponse, Error> {
        let created = self.client.create(request).await?;
        self.merge(created.clone());
        Ok(created)
    }

    /// Update an alert and merge the server's record into the cache
    pub async fn update(
        &self,
        product_id: &str,
        request: &AlertUpdateRequest,
    ) -> Result<AlertResponse, Error> {
        let updated = self.client.update(product_id, request).await?;
        self.merge(updated.clone());
        Ok(updated)
    }

    /// Delete an alert; the cache entry goes away only once the backend
    /// confirms, so a failed delete leaves the list untouched
    pub async fn remove(&self, product_id: &str) -> Result<(), Error> {
        self.client.remove(product_id).await?;
        self.state_tx.send_modify(|state| {
            state.alerts.retain(|alert| alert.product_id != product_id);
        });
        Ok(())
    }

    fn merge(&self, record: AlertResponse) {
        self.state_tx.send_modify(|state| {
            match state
                .alerts
                .iter_mut()
                .find(|alert| alert.product_id == record.product_id)
            {
                Some(existing) => *existing = record,
                None => state.alerts.push(record),
            }
        });
    }
}
