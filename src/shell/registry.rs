//! Widget registry with isolated loading.
//!
//! The shell mounts widgets by id through loader closures registered here.
//! A loader that fails or panics marks only its own slot as failed with a
//! fallback descriptor; the other widgets are unaffected.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;

use crate::error::Error;

pub const ALERTS_CENTER_WIDGET: &str = "alerts-center";
pub const ALERT_EDITOR_WIDGET: &str = "alert-editor";
pub const SERVICE_STATUS_WIDGET: &str = "service-status";
pub const AUTH_GATE_WIDGET: &str = "auth-gate";
pub const ACCOUNT_SETTINGS_WIDGET: &str = "account-settings";
pub const CATALOG_SEARCH_WIDGET: &str = "catalog-search";

pub const KNOWN_WIDGET_IDS: [&str; 6] = [
    ALERTS_CENTER_WIDGET,
    ALERT_EDITOR_WIDGET,
    SERVICE_STATUS_WIDGET,
    AUTH_GATE_WIDGET,
    ACCOUNT_SETTINGS_WIDGET,
    CATALOG_SEARCH_WIDGET,
];

/// What a loader produces when the widget mounts successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetDescriptor {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetState {
    Pending,
    Loaded(WidgetDescriptor),
    Failed { message: String },
}

impl WidgetState {
    pub fn is_failed(&self) -> bool {
        matches!(self, WidgetState::Failed { .. })
    }
}

type WidgetLoader = Box<dyn Fn() -> Result<WidgetDescriptor, Error> + Send + Sync>;

fn fallback_message(widget_id: &str) -> String {
    format!("Widget \"{widget_id}\" failed to load")
}

#[derive(Default)]
pub struct WidgetRegistry {
    loaders: HashMap<String, WidgetLoader>,
    states: Mutex<HashMap<String, WidgetState>>,
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, widget_id: &str, loader: F)
    where
        F: Fn() -> Result<WidgetDescriptor, Error> + Send + Sync + 'static,
    {
        self.loaders.insert(widget_id.to_string(), Box::new(loader));
    }

    pub fn is_registered(&self, widget_id: &str) -> bool {
        self.loaders.contains_key(widget_id)
    }

    /// `Pending` until [`load`](Self::load) has been called for the id
    pub fn state(&self, widget_id: &str) -> WidgetState {
        self.states
            .lock()
            .unwrap()
            .get(widget_id)
            .cloned()
            .unwrap_or(WidgetState::Pending)
    }

    /// Run the loader for `widget_id` and record the outcome.
    ///
    /// An unregistered id, a loader error and a loader panic all resolve to
    /// `Failed` with the fallback message; panics are contained here.
    pub fn load(&self, widget_id: &str) -> WidgetState {
        let state = match self.loaders.get(widget_id) {
            Some(loader) => match catch_unwind(AssertUnwindSafe(loader)) {
                Ok(Ok(descriptor)) => WidgetState::Loaded(descriptor),
                Ok(Err(err)) => {
                    log::error!("failed to load widget \"{}\": {}", widget_id, err);
                    WidgetState::Failed {
                        message: fallback_message(widget_id),
                    }
                }
                Err(_) => {
                    log::error!("widget \"{}\" panicked while loading", widget_id);
                    WidgetState::Failed {
                        message: fallback_message(widget_id),
                    }
                }
            },
            None => {
                log::error!("no loader registered for widget \"{}\"", widget_id);
                WidgetState::Failed {
                    message: fallback_message(widget_id),
                }
            }
        };
        self.states
            .lock()
            .unwrap()
            .insert(widget_id.to_string(), state.clone());
        state
    }

    pub fn load_all(&self) -> Vec<(String, WidgetState)> {
        let mut ids: Vec<&String> = self.loaders.keys().collect();
        ids.sort();
        ids.into_iter()
            .map(|id| (id.clone(), self.load(id)))
            .collect()
    }
}
