//! Shell surface: widget registry plus the dialog state the shell owns.

mod dialogs;
mod registry;

pub use dialogs::AuthDialog;
pub use registry::{
    WidgetDescriptor, WidgetRegistry, WidgetState, ACCOUNT_SETTINGS_WIDGET, ALERTS_CENTER_WIDGET,
    ALERT_EDITOR_WIDGET, AUTH_GATE_WIDGET, CATALOG_SEARCH_WIDGET, KNOWN_WIDGET_IDS,
    SERVICE_STATUS_WIDGET,
};

use tokio::sync::watch;

use crate::redirect::{DialogEvent, UnsubscribeOutcome};

/// Dialog state published by the shell. The auth dialog and the
/// unsubscribe confirmation are independent surfaces and may be open at
/// the same time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShellState {
    pub auth_dialog: AuthDialog,
    pub unsubscribe_dialog: Option<UnsubscribeOutcome>,
}

/// Owns the widget registry and routes [`DialogEvent`]s from redirect
/// classification into dialog state.
pub struct Shell {
    registry: WidgetRegistry,
    state_tx: watch::Sender<ShellState>,
    state_rx: watch::Receiver<ShellState>,
}

impl Shell {
    pub fn new(registry: WidgetRegistry) -> Self {
        let (state_tx, state_rx) = watch::channel(ShellState::default());
        Self {
            registry,
            state_tx,
            state_rx,
        }
    }

    pub fn registry(&self) -> &WidgetRegistry {
        &self.registry
    }

    pub fn state(&self) -> ShellState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ShellState> {
        self.state_rx.clone()
    }

    pub fn apply_events(&self, events: Vec<DialogEvent>) {
        for event in events {
            self.apply_event(event);
        }
    }

    pub fn apply_event(&self, event: DialogEvent) {
        match event {
            DialogEvent::Verify(outcome) => self.update_auth(|dialog| {
                dialog.show_verify_result(outcome.clone())
            }),
            DialogEvent::Unsubscribe(outcome) => self.state_tx.send_modify(|state| {
                state.unsubscribe_dialog = Some(outcome.clone());
            }),
        }
    }

    pub fn open_login(&self) {
        self.update_auth(AuthDialog::open_login);
    }

    pub fn open_register(&self) {
        self.update_auth(AuthDialog::open_register);
    }

    pub fn registered(&self, email: &str) {
        let email = email.to_string();
        self.update_auth(move |dialog| dialog.registered(email.clone()));
    }

    pub fn close_auth_dialog(&self) {
        self.update_auth(AuthDialog::close);
    }

    pub fn notify_session_timeout(&self) {
        self.update_auth(AuthDialog::session_timed_out);
    }

    pub fn acknowledge_session_timeout(&self) {
        self.update_auth(AuthDialog::acknowledge_timeout);
    }

    pub fn close_unsubscribe_dialog(&self) {
        self.state_tx.send_modify(|state| {
            state.unsubscribe_dialog = None;
        });
    }

    fn update_auth(&self, transition: impl Fn(AuthDialog) -> AuthDialog) {
        self.state_tx.send_modify(|state| {
            state.auth_dialog = transition(state.auth_dialog.clone());
        });
    }
}
