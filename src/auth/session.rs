//! Session lifecycle: login/logout state and client-side expiry scheduling

use std::sync::{Arc, Mutex, Weak};
use std::time::SystemTime;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::error::Error;

use super::{decode_jwt_expiry, AccountsClient};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    User,
    SessionTimeout,
}

/// Observable authentication state
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub user: Option<AuthUser>,
    pub loading: bool,
    pub error: Option<String>,
    pub logout_reason: Option<LogoutReason>,
}

impl SessionSnapshot {
    fn initial() -> Self {
        Self {
            user: None,
            loading: true,
            error: None,
            logout_reason: None,
        }
    }

    fn signed_out() -> Self {
        Self {
            user: None,
            loading: false,
            error: None,
            logout_reason: None,
        }
    }
}

/// Tracks who is signed in and schedules a timer to fire at the stored
/// token's decoded expiry.
///
/// A token without a decodable `exp` claim is treated as non-expiring: no
/// timer runs and only an explicit logout ends the session locally.
pub struct SessionController {
    accounts: Arc<AccountsClient>,
    state_tx: watch::Sender<SessionSnapshot>,
    state_rx: watch::Receiver<SessionSnapshot>,
    expiry_timer: Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    pub fn new(accounts: Arc<AccountsClient>) -> Arc<Self> {
        let (state_tx, state_rx) = watch::channel(SessionSnapshot::initial());
        Arc::new(Self {
            accounts,
            state_tx,
            state_rx,
            expiry_timer: Mutex::new(None),
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state_rx.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state_rx.borrow().clone()
    }

    /// Settle the initial state from any stored token.
    ///
    /// A present token schedules the expiry timer and is validated with a
    /// profile fetch; a failed fetch settles as signed-out without surfacing
    /// an error, since only login attempts report errors.
    pub async fn start(self: &Arc<Self>) {
        let token = match self.accounts.tokens().get() {
            Some(token) => token,
            None => {
                self.state_tx.send_replace(SessionSnapshot::signed_out());
                return;
            }
        };
        self.schedule_expiry(&token);
        match self.accounts.fetch_me().await {
            Ok(me) => {
                self.state_tx.send_modify(|state| {
                    state.user = Some(AuthUser { email: me.email });
                    state.loading = false;
                    state.error = None;
                });
            }
            Err(err) => {
                log::debug!("stored token rejected by profile fetch: {}", err);
                self.state_tx.send_modify(|state| {
                    // Keep any session-timeout flag the timer may have set
                    // while the fetch was in flight.
                    state.user = None;
                    state.loading = false;
                    state.error = None;
                });
            }
        }
    }

    pub async fn login(self: &Arc<Self>, email: &str, password: &str) -> Result<(), Error> {
        self.state_tx.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let result = async {
            self.accounts.login(email, password).await?;
            self.accounts.fetch_me().await
        }
        .await;

        match result {
            Ok(me) => {
                self.state_tx.send_replace(SessionSnapshot {
                    user: Some(AuthUser { email: me.email }),
                    loading: false,
                    error: None,
                    logout_reason: None,
                });
                if let Some(token) = self.accounts.tokens().get() {
                    self.schedule_expiry(&token);
                }
                Ok(())
            }
            Err(err) => {
                let message = err.user_message();
                self.state_tx.send_replace(SessionSnapshot {
                    user: None,
                    loading: false,
                    error: Some(message),
                    logout_reason: None,
                });
                Err(err)
            }
        }
    }

    /// End the session.
    ///
    /// A user-initiated logout notifies the backend but always succeeds
    /// locally; a session-timeout logout skips the backend entirely since
    /// the token is already dead server-side.
    pub async fn logout(&self, reason: LogoutReason) {
        if reason == LogoutReason::SessionTimeout {
            self.handle_session_timeout();
            return;
        }
        self.state_tx.send_modify(|state| state.loading = true);
        if let Err(err) = self.accounts.logout().await {
            log::warn!("backend logout failed, clearing session anyway: {}", err);
        }
        self.clear_expiry_timer();
        self.state_tx.send_replace(SessionSnapshot::signed_out());
    }

    /// Dismiss the session-expired prompt
    pub fn acknowledge_session_timeout(&self) {
        if self.snapshot().logout_reason != Some(LogoutReason::SessionTimeout) {
            return;
        }
        self.clear_expiry_timer();
        self.state_tx
            .send_modify(|state| state.logout_reason = None);
    }

    /// (Re)schedule the expiry timer for a token; an already-expired token
    /// times the session out immediately
    fn schedule_expiry(self: &Arc<Self>, token: &str) {
        self.clear_expiry_timer();
        let expiry = match decode_jwt_expiry(token) {
            Some(expiry) => expiry,
            None => return,
        };
        let delay = expiry
            .duration_since(SystemTime::now())
            .unwrap_or(Duration::ZERO);
        if delay.is_zero() {
            self.handle_session_timeout();
            return;
        }
        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            if let Some(controller) = weak.upgrade() {
                controller.handle_session_timeout();
            }
        });
        *self.expiry_timer.lock().unwrap() = Some(handle);
    }

    fn handle_session_timeout(&self) {
        self.accounts.tokens().clear();
        self.state_tx.send_replace(SessionSnapshot {
            user: None,
            loading: false,
            error: None,
            logout_reason: Some(LogoutReason::SessionTimeout),
        });
    }

    fn clear_expiry_timer(&self) {
        if let Some(handle) = self.expiry_timer.lock().unwrap().take() {
            handle.abort();
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.clear_expiry_timer();
    }
}
