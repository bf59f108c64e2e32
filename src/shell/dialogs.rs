//! Auth dialog state machine.
//!
//! The shell shows at most one auth-related dialog at a time, so the state
//! is a single enum with explicit transitions instead of a set of open
//! flags that could disagree.

use crate::redirect::VerifyOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthDialog {
    #[default]
    Closed,
    Login,
    Register,
    /// Shown right after registration while the verification email is
    /// on its way
    VerifyNotice {
        email: String,
    },
    /// Outcome of a verification redirect
    VerifyResult(VerifyOutcome),
    /// Sticky until acknowledged; only a new login attempt may replace it
    SessionTimeout,
}

impl AuthDialog {
    pub fn is_open(&self) -> bool {
        *self != AuthDialog::Closed
    }

    pub fn open_login(self) -> Self {
        AuthDialog::Login
    }

    pub fn open_register(self) -> Self {
        AuthDialog::Register
    }

    /// Registration succeeded; tell the user to check their inbox
    pub fn registered(self, email: String) -> Self {
        AuthDialog::VerifyNotice { email }
    }

    pub fn show_verify_result(self, outcome: VerifyOutcome) -> Self {
        AuthDialog::VerifyResult(outcome)
    }

    /// The session expired out from under the user. Replaces whatever was
    /// showing.
    pub fn session_timed_out(self) -> Self {
        AuthDialog::SessionTimeout
    }

    /// Closes everything except the timeout notice, which has to be
    /// acknowledged explicitly
    pub fn close(self) -> Self {
        match self {
            AuthDialog::SessionTimeout => AuthDialog::SessionTimeout,
            _ => AuthDialog::Closed,
        }
    }

    pub fn acknowledge_timeout(self) -> Self {
        match self {
            AuthDialog::SessionTimeout => AuthDialog::Closed,
            other => other,
        }
    }
}
