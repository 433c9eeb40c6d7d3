//! # Security monitor
//!
//! Detects a session record swapped out from under a running page. While a
//! guarded view is granted, [`SecurityMonitor::run`] polls the session store and
//! compares the stored session id with the one captured when the view rendered.
//!
//! - Logout flag set: a sign-out or an ordinary expiry is clearing state, stop
//!   quietly.
//! - Same id: keep polling.
//! - Different or missing id: raise the alert, wait the emergency delay, clear
//!   the session and report [`MonitorExit::Tampered`] so the caller redirects to
//!   login.
//!
//! Cancellation is by dropping the future. The Dioxus task running it is owned by
//! the guarded view, so unmounting the view stops both the poll and a pending
//! emergency sign-out.

use std::time::Duration;

use store::{GuardConfig, SessionStore, Storage};

use crate::guard::{login_path, Redirect};
use crate::time::sleep;

/// Result of one comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Intact,
    LoggingOut,
    Tampered { found: Option<String> },
}

/// Compare the stored session id with `expected_id`.
pub fn check<S: Storage>(sessions: &SessionStore<S>, expected_id: &str) -> Verdict {
    if sessions.logout_in_progress() {
        return Verdict::LoggingOut;
    }
    match sessions.get_session() {
        Some(record) if record.session_id == expected_id => Verdict::Intact,
        other => Verdict::Tampered {
            found: other.map(|r| r.session_id),
        },
    }
}

/// Why [`SecurityMonitor::run`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitorExit {
    /// A sign-out started; nothing was touched.
    LoggingOut,
    /// The session was replaced and has been cleared.
    Tampered,
}

impl MonitorExit {
    /// Navigation the hosting view performs once the monitor returns.
    pub fn redirect(self) -> Option<Redirect> {
        match self {
            MonitorExit::LoggingOut => None,
            MonitorExit::Tampered => Some(Redirect::to_login(login_path(None))),
        }
    }
}

/// Polling tamper detector for one granted session.
#[derive(Clone, Debug)]
pub struct SecurityMonitor<S> {
    sessions: SessionStore<S>,
    expected_id: String,
    poll_interval: Duration,
    emergency_delay: Duration,
}

impl<S: Storage> SecurityMonitor<S> {
    pub fn new(sessions: SessionStore<S>, expected_id: impl Into<String>, config: &GuardConfig) -> Self {
        Self {
            sessions,
            expected_id: expected_id.into(),
            poll_interval: config.poll_interval(),
            emergency_delay: config.emergency_delay(),
        }
    }

    /// Override the timings, mostly for tests.
    pub fn with_timings(mut self, poll_interval: Duration, emergency_delay: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.emergency_delay = emergency_delay;
        self
    }

    /// Poll until a sign-out starts or tampering is detected. `on_alert` runs
    /// once, when tampering is first seen, before the emergency delay.
    pub async fn run(self, mut on_alert: impl FnMut()) -> MonitorExit {
        loop {
            sleep(self.poll_interval).await;

            match check(&self.sessions, &self.expected_id) {
                Verdict::Intact => continue,
                Verdict::LoggingOut => {
                    tracing::debug!("Sign-out in progress, stopping session monitor");
                    return MonitorExit::LoggingOut;
                }
                Verdict::Tampered { found } => {
                    tracing::warn!(
                        "Session {} was replaced by {:?}, forcing sign-out",
                        self.expected_id,
                        found
                    );
                    on_alert();
                    break;
                }
            }
        }

        sleep(self.emergency_delay).await;
        if self.sessions.logout_in_progress() {
            return MonitorExit::LoggingOut;
        }
        self.sessions.clear_session();
        MonitorExit::Tampered
    }
}
