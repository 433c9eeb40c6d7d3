//! # Route guard core
//!
//! The decision half of [`crate::SecureRouteGuard`], free of any rendering so it
//! can be tested directly.
//!
//! ## States
//!
//! ```text
//! Validating ──► Granted
//!            ├─► RedirectDashboard("/dashboard/<role>")
//!            └─► RedirectLogin("/auth?redirect=<requested path>")
//! ```
//!
//! [`evaluate`] runs the session validator and applies its side effects on the
//! store: a stale, orphaned or expired session is cleared before redirecting to
//! login, and a server-confirmed session gets its `last_validated` bumped.
//!
//! [`GuardState::redirect`] and [`on_signed_out`] are the navigation half: what
//! the component does once a state settles, and how a granted view reacts when
//! the auth context loses its session in the background.
//!
//! ## Return paths
//!
//! The requested path travels to the login page in the `redirect` query value.
//! The router percent-decodes the whole query once before splitting it on `&`,
//! so [`login_path`] escapes the path twice and [`post_login_target`] undoes
//! the remaining layer.
//!
//! ## Re-entrancy
//!
//! [`ValidationGate`] remembers the key (policy + path) of the validation in
//! flight and of the last one that settled, so re-renders that do not change
//! either cannot start the same validation again.

use api::{Backend, InvalidReason, SessionValidator, Validation, ValidationSource};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS, NON_ALPHANUMERIC};
use store::{Role, SessionRecord, SessionStore, Storage};

/// Login route.
pub const LOGIN_PATH: &str = "/auth";

/// Everything but unreserved characters and `/`.
const RETURN_PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const PERCENT: &AsciiSet = &CONTROLS.add(b'%');

/// Who may see a guarded route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessPolicy {
    allowed: Vec<Role>,
    require_auth: bool,
}

impl AccessPolicy {
    pub fn new(allowed: impl Into<Vec<Role>>, require_auth: bool) -> Self {
        Self {
            allowed: allowed.into(),
            require_auth,
        }
    }

    /// Authenticated access for the given roles.
    pub fn roles(allowed: impl Into<Vec<Role>>) -> Self {
        Self::new(allowed, true)
    }

    /// Authenticated access for a single role.
    pub fn role(role: Role) -> Self {
        Self::new(vec![role], true)
    }

    pub fn allowed(&self) -> &[Role] {
        &self.allowed
    }

    pub fn require_auth(&self) -> bool {
        self.require_auth
    }

    /// Whether `role` passes this policy. A super admin passes wherever an
    /// admin does.
    pub fn permits(&self, role: Role) -> bool {
        self.allowed.iter().any(|required| role.satisfies(*required))
    }
}

impl From<Role> for AccessPolicy {
    fn from(role: Role) -> Self {
        AccessPolicy::role(role)
    }
}

impl From<Vec<Role>> for AccessPolicy {
    fn from(roles: Vec<Role>) -> Self {
        AccessPolicy::roles(roles)
    }
}

/// Where the guard stands for the current route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardState {
    Validating,
    /// Render the protected content. `session` is `None` only on routes that do
    /// not require authentication.
    Granted { session: Option<SessionRecord> },
    RedirectDashboard(String),
    RedirectLogin(String),
}

impl GuardState {
    pub fn is_granted(&self) -> bool {
        matches!(self, GuardState::Granted { .. })
    }

    /// Target of a redirect state.
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            GuardState::RedirectDashboard(path) | GuardState::RedirectLogin(path) => Some(path),
            _ => None,
        }
    }

    /// Navigation to perform for this state.
    pub fn redirect(&self) -> Option<Redirect> {
        match self {
            GuardState::RedirectLogin(target) => Some(Redirect::to_login(target.clone())),
            GuardState::RedirectDashboard(target) => Some(Redirect {
                target: target.clone(),
                sign_out: false,
            }),
            _ => None,
        }
    }
}

/// A navigation decided by the guard or the tamper monitor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Redirect {
    pub target: String,
    /// Drop the signed-in auth state before navigating. Set on every trip to
    /// login, so the login page cannot forward back on the dropped session.
    pub sign_out: bool,
}

impl Redirect {
    pub fn to_login(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            sign_out: true,
        }
    }
}

/// New state for a guard whose auth context just reported that nobody is
/// signed in (expired in the background, signed out in another view).
/// `None` leaves the guard as it is.
pub fn on_signed_out(state: &GuardState, policy: &AccessPolicy, path: &str) -> Option<GuardState> {
    (policy.require_auth() && state.is_granted())
        .then(|| GuardState::RedirectLogin(login_path(Some(path))))
}

/// Dashboard route for a role.
pub fn dashboard_path(role: Role) -> String {
    format!("/dashboard/{}", role.dashboard_role())
}

/// Strip query string and fragment from a route.
fn path_only(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

/// Escape `path` for the `redirect` query value.
fn encode_return_path(path: &str) -> String {
    let escaped = utf8_percent_encode(path, RETURN_PATH).to_string();
    utf8_percent_encode(&escaped, PERCENT).to_string()
}

/// Undo the escaping left on a `redirect` value after the router decoded it.
pub fn decode_return_path(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

/// Login route, optionally carrying the path to return to after sign-in.
pub fn login_path(return_to: Option<&str>) -> String {
    match return_to.map(path_only).filter(|p| is_safe_return_path(p)) {
        Some(path) if path != LOGIN_PATH => {
            format!("{LOGIN_PATH}?redirect={}", encode_return_path(path))
        }
        _ => LOGIN_PATH.to_string(),
    }
}

/// Whether a post-login redirect target stays on this origin.
pub fn is_safe_return_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

/// Where to send a freshly signed-in user: the requested path when it is a safe
/// same-origin path, otherwise the role's dashboard. `redirect` is the
/// `redirect` query value as the router hands it over.
pub fn post_login_target(redirect: Option<&str>, role: Role) -> String {
    match redirect.map(decode_return_path) {
        Some(path) if !path.is_empty() && is_safe_return_path(&path) && path_only(&path) != LOGIN_PATH => {
            path
        }
        _ => dashboard_path(role),
    }
}

/// Decide the guard outcome for `requested_path` under `policy`.
pub async fn evaluate<S: Storage, B: Backend>(
    sessions: &SessionStore<S>,
    validator: &SessionValidator<B>,
    policy: &AccessPolicy,
    requested_path: &str,
    now: i64,
) -> GuardState {
    let record = sessions.get_session();

    if !policy.require_auth() {
        return GuardState::Granted { session: record };
    }

    let verdict = validator.validate(record.as_ref(), now).await;
    let record = match (verdict, record) {
        (Validation::Valid(source), Some(record)) => {
            if source == ValidationSource::Server {
                sessions.update_last_validated(now);
            }
            record
        }
        (Validation::Invalid(InvalidReason::NoSession), _) | (Validation::Valid(_), None) => {
            tracing::debug!("No session for {requested_path}, redirecting to login");
            return GuardState::RedirectLogin(login_path(Some(requested_path)));
        }
        (Validation::Invalid(reason), _) => {
            tracing::info!("Session rejected ({reason}), clearing");
            sessions.expire_session();
            return GuardState::RedirectLogin(login_path(Some(requested_path)));
        }
    };

    if policy.permits(record.role) {
        GuardState::Granted {
            session: Some(record),
        }
    } else {
        tracing::info!(
            "Role {} may not open {requested_path}, sending to dashboard",
            record.role
        );
        GuardState::RedirectDashboard(dashboard_path(record.role))
    }
}

/// Identity of one validation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardKey {
    policy: AccessPolicy,
    path: String,
}

impl GuardKey {
    pub fn new(policy: &AccessPolicy, path: &str) -> Self {
        Self {
            policy: policy.clone(),
            path: path.to_string(),
        }
    }
}

/// Prevents re-entrant validation loops for an unchanged guard.
#[derive(Debug, Default)]
pub struct ValidationGate {
    in_flight: Option<GuardKey>,
    settled: Option<GuardKey>,
}

impl ValidationGate {
    /// Claim the right to validate `key`. Refused while the same key is in
    /// flight or has already settled.
    pub fn try_begin(&mut self, key: &GuardKey) -> bool {
        if self.in_flight.as_ref() == Some(key) || self.settled.as_ref() == Some(key) {
            return false;
        }
        self.in_flight = Some(key.clone());
        self.settled = None;
        true
    }

    /// Record that the validation for `key` finished. A result for a key that
    /// has since been superseded is ignored.
    pub fn finish(&mut self, key: &GuardKey) -> bool {
        if self.in_flight.as_ref() != Some(key) {
            return false;
        }
        self.in_flight = None;
        self.settled = Some(key.clone());
        true
    }

    /// Forget the settled key so the next request validates again.
    pub fn reset(&mut self) {
        self.in_flight = None;
        self.settled = None;
    }
}
