//! # API crate — the marketplace client's view of the hosted backend
//!
//! Everything that talks to the backend-as-a-service lives here, together with
//! the session rules that depend on those calls. The UI crate only ever sees the
//! [`Backend`] trait, so the same guard logic runs against the real REST service
//! in the browser and against [`testing::FakeBackend`] in tests.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`backend`] | The [`Backend`] trait, [`AuthSession`] and [`SignUp`] |
//! | [`rest`] | [`RestBackend`], the reqwest client for the auth and table endpoints |
//! | [`config`] | [`ClientConfig`]: BaaS URL, anon key, payment publishable key |
//! | [`models`] | [`UserProfile`] and its [`ApprovalStatus`] |
//! | [`session`] | `sign_in`, `sign_up`, `sign_out`, `reconcile_auth_session` |
//! | [`validator`] | [`SessionValidator`]: cached-role reconciliation with a cache window |
//! | [`error`] | [`ApiError`] |

pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod rest;
pub mod session;
pub mod validator;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::{AuthSession, Backend, SignUp};
pub use config::ClientConfig;
pub use error::{ApiError, Result};
pub use models::{ApprovalStatus, UserProfile};
pub use rest::RestBackend;
pub use session::{reconcile_auth_session, sign_in, sign_out, sign_up, SignedIn};
pub use validator::{InvalidReason, SessionValidator, Validation, ValidationSource};
