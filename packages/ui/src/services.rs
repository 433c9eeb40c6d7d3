//! Injected client services.
//!
//! The backend client, the session store and the guard timings are built once at
//! startup and handed to components through Dioxus context. Components reach them
//! only through [`use_services`]; there is no process-wide static.
//!
//! Storage is chosen per platform, the same way for every consumer:
//! - **Web** (WASM + `web` feature): `window.localStorage` via [`store::LocalStorage`]
//! - **Everything else**: [`store::MemoryStorage`]

use api::{ClientConfig, RestBackend, SessionValidator};
use dioxus::prelude::*;
use store::{GuardConfig, SessionStore};

#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub type AppStorage = store::LocalStorage;
#[cfg(not(all(target_arch = "wasm32", feature = "web")))]
pub type AppStorage = store::MemoryStorage;

pub type AppBackend = RestBackend<AppStorage>;

/// Everything the auth and guard components need.
#[derive(Clone, Debug)]
pub struct Services {
    pub backend: AppBackend,
    pub sessions: SessionStore<AppStorage>,
    pub config: GuardConfig,
}

impl Services {
    pub fn new(client: ClientConfig, config: GuardConfig) -> Self {
        let storage = AppStorage::default();
        Self {
            backend: RestBackend::new(client, storage.clone()),
            sessions: SessionStore::new(storage),
            config,
        }
    }

    /// Validator using the configured cache window.
    pub fn validator(&self) -> SessionValidator<AppBackend> {
        SessionValidator::new(self.backend.clone(), self.config.cache_window())
    }
}

/// The services provided at the application root.
pub fn use_services() -> Services {
    use_context::<Services>()
}
