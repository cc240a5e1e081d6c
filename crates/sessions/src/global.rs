//! Process-wide session store for embedders without an owning root object.
//!
//! Prefer constructing one [`SessionStore`] and passing it down (the
//! `lv-app` crate keeps it in `AppState`).  These accessors exist for call
//! sites that cannot be handed a reference.

use std::sync::{Arc, OnceLock};

use lv_domain::config::Config;

use crate::clock::SystemClock;
use crate::storage::OpenedStore;
use crate::store::SessionStore;

static SHARED: OnceLock<SessionStore> = OnceLock::new();

/// The process-wide store, built by `init` on first call.
///
/// Concurrent first callers block until one `init` has finished and all
/// observe the same instance.  Later calls ignore `init`.
pub fn shared_or_init(init: impl FnOnce() -> SessionStore) -> &'static SessionStore {
    SHARED.get_or_init(init)
}

/// The process-wide store opened from `config`.
///
/// If not even the plaintext tier can be set up, the store lives in memory
/// for the rest of the process.
pub fn shared_store(config: &Config) -> &'static SessionStore {
    shared_or_init(|| match SessionStore::open(config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "session storage unavailable, keeping session in memory");
            SessionStore::new(OpenedStore::memory(), &config.session, Arc::new(SystemClock))
        }
    })
}

/// The process-wide store, if it has been created.
pub fn try_shared() -> Option<&'static SessionStore> {
    SHARED.get()
}
