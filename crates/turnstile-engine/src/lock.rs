//! The exclusivity token: the one lock serializing world-state access.
//!
//! The scheduler takes it for every unit of work and releases it right
//! after. Out-of-band readers take it only long enough to copy out what
//! they need.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use crate::world_core::WorldCore;

/// Shared handle on the world core behind the exclusivity token.
#[derive(Clone, Debug)]
pub struct WorldLock {
    inner: Arc<Mutex<WorldCore>>,
}

impl WorldLock {
    /// Put `core` behind the token.
    pub fn new(core: WorldCore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(core)),
        }
    }

    /// Take the token.
    ///
    /// A unit of work that panicked while holding the token poisons it;
    /// the guard is recovered and the world keeps running.
    pub fn lock(&self) -> MutexGuard<'_, WorldCore> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!("exclusivity token was poisoned; recovering");
            self.inner.clear_poison();
            poisoned.into_inner()
        })
    }

    /// Run `f` while holding the token.
    pub fn with<R>(&self, f: impl FnOnce(&mut WorldCore) -> R) -> R {
        f(&mut *self.lock())
    }
}
