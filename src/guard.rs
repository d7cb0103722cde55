use tracing::warn;

use crate::client::ServerClient;
use crate::error::LockError;
use crate::lock::Lock;

/// An opt-in RAII convenience around [`Lock`].
///
/// The core [`Lock`] type is intentionally not self-releasing — see its
/// docs. `LockGuard` exists for callers who want scope-based cleanup, but
/// because `unlock` is an async network round trip, it cannot run inside a
/// synchronous [`Drop`] impl without risking blocking the async runtime.
/// Rather than reproduce that hazard, `LockGuard::drop` only warns if the
/// guard is dropped still holding a lock; it never attempts a synchronous
/// unlock. Callers that need a guaranteed release should call
/// [`LockGuard::release`] explicitly.
pub struct LockGuard<'a, C: ServerClient> {
    lock: Option<Lock<'a, C>>,
}

impl<'a, C: ServerClient> LockGuard<'a, C> {
    pub fn new(lock: Lock<'a, C>) -> Self {
        LockGuard { lock: Some(lock) }
    }

    pub fn lock(&self) -> &Lock<'a, C> {
        self.lock
            .as_ref()
            .expect("LockGuard::lock called after release")
    }

    pub fn lock_mut(&mut self) -> &mut Lock<'a, C> {
        self.lock
            .as_mut()
            .expect("LockGuard::lock_mut called after release")
    }

    /// Release the held lock, consuming the guard.
    pub async fn release(mut self) -> Result<(), LockError> {
        let lock = self.lock.take().expect("LockGuard released twice");
        lock.unlock().await
    }
}

impl<C: ServerClient> Drop for LockGuard<'_, C> {
    fn drop(&mut self) {
        if self.lock.is_some() {
            warn!("LockGuard dropped without calling release(); lock will expire on its own");
        }
    }
}
