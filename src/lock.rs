use crate::client::ServerClient;
use crate::error::LockError;
use crate::manager::LockManager;
use crate::resource::Resource;
use crate::value::now_ms;

/// A held lease, returned by a successful [`LockManager::acquire`].
///
/// Immutable except for `expiration`/`attempts`, both of which are updated
/// in place by a successful [`Lock::extend`] — the same handle stays valid
/// across an extend rather than being replaced, so callers may hold a
/// single `&mut Lock` for its whole lifetime.
///
/// A `Lock` does not release itself on drop: expiration is the safety net,
/// drift is the safety margin, but callers that want a guaranteed unlock
/// must call [`Lock::unlock`] explicitly (see [`crate::LockGuard`] for an
/// opt-in RAII convenience).
#[derive(Debug)]
pub struct Lock<'a, C: ServerClient> {
    pub(crate) manager: &'a LockManager<C>,
    pub(crate) resource: Resource,
    pub(crate) value: String,
    pub(crate) expiration: i64,
    pub(crate) attempts: u32,
}

impl<'a, C: ServerClient> Lock<'a, C> {
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// The opaque per-acquisition token. Never reused across acquisitions.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Wall-clock milliseconds at which this lease is no longer guaranteed
    /// held.
    pub fn expiration(&self) -> i64 {
        self.expiration
    }

    /// 1-based count of rounds used by the most recent successful
    /// acquire/extend.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether `expiration` has already passed. A stale lock can still be
    /// unlocked (best-effort, for cleanliness) but no longer carries
    /// correctness weight, and cannot be extended.
    pub fn is_stale(&self) -> bool {
        self.expiration <= now_ms()
    }

    /// Release this lock. Consumes `self`: a released `Lock` cannot be
    /// released or extended again, which the type system now enforces.
    pub async fn unlock(self) -> Result<(), LockError> {
        self.manager.release(&self).await
    }

    /// Extend this lock's lease by `ttl_ms`, mutating `expiration` and
    /// `attempts` in place on success.
    pub async fn extend(&mut self, ttl_ms: u64) -> Result<(), LockError> {
        self.manager.extend(self, ttl_ms).await
    }
}
