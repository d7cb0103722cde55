//! A quorum-based distributed lock manager implementing the Redlock
//! algorithm over a set of independent, Redis-compatible server clients.
//!
//! A caller names a [`Resource`] (one key, or a set of keys that must all
//! be locked atomically) and requests a lease of bounded duration via
//! [`LockManager::acquire`]; the returned [`Lock`] can be released
//! ([`Lock::unlock`]) or extended ([`Lock::extend`]) until it expires.
//!
//! This crate reproduces Redlock's stated guarantees, not stronger ones —
//! see the design notes on clock drift accounting and the known caveats of
//! the algorithm (it does not provide fencing tokens, persistence across
//! restart, or lock queuing/fairness).
//!
//! ```no_run
//! use std::time::Duration;
//! use redlock::{LockManager, RedisServerClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let clients = vec![
//!     RedisServerClient::open("redis://127.0.0.1:6379")?,
//!     RedisServerClient::open("redis://127.0.0.1:6380")?,
//!     RedisServerClient::open("redis://127.0.0.1:6381")?,
//! ];
//! let manager = LockManager::new(clients)?;
//!
//! let mut lock = manager.acquire("inventory:sku-42", 5_000).await?;
//! lock.extend(5_000).await?;
//! lock.unlock().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod guard;
mod lock;
mod manager;
mod resource;
mod scripts;
mod value;

pub use client::{RedisServerClient, ScriptArg, ServerClient};
pub use config::{Config, ScriptOverride};
pub use error::{ClientError, LockError};
pub use guard::LockGuard;
pub use lock::Lock;
pub use manager::{ClientErrorSink, LockManager};
pub use resource::Resource;

pub use scripts::{EXTEND_SCRIPT, LOCK_SCRIPT, UNLOCK_SCRIPT};

#[cfg(test)]
pub(crate) mod testing;
