use thiserror::Error;

/// Errors returned from the public [`crate::LockManager`] surface.
///
/// Individual per-server failures never reach this type directly; they are
/// folded into a vote count and surfaced through the `clientError` sink
/// (see [`ClientError`]). `LockError` only represents an aggregate outcome:
/// the manager could not be constructed, or an operation failed to reach
/// quorum.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LockError {
    /// Raised at construction time; never at acquire/extend/release time.
    #[error("redlock configuration error: {0}")]
    Configuration(String),

    /// Acquire or extend exhausted all rounds without reaching quorum.
    #[error("could not reach quorum after {attempts} attempt(s)")]
    Unavailable { attempts: u32 },

    /// Extend on a stale or mismatched lock, or unlock that did not reach
    /// quorum. `attempts` is 0 for a stale/mismatched extend and 1 for a
    /// failed unlock.
    #[error("lock is not held by this value (attempts: {attempts})")]
    NotOwned { attempts: u32 },
}

impl LockError {
    pub fn attempts(&self) -> u32 {
        match self {
            LockError::Configuration(_) => 0,
            LockError::Unavailable { attempts } | LockError::NotOwned { attempts } => *attempts,
        }
    }
}

/// A single per-server failure: a reply error or a transport error.
///
/// Never surfaced to callers of `acquire`/`extend`/`release` directly;
/// emitted through the manager's `clientError` sink and folded into that
/// round's vote count.
#[derive(Debug, Clone, Error)]
#[error("server client error: {message}")]
pub struct ClientError {
    pub message: String,
}

impl ClientError {
    pub fn new(message: impl Into<String>) -> Self {
        ClientError {
            message: message.into(),
        }
    }
}

impl From<redis::RedisError> for ClientError {
    fn from(err: redis::RedisError) -> Self {
        ClientError::new(err.to_string())
    }
}
