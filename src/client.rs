use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::ClientError;

/// A server-side script argument. Scripts take either the opaque lock value
/// or a numeric TTL, so this is kept to the two shapes the core ever needs
/// (mirrors the external `(string|number)[]` argument contract).
#[derive(Debug, Clone)]
pub enum ScriptArg {
    Str(String),
    Int(i64),
}

impl From<&str> for ScriptArg {
    fn from(s: &str) -> Self {
        ScriptArg::Str(s.to_string())
    }
}

impl From<String> for ScriptArg {
    fn from(s: String) -> Self {
        ScriptArg::Str(s)
    }
}

impl From<i64> for ScriptArg {
    fn from(n: i64) -> Self {
        ScriptArg::Int(n)
    }
}

/// The capability the quorum manager requires from each participant.
///
/// This is intentionally narrow: evaluate a server-side script, and
/// disconnect. Keeping it this small is what lets the core be exercised
/// against an in-memory fake in tests, with a real Redis-backed adapter
/// ([`RedisServerClient`]) used in production.
#[async_trait]
pub trait ServerClient: Send + Sync {
    /// Evaluate `script` atomically against `keys`/`args` and return the
    /// integer reply. Any transport or reply error is surfaced here rather
    /// than panicking; the manager folds it into that round's vote count.
    async fn evaluate(
        &self,
        script: &str,
        keys: &[String],
        args: &[ScriptArg],
    ) -> Result<i64, ClientError>;

    /// Disconnect from the server. Called once, from
    /// [`crate::LockManager::quit`].
    async fn quit(&self) -> Result<(), ClientError>;
}

/// A [`ServerClient`] backed by a real `redis::Client`.
///
/// Lazily establishes a multiplexed async connection on first use and
/// reuses it for subsequent calls; `redis::aio::MultiplexedConnection` is
/// cheap to clone and safe to share across concurrent requests.
pub struct RedisServerClient {
    client: redis::Client,
    connection: Mutex<Option<redis::aio::MultiplexedConnection>>,
}

impl RedisServerClient {
    pub fn new(client: redis::Client) -> Self {
        RedisServerClient {
            client,
            connection: Mutex::new(None),
        }
    }

    pub fn open(addr: impl redis::IntoConnectionInfo) -> Result<Self, ClientError> {
        let client = redis::Client::open(addr).map_err(ClientError::from)?;
        Ok(Self::new(client))
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, ClientError> {
        let mut guard = self.connection.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }
        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(ClientError::from)?;
        *guard = Some(conn.clone());
        Ok(conn)
    }
}

#[async_trait]
impl ServerClient for RedisServerClient {
    async fn evaluate(
        &self,
        script: &str,
        keys: &[String],
        args: &[ScriptArg],
    ) -> Result<i64, ClientError> {
        let mut conn = self.connection().await?;
        let compiled = redis::Script::new(script);
        let mut invocation = compiled.prepare_invoke();
        for key in keys {
            invocation.key(key);
        }
        for arg in args {
            match arg {
                ScriptArg::Str(s) => {
                    invocation.arg(s);
                }
                ScriptArg::Int(n) => {
                    invocation.arg(*n);
                }
            }
        }
        invocation
            .invoke_async(&mut conn)
            .await
            .map_err(ClientError::from)
    }

    async fn quit(&self) -> Result<(), ClientError> {
        let mut guard = self.connection.lock().await;
        if let Some(mut conn) = guard.take() {
            redis::cmd("QUIT")
                .query_async::<()>(&mut conn)
                .await
                .map_err(ClientError::from)?;
        }
        Ok(())
    }
}
