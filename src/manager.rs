use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use rand::{thread_rng, Rng};
use tracing::{debug, info, warn};

use crate::client::{ScriptArg, ServerClient};
use crate::config::{Config, ResolvedConfig};
use crate::error::{ClientError, LockError};
use crate::lock::Lock;
use crate::resource::Resource;
use crate::value::{generate_value, now_ms};

/// Callback invoked once per per-server failure (`clientError`). Must
/// tolerate concurrent invocation from multiple in-flight operations; the
/// manager never lets a panicking sink escape into the acquire/extend/
/// release control flow.
pub type ClientErrorSink = Arc<dyn Fn(&ClientError) + Send + Sync>;

/// The quorum lock manager.
///
/// Owns a fixed list of server clients, static configuration, and an
/// optional `clientError` sink. All three operations (acquire/extend/
/// release) broadcast to every client concurrently and wait for every
/// reply before voting — see the module-level design notes on why there is
/// no early-quorum shortcut.
pub struct LockManager<C: ServerClient> {
    clients: Vec<C>,
    quorum: usize,
    config: ResolvedConfig,
    on_client_error: Option<ClientErrorSink>,
}

impl<C: ServerClient> std::fmt::Debug for LockManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockManager")
            .field("servers", &self.clients.len())
            .field("quorum", &self.quorum)
            .finish()
    }
}

impl<C: ServerClient> LockManager<C> {
    /// Construct a manager with default configuration. Fails if `clients`
    /// is empty.
    pub fn new(clients: Vec<C>) -> Result<Self, LockError> {
        Self::with_config(clients, Config::default())
    }

    /// Construct a manager with explicit configuration. Fails if `clients`
    /// is empty.
    pub fn with_config(clients: Vec<C>, config: Config) -> Result<Self, LockError> {
        if clients.is_empty() {
            return Err(LockError::Configuration(
                "at least one server client is required".to_string(),
            ));
        }
        let quorum = clients.len() / 2 + 1;
        Ok(LockManager {
            clients,
            quorum,
            config: config.resolve(),
            on_client_error: None,
        })
    }

    /// Register a `clientError` sink. Replaces any previously registered
    /// sink.
    pub fn on_client_error<F>(mut self, sink: F) -> Self
    where
        F: Fn(&ClientError) + Send + Sync + 'static,
    {
        self.on_client_error = Some(Arc::new(sink));
        self
    }

    /// Number of server clients that must agree for an operation to count.
    pub fn quorum(&self) -> usize {
        self.quorum
    }

    /// Acquire `resource` for `ttl_ms` milliseconds.
    pub async fn acquire(
        &self,
        resource: impl Into<Resource>,
        ttl_ms: u64,
    ) -> Result<Lock<'_, C>, LockError> {
        let resource = resource.into();
        let value = generate_value();
        let max_rounds = self.config.retry_count + 1;

        for round in 1..=max_rounds {
            let start = Instant::now();
            let start_ms = now_ms();
            let votes = self
                .broadcast(&self.config.lock_script, &resource, &[
                    ScriptArg::Str(value.clone()),
                    ScriptArg::Int(ttl_ms as i64),
                ])
                .await;

            if let Some(expiration) = self.check_quorum(ttl_ms, start, start_ms, votes) {
                info!(resource = ?resource, round, "redlock quorum acquired");
                return Ok(Lock {
                    manager: self,
                    resource,
                    value,
                    expiration,
                    attempts: round,
                });
            }

            debug!(resource = ?resource, round, votes, quorum = self.quorum, "acquire round failed, rolling back");
            let _ = self
                .broadcast(&self.config.unlock_script, &resource, &[ScriptArg::Str(
                    value.clone(),
                )])
                .await;

            if round < max_rounds {
                self.backoff().await;
            }
        }

        warn!(resource = ?resource, attempts = max_rounds, "redlock acquire exhausted all retries");
        Err(LockError::Unavailable {
            attempts: max_rounds,
        })
    }

    /// Extend `lock`'s lease by `ttl_ms` milliseconds, mutating it in place
    /// on success.
    pub async fn extend(&self, lock: &mut Lock<'_, C>, ttl_ms: u64) -> Result<(), LockError> {
        if lock.is_stale() {
            return Err(LockError::NotOwned { attempts: 0 });
        }

        let max_rounds = self.config.retry_count + 1;
        let resource = lock.resource.clone();
        let value = lock.value.clone();

        for round in 1..=max_rounds {
            let start = Instant::now();
            let start_ms = now_ms();
            let votes = self
                .broadcast(&self.config.extend_script, &resource, &[
                    ScriptArg::Str(value.clone()),
                    ScriptArg::Int(ttl_ms as i64),
                ])
                .await;

            if round == 1 && votes == 0 {
                return Err(LockError::NotOwned { attempts: 0 });
            }

            if let Some(expiration) = self.check_quorum(ttl_ms, start, start_ms, votes) {
                lock.expiration = expiration;
                lock.attempts = round;
                info!(resource = ?resource, round, "redlock extended");
                return Ok(());
            }

            debug!(resource = ?resource, round, votes, quorum = self.quorum, "extend round failed");
            if round < max_rounds {
                self.backoff().await;
            }
        }

        Err(LockError::Unavailable {
            attempts: max_rounds,
        })
    }

    /// Release `lock`. One round only; never retries.
    pub async fn release(&self, lock: &Lock<'_, C>) -> Result<(), LockError> {
        let votes = self
            .broadcast(&self.config.unlock_script, &lock.resource, &[ScriptArg::Str(
                lock.value.clone(),
            )])
            .await;

        if votes >= self.quorum {
            Ok(())
        } else {
            warn!(resource = ?lock.resource, votes, quorum = self.quorum, "redlock release failed to reach quorum");
            Err(LockError::NotOwned { attempts: 1 })
        }
    }

    /// Disconnect every server client, returning each per-client result.
    pub async fn quit(&self) -> Vec<Result<(), ClientError>> {
        join_all(self.clients.iter().map(|client| client.quit())).await
    }

    /// Broadcast `script` to every client concurrently and return the
    /// number of servers that reported full success (their reply equals
    /// `resource`'s key count).
    async fn broadcast(&self, script: &str, resource: &Resource, args: &[ScriptArg]) -> usize {
        let keys = resource.keys();
        let required = keys.len() as i64;

        let replies = join_all(
            self.clients
                .iter()
                .map(|client| client.evaluate(script, keys, args)),
        )
        .await;

        replies
            .into_iter()
            .filter(|reply| match reply {
                Ok(count) => *count == required,
                Err(err) => {
                    self.emit_client_error(err);
                    false
                }
            })
            .count()
    }

    /// Computes drift/validity for a round and returns the new expiration
    /// timestamp iff quorum was reached and the remaining validity window
    /// is positive. `round_start_ms` is the wall-clock reading taken at the
    /// same instant as `round_start`, before the broadcast — the returned
    /// expiration is relative to that moment, not to whenever the broadcast
    /// happens to finish, so `elapsed` is actually deducted rather than
    /// canceling back out.
    fn check_quorum(
        &self,
        ttl_ms: u64,
        round_start: Instant,
        round_start_ms: i64,
        votes: usize,
    ) -> Option<i64> {
        let drift = (ttl_ms as f64 * self.config.drift_factor).floor() as i64 + 2;
        let elapsed_ms = round_start.elapsed().as_millis() as i64;
        let validity = ttl_ms as i64 - elapsed_ms - drift;

        if votes >= self.quorum && validity > 0 {
            Some(round_start_ms + validity)
        } else {
            None
        }
    }

    fn emit_client_error(&self, err: &ClientError) {
        if let Some(sink) = &self.on_client_error {
            sink(err);
        }
        warn!(error = %err, "redlock server client error");
    }

    async fn backoff(&self) {
        let jitter_ms = self.config.retry_jitter.as_millis() as i64;
        let offset = if jitter_ms == 0 {
            0
        } else {
            thread_rng().gen_range(-jitter_ms..=jitter_ms)
        };
        let delay_ms = (self.config.retry_delay.as_millis() as i64 + offset).max(0) as u64;
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}
