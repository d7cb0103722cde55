//! An in-memory [`ServerClient`] used to exercise the manager's quorum
//! voting, drift accounting, and retry behavior without a network or a
//! live Redis cluster. Integration tests that need a real script
//! round-trip live in `tests/` and use `testcontainers` instead.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::client::{ScriptArg, ServerClient};
use crate::error::ClientError;
use crate::scripts::{EXTEND_SCRIPT, LOCK_SCRIPT, UNLOCK_SCRIPT};

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-memory stand-in for one Redlock server client.
pub struct FakeServerClient {
    store: Mutex<HashMap<String, Entry>>,
    failing: AtomicBool,
    unsupported: StdMutex<HashSet<String>>,
    calls: AtomicUsize,
}

impl FakeServerClient {
    pub fn new() -> Self {
        FakeServerClient {
            store: Mutex::new(HashMap::new()),
            failing: AtomicBool::new(false),
            unsupported: StdMutex::new(HashSet::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Makes every subsequent `evaluate` call return a transport error,
    /// simulating a server that is down or unreachable.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Total number of `evaluate` calls observed so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Marks `key` as server-side incompatible (e.g. holding a value of the
    /// wrong type), so it can never be locked, without erroring.
    pub fn mark_unsupported(&self, key: &str) {
        self.unsupported.lock().unwrap().insert(key.to_string());
    }

    fn value_arg(args: &[ScriptArg]) -> &str {
        match &args[0] {
            ScriptArg::Str(s) => s,
            ScriptArg::Int(_) => unreachable!("first script arg is always the lock value"),
        }
    }

    fn ttl_arg(args: &[ScriptArg]) -> u64 {
        match &args[1] {
            ScriptArg::Int(n) => *n as u64,
            ScriptArg::Str(_) => unreachable!("second script arg is always the numeric ttl"),
        }
    }
}

impl Default for FakeServerClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServerClient for FakeServerClient {
    async fn evaluate(
        &self,
        script: &str,
        keys: &[String],
        args: &[ScriptArg],
    ) -> Result<i64, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            return Err(ClientError::new("simulated transport error"));
        }

        let now = Instant::now();
        let mut store = self.store.lock().await;

        if script == LOCK_SCRIPT {
            if keys
                .iter()
                .any(|k| self.unsupported.lock().unwrap().contains(k))
            {
                // Mirrors a real server raising WRONGTYPE mid-script: the
                // whole atomic evaluation fails for this server, not just
                // the offending key.
                return Err(ClientError::new(
                    "WRONGTYPE Operation against a key holding the wrong kind of value",
                ));
            }
            let value = Self::value_arg(args).to_string();
            let ttl = Self::ttl_arg(args);
            let mut count = 0i64;
            for key in keys {
                let occupied = store.get(key).map(|e| e.live(now)).unwrap_or(false);
                if !occupied {
                    store.insert(
                        key.clone(),
                        Entry {
                            value: value.clone(),
                            expires_at: now + Duration::from_millis(ttl),
                        },
                    );
                    count += 1;
                }
            }
            Ok(count)
        } else if script == UNLOCK_SCRIPT {
            let value = Self::value_arg(args);
            let mut count = 0i64;
            for key in keys {
                let matches = store
                    .get(key)
                    .map(|e| e.live(now) && e.value == value)
                    .unwrap_or(false);
                if matches {
                    store.remove(key);
                    count += 1;
                }
            }
            Ok(count)
        } else if script == EXTEND_SCRIPT {
            let value = Self::value_arg(args).to_string();
            let ttl = Self::ttl_arg(args);
            let mut count = 0i64;
            for key in keys {
                if let Some(entry) = store.get_mut(key) {
                    if entry.live(now) && entry.value == value {
                        entry.expires_at = now + Duration::from_millis(ttl);
                        count += 1;
                    }
                }
            }
            Ok(count)
        } else {
            Err(ClientError::new("fake server client does not recognize this script"))
        }
    }

    async fn quit(&self) -> Result<(), ClientError> {
        Ok(())
    }
}
