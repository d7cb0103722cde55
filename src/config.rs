use std::time::Duration;

use crate::scripts;

/// A server-side script body, either supplied verbatim or derived from the
/// built-in body via a transform applied once at construction.
///
/// The transform form lets callers layer behavior (e.g. an audit side
/// effect) onto the built-in script without re-copying its Lua source.
pub enum ScriptOverride {
    Literal(String),
    Transform(Box<dyn Fn(&str) -> String + Send + Sync>),
}

impl ScriptOverride {
    pub fn literal(body: impl Into<String>) -> Self {
        ScriptOverride::Literal(body.into())
    }

    pub fn transform(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        ScriptOverride::Transform(Box::new(f))
    }

    fn resolve(self, default_body: &str) -> String {
        match self {
            ScriptOverride::Literal(body) => body,
            ScriptOverride::Transform(f) => f(default_body),
        }
    }
}

/// Tunables for a [`crate::LockManager`]. See the field docs for defaults;
/// `Config::default()` matches those used by the reference implementation.
pub struct Config {
    /// Fraction of the TTL added to the fixed 2 ms floor to bound clock drift.
    pub drift_factor: f64,
    /// Total attempts on acquire/extend (the manager issues `retry_count + 1`
    /// rounds). Release never retries regardless of this value.
    pub retry_count: u32,
    /// Base backoff between rounds.
    pub retry_delay: Duration,
    /// Symmetric uniform jitter added to each backoff.
    pub retry_jitter: Duration,
    pub lock_script: Option<ScriptOverride>,
    pub unlock_script: Option<ScriptOverride>,
    pub extend_script: Option<ScriptOverride>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            drift_factor: 0.01,
            retry_count: 3,
            retry_delay: Duration::from_millis(200),
            retry_jitter: Duration::from_millis(100),
            lock_script: None,
            unlock_script: None,
            extend_script: None,
        }
    }
}

/// `Config` after script overrides have been resolved to their final Lua
/// bodies. Held by the manager; immutable for its lifetime.
pub(crate) struct ResolvedConfig {
    pub drift_factor: f64,
    pub retry_count: u32,
    pub retry_delay: Duration,
    pub retry_jitter: Duration,
    pub lock_script: String,
    pub unlock_script: String,
    pub extend_script: String,
}

impl Config {
    pub(crate) fn resolve(self) -> ResolvedConfig {
        ResolvedConfig {
            drift_factor: self.drift_factor,
            retry_count: self.retry_count,
            retry_delay: self.retry_delay,
            retry_jitter: self.retry_jitter,
            lock_script: resolve_or_default(self.lock_script, scripts::LOCK_SCRIPT),
            unlock_script: resolve_or_default(self.unlock_script, scripts::UNLOCK_SCRIPT),
            extend_script: resolve_or_default(self.extend_script, scripts::EXTEND_SCRIPT),
        }
    }
}

fn resolve_or_default(override_: Option<ScriptOverride>, default_body: &str) -> String {
    match override_ {
        None => default_body.to_string(),
        Some(o) => o.resolve(default_body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_defaults() {
        let config = Config::default();
        assert_eq!(config.retry_count, 3);
        assert_eq!(config.retry_delay, Duration::from_millis(200));
        assert_eq!(config.retry_jitter, Duration::from_millis(100));
        assert!((config.drift_factor - 0.01).abs() < f64::EPSILON);
    }

    #[test]
    fn transform_is_applied_once_to_the_default_body() {
        let config = Config {
            lock_script: Some(ScriptOverride::transform(|default| {
                format!("-- audited\n{default}")
            })),
            ..Config::default()
        };
        let resolved = config.resolve();
        assert!(resolved.lock_script.starts_with("-- audited\n"));
        assert!(resolved.lock_script.contains(scripts::LOCK_SCRIPT));
    }

    #[test]
    fn literal_override_replaces_the_default_body_entirely() {
        let config = Config {
            unlock_script: Some(ScriptOverride::literal("return 1")),
            ..Config::default()
        };
        let resolved = config.resolve();
        assert_eq!(resolved.unlock_script, "return 1");
    }
}
