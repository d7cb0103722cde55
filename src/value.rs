use std::time::{SystemTime, UNIX_EPOCH};

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

/// Draws a fresh, timestamp-prefixed, high-entropy lock value:
/// `${wallMs}:${random}`. Two independent processes drawing a value at the
/// same millisecond still collide only if the random suffix also collides.
pub(crate) fn generate_value() -> String {
    let wall_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the unix epoch")
        .as_millis();

    let random: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect();

    format!("{wall_ms}:{random}")
}

/// Milliseconds since the unix epoch, used for expiration bookkeeping.
pub(crate) fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the unix epoch")
        .as_millis() as i64
}
