//! Built-in server-side script bodies.
//!
//! Each script iterates `KEYS` so that a multi-resource lock is voted on
//! atomically by a single round trip: a server either contributes all of a
//! resource's keys, or none of them. The manager rejects any reply where the
//! returned count is less than `KEYS` length.

/// For each key in `KEYS`, set it to `ARGV[1]` only if absent, with a
/// `PEXPIRE` of `ARGV[2]` ms. Returns the number of keys newly set.
pub const LOCK_SCRIPT: &str = r#"
local count = 0
for _, key in ipairs(KEYS) do
  if redis.call("set", key, ARGV[1], "NX", "PX", ARGV[2]) then
    count = count + 1
  end
end
return count
"#;

/// For each key in `KEYS`, delete it only if its value equals `ARGV[1]`.
/// Returns the number of keys deleted.
pub const UNLOCK_SCRIPT: &str = r#"
local count = 0
for _, key in ipairs(KEYS) do
  if redis.call("get", key) == ARGV[1] then
    redis.call("del", key)
    count = count + 1
  end
end
return count
"#;

/// For each key in `KEYS`, reset its `PEXPIRE` to `ARGV[2]` ms if its value
/// equals `ARGV[1]`. Returns the number of keys whose TTL was reset.
pub const EXTEND_SCRIPT: &str = r#"
local count = 0
for _, key in ipairs(KEYS) do
  if redis.call("get", key) == ARGV[1] then
    redis.call("pexpire", key, ARGV[2])
    count = count + 1
  end
end
return count
"#;
