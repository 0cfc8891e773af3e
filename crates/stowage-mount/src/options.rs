//! Mount options and attempt timing.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Split a comma-separated mount option string into individual options.
///
/// Whitespace around options is trimmed and empty segments are dropped, so
/// `""` and `","` both produce an empty list. Callers treat an empty list
/// as "no options given".
pub fn split_mount_options(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|option| !option.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Timing bounds for a single mount attempt.
///
/// The mount command is polled every `interval` and killed once `timeout`
/// has elapsed. These bound one attempt only; retrying with different
/// options is the caller's business.
///
/// Serializes with human-friendly durations (`"1s"`, `"500ms"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountTimeouts {
    /// Delay between liveness polls of the mount command.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Overall deadline for the attempt.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for MountTimeouts {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(5),
        }
    }
}
