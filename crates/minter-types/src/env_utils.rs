//! Environment variable parsing utilities.
//!
//! Every tunable in the minter (delays, attempt bounds, endpoints) can be
//! overridden from the environment. These helpers keep that parsing in one
//! place instead of repeating:
//!
//! ```ignore
//! std::env::var("VAR_NAME")
//!     .ok()
//!     .and_then(|v| v.parse::<u64>().ok())
//!     .unwrap_or(default_value)
//! ```
//!
//! # Example
//!
//! ```
//! use minter_types::env_utils::{env_millis_or, env_var_or};
//! use std::time::Duration;
//!
//! let attempts: u32 = env_var_or("MINTER_MAX_ATTEMPTS", 4);
//! let delay = env_millis_or("MINTER_INTER_ITEM_DELAY_MS", Duration::from_millis(50));
//! ```

use std::str::FromStr;
use std::time::Duration;

/// Parse an environment variable into a type that implements `FromStr`.
///
/// Returns `None` if the variable is unset, blank, or cannot be parsed.
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| v.trim().parse().ok())
}

/// Parse an environment variable with a default value.
pub fn env_var_or<T: FromStr>(key: &str, default: T) -> T {
    env_var(key).unwrap_or(default)
}

/// Check if an environment variable is set to a truthy value.
///
/// Returns `true` for "1", "true", "yes" or "on" (case-insensitive).
pub fn env_bool(key: &str) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Read a duration expressed in milliseconds.
pub fn env_millis_or(key: &str, default: Duration) -> Duration {
    env_var::<u64>(key)
        .map(Duration::from_millis)
        .unwrap_or(default)
}

/// Read a duration expressed in whole seconds.
pub fn env_secs_or(key: &str, default: Duration) -> Duration {
    env_var::<u64>(key)
        .map(Duration::from_secs)
        .unwrap_or(default)
}
