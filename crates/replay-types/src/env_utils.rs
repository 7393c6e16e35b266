//! Environment variable parsing utilities.
//!
//! Used for the `REPLAY_*` configuration knobs so callers don't repeat the
//! `std::env::var(..).ok().and_then(..).unwrap_or(..)` dance.
//!
//! # Example
//!
//! ```
//! use replay_types::env_utils::{env_string, env_var_or};
//!
//! let per_page: usize = env_var_or("REPLAY_ERRORS_PER_PAGE", 50);
//! let token: Option<String> = env_string("REPLAY_API_TOKEN");
//! ```

use std::str::FromStr;

/// Parse an environment variable into a type that implements `FromStr`.
///
/// Returns `None` if the variable is not set or cannot be parsed.
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Parse an environment variable with a default value.
pub fn env_var_or<T: FromStr>(key: &str, default: T) -> T {
    env_var(key).unwrap_or(default)
}

/// Read a string environment variable, treating blank values as unset.
pub fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
