//! Environment variable utilities
//!
//! Typed lookups with defaults, used by the `from_env()` constructors of the
//! pool and server configuration.
//!
//! ```ignore
//! let pairs: usize = env_get("JP_WORKER_PAIRS", 2);
//! let timeout = env_get_millis("JP_PARK_TIMEOUT_MS", Duration::from_millis(100));
//! let isolate = env_get_bool("JP_ISOLATE_FAULTS", true);
//! ```

use std::str::FromStr;
use std::time::Duration;

/// Parse `key` as `T`; the default on absence or parse failure
#[inline]
pub fn env_get<T: FromStr>(key: &str, default: T) -> T {
    env_get_opt(key).unwrap_or(default)
}

/// Parse `key` as `T`; `None` on absence or parse failure
#[inline]
pub fn env_get_opt<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Boolean flag
///
/// "1", "true", "yes", "on" are true and "0", "false", "no", "off" are false
/// (case-insensitive). Unset or anything else returns the default.
pub fn env_get_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => match val.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Millisecond count as a `Duration`
pub fn env_get_millis(key: &str, default: Duration) -> Duration {
    env_get_opt::<u64>(key)
        .map(Duration::from_millis)
        .unwrap_or(default)
}

/// Raw string value or the default
#[inline]
pub fn env_get_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test owns its own variable names; tests run in parallel.

    #[test]
    fn test_unset_returns_default() {
        let n: usize = env_get("__JP_TEST_UNSET__", 7);
        assert_eq!(n, 7);
        assert_eq!(env_get_opt::<u16>("__JP_TEST_UNSET__"), None);
        assert!(env_get_bool("__JP_TEST_UNSET__", true));
        assert_eq!(env_get_str("__JP_TEST_UNSET__", "x"), "x");
        assert_eq!(
            env_get_millis("__JP_TEST_UNSET__", Duration::from_millis(5)),
            Duration::from_millis(5)
        );
    }

    #[test]
    fn test_parse_and_trim() {
        std::env::set_var("__JP_TEST_PORT__", " 8080 ");
        assert_eq!(env_get::<u16>("__JP_TEST_PORT__", 1), 8080);

        std::env::set_var("__JP_TEST_PORT__", "eighty");
        assert_eq!(env_get::<u16>("__JP_TEST_PORT__", 1), 1);
        std::env::remove_var("__JP_TEST_PORT__");
    }

    #[test]
    fn test_bool_falls_back_on_garbage() {
        std::env::set_var("__JP_TEST_FLAG__", "off");
        assert!(!env_get_bool("__JP_TEST_FLAG__", true));

        std::env::set_var("__JP_TEST_FLAG__", "YES");
        assert!(env_get_bool("__JP_TEST_FLAG__", false));

        std::env::set_var("__JP_TEST_FLAG__", "maybe");
        assert!(env_get_bool("__JP_TEST_FLAG__", true));
        assert!(!env_get_bool("__JP_TEST_FLAG__", false));
        std::env::remove_var("__JP_TEST_FLAG__");
    }

    #[test]
    fn test_millis() {
        std::env::set_var("__JP_TEST_MS__", "250");
        assert_eq!(
            env_get_millis("__JP_TEST_MS__", Duration::ZERO),
            Duration::from_millis(250)
        );
        std::env::remove_var("__JP_TEST_MS__");
    }
}
