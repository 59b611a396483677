//! Pool configuration
//!
//! Configuration can be set via:
//! 1. Environment variables (`PoolConfig::from_env()`)
//! 2. Builder methods on top of either constructor
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `JP_WORKER_PAIRS` | nproc / 2 (min 1) | Number of A/B lane pairs |
//! | `JP_PARK_TIMEOUT_MS` | 100 | Upper bound on one park before re-checking |
//! | `JP_ISOLATE_FAULTS` | true | Catch handler panics instead of losing the lane |

use std::time::Duration;

use jobpool_core::{env_get, env_get_bool, env_get_millis, JobError, JobResult};

/// Maximum number of lane pairs a pool may spawn
pub const MAX_WORKER_PAIRS: usize = 256;

/// Default upper bound on a single park
pub const DEFAULT_PARK_TIMEOUT: Duration = Duration::from_millis(100);

/// Half the available hardware parallelism, at least 1
pub fn default_worker_pairs() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2);
    (cpus / 2).max(1)
}

/// Configuration for a [`JobPool`](crate::JobPool)
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Lane pairs; each pair runs one A->B lane and one B->A lane
    pub worker_pairs: usize,

    /// Longest a parked lane sleeps before re-checking its condition.
    /// Wakeups are explicit, so this only bounds the cost of a missed one.
    pub park_timeout: Duration,

    /// Thread-name prefix for lanes
    pub lane_name: String,

    /// Catch handler panics, drop the job and keep the lane running
    pub isolate_faults: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_pairs: default_worker_pairs(),
            park_timeout: DEFAULT_PARK_TIMEOUT,
            lane_name: "jobpool".to_string(),
            isolate_faults: true,
        }
    }
}

impl PoolConfig {
    /// Pure defaults, ignoring the environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `JP_*` environment variables
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            worker_pairs: env_get("JP_WORKER_PAIRS", d.worker_pairs),
            park_timeout: env_get_millis("JP_PARK_TIMEOUT_MS", d.park_timeout),
            lane_name: d.lane_name,
            isolate_faults: env_get_bool("JP_ISOLATE_FAULTS", d.isolate_faults),
        }
    }

    pub fn worker_pairs(mut self, n: usize) -> Self {
        self.worker_pairs = n;
        self
    }

    pub fn park_timeout(mut self, d: Duration) -> Self {
        self.park_timeout = d;
        self
    }

    pub fn lane_name(mut self, name: impl Into<String>) -> Self {
        self.lane_name = name.into();
        self
    }

    pub fn isolate_faults(mut self, enable: bool) -> Self {
        self.isolate_faults = enable;
        self
    }

    /// Total lanes the pool will spawn
    #[inline]
    pub fn lane_count(&self) -> usize {
        self.worker_pairs * 2
    }

    /// Validate configuration
    pub fn validate(&self) -> JobResult<()> {
        if self.worker_pairs == 0 {
            return Err(JobError::InvalidArgument("worker_pairs must be at least 1"));
        }
        if self.worker_pairs > MAX_WORKER_PAIRS {
            return Err(JobError::InvalidArgument("worker_pairs exceeds maximum"));
        }
        if self.park_timeout.is_zero() {
            return Err(JobError::InvalidArgument("park_timeout must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfig::new();
        assert!(config.worker_pairs >= 1);
        assert_eq!(config.lane_count(), config.worker_pairs * 2);
        assert_eq!(config.park_timeout, Duration::from_millis(100));
        assert!(config.isolate_faults);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_pairs() {
        let zero = PoolConfig::new().worker_pairs(0);
        assert!(matches!(zero.validate(), Err(JobError::InvalidArgument(_))));

        let huge = PoolConfig::new().worker_pairs(MAX_WORKER_PAIRS + 1);
        assert!(matches!(huge.validate(), Err(JobError::InvalidArgument(_))));

        let zero_park = PoolConfig::new().park_timeout(Duration::ZERO);
        assert!(zero_park.validate().is_err());
    }

    #[test]
    fn test_builder() {
        let config = PoolConfig::new()
            .worker_pairs(3)
            .lane_name("echo")
            .isolate_faults(false);
        assert_eq!(config.lane_count(), 6);
        assert_eq!(config.lane_name, "echo");
        assert!(!config.isolate_faults);
    }
}
