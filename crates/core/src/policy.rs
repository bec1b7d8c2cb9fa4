//! Tunable limits for edit coordination.

use chrono::Duration;

use crate::lease::{heartbeat_interval_secs, LEASE_TTL_SECS};
use crate::versioning::VERSION_RETENTION;

/// Lease TTL and version retention used by a coordinator instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditPolicy {
    pub lease_ttl_secs: i64,
    pub version_retention: i64,
}

impl Default for EditPolicy {
    fn default() -> Self {
        Self {
            lease_ttl_secs: LEASE_TTL_SECS,
            version_retention: VERSION_RETENTION,
        }
    }
}

impl EditPolicy {
    /// Load overrides from the environment, falling back to the defaults.
    ///
    /// | Env Var                  | Default |
    /// |--------------------------|---------|
    /// | `NOTE_LEASE_TTL_SECS`    | `300`   |
    /// | `NOTE_VERSION_RETENTION` | `50`    |
    ///
    /// # Panics
    ///
    /// Panics if either variable is set but not a positive integer.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let lease_ttl_secs: i64 = std::env::var("NOTE_LEASE_TTL_SECS")
            .map(|v| v.parse().expect("NOTE_LEASE_TTL_SECS must be a valid i64"))
            .unwrap_or(defaults.lease_ttl_secs);
        assert!(lease_ttl_secs > 0, "NOTE_LEASE_TTL_SECS must be positive");

        let version_retention: i64 = std::env::var("NOTE_VERSION_RETENTION")
            .map(|v| v.parse().expect("NOTE_VERSION_RETENTION must be a valid i64"))
            .unwrap_or(defaults.version_retention);
        assert!(version_retention > 0, "NOTE_VERSION_RETENTION must be positive");

        Self {
            lease_ttl_secs,
            version_retention,
        }
    }

    pub fn lease_ttl(&self) -> Duration {
        Duration::seconds(self.lease_ttl_secs)
    }

    pub fn heartbeat_interval_secs(&self) -> i64 {
        heartbeat_interval_secs(self.lease_ttl_secs)
    }
}
