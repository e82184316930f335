use std::time::Duration;

/// Tunables for the recovery loop (spec §6/§9).
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// How often the worker scans the log for `PREPARED_ALL` entries.
    /// Spec default: ~2s.
    pub tick_interval: Duration,
    /// Minimum age of a `PREPARED_ALL` entry before it is reaped.
    /// `RECOVERY_ROLLBACK_TIMEOUT_SECONDS`, spec default: 10s.
    pub rollback_timeout: Duration,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        RecoveryConfig {
            tick_interval: Duration::from_secs(2),
            rollback_timeout: Duration::from_secs(10),
        }
    }
}

impl RecoveryConfig {
    pub fn from_env() -> Self {
        let rollback_timeout = std::env::var("RECOVERY_ROLLBACK_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        RecoveryConfig {
            tick_interval: Duration::from_secs(2),
            rollback_timeout,
        }
    }
}
