//! Environment-variable configuration (spec §9), following
//! `original_source/services/api/main.py`'s `os.getenv` defaults.

use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub jwt_secret: String,
    pub redis_url: String,
    /// Account name -> base URL, e.g. `{"A": "http://account-a:9000"}`.
    pub participants: HashMap<String, String>,
    pub recovery_rollback_timeout: Duration,
    pub bind_addr: std::net::SocketAddr,
    pub participant_rpc_timeout: Duration,
    pub pair_lock_wait: Duration,
    pub pair_lock_hold: Duration,
}

impl CoordinatorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret =
            std::env::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret".to_string());

        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/0".to_string());

        let mut participants = HashMap::new();
        participants.insert(
            "A".to_string(),
            std::env::var("PARTICIPANT_A_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:9001".to_string()),
        );
        participants.insert(
            "B".to_string(),
            std::env::var("PARTICIPANT_B_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:9002".to_string()),
        );

        let recovery_rollback_timeout = std::env::var("RECOVERY_ROLLBACK_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        let bind_addr = std::env::var("BIND_ADDR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| "127.0.0.1:8000".parse().expect("valid default bind addr"));

        Ok(CoordinatorConfig {
            jwt_secret,
            redis_url,
            participants,
            recovery_rollback_timeout,
            bind_addr,
            participant_rpc_timeout: Duration::from_secs(5),
            pair_lock_wait: Duration::from_secs(5),
            pair_lock_hold: Duration::from_secs(15),
        })
    }
}
