//! Environment-variable configuration for the Participant binary (spec §9).
//!
//! Plain `std::env::var` plus `thiserror`, matching the teacher's
//! `bleep-core` convention of a small `Config::from_env` rather than a
//! config-file crate: a Participant has exactly three knobs and no nesting.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ParticipantConfig {
    pub account_name: String,
    pub initial_balance: i64,
    pub data_path: PathBuf,
    pub bind_addr: std::net::SocketAddr,
}

impl ParticipantConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let account_name =
            std::env::var("ACCOUNT_NAME").map_err(|_| ConfigError::Missing("ACCOUNT_NAME"))?;

        let initial_balance = match std::env::var("INITIAL_BALANCE") {
            Ok(v) => v.parse::<i64>().map_err(|_| ConfigError::Invalid {
                name: "INITIAL_BALANCE",
                value: v,
            })?,
            Err(_) => 0,
        };

        let data_path = std::env::var("DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(format!("./data/{account_name}.json")));

        let bind_addr = match std::env::var("BIND_ADDR") {
            Ok(v) => v.parse().map_err(|_| ConfigError::Invalid {
                name: "BIND_ADDR",
                value: v,
            })?,
            Err(_) => "127.0.0.1:9000".parse().expect("valid default bind addr"),
        };

        Ok(ParticipantConfig {
            account_name,
            initial_balance,
            data_path,
            bind_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in ["ACCOUNT_NAME", "INITIAL_BALANCE", "DATA_PATH", "BIND_ADDR"] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn missing_account_name_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        let err = ParticipantConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("ACCOUNT_NAME")));
    }

    #[test]
    fn defaults_apply_when_optional_vars_are_absent() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("ACCOUNT_NAME", "A");
        let cfg = ParticipantConfig::from_env().unwrap();
        assert_eq!(cfg.account_name, "A");
        assert_eq!(cfg.initial_balance, 0);
        assert_eq!(cfg.bind_addr.to_string(), "127.0.0.1:9000");
        clear_env();
    }

    #[test]
    fn explicit_values_are_honored() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var("ACCOUNT_NAME", "B");
        std::env::set_var("INITIAL_BALANCE", "500");
        std::env::set_var("DATA_PATH", "/tmp/b.json");
        std::env::set_var("BIND_ADDR", "0.0.0.0:9100");
        let cfg = ParticipantConfig::from_env().unwrap();
        assert_eq!(cfg.initial_balance, 500);
        assert_eq!(cfg.data_path, PathBuf::from("/tmp/b.json"));
        assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:9100");
        clear_env();
    }
}
