//! Durable storage for one Participant's [`AccountState`]: load-or-init on
//! startup, atomic write on every state change.
//!
//! Grounded on `original_source/services/account/main.py`'s `_ensure_state`
//! / `_write_state`: write the new JSON to `<path>.tmp` then `rename` it over
//! `<path>`, so a crash mid-write never leaves a half-written file behind —
//! the rename is the only operation that can be observed partially done, and
//! POSIX guarantees it's atomic within one filesystem.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use txn_core::AccountState;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("reading {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("writing {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("renaming {tmp_path} to {path}: {source}")]
    Rename {
        tmp_path: PathBuf,
        path: PathBuf,
        source: io::Error,
    },
}

/// Load the account's state from `path`, or create and persist a fresh one
/// seeded with `initial_balance` if no file exists yet.
pub fn load_or_init(
    path: &Path,
    account: &str,
    initial_balance: i64,
) -> Result<AccountState, PersistError> {
    match std::fs::read(path) {
        Ok(bytes) => {
            let state: AccountState =
                serde_json::from_slice(&bytes).map_err(|source| PersistError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
            info!(account, path = %path.display(), balance = state.balance, "loaded existing account state");
            Ok(state)
        }
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            let state = AccountState::new(account.to_string(), initial_balance);
            flush(path, &state)?;
            info!(account, path = %path.display(), initial_balance, "initialized fresh account state");
            Ok(state)
        }
        Err(source) => Err(PersistError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Atomically persist `state` to `path` via a same-directory temp file plus
/// a rename, so every caller is left with either the old file or the new
/// one, never a partial write.
pub fn flush(path: &Path, state: &AccountState) -> Result<(), PersistError> {
    let tmp_path = tmp_path_for(path);
    let bytes = serde_json::to_vec_pretty(state).map_err(|source| PersistError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    std::fs::write(&tmp_path, &bytes).map_err(|source| PersistError::Write {
        path: tmp_path.clone(),
        source,
    })?;

    std::fs::rename(&tmp_path, path).map_err(|source| PersistError::Rename {
        tmp_path: tmp_path.clone(),
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

/// Best-effort cleanup of a leftover `.tmp` file from a prior crash between
/// `write` and `rename` — harmless either way since `flush` always
/// overwrites it, but logged so an operator notices repeated crashes.
pub fn cleanup_stale_tmp(path: &Path) {
    let tmp_path = tmp_path_for(path);
    if tmp_path.exists() {
        if let Err(e) = std::fs::remove_file(&tmp_path) {
            warn!(path = %tmp_path.display(), error = %e, "failed to remove stale tmp file");
        } else {
            warn!(path = %tmp_path.display(), "removed stale tmp file from a prior crash");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_or_init_creates_fresh_state_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let state = load_or_init(&path, "A", 1000).unwrap();
        assert_eq!(state.balance, 1000);
        assert!(path.exists());
    }

    #[test]
    fn load_or_init_reads_back_persisted_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut state = load_or_init(&path, "A", 1000).unwrap();
        state.balance = 500;
        state.holds.insert("t1".to_string(), 100);
        flush(&path, &state).unwrap();

        let reloaded = load_or_init(&path, "A", 1000).unwrap();
        assert_eq!(reloaded.balance, 500);
        assert_eq!(reloaded.holds.get("t1"), Some(&100));
    }

    #[test]
    fn flush_leaves_no_tmp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let state = AccountState::new("A".to_string(), 1000);

        flush(&path, &state).unwrap();
        assert!(!tmp_path_for(&path).exists());
    }

    #[test]
    fn parse_error_on_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"not json").unwrap();

        let err = load_or_init(&path, "A", 1000).unwrap_err();
        assert!(matches!(err, PersistError::Parse { .. }));
    }
}
