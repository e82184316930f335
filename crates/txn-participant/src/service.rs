//! `ParticipantService`: the concurrency- and durability-aware shell around
//! the pure [`crate::state`] logic.
//!
//! One `parking_lot::Mutex<AccountState>` serializes every mutating call for
//! this account, mirroring the teacher's `ShardLockManager` holding a single
//! exclusive lock per shard rather than per-field locking — simpler to
//! reason about, and the spec never asks a Participant to serve more than
//! one transfer at a time anyway.

use std::path::PathBuf;

use parking_lot::Mutex;
use tracing::{error, info, warn};
use txn_core::metrics::{render, Counter};
use txn_core::{AccountState, Direction, TxnError};

use crate::persist;
use crate::state::AccountOps;

pub struct ParticipantService {
    account: String,
    data_path: PathBuf,
    state: Mutex<AccountState>,
    prepares_total: Counter,
    commits_total: Counter,
    rollbacks_total: Counter,
}

impl ParticipantService {
    pub fn load(account: String, data_path: PathBuf, initial_balance: i64) -> Result<Self, persist::PersistError> {
        persist::cleanup_stale_tmp(&data_path);
        let state = persist::load_or_init(&data_path, &account, initial_balance)?;
        Ok(ParticipantService {
            account,
            data_path,
            state: Mutex::new(state),
            prepares_total: Counter::default(),
            commits_total: Counter::default(),
            rollbacks_total: Counter::default(),
        })
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// Record a hold/pending for `txn_id`. On success the new state is
    /// flushed to disk before returning, so a crash right after this call
    /// still sees the hold on restart. `crash_after_prepare` is the dev-only
    /// fault-injection hook from spec §6: when set, the process exits
    /// immediately after the durable write, before replying — simulating a
    /// Participant that dies between PREPARED and its response reaching the
    /// Coordinator.
    pub fn prepare(
        &self,
        txn_id: &str,
        amount: u64,
        direction: Direction,
        crash_after_prepare: bool,
    ) -> Result<(), TxnError> {
        let mut state = self.state.lock();
        let outcome = state.prepare(txn_id, amount, direction)?;
        if !outcome.recorded {
            return Ok(());
        }
        self.flush_locked(&state);
        self.prepares_total.incr();
        info!(account = %self.account, txn_id, amount, ?direction, "prepared");
        drop(state);

        if crash_after_prepare {
            error!(account = %self.account, txn_id, "simulated crash after prepare");
            std::process::exit(1);
        }
        Ok(())
    }

    pub fn commit(&self, txn_id: &str) {
        let mut state = self.state.lock();
        state.commit(txn_id);
        self.flush_locked(&state);
        self.commits_total.incr();
        info!(account = %self.account, txn_id, balance = state.balance, "committed");
    }

    pub fn rollback(&self, txn_id: &str) {
        let mut state = self.state.lock();
        let outcome = state.rollback(txn_id);
        if outcome.changed {
            self.flush_locked(&state);
            self.rollbacks_total.incr();
        }
        info!(account = %self.account, txn_id, changed = outcome.changed, "rolled back");
    }

    pub fn snapshot(&self) -> AccountState {
        self.state.lock().clone()
    }

    pub fn render_metrics(&self) -> String {
        let state = self.state.lock();
        render(&[
            ("prepares_total", self.prepares_total.get().to_string()),
            ("commits_total", self.commits_total.get().to_string()),
            ("rollbacks_total", self.rollbacks_total.get().to_string()),
            ("balance", state.balance.to_string()),
            ("holds", state.holds.len().to_string()),
            ("pendings", state.pendings.len().to_string()),
        ])
    }

    fn flush_locked(&self, state: &AccountState) {
        if let Err(e) = persist::flush(&self.data_path, state) {
            warn!(account = %self.account, error = %e, "failed to persist account state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> (tempfile::TempDir, ParticipantService) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let svc = ParticipantService::load("A".to_string(), path, 1000).unwrap();
        (dir, svc)
    }

    #[test]
    fn prepare_commit_updates_balance_and_persists() {
        let (dir, svc) = service();
        svc.prepare("t1", 100, Direction::Debit, false).unwrap();
        svc.commit("t1");
        assert_eq!(svc.snapshot().balance, 900);

        let reloaded =
            ParticipantService::load("A".to_string(), dir.path().join("state.json"), 1000).unwrap();
        assert_eq!(reloaded.snapshot().balance, 900);
    }

    #[test]
    fn insufficient_funds_is_rejected() {
        let (_dir, svc) = service();
        let err = svc.prepare("t1", 5000, Direction::Debit, false).unwrap_err();
        assert!(matches!(err, TxnError::InsufficientFunds));
    }

    #[test]
    fn metrics_reflect_operations() {
        let (_dir, svc) = service();
        svc.prepare("t1", 100, Direction::Debit, false).unwrap();
        svc.commit("t1");
        let out = svc.render_metrics();
        assert!(out.contains("prepares_total 1"));
        assert!(out.contains("commits_total 1"));
        assert!(out.contains("rollbacks_total 0"));
        assert!(out.contains("balance 900"));
    }

    #[test]
    fn rollback_without_prior_prepare_is_a_safe_no_op() {
        let (_dir, svc) = service();
        svc.rollback("never-seen");
        assert_eq!(svc.snapshot().balance, 1000);
        assert!(svc.render_metrics().contains("rollbacks_total 0"));
    }

    #[test]
    fn repeated_prepare_does_not_reflush_or_recount() {
        let (_dir, svc) = service();
        svc.prepare("t1", 100, Direction::Debit, false).unwrap();
        svc.prepare("t1", 100, Direction::Debit, false).unwrap();
        assert!(svc.render_metrics().contains("prepares_total 1"));
    }

    #[test]
    fn replayed_prepare_with_crash_hook_does_not_crash() {
        let (_dir, svc) = service();
        svc.prepare("t1", 100, Direction::Debit, false).unwrap();
        svc.prepare("t1", 100, Direction::Debit, true).unwrap();
    }
}
