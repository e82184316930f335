//! Pure state-machine logic for one account, with no I/O: given the current
//! `AccountState` and an operation, decide the new state (if any) and the
//! outcome. Kept free of locking and persistence so it is exhaustively
//! unit- and property-testable (spec §8's universal invariants) without a
//! filesystem or a runtime.
//!
//! State machine (spec §4.1):
//!
//! ```text
//!                 prepare(debit)           commit
//!   (absent) ────────────────────▶ HELD ─────────▶ (absent, balance -= amt)
//!             prepare(credit)          rollback
//!   (absent) ────────────────────▶ PENDING ──────▶ (absent)
//!                                   │ commit
//!                                   └──────▶ (absent, balance += amt)
//! ```

use txn_core::{AccountState, Direction, TxnError};

/// Outcome of a successful `rollback`: whether any state actually changed
/// (the Participant only flushes to disk when it did — spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollbackOutcome {
    pub changed: bool,
}

/// Outcome of a successful `prepare`: whether a new hold/pending entry was
/// recorded, as opposed to an idempotent replay of an already-prepared
/// `txn_id`. The Participant only flushes, bumps `prepares_total`, and
/// honors `crash_after_prepare` when a new entry was recorded (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepareOutcome {
    pub recorded: bool,
}

/// Operations on [`AccountState`], implemented as a local trait over the
/// shared (foreign) data type so the wire model stays free of business
/// logic and every caller goes through the same invariants.
pub trait AccountOps {
    /// Record a tentative hold (debit) or pending credit for `txn_id`.
    /// Idempotent: re-preparing an already-recorded entry for the same
    /// direction is a no-op success that reports `recorded: false`.
    fn prepare(
        &mut self,
        txn_id: &str,
        amount: u64,
        direction: Direction,
    ) -> Result<PrepareOutcome, TxnError>;

    /// Apply a previously prepared hold/pending. Idempotent: committing an
    /// unknown (or already-committed) `txn_id` still returns success, since
    /// it is indistinguishable from a safe retry.
    fn commit(&mut self, txn_id: &str);

    /// Discard a previously prepared hold/pending without touching
    /// `balance`. Always succeeds; reports whether anything changed.
    fn rollback(&mut self, txn_id: &str) -> RollbackOutcome;
}

impl AccountOps for AccountState {
    fn prepare(
        &mut self,
        txn_id: &str,
        amount: u64,
        direction: Direction,
    ) -> Result<PrepareOutcome, TxnError> {
        debug_assert!(amount > 0, "amount must be positive");

        match direction {
            Direction::Debit => {
                if self.holds.contains_key(txn_id) {
                    return Ok(PrepareOutcome { recorded: false });
                }
                if self.balance < amount as i64 {
                    return Err(TxnError::InsufficientFunds);
                }
                self.holds.insert(txn_id.to_string(), amount);
                Ok(PrepareOutcome { recorded: true })
            }
            Direction::Credit => {
                if self.pendings.contains_key(txn_id) {
                    return Ok(PrepareOutcome { recorded: false });
                }
                self.pendings.insert(txn_id.to_string(), amount);
                Ok(PrepareOutcome { recorded: true })
            }
        }
    }

    fn commit(&mut self, txn_id: &str) {
        if let Some(amount) = self.holds.remove(txn_id) {
            self.balance -= amount as i64;
            return;
        }
        if let Some(amount) = self.pendings.remove(txn_id) {
            self.balance += amount as i64;
        }
        // Neither: unknown-after-commit, treated as an already-applied retry.
    }

    fn rollback(&mut self, txn_id: &str) -> RollbackOutcome {
        let had_hold = self.holds.remove(txn_id).is_some();
        let had_pending = self.pendings.remove(txn_id).is_some();
        RollbackOutcome {
            changed: had_hold || had_pending,
        }
    }
}
