//! Pair lock token.
//!
//! The lock itself is keyed `lock:pair:<src>:<dst>` — ordered, not
//! canonicalized (spec §9 open question: "non-canonical pair-lock key").
//! With exactly two accounts `A:B` and `B:A` are distinct locks and cannot
//! deadlock each other, since every transfer in this system only ever
//! touches the single ordered pair it names.

/// A held pair lock. Carries the random value written to the lock key so
/// release can verify ownership before deleting it (the standard
/// `SET NX` + compare-and-delete Redis lock recipe).
#[derive(Debug, Clone)]
pub struct LockToken {
    pub pair_key: String,
    pub fencing_value: String,
}

pub fn pair_key(src: &str, dst: &str) -> String {
    format!("lock:pair:{src}:{dst}")
}

pub fn txn_key(txn_id: &str) -> String {
    format!("txn:{txn_id}")
}

pub fn idem_key(idempotency_key: &str) -> String {
    format!("idem:{idempotency_key}")
}
