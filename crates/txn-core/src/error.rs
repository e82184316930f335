//! Error taxonomy shared by both HTTP surfaces (spec §7).
//!
//! One `thiserror` enum per library crate is the convention the teacher
//! follows in `bleep-core`; the HTTP status mapping lives alongside it so
//! both `txn-coordinator::routes` and `txn-participant::routes` render the
//! same error the same way.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TxnError {
    #[error("missing or invalid bearer credential")]
    Auth,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("pair busy, could not acquire lock in time")]
    PairBusy,

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("transaction aborted: {0}")]
    TransactionAborted(String),

    #[error("dependency unavailable: {0}")]
    Dependency(String),

    #[error("not found")]
    NotFound,
}

impl TxnError {
    /// HTTP status code a rejection handler should map this to (spec §6/§7).
    pub fn status_code(&self) -> u16 {
        match self {
            TxnError::Auth => 401,
            TxnError::Validation(_) => 400,
            TxnError::PairBusy => 423,
            TxnError::InsufficientFunds => 409,
            TxnError::TransactionAborted(_) => 409,
            TxnError::Dependency(_) => 503,
            TxnError::NotFound => 404,
        }
    }

    pub fn detail(&self) -> String {
        self.to_string()
    }
}
