use std::time::Duration;

use async_trait::async_trait;
use txn_core::{TransferResponse, TxnError, TxnLogEntry, TransactionId};

use crate::lock::LockToken;

/// The shared key-value store the Coordinator and Recovery Worker depend
/// on. Never touched by Participants (spec §2).
#[async_trait]
pub trait TxnStore: Send + Sync {
    /// Write the `INIT` log entry for a freshly-minted transaction id.
    async fn create(&self, entry: TxnLogEntry) -> Result<(), TxnError>;

    async fn mark_prepared_all(&self, id: TransactionId, at: f64) -> Result<(), TxnError>;
    async fn mark_committed(&self, id: TransactionId, at: f64) -> Result<(), TxnError>;
    async fn mark_aborted(&self, id: TransactionId, at: f64, error: String) -> Result<(), TxnError>;
    async fn mark_aborted_recovered(&self, id: TransactionId, at: f64) -> Result<(), TxnError>;

    async fn get(&self, id: TransactionId) -> Result<Option<TxnLogEntry>, TxnError>;

    /// All log entries currently in state `PREPARED_ALL`. Used only by the
    /// Recovery Worker (spec §4.3).
    async fn scan_prepared_all(&self) -> Result<Vec<TxnLogEntry>, TxnError>;

    async fn idempotency_get(&self, key: &str) -> Result<Option<TransferResponse>, TxnError>;
    async fn idempotency_put(&self, key: &str, response: TransferResponse) -> Result<(), TxnError>;

    /// Acquire the advisory lock for an ordered account pair, waiting up to
    /// `wait` before giving up. The lock self-expires after `hold` even if
    /// never released, so a crashed Coordinator cannot strand it (spec §5).
    async fn acquire_pair_lock(
        &self,
        src: &str,
        dst: &str,
        wait: Duration,
        hold: Duration,
    ) -> Result<Option<LockToken>, TxnError>;

    /// Best-effort release; a lock that has already expired is not an error.
    async fn release_pair_lock(&self, token: LockToken) -> Result<(), TxnError>;
}
