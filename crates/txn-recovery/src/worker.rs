//! The self-driving recovery loop.
//!
//! `run` never returns on its own (spec §9: "the task must be restarted if
//! it terminates") — the Coordinator binary wraps it with `tokio::spawn` and
//! a supervising loop that logs and respawns if the task panics.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info, warn};
use txn_core::clock::now_unix;
use txn_rpc::ParticipantClient;
use txn_store::TxnStore;

use crate::config::RecoveryConfig;

/// Holds everything the worker needs: the shared log and a client per
/// account name, so it can resolve `src`/`dst` on a log entry to the right
/// Participant to call. Participants never speak to the store themselves
/// (spec §2) — this worker is one of exactly two things that do.
pub struct RecoveryWorker {
    store: Arc<dyn TxnStore>,
    participants: HashMap<String, ParticipantClient>,
    config: RecoveryConfig,
}

impl RecoveryWorker {
    pub fn new(
        store: Arc<dyn TxnStore>,
        participants: HashMap<String, ParticipantClient>,
        config: RecoveryConfig,
    ) -> Self {
        RecoveryWorker {
            store,
            participants,
            config,
        }
    }

    /// Run the scan loop forever, one tick every `config.tick_interval`.
    /// Errors scanning or rolling back a single transaction are logged and
    /// never stop the loop (spec §4.3, §7 propagation policy).
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.config.tick_interval);
        loop {
            ticker.tick().await;
            if let Err(e) = self.tick().await {
                error!(error = %e, "recovery worker tick failed, continuing");
            }
        }
    }

    /// One scan-and-reap pass, exposed separately so tests can drive it
    /// deterministically instead of waiting on the wall clock.
    pub async fn tick(&self) -> Result<(), txn_core::TxnError> {
        let entries = self.store.scan_prepared_all().await?;
        let now = now_unix();

        for entry in entries {
            let prepared_at = match entry.prepared_at {
                Some(t) => t,
                None => {
                    warn!(txn_id = %entry.txn_id, "PREPARED_ALL entry missing prepared_at, skipping");
                    continue;
                }
            };

            let age = now - prepared_at;
            if age < self.config.rollback_timeout.as_secs_f64() {
                continue;
            }

            self.reap(entry.txn_id, &entry.src, &entry.dst).await;
        }

        Ok(())
    }

    async fn reap(&self, txn_id: txn_core::TransactionId, src: &str, dst: &str) {
        info!(%txn_id, src, dst, "reaping transaction stuck in PREPARED_ALL");

        if let Some(client) = self.participants.get(src) {
            if let Err(e) = client.rollback(txn_id).await {
                warn!(%txn_id, account = src, error = %e, "best-effort rollback failed during recovery");
            }
        } else {
            warn!(%txn_id, account = src, "no client configured for participant");
        }

        if let Some(client) = self.participants.get(dst) {
            if let Err(e) = client.rollback(txn_id).await {
                warn!(%txn_id, account = dst, error = %e, "best-effort rollback failed during recovery");
            }
        } else {
            warn!(%txn_id, account = dst, "no client configured for participant");
        }

        if let Err(e) = self.store.mark_aborted_recovered(txn_id, now_unix()).await {
            error!(%txn_id, error = %e, "failed to mark transaction ABORTED_RECOVERED");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use txn_core::{AccountName, TxnLogEntry, TxnState};
    use txn_store::InMemoryStore;

    use super::*;

    fn entry(txn_id: txn_core::TransactionId, state: TxnState, prepared_at: Option<f64>) -> TxnLogEntry {
        TxnLogEntry {
            txn_id,
            state,
            src: "A".to_string(),
            dst: "B".to_string(),
            amount: 100,
            created_at: 0.0,
            prepared_at,
            committed_at: None,
            aborted_at: None,
            recovered_at: None,
            updated_at: 0.0,
            error: None,
        }
    }

    fn participants() -> HashMap<AccountName, ParticipantClient> {
        // Unreachable URLs: the worker must tolerate rollback RPC failure
        // without letting it stop the scan or the ABORTED_RECOVERED write.
        let mut m = HashMap::new();
        m.insert(
            "A".to_string(),
            ParticipantClient::new("http://127.0.0.1:1", Duration::from_millis(50)),
        );
        m.insert(
            "B".to_string(),
            ParticipantClient::new("http://127.0.0.1:1", Duration::from_millis(50)),
        );
        m
    }

    #[tokio::test]
    async fn reaps_stale_prepared_all_entry() {
        let store: Arc<dyn TxnStore> = Arc::new(InMemoryStore::default());
        let txn_id = txn_core::TransactionId::new();
        let now = now_unix();
        store
            .create(entry(txn_id, TxnState::PreparedAll, Some(now - 100.0)))
            .await
            .unwrap();

        let worker = RecoveryWorker::new(
            store.clone(),
            participants(),
            RecoveryConfig {
                tick_interval: Duration::from_secs(2),
                rollback_timeout: Duration::from_secs(10),
            },
        );
        worker.tick().await.unwrap();

        let reloaded = store.get(txn_id).await.unwrap().unwrap();
        assert_eq!(reloaded.state, TxnState::AbortedRecovered);
        assert!(reloaded.recovered_at.is_some());
    }

    #[tokio::test]
    async fn leaves_fresh_prepared_all_entry_untouched() {
        let store: Arc<dyn TxnStore> = Arc::new(InMemoryStore::default());
        let txn_id = txn_core::TransactionId::new();
        store
            .create(entry(txn_id, TxnState::PreparedAll, Some(now_unix())))
            .await
            .unwrap();

        let worker = RecoveryWorker::new(
            store.clone(),
            participants(),
            RecoveryConfig {
                tick_interval: Duration::from_secs(2),
                rollback_timeout: Duration::from_secs(10),
            },
        );
        worker.tick().await.unwrap();

        let reloaded = store.get(txn_id).await.unwrap().unwrap();
        assert_eq!(reloaded.state, TxnState::PreparedAll);
    }

    #[tokio::test]
    async fn never_touches_committed_transactions() {
        let store: Arc<dyn TxnStore> = Arc::new(InMemoryStore::default());
        let txn_id = txn_core::TransactionId::new();
        let mut e = entry(txn_id, TxnState::Committed, Some(now_unix() - 1000.0));
        e.committed_at = Some(now_unix());
        store.create(e).await.unwrap();

        let worker = RecoveryWorker::new(
            store.clone(),
            participants(),
            RecoveryConfig::default(),
        );
        worker.tick().await.unwrap();

        let reloaded = store.get(txn_id).await.unwrap().unwrap();
        assert_eq!(reloaded.state, TxnState::Committed);
    }
}
