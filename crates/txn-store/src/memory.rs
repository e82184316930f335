//! `dashmap`-backed fake of the shared store, used by coordinator and
//! recovery-worker tests so the 2PC control plane can be exercised without a
//! live Redis. Mirrors the map-of-maps shape
//! `bleep-state::cross_shard_locking::ShardLockManager` uses for its
//! key-to-lock index, generalized with a TTL clock for idempotency records
//! and lock holds.

use std::collections::HashMap;
use std::sync::Mutex as StdMutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use rand::Rng;
use txn_core::{TransferResponse, TxnError, TxnLogEntry, TransactionId};

use crate::lock::{pair_key, LockToken};
use crate::store::TxnStore;

struct IdemEntry {
    response: TransferResponse,
    expires_at: Instant,
}

struct LockEntry {
    fencing_value: String,
    expires_at: Instant,
}

/// In-memory substitute for a Redis-backed store. `Send + Sync`, cheap to
/// clone via `Arc`, safe to share across coordinator tasks in tests.
#[derive(Default)]
pub struct InMemoryStore {
    txns: DashMap<String, TxnLogEntry>,
    idem: DashMap<String, IdemEntry>,
    locks: StdMutex<HashMap<String, LockEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TxnStore for InMemoryStore {
    async fn create(&self, entry: TxnLogEntry) -> Result<(), TxnError> {
        self.txns.insert(entry.txn_id.as_str(), entry);
        Ok(())
    }

    async fn mark_prepared_all(&self, id: TransactionId, at: f64) -> Result<(), TxnError> {
        if let Some(mut e) = self.txns.get_mut(&id.as_str()) {
            e.state = txn_core::TxnState::PreparedAll;
            e.prepared_at = Some(at);
            e.updated_at = at;
        }
        Ok(())
    }

    async fn mark_committed(&self, id: TransactionId, at: f64) -> Result<(), TxnError> {
        if let Some(mut e) = self.txns.get_mut(&id.as_str()) {
            e.state = txn_core::TxnState::Committed;
            e.committed_at = Some(at);
            e.updated_at = at;
        }
        Ok(())
    }

    async fn mark_aborted(&self, id: TransactionId, at: f64, error: String) -> Result<(), TxnError> {
        if let Some(mut e) = self.txns.get_mut(&id.as_str()) {
            e.state = txn_core::TxnState::Aborted;
            e.aborted_at = Some(at);
            e.updated_at = at;
            e.error = Some(error);
        }
        Ok(())
    }

    async fn mark_aborted_recovered(&self, id: TransactionId, at: f64) -> Result<(), TxnError> {
        if let Some(mut e) = self.txns.get_mut(&id.as_str()) {
            e.state = txn_core::TxnState::AbortedRecovered;
            e.recovered_at = Some(at);
            e.updated_at = at;
        }
        Ok(())
    }

    async fn get(&self, id: TransactionId) -> Result<Option<TxnLogEntry>, TxnError> {
        Ok(self.txns.get(&id.as_str()).map(|e| e.clone()))
    }

    async fn scan_prepared_all(&self) -> Result<Vec<TxnLogEntry>, TxnError> {
        Ok(self
            .txns
            .iter()
            .filter(|e| e.state == txn_core::TxnState::PreparedAll)
            .map(|e| e.clone())
            .collect())
    }

    async fn idempotency_get(&self, key: &str) -> Result<Option<TransferResponse>, TxnError> {
        if let Some(entry) = self.idem.get(key) {
            if entry.expires_at > Instant::now() {
                return Ok(Some(entry.response.clone()));
            }
        }
        Ok(None)
    }

    async fn idempotency_put(&self, key: &str, response: TransferResponse) -> Result<(), TxnError> {
        self.idem.insert(
            key.to_string(),
            IdemEntry {
                response,
                expires_at: Instant::now() + Duration::from_secs(24 * 60 * 60),
            },
        );
        Ok(())
    }

    async fn acquire_pair_lock(
        &self,
        src: &str,
        dst: &str,
        wait: Duration,
        hold: Duration,
    ) -> Result<Option<LockToken>, TxnError> {
        let key = pair_key(src, dst);
        let deadline = Instant::now() + wait;
        loop {
            {
                let mut locks = self.locks.lock().unwrap();
                let expired = locks
                    .get(&key)
                    .map(|e| e.expires_at <= Instant::now())
                    .unwrap_or(true);
                if expired {
                    let fencing_value: String = rand::thread_rng()
                        .sample_iter(&rand::distributions::Alphanumeric)
                        .take(16)
                        .map(char::from)
                        .collect();
                    locks.insert(
                        key.clone(),
                        LockEntry {
                            fencing_value: fencing_value.clone(),
                            expires_at: Instant::now() + hold,
                        },
                    );
                    return Ok(Some(LockToken {
                        pair_key: key,
                        fencing_value,
                    }));
                }
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    async fn release_pair_lock(&self, token: LockToken) -> Result<(), TxnError> {
        let mut locks = self.locks.lock().unwrap();
        if let Some(entry) = locks.get(&token.pair_key) {
            if entry.fencing_value == token.fencing_value {
                locks.remove(&token.pair_key);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txn_core::TxnState;

    fn entry(id: TransactionId) -> TxnLogEntry {
        TxnLogEntry {
            txn_id: id,
            state: TxnState::Init,
            src: "A".into(),
            dst: "B".into(),
            amount: 10,
            created_at: 0.0,
            prepared_at: None,
            committed_at: None,
            aborted_at: None,
            recovered_at: None,
            updated_at: 0.0,
            error: None,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = InMemoryStore::new();
        let id = TransactionId::new();
        store.create(entry(id)).await.unwrap();
        let got = store.get(id).await.unwrap().unwrap();
        assert_eq!(got.state, TxnState::Init);
    }

    #[tokio::test]
    async fn scan_prepared_all_only_returns_that_state() {
        let store = InMemoryStore::new();
        let a = TransactionId::new();
        let b = TransactionId::new();
        store.create(entry(a)).await.unwrap();
        store.create(entry(b)).await.unwrap();
        store.mark_prepared_all(a, 1.0).await.unwrap();
        store.mark_committed(b, 1.0).await.unwrap();

        let prepared = store.scan_prepared_all().await.unwrap();
        assert_eq!(prepared.len(), 1);
        assert_eq!(prepared[0].txn_id, a);
    }

    #[tokio::test]
    async fn second_lock_acquire_waits_then_times_out() {
        let store = InMemoryStore::new();
        let first = store
            .acquire_pair_lock("A", "B", Duration::from_millis(50), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(first.is_some());

        let second = store
            .acquire_pair_lock("A", "B", Duration::from_millis(100), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn lock_is_acquirable_again_after_release() {
        let store = InMemoryStore::new();
        let token = store
            .acquire_pair_lock("A", "B", Duration::from_millis(50), Duration::from_secs(5))
            .await
            .unwrap()
            .unwrap();
        store.release_pair_lock(token).await.unwrap();

        let second = store
            .acquire_pair_lock("A", "B", Duration::from_millis(50), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(second.is_some());
    }

    #[tokio::test]
    async fn idempotency_round_trips() {
        let store = InMemoryStore::new();
        let resp = TransferResponse {
            transaction_id: "t1".into(),
            status: "committed".into(),
        };
        store.idempotency_put("k1", resp.clone()).await.unwrap();
        let got = store.idempotency_get("k1").await.unwrap();
        assert_eq!(got, Some(resp));
    }
}
