//! Redis-backed implementation of [`TxnStore`].
//!
//! This is the one dependency the teacher workspace doesn't already carry —
//! `bleep-auth`'s manifest advertises "JWT session management" and
//! `bleep-state` has an in-process lock manager, but nothing in the pack
//! ships a Redis client. `original_source/services/api/main.py` talks to
//! Redis via `redis.asyncio` for exactly this purpose (hash records, TTL
//! strings, a distributed lock), so the `redis` crate is the direct Rust
//! counterpart rather than an invented dependency.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use tracing::warn;
use txn_core::{clock, TransferResponse, TxnError, TxnLogEntry, TxnState, TransactionId};

use crate::lock::{idem_key, pair_key, txn_key, LockToken};
use crate::store::TxnStore;

pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, TxnError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| TxnError::Dependency(format!("invalid redis url: {e}")))?;
        let conn = client
            .get_tokio_connection_manager()
            .await
            .map_err(|e| TxnError::Dependency(format!("redis unreachable: {e}")))?;
        Ok(RedisStore { conn })
    }

    fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

fn entry_to_fields(e: &TxnLogEntry) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("txn_id", e.txn_id.as_str()),
        ("state", e.state.as_str().to_string()),
        ("src", e.src.clone()),
        ("dst", e.dst.clone()),
        ("amount", e.amount.to_string()),
        ("created_at", e.created_at.to_string()),
        ("updated_at", e.updated_at.to_string()),
    ];
    if let Some(v) = e.prepared_at {
        fields.push(("prepared_at", v.to_string()));
    }
    if let Some(v) = e.committed_at {
        fields.push(("committed_at", v.to_string()));
    }
    if let Some(v) = e.aborted_at {
        fields.push(("aborted_at", v.to_string()));
    }
    if let Some(v) = e.recovered_at {
        fields.push(("recovered_at", v.to_string()));
    }
    if let Some(v) = &e.error {
        fields.push(("error", v.clone()));
    }
    fields
}

fn fields_to_entry(fields: HashMap<String, String>) -> Result<TxnLogEntry, TxnError> {
    let get = |k: &str| fields.get(k).cloned();
    let txn_id = TransactionId::parse(
        &get("txn_id").ok_or_else(|| TxnError::Dependency("corrupt txn record: missing txn_id".into()))?,
    )
    .map_err(|e| TxnError::Dependency(format!("corrupt txn_id: {e}")))?;
    let state = TxnState::parse(&get("state").unwrap_or_default())
        .ok_or_else(|| TxnError::Dependency("corrupt txn record: unknown state".into()))?;
    Ok(TxnLogEntry {
        txn_id,
        state,
        src: get("src").unwrap_or_default(),
        dst: get("dst").unwrap_or_default(),
        amount: get("amount").and_then(|v| v.parse().ok()).unwrap_or(0),
        created_at: get("created_at").and_then(|v| v.parse().ok()).unwrap_or(0.0),
        prepared_at: get("prepared_at").and_then(|v| v.parse().ok()),
        committed_at: get("committed_at").and_then(|v| v.parse().ok()),
        aborted_at: get("aborted_at").and_then(|v| v.parse().ok()),
        recovered_at: get("recovered_at").and_then(|v| v.parse().ok()),
        updated_at: get("updated_at").and_then(|v| v.parse().ok()).unwrap_or(0.0),
        error: get("error"),
    })
}

#[async_trait]
impl TxnStore for RedisStore {
    async fn create(&self, entry: TxnLogEntry) -> Result<(), TxnError> {
        let key = txn_key(&entry.txn_id.as_str());
        let fields = entry_to_fields(&entry);
        self.conn()
            .hset_multiple::<_, _, _, ()>(&key, &fields)
            .await
            .map_err(|e| TxnError::Dependency(e.to_string()))
    }

    async fn mark_prepared_all(&self, id: TransactionId, at: f64) -> Result<(), TxnError> {
        let key = txn_key(&id.as_str());
        self.conn()
            .hset_multiple::<_, _, _, ()>(
                &key,
                &[
                    ("state", TxnState::PreparedAll.as_str().to_string()),
                    ("prepared_at", at.to_string()),
                    ("updated_at", at.to_string()),
                ],
            )
            .await
            .map_err(|e| TxnError::Dependency(e.to_string()))
    }

    async fn mark_committed(&self, id: TransactionId, at: f64) -> Result<(), TxnError> {
        let key = txn_key(&id.as_str());
        self.conn()
            .hset_multiple::<_, _, _, ()>(
                &key,
                &[
                    ("state", TxnState::Committed.as_str().to_string()),
                    ("committed_at", at.to_string()),
                    ("updated_at", at.to_string()),
                ],
            )
            .await
            .map_err(|e| TxnError::Dependency(e.to_string()))
    }

    async fn mark_aborted(&self, id: TransactionId, at: f64, error: String) -> Result<(), TxnError> {
        let key = txn_key(&id.as_str());
        self.conn()
            .hset_multiple::<_, _, _, ()>(
                &key,
                &[
                    ("state", TxnState::Aborted.as_str().to_string()),
                    ("aborted_at", at.to_string()),
                    ("updated_at", at.to_string()),
                    ("error", error),
                ],
            )
            .await
            .map_err(|e| TxnError::Dependency(e.to_string()))
    }

    async fn mark_aborted_recovered(&self, id: TransactionId, at: f64) -> Result<(), TxnError> {
        let key = txn_key(&id.as_str());
        self.conn()
            .hset_multiple::<_, _, _, ()>(
                &key,
                &[
                    ("state", TxnState::AbortedRecovered.as_str().to_string()),
                    ("recovered_at", at.to_string()),
                    ("updated_at", at.to_string()),
                ],
            )
            .await
            .map_err(|e| TxnError::Dependency(e.to_string()))
    }

    async fn get(&self, id: TransactionId) -> Result<Option<TxnLogEntry>, TxnError> {
        let key = txn_key(&id.as_str());
        let fields: HashMap<String, String> = self
            .conn()
            .hgetall(&key)
            .await
            .map_err(|e| TxnError::Dependency(e.to_string()))?;
        if fields.is_empty() {
            return Ok(None);
        }
        fields_to_entry(fields).map(Some)
    }

    async fn scan_prepared_all(&self) -> Result<Vec<TxnLogEntry>, TxnError> {
        let mut conn = self.conn();
        let mut iter: redis::AsyncIter<String> = conn
            .scan_match("txn:*")
            .await
            .map_err(|e| TxnError::Dependency(e.to_string()))?;
        let mut keys = Vec::new();
        while let Some(key) = iter.next_item().await {
            keys.push(key);
        }
        drop(iter);

        let mut out = Vec::new();
        for key in keys {
            let fields: HashMap<String, String> = conn
                .hgetall(&key)
                .await
                .map_err(|e| TxnError::Dependency(e.to_string()))?;
            if fields.is_empty() {
                continue;
            }
            match fields_to_entry(fields) {
                Ok(entry) if entry.state == TxnState::PreparedAll => out.push(entry),
                Ok(_) => {}
                Err(e) => warn!(key = %key, error = %e, "skipping corrupt txn record during scan"),
            }
        }
        Ok(out)
    }

    async fn idempotency_get(&self, key: &str) -> Result<Option<TransferResponse>, TxnError> {
        let raw: Option<String> = self
            .conn()
            .get(idem_key(key))
            .await
            .map_err(|e| TxnError::Dependency(e.to_string()))?;
        match raw {
            None => Ok(None),
            Some(s) => serde_json::from_str::<TransferResponse>(&s)
                .map(Some)
                .map_err(|e| TxnError::Dependency(format!("corrupt idempotency record: {e}"))),
        }
    }

    async fn idempotency_put(&self, key: &str, response: TransferResponse) -> Result<(), TxnError> {
        let raw = serde_json::to_string(&response)
            .map_err(|e| TxnError::Dependency(format!("failed to encode idempotency record: {e}")))?;
        self.conn()
            .set_ex::<_, _, ()>(idem_key(key), raw, 24 * 60 * 60)
            .await
            .map_err(|e| TxnError::Dependency(e.to_string()))
    }

    async fn acquire_pair_lock(
        &self,
        src: &str,
        dst: &str,
        wait: Duration,
        hold: Duration,
    ) -> Result<Option<LockToken>, TxnError> {
        let key = pair_key(src, dst);
        let hold_ms = hold.as_millis() as usize;
        let deadline = clock::now_unix() + wait.as_secs_f64();

        loop {
            let fencing_value: String = rand::thread_rng()
                .sample_iter(&rand::distributions::Alphanumeric)
                .take(20)
                .map(char::from)
                .collect();

            let acquired: Option<String> = redis::cmd("SET")
                .arg(&key)
                .arg(&fencing_value)
                .arg("NX")
                .arg("PX")
                .arg(hold_ms)
                .query_async(&mut self.conn())
                .await
                .map_err(|e| TxnError::Dependency(e.to_string()))?;

            if acquired.is_some() {
                return Ok(Some(LockToken {
                    pair_key: key,
                    fencing_value,
                }));
            }

            if clock::now_unix() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    async fn release_pair_lock(&self, token: LockToken) -> Result<(), TxnError> {
        const RELEASE: &str = r#"
            if redis.call("GET", KEYS[1]) == ARGV[1] then
                return redis.call("DEL", KEYS[1])
            else
                return 0
            end
        "#;
        Script::new(RELEASE)
            .key(&token.pair_key)
            .arg(&token.fencing_value)
            .invoke_async::<_, i64>(&mut self.conn())
            .await
            .map(|_| ())
            .map_err(|e| TxnError::Dependency(e.to_string()))
    }
}
