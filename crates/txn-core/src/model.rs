//! Data model shared by the participant and coordinator HTTP surfaces.
//!
//! `AccountState`'s shape is grounded on the teacher's
//! `cross_shard_transaction::CrossShardTransactionLifecycle` (a plain struct
//! of `BTreeMap`s keyed by transaction id), and `TxnState` mirrors the closed
//! `CrossShardTransactionStatus` enum rather than a free-form string.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::TransactionId;

/// An account identifier ("A", "B", ...). Kept as a plain `String` rather
/// than an interned newtype: the participant directory is tiny (two
/// accounts per transfer, per spec) and accounts are never hashed at scale.
pub type AccountName = String;

/// Direction of a prepared hold on a Participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Debit,
    Credit,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "debit" => Some(Direction::Debit),
            "credit" => Some(Direction::Credit),
            _ => None,
        }
    }
}

/// Durable per-account state owned by a single Participant.
///
/// Invariants (enforced by `txn-participant::state`, not here — this is the
/// wire/storage shape only): `balance >= 0`; a transaction id appears in at
/// most one of `holds`/`pendings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountState {
    pub account: AccountName,
    pub balance: i64,
    #[serde(default)]
    pub holds: BTreeMap<String, u64>,
    #[serde(default)]
    pub pendings: BTreeMap<String, u64>,
}

impl AccountState {
    pub fn new(account: AccountName, initial_balance: i64) -> Self {
        AccountState {
            account,
            balance: initial_balance,
            holds: BTreeMap::new(),
            pendings: BTreeMap::new(),
        }
    }
}

/// Lifecycle state of a transaction log entry. Closed enum, matching the
/// teacher's `CrossShardTransactionStatus` rather than a loosely-typed
/// string field — `state` is serialized to/from its name in the shared store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxnState {
    Init,
    PreparedAll,
    Committed,
    Aborted,
    AbortedRecovered,
}

impl TxnState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnState::Init => "INIT",
            TxnState::PreparedAll => "PREPARED_ALL",
            TxnState::Committed => "COMMITTED",
            TxnState::Aborted => "ABORTED",
            TxnState::AbortedRecovered => "ABORTED_RECOVERED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INIT" => Some(TxnState::Init),
            "PREPARED_ALL" => Some(TxnState::PreparedAll),
            "COMMITTED" => Some(TxnState::Committed),
            "ABORTED" => Some(TxnState::Aborted),
            "ABORTED_RECOVERED" => Some(TxnState::AbortedRecovered),
            _ => None,
        }
    }
}

/// One transaction-log entry, as held in the shared store's `txn:<id>` hash.
///
/// Unknown fields read from the store are ignored (per §9's forward
/// compatibility rule) — every optional field here is read with a default,
/// so an entry written by a future coordinator version still decodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxnLogEntry {
    pub txn_id: TransactionId,
    pub state: TxnState,
    pub src: AccountName,
    pub dst: AccountName,
    pub amount: u64,
    pub created_at: f64,
    #[serde(default)]
    pub prepared_at: Option<f64>,
    #[serde(default)]
    pub committed_at: Option<f64>,
    #[serde(default)]
    pub aborted_at: Option<f64>,
    #[serde(default)]
    pub recovered_at: Option<f64>,
    #[serde(default)]
    pub updated_at: f64,
    #[serde(default)]
    pub error: Option<String>,
}

/// Fault-injection knobs, dev-only (see spec §6 "Simulation knobs").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Simulate {
    #[serde(default)]
    pub crash_coordinator_after_prepare: bool,
    #[serde(default)]
    pub crash_participant: Option<CrashParticipant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrashParticipant {
    pub name: AccountName,
    pub stage: String,
}

/// `POST /transfer` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from_account: AccountName,
    pub to_account: AccountName,
    pub amount: u64,
    #[serde(default)]
    pub idempotency_key: Option<String>,
    #[serde(default)]
    pub simulate: Option<Simulate>,
}

/// `POST /transfer` success response. Also the shape stored verbatim under
/// an idempotency key for 24h, so repeated submissions are byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResponse {
    pub transaction_id: String,
    pub status: String,
}

impl TransferResponse {
    pub fn committed(txn_id: TransactionId) -> Self {
        TransferResponse {
            transaction_id: txn_id.as_str(),
            status: "committed".to_string(),
        }
    }
}

/// Idempotency snapshot stored under `idem:<key>`, expires after 24h.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub response: TransferResponse,
}

// -------------------------------------------------------------------------
// Participant HTTP wire contract (spec §6) — shared between
// `txn-participant::routes` (the server side) and `txn-rpc::client` (the
// coordinator/recovery-worker side) so the two never drift apart.
// -------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareRequest {
    pub transaction_id: String,
    pub amount: u64,
    pub direction: Direction,
    #[serde(default)]
    pub crash_after_prepare: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxnIdRequest {
    pub transaction_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedResponse {
    pub prepared: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommittedResponse {
    pub committed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolledBackResponse {
    pub rolled_back: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub account: AccountName,
    pub balance: i64,
    pub holds: BTreeMap<String, u64>,
    pub pendings: BTreeMap<String, u64>,
}
