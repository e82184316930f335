//! Shared vocabulary for the ledger2pc workspace: transaction identifiers,
//! the account and transaction-log data model, the error taxonomy shared by
//! the coordinator and participant HTTP surfaces, and the plain-text metrics
//! registry both services render on `GET /metrics`.

pub mod clock;
pub mod error;
pub mod ids;
pub mod metrics;
pub mod model;

pub use error::TxnError;
pub use ids::TransactionId;
pub use model::{
    AccountName, AccountState, BalanceResponse, CommittedResponse, Direction, IdempotencyRecord,
    PrepareRequest, PreparedResponse, RolledBackResponse, Simulate, TransferRequest,
    TransferResponse, TxnIdRequest, TxnLogEntry, TxnState,
};
