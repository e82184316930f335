//! The Coordinator (spec §4.2): authenticates `/transfer` requests,
//! deduplicates by idempotency key, serialises transfers over an ordered
//! account pair, and drives 2PC across exactly two Participants.
//!
//! Module layout: `auth` (JWT verification), `config` (env vars),
//! `service` (the explicit service object — store, participant clients,
//! metrics), `transfer` (the orchestration algorithm), `routes` (the warp
//! HTTP surface).

pub mod auth;
pub mod config;
pub mod routes;
pub mod service;
pub mod transfer;

pub use config::CoordinatorConfig;
pub use service::CoordinatorService;

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use txn_core::{TransferRequest, TxnError};
    use txn_participant::ParticipantService as RealParticipantService;
    use txn_rpc::ParticipantClient;
    use txn_store::{InMemoryStore, TxnStore};
    use warp::Filter;

    use crate::config::CoordinatorConfig;
    use crate::service::CoordinatorService;
    use crate::transfer::transfer;

    /// Spins up two real in-process Participant HTTP servers on loopback
    /// ports, wired to a `CoordinatorService`, exercising the whole
    /// Coordinator-to-Participant wire path rather than mocking it.
    async fn setup(balance_a: i64, balance_b: i64) -> (CoordinatorService, Vec<tokio::task::JoinHandle<()>>) {
        let mut handles = Vec::new();
        let mut participants = HashMap::new();

        for (name, balance, port) in [("A", balance_a, 0u16), ("B", balance_b, 0u16)] {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("state.json");
            std::mem::forget(dir);
            let svc = Arc::new(
                RealParticipantService::load(name.to_string(), path, balance).unwrap(),
            );
            let routes = txn_participant::routes::routes(svc);
            let (addr, fut) =
                warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], port));
            handles.push(tokio::spawn(fut));
            participants.insert(
                name.to_string(),
                ParticipantClient::new(format!("http://{addr}"), Duration::from_secs(5)),
            );
        }

        let store: Arc<dyn TxnStore> = Arc::new(InMemoryStore::default());
        let mut config = CoordinatorConfig::from_env().unwrap();
        config.pair_lock_wait = Duration::from_secs(2);
        config.pair_lock_hold = Duration::from_secs(15);

        let service = CoordinatorService::new(store, participants, config);
        (service, handles)
    }

    #[tokio::test]
    async fn happy_path_commits_and_updates_both_balances() {
        let (service, _handles) = setup(1000, 1000).await;

        let req = TransferRequest {
            from_account: "A".to_string(),
            to_account: "B".to_string(),
            amount: 100,
            idempotency_key: None,
            simulate: None,
        };
        let resp = transfer(&service, req).await.unwrap();
        assert_eq!(resp.status, "committed");

        let a_balance = service.participant("A").unwrap().balance().await.unwrap();
        let b_balance = service.participant("B").unwrap().balance().await.unwrap();
        assert_eq!(a_balance.balance, 900);
        assert_eq!(b_balance.balance, 1100);
    }

    #[tokio::test]
    async fn insufficient_funds_aborts_and_leaves_balances_untouched() {
        let (service, _handles) = setup(50, 1000).await;

        let req = TransferRequest {
            from_account: "A".to_string(),
            to_account: "B".to_string(),
            amount: 100,
            idempotency_key: None,
            simulate: None,
        };
        let err = transfer(&service, req).await.unwrap_err();
        assert!(matches!(err, TxnError::TransactionAborted(_)));

        let a_balance = service.participant("A").unwrap().balance().await.unwrap();
        let b_balance = service.participant("B").unwrap().balance().await.unwrap();
        assert_eq!(a_balance.balance, 50);
        assert_eq!(b_balance.balance, 1000);
        assert!(a_balance.holds.is_empty());
        assert!(b_balance.pendings.is_empty());
    }

    #[tokio::test]
    async fn idempotent_replay_returns_identical_response_without_double_spend() {
        let (service, _handles) = setup(1000, 1000).await;

        let req = TransferRequest {
            from_account: "A".to_string(),
            to_account: "B".to_string(),
            amount: 10,
            idempotency_key: Some("k1".to_string()),
            simulate: None,
        };

        let first = transfer(&service, req.clone()).await.unwrap();
        let second = transfer(&service, req).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(service.metrics.transfer_idempotent_hits_total.get(), 1);

        let a_balance = service.participant("A").unwrap().balance().await.unwrap();
        assert_eq!(a_balance.balance, 990);
    }

    #[tokio::test]
    async fn mismatched_accounts_are_rejected_before_any_state_is_created() {
        let (service, _handles) = setup(1000, 1000).await;
        let req = TransferRequest {
            from_account: "A".to_string(),
            to_account: "A".to_string(),
            amount: 10,
            idempotency_key: None,
            simulate: None,
        };
        let err = transfer(&service, req).await.unwrap_err();
        assert!(matches!(err, TxnError::Validation(_)));
    }

    #[tokio::test]
    async fn unreachable_source_participant_aborts_without_touching_destination() {
        // A stands in for a crashed/unreachable participant: its prepare
        // RPC fails immediately, so the coordinator never prepares B and
        // aborts, issuing a best-effort (ignored) rollback to the
        // unreachable A and a no-op rollback to B.
        let (mut service, handles) = setup(1000, 1000).await;
        service.participants.insert(
            "A".to_string(),
            ParticipantClient::new("http://127.0.0.1:1", Duration::from_millis(100)),
        );

        let req = TransferRequest {
            from_account: "A".to_string(),
            to_account: "B".to_string(),
            amount: 100,
            idempotency_key: None,
            simulate: None,
        };

        let err = transfer(&service, req).await.unwrap_err();
        assert!(matches!(err, TxnError::TransactionAborted(_)));

        let b_balance = service.participant("B").unwrap().balance().await.unwrap();
        assert_eq!(b_balance.balance, 1000);
        assert!(b_balance.pendings.is_empty());
        drop(handles);
    }
}
