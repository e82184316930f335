//! The `/transfer` orchestration algorithm (spec §4.2): idempotency check,
//! pair lock, prepare both participants, optional crash point, commit both,
//! finalise — or abort and roll back best-effort on any failure.
//!
//! Grounded on the teacher's `bleep-state::cross_shard_2pc::TwoPhaseCommitCoordinator`
//! (phase enum driving prepare → ready-to-commit → committing/aborting →
//! terminal) collapsed into a single straight-line async function: this
//! system drives exactly two participants per transfer rather than an
//! open set of shards voting asynchronously, so there is no need for a
//! standalone vote-collection state machine — `original_source`'s
//! `services/api/main.py::transfer` is the literal sequencing reference.

use std::sync::Arc;

use tracing::{info, warn};
use txn_core::clock::now_unix;
use txn_core::{
    Direction, Simulate, TransactionId, TransferRequest, TransferResponse, TxnError, TxnLogEntry,
    TxnState,
};
use txn_rpc::ParticipantClient;
use txn_store::TxnStore;

use crate::service::CoordinatorService;

pub async fn transfer(
    service: &CoordinatorService,
    req: TransferRequest,
) -> Result<TransferResponse, TxnError> {
    service.metrics.transfer_requests_total.incr();
    let started_at = now_unix();

    if req.from_account == req.to_account {
        return Err(TxnError::Validation("from_account == to_account".to_string()));
    }
    if req.amount == 0 {
        return Err(TxnError::Validation("amount must be positive".to_string()));
    }

    if let Some(key) = req.idempotency_key.as_deref() {
        if let Some(cached) = service.store.idempotency_get(key).await? {
            service.metrics.transfer_idempotent_hits_total.incr();
            return Ok(cached);
        }
    }

    let src_client = service.participant(&req.from_account)?;
    let dst_client = service.participant(&req.to_account)?;

    let txn_id = TransactionId::new();
    let created_at = now_unix();
    service
        .store
        .create(TxnLogEntry {
            txn_id,
            state: TxnState::Init,
            src: req.from_account.clone(),
            dst: req.to_account.clone(),
            amount: req.amount,
            created_at,
            prepared_at: None,
            committed_at: None,
            aborted_at: None,
            recovered_at: None,
            updated_at: created_at,
            error: None,
        })
        .await?;

    let lock_token = service
        .store
        .acquire_pair_lock(
            &req.from_account,
            &req.to_account,
            service.config.pair_lock_wait,
            service.config.pair_lock_hold,
        )
        .await?
        .ok_or(TxnError::PairBusy)?;

    let result = run_2pc(service, &req, &txn_id, src_client, dst_client).await;

    if let Err(e) = service.store.release_pair_lock(lock_token).await {
        warn!(error = %e, "failed to release pair lock");
    }

    let latency_ms = (now_unix() - started_at) * 1000.0;
    service.metrics.transfer_latency_ms_avg.update(latency_ms);

    let response = result?;
    if let Some(key) = req.idempotency_key.as_deref() {
        service.store.idempotency_put(key, response.clone()).await?;
    }
    Ok(response)
}

async fn run_2pc(
    service: &CoordinatorService,
    req: &TransferRequest,
    txn_id: &TransactionId,
    src_client: &ParticipantClient,
    dst_client: &ParticipantClient,
) -> Result<TransferResponse, TxnError> {
    match drive_prepare_and_commit(service, req, txn_id, src_client, dst_client).await {
        Ok(()) => {
            service.metrics.transfer_commits_total.incr();
            info!(%txn_id, "transfer committed");
            Ok(TransferResponse::committed(*txn_id))
        }
        Err(e) => {
            abort(service, txn_id, req, src_client, dst_client, e.to_string()).await;
            service.metrics.transfer_rollbacks_total.incr();
            Err(TxnError::TransactionAborted(e.to_string()))
        }
    }
}

async fn drive_prepare_and_commit(
    service: &CoordinatorService,
    req: &TransferRequest,
    txn_id: &TransactionId,
    src_client: &ParticipantClient,
    dst_client: &ParticipantClient,
) -> Result<(), TxnError> {
    let crash_src = crash_after_prepare_for(&req.simulate, &req.from_account);
    let crash_dst = crash_after_prepare_for(&req.simulate, &req.to_account);

    // Fixed order — src (debit) strictly before dst (credit) — per spec §5.
    src_client
        .prepare(*txn_id, req.amount, Direction::Debit, crash_src)
        .await?;
    dst_client
        .prepare(*txn_id, req.amount, Direction::Credit, crash_dst)
        .await?;

    let prepared_at = now_unix();
    service.store.mark_prepared_all(*txn_id, prepared_at).await?;

    if req
        .simulate
        .as_ref()
        .map(|s| s.crash_coordinator_after_prepare)
        .unwrap_or(false)
    {
        // PREPARED_ALL is already durable; the Recovery Worker reaps this
        // after a restart (spec §4.2 step 6, scenario 4).
        std::process::exit(1);
    }

    src_client.commit(*txn_id).await?;
    dst_client.commit(*txn_id).await?;

    let committed_at = now_unix();
    service.store.mark_committed(*txn_id, committed_at).await?;
    Ok(())
}

fn crash_after_prepare_for(simulate: &Option<Simulate>, account: &str) -> bool {
    simulate
        .as_ref()
        .and_then(|s| s.crash_participant.as_ref())
        .map(|c| c.name == account && c.stage == "after_prepare")
        .unwrap_or(false)
}

async fn abort(
    service: &CoordinatorService,
    txn_id: &TransactionId,
    req: &TransferRequest,
    src_client: &ParticipantClient,
    dst_client: &ParticipantClient,
    error: String,
) {
    warn!(%txn_id, %error, "aborting transfer");

    if let Err(e) = src_client.rollback(*txn_id).await {
        warn!(%txn_id, account = %req.from_account, error = %e, "best-effort rollback failed");
    }
    if let Err(e) = dst_client.rollback(*txn_id).await {
        warn!(%txn_id, account = %req.to_account, error = %e, "best-effort rollback failed");
    }

    let aborted_at = now_unix();
    if let Err(e) = service.store.mark_aborted(*txn_id, aborted_at, error).await {
        warn!(%txn_id, error = %e, "failed to record ABORTED state");
    }
}

pub async fn get_transaction(
    store: &Arc<dyn TxnStore>,
    txn_id: TransactionId,
) -> Result<TxnLogEntry, TxnError> {
    store.get(txn_id).await?.ok_or(TxnError::NotFound)
}
