//! `warp` HTTP surface for one Participant: `/prepare`, `/commit`,
//! `/rollback`, `/balance`, `/healthz`, `/metrics` (spec §6).
//!
//! Route shape (`warp::path!`, `.and(warp::post())`, `.and_then` returning
//! `Result<_, warp::Rejection>`, one `.or()` chain) follows the teacher's
//! `bleep-rpc::rpc` server; the rejection handler is new, since the teacher
//! never mapped its errors to HTTP status codes beyond warp's defaults.

use std::convert::Infallible;
use std::sync::Arc;

use serde::Serialize;
use tracing::error;
use txn_core::{CommittedResponse, PrepareRequest, PreparedResponse, RolledBackResponse, TxnError, TxnIdRequest};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::service::ParticipantService;

#[derive(Debug)]
struct ApiError(TxnError);

impl warp::reject::Reject for ApiError {}

fn reject(e: TxnError) -> Rejection {
    warp::reject::custom(ApiError(e))
}

fn with_service(
    service: Arc<ParticipantService>,
) -> impl Filter<Extract = (Arc<ParticipantService>,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

pub fn routes(
    service: Arc<ParticipantService>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let prepare = warp::path("prepare")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_service(service.clone()))
        .and_then(handle_prepare);

    let commit = warp::path("commit")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_service(service.clone()))
        .and_then(handle_commit);

    let rollback = warp::path("rollback")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_service(service.clone()))
        .and_then(handle_rollback);

    let balance = warp::path("balance")
        .and(warp::get())
        .and(with_service(service.clone()))
        .and_then(handle_balance);

    let healthz = warp::path("healthz")
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({"status": "ok"})));

    let metrics = warp::path("metrics")
        .and(warp::get())
        .and(with_service(service))
        .and_then(handle_metrics);

    prepare
        .or(commit)
        .or(rollback)
        .or(balance)
        .or(healthz)
        .or(metrics)
        .recover(handle_rejection)
        .with(warp::log("txn_participant"))
        .boxed()
}

async fn handle_prepare(
    req: PrepareRequest,
    service: Arc<ParticipantService>,
) -> Result<impl Reply, Rejection> {
    service
        .prepare(
            &req.transaction_id,
            req.amount,
            req.direction,
            req.crash_after_prepare,
        )
        .map_err(reject)?;
    Ok(warp::reply::json(&PreparedResponse { prepared: true }))
}

async fn handle_commit(
    req: TxnIdRequest,
    service: Arc<ParticipantService>,
) -> Result<impl Reply, Rejection> {
    service.commit(&req.transaction_id);
    Ok(warp::reply::json(&CommittedResponse { committed: true }))
}

async fn handle_rollback(
    req: TxnIdRequest,
    service: Arc<ParticipantService>,
) -> Result<impl Reply, Rejection> {
    service.rollback(&req.transaction_id);
    Ok(warp::reply::json(&RolledBackResponse { rolled_back: true }))
}

async fn handle_balance(service: Arc<ParticipantService>) -> Result<impl Reply, Rejection> {
    let state = service.snapshot();
    Ok(warp::reply::json(&txn_core::BalanceResponse {
        account: state.account,
        balance: state.balance,
        holds: state.holds,
        pendings: state.pendings,
    }))
}

async fn handle_metrics(service: Arc<ParticipantService>) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::with_header(
        service.render_metrics(),
        "content-type",
        "text/plain; version=0.0.4",
    ))
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, detail) = if let Some(ApiError(e)) = err.find() {
        (
            StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            e.detail(),
        )
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some() {
        (StatusCode::BAD_REQUEST, "malformed request body".to_string())
    } else {
        error!(?err, "unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody { detail }),
        status,
    ))
}
