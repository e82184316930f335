//! `warp` HTTP surface: `POST /transfer`, `GET /transactions/{txn_id}`,
//! `GET /healthz`, `GET /metrics` (spec §6). Route shape follows
//! `txn-participant::routes`, which itself follows the teacher's
//! `bleep-rpc::rpc` server.

use std::convert::Infallible;
use std::sync::Arc;

use serde::Serialize;
use tracing::error;
use txn_core::{TransactionId, TransferRequest, TxnError};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::service::CoordinatorService;
use crate::transfer;

#[derive(Debug)]
struct ApiError(TxnError);

impl warp::reject::Reject for ApiError {}

fn reject(e: TxnError) -> Rejection {
    warp::reject::custom(ApiError(e))
}

fn with_service(
    service: Arc<CoordinatorService>,
) -> impl Filter<Extract = (Arc<CoordinatorService>,), Error = Infallible> + Clone {
    warp::any().map(move || service.clone())
}

pub fn routes(
    service: Arc<CoordinatorService>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let transfer = warp::path("transfer")
        .and(warp::post())
        .and(warp::header::optional::<String>("authorization"))
        .and(warp::body::json())
        .and(with_service(service.clone()))
        .and_then(handle_transfer);

    let get_transaction = warp::path("transactions")
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(with_service(service.clone()))
        .and_then(handle_get_transaction);

    let healthz = warp::path("healthz")
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({"status": "ok"})));

    let metrics = warp::path("metrics")
        .and(warp::get())
        .and(with_service(service))
        .and_then(handle_metrics);

    transfer
        .or(get_transaction)
        .or(healthz)
        .or(metrics)
        .recover(handle_rejection)
        .with(warp::log("txn_coordinator"))
        .boxed()
}

async fn handle_transfer(
    auth_header: Option<String>,
    req: TransferRequest,
    service: Arc<CoordinatorService>,
) -> Result<impl Reply, Rejection> {
    crate::auth::verify_bearer(auth_header.as_deref(), &service.config.jwt_secret).map_err(reject)?;

    let response = transfer::transfer(&service, req).await.map_err(reject)?;
    Ok(warp::reply::json(&response))
}

async fn handle_get_transaction(
    txn_id: String,
    service: Arc<CoordinatorService>,
) -> Result<impl Reply, Rejection> {
    let txn_id = TransactionId::parse(&txn_id)
        .map_err(|_| reject(TxnError::NotFound))?;
    let entry = transfer::get_transaction(&service.store, txn_id)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&entry))
}

async fn handle_metrics(service: Arc<CoordinatorService>) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::with_header(
        service.metrics.render(),
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
