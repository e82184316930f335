use std::time::Duration;

use reqwest::StatusCode;
use tracing::warn;
use txn_core::{
    BalanceResponse, Direction, PrepareRequest, TransactionId, TxnError, TxnIdRequest,
};

/// HTTP client for a single Participant, bound to its base URL.
///
/// Every call carries the ~5s bounded timeout spec §5 requires; a transport
/// error or non-200 response is surfaced as [`TxnError::Dependency`] so
/// callers (the Coordinator's prepare phase, the Recovery Worker's
/// best-effort rollback) can decide what to do without matching on reqwest
/// internals.
#[derive(Clone)]
pub struct ParticipantClient {
    base_url: String,
    http: reqwest::Client,
}

impl ParticipantClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client builds with a static config");
        ParticipantClient {
            base_url: base_url.into(),
            http,
        }
    }

    pub async fn prepare(
        &self,
        txn_id: TransactionId,
        amount: u64,
        direction: Direction,
        crash_after_prepare: bool,
    ) -> Result<(), TxnError> {
        let body = PrepareRequest {
            transaction_id: txn_id.as_str(),
            amount,
            direction,
            crash_after_prepare,
        };
        let resp = self
            .http
            .post(format!("{}/prepare", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| TxnError::Dependency(format!("prepare at {}: {e}", self.base_url)))?;

        match resp.status() {
            StatusCode::OK => Ok(()),
            StatusCode::CONFLICT => Err(TxnError::InsufficientFunds),
            status => Err(TxnError::Dependency(format!(
                "prepare at {} failed with status {status}",
                self.base_url
            ))),
        }
    }

    pub async fn commit(&self, txn_id: TransactionId) -> Result<(), TxnError> {
        let body = TxnIdRequest {
            transaction_id: txn_id.as_str(),
        };
        let resp = self
            .http
            .post(format!("{}/commit", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| TxnError::Dependency(format!("commit at {}: {e}", self.base_url)))?;

        if resp.status() == StatusCode::OK {
            Ok(())
        } else {
            Err(TxnError::Dependency(format!(
                "commit at {} failed with status {}",
                self.base_url,
                resp.status()
            )))
        }
    }

    /// Best-effort: the Coordinator's abort path and the Recovery Worker
    /// both call this while ignoring the individual error, per spec §4.2/§4.3.
    pub async fn rollback(&self, txn_id: TransactionId) -> Result<(), TxnError> {
        let body = TxnIdRequest {
            transaction_id: txn_id.as_str(),
        };
        let result = self
            .http
            .post(format!("{}/rollback", self.base_url))
            .json(&body)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status() == StatusCode::OK => Ok(()),
            Ok(resp) => Err(TxnError::Dependency(format!(
                "rollback at {} returned status {}",
                self.base_url,
                resp.status()
            ))),
            Err(e) => {
                warn!(url = %self.base_url, error = %e, "rollback RPC failed");
                Err(TxnError::Dependency(format!("rollback at {}: {e}", self.base_url)))
            }
        }
    }

    pub async fn balance(&self) -> Result<BalanceResponse, TxnError> {
        let resp = self
            .http
            .get(format!("{}/balance", self.base_url))
            .send()
            .await
            .map_err(|e| TxnError::Dependency(format!("balance at {}: {e}", self.base_url)))?;

        resp.json::<BalanceResponse>()
            .await
            .map_err(|e| TxnError::Dependency(format!("decoding balance response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use warp::http::StatusCode;
    use warp::Filter;

    use super::*;

    /// A minimal stand-in for a Participant that always answers `/prepare`
    /// with the given status, so the client's status-to-`TxnError` mapping
    /// can be exercised without a real Participant service.
    async fn serve_prepare_with_status(status: StatusCode) -> String {
        let route = warp::path("prepare")
            .and(warp::post())
            .and(warp::body::json())
            .map(move |_: serde_json::Value| {
                warp::reply::with_status(warp::reply::json(&serde_json::json!({})), status)
            });
        let (addr, fut) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(fut);
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn prepare_maps_409_to_insufficient_funds() {
        let url = serve_prepare_with_status(StatusCode::CONFLICT).await;
        let client = ParticipantClient::new(url, Duration::from_secs(1));
        let err = client
            .prepare(TransactionId::new(), 10, Direction::Debit, false)
            .await
            .unwrap_err();
        assert!(matches!(err, TxnError::InsufficientFunds));
    }

    #[tokio::test]
    async fn prepare_maps_200_to_success() {
        let url = serve_prepare_with_status(StatusCode::OK).await;
        let client = ParticipantClient::new(url, Duration::from_secs(1));
        client
            .prepare(TransactionId::new(), 10, Direction::Debit, false)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn prepare_maps_unexpected_status_to_dependency_error() {
        let url = serve_prepare_with_status(StatusCode::INTERNAL_SERVER_ERROR).await;
        let client = ParticipantClient::new(url, Duration::from_secs(1));
        let err = client
            .prepare(TransactionId::new(), 10, Direction::Debit, false)
            .await
            .unwrap_err();
        assert!(matches!(err, TxnError::Dependency(_)));
    }

    #[tokio::test]
    async fn unreachable_participant_is_a_dependency_error() {
        let client =
            ParticipantClient::new("http://127.0.0.1:1", Duration::from_millis(100));
        let err = client.commit(TransactionId::new()).await.unwrap_err();
        assert!(matches!(err, TxnError::Dependency(_)));
    }
}
