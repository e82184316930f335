//! `CoordinatorService`: the explicit service object holding the
//! Coordinator's metrics and collaborators — no hidden singletons or
//! module-level statics, per spec §9's "global process state" note.

use std::collections::HashMap;
use std::sync::Arc;

use txn_core::metrics::{render, Counter, Ewma};
use txn_core::TxnError;
use txn_rpc::ParticipantClient;
use txn_store::TxnStore;

use crate::config::CoordinatorConfig;

pub struct CoordinatorMetrics {
    pub transfer_requests_total: Counter,
    pub transfer_commits_total: Counter,
    pub transfer_rollbacks_total: Counter,
    pub transfer_idempotent_hits_total: Counter,
    pub transfer_latency_ms_avg: Ewma,
}

impl Default for CoordinatorMetrics {
    fn default() -> Self {
        CoordinatorMetrics {
            transfer_requests_total: Counter::default(),
            transfer_commits_total: Counter::default(),
            transfer_rollbacks_total: Counter::default(),
            transfer_idempotent_hits_total: Counter::default(),
            transfer_latency_ms_avg: Ewma::new(0.2),
        }
    }
}

impl CoordinatorMetrics {
    pub fn render(&self) -> String {
        render(&[
            (
                "transfer_requests_total",
                self.transfer_requests_total.get().to_string(),
            ),
            (
                "transfer_commits_total",
                self.transfer_commits_total.get().to_string(),
            ),
            (
                "transfer_rollbacks_total",
                self.transfer_rollbacks_total.get().to_string(),
            ),
            (
                "transfer_idempotent_hits_total",
                self.transfer_idempotent_hits_total.get().to_string(),
            ),
            (
                "transfer_latency_ms_avg",
                format!("{:.2}", self.transfer_latency_ms_avg.get()),
            ),
        ])
    }
}

pub struct CoordinatorService {
    pub store: Arc<dyn TxnStore>,
    pub participants: HashMap<String, ParticipantClient>,
    pub config: CoordinatorConfig,
    pub metrics: CoordinatorMetrics,
}

impl CoordinatorService {
    pub fn new(
        store: Arc<dyn TxnStore>,
        participants: HashMap<String, ParticipantClient>,
        config: CoordinatorConfig,
    ) -> Self {
        CoordinatorService {
            store,
            participants,
            config,
            metrics: CoordinatorMetrics::default(),
        }
    }

    pub fn participant(&self, account: &str) -> Result<&ParticipantClient, TxnError> {
        self.participants
            .get(account)
            .ok_or_else(|| TxnError::Validation(format!("unknown account {account}")))
    }
}
