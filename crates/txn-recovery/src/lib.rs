//! The Recovery Worker (spec §4.3): a periodic task, co-located with the
//! Coordinator, that reaps transactions stuck in `PREPARED_ALL` past a
//! configured age.
//!
//! Grounded on the teacher's `bleep-state::cross_shard_recovery`'s
//! `RecoveryOrchestrator` — a standalone type that scans for and resolves
//! stuck cross-shard transactions — generalized here from block-height-based
//! epoch boundaries to wall-clock age, and from a register/execute API to a
//! self-driving tick loop, since this system has no block height and the
//! worker runs unattended rather than being invoked per-transaction.

pub mod config;
pub mod worker;

pub use config::RecoveryConfig;
pub use worker::RecoveryWorker;
