//! The Participant (spec §4.1): one process per account, owning a durable
//! `{balance, holds, pendings}` record behind a single exclusive lock, with
//! a `warp` HTTP surface over `prepare`/`commit`/`rollback`/`balance`.
//!
//! Module layout mirrors the teacher's split of pure state-machine logic
//! (`state`) from the service shell that adds durability, metrics and
//! concurrency control (`service`) — the same separation
//! `bleep-state::cross_shard_locking` draws between `StateLock` (data) and
//! `ShardLockManager` (the exclusive, mutating manager around it).

pub mod config;
pub mod persist;
pub mod routes;
pub mod service;
pub mod state;

pub use config::ParticipantConfig;
pub use service::ParticipantService;
