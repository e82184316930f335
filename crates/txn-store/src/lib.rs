//! The Transaction Log & Idempotency Store (spec §4.4): per-transaction
//! hash records, TTL idempotency snapshots, and an advisory pair lock.
//!
//! `TxnStore` is implemented twice: [`redis_store::RedisStore`] against a
//! real Redis-compatible backend (the production path, matching
//! `original_source`'s `redis.asyncio` client), and
//! [`memory::InMemoryStore`], a `dashmap`-backed fake used by the coordinator
//! and recovery-worker tests so the 2PC control-plane tests in this
//! workspace don't need a live Redis. The lock-manager shape is grounded on
//! `bleep-state::cross_shard_locking::ShardLockManager`.

pub mod lock;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use lock::LockToken;
pub use memory::InMemoryStore;
pub use redis_store::RedisStore;
pub use store::TxnStore;
