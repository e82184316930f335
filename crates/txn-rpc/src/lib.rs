//! Thin HTTP client over a Participant's `/prepare`, `/commit`, `/rollback`
//! and `/balance` endpoints. Shared by `txn-coordinator` (the 2PC driver)
//! and `txn-recovery` (best-effort rollback fan-out), so both issue RPCs the
//! same way and respect the same bounded timeout (spec §5).

pub mod client;

pub use client::ParticipantClient;
