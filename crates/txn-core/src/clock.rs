//! Wall-clock time as the shared store and log entries represent it:
//! fractional seconds since the Unix epoch, matching
//! `original_source`'s `time.time()` timestamps stored in Redis hashes.

use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_unix() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs_f64()
}
