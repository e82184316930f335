//! Plain-text counter registry rendered by `GET /metrics` on both services.
//!
//! The spec calls Prometheus-style text emission an external collaborator,
//! not a crate to adopt — so this is a small hand-rolled `AtomicU64`/`Mutex<f64>`
//! registry rather than a `prometheus`/`metrics` crate dependency, rendered
//! with one `name value` line per counter exactly as spec §6 lists them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Monotonic counter, safe to bump without holding the account/state lock.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn incr(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Exponentially-weighted moving average, α fixed by the caller.
#[derive(Debug)]
pub struct Ewma {
    alpha: f64,
    value: Mutex<f64>,
}

impl Ewma {
    pub fn new(alpha: f64) -> Self {
        Ewma {
            alpha,
            value: Mutex::new(0.0),
        }
    }

    pub fn update(&self, sample: f64) {
        let mut v = self.value.lock().unwrap();
        *v = (1.0 - self.alpha) * *v + self.alpha * sample;
    }

    pub fn get(&self) -> f64 {
        *self.value.lock().unwrap()
    }
}

/// Render `lines` as the `GET /metrics` plain-text body: one `name value`
/// pair per line, trailing newline.
pub fn render(lines: &[(&str, String)]) -> String {
    let mut out = String::new();
    for (name, value) in lines {
        out.push_str(name);
        out.push(' ');
        out.push_str(value);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_increments() {
        let c = Counter::default();
        c.incr();
        c.incr();
        assert_eq!(c.get(), 2);
    }

    #[test]
    fn ewma_converges_toward_repeated_sample() {
        let e = Ewma::new(0.2);
        for _ in 0..200 {
            e.update(100.0);
        }
        assert!((e.get() - 100.0).abs() < 0.01);
    }

    #[test]
    fn render_formats_one_line_per_counter() {
        let out = render(&[("a", "1".into()), ("b", "2.50".into())]);
        assert_eq!(out, "a 1\nb 2.50\n");
    }
}
