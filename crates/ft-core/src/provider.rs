//! Injectable sources of time and identifiers
//!
//! Snapshot edits never read the wall clock or a RNG directly; they go through
//! these traits so tests can pin both.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub trait Clock {
    fn now_millis(&self) -> u64;
}

/// Fresh post identifiers.
pub trait IdSource {
    fn next_id(&self) -> String;
}

/// Wall clock + random UUIDv4 ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProvider;

impl Clock for SystemProvider {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

impl IdSource for SystemProvider {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// Deterministic provider: ids `{prefix}1`, `{prefix}2`, ... and a clock that
/// starts at `start_millis` and advances by `step_millis` per reading.
#[derive(Debug)]
pub struct FixedProvider {
    prefix: String,
    next: AtomicU64,
    now: AtomicU64,
    step_millis: u64,
}

impl FixedProvider {
    pub fn new(prefix: impl Into<String>, start_millis: u64, step_millis: u64) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
            now: AtomicU64::new(start_millis),
            step_millis,
        }
    }
}

impl Default for FixedProvider {
    fn default() -> Self {
        Self::new("p", 1_700_000_000_000, 1_000)
    }
}

impl Clock for FixedProvider {
    fn now_millis(&self) -> u64 {
        self.now.fetch_add(self.step_millis, Ordering::Relaxed)
    }
}

impl IdSource for FixedProvider {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{}", self.prefix, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_provider_is_sequential() {
        let p = FixedProvider::new("p", 100, 10);
        assert_eq!(p.next_id(), "p1");
        assert_eq!(p.next_id(), "p2");
        assert_eq!(p.now_millis(), 100);
        assert_eq!(p.now_millis(), 110);
    }

    #[test]
    fn system_ids_differ() {
        let p = SystemProvider;
        assert_ne!(p.next_id(), p.next_id());
        assert!(p.now_millis() > 0);
    }
}
