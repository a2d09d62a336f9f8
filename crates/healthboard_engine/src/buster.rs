use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Source of the `t=` query value attached to every request.
///
/// Values follow the wall clock in milliseconds but never repeat or go
/// backwards, even for requests issued within the same millisecond.
#[derive(Debug, Default)]
pub struct CacheBuster {
    last: AtomicI64,
}

impl CacheBuster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> i64 {
        self.next_at(Utc::now().timestamp_millis())
    }

    fn next_at(&self, now: i64) -> i64 {
        let previous = match self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last + 1))
            }) {
            Ok(last) | Err(last) => last,
        };
        now.max(previous + 1)
    }
}
