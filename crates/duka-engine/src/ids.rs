//! Document numbers and record ids.
//!
//! Sale ids are `prefix + epoch millis`, strictly increasing even when two
//! sales complete in the same millisecond.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct IdGenerator {
    last_millis: AtomicI64,
}

impl IdGenerator {
    pub fn new() -> Self {
        IdGenerator::default()
    }

    /// Current epoch millis, bumped past the last value handed out.
    pub fn next_millis(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut last = self.last_millis.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match self.last_millis.compare_exchange_weak(
                last,
                next,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }

    /// e.g. "INV-1700000000000".
    pub fn sale_id(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.next_millis())
    }

    /// e.g. "QUO-1700000000000".
    pub fn quotation_id(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.next_millis())
    }

    /// Prefix plus the last six digits of the clock, e.g. "PO-000123".
    pub fn po_number(&self, prefix: &str) -> String {
        format!("{}{:06}", prefix, self.next_millis() % 1_000_000)
    }

    pub fn uuid(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
