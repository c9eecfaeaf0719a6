use crate::generator::IdGenerator;
use seolink_core::RedirectId;
use std::sync::atomic::{AtomicU64, Ordering};

/// Deterministic ids: a prefix followed by a zero-padded counter, e.g.
/// `r000000`, `r000001`.
///
/// Unique only within one instance. Used where ids must be predictable.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    counter: AtomicU64,
    prefix: String,
}

impl SequentialIdGenerator {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::with_offset(prefix, 0)
    }

    /// Starts counting at `offset` instead of zero.
    pub fn with_offset(prefix: impl Into<String>, offset: u64) -> Self {
        Self {
            counter: AtomicU64::new(offset),
            prefix: prefix.into(),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self) -> RedirectId {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        RedirectId::new_unchecked(format!("{}{:06}", self.prefix, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_sequential_ids() {
        let generator = SequentialIdGenerator::with_prefix("r");

        assert_eq!(generator.generate().as_str(), "r000000");
        assert_eq!(generator.generate().as_str(), "r000001");
        assert_eq!(generator.generate().as_str(), "r000002");
    }

    #[test]
    fn offset_moves_the_start() {
        let generator = SequentialIdGenerator::with_offset("node-a-", 1000);

        assert_eq!(generator.generate().as_str(), "node-a-001000");
        assert_eq!(generator.generate().as_str(), "node-a-001001");
    }

    #[test]
    fn generator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SequentialIdGenerator>();
    }
}
