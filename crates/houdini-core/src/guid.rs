//! Correlation identifiers for asynchronous engine requests
//!
//! The high 64 bits come from an xorshift64 stream seeded per process, the low
//! 64 bits from a monotonically increasing sequence. Two ids generated in the
//! same process never collide; ids from different processes differ in their
//! random half.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);
static PROCESS_SEED: OnceLock<u64> = OnceLock::new();

fn process_seed() -> u64 {
    *PROCESS_SEED.get_or_init(|| {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x9E37_79B9_7F4A_7C15);
        nanos ^ ((std::process::id() as u64) << 32)
    })
}

/// Identifier tying a submitted task to its polled result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(pub u128);

impl CorrelationId {
    /// Generate a fresh id, unique within this process
    pub fn generate() -> Self {
        let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed) + 1;
        let mut generator = CorrelationIdGenerator::new(process_seed() ^ sequence.rotate_left(29));
        Self(((generator.next_u64() as u128) << 64) | sequence as u128)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{:08X}-{:04X}-{:04X}-{:04X}-{:012X}",
            (v >> 96) as u32,
            (v >> 80) as u16,
            (v >> 64) as u16,
            (v >> 48) as u16,
            (v & 0xFFFF_FFFF_FFFF) as u64
        )
    }
}

/// Deterministic id stream, useful for reproducible tests and replays
///
/// Uses xorshift64 like the process-wide generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationIdGenerator {
    state: u64,
    sequence: u64,
}

impl CorrelationIdGenerator {
    /// Create a generator with the given seed
    pub fn new(seed: u64) -> Self {
        // xorshift requires a non-zero state
        let state = if seed == 0 { 1 } else { seed };
        Self { state, sequence: 0 }
    }

    /// Generate the next raw u64 value
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generate the next correlation id from this stream
    pub fn next_id(&mut self) -> CorrelationId {
        self.sequence += 1;
        let high = self.next_u64();
        CorrelationId(((high as u128) << 64) | self.sequence as u128)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: HashSet<_> = (0..1000).map(|_| CorrelationId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_generator_deterministic() {
        let mut a = CorrelationIdGenerator::new(42);
        let mut b = CorrelationIdGenerator::new(42);
        for _ in 0..10 {
            assert_eq!(a.next_id(), b.next_id());
        }
    }

    #[test]
    fn test_zero_seed_is_usable() {
        let mut generator = CorrelationIdGenerator::new(0);
        assert_ne!(generator.next_u64(), 0);
    }

    #[test]
    fn test_display_format() {
        let id = CorrelationId(0x0123_4567_89AB_CDEF_0011_2233_4455_6677);
        assert_eq!(format!("{}", id), "01234567-89AB-CDEF-0011-223344556677");
    }
}
