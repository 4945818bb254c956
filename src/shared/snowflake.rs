//! Snowflake ID Generator
//!
//! Time-ordered unique ID generation for tours, requests, and users.

use std::sync::atomic::{AtomicU64, Ordering};

/// Default epoch (2024-01-01T00:00:00.000Z)
pub const DEFAULT_EPOCH: u64 = 1_704_067_200_000;

const SEQUENCE_BITS: u64 = 12;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;
const MACHINE_BITS: u64 = 10;
const MACHINE_MASK: u64 = (1 << MACHINE_BITS) - 1;

/// Snowflake ID generator
///
/// Layout: 41 bits of milliseconds since `epoch`, 10 bits of machine id,
/// 12 bits of sequence. The last issued (timestamp, sequence) pair lives in
/// a single atomic so concurrent callers never observe the same pair.
pub struct SnowflakeGenerator {
    machine_id: u64,
    epoch: u64,
    state: AtomicU64,
}

impl SnowflakeGenerator {
    /// Create a new snowflake generator
    pub fn new(machine_id: u64, epoch: u64) -> Self {
        Self {
            machine_id: machine_id & MACHINE_MASK,
            epoch,
            state: AtomicU64::new(0),
        }
    }

    /// Generate a new snowflake ID
    pub fn generate(&self) -> i64 {
        let now = self.current_timestamp();
        let mut last = self.state.load(Ordering::Acquire);

        loop {
            let last_ts = last >> SEQUENCE_BITS;
            let last_seq = last & SEQUENCE_MASK;

            // Clock went backwards or sequence overflowed: borrow the next millisecond.
            let next = if now > last_ts {
                now << SEQUENCE_BITS
            } else if last_seq < SEQUENCE_MASK {
                last + 1
            } else {
                (last_ts + 1) << SEQUENCE_BITS
            };

            match self
                .state
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    let timestamp = next >> SEQUENCE_BITS;
                    let sequence = next & SEQUENCE_MASK;
                    let id = (timestamp << (MACHINE_BITS + SEQUENCE_BITS))
                        | (self.machine_id << SEQUENCE_BITS)
                        | sequence;
                    return id as i64;
                }
                Err(actual) => last = actual,
            }
        }
    }

    /// Milliseconds since the configured epoch
    fn current_timestamp(&self) -> u64 {
        let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
        millis.saturating_sub(self.epoch)
    }

    /// Extract the wall-clock timestamp (Unix millis) from an ID produced by this generator
    pub fn extract_timestamp(&self, snowflake: i64) -> u64 {
        ((snowflake as u64) >> (MACHINE_BITS + SEQUENCE_BITS)) + self.epoch
    }
}

impl Default for SnowflakeGenerator {
    fn default() -> Self {
        Self::new(1, DEFAULT_EPOCH)
    }
}
