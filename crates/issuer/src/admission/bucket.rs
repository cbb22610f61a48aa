//! Global token bucket.
//!
//! Tokens are added in whole ticks: every `interval` since the bucket was
//! created adds `quantum` tokens, capped at `capacity`. Refill is computed
//! lazily on each acquire, so there is no background task.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// Outcome of an admission attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// One token consumed
    Admitted { remaining: u64 },
    /// Bucket empty; next token arrives after `retry_after`
    Rejected { retry_after: Duration },
}

#[derive(Debug)]
struct BucketState {
    available: u64,
    /// Last tick the refill was accounted for
    last_tick: u64,
}

/// Process-wide token bucket shared by every request
#[derive(Debug)]
pub struct TokenBucket {
    capacity: u64,
    quantum: u64,
    interval: Duration,
    started: Instant,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Create a full bucket
    pub fn new(capacity: u64, quantum: u64, interval: Duration) -> Self {
        Self {
            capacity,
            quantum,
            interval,
            started: Instant::now(),
            state: Mutex::new(BucketState {
                available: capacity,
                last_tick: 0,
            }),
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Take one token if one is available
    pub fn try_acquire(&self) -> Admission {
        self.try_acquire_at(Instant::now())
    }

    /// Tokens currently available (after refill)
    pub fn available(&self) -> u64 {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.refill(&mut state, now);
        state.available
    }

    fn try_acquire_at(&self, now: Instant) -> Admission {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.refill(&mut state, now);

        if state.available > 0 {
            state.available -= 1;
            Admission::Admitted {
                remaining: state.available,
            }
        } else {
            Admission::Rejected {
                retry_after: self.until_next_tick(state.last_tick, now),
            }
        }
    }

    fn tick_at(&self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.started).as_nanos();
        (elapsed / self.interval.as_nanos().max(1)) as u64
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        let tick = self.tick_at(now);
        if tick <= state.last_tick {
            return;
        }
        let added = (tick - state.last_tick).saturating_mul(self.quantum);
        state.available = state.available.saturating_add(added).min(self.capacity);
        state.last_tick = tick;
    }

    fn until_next_tick(&self, last_tick: u64, now: Instant) -> Duration {
        let interval = self.interval.as_nanos().max(1);
        let next = (u128::from(last_tick) + 1) * interval;
        let elapsed = now.saturating_duration_since(self.started).as_nanos();
        let wait = next.saturating_sub(elapsed).min(u128::from(u64::MAX));
        Duration::from_nanos(wait as u64)
    }
}
