//! Input freshness and the staleness query consumed by failsafe logic.
//!
//! Nothing here changes an output. Deciding what to do about a stale channel
//! is left to the caller.

use core::sync::atomic::{fence, AtomicBool, AtomicU32, Ordering};
use embedded_time::{
    duration::{Microseconds, Milliseconds},
    Clock,
};

use crate::Result;

/// When a logical input channel last carried a live signal.
///
/// Times are 64-bit microseconds, so a dead link never reads as fresh again
/// after a counter wrap. Targets without 64-bit atomics get the timestamp as
/// two halves under a sequence counter, written only by the capture interrupt.
#[derive(Debug)]
pub struct Freshness {
    seq: AtomicU32,
    high: AtomicU32,
    low: AtomicU32,
    valid: AtomicBool,
}

impl Default for Freshness {
    fn default() -> Self {
        Self::new()
    }
}

impl Freshness {
    pub const fn new() -> Self {
        Self {
            seq: AtomicU32::new(0),
            high: AtomicU32::new(0),
            low: AtomicU32::new(0),
            valid: AtomicBool::new(false),
        }
    }

    /// Record a live update at `now`. Called from the capture interrupt only.
    pub fn touch(&self, now: Microseconds<u64>) {
        let seq = self.seq.load(Ordering::Relaxed);
        self.seq.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        self.high.store((now.0 >> 32) as u32, Ordering::Relaxed);
        self.low.store(now.0 as u32, Ordering::Relaxed);

        self.seq.store(seq.wrapping_add(2), Ordering::Release);
        self.valid.store(true, Ordering::Release);
    }

    /// Time of the last live update, if there ever was one.
    pub fn last_update(&self) -> Option<Microseconds<u64>> {
        if !self.valid.load(Ordering::Acquire) {
            return None;
        }

        loop {
            let before = self.seq.load(Ordering::Acquire);
            if before & 1 == 1 {
                core::hint::spin_loop();
                continue;
            }

            let high = self.high.load(Ordering::Relaxed) as u64;
            let low = self.low.load(Ordering::Relaxed) as u64;

            fence(Ordering::Acquire);
            if self.seq.load(Ordering::Relaxed) == before {
                return Some(Microseconds((high << 32) | low));
            }
        }
    }

    /// True when more than `timeout` has passed since the last update at `now`.
    /// A channel that was never updated is stale.
    pub fn is_stale(&self, now: Microseconds<u64>, timeout: Milliseconds<u32>) -> bool {
        match self.last_update() {
            Some(last) => now.0.saturating_sub(last.0) > timeout.0 as u64 * 1000,
            None => true,
        }
    }
}

/// Read-only view over the freshness records of every input channel.
#[derive(Clone, Copy)]
pub struct Monitor<'a> {
    records: &'a [Freshness],
}

impl<'a> Monitor<'a> {
    pub fn new(records: &'a [Freshness]) -> Self {
        Self { records }
    }

    /// Is `channel` stale at `now`? Channels that do not exist are always stale.
    pub fn is_stale(&self, channel: usize, now: Microseconds<u64>, timeout: Milliseconds<u32>) -> bool {
        self.records
            .get(channel)
            .map_or(true, |record| record.is_stale(now, timeout))
    }

    /// Bit `n` is set when channel `n` is stale.
    pub fn stale_mask(&self, now: Microseconds<u64>, timeout: Milliseconds<u32>) -> u8 {
        self.records
            .iter()
            .take(8)
            .enumerate()
            .filter(|(_, record)| record.is_stale(now, timeout))
            .fold(0, |mask, (channel, _)| mask | (1 << channel))
    }

    /// [`Monitor::is_stale`] at the current time of `clock`.
    ///
    /// The clock must count the same microseconds the capture interrupt stamps with.
    /// It is 64 bits wide so it does not wrap in the life of the firmware.
    pub fn is_stale_at<C>(&self, clock: &C, channel: usize, timeout: Milliseconds<u32>) -> Result<bool>
    where
        C: Clock<T = u64>,
    {
        let instant = clock.try_now()?;
        let now = Microseconds::<u64>::try_from(instant.duration_since_epoch())?;
        Ok(self.is_stale(channel, now, timeout))
    }
}
