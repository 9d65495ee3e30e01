//! RC input capture.
//!
//! The capture interrupts decode edges with [`PwmDecoder`] or [`PpmDecoder`] and
//! publish finished values into a [`ChannelStore`]. The main loop only reads
//! from the store.
//!
//! A PPM frame is published under a sequence counter: the counter is odd while
//! the interrupt writes, and the frame flag is raised after the counter is
//! even again. A reader that sees the flag, then an even and unchanged counter
//! around its copy, holds a whole frame.

use core::sync::atomic::{fence, AtomicBool, AtomicU16, AtomicU32, AtomicU8, Ordering};
use embedded_time::duration::Microseconds;

use crate::config::MAX_INPUTS;
use crate::failsafe::{Freshness, Monitor};

mod ppm;
pub use ppm::{PpmCell, PpmDecoder, PpmEvent, PpmState};

mod pwm;
pub use pwm::{PwmCell, PwmDecoder, PwmEvent, PwmState};

/// A complete PPM frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    pub widths: [u16; MAX_INPUTS],
    pub channels: u8,
}

impl Frame {
    /// The widths that were captured in this frame.
    pub fn as_slice(&self) -> &[u16] {
        &self.widths[..(self.channels as usize).min(MAX_INPUTS)]
    }
}

/// Published values of the logical input channels.
#[derive(Debug, Default)]
pub struct ChannelStore {
    widths: [AtomicU16; MAX_INPUTS],
    frame_len: AtomicU8,
    seq: AtomicU32,
    frame_ready: AtomicBool,
    /// Sequence number of the last frame handed out by `take_frame`.
    taken: AtomicU32,
    freshness: [Freshness; MAX_INPUTS],
}

impl ChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish one PWM channel. Only the capture interrupt of that channel's
    /// port calls this.
    pub fn publish(&self, channel: usize, width: u16, now: Microseconds<u64>, threshold: u16) {
        let Some(slot) = self.widths.get(channel) else {
            return;
        };
        slot.store(width, Ordering::Release);
        if width >= threshold {
            self.freshness[channel].touch(now);
        }
    }

    /// Publish a PPM frame. Only the PPM capture interrupt calls this.
    pub fn publish_frame(&self, widths: &[u16], now: Microseconds<u64>, threshold: u16) {
        let seq = self.seq.load(Ordering::Relaxed);
        self.seq.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        let len = widths.len().min(MAX_INPUTS);
        for (slot, width) in self.widths.iter().zip(&widths[..len]) {
            slot.store(*width, Ordering::Relaxed);
        }
        self.frame_len.store(len as u8, Ordering::Relaxed);

        self.seq.store(seq.wrapping_add(2), Ordering::Release);
        self.frame_ready.store(true, Ordering::Release);

        for (record, width) in self.freshness.iter().zip(&widths[..len]) {
            if *width >= threshold {
                record.touch(now);
            }
        }
    }

    /// Last published width of `channel`, or `None` if it never had one.
    pub fn read(&self, channel: usize) -> Option<u16> {
        self.widths
            .get(channel)
            .map(|slot| slot.load(Ordering::Acquire))
            .filter(|width| *width != 0)
    }

    /// Take the latest PPM frame if one completed since the last call.
    ///
    /// Each frame is handed out once, even when a newer frame lands while
    /// the previous flag is being taken.
    pub fn take_frame(&self) -> Option<Frame> {
        if !self.frame_ready.swap(false, Ordering::Acquire) {
            return None;
        }
        self.take_unseen()
    }

    fn take_unseen(&self) -> Option<Frame> {
        let (frame, seq) = self.read_frame();
        if self.taken.swap(seq, Ordering::Relaxed) == seq {
            None
        } else {
            Some(frame)
        }
    }

    /// Consistent copy of every channel as last published by a PPM frame.
    pub fn snapshot(&self) -> Frame {
        self.read_frame().0
    }

    fn read_frame(&self) -> (Frame, u32) {
        loop {
            let before = self.seq.load(Ordering::Acquire);
            if before & 1 == 1 {
                core::hint::spin_loop();
                continue;
            }

            let mut frame = Frame {
                widths: [0; MAX_INPUTS],
                channels: self.frame_len.load(Ordering::Relaxed),
            };
            for (width, slot) in frame.widths.iter_mut().zip(self.widths.iter()) {
                *width = slot.load(Ordering::Relaxed);
            }

            fence(Ordering::Acquire);
            if self.seq.load(Ordering::Relaxed) == before {
                return (frame, before);
            }
        }
    }

    pub fn monitor(&self) -> Monitor<'_> {
        Monitor::new(&self.freshness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_time::duration::Milliseconds;
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    const THRESHOLD: u16 = 985;

    #[test]
    fn unpublished_channel_reads_none() {
        let store = ChannelStore::new();
        assert_eq!(store.read(0), None);
        assert_eq!(store.read(MAX_INPUTS), None);
    }

    #[test]
    fn publish_updates_freshness_above_threshold() {
        let store = ChannelStore::new();
        let timeout = Milliseconds(50);

        store.publish(0, 1500, Microseconds(1_000), THRESHOLD);
        store.publish(1, 900, Microseconds(1_000), THRESHOLD);

        assert_eq!(store.read(1), Some(900));
        assert!(!store.monitor().is_stale(0, Microseconds(2_000), timeout));
        assert!(store.monitor().is_stale(1, Microseconds(2_000), timeout));
    }

    #[test]
    fn frame_flag_is_cleared_on_take() {
        let store = ChannelStore::new();
        assert_eq!(store.take_frame(), None);

        store.publish_frame(&[1100, 1200, 1300, 1400], Microseconds(0), THRESHOLD);
        let frame = store.take_frame().unwrap();
        assert_eq!(frame.as_slice(), [1100, 1200, 1300, 1400]);
        assert_eq!(store.take_frame(), None);

        assert_eq!(store.read(2), Some(1300));
        assert_eq!(store.read(2), Some(1300));
    }

    #[test]
    fn frame_landing_during_take_is_handed_out_once() {
        let store = ChannelStore::new();
        store.publish_frame(&[1100; 4], Microseconds(0), THRESHOLD);

        // The reader has cleared the flag when a newer frame lands.
        assert!(store.frame_ready.swap(false, Ordering::Acquire));
        store.publish_frame(&[1900; 5], Microseconds(20_000), THRESHOLD);

        let frame = store.take_unseen().unwrap();
        assert_eq!(frame.as_slice(), [1900; 5]);
        assert_eq!(store.take_frame(), None);

        store.publish_frame(&[1500; 6], Microseconds(40_000), THRESHOLD);
        assert_eq!(store.take_frame().unwrap().as_slice(), [1500; 6]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn reader_never_sees_a_torn_frame() {
        let store = Arc::new(ChannelStore::new());
        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let store = store.clone();
            let done = done.clone();
            tokio::task::spawn_blocking(move || {
                for n in 0..20_000u32 {
                    let width = 1000 + (n % 1000) as u16;
                    store.publish_frame(&[width; MAX_INPUTS], Microseconds(n as u64), THRESHOLD);
                }
                done.store(true, Ordering::Release);
            })
        };

        let reader = {
            let store = store.clone();
            tokio::task::spawn_blocking(move || {
                let mut frames = 0;
                while !done.load(Ordering::Acquire) {
                    if let Some(frame) = store.take_frame() {
                        let first = frame.widths[0];
                        assert!(frame.widths.iter().all(|w| *w == first), "{:?}", frame);
                        frames += 1;
                    }
                }
                frames
            })
        };

        writer.await.unwrap();
        let frames = reader.await.unwrap();
        assert!(frames > 0 || store.take_frame().is_some());
    }
}
