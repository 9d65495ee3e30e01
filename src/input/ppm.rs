use core::sync::atomic::{AtomicU16, AtomicU32, AtomicU8, Ordering};

use crate::config::{MAX_INPUTS, PPM_MIN_CHANNELS, PPM_SYNC_THRESHOLD, PULSE_MAX, PULSE_MIN};
use crate::hal::TimerFamily;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PpmState {
    /// No edge seen yet.
    Idle,
    /// Measuring gaps, but no frame boundary seen yet.
    AwaitingSync,
    /// Inside a frame, the next gap is channel `index`.
    Capturing(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PpmEvent {
    None,
    /// Channel `index` of the current frame measured `width`.
    Channel { index: u8, width: u16 },
    /// A sync gap closed a frame of `channels` channels.
    Frame { channels: u8 },
    /// A sync gap closed a frame too short to trust.
    Dropped { channels: u8 },
}

/// Decoder for a PPM sum-stream on one capture channel.
///
/// Every edge is measured against the previous one. Gaps above the sync
/// threshold end a frame. Shorter gaps are channel widths, clamped into the
/// accepted range. Nothing is captured before the first sync gap, so a
/// receiver that is mid-frame at boot cannot shift the channel order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PpmDecoder {
    pub state: PpmState,
    pub last: u32,
}

impl Default for PpmDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PpmDecoder {
    pub const fn new() -> Self {
        Self {
            state: PpmState::Idle,
            last: 0,
        }
    }

    pub fn on_edge(&mut self, family: TimerFamily, capture: u32) -> PpmEvent {
        let previous = self.last;
        self.last = capture;

        let index = match self.state {
            PpmState::Idle => {
                self.state = PpmState::AwaitingSync;
                return PpmEvent::None;
            }
            PpmState::AwaitingSync => {
                if family.elapsed(previous, capture) > PPM_SYNC_THRESHOLD {
                    self.state = PpmState::Capturing(0);
                }
                return PpmEvent::None;
            }
            PpmState::Capturing(index) => index,
        };

        let gap = family.elapsed(previous, capture);

        if gap > PPM_SYNC_THRESHOLD {
            self.state = PpmState::Capturing(0);
            return if index as usize >= PPM_MIN_CHANNELS {
                PpmEvent::Frame { channels: index }
            } else if index > 0 {
                PpmEvent::Dropped { channels: index }
            } else {
                PpmEvent::None
            };
        }

        if (index as usize) < MAX_INPUTS {
            self.state = PpmState::Capturing(index + 1);
            let width = gap.clamp(PULSE_MIN as u32, PULSE_MAX as u32) as u16;
            PpmEvent::Channel { index, width }
        } else {
            // Receivers with more channels than we decode.
            PpmEvent::None
        }
    }
}

const IDLE: u8 = u8::MAX;
const AWAITING_SYNC: u8 = u8::MAX - 1;

/// Interrupt-owned storage of the PPM decoder and the frame being assembled.
#[derive(Debug)]
pub struct PpmCell {
    state: AtomicU8,
    last: AtomicU32,
    working: [AtomicU16; MAX_INPUTS],
}

impl Default for PpmCell {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(IDLE),
            last: AtomicU32::new(0),
            working: Default::default(),
        }
    }
}

impl PpmCell {
    pub fn load(&self) -> PpmDecoder {
        let state = match self.state.load(Ordering::Relaxed) {
            IDLE => PpmState::Idle,
            AWAITING_SYNC => PpmState::AwaitingSync,
            index => PpmState::Capturing(index),
        };
        PpmDecoder {
            state,
            last: self.last.load(Ordering::Relaxed),
        }
    }

    pub fn store(&self, decoder: &PpmDecoder) {
        let state = match decoder.state {
            PpmState::Idle => IDLE,
            PpmState::AwaitingSync => AWAITING_SYNC,
            PpmState::Capturing(index) => index,
        };
        self.last.store(decoder.last, Ordering::Relaxed);
        self.state.store(state, Ordering::Relaxed);
    }

    pub fn set_width(&self, index: u8, width: u16) {
        if let Some(slot) = self.working.get(index as usize) {
            slot.store(width, Ordering::Relaxed);
        }
    }

    /// Widths of the frame being assembled.
    pub fn widths(&self) -> [u16; MAX_INPUTS] {
        let mut widths = [0; MAX_INPUTS];
        for (width, slot) in widths.iter_mut().zip(self.working.iter()) {
            *width = slot.load(Ordering::Relaxed);
        }
        widths
    }
}
