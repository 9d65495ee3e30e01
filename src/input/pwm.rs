use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::config::{PULSE_MAX, PULSE_MIN};
use crate::hal::{Edge, TimerFamily};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PwmState {
    /// Not measuring. The next rising edge starts a pulse.
    Idle,
    /// Waiting for the rising edge of the next pulse.
    ArmedRising,
    /// A rising edge was latched, waiting for the falling edge.
    ArmedFalling,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PwmEvent {
    None,
    /// A complete pulse inside the accepted range.
    Pulse(u16),
    /// A complete pulse outside the accepted range, dropped as noise.
    Rejected(u32),
}

/// Decoder for one wire carrying one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PwmDecoder {
    pub state: PwmState,
    pub rise: u32,
}

impl Default for PwmDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PwmDecoder {
    pub const fn new() -> Self {
        Self {
            state: PwmState::Idle,
            rise: 0,
        }
    }

    pub fn arm(&mut self) {
        self.state = PwmState::ArmedRising;
    }

    /// Feed a captured edge. `capture` is the raw counter value of a timer of `family`.
    pub fn on_edge(&mut self, family: TimerFamily, edge: Edge, capture: u32) -> PwmEvent {
        match (self.state, edge) {
            // A second rising edge restarts the measurement from the newer one.
            (_, Edge::Rising) => {
                self.rise = capture;
                self.state = PwmState::ArmedFalling;
                PwmEvent::None
            }
            (PwmState::ArmedFalling, Edge::Falling) => {
                let width = family.elapsed(self.rise, capture);
                if (PULSE_MIN as u32..=PULSE_MAX as u32).contains(&width) {
                    self.state = PwmState::ArmedRising;
                    PwmEvent::Pulse(width as u16)
                } else {
                    self.state = PwmState::Idle;
                    PwmEvent::Rejected(width)
                }
            }
            (_, Edge::Falling) => PwmEvent::None,
        }
    }

    /// The edge the capture channel should be armed for next.
    pub fn next_edge(&self) -> Edge {
        match self.state {
            PwmState::ArmedFalling => Edge::Falling,
            PwmState::Idle | PwmState::ArmedRising => Edge::Rising,
        }
    }
}

/// Interrupt-owned storage of a [`PwmDecoder`].
///
/// Only the capture interrupt of the port touches it, so a load, step and
/// store sequence never races.
#[derive(Debug, Default)]
pub struct PwmCell {
    state: AtomicU8,
    rise: AtomicU32,
}

impl PwmCell {
    pub fn load(&self) -> PwmDecoder {
        let state = match self.state.load(Ordering::Relaxed) {
            1 => PwmState::ArmedRising,
            2 => PwmState::ArmedFalling,
            _ => PwmState::Idle,
        };
        PwmDecoder {
            state,
            rise: self.rise.load(Ordering::Relaxed),
        }
    }

    pub fn store(&self, decoder: &PwmDecoder) {
        let state = match decoder.state {
            PwmState::Idle => 0,
            PwmState::ArmedRising => 1,
            PwmState::ArmedFalling => 2,
        };
        self.rise.store(decoder.rise, Ordering::Relaxed);
        self.state.store(state, Ordering::Relaxed);
    }
}
