use super::{Edge, TimerHal};
use crate::board::ChannelDescriptor;

/// How a channel is programmed at boot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelMode {
    /// Input capture, first armed on `edge`.
    Capture { edge: Edge },

    /// Pulse output with `period` and an initial `compare` (both in microseconds).
    Output { period: u32, compare: u32 },
}

/// The kind of timer unit a channel lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerFamily {
    /// 16-bit timer with complementary outputs (TIM1, TIM8).
    /// Outputs stay off until the main output is enabled.
    Advanced,

    /// 16-bit general purpose timer (TIM3, TIM4).
    General16,

    /// 32-bit general purpose timer (TIM2, TIM5 on F4).
    General32,
}

impl TimerFamily {
    /// Ticks between two counter captures, accounting for counter wrap.
    pub fn elapsed(self, from: u32, to: u32) -> u32 {
        match self {
            TimerFamily::Advanced | TimerFamily::General16 => {
                (to as u16).wrapping_sub(from as u16) as u32
            }
            TimerFamily::General32 => to.wrapping_sub(from),
        }
    }

    /// Program a channel for its role.
    pub fn configure_channel<H: TimerHal>(
        self,
        hal: &mut H,
        port: usize,
        hw: &ChannelDescriptor,
        mode: ChannelMode,
    ) {
        match mode {
            ChannelMode::Capture { edge } => {
                // Free-running counter so captures can be differenced.
                hal.set_period(port, hw, self.max_count());
                hal.set_capture_edge(port, hw, edge);
            }
            ChannelMode::Output { period, compare } => {
                hal.set_period(port, hw, period);
                hal.set_compare(port, hw, compare.min(period));
                if self == TimerFamily::Advanced {
                    hal.enable_main_output(hw);
                }
            }
        }
        hal.enable_interrupt(port, hw);
    }

    /// Re-arm a capture channel for the next edge.
    pub fn arm_capture<H: TimerHal>(self, hal: &mut H, port: usize, hw: &ChannelDescriptor, edge: Edge) {
        hal.set_capture_edge(port, hw, edge);
    }

    /// Program the compare value for the period that is starting.
    pub fn schedule_output<H: TimerHal>(
        self,
        hal: &mut H,
        port: usize,
        hw: &ChannelDescriptor,
        period: u32,
        compare: u32,
    ) {
        let compare = match self {
            TimerFamily::Advanced | TimerFamily::General16 => compare.min(period).min(u16::MAX as u32),
            TimerFamily::General32 => compare.min(period),
        };
        hal.set_compare(port, hw, compare);
    }

    fn max_count(self) -> u32 {
        match self {
            TimerFamily::Advanced | TimerFamily::General16 => u16::MAX as u32,
            TimerFamily::General32 => u32::MAX,
        }
    }
}
