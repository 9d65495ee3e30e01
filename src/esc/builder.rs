use super::MotorEsc;
use crate::Pwm;

/// Highest pulse an ESC is calibrated against by default.
const PULSE_2MS: u16 = 2000;

pub struct Builder {
    arm: Option<u16>,
    min: Option<u16>,
    max: u16,
    delay_ms: u16,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            arm: None,
            min: None,
            max: PULSE_2MS,
            delay_ms: 2000,
        }
    }
}

impl Builder {
    /// Pulse written by [`ESC::arm`](super::ESC::arm). Defaults to the idle pulse.
    pub fn arm(mut self, arm: u16) -> Self {
        self.arm = Some(arm);
        self
    }

    /// Pulse for an output of -1. Defaults to the idle pulse.
    pub fn min(mut self, min: u16) -> Self {
        self.min = Some(min);
        self
    }

    /// Pulse for an output of 1.
    pub fn max(mut self, max: u16) -> Self {
        self.max = max;
        self
    }

    /// How long calibration holds each end of the range.
    pub fn delay(mut self, ms: u16) -> Self {
        self.delay_ms = ms;
        self
    }

    pub fn build<'p, 'b>(self, pwm: &'p Pwm<'b>, index: usize) -> MotorEsc<'p, 'b> {
        let idle = pwm.config().idle();
        let min = self.min.unwrap_or(idle);
        MotorEsc {
            pwm,
            index,
            arm: self.arm.unwrap_or(idle),
            min,
            max: self.max.max(min),
            delay_ms: self.delay_ms,
        }
    }
}
