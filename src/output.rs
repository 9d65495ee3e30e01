//! Motor and servo pulse generation.
//!
//! The main loop writes a target width at any time. The port's period
//! interrupt latches the target into the active width and programs the compare
//! value for the period that is starting. A write therefore never changes the
//! pulse being emitted.

use core::sync::atomic::{AtomicU16, Ordering};

use crate::config::{Config, PULSE_1MS, PULSE_MAX, PULSE_MIN};

/// Whether an output port drives a motor or a servo.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputKind {
    Motor,
    Servo,
}

/// Double-buffered width of one output port.
#[derive(Debug, Default)]
pub struct OutputCell {
    target: AtomicU16,
    active: AtomicU16,
}

impl OutputCell {
    pub fn reset(&self, width: u16) {
        self.target.store(width, Ordering::Relaxed);
        self.active.store(width, Ordering::Release);
    }

    /// Set the width used from the next period on. Called from the main loop.
    pub fn write(&self, width: u16) {
        self.target.store(width, Ordering::Release);
    }

    /// Latch the target for the period that is starting. Called from the
    /// port's period interrupt.
    pub fn latch(&self) -> u16 {
        let width = self.target.load(Ordering::Acquire);
        self.active.store(width, Ordering::Release);
        width
    }

    /// Width of the pulse currently being emitted.
    pub fn active(&self) -> u16 {
        self.active.load(Ordering::Acquire)
    }
}

/// Clamp a requested width into what `kind` accepts under `config`.
pub fn clamp_width(config: &Config, kind: OutputKind, width: u16) -> u16 {
    let min = match kind {
        OutputKind::Motor if config.is_3d() => config.idle(),
        _ => PULSE_MIN,
    };
    width.clamp(min, PULSE_MAX)
}

/// Output period (in microseconds) of a port of `kind`.
pub fn period(config: &Config, kind: OutputKind) -> u32 {
    match kind {
        OutputKind::Motor => config.motor_period(),
        OutputKind::Servo => config.servo_period(),
    }
}

/// Compare value that produces `width` on a port of `kind`.
///
/// Brushed motors map 1000..2000 µs onto 0..100 % duty. Everything else
/// emits the width itself, cut at the period.
pub fn compare_for(config: &Config, kind: OutputKind, width: u16) -> u32 {
    let period = period(config, kind);
    match kind {
        OutputKind::Motor if config.is_brushed() => {
            let throttle = width.saturating_sub(PULSE_1MS) as u32;
            (throttle * period / PULSE_1MS as u32).min(period)
        }
        _ => (width as u32).min(period),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_time::rate::Hertz;

    #[test]
    fn write_waits_for_latch() {
        let cell = OutputCell::default();
        cell.reset(1000);

        cell.write(1700);
        assert_eq!(cell.active(), 1000);

        assert_eq!(cell.latch(), 1700);
        assert_eq!(cell.active(), 1700);
    }

    #[test]
    fn widths_are_clamped() {
        let config = Config::default();
        assert_eq!(clamp_width(&config, OutputKind::Motor, 0), PULSE_MIN);
        assert_eq!(clamp_width(&config, OutputKind::Servo, 3000), PULSE_MAX);
        assert_eq!(clamp_width(&config, OutputKind::Servo, 1234), 1234);
    }

    #[test]
    fn three_d_motor_floor_is_idle() {
        let config = Config::default().with_idle_pulse(1460);
        assert_eq!(clamp_width(&config, OutputKind::Motor, 1000), 1460);
        assert_eq!(clamp_width(&config, OutputKind::Servo, 1000), 1000);
    }

    #[test]
    fn brushed_compare_is_duty() {
        let config = Config::default().with_motor_rate(Hertz(8000));
        // 125 µs period.
        assert_eq!(compare_for(&config, OutputKind::Motor, 1000), 0);
        assert_eq!(compare_for(&config, OutputKind::Motor, 1500), 62);
        assert_eq!(compare_for(&config, OutputKind::Motor, 2250), 125);
        assert_eq!(compare_for(&config, OutputKind::Servo, 1500), 1500);
    }

    #[test]
    fn standard_compare_is_width() {
        let config = Config::default();
        assert_eq!(compare_for(&config, OutputKind::Motor, 1500), 1500);
        // 498 Hz servos: 2008 µs period.
        let config = config.with_servo_rate(Hertz(498));
        assert_eq!(compare_for(&config, OutputKind::Servo, 2250), 2008);
    }
}
