//! # embedded-flight-pwm
//! A `#![no_std]` driver for the timer channels of a flight controller.
//!
//! The driver splits a board's ports between three jobs: RC receiver input
//! (one PWM wire per channel or a single PPM sum-stream), motor outputs and
//! servo outputs. The split is decided once at boot from a [`Config`] and
//! the board's [`Board`] description.
//!
//! [`allocator`] picks a [`Role`] for every port.
//!
//! [`input`] decodes capture edges into channel widths.
//!
//! [`output`] turns written widths into pulses at each period boundary.
//!
//! [`failsafe`] reports which input channels have gone quiet.
//!
//! [`esc`] drives motors and servos with normalised values.
//!
//! ```ignore
//! use embedded_flight_pwm::{board::NAZE, Config, Pwm};
//!
//! let pwm = Pwm::init(&NAZE, Config::default().with_ppm(true), &mut timers)?;
//!
//! // From the timer interrupts
//! pwm.on_capture(&mut timers, port, edge, capture, now);
//! pwm.on_period(&mut timers, port);
//!
//! // From the main loop
//! let throttle = pwm.read_channel(2);
//! pwm.write_motor(0, throttle);
//! ```

#![cfg_attr(not(test), no_std)]

use core::sync::atomic::{AtomicBool, Ordering};
use embedded_time::duration::{Microseconds, Milliseconds};

pub mod allocator;
pub use allocator::{Allocation, Role};

pub mod board;
pub use board::Board;

pub mod config;
pub use config::Config;

mod error;
pub use error::{Error, Result};

pub mod esc;
pub use esc::{Actuator, MotorEsc, Servo, ESC};

pub mod failsafe;

pub mod hal;
pub use hal::{Edge, TimerHal};

pub mod input;
use input::{ChannelStore, Frame, PpmCell, PpmEvent, PwmCell, PwmEvent};

pub mod output;
use output::{OutputCell, OutputKind};

use board::{TimChannel, TimerId, MAX_PORTS};
use config::{CALIBRATION_THROTTLE, PULSE_MID};
use hal::ChannelMode;

/// The timer channel driver.
///
/// Built once by [`Pwm::init`]. Every method takes `&self`, so the driver can
/// live in a `static` shared by the timer interrupts and the main loop. Each
/// port's state is written only by that port's interrupt, or (for output
/// targets) only by the main loop.
pub struct Pwm<'b> {
    board: &'b Board,
    config: Config,
    allocation: Allocation,
    pwm_inputs: [PwmCell; MAX_PORTS],
    ppm: PpmCell,
    channels: ChannelStore,
    outputs: [OutputCell; MAX_PORTS],
    throttle_seen: AtomicBool,
    throttle_high: AtomicBool,
}

impl<'b> Pwm<'b> {
    /// Allocate the board's ports for `config` and program their timers.
    ///
    /// Fails only if a board layout names a port outside its descriptor table.
    /// Check [`Pwm::calibrate_throttle`] afterwards.
    pub fn init<H: TimerHal>(board: &'b Board, config: Config, hal: &mut H) -> Result<Self> {
        let config = config.sanitized();
        let allocation = allocator::allocate(board, &config)?;

        let pwm = Self {
            board,
            config,
            allocation,
            pwm_inputs: Default::default(),
            ppm: PpmCell::default(),
            channels: ChannelStore::new(),
            outputs: Default::default(),
            throttle_seen: AtomicBool::new(false),
            throttle_high: AtomicBool::new(false),
        };

        let idle = pwm.config.idle();
        for (port, role) in pwm.allocation.roles.iter().enumerate() {
            let mode = if let Some(kind) = output_kind(*role) {
                let width = output::clamp_width(&pwm.config, kind, idle);
                pwm.outputs[port].reset(width);
                ChannelMode::Output {
                    period: output::period(&pwm.config, kind),
                    compare: output::compare_for(&pwm.config, kind, width),
                }
            } else if role.is_input() {
                if let Role::RcInputPwm { .. } = role {
                    let mut decoder = pwm.pwm_inputs[port].load();
                    decoder.arm();
                    pwm.pwm_inputs[port].store(&decoder);
                }
                ChannelMode::Capture { edge: Edge::Rising }
            } else {
                continue;
            };

            let hw = board.descriptor_for(port)?;
            hw.family.configure_channel(hal, port, hw, mode);
        }

        Ok(pwm)
    }

    /// The ESCs should be calibrated before arming.
    ///
    /// Set by [`Config::calibrate_throttle`], or once the first live throttle
    /// pulse after boot arrives at or above [`CALIBRATION_THROTTLE`]. Query it
    /// after the receiver has had time to deliver its first frame.
    pub fn calibrate_throttle(&self) -> bool {
        self.allocation.calibrate_throttle || self.throttle_high.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn board(&self) -> &'b Board {
        self.board
    }

    pub fn allocation(&self) -> &Allocation {
        &self.allocation
    }

    /// The role of `port`, or [`Role::Unassigned`] for ports that do not exist.
    pub fn role(&self, port: usize) -> Role {
        self.allocation
            .roles
            .get(port)
            .copied()
            .unwrap_or(Role::Unassigned)
    }

    pub fn motor_count(&self) -> usize {
        self.allocation.motors.len()
    }

    pub fn servo_count(&self) -> usize {
        self.allocation.servos.len()
    }

    /// Number of logical input channels.
    pub fn input_channels(&self) -> usize {
        self.allocation.input_channels
    }

    /// Find the port behind a timer channel, for interrupt dispatch.
    pub fn port_for(&self, timer: TimerId, channel: TimChannel) -> Option<usize> {
        self.board.port_for(timer, channel)
    }

    /// Set the width (in microseconds) of motor `index` from the next period on.
    ///
    /// Out-of-range widths are clamped. Indices without a motor are ignored.
    pub fn write_motor(&self, index: usize, width: u16) {
        if let Some(&port) = self.allocation.motors.get(index) {
            let width = output::clamp_width(&self.config, OutputKind::Motor, width);
            self.outputs[port].write(width);
        }
    }

    /// Set the width (in microseconds) of servo `index` from the next period on.
    ///
    /// Out-of-range widths are clamped. Indices without a servo are ignored.
    pub fn write_servo(&self, index: usize, width: u16) {
        if let Some(&port) = self.allocation.servos.get(index) {
            let width = output::clamp_width(&self.config, OutputKind::Servo, width);
            self.outputs[port].write(width);
        }
    }

    /// Width of the pulse motor `index` is emitting now.
    pub fn motor_pulse(&self, index: usize) -> Option<u16> {
        let port = *self.allocation.motors.get(index)?;
        Some(self.outputs[port].active())
    }

    /// Width of the pulse servo `index` is emitting now.
    pub fn servo_pulse(&self, index: usize) -> Option<u16> {
        let port = *self.allocation.servos.get(index)?;
        Some(self.outputs[port].active())
    }

    /// Last valid width (in microseconds) of input `channel`.
    ///
    /// Channels that never received a pulse, and channels that do not exist,
    /// read as the idle pulse.
    pub fn read_channel(&self, channel: usize) -> u16 {
        self.channels
            .read(channel)
            .unwrap_or_else(|| self.config.idle())
    }

    /// [`Pwm::read_channel`] mapped from 1000..2000 µs onto -1..1.
    pub fn read_normalized(&self, channel: usize) -> f32 {
        let width = self.read_channel(channel) as f32;
        ((width - PULSE_MID as f32) / 500.).clamp(-1., 1.)
    }

    /// Take the latest complete PPM frame, if one arrived since the last call.
    pub fn take_frame(&self) -> Option<Frame> {
        self.channels.take_frame()
    }

    pub fn failsafe(&self) -> failsafe::Monitor<'_> {
        self.channels.monitor()
    }

    /// True when input `channel` has not seen a live pulse for longer than `timeout`.
    pub fn is_stale(&self, channel: usize, now: Microseconds<u64>, timeout: Milliseconds<u32>) -> bool {
        self.failsafe().is_stale(channel, now, timeout)
    }

    /// Capture interrupt entry point.
    ///
    /// `capture` is the raw counter value latched for `edge` on `port`, and
    /// `now` is the system time used for freshness. Edges on ports that are
    /// not inputs are ignored.
    pub fn on_capture<H: TimerHal>(
        &self,
        hal: &mut H,
        port: usize,
        edge: Edge,
        capture: u32,
        now: Microseconds<u64>,
    ) {
        let Some(hw) = self.board.ports.get(port) else {
            return;
        };
        let threshold = self.config.failsafe_threshold;

        match self.role(port) {
            Role::RcInputPwm { channel } => {
                let cell = &self.pwm_inputs[port];
                let mut decoder = cell.load();
                let event = decoder.on_edge(hw.family, edge, capture);
                cell.store(&decoder);

                if let PwmEvent::Pulse(width) = event {
                    self.channels.publish(channel as usize, width, now, threshold);
                    self.check_boot_throttle(channel as usize, width);
                }

                let next = decoder.next_edge();
                if next != edge {
                    hw.family.arm_capture(hal, port, hw, next);
                }
            }
            Role::RcInputPpm if edge == Edge::Rising => {
                let mut decoder = self.ppm.load();
                let event = decoder.on_edge(hw.family, capture);
                self.ppm.store(&decoder);

                match event {
                    PpmEvent::Channel { index, width } => self.ppm.set_width(index, width),
                    PpmEvent::Frame { channels } => {
                        let frame = self.ppm.widths();
                        let widths = &frame[..channels as usize];
                        self.channels.publish_frame(widths, now, threshold);
                        if let Some(&width) = widths.get(self.config.throttle_channel) {
                            self.check_boot_throttle(self.config.throttle_channel, width);
                        }
                    }
                    PpmEvent::Dropped { .. } | PpmEvent::None => {}
                }
            }
            _ => {}
        }
    }

    /// Latch a throttle stick that was already high when the first live
    /// throttle pulse arrived.
    fn check_boot_throttle(&self, channel: usize, width: u16) {
        if channel != self.config.throttle_channel || width < self.config.failsafe_threshold {
            return;
        }
        if !self.throttle_seen.swap(true, Ordering::Relaxed) && width >= CALIBRATION_THROTTLE {
            self.throttle_high.store(true, Ordering::Release);
        }
    }

    /// Period interrupt entry point: start the next pulse on `port`.
    pub fn on_period<H: TimerHal>(&self, hal: &mut H, port: usize) {
        let Some(hw) = self.board.ports.get(port) else {
            return;
        };
        let Some(kind) = output_kind(self.role(port)) else {
            return;
        };

        let width = self.outputs[port].latch();
        let period = output::period(&self.config, kind);
        let compare = output::compare_for(&self.config, kind, width);
        hw.family.schedule_output(hal, port, hw, period, compare);
    }
}

fn output_kind(role: Role) -> Option<OutputKind> {
    match role {
        Role::Motor { .. } => Some(OutputKind::Motor),
        Role::Servo { .. } => Some(OutputKind::Servo),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::NAZE;
    use crate::hal::mock::{Call, MockTimers};
    use approx::assert_relative_eq;
    use embedded_time::rate::Hertz;

    const TIMEOUT: Milliseconds<u32> = Milliseconds(100);

    /// System time for a capture stamped `t`.
    fn at(t: u32) -> Microseconds<u64> {
        Microseconds(t as u64)
    }

    fn init(config: Config) -> (Pwm<'static>, MockTimers) {
        let mut hal = MockTimers::default();
        let pwm = Pwm::init(&NAZE, config, &mut hal).unwrap();
        (pwm, hal)
    }

    /// Send a pulse of `width` on `port`, rising at `t`.
    fn pulse(pwm: &Pwm, hal: &mut MockTimers, port: usize, t: u32, width: u32) {
        pwm.on_capture(hal, port, Edge::Rising, t, at(t));
        pwm.on_capture(hal, port, Edge::Falling, t + width, at(t + width));
    }

    /// Send PPM edges `gaps` apart on port 0, after the edge at `t`.
    fn ppm(pwm: &Pwm, hal: &mut MockTimers, t: &mut u32, gaps: &[u32]) {
        for gap in gaps {
            *t += gap;
            pwm.on_capture(hal, 0, Edge::Rising, *t, at(*t));
        }
    }

    #[test]
    fn init_programs_every_assigned_port() {
        let (pwm, hal) = init(Config::default());

        for port in 0..8 {
            assert!(hal.calls.contains(&Call::Capture {
                port,
                edge: Edge::Rising
            }));
            assert!(hal.calls.contains(&Call::Interrupt { port }));
        }
        for port in 8..14 {
            assert!(hal.calls.contains(&Call::Period { port, period: 2500 }));
            assert_eq!(hal.compares(port), [1000]);
        }
        assert_eq!(pwm.motor_count(), 6);
        assert_eq!(pwm.input_channels(), 8);
        assert!(!pwm.calibrate_throttle());
    }

    #[test]
    fn thirty_two_bit_timers_capture_full_width() {
        let mut hal = MockTimers::default();
        let pwm = Pwm::init(&board::F4_DISCOVERY, Config::default(), &mut hal).unwrap();

        assert!(hal.calls.contains(&Call::Period { port: 4, period: u32::MAX }));
        assert!(hal.calls.contains(&Call::Period {
            port: 0,
            period: u16::MAX as u32
        }));
        assert!(!hal.calls.contains(&Call::Interrupt { port: 12 }));

        pwm.on_capture(&mut hal, 4, Edge::Rising, 65_000, at(65_000));
        pwm.on_capture(&mut hal, 4, Edge::Falling, 66_800, at(66_800));
        assert_eq!(pwm.read_channel(4), 1800);
    }

    #[test]
    fn pwm_pulse_reads_back() {
        let (pwm, mut hal) = init(Config::default());

        pulse(&pwm, &mut hal, 2, 10_000, 1500);
        assert_eq!(pwm.read_channel(2), 1500);
        assert_eq!(pwm.read_channel(2), 1500);

        // Out of range: the stored value is kept.
        pulse(&pwm, &mut hal, 2, 30_000, 3000);
        assert_eq!(pwm.read_channel(2), 1500);
    }

    #[test]
    fn pwm_capture_flips_polarity() {
        let (pwm, mut hal) = init(Config::default());
        hal.clear();

        pwm.on_capture(&mut hal, 5, Edge::Rising, 100, at(100));
        assert_eq!(hal.last_edge(5), Some(Edge::Falling));

        pwm.on_capture(&mut hal, 5, Edge::Falling, 1300, at(1300));
        assert_eq!(hal.last_edge(5), Some(Edge::Rising));
        assert_eq!(pwm.read_channel(5), 1200);
    }

    #[test]
    fn unpopulated_channel_reads_idle() {
        let (pwm, _) = init(Config::default());
        assert_eq!(pwm.read_channel(0), 1000);
        assert_eq!(pwm.read_channel(42), 1000);

        let (pwm, _) = init(Config::default().with_idle_pulse(1500));
        assert_eq!(pwm.read_channel(3), 1500);
    }

    #[test]
    fn ppm_frame_reads_back_in_order() {
        let (pwm, mut hal) = init(Config::default().with_ppm(true));
        let widths = [1000, 1100, 1200, 1300, 1400, 1500, 1600, 2000];

        let mut t = 0;
        ppm(&pwm, &mut hal, &mut t, &[0, 9000]);
        ppm(&pwm, &mut hal, &mut t, &widths);
        assert_eq!(pwm.take_frame(), None);

        ppm(&pwm, &mut hal, &mut t, &[8000]);

        let frame = pwm.take_frame().unwrap();
        assert_eq!(frame.as_slice(), widths.map(|w| w as u16));
        for (channel, width) in widths.iter().enumerate() {
            assert_eq!(pwm.read_channel(channel) as u32, *width);
        }
        assert!(!pwm.is_stale(7, at(t), TIMEOUT));
    }

    #[test]
    fn short_ppm_frame_is_discarded() {
        let (pwm, mut hal) = init(Config::default().with_ppm(true));

        let mut t = 0;
        ppm(&pwm, &mut hal, &mut t, &[0, 9000, 1500, 1500, 1500, 5000]);

        assert_eq!(pwm.take_frame(), None);
        assert_eq!(pwm.read_channel(0), 1000);
        assert!(pwm.is_stale(0, at(t), TIMEOUT));
    }

    #[test]
    fn ppm_frame_in_flight_at_boot_is_not_published() {
        let (pwm, mut hal) = init(Config::default().with_ppm(true));

        // Boot lands in the middle of a frame.
        let mut t = 0;
        ppm(&pwm, &mut hal, &mut t, &[0, 1300, 1400, 1500, 1600, 1700, 8000]);
        assert_eq!(pwm.take_frame(), None);
        assert_eq!(pwm.read_channel(0), 1000);

        ppm(&pwm, &mut hal, &mut t, &[1100, 1200, 1300, 1400, 1500, 8000]);
        let frame = pwm.take_frame().unwrap();
        assert_eq!(frame.as_slice(), [1100, 1200, 1300, 1400, 1500]);
        assert_eq!(pwm.read_channel(0), 1100);
    }

    #[test]
    fn throttle_high_at_boot_requests_calibration() {
        let (pwm, mut hal) = init(Config::default());
        assert!(!pwm.calibrate_throttle());

        // A failsafe-low pulse does not count as the first throttle value.
        pulse(&pwm, &mut hal, 2, 0, 900);
        pulse(&pwm, &mut hal, 2, 20_000, 1950);
        assert!(pwm.calibrate_throttle());

        pulse(&pwm, &mut hal, 2, 40_000, 1000);
        assert!(pwm.calibrate_throttle());
    }

    #[test]
    fn later_high_throttle_does_not_request_calibration() {
        let (pwm, mut hal) = init(Config::default().with_throttle_channel(3));

        pulse(&pwm, &mut hal, 2, 0, 2000);
        pulse(&pwm, &mut hal, 3, 0, 1100);
        pulse(&pwm, &mut hal, 3, 20_000, 2000);
        assert!(!pwm.calibrate_throttle());
    }

    #[test]
    fn ppm_throttle_high_at_boot_requests_calibration() {
        let (pwm, mut hal) = init(Config::default().with_ppm(true));

        let mut t = 0;
        ppm(&pwm, &mut hal, &mut t, &[0, 9000, 1500, 1500, 2000, 1500, 8000]);
        assert!(pwm.take_frame().is_some());
        assert!(pwm.calibrate_throttle());
    }

    #[test]
    fn edges_on_other_ports_are_ignored() {
        let (pwm, mut hal) = init(Config::default());
        hal.clear();

        pulse(&pwm, &mut hal, 9, 0, 1500);
        pulse(&pwm, &mut hal, 30, 0, 1500);

        assert!(hal.calls.is_empty());
        assert_eq!(pwm.motor_pulse(1), Some(1000));
    }

    #[test]
    fn motor_write_takes_effect_at_next_period() {
        let (pwm, mut hal) = init(Config::default());
        hal.clear();

        pwm.on_period(&mut hal, 8);
        pwm.write_motor(0, 1600);
        assert_eq!(pwm.motor_pulse(0), Some(1000));

        pwm.on_period(&mut hal, 8);
        assert_eq!(pwm.motor_pulse(0), Some(1600));
        pwm.on_period(&mut hal, 8);

        assert_eq!(hal.compares(8), [1000, 1600, 1600]);
    }

    #[test]
    fn writes_are_clamped_and_bounded() {
        let (pwm, mut hal) = init(Config::default().with_servos(true));
        assert_eq!(pwm.servo_count(), 2);

        pwm.write_servo(1, 5000);
        pwm.write_servo(2, 1500);
        pwm.write_motor(12, 1500);
        pwm.write_motor(0, 10);

        pwm.on_period(&mut hal, 9);
        pwm.on_period(&mut hal, 10);
        assert_eq!(pwm.servo_pulse(1), Some(2250));
        assert_eq!(pwm.servo_pulse(2), None);
        assert_eq!(pwm.motor_pulse(0), Some(750));
    }

    #[test]
    fn servo_compare_is_cut_at_period() {
        let config = Config::default()
            .with_servos(true)
            .with_servo_rate(Hertz(498));
        let (pwm, mut hal) = init(config);
        hal.clear();

        pwm.write_servo(0, 2250);
        pwm.on_period(&mut hal, 8);
        assert_eq!(hal.compares(8), [2008]);
    }

    #[test]
    fn three_d_mode_floors_motors_at_idle() {
        let (pwm, mut hal) = init(Config::default().with_idle_pulse(1460));
        assert_eq!(hal.compares(10), [1460]);

        pwm.write_motor(2, 1100);
        pwm.on_period(&mut hal, 10);
        assert_eq!(pwm.motor_pulse(2), Some(1460));
    }

    #[test]
    fn failsafe_threshold_keeps_channel_stale() {
        let (pwm, mut hal) = init(Config::default());

        pulse(&pwm, &mut hal, 0, 0, 900);
        assert_eq!(pwm.read_channel(0), 900);
        assert!(pwm.is_stale(0, at(1000), TIMEOUT));

        pulse(&pwm, &mut hal, 0, 20_000, 1100);
        assert!(!pwm.is_stale(0, at(21_100), TIMEOUT));
        assert!(pwm.is_stale(0, at(21_100 + 100_001), TIMEOUT));
    }

    #[test]
    fn normalized_read() {
        let (pwm, mut hal) = init(Config::default());
        pulse(&pwm, &mut hal, 1, 0, 1750);
        pulse(&pwm, &mut hal, 4, 0, 2250);

        assert_relative_eq!(pwm.read_normalized(1), 0.5);
        assert_relative_eq!(pwm.read_normalized(4), 1.0);
        assert_relative_eq!(pwm.read_normalized(0), -1.0);
    }

    #[test]
    fn interrupt_lookup_matches_roles() {
        let (pwm, _) = init(Config::default().with_ppm(true));
        let port = pwm.port_for(TimerId(2), TimChannel::C1).unwrap();
        assert_eq!(pwm.role(port), Role::RcInputPpm);
        assert_eq!(pwm.role(MAX_PORTS + 1), Role::Unassigned);
    }
}
