//! Motor and servo actuators on top of [`Pwm`].

use embedded_hal::blocking::delay::DelayMs;
use num_traits::{Float, NumCast};

use crate::config::PULSE_MID;
use crate::Pwm;

mod builder;
pub use builder::Builder;

pub trait Actuator<T> {
    /// Output a value in [-1, 1].
    fn output(&mut self, output: T);
}

impl<T, U> Actuator<U> for &mut T
where
    T: Actuator<U> + ?Sized,
{
    fn output(&mut self, output: U) {
        (**self).output(output)
    }
}

/// Electronic speed controller
pub trait ESC<T>: Actuator<T> {
    /// Arm this ESC.
    fn arm(&mut self);
}

impl<T, U> ESC<U> for &mut T
where
    T: ESC<U> + ?Sized,
{
    fn arm(&mut self) {
        (**self).arm()
    }
}

/// An RC ESC driven by one motor output of a [`Pwm`].
pub struct MotorEsc<'p, 'b> {
    pwm: &'p Pwm<'b>,
    index: usize,
    arm: u16,
    min: u16,
    max: u16,
    delay_ms: u16,
}

impl<'p, 'b> MotorEsc<'p, 'b> {
    pub fn new(pwm: &'p Pwm<'b>, index: usize) -> Self {
        Self::builder().build(pwm, index)
    }

    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Teach the ESC its throttle range by holding the top, then the bottom
    /// of the range before arming.
    ///
    /// Run this before arming when [`Pwm::calibrate_throttle`] is set. The
    /// period interrupts must be running for the pulses to reach the ESC.
    pub fn calibrate<D>(&mut self, delay: &mut D)
    where
        D: DelayMs<u16>,
    {
        log::info!("calibrating ESC on motor {}", self.index);

        self.pwm.write_motor(self.index, self.max);
        delay.delay_ms(self.delay_ms);

        self.pwm.write_motor(self.index, self.min);
        delay.delay_ms(self.delay_ms);

        self.arm_inner();
    }

    fn arm_inner(&mut self) {
        self.pwm.write_motor(self.index, self.arm)
    }
}

impl<U> Actuator<U> for MotorEsc<'_, '_>
where
    U: Float + NumCast,
{
    fn output(&mut self, output: U) {
        let output = output.max(-U::one()).min(U::one());
        let min = U::from(self.min).unwrap_or_else(U::zero);
        let max = U::from(self.max).unwrap_or_else(U::zero);

        let width: U = (output + U::one()) * (max - min) / (U::one() + U::one()) + min;
        let width = <u16 as NumCast>::from(width.round()).unwrap_or(self.min);
        self.pwm.write_motor(self.index, width);
    }
}

impl<U> ESC<U> for MotorEsc<'_, '_>
where
    U: Float + NumCast,
{
    fn arm(&mut self) {
        self.arm_inner()
    }
}

/// A servo driven by one servo output of a [`Pwm`].
///
/// An output of 0 is `center`, and -1 and 1 are `throw` microseconds either side.
pub struct Servo<'p, 'b> {
    pwm: &'p Pwm<'b>,
    index: usize,
    center: u16,
    throw: u16,
}

impl<'p, 'b> Servo<'p, 'b> {
    pub fn new(pwm: &'p Pwm<'b>, index: usize) -> Self {
        Self {
            pwm,
            index,
            center: PULSE_MID,
            throw: 500,
        }
    }

    pub fn with_center(mut self, center: u16) -> Self {
        self.center = center;
        self
    }

    pub fn with_throw(mut self, throw: u16) -> Self {
        self.throw = throw;
        self
    }
}

impl<U> Actuator<U> for Servo<'_, '_>
where
    U: Float + NumCast,
{
    fn output(&mut self, output: U) {
        let output = output.max(-U::one()).min(U::one());
        let center = U::from(self.center).unwrap_or_else(U::zero);
        let throw = U::from(self.throw).unwrap_or_else(U::zero);

        let width = <u16 as NumCast>::from((center + output * throw).round()).unwrap_or(self.center);
        self.pwm.write_servo(self.index, width);
    }
}
