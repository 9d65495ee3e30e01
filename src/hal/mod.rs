//! Hardware abstraction for the timer channels behind each port.
//!
//! The firmware implements [`TimerHal`] once over its register layer. Everything
//! that differs between timer units goes through [`TimerFamily`], which is chosen
//! per port from the board's descriptor table.

use crate::board::ChannelDescriptor;

mod family;
pub use family::{ChannelMode, TimerFamily};

mod pwm_pin;
pub use pwm_pin::PwmPinBank;

#[cfg(test)]
pub(crate) mod mock;

/// The edge an input capture channel latches on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

/// Register-level primitives of a timer channel.
///
/// All times are in ticks of a 1 MHz timer clock. `port` is the index of the
/// port in the board's descriptor table and `hw` is its descriptor.
pub trait TimerHal {
    /// Set the counter period of the timer unit driving `hw`.
    fn set_period(&mut self, port: usize, hw: &ChannelDescriptor, period: u32);

    /// Set the compare value that ends the pulse on `hw`.
    fn set_compare(&mut self, port: usize, hw: &ChannelDescriptor, compare: u32);

    /// Switch `hw` to input capture on `edge`.
    fn set_capture_edge(&mut self, port: usize, hw: &ChannelDescriptor, edge: Edge);

    /// Enable the capture/compare (or update) interrupt of `hw` in the NVIC.
    fn enable_interrupt(&mut self, port: usize, hw: &ChannelDescriptor);

    /// Set the main output enable of an advanced timer.
    fn enable_main_output(&mut self, _hw: &ChannelDescriptor) {}
}

impl<T> TimerHal for &mut T
where
    T: TimerHal + ?Sized,
{
    fn set_period(&mut self, port: usize, hw: &ChannelDescriptor, period: u32) {
        (**self).set_period(port, hw, period)
    }

    fn set_compare(&mut self, port: usize, hw: &ChannelDescriptor, compare: u32) {
        (**self).set_compare(port, hw, compare)
    }

    fn set_capture_edge(&mut self, port: usize, hw: &ChannelDescriptor, edge: Edge) {
        (**self).set_capture_edge(port, hw, edge)
    }

    fn enable_interrupt(&mut self, port: usize, hw: &ChannelDescriptor) {
        (**self).enable_interrupt(port, hw)
    }

    fn enable_main_output(&mut self, hw: &ChannelDescriptor) {
        (**self).enable_main_output(hw)
    }
}
