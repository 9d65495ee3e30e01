//! Port registry: the compiled-in description of a board's timer channels.

use crate::hal::TimerFamily;
use crate::{Error, Result};

mod f4_discovery;
pub use f4_discovery::F4_DISCOVERY;

mod naze;
pub use naze::NAZE;

/// Upper bound on the number of physical ports of any board.
pub const MAX_PORTS: usize = 20;

/// A hardware timer unit, by number (`TimerId(2)` is TIM2).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(pub u8);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GpioPort {
    A,
    B,
    C,
    D,
    E,
}

/// A capture/compare channel within a timer unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimChannel {
    C1,
    C2,
    C3,
    C4,
}

/// The physical timer channel, pin and interrupt behind one port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelDescriptor {
    pub timer: TimerId,
    pub family: TimerFamily,
    pub gpio: GpioPort,
    pub pin: u8,
    pub channel: TimChannel,
    pub irq: u8,

    /// The pin is wired so that it can drive an output.
    pub output_enable: bool,
}

/// What a layout entry asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    PpmInput,
    PwmInput,
    Motor,
    Servo,
}

/// One port of a layout, in allocation priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutEntry {
    pub port: usize,
    pub slot: Slot,
}

impl LayoutEntry {
    pub const fn new(port: usize, slot: Slot) -> Self {
        Self { port, slot }
    }
}

/// A board variant: its ports, its layouts and the ports other drivers may claim.
#[derive(Debug)]
pub struct Board {
    pub name: &'static str,
    pub ports: &'static [ChannelDescriptor],

    pub multi_ppm: &'static [LayoutEntry],
    pub multi_pwm: &'static [LayoutEntry],
    pub air_ppm: &'static [LayoutEntry],
    pub air_pwm: &'static [LayoutEntry],

    /// Ports taken by the hardware UART when it is enabled.
    pub uart_ports: &'static [usize],

    /// Ports taken by soft-serial when it is enabled.
    pub soft_serial_ports: &'static [usize],

    /// Multirotor motor ports that become servos with `use_servos`.
    pub servo_swap_ports: &'static [usize],

    /// Multirotor motor ports that become servos with `extra_servos`.
    pub extra_servo_ports: &'static [usize],

    /// Ports whose pins are wired to something else on this board (LEDs,
    /// buzzer). They are never allocated.
    pub reserved_ports: &'static [usize],
}

impl Board {
    /// Look up the descriptor of `port`.
    ///
    /// A port past [`MAX_PORTS`] or past the end of the board's table is a
    /// configuration error.
    pub fn descriptor_for(&self, port: usize) -> Result<&ChannelDescriptor> {
        if port >= MAX_PORTS {
            return Err(Error::InvalidPort { port });
        }
        self.ports.get(port).ok_or(Error::InvalidPort { port })
    }

    /// Find the port wired to `channel` of `timer`, for interrupt dispatch.
    pub fn port_for(&self, timer: TimerId, channel: TimChannel) -> Option<usize> {
        self.ports
            .iter()
            .position(|hw| hw.timer == timer && hw.channel == channel)
    }

    /// The layout to allocate from.
    pub fn layout(&self, airplane: bool, ppm: bool) -> &'static [LayoutEntry] {
        match (airplane, ppm) {
            (false, true) => self.multi_ppm,
            (false, false) => self.multi_pwm,
            (true, true) => self.air_ppm,
            (true, false) => self.air_pwm,
        }
    }
}

const fn port(
    timer: u8,
    family: TimerFamily,
    gpio: GpioPort,
    pin: u8,
    channel: TimChannel,
    irq: u8,
) -> ChannelDescriptor {
    ChannelDescriptor {
        timer: TimerId(timer),
        family,
        gpio,
        pin,
        channel,
        irq,
        output_enable: true,
    }
}
