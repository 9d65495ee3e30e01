use embedded_hal::PwmPin;
use num_traits::{NumCast, ToPrimitive};

use super::{Edge, TimerHal};
use crate::board::ChannelDescriptor;

/// A [`TimerHal`] for output-only ports backed by `embedded-hal` PWM pins.
///
/// Each pin is bound to a port index. The pin's HAL owns the timer period, so
/// compare values are converted to a duty relative to the port's period.
/// Capture requests are ignored.
pub struct PwmPinBank<P, const N: usize> {
    ports: [usize; N],
    pins: [P; N],
    periods: [u32; N],
}

impl<P, const N: usize> PwmPinBank<P, N>
where
    P: PwmPin,
    P::Duty: NumCast + ToPrimitive + Copy,
{
    /// Create a bank from `(port, pin)` pairs.
    pub fn new(ports: [usize; N], pins: [P; N]) -> Self {
        Self {
            ports,
            pins,
            periods: [0; N],
        }
    }

    /// The pin bound to `port`.
    pub fn pin(&self, port: usize) -> Option<&P> {
        self.slot(port).map(|i| &self.pins[i])
    }

    pub fn release(self) -> [P; N] {
        self.pins
    }

    fn slot(&self, port: usize) -> Option<usize> {
        self.ports.iter().position(|&p| p == port)
    }
}

impl<P, const N: usize> TimerHal for PwmPinBank<P, N>
where
    P: PwmPin,
    P::Duty: NumCast + ToPrimitive + Copy,
{
    fn set_period(&mut self, port: usize, _hw: &ChannelDescriptor, period: u32) {
        if let Some(i) = self.slot(port) {
            self.periods[i] = period;
        }
    }

    fn set_compare(&mut self, port: usize, _hw: &ChannelDescriptor, compare: u32) {
        let Some(i) = self.slot(port) else {
            return;
        };
        let period = self.periods[i];
        if period == 0 {
            return;
        }

        let max = self.pins[i].get_max_duty().to_u64().unwrap_or(0);
        let duty = max * compare.min(period) as u64 / period as u64;
        if let Some(duty) = <P::Duty as NumCast>::from(duty) {
            self.pins[i].set_duty(duty);
        }
    }

    fn set_capture_edge(&mut self, _port: usize, _hw: &ChannelDescriptor, _edge: Edge) {}

    fn enable_interrupt(&mut self, port: usize, _hw: &ChannelDescriptor) {
        if let Some(i) = self.slot(port) {
            self.pins[i].enable();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::NAZE;

    struct TestPin {
        duty: u16,
        enabled: bool,
    }

    impl PwmPin for TestPin {
        type Duty = u16;

        fn disable(&mut self) {
            self.enabled = false;
        }

        fn enable(&mut self) {
            self.enabled = true;
        }

        fn get_duty(&self) -> u16 {
            self.duty
        }

        fn get_max_duty(&self) -> u16 {
            10_000
        }

        fn set_duty(&mut self, duty: u16) {
            self.duty = duty;
        }
    }

    #[test]
    fn compare_becomes_duty() {
        let pin = TestPin {
            duty: 0,
            enabled: false,
        };
        let mut bank = PwmPinBank::new([9], [pin]);
        let hw = NAZE.ports[9];

        bank.set_period(9, &hw, 2500);
        bank.set_compare(9, &hw, 1000);
        bank.enable_interrupt(9, &hw);

        let pin = bank.pin(9).unwrap();
        assert_eq!(pin.get_duty(), 4000);
        assert!(pin.enabled);
    }

    #[test]
    fn unbound_ports_are_ignored() {
        let pin = TestPin {
            duty: 7,
            enabled: false,
        };
        let mut bank = PwmPinBank::new([9], [pin]);
        let hw = NAZE.ports[3];

        bank.set_period(3, &hw, 2500);
        bank.set_compare(3, &hw, 1000);

        assert_eq!(bank.release()[0].duty, 7);
    }
}
