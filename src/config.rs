use embedded_time::rate::Hertz;

/// Maximum number of motor outputs.
pub const MAX_MOTORS: usize = 12;

/// Maximum number of servo outputs.
pub const MAX_SERVOS: usize = 8;

/// Maximum number of logical RC input channels.
pub const MAX_INPUTS: usize = 8;

/// Shortest pulse (in microseconds) accepted from a receiver or sent to an output.
pub const PULSE_MIN: u16 = 750;

/// Longest pulse (in microseconds) accepted from a receiver or sent to an output.
pub const PULSE_MAX: u16 = 2250;

/// Low idle pulse used when no idle pulse is configured.
pub const PULSE_1MS: u16 = 1000;

/// Center pulse of a normal RC channel.
pub const PULSE_MID: u16 = 1500;

/// A PPM gap longer than this (in microseconds) marks a frame boundary.
pub const PPM_SYNC_THRESHOLD: u32 = 2700;

/// Minimum number of channels a PPM frame needs before it is published.
pub const PPM_MIN_CHANNELS: usize = 4;

/// A first throttle pulse at or above this (in microseconds) asks for ESC calibration.
pub const CALIBRATION_THROTTLE: u16 = 1900;

/// Motor rates above this switch motors to brushed (duty proportional) output.
pub const BRUSHED_RATE_THRESHOLD: u32 = 500;

const MOTOR_RATE_RANGE: (u32, u32) = (50, 32_000);
const SERVO_RATE_RANGE: (u32, u32) = (50, 498);

/// Driver configuration, consumed once by [`Pwm::init`](crate::Pwm::init).
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Capture RC input on the layout's input ports.
    pub enable_input: bool,

    /// Decode a single PPM sum-stream instead of one PWM wire per channel.
    pub use_ppm: bool,

    /// Leave the board's UART ports to the serial driver.
    pub use_uart: bool,

    /// Leave the board's soft-serial ports to the soft-serial driver.
    pub use_soft_serial: bool,

    /// Remap the board's servo-swap ports from motors to servos.
    pub use_servos: bool,

    /// In PPM mode, drive the board's extra ports as servos instead of motors.
    pub extra_servos: bool,

    /// Use the fixed-wing layouts, which carry more servo slots.
    pub airplane: bool,

    /// A port given to the current sensor instead of RC input.
    pub adc_channel: Option<usize>,

    /// Refresh rate of the motor outputs.
    pub motor_rate: Hertz,

    /// Refresh rate of the servo outputs.
    pub servo_rate: Hertz,

    /// Pulse (in microseconds) written at init and used as the 3D floor.
    /// Zero means [`PULSE_1MS`] and disables 3D mode.
    pub idle_pulse: u16,

    /// Captured widths below this (in microseconds) do not count as a live signal.
    pub failsafe_threshold: u16,

    /// Ask the caller to calibrate the ESCs before arming.
    pub calibrate_throttle: bool,

    /// Logical input channel carrying throttle.
    pub throttle_channel: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_input: true,
            use_ppm: false,
            use_uart: false,
            use_soft_serial: false,
            use_servos: false,
            extra_servos: false,
            airplane: false,
            adc_channel: None,
            motor_rate: Hertz(400),
            servo_rate: Hertz(50),
            idle_pulse: 0,
            failsafe_threshold: 985,
            calibrate_throttle: false,
            throttle_channel: 2,
        }
    }
}

impl Config {
    /// Builder method to set `enable_input` and return `self`
    pub fn with_input(mut self, enable_input: bool) -> Self {
        self.enable_input = enable_input;
        self
    }

    /// Builder method to set `use_ppm` and return `self`
    pub fn with_ppm(mut self, use_ppm: bool) -> Self {
        self.use_ppm = use_ppm;
        self
    }

    /// Builder method to set `use_uart` and return `self`
    pub fn with_uart(mut self, use_uart: bool) -> Self {
        self.use_uart = use_uart;
        self
    }

    /// Builder method to set `use_soft_serial` and return `self`
    pub fn with_soft_serial(mut self, use_soft_serial: bool) -> Self {
        self.use_soft_serial = use_soft_serial;
        self
    }

    /// Builder method to set `use_servos` and return `self`
    pub fn with_servos(mut self, use_servos: bool) -> Self {
        self.use_servos = use_servos;
        self
    }

    /// Builder method to set `extra_servos` and return `self`
    pub fn with_extra_servos(mut self, extra_servos: bool) -> Self {
        self.extra_servos = extra_servos;
        self
    }

    /// Builder method to set `airplane` and return `self`
    pub fn with_airplane(mut self, airplane: bool) -> Self {
        self.airplane = airplane;
        self
    }

    /// Builder method to set `adc_channel` and return `self`
    pub fn with_adc_channel(mut self, port: usize) -> Self {
        self.adc_channel = Some(port);
        self
    }

    /// Builder method to set `motor_rate` and return `self`
    pub fn with_motor_rate(mut self, rate: Hertz) -> Self {
        self.motor_rate = rate;
        self
    }

    /// Builder method to set `servo_rate` and return `self`
    pub fn with_servo_rate(mut self, rate: Hertz) -> Self {
        self.servo_rate = rate;
        self
    }

    /// Builder method to set `idle_pulse` and return `self`
    pub fn with_idle_pulse(mut self, micros: u16) -> Self {
        self.idle_pulse = micros;
        self
    }

    /// Builder method to set `failsafe_threshold` and return `self`
    pub fn with_failsafe_threshold(mut self, micros: u16) -> Self {
        self.failsafe_threshold = micros;
        self
    }

    /// Builder method to set `calibrate_throttle` and return `self`
    pub fn with_throttle_calibration(mut self, calibrate: bool) -> Self {
        self.calibrate_throttle = calibrate;
        self
    }

    /// Builder method to set `throttle_channel` and return `self`
    pub fn with_throttle_channel(mut self, channel: usize) -> Self {
        self.throttle_channel = channel;
        self
    }

    /// The idle pulse with the zero default resolved.
    pub fn idle(&self) -> u16 {
        if self.idle_pulse == 0 {
            PULSE_1MS
        } else {
            self.idle_pulse.clamp(PULSE_MIN, PULSE_MAX)
        }
    }

    /// Bidirectional ("3D") motor mode, enabled by a non-default idle pulse.
    pub fn is_3d(&self) -> bool {
        self.idle_pulse != 0
    }

    /// Motors are driven duty-proportionally above [`BRUSHED_RATE_THRESHOLD`].
    pub fn is_brushed(&self) -> bool {
        self.motor_rate.0 > BRUSHED_RATE_THRESHOLD
    }

    /// Returns a copy with out-of-range refresh rates capped to what the timers support.
    pub fn sanitized(mut self) -> Self {
        let motor = self.motor_rate.0.clamp(MOTOR_RATE_RANGE.0, MOTOR_RATE_RANGE.1);
        if motor != self.motor_rate.0 {
            log::warn!("motor rate {}Hz capped to {}Hz", self.motor_rate.0, motor);
            self.motor_rate = Hertz(motor);
        }

        let servo = self.servo_rate.0.clamp(SERVO_RATE_RANGE.0, SERVO_RATE_RANGE.1);
        if servo != self.servo_rate.0 {
            log::warn!("servo rate {}Hz capped to {}Hz", self.servo_rate.0, servo);
            self.servo_rate = Hertz(servo);
        }

        self
    }

    /// Output period (in microseconds) of a motor port.
    pub fn motor_period(&self) -> u32 {
        period_micros(self.motor_rate)
    }

    /// Output period (in microseconds) of a servo port.
    pub fn servo_period(&self) -> u32 {
        period_micros(self.servo_rate)
    }
}

fn period_micros(rate: Hertz) -> u32 {
    1_000_000 / rate.0.max(1)
}
