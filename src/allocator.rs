//! Boot-time assignment of ports to roles.

use heapless::Vec;

use crate::board::{Board, Slot, MAX_PORTS};
use crate::config::{Config, MAX_INPUTS, MAX_MOTORS, MAX_SERVOS};
use crate::Result;

/// The role a port plays for the life of the firmware.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Role {
    /// Unused, or owned by another driver (UART, soft-serial, ADC).
    #[default]
    Unassigned,

    /// Per-channel PWM input feeding logical channel `channel`.
    RcInputPwm { channel: u8 },

    /// PPM sum-stream input feeding every logical channel.
    RcInputPpm,

    /// Motor output number `index`.
    Motor { index: u8 },

    /// Servo output number `index`.
    Servo { index: u8 },
}

impl Role {
    pub fn is_input(self) -> bool {
        matches!(self, Role::RcInputPwm { .. } | Role::RcInputPpm)
    }
}

/// The result of [`allocate`].
#[derive(Clone, Debug)]
pub struct Allocation {
    pub roles: [Role; MAX_PORTS],

    /// Ports of each motor, by motor index.
    pub motors: Vec<usize, MAX_MOTORS>,

    /// Ports of each servo, by servo index.
    pub servos: Vec<usize, MAX_SERVOS>,

    /// Ports of each PWM input channel, or the single PPM port.
    pub inputs: Vec<usize, MAX_INPUTS>,

    /// Number of logical input channels available to readers.
    pub input_channels: usize,

    /// The ESCs should be calibrated before arming.
    pub calibrate_throttle: bool,
}

impl Allocation {
    fn new() -> Self {
        Self {
            roles: [Role::Unassigned; MAX_PORTS],
            motors: Vec::new(),
            servos: Vec::new(),
            inputs: Vec::new(),
            input_channels: 0,
            calibrate_throttle: false,
        }
    }

    pub fn ppm_port(&self) -> Option<usize> {
        self.roles.iter().position(|role| *role == Role::RcInputPpm)
    }
}

/// Assign every port of `board` a role for `config`.
///
/// Ports are visited in the priority order of the layout picked by the
/// `airplane` and `use_ppm` flags. Requests beyond a role's maximum, repeated
/// ports and output slots on pins that cannot drive an output are skipped
/// with a warning, so callers should check the counts in the result.
///
/// Fails only when a layout names a port the board does not have.
pub fn allocate(board: &Board, config: &Config) -> Result<Allocation> {
    let mut allocation = Allocation::new();
    let layout = board.layout(config.airplane, config.use_ppm);

    for entry in layout {
        let port = entry.port;
        let hw = board.descriptor_for(port)?;

        if allocation.roles[port] != Role::Unassigned {
            log::warn!("port {} listed twice in the {} layout", port, board.name);
            continue;
        }

        if board.reserved_ports.contains(&port) {
            log::debug!("port {} is reserved on {}", port, board.name);
            continue;
        }
        if config.use_uart && board.uart_ports.contains(&port) {
            continue;
        }
        if config.use_soft_serial && board.soft_serial_ports.contains(&port) {
            continue;
        }
        if config.adc_channel == Some(port) {
            continue;
        }

        let mut slot = entry.slot;
        if !config.airplane {
            if config.use_servos && board.servo_swap_ports.contains(&port) {
                slot = Slot::Servo;
            }
            if config.use_ppm
                && config.extra_servos
                && slot == Slot::Motor
                && board.extra_servo_ports.contains(&port)
            {
                slot = Slot::Servo;
            }
        }

        let role = match slot {
            Slot::PpmInput | Slot::PwmInput if !config.enable_input => continue,
            Slot::PpmInput => {
                if allocation.ppm_port().is_some() {
                    log::warn!("port {}: PPM input already assigned", port);
                    continue;
                }
                // A single capture channel carries every logical channel.
                let _ = allocation.inputs.push(port);
                allocation.input_channels = MAX_INPUTS;
                Role::RcInputPpm
            }
            Slot::PwmInput => {
                let channel = allocation.inputs.len();
                if allocation.inputs.push(port).is_err() {
                    log::warn!("port {}: all {} input channels taken", port, MAX_INPUTS);
                    continue;
                }
                allocation.input_channels = allocation.inputs.len();
                Role::RcInputPwm {
                    channel: channel as u8,
                }
            }
            Slot::Motor | Slot::Servo if !hw.output_enable => {
                log::warn!("port {} cannot drive an output", port);
                continue;
            }
            Slot::Motor => {
                let index = allocation.motors.len();
                if allocation.motors.push(port).is_err() {
                    log::warn!("port {}: all {} motor outputs taken", port, MAX_MOTORS);
                    continue;
                }
                Role::Motor { index: index as u8 }
            }
            Slot::Servo => {
                let index = allocation.servos.len();
                if allocation.servos.push(port).is_err() {
                    log::warn!("port {}: all {} servo outputs taken", port, MAX_SERVOS);
                    continue;
                }
                Role::Servo { index: index as u8 }
            }
        };

        log::debug!("port {} ({:?} ch {:?}): {:?}", port, hw.timer, hw.channel, role);
        allocation.roles[port] = role;
    }

    allocation.calibrate_throttle = config.calibrate_throttle;

    log::info!(
        "{}: {} input channels, {} motors, {} servos",
        board.name,
        allocation.input_channels,
        allocation.motors.len(),
        allocation.servos.len()
    );

    Ok(allocation)
}
