use super::{port, Board, ChannelDescriptor, GpioPort, LayoutEntry, Slot, TimChannel};
use crate::hal::TimerFamily;

const TIM1_CC_IRQ: u8 = 27;
const TIM2_IRQ: u8 = 28;
const TIM3_IRQ: u8 = 29;
const TIM4_IRQ: u8 = 30;

use GpioPort::{A, B};
use Slot::{Motor, PpmInput, PwmInput, Servo};
use TimChannel::{C1, C2, C3, C4};
use TimerFamily::{Advanced, General16};

static PORTS: [ChannelDescriptor; 14] = [
    port(2, General16, A, 0, C1, TIM2_IRQ),  // PWM1
    port(2, General16, A, 1, C2, TIM2_IRQ),  // PWM2
    port(2, General16, A, 2, C3, TIM2_IRQ),  // PWM3
    port(2, General16, A, 3, C4, TIM2_IRQ),  // PWM4
    port(3, General16, A, 6, C1, TIM3_IRQ),  // PWM5
    port(3, General16, A, 7, C2, TIM3_IRQ),  // PWM6
    port(3, General16, B, 0, C3, TIM3_IRQ),  // PWM7
    port(3, General16, B, 1, C4, TIM3_IRQ),  // PWM8
    port(1, Advanced, A, 8, C1, TIM1_CC_IRQ), // PWM9
    port(1, Advanced, A, 11, C4, TIM1_CC_IRQ), // PWM10
    port(4, General16, B, 6, C1, TIM4_IRQ),  // PWM11
    port(4, General16, B, 7, C2, TIM4_IRQ),  // PWM12
    port(4, General16, B, 8, C3, TIM4_IRQ),  // PWM13
    port(4, General16, B, 9, C4, TIM4_IRQ),  // PWM14
];

static MULTI_PPM: [LayoutEntry; 11] = [
    LayoutEntry::new(0, PpmInput),
    LayoutEntry::new(8, Motor),
    LayoutEntry::new(9, Motor),
    LayoutEntry::new(10, Motor),
    LayoutEntry::new(11, Motor),
    LayoutEntry::new(12, Motor),
    LayoutEntry::new(13, Motor),
    LayoutEntry::new(4, Motor),
    LayoutEntry::new(5, Motor),
    LayoutEntry::new(6, Motor),
    LayoutEntry::new(7, Motor),
];

static MULTI_PWM: [LayoutEntry; 14] = [
    LayoutEntry::new(0, PwmInput),
    LayoutEntry::new(1, PwmInput),
    LayoutEntry::new(2, PwmInput),
    LayoutEntry::new(3, PwmInput),
    LayoutEntry::new(4, PwmInput),
    LayoutEntry::new(5, PwmInput),
    LayoutEntry::new(6, PwmInput),
    LayoutEntry::new(7, PwmInput),
    LayoutEntry::new(8, Motor),
    LayoutEntry::new(9, Motor),
    LayoutEntry::new(10, Motor),
    LayoutEntry::new(11, Motor),
    LayoutEntry::new(12, Motor),
    LayoutEntry::new(13, Motor),
];

static AIR_PPM: [LayoutEntry; 11] = [
    LayoutEntry::new(0, PpmInput),
    LayoutEntry::new(8, Motor),
    LayoutEntry::new(9, Motor),
    LayoutEntry::new(10, Servo),
    LayoutEntry::new(11, Servo),
    LayoutEntry::new(12, Servo),
    LayoutEntry::new(13, Servo),
    LayoutEntry::new(4, Servo),
    LayoutEntry::new(5, Servo),
    LayoutEntry::new(6, Servo),
    LayoutEntry::new(7, Servo),
];

static AIR_PWM: [LayoutEntry; 14] = [
    LayoutEntry::new(0, PwmInput),
    LayoutEntry::new(1, PwmInput),
    LayoutEntry::new(2, PwmInput),
    LayoutEntry::new(3, PwmInput),
    LayoutEntry::new(4, PwmInput),
    LayoutEntry::new(5, PwmInput),
    LayoutEntry::new(6, PwmInput),
    LayoutEntry::new(7, PwmInput),
    LayoutEntry::new(8, Motor),
    LayoutEntry::new(9, Motor),
    LayoutEntry::new(10, Servo),
    LayoutEntry::new(11, Servo),
    LayoutEntry::new(12, Servo),
    LayoutEntry::new(13, Servo),
];

/// Naze32 / AfroFlight32 (STM32F103), 14 ports on TIM1..TIM4.
pub static NAZE: Board = Board {
    name: "naze",
    ports: &PORTS,
    multi_ppm: &MULTI_PPM,
    multi_pwm: &MULTI_PWM,
    air_ppm: &AIR_PPM,
    air_pwm: &AIR_PWM,
    uart_ports: &[2, 3],
    soft_serial_ports: &[4, 5, 6, 7],
    servo_swap_ports: &[8, 9],
    extra_servo_ports: &[4, 5, 6, 7],
    reserved_ports: &[],
};
