use super::{port, Board, ChannelDescriptor, GpioPort, LayoutEntry, Slot, TimChannel};
use crate::hal::TimerFamily;

const TIM1_CC_IRQ: u8 = 27;
const TIM2_IRQ: u8 = 28;
const TIM3_IRQ: u8 = 29;
const TIM4_IRQ: u8 = 30;
const TIM5_IRQ: u8 = 50;

use GpioPort::{A, B, D, E};
use Slot::{Motor, PpmInput, PwmInput, Servo};
use TimChannel::{C1, C2, C3, C4};
use TimerFamily::{Advanced, General16, General32};

static PORTS: [ChannelDescriptor; 20] = [
    port(1, Advanced, E, 9, C1, TIM1_CC_IRQ),  // PWM1
    port(1, Advanced, E, 11, C2, TIM1_CC_IRQ), // PWM2
    port(1, Advanced, E, 13, C3, TIM1_CC_IRQ), // PWM3
    port(1, Advanced, E, 14, C4, TIM1_CC_IRQ), // PWM4
    port(2, General32, A, 15, C1, TIM2_IRQ),   // PWM5
    port(2, General32, B, 3, C2, TIM2_IRQ),    // PWM6
    port(2, General32, B, 10, C3, TIM2_IRQ),   // PWM7
    port(2, General32, B, 11, C4, TIM2_IRQ),   // PWM8
    port(3, General16, B, 4, C1, TIM3_IRQ),    // PWM9
    port(3, General16, B, 5, C2, TIM3_IRQ),    // PWM10
    port(3, General16, B, 0, C3, TIM3_IRQ),    // PWM11
    port(3, General16, B, 1, C4, TIM3_IRQ),    // PWM12
    port(4, General16, D, 12, C1, TIM4_IRQ),   // PWM13, LED0
    port(4, General16, D, 13, C2, TIM4_IRQ),   // PWM14, LED1
    port(4, General16, D, 14, C3, TIM4_IRQ),   // PWM15, LED2
    port(4, General16, D, 15, C4, TIM4_IRQ),   // PWM16, LED3
    port(5, General32, A, 0, C1, TIM5_IRQ),    // PWM17
    port(5, General32, A, 1, C2, TIM5_IRQ),    // PWM18
    port(5, General32, A, 2, C3, TIM5_IRQ),    // PWM19, USART2 TX
    port(5, General32, A, 3, C4, TIM5_IRQ),    // PWM20, USART2 RX
];

static MULTI_PPM: [LayoutEntry; 17] = [
    LayoutEntry::new(0, PpmInput),
    LayoutEntry::new(8, Motor),
    LayoutEntry::new(9, Motor),
    LayoutEntry::new(10, Motor),
    LayoutEntry::new(11, Motor),
    LayoutEntry::new(12, Motor),
    LayoutEntry::new(13, Motor),
    LayoutEntry::new(14, Motor),
    LayoutEntry::new(15, Motor),
    LayoutEntry::new(16, Motor),
    LayoutEntry::new(17, Motor),
    LayoutEntry::new(18, Motor),
    LayoutEntry::new(19, Motor),
    LayoutEntry::new(4, Motor),
    LayoutEntry::new(5, Motor),
    LayoutEntry::new(6, Motor),
    LayoutEntry::new(7, Motor),
];

static MULTI_PWM: [LayoutEntry; 20] = [
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
    LayoutEntry::new(14, Motor),
    LayoutEntry::new(15, Motor),
    LayoutEntry::new(16, Motor),
    LayoutEntry::new(17, Motor),
    LayoutEntry::new(18, Motor),
    LayoutEntry::new(19, Motor),
];

static AIR_PPM: [LayoutEntry; 11] = [
    LayoutEntry::new(0, PpmInput),
    LayoutEntry::new(8, Motor),
    LayoutEntry::new(9, Motor),
    LayoutEntry::new(10, Servo),
    LayoutEntry::new(11, Servo),
    LayoutEntry::new(16, Servo),
    LayoutEntry::new(17, Servo),
    LayoutEntry::new(18, Servo),
    LayoutEntry::new(19, Servo),
    LayoutEntry::new(4, Servo),
    LayoutEntry::new(5, Servo),
];

static AIR_PWM: [LayoutEntry; 16] = [
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
    LayoutEntry::new(16, Servo),
    LayoutEntry::new(17, Servo),
    LayoutEntry::new(18, Servo),
    LayoutEntry::new(19, Servo),
];

/// STM32F4 Discovery (STM32F407), 20 ports on TIM1..TIM5.
///
/// TIM4 shares PD12..PD15 with the four user LEDs, so PWM13..16 stay free.
pub static F4_DISCOVERY: Board = Board {
    name: "f4-discovery",
    ports: &PORTS,
    multi_ppm: &MULTI_PPM,
    multi_pwm: &MULTI_PWM,
    air_ppm: &AIR_PPM,
    air_pwm: &AIR_PWM,
    uart_ports: &[18, 19],
    soft_serial_ports: &[10, 11],
    servo_swap_ports: &[8, 9],
    extra_servo_ports: &[4, 5, 6, 7],
    reserved_ports: &[12, 13, 14, 15],
};
