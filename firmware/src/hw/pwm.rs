// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Servo PWM outputs.
//!
//! The three joint motor drivers share TIM1 and the gripper runs on TIM2. Both timers are set up
//! for a 5 ms frame; pulse widths are computed by `arm_core::drivers::Servo`.

use embedded_hal::PwmPin;
use stm32f7xx_hal::{
    gpio::{gpiob, Alternate},
    pac,
    prelude::*,
    rcc::Clocks,
    timer::PwmChannel,
};

use crate::hw::pins::MotorIo;

/// Servo frame rate. One frame is `arm_core::drivers::servo::PULSE_PERIOD`.
pub const SERVO_PWM_HZ: u32 = 200;

pub type GripperPwm = PwmChannel<pac::TIM2, 2>;

/// One TIM1 channel, any joint.
pub enum MotorPwm {
    Ch1(PwmChannel<pac::TIM1, 0>),
    Ch2(PwmChannel<pac::TIM1, 1>),
    Ch3(PwmChannel<pac::TIM1, 2>),
}

macro_rules! each_channel {
    ($self:expr, $ch:ident => $body:expr) => {
        match $self {
            MotorPwm::Ch1($ch) => $body,
            MotorPwm::Ch2($ch) => $body,
            MotorPwm::Ch3($ch) => $body,
        }
    };
}

impl PwmPin for MotorPwm {
    type Duty = u16;

    fn disable(&mut self) {
        each_channel!(self, ch => ch.disable())
    }

    fn enable(&mut self) {
        each_channel!(self, ch => ch.enable())
    }

    fn get_duty(&self) -> u16 {
        each_channel!(self, ch => ch.get_duty())
    }

    fn get_max_duty(&self) -> u16 {
        each_channel!(self, ch => ch.get_max_duty())
    }

    fn set_duty(&mut self, duty: u16) {
        each_channel!(self, ch => ch.set_duty(duty))
    }
}

/// Start TIM1 at the servo frame rate and hand back one channel per joint, in joint order.
pub fn motor_channels(tim1: pac::TIM1, pins: MotorIo, clocks: &Clocks) -> [MotorPwm; 3] {
    let (ch1, ch2, ch3) = tim1.pwm_hz(pins, SERVO_PWM_HZ.Hz(), clocks).split();
    [MotorPwm::Ch1(ch1), MotorPwm::Ch2(ch2), MotorPwm::Ch3(ch3)]
}

/// Start TIM2 at the servo frame rate for the gripper.
pub fn gripper_channel(
    tim2: pac::TIM2,
    pin: gpiob::PB10<Alternate<1>>,
    clocks: &Clocks,
) -> GripperPwm {
    tim2.pwm_hz(pin, SERVO_PWM_HZ.Hz(), clocks).split()
}
