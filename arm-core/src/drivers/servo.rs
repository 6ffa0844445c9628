// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Servo-style PWM actuator.
//!
//! Used for the joint motor drivers (command in volts) and the gripper (normalized command). A
//! signed command maps linearly onto a 1.0–2.0 ms pulse in a 5 ms frame, centred on 1.5 ms.
//!
//! The output is gated: while disarmed the pulse is held at zero and [`Servo::set_cmd`] does
//! nothing, so a stale command can never reach the driver after power-up or a disable.

use crate::config::ConfigError;
use crate::control::clamp_output;
use embedded_hal::PwmPin;

/// PWM frame period [s].
pub const PULSE_PERIOD: f32 = 0.0050;
/// Shortest pulse [s].
pub const PULSE_MIN: f32 = 0.0010;
/// Longest pulse [s].
pub const PULSE_MAX: f32 = 0.0020;
/// Pulse for a zero command [s].
pub const PULSE_OFFSET: f32 = 0.0015;
/// Pulse change for a full-scale command [s].
pub const PULSE_RANGE: f32 = 0.0005;

/// PWM servo output with enable/disable gating.
pub struct Servo<P> {
    pwm: P,
    pulse_per_cmd: f32,
    enabled: bool,
    /// Last pulse written [s]
    pulse: f32,
}

impl<P> Servo<P>
where
    P: PwmPin<Duty = u16>,
{
    /// Wrap a PWM channel. `[-cmd_max, cmd_max]` maps onto the full pulse range.
    ///
    /// The PWM timer must already run with a [`PULSE_PERIOD`] frame. Call [`init`](Self::init)
    /// before use.
    pub fn new(pwm: P, cmd_max: f32) -> Result<Self, ConfigError> {
        if !(cmd_max.is_finite() && cmd_max > 0.0) {
            return Err(ConfigError::CommandRange);
        }
        Ok(Self {
            pwm,
            pulse_per_cmd: PULSE_RANGE / cmd_max,
            enabled: false,
            pulse: 0.0,
        })
    }

    /// Start the PWM channel with the output disarmed.
    pub fn init(&mut self) {
        self.pwm.enable();
        self.disable();
    }

    /// Arm the output and command zero.
    pub fn enable(&mut self) {
        self.enabled = true;
        self.set_cmd(0.0);
    }

    /// Drop the pulse to zero and disarm.
    pub fn disable(&mut self) {
        self.pwm.set_duty(0);
        self.pulse = 0.0;
        self.enabled = false;
    }

    /// Set the command if armed; ignored otherwise.
    pub fn set_cmd(&mut self, cmd: f32) {
        if self.enabled {
            let pulse = self.pulse_for(cmd);
            self.pwm.set_duty(duty_for(pulse, self.pwm.get_max_duty()));
            self.pulse = pulse;
        }
    }

    /// Pulse width a command maps to, clamped to [`PULSE_MIN`, `PULSE_MAX`].
    #[inline]
    pub fn pulse_for(&self, cmd: f32) -> f32 {
        clamp_output(PULSE_OFFSET + self.pulse_per_cmd * cmd, PULSE_MIN, PULSE_MAX)
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Last pulse width written [s]; zero while disarmed.
    #[inline]
    pub fn pulse_width(&self) -> f32 {
        self.pulse
    }

    pub fn free(self) -> P {
        self.pwm
    }
}

/// Convert a pulse width to a duty value for a timer with `max_duty` steps per frame.
///
/// A NaN pulse yields zero duty.
#[inline]
pub fn duty_for(pulse: f32, max_duty: u16) -> u16 {
    if pulse.is_nan() {
        return 0;
    }
    let duty = micromath::F32Ext::round(pulse / PULSE_PERIOD * max_duty as f32);
    duty as u16
}
