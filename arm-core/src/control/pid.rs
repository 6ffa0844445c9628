// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Discrete-time PID controller for joint angle control.
//!
//! Works in `no_std` and does not allocate memory. The caller supplies the error (setpoint minus
//! measurement) once per control period; the controller runs at a fixed rate given at
//! construction.

use crate::config::PidGains;

/// Integrator behaviour while the output is saturated.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AntiWindup {
    /// Always integrate, even while saturated.
    None,
    /// Hold the integrator when the unsaturated output is past a limit and the error would push it
    /// further out.
    Conditional,
}

/// PID controller with fixed period, feed-forward input, and output clamping.
#[derive(Clone, Debug)]
pub struct Pid {
    /// Proportional gain
    kp: f32,
    /// Integral gain
    ki: f32,
    /// Derivative gain
    kd: f32,

    /// Control period [s]
    period: f32,

    /// Integrator state
    integral: f32,
    /// Error from the previous update (for derivative term)
    prev_error: f32,
    /// Last clamped output
    output: f32,

    /// Output clamp
    out_min: f32,
    out_max: f32,

    anti_windup: AntiWindup,

    first_update: bool,
}

impl Pid {
    /// Create a new PID controller.
    ///
    /// `kp`, `ki`, `kd` are the gain constants; `period` is the interval between `update` calls [s].
    pub fn new(kp: f32, ki: f32, kd: f32, period: f32) -> Self {
        Self {
            kp,
            ki,
            kd,

            period,

            integral: 0.0,
            prev_error: 0.0,
            output: 0.0,

            out_min: -1.0,
            out_max: 1.0,

            anti_windup: AntiWindup::None,

            first_update: true,
        }
    }

    /// Create a controller from a gain set.
    pub fn from_gains(gains: PidGains, period: f32) -> Self {
        Self::new(gains.kp, gains.ki, gains.kd, period)
    }

    /// Set output limits.
    pub fn with_output_limits(mut self, min: f32, max: f32) -> Self {
        self.out_min = min;
        self.out_max = max;
        self
    }

    /// Set the integrator policy used while saturated.
    pub fn with_anti_windup(mut self, anti_windup: AntiWindup) -> Self {
        self.anti_windup = anti_windup;
        self
    }

    /// Reset integrator + derivative history.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.output = 0.0;
        self.first_update = true;
    }

    /// Update the controller.
    ///
    /// `error` - setpoint minus measurement  
    /// `feedforward` - added to the output before clamping
    ///
    /// Returns a command in [`out_min`, `out_max`]. The derivative term is zero on the first call
    /// after construction or [`reset`](Self::reset).
    pub fn update(&mut self, error: f32, feedforward: f32) -> f32 {
        // ----- P term -----
        let up = self.kp * error;

        // ----- I term -----
        let ui_next = self.integral + self.ki * error * self.period;

        // ----- D term -----
        let ud = if self.first_update {
            self.first_update = false;
            0.0
        } else {
            self.kd * (error - self.prev_error) / self.period
        };
        self.prev_error = error;

        // ----- Output clamp -----
        let unsat = up + ui_next + ud + feedforward;
        let out = clamp_output(unsat, self.out_min, self.out_max);

        let winding_up =
            (unsat > self.out_max && error > 0.0) || (unsat < self.out_min && error < 0.0);
        match self.anti_windup {
            AntiWindup::Conditional if winding_up => {}
            _ => self.integral = ui_next,
        }

        self.output = out;
        out
    }

    /// Current integrator value.
    #[inline]
    pub fn integral(&self) -> f32 {
        self.integral
    }

    /// Output of the most recent update (zero after reset).
    #[inline]
    pub fn output(&self) -> f32 {
        self.output
    }
}

/// Saturate `value` to `[min, max]`. NaN passes through unchanged.
#[inline]
pub fn clamp_output(value: f32, min: f32, max: f32) -> f32 {
    if value > max {
        max
    } else if value < min {
        min
    } else {
        value
    }
}
