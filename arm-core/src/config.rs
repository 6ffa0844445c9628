// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Arm configuration tables.
//!
//! Home angles, joint command limits, and PID gains for the three joints, plus the loop rate and
//! voltage limits shared by all of them. Everything here is fixed at compile time and checked once
//! by [`ArmConfig::validate`] before the arm is built.
//!
//! WARNING: the joint limits are not exhaustive. Some in-range configurations still let the arm
//! hit the table or the camera bars.

use crate::control::AntiWindup;
use crate::JOINT_COUNT;

/// Baud rate of the host serial link.
pub const HOST_BAUD_RATE: u32 = 57_600;

/// SPI clock for the joint encoders.
pub const ENCODER_SPI_HZ: u32 = 1_000_000;

/// Configuration error reported by [`ArmConfig::validate`] and driver constructors.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Control loop frequency must be finite and positive.
    ControlRate,
    /// Actuator full-scale command must be finite and positive.
    CommandRange,
    /// PID voltage limit must be finite and positive.
    VoltageLimit,
    /// Joint command limits are non-finite or inverted.
    JointLimits { joint: usize },
}

/// PID gains for one joint. Errors are in radians, outputs in volts.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PidGains {
    /// P-gain [V/rad]
    pub kp: f32,
    /// I-gain [V/(rad*s)]
    pub ki: f32,
    /// D-gain [V/(rad/s)]
    pub kd: f32,
}

/// Per-joint calibration and limits.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JointConfig {
    /// Encoder reading at the joint's zero position [rad].
    pub home_angle: f32,
    /// Minimum angle command [rad].
    pub min_angle: f32,
    /// Maximum angle command [rad].
    pub max_angle: f32,
    pub gains: PidGains,
}

/// Whole-arm configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ArmConfig {
    /// Control loop frequency [Hz].
    pub control_hz: f32,
    /// Motor supply voltage; maps to full servo deflection [V].
    pub motor_voltage_max: f32,
    /// Symmetric PID output limit [V].
    pub pid_voltage_limit: f32,
    /// Gripper open command, in [-1, 1].
    pub gripper_open: f32,
    /// Gripper closed command, in [-1, 1].
    pub gripper_close: f32,
    pub anti_windup: AntiWindup,
    /// Reject encoder responses with bad parity instead of using them.
    pub encoder_parity_check: bool,
    pub joints: [JointConfig; JOINT_COUNT],
}

impl ArmConfig {
    pub const DEFAULT: ArmConfig = ArmConfig {
        control_hz: 100.0,
        motor_voltage_max: 7.3,
        pid_voltage_limit: 3.0,
        gripper_open: 1.0,
        gripper_close: -1.0,
        anti_windup: AntiWindup::None,
        encoder_parity_check: true,
        joints: [
            JointConfig {
                home_angle: 4.82,
                min_angle: -1.00,
                max_angle: 1.00,
                gains: PidGains {
                    kp: 10.0,
                    ki: 3.0,
                    kd: 0.0,
                },
            },
            JointConfig {
                home_angle: 4.79,
                min_angle: -0.10,
                max_angle: 1.10,
                gains: PidGains {
                    kp: 15.0,
                    ki: 1.0,
                    kd: 0.0,
                },
            },
            JointConfig {
                home_angle: 3.03,
                min_angle: -0.35,
                max_angle: 0.90,
                gains: PidGains {
                    kp: 15.0,
                    ki: 40.0,
                    kd: 0.0,
                },
            },
        ],
    };

    /// Control period [s].
    #[inline]
    pub fn control_period(&self) -> f32 {
        1.0 / self.control_hz
    }

    /// Check that every limit is usable. `f32::clamp` panics on inverted or NaN bounds, so this
    /// must pass before any limit is used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.control_hz.is_finite() && self.control_hz > 0.0) {
            return Err(ConfigError::ControlRate);
        }
        if !(self.motor_voltage_max.is_finite() && self.motor_voltage_max > 0.0) {
            return Err(ConfigError::CommandRange);
        }
        if !(self.pid_voltage_limit.is_finite() && self.pid_voltage_limit > 0.0) {
            return Err(ConfigError::VoltageLimit);
        }
        for (joint, cfg) in self.joints.iter().enumerate() {
            let finite = cfg.min_angle.is_finite() && cfg.max_angle.is_finite();
            if !finite || cfg.min_angle > cfg.max_angle {
                return Err(ConfigError::JointLimits { joint });
            }
        }
        Ok(())
    }
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
