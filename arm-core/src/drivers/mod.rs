// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Device-Specific Drivers
//!
//! This module contains device-level drivers that sit above the board's SPI/PWM peripherals and
//! below the control logic.
//!
//! ## Existing drivers
//!
//! - [`encoder`] – ams AS5055A 12-bit absolute magnetic encoder (SPI)
//! - [`servo`] – PWM servo-style actuator with enable gating (joint motors, gripper)

pub mod encoder;
pub mod servo;

pub use encoder::{As5055, WordBus};
pub use servo::Servo;
