// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Arm Core
//!
//! Hardware-agnostic firmware core for the 3-joint servo arm: encoder wire protocol, actuator
//! mapping, per-joint PID, the fixed-rate control cycle, and the host command protocol. Board
//! bring-up lives in the `arm-firmware` crate, which plugs STM32F7 peripherals into the traits
//! defined here.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`drivers`] | Device-level drivers (AS5055A encoder, PWM servo) |
//! | [`control`] | Control algorithms (PID) |
//! | [`arm`] | Joint table, motor enable state machine, control cycle |
//! | [`shared`] | Critical-section cell shared by the control interrupt and the dispatcher |
//! | [`protocol`] | Host opcodes, wire codec, byte parser, dispatcher |
//! | [`config`] | Joint limits, home angles, gains |
//!
//! ## Getting Started
//!
//! Run the host-side tests:
//!
//! ```bash
//! cargo test
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod arm;
pub mod config;
pub mod control;
pub mod drivers;
pub mod protocol;
pub mod shared;

pub use arm::{Arm, GripperCommand, JointState, MotorMode, Telemetry};
pub use config::{ArmConfig, ConfigError};
pub use shared::Shared;

/// Number of joints on the arm. Every per-joint array and wire payload is sized by this.
pub const JOINT_COUNT: usize = 3;
