// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Control Algorithms
//!
//! ## Modules
//!
//! - [`pid`] - Fixed-rate PID controller with feed-forward and output saturation.

pub mod pid;

pub use pid::{clamp_output, AntiWindup, Pid};
