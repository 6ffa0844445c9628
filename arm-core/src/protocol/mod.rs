// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Host command protocol.
//!
//! Single-byte opcodes, optionally followed by a fixed-size payload, over a byte stream. Floats
//! travel as little-endian IEEE-754 `f32`.

pub mod codec;
pub mod dispatcher;
pub mod messages;
pub mod parser;

pub use dispatcher::{ArmControl, Dispatcher, Transport};
pub use messages::Command;
pub use parser::Parser;
