// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Command message protocol used to talk to the arm.

use crate::JOINT_COUNT;

// Opcodes
pub const OP_ENABLE: u8 = 0x01;
pub const OP_DISABLE: u8 = 0x02;
pub const OP_TELEMETRY: u8 = 0x03;
pub const OP_SET_SETPOINTS: u8 = 0x04;
pub const OP_GRIPPER_OPEN: u8 = 0x05;
pub const OP_GRIPPER_CLOSE: u8 = 0x06;

/// Size of one encoded `f32`.
pub const FLOAT_LEN: usize = 4;

/// Payload of [`OP_SET_SETPOINTS`]: one angle per joint.
pub const SETPOINTS_LEN: usize = JOINT_COUNT * FLOAT_LEN;

/// Reply to [`OP_TELEMETRY`]: setpoint, angle, velocity, voltage per joint.
pub const TELEMETRY_LEN: usize = JOINT_COUNT * 4 * FLOAT_LEN;

/// Decoded host commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    EnableMotors,
    DisableMotors,
    GetTelemetry,
    /// Target angles [rad], in joint order.
    SetSetpoints([f32; JOINT_COUNT]),
    GripperOpen,
    GripperClose,
}

impl Command {
    /// Opcode that introduces this command on the wire.
    pub fn opcode(&self) -> u8 {
        match self {
            Command::EnableMotors => OP_ENABLE,
            Command::DisableMotors => OP_DISABLE,
            Command::GetTelemetry => OP_TELEMETRY,
            Command::SetSetpoints(_) => OP_SET_SETPOINTS,
            Command::GripperOpen => OP_GRIPPER_OPEN,
            Command::GripperClose => OP_GRIPPER_CLOSE,
        }
    }
}
