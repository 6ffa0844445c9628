// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Wire encoding for protocol payloads.

use crate::arm::Telemetry;
use crate::protocol::messages::{FLOAT_LEN, SETPOINTS_LEN, TELEMETRY_LEN};
use crate::JOINT_COUNT;

#[inline]
pub fn encode_f32(value: f32) -> [u8; FLOAT_LEN] {
    value.to_le_bytes()
}

#[inline]
pub fn decode_f32(bytes: [u8; FLOAT_LEN]) -> f32 {
    f32::from_le_bytes(bytes)
}

/// Encode a telemetry snapshot, joint-major: setpoint, angle, velocity, voltage.
pub fn encode_telemetry(telemetry: &Telemetry) -> [u8; TELEMETRY_LEN] {
    let mut out = [0u8; TELEMETRY_LEN];
    let fields = telemetry
        .iter()
        .flat_map(|j| [j.setpoint, j.angle, j.velocity, j.voltage]);

    for (chunk, value) in out.chunks_exact_mut(FLOAT_LEN).zip(fields) {
        chunk.copy_from_slice(&encode_f32(value));
    }
    out
}

/// Decode a setpoint payload into one angle per joint.
pub fn decode_setpoints(payload: &[u8; SETPOINTS_LEN]) -> [f32; JOINT_COUNT] {
    let mut setpoints = [0.0; JOINT_COUNT];
    for (setpoint, chunk) in setpoints.iter_mut().zip(payload.chunks_exact(FLOAT_LEN)) {
        let mut bytes = [0u8; FLOAT_LEN];
        bytes.copy_from_slice(chunk);
        *setpoint = decode_f32(bytes);
    }
    setpoints
}
