// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Byte-at-a-time parser for the host command protocol.
//!
//! There is no framing: every command starts with its opcode, and only the setpoint command
//! carries a payload. Unknown opcodes are dropped, and the next byte is read as a new opcode.

use crate::protocol::codec::decode_setpoints;
use crate::protocol::messages::*;

enum State {
    WaitOpcode,
    Setpoints { len: usize },
}

pub struct Parser {
    state: State,
    payload: [u8; SETPOINTS_LEN],
}

impl Parser {
    pub fn new() -> Self {
        Self {
            state: State::WaitOpcode,
            payload: [0; SETPOINTS_LEN],
        }
    }

    /// Drop any partially received command.
    pub fn reset(&mut self) {
        self.state = State::WaitOpcode;
    }

    /// True while a payload is being collected.
    #[inline]
    pub fn is_mid_command(&self) -> bool {
        matches!(self.state, State::Setpoints { .. })
    }

    /// Process a single incoming byte. Returns `Some(Command)` once a command is complete.
    pub fn push(&mut self, byte: u8) -> Option<Command> {
        match self.state {
            State::WaitOpcode => match byte {
                OP_ENABLE => Some(Command::EnableMotors),
                OP_DISABLE => Some(Command::DisableMotors),
                OP_TELEMETRY => Some(Command::GetTelemetry),
                OP_SET_SETPOINTS => {
                    self.state = State::Setpoints { len: 0 };
                    None
                }
                OP_GRIPPER_OPEN => Some(Command::GripperOpen),
                OP_GRIPPER_CLOSE => Some(Command::GripperClose),
                _ => {
                    trace!("dropping unknown opcode {=u8:#x}", byte);
                    None
                }
            },
            State::Setpoints { len } => {
                self.payload[len] = byte;
                let len = len + 1;

                if len < SETPOINTS_LEN {
                    self.state = State::Setpoints { len };
                    return None;
                }

                self.state = State::WaitOpcode;
                Some(Command::SetSetpoints(decode_setpoints(&self.payload)))
            }
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}
