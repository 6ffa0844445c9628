// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Foreground command loop.
//!
//! [`Dispatcher`] pulls bytes from a [`Transport`], feeds them through the [`Parser`], and applies
//! each completed command to the arm. The command runs inside one critical section through
//! [`Shared::lock`], and any reply is written after the lock is released, so the control interrupt
//! is never held off by serial output.

use crate::arm::{GripperCommand, Telemetry};
use crate::protocol::codec::encode_telemetry;
use crate::protocol::messages::{Command, TELEMETRY_LEN};
use crate::protocol::parser::Parser;
use crate::shared::Shared;
use crate::JOINT_COUNT;

/// Blocking byte stream to the host.
pub trait Transport {
    type Error;

    /// Block until a byte arrives.
    fn read_byte(&mut self) -> Result<u8, Self::Error>;

    /// Block until `byte` is queued for transmission.
    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error>;

    /// Block until every queued byte has left the wire.
    fn flush(&mut self) -> Result<(), Self::Error>;

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        for &byte in bytes {
            self.write_byte(byte)?;
        }
        Ok(())
    }
}

/// Operations the host protocol drives on the arm.
pub trait ArmControl {
    /// Enter `Enabled`: reset PIDs, zero voltages, arm the motors.
    fn enable_motors(&mut self);
    /// Enter `Disabled`: zero voltages, disarm the motors, open the gripper.
    fn disable_motors(&mut self);
    fn telemetry(&self) -> Telemetry;
    /// Store new setpoints, clamped to each joint's limits.
    fn set_setpoints(&mut self, setpoints: [f32; JOINT_COUNT]);
    fn set_gripper(&mut self, cmd: GripperCommand);
}

/// Apply `cmd` to the arm, returning the reply payload if it has one.
pub fn execute<A: ArmControl + ?Sized>(arm: &mut A, cmd: Command) -> Option<[u8; TELEMETRY_LEN]> {
    match cmd {
        Command::EnableMotors => arm.enable_motors(),
        Command::DisableMotors => arm.disable_motors(),
        Command::GetTelemetry => return Some(encode_telemetry(&arm.telemetry())),
        Command::SetSetpoints(setpoints) => arm.set_setpoints(setpoints),
        Command::GripperOpen => arm.set_gripper(GripperCommand::Open),
        Command::GripperClose => arm.set_gripper(GripperCommand::Closed),
    }
    None
}

pub struct Dispatcher<T> {
    transport: T,
    parser: Parser,
    read_errors: u32,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            parser: Parser::new(),
            read_errors: 0,
        }
    }

    /// Read one byte and execute the command it completes, if any.
    ///
    /// A read error drops any partially received command. A write error loses the reply but the
    /// command has already been applied. A command that arrives before the arm is installed in
    /// `arm` is discarded.
    pub fn poll<A: ArmControl>(&mut self, arm: &Shared<A>) -> Result<Option<Command>, T::Error> {
        let byte = match self.transport.read_byte() {
            Ok(byte) => byte,
            Err(e) => {
                if self.parser.is_mid_command() {
                    warn!("host read error, dropping partial command");
                } else {
                    warn!("host read error");
                }
                self.parser.reset();
                self.read_errors = self.read_errors.wrapping_add(1);
                return Err(e);
            }
        };

        let Some(cmd) = self.parser.push(byte) else {
            return Ok(None);
        };

        let Some(reply) = arm.lock(|a| execute(a, cmd)) else {
            warn!("command {=u8:#x} before arm init", cmd.opcode());
            return Ok(None);
        };

        if let Some(payload) = reply {
            let sent = self.transport.write_all(&payload);
            if let Err(e) = sent.and_then(|_| self.transport.flush()) {
                warn!("host write error, reply lost");
                return Err(e);
            }
        }
        Ok(Some(cmd))
    }

    /// Serve the host forever.
    pub fn run<A: ArmControl>(&mut self, arm: &Shared<A>) -> ! {
        loop {
            if self.poll(arm).is_err() {
                debug!("host link errors: {}", self.read_errors);
            }
        }
    }

    /// Number of failed reads since start-up (wrapping).
    #[inline]
    pub fn read_errors(&self) -> u32 {
        self.read_errors
    }

    pub fn free(self) -> T {
        self.transport
    }
}
