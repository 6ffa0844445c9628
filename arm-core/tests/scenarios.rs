// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! End-to-end runs of the host protocol against a simulated arm.

use arm_core::drivers::encoder::{parity, RAD_PER_COUNT};
use arm_core::drivers::servo::PULSE_MAX;
use arm_core::drivers::WordBus;
use arm_core::protocol::messages::*;
use arm_core::protocol::{Dispatcher, Transport};
use arm_core::{Arm, ArmConfig, MotorMode, Shared};
use embedded_hal::PwmPin;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Encoder whose magnet sits at whatever count the test sets.
struct SimEncoder {
    counts: Rc<Cell<u16>>,
}

impl WordBus for SimEncoder {
    type Error = ();

    fn transfer_word(&mut self, _word: u16) -> Result<u16, ()> {
        let word = (self.counts.get() & 0x0FFF) << 2;
        Ok(word | parity(word))
    }
}

struct SimPwm {
    duty: Rc<Cell<u16>>,
}

impl PwmPin for SimPwm {
    type Duty = u16;

    fn disable(&mut self) {}
    fn enable(&mut self) {}
    fn get_duty(&self) -> u16 {
        self.duty.get()
    }
    fn get_max_duty(&self) -> u16 {
        20_000
    }
    fn set_duty(&mut self, duty: u16) {
        self.duty.set(duty);
    }
}

/// Host side of the serial link.
#[derive(Clone, Default)]
struct HostLink {
    to_arm: Rc<RefCell<VecDeque<u8>>>,
    from_arm: Rc<RefCell<Vec<u8>>>,
}

impl Transport for HostLink {
    type Error = ();

    fn read_byte(&mut self) -> Result<u8, ()> {
        self.to_arm.borrow_mut().pop_front().ok_or(())
    }
    fn write_byte(&mut self, byte: u8) -> Result<(), ()> {
        self.from_arm.borrow_mut().push(byte);
        Ok(())
    }
    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }
}

type SimArm = Arm<SimEncoder, SimPwm, SimPwm>;

struct Bench {
    arm: Shared<SimArm>,
    dispatcher: Dispatcher<HostLink>,
    host: HostLink,
    counts: [Rc<Cell<u16>>; 3],
    motor_duty: [Rc<Cell<u16>>; 3],
}

impl Bench {
    /// Arm with every joint sitting at its home position.
    fn new() -> Self {
        let config = ArmConfig::DEFAULT;
        let counts = config
            .joints
            .map(|j| Rc::new(Cell::new((j.home_angle / RAD_PER_COUNT).round() as u16)));
        let motor_duty: [Rc<Cell<u16>>; 3] = Default::default();

        let encoders = [0, 1, 2].map(|i| SimEncoder {
            counts: counts[i].clone(),
        });
        let motors = [0, 1, 2].map(|i| SimPwm {
            duty: motor_duty[i].clone(),
        });
        let gripper = SimPwm {
            duty: Rc::new(Cell::new(0)),
        };

        let arm = Shared::new();
        arm.init(Arm::new(encoders, motors, gripper, &config).unwrap());
        arm.lock(|a| a.init()).unwrap().unwrap();

        let host = HostLink::default();
        Self {
            arm,
            dispatcher: Dispatcher::new(host.clone()),
            host,
            counts,
            motor_duty,
        }
    }

    /// Send bytes and let the dispatcher consume all of them.
    fn send(&mut self, bytes: &[u8]) {
        self.host.to_arm.borrow_mut().extend(bytes);
        while self.dispatcher.poll(&self.arm).is_ok() {}
    }

    fn set_setpoints(&mut self, setpoints: [f32; 3]) {
        let mut bytes = vec![OP_SET_SETPOINTS];
        for s in setpoints {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        self.send(&bytes);
    }

    fn run_cycles(&self, n: usize) {
        for _ in 0..n {
            self.arm.lock(|a| a.step());
        }
    }

    /// Request telemetry and decode it as `[setpoint, angle, velocity, voltage]` per joint.
    fn telemetry(&mut self) -> [[f32; 4]; 3] {
        self.host.from_arm.borrow_mut().clear();
        self.send(&[OP_TELEMETRY]);

        let reply = self.host.from_arm.borrow();
        assert_eq!(reply.len(), TELEMETRY_LEN);

        let mut out = [[0.0; 4]; 3];
        for (i, chunk) in reply.chunks_exact(4).enumerate() {
            out[i / 4][i % 4] = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        out
    }
}

#[test]
fn holds_equilibrium_at_home() {
    let mut bench = Bench::new();
    bench.send(&[OP_ENABLE]);
    bench.set_setpoints([0.0; 3]);
    bench.run_cycles(10);

    for [setpoint, angle, velocity, voltage] in bench.telemetry() {
        assert_eq!(setpoint, 0.0);
        assert!(angle.abs() < 1e-3, "angle {angle}");
        assert_eq!(velocity, 0.0);
        assert!(voltage.abs() < 0.05, "voltage {voltage}");
    }
}

#[test]
fn over_limit_setpoint_is_clamped() {
    let mut bench = Bench::new();
    bench.set_setpoints([1.0 + 0.2, -0.10 - 0.2, 0.5]);

    let t = bench.telemetry();
    assert_eq!(t[0][0], 1.0);
    assert_eq!(t[1][0], -0.10);
    assert_eq!(t[2][0], 0.5);
}

#[test]
fn tracking_error_drives_motor_towards_setpoint() {
    let mut bench = Bench::new();
    bench.send(&[OP_ENABLE]);
    bench.set_setpoints([0.5, 0.0, 0.0]);
    bench.run_cycles(1);

    let t = bench.telemetry();
    assert!(t[0][3] > 0.0);
    // 15 V/rad * 0.0 error on joint 1 plus a tiny home residual.
    assert!(t[1][3].abs() < 0.05);

    // Neutral is 1.5 ms of a 5 ms frame.
    let neutral = (0.0015 / 0.0050 * 20_000.0) as u16;
    assert!(bench.motor_duty[0].get() > neutral);

    // Move the joint past the setpoint: the command reverses.
    let past = (bench.counts[0].get() as f32 + 0.8 / RAD_PER_COUNT) as u16;
    bench.counts[0].set(past);
    bench.run_cycles(1);
    let t = bench.telemetry();
    assert!(t[0][3] < 0.0);
    assert!(bench.motor_duty[0].get() < neutral);
}

#[test]
fn disable_while_moving_stops_motors() {
    let mut bench = Bench::new();
    bench.send(&[OP_ENABLE, OP_GRIPPER_CLOSE]);
    bench.set_setpoints([1.0, 1.0, 0.9]);
    bench.run_cycles(5);

    // Simulate motion so velocities are non-zero.
    for c in &bench.counts {
        c.set(c.get() + 20);
    }
    bench.run_cycles(1);
    let moving = bench.telemetry();
    assert!(moving.iter().all(|j| j[3] != 0.0 && j[2] != 0.0));

    bench.send(&[OP_DISABLE]);
    for c in &bench.counts {
        c.set(c.get() + 20);
    }
    bench.run_cycles(3);

    let stopped = bench.telemetry();
    assert!(stopped.iter().all(|j| j[3] == 0.0));
    assert!(bench.motor_duty.iter().all(|d| d.get() == 0));

    let (mode, armed, gripper_pulse) = bench
        .arm
        .lock(|a| (a.mode(), (0..3).any(|j| a.motor_armed(j)), a.gripper_pulse()))
        .unwrap();
    assert_eq!(mode, MotorMode::Disabled);
    assert!(!armed);
    assert!((gripper_pulse - PULSE_MAX).abs() < 1e-7);

    // Angles keep updating while disabled.
    assert!(stopped[0][1] > moving[0][1]);
}

#[test]
fn re_enable_restarts_from_rest() {
    let mut bench = Bench::new();
    bench.send(&[OP_ENABLE]);
    bench.set_setpoints([0.1, 0.0, 0.0]);
    bench.run_cycles(50);
    let wound = bench.telemetry()[0][3];

    bench.send(&[OP_DISABLE, OP_ENABLE]);
    let t = bench.telemetry();
    assert!(t.iter().all(|j| j[3] == 0.0));

    bench.run_cycles(1);
    let fresh = bench.telemetry()[0][3];
    assert!(fresh < wound);
}
