// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Joint table, motor enable state machine, and the fixed-rate control cycle.
//!
//! [`Arm`] owns every per-joint resource: encoder, motor servo, PID controller, and the joint's
//! state record. The control interrupt calls [`Arm::step`] once per period; the host dispatcher
//! calls the mode, setpoint, gripper, and telemetry methods. Both reach the arm through a
//! [`Shared`](crate::Shared) cell, so each call is atomic with respect to the other context.
//!
//! Typical usage pattern:
//!
//! ```ignore
//! ARM.init(Arm::new(encoders, motors, gripper, &ArmConfig::DEFAULT)?);
//! ARM.lock(|arm| arm.init());
//!
//! // Timer interrupt, at `control_hz`:
//! ARM.lock(|arm| arm.step());
//! ```

use crate::config::{ArmConfig, ConfigError, JointConfig};
use crate::control::Pid;
use crate::drivers::encoder::{self, As5055, WordBus};
use crate::drivers::Servo;
use crate::protocol::ArmControl;
use crate::JOINT_COUNT;
use embedded_hal::PwmPin;

/// Host-visible state of one joint.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JointState {
    /// Commanded angle [rad], always within the joint's limits.
    pub setpoint: f32,
    /// Measured angle relative to home [rad].
    pub angle: f32,
    /// Finite-difference angular velocity [rad/s].
    pub velocity: f32,
    /// Last PID output sent to the motor [V].
    pub voltage: f32,
}

/// Snapshot of all joints, in joint order.
pub type Telemetry = [JointState; JOINT_COUNT];

/// Motor enable state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorMode {
    /// Actuators disarmed, voltages zero. Encoders are still sampled.
    Disabled,
    /// PID running, actuators armed.
    Enabled,
}

/// Gripper position command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GripperCommand {
    Open,
    Closed,
}

struct Joint<B, P> {
    encoder: As5055<B>,
    motor: Servo<P>,
    pid: Pid,
    state: JointState,
    previous_angle: f32,

    min_angle: f32,
    max_angle: f32,

    /// Consecutive failed encoder reads
    skipped: u32,
    /// Total failed encoder reads
    faults: u32,
}

impl<B, P> Joint<B, P>
where
    B: WordBus,
    P: PwmPin<Duty = u16>,
{
    fn new(bus: B, pwm: P, joint: &JointConfig, arm: &ArmConfig) -> Result<Self, ConfigError> {
        let mut encoder = As5055::new(bus).with_parity_check(arm.encoder_parity_check);
        encoder.set_home(joint.home_angle);

        let pid = Pid::from_gains(joint.gains, arm.control_period())
            .with_output_limits(-arm.pid_voltage_limit, arm.pid_voltage_limit)
            .with_anti_windup(arm.anti_windup);

        Ok(Self {
            encoder,
            motor: Servo::new(pwm, arm.motor_voltage_max)?,
            pid,
            state: JointState::default(),
            previous_angle: 0.0,
            min_angle: joint.min_angle,
            max_angle: joint.max_angle,
            skipped: 0,
            faults: 0,
        })
    }

    /// Sample the encoder and update angle and velocity.
    ///
    /// A failed read holds the last good angle and velocity. The next good read spreads the angle
    /// change over every period since the last good one.
    fn sense(&mut self, index: usize, control_hz: f32) {
        match self.encoder.angle() {
            Ok(angle) => {
                let velocity = (angle - self.previous_angle) * control_hz;
                self.state.velocity = if self.skipped == 0 {
                    velocity
                } else {
                    debug!("joint {}: encoder back after {} samples", index, self.skipped);
                    velocity / (self.skipped + 1) as f32
                };
                self.state.angle = angle;
                self.previous_angle = angle;
                self.skipped = 0;
            }
            Err(_) => {
                if self.skipped == 0 {
                    warn!("joint {}: encoder read failed, holding last angle", index);
                }
                self.skipped = self.skipped.saturating_add(1);
                self.faults = self.faults.wrapping_add(1);
            }
        }
    }

    /// Run the PID on the latest angle and drive the motor.
    fn actuate(&mut self) {
        let error = self.state.setpoint - self.state.angle;
        let voltage = self.pid.update(error, 0.0);
        self.state.voltage = voltage;
        self.motor.set_cmd(voltage);
    }

    fn arm(&mut self) {
        self.pid.reset();
        self.state.voltage = 0.0;
        self.motor.enable();
    }

    fn disarm(&mut self) {
        self.state.voltage = 0.0;
        self.motor.disable();
    }

    /// Store a setpoint clamped to the joint limits. NaN is dropped.
    fn set_setpoint(&mut self, setpoint: f32) {
        if setpoint.is_nan() {
            return;
        }
        self.state.setpoint = setpoint.clamp(self.min_angle, self.max_angle);
    }
}

/// The whole arm: three joints, a gripper, and the motor enable state.
pub struct Arm<B, P, G> {
    joints: [Joint<B, P>; JOINT_COUNT],
    gripper: Servo<G>,
    gripper_cmd: GripperCommand,
    mode: MotorMode,

    control_hz: f32,
    gripper_open: f32,
    gripper_close: f32,

    /// Completed control cycles
    cycles: u32,
}

impl<B, P, G> Arm<B, P, G>
where
    B: WordBus,
    P: PwmPin<Duty = u16>,
    G: PwmPin<Duty = u16>,
{
    /// Build the arm from one encoder bus and one motor PWM channel per joint, in joint order.
    ///
    /// Nothing touches the hardware until [`init`](Self::init).
    pub fn new(
        buses: [B; JOINT_COUNT],
        motors: [P; JOINT_COUNT],
        gripper: G,
        config: &ArmConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let [b0, b1, b2] = buses;
        let [m0, m1, m2] = motors;

        Ok(Self {
            joints: [
                Joint::new(b0, m0, &config.joints[0], config)?,
                Joint::new(b1, m1, &config.joints[1], config)?,
                Joint::new(b2, m2, &config.joints[2], config)?,
            ],
            gripper: Servo::new(gripper, 1.0)?,
            gripper_cmd: GripperCommand::Open,
            mode: MotorMode::Disabled,
            control_hz: config.control_hz,
            gripper_open: config.gripper_open,
            gripper_close: config.gripper_close,
            cycles: 0,
        })
    }

    /// Bring the hardware to its start-up state: motors disarmed, encoders reset, gripper armed
    /// and open.
    ///
    /// Every encoder is reset even if an earlier one fails; the first failure is returned.
    pub fn init(&mut self) -> Result<(), encoder::Error<B::Error>> {
        let mut result = Ok(());

        for (i, joint) in self.joints.iter_mut().enumerate() {
            joint.motor.init();
            if let Err(e) = joint.encoder.init() {
                warn!("joint {}: encoder reset failed", i);
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }

        self.gripper.init();
        self.gripper.enable();
        self.set_gripper(GripperCommand::Open);

        info!("arm initialized at {} Hz", self.control_hz);
        result
    }

    /// One control cycle: sample every joint, then run PID and drive the motors if enabled.
    pub fn step(&mut self) {
        let enabled = self.mode == MotorMode::Enabled;
        let control_hz = self.control_hz;

        for (i, joint) in self.joints.iter_mut().enumerate() {
            joint.sense(i, control_hz);
            if enabled {
                joint.actuate();
            }
        }

        self.cycles = self.cycles.wrapping_add(1);
    }

    /// Switch motor mode and run the mode's entry actions.
    ///
    /// Entering `Enabled` resets every PID, zeroes voltages, and arms the motors. Entering
    /// `Disabled` zeroes voltages, disarms the motors, and opens the gripper. The entry actions run
    /// even if the arm is already in the requested mode.
    pub fn set_mode(&mut self, mode: MotorMode) {
        match mode {
            MotorMode::Enabled => self.joints.iter_mut().for_each(Joint::arm),
            MotorMode::Disabled => {
                self.joints.iter_mut().for_each(Joint::disarm);
                self.set_gripper(GripperCommand::Open);
            }
        }

        if self.mode != mode {
            info!("motors {}", mode);
        }
        self.mode = mode;
    }

    #[inline]
    pub fn enable_motors(&mut self) {
        self.set_mode(MotorMode::Enabled);
    }

    #[inline]
    pub fn disable_motors(&mut self) {
        self.set_mode(MotorMode::Disabled);
    }

    #[inline]
    pub fn mode(&self) -> MotorMode {
        self.mode
    }

    /// Set all setpoints, each clamped to its joint's limits.
    pub fn set_setpoints(&mut self, setpoints: [f32; JOINT_COUNT]) {
        for (joint, setpoint) in self.joints.iter_mut().zip(setpoints) {
            joint.set_setpoint(setpoint);
        }
    }

    pub fn set_gripper(&mut self, cmd: GripperCommand) {
        let value = match cmd {
            GripperCommand::Open => self.gripper_open,
            GripperCommand::Closed => self.gripper_close,
        };
        self.gripper.set_cmd(value);
        self.gripper_cmd = cmd;
    }

    #[inline]
    pub fn gripper(&self) -> GripperCommand {
        self.gripper_cmd
    }

    /// Pulse width currently driven to the gripper [s].
    #[inline]
    pub fn gripper_pulse(&self) -> f32 {
        self.gripper.pulse_width()
    }

    /// Snapshot of every joint's state.
    pub fn telemetry(&self) -> Telemetry {
        [
            self.joints[0].state,
            self.joints[1].state,
            self.joints[2].state,
        ]
    }

    /// State of one joint.
    pub fn joint(&self, joint: usize) -> Option<JointState> {
        self.joints.get(joint).map(|j| j.state)
    }

    /// Whether a joint's motor output is armed.
    pub fn motor_armed(&self, joint: usize) -> bool {
        self.joints.get(joint).is_some_and(|j| j.motor.is_enabled())
    }

    /// Pulse width currently driven to a joint's motor [s].
    pub fn motor_pulse(&self, joint: usize) -> Option<f32> {
        self.joints.get(joint).map(|j| j.motor.pulse_width())
    }

    /// Total failed encoder reads for a joint.
    pub fn encoder_faults(&self, joint: usize) -> u32 {
        self.joints.get(joint).map_or(0, |j| j.faults)
    }

    /// True while the joint's angle is held from an earlier sample.
    pub fn is_stale(&self, joint: usize) -> bool {
        self.joints.get(joint).is_some_and(|j| j.skipped > 0)
    }

    /// Home offset of a joint's encoder [rad].
    pub fn home(&self, joint: usize) -> Option<f32> {
        self.joints.get(joint).map(|j| j.encoder.home())
    }

    /// Re-home a joint's encoder at its current position.
    pub fn rezero(&mut self, joint: usize) -> Result<(), encoder::Error<B::Error>> {
        match self.joints.get_mut(joint) {
            Some(j) => j.encoder.rezero(),
            None => Ok(()),
        }
    }

    /// Completed control cycles since start-up (wrapping).
    #[inline]
    pub fn cycles(&self) -> u32 {
        self.cycles
    }
}

impl<B, P, G> ArmControl for Arm<B, P, G>
where
    B: WordBus,
    P: PwmPin<Duty = u16>,
    G: PwmPin<Duty = u16>,
{
    fn enable_motors(&mut self) {
        Arm::enable_motors(self);
    }

    fn disable_motors(&mut self) {
        Arm::disable_motors(self);
    }

    fn telemetry(&self) -> Telemetry {
        Arm::telemetry(self)
    }

    fn set_setpoints(&mut self, setpoints: [f32; JOINT_COUNT]) {
        Arm::set_setpoints(self, setpoints);
    }

    fn set_gripper(&mut self, cmd: GripperCommand) {
        Arm::set_gripper(self, cmd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::encoder::{parity, RAD_PER_COUNT};
    use std::cell::Cell;
    use std::rc::Rc;

    /// Encoder bus that reports whatever count the test puts in `counts`.
    struct FakeBus {
        counts: Rc<Cell<u16>>,
        fail: Rc<Cell<bool>>,
    }

    impl WordBus for FakeBus {
        type Error = ();

        fn transfer_word(&mut self, _word: u16) -> Result<u16, ()> {
            if self.fail.get() {
                return Err(());
            }
            let word = (self.counts.get() & 0x0FFF) << 2;
            Ok(word | parity(word))
        }
    }

    struct FakePwm {
        duty: Rc<Cell<u16>>,
    }

    impl PwmPin for FakePwm {
        type Duty = u16;

        fn disable(&mut self) {}
        fn enable(&mut self) {}
        fn get_duty(&self) -> u16 {
            self.duty.get()
        }
        fn get_max_duty(&self) -> u16 {
            10_000
        }
        fn set_duty(&mut self, duty: u16) {
            self.duty.set(duty);
        }
    }

    struct Rig {
        counts: [Rc<Cell<u16>>; 3],
        fail: [Rc<Cell<bool>>; 3],
        arm: Arm<FakeBus, FakePwm, FakePwm>,
    }

    fn rig(config: &ArmConfig) -> Rig {
        let counts: [Rc<Cell<u16>>; 3] = Default::default();
        let fail: [Rc<Cell<bool>>; 3] = Default::default();
        let buses = [0, 1, 2].map(|i| FakeBus {
            counts: counts[i].clone(),
            fail: fail[i].clone(),
        });
        let motors = [0, 1, 2].map(|_| FakePwm {
            duty: Rc::new(Cell::new(0)),
        });
        let gripper = FakePwm {
            duty: Rc::new(Cell::new(0)),
        };
        let mut arm = Arm::new(buses, motors, gripper, config).unwrap();
        arm.init().unwrap();
        Rig { counts, fail, arm }
    }

    /// Config with zero home offsets so angles are raw counts.
    fn unhomed() -> ArmConfig {
        let mut cfg = ArmConfig::DEFAULT;
        for joint in cfg.joints.iter_mut() {
            joint.home_angle = 0.0;
        }
        cfg
    }

    #[test]
    fn starts_disabled_with_gripper_open() {
        let r = rig(&ArmConfig::DEFAULT);
        assert_eq!(r.arm.mode(), MotorMode::Disabled);
        assert_eq!(r.arm.gripper(), GripperCommand::Open);
        assert!((r.arm.gripper_pulse() - 0.0020).abs() < 1e-7);
        assert_eq!(r.arm.telemetry(), [JointState::default(); 3]);
        assert!((0..3).all(|j| !r.arm.motor_armed(j)));
    }

    #[test]
    fn velocity_is_angle_difference_times_rate() {
        for control_hz in [1.0, 37.0, 100.0, 1000.0] {
            let mut cfg = unhomed();
            cfg.control_hz = control_hz;
            let mut r = rig(&cfg);

            r.counts[0].set(100);
            r.arm.step();
            let a0 = r.arm.joint(0).unwrap().angle;

            r.counts[0].set(130);
            r.arm.step();
            let a1 = r.arm.joint(0).unwrap().angle;

            let velocity = r.arm.joint(0).unwrap().velocity;
            assert_eq!(velocity, (a1 - a0) * control_hz, "f = {control_hz} Hz");
        }
    }

    #[test]
    fn disabled_cycle_refreshes_angles_without_driving() {
        let mut r = rig(&unhomed());
        r.arm.set_setpoints([0.5, 0.5, 0.5]);
        r.counts[1].set(400);
        r.arm.step();

        let j1 = r.arm.joint(1).unwrap();
        assert!((j1.angle - 400.0 * RAD_PER_COUNT).abs() < 1e-6);
        assert_eq!(j1.voltage, 0.0);
        assert_eq!(r.arm.motor_pulse(1), Some(0.0));
    }

    #[test]
    fn enabled_cycle_drives_pid_output() {
        let mut r = rig(&unhomed());
        r.arm.enable_motors();
        assert!((0..3).all(|j| r.arm.motor_armed(j)));

        r.arm.set_setpoints([0.1, 0.0, 0.0]);
        r.arm.step();

        // Joint 0: kp = 10, ki = 3, error = 0.1 on the first cycle.
        let expected = 10.0 * 0.1 + 3.0 * 0.1 * 0.01;
        let j0 = r.arm.joint(0).unwrap();
        assert!((j0.voltage - expected).abs() < 1e-6);
        assert!(r.arm.motor_pulse(0).unwrap() > 0.0015);
    }

    #[test]
    fn enable_resets_pid_history() {
        let mut r = rig(&unhomed());
        r.arm.enable_motors();
        r.arm.set_setpoints([0.5, 0.0, 0.0]);
        for _ in 0..20 {
            r.arm.step();
        }
        r.arm.disable_motors();
        r.arm.enable_motors();
        r.arm.set_setpoints([0.1, 0.0, 0.0]);
        r.arm.step();

        let expected = 10.0 * 0.1 + 3.0 * 0.1 * 0.01;
        assert!((r.arm.joint(0).unwrap().voltage - expected).abs() < 1e-6);
    }

    #[test]
    fn setpoints_are_clamped_and_nan_is_dropped() {
        let mut r = rig(&ArmConfig::DEFAULT);
        r.arm.set_setpoints([5.0, -5.0, 0.5]);
        let t = r.arm.telemetry();
        assert_eq!(t[0].setpoint, 1.00);
        assert_eq!(t[1].setpoint, -0.10);
        assert_eq!(t[2].setpoint, 0.5);

        r.arm.set_setpoints([f32::NAN, f32::INFINITY, f32::NEG_INFINITY]);
        let t = r.arm.telemetry();
        assert_eq!(t[0].setpoint, 1.00);
        assert_eq!(t[1].setpoint, 1.10);
        assert_eq!(t[2].setpoint, -0.35);
    }

    #[test]
    fn failed_reads_hold_last_angle() {
        let mut r = rig(&unhomed());
        r.counts[2].set(1000);
        r.arm.step();
        r.counts[2].set(1010);
        r.arm.step();
        let before = r.arm.joint(2).unwrap();

        r.fail[2].set(true);
        r.arm.step();
        r.arm.step();
        assert_eq!(r.arm.joint(2).unwrap(), before);
        assert!(r.arm.is_stale(2));
        assert_eq!(r.arm.encoder_faults(2), 2);

        // Three periods have passed since the last good sample.
        r.fail[2].set(false);
        r.counts[2].set(1040);
        r.arm.step();
        let after = r.arm.joint(2).unwrap();
        let expected = (after.angle - before.angle) * 100.0 / 3.0;
        assert!((after.velocity - expected).abs() < 1e-4);
        assert!(!r.arm.is_stale(2));
    }

    #[test]
    fn disable_zeroes_voltages_disarms_and_opens_gripper() {
        let mut r = rig(&unhomed());
        r.arm.enable_motors();
        r.arm.set_gripper(GripperCommand::Closed);
        r.arm.set_setpoints([0.5, 0.5, 0.5]);
        r.arm.step();
        assert!(r.arm.telemetry().iter().all(|j| j.voltage != 0.0));

        r.arm.disable_motors();
        assert!(r.arm.telemetry().iter().all(|j| j.voltage == 0.0));
        assert!((0..3).all(|j| !r.arm.motor_armed(j)));
        assert_eq!(r.arm.gripper(), GripperCommand::Open);

        // Later cycles do not touch the motors.
        r.arm.step();
        assert!(r.arm.telemetry().iter().all(|j| j.voltage == 0.0));
        assert_eq!(r.arm.motor_pulse(0), Some(0.0));
    }

    #[test]
    fn rezero_moves_home_to_current_position() {
        let mut r = rig(&unhomed());
        r.counts[0].set(2048);
        r.arm.rezero(0).unwrap();
        assert!((r.arm.home(0).unwrap() - 2048.0 * RAD_PER_COUNT).abs() < 1e-6);
        r.arm.step();
        assert!(r.arm.joint(0).unwrap().angle.abs() < 1e-6);
        assert_eq!(r.arm.cycles(), 1);
    }
}
