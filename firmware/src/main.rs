// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Arm controller firmware for the NUCLEO-F746ZG.
//!
//! TIM6 fires at the control rate and runs one [`Arm::step`] per update. The foreground serves the
//! host protocol on USART3 forever. The two contexts meet only through [`ARM`].

#![no_main]
#![no_std]

use cortex_m::peripheral::NVIC;
use cortex_m_rt::entry;
use defmt::unwrap;
use defmt_rtt as _;
use panic_halt as _;

use hal::{
    pac::{self, interrupt},
    prelude::*,
    serial::{Config, Serial},
    spi::{Mode, Phase, Polarity, Spi},
    timer::{CounterHz, Event},
};
use stm32f7xx_hal as hal;

use arm_core::config::{ArmConfig, ENCODER_SPI_HZ, HOST_BAUD_RATE};
use arm_core::protocol::Dispatcher;
use arm_core::shared::CycleGate;
use arm_core::{Arm, Shared};

mod hw;
use hw::{
    pwm, BoardPins, ChipSelect, EncoderLink, EncoderPort, GripperPwm, HostLink, Led, MotorPwm,
    SpiBus,
};

type FirmwareArm = Arm<EncoderPort, MotorPwm, GripperPwm>;
type StatusLed = Led<hal::gpio::gpiob::PB0<hal::gpio::Output<hal::gpio::PushPull>>>;

static ARM: Shared<FirmwareArm> = Shared::new();
static CONTROL_TIMER: Shared<CounterHz<pac::TIM6>> = Shared::new();
static STATUS_LED: Shared<StatusLed> = Shared::new();
static CYCLE: CycleGate = CycleGate::new();

/// AS5055A: CPOL = 0, CPHA = 1.
const ENCODER_SPI_MODE: Mode = Mode {
    polarity: Polarity::IdleLow,
    phase: Phase::CaptureOnSecondTransition,
};

#[entry]
fn main() -> ! {
    let config = ArmConfig::DEFAULT;

    // Peripherals
    let dp = pac::Peripherals::take().unwrap();

    // Clocks
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.sysclk(216.MHz()).freeze();
    let mut apb1 = rcc.apb1;
    let mut apb2 = rcc.apb2;

    // GPIO
    let pins = BoardPins::new(dp.GPIOB, dp.GPIOC, dp.GPIOD, dp.GPIOE, dp.GPIOF);
    let enc = pins.encoders;

    // Encoders: one SPI bus each
    let spi3 = Spi::new(dp.SPI3, enc.spi3).enable::<u8>(
        ENCODER_SPI_MODE,
        ENCODER_SPI_HZ.Hz(),
        &clocks,
        &mut apb1,
    );
    let spi4 = Spi::new(dp.SPI4, enc.spi4).enable::<u8>(
        ENCODER_SPI_MODE,
        ENCODER_SPI_HZ.Hz(),
        &clocks,
        &mut apb2,
    );
    let spi5 = Spi::new(dp.SPI5, enc.spi5).enable::<u8>(
        ENCODER_SPI_MODE,
        ENCODER_SPI_HZ.Hz(),
        &clocks,
        &mut apb2,
    );
    let encoders = [
        EncoderPort::Spi3(EncoderLink::new(SpiBus::new(spi3), ChipSelect::active_low(enc.cs0))),
        EncoderPort::Spi4(EncoderLink::new(SpiBus::new(spi4), ChipSelect::active_low(enc.cs1))),
        EncoderPort::Spi5(EncoderLink::new(SpiBus::new(spi5), ChipSelect::active_low(enc.cs2))),
    ];

    // Motors and gripper
    let motors = pwm::motor_channels(dp.TIM1, pins.motors, &clocks);
    let gripper = pwm::gripper_channel(dp.TIM2, pins.gripper, &clocks);

    // USART3 (host link)
    let usart_cfg = Config {
        baud_rate: HOST_BAUD_RATE.bps(),
        ..Default::default()
    };
    let serial = Serial::new(dp.USART3, (pins.usart3.tx, pins.usart3.rx), &clocks, usart_cfg);
    let mut dispatcher = Dispatcher::new(HostLink::new(serial));

    // Arm
    ARM.init(unwrap!(Arm::new(encoders, motors, gripper, &config)));
    if let Some(Err(_)) = ARM.lock(|arm| arm.init()) {
        defmt::error!("encoder reset failed");
    }
    STATUS_LED.init(Led::active_high(pins.status_led));

    // Control timer
    let mut timer = dp.TIM6.counter_hz(&clocks);
    if timer.start((config.control_hz as u32).Hz()).is_err() {
        defmt::panic!("TIM6 cannot run at {} Hz", config.control_hz);
    }
    timer.listen(Event::Update);
    CONTROL_TIMER.init(timer);

    // SAFETY: the handler only touches state behind `Shared`, which is initialized above.
    unsafe { NVIC::unmask(pac::Interrupt::TIM6_DAC) };

    defmt::info!("arm controller up, serving host at {} baud", HOST_BAUD_RATE);
    dispatcher.run(&ARM)
}

#[interrupt]
fn TIM6_DAC() {
    CONTROL_TIMER.lock(|timer| timer.clear_interrupt(Event::Update));

    let mode = CYCLE.run(
        || {
            ARM.lock(|arm| {
                arm.step();
                arm.mode()
            })
        },
        drop_pending_tick,
    );

    if let Some(mode) = mode {
        STATUS_LED.lock(|led| led.show_mode(mode));
    }
}

/// Discard a TIM6 update that fired during the cycle so it is not run late.
fn drop_pending_tick() -> bool {
    if !NVIC::is_pending(pac::Interrupt::TIM6_DAC) {
        return false;
    }
    CONTROL_TIMER.lock(|timer| timer.clear_interrupt(Event::Update));
    NVIC::unpend(pac::Interrupt::TIM6_DAC);
    true
}
