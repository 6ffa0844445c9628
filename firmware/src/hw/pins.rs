// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Pin definitions for the NUCLEO-F746ZG arm controller.
//!
//! | Function | Pins | Peripheral |
//! | -------- | ---- | ---------- |
//! | Joint 0 encoder | PC10 SCK, PC11 MISO, PC12 MOSI, PD2 CS | SPI3 |
//! | Joint 1 encoder | PE2 SCK, PE5 MISO, PE6 MOSI, PE4 CS | SPI4 |
//! | Joint 2 encoder | PF7 SCK, PF8 MISO, PF9 MOSI, PE3 CS | SPI5 |
//! | Joint motors | PE9, PE11, PE13 | TIM1 CH1-CH3 |
//! | Gripper | PB10 | TIM2 CH3 |
//! | Host link | PD8 TX, PD9 RX | USART3 (ST-LINK VCP) |
//! | Status LED | PB0 | LD1 |

use stm32f7xx_hal::{
    gpio::{gpiob, gpioc, gpiod, gpioe, gpiof, Alternate, Output, PushPull},
    pac,
    prelude::*,
};

/// SPI3 SCK, MISO, MOSI.
pub type Spi3Io = (
    gpioc::PC10<Alternate<6>>,
    gpioc::PC11<Alternate<6>>,
    gpioc::PC12<Alternate<6>>,
);
/// SPI4 SCK, MISO, MOSI.
pub type Spi4Io = (
    gpioe::PE2<Alternate<5>>,
    gpioe::PE5<Alternate<5>>,
    gpioe::PE6<Alternate<5>>,
);
/// SPI5 SCK, MISO, MOSI.
pub type Spi5Io = (
    gpiof::PF7<Alternate<5>>,
    gpiof::PF8<Alternate<5>>,
    gpiof::PF9<Alternate<5>>,
);

/// TIM1 CH1, CH2, CH3.
pub type MotorIo = (
    gpioe::PE9<Alternate<1>>,
    gpioe::PE11<Alternate<1>>,
    gpioe::PE13<Alternate<1>>,
);

pub struct BoardPins {
    pub status_led: gpiob::PB0<Output<PushPull>>,
    pub usart3: Usart3Pins,
    pub encoders: EncoderPins,
    pub motors: MotorIo,
    pub gripper: gpiob::PB10<Alternate<1>>,
}

pub struct Usart3Pins {
    pub tx: gpiod::PD8<Alternate<7>>,
    pub rx: gpiod::PD9<Alternate<7>>,
}

pub struct EncoderPins {
    pub spi3: Spi3Io,
    pub cs0: gpiod::PD2<Output<PushPull>>,
    pub spi4: Spi4Io,
    pub cs1: gpioe::PE4<Output<PushPull>>,
    pub spi5: Spi5Io,
    pub cs2: gpioe::PE3<Output<PushPull>>,
}

impl BoardPins {
    pub fn new(
        gpiob: pac::GPIOB,
        gpioc: pac::GPIOC,
        gpiod: pac::GPIOD,
        gpioe: pac::GPIOE,
        gpiof: pac::GPIOF,
    ) -> Self {
        let gpiob = gpiob.split();
        let gpioc = gpioc.split();
        let gpiod = gpiod.split();
        let gpioe = gpioe.split();
        let gpiof = gpiof.split();

        Self {
            status_led: gpiob.pb0.into_push_pull_output(),

            usart3: Usart3Pins {
                tx: gpiod.pd8.into_alternate::<7>(),
                rx: gpiod.pd9.into_alternate::<7>(),
            },

            encoders: EncoderPins {
                spi3: (
                    gpioc.pc10.into_alternate::<6>(),
                    gpioc.pc11.into_alternate::<6>(),
                    gpioc.pc12.into_alternate::<6>(),
                ),
                cs0: gpiod.pd2.into_push_pull_output(),
                spi4: (
                    gpioe.pe2.into_alternate::<5>(),
                    gpioe.pe5.into_alternate::<5>(),
                    gpioe.pe6.into_alternate::<5>(),
                ),
                cs1: gpioe.pe4.into_push_pull_output(),
                spi5: (
                    gpiof.pf7.into_alternate::<5>(),
                    gpiof.pf8.into_alternate::<5>(),
                    gpiof.pf9.into_alternate::<5>(),
                ),
                cs2: gpioe.pe3.into_push_pull_output(),
            },

            motors: (
                gpioe.pe9.into_alternate::<1>(),
                gpioe.pe11.into_alternate::<1>(),
                gpioe.pe13.into_alternate::<1>(),
            ),

            gripper: gpiob.pb10.into_alternate::<1>(),
        }
    }
}
