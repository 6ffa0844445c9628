// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Serial Peripheral Interface (SPI) abstraction layer.
//!
//! - `SpiBus` wraps a configured HAL SPI instance with 8-bit words.
//! - `ChipSelect` is an active-low GPIO output wrapper for manual CS control.
//! - `EncoderLink` pairs a bus with its chip select and frames 16-bit encoder words.
//! - `EncoderPort` unifies the three encoder links into one type so the joints can share an array.

use arm_core::drivers::WordBus;
use stm32f7xx_hal::{
    gpio::{self, Output, PinState, PushPull},
    pac,
    prelude::*,
    spi::{self, Enabled, Spi},
};

use crate::hw::pins::{Spi3Io, Spi4Io, Spi5Io};

/// Wrapper around an enabled HAL SPI instance (8-bit words).
pub struct SpiBus<I, P> {
    spi: Spi<I, P, Enabled<u8>>,
}

impl<I, P> SpiBus<I, P>
where
    I: spi::Instance,
    P: spi::Pins<I>,
{
    pub fn new(spi: Spi<I, P, Enabled<u8>>) -> Self {
        Self { spi }
    }

    /// Perform a blocking, full-duplex transfer of one byte.
    pub fn transfer_byte(&mut self, byte: u8) -> Result<u8, spi::Error> {
        let mut tmp = [byte];
        self.spi.transfer(&mut tmp)?;
        Ok(tmp[0])
    }

    /// Transfer a 16-bit word as two bytes, MSB first.
    pub fn transfer_u16(&mut self, word: u16) -> Result<u16, spi::Error> {
        let [hi, lo] = word.to_be_bytes();
        let hi = self.transfer_byte(hi)?;
        let lo = self.transfer_byte(lo)?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    pub fn free(self) -> Spi<I, P, Enabled<u8>> {
        self.spi
    }
}

/// Manual chip-select line, active-low, generic over any GPIO pin.
pub struct ChipSelect<const P: char, const N: u8> {
    pin: gpio::Pin<P, N, Output<PushPull>>,
}

impl<const P: char, const N: u8> ChipSelect<P, N> {
    /// Create an active-low chip select and set to the inactive state (i.e., high).
    pub fn active_low<MODE>(pin: gpio::Pin<P, N, MODE>) -> Self {
        let mut pin = pin.into_push_pull_output();
        pin.set_state(PinState::High);
        Self { pin }
    }

    /// Assert the chip select.
    #[inline]
    pub fn select(&mut self) {
        self.pin.set_low();
    }

    /// Deassert the chip select.
    #[inline]
    pub fn deselect(&mut self) {
        self.pin.set_high();
    }

    pub fn free(self) -> gpio::Pin<P, N, Output<PushPull>> {
        self.pin
    }
}

/// One encoder on a dedicated SPI bus.
pub struct EncoderLink<I, IO, const CS_P: char, const CS_N: u8> {
    bus: SpiBus<I, IO>,
    cs: ChipSelect<CS_P, CS_N>,
}

impl<I, IO, const CS_P: char, const CS_N: u8> EncoderLink<I, IO, CS_P, CS_N>
where
    I: spi::Instance,
    IO: spi::Pins<I>,
{
    pub fn new(bus: SpiBus<I, IO>, cs: ChipSelect<CS_P, CS_N>) -> Self {
        Self { bus, cs }
    }

    pub fn free(self) -> (SpiBus<I, IO>, ChipSelect<CS_P, CS_N>) {
        (self.bus, self.cs)
    }
}

impl<I, IO, const CS_P: char, const CS_N: u8> WordBus for EncoderLink<I, IO, CS_P, CS_N>
where
    I: spi::Instance,
    IO: spi::Pins<I>,
{
    type Error = spi::Error;

    fn transfer_word(&mut self, word: u16) -> Result<u16, spi::Error> {
        self.cs.select();
        let response = self.bus.transfer_u16(word);
        self.cs.deselect();
        response
    }
}

pub type Encoder0 = EncoderLink<pac::SPI3, Spi3Io, 'D', 2>;
pub type Encoder1 = EncoderLink<pac::SPI4, Spi4Io, 'E', 4>;
pub type Encoder2 = EncoderLink<pac::SPI5, Spi5Io, 'E', 3>;

/// Encoder link for any joint.
pub enum EncoderPort {
    Spi3(Encoder0),
    Spi4(Encoder1),
    Spi5(Encoder2),
}

impl WordBus for EncoderPort {
    type Error = spi::Error;

    #[inline]
    fn transfer_word(&mut self, word: u16) -> Result<u16, spi::Error> {
        match self {
            EncoderPort::Spi3(link) => link.transfer_word(word),
            EncoderPort::Spi4(link) => link.transfer_word(word),
            EncoderPort::Spi5(link) => link.transfer_word(word),
        }
    }
}
