// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! AS5055A absolute magnetic encoder over SPI.
//!
//! This module handles the 16-bit framing and register access for the AS5055A. Every frame carries
//! an even-parity bit in bit 0. A register read takes two chip-select frames: the read command,
//! then a NOP whose response carries the register contents.
//!
//! The bus is abstracted as a [`WordBus`], which owns the SPI peripheral and chip-select line for
//! one encoder. Exclusive `&mut` access to the bus is what serializes transactions.

/// One chip-select-framed, MSB-first, 16-bit SPI exchange.
pub trait WordBus {
    type Error;

    /// Select the device, shift `word` out while shifting the response in, deselect.
    fn transfer_word(&mut self, word: u16) -> Result<u16, Self::Error>;
}

impl<T: WordBus + ?Sized> WordBus for &mut T {
    type Error = T::Error;

    #[inline]
    fn transfer_word(&mut self, word: u16) -> Result<u16, Self::Error> {
        (**self).transfer_word(word)
    }
}

// Register addresses
pub mod reg {
    pub const NOP: u16 = 0x0000;
    pub const RESET: u16 = 0x33A5;
    pub const ANGLE: u16 = 0x3FFF;
}

const CMD_READ: u16 = 0x8000;
const CMD_WRITE: u16 = 0x0000;

/// Angle of one count of the 12-bit angle register [rad].
pub const RAD_PER_COUNT: f32 = 0.001_534_355_4;

/// Error type for encoder transactions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The underlying SPI transfer failed.
    Bus(E),
    /// Response frame failed the even-parity check.
    Parity { response: u16 },
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Error::Bus(e)
    }
}

/// Even-parity bit for a 16-bit frame (1 if the frame has an odd number of ones).
#[inline]
pub fn parity(word: u16) -> u16 {
    (word.count_ones() & 1) as u16
}

/// Build a read command frame for `reg`.
#[inline]
pub fn read_frame(reg: u16) -> u16 {
    let word = (reg << 1) | CMD_READ;
    word | parity(word)
}

/// Build a write command frame for `reg`.
#[inline]
pub fn write_frame(reg: u16) -> u16 {
    let word = (reg << 1) | CMD_WRITE;
    word | parity(word)
}

/// Build the data frame that follows a write command.
#[inline]
pub fn data_frame(value: u16) -> u16 {
    let word = value << 2;
    word | parity(word)
}

/// Extract the 12-bit angle count from bits [13:2] of an angle register response.
#[inline]
pub fn counts_from_response(response: u16) -> u16 {
    (response >> 2) & 0x0FFF
}

/// AS5055A driver with a home-angle offset.
pub struct As5055<B> {
    bus: B,
    home_angle: f32,
    check_parity: bool,
}

impl<B: WordBus> As5055<B> {
    /// Create a driver with a zero home offset and response parity checking enabled.
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            home_angle: 0.0,
            check_parity: true,
        }
    }

    /// Enable or disable response parity verification.
    ///
    /// With checking off, corrupted responses are returned as valid data.
    pub fn with_parity_check(mut self, enabled: bool) -> Self {
        self.check_parity = enabled;
        self
    }

    /// Release the bus.
    pub fn free(self) -> B {
        self.bus
    }

    /// Reset the chip.
    pub fn init(&mut self) -> Result<(), Error<B::Error>> {
        self.write_reg(reg::RESET, 0x0000)
    }

    /// Read a register.
    pub fn read_reg(&mut self, reg: u16) -> Result<u16, Error<B::Error>> {
        self.bus.transfer_word(read_frame(reg))?;
        let response = self.bus.transfer_word(reg::NOP)?;

        if self.check_parity && parity(response) != 0 {
            return Err(Error::Parity { response });
        }
        Ok(response)
    }

    /// Write a register.
    pub fn write_reg(&mut self, reg: u16, value: u16) -> Result<(), Error<B::Error>> {
        self.bus.transfer_word(write_frame(reg))?;
        self.bus.transfer_word(data_frame(value))?;
        Ok(())
    }

    /// Raw 12-bit angle count.
    #[inline]
    pub fn raw_counts(&mut self) -> Result<u16, Error<B::Error>> {
        Ok(counts_from_response(self.read_reg(reg::ANGLE)?))
    }

    /// Angle relative to home [rad].
    pub fn angle(&mut self) -> Result<f32, Error<B::Error>> {
        let counts = self.raw_counts()?;
        Ok(counts as f32 * RAD_PER_COUNT - self.home_angle)
    }

    /// Set the home offset [rad]. Later readings are reported relative to it.
    #[inline]
    pub fn set_home(&mut self, home_angle: f32) {
        self.home_angle = home_angle;
    }

    /// Re-home at the current position. The offset grows by the current reading, so the position
    /// that used to read as this angle now reads zero.
    pub fn rezero(&mut self) -> Result<(), Error<B::Error>> {
        self.home_angle += self.angle()?;
        Ok(())
    }

    /// Current home offset [rad].
    #[inline]
    pub fn home(&self) -> f32 {
        self.home_angle
    }
}
