// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! USART host link.
//!
//! Carries the binary command protocol to the host over the ST-LINK virtual COM port. All calls
//! block; the dispatcher loop is the only user.
//!
//! To watch the raw stream on the host machine, connect to the debug USB port and use
//! ```text
//! $ screen /dev/tty.usbmodem* 57600
//! ```

use arm_core::protocol::Transport;
use nb::block;

use stm32f7xx_hal::{
    prelude::*,
    serial::{self, Instance, Pins, Rx, Serial, Tx},
};

/// Host link failure.
#[derive(Debug)]
pub enum LinkError {
    /// Receive framing, noise, overrun or parity error.
    Rx(serial::Error),
    /// The transmitter rejected a byte or a flush.
    Tx,
}

pub struct HostLink<U: Instance> {
    tx: Tx<U>,
    rx: Rx<U>,
}

impl<U: Instance> HostLink<U> {
    pub fn new<PINS: Pins<U>>(serial: Serial<U, PINS>) -> Self {
        let (tx, rx) = serial.split();
        Self { tx, rx }
    }
}

impl<U: Instance> Transport for HostLink<U> {
    type Error = LinkError;

    #[inline]
    fn read_byte(&mut self) -> Result<u8, LinkError> {
        block!(self.rx.read()).map_err(LinkError::Rx)
    }

    #[inline]
    fn write_byte(&mut self, byte: u8) -> Result<(), LinkError> {
        block!(self.tx.write(byte)).map_err(|_| LinkError::Tx)
    }

    /// Block until the hardware TX FIFO/drain is flushed.
    #[inline]
    fn flush(&mut self) -> Result<(), LinkError> {
        block!(self.tx.flush()).map_err(|_| LinkError::Tx)
    }
}
