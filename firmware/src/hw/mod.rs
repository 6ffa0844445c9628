// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

pub mod led;
pub mod pins;
pub mod pwm;
pub mod spi;
pub mod usart;

pub use led::Led;
pub use pins::BoardPins;
pub use pwm::{GripperPwm, MotorPwm};
pub use spi::{ChipSelect, EncoderLink, EncoderPort, SpiBus};
pub use usart::HostLink;
