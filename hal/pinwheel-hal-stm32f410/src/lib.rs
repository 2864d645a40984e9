//! STM32F410-specific HAL for Pinwheel
//!
//! This crate implements the `pinwheel-hal` contracts on the STM32F410
//! register map:
//!
//! - [`regs`] - typed register blocks and the [`regs::Mmio`] bus seam
//! - [`gpio`] - port identifiers and pin-string parsing for board config
//! - [`driver`] - [`Gpio`], the pin driver
//! - [`exti`] - EXTI routing, NVIC setup and per-vector dispatch
//! - [`pin`] - embedded-hal `digital` handles
//! - [`fatal`] - the opt-in halting error path
//!
//! # Features
//!
//! - `defmt` - Enable debug formatting and driver debug logs
//!
//! # Usage
//!
//! ```ignore
//! let bus = unsafe { Volatile::new() };
//! let mut gpio = Gpio::new(bus, delay);
//! gpio.configure_pin_mode(Port::A, 5, PinMode::Output)?;
//! gpio.write_pin(Port::A, 5, Level::High)?;
//! ```

#![cfg_attr(not(test), no_std)]

pub mod driver;
pub mod exti;
pub mod fatal;
pub mod gpio;
pub mod pin;
pub mod regs;

#[cfg(test)]
mod testing;

pub use driver::{Gpio, CLOCK_SETTLE_US, ERROR_STATE};
pub use exti::Vector;
pub use fatal::{Fatal, OrHalt};
pub use gpio::{parse_pin_string, PinSpec, Port};
pub use regs::{Mmio, Volatile};

// Re-export shared types from pinwheel-hal
pub use pinwheel_hal::{Edge, ErrorState, GpioError, Level, Pin, PinMode, Pull};
