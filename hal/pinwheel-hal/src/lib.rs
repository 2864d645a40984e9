//! Pinwheel Hardware Abstraction Layer
//!
//! This crate defines the board-agnostic half of the Pinwheel GPIO driver:
//! pin and level types, the error taxonomy, the interrupt dispatch table and
//! the diagnostic blink pattern. Chip-specific crates supply the register
//! access and implement [`gpio::PinDriver`] on top of these types.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (pinwheel-firmware, etc.)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pinwheel-hal (this crate - types)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!            ┌─────────────────┐
//!            │  pinwheel-hal-  │
//!            │    stm32f410    │
//!            └─────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`gpio`] - Pin index, mode, pull, level and the [`gpio::PinDriver`] contract
//! - [`error`] - [`GpioError`] and the legacy [`error::ErrorState`] cell
//! - [`interrupt`] - Trigger edge, priority and the [`interrupt::DispatchTable`]
//! - [`fatal`] - Blink pattern used by the halting error path

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod error;
pub mod fatal;
pub mod gpio;
pub mod interrupt;

// Re-export key types at crate root for convenience
pub use error::{ErrorState, GpioError};
pub use gpio::{Level, Pin, PinDriver, PinMode, Pull};
pub use interrupt::{DispatchTable, Edge, InterruptHandler, Priority};
