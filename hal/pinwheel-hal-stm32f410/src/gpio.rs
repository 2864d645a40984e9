//! GPIO ports of the STM32F410
//!
//! The F410 in the LQFP64 package bonds out ports A, B, C and H.

use pinwheel_hal::{GpioError, Pin};
use tock_registers::fields::Field;

use crate::regs::map::{
    GpioRegisters, AHB1ENR, GPIOA_BASE, GPIOB_BASE, GPIOC_BASE, GPIOH_BASE,
};
use crate::regs::Mmio;

/// GPIO port identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A,
    B,
    C,
    H,
}

impl Port {
    pub const ALL: [Port; 4] = [Port::A, Port::B, Port::C, Port::H];

    /// Register block base address
    pub const fn base(self) -> usize {
        match self {
            Port::A => GPIOA_BASE,
            Port::B => GPIOB_BASE,
            Port::C => GPIOC_BASE,
            Port::H => GPIOH_BASE,
        }
    }

    /// The port's registers on `bus`
    pub const fn registers<B: Mmio + ?Sized>(self, bus: &B) -> GpioRegisters<'_, B> {
        GpioRegisters::new(bus, self.base())
    }

    /// Clock enable bit in RCC_AHB1ENR
    pub const fn clock_enable(self) -> Field<u32, AHB1ENR::Register> {
        match self {
            Port::A => AHB1ENR::GPIOAEN,
            Port::B => AHB1ENR::GPIOBEN,
            Port::C => AHB1ENR::GPIOCEN,
            Port::H => AHB1ENR::GPIOHEN,
        }
    }

    /// Port selection value for SYSCFG_EXTICRx
    pub const fn exti_source(self) -> u32 {
        match self {
            Port::A => 0,
            Port::B => 1,
            Port::C => 2,
            Port::H => 7,
        }
    }

    /// Port from its letter (case-insensitive)
    pub fn from_char(c: char) -> Result<Self, GpioError> {
        match c.to_ascii_uppercase() {
            'A' => Ok(Port::A),
            'B' => Ok(Port::B),
            'C' => Ok(Port::C),
            'H' => Ok(Port::H),
            _ => Err(GpioError::InvalidPort),
        }
    }

    /// Port from its register block base address
    pub fn from_base(base: usize) -> Result<Self, GpioError> {
        Port::ALL
            .into_iter()
            .find(|port| port.base() == base)
            .ok_or(GpioError::InvalidPort)
    }

    pub fn letter(self) -> char {
        match self {
            Port::A => 'A',
            Port::B => 'B',
            Port::C => 'C',
            Port::H => 'H',
        }
    }
}

/// Pin named in board configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinSpec {
    pub port: Port,
    pub pin: Pin,
    /// Active-low
    pub inverted: bool,
}

/// Parse a pin string from config
///
/// Supports formats (case-insensitive):
/// - "PA5" -> (Port A, Pin 5, false)
/// - "!PC13" -> (Port C, Pin 13, true/inverted)
///
/// The index is plain decimal: no sign, no leading zero.
pub fn parse_pin_string(s: &str) -> Result<PinSpec, GpioError> {
    let s = s.trim();

    let (s, inverted) = match s.strip_prefix('!') {
        Some(rest) => (rest, true),
        None => (s, false),
    };

    let rest = s
        .strip_prefix(['P', 'p'])
        .ok_or(GpioError::InvalidPort)?;
    let mut chars = rest.chars();
    let port = Port::from_char(chars.next().ok_or(GpioError::InvalidPort)?)?;

    let digits = chars.as_str();
    let canonical = match digits.as_bytes() {
        [] => false,
        [b'0', _, ..] => false,
        bytes => bytes.iter().all(u8::is_ascii_digit),
    };
    if !canonical {
        return Err(GpioError::InvalidPin);
    }
    let index: u8 = digits.parse().map_err(|_| GpioError::InvalidPin)?;
    let pin = Pin::new(index)?;

    Ok(PinSpec {
        port,
        pin,
        inverted,
    })
}
