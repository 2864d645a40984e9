//! GPIO pin abstractions
//!
//! Provides the pin index, configuration enums and the driver contract that
//! chip-specific HALs implement.

use core::ops::Not;

use crate::error::GpioError;

/// Number of pins in one GPIO port
pub const PIN_COUNT: u8 = 16;

/// Validated pin index within a port (0..=15)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin(u8);

impl Pin {
    /// Validate a raw pin index
    pub const fn new(index: u8) -> Result<Self, GpioError> {
        if index < PIN_COUNT {
            Ok(Self(index))
        } else {
            Err(GpioError::InvalidPin)
        }
    }

    /// Raw pin index
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Iterate over all pins of a port in ascending order
    pub fn all() -> impl Iterator<Item = Pin> {
        (0..PIN_COUNT).map(Pin)
    }
}

impl TryFrom<u8> for Pin {
    type Error = GpioError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Pin::new(index)
    }
}

/// Pin mode (2-bit MODER field)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PinMode {
    Input = 0b00,
    Output = 0b01,
    Alternate = 0b10,
    Analog = 0b11,
}

impl PinMode {
    /// Decode a 2-bit mode field
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0b00 => PinMode::Input,
            0b01 => PinMode::Output,
            0b10 => PinMode::Alternate,
            _ => PinMode::Analog,
        }
    }

    pub fn bits(self) -> u32 {
        self as u32
    }
}

/// Output driver type (1-bit OTYPER field)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OutputType {
    PushPull = 0,
    OpenDrain = 1,
}

/// Output slew rate (2-bit OSPEEDR field)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OutputSpeed {
    Low = 0b00,
    Medium = 0b01,
    High = 0b10,
    VeryHigh = 0b11,
}

/// Pull resistor configuration (2-bit PUPDR field)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Pull {
    None = 0b00,
    Up = 0b01,
    Down = 0b10,
}

/// Logic level of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn is_high(self) -> bool {
        self == Level::High
    }

    pub fn is_low(self) -> bool {
        self == Level::Low
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> u8 {
        match level {
            Level::Low => 0,
            Level::High => 1,
        }
    }
}

impl TryFrom<u8> for Level {
    type Error = GpioError;

    /// Only 0 and 1 are logic levels
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Level::Low),
            1 => Ok(Level::High),
            _ => Err(GpioError::InvalidWriteValue),
        }
    }
}

impl Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

/// Alternate function selector (4-bit AFRL/AFRH field)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlternateFunction(u8);

impl AlternateFunction {
    pub const fn new(index: u8) -> Result<Self, GpioError> {
        if index <= 15 {
            Ok(Self(index))
        } else {
            Err(GpioError::InvalidAlternateFunction)
        }
    }

    pub const fn index(self) -> u8 {
        self.0
    }
}

/// Pin-level GPIO driver contract
///
/// Pins are passed as raw indices so out-of-range values are reported as
/// [`GpioError::InvalidPin`] instead of being rejected at compile time.
/// Implementations validate everything before touching hardware.
pub trait PinDriver {
    /// Port identifier for the chip
    type Port: Copy;

    /// Set the pin mode, enabling the port clock on first use
    fn configure_pin_mode(
        &mut self,
        port: Self::Port,
        pin: u8,
        mode: PinMode,
    ) -> Result<(), GpioError>;

    /// Set the pull resistor of an initialized port's pin
    fn configure_pull(&mut self, port: Self::Port, pin: u8, pull: Pull) -> Result<(), GpioError>;

    /// Read the input level of a pin
    fn read_pin(&self, port: Self::Port, pin: u8) -> Result<Level, GpioError>;

    /// Drive an output pin, returning the level observed before the write
    fn write_pin(&self, port: Self::Port, pin: u8, level: Level) -> Result<Level, GpioError>;

    /// Flip an output pin, returning the level observed before the flip
    fn toggle_pin(&self, port: Self::Port, pin: u8) -> Result<Level, GpioError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pin_bounds() {
        assert_eq!(Pin::new(0).map(Pin::index), Ok(0));
        assert_eq!(Pin::new(15).map(Pin::index), Ok(15));
        assert_eq!(Pin::new(16), Err(GpioError::InvalidPin));
        assert_eq!(Pin::try_from(255), Err(GpioError::InvalidPin));
    }

    #[test]
    fn test_all_pins_ascending() {
        let pins: heapless::Vec<u8, 16> = Pin::all().map(Pin::index).collect();
        assert_eq!(pins.len(), 16);
        assert!(pins.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_level_from_raw() {
        assert_eq!(Level::try_from(0), Ok(Level::Low));
        assert_eq!(Level::try_from(1), Ok(Level::High));
        assert_eq!(Level::try_from(2), Err(GpioError::InvalidWriteValue));
        assert_eq!(u8::from(Level::High), 1);
        assert_eq!(!Level::Low, Level::High);
    }

    #[test]
    fn test_mode_bits() {
        for mode in [
            PinMode::Input,
            PinMode::Output,
            PinMode::Alternate,
            PinMode::Analog,
        ] {
            assert_eq!(PinMode::from_bits(mode.bits()), mode);
        }
        // Upper bits are ignored
        assert_eq!(PinMode::from_bits(0b101), PinMode::Output);
    }

    #[test]
    fn test_alternate_function_bounds() {
        assert_eq!(AlternateFunction::new(7).map(AlternateFunction::index), Ok(7));
        assert_eq!(
            AlternateFunction::new(16),
            Err(GpioError::InvalidAlternateFunction)
        );
    }

    proptest! {
        #[test]
        fn prop_pin_accepts_exactly_sixteen(index in any::<u8>()) {
            prop_assert_eq!(Pin::new(index).is_ok(), index < PIN_COUNT);
        }

        #[test]
        fn prop_double_not_is_identity(high in any::<bool>()) {
            let level = Level::from(high);
            prop_assert_eq!(!!level, level);
        }
    }
}
