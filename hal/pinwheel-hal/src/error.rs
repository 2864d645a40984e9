//! GPIO driver errors
//!
//! Every driver operation validates its arguments before touching a
//! register and reports failures as a [`GpioError`]. Each error also has a
//! legacy numeric `(number, code)` pair, which the halting error path blinks
//! out on an LED and which [`ErrorState`] keeps for a debugger to inspect.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

/// Error number shared by every GPIO fault
pub const GPIO_ERROR_NUMBER: u16 = 1;

/// Errors reported by the GPIO driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioError {
    /// Pin index outside 0..=15
    InvalidPin,
    /// Port identifier not present on this chip
    InvalidPort,
    /// Port clock has not been enabled yet
    UninitializedPort,
    /// Operation requires the pin to be in output mode
    InvalidPinMode,
    /// Raw value is not a logic level
    InvalidWriteValue,
    /// Raw value is not a trigger edge
    InvalidTriggerEdge,
    /// Interrupt priority outside the implemented range
    InvalidPriority,
    /// Alternate function index outside 0..=15
    InvalidAlternateFunction,
}

impl GpioError {
    /// Legacy error code for this fault
    pub fn code(self) -> u16 {
        match self {
            GpioError::InvalidPort => 1,
            GpioError::InvalidPin => 2,
            GpioError::UninitializedPort => 3,
            GpioError::InvalidPinMode => 4,
            GpioError::InvalidWriteValue => 5,
            GpioError::InvalidTriggerEdge => 6,
            GpioError::InvalidPriority => 7,
            GpioError::InvalidAlternateFunction => 8,
        }
    }

    /// Legacy error number for this fault
    pub fn number(self) -> u16 {
        GPIO_ERROR_NUMBER
    }

    /// Recover an error from its legacy code
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(GpioError::InvalidPort),
            2 => Some(GpioError::InvalidPin),
            3 => Some(GpioError::UninitializedPort),
            4 => Some(GpioError::InvalidPinMode),
            5 => Some(GpioError::InvalidWriteValue),
            6 => Some(GpioError::InvalidTriggerEdge),
            7 => Some(GpioError::InvalidPriority),
            8 => Some(GpioError::InvalidAlternateFunction),
            _ => None,
        }
    }
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            GpioError::InvalidPin => "pin index out of range",
            GpioError::InvalidPort => "unknown GPIO port",
            GpioError::UninitializedPort => "port clock not enabled",
            GpioError::InvalidPinMode => "pin is not configured as output",
            GpioError::InvalidWriteValue => "value is not a logic level",
            GpioError::InvalidTriggerEdge => "value is not a trigger edge",
            GpioError::InvalidPriority => "interrupt priority out of range",
            GpioError::InvalidAlternateFunction => "alternate function out of range",
        };
        f.write_str(msg)
    }
}

impl embedded_hal::digital::Error for GpioError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// Most recent driver fault as a packed `(number, code)` pair
///
/// The upper half holds the error number and the lower half the error
/// code. Zero means no fault has been recorded.
pub struct ErrorState {
    packed: AtomicU32,
}

impl Default for ErrorState {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorState {
    /// Create an empty error state
    pub const fn new() -> Self {
        Self {
            packed: AtomicU32::new(0),
        }
    }

    /// Record `error` as the most recent fault
    pub fn record(&self, error: GpioError) {
        let packed = (u32::from(error.number()) << 16) | u32::from(error.code());
        self.packed.store(packed, Ordering::Relaxed);
    }

    /// Most recent `(number, code)` pair, if any fault was recorded
    pub fn last(&self) -> Option<(u16, u16)> {
        match self.packed.load(Ordering::Relaxed) {
            0 => None,
            packed => Some(((packed >> 16) as u16, packed as u16)),
        }
    }

    /// Most recent fault decoded back into a [`GpioError`]
    pub fn last_error(&self) -> Option<GpioError> {
        self.last().and_then(|(_, code)| GpioError::from_code(code))
    }

    /// Forget the recorded fault
    pub fn clear(&self) {
        self.packed.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [GpioError; 8] = [
        GpioError::InvalidPin,
        GpioError::InvalidPort,
        GpioError::UninitializedPort,
        GpioError::InvalidPinMode,
        GpioError::InvalidWriteValue,
        GpioError::InvalidTriggerEdge,
        GpioError::InvalidPriority,
        GpioError::InvalidAlternateFunction,
    ];

    #[test]
    fn test_legacy_codes() {
        assert_eq!(GpioError::InvalidPort.code(), 1);
        assert_eq!(GpioError::InvalidPin.code(), 2);
        assert_eq!(GpioError::InvalidWriteValue.code(), 5);
        assert_eq!(GpioError::InvalidTriggerEdge.code(), 6);
        assert_eq!(GpioError::InvalidPriority.code(), 7);
    }

    #[test]
    fn test_codes_are_distinct_and_decodable() {
        for error in ALL {
            assert_eq!(GpioError::from_code(error.code()), Some(error));
            assert_eq!(error.number(), GPIO_ERROR_NUMBER);
        }
        assert_eq!(GpioError::from_code(0), None);
        assert_eq!(GpioError::from_code(9), None);
    }

    #[test]
    fn test_error_state_records_latest() {
        let state = ErrorState::new();
        assert_eq!(state.last(), None);

        state.record(GpioError::InvalidPin);
        assert_eq!(state.last(), Some((1, 2)));

        state.record(GpioError::InvalidPriority);
        assert_eq!(state.last(), Some((1, 7)));
        assert_eq!(state.last_error(), Some(GpioError::InvalidPriority));

        state.clear();
        assert_eq!(state.last(), None);
    }
}
