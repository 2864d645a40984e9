//! Board configuration
//!
//! The constants come from board.toml through build.rs, which has already
//! checked them; the pin strings are parsed again here so a bad value
//! still surfaces as a `GpioError` on the fatal path.

use pinwheel_hal::fatal::BlinkTiming;
use pinwheel_hal::{Edge, GpioError, Pin, Pull};
use pinwheel_hal_stm32f410::{parse_pin_string, PinSpec, Port};

mod board {
    use pinwheel_hal::fatal::BlinkTiming;
    use pinwheel_hal::Pull;

    include!(concat!(env!("OUT_DIR"), "/board.rs"));
}

pub use board::BLINK_DELAYS_MS;

/// LED used by the fatal path when the configured one is unusable (NUCLEO LD2)
const FALLBACK_LED: PinSpec = PinSpec {
    port: Port::A,
    pin: match Pin::new(5) {
        Ok(pin) => pin,
        Err(_) => panic!("PA5 out of range"),
    },
    inverted: false,
};

pub struct BoardConfig {
    pub led: PinSpec,
    pub button: PinSpec,
    pub button_edge: Edge,
    pub button_priority: u8,
    pub button_pull: Pull,
    pub fatal_timing: BlinkTiming,
}

impl BoardConfig {
    pub fn load() -> Result<Self, GpioError> {
        Ok(Self {
            led: parse_pin_string(board::LED_PIN)?,
            button: parse_pin_string(board::BUTTON_PIN)?,
            button_edge: Edge::try_from(board::BUTTON_EDGE)?,
            button_priority: board::BUTTON_PRIORITY,
            button_pull: board::BUTTON_PULL,
            fatal_timing: board::FATAL_TIMING,
        })
    }

    /// Fatal path LED, usable before the rest of the config is known
    pub fn fatal_led() -> PinSpec {
        parse_pin_string(board::LED_PIN).unwrap_or(FALLBACK_LED)
    }

    pub fn fatal_timing() -> BlinkTiming {
        board::FATAL_TIMING
    }
}
