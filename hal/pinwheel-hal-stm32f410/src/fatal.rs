//! Halting error path
//!
//! Driver calls report failures through `Result`. Code that cannot carry on
//! after a failure opts in to halting with [`OrHalt::or_halt`], which records
//! the fault and blinks its `(number, code)` pair on an LED forever.

use embedded_hal::delay::DelayNs;
use pinwheel_hal::fatal::{BlinkPattern, BlinkTiming};
use pinwheel_hal::{GpioError, PinMode};

use crate::driver::Gpio;
use crate::gpio::PinSpec;
use crate::regs::Mmio;

/// LED and timing used to report an unrecoverable fault
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fatal {
    led: PinSpec,
    timing: BlinkTiming,
}

impl Fatal {
    pub const fn new(led: PinSpec, timing: BlinkTiming) -> Self {
        Self { led, timing }
    }

    /// Record `error`, mask interrupts and blink it forever
    pub fn halt<B: Mmio, D: DelayNs>(&self, gpio: &mut Gpio<B, D>, error: GpioError) -> ! {
        gpio.error_state().record(error);

        #[cfg(feature = "defmt")]
        defmt::error!(
            "fatal: {} (number {}, code {})",
            error,
            error.number(),
            error.code()
        );

        cortex_m::interrupt::disable();
        report(
            "LED setup",
            gpio.configure_pin_mode(self.led.port, self.led.pin.index(), PinMode::Output),
        );

        loop {
            self.blink_once(gpio, error);
        }
    }

    /// Play one cycle of the pattern for `error`
    pub fn blink_once<B: Mmio, D: DelayNs>(&self, gpio: &mut Gpio<B, D>, error: GpioError) {
        for step in BlinkPattern::for_error(error, self.timing) {
            let level = if self.led.inverted {
                !step.level
            } else {
                step.level
            };
            report("LED write", gpio.write_pin(self.led.port, self.led.pin.index(), level));
            gpio.delay_mut().delay_ms(step.duration_ms);
        }
    }
}

/// Log a failure the fatal path has nowhere to propagate to
#[cfg(feature = "defmt")]
fn report<T>(step: &str, result: Result<T, GpioError>) {
    if let Err(error) = result {
        defmt::warn!("fatal: {} failed: {}", step, error);
    }
}

#[cfg(not(feature = "defmt"))]
fn report<T>(_step: &str, _result: Result<T, GpioError>) {}

/// Halt on error instead of returning it
pub trait OrHalt<T> {
    fn or_halt<B: Mmio, D: DelayNs>(self, gpio: &mut Gpio<B, D>, fatal: &Fatal) -> T;
}

impl<T> OrHalt<T> for Result<T, GpioError> {
    fn or_halt<B: Mmio, D: DelayNs>(self, gpio: &mut Gpio<B, D>, fatal: &Fatal) -> T {
        match self {
            Ok(value) => value,
            Err(error) => fatal.halt(gpio, error),
        }
    }
}
