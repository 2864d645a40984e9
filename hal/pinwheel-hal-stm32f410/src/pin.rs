//! embedded-hal pin handles
//!
//! Handles borrow the driver and address one pin, so code written against
//! `embedded_hal::digital` can drive Pinwheel pins. Active-low pins from
//! board configuration (`!PA5`) are inverted here, not in the driver.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};
use pinwheel_hal::{GpioError, Level, Pin, PinMode};

use crate::driver::Gpio;
use crate::gpio::{PinSpec, Port};
use crate::regs::Mmio;

/// Output pin bound to a driver
pub struct OutputHandle<'a, B: Mmio, D: DelayNs> {
    gpio: &'a Gpio<B, D>,
    port: Port,
    pin: Pin,
    inverted: bool,
}

/// Input pin bound to a driver
pub struct InputHandle<'a, B: Mmio, D: DelayNs> {
    gpio: &'a Gpio<B, D>,
    port: Port,
    pin: Pin,
    inverted: bool,
}

fn apply(level: Level, inverted: bool) -> Level {
    if inverted {
        !level
    } else {
        level
    }
}

impl<B: Mmio, D: DelayNs> Gpio<B, D> {
    /// Handle for a pin already configured as output
    pub fn output_handle(&self, spec: PinSpec) -> Result<OutputHandle<'_, B, D>, GpioError> {
        match self.pin_mode(spec.port, spec.pin.index())? {
            PinMode::Output => Ok(OutputHandle {
                gpio: self,
                port: spec.port,
                pin: spec.pin,
                inverted: spec.inverted,
            }),
            _ => Err(self.fail(GpioError::InvalidPinMode)),
        }
    }

    /// Handle for reading a pin of an initialized port
    pub fn input_handle(&self, spec: PinSpec) -> Result<InputHandle<'_, B, D>, GpioError> {
        if !self.is_port_initialized(spec.port) {
            return Err(self.fail(GpioError::UninitializedPort));
        }
        Ok(InputHandle {
            gpio: self,
            port: spec.port,
            pin: spec.pin,
            inverted: spec.inverted,
        })
    }
}

impl<B: Mmio, D: DelayNs> OutputHandle<'_, B, D> {
    /// Drive the pin to its logical `active` state
    pub fn set(&mut self, active: bool) -> Result<(), GpioError> {
        let level = apply(Level::from(active), self.inverted);
        self.gpio
            .write_pin(self.port, self.pin.index(), level)
            .map(|_| ())
    }

    /// Flip the pin
    pub fn toggle(&mut self) -> Result<(), GpioError> {
        self.gpio
            .toggle_pin(self.port, self.pin.index())
            .map(|_| ())
    }

    /// Whether the pin is driven to its logical active state
    pub fn is_active(&self) -> Result<bool, GpioError> {
        let driven = self.gpio.output_level(self.port, self.pin.index())?;
        Ok(apply(driven, self.inverted).is_high())
    }
}

impl<B: Mmio, D: DelayNs> InputHandle<'_, B, D> {
    pub fn is_active(&self) -> Result<bool, GpioError> {
        let level = self.gpio.read_pin(self.port, self.pin.index())?;
        Ok(apply(level, self.inverted).is_high())
    }
}

impl<B: Mmio, D: DelayNs> ErrorType for OutputHandle<'_, B, D> {
    type Error = GpioError;
}

impl<B: Mmio, D: DelayNs> ErrorType for InputHandle<'_, B, D> {
    type Error = GpioError;
}

impl<B: Mmio, D: DelayNs> OutputPin for OutputHandle<'_, B, D> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true)
    }
}

impl<B: Mmio, D: DelayNs> StatefulOutputPin for OutputHandle<'_, B, D> {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        self.is_active()
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        self.is_active().map(|active| !active)
    }

    fn toggle(&mut self) -> Result<(), Self::Error> {
        OutputHandle::toggle(self)
    }
}

impl<B: Mmio, D: DelayNs> InputPin for InputHandle<'_, B, D> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.is_active()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_active().map(|active| !active)
    }
}
