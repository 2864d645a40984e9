//! GPIO pin driver
//!
//! [`Gpio`] owns the register bus, a delay provider for clock
//! stabilization and the EXTI dispatch table (see [`crate::exti`]).
//! Configuration takes `&mut self` and belongs to the initialization phase;
//! reading, writing and toggling take `&self` so interrupt handlers can use
//! a shared reference.
//!
//! A port counts as initialized once its clock enable bit in RCC_AHB1ENR is
//! set. Every operation except [`Gpio::configure_pin_mode`] refuses to touch
//! a port whose clock is off.

use embedded_hal::delay::DelayNs;
use pinwheel_hal::gpio::{AlternateFunction, OutputSpeed, OutputType, PinDriver};
use pinwheel_hal::{DispatchTable, ErrorState, GpioError, Level, Pin, PinMode, Pull};
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};

use crate::gpio::Port;
use crate::regs::map::{rcc, GpioRegisters, AFR, BSRR, IDR, MODER, ODR, OSPEEDR, OTYPER, PUPDR};
use crate::regs::{nth, Mmio};

/// Settle time after a peripheral clock is switched on
pub const CLOCK_SETTLE_US: u32 = 2;

/// Fault record shared by every driver instance
pub static ERROR_STATE: ErrorState = ErrorState::new();

/// GPIO and EXTI driver for the STM32F410
pub struct Gpio<B: Mmio, D: DelayNs> {
    pub(crate) bus: B,
    delay: D,
    pub(crate) table: DispatchTable,
    errors: &'static ErrorState,
}

impl<B: Mmio, D: DelayNs> Gpio<B, D> {
    /// Create a driver recording faults in [`ERROR_STATE`]
    pub fn new(bus: B, delay: D) -> Self {
        Self::with_error_state(bus, delay, &ERROR_STATE)
    }

    /// Create a driver recording faults in `errors`
    pub fn with_error_state(bus: B, delay: D, errors: &'static ErrorState) -> Self {
        Self {
            bus,
            delay,
            table: DispatchTable::new(),
            errors,
        }
    }

    pub fn error_state(&self) -> &'static ErrorState {
        self.errors
    }

    pub fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }

    /// Record `error` and hand it back for propagation
    pub(crate) fn fail(&self, error: GpioError) -> GpioError {
        #[cfg(feature = "defmt")]
        defmt::debug!("gpio: {}", error);
        self.errors.record(error);
        error
    }

    pub(crate) fn pin(&self, index: u8) -> Result<Pin, GpioError> {
        Pin::new(index).map_err(|e| self.fail(e))
    }

    /// Whether the port clock has been enabled
    pub fn is_port_initialized(&self, port: Port) -> bool {
        rcc(&self.bus).ahb1enr().is_set(port.clock_enable())
    }

    fn port(&self, port: Port) -> GpioRegisters<'_, B> {
        port.registers(&self.bus)
    }

    fn require_initialized(&self, port: Port) -> Result<(), GpioError> {
        if self.is_port_initialized(port) {
            Ok(())
        } else {
            Err(self.fail(GpioError::UninitializedPort))
        }
    }

    /// Pin index validated and port clock checked
    fn checked(&self, port: Port, index: u8) -> Result<Pin, GpioError> {
        let pin = self.pin(index)?;
        self.require_initialized(port)?;
        Ok(pin)
    }

    /// Turn on `port`'s clock if it is off and wait for it to settle
    fn enable_port_clock(&mut self, port: Port) {
        if self.is_port_initialized(port) {
            return;
        }
        let enable = port.clock_enable();
        let ahb1enr = rcc(&self.bus).ahb1enr();
        critical_section::with(|_| ahb1enr.modify(enable.val(1)));
        // The enable bit reading back set is the only readiness signal AHB1 offers
        while !ahb1enr.is_set(enable) {}
        self.delay.delay_us(CLOCK_SETTLE_US);

        #[cfg(feature = "defmt")]
        defmt::debug!("gpio: port {} clock enabled", port);
    }

    /// Current mode of a pin
    pub fn pin_mode(&self, port: Port, pin: u8) -> Result<PinMode, GpioError> {
        let pin = self.checked(port, pin)?;
        Ok(self.mode_of(port, pin))
    }

    fn mode_of(&self, port: Port, pin: Pin) -> PinMode {
        let field = nth(MODER::MODE0, slot(pin));
        PinMode::from_bits(self.port(port).moder().read(field))
    }

    fn require_output(&self, port: Port, pin: Pin) -> Result<(), GpioError> {
        match self.mode_of(port, pin) {
            PinMode::Output => Ok(()),
            _ => Err(self.fail(GpioError::InvalidPinMode)),
        }
    }

    /// Set the pin mode, enabling the port clock on first use
    pub fn configure_pin_mode(
        &mut self,
        port: Port,
        pin: u8,
        mode: PinMode,
    ) -> Result<(), GpioError> {
        let pin = self.pin(pin)?;
        self.enable_port_clock(port);
        let moder = self.port(port).moder();
        critical_section::with(|_| moder.modify(nth(MODER::MODE0, slot(pin)).val(mode.bits())));
        Ok(())
    }

    /// Select the pull resistor
    pub fn configure_pull(&mut self, port: Port, pin: u8, pull: Pull) -> Result<(), GpioError> {
        let pin = self.checked(port, pin)?;
        let pupdr = self.port(port).pupdr();
        critical_section::with(|_| pupdr.modify(nth(PUPDR::PUPD0, slot(pin)).val(pull as u32)));
        Ok(())
    }

    /// Select push-pull or open-drain output
    pub fn configure_output_type(
        &mut self,
        port: Port,
        pin: u8,
        output_type: OutputType,
    ) -> Result<(), GpioError> {
        let pin = self.checked(port, pin)?;
        let otyper = self.port(port).otyper();
        critical_section::with(|_| {
            otyper.modify(nth(OTYPER::OT0, slot(pin)).val(output_type as u32))
        });
        Ok(())
    }

    /// Select the output slew rate
    pub fn configure_output_speed(
        &mut self,
        port: Port,
        pin: u8,
        speed: OutputSpeed,
    ) -> Result<(), GpioError> {
        let pin = self.checked(port, pin)?;
        let ospeedr = self.port(port).ospeedr();
        critical_section::with(|_| {
            ospeedr.modify(nth(OSPEEDR::OSPEED0, slot(pin)).val(speed as u32))
        });
        Ok(())
    }

    /// Route the pin to alternate function `af` and switch it to alternate mode
    ///
    /// The function is selected before the mode changes so the pin never
    /// briefly connects to the wrong peripheral.
    pub fn configure_alternate_function(
        &mut self,
        port: Port,
        pin: u8,
        af: u8,
    ) -> Result<(), GpioError> {
        let af = AlternateFunction::new(af).map_err(|e| self.fail(e))?;
        let pin = self.checked(port, pin)?;
        let regs = self.port(port);
        let afsel = nth(AFR::AFSEL0, slot(pin) % 8).val(u32::from(af.index()));
        let mode = nth(MODER::MODE0, slot(pin)).val(PinMode::Alternate.bits());
        critical_section::with(|_| {
            regs.afr(pin.index()).modify(afsel);
            regs.moder().modify(mode);
        });
        Ok(())
    }

    /// Read the input level of a pin
    pub fn read_pin(&self, port: Port, pin: u8) -> Result<Level, GpioError> {
        let pin = self.checked(port, pin)?;
        Ok(self.input_of(port, pin))
    }

    /// Level the pin is being driven to (ODR), regardless of what IDR sees
    pub fn output_level(&self, port: Port, pin: u8) -> Result<Level, GpioError> {
        let pin = self.checked(port, pin)?;
        Ok(self.driven_of(port, pin))
    }

    fn input_of(&self, port: Port, pin: Pin) -> Level {
        Level::from(self.port(port).idr().is_set(nth(IDR::ID0, slot(pin))))
    }

    fn driven_of(&self, port: Port, pin: Pin) -> Level {
        Level::from(self.port(port).odr().is_set(nth(ODR::OD0, slot(pin))))
    }

    /// Drive `pin` through BSRR, leaving the rest of the port alone
    fn drive(&self, port: Port, pin: Pin, level: Level) {
        let half = match level {
            Level::High => BSRR::BS0,
            Level::Low => BSRR::BR0,
        };
        self.port(port).bsrr().write(nth(half, slot(pin)).val(1));
    }

    /// Drive an output pin, returning the input level seen just before
    ///
    /// Uses BSRR, so no other pin of the port is disturbed.
    pub fn write_pin(&self, port: Port, pin: u8, level: Level) -> Result<Level, GpioError> {
        let pin = self.checked(port, pin)?;
        self.require_output(port, pin)?;
        let previous = self.input_of(port, pin);
        self.drive(port, pin, level);
        Ok(previous)
    }

    /// Flip an output pin, returning the input level seen just before
    ///
    /// The ODR read and the BSRR write form one critical section, so a
    /// handler writing the same pin can't land between them and be undone.
    pub fn toggle_pin(&self, port: Port, pin: u8) -> Result<Level, GpioError> {
        let pin = self.checked(port, pin)?;
        self.require_output(port, pin)?;
        let previous = self.input_of(port, pin);
        critical_section::with(|_| {
            let driven = self.driven_of(port, pin);
            self.drive(port, pin, !driven);
        });
        Ok(previous)
    }
}

/// Field slot of `pin` in a one-field-per-pin register
fn slot(pin: Pin) -> usize {
    usize::from(pin.index())
}

impl<B: Mmio, D: DelayNs> PinDriver for Gpio<B, D> {
    type Port = Port;

    fn configure_pin_mode(&mut self, port: Port, pin: u8, mode: PinMode) -> Result<(), GpioError> {
        Gpio::configure_pin_mode(self, port, pin, mode)
    }

    fn configure_pull(&mut self, port: Port, pin: u8, pull: Pull) -> Result<(), GpioError> {
        Gpio::configure_pull(self, port, pin, pull)
    }

    fn read_pin(&self, port: Port, pin: u8) -> Result<Level, GpioError> {
        Gpio::read_pin(self, port, pin)
    }

    fn write_pin(&self, port: Port, pin: u8, level: Level) -> Result<Level, GpioError> {
        Gpio::write_pin(self, port, pin, level)
    }

    fn toggle_pin(&self, port: Port, pin: u8) -> Result<Level, GpioError> {
        Gpio::toggle_pin(self, port, pin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regs::map::AHB1ENR;
    use crate::testing::{FakeBus, FakeDelay};
    use proptest::prelude::*;

    fn driver() -> Gpio<FakeBus, FakeDelay> {
        let errors = Box::leak(Box::new(ErrorState::new()));
        Gpio::with_error_state(FakeBus::new(), FakeDelay::default(), errors)
    }

    fn pin(index: u8) -> Pin {
        Pin::new(index).unwrap()
    }

    #[test]
    fn test_first_configure_enables_clock_once() {
        let mut gpio = driver();
        assert!(!gpio.is_port_initialized(Port::C));

        gpio.configure_pin_mode(Port::C, 13, PinMode::Input).unwrap();
        assert!(gpio.is_port_initialized(Port::C));
        let ahb1enr = rcc(&gpio.bus).ahb1enr();
        assert!(ahb1enr.is_set(AHB1ENR::GPIOCEN));
        assert_eq!(ahb1enr.get(), 1 << 2);
        let settled = gpio.delay.elapsed_ns;
        assert!(settled >= u64::from(CLOCK_SETTLE_US) * 1000);

        // Second configuration on the same port does not wait again
        gpio.configure_pin_mode(Port::C, 12, PinMode::Output).unwrap();
        assert_eq!(gpio.delay.elapsed_ns, settled);
    }

    #[test]
    fn test_mode_field_is_replaced() {
        let mut gpio = driver();
        gpio.configure_pin_mode(Port::A, 5, PinMode::Analog).unwrap();
        gpio.configure_pin_mode(Port::A, 5, PinMode::Output).unwrap();
        gpio.configure_pin_mode(Port::A, 4, PinMode::Alternate).unwrap();

        let moder = Port::A.registers(&gpio.bus).moder();
        assert_eq!(moder.read(nth(MODER::MODE0, 5)), 0b01);
        assert_eq!(moder.read(nth(MODER::MODE0, 4)), 0b10);
        assert_eq!(moder.get() & !(0b1111 << 8), 0);
        assert_eq!(gpio.pin_mode(Port::A, 5), Ok(PinMode::Output));
    }

    #[test]
    fn test_pa5_write_toggle_scenario() {
        let mut gpio = driver();
        gpio.configure_pin_mode(Port::A, 5, PinMode::Output).unwrap();

        gpio.write_pin(Port::A, 5, Level::High).unwrap();
        assert_eq!(gpio.read_pin(Port::A, 5), Ok(Level::High));

        assert_eq!(gpio.toggle_pin(Port::A, 5), Ok(Level::High));
        assert_eq!(gpio.read_pin(Port::A, 5), Ok(Level::Low));

        assert_eq!(gpio.toggle_pin(Port::A, 5), Ok(Level::Low));
        assert_eq!(gpio.read_pin(Port::A, 5), Ok(Level::High));
    }

    #[test]
    fn test_write_returns_previous_level() {
        let mut gpio = driver();
        gpio.configure_pin_mode(Port::B, 0, PinMode::Output).unwrap();

        assert_eq!(gpio.write_pin(Port::B, 0, Level::High), Ok(Level::Low));
        assert_eq!(gpio.write_pin(Port::B, 0, Level::Low), Ok(Level::High));
        assert_eq!(gpio.write_pin(Port::B, 0, Level::Low), Ok(Level::Low));
    }

    #[test]
    fn test_write_touches_only_its_pin() {
        let mut gpio = driver();
        gpio.configure_pin_mode(Port::A, 1, PinMode::Output).unwrap();
        gpio.configure_pin_mode(Port::A, 2, PinMode::Output).unwrap();

        gpio.write_pin(Port::A, 1, Level::High).unwrap();
        gpio.write_pin(Port::A, 2, Level::High).unwrap();
        gpio.write_pin(Port::A, 1, Level::Low).unwrap();

        assert_eq!(Port::A.registers(&gpio.bus).odr().get(), 1 << 2);
    }

    #[test]
    fn test_write_on_input_pin_is_rejected() {
        let mut gpio = driver();
        gpio.configure_pin_mode(Port::C, 13, PinMode::Input).unwrap();
        let odr = Port::C.registers(&gpio.bus).odr().addr();
        let before = gpio.bus.write_count();

        assert_eq!(
            gpio.write_pin(Port::C, 13, Level::High),
            Err(GpioError::InvalidPinMode)
        );
        assert_eq!(gpio.toggle_pin(Port::C, 13), Err(GpioError::InvalidPinMode));
        assert_eq!(gpio.bus.peek(odr), 0);
        assert_eq!(gpio.bus.write_count(), before);
        assert_eq!(gpio.error_state().last_error(), Some(GpioError::InvalidPinMode));
    }

    #[test]
    fn test_uninitialized_port_is_rejected() {
        let mut gpio = driver();
        assert_eq!(gpio.read_pin(Port::H, 0), Err(GpioError::UninitializedPort));
        assert_eq!(
            gpio.write_pin(Port::H, 0, Level::High),
            Err(GpioError::UninitializedPort)
        );
        assert_eq!(gpio.toggle_pin(Port::H, 0), Err(GpioError::UninitializedPort));
        assert_eq!(
            gpio.configure_pull(Port::H, 0, Pull::Up),
            Err(GpioError::UninitializedPort)
        );
        assert_eq!(gpio.bus.write_count(), 0);
        assert_eq!(gpio.error_state().last(), Some((1, 3)));
    }

    #[test]
    fn test_read_follows_external_input() {
        let mut gpio = driver();
        gpio.configure_pin_mode(Port::C, 13, PinMode::Input).unwrap();
        gpio.configure_pull(Port::C, 13, Pull::Down).unwrap();

        assert_eq!(gpio.read_pin(Port::C, 13), Ok(Level::Low));
        gpio.bus.set_input(Port::C, pin(13), Level::High);
        assert_eq!(gpio.read_pin(Port::C, 13), Ok(Level::High));

        let pupdr = Port::C.registers(&gpio.bus).pupdr();
        assert_eq!(pupdr.read(nth(PUPDR::PUPD0, 13)), Pull::Down as u32);
    }

    #[test]
    fn test_output_type_and_speed() {
        let mut gpio = driver();
        gpio.configure_pin_mode(Port::B, 9, PinMode::Output).unwrap();
        gpio.configure_output_type(Port::B, 9, OutputType::OpenDrain).unwrap();
        gpio.configure_output_speed(Port::B, 9, OutputSpeed::VeryHigh).unwrap();

        let otyper = Port::B.registers(&gpio.bus).otyper().addr();
        assert_eq!(gpio.bus.peek(otyper), 1 << 9);
        let ospeedr = Port::B.registers(&gpio.bus).ospeedr();
        assert_eq!(ospeedr.read(nth(OSPEEDR::OSPEED0, 9)), 0b11);

        gpio.configure_output_type(Port::B, 9, OutputType::PushPull).unwrap();
        assert_eq!(gpio.bus.peek(otyper), 0);
    }

    #[test]
    fn test_alternate_function() {
        let mut gpio = driver();
        gpio.configure_pin_mode(Port::A, 2, PinMode::Input).unwrap();
        gpio.configure_alternate_function(Port::A, 2, 7).unwrap();
        gpio.configure_alternate_function(Port::A, 10, 1).unwrap();

        let regs = Port::A.registers(&gpio.bus);
        assert_eq!(regs.afrl().read(nth(AFR::AFSEL0, 2)), 7);
        assert_eq!(regs.afrh().read(nth(AFR::AFSEL0, 2)), 1);
        assert_eq!(gpio.pin_mode(Port::A, 2), Ok(PinMode::Alternate));

        assert_eq!(
            gpio.configure_alternate_function(Port::A, 2, 16),
            Err(GpioError::InvalidAlternateFunction)
        );
    }

    #[test]
    fn test_output_level_reads_odr() {
        let mut gpio = driver();
        gpio.configure_pin_mode(Port::A, 5, PinMode::Output).unwrap();
        gpio.write_pin(Port::A, 5, Level::High).unwrap();
        assert_eq!(gpio.output_level(Port::A, 5), Ok(Level::High));
    }

    #[test]
    fn test_toggle_masks_interrupts_between_read_and_write() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::{Arc, Mutex};
        use std::thread::{self, JoinHandle};
        use std::time::Duration;

        let mut gpio = driver();
        gpio.configure_pin_mode(Port::A, 5, PinMode::Output).unwrap();
        gpio.write_pin(Port::A, 5, Level::High).unwrap();

        // Stands in for an interrupt handler: it can only run outside a
        // critical section. Started right after toggle reads ODR.
        let handler_ran = Arc::new(AtomicBool::new(false));
        let ran_mid_toggle = Arc::new(AtomicBool::new(false));
        let handler: Arc<Mutex<Option<JoinHandle<()>>>> = Arc::default();
        let odr = Port::A.registers(&gpio.bus).odr().addr();
        gpio.bus.on_next_read(odr, {
            let handler_ran = handler_ran.clone();
            let ran_mid_toggle = ran_mid_toggle.clone();
            let handler = handler.clone();
            move || {
                let flag = handler_ran.clone();
                let thread = thread::spawn(move || {
                    critical_section::with(|_| flag.store(true, Ordering::SeqCst))
                });
                thread::sleep(Duration::from_millis(50));
                ran_mid_toggle.store(handler_ran.load(Ordering::SeqCst), Ordering::SeqCst);
                *handler.lock().unwrap() = Some(thread);
            }
        });

        assert_eq!(gpio.toggle_pin(Port::A, 5), Ok(Level::High));
        let thread = handler.lock().unwrap().take().expect("ODR was not read");
        thread.join().unwrap();

        assert!(!ran_mid_toggle.load(Ordering::SeqCst));
        assert!(handler_ran.load(Ordering::SeqCst));
        assert_eq!(gpio.output_level(Port::A, 5), Ok(Level::Low));
    }

    #[test]
    fn test_every_port_and_pin_round_trips() {
        let mut gpio = driver();
        for port in Port::ALL {
            for index in 0..16 {
                gpio.configure_pin_mode(port, index, PinMode::Output).unwrap();
                gpio.write_pin(port, index, Level::High).unwrap();
                assert_eq!(gpio.read_pin(port, index), Ok(Level::High));
                gpio.write_pin(port, index, Level::Low).unwrap();
                assert_eq!(gpio.read_pin(port, index), Ok(Level::Low));
            }
        }
    }

    fn any_port() -> impl Strategy<Value = Port> {
        prop::sample::select(Port::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_out_of_range_pin_touches_nothing(port in any_port(), index in 16u8..) {
            let mut gpio = driver();
            gpio.configure_pin_mode(port, 0, PinMode::Output).unwrap();
            let before = gpio.bus.write_count();

            prop_assert_eq!(gpio.configure_pin_mode(port, index, PinMode::Output), Err(GpioError::InvalidPin));
            prop_assert_eq!(gpio.configure_pull(port, index, Pull::Up), Err(GpioError::InvalidPin));
            prop_assert_eq!(gpio.read_pin(port, index), Err(GpioError::InvalidPin));
            prop_assert_eq!(gpio.write_pin(port, index, Level::High), Err(GpioError::InvalidPin));
            prop_assert_eq!(gpio.toggle_pin(port, index), Err(GpioError::InvalidPin));
            prop_assert_eq!(gpio.bus.write_count(), before);
        }

        #[test]
        fn prop_toggle_twice_restores(port in any_port(), index in 0u8..16, high in any::<bool>()) {
            let mut gpio = driver();
            gpio.configure_pin_mode(port, index, PinMode::Output).unwrap();
            gpio.write_pin(port, index, Level::from(high)).unwrap();
            let start = gpio.read_pin(port, index).unwrap();

            gpio.toggle_pin(port, index).unwrap();
            prop_assert_eq!(gpio.read_pin(port, index).unwrap(), !start);
            gpio.toggle_pin(port, index).unwrap();
            prop_assert_eq!(gpio.read_pin(port, index).unwrap(), start);
        }

        #[test]
        fn prop_write_then_read_loops_back(port in any_port(), index in 0u8..16, high in any::<bool>()) {
            let mut gpio = driver();
            gpio.configure_pin_mode(port, index, PinMode::Output).unwrap();
            gpio.write_pin(port, index, Level::from(high)).unwrap();
            prop_assert_eq!(gpio.read_pin(port, index).unwrap(), Level::from(high));
        }
    }
}
