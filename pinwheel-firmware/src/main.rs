//! Pinwheel - blink demo firmware
//!
//! Toggles the board LED forever. Each press of the user button steps the
//! toggle period to the next entry of `[blink] delays_ms` in board.toml,
//! wrapping around after the last one.
//!
//! The button is serviced through the EXTI dispatch table: the vector table
//! in [`vectors`] routes every EXTI vector to [`dispatch`], which hands it
//! to the shared driver.

#![no_std]
#![no_main]

use core::cell::Cell;
use core::sync::atomic::{AtomicUsize, Ordering};

use cortex_m_rt::entry;
use critical_section::Mutex;
use defmt::*;
use embedded_hal::delay::DelayNs;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use pinwheel_hal::interrupt::ExternalInterrupts;
use pinwheel_hal::{GpioError, PinDriver, PinMode};
use pinwheel_hal_stm32f410::{Fatal, Gpio, OrHalt, PinSpec, Port, Vector, Volatile};

use crate::config::{BoardConfig, BLINK_DELAYS_MS};
use crate::delay::{CycleDelay, HSI_HZ};

mod config;
mod delay;
mod vectors;

type Driver = Gpio<Volatile, CycleDelay>;

static DRIVER: StaticCell<Driver> = StaticCell::new();

/// Driver shared with the EXTI trampolines
///
/// Published once, inside the same critical section that registers the
/// button, so a trampoline never finds it empty.
static GPIO: Mutex<Cell<Option<&'static Driver>>> = Mutex::new(Cell::new(None));

/// Index into `BLINK_DELAYS_MS`
static SPEED: AtomicUsize = AtomicUsize::new(0);

/// Button callback
static ON_PRESS: fn() = next_speed;

fn next_speed() {
    let count = BLINK_DELAYS_MS.len();
    // No debouncing: a bouncy contact may skip ahead several steps
    let previous = SPEED
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |s| Some((s + 1) % count))
        .unwrap_or_default();
    debug!(
        "Blink period {} ms",
        BLINK_DELAYS_MS[(previous + 1) % count]
    );
}

/// Body of every EXTI trampoline
///
/// Only the lookup is masked; handlers run with other interrupts live.
pub(crate) fn dispatch(vector: Vector) {
    if let Some(gpio) = critical_section::with(|cs| GPIO.borrow(cs).get()) {
        gpio.dispatch(vector);
    }
}

/// Main entry point
#[entry]
fn main() -> ! {
    info!("Pinwheel firmware starting...");

    // SAFETY: this binary is linked for the STM32F410 only
    let bus = unsafe { Volatile::new() };
    let fatal = Fatal::new(BoardConfig::fatal_led(), BoardConfig::fatal_timing());

    let gpio = DRIVER.init(Gpio::new(bus, CycleDelay::new(HSI_HZ)));
    let (gpio, led) = critical_section::with(move |cs| {
        let board = BoardConfig::load().or_halt(gpio, &fatal);
        init(gpio, &board).or_halt(gpio, &fatal);

        let gpio: &'static Driver = gpio;
        GPIO.borrow(cs).set(Some(gpio));
        (gpio, board.led)
    });
    info!("Pins configured, blinking");

    let mut delay = CycleDelay::new(HSI_HZ);
    loop {
        if let Err(e) = toggle(gpio, led) {
            warn!("LED toggle failed: {}", e);
        }
        let period = BLINK_DELAYS_MS[SPEED.load(Ordering::Relaxed) % BLINK_DELAYS_MS.len()];
        delay.delay_ms(period);
    }
}

/// Configure the LED and the button and install the button callback
fn init<G>(gpio: &mut G, board: &BoardConfig) -> Result<(), GpioError>
where
    G: PinDriver<Port = Port> + ExternalInterrupts<Port = Port>,
{
    let led = board.led;
    let button = board.button;

    gpio.configure_pin_mode(led.port, led.pin.index(), PinMode::Output)?;
    gpio.configure_pin_mode(button.port, button.pin.index(), PinMode::Input)?;
    gpio.configure_pull(button.port, button.pin.index(), board.button_pull)?;
    gpio.register_interrupt(
        button.port,
        button.pin.index(),
        board.button_edge,
        board.button_priority,
        &ON_PRESS,
    )?;

    info!(
        "LED P{}{}, button P{}{} on {} edge, priority {}",
        led.port.letter(),
        led.pin.index(),
        button.port.letter(),
        button.pin.index(),
        board.button_edge,
        board.button_priority
    );
    Ok(())
}

fn toggle(gpio: &Driver, led: PinSpec) -> Result<(), GpioError> {
    gpio.output_handle(led)?.toggle()
}
