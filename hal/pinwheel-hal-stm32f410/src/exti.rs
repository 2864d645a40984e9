//! External interrupt routing and dispatch
//!
//! Sixteen EXTI lines feed seven NVIC vectors on the F410: lines 0-4 each
//! have their own vector, lines 5-9 share `EXTI9_5` and lines 10-15 share
//! `EXTI15_10`. The driver's dispatch table is keyed by line, so a shared
//! vector tells its pins apart through the EXTI pending register.

use embedded_hal::delay::DelayNs;
use pinwheel_hal::interrupt::{ExternalInterrupts, Handler, PendingFlags};
use pinwheel_hal::{Edge, GpioError, Pin, Priority};
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};

use crate::driver::Gpio;
use crate::gpio::Port;
use crate::regs::map::{
    exti, nvic, rcc, syscfg, APB2ENR, EXTICR, IPR, LINES, NVIC_CLEAR, NVIC_SET, PR, PR_CLEAR,
};
use crate::regs::{nth, Mmio};

/// NVIC vector serving one or more EXTI lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Vector {
    Exti0,
    Exti1,
    Exti2,
    Exti3,
    Exti4,
    Exti9_5,
    Exti15_10,
}

impl Vector {
    pub const ALL: [Vector; 7] = [
        Vector::Exti0,
        Vector::Exti1,
        Vector::Exti2,
        Vector::Exti3,
        Vector::Exti4,
        Vector::Exti9_5,
        Vector::Exti15_10,
    ];

    /// Vector that serves `pin`'s line
    pub const fn for_pin(pin: Pin) -> Self {
        match pin.index() {
            0 => Vector::Exti0,
            1 => Vector::Exti1,
            2 => Vector::Exti2,
            3 => Vector::Exti3,
            4 => Vector::Exti4,
            5..=9 => Vector::Exti9_5,
            _ => Vector::Exti15_10,
        }
    }

    /// NVIC interrupt number
    pub const fn irq(self) -> u16 {
        match self {
            Vector::Exti0 => 6,
            Vector::Exti1 => 7,
            Vector::Exti2 => 8,
            Vector::Exti3 => 9,
            Vector::Exti4 => 10,
            Vector::Exti9_5 => 23,
            Vector::Exti15_10 => 40,
        }
    }

    const fn lines(self) -> (u8, u8) {
        match self {
            Vector::Exti0 => (0, 0),
            Vector::Exti1 => (1, 1),
            Vector::Exti2 => (2, 2),
            Vector::Exti3 => (3, 3),
            Vector::Exti4 => (4, 4),
            Vector::Exti9_5 => (5, 9),
            Vector::Exti15_10 => (10, 15),
        }
    }

    /// Pins served by this vector, ascending
    pub fn pins(self) -> impl Iterator<Item = Pin> + Clone {
        let (first, last) = self.lines();
        (first..=last).filter_map(|index| Pin::new(index).ok())
    }

    fn bank(self) -> u8 {
        (self.irq() / 32) as u8
    }

    /// Position of the vector's bit in its NVIC bank
    fn bank_slot(self) -> usize {
        usize::from(self.irq() % 32)
    }
}

// SAFETY: `irq` returns the F410 position of each EXTI vector
unsafe impl cortex_m::interrupt::InterruptNumber for Vector {
    fn number(self) -> u16 {
        self.irq()
    }
}

/// EXTI line number of `pin`
fn line(pin: Pin) -> usize {
    usize::from(pin.index())
}

/// EXTI_PR viewed as per-line pending flags
struct ExtiPending<'a, B: Mmio> {
    bus: &'a B,
}

impl<B: Mmio> PendingFlags for ExtiPending<'_, B> {
    fn is_pending(&self, pin: Pin) -> bool {
        exti(self.bus).pr().is_set(nth(PR::PR0, line(pin)))
    }

    fn clear(&self, pin: Pin) {
        // Write-1-to-clear: only this line's bit is set in the value
        exti(self.bus).pr().write(nth(PR_CLEAR::PR0, line(pin)).val(1));
    }
}

impl<B: Mmio, D: DelayNs> Gpio<B, D> {
    /// Route `port`'s `pin` to its EXTI line and install `handler`
    ///
    /// The hardware steps run in a fixed order inside one critical section:
    /// SYSCFG clock, EXTICR source, edge selection, EXTI unmask, NVIC
    /// priority and enable, then the dispatch slot. Registering a pin again
    /// replaces its handler and re-routes the line.
    pub fn register_interrupt(
        &mut self,
        port: Port,
        pin: u8,
        edge: Edge,
        priority: u8,
        handler: Handler,
    ) -> Result<(), GpioError> {
        let pin = self.pin(pin)?;
        let priority = Priority::new(priority).map_err(|e| self.fail(e))?;
        if !self.is_port_initialized(port) {
            return Err(self.fail(GpioError::UninitializedPort));
        }

        let vector = Vector::for_pin(pin);
        let bit = nth(LINES::LINE0, line(pin));
        let source = nth(EXTICR::EXTI0, line(pin) % 4).val(port.exti_source());
        let bus = &self.bus;
        let table = &mut self.table;
        let exti = exti(bus);
        let nvic = nvic(bus);

        critical_section::with(|_| {
            rcc(bus).apb2enr().modify(APB2ENR::SYSCFGEN::SET);

            syscfg(bus).exticr(pin.index() / 4).modify(source);

            let (select, deselect) = match edge {
                Edge::Rising => (exti.rtsr(), exti.ftsr()),
                Edge::Falling => (exti.ftsr(), exti.rtsr()),
            };
            select.modify(bit.val(1));
            deselect.modify(bit.val(0));

            exti.imr().modify(bit.val(1));

            nvic.ipr(vector.irq())
                .write(IPR::PRIORITY.val(priority.level()));
            nvic.iser(vector.bank())
                .write(nth(NVIC_SET::IRQ0, vector.bank_slot()).val(1));

            table.register(pin, handler);
        });

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "exti: P{}{} -> {} ({}, priority {})",
            port.letter(),
            pin.index(),
            vector,
            edge,
            priority.level()
        );

        Ok(())
    }

    /// Mask `pin`'s line, drop any latched edge and empty its slot
    ///
    /// The NVIC vector stays enabled while another pin it serves still has
    /// a handler.
    pub fn unregister_interrupt(&mut self, pin: u8) -> Result<(), GpioError> {
        let pin = self.pin(pin)?;
        let vector = Vector::for_pin(pin);
        let bit = nth(LINES::LINE0, line(pin));
        let bus = &self.bus;
        let table = &mut self.table;
        let exti = exti(bus);

        critical_section::with(|_| {
            exti.imr().modify(bit.val(0));
            exti.rtsr().modify(bit.val(0));
            exti.ftsr().modify(bit.val(0));
            exti.pr().write(nth(PR_CLEAR::PR0, line(pin)).val(1));
            table.unregister(pin);

            if !table.any_registered(vector.pins()) {
                nvic(bus)
                    .icer(vector.bank())
                    .write(nth(NVIC_CLEAR::IRQ0, vector.bank_slot()).val(1));
            }
        });

        Ok(())
    }

    /// Whether `pin` currently has a handler
    pub fn is_interrupt_registered(&self, pin: u8) -> bool {
        Pin::new(pin).is_ok_and(|pin| self.table.is_registered(pin))
    }

    /// Service `vector`: call the handler of every pending line it serves
    ///
    /// Lines are visited in ascending order and each one is acknowledged
    /// after its handler returns. Returns the number of handlers invoked.
    pub fn dispatch(&self, vector: Vector) -> usize {
        let pending = ExtiPending { bus: &self.bus };
        self.table.dispatch(vector.pins(), &pending)
    }
}

impl<B: Mmio, D: DelayNs> ExternalInterrupts for Gpio<B, D> {
    type Port = Port;

    fn register_interrupt(
        &mut self,
        port: Port,
        pin: u8,
        edge: Edge,
        priority: u8,
        handler: Handler,
    ) -> Result<(), GpioError> {
        Gpio::register_interrupt(self, port, pin, edge, priority, handler)
    }

    fn unregister_interrupt(&mut self, pin: u8) -> Result<(), GpioError> {
        Gpio::unregister_interrupt(self, pin)
    }
}
