//! Register model for host tests
//!
//! `FakeBus` stores registers in a map and imitates the hardware behavior
//! the driver relies on: IDR follows ODR on output pins, BSRR sets and
//! resets ODR bits, EXTI_PR and NVIC_ICER/ICPR clear on 1, NVIC_ISER/ISPR
//! set on 1. Every write is logged so tests can check ordering.

use core::cell::{Cell, RefCell};

use embedded_hal::delay::DelayNs;
use heapless::{FnvIndexMap, Vec};
use pinwheel_hal::{Level, Pin};

use crate::gpio::Port;
use crate::regs::map::{exti, nvic};
use crate::regs::Mmio;

pub(crate) const LOG_CAPACITY: usize = 256;

#[derive(Default)]
pub(crate) struct FakeBus {
    words: RefCell<FnvIndexMap<usize, u32, 128>>,
    /// Levels applied to the pins from outside, keyed by IDR address
    inputs: RefCell<FnvIndexMap<usize, u32, 8>>,
    log: RefCell<Vec<(usize, u32), LOG_CAPACITY>>,
    writes: Cell<usize>,
    read_hook: RefCell<Option<(usize, Box<dyn FnOnce()>)>>,
}

impl FakeBus {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn load(&self, addr: usize) -> u32 {
        self.words.borrow().get(&addr).copied().unwrap_or(0)
    }

    fn store(&self, addr: usize, value: u32) {
        self.words
            .borrow_mut()
            .insert(addr, value)
            .expect("fake register map full");
    }

    /// Raw register value, bypassing the hardware model
    pub(crate) fn peek(&self, addr: usize) -> u32 {
        self.load(addr & !0b11)
    }

    /// Number of writes issued so far
    pub(crate) fn write_count(&self) -> usize {
        self.writes.get()
    }

    /// Addresses written, in order
    pub(crate) fn written_addrs(&self) -> Vec<usize, LOG_CAPACITY> {
        self.log.borrow().iter().map(|&(addr, _)| addr).collect()
    }

    /// Run `hook` once, the next time `addr` is read
    pub(crate) fn on_next_read(&self, addr: usize, hook: impl FnOnce() + 'static) {
        *self.read_hook.borrow_mut() = Some((addr, Box::new(hook)));
    }

    fn run_read_hook(&self, addr: usize) {
        let hook = {
            let mut slot = self.read_hook.borrow_mut();
            match slot.take() {
                Some((at, hook)) if at == addr => Some(hook),
                other => {
                    *slot = other;
                    None
                }
            }
        };
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Drive an input pin from outside
    pub(crate) fn set_input(&self, port: Port, pin: Pin, level: Level) {
        let addr = port.registers(self).idr().addr();
        let bit = 1 << pin.index();
        let mut inputs = self.inputs.borrow_mut();
        let current = inputs.get(&addr).copied().unwrap_or(0);
        let next = match level {
            Level::High => current | bit,
            Level::Low => current & !bit,
        };
        inputs.insert(addr, next).expect("fake input map full");
    }

    /// Latch an edge on `pin`'s EXTI line
    pub(crate) fn raise_pending(&self, pin: Pin) {
        let addr = exti(self).pr().addr();
        self.store(addr, self.load(addr) | (1 << pin.index()));
    }

    fn port_of_idr(&self, addr: usize) -> Option<Port> {
        Port::ALL
            .into_iter()
            .find(|port| port.registers(self).idr().addr() == addr)
    }

    fn port_of_bsrr(&self, addr: usize) -> Option<Port> {
        Port::ALL
            .into_iter()
            .find(|port| port.registers(self).bsrr().addr() == addr)
    }

    fn output_mask(moder: u32) -> u32 {
        (0u32..16)
            .filter(|pin| (moder >> (pin * 2)) & 0b11 == 0b01)
            .fold(0, |mask, pin| mask | (1 << pin))
    }

    fn is_bank(addr: usize, base: usize) -> bool {
        (base..base + 0x20).contains(&addr)
    }
}

impl Mmio for FakeBus {
    fn read_u32(&self, addr: usize) -> u32 {
        self.run_read_hook(addr);
        if let Some(port) = self.port_of_idr(addr) {
            let regs = port.registers(self);
            let outputs = Self::output_mask(self.load(regs.moder().addr()));
            let external = self.inputs.borrow().get(&addr).copied().unwrap_or(0);
            return (self.load(regs.odr().addr()) & outputs) | (external & !outputs);
        }
        let nvic = nvic(self);
        if Self::is_bank(addr, nvic.icer(0).addr()) {
            // ICER reads back the enable state
            return self.load(addr - 0x80);
        }
        if Self::is_bank(addr, nvic.icpr(0).addr()) {
            return self.load(addr - 0x80);
        }
        self.load(addr)
    }

    fn write_u32(&self, addr: usize, value: u32) {
        self.writes.set(self.writes.get() + 1);
        let _ = self.log.borrow_mut().push((addr, value));

        let nvic = nvic(self);
        if let Some(port) = self.port_of_bsrr(addr) {
            let odr = port.registers(self).odr().addr();
            let reset = value >> 16;
            let set = value & 0xFFFF;
            self.store(odr, (self.load(odr) & !reset) | set);
        } else if addr == exti(self).pr().addr() {
            self.store(addr, self.load(addr) & !value);
        } else if Self::is_bank(addr, nvic.iser(0).addr())
            || Self::is_bank(addr, nvic.ispr(0).addr())
        {
            self.store(addr, self.load(addr) | value);
        } else if Self::is_bank(addr, nvic.icer(0).addr())
            || Self::is_bank(addr, nvic.icpr(0).addr())
        {
            let target = addr - 0x80;
            self.store(target, self.load(target) & !value);
        } else {
            self.store(addr, value);
        }
    }

    fn read_u8(&self, addr: usize) -> u8 {
        let shift = (addr & 0b11) * 8;
        (self.load(addr & !0b11) >> shift) as u8
    }

    fn write_u8(&self, addr: usize, value: u8) {
        self.writes.set(self.writes.get() + 1);
        let _ = self.log.borrow_mut().push((addr, u32::from(value)));

        let word = addr & !0b11;
        let shift = (addr & 0b11) * 8;
        let current = self.load(word) & !(0xFF << shift);
        self.store(word, current | (u32::from(value) << shift));
    }
}

/// Delay that only accumulates the requested time
#[derive(Default)]
pub(crate) struct FakeDelay {
    pub(crate) elapsed_ns: u64,
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += u64::from(ns);
    }
}
