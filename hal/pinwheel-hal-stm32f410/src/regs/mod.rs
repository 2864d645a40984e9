//! Register access layer
//!
//! Every hardware access in this crate goes through the [`Mmio`] trait.
//! The register types below bind an address to a bus and implement the
//! `tock-registers` interfaces, so fields come from `register_bitfields!`
//! definitions in [`map`] and `modify` comes from the `ReadWriteable`
//! blanket impl. That impl needs the read and write layouts to agree, which
//! [`Aliased`] registers (write-1-to-set and write-1-to-clear) never do, so
//! they can't be read-modify-written by accident.

pub mod map;

use core::marker::PhantomData;

use tock_registers::fields::Field;
use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::RegisterLongName;

/// Memory-mapped I/O bus
///
/// Reading or writing is a hardware side effect, not a plain memory access.
/// [`Volatile`] talks to the real peripherals; host tests substitute a
/// register model.
pub trait Mmio {
    fn read_u32(&self, addr: usize) -> u32;
    fn write_u32(&self, addr: usize, value: u32);
    fn read_u8(&self, addr: usize) -> u8;
    fn write_u8(&self, addr: usize, value: u8);
}

/// Volatile accesses to the physical address space
#[derive(Debug, Clone, Copy)]
pub struct Volatile {
    _private: (),
}

impl Volatile {
    /// # Safety
    ///
    /// Must only be used on an STM32F410, where every address produced by
    /// [`map`] is a valid peripheral register.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl Mmio for Volatile {
    #[inline]
    fn read_u32(&self, addr: usize) -> u32 {
        // SAFETY: addresses come from the register map (see `Volatile::new`)
        unsafe { core::ptr::read_volatile(addr as *const u32) }
    }

    #[inline]
    fn write_u32(&self, addr: usize, value: u32) {
        // SAFETY: as above
        unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
    }

    #[inline]
    fn read_u8(&self, addr: usize) -> u8 {
        // SAFETY: as above
        unsafe { core::ptr::read_volatile(addr as *const u8) }
    }

    #[inline]
    fn write_u8(&self, addr: usize, value: u8) {
        // SAFETY: as above
        unsafe { core::ptr::write_volatile(addr as *mut u8, value) }
    }
}

macro_rules! bus_register {
    ($(#[$attr:meta])* $name:ident < $($long:ident),+ >) => {
        $(#[$attr])*
        pub struct $name<'a, B: Mmio + ?Sized, T, $($long: RegisterLongName = ()),+> {
            bus: &'a B,
            addr: usize,
            _layout: PhantomData<(T, $($long),+)>,
        }

        impl<'a, B: Mmio + ?Sized, T, $($long: RegisterLongName),+> $name<'a, B, T, $($long),+> {
            pub const fn at(bus: &'a B, addr: usize) -> Self {
                Self {
                    bus,
                    addr,
                    _layout: PhantomData,
                }
            }

            /// Absolute address of the register
            pub const fn addr(&self) -> usize {
                self.addr
            }
        }
    };
}

bus_register! {
    /// Ordinary read-write register
    ReadWrite<R>
}

bus_register! {
    /// Register the hardware never lets software change
    ReadOnly<R>
}

bus_register! {
    /// Register whose reads return nothing meaningful
    WriteOnly<R>
}

bus_register! {
    /// Register read through layout `R` and written through layout `W`
    ///
    /// Used where a written 1 sets or clears a bit and a written 0 does
    /// nothing: writing back a value that was just read would act on every
    /// bit that happened to be set.
    Aliased<R, W>
}

macro_rules! bus_word {
    ($word:ty, $read:ident, $write:ident) => {
        impl<B: Mmio + ?Sized, R: RegisterLongName> Readable for ReadWrite<'_, B, $word, R> {
            type T = $word;
            type R = R;

            #[inline]
            fn get(&self) -> $word {
                self.bus.$read(self.addr)
            }
        }

        impl<B: Mmio + ?Sized, R: RegisterLongName> Writeable for ReadWrite<'_, B, $word, R> {
            type T = $word;
            type R = R;

            #[inline]
            fn set(&self, value: $word) {
                self.bus.$write(self.addr, value)
            }
        }

        impl<B: Mmio + ?Sized, R: RegisterLongName> Readable for ReadOnly<'_, B, $word, R> {
            type T = $word;
            type R = R;

            #[inline]
            fn get(&self) -> $word {
                self.bus.$read(self.addr)
            }
        }

        impl<B: Mmio + ?Sized, R: RegisterLongName> Writeable for WriteOnly<'_, B, $word, R> {
            type T = $word;
            type R = R;

            #[inline]
            fn set(&self, value: $word) {
                self.bus.$write(self.addr, value)
            }
        }

        impl<B: Mmio + ?Sized, R: RegisterLongName, W: RegisterLongName> Readable
            for Aliased<'_, B, $word, R, W>
        {
            type T = $word;
            type R = R;

            #[inline]
            fn get(&self) -> $word {
                self.bus.$read(self.addr)
            }
        }

        impl<B: Mmio + ?Sized, R: RegisterLongName, W: RegisterLongName> Writeable
            for Aliased<'_, B, $word, R, W>
        {
            type T = $word;
            type R = W;

            #[inline]
            fn set(&self, value: $word) {
                self.bus.$write(self.addr, value)
            }
        }
    };
}

bus_word!(u32, read_u32, write_u32);
bus_word!(u8, read_u8, write_u8);

/// Copy `n` of a field that repeats at a fixed stride across a register
///
/// Per-pin registers declare only the copy for slot 0 (`MODE0`, `OT0`, ...);
/// the copy for slot `n` sits `n` field widths higher.
pub const fn nth<R: RegisterLongName>(field: Field<u32, R>, n: usize) -> Field<u32, R> {
    let width = field.mask.count_ones() as usize;
    Field::<u32, R>::new(field.mask, field.shift + width * n)
}
