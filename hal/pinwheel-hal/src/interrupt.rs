//! External interrupt types and the per-pin dispatch table
//!
//! Several pins can share one hardware interrupt vector. The dispatch table
//! is keyed by exact pin index so that a shared vector can tell its pins
//! apart by their pending flags and call the right handler for each.

use crate::error::GpioError;
use crate::gpio::{Pin, PIN_COUNT};

/// Trigger edge for an external interrupt line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Rising,
    Falling,
}

impl TryFrom<u8> for Edge {
    type Error = GpioError;

    /// `1` selects the rising edge and `0` the falling edge
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Edge::Falling),
            1 => Ok(Edge::Rising),
            _ => Err(GpioError::InvalidTriggerEdge),
        }
    }
}

/// Number of priority bits implemented by the Cortex-M4 NVIC on STM32F4 parts
pub const PRIORITY_BITS: u8 = 4;

/// Interrupt priority level
///
/// Lower values are more urgent. Only [`PRIORITY_BITS`] bits of the 8-bit
/// hardware field are implemented, so levels run 0..=15.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Priority(u8);

impl Priority {
    /// Least urgent level
    pub const LOWEST: Priority = Priority((1 << PRIORITY_BITS) - 1);
    /// Most urgent level
    pub const HIGHEST: Priority = Priority(0);

    pub const fn new(level: u8) -> Result<Self, GpioError> {
        if level < (1 << PRIORITY_BITS) {
            Ok(Self(level))
        } else {
            Err(GpioError::InvalidPriority)
        }
    }

    pub const fn level(self) -> u8 {
        self.0
    }
}

/// Callback invoked when a registered pin's interrupt fires
///
/// Handlers run in interrupt context with no caller to keep borrowed data
/// alive, so they are stored as `&'static` references. Any `Fn() + Sync`
/// closure or function pointer is a handler.
pub trait InterruptHandler: Sync {
    fn on_interrupt(&self);
}

impl<F> InterruptHandler for F
where
    F: Fn() + Sync,
{
    fn on_interrupt(&self) {
        self()
    }
}

/// Handler reference stored in a dispatch slot
pub type Handler = &'static dyn InterruptHandler;

/// Access to the per-line pending flags of an interrupt controller
pub trait PendingFlags {
    /// Whether an edge was detected on `pin`'s line
    fn is_pending(&self, pin: Pin) -> bool;

    /// Acknowledge `pin`'s line only, leaving every other flag untouched
    fn clear(&self, pin: Pin);
}

/// Fixed table of one optional handler per pin index
pub struct DispatchTable {
    slots: [Option<Handler>; PIN_COUNT as usize],
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchTable {
    /// Create an empty table
    pub const fn new() -> Self {
        Self {
            slots: [None; PIN_COUNT as usize],
        }
    }

    /// Store `handler` for `pin`, returning the handler it replaced
    pub fn register(&mut self, pin: Pin, handler: Handler) -> Option<Handler> {
        self.slots[pin.index() as usize].replace(handler)
    }

    /// Empty the slot for `pin`, returning the removed handler
    pub fn unregister(&mut self, pin: Pin) -> Option<Handler> {
        self.slots[pin.index() as usize].take()
    }

    pub fn is_registered(&self, pin: Pin) -> bool {
        self.slots[pin.index() as usize].is_some()
    }

    /// Whether any of `pins` has a handler
    pub fn any_registered(&self, pins: impl IntoIterator<Item = Pin>) -> bool {
        pins.into_iter().any(|pin| self.is_registered(pin))
    }

    /// Service every pending line among `pins`
    ///
    /// Pins are visited in the order given. For each pending pin the handler
    /// runs first and the flag is cleared afterwards, so an edge arriving
    /// while the handler runs raises the vector again. A pending line with
    /// an empty slot is acknowledged without calling anything.
    ///
    /// Returns the number of handlers invoked.
    pub fn dispatch<F>(&self, pins: impl IntoIterator<Item = Pin>, flags: &F) -> usize
    where
        F: PendingFlags + ?Sized,
    {
        let mut invoked = 0;
        for pin in pins {
            if !flags.is_pending(pin) {
                continue;
            }
            if let Some(handler) = self.slots[pin.index() as usize] {
                handler.on_interrupt();
                invoked += 1;
            }
            flags.clear(pin);
        }
        invoked
    }
}

/// External interrupt registration contract
pub trait ExternalInterrupts {
    /// Port identifier for the chip
    type Port: Copy;

    /// Route `port`'s `pin` to its interrupt line and install `handler`
    fn register_interrupt(
        &mut self,
        port: Self::Port,
        pin: u8,
        edge: Edge,
        priority: u8,
        handler: Handler,
    ) -> Result<(), GpioError>;

    /// Mask `pin`'s interrupt line and empty its dispatch slot
    fn unregister_interrupt(&mut self, pin: u8) -> Result<(), GpioError>;
}
