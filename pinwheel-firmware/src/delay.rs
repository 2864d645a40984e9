//! Busy-wait delay
//!
//! Counts core cycles; accurate as long as `sysclk_hz` matches the clock
//! tree. Nothing else runs while it spins.

use embedded_hal::delay::DelayNs;

/// Reset clock of the STM32F410: 16 MHz HSI, no PLL
pub const HSI_HZ: u32 = 16_000_000;

pub struct CycleDelay {
    sysclk_hz: u32,
}

impl CycleDelay {
    pub const fn new(sysclk_hz: u32) -> Self {
        Self { sysclk_hz }
    }
}

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = u64::from(ns) * u64::from(self.sysclk_hz) / 1_000_000_000;
        // asm::delay takes at least one cycle per count
        cortex_m::asm::delay(cycles.max(1) as u32);
    }
}
