//! Diagnostic blink pattern for the halting error path
//!
//! A fault is shown on a single LED as `number` short blinks, a gap,
//! `code` short blinks and a long pause. The pattern is a plain iterator
//! of timed steps so that the chip crate only has to drive the pin.

use crate::error::GpioError;
use crate::gpio::Level;

/// Durations used by [`BlinkPattern`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlinkTiming {
    /// LED on time for one blink (ms)
    pub on_ms: u32,
    /// LED off time between blinks (ms)
    pub off_ms: u32,
    /// Pause between the number and the code (ms)
    pub gap_ms: u32,
    /// Pause before the pattern repeats (ms)
    pub pause_ms: u32,
}

impl Default for BlinkTiming {
    fn default() -> Self {
        Self {
            on_ms: 200,
            off_ms: 200,
            gap_ms: 1000,
            pause_ms: 3000,
        }
    }
}

/// One step of a blink pattern: hold `level` for `duration_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlinkStep {
    pub level: Level,
    pub duration_ms: u32,
}

/// One full cycle of the diagnostic pattern for a `(number, code)` pair
#[derive(Debug, Clone)]
pub struct BlinkPattern {
    number: u16,
    code: u16,
    timing: BlinkTiming,
    step: u32,
}

impl BlinkPattern {
    pub fn new(number: u16, code: u16, timing: BlinkTiming) -> Self {
        Self {
            number,
            code,
            timing,
            step: 0,
        }
    }

    /// Pattern for a driver error
    pub fn for_error(error: GpioError, timing: BlinkTiming) -> Self {
        Self::new(error.number(), error.code(), timing)
    }

    fn len(&self) -> u32 {
        2 * u32::from(self.number) + 1 + 2 * u32::from(self.code) + 1
    }

    fn step_at(&self, step: u32) -> BlinkStep {
        let number_steps = 2 * u32::from(self.number);
        let code_start = number_steps + 1;
        let code_end = code_start + 2 * u32::from(self.code);

        let (level, duration_ms) = if step < number_steps {
            self.pulse(step)
        } else if step == number_steps {
            (Level::Low, self.timing.gap_ms)
        } else if step < code_end {
            self.pulse(step - code_start)
        } else {
            (Level::Low, self.timing.pause_ms)
        };
        BlinkStep { level, duration_ms }
    }

    fn pulse(&self, offset: u32) -> (Level, u32) {
        if offset % 2 == 0 {
            (Level::High, self.timing.on_ms)
        } else {
            (Level::Low, self.timing.off_ms)
        }
    }
}

impl Iterator for BlinkPattern {
    type Item = BlinkStep;

    fn next(&mut self) -> Option<BlinkStep> {
        if self.step >= self.len() {
            return None;
        }
        let step = self.step_at(self.step);
        self.step += 1;
        Some(step)
    }
}
