//! Delays
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;
pub use embedded_hal::blocking::delay::{DelayMs, DelayUs};

use crate::clock::Clocks;
use crate::time::{cycles_for_micros, Hertz};

/// SysTick reload register width
const MAX_RVR: u32 = 0x00FF_FFFF;

/// System timer (SysTick) as a delay provider
pub struct Delay {
    syst: SYST,
    hclk: Hertz,
}

impl Delay {
    /// Configures the system timer (SysTick) as a delay provider, counting
    /// core clock cycles
    pub fn new(mut syst: SYST, clocks: &Clocks) -> Self {
        syst.set_clock_source(SystClkSource::Core);
        syst.disable_interrupt();
        syst.disable_counter();

        Delay {
            syst,
            hclk: clocks.hclk,
        }
    }

    /// Releases the system timer (SysTick) resource
    pub fn free(self) -> SYST {
        self.syst
    }

    fn delay_cycles(&mut self, mut cycles: u64) {
        while cycles != 0 {
            let chunk = cycles.min(MAX_RVR as u64) as u32;
            // A reload of 0 never wraps
            self.syst.set_reload(chunk.max(2) - 1);
            self.syst.clear_current();
            self.syst.enable_counter();
            while !self.syst.has_wrapped() {}
            self.syst.disable_counter();
            cycles -= chunk as u64;
        }
    }
}

impl DelayUs<u32> for Delay {
    fn delay_us(&mut self, us: u32) {
        let cycles = cycles_for_micros(self.hclk, us);
        self.delay_cycles(cycles);
    }
}

impl DelayUs<u16> for Delay {
    fn delay_us(&mut self, us: u16) {
        self.delay_us(us as u32);
    }
}

impl DelayUs<u8> for Delay {
    fn delay_us(&mut self, us: u8) {
        self.delay_us(us as u32);
    }
}

impl DelayMs<u32> for Delay {
    fn delay_ms(&mut self, ms: u32) {
        // Split so the microsecond count can't overflow
        for _ in 0..ms / 1_000 {
            self.delay_us(1_000_000u32);
        }
        self.delay_us((ms % 1_000) * 1_000);
    }
}

impl DelayMs<u16> for Delay {
    fn delay_ms(&mut self, ms: u16) {
        self.delay_ms(ms as u32);
    }
}

impl DelayMs<u8> for Delay {
    fn delay_ms(&mut self, ms: u8) {
        self.delay_ms(ms as u32);
    }
}
