//! PWM generator
//!
//! Takes the high channel's compare output of a pair (and the low channel's,
//! in through mode) and drives the two pins, optionally inserting dead time
//! between the complementary edges. The pair's reload timer shares the PFSR
//! register with the dead time filter.
use core::marker::PhantomData;

use super::Instance;
use crate::pac::tmr4::*;
use crate::time::{cycles_for_nanos, Hertz};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmMode {
    /// Each pin follows its own compare channel
    Through = 0,
    /// Both pins derived from the high channel with PDAR/PDBR dead time
    DeadTimer = 1,
    /// Dead timer, with pulses shorter than PFSR filtered out
    DeadTimerFilter = 2,
}

/// Output polarity of the pair's pins
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    Normal = 0,
    /// Both pins inverted
    Inverted = 1,
    /// Only the high pin inverted
    HighInverted = 2,
    /// Only the low pin inverted
    LowInverted = 3,
}

/// Dead time and filter clock: PCLK1 / 2^n
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmClockDivider {
    Div1 = 0,
    Div2 = 1,
    Div4 = 2,
    Div8 = 3,
    Div16 = 4,
    Div32 = 5,
    Div64 = 6,
    Div128 = 7,
}

/// Dead time counts for `ns` nanoseconds, rounded up so the gap never
/// shrinks below what was asked for
pub fn dead_time_counts(ns: u32, pclk: Hertz, divider: PwmClockDivider) -> u16 {
    let step = 1u64 << divider as u32;
    let counts = (cycles_for_nanos(pclk, ns) + step - 1) / step;
    counts.min(u16::MAX as u64) as u16
}

/// PWM generator of pair `PAIR` (U = 0, V = 1, W = 2)
pub struct PwmPair<TMR, const PAIR: u8> {
    regs: crate::pac::tmr4::Tmr4,
    pclk1: Hertz,
    _unit: PhantomData<TMR>,
}

impl<TMR: Instance, const PAIR: u8> PwmPair<TMR, PAIR> {
    const RCSR_SHIFT: u8 = RCSR_PAIR_SHIFT + PAIR * RCSR_PAIR_STRIDE;

    pub(super) fn new(regs: crate::pac::tmr4::Tmr4, pclk1: Hertz) -> Self {
        PwmPair {
            regs,
            pclk1,
            _unit: PhantomData,
        }
    }

    pub fn set_mode(&mut self, mode: PwmMode) {
        self.regs
            .pocr(PAIR)
            .write_field(POCR_PWMMD_MASK, POCR_PWMMD_SHIFT, mode as u16);
    }

    pub fn mode(&self) -> PwmMode {
        match self.regs.pocr(PAIR).read_field(POCR_PWMMD_MASK, POCR_PWMMD_SHIFT) {
            0 => PwmMode::Through,
            1 => PwmMode::DeadTimer,
            _ => PwmMode::DeadTimerFilter,
        }
    }

    pub fn set_polarity(&mut self, polarity: Polarity) {
        self.regs
            .pocr(PAIR)
            .write_field(POCR_LVLS_MASK, POCR_LVLS_SHIFT, polarity as u16);
    }

    pub fn set_clock_divider(&mut self, divider: PwmClockDivider) {
        self.regs
            .pocr(PAIR)
            .write_field(POCR_DIVCK_MASK, POCR_DIVCK_SHIFT, divider as u16);
    }

    pub fn clock_divider(&self) -> PwmClockDivider {
        use PwmClockDivider::*;
        match self.regs.pocr(PAIR).read_field(POCR_DIVCK_MASK, POCR_DIVCK_SHIFT) {
            0 => Div1,
            1 => Div2,
            2 => Div4,
            3 => Div8,
            4 => Div16,
            5 => Div32,
            6 => Div64,
            _ => Div128,
        }
    }

    /// Dead time in generator clock counts. `rising` delays the high pin's
    /// rising edge, `falling` the low pin's.
    pub fn set_dead_time(&mut self, rising: u16, falling: u16) {
        self.regs.pdar(PAIR).write(rising);
        self.regs.pdbr(PAIR).write(falling);
    }

    /// Dead time in nanoseconds at the current clock divider
    pub fn set_dead_time_ns(&mut self, rising: u32, falling: u32) {
        let divider = self.clock_divider();
        let a = dead_time_counts(rising, self.pclk1, divider);
        let b = dead_time_counts(falling, self.pclk1, divider);
        debug!("TMR4_{=u8} pair {=u8} dead time {=u16}/{=u16}", TMR::UNIT, PAIR, a, b);
        self.set_dead_time(a, b);
    }

    /// Minimum pulse width in [`PwmMode::DeadTimerFilter`]
    pub fn set_filter(&mut self, counts: u16) {
        self.regs.pfsr(PAIR).write(counts);
    }

    /// Starts the reload timer, which counts `counts` generator clocks and
    /// then raises its flag
    pub fn start_reload(&mut self, counts: u16) {
        self.regs.pfsr(PAIR).write(counts);
        self.regs.rcsr().set_bits(RCSR_RTE << Self::RCSR_SHIFT);
    }

    pub fn stop_reload(&mut self) {
        self.regs.rcsr().set_bits(RCSR_RTS << Self::RCSR_SHIFT);
    }

    pub fn is_reload_elapsed(&self) -> bool {
        self.regs.rcsr().is_set(RCSR_RTIF << Self::RCSR_SHIFT)
    }

    pub fn clear_reload(&mut self) {
        self.regs.rcsr().set_bits(RCSR_RTIC << Self::RCSR_SHIFT);
    }

    /// RTID masks the interrupt when set
    pub fn listen_reload(&mut self) {
        self.regs.rcsr().clear_bits(1 << (RCSR_RTID_SHIFT + PAIR));
    }

    pub fn unlisten_reload(&mut self) {
        self.regs.rcsr().set_bits(1 << (RCSR_RTID_SHIFT + PAIR));
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_parts;
    use super::*;
    use crate::time::RateExtU32;

    #[test]
    fn dead_time_rounds_up() {
        let pclk: Hertz = 100u32.MHz();
        // 10 ns per count
        assert_eq!(dead_time_counts(500, pclk, PwmClockDivider::Div1), 50);
        assert_eq!(dead_time_counts(501, pclk, PwmClockDivider::Div1), 51);
        // 80 ns per count
        assert_eq!(dead_time_counts(500, pclk, PwmClockDivider::Div8), 7);
        assert_eq!(dead_time_counts(0, pclk, PwmClockDivider::Div8), 0);
        // A clock that doesn't divide evenly still rounds up once
        let odd = Hertz::from_raw(50_000_001);
        assert_eq!(dead_time_counts(1000, odd, PwmClockDivider::Div2), 26);
        assert_eq!(dead_time_counts(1000, odd, PwmClockDivider::Div1), 51);
        assert_eq!(
            dead_time_counts(u32::MAX, pclk, PwmClockDivider::Div1),
            u16::MAX
        );
    }

    #[test]
    fn generator_control() {
        let (mut parts, regs) = test_parts();
        parts.v.set_mode(PwmMode::DeadTimerFilter);
        parts.v.set_polarity(Polarity::LowInverted);
        parts.v.set_clock_divider(PwmClockDivider::Div4);
        assert_eq!(regs.pocr(1).read(), (2 << 4) | (3 << 6) | 2);
        assert_eq!(parts.v.mode(), PwmMode::DeadTimerFilter);

        parts.v.set_dead_time_ns(1000, 400);
        assert_eq!(regs.pdar(1).read(), 25);
        assert_eq!(regs.pdbr(1).read(), 10);
        assert_eq!(regs.pocr(0).read(), 0);
    }

    #[test]
    fn reload_timer_bits() {
        let (mut parts, regs) = test_parts();
        regs.rcsr().write(0x7);
        parts.w.listen_reload();
        assert_eq!(regs.rcsr().read(), 0x3);
        parts.w.start_reload(300);
        assert_eq!(regs.pfsr(2).read(), 300);
        assert_eq!(regs.rcsr().read(), 0x3 | (RCSR_RTE << 12));

        regs.rcsr().set_bits(RCSR_RTIF << 12);
        assert!(parts.w.is_reload_elapsed());
        assert!(!parts.u.is_reload_elapsed());
        parts.u.unlisten_reload();
        assert_eq!(regs.rcsr().read() & 0x7, 0x3);
    }
}
