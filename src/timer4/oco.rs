//! Output compare
//!
//! Each output channel compares the counter against its OCCR value. What the
//! output pin does on each count event is given by the channel's mode
//! register: a 16-bit table for the high channel of a pair and a 32-bit table
//! for the low channel, which can also react to the high channel's matches
//! (linked double channel operation).
use bitfield::bitfield;
use core::marker::PhantomData;
use embedded_hal::PwmPin;

use super::Instance;
use crate::pac::tmr4::*;

/// What an output does on a count event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputAction {
    Hold = 0,
    High = 1,
    Low = 2,
    Invert = 3,
}

impl From<u8> for OutputAction {
    fn from(bits: u8) -> Self {
        match bits & 0x3 {
            0 => OutputAction::Hold,
            1 => OutputAction::High,
            2 => OutputAction::Low,
            _ => OutputAction::Invert,
        }
    }
}

impl From<OutputAction> for u8 {
    fn from(action: OutputAction) -> u8 {
        action as u8
    }
}

bitfield! {
    /// Compare mode of a high channel (OCMRxH)
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct HighCompareMode(u16);
    impl Debug;
    u16;
    /// Match flag on a down-count match
    pub flag_down, set_flag_down: 0;
    /// Match flag on a match at the peak
    pub flag_peak, set_flag_peak: 1;
    /// Match flag on an up-count match
    pub flag_up, set_flag_up: 2;
    /// Match flag on a match at zero
    pub flag_zero, set_flag_zero: 3;
    pub u8, from into OutputAction, down, set_down: 5, 4;
    pub u8, from into OutputAction, peak, set_peak: 7, 6;
    pub u8, from into OutputAction, up, set_up: 9, 8;
    pub u8, from into OutputAction, zero, set_zero: 11, 10;
    /// Peak reached without a match
    pub u8, from into OutputAction, peak_no_match, set_peak_no_match: 13, 12;
    /// Zero reached without a match
    pub u8, from into OutputAction, zero_no_match, set_zero_no_match: 15, 14;
}

bitfield! {
    /// Compare mode of a low channel (OCMRxL)
    ///
    /// The lower half mirrors [`HighCompareMode`] and applies when only the
    /// low channel matches. The upper half covers the events where the high
    /// channel of the pair matches too, or where neither does.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct LowCompareMode(u32);
    impl Debug;
    u32;
    pub flag_down, set_flag_down: 0;
    pub flag_peak, set_flag_peak: 1;
    pub flag_up, set_flag_up: 2;
    pub flag_zero, set_flag_zero: 3;
    pub u8, from into OutputAction, down, set_down: 5, 4;
    pub u8, from into OutputAction, peak, set_peak: 7, 6;
    pub u8, from into OutputAction, up, set_up: 9, 8;
    pub u8, from into OutputAction, zero, set_zero: 11, 10;
    pub u8, from into OutputAction, peak_no_match, set_peak_no_match: 13, 12;
    pub u8, from into OutputAction, zero_no_match, set_zero_no_match: 15, 14;
    /// Only the high channel matches, counting down
    pub u8, from into OutputAction, high_down, set_high_down: 17, 16;
    /// Only the high channel matches, counting up
    pub u8, from into OutputAction, high_up, set_high_up: 19, 18;
    /// Both match, counting down
    pub u8, from into OutputAction, both_down, set_both_down: 21, 20;
    pub u8, from into OutputAction, both_peak, set_both_peak: 23, 22;
    pub u8, from into OutputAction, both_up, set_both_up: 25, 24;
    pub u8, from into OutputAction, both_zero, set_both_zero: 27, 26;
    /// Neither matches, at the peak
    pub u8, from into OutputAction, neither_peak, set_neither_peak: 29, 28;
    /// Neither matches, at zero
    pub u8, from into OutputAction, neither_zero, set_neither_zero: 31, 30;
}

impl Default for HighCompareMode {
    fn default() -> Self {
        HighCompareMode(0)
    }
}

impl Default for LowCompareMode {
    fn default() -> Self {
        LowCompareMode(0)
    }
}

impl HighCompareMode {
    /// Sawtooth PWM: high at zero, low on the up-count match. The duty cycle
    /// is `OCCR / (period + 1)`.
    pub fn pwm_sawtooth() -> Self {
        let mut mode = Self::default();
        mode.set_flag_up(true);
        mode.set_zero(OutputAction::High);
        mode.set_zero_no_match(OutputAction::High);
        mode.set_up(OutputAction::Low);
        mode
    }

    /// Centre aligned PWM for the triangle counter: low while the count is
    /// above the compare value.
    pub fn pwm_triangle() -> Self {
        let mut mode = Self::default();
        mode.set_flag_up(true);
        mode.set_flag_down(true);
        mode.set_up(OutputAction::Low);
        mode.set_down(OutputAction::High);
        mode.set_zero_no_match(OutputAction::High);
        mode
    }

    /// Inverts the output on every match
    pub fn toggle() -> Self {
        let mut mode = Self::default();
        mode.set_flag_down(true);
        mode.set_flag_peak(true);
        mode.set_flag_up(true);
        mode.set_flag_zero(true);
        mode.set_down(OutputAction::Invert);
        mode.set_peak(OutputAction::Invert);
        mode.set_up(OutputAction::Invert);
        mode.set_zero(OutputAction::Invert);
        mode
    }

    pub const fn bits(&self) -> u16 {
        self.0
    }
}

impl LowCompareMode {
    /// Mirrors [`HighCompareMode::toggle`] on the low channel's own matches
    pub fn toggle() -> Self {
        let mut mode = Self::default();
        mode.set_flag_down(true);
        mode.set_flag_peak(true);
        mode.set_flag_up(true);
        mode.set_flag_zero(true);
        mode.set_down(OutputAction::Invert);
        mode.set_peak(OutputAction::Invert);
        mode.set_up(OutputAction::Invert);
        mode.set_zero(OutputAction::Invert);
        mode
    }

    /// Complement of [`HighCompareMode::pwm_sawtooth`], driven by the high
    /// channel's compare value: low at zero, high on the high channel's
    /// up-count match.
    pub fn complementary() -> Self {
        let mut mode = Self::default();
        mode.set_zero(OutputAction::Low);
        mode.set_zero_no_match(OutputAction::Low);
        mode.set_both_zero(OutputAction::Low);
        mode.set_neither_zero(OutputAction::Low);
        mode.set_high_up(OutputAction::High);
        mode.set_both_up(OutputAction::High);
        mode
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }
}

/// When a buffered value moves into the active register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferTransfer {
    /// Writes take effect immediately
    Immediate = 0,
    AtZero = 1,
    AtPeak = 2,
    AtZeroOrPeak = 3,
}

/// Output level while the channel is disabled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

/// Output compare channel of pair `PAIR`, the high or low side
pub struct Oco<TMR, const PAIR: u8, const HIGH: bool> {
    regs: crate::pac::tmr4::Tmr4,
    _unit: PhantomData<TMR>,
}

pub type OcoHigh<TMR, const PAIR: u8> = Oco<TMR, PAIR, true>;
pub type OcoLow<TMR, const PAIR: u8> = Oco<TMR, PAIR, false>;

impl<TMR: Instance, const PAIR: u8, const HIGH: bool> Oco<TMR, PAIR, HIGH> {
    /// OCCR index, UH = 0 .. WL = 5
    const INDEX: u8 = PAIR * 2 + if HIGH { 0 } else { 1 };

    pub(super) fn new(regs: crate::pac::tmr4::Tmr4) -> Self {
        Oco {
            regs,
            _unit: PhantomData,
        }
    }

    /// Picks the high or low variant of an OCSR/OCER bit
    const fn side(high: u16, low: u16) -> u16 {
        if HIGH {
            high
        } else {
            low
        }
    }

    pub fn set_compare(&mut self, value: u16) {
        self.regs.occr(Self::INDEX).write(value);
    }

    pub fn compare(&self) -> u16 {
        self.regs.occr(Self::INDEX).read()
    }

    pub fn enable(&mut self) {
        self.regs.ocsr(PAIR).set_bits(Self::side(OCSR_OCEH, OCSR_OCEL));
    }

    pub fn disable(&mut self) {
        self.regs.ocsr(PAIR).clear_bits(Self::side(OCSR_OCEH, OCSR_OCEL));
    }

    pub fn is_enabled(&self) -> bool {
        self.regs.ocsr(PAIR).is_set(Self::side(OCSR_OCEH, OCSR_OCEL))
    }

    /// Level the output starts from when enabled
    pub fn set_initial_level(&mut self, level: Level) {
        let bit = Self::side(OCSR_OCPH, OCSR_OCPL);
        match level {
            Level::High => self.regs.ocsr(PAIR).set_bits(bit),
            Level::Low => self.regs.ocsr(PAIR).clear_bits(bit),
        }
    }

    pub fn listen(&mut self) {
        self.regs.ocsr(PAIR).set_bits(Self::side(OCSR_OCIEH, OCSR_OCIEL));
    }

    pub fn unlisten(&mut self) {
        self.regs.ocsr(PAIR).clear_bits(Self::side(OCSR_OCIEH, OCSR_OCIEL));
    }

    pub fn is_match(&self) -> bool {
        self.regs.ocsr(PAIR).is_set(Self::side(OCSR_OCFH, OCSR_OCFL))
    }

    /// Flags clear on writing zero
    pub fn clear_flag(&mut self) {
        self.regs.ocsr(PAIR).clear_bits(Self::side(OCSR_OCFH, OCSR_OCFL));
    }

    /// Buffering of the compare value
    pub fn set_compare_buffer(&mut self, transfer: BufferTransfer) {
        let shift = if HIGH {
            OCER_CHBUFEN_SHIFT
        } else {
            OCER_CLBUFEN_SHIFT
        };
        self.regs
            .ocer(PAIR)
            .write_field(OCER_BUF_MASK << shift, shift, transfer as u16);
    }

    /// Buffering of the compare mode
    pub fn set_mode_buffer(&mut self, transfer: BufferTransfer) {
        let shift = if HIGH {
            OCER_MHBUFEN_SHIFT
        } else {
            OCER_MLBUFEN_SHIFT
        };
        self.regs
            .ocer(PAIR)
            .write_field(OCER_BUF_MASK << shift, shift, transfer as u16);
    }

    /// Holds buffer transfers back while the counter interrupt mask count is
    /// non-zero, so values move only together with unmasked interrupts
    pub fn link_to_mask_counter(&mut self, compare: bool, mode: bool) {
        let ocer = self.regs.ocer(PAIR);
        let compare_bit = Self::side(OCER_LMCH, OCER_LMCL);
        let mode_bit = Self::side(OCER_LMMH, OCER_LMML);
        ocer.modify(|v| {
            let mut v = v & !(compare_bit | mode_bit);
            if compare {
                v |= compare_bit;
            }
            if mode {
                v |= mode_bit;
            }
            v
        });
    }

    /// Extends the match condition so a compare value the counter skips past
    /// while the period shrinks still matches
    pub fn set_extended_match(&mut self, enable: bool) {
        let bit = Self::side(OCER_MCECH, OCER_MCECL);
        if enable {
            self.regs.ocer(PAIR).set_bits(bit);
        } else {
            self.regs.ocer(PAIR).clear_bits(bit);
        }
    }
}

impl<TMR: Instance, const PAIR: u8> Oco<TMR, PAIR, true> {
    pub fn set_mode(&mut self, mode: HighCompareMode) {
        self.regs.ocmrh(PAIR).write(mode.bits());
    }

    pub fn mode(&self) -> HighCompareMode {
        HighCompareMode(self.regs.ocmrh(PAIR).read())
    }
}

impl<TMR: Instance, const PAIR: u8> Oco<TMR, PAIR, false> {
    pub fn set_mode(&mut self, mode: LowCompareMode) {
        self.regs.ocmrl(PAIR).write(mode.bits());
    }

    pub fn mode(&self) -> LowCompareMode {
        LowCompareMode(self.regs.ocmrl(PAIR).read())
    }
}

/// Sawtooth PWM on a high channel. Duty is the compare value against the
/// counter period.
impl<TMR: Instance, const PAIR: u8> PwmPin for Oco<TMR, PAIR, true> {
    type Duty = u16;

    fn disable(&mut self) {
        Oco::disable(self);
    }

    fn enable(&mut self) {
        self.set_mode(HighCompareMode::pwm_sawtooth());
        Oco::enable(self);
    }

    fn get_duty(&self) -> u16 {
        self.compare()
    }

    fn get_max_duty(&self) -> u16 {
        self.regs.cpsr().read()
    }

    fn set_duty(&mut self, duty: u16) {
        self.set_compare(duty);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_parts;
    use super::*;

    #[test]
    fn high_mode_fields() {
        let mut mode = HighCompareMode::default();
        mode.set_down(OutputAction::Invert);
        assert_eq!(mode.bits(), 3 << OCMR_OPDC_SHIFT);
        mode.set_zero_no_match(OutputAction::Low);
        assert_eq!(mode.bits(), (3 << 4) | (2 << OCMR_OPNZR_SHIFT));
        assert_eq!(mode.zero_no_match(), OutputAction::Low);
        assert_eq!(mode.peak(), OutputAction::Hold);

        let pwm = HighCompareMode::pwm_sawtooth();
        assert_eq!(
            pwm.bits() as u32,
            OCMR_OCFUC
                | (2 << OCMR_OPUC_SHIFT)
                | (1 << OCMR_OPZR_SHIFT)
                | (1 << OCMR_OPNZR_SHIFT)
        );
    }

    #[test]
    fn low_mode_linked_fields() {
        let mut mode = LowCompareMode::default();
        mode.set_high_down(OutputAction::High);
        assert_eq!(mode.bits(), 1 << OCMRL_EOPNDC_SHIFT);
        mode.set_neither_zero(OutputAction::Invert);
        assert_eq!(mode.bits(), (1 << 16) | (3 << OCMRL_EOPNZR_SHIFT));

        let comp = LowCompareMode::complementary();
        assert_eq!(
            comp.bits(),
            (2 << OCMR_OPZR_SHIFT)
                | (2 << OCMR_OPNZR_SHIFT)
                | (1 << OCMRL_EOPNUC_SHIFT)
                | (1 << OCMRL_EOPUC_SHIFT)
                | (2 << OCMRL_EOPZR_SHIFT)
                | (2 << OCMRL_EOPNZR_SHIFT)
        );
        assert_eq!(comp.both_up(), OutputAction::High);
        assert_eq!(comp.high_down(), OutputAction::Hold);
    }

    #[test]
    fn toggle_inverts_on_every_match() {
        let mode = HighCompareMode::toggle();
        assert_eq!(mode.bits(), 0x0FFF);
        assert_eq!(LowCompareMode::toggle().bits(), 0x0FFF);
    }

    #[test]
    fn channel_registers() {
        let (mut parts, regs) = test_parts();
        parts.vl.set_compare(1234);
        assert_eq!(regs.occr(3).read(), 1234);

        parts.vl.enable();
        parts.vl.set_initial_level(Level::High);
        parts.vh.listen();
        assert_eq!(regs.ocsr(1).read(), OCSR_OCEL | OCSR_OCPL | OCSR_OCIEH);

        parts.vl.set_compare_buffer(BufferTransfer::AtZeroOrPeak);
        parts.vh.set_mode_buffer(BufferTransfer::AtPeak);
        parts.vl.link_to_mask_counter(true, false);
        assert_eq!(
            regs.ocer(1).read(),
            (3 << OCER_CLBUFEN_SHIFT) | (2 << OCER_MHBUFEN_SHIFT) | OCER_LMCL
        );

        parts.vl.set_mode(LowCompareMode::complementary());
        assert_eq!(regs.ocmrl(1).read(), LowCompareMode::complementary().bits());
        assert_eq!(parts.vl.mode(), LowCompareMode::complementary());
    }

    #[test]
    fn pwm_pin_on_high_channel() {
        let (mut parts, regs) = test_parts();
        parts.counter.set_period(999);
        parts.wh.set_duty(250);
        PwmPin::enable(&mut parts.wh);
        assert_eq!(regs.occr(4).read(), 250);
        assert_eq!(regs.ocmrh(2).read(), HighCompareMode::pwm_sawtooth().bits());
        assert_eq!(regs.ocsr(2).read(), OCSR_OCEH);
        assert_eq!(parts.wh.get_max_duty(), 999);
        PwmPin::disable(&mut parts.wh);
        assert_eq!(regs.ocsr(2).read(), 0);
    }
}
