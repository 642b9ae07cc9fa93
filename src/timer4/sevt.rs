//! Special events
//!
//! Six channels that raise a trigger (usually an ADC start) when the counter
//! hits their SCCR value, or a programmed delay after an output compare
//! match.
use core::marker::PhantomData;

use super::oco::BufferTransfer;
use super::Instance;
use crate::pac::tmr4::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SevtMode {
    /// Fires when the counter equals SCCR
    Compare,
    /// Fires SCCR counts after the matching output compare event
    Delay,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SevtConfig {
    /// Buffering of the SCCR value
    pub buffer: BufferTransfer,
    /// Trigger output line, 0..=5
    pub output_event: u8,
    pub mode: SevtMode,
    /// In delay mode, start from the OCCR match of the same channel instead
    /// of the counter event
    pub delay_from_occr: bool,
    pub down_count: bool,
    pub peak: bool,
    pub up_count: bool,
    pub zero: bool,
    /// Hold buffer transfers while the counter's interrupt mask is active
    pub mask_link: bool,
}

impl Default for SevtConfig {
    fn default() -> Self {
        Self {
            buffer: BufferTransfer::Immediate,
            output_event: 0,
            mode: SevtMode::Compare,
            delay_from_occr: false,
            down_count: false,
            peak: false,
            up_count: true,
            zero: false,
            mask_link: false,
        }
    }
}

pub struct SpecialEvent<TMR, const CH: u8> {
    regs: crate::pac::tmr4::Tmr4,
    _unit: PhantomData<TMR>,
}

impl<TMR: Instance, const CH: u8> SpecialEvent<TMR, CH> {
    pub(super) fn new(regs: crate::pac::tmr4::Tmr4) -> Self {
        SpecialEvent {
            regs,
            _unit: PhantomData,
        }
    }

    pub fn set_compare(&mut self, value: u16) {
        self.regs.sccr(CH).write(value);
    }

    pub fn compare(&self) -> u16 {
        self.regs.sccr(CH).read()
    }

    pub fn configure(&mut self, config: &SevtConfig) {
        assert!(config.output_event <= 5);
        let mut value = ((config.buffer as u16) << SCSR_BUFEN_SHIFT)
            | ((config.output_event as u16) << SCSR_EVTOS_SHIFT);
        for (enabled, bit) in [
            (config.mask_link, SCSR_LMC),
            (config.mode == SevtMode::Delay, SCSR_EVTMS),
            (config.delay_from_occr, SCSR_EVTDS),
            (config.down_count, SCSR_DEN),
            (config.peak, SCSR_PEN),
            (config.up_count, SCSR_UEN),
            (config.zero, SCSR_ZEN),
        ] {
            if enabled {
                value |= bit;
            }
        }
        self.regs.scsr(CH).write(value);
        trace!("TMR4_{=u8} sevt {=u8} scsr {=u16:#x}", TMR::UNIT, CH, value);
    }

    /// Fires only on every `count + 1`-th zero and/or peak event. `count` 0
    /// disables masking.
    pub fn set_mask(&mut self, count: u8, zero: bool, peak: bool) {
        assert!(count < 16);
        let mut value = count as u16 & SCMR_AMC_MASK;
        if zero {
            value |= SCMR_MZCE;
        }
        if peak {
            value |= SCMR_MPCE;
        }
        self.regs.scmr(CH).write(value);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_parts;
    use super::*;

    #[test]
    fn compare_mode_on_up_count() {
        let (mut parts, regs) = test_parts();
        parts.sevt_vl.set_compare(600);
        parts.sevt_vl.configure(&SevtConfig {
            output_event: 2,
            ..Default::default()
        });
        assert_eq!(regs.sccr(3).read(), 600);
        assert_eq!(regs.scsr(3).read(), (2 << 2) | SCSR_UEN);
        assert_eq!(regs.scsr(0).read(), 0);
    }

    #[test]
    fn delay_mode_and_mask() {
        let (mut parts, regs) = test_parts();
        parts.sevt_wl.configure(&SevtConfig {
            buffer: BufferTransfer::AtZero,
            output_event: 5,
            mode: SevtMode::Delay,
            delay_from_occr: true,
            down_count: true,
            peak: true,
            up_count: false,
            zero: true,
            mask_link: true,
        });
        assert_eq!(
            regs.scsr(5).read(),
            1 | (5 << 2) | SCSR_LMC | SCSR_EVTMS | SCSR_EVTDS | SCSR_DEN | SCSR_PEN | SCSR_ZEN
        );

        parts.sevt_wl.set_mask(3, true, false);
        assert_eq!(regs.scmr(5).read(), 3 | SCMR_MZCE);
    }

    #[test]
    #[should_panic]
    fn output_event_out_of_range() {
        let (mut parts, _) = test_parts();
        parts.sevt_uh.configure(&SevtConfig {
            output_event: 6,
            ..Default::default()
        });
    }
}
