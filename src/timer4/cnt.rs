//! Counter
use core::marker::PhantomData;

use super::Instance;
use crate::pac::tmr4::*;
use crate::time::Hertz;

/// Count waveform
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CountMode {
    /// Counts up to the period, then restarts at zero
    Sawtooth,
    /// Counts up to the period, then back down to zero
    Triangle,
}

/// Counter clock: PCLK1 / 2^n
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CounterDivider {
    Div1 = 0,
    Div2 = 1,
    Div4 = 2,
    Div8 = 3,
    Div16 = 4,
    Div32 = 5,
    Div64 = 6,
    Div128 = 7,
    Div256 = 8,
    Div512 = 9,
    Div1024 = 10,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CounterEvent {
    /// Counter reached zero (underflow in triangle mode)
    Zero,
    /// Counter reached the period value
    Peak,
}

impl CounterEvent {
    /// (interrupt enable, flag)
    fn bits(self) -> (u16, u16) {
        match self {
            CounterEvent::Zero => (CCSR_IRQZEN, CCSR_IRQZF),
            CounterEvent::Peak => (CCSR_IRQPEN, CCSR_IRQPF),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CounterConfig {
    pub mode: CountMode,
    pub divider: CounterDivider,
    /// Peak value written to CPSR
    pub period: u16,
    /// Period writes take effect at the next zero
    pub buffered_period: bool,
    /// Zero events skipped between interrupts, 0..=15
    pub zero_mask: u8,
    /// Peak events skipped between interrupts, 0..=15
    pub peak_mask: u8,
    /// Count the external clock input instead of PCLK1
    pub external_clock: bool,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            mode: CountMode::Sawtooth,
            divider: CounterDivider::Div1,
            period: 0xFFFF,
            buffered_period: false,
            zero_mask: 0,
            peak_mask: 0,
            external_clock: false,
        }
    }
}

pub struct Counter<TMR> {
    regs: crate::pac::tmr4::Tmr4,
    pclk1: Hertz,
    _unit: PhantomData<TMR>,
}

impl<TMR: Instance> Counter<TMR> {
    pub(super) fn new(regs: crate::pac::tmr4::Tmr4, pclk1: Hertz) -> Self {
        Counter {
            regs,
            pclk1,
            _unit: PhantomData,
        }
    }

    /// Applies `config` with the counter stopped and cleared. Interrupt
    /// enables survive.
    pub fn configure(&mut self, config: &CounterConfig) {
        assert!(config.zero_mask < 16 && config.peak_mask < 16);
        let ccsr = self.regs.ccsr();
        let mut value = (ccsr.read() & (CCSR_IRQZEN | CCSR_IRQPEN))
            | CCSR_STOP
            | CCSR_CLEAR
            | ((config.divider as u16) << CCSR_CKDIV_SHIFT);
        if config.mode == CountMode::Triangle {
            value |= CCSR_MODE;
        }
        if config.buffered_period {
            value |= CCSR_BUFEN;
        }
        if config.external_clock {
            value |= CCSR_ECKEN;
        }
        ccsr.write(value);
        self.regs.cpsr().write(config.period);
        self.regs.cvpr().write(
            ((config.zero_mask as u16) << CVPR_ZIM_SHIFT)
                | ((config.peak_mask as u16) << CVPR_PIM_SHIFT),
        );
        debug!(
            "TMR4_{=u8} period {=u16} div {=u8}",
            TMR::UNIT,
            config.period,
            config.divider as u8
        );
    }

    pub fn set_period(&mut self, period: u16) {
        self.regs.cpsr().write(period);
    }

    pub fn period(&self) -> u16 {
        self.regs.cpsr().read()
    }

    pub fn count(&self) -> u16 {
        self.regs.cntr().read()
    }

    pub fn mode(&self) -> CountMode {
        if self.regs.ccsr().is_set(CCSR_MODE) {
            CountMode::Triangle
        } else {
            CountMode::Sawtooth
        }
    }

    /// Counter clock after the divider
    pub fn count_frequency(&self) -> Hertz {
        let div = self.regs.ccsr().read_field(CCSR_CKDIV_MASK, CCSR_CKDIV_SHIFT);
        Hertz::from_raw(self.pclk1.raw() >> div)
    }

    /// Frequency of one full counter cycle (zero to zero)
    pub fn cycle_frequency(&self) -> Hertz {
        let ticks = match self.mode() {
            CountMode::Sawtooth => self.period() as u32 + 1,
            CountMode::Triangle => 2 * self.period() as u32,
        };
        Hertz::from_raw(self.count_frequency().raw() / ticks.max(1))
    }

    pub fn start(&mut self) {
        self.regs.ccsr().clear_bits(CCSR_STOP);
    }

    pub fn stop(&mut self) {
        self.regs.ccsr().set_bits(CCSR_STOP);
    }

    pub fn is_running(&self) -> bool {
        !self.regs.ccsr().is_set(CCSR_STOP)
    }

    /// Resets the count to zero
    pub fn clear(&mut self) {
        self.regs.ccsr().set_bits(CCSR_CLEAR);
    }

    pub fn listen(&mut self, event: CounterEvent) {
        self.regs.ccsr().set_bits(event.bits().0);
    }

    pub fn unlisten(&mut self, event: CounterEvent) {
        self.regs.ccsr().clear_bits(event.bits().0);
    }

    pub fn is_pending(&self, event: CounterEvent) -> bool {
        self.regs.ccsr().is_set(event.bits().1)
    }

    /// Flags clear on writing zero
    pub fn clear_flag(&mut self, event: CounterEvent) {
        self.regs.ccsr().clear_bits(event.bits().1);
    }

    /// Events masked since the last interrupt
    pub fn masked_count(&self, event: CounterEvent) -> u8 {
        let cvpr = self.regs.cvpr();
        let count = match event {
            CounterEvent::Zero => cvpr.read_field(CVPR_ZIC_MASK, CVPR_ZIC_SHIFT),
            CounterEvent::Peak => cvpr.read_field(CVPR_PIC_MASK, CVPR_PIC_SHIFT),
        };
        count as u8
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_parts;
    use super::*;

    #[test]
    fn configure_triangle_counter() {
        let (mut parts, regs) = test_parts();
        parts.counter.listen(CounterEvent::Zero);
        parts.counter.configure(&CounterConfig {
            mode: CountMode::Triangle,
            divider: CounterDivider::Div4,
            period: 5000,
            buffered_period: true,
            zero_mask: 3,
            peak_mask: 15,
            external_clock: false,
        });
        assert_eq!(
            regs.ccsr().read(),
            CCSR_IRQZEN | CCSR_STOP | CCSR_CLEAR | CCSR_MODE | CCSR_BUFEN | 2
        );
        assert_eq!(regs.cpsr().read(), 5000);
        assert_eq!(regs.cvpr().read(), 3 | (15 << 4));

        // 100 MHz / 4 / (2 * 5000)
        assert_eq!(parts.counter.cycle_frequency().raw(), 2500);
        assert!(!parts.counter.is_running());
        parts.counter.start();
        assert!(parts.counter.is_running());
    }

    #[test]
    fn flags_and_mask_counts() {
        let (mut parts, regs) = test_parts();
        regs.ccsr().write(CCSR_IRQPF | CCSR_IRQZF);
        assert!(parts.counter.is_pending(CounterEvent::Peak));
        parts.counter.clear_flag(CounterEvent::Peak);
        assert!(!parts.counter.is_pending(CounterEvent::Peak));
        assert!(parts.counter.is_pending(CounterEvent::Zero));

        regs.cvpr().write(7 << CVPR_ZIC_SHIFT | 2 << CVPR_PIC_SHIFT);
        assert_eq!(parts.counter.masked_count(CounterEvent::Zero), 7);
        assert_eq!(parts.counter.masked_count(CounterEvent::Peak), 2);
    }
}
