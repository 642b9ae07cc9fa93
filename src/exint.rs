//! External interrupt channels (EIRQ0..15)
//!
//! Every pin can raise the external interrupt channel equal to its pin
//! number once `PCR.INTE` is set, so PA3, PB3 ... all share EIRQ3. The
//! channel's edge and filter live in the interrupt controller.

use crate::gpio::{Input, Pin};
use crate::interrupt::Interrupts;
use crate::pac::intc::*;
use crate::pac::port::PCR_INTE;
use crate::pac::INTC;

pub const CHANNELS: u8 = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    Falling = 0,
    Rising = 1,
    Both = 2,
    LowLevel = 3,
}

/// Digital filter sampling clock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterClock {
    Pclk3 = 0,
    Pclk3Div8 = 1,
    Pclk3Div32 = 2,
    Pclk3Div64 = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExintConfig {
    pub trigger: Trigger,
    pub filter: Option<FilterClock>,
}

impl Default for ExintConfig {
    fn default() -> Self {
        Self {
            trigger: Trigger::Falling,
            filter: None,
        }
    }
}

fn configure(regs: Intc, ch: u8, config: ExintConfig) {
    assert!(ch < CHANNELS);
    let mut value = (config.trigger as u32) << EIRQCR_EIRQTRG_SHIFT;
    if let Some(clock) = config.filter {
        value |= EIRQCR_EFEN | ((clock as u32) << EIRQCR_EISMPCLK_SHIFT);
    }
    regs.eirqcr(ch).write(value);
}

fn pending(regs: Intc, ch: u8) -> bool {
    assert!(ch < CHANNELS);
    regs.eifr().is_set(1 << ch)
}

fn clear_flag(regs: Intc, ch: u8) {
    assert!(ch < CHANNELS);
    regs.eifcr().write(1 << ch);
}

impl Interrupts {
    /// Sets edge and filter of channel `ch`.
    pub fn configure_exint(&mut self, ch: u8, config: ExintConfig) {
        configure(self.regs(), ch, config);
    }

    /// Lets channel `ch` wake the chip from stop mode.
    pub fn set_exint_wakeup(&mut self, ch: u8, enable: bool) {
        assert!(ch < CHANNELS);
        let wupen = self.regs().wupen();
        if enable {
            wupen.set_bits(1 << ch);
        } else {
            wupen.clear_bits(1 << ch);
        }
    }

    pub fn exint_pending(&self, ch: u8) -> bool {
        pending(self.regs(), ch)
    }

    pub fn clear_exint(&mut self, ch: u8) {
        clear_flag(self.regs(), ch);
    }
}

/// Whether channel `ch` has fired. Safe to call from any handler.
pub fn is_pending(ch: u8) -> bool {
    pending(INTC::regs_unchecked(), ch)
}

/// Clears the flag of channel `ch`. The flag clear register is write-1, so
/// this doesn't race with other channels.
pub fn clear(ch: u8) {
    clear_flag(INTC::regs_unchecked(), ch)
}

/// External interrupt capable pins
pub trait ExtiPin {
    /// External interrupt channel this pin feeds
    fn channel(&self) -> u8;
    fn enable_interrupt(&mut self);
    fn disable_interrupt(&mut self);
}

impl<MODE, const P: u8, const N: u8> ExtiPin for Pin<Input<MODE>, P, N> {
    fn channel(&self) -> u8 {
        N
    }

    fn enable_interrupt(&mut self) {
        self.configure(|v| v | PCR_INTE);
    }

    fn disable_interrupt(&mut self) {
        self.configure(|v| v & !PCR_INTE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::{GpioExt, Ports};
    use crate::pac::{intc, port, ram_block, PORT};

    fn interrupts() -> Interrupts {
        let regs = unsafe { intc::Intc::from_ptr(ram_block(0x2B0)) };
        Interrupts::new(INTC::from_block(regs))
    }

    #[test]
    fn channel_configuration() {
        let mut irqs = interrupts();
        irqs.configure_exint(
            4,
            ExintConfig {
                trigger: Trigger::Both,
                filter: Some(FilterClock::Pclk3Div32),
            },
        );
        assert_eq!(
            irqs.regs().eirqcr(4).read(),
            2 | (2 << EIRQCR_EISMPCLK_SHIFT) | EIRQCR_EFEN
        );
        irqs.configure_exint(4, ExintConfig::default());
        assert_eq!(irqs.regs().eirqcr(4).read(), 0);

        irqs.set_exint_wakeup(4, true);
        assert_eq!(irqs.regs().wupen().read(), 1 << 4);
    }

    #[test]
    fn flags() {
        let mut irqs = interrupts();
        irqs.regs().eifr().write(1 << 7);
        assert!(irqs.exint_pending(7));
        assert!(!irqs.exint_pending(6));
        irqs.clear_exint(7);
        assert_eq!(irqs.regs().eifcr().read(), 1 << 7);
    }

    #[test]
    #[should_panic]
    fn pending_rejects_channel_16() {
        interrupts().exint_pending(16);
    }

    #[test]
    #[should_panic]
    fn clear_rejects_channel_16() {
        interrupts().clear_exint(16);
    }

    #[test]
    fn pin_interrupt_enable() {
        let regs = unsafe { port::Port::from_ptr(ram_block(0x800)) };
        let pins = Ports::new(PORT::from_block(regs)).split();
        let mut key = pins.pb6.into_pull_up_input();
        key.enable_interrupt();
        assert_eq!(key.channel(), 6);
        assert_eq!(regs.pcr(1, 6).read(), port::PCR_PUU | PCR_INTE);
        key.disable_interrupt();
        assert_eq!(regs.pcr(1, 6).read(), port::PCR_PUU);
    }
}
