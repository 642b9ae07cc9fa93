//! Analog comparators (CMP1..3) and the 8-bit reference DACs
//!
//! ```ignore
//! let cmp = Comparators::new(p.CMP, &gates.cmp.into_enabled_clock());
//! let mut parts = cmp.split();
//! parts.dac1.set_code(dac_code(1650, 3300));
//! parts.dac1.enable();
//! parts.cmp1.configure(&ComparatorConfig {
//!     positive: PositiveInput::Inp1,
//!     negative: NegativeInput::Dac1,
//!     ..Default::default()
//! });
//! parts.cmp1.enable(&mut delay);
//! let above = parts.cmp1.output();
//! ```
use embedded_hal::blocking::delay::DelayUs;

use crate::pac::cmp::*;
use crate::pac::CMP;
use crate::pwc::{CmpClock, Enabled};

/// Settling time after power on, before the output is valid
const STABILIZATION_US: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PositiveInput {
    Inp1 = 0b0001,
    Inp2 = 0b0010,
    Inp3 = 0b0100,
    Inp4 = 0b1000,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NegativeInput {
    Dac1 = 0b0001,
    Dac2 = 0b0010,
    /// Internal reference voltage
    Vref = 0b0100,
    /// INM4 pin
    Pin = 0b1000,
}

/// Output noise filter: the output must be stable for three samples of the
/// filter clock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Filter {
    Off = 0,
    Pclk3 = 1,
    Pclk3Div2 = 2,
    Pclk3Div4 = 3,
    Pclk3Div8 = 4,
    Pclk3Div16 = 5,
    Pclk3Div32 = 6,
    Pclk3Div64 = 7,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Rising = 1,
    Falling = 2,
    Both = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ComparatorConfig {
    pub positive: PositiveInput,
    pub negative: NegativeInput,
    pub filter: Filter,
    /// Edge raising the comparator interrupt, `None` leaves it off
    pub interrupt: Option<Edge>,
    /// Invert the result
    pub invert: bool,
    /// Drive the result onto the VCOUT pin
    pub pin_output: bool,
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self {
            positive: PositiveInput::Inp1,
            negative: NegativeInput::Dac1,
            filter: Filter::Off,
            interrupt: None,
            invert: false,
            pin_output: false,
        }
    }
}

/// DAC code for `millivolts` with the DAC referenced to `avcc_mv`
pub fn dac_code(millivolts: u32, avcc_mv: u32) -> u8 {
    if avcc_mv == 0 {
        return 0;
    }
    let code = millivolts as u64 * 256 / avcc_mv as u64;
    code.min(255) as u8
}

pub struct Comparators {
    cmp: CMP,
}

pub struct Parts {
    pub cmp1: Comparator<0>,
    pub cmp2: Comparator<1>,
    pub cmp3: Comparator<2>,
    pub dac1: Dac<0>,
    pub dac2: Dac<1>,
}

impl Comparators {
    pub fn new(cmp: CMP, _clock: &CmpClock<Enabled>) -> Self {
        Comparators { cmp }
    }

    pub fn split(self) -> Parts {
        let regs = self.cmp.regs();
        Parts {
            cmp1: Comparator { regs },
            cmp2: Comparator { regs },
            cmp3: Comparator { regs },
            dac1: Dac { regs },
            dac2: Dac { regs },
        }
    }

    pub fn free(self) -> CMP {
        self.cmp
    }
}

/// Comparator `UNIT + 1`
pub struct Comparator<const UNIT: u8> {
    regs: crate::pac::cmp::Cmp,
}

impl<const UNIT: u8> Comparator<UNIT> {
    /// Applies `config` with the comparator left in its current on/off
    /// state and the output gated off
    pub fn configure(&mut self, config: &ComparatorConfig) {
        let ctrl = self.regs.ctrl(UNIT);
        let mut value = (ctrl.read() & CTRL_CMPON) | (config.filter as u16) << CTRL_FLTSL_SHIFT;
        if let Some(edge) = config.interrupt {
            value |= CTRL_IEN | (edge as u16) << CTRL_EDGSL_SHIFT;
        }
        if config.invert {
            value |= CTRL_INV;
        }
        if config.pin_output {
            value |= CTRL_CMPOE;
        }
        ctrl.write(value);
        self.regs.vltsel(UNIT).write(
            (config.negative as u16) << VLTSEL_RVSL_SHIFT
                | (config.positive as u16) << VLTSEL_CVSL_SHIFT,
        );
        debug!(
            "CMP{=u8} inp {=u8} inm {=u8}",
            UNIT + 1,
            config.positive as u8,
            config.negative as u8
        );
    }

    /// Powers the comparator, waits for it to settle, then enables its
    /// output
    pub fn enable<D: DelayUs<u32>>(&mut self, delay: &mut D) {
        let ctrl = self.regs.ctrl(UNIT);
        ctrl.set_bits(CTRL_CMPON);
        delay.delay_us(STABILIZATION_US);
        ctrl.set_bits(CTRL_OUTEN);
    }

    pub fn disable(&mut self) {
        self.regs.ctrl(UNIT).clear_bits(CTRL_CMPON | CTRL_OUTEN);
    }

    pub fn is_enabled(&self) -> bool {
        self.regs.ctrl(UNIT).is_set(CTRL_CMPON)
    }

    /// Filtered result, after inversion: true while INP > INM
    pub fn output(&self) -> bool {
        self.regs.outmon(UNIT).is_set(OUTMON_OMON)
    }

    pub fn listen(&mut self, edge: Edge) {
        self.regs
            .ctrl(UNIT)
            .write_field(CTRL_EDGSL_MASK, CTRL_EDGSL_SHIFT, edge as u16);
        self.regs.ctrl(UNIT).set_bits(CTRL_IEN);
    }

    pub fn unlisten(&mut self) {
        self.regs.ctrl(UNIT).clear_bits(CTRL_IEN);
    }
}

/// Reference DAC `N + 1`
pub struct Dac<const N: u8> {
    regs: crate::pac::cmp::Cmp,
}

impl<const N: u8> Dac<N> {
    const ENABLE: u16 = if N == 0 { DACR_DA1EN } else { DACR_DA2EN };

    fn data(&self) -> &'static crate::pac::Reg<u16> {
        if N == 0 {
            self.regs.dadr1()
        } else {
            self.regs.dadr2()
        }
    }

    pub fn set_code(&mut self, code: u8) {
        self.data().write(code as u16);
    }

    pub fn code(&self) -> u8 {
        self.data().read() as u8
    }

    /// Sets the output to `millivolts` of `avcc_mv`
    pub fn set_millivolts(&mut self, millivolts: u32, avcc_mv: u32) {
        self.set_code(dac_code(millivolts, avcc_mv));
    }

    pub fn enable(&mut self) {
        self.regs.dacr().set_bits(Self::ENABLE);
    }

    pub fn disable(&mut self) {
        self.regs.dacr().clear_bits(Self::ENABLE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac::cmp::Cmp;

    struct CountingDelay(u32);

    impl DelayUs<u32> for CountingDelay {
        fn delay_us(&mut self, us: u32) {
            self.0 += us;
        }
    }

    fn parts() -> (Parts, Cmp) {
        let regs = unsafe { Cmp::from_ptr(crate::pac::ram_block(0x110)) };
        let clock = crate::pwc::test_clocks().cmp.into_enabled_clock();
        (Comparators::new(CMP::from_block(regs), &clock).split(), regs)
    }

    #[test]
    fn dac_code_scales_and_saturates() {
        assert_eq!(dac_code(0, 3300), 0);
        assert_eq!(dac_code(1650, 3300), 128);
        assert_eq!(dac_code(3300, 3300), 255);
        assert_eq!(dac_code(5000, 3300), 255);
        assert_eq!(dac_code(100, 0), 0);
    }

    #[test]
    fn comparator_configuration() {
        let (mut parts, regs) = parts();
        parts.cmp2.configure(&ComparatorConfig {
            positive: PositiveInput::Inp3,
            negative: NegativeInput::Vref,
            filter: Filter::Pclk3Div8,
            interrupt: Some(Edge::Both),
            invert: true,
            pin_output: true,
        });
        assert_eq!(
            regs.ctrl(1).read(),
            4 | (3 << 5) | CTRL_IEN | CTRL_INV | CTRL_CMPOE
        );
        assert_eq!(regs.vltsel(1).read(), 0b0100 | (0b0100 << 8));
        assert_eq!(regs.ctrl(0).read(), 0);

        let mut delay = CountingDelay(0);
        parts.cmp2.enable(&mut delay);
        assert_eq!(delay.0, STABILIZATION_US);
        assert!(parts.cmp2.is_enabled());
        assert!(regs.ctrl(1).is_set(CTRL_CMPON | CTRL_OUTEN));

        regs.outmon(1).write(OUTMON_OMON);
        assert!(parts.cmp2.output());
        assert!(!parts.cmp1.output());

        parts.cmp2.unlisten();
        parts.cmp2.disable();
        assert_eq!(regs.ctrl(1).read(), 4 | (3 << 5) | CTRL_INV | CTRL_CMPOE);
    }

    #[test]
    fn reference_dacs() {
        let (mut parts, regs) = parts();
        parts.dac2.set_millivolts(825, 3300);
        parts.dac2.enable();
        assert_eq!(regs.dadr2().read(), 64);
        assert_eq!(regs.dadr1().read(), 0);
        assert_eq!(regs.dacr().read(), DACR_DA2EN);
        parts.dac1.enable();
        parts.dac2.disable();
        assert_eq!(regs.dacr().read(), DACR_DA1EN);
        assert_eq!(parts.dac2.code(), 64);
    }
}
