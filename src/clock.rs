//! Clock controller (CMU)
//!
//! Clock sources, the main PLL, the system clock switch and the bus dividers.
//! A [`ClockConfig`] is checked against the chip limits with
//! [`ClockConfig::validate`] before anything is written, then applied by
//! [`ClockController::freeze`].
//!
//! ```ignore
//! let config = ClockConfig::new()
//!     .use_xtal(8.MHz())
//!     .mpll(PllConfig { source: PllSource::Xtal, m: 1, n: 42, p: 2, q: 2, r: 2 })
//!     .sysclk_source(SysClockSource::Mpll)
//!     .pclk1_div(Divider::Div2)
//!     .pclk3_div(Divider::Div4);
//! let ccu = ClockController::freeze(p.SYSREG, &p.EFM, config)?;
//! let clocks = ccu.clocks();
//! ```

use crate::efm;
use crate::pac::sysreg::*;
use crate::pac::{EFM, SYSREG};
use crate::pwc::{self, Protect};
use crate::time::Hertz;

pub const HRC_FREQUENCY: Hertz = Hertz::from_raw(16_000_000);
pub const MRC_FREQUENCY: Hertz = Hertz::from_raw(8_000_000);
pub const LRC_FREQUENCY: Hertz = Hertz::from_raw(32_768);
pub const XTAL32_FREQUENCY: Hertz = Hertz::from_raw(32_768);

const MHZ: u32 = 1_000_000;

/// Default iteration budget for oscillator and PLL stable flags
pub const DEFAULT_TIMEOUT: u32 = 0x0010_0000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// XTAL selected but no crystal frequency configured
    NoXtal,
    /// Crystal frequency outside 4..=24 MHz
    XtalRange,
    /// MPLL selected but not configured
    NoPll,
    /// M outside 1..=24
    PllM,
    /// N outside 20..=480
    PllN,
    /// P, Q or R outside 2..=16
    PllDivider,
    /// PLL input after M outside 1..=24 MHz
    PllInput,
    /// VCO outside 240..=480 MHz
    Vco,
    /// A clock exceeds its maximum
    TooFast(Bus),
    /// An oscillator or the PLL did not report stable in time
    Timeout,
}

/// Clock tree node, used when reporting limit violations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bus {
    Sysclk,
    Hclk,
    Exclk,
    Pclk0,
    Pclk1,
    Pclk2,
    Pclk3,
    Pclk4,
}

impl Bus {
    fn limit(self) -> u32 {
        match self {
            Bus::Sysclk | Bus::Hclk | Bus::Pclk0 => 200 * MHZ,
            Bus::Exclk | Bus::Pclk1 | Bus::Pclk4 => 100 * MHZ,
            Bus::Pclk2 => 60 * MHZ,
            Bus::Pclk3 => 50 * MHZ,
        }
    }
}

/// System clock source (CKSWR)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SysClockSource {
    Hrc = 0,
    Mrc = 1,
    Lrc = 2,
    Xtal = 3,
    Xtal32 = 4,
    Mpll = 5,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllSource {
    Xtal,
    Hrc,
}

/// MPLL settings: `VCO = fin / m * n`, outputs `VCO / p`, `VCO / q`, `VCO / r`.
/// The system clock is taken from the P output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllConfig {
    pub source: PllSource,
    pub m: u8,
    pub n: u16,
    pub p: u8,
    pub q: u8,
    pub r: u8,
}

/// Bus clock divider, powers of two
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Divider {
    Div1 = 0,
    Div2 = 1,
    Div4 = 2,
    Div8 = 3,
    Div16 = 4,
    Div32 = 5,
    Div64 = 6,
}

impl Divider {
    fn apply(self, clock: Hertz) -> Hertz {
        Hertz::from_raw(clock.to_Hz() >> self as u32)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockConfig {
    pub sysclk_source: SysClockSource,
    /// Frequency of the crystal on XTAL_IN/XTAL_OUT, if fitted
    pub xtal: Option<Hertz>,
    pub pll: Option<PllConfig>,
    pub hclk_div: Divider,
    pub exclk_div: Divider,
    pub pclk0_div: Divider,
    pub pclk1_div: Divider,
    pub pclk2_div: Divider,
    pub pclk3_div: Divider,
    pub pclk4_div: Divider,
    /// Iteration budget for each stable flag wait
    pub timeout: u32,
}

impl Default for ClockConfig {
    /// Reset state: MRC, every bus undivided
    fn default() -> Self {
        Self {
            sysclk_source: SysClockSource::Mrc,
            xtal: None,
            pll: None,
            hclk_div: Divider::Div1,
            exclk_div: Divider::Div1,
            pclk0_div: Divider::Div1,
            pclk1_div: Divider::Div1,
            pclk2_div: Divider::Div1,
            pclk3_div: Divider::Div1,
            pclk4_div: Divider::Div1,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

macro_rules! divider_setters {
    ($($field:ident,)+) => {
        $(
            pub fn $field(mut self, div: Divider) -> Self {
                self.$field = div;
                self
            }
        )+
    };
}

impl ClockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn use_xtal(mut self, freq: Hertz) -> Self {
        self.xtal = Some(freq);
        self
    }

    pub fn mpll(mut self, pll: PllConfig) -> Self {
        self.pll = Some(pll);
        self
    }

    pub fn sysclk_source(mut self, source: SysClockSource) -> Self {
        self.sysclk_source = source;
        self
    }

    pub fn timeout(mut self, timeout: u32) -> Self {
        self.timeout = timeout;
        self
    }

    divider_setters!(
        hclk_div,
        exclk_div,
        pclk0_div,
        pclk1_div,
        pclk2_div,
        pclk3_div,
        pclk4_div,
    );

    fn xtal_frequency(&self) -> Result<Hertz, Error> {
        let xtal = self.xtal.ok_or(Error::NoXtal)?;
        if !(4 * MHZ..=24 * MHZ).contains(&xtal.to_Hz()) {
            return Err(Error::XtalRange);
        }
        Ok(xtal)
    }

    fn pll_clocks(&self) -> Result<PllClocks, Error> {
        let pll = self.pll.ok_or(Error::NoPll)?;
        let fin = match pll.source {
            PllSource::Xtal => self.xtal_frequency()?,
            PllSource::Hrc => HRC_FREQUENCY,
        };
        if !(1..=24).contains(&pll.m) {
            return Err(Error::PllM);
        }
        if !(20..=480).contains(&pll.n) {
            return Err(Error::PllN);
        }
        if [pll.p, pll.q, pll.r].iter().any(|d| !(2..=16).contains(d)) {
            return Err(Error::PllDivider);
        }
        let input = fin.to_Hz() / pll.m as u32;
        if !(MHZ..=24 * MHZ).contains(&input) {
            return Err(Error::PllInput);
        }
        let vco = fin.to_Hz() as u64 * pll.n as u64 / pll.m as u64;
        if !(240 * MHZ as u64..=480 * MHZ as u64).contains(&vco) {
            return Err(Error::Vco);
        }
        let vco = vco as u32;
        Ok(PllClocks {
            p: Hertz::from_raw(vco / pll.p as u32),
            q: Hertz::from_raw(vco / pll.q as u32),
            r: Hertz::from_raw(vco / pll.r as u32),
        })
    }

    /// Computes the resulting clock tree without touching hardware.
    pub fn validate(&self) -> Result<Clocks, Error> {
        let pll = match (self.sysclk_source, self.pll) {
            (SysClockSource::Mpll, _) | (_, Some(_)) => Some(self.pll_clocks()?),
            _ => None,
        };
        let sysclk = match self.sysclk_source {
            SysClockSource::Hrc => HRC_FREQUENCY,
            SysClockSource::Mrc => MRC_FREQUENCY,
            SysClockSource::Lrc => LRC_FREQUENCY,
            SysClockSource::Xtal => self.xtal_frequency()?,
            SysClockSource::Xtal32 => XTAL32_FREQUENCY,
            SysClockSource::Mpll => pll.ok_or(Error::NoPll)?.p,
        };

        let clocks = Clocks {
            sysclk,
            hclk: self.hclk_div.apply(sysclk),
            exclk: self.exclk_div.apply(sysclk),
            pclk0: self.pclk0_div.apply(sysclk),
            pclk1: self.pclk1_div.apply(sysclk),
            pclk2: self.pclk2_div.apply(sysclk),
            pclk3: self.pclk3_div.apply(sysclk),
            pclk4: self.pclk4_div.apply(sysclk),
            mpll: pll,
        };

        for (bus, freq) in [
            (Bus::Sysclk, clocks.sysclk),
            (Bus::Hclk, clocks.hclk),
            (Bus::Exclk, clocks.exclk),
            (Bus::Pclk0, clocks.pclk0),
            (Bus::Pclk1, clocks.pclk1),
            (Bus::Pclk2, clocks.pclk2),
            (Bus::Pclk3, clocks.pclk3),
            (Bus::Pclk4, clocks.pclk4),
        ] {
            if freq.to_Hz() > bus.limit() {
                return Err(Error::TooFast(bus));
            }
        }

        Ok(clocks)
    }
}

/// MPLL output frequencies
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllClocks {
    pub p: Hertz,
    pub q: Hertz,
    pub r: Hertz,
}

/// Frozen clock frequencies
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Clocks {
    pub sysclk: Hertz,
    /// Core and AHB clock
    pub hclk: Hertz,
    /// External bus clock
    pub exclk: Hertz,
    /// Timer6 counter clock
    pub pclk0: Hertz,
    /// Peripheral clock for TIMER0/TIMER4/DMA sequencing
    pub pclk1: Hertz,
    /// ADC conversion clock
    pub pclk2: Hertz,
    /// I2C, KEYSCAN and CMP interface clock
    pub pclk3: Hertz,
    /// ADC/TRNG interface clock
    pub pclk4: Hertz,
    pub mpll: Option<PllClocks>,
}

impl Clocks {
    /// Reset clock tree: everything on MRC
    pub const fn reset() -> Self {
        Clocks {
            sysclk: MRC_FREQUENCY,
            hclk: MRC_FREQUENCY,
            exclk: MRC_FREQUENCY,
            pclk0: MRC_FREQUENCY,
            pclk1: MRC_FREQUENCY,
            pclk2: MRC_FREQUENCY,
            pclk3: MRC_FREQUENCY,
            pclk4: MRC_FREQUENCY,
            mpll: None,
        }
    }
}

/// Clock output pins MCO1 (PA8) and MCO2 (PA9)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum McoChannel {
    Mco1,
    Mco2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum McoSource {
    Hrc = 0,
    Mrc = 1,
    Lrc = 2,
    Xtal = 3,
    Xtal32 = 4,
    MpllP = 6,
    MpllQ = 8,
    Sysclk = 11,
}

/// MCO divider, 1..128 in powers of two
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum McoDivider {
    Div1 = 0,
    Div2 = 1,
    Div4 = 2,
    Div8 = 3,
    Div16 = 4,
    Div32 = 5,
    Div64 = 6,
    Div128 = 7,
}

/// Reaction to a stopped crystal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum XtalStopAction {
    /// Raise the XTAL_STOP interrupt source
    Interrupt,
    Reset,
}

pub struct ClockController {
    sysreg: SYSREG,
    clocks: Clocks,
}

fn wait_for(mut budget: u32, mut ready: impl FnMut() -> bool) -> Result<(), Error> {
    while !ready() {
        if budget == 0 {
            return Err(Error::Timeout);
        }
        budget -= 1;
    }
    Ok(())
}

impl ClockController {
    /// Applies `config` and hands back the resulting frequencies.
    ///
    /// Flash wait cycles are raised before the switch and lowered after it,
    /// so the core never runs faster than the flash allows.
    pub fn freeze(sysreg: SYSREG, efm: &EFM, config: ClockConfig) -> Result<Self, Error> {
        let clocks = config.validate()?;
        let regs = sysreg.regs();

        pwc::unlock(regs, Protect::CMU);
        let result = Self::apply(regs, efm, &config, &clocks);
        pwc::lock(regs, Protect::CMU);
        result?;

        debug!(
            "sysclk {} Hz, hclk {} Hz, pclk1 {} Hz",
            clocks.sysclk.to_Hz(),
            clocks.hclk.to_Hz(),
            clocks.pclk1.to_Hz()
        );
        Ok(ClockController { sysreg, clocks })
    }

    fn apply(
        regs: Sysreg,
        efm: &EFM,
        config: &ClockConfig,
        clocks: &Clocks,
    ) -> Result<(), Error> {
        let flash = efm.regs();
        let target_wait = efm::wait_cycles_for(clocks.hclk);
        let current_wait = efm::wait_cycles(flash);
        if target_wait > current_wait {
            efm::set_wait_cycles(flash, target_wait);
        }

        let pll_source = config.pll.map(|pll| pll.source);
        let needs_xtal = config.sysclk_source == SysClockSource::Xtal
            || pll_source == Some(PllSource::Xtal);
        let needs_hrc =
            config.sysclk_source == SysClockSource::Hrc || pll_source == Some(PllSource::Hrc);

        if needs_xtal {
            regs.xtalcr().clear_bits(OSC_STOP);
            wait_for(config.timeout, || regs.oscstbsr().is_set(OSCSTBSR_XTALSTBF))?;
        }
        if needs_hrc {
            regs.hrccr().clear_bits(OSC_STOP);
            wait_for(config.timeout, || regs.oscstbsr().is_set(OSCSTBSR_HRCSTBF))?;
        }
        match config.sysclk_source {
            SysClockSource::Mrc => regs.mrccr().clear_bits(OSC_STOP),
            SysClockSource::Lrc => regs.lrccr().clear_bits(OSC_STOP),
            SysClockSource::Xtal32 => regs.xtal32cr().clear_bits(OSC_STOP),
            _ => {}
        }

        if let Some(pll) = config.pll {
            // The PLL may only be reconfigured while stopped
            if regs.ckswr().read() == CKSW_MPLL {
                regs.ckswr().write(CKSW_MRC);
            }
            regs.pllcr().set_bits(PLLCR_MPLLOFF);
            let mut cfg = ((pll.m as u32 - 1) << PLLCFGR_M_SHIFT)
                | ((pll.n as u32 - 1) << PLLCFGR_N_SHIFT)
                | ((pll.r as u32 - 1) << PLLCFGR_R_SHIFT)
                | ((pll.q as u32 - 1) << PLLCFGR_Q_SHIFT)
                | ((pll.p as u32 - 1) << PLLCFGR_P_SHIFT);
            if pll.source == PllSource::Hrc {
                cfg |= PLLCFGR_SRC_HRC;
            }
            regs.pllcfgr().write(cfg);
            regs.pllcr().clear_bits(PLLCR_MPLLOFF);
            wait_for(config.timeout, || regs.oscstbsr().is_set(OSCSTBSR_MPLLSTBF))?;
        }

        regs.scfgr().write(
            ((config.pclk0_div as u32) << SCFGR_PCLK0S_SHIFT)
                | ((config.pclk1_div as u32) << SCFGR_PCLK1S_SHIFT)
                | ((config.pclk2_div as u32) << SCFGR_PCLK2S_SHIFT)
                | ((config.pclk3_div as u32) << SCFGR_PCLK3S_SHIFT)
                | ((config.pclk4_div as u32) << SCFGR_PCLK4S_SHIFT)
                | ((config.exclk_div as u32) << SCFGR_EXCKS_SHIFT)
                | ((config.hclk_div as u32) << SCFGR_HCLKS_SHIFT),
        );

        regs.ckswr().write(config.sysclk_source as u8);

        if target_wait < current_wait {
            efm::set_wait_cycles(flash, target_wait);
        }
        Ok(())
    }

    pub fn clocks(&self) -> Clocks {
        self.clocks
    }

    /// Routes `source / div` to an MCO pin. The pin still needs its
    /// alternate function.
    pub fn enable_mco(&mut self, channel: McoChannel, source: McoSource, div: McoDivider) {
        let value = (source as u8 & MCOCFGR_SEL_MASK)
            | (((div as u8) << MCOCFGR_DIV_SHIFT) & MCOCFGR_DIV_MASK)
            | MCOCFGR_EN;
        let regs = self.sysreg.regs();
        pwc::unlock(regs, Protect::CMU);
        self.mco_reg(channel).write(value);
        pwc::lock(regs, Protect::CMU);
    }

    pub fn disable_mco(&mut self, channel: McoChannel) {
        let regs = self.sysreg.regs();
        pwc::unlock(regs, Protect::CMU);
        self.mco_reg(channel).clear_bits(MCOCFGR_EN);
        pwc::lock(regs, Protect::CMU);
    }

    fn mco_reg(&self, channel: McoChannel) -> &'static crate::pac::Reg<u8> {
        match channel {
            McoChannel::Mco1 => self.sysreg.regs().mco1cfgr(),
            McoChannel::Mco2 => self.sysreg.regs().mco2cfgr(),
        }
    }

    /// Watches the crystal and reacts when it stops oscillating. On a stop
    /// the hardware falls back to MRC.
    pub fn enable_xtal_stop_detection(&mut self, action: XtalStopAction) {
        let regs = self.sysreg.regs();
        let value = match action {
            XtalStopAction::Interrupt => XTALSTDCR_E | XTALSTDCR_IE,
            XtalStopAction::Reset => XTALSTDCR_E | XTALSTDCR_RE | XTALSTDCR_RIS,
        };
        pwc::unlock(regs, Protect::CMU);
        regs.xtalstdcr().write(value);
        pwc::lock(regs, Protect::CMU);
    }

    pub fn disable_xtal_stop_detection(&mut self) {
        let regs = self.sysreg.regs();
        pwc::unlock(regs, Protect::CMU);
        regs.xtalstdcr().write(0);
        pwc::lock(regs, Protect::CMU);
    }

    pub fn xtal_stopped(&self) -> bool {
        self.sysreg.regs().xtalstdsr().is_set(XTALSTDSR_F)
    }

    pub fn clear_xtal_stop(&mut self) {
        let regs = self.sysreg.regs();
        pwc::unlock(regs, Protect::CMU);
        regs.xtalstdsr().clear_bits(XTALSTDSR_F);
        pwc::lock(regs, Protect::CMU);
    }

    pub fn free(self) -> SYSREG {
        self.sysreg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac::{efm as efm_regs, ram_block, sysreg};
    use crate::time::RateExtU32;

    fn pll_168() -> PllConfig {
        PllConfig {
            source: PllSource::Xtal,
            m: 1,
            n: 42,
            p: 2,
            q: 2,
            r: 2,
        }
    }

    fn config_168() -> ClockConfig {
        ClockConfig::new()
            .use_xtal(8u32.MHz())
            .mpll(pll_168())
            .sysclk_source(SysClockSource::Mpll)
            .exclk_div(Divider::Div2)
            .pclk1_div(Divider::Div2)
            .pclk2_div(Divider::Div4)
            .pclk3_div(Divider::Div4)
            .pclk4_div(Divider::Div2)
    }

    #[test]
    fn reset_config_is_mrc() {
        assert_eq!(ClockConfig::default().validate(), Ok(Clocks::reset()));
    }

    #[test]
    fn pll_tree_frequencies() {
        let clocks = config_168().validate().unwrap();
        assert_eq!(clocks.sysclk.to_Hz(), 168_000_000);
        assert_eq!(clocks.hclk.to_Hz(), 168_000_000);
        assert_eq!(clocks.pclk1.to_Hz(), 84_000_000);
        assert_eq!(clocks.pclk3.to_Hz(), 42_000_000);
        assert_eq!(clocks.mpll.unwrap().q.to_Hz(), 168_000_000);
    }

    #[test]
    fn pll_limits_are_errors() {
        let with = |f: fn(&mut PllConfig)| {
            let mut pll = pll_168();
            f(&mut pll);
            config_168().mpll(pll).validate()
        };
        assert_eq!(with(|p| p.m = 0), Err(Error::PllM));
        assert_eq!(with(|p| p.m = 25), Err(Error::PllM));
        assert_eq!(with(|p| p.n = 19), Err(Error::PllN));
        assert_eq!(with(|p| p.n = 481), Err(Error::PllN));
        assert_eq!(with(|p| p.q = 1), Err(Error::PllDivider));
        assert_eq!(with(|p| p.r = 17), Err(Error::PllDivider));
        // 8 MHz / 16 = 0.5 MHz input
        assert_eq!(
            with(|p| {
                p.m = 16;
                p.n = 480
            }),
            Err(Error::PllInput)
        );
        // 8 MHz * 25 = 200 MHz VCO
        assert_eq!(with(|p| p.n = 25), Err(Error::Vco));
        // 8 MHz * 50 / 2 = 200 MHz sysclk, still fine
        assert!(with(|p| p.n = 50).is_ok());
        // 8 MHz * 60 / 2 = 240 MHz sysclk
        assert_eq!(with(|p| p.n = 60), Err(Error::TooFast(Bus::Sysclk)));
    }

    #[test]
    fn bus_limits_are_checked() {
        let config = config_168().pclk3_div(Divider::Div2);
        assert_eq!(config.validate(), Err(Error::TooFast(Bus::Pclk3)));
        let config = config_168().pclk2_div(Divider::Div2);
        assert_eq!(config.validate(), Err(Error::TooFast(Bus::Pclk2)));
        let config = config_168().pclk1_div(Divider::Div1);
        assert_eq!(config.validate(), Err(Error::TooFast(Bus::Pclk1)));
    }

    #[test]
    fn xtal_requirements() {
        let config = ClockConfig::new().sysclk_source(SysClockSource::Xtal);
        assert_eq!(config.validate(), Err(Error::NoXtal));
        let config = config.use_xtal(32u32.MHz());
        assert_eq!(config.validate(), Err(Error::XtalRange));
        let config = ClockConfig::new().sysclk_source(SysClockSource::Mpll);
        assert_eq!(config.validate(), Err(Error::NoPll));
    }

    fn blocks() -> (SYSREG, EFM) {
        let sysreg = unsafe { sysreg::Sysreg::from_ptr(ram_block(0x400)) };
        let efm = unsafe { efm_regs::Efm::from_ptr(ram_block(0x60)) };
        (SYSREG::from_block(sysreg), EFM::from_block(efm))
    }

    #[test]
    fn freeze_programs_pll_and_switches() {
        let (sysreg, flash) = blocks();
        let regs = sysreg.regs();
        regs.oscstbsr().write(0xFF);
        regs.ckswr().write(CKSW_MRC);

        let ccu = ClockController::freeze(sysreg, &flash, config_168()).unwrap();
        assert_eq!(regs.ckswr().read(), CKSW_MPLL);
        assert_eq!(regs.pllcfgr().read(), (41 << 8) | (1 << 20) | (1 << 24) | (1 << 28));
        assert_eq!(regs.pllcr().read() & PLLCR_MPLLOFF, 0);
        assert_eq!(regs.scfgr().read(), (1 << 4) | (2 << 8) | (2 << 12) | (1 << 16) | (1 << 20));
        assert_eq!(efm::wait_cycles(flash.regs()), 4);
        // CMU protection restored
        assert_eq!(regs.fprc().read() & FPRC_CMU, 0);
        assert_eq!(ccu.clocks().hclk.to_Hz(), 168_000_000);
    }

    #[test]
    fn freeze_times_out_without_stable_flag() {
        let (sysreg, flash) = blocks();
        let regs = sysreg.regs();
        let config = config_168().timeout(10);
        assert!(matches!(
            ClockController::freeze(sysreg, &flash, config),
            Err(Error::Timeout)
        ));
        assert_eq!(regs.fprc().read() & FPRC_CMU, 0);
        // Switch never happened
        assert_eq!(regs.ckswr().read(), 0);
    }

    #[test]
    fn mco_and_xtal_stop_detection() {
        let (sysreg, flash) = blocks();
        sysreg.regs().oscstbsr().write(0xFF);
        let mut ccu = ClockController::freeze(sysreg, &flash, ClockConfig::default()).unwrap();
        ccu.enable_mco(McoChannel::Mco2, McoSource::MpllQ, McoDivider::Div4);
        let regs = ccu.sysreg.regs();
        assert_eq!(regs.mco2cfgr().read(), 8 | (2 << 4) | MCOCFGR_EN);
        ccu.disable_mco(McoChannel::Mco2);
        assert_eq!(regs.mco2cfgr().read(), 8 | (2 << 4));

        ccu.enable_xtal_stop_detection(XtalStopAction::Reset);
        assert_eq!(
            regs.xtalstdcr().read(),
            XTALSTDCR_E | XTALSTDCR_RE | XTALSTDCR_RIS
        );
        regs.xtalstdsr().write(XTALSTDSR_F);
        assert!(ccu.xtal_stopped());
        ccu.clear_xtal_stop();
        assert!(!ccu.xtal_stopped());
    }
}
