//! Power control: function clock gates, register write protection, low power
//! modes and low voltage detection.
//!
//! ```ignore
//! let mut gates = PeripheralClocks::new(p.PWC);
//! let crc_clock = gates.crc.into_enabled_clock();
//! let crc = Crc::new(p.CRC, &crc_clock);
//! ```

use core::marker::PhantomData;
use core::ops::BitOr;

use cortex_m::peripheral::SCB;

use crate::pac::pwc::{Pwc, FCG0PC_LOCK, FCG0PC_UNLOCK};
use crate::pac::pwr::*;
use crate::pac::sysreg::{
    Sysreg, FPRC_CMU, FPRC_KEY, FPRC_LVD, FPRC_PWC, STPMCR_CKSMRC, STPMCR_FLNWT, STPMCR_STOP,
};
use crate::pac::{PWC, PWR, SYSREG};

// Peripheral Clock State
pub struct Enabled;
pub struct Disabled;

macro_rules! peripheral_clocks {
    (
        $($PeripheralType:ident, $peripheral_ident:ident, $fcg:ident, $bit:expr,)+
    ) => {
        /// Clock gate tokens for every gated peripheral, all starting disabled.
        pub struct PeripheralClocks {
            pwc: PWC,
            $(
                pub $peripheral_ident: $PeripheralType<Disabled>,
            )+
        }

        impl PeripheralClocks {
            /// Takes over the function clock registers. Every listed gate is
            /// switched off, matching the state the tokens describe.
            pub fn new(pwc: PWC) -> Self {
                let regs = pwc.regs();
                $(
                    gate(regs, Pwc::$fcg, 1 << $bit);
                )+
                PeripheralClocks {
                    pwc,
                    $(
                        $peripheral_ident: $PeripheralType { regs, _state: PhantomData },
                    )+
                }
            }

            /// Gives the PWC token back. Gates keep their current state.
            pub fn free(self) -> PWC {
                self.pwc
            }
        }

        $(
            pub struct $PeripheralType<STATE> {
                pub(crate) regs: Pwc,
                pub(crate) _state: PhantomData<STATE>,
            }

            impl<STATE> $PeripheralType<STATE> {
                pub fn into_enabled_clock(self) -> $PeripheralType<Enabled> {
                    ungate(self.regs, Pwc::$fcg, 1 << $bit);
                    $PeripheralType { regs: self.regs, _state: PhantomData }
                }

                pub fn into_disabled_clock(self) -> $PeripheralType<Disabled> {
                    gate(self.regs, Pwc::$fcg, 1 << $bit);
                    $PeripheralType { regs: self.regs, _state: PhantomData }
                }

                /// Whether the function clock is currently running
                pub fn is_running(&self) -> bool {
                    self.regs.$fcg().read() & (1 << $bit) == 0
                }
            }
        )+
    }
}

type FcgSelect = fn(Pwc) -> &'static crate::pac::Reg<u32>;

fn with_fcg_unlocked(regs: Pwc, select: FcgSelect, f: impl FnOnce(&crate::pac::Reg<u32>)) {
    let fcg = select(regs);
    // FCG0 is the only gate register behind its own key
    let protected = core::ptr::eq(fcg, regs.fcg0());
    if protected {
        regs.fcg0pc().write(FCG0PC_UNLOCK);
    }
    f(fcg);
    if protected {
        regs.fcg0pc().write(FCG0PC_LOCK);
    }
}

fn gate(regs: Pwc, select: FcgSelect, mask: u32) {
    with_fcg_unlocked(regs, select, |r| r.set_bits(mask));
}

fn ungate(regs: Pwc, select: FcgSelect, mask: u32) {
    with_fcg_unlocked(regs, select, |r| r.clear_bits(mask));
}

peripheral_clocks! (
    Dma1Clock, dma1, fcg0, 14,
    Dma2Clock, dma2, fcg0, 15,
    AosClock, aos, fcg0, 17,
    CrcClock, crc, fcg0, 23,
    KeyscanClock, keyscan, fcg0, 31,
    I2c1Clock, i2c1, fcg1, 4,
    I2c2Clock, i2c2, fcg1, 5,
    I2c3Clock, i2c3, fcg1, 6,
    Tmr01Clock, tmr0_1, fcg2, 0,
    Tmr02Clock, tmr0_2, fcg2, 1,
    Tmr41Clock, tmr4_1, fcg2, 8,
    Tmr42Clock, tmr4_2, fcg2, 9,
    Tmr43Clock, tmr4_3, fcg2, 10,
    CmpClock, cmp, fcg3, 8,
);

/// Register groups guarded by the FPRC write protection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Protect(u16);

impl Protect {
    /// Clock controller registers
    pub const CMU: Protect = Protect(FPRC_CMU);
    /// Power mode registers, including STPMCR
    pub const PWC: Protect = Protect(FPRC_PWC);
    /// Voltage detector registers
    pub const LVD: Protect = Protect(FPRC_LVD);
}

impl BitOr for Protect {
    type Output = Protect;

    fn bitor(self, rhs: Protect) -> Protect {
        Protect(self.0 | rhs.0)
    }
}

/// Allows writes to the registers in `what`.
pub(crate) fn unlock(sysreg: Sysreg, what: Protect) {
    let current = sysreg.fprc().read() & 0x00FF;
    sysreg.fprc().write(FPRC_KEY | current | what.0);
}

/// Blocks writes to the registers in `what` again.
pub(crate) fn lock(sysreg: Sysreg, what: Protect) {
    let current = sysreg.fprc().read() & 0x00FF;
    sysreg.fprc().write(FPRC_KEY | (current & !what.0));
}

/// Stop mode settings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StopConfig {
    /// Keep the system clock source after wakeup instead of falling back to MRC
    pub keep_clock_on_wake: bool,
    /// Wait for flash to be ready before running code after wakeup
    pub wait_flash_on_wake: bool,
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            keep_clock_on_wake: true,
            wait_flash_on_wake: true,
        }
    }
}

/// Power down depth, deeper modes retain less state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerDownMode {
    Mode1 = 0,
    Mode2 = 1,
    Mode3 = 2,
    Mode4 = 3,
}

/// Events able to end power down mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeupSource {
    /// WKUPx_y pin, numbered `4 * x + y` (0..16)
    Pin(u8),
    Lvd1,
    Lvd2,
    Nmi,
    RtcPeriod,
    RtcAlarm,
    WakeupTimer,
}

/// Active edge of a wakeup event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeupEdge {
    Falling,
    Rising,
}

impl WakeupSource {
    /// (PDWKEx register index, bit)
    fn enable_bit(self) -> (u8, u8) {
        match self {
            WakeupSource::Pin(n) => {
                assert!(n < 16, "wakeup pins are numbered 0..16");
                (n / 8, n % 8)
            }
            WakeupSource::Lvd1 => (2, 0),
            WakeupSource::Lvd2 => (2, 1),
            WakeupSource::Nmi => (2, 2),
            WakeupSource::RtcPeriod => (2, 4),
            WakeupSource::RtcAlarm => (2, 5),
            WakeupSource::WakeupTimer => (2, 7),
        }
    }

    /// (PDWKFx register index, bit). Pins share one flag per group of four.
    fn flag_bit(self) -> (u8, u8) {
        match self {
            WakeupSource::Pin(n) => (0, n / 4),
            WakeupSource::Lvd1 => (0, 4),
            WakeupSource::Lvd2 => (0, 5),
            WakeupSource::Nmi => (0, 7),
            WakeupSource::RtcPeriod => (1, 4),
            WakeupSource::RtcAlarm => (1, 5),
            WakeupSource::WakeupTimer => (1, 7),
        }
    }

    /// PDWKES bit, for sources with a selectable edge
    fn edge_bit(self) -> Option<u8> {
        match self {
            WakeupSource::Pin(n) => Some(n / 4),
            WakeupSource::Lvd1 => Some(4),
            WakeupSource::Lvd2 => Some(5),
            WakeupSource::Nmi => Some(6),
            _ => None,
        }
    }
}

/// Voltage detector unit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LvdUnit {
    Lvd1 = 0,
    Lvd2 = 1,
}

/// Detection threshold on VCC
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LvdLevel {
    V2_00 = 0,
    V2_10 = 1,
    V2_30 = 2,
    V2_55 = 3,
    V2_65 = 4,
    V2_75 = 5,
    V2_85 = 6,
    V2_95 = 7,
}

/// Digital filter sampling clock, in LRC cycles
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LvdFilter {
    Lrc1 = 0,
    Lrc2 = 1,
    Lrc4 = 2,
    /// Quarter LRC cycle
    LrcQuarter = 3,
}

/// What a voltage drop below the threshold triggers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LvdAction {
    /// Only the detection flag is raised
    None,
    /// Maskable interrupt through the LVD1/LVD2 event source
    Interrupt,
    /// Non-maskable interrupt
    Nmi,
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LvdConfig {
    pub level: LvdLevel,
    pub filter: Option<LvdFilter>,
    pub action: LvdAction,
}

impl Default for LvdConfig {
    fn default() -> Self {
        Self {
            level: LvdLevel::V2_00,
            filter: Some(LvdFilter::Lrc1),
            action: LvdAction::None,
        }
    }
}

/// Low power modes and voltage detection
pub struct Power {
    pwr: PWR,
    sysreg: Sysreg,
}

impl Power {
    pub fn new(pwr: PWR) -> Self {
        Self::with_sysreg(pwr, SYSREG::regs_unchecked())
    }

    pub(crate) fn with_sysreg(pwr: PWR, sysreg: Sysreg) -> Self {
        Power { pwr, sysreg }
    }

    pub fn free(self) -> PWR {
        self.pwr
    }

    /// Sleep until the next interrupt. Peripherals keep running.
    pub fn sleep(&mut self, scb: &mut SCB) {
        self.set_stop_bit(false);
        scb.clear_sleepdeep();
        cortex_m::asm::wfi();
    }

    /// Selects stop mode for the next deep sleep.
    pub fn configure_stop(&mut self, config: StopConfig) {
        let regs = self.pwr.regs();
        unlock(self.sysreg, Protect::PWC);
        regs.pwrc0().clear_bits(PWRC0_PWDN);
        self.sysreg.stpmcr().modify(|mut v| {
            v |= STPMCR_STOP;
            if config.keep_clock_on_wake {
                v |= STPMCR_CKSMRC;
            } else {
                v &= !STPMCR_CKSMRC;
            }
            if config.wait_flash_on_wake {
                v &= !STPMCR_FLNWT;
            } else {
                v |= STPMCR_FLNWT;
            }
            v
        });
        lock(self.sysreg, Protect::PWC);
    }

    /// Selects power down mode for the next deep sleep.
    pub fn configure_power_down(&mut self, mode: PowerDownMode) {
        let regs = self.pwr.regs();
        unlock(self.sysreg, Protect::PWC);
        self.sysreg.stpmcr().set_bits(STPMCR_STOP);
        regs.pwrc0()
            .write_field(PWRC0_PDMDS_MASK, PWRC0_PDMDS_SHIFT, mode as u8);
        regs.pwrc0().set_bits(PWRC0_PWDN);
        lock(self.sysreg, Protect::PWC);
    }

    /// Enters the deep sleep mode chosen with `configure_stop` or
    /// `configure_power_down`.
    pub fn deep_sleep(&mut self, scb: &mut SCB) {
        scb.set_sleepdeep();
        cortex_m::asm::wfi();
        scb.clear_sleepdeep();
    }

    fn set_stop_bit(&mut self, stop: bool) {
        unlock(self.sysreg, Protect::PWC);
        if stop {
            self.sysreg.stpmcr().set_bits(STPMCR_STOP);
        } else {
            self.sysreg.stpmcr().clear_bits(STPMCR_STOP);
        }
        lock(self.sysreg, Protect::PWC);
    }

    fn wake_enable_reg(&self, index: u8) -> &'static crate::pac::Reg<u8> {
        let regs = self.pwr.regs();
        match index {
            0 => regs.pdwke0(),
            1 => regs.pdwke1(),
            _ => regs.pdwke2(),
        }
    }

    pub fn enable_wakeup(&mut self, source: WakeupSource, edge: WakeupEdge) {
        let (index, bit) = source.enable_bit();
        unlock(self.sysreg, Protect::PWC);
        if let Some(edge_bit) = source.edge_bit() {
            match edge {
                WakeupEdge::Rising => self.pwr.regs().pdwkes().set_bits(1 << edge_bit),
                WakeupEdge::Falling => self.pwr.regs().pdwkes().clear_bits(1 << edge_bit),
            }
        }
        self.wake_enable_reg(index).set_bits(1 << bit);
        lock(self.sysreg, Protect::PWC);
    }

    pub fn disable_wakeup(&mut self, source: WakeupSource) {
        let (index, bit) = source.enable_bit();
        unlock(self.sysreg, Protect::PWC);
        self.wake_enable_reg(index).clear_bits(1 << bit);
        lock(self.sysreg, Protect::PWC);
    }

    /// Whether `source` ended the last power down
    pub fn woken_by(&self, source: WakeupSource) -> bool {
        let (index, bit) = source.flag_bit();
        let flags = if index == 0 {
            self.pwr.regs().pdwkf0()
        } else {
            self.pwr.regs().pdwkf1()
        };
        flags.is_set(1 << bit)
    }

    pub fn clear_wakeup_flags(&mut self) {
        unlock(self.sysreg, Protect::PWC);
        self.pwr.regs().pdwkf0().write(0);
        self.pwr.regs().pdwkf1().write(0);
        lock(self.sysreg, Protect::PWC);
    }

    /// Configures and enables a voltage detector.
    pub fn enable_lvd(&mut self, unit: LvdUnit, config: LvdConfig) {
        let regs = self.pwr.regs();
        let shift = unit as u8 * PVD_STRIDE;
        unlock(self.sysreg, Protect::LVD | Protect::PWC);

        regs.pvdlcr()
            .write_field(PVDLCR_LVL_MASK << shift, shift, config.level as u8);

        match config.filter {
            Some(clock) => {
                regs.pvdfcr().clear_bits(PVDFCR_NFDIS << shift);
                regs.pvdfcr().write_field(
                    PVDFCR_NFCKS_MASK << shift,
                    PVDFCR_NFCKS_SHIFT + shift,
                    clock as u8,
                );
            }
            None => regs.pvdfcr().set_bits(PVDFCR_NFDIS << shift),
        }

        // Interrupt/reset select
        match config.action {
            LvdAction::None => {
                regs.pvdcr1().clear_bits((PVDCR1_IRE | PVDCR1_IRS) << shift);
            }
            LvdAction::Interrupt => {
                regs.pvdicr().clear_bits(PVDICR_NMIS << shift);
                regs.pvdcr1().clear_bits(PVDCR1_IRS << shift);
                regs.pvdcr1().set_bits(PVDCR1_IRE << shift);
            }
            LvdAction::Nmi => {
                regs.pvdicr().set_bits(PVDICR_NMIS << shift);
                regs.pvdcr1().clear_bits(PVDCR1_IRS << shift);
                regs.pvdcr1().set_bits(PVDCR1_IRE << shift);
            }
            LvdAction::Reset => {
                regs.pvdcr1().set_bits((PVDCR1_IRE | PVDCR1_IRS) << shift);
            }
        }
        regs.pvdcr1().set_bits(PVDCR1_CMPOE << shift);

        let enable = match unit {
            LvdUnit::Lvd1 => PVDCR0_PVD1EN,
            LvdUnit::Lvd2 => PVDCR0_PVD2EN,
        };
        regs.pvdcr0().set_bits(enable);

        lock(self.sysreg, Protect::LVD | Protect::PWC);
        debug!("lvd{} enabled, level {}", unit as u8 + 1, config.level as u8);
    }

    pub fn disable_lvd(&mut self, unit: LvdUnit) {
        let regs = self.pwr.regs();
        let shift = unit as u8 * PVD_STRIDE;
        unlock(self.sysreg, Protect::LVD | Protect::PWC);
        regs.pvdcr1().clear_bits((PVDCR1_IRE | PVDCR1_CMPOE) << shift);
        let enable = match unit {
            LvdUnit::Lvd1 => PVDCR0_PVD1EN,
            LvdUnit::Lvd2 => PVDCR0_PVD2EN,
        };
        regs.pvdcr0().clear_bits(enable);
        lock(self.sysreg, Protect::LVD | Protect::PWC);
    }

    /// VCC has dropped below the threshold since the flag was last cleared
    pub fn lvd_detected(&self, unit: LvdUnit) -> bool {
        let shift = unit as u8 * PVD_STRIDE;
        self.pwr.regs().pvddsr().is_set(PVDDSR_DETFLG << shift)
    }

    /// VCC is currently above the threshold
    pub fn lvd_above_threshold(&self, unit: LvdUnit) -> bool {
        let shift = unit as u8 * PVD_STRIDE;
        self.pwr.regs().pvddsr().is_set(PVDDSR_MON << shift)
    }

    pub fn clear_lvd_flag(&mut self, unit: LvdUnit) {
        let shift = unit as u8 * PVD_STRIDE;
        unlock(self.sysreg, Protect::LVD);
        self.pwr.regs().pvddsr().clear_bits(PVDDSR_DETFLG << shift);
        lock(self.sysreg, Protect::LVD);
    }
}

#[cfg(test)]
pub(crate) fn test_clocks() -> PeripheralClocks {
    use crate::pac::{pwc, ram_block};
    let regs = unsafe { pwc::Pwc::from_ptr(ram_block(0x20)) };
    PeripheralClocks::new(PWC::from_block(regs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac::{pwr, ram_block, sysreg};

    #[test]
    fn gates_start_closed_and_open_on_enable() {
        let clocks = test_clocks();
        let regs = clocks.crc.regs;
        assert!(!clocks.crc.is_running());
        assert_eq!(regs.fcg0().read() & (1 << 23), 1 << 23);

        let crc = clocks.crc.into_enabled_clock();
        assert!(crc.is_running());
        assert_eq!(regs.fcg0().read() & (1 << 23), 0);
        // FCG0 was locked again afterwards
        assert_eq!(regs.fcg0pc().read(), FCG0PC_LOCK);

        let i2c = clocks.i2c2.into_enabled_clock();
        assert_eq!(regs.fcg1().read(), (1 << 4) | (1 << 6));
        let _ = i2c.into_disabled_clock();
        assert_eq!(regs.fcg1().read(), 0b111 << 4);
    }

    fn power() -> (Power, Sysreg) {
        let sysreg = unsafe { sysreg::Sysreg::from_ptr(ram_block(0x400)) };
        let pwr = unsafe { pwr::Pwr::from_ptr(ram_block(0x20)) };
        (Power::with_sysreg(PWR::from_block(pwr), sysreg), sysreg)
    }

    #[test]
    fn write_protection_keeps_other_groups() {
        let (_, sysreg) = power();
        unlock(sysreg, Protect::CMU | Protect::LVD);
        assert_eq!(sysreg.fprc().read(), 0xA509);
        lock(sysreg, Protect::CMU);
        assert_eq!(sysreg.fprc().read(), 0xA508);
    }

    #[test]
    fn stop_and_power_down_configuration() {
        let (mut power, sysreg) = power();
        power.configure_stop(StopConfig::default());
        assert_eq!(sysreg.stpmcr().read(), STPMCR_STOP | STPMCR_CKSMRC);
        assert_eq!(power.pwr.regs().pwrc0().read() & PWRC0_PWDN, 0);

        power.configure_power_down(PowerDownMode::Mode3);
        assert_eq!(power.pwr.regs().pwrc0().read(), PWRC0_PWDN | 2);
        assert_eq!(sysreg.fprc().read() & 0xFF, 0);
    }

    #[test]
    fn wakeup_sources_map_to_their_registers() {
        let (mut power, _) = power();
        power.enable_wakeup(WakeupSource::Pin(9), WakeupEdge::Rising);
        power.enable_wakeup(WakeupSource::WakeupTimer, WakeupEdge::Rising);
        let regs = power.pwr.regs();
        assert_eq!(regs.pdwke1().read(), 1 << 1);
        assert_eq!(regs.pdwke2().read(), 1 << 7);
        assert_eq!(regs.pdwkes().read(), 1 << 2);

        regs.pdwkf0().write(1 << 2);
        assert!(power.woken_by(WakeupSource::Pin(10)));
        assert!(!power.woken_by(WakeupSource::Pin(3)));
        power.clear_wakeup_flags();
        assert!(!power.woken_by(WakeupSource::Pin(10)));
    }

    #[test]
    fn lvd2_fields_sit_in_upper_nibble() {
        let (mut power, _) = power();
        power.enable_lvd(
            LvdUnit::Lvd2,
            LvdConfig {
                level: LvdLevel::V2_85,
                filter: None,
                action: LvdAction::Reset,
            },
        );
        let regs = power.pwr.regs();
        assert_eq!(regs.pvdlcr().read(), 6 << 4);
        assert_eq!(regs.pvdfcr().read(), PVDFCR_NFDIS << 4);
        assert_eq!(
            regs.pvdcr1().read(),
            (PVDCR1_IRE | PVDCR1_IRS | PVDCR1_CMPOE) << 4
        );
        assert_eq!(regs.pvdcr0().read(), PVDCR0_PVD2EN);

        regs.pvddsr().write(PVDDSR_DETFLG << 4);
        assert!(power.lvd_detected(LvdUnit::Lvd2));
        power.clear_lvd_flag(LvdUnit::Lvd2);
        assert!(!power.lvd_detected(LvdUnit::Lvd2));
    }
}
