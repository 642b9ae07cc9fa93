//! Clock controller and system control registers

register_block! {
    /// System registers (CMU and power mode bits)
    Sysreg {
        /// Stop mode control
        stpmcr: u16 = 0x00C,
        pericksel: u16 = 0x010,
        /// Bus clock dividers
        scfgr: u32 = 0x020,
        /// System clock switch
        ckswr: u8 = 0x026,
        pllcr: u8 = 0x02A,
        xtalcr: u8 = 0x032,
        xtalcfgr: u8 = 0x033,
        xtal32cr: u8 = 0x034,
        hrccr: u8 = 0x036,
        lrccr: u8 = 0x037,
        mrccr: u8 = 0x038,
        /// Oscillator stable status
        oscstbsr: u8 = 0x03C,
        mco1cfgr: u8 = 0x03D,
        mco2cfgr: u8 = 0x03E,
        /// XTAL stop detection control
        xtalstdcr: u8 = 0x040,
        /// XTAL stop detection status
        xtalstdsr: u8 = 0x041,
        pllcfgr: u32 = 0x100,
        /// Register write protection
        fprc: u16 = 0x3FE,
    }
}

pub const STPMCR_FLNWT: u16 = 1 << 0;
pub const STPMCR_CKSMRC: u16 = 1 << 1;
pub const STPMCR_STOP: u16 = 1 << 15;

pub const SCFGR_PCLK0S_SHIFT: u8 = 0;
pub const SCFGR_PCLK1S_SHIFT: u8 = 4;
pub const SCFGR_PCLK2S_SHIFT: u8 = 8;
pub const SCFGR_PCLK3S_SHIFT: u8 = 12;
pub const SCFGR_PCLK4S_SHIFT: u8 = 16;
pub const SCFGR_EXCKS_SHIFT: u8 = 20;
pub const SCFGR_HCLKS_SHIFT: u8 = 24;
pub const SCFGR_DIV_MASK: u32 = 0x7;

pub const CKSW_HRC: u8 = 0;
pub const CKSW_MRC: u8 = 1;
pub const CKSW_LRC: u8 = 2;
pub const CKSW_XTAL: u8 = 3;
pub const CKSW_XTAL32: u8 = 4;
pub const CKSW_MPLL: u8 = 5;

pub const PLLCR_MPLLOFF: u8 = 1 << 0;
/// Stop bit shared by the oscillator control registers (XTALCR, HRCCR, ...)
pub const OSC_STOP: u8 = 1 << 0;

pub const OSCSTBSR_HRCSTBF: u8 = 1 << 0;
pub const OSCSTBSR_XTALSTBF: u8 = 1 << 3;
pub const OSCSTBSR_MPLLSTBF: u8 = 1 << 5;

pub const MCOCFGR_SEL_MASK: u8 = 0xF;
pub const MCOCFGR_DIV_MASK: u8 = 0x7 << 4;
pub const MCOCFGR_DIV_SHIFT: u8 = 4;
pub const MCOCFGR_EN: u8 = 1 << 7;

pub const XTALSTDCR_IE: u8 = 1 << 0;
pub const XTALSTDCR_RE: u8 = 1 << 1;
pub const XTALSTDCR_RIS: u8 = 1 << 2;
pub const XTALSTDCR_E: u8 = 1 << 7;
pub const XTALSTDSR_F: u8 = 1 << 0;

pub const PLLCFGR_M_SHIFT: u8 = 0;
pub const PLLCFGR_SRC_HRC: u32 = 1 << 7;
pub const PLLCFGR_N_SHIFT: u8 = 8;
pub const PLLCFGR_R_SHIFT: u8 = 20;
pub const PLLCFGR_Q_SHIFT: u8 = 24;
pub const PLLCFGR_P_SHIFT: u8 = 28;

pub const FPRC_KEY: u16 = 0xA500;
pub const FPRC_CMU: u16 = 1 << 0;
pub const FPRC_PWC: u16 = 1 << 1;
pub const FPRC_LVD: u16 = 1 << 3;
