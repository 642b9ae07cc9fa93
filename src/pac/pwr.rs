//! Power mode control and voltage detection

register_block! {
    /// Power control registers
    Pwr {
        pwrc0: u8 = 0x000,
        pwrc1: u8 = 0x001,
        pdwke0: u8 = 0x004,
        pdwke1: u8 = 0x005,
        pdwke2: u8 = 0x006,
        /// Wakeup edge select
        pdwkes: u8 = 0x007,
        pdwkf0: u8 = 0x008,
        pdwkf1: u8 = 0x009,
        pvdcr0: u8 = 0x012,
        pvdcr1: u8 = 0x013,
        /// Digital filter control
        pvdfcr: u8 = 0x014,
        /// Threshold level
        pvdlcr: u8 = 0x015,
        /// NMI selection
        pvdicr: u8 = 0x016,
        /// Detection status
        pvddsr: u8 = 0x017,
    }
}

pub const PWRC0_PDMDS_MASK: u8 = 0x3;
pub const PWRC0_PDMDS_SHIFT: u8 = 0;
pub const PWRC0_PWDN: u8 = 1 << 7;

pub const PVDCR0_PVD1EN: u8 = 1 << 5;
pub const PVDCR0_PVD2EN: u8 = 1 << 6;

/// Per-detector bits in PVDCR1/PVDFCR/PVDLCR/PVDICR/PVDDSR sit at
/// `4 * (unit - 1)` above the PVD1 position.
pub const PVD_STRIDE: u8 = 4;

pub const PVDCR1_IRE: u8 = 1 << 0;
pub const PVDCR1_IRS: u8 = 1 << 1;
pub const PVDCR1_CMPOE: u8 = 1 << 2;

pub const PVDFCR_NFDIS: u8 = 1 << 0;
pub const PVDFCR_NFCKS_MASK: u8 = 0x3 << 1;
pub const PVDFCR_NFCKS_SHIFT: u8 = 1;

pub const PVDLCR_LVL_MASK: u8 = 0x7;

pub const PVDICR_NMIS: u8 = 1 << 0;

pub const PVDDSR_MON: u8 = 1 << 0;
pub const PVDDSR_DETFLG: u8 = 1 << 1;
