//! GPIO ports

use super::Reg;

register_block! {
    /// PORT registers. Per-port data registers sit at `port * 0x10`,
    /// per-pin configuration from 0x400.
    Port {
        /// Special control (debug pin release)
        pspcr: u16 = 0x3F4,
        /// Common control (input read wait)
        pccr: u16 = 0x3F6,
        /// Input always-enable
        pinaer: u16 = 0x3F8,
        /// Write protection
        pwpr: u16 = 0x3FC,
    }
}

impl Port {
    /// Input data
    pub fn pidr(self, port: u8) -> &'static Reg<u16> {
        self.at(port as usize * 0x10)
    }

    /// Output data
    pub fn podr(self, port: u8) -> &'static Reg<u16> {
        self.at(port as usize * 0x10 + 0x4)
    }

    /// Output enable
    pub fn poer(self, port: u8) -> &'static Reg<u16> {
        self.at(port as usize * 0x10 + 0x6)
    }

    /// Output set
    pub fn posr(self, port: u8) -> &'static Reg<u16> {
        self.at(port as usize * 0x10 + 0x8)
    }

    /// Output reset
    pub fn porr(self, port: u8) -> &'static Reg<u16> {
        self.at(port as usize * 0x10 + 0xA)
    }

    /// Output toggle
    pub fn potr(self, port: u8) -> &'static Reg<u16> {
        self.at(port as usize * 0x10 + 0xC)
    }

    /// Pin configuration
    pub fn pcr(self, port: u8, pin: u8) -> &'static Reg<u16> {
        self.at(0x400 + port as usize * 0x40 + pin as usize * 4)
    }

    /// Pin function select
    pub fn pfsr(self, port: u8, pin: u8) -> &'static Reg<u16> {
        self.at(0x402 + port as usize * 0x40 + pin as usize * 4)
    }
}

pub const PWPR_UNLOCK: u16 = 0xA501;
pub const PWPR_LOCK: u16 = 0xA500;

pub const PCR_POUT: u16 = 1 << 0;
pub const PCR_POUTE: u16 = 1 << 1;
pub const PCR_NOD: u16 = 1 << 2;
pub const PCR_DRV_MASK: u16 = 0x3 << 4;
pub const PCR_DRV_SHIFT: u8 = 4;
pub const PCR_PUU: u16 = 1 << 6;
pub const PCR_PIN: u16 = 1 << 8;
pub const PCR_INVE: u16 = 1 << 9;
pub const PCR_INTE: u16 = 1 << 12;
pub const PCR_LTE: u16 = 1 << 14;
pub const PCR_DDIS: u16 = 1 << 15;

pub const PFSR_FSEL_MASK: u16 = 0x3F;
pub const PFSR_FSEL_SHIFT: u8 = 0;
pub const PFSR_BFE: u16 = 1 << 8;

/// PSPCR bits releasing the JTAG/SWD pins for general use
pub const PSPCR_SPFE_MASK: u16 = 0x1F;
