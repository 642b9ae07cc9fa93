//! Voltage comparators and their 8-bit reference DACs

use super::Reg;

register_block! {
    /// Comparator registers, units at 0x00/0x10/0x20
    Cmp {
        dadr1: u16 = 0x100,
        dadr2: u16 = 0x102,
        /// DAC control
        dacr: u16 = 0x108,
        /// Internal reference select
        rvadc: u16 = 0x10C,
    }
}

impl Cmp {
    pub fn ctrl(self, unit: u8) -> &'static Reg<u16> {
        self.at(unit as usize * 0x10)
    }

    /// Input selection
    pub fn vltsel(self, unit: u8) -> &'static Reg<u16> {
        self.at(unit as usize * 0x10 + 0x02)
    }

    /// Output monitor
    pub fn outmon(self, unit: u8) -> &'static Reg<u16> {
        self.at(unit as usize * 0x10 + 0x04)
    }
}

pub const CTRL_FLTSL_MASK: u16 = 0x7;
pub const CTRL_FLTSL_SHIFT: u8 = 0;
pub const CTRL_EDGSL_MASK: u16 = 0x3 << 5;
pub const CTRL_EDGSL_SHIFT: u8 = 5;
pub const CTRL_IEN: u16 = 1 << 7;
pub const CTRL_CVSEN: u16 = 1 << 8;
pub const CTRL_OUTEN: u16 = 1 << 12;
pub const CTRL_INV: u16 = 1 << 13;
pub const CTRL_CMPOE: u16 = 1 << 14;
pub const CTRL_CMPON: u16 = 1 << 15;

pub const VLTSEL_RVSL_MASK: u16 = 0xF;
pub const VLTSEL_RVSL_SHIFT: u8 = 0;
pub const VLTSEL_CVSL_MASK: u16 = 0xF << 8;
pub const VLTSEL_CVSL_SHIFT: u8 = 8;

pub const OUTMON_OMON: u16 = 1 << 0;

pub const DACR_DA1EN: u16 = 1 << 0;
pub const DACR_DA2EN: u16 = 1 << 1;
