//! Timer0: two 16-bit compare channels per unit

register_block! {
    /// Timer0 registers
    Tmr0 {
        cntar: u32 = 0x00,
        cntbr: u32 = 0x04,
        cmpar: u32 = 0x08,
        cmpbr: u32 = 0x0C,
        /// Base control, channel A in the low half-word, B in the high
        bconr: u32 = 0x10,
        /// Status flags
        stflr: u32 = 0x14,
    }
}

/// Bit offset of channel B fields in BCONR and STFLR
pub const CH_B_SHIFT: u8 = 16;

pub const BCONR_CST: u32 = 1 << 0;
pub const BCONR_CAPMD: u32 = 1 << 1;
pub const BCONR_INTEN: u32 = 1 << 2;
pub const BCONR_CKDIV_MASK: u32 = 0xF << 4;
pub const BCONR_CKDIV_SHIFT: u8 = 4;
pub const BCONR_SYNS: u32 = 1 << 8;
pub const BCONR_SYNCLK: u32 = 1 << 9;
pub const BCONR_ASYNCLK: u32 = 1 << 10;
pub const BCONR_HSTA: u32 = 1 << 12;
pub const BCONR_HSTP: u32 = 1 << 13;
pub const BCONR_HCLE: u32 = 1 << 14;
pub const BCONR_HICP: u32 = 1 << 15;

pub const STFLR_CMF: u32 = 1 << 0;
