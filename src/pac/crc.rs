//! CRC unit

register_block! {
    /// CRC registers
    Crc {
        /// Control
        cr: u32 = 0x00,
        /// Initial value on write, result on read
        reslt: u32 = 0x04,
        /// Check flag
        flg: u32 = 0x0C,
        /// Data input, word wide
        dat32: u32 = 0x80,
        /// Data input, half-word wide
        dat16: u16 = 0x80,
        /// Data input, byte wide
        dat8: u8 = 0x80,
    }
}

pub const CR_SEL: u32 = 1 << 0;
pub const CR_REFIN: u32 = 1 << 1;
pub const CR_REFOUT: u32 = 1 << 2;
pub const CR_XOROUT: u32 = 1 << 3;

pub const FLG_FLAG: u32 = 1 << 0;
