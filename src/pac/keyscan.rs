//! Key scan controller

register_block! {
    /// KEYSCAN registers
    Keyscan {
        /// Scan configuration
        scr: u32 = 0x00,
        /// Scan enable
        ser: u32 = 0x04,
        /// Scan status
        ssr: u32 = 0x08,
    }
}

pub const SCR_KEYINSEL_MASK: u32 = 0xFFFF;
pub const SCR_KEYOUTSEL_MASK: u32 = 0x7 << 16;
pub const SCR_KEYOUTSEL_SHIFT: u8 = 16;
pub const SCR_CKSEL_MASK: u32 = 0x3 << 20;
pub const SCR_CKSEL_SHIFT: u8 = 20;
pub const SCR_T_HIZ_MASK: u32 = 0x7 << 24;
pub const SCR_T_HIZ_SHIFT: u8 = 24;
pub const SCR_T_LLEVEL_MASK: u32 = 0x1F << 27;
pub const SCR_T_LLEVEL_SHIFT: u8 = 27;

pub const SER_SEN: u32 = 1 << 0;
pub const SSR_INDEX_MASK: u32 = 0x7;
