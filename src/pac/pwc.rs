//! Function clock gates

register_block! {
    /// Function clock control registers. A cleared bit leaves the
    /// peripheral clocked.
    Pwc {
        fcg0: u32 = 0x00,
        fcg1: u32 = 0x04,
        fcg2: u32 = 0x08,
        fcg3: u32 = 0x0C,
        /// FCG0 write protection
        fcg0pc: u32 = 0x10,
    }
}

/// Written to FCG0PC to unlock FCG0, `0xA5A5_0000` locks it again
pub const FCG0PC_UNLOCK: u32 = 0xA5A5_0001;
pub const FCG0PC_LOCK: u32 = 0xA5A5_0000;
