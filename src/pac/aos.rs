//! Automatic operation system: hardware event routing

register_block! {
    /// AOS registers
    Aos {
        /// Software event trigger
        intsfttrg: u32 = 0x00,
    }
}

impl Aos {
    /// DMA unit 1 channel `ch` trigger select
    pub fn dma1_trgsel(self, ch: usize) -> &'static super::Reg<u32> {
        self.at(0x20 + ch * 4)
    }

    /// DMA unit 2 channel `ch` trigger select
    pub fn dma2_trgsel(self, ch: usize) -> &'static super::Reg<u32> {
        self.at(0x30 + ch * 4)
    }
}

pub const INTSFTTRG_STRG: u32 = 1 << 0;
pub const TRGSEL_MASK: u32 = 0x1FF;
