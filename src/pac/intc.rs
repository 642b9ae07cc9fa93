//! Interrupt controller: NMI, external pins and event to IRQ routing

use super::Reg;

register_block! {
    /// INTC registers
    Intc {
        nmicr: u32 = 0x000,
        nmienr: u32 = 0x004,
        nmifr: u32 = 0x008,
        nmicfr: u32 = 0x00C,
        /// Stop mode wakeup enable
        wupen: u32 = 0x050,
        /// External interrupt flags
        eifr: u32 = 0x054,
        /// External interrupt flag clear
        eifcr: u32 = 0x058,
        /// Software interrupt enable
        swier: u32 = 0x29C,
        /// Event enable
        evter: u32 = 0x2A0,
        /// Interrupt enable
        ier: u32 = 0x2A4,
    }
}

impl Intc {
    /// External interrupt line `n` (0..16) control
    pub fn eirqcr(self, n: u8) -> &'static Reg<u32> {
        self.at(0x010 + n as usize * 4)
    }

    /// Source select of IRQ `n` (0..128)
    pub fn sel(self, n: u8) -> &'static Reg<u32> {
        self.at(0x05C + n as usize * 4)
    }

    /// Shared vector source enable of IRQ `n` (128..144)
    pub fn vssel(self, n: u8) -> &'static Reg<u32> {
        self.at(0x25C + (n as usize - 128) * 4)
    }
}

pub const EIRQCR_EIRQTRG_MASK: u32 = 0x3;
pub const EIRQCR_EIRQTRG_SHIFT: u8 = 0;
pub const EIRQCR_EISMPCLK_MASK: u32 = 0x3 << 4;
pub const EIRQCR_EISMPCLK_SHIFT: u8 = 4;
pub const EIRQCR_EFEN: u32 = 1 << 7;

pub const SEL_MASK: u32 = 0x1FF;
/// Source value of an unused IRQ select register
pub const SEL_NONE: u32 = 0x1FF;

pub const NMI_SWDTEN: u32 = 1 << 1;
pub const NMI_PVD1EN: u32 = 1 << 2;
pub const NMI_PVD2EN: u32 = 1 << 3;
pub const NMI_XTALSTPEN: u32 = 1 << 5;
