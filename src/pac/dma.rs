//! DMA controller

use super::Reg;

register_block! {
    /// DMA unit registers
    Dma {
        /// Unit enable
        en: u32 = 0x00,
        /// Error status
        intstat0: u32 = 0x04,
        /// Completion status
        intstat1: u32 = 0x08,
        intmask0: u32 = 0x0C,
        intmask1: u32 = 0x10,
        intclr0: u32 = 0x14,
        intclr1: u32 = 0x18,
        /// Channel enable
        chen: u32 = 0x1C,
        /// Channel status
        chstat: u32 = 0x24,
    }
}

const CH_STRIDE: usize = 0x40;
const CH_BASE: usize = 0x40;

impl Dma {
    fn ch_reg(self, ch: u8, offset: usize) -> &'static Reg<u32> {
        self.at(CH_BASE + ch as usize * CH_STRIDE + offset)
    }

    /// Source address
    pub fn sar(self, ch: u8) -> &'static Reg<u32> {
        self.ch_reg(ch, 0x00)
    }

    /// Destination address
    pub fn dar(self, ch: u8) -> &'static Reg<u32> {
        self.ch_reg(ch, 0x04)
    }

    /// Block size and block count
    pub fn dtctl(self, ch: u8) -> &'static Reg<u32> {
        self.ch_reg(ch, 0x08)
    }

    /// Repeat sizes
    pub fn rpt(self, ch: u8) -> &'static Reg<u32> {
        self.ch_reg(ch, 0x0C)
    }

    /// Source non-sequential control
    pub fn snseqctl(self, ch: u8) -> &'static Reg<u32> {
        self.ch_reg(ch, 0x10)
    }

    /// Destination non-sequential control
    pub fn dnseqctl(self, ch: u8) -> &'static Reg<u32> {
        self.ch_reg(ch, 0x14)
    }

    /// Linked list pointer
    pub fn llp(self, ch: u8) -> &'static Reg<u32> {
        self.ch_reg(ch, 0x18)
    }

    /// Channel control
    pub fn chctl(self, ch: u8) -> &'static Reg<u32> {
        self.ch_reg(ch, 0x1C)
    }
}

pub const EN_EN: u32 = 1 << 0;

pub const INTSTAT0_TRNERR_SHIFT: u8 = 0;
pub const INTSTAT0_REQERR_SHIFT: u8 = 16;
pub const INTSTAT1_TC_SHIFT: u8 = 0;
pub const INTSTAT1_BTC_SHIFT: u8 = 16;

pub const DTCTL_BLKSIZE_MASK: u32 = 0x3FF;
pub const DTCTL_BLKSIZE_SHIFT: u8 = 0;
pub const DTCTL_CNT_MASK: u32 = 0xFFFF << 16;
pub const DTCTL_CNT_SHIFT: u8 = 16;

pub const RPT_SRPT_MASK: u32 = 0x3FF;
pub const RPT_SRPT_SHIFT: u8 = 0;
pub const RPT_DRPT_MASK: u32 = 0x3FF << 16;
pub const RPT_DRPT_SHIFT: u8 = 16;

pub const CHCTL_SINC_MASK: u32 = 0x3;
pub const CHCTL_SINC_SHIFT: u8 = 0;
pub const CHCTL_DINC_MASK: u32 = 0x3 << 2;
pub const CHCTL_DINC_SHIFT: u8 = 2;
pub const CHCTL_SRPTEN: u32 = 1 << 4;
pub const CHCTL_DRPTEN: u32 = 1 << 5;
pub const CHCTL_SNSEQEN: u32 = 1 << 6;
pub const CHCTL_DNSEQEN: u32 = 1 << 7;
pub const CHCTL_HSIZE_MASK: u32 = 0x3 << 8;
pub const CHCTL_HSIZE_SHIFT: u8 = 8;
pub const CHCTL_LLPEN: u32 = 1 << 10;
pub const CHCTL_LLPRUN: u32 = 1 << 11;
pub const CHCTL_IE: u32 = 1 << 12;
