//! Timer4: motor control timer with three complementary output pairs

use super::Reg;

register_block! {
    /// Timer4 registers
    Tmr4 {
        /// Period (peak value)
        cpsr: u16 = 0x42,
        /// Counter
        cntr: u16 = 0x46,
        /// Counter control and status
        ccsr: u16 = 0x48,
        /// Interrupt mask counters
        cvpr: u16 = 0x4A,
        /// Reload timer control
        rcsr: u16 = 0xA4,
        /// Extended control
        ecsr: u16 = 0xF0,
    }
}

impl Tmr4 {
    /// Output compare value, `ch` in UH, UL, VH, VL, WH, WL order
    pub fn occr(self, ch: u8) -> &'static Reg<u16> {
        self.at(0x02 + ch as usize * 4)
    }

    /// Output compare control of pair `pair` (U, V, W)
    pub fn ocsr(self, pair: u8) -> &'static Reg<u16> {
        self.at(0x18 + pair as usize * 4)
    }

    /// Output compare buffer and link control
    pub fn ocer(self, pair: u8) -> &'static Reg<u16> {
        self.at(0x1A + pair as usize * 4)
    }

    /// Output action table of the high channel
    pub fn ocmrh(self, pair: u8) -> &'static Reg<u16> {
        self.at(0x24 + pair as usize * 8)
    }

    /// Output action table of the low channel, including the linked actions
    pub fn ocmrl(self, pair: u8) -> &'static Reg<u32> {
        self.at(0x28 + pair as usize * 8)
    }

    /// Reload (dead time filter) value
    pub fn pfsr(self, pair: u8) -> &'static Reg<u16> {
        self.at(0x82 + pair as usize * 8)
    }

    /// Dead time A (rising edge delay)
    pub fn pdar(self, pair: u8) -> &'static Reg<u16> {
        self.at(0x84 + pair as usize * 8)
    }

    /// Dead time B (falling edge delay)
    pub fn pdbr(self, pair: u8) -> &'static Reg<u16> {
        self.at(0x86 + pair as usize * 8)
    }

    /// PWM generator control
    pub fn pocr(self, pair: u8) -> &'static Reg<u16> {
        self.at(0x98 + pair as usize * 4)
    }

    /// Special event compare value
    pub fn sccr(self, ch: u8) -> &'static Reg<u16> {
        self.at(0xB2 + ch as usize * 4)
    }

    /// Special event control
    pub fn scsr(self, ch: u8) -> &'static Reg<u16> {
        self.at(0xC8 + ch as usize * 4)
    }

    /// Special event mask
    pub fn scmr(self, ch: u8) -> &'static Reg<u16> {
        self.at(0xCA + ch as usize * 4)
    }
}

pub const CCSR_CKDIV_MASK: u16 = 0xF;
pub const CCSR_CKDIV_SHIFT: u8 = 0;
pub const CCSR_CLEAR: u16 = 1 << 4;
pub const CCSR_MODE: u16 = 1 << 5;
pub const CCSR_STOP: u16 = 1 << 6;
pub const CCSR_BUFEN: u16 = 1 << 7;
pub const CCSR_IRQPEN: u16 = 1 << 8;
pub const CCSR_IRQPF: u16 = 1 << 9;
pub const CCSR_IRQZEN: u16 = 1 << 13;
pub const CCSR_IRQZF: u16 = 1 << 14;
pub const CCSR_ECKEN: u16 = 1 << 15;

pub const CVPR_ZIM_MASK: u16 = 0xF;
pub const CVPR_ZIM_SHIFT: u8 = 0;
pub const CVPR_PIM_MASK: u16 = 0xF << 4;
pub const CVPR_PIM_SHIFT: u8 = 4;
pub const CVPR_ZIC_MASK: u16 = 0xF << 8;
pub const CVPR_ZIC_SHIFT: u8 = 8;
pub const CVPR_PIC_MASK: u16 = 0xF << 12;
pub const CVPR_PIC_SHIFT: u8 = 12;

pub const OCSR_OCEH: u16 = 1 << 0;
pub const OCSR_OCEL: u16 = 1 << 1;
pub const OCSR_OCPH: u16 = 1 << 2;
pub const OCSR_OCPL: u16 = 1 << 3;
pub const OCSR_OCIEH: u16 = 1 << 4;
pub const OCSR_OCIEL: u16 = 1 << 5;
pub const OCSR_OCFH: u16 = 1 << 6;
pub const OCSR_OCFL: u16 = 1 << 7;

pub const OCER_CHBUFEN_SHIFT: u8 = 0;
pub const OCER_CLBUFEN_SHIFT: u8 = 2;
pub const OCER_MHBUFEN_SHIFT: u8 = 4;
pub const OCER_MLBUFEN_SHIFT: u8 = 6;
pub const OCER_BUF_MASK: u16 = 0x3;
pub const OCER_LMCH: u16 = 1 << 8;
pub const OCER_LMCL: u16 = 1 << 9;
pub const OCER_LMMH: u16 = 1 << 10;
pub const OCER_LMML: u16 = 1 << 11;
pub const OCER_MCECH: u16 = 1 << 12;
pub const OCER_MCECL: u16 = 1 << 13;

/// OCMRH/OCMRL low nibble: which count events may raise the match flag
pub const OCMR_OCFDC: u32 = 1 << 0;
pub const OCMR_OCFPK: u32 = 1 << 1;
pub const OCMR_OCFUC: u32 = 1 << 2;
pub const OCMR_OCFZR: u32 = 1 << 3;

pub const OCMR_OPDC_SHIFT: u8 = 4;
pub const OCMR_OPPK_SHIFT: u8 = 6;
pub const OCMR_OPUC_SHIFT: u8 = 8;
pub const OCMR_OPZR_SHIFT: u8 = 10;
pub const OCMR_OPNPK_SHIFT: u8 = 12;
pub const OCMR_OPNZR_SHIFT: u8 = 14;
pub const OCMRL_EOPNDC_SHIFT: u8 = 16;
pub const OCMRL_EOPNUC_SHIFT: u8 = 18;
pub const OCMRL_EOPDC_SHIFT: u8 = 20;
pub const OCMRL_EOPPK_SHIFT: u8 = 22;
pub const OCMRL_EOPUC_SHIFT: u8 = 24;
pub const OCMRL_EOPZR_SHIFT: u8 = 26;
pub const OCMRL_EOPNPK_SHIFT: u8 = 28;
pub const OCMRL_EOPNZR_SHIFT: u8 = 30;

pub const POCR_DIVCK_MASK: u16 = 0x7;
pub const POCR_DIVCK_SHIFT: u8 = 0;
pub const POCR_PWMMD_MASK: u16 = 0x3 << 4;
pub const POCR_PWMMD_SHIFT: u8 = 4;
pub const POCR_LVLS_MASK: u16 = 0x3 << 6;
pub const POCR_LVLS_SHIFT: u8 = 6;

/// RCSR: RTIDx in bits 0..3, per pair control nibble from bit 4
pub const RCSR_RTID_SHIFT: u8 = 0;
pub const RCSR_PAIR_SHIFT: u8 = 4;
pub const RCSR_PAIR_STRIDE: u8 = 4;
pub const RCSR_RTIF: u16 = 1 << 0;
pub const RCSR_RTIC: u16 = 1 << 1;
pub const RCSR_RTE: u16 = 1 << 2;
pub const RCSR_RTS: u16 = 1 << 3;

pub const SCSR_BUFEN_MASK: u16 = 0x3;
pub const SCSR_BUFEN_SHIFT: u8 = 0;
pub const SCSR_EVTOS_MASK: u16 = 0x7 << 2;
pub const SCSR_EVTOS_SHIFT: u8 = 2;
pub const SCSR_LMC: u16 = 1 << 5;
pub const SCSR_EVTMS: u16 = 1 << 8;
pub const SCSR_EVTDS: u16 = 1 << 9;
pub const SCSR_DEN: u16 = 1 << 12;
pub const SCSR_PEN: u16 = 1 << 13;
pub const SCSR_UEN: u16 = 1 << 14;
pub const SCSR_ZEN: u16 = 1 << 15;

pub const SCMR_AMC_MASK: u16 = 0xF;
pub const SCMR_AMC_SHIFT: u8 = 0;
pub const SCMR_MZCE: u16 = 1 << 6;
pub const SCMR_MPCE: u16 = 1 << 7;
