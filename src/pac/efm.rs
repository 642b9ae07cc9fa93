//! Embedded flash memory controller

register_block! {
    /// EFM registers
    Efm {
        /// Access protection (unlock keys)
        faprt: u32 = 0x00,
        /// Flash stop
        fstp: u32 = 0x04,
        /// Read mode
        frmc: u32 = 0x08,
        /// Erase/program mode
        fwmc: u32 = 0x0C,
        /// Status
        fsr: u32 = 0x10,
        /// Status clear
        fsclr: u32 = 0x14,
        /// Interrupt enable
        fite: u32 = 0x18,
        /// Boot swap status
        fswp: u32 = 0x1C,
        /// Window protection start
        fpmtsw: u32 = 0x20,
        /// Window protection end
        fpmtew: u32 = 0x24,
        uqid0: u32 = 0x50,
        uqid1: u32 = 0x54,
        uqid2: u32 = 0x58,
    }
}

pub const FAPRT_KEY1: u32 = 0x0123;
pub const FAPRT_KEY2: u32 = 0x3210;

pub const FSTP_FSTP: u32 = 1 << 0;

pub const FRMC_SLPMD: u32 = 1 << 0;
pub const FRMC_FLWT_MASK: u32 = 0xF << 4;
pub const FRMC_FLWT_SHIFT: u8 = 4;
pub const FRMC_LVM: u32 = 1 << 8;
pub const FRMC_CACHE: u32 = 1 << 16;
pub const FRMC_CRST: u32 = 1 << 24;

pub const FWMC_PEMODE: u32 = 1 << 0;
pub const FWMC_PEMOD_MASK: u32 = 0x7 << 4;
pub const FWMC_PEMOD_SHIFT: u8 = 4;
pub const FWMC_BUSHLDCTL: u32 = 1 << 8;

pub const PEMOD_READ_ONLY: u32 = 0;
pub const PEMOD_SINGLE: u32 = 1;
pub const PEMOD_SINGLE_READBACK: u32 = 2;
pub const PEMOD_SEQUENCE: u32 = 3;
pub const PEMOD_SECTOR_ERASE: u32 = 4;
pub const PEMOD_CHIP_ERASE: u32 = 5;

pub const FSR_PEWERR: u32 = 1 << 0;
pub const FSR_PEPRTERR: u32 = 1 << 1;
pub const FSR_PGSZERR: u32 = 1 << 2;
pub const FSR_PGMISMTCH: u32 = 1 << 3;
pub const FSR_OPTEND: u32 = 1 << 4;
pub const FSR_COLERR: u32 = 1 << 5;
pub const FSR_RDY: u32 = 1 << 8;
pub const FSR_ERRORS: u32 =
    FSR_PEWERR | FSR_PEPRTERR | FSR_PGSZERR | FSR_PGMISMTCH | FSR_COLERR;
pub const FSR_CLEARABLE: u32 = FSR_ERRORS | FSR_OPTEND;

pub const FITE_PEERRITE: u32 = 1 << 0;
pub const FITE_OPTENDITE: u32 = 1 << 1;
pub const FITE_COLERRITE: u32 = 1 << 2;
