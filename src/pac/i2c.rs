//! I2C channel

register_block! {
    /// I2C registers
    I2c {
        cr1: u32 = 0x00,
        /// Interrupt enables
        cr2: u32 = 0x04,
        /// Timeout control
        cr3: u32 = 0x08,
        slr0: u32 = 0x10,
        slr1: u32 = 0x14,
        /// SCL low timeout
        sltr: u32 = 0x18,
        sr: u32 = 0x1C,
        /// Status clear
        clr: u32 = 0x20,
        dtr: u8 = 0x24,
        drr: u8 = 0x28,
        /// Clock control
        ccr: u32 = 0x2C,
        /// Noise filter
        fltr: u32 = 0x30,
    }
}

pub const CR1_PE: u32 = 1 << 0;
pub const CR1_ENGC: u32 = 1 << 6;
pub const CR1_RESTART: u32 = 1 << 7;
pub const CR1_START: u32 = 1 << 8;
pub const CR1_STOP: u32 = 1 << 9;
/// Set to answer with NACK
pub const CR1_ACK: u32 = 1 << 10;
pub const CR1_SWRST: u32 = 1 << 15;

pub const SLR_ADDR_MASK: u32 = 0x3FF;
pub const SLR_EN: u32 = 1 << 12;
pub const SLR_ADDRMOD: u32 = 1 << 15;

pub const SR_STARTF: u32 = 1 << 0;
pub const SR_SLADDR0F: u32 = 1 << 1;
pub const SR_SLADDR1F: u32 = 1 << 2;
pub const SR_TENDF: u32 = 1 << 3;
pub const SR_STOPF: u32 = 1 << 4;
pub const SR_RFULLF: u32 = 1 << 6;
pub const SR_TEMPTYF: u32 = 1 << 7;
pub const SR_ARLOF: u32 = 1 << 9;
pub const SR_NACKF: u32 = 1 << 12;
pub const SR_TMOUTF: u32 = 1 << 14;
pub const SR_MSL: u32 = 1 << 16;
pub const SR_BUSY: u32 = 1 << 17;
pub const SR_TRA: u32 = 1 << 18;
pub const SR_GENCALLF: u32 = 1 << 20;
/// Every clearable flag in CLR
pub const CLR_ALL: u32 = 0x0015_56DF;

pub const CCR_SLOWW_MASK: u32 = 0x1F;
pub const CCR_SLOWW_SHIFT: u8 = 0;
pub const CCR_SHIGHW_MASK: u32 = 0x1F << 8;
pub const CCR_SHIGHW_SHIFT: u8 = 8;
pub const CCR_FREQ_MASK: u32 = 0x7 << 16;
pub const CCR_FREQ_SHIFT: u8 = 16;

pub const FLTR_DNF_MASK: u32 = 0x3;
pub const FLTR_DNFEN: u32 = 1 << 4;
pub const FLTR_ANFEN: u32 = 1 << 5;
