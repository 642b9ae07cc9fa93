//! Cyclic Redundancy Check (CRC)
//!
//! The unit computes the reflected CRC-16/X-25 (`x^16 + x^12 + x^5 + 1`) or
//! CRC-32 (IEEE 802.3) signature of data written to its data register. The
//! value written to `RESLT` before feeding data is the raw starting register,
//! so `0xFFFF` / `0xFFFF_FFFF` reproduce the standard checksums.
//!
//! [`software`] holds plain reference implementations producing the same
//! results, handy to cross-check the hardware or to run where the unit is busy.

use crate::pac::crc::{self, CR_REFIN, CR_REFOUT, CR_SEL, CR_XOROUT, FLG_FLAG};
use crate::pac::CRC;
use crate::pwc::{CrcClock, Enabled};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Width {
    Crc16,
    Crc32,
}

/// Bit ordering and output inversion of the hardware unit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CrcConfig {
    /// Reflect every input byte
    pub reflect_in: bool,
    /// Reflect the result
    pub reflect_out: bool,
    /// Complement the result
    pub xor_out: bool,
}

impl Default for CrcConfig {
    fn default() -> Self {
        Self {
            reflect_in: true,
            reflect_out: true,
            xor_out: true,
        }
    }
}

pub struct Crc {
    crc: CRC,
    config: CrcConfig,
}

impl Crc {
    pub fn new(crc: CRC, clock: &CrcClock<Enabled>) -> Self {
        Self::with_config(crc, clock, CrcConfig::default())
    }

    pub fn with_config(crc: CRC, _clock: &CrcClock<Enabled>, config: CrcConfig) -> Self {
        let mut crc = Crc { crc, config };
        crc.select(Width::Crc16);
        crc
    }

    pub fn config(&self) -> CrcConfig {
        self.config
    }

    pub fn set_config(&mut self, config: CrcConfig) {
        self.config = config;
    }

    pub fn free(self) -> CRC {
        self.crc
    }

    fn select(&mut self, width: Width) {
        let mut cr = 0;
        if width == Width::Crc32 {
            cr |= CR_SEL;
        }
        if self.config.reflect_in {
            cr |= CR_REFIN;
        }
        if self.config.reflect_out {
            cr |= CR_REFOUT;
        }
        if self.config.xor_out {
            cr |= CR_XOROUT;
        }
        self.crc.regs().cr().write(cr);
    }

    fn start(&mut self, width: Width, init: u32) -> crc::Crc {
        self.select(width);
        let regs = self.crc.regs();
        regs.reslt().write(init);
        regs
    }

    /// CRC-16 over a byte stream
    pub fn crc16(&mut self, init: u16, data: &[u8]) -> u16 {
        let regs = self.start(Width::Crc16, init as u32);
        for &byte in data {
            regs.dat8().write(byte);
        }
        regs.reslt().read() as u16
    }

    /// CRC-16 over half-words, low byte first
    pub fn crc16_words(&mut self, init: u16, data: &[u16]) -> u16 {
        let regs = self.start(Width::Crc16, init as u32);
        for &word in data {
            regs.dat16().write(word);
        }
        regs.reslt().read() as u16
    }

    /// CRC-32 over a byte stream
    pub fn crc32(&mut self, init: u32, data: &[u8]) -> u32 {
        let regs = self.start(Width::Crc32, init);
        for &byte in data {
            regs.dat8().write(byte);
        }
        regs.reslt().read()
    }

    /// CRC-32 over words, least significant byte first
    pub fn crc32_words(&mut self, init: u32, data: &[u32]) -> u32 {
        let regs = self.start(Width::Crc32, init);
        for &word in data {
            regs.dat32().write(word);
        }
        regs.reslt().read()
    }

    /// Feeds `data` followed by `expected` and reports whether the unit
    /// accepted the appended checksum.
    pub fn check16(&mut self, init: u16, data: &[u8], expected: u16) -> bool {
        let regs = self.start(Width::Crc16, init as u32);
        for &byte in data {
            regs.dat8().write(byte);
        }
        regs.dat16().write(expected);
        regs.flg().is_set(FLG_FLAG)
    }

    /// 32-bit counterpart of [`Crc::check16`].
    pub fn check32(&mut self, init: u32, data: &[u8], expected: u32) -> bool {
        let regs = self.start(Width::Crc32, init);
        for &byte in data {
            regs.dat8().write(byte);
        }
        regs.dat32().write(expected);
        regs.flg().is_set(FLG_FLAG)
    }
}

/// Table-driven and bitwise reference implementations
pub mod software {
    pub const POLY16: u16 = 0x8408;
    pub const POLY32: u32 = 0xEDB8_8320;

    const fn step16(mut crc: u16) -> u16 {
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ POLY16
            } else {
                crc >> 1
            };
            bit += 1;
        }
        crc
    }

    const fn step32(mut crc: u32) -> u32 {
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ POLY32
            } else {
                crc >> 1
            };
            bit += 1;
        }
        crc
    }

    const fn table16() -> [u16; 256] {
        let mut table = [0; 256];
        let mut i = 0;
        while i < 256 {
            table[i] = step16(i as u16);
            i += 1;
        }
        table
    }

    const fn table32() -> [u32; 256] {
        let mut table = [0; 256];
        let mut i = 0;
        while i < 256 {
            table[i] = step32(i as u32);
            i += 1;
        }
        table
    }

    pub static TABLE16: [u16; 256] = table16();
    pub static TABLE32: [u32; 256] = table32();

    /// Reflected CRC-16, one bit at a time. Returns the complemented remainder.
    pub fn crc16_bitwise(init: u16, data: &[u8]) -> u16 {
        let crc = data
            .iter()
            .fold(init, |crc, &byte| step16(crc ^ byte as u16));
        !crc
    }

    /// Reflected CRC-16 through [`TABLE16`].
    pub fn crc16(init: u16, data: &[u8]) -> u16 {
        let mut crc = init;
        for &byte in data {
            crc = (crc >> 8) ^ TABLE16[((crc ^ byte as u16) & 0xFF) as usize];
        }
        !crc
    }

    /// Reflected CRC-32, one bit at a time. Returns the complemented remainder.
    pub fn crc32_bitwise(init: u32, data: &[u8]) -> u32 {
        let crc = data
            .iter()
            .fold(init, |crc, &byte| step32(crc ^ byte as u32));
        !crc
    }

    /// Reflected CRC-32 through [`TABLE32`].
    pub fn crc32(init: u32, data: &[u8]) -> u32 {
        let mut crc = init;
        for &byte in data {
            crc = (crc >> 8) ^ TABLE32[((crc ^ byte as u32) & 0xFF) as usize];
        }
        !crc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac::ram_block;

    const CHECK: &[u8] = b"123456789";

    #[test]
    fn software_check_values() {
        assert_eq!(software::crc16_bitwise(0xFFFF, CHECK), 0x906E);
        assert_eq!(software::crc16(0xFFFF, CHECK), 0x906E);
        assert_eq!(software::crc32_bitwise(0xFFFF_FFFF, CHECK), 0xCBF4_3926);
        assert_eq!(software::crc32(0xFFFF_FFFF, CHECK), 0xCBF4_3926);
    }

    #[test]
    fn bitwise_and_table_agree() {
        let data = [0x12, 0x21, 0x00];
        assert_eq!(
            software::crc16_bitwise(0xFFFF, &data),
            software::crc16(0xFFFF, &data)
        );
        assert_eq!(
            software::crc32_bitwise(0xFFFF_FFFF, &data),
            software::crc32(0xFFFF_FFFF, &data)
        );
        assert_eq!(software::crc16(0xFFFF, &[]), 0x0000);
        assert_eq!(software::TABLE16[1], 0x1189);
        assert_eq!(software::TABLE32[1], 0x7707_3096);
    }

    fn unit() -> (Crc, crc::Crc) {
        let regs = unsafe { crc::Crc::from_ptr(ram_block(0x100)) };
        let clocks = crate::pwc::test_clocks();
        let clock = clocks.crc.into_enabled_clock();
        (Crc::new(CRC::from_block(regs), &clock), regs)
    }

    #[test]
    fn hardware_configuration() {
        let (mut crc, regs) = unit();
        assert_eq!(regs.cr().read(), CR_REFIN | CR_REFOUT | CR_XOROUT);

        // Ram stand-in hands back the seed
        assert_eq!(crc.crc32(0xFFFF_FFFF, &[1, 2, 3]), 0xFFFF_FFFF);
        assert_eq!(regs.cr().read(), CR_SEL | CR_REFIN | CR_REFOUT | CR_XOROUT);
        assert_eq!(regs.dat8().read(), 3);

        crc.set_config(CrcConfig {
            xor_out: false,
            ..Default::default()
        });
        crc.crc16_words(0x1234, &[0xABCD]);
        assert_eq!(regs.cr().read(), CR_REFIN | CR_REFOUT);
        assert_eq!(regs.dat16().read(), 0xABCD);
    }

    #[test]
    fn check_appends_expected_value() {
        let (mut crc, regs) = unit();
        assert!(!crc.check16(0xFFFF, CHECK, 0x906E));
        assert_eq!(regs.dat16().read(), 0x906E);

        regs.flg().write(FLG_FLAG);
        assert!(crc.check32(0xFFFF_FFFF, CHECK, 0xCBF4_3926));
        assert_eq!(regs.dat32().read(), 0xCBF4_3926);
    }
}
