//! Embedded flash memory (EFM)
//!
//! 512 KiB of flash in 64 sectors of 8 KiB, mapped at address 0. The
//! controller is register-locked until the two FAPRT keys are written; a
//! [`Flash`] keeps it unlocked for as long as it lives.
//!
//! Every erase or program operation follows the same pattern: enter the
//! requested P/E mode, touch the target address, poll `FSR.RDY` with a bounded
//! budget, turn error flags into [`Error`]s and return to read-only mode.

use embedded_storage::nor_flash::{
    check_erase, check_read, check_write, ErrorType, NorFlash, NorFlashError, NorFlashErrorKind,
    ReadNorFlash,
};

use crate::pac::efm::*;
use crate::pac::EFM;
use crate::time::Hertz;

pub const FLASH_SIZE: usize = 512 * 1024;
pub const SECTOR_SIZE: usize = 8 * 1024;
pub const SECTOR_COUNT: usize = FLASH_SIZE / SECTOR_SIZE;

/// Default iteration budget for the ready flag
pub const DEFAULT_TIMEOUT: u32 = 0x0010_0000;

/// Start address of `sector` (0..64).
///
/// ```
/// assert_eq!(hc32f460_hal::efm::sector_address(10), 0x0001_4000);
/// ```
pub const fn sector_address(sector: usize) -> u32 {
    assert!(sector < SECTOR_COUNT, "sector out of range");
    (sector * SECTOR_SIZE) as u32
}

/// Sector holding `address`, if it is inside the flash.
pub const fn sector_of(address: u32) -> Option<usize> {
    if (address as usize) < FLASH_SIZE {
        Some(address as usize / SECTOR_SIZE)
    } else {
        None
    }
}

/// Read wait cycles needed for `hclk`.
pub fn wait_cycles_for(hclk: Hertz) -> u8 {
    match hclk.to_Hz() {
        f if f <= 33_000_000 => 0,
        f if f <= 66_000_000 => 1,
        f if f <= 99_000_000 => 2,
        f if f <= 132_000_000 => 3,
        f if f <= 168_000_000 => 4,
        _ => 5,
    }
}

pub(crate) fn wait_cycles(regs: Efm) -> u8 {
    regs.frmc().read_field(FRMC_FLWT_MASK, FRMC_FLWT_SHIFT) as u8
}

/// Programs the read wait cycles, leaving the controller locked.
pub(crate) fn set_wait_cycles(regs: Efm, cycles: u8) {
    unlock(regs);
    regs.frmc()
        .write_field(FRMC_FLWT_MASK, FRMC_FLWT_SHIFT, cycles as u32);
    lock(regs);
    trace!("flash wait cycles {}", cycles);
}

fn unlock(regs: Efm) {
    regs.faprt().write(FAPRT_KEY1);
    regs.faprt().write(FAPRT_KEY2);
}

fn lock(regs: Efm) {
    regs.faprt().write(0);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Program/erase attempted while the controller was locked
    Locked,
    /// Target lies outside the protection window
    Protected,
    /// Access width not allowed in this mode
    ProgramSize,
    /// Value read back differs from the value programmed
    ProgramMismatch,
    /// Flash read while an operation was running
    Collision,
    /// The ready flag never came up
    Timeout,
    NotAligned,
    OutOfBounds,
    /// Address 0 can only be reached with a plain load or store on the
    /// core; other targets report it
    NullAddress,
}

impl NorFlashError for Error {
    fn kind(&self) -> NorFlashErrorKind {
        match self {
            Error::NotAligned => NorFlashErrorKind::NotAligned,
            Error::OutOfBounds => NorFlashErrorKind::OutOfBounds,
            _ => NorFlashErrorKind::Other,
        }
    }
}

impl From<NorFlashErrorKind> for Error {
    fn from(kind: NorFlashErrorKind) -> Self {
        match kind {
            NorFlashErrorKind::NotAligned => Error::NotAligned,
            _ => Error::OutOfBounds,
        }
    }
}

/// Flash driver
pub struct Flash {
    efm: EFM,
    base: *mut u8,
    capacity: usize,
    timeout: u32,
}

impl Flash {
    /// Unlocks the controller for the lifetime of the driver.
    pub fn new(efm: EFM) -> Self {
        Self::with_memory(efm, core::ptr::null_mut(), FLASH_SIZE)
    }

    pub(crate) fn with_memory(efm: EFM, base: *mut u8, capacity: usize) -> Self {
        unlock(efm.regs());
        Flash {
            efm,
            base,
            capacity,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Iteration budget for every ready wait
    pub fn set_timeout(&mut self, timeout: u32) {
        self.timeout = timeout;
    }

    /// Locks the controller again and gives the token back.
    pub fn free(self) -> EFM {
        lock(self.efm.regs());
        self.efm
    }

    pub fn set_wait_cycles(&mut self, cycles: u8) {
        self.efm
            .regs()
            .frmc()
            .write_field(FRMC_FLWT_MASK, FRMC_FLWT_SHIFT, cycles as u32);
    }

    pub fn set_cache(&mut self, enable: bool) {
        let frmc = self.efm.regs().frmc();
        if enable {
            frmc.set_bits(FRMC_CACHE);
        } else {
            // Reset the cache contents while it is off
            frmc.modify(|v| (v & !FRMC_CACHE) | FRMC_CRST);
            frmc.clear_bits(FRMC_CRST);
        }
    }

    /// Low voltage read mode, only valid with HCLK at or below 8 MHz
    pub fn set_low_voltage_read(&mut self, enable: bool) {
        if enable {
            self.efm.regs().frmc().set_bits(FRMC_LVM);
        } else {
            self.efm.regs().frmc().clear_bits(FRMC_LVM);
        }
    }

    /// Only `start..=end` stays programmable, everything else is protected.
    pub fn set_window(&mut self, start: u32, end: u32) {
        let regs = self.efm.regs();
        regs.fpmtsw().write(start);
        regs.fpmtew().write(end);
    }

    /// 96-bit unique chip ID
    pub fn unique_id(&self) -> [u32; 3] {
        let regs = self.efm.regs();
        [regs.uqid0().read(), regs.uqid1().read(), regs.uqid2().read()]
    }

    /// Bus address of the flash word at `address`
    fn word_at(&self, address: u32) -> Result<usize, Error> {
        if address % 4 != 0 {
            return Err(Error::NotAligned);
        }
        if address as usize + 4 > self.capacity {
            return Err(Error::OutOfBounds);
        }
        Ok(self.base as usize + address as usize)
    }

    fn enter_mode(&mut self, mode: u32) {
        let fwmc = self.efm.regs().fwmc();
        fwmc.set_bits(FWMC_PEMODE);
        fwmc.write_field(FWMC_PEMOD_MASK, FWMC_PEMOD_SHIFT, mode);
    }

    fn leave_mode(&mut self) {
        let fwmc = self.efm.regs().fwmc();
        fwmc.write_field(FWMC_PEMOD_MASK, FWMC_PEMOD_SHIFT, PEMOD_READ_ONLY);
        fwmc.clear_bits(FWMC_PEMODE);
    }

    fn wait_flag(&self, flag: u32) -> Result<(), Error> {
        let fsr = self.efm.regs().fsr();
        let mut budget = self.timeout;
        while !fsr.is_set(flag) {
            if budget == 0 {
                return Err(Error::Timeout);
            }
            budget -= 1;
        }
        Ok(())
    }

    /// Clears the status flags and reports the first error among them.
    fn take_errors(&mut self) -> Result<(), Error> {
        let regs = self.efm.regs();
        let status = regs.fsr().read();
        regs.fsclr().write(FSR_CLEARABLE);
        match status & FSR_ERRORS {
            0 => Ok(()),
            s if s & FSR_PEWERR != 0 => Err(Error::Locked),
            s if s & FSR_PEPRTERR != 0 => Err(Error::Protected),
            s if s & FSR_PGSZERR != 0 => Err(Error::ProgramSize),
            s if s & FSR_PGMISMTCH != 0 => Err(Error::ProgramMismatch),
            _ => Err(Error::Collision),
        }
    }

    /// Runs one P/E operation in `mode`, always returning to read-only mode.
    fn operation(
        &mut self,
        mode: u32,
        op: impl FnOnce(&mut Self) -> Result<(), Error>,
    ) -> Result<(), Error> {
        self.enter_mode(mode);
        let result = op(self).and_then(|_| self.wait_flag(FSR_RDY));
        self.leave_mode();
        let flags = self.take_errors();
        result.and(flags)
    }

    /// Erases the sector containing `address`.
    pub fn erase_sector(&mut self, address: u32) -> Result<(), Error> {
        let sector = sector_of(address).ok_or(Error::OutOfBounds)?;
        // Any word of the sector triggers the erase; the last one is never null
        let trigger = self.word_at(sector_address(sector) + SECTOR_SIZE as u32 - 4)?;
        debug!("erasing sector {}", sector);
        self.operation(PEMOD_SECTOR_ERASE, |_| unsafe { write_word(trigger, 0) })
    }

    /// Erases the whole flash, including the running program.
    pub fn erase_chip(&mut self) -> Result<(), Error> {
        let trigger = self.word_at(self.capacity as u32 - 4)?;
        warn!("erasing the whole flash");
        self.operation(PEMOD_CHIP_ERASE, |_| unsafe { write_word(trigger, 0) })
    }

    /// Programs one word and reads it back.
    pub fn program_word(&mut self, address: u32, value: u32) -> Result<(), Error> {
        let word = self.word_at(address)?;
        self.operation(PEMOD_SINGLE_READBACK, |_| unsafe { write_word(word, value) })?;
        if unsafe { read_word(word) }? != value {
            return Err(Error::ProgramMismatch);
        }
        Ok(())
    }

    /// Programs consecutive words in sequence mode, then verifies them.
    pub fn program_words(&mut self, address: u32, words: &[u32]) -> Result<(), Error> {
        let end = address as usize + words.len() * 4;
        if end > self.capacity {
            return Err(Error::OutOfBounds);
        }
        let start = self.word_at(address)?;
        self.operation(PEMOD_SEQUENCE, |flash| {
            let regs = flash.efm.regs();
            for (i, word) in words.iter().enumerate() {
                unsafe { write_word(start + i * 4, *word) }?;
                flash.wait_flag(FSR_OPTEND)?;
                regs.fsclr().write(FSR_OPTEND);
            }
            Ok(())
        })?;
        for (i, word) in words.iter().enumerate() {
            if unsafe { read_word(start + i * 4) }? != *word {
                return Err(Error::ProgramMismatch);
            }
        }
        Ok(())
    }

    /// Programs arbitrary bytes. Partial words keep their current contents
    /// around the new bytes.
    pub fn program_bytes(&mut self, address: u32, bytes: &[u8]) -> Result<(), Error> {
        if address as usize + bytes.len() > self.capacity {
            return Err(Error::OutOfBounds);
        }
        let mut offset = 0;
        while offset < bytes.len() {
            let target = address + offset as u32;
            let word_address = target & !3;
            let lane = (target - word_address) as usize;
            let take = (4 - lane).min(bytes.len() - offset);

            let current = self.word_at(word_address)?;
            let mut word = unsafe { read_word(current) }?.to_le_bytes();
            word[lane..lane + take].copy_from_slice(&bytes[offset..offset + take]);
            self.program_word(word_address, u32::from_le_bytes(word))?;

            offset += take;
        }
        Ok(())
    }
}

/// Volatile word load. Flash starts at address 0, which a Rust pointer
/// can't be dereferenced at, so the core does the access with `ldr`.
#[cfg(target_arch = "arm")]
unsafe fn read_word(address: usize) -> Result<u32, Error> {
    let value: u32;
    core::arch::asm!(
        "ldr {value}, [{address}]",
        address = in(reg) address,
        value = out(reg) value,
        options(nostack, preserves_flags, readonly),
    );
    Ok(value)
}

#[cfg(target_arch = "arm")]
unsafe fn write_word(address: usize, value: u32) -> Result<(), Error> {
    core::arch::asm!(
        "str {value}, [{address}]",
        address = in(reg) address,
        value = in(reg) value,
        options(nostack, preserves_flags),
    );
    Ok(())
}

#[cfg(not(target_arch = "arm"))]
unsafe fn read_word(address: usize) -> Result<u32, Error> {
    if address == 0 {
        return Err(Error::NullAddress);
    }
    Ok((address as *const u32).read_volatile())
}

#[cfg(not(target_arch = "arm"))]
unsafe fn write_word(address: usize, value: u32) -> Result<(), Error> {
    if address == 0 {
        return Err(Error::NullAddress);
    }
    (address as *mut u32).write_volatile(value);
    Ok(())
}

impl ErrorType for Flash {
    type Error = Error;
}

impl ReadNorFlash for Flash {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        check_read(self, offset, bytes.len())?;
        let start = self.base as usize + offset as usize;
        for (i, byte) in bytes.iter_mut().enumerate() {
            let address = start + i;
            *byte = if address == 0 {
                unsafe { read_word(0) }?.to_le_bytes()[0]
            } else {
                unsafe { (address as *const u8).read_volatile() }
            };
        }
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

impl NorFlash for Flash {
    const WRITE_SIZE: usize = 4;
    const ERASE_SIZE: usize = SECTOR_SIZE;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        check_erase(self, from, to)?;
        for sector in (from..to).step_by(SECTOR_SIZE) {
            self.erase_sector(sector)?;
        }
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        check_write(self, offset, bytes.len())?;
        for (i, chunk) in bytes.chunks_exact(4).enumerate() {
            let mut word = [0u8; 4];
            word.copy_from_slice(chunk);
            self.program_word(offset + i as u32 * 4, u32::from_le_bytes(word))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac::{efm, ram_block};

    const TEST_SECTORS: usize = 4;

    fn flash() -> Flash {
        let regs = unsafe { efm::Efm::from_ptr(ram_block(0x60)) };
        regs.fsr().write(FSR_RDY | FSR_OPTEND);
        let capacity = TEST_SECTORS * SECTOR_SIZE;
        let memory = ram_block(capacity);
        unsafe { core::ptr::write_bytes(memory, 0xFF, capacity) };
        Flash::with_memory(EFM::from_block(regs), memory, capacity)
    }

    fn word(flash: &Flash, address: u32) -> u32 {
        unsafe { ((flash.base as usize + address as usize) as *const u32).read_volatile() }
    }

    #[test]
    fn sector_arithmetic() {
        assert_eq!(sector_address(0), 0);
        assert_eq!(sector_address(10), 0x0001_4000);
        assert_eq!(sector_address(63), 0x0007_E000);
        assert_eq!(sector_of(0x0001_4000), Some(10));
        assert_eq!(sector_of(0x0001_5FFF), Some(10));
        assert_eq!(sector_of(0x0008_0000), None);
    }

    #[test]
    fn wait_cycle_table() {
        let cycles = |mhz: u32| wait_cycles_for(Hertz::from_raw(mhz * 1_000_000));
        assert_eq!(cycles(8), 0);
        assert_eq!(cycles(33), 0);
        assert_eq!(cycles(34), 1);
        assert_eq!(cycles(99), 2);
        assert_eq!(cycles(120), 3);
        assert_eq!(cycles(168), 4);
        assert_eq!(cycles(200), 5);
    }

    #[test]
    fn driver_unlocks_and_free_locks() {
        let flash = flash();
        let regs = flash.efm.regs();
        assert_eq!(regs.faprt().read(), FAPRT_KEY2);
        let _ = flash.free();
        assert_eq!(regs.faprt().read(), 0);
    }

    #[test]
    fn program_and_verify() {
        let mut flash = flash();
        flash.program_word(0x2000, 0x1234_5678).unwrap();
        assert_eq!(word(&flash, 0x2000), 0x1234_5678);
        // Back in read-only mode, flags cleared
        assert_eq!(flash.efm.regs().fwmc().read(), 0);
        assert_eq!(flash.efm.regs().fsclr().read(), FSR_CLEARABLE);

        flash.program_words(0x4000, &[1, 2, 3]).unwrap();
        assert_eq!(word(&flash, 0x4008), 3);

        flash.program_bytes(0x6001, &[0xAA, 0xBB, 0xCC, 0xDD]).unwrap();
        assert_eq!(word(&flash, 0x6000), 0xCCBB_AAFF);
        assert_eq!(word(&flash, 0x6004), 0xFFFF_FFDD);
    }

    #[test]
    fn erase_touches_the_sector() {
        let mut flash = flash();
        flash.erase_sector(0x2010).unwrap();
        assert_eq!(word(&flash, 0x3FFC), 0);
        assert_eq!(word(&flash, 0x2010), 0xFFFF_FFFF);
        assert_eq!(flash.erase_sector(0x0010_0000), Err(Error::OutOfBounds));
    }

    #[test]
    fn status_flags_become_errors() {
        let mut flash = flash();
        flash.efm.regs().fsr().write(FSR_RDY | FSR_PEPRTERR);
        assert_eq!(flash.program_word(0x100, 0), Err(Error::Protected));
        flash.efm.regs().fsr().write(FSR_RDY | FSR_PGMISMTCH);
        assert_eq!(flash.erase_sector(0x100), Err(Error::ProgramMismatch));
        flash.efm.regs().fsr().write(0);
        flash.set_timeout(5);
        assert_eq!(flash.program_word(0x100, 0), Err(Error::Timeout));
        assert_eq!(flash.efm.regs().fwmc().read(), 0);
    }

    #[test]
    fn alignment_and_bounds() {
        let mut flash = flash();
        assert_eq!(flash.program_word(0x102, 0), Err(Error::NotAligned));
        let end = (TEST_SECTORS * SECTOR_SIZE) as u32;
        assert_eq!(flash.program_word(end, 0), Err(Error::OutOfBounds));
    }

    #[test]
    fn first_word_of_sector_zero_is_usable() {
        let mut flash = flash();
        flash.program_word(0, 0x1FFF_8000).unwrap();
        let mut head = [0u8; 4];
        ReadNorFlash::read(&mut flash, 0, &mut head).unwrap();
        assert_eq!(u32::from_le_bytes(head), 0x1FFF_8000);
    }

    #[cfg(not(target_arch = "arm"))]
    #[test]
    fn bus_address_zero_is_refused_off_target() {
        assert_eq!(unsafe { read_word(0) }, Err(Error::NullAddress));
        assert_eq!(unsafe { write_word(0, 1) }, Err(Error::NullAddress));
    }

    #[test]
    fn nor_flash_traits() {
        let mut flash = flash();
        assert_eq!(flash.capacity(), TEST_SECTORS * SECTOR_SIZE);
        NorFlash::write(&mut flash, 0x10, &[1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let mut buf = [0u8; 8];
        flash.read(0x10, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4, 5, 6, 7, 8]);

        assert_eq!(
            NorFlash::write(&mut flash, 0x11, &[0; 4]).map_err(|e| e.kind()),
            Err(NorFlashErrorKind::NotAligned)
        );
        assert_eq!(
            NorFlash::erase(&mut flash, 0x100, 0x2000),
            Err(Error::NotAligned)
        );
        NorFlash::erase(&mut flash, 0x2000, 0x6000).unwrap();
        assert_eq!(word(&flash, 0x3FFC), 0);
        assert_eq!(word(&flash, 0x5FFC), 0);
    }

    #[test]
    fn window_and_unique_id() {
        let mut flash = flash();
        flash.set_window(0x2000, 0x3FFF);
        assert_eq!(flash.efm.regs().fpmtsw().read(), 0x2000);
        assert_eq!(flash.efm.regs().fpmtew().read(), 0x3FFF);
        flash.efm.regs().uqid1().write(0xCAFE);
        assert_eq!(flash.unique_id(), [0, 0xCAFE, 0]);
    }
}
