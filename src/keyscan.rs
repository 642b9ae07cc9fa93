//! Key matrix scanner
//!
//! Drives the row outputs `KEYOUT0..n` low one at a time while the columns,
//! wired to external interrupt channels, sit pulled up. A key press pulls its
//! column's EIRQ low during its row's low period; the handler then reads the
//! row being scanned with [`Keyscan::current_row`] and decodes the key.
//!
//! ```ignore
//! let mut keyscan = Keyscan::new(p.KEYSCAN, &gates.keyscan.into_enabled_clock(), KeyscanConfig {
//!     rows: 3,
//!     columns: 0b0111 << 4,
//!     ..Default::default()
//! })?;
//! keyscan.start();
//! ```
use crate::pac::keyscan::*;
use crate::pac::KEYSCAN;
use crate::pwc::{Enabled, KeyscanClock};

/// Row outputs available
pub const MAX_ROWS: u8 = 8;
const LOW_LEVEL_MIN: u8 = 2;
const LOW_LEVEL_MAX: u8 = 24;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Row count outside 2..=8
    Rows,
    /// No column selected
    Columns,
    /// Low level exponent outside 2..=24
    LowLevel,
    /// EIRQ channel isn't one of the configured columns
    NotAColumn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanClock {
    Hclk = 0,
    Lrc = 1,
    Xtal32 = 2,
}

/// Time all rows float between two row periods
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HizTime {
    Cycles4 = 0,
    Cycles8 = 1,
    Cycles16 = 2,
    Cycles32 = 3,
    Cycles64 = 4,
    Cycles256 = 5,
    Cycles512 = 6,
    Cycles1024 = 7,
}

impl HizTime {
    pub const fn cycles(self) -> u32 {
        match self {
            HizTime::Cycles4 => 4,
            HizTime::Cycles8 => 8,
            HizTime::Cycles16 => 16,
            HizTime::Cycles32 => 32,
            HizTime::Cycles64 => 64,
            HizTime::Cycles256 => 256,
            HizTime::Cycles512 => 512,
            HizTime::Cycles1024 => 1024,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyscanConfig {
    /// Rows scanned, starting at KEYOUT0
    pub rows: u8,
    /// EIRQ channels used as columns, one bit per channel
    pub columns: u16,
    pub clock: ScanClock,
    /// Each row stays low for `2^low_level` scan clocks
    pub low_level: u8,
    pub hiz: HizTime,
}

impl Default for KeyscanConfig {
    fn default() -> Self {
        Self {
            rows: 2,
            columns: 0x0001,
            clock: ScanClock::Lrc,
            low_level: 9,
            hiz: HizTime::Cycles4,
        }
    }
}

/// A decoded key press
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Key {
    pub row: u8,
    /// EIRQ channel of the column
    pub column: u8,
}

pub struct Keyscan {
    keyscan: KEYSCAN,
    config: KeyscanConfig,
}

impl Keyscan {
    /// Configures the scanner. Scanning starts with [`Keyscan::start`].
    pub fn new(
        keyscan: KEYSCAN,
        _clock: &KeyscanClock<Enabled>,
        config: KeyscanConfig,
    ) -> Result<Self, Error> {
        if !(2..=MAX_ROWS).contains(&config.rows) {
            return Err(Error::Rows);
        }
        if config.columns == 0 {
            return Err(Error::Columns);
        }
        if !(LOW_LEVEL_MIN..=LOW_LEVEL_MAX).contains(&config.low_level) {
            return Err(Error::LowLevel);
        }

        let regs = keyscan.regs();
        regs.ser().write(0);
        regs.scr().write(
            config.columns as u32
                | ((config.rows as u32 - 1) << SCR_KEYOUTSEL_SHIFT)
                | ((config.clock as u32) << SCR_CKSEL_SHIFT)
                | ((config.hiz as u32) << SCR_T_HIZ_SHIFT)
                | ((config.low_level as u32) << SCR_T_LLEVEL_SHIFT),
        );
        debug!(
            "keyscan {=u8} rows, columns {=u16:#x}",
            config.rows,
            config.columns
        );
        Ok(Keyscan { keyscan, config })
    }

    pub fn config(&self) -> &KeyscanConfig {
        &self.config
    }

    pub fn start(&mut self) {
        self.keyscan.regs().ser().write(SER_SEN);
    }

    pub fn stop(&mut self) {
        self.keyscan.regs().ser().write(0);
    }

    pub fn is_scanning(&self) -> bool {
        self.keyscan.regs().ser().is_set(SER_SEN)
    }

    /// Row being driven low
    pub fn current_row(&self) -> u8 {
        (self.keyscan.regs().ssr().read() & SSR_INDEX_MASK) as u8
    }

    pub fn columns(&self) -> u8 {
        self.config.columns.count_ones() as u8
    }

    /// Key on the current row whose column raised EIRQ `channel`
    pub fn key(&self, channel: u8) -> Result<Key, Error> {
        self.decode(self.current_row(), channel)
    }

    pub fn decode(&self, row: u8, channel: u8) -> Result<Key, Error> {
        if channel >= 16 || self.config.columns & (1 << channel) == 0 || row >= self.config.rows {
            return Err(Error::NotAColumn);
        }
        Ok(Key {
            row,
            column: channel,
        })
    }

    /// Row-major index: `row * columns + position of the column`
    pub fn key_index(&self, key: Key) -> u16 {
        let below = self.config.columns as u32 & ((1u32 << key.column.min(16)) - 1);
        key.row as u16 * self.columns() as u16 + below.count_ones() as u16
    }

    /// Length of one full scan of every row, in scan clocks
    pub fn scan_period(&self) -> u32 {
        self.config.rows as u32 * ((1 << self.config.low_level) + self.config.hiz.cycles())
    }

    /// Stops scanning and releases the peripheral
    pub fn free(mut self) -> KEYSCAN {
        self.stop();
        self.keyscan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac::keyscan::Keyscan as Regs;

    fn setup(config: KeyscanConfig) -> (Result<Keyscan, Error>, Regs) {
        let regs = unsafe { Regs::from_ptr(crate::pac::ram_block(0x10)) };
        let clock = crate::pwc::test_clocks().keyscan.into_enabled_clock();
        (Keyscan::new(KEYSCAN::from_block(regs), &clock, config), regs)
    }

    #[test]
    fn scan_configuration() {
        let (keyscan, regs) = setup(KeyscanConfig {
            rows: 3,
            columns: 0b0111 << 4,
            clock: ScanClock::Hclk,
            low_level: 12,
            hiz: HizTime::Cycles64,
        });
        let mut keyscan = keyscan.unwrap();
        assert_eq!(
            regs.scr().read(),
            0x70 | (2 << 16) | (4 << 24) | (12 << 27)
        );
        assert_eq!(keyscan.scan_period(), 3 * (4096 + 64));

        assert!(!keyscan.is_scanning());
        keyscan.start();
        assert_eq!(regs.ser().read(), SER_SEN);
        regs.ssr().write(2);
        assert_eq!(keyscan.current_row(), 2);
        keyscan.free();
        assert_eq!(regs.ser().read(), 0);
    }

    #[test]
    fn rejects_bad_config() {
        let bad_rows = KeyscanConfig {
            rows: 9,
            ..Default::default()
        };
        assert_eq!(setup(bad_rows).0.err(), Some(Error::Rows));
        let no_columns = KeyscanConfig {
            columns: 0,
            ..Default::default()
        };
        assert_eq!(setup(no_columns).0.err(), Some(Error::Columns));
        let low_level = KeyscanConfig {
            low_level: 25,
            ..Default::default()
        };
        assert_eq!(setup(low_level).0.err(), Some(Error::LowLevel));
    }

    #[test]
    fn key_decode() {
        let (keyscan, regs) = setup(KeyscanConfig {
            rows: 3,
            columns: (1 << 4) | (1 << 6) | (1 << 9),
            ..Default::default()
        });
        let keyscan = keyscan.unwrap();
        regs.ssr().write(1);
        let key = keyscan.key(9).unwrap();
        assert_eq!(key, Key { row: 1, column: 9 });
        // three columns, EIRQ9 is the third
        assert_eq!(keyscan.key_index(key), 5);
        assert_eq!(keyscan.key_index(Key { row: 0, column: 4 }), 0);
        assert_eq!(keyscan.key_index(Key { row: 2, column: 6 }), 7);

        assert_eq!(keyscan.key(5), Err(Error::NotAColumn));
        assert_eq!(keyscan.decode(3, 4), Err(Error::NotAColumn));
    }

    #[test]
    fn key_index_of_a_hand_built_key_does_not_wrap() {
        let (keyscan, _) = setup(KeyscanConfig {
            rows: 8,
            columns: 0xFFFF,
            ..Default::default()
        });
        let keyscan = keyscan.unwrap();
        assert_eq!(keyscan.key_index(Key { row: 7, column: 15 }), 127);
        assert_eq!(keyscan.key_index(Key { row: 20, column: 15 }), 335);
    }
}
