//! Time units
//!
//! Rates and durations are [`fugit`] types. The aliases below pin them to the
//! 32-bit flavour used throughout the HAL.

pub use fugit::{ExtU32, RateExtU32};

// Frequency based

/// Hertz
pub type Hertz = fugit::HertzU32;

/// KiloHertz
pub type KiloHertz = fugit::KilohertzU32;

/// MegaHertz
pub type MegaHertz = fugit::MegahertzU32;

// Period based

/// Milliseconds
pub type Milliseconds = fugit::MillisDurationU32;

/// Microseconds
pub type Microseconds = fugit::MicrosDurationU32;

/// Nanoseconds
pub type Nanoseconds = fugit::NanosDurationU32;

/// Number of whole `clock` cycles that fit in `ns` nanoseconds, rounded up.
pub(crate) fn cycles_for_nanos(clock: Hertz, ns: u32) -> u64 {
    let num = clock.to_Hz() as u64 * ns as u64;
    (num + 999_999_999) / 1_000_000_000
}

/// Number of whole `clock` cycles in `us` microseconds, truncated.
pub(crate) fn cycles_for_micros(clock: Hertz, us: u32) -> u64 {
    clock.to_Hz() as u64 * us as u64 / 1_000_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nanosecond_cycles_round_up() {
        // 100 MHz -> 10 ns per cycle
        assert_eq!(cycles_for_nanos(Hertz::from_raw(100_000_000), 100), 10);
        assert_eq!(cycles_for_nanos(Hertz::from_raw(100_000_000), 101), 11);
        assert_eq!(cycles_for_nanos(Hertz::from_raw(100_000_000), 0), 0);
    }

    #[test]
    fn microsecond_cycles_truncate() {
        assert_eq!(cycles_for_micros(Hertz::from_raw(8_000_000), 1_000), 8_000);
        assert_eq!(cycles_for_micros(32_768u32.Hz(), 1_000_000), 32_768);
    }
}
