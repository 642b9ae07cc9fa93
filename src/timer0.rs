//! Timer0: general purpose 16-bit timers
//!
//! Two units, each with an A and a B channel. A channel counts up from 0 and
//! raises its compare flag when it reaches the compare value, then restarts.
//! Channels implement the `CountDown` and `Periodic` embedded_hal traits.
//!
//! ```ignore
//! let tmr = Timer0::new(p.TMR0_1, &clocks.tmr0_1.into_enabled_clock(), &clocks);
//! let mut ch = tmr.split().a;
//! ch.clock_input(ClockSource::Lrc);
//! ch.start(500u32.millis());
//! while ch.wait().is_err() {}
//! ```
use core::marker::PhantomData;
use embedded_hal::timer::{CountDown, Periodic};
use paste::paste;
use void::Void;

use crate::clock::{Clocks, LRC_FREQUENCY, XTAL32_FREQUENCY};
use crate::interrupt::EventSource;
use crate::pac::tmr0::*;
use crate::pac::{TMR0_1, TMR0_2};
use crate::pwc::{Enabled, Tmr01Clock, Tmr02Clock};
use crate::time::{cycles_for_micros, Hertz, Microseconds};

/// Largest counter clock divider exponent (PCLK1 / 1024)
pub const MAX_DIVIDER: u8 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Timeout shorter than one counter clock or longer than the counter
    /// can reach with the largest divider
    OutOfRange,
}

/// Counter clock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    /// Synchronous, PCLK1
    Pclk1,
    /// Asynchronous, internal low speed RC
    Lrc,
    /// Asynchronous, 32.768 kHz crystal
    Xtal32,
}

impl ClockSource {
    fn bits(self) -> u32 {
        match self {
            ClockSource::Pclk1 => 0,
            ClockSource::Lrc => BCONR_SYNS,
            ClockSource::Xtal32 => BCONR_SYNS | BCONR_ASYNCLK,
        }
    }
}

/// Picks the smallest divider exponent whose tick count fits the counter.
/// Returns (divider exponent, compare value).
pub fn prescaler_for(clock: Hertz, timeout: Microseconds) -> Result<(u8, u16), Error> {
    let cycles = cycles_for_micros(clock, timeout.ticks());
    for div in 0..=MAX_DIVIDER {
        let ticks = cycles >> div;
        if ticks == 0 {
            return Err(Error::OutOfRange);
        }
        if ticks <= u16::MAX as u64 {
            return Ok((div, (ticks - 1) as u16));
        }
    }
    Err(Error::OutOfRange)
}

/// A Timer0 unit
pub trait Instance {
    /// 1 or 2
    const UNIT: u8;
    type Clock;

    fn regs(&self) -> crate::pac::tmr0::Tmr0;
}

macro_rules! timer0 {
    ($($TMR:ident: ($Tmr:ident, $unit:literal),)+) => {
        paste! {
            $(
                impl Instance for $TMR {
                    const UNIT: u8 = $unit;
                    type Clock = [<$Tmr Clock>]<Enabled>;

                    fn regs(&self) -> crate::pac::tmr0::Tmr0 {
                        $TMR::regs(self)
                    }
                }

                pub type [<Timer0 $unit>] = Timer0<$TMR>;
            )+
        }
    };
}

timer0! {
    TMR0_1: (Tmr01, 1),
    TMR0_2: (Tmr02, 2),
}

pub struct Timer0<TMR> {
    tmr: TMR,
    pclk1: Hertz,
}

pub struct Timer0Channels<TMR> {
    pub a: Timer0Channel<TMR, 0>,
    pub b: Timer0Channel<TMR, 1>,
}

impl<TMR: Instance> Timer0<TMR> {
    /// Stops both channels. The counter clock of a channel defaults to PCLK1.
    pub fn new(tmr: TMR, _clock: &TMR::Clock, clocks: &Clocks) -> Self {
        let regs = tmr.regs();
        regs.bconr().write(0);
        regs.stflr().write(0);
        Timer0 {
            tmr,
            pclk1: clocks.pclk1,
        }
    }

    pub fn split(self) -> Timer0Channels<TMR> {
        let regs = self.tmr.regs();
        Timer0Channels {
            a: Timer0Channel::new(regs, self.pclk1),
            b: Timer0Channel::new(regs, self.pclk1),
        }
    }

    pub fn free(self) -> TMR {
        self.tmr
    }
}

pub struct Timer0Channel<TMR, const CH: u8> {
    regs: crate::pac::tmr0::Tmr0,
    pclk1: Hertz,
    source: ClockSource,
    _unit: PhantomData<TMR>,
}

impl<TMR: Instance, const CH: u8> Timer0Channel<TMR, CH> {
    const SHIFT: u8 = CH * CH_B_SHIFT;

    fn new(regs: crate::pac::tmr0::Tmr0, pclk1: Hertz) -> Self {
        Timer0Channel {
            regs,
            pclk1,
            source: ClockSource::Pclk1,
            _unit: PhantomData,
        }
    }

    fn counter_reg(&self) -> &'static crate::pac::Reg<u32> {
        if CH == 0 {
            self.regs.cntar()
        } else {
            self.regs.cntbr()
        }
    }

    fn compare_reg(&self) -> &'static crate::pac::Reg<u32> {
        if CH == 0 {
            self.regs.cmpar()
        } else {
            self.regs.cmpbr()
        }
    }

    fn modify_bconr(&mut self, f: impl FnOnce(u32) -> u32) {
        let shift = Self::SHIFT;
        self.regs.bconr().modify(|v| {
            let own = (v >> shift) & 0xFFFF;
            (v & !(0xFFFF << shift)) | ((f(own) & 0xFFFF) << shift)
        });
    }

    /// Selects the counter clock, takes effect on the next start
    pub fn clock_input(&mut self, source: ClockSource) {
        self.source = source;
    }

    /// Frequency feeding the divider
    pub fn source_frequency(&self) -> Hertz {
        match self.source {
            ClockSource::Pclk1 => self.pclk1,
            ClockSource::Lrc => LRC_FREQUENCY,
            ClockSource::Xtal32 => XTAL32_FREQUENCY,
        }
    }

    /// Programs divider exponent and compare value and starts counting from 0
    pub fn start_raw(&mut self, divider: u8, compare: u16) {
        assert!(divider <= MAX_DIVIDER);
        self.stop();
        self.counter_reg().write(0);
        self.compare_reg().write(compare as u32);
        let source = self.source.bits();
        self.modify_bconr(|v| {
            (v & (BCONR_INTEN | BCONR_HSTA | BCONR_HSTP | BCONR_HCLE | BCONR_HICP))
                | source
                | ((divider as u32) << BCONR_CKDIV_SHIFT)
        });
        self.clear_flag();
        self.modify_bconr(|v| v | BCONR_CST);
    }

    /// Starts a period of `timeout`, or reports it can't be reached
    pub fn try_start(&mut self, timeout: Microseconds) -> Result<(), Error> {
        let (divider, compare) = prescaler_for(self.source_frequency(), timeout)?;
        trace!(
            "TMR0_{=u8}{=u8} div:{=u8} cmp:{=u16} source:{}",
            TMR::UNIT,
            CH,
            divider,
            compare,
            self.source
        );
        self.start_raw(divider, compare);
        Ok(())
    }

    pub fn stop(&mut self) {
        self.modify_bconr(|v| v & !BCONR_CST);
    }

    pub fn is_running(&self) -> bool {
        self.regs.bconr().is_set(BCONR_CST << Self::SHIFT)
    }

    pub fn counter(&self) -> u16 {
        self.counter_reg().read() as u16
    }

    pub fn compare(&self) -> u16 {
        self.compare_reg().read() as u16
    }

    /// Enable the compare match interrupt for this channel
    pub fn enable_interrupt(&mut self) {
        self.modify_bconr(|v| v | BCONR_INTEN);
    }

    pub fn disable_interrupt(&mut self) {
        self.modify_bconr(|v| v & !BCONR_INTEN);
    }

    /// Compare match flag
    pub fn is_match(&self) -> bool {
        self.regs.stflr().is_set(STFLR_CMF << Self::SHIFT)
    }

    pub fn clear_flag(&mut self) {
        self.regs.stflr().clear_bits(STFLR_CMF << Self::SHIFT);
    }

    /// Interrupt / event number of this channel's compare match
    pub fn compare_event(&self) -> EventSource {
        EventSource(EventSource::TMR0_1_CMPA.0 + (TMR::UNIT as u16 - 1) * 2 + CH as u16)
    }
}

impl<TMR: Instance, const CH: u8> Periodic for Timer0Channel<TMR, CH> {}

impl<TMR: Instance, const CH: u8> CountDown for Timer0Channel<TMR, CH> {
    type Time = Microseconds;

    /// Panics when the timeout can't be reached, see [`Timer0Channel::try_start`]
    fn start<T>(&mut self, timeout: T)
    where
        T: Into<Self::Time>,
    {
        let timeout: Microseconds = timeout.into();
        if self.try_start(timeout).is_err() {
            panic!(
                "{} us out of range for a {} Hz counter clock",
                timeout.ticks(),
                self.source_frequency().raw()
            );
        }
    }

    fn wait(&mut self) -> nb::Result<(), Void> {
        if self.is_match() {
            self.clear_flag();
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac::{ram_block, tmr0};
    use crate::time::{ExtU32, RateExtU32};

    #[test]
    fn prescaler_picks_smallest_divider() {
        let clock: Hertz = 50u32.MHz();
        // 1 ms = 50_000 cycles fits undivided
        assert_eq!(prescaler_for(clock, 1u32.millis()), Ok((0, 49_999)));
        // 10 ms = 500_000 cycles needs /8
        assert_eq!(prescaler_for(clock, 10u32.millis()), Ok((3, 62_499)));
        assert_eq!(prescaler_for(LRC_FREQUENCY, 1u32.secs()), Ok((0, 32_767)));
        assert_eq!(prescaler_for(LRC_FREQUENCY, 2u32.secs()), Ok((1, 32_767)));
    }

    #[test]
    fn prescaler_rejects_out_of_range() {
        let clock: Hertz = 50u32.MHz();
        assert_eq!(prescaler_for(LRC_FREQUENCY, 10u32.micros()), Err(Error::OutOfRange));
        // 2^10 * 65535 / 50 MHz is about 1.34 s
        assert_eq!(prescaler_for(clock, 2u32.secs()), Err(Error::OutOfRange));
    }

    fn channels() -> (Timer0Channels<TMR0_2>, tmr0::Tmr0) {
        let regs = unsafe { tmr0::Tmr0::from_ptr(ram_block(0x20)) };
        let clock = crate::pwc::test_clocks().tmr0_2.into_enabled_clock();
        let clocks = Clocks {
            pclk1: 50u32.MHz(),
            ..Clocks::reset()
        };
        let tmr = Timer0::new(TMR0_2::from_block(regs), &clock, &clocks);
        (tmr.split(), regs)
    }

    #[test]
    fn channel_b_fields_sit_in_upper_half() {
        let (mut chs, regs) = channels();
        chs.b.clock_input(ClockSource::Xtal32);
        chs.b.enable_interrupt();
        chs.b.try_start(1u32.secs()).unwrap();

        assert_eq!(regs.cmpbr().read(), 32_767);
        assert_eq!(
            regs.bconr().read(),
            (BCONR_CST | BCONR_INTEN | BCONR_SYNS | BCONR_ASYNCLK) << 16
        );
        assert!(chs.b.is_running());
        assert!(!chs.a.is_running());
        assert_eq!(chs.b.compare_event(), EventSource::TMR0_2_CMPB);
    }

    #[test]
    fn count_down_waits_for_compare_match() {
        let (mut chs, regs) = channels();
        let timeout: Microseconds = 1u32.millis();
        chs.a.start(timeout);
        assert_eq!(regs.cmpar().read(), 49_999);
        assert_eq!(regs.bconr().read(), BCONR_CST);
        assert!(chs.a.wait().is_err());

        regs.stflr().write(STFLR_CMF | (STFLR_CMF << 16));
        assert!(chs.a.wait().is_ok());
        // Channel B's flag untouched
        assert_eq!(regs.stflr().read(), STFLR_CMF << 16);
        chs.a.stop();
        assert_eq!(regs.bconr().read(), 0);
    }

    #[test]
    #[should_panic]
    fn impossible_timeout_panics() {
        let (mut chs, _) = channels();
        let timeout: Microseconds = 5u32.secs();
        chs.a.start(timeout);
    }
}
