//! Timer4: motor control PWM timer
//!
//! Each unit has one 16-bit counter ([`cnt`]) shared by six output compare
//! channels ([`oco`]), grouped into three pairs U, V and W. Every pair feeds
//! a PWM generator ([`pwm`]) that can insert dead time between the
//! complementary outputs, and six special event channels ([`sevt`]) raise
//! ADC start triggers at programmable counter values.
//!
//! ```ignore
//! let tmr4 = Timer4::new(p.TMR4_1, &clocks.tmr4_1.into_enabled_clock(), &clocks);
//! let mut parts = tmr4.split();
//! parts.counter.configure(&CounterConfig { period: 1000, ..Default::default() });
//!
//! parts.uh.set_mode(HighCompareMode::pwm_sawtooth());
//! parts.ul.set_mode(LowCompareMode::complementary());
//! parts.uh.set_compare(400);
//!
//! parts.u.set_mode(PwmMode::DeadTimer);
//! parts.u.set_dead_time_ns(500, 500);
//! parts.counter.start();
//! ```
use paste::paste;

use crate::clock::Clocks;
use crate::pac::{TMR4_1, TMR4_2, TMR4_3};
use crate::pwc::{Enabled, Tmr41Clock, Tmr42Clock, Tmr43Clock};
use crate::time::Hertz;

pub mod cnt;
pub mod oco;
pub mod pwm;
pub mod sevt;

pub use cnt::{CountMode, Counter, CounterConfig, CounterDivider, CounterEvent};
pub use oco::{
    BufferTransfer, HighCompareMode, Level, LowCompareMode, Oco, OcoHigh, OcoLow, OutputAction,
};
pub use pwm::{dead_time_counts, Polarity, PwmClockDivider, PwmMode, PwmPair};
pub use sevt::{SevtConfig, SevtMode, SpecialEvent};

/// A Timer4 unit
pub trait Instance {
    /// 1 to 3
    const UNIT: u8;
    type Clock;

    fn regs(&self) -> crate::pac::tmr4::Tmr4;
}

macro_rules! timer4 {
    ($($TMR:ident: ($Tmr:ident, $unit:literal),)+) => {
        paste! {
            $(
                impl Instance for $TMR {
                    const UNIT: u8 = $unit;
                    type Clock = [<$Tmr Clock>]<Enabled>;

                    fn regs(&self) -> crate::pac::tmr4::Tmr4 {
                        $TMR::regs(self)
                    }
                }
            )+
        }
    };
}

timer4! {
    TMR4_1: (Tmr41, 1),
    TMR4_2: (Tmr42, 2),
    TMR4_3: (Tmr43, 3),
}

/// Output pair
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pair {
    U = 0,
    V = 1,
    W = 2,
}

pub struct Timer4<TMR> {
    tmr: TMR,
    pclk1: Hertz,
}

/// Every sub unit of a Timer4
pub struct Parts<TMR> {
    pub counter: Counter<TMR>,
    pub uh: OcoHigh<TMR, 0>,
    pub ul: OcoLow<TMR, 0>,
    pub vh: OcoHigh<TMR, 1>,
    pub vl: OcoLow<TMR, 1>,
    pub wh: OcoHigh<TMR, 2>,
    pub wl: OcoLow<TMR, 2>,
    pub u: PwmPair<TMR, 0>,
    pub v: PwmPair<TMR, 1>,
    pub w: PwmPair<TMR, 2>,
    pub sevt_uh: SpecialEvent<TMR, 0>,
    pub sevt_ul: SpecialEvent<TMR, 1>,
    pub sevt_vh: SpecialEvent<TMR, 2>,
    pub sevt_vl: SpecialEvent<TMR, 3>,
    pub sevt_wh: SpecialEvent<TMR, 4>,
    pub sevt_wl: SpecialEvent<TMR, 5>,
}

impl<TMR: Instance> Timer4<TMR> {
    /// Stops and clears the counter. Outputs stay disabled until enabled per
    /// channel.
    pub fn new(tmr: TMR, _clock: &TMR::Clock, clocks: &Clocks) -> Self {
        let regs = tmr.regs();
        regs.ccsr()
            .write(crate::pac::tmr4::CCSR_STOP | crate::pac::tmr4::CCSR_CLEAR);
        Timer4 {
            tmr,
            pclk1: clocks.pclk1,
        }
    }

    pub fn split(self) -> Parts<TMR> {
        let regs = self.tmr.regs();
        let pclk1 = self.pclk1;
        Parts {
            counter: Counter::new(regs, pclk1),
            uh: Oco::new(regs),
            ul: Oco::new(regs),
            vh: Oco::new(regs),
            vl: Oco::new(regs),
            wh: Oco::new(regs),
            wl: Oco::new(regs),
            u: PwmPair::new(regs, pclk1),
            v: PwmPair::new(regs, pclk1),
            w: PwmPair::new(regs, pclk1),
            sevt_uh: SpecialEvent::new(regs),
            sevt_ul: SpecialEvent::new(regs),
            sevt_vh: SpecialEvent::new(regs),
            sevt_vl: SpecialEvent::new(regs),
            sevt_wh: SpecialEvent::new(regs),
            sevt_wl: SpecialEvent::new(regs),
        }
    }

    pub fn free(self) -> TMR {
        self.tmr
    }
}

#[cfg(test)]
pub(crate) fn test_parts() -> (Parts<TMR4_1>, crate::pac::tmr4::Tmr4) {
    use crate::time::RateExtU32;

    let regs = unsafe { crate::pac::tmr4::Tmr4::from_ptr(crate::pac::ram_block(0x100)) };
    let clock = crate::pwc::test_clocks().tmr4_1.into_enabled_clock();
    let clocks = Clocks {
        pclk1: 100u32.MHz(),
        ..Clocks::reset()
    };
    let tmr4 = Timer4::new(TMR4_1::from_block(regs), &clock, &clocks);
    (tmr4.split(), regs)
}
