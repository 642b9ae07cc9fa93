//! Switches the system clock to 168 MHz from the 8 MHz crystal through the
//! MPLL and puts SYSCLK / 8 on MCO1 (PA8).
#![no_std]
#![no_main]

use cortex_m_rt::entry;
use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::ToggleableOutputPin;
use hc32f460_hal as hal;
use hal::clock::{
    ClockConfig, ClockController, Divider, McoChannel, McoDivider, McoSource, PllConfig,
    PllSource, SysClockSource,
};
use hal::delay::Delay;
use hal::gpio::{GpioExt, Ports};
use hal::pac::Peripherals;
use hal::time::RateExtU32;
use panic_halt as _;

#[entry]
fn main() -> ! {
    let core = cortex_m::Peripherals::take().unwrap();
    let p = Peripherals::take().unwrap();
    let pins = Ports::new(p.PORT).split();

    let config = ClockConfig::new()
        .use_xtal(8u32.MHz())
        .mpll(PllConfig {
            source: PllSource::Xtal,
            m: 1,
            n: 42,
            p: 2,
            q: 2,
            r: 2,
        })
        .sysclk_source(SysClockSource::Mpll)
        .exclk_div(Divider::Div2)
        .pclk1_div(Divider::Div2)
        .pclk2_div(Divider::Div4)
        .pclk3_div(Divider::Div4)
        .pclk4_div(Divider::Div2);
    let mut ccu = ClockController::freeze(p.SYSREG, &p.EFM, config).unwrap();

    let _mco = pins.pa8.into_alternate::<1>();
    ccu.enable_mco(McoChannel::Mco1, McoSource::Sysclk, McoDivider::Div8);

    let clocks = ccu.clocks();
    let mut delay = Delay::new(core.SYST, &clocks);
    let mut led = pins.pe6.into_push_pull_output();
    loop {
        led.toggle().ok();
        delay.delay_ms(500u32);
    }
}
