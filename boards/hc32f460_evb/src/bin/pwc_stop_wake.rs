//! Enters stop mode and wakes on SW2 (PD3, EIRQ3). LED0 blinks a few times
//! after every wakeup before the chip stops again.
#![no_std]
#![no_main]

use cortex_m_rt::entry;
use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::ToggleableOutputPin;
use hc32f460_hal as hal;
use hal::clock::Clocks;
use hal::delay::Delay;
use hal::exint::{self, ExintConfig, ExtiPin, Trigger};
use hal::gpio::{GpioExt, Ports};
use hal::interrupt::{self, EventSource, Interrupts, IrqNumber};
use hal::pac::Peripherals;
use hal::pwc::{Power, StopConfig};
use panic_halt as _;

const KEY_CHANNEL: u8 = 3;
const KEY_IRQ: IrqNumber = IrqNumber::new(0);

fn on_key() {
    exint::clear(KEY_CHANNEL);
}

#[entry]
fn main() -> ! {
    let mut core = cortex_m::Peripherals::take().unwrap();
    let p = Peripherals::take().unwrap();
    let pins = Ports::new(p.PORT).split();
    let clocks = Clocks::reset();

    let mut led = pins.pe6.into_push_pull_output();
    let mut key = pins.pd3.into_pull_up_input();
    key.enable_interrupt();

    let mut irqs = Interrupts::new(p.INTC);
    irqs.configure_exint(
        KEY_CHANNEL,
        ExintConfig {
            trigger: Trigger::Falling,
            filter: None,
        },
    );
    irqs.set_exint_wakeup(KEY_CHANNEL, true);
    irqs.register(KEY_IRQ, EventSource::eirq(KEY_CHANNEL), on_key)
        .unwrap();
    interrupt::enable(KEY_IRQ);

    let mut power = Power::new(p.PWR);
    power.configure_stop(StopConfig::default());

    let mut delay = Delay::new(core.SYST, &clocks);
    loop {
        power.deep_sleep(&mut core.SCB);
        for _ in 0..6 {
            led.toggle().ok();
            delay.delay_ms(100u32);
        }
    }
}
