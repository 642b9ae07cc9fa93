//! Toggles LED0 (PE6) every time SW2 (PD3, EIRQ3) is pressed.
#![no_std]
#![no_main]

use core::cell::RefCell;

use cortex_m_rt::entry;
use critical_section::Mutex;
use embedded_hal::digital::v2::ToggleableOutputPin;
use hc32f460_hal as hal;
use hal::exint::{self, ExintConfig, ExtiPin, FilterClock, Trigger};
use hal::gpio::{GpioExt, Output, Ports, PushPull, PE6};
use hal::interrupt::{self, EventSource, Interrupts, IrqNumber};
use hal::pac::Peripherals;
use panic_halt as _;

const KEY_CHANNEL: u8 = 3;
const KEY_IRQ: IrqNumber = IrqNumber::new(0);

static LED: Mutex<RefCell<Option<PE6<Output<PushPull>>>>> = Mutex::new(RefCell::new(None));

fn on_key() {
    exint::clear(KEY_CHANNEL);
    critical_section::with(|cs| {
        if let Some(led) = LED.borrow_ref_mut(cs).as_mut() {
            led.toggle().ok();
        }
    });
}

#[entry]
fn main() -> ! {
    let p = Peripherals::take().unwrap();
    let pins = Ports::new(p.PORT).split();

    let led = pins.pe6.into_push_pull_output();
    let mut key = pins.pd3.into_pull_up_input();
    key.enable_interrupt();

    let mut irqs = Interrupts::new(p.INTC);
    irqs.configure_exint(
        key.channel(),
        ExintConfig {
            trigger: Trigger::Falling,
            filter: Some(FilterClock::Pclk3Div8),
        },
    );
    irqs.register(KEY_IRQ, EventSource::eirq(KEY_CHANNEL), on_key)
        .unwrap();

    critical_section::with(|cs| LED.borrow(cs).replace(Some(led)));
    interrupt::enable(KEY_IRQ);

    loop {
        cortex_m::asm::wfi();
    }
}
