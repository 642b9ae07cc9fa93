//! Blinks LED0 from the TIMER0_1 channel A compare interrupt every 500 ms
//! and LED1 by polling channel B as a `CountDown` every 250 ms.
#![no_std]
#![no_main]

use core::cell::RefCell;

use cortex_m_rt::entry;
use critical_section::Mutex;
use embedded_hal::digital::v2::ToggleableOutputPin;
use embedded_hal::timer::CountDown;
use hc32f460_hal as hal;
use hal::clock::Clocks;
use hal::gpio::{GpioExt, Output, Ports, PushPull, PE6};
use hal::interrupt::{self, Interrupts, IrqNumber};
use hal::pac::{Peripherals, TMR0_1};
use hal::pwc::PeripheralClocks;
use hal::time::{ExtU32, Microseconds};
use hal::timer0::{Timer0, Timer0Channel};
use panic_halt as _;
use nb::block;

/// Sources 64..96 can only be routed to IRQ 44..50
const TIMER_IRQ: IrqNumber = IrqNumber::new(44);

type Blinker = (Timer0Channel<TMR0_1, 0>, PE6<Output<PushPull>>);

static BLINKER: Mutex<RefCell<Option<Blinker>>> = Mutex::new(RefCell::new(None));

fn on_compare() {
    critical_section::with(|cs| {
        if let Some((timer, led)) = BLINKER.borrow_ref_mut(cs).as_mut() {
            timer.clear_flag();
            led.toggle().ok();
        }
    });
}

#[entry]
fn main() -> ! {
    let p = Peripherals::take().unwrap();
    let gates = PeripheralClocks::new(p.PWC);
    let pins = Ports::new(p.PORT).split();
    let clocks = Clocks::reset();

    let timer = Timer0::new(p.TMR0_1, &gates.tmr0_1.into_enabled_clock(), &clocks);
    let channels = timer.split();

    let mut blink = channels.a;
    let half_second: Microseconds = 500u32.millis();
    blink.try_start(half_second).unwrap();
    blink.enable_interrupt();

    let mut irqs = Interrupts::new(p.INTC);
    irqs.register(TIMER_IRQ, blink.compare_event(), on_compare)
        .unwrap();
    critical_section::with(|cs| {
        BLINKER
            .borrow(cs)
            .replace(Some((blink, pins.pe6.into_push_pull_output())))
    });
    interrupt::enable(TIMER_IRQ);

    let mut poll = channels.b;
    let mut led = pins.pa7.into_push_pull_output();
    let quarter_second: Microseconds = 250u32.millis();
    poll.start(quarter_second);
    loop {
        block!(poll.wait()).ok();
        led.toggle().ok();
    }
}
