//! Complementary 20 kHz PWM on TIMER4_1 pair U (OUH PE9, OUL PE8) with
//! 500 ns dead time on both edges. The duty cycle is stepped from the
//! counter zero interrupt.
#![no_std]
#![no_main]

use core::cell::RefCell;

use cortex_m_rt::entry;
use critical_section::Mutex;
use hc32f460_hal as hal;
use hal::clock::Clocks;
use hal::gpio::{GpioExt, Ports};
use hal::interrupt::{self, EventSource, Interrupts, IrqNumber};
use hal::pac::{Peripherals, TMR4_1};
use hal::pwc::PeripheralClocks;
use hal::timer4::{
    BufferTransfer, Counter, CounterConfig, CounterEvent, HighCompareMode, LowCompareMode, OcoHigh,
    PwmMode, Timer4,
};
use panic_halt as _;

const PWM_FREQUENCY_HZ: u32 = 20_000;
/// TIMER4_1 underflow sits in source block 6, IRQ 68..74
const ZERO_IRQ: IrqNumber = IrqNumber::new(68);

struct Modulator {
    counter: Counter<TMR4_1>,
    high: OcoHigh<TMR4_1, 0>,
    duty: u16,
}

static MODULATOR: Mutex<RefCell<Option<Modulator>>> = Mutex::new(RefCell::new(None));

fn on_zero() {
    critical_section::with(|cs| {
        if let Some(m) = MODULATOR.borrow_ref_mut(cs).as_mut() {
            m.counter.clear_flag(CounterEvent::Zero);
            let period = m.counter.period();
            m.duty = if m.duty >= period { 0 } else { m.duty + period / 100 };
            m.high.set_compare(m.duty);
        }
    });
}

#[entry]
fn main() -> ! {
    let p = Peripherals::take().unwrap();
    let gates = PeripheralClocks::new(p.PWC);
    let pins = Ports::new(p.PORT).split();
    let clocks = Clocks::reset();

    let _ouh = pins.pe9.into_alternate::<2>();
    let _oul = pins.pe8.into_alternate::<2>();

    let tmr4 = Timer4::new(p.TMR4_1, &gates.tmr4_1.into_enabled_clock(), &clocks);
    let mut parts = tmr4.split();

    let period = (clocks.pclk1.raw() / PWM_FREQUENCY_HZ - 1) as u16;
    parts.counter.configure(&CounterConfig {
        period,
        buffered_period: true,
        ..Default::default()
    });

    parts.uh.set_compare_buffer(BufferTransfer::AtZero);
    parts.uh.set_compare(period / 2);
    parts.uh.set_mode(HighCompareMode::pwm_sawtooth());
    parts.ul.set_mode(LowCompareMode::complementary());
    parts.uh.enable();
    parts.ul.enable();

    parts.u.set_mode(PwmMode::DeadTimer);
    parts.u.set_dead_time_ns(500, 500);

    let mut irqs = Interrupts::new(p.INTC);
    irqs.register(ZERO_IRQ, EventSource::TMR4_1_GUDF, on_zero)
        .unwrap();
    parts.counter.listen(CounterEvent::Zero);
    parts.counter.start();

    critical_section::with(|cs| {
        MODULATOR.borrow(cs).replace(Some(Modulator {
            counter: parts.counter,
            high: parts.uh,
            duty: period / 2,
        }))
    });
    interrupt::enable(ZERO_IRQ);

    loop {
        cortex_m::asm::wfi();
    }
}
