//! Compares the voltage on CMP1 INP1 (PA4) against 1.65 V from DAC1. LED0
//! follows the comparator output, updated from its edge interrupt.
#![no_std]
#![no_main]

use core::cell::RefCell;

use cortex_m_rt::entry;
use critical_section::Mutex;
use embedded_hal::digital::v2::OutputPin;
use hc32f460_hal as hal;
use hal::clock::Clocks;
use hal::cmp::{
    Comparator, ComparatorConfig, Comparators, Edge, Filter, NegativeInput, PositiveInput,
};
use hal::delay::Delay;
use hal::gpio::{GpioExt, Output, Ports, PushPull, PE6};
use hal::interrupt::{self, EventSource, Interrupts, IrqNumber};
use hal::pac::Peripherals;
use hal::pwc::PeripheralClocks;
use panic_halt as _;

const AVCC_MV: u32 = 3300;
const THRESHOLD_MV: u32 = 1650;
/// ACMP1 is in source block 12, IRQ 104..110
const CMP_IRQ: IrqNumber = IrqNumber::new(104);

static STATE: Mutex<RefCell<Option<(Comparator<0>, PE6<Output<PushPull>>)>>> =
    Mutex::new(RefCell::new(None));

fn on_edge() {
    critical_section::with(|cs| {
        if let Some((cmp, led)) = STATE.borrow_ref_mut(cs).as_mut() {
            led.set_state(cmp.output().into()).ok();
        }
    });
}

#[entry]
fn main() -> ! {
    let core = cortex_m::Peripherals::take().unwrap();
    let p = Peripherals::take().unwrap();
    let gates = PeripheralClocks::new(p.PWC);
    let pins = Ports::new(p.PORT).split();
    let clocks = Clocks::reset();
    let mut delay = Delay::new(core.SYST, &clocks);

    let _inp1 = pins.pa4.into_analog();
    let led = pins.pe6.into_push_pull_output();

    let comparators = Comparators::new(p.CMP, &gates.cmp.into_enabled_clock());
    let mut parts = comparators.split();
    parts.dac1.set_millivolts(THRESHOLD_MV, AVCC_MV);
    parts.dac1.enable();

    let mut cmp = parts.cmp1;
    cmp.configure(&ComparatorConfig {
        positive: PositiveInput::Inp1,
        negative: NegativeInput::Dac1,
        filter: Filter::Pclk3Div8,
        interrupt: Some(Edge::Both),
        invert: false,
        pin_output: false,
    });
    cmp.enable(&mut delay);

    let mut irqs = Interrupts::new(p.INTC);
    irqs.register(CMP_IRQ, EventSource::ACMP1, on_edge).unwrap();
    critical_section::with(|cs| STATE.borrow(cs).replace(Some((cmp, led))));
    on_edge();
    interrupt::enable(CMP_IRQ);

    loop {
        cortex_m::asm::wfi();
    }
}
