//! Scans a 3 x 3 key matrix: rows on KEYOUT0..2 (PC8, PC7, PC6), columns on
//! PD12..14 (EIRQ12..14). The last key index pressed is shown on LED0..3 as
//! a binary number.
#![no_std]
#![no_main]

use core::cell::RefCell;
use core::sync::atomic::{AtomicU16, Ordering};

use cortex_m_rt::entry;
use critical_section::Mutex;
use embedded_hal::digital::v2::OutputPin;
use hc32f460_hal as hal;
use hal::exint::{self, ExintConfig, ExtiPin, FilterClock, Trigger};
use hal::gpio::{GpioExt, Ports};
use hal::interrupt::{self, EventSource, Interrupts, IrqNumber};
use hal::keyscan::{HizTime, Keyscan, KeyscanConfig, ScanClock};
use hal::pac::Peripherals;
use hal::pwc::PeripheralClocks;
use panic_halt as _;

const FUNC_KEY: u8 = 8;
const COLUMNS: [u8; 3] = [12, 13, 14];
const NO_KEY: u16 = 0xFFFF;

static KEYSCAN: Mutex<RefCell<Option<Keyscan>>> = Mutex::new(RefCell::new(None));
static LAST_KEY: AtomicU16 = AtomicU16::new(NO_KEY);

fn on_column() {
    critical_section::with(|cs| {
        let keyscan = KEYSCAN.borrow_ref(cs);
        for ch in COLUMNS {
            if !exint::is_pending(ch) {
                continue;
            }
            exint::clear(ch);
            if let Some(keyscan) = keyscan.as_ref() {
                if let Ok(key) = keyscan.key(ch) {
                    LAST_KEY.store(keyscan.key_index(key), Ordering::Relaxed);
                }
            }
        }
    });
}

#[entry]
fn main() -> ! {
    let p = Peripherals::take().unwrap();
    let gates = PeripheralClocks::new(p.PWC);
    let pins = Ports::new(p.PORT).split();

    let _row0 = pins.pc8.into_alternate::<FUNC_KEY>();
    let _row1 = pins.pc7.into_alternate::<FUNC_KEY>();
    let _row2 = pins.pc6.into_alternate::<FUNC_KEY>();
    let mut col0 = pins.pd12.into_pull_up_input();
    let mut col1 = pins.pd13.into_pull_up_input();
    let mut col2 = pins.pd14.into_pull_up_input();
    col0.enable_interrupt();
    col1.enable_interrupt();
    col2.enable_interrupt();

    let mut irqs = Interrupts::new(p.INTC);
    for (i, ch) in COLUMNS.into_iter().enumerate() {
        irqs.configure_exint(
            ch,
            ExintConfig {
                trigger: Trigger::Falling,
                filter: Some(FilterClock::Pclk3Div64),
            },
        );
        let irq = IrqNumber::new(1 + i as u8);
        irqs.register(irq, EventSource::eirq(ch), on_column).unwrap();
        interrupt::enable(irq);
    }

    let mut keyscan = Keyscan::new(
        p.KEYSCAN,
        &gates.keyscan.into_enabled_clock(),
        KeyscanConfig {
            rows: 3,
            columns: COLUMNS.iter().fold(0, |mask, ch| mask | 1 << ch),
            clock: ScanClock::Lrc,
            low_level: 9,
            hiz: HizTime::Cycles64,
        },
    )
    .unwrap();
    keyscan.start();
    critical_section::with(|cs| KEYSCAN.borrow(cs).replace(Some(keyscan)));

    let mut leds = (
        pins.pe6.into_push_pull_output(),
        pins.pa7.into_push_pull_output(),
        pins.pb5.into_push_pull_output(),
        pins.pb9.into_push_pull_output(),
    );
    loop {
        cortex_m::asm::wfi();
        let key = LAST_KEY.swap(NO_KEY, Ordering::Relaxed);
        if key == NO_KEY {
            continue;
        }
        leds.0.set_state((key & 1 != 0).into()).ok();
        leds.1.set_state((key & 2 != 0).into()).ok();
        leds.2.set_state((key & 4 != 0).into()).ok();
        leds.3.set_state((key & 8 != 0).into()).ok();
    }
}
