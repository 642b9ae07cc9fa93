//! Computes CRC-16 and CRC-32 of a fixed message on the CRC unit and checks
//! both against the software tables. LED0 lights up when they agree, LED1
//! when they don't.
#![no_std]
#![no_main]

use cortex_m_rt::entry;
use embedded_hal::digital::v2::OutputPin;
use hc32f460_hal as hal;
use hal::crc::{software, Crc};
use hal::gpio::{GpioExt, Ports};
use hal::pac::Peripherals;
use hal::pwc::PeripheralClocks;
use panic_halt as _;

const MESSAGE: &[u8] = b"123456789";

#[entry]
fn main() -> ! {
    let p = Peripherals::take().unwrap();
    let gates = PeripheralClocks::new(p.PWC);
    let pins = Ports::new(p.PORT).split();
    let mut ok_led = pins.pe6.into_push_pull_output();
    let mut err_led = pins.pa7.into_push_pull_output();

    let mut crc = Crc::new(p.CRC, &gates.crc.into_enabled_clock());
    let crc16 = crc.crc16(0xFFFF, MESSAGE);
    let crc32 = crc.crc32(0xFFFF_FFFF, MESSAGE);

    let matches = crc16 == software::crc16(0xFFFF, MESSAGE)
        && crc32 == software::crc32(0xFFFF_FFFF, MESSAGE)
        && crc.check32(0xFFFF_FFFF, MESSAGE, crc32);

    if matches {
        ok_led.set_high().ok();
    } else {
        err_led.set_high().ok();
    }

    loop {
        cortex_m::asm::wfi();
    }
}
