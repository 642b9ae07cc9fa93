//! Writes one page to the 24C02 EEPROM on I2C1 (SCL PC4, SDA PC5) and reads
//! it back. LED0 on a match, LED1 otherwise.
#![no_std]
#![no_main]

use cortex_m_rt::entry;
use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Write, WriteRead};
use embedded_hal::digital::v2::OutputPin;
use hc32f460_hal as hal;
use hal::clock::Clocks;
use hal::delay::Delay;
use hal::gpio::{GpioExt, Ports};
use hal::i2c::{self, I2cBuilder};
use hal::pac::Peripherals;
use hal::pwc::PeripheralClocks;
use hal::time::RateExtU32;
use panic_halt as _;

const EEPROM_ADDRESS: u8 = 0x50;
const PAGE_SIZE: usize = 8;
const WORD_ADDRESS: u8 = 0x00;
/// Internal write cycle of the EEPROM
const WRITE_CYCLE_MS: u32 = 5;

#[entry]
fn main() -> ! {
    let core = cortex_m::Peripherals::take().unwrap();
    let p = Peripherals::take().unwrap();
    let gates = PeripheralClocks::new(p.PWC);
    let pins = Ports::new(p.PORT).split();
    let clocks = Clocks::reset();
    let mut delay = Delay::new(core.SYST, &clocks);

    let mut ok_led = pins.pe6.into_push_pull_output();
    let mut err_led = pins.pa7.into_push_pull_output();

    let scl = pins.pc4.into_alternate::<49>();
    let sda = pins.pc5.into_alternate::<48>();
    let mut eeprom = I2cBuilder::new(p.I2C1, &gates.i2c1.into_enabled_clock(), (scl, sda), &clocks)
        .baud(100u32.kHz())
        .into_master()
        .unwrap();

    let mut frame = [0u8; PAGE_SIZE + 1];
    frame[0] = WORD_ADDRESS;
    for (i, byte) in frame[1..].iter_mut().enumerate() {
        *byte = 0xA0 + i as u8;
    }

    let result: Result<bool, i2c::Error> = (|| {
        eeprom.write(EEPROM_ADDRESS, &frame)?;
        delay.delay_ms(WRITE_CYCLE_MS);
        let mut readback = [0u8; PAGE_SIZE];
        eeprom.write_read(EEPROM_ADDRESS, &[WORD_ADDRESS], &mut readback)?;
        Ok(readback[..] == frame[1..])
    })();

    match result {
        Ok(true) => ok_led.set_high().ok(),
        _ => err_led.set_high().ok(),
    };

    loop {
        cortex_m::asm::wfi();
    }
}
