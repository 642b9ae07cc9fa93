//! Erases flash sector 10, programs a pattern through the NorFlash traits
//! and reads it back. LED0 on success, LED1 on any error.
#![no_std]
#![no_main]

use cortex_m_rt::entry;
use embedded_hal::digital::v2::OutputPin;
use embedded_storage::nor_flash::{NorFlash, ReadNorFlash};
use hc32f460_hal as hal;
use hal::efm::{self, Flash, SECTOR_SIZE};
use hal::gpio::{GpioExt, Ports};
use hal::pac::Peripherals;
use panic_halt as _;

const SECTOR: usize = 10;

fn program(flash: &mut Flash) -> Result<bool, efm::Error> {
    let start = efm::sector_address(SECTOR);
    flash.erase(start, start + SECTOR_SIZE as u32)?;

    let mut pattern = [0u8; 64];
    for (i, byte) in pattern.iter_mut().enumerate() {
        *byte = i as u8 ^ 0x5A;
    }
    flash.write(start, &pattern)?;
    flash.program_word(start + pattern.len() as u32, 0x1234_5678)?;

    let mut readback = [0u8; 64];
    flash.read(start, &mut readback)?;
    Ok(readback == pattern)
}

#[entry]
fn main() -> ! {
    let p = Peripherals::take().unwrap();
    let pins = Ports::new(p.PORT).split();
    let mut ok_led = pins.pe6.into_push_pull_output();
    let mut err_led = pins.pa7.into_push_pull_output();

    let mut flash = Flash::new(p.EFM);
    match program(&mut flash) {
        Ok(true) => ok_led.set_high().ok(),
        _ => err_led.set_high().ok(),
    };

    loop {
        cortex_m::asm::wfi();
    }
}
