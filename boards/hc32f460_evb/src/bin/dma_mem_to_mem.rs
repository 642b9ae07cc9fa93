//! Copies a 256 word buffer with DMA1 channel 0, triggered from software,
//! and checks the copy. LED0 on success, LED1 on failure.
#![no_std]
#![no_main]

use cortex_m::singleton;
use cortex_m_rt::entry;
use embedded_hal::digital::v2::OutputPin;
use hc32f460_hal as hal;
use hal::dma::{Aos, Dma};
use hal::gpio::{GpioExt, Ports};
use hal::pac::Peripherals;
use hal::pwc::PeripheralClocks;
use panic_halt as _;

const LEN: usize = 256;

#[entry]
fn main() -> ! {
    let p = Peripherals::take().unwrap();
    let gates = PeripheralClocks::new(p.PWC);
    let pins = Ports::new(p.PORT).split();
    let mut ok_led = pins.pe6.into_push_pull_output();
    let mut err_led = pins.pa7.into_push_pull_output();

    let source = singleton!(: [u32; LEN] = [0; LEN]).unwrap();
    for (i, word) in source.iter_mut().enumerate() {
        *word = 0x0101_0101u32.wrapping_mul(i as u32);
    }
    let source: &'static [u32; LEN] = source;
    let destination = singleton!(: [u32; LEN] = [0; LEN]).unwrap();

    let aos = Aos::new(p.AOS, &gates.aos.into_enabled_clock());
    let dma = Dma::new(p.DMA1, &gates.dma1.into_enabled_clock(), &aos);
    let channels = dma.split();

    let transfer = channels
        .ch0
        .mem_to_mem(source, destination)
        .unwrap();
    match transfer.wait() {
        Ok((_channel, (source, destination))) if source[..] == destination[..] => {
            ok_led.set_high().ok();
        }
        _ => {
            err_led.set_high().ok();
        }
    }

    loop {
        cortex_m::asm::wfi();
    }
}
