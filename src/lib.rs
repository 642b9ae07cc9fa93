//! HAL for the HC32F460 microcontroller
//!
//! This is an implementation of the [`embedded-hal`] traits for the HC32F460 family
//! (Cortex-M4F, 512 KiB flash, 192 KiB SRAM).
//!
//! [`embedded-hal`]: https://github.com/rust-embedded/embedded-hal
//!
//! # Usage
//!
//! To build applications (binary crates) using this crate follow the [cortex-m-quickstart]
//! instructions, add this crate as a dependency and enable the "rt" Cargo feature so the
//! peripheral vector table is linked in.
//!
//! [cortex-m-quickstart]: https://docs.rs/cortex-m-quickstart
//!
//! ```ignore
//! let p = hal::pac::Peripherals::take().unwrap();
//! let mut gates = hal::pwc::PeripheralClocks::new(p.PWC);
//! let ports = hal::gpio::Ports::new(p.PORT);
//! let gpio = ports.split();
//! let mut led = gpio.pd4.into_push_pull_output();
//! led.set_high().ok();
//! ```
//!
//! # Examples
//!
//! Standalone example programs live in `boards/hc32f460_evb`.

#![cfg_attr(not(test), no_std)]

pub use embedded_hal as hal;

// This must go first so the logging macros are visible to every other module.
#[macro_use]
mod fmt;

pub mod pac;

pub mod clock;
pub mod cmp;
pub mod crc;
pub mod delay;
pub mod dma;
pub mod efm;
pub mod exint;
pub mod gpio;
pub mod i2c;
pub mod interrupt;
pub mod keyscan;
pub mod pwc;
pub mod time;
pub mod timer0;
pub mod timer4;
