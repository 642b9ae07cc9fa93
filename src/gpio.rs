//! General Purpose Input / Output
//!
//! Every pin is a [`Pin`] typed by its mode, port index and pin number. Mode
//! changes go through the pin control register (PCR) and the function select
//! register (PFSR), both guarded by the PWPR write protection, which is lifted
//! only for the duration of each change.
use {
    core::convert::Infallible,
    core::marker::PhantomData,
    embedded_hal::digital::v2::{InputPin, OutputPin, StatefulOutputPin, ToggleableOutputPin},
};

use crate::pac::port::{self, *};
use crate::pac::{Reg, PORT};

/// The GpioExt trait allows splitting the PORT hardware into
/// its constituent pin parts.
pub trait GpioExt {
    type Parts;

    /// Consume and split the device into its constitent parts
    fn split(self) -> Self::Parts;
}

pub struct Ports {
    port: PORT,
}

impl Ports {
    pub fn new(port: PORT) -> Self {
        Ports { port }
    }

    /// Hands PA15 (TDI), PB3 (TDO) and PB4 (TRST) over to GPIO, keeping the
    /// SWD pins for the debugger.
    pub fn release_jtag_pins(&mut self) {
        let regs = self.port.regs();
        with_unlocked(regs, || regs.pspcr().clear_bits(0b11100));
    }
}

/// Runs `f` with the pin configuration registers writable.
fn with_unlocked<R>(regs: port::Port, f: impl FnOnce() -> R) -> R {
    regs.pwpr().write(PWPR_UNLOCK);
    let result = f();
    regs.pwpr().write(PWPR_LOCK);
    result
}

/// Represents a pin configured for input.
/// The MODE type is typically one of `Floating` or `PullUp`.
pub struct Input<MODE> {
    _mode: PhantomData<MODE>,
}

/// Represents a pin configured for output.
/// The MODE type is typically one of `PushPull`, or
/// `OpenDrain`.
pub struct Output<MODE> {
    _mode: PhantomData<MODE>,
}

/// Pin handed to a peripheral, `FUNC` is the PFSR function number (0..63)
pub struct Alternate<const FUNC: u8>;

/// Digital input buffer disabled, for CMP and ADC inputs
pub struct Analog;

/// Floating Input
pub struct Floating;
/// Pulled up Input
pub struct PullUp;

/// Totem Pole aka Push-Pull
pub struct PushPull;
/// Open drain output
pub struct OpenDrain;

/// Output drive strength
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Drive {
    Low = 0,
    Mid = 1,
    High = 2,
}

/// A single GPIO pin. `P` is the port index (A = 0 .. E = 4, H = 5).
pub struct Pin<MODE, const P: u8, const N: u8> {
    regs: port::Port,
    _mode: PhantomData<MODE>,
}

impl<MODE, const P: u8, const N: u8> Pin<MODE, P, N> {
    const MASK: u16 = 1 << N;

    fn new(regs: port::Port) -> Self {
        Pin {
            regs,
            _mode: PhantomData,
        }
    }

    fn into_mode<NEW>(self) -> Pin<NEW, P, N> {
        Pin::new(self.regs)
    }

    /// Port index of this pin
    pub const fn port(&self) -> u8 {
        P
    }

    /// Pin number within its port, also its external interrupt channel
    pub const fn pin_number(&self) -> u8 {
        N
    }

    pub(crate) fn pcr(&self) -> &'static Reg<u16> {
        self.regs.pcr(P, N)
    }

    /// Read-modify-write of the pin control register with protection lifted.
    pub(crate) fn configure(&mut self, f: impl FnOnce(u16) -> u16) {
        let pcr = self.pcr();
        with_unlocked(self.regs, || pcr.modify(f));
    }

    fn select_function(&mut self, func: u8) {
        let pfsr = self.regs.pfsr(P, N);
        with_unlocked(self.regs, || {
            pfsr.write_field(PFSR_FSEL_MASK, PFSR_FSEL_SHIFT, func as u16)
        });
    }

    pub fn into_floating_input(mut self) -> Pin<Input<Floating>, P, N> {
        self.select_function(0);
        self.configure(|v| v & !(PCR_POUTE | PCR_PUU | PCR_NOD | PCR_DDIS)); // Input, no pull-up
        self.into_mode()
    }

    pub fn into_pull_up_input(mut self) -> Pin<Input<PullUp>, P, N> {
        self.select_function(0);
        self.configure(|v| (v & !(PCR_POUTE | PCR_NOD | PCR_DDIS)) | PCR_PUU); // Input, pull-up
        self.into_mode()
    }

    /// Configures the pin to operate as a push-pull output
    pub fn into_push_pull_output(mut self) -> Pin<Output<PushPull>, P, N> {
        self.select_function(0);
        self.configure(|v| (v & !(PCR_NOD | PCR_DDIS)) | PCR_POUTE); // Enable output driver
        self.into_mode()
    }

    /// Configures the pin to operate as an open drain output
    pub fn into_open_drain_output(mut self) -> Pin<Output<OpenDrain>, P, N> {
        self.select_function(0);
        self.configure(|v| (v & !PCR_DDIS) | PCR_NOD | PCR_POUTE); // Enable open drain
        self.into_mode()
    }

    /// Hands the pin to the peripheral function `FUNC`.
    pub fn into_alternate<const FUNC: u8>(mut self) -> Pin<Alternate<FUNC>, P, N> {
        assert!(FUNC < 64, "function numbers are 0..63");
        self.configure(|v| v & !PCR_DDIS);
        self.select_function(FUNC);
        self.into_mode()
    }

    pub fn into_analog(mut self) -> Pin<Analog, P, N> {
        self.select_function(0);
        self.configure(|v| (v & !(PCR_POUTE | PCR_PUU)) | PCR_DDIS); // Disable digital input
        self.into_mode()
    }

    /// Inverts both the input and output data of the pin
    pub fn set_inverted(&mut self, invert: bool) {
        self.configure(|v| if invert { v | PCR_INVE } else { v & !PCR_INVE });
    }

    /// Latches the current output level so later writes are ignored
    pub fn set_latched(&mut self, latch: bool) {
        self.configure(|v| if latch { v | PCR_LTE } else { v & !PCR_LTE });
    }

    fn input_high(&self) -> bool {
        self.regs.pidr(P).read() & Self::MASK != 0
    }
}

impl<MODE, const P: u8, const N: u8> Pin<Output<MODE>, P, N> {
    pub fn set_drive(&mut self, drive: Drive) {
        self.configure(|v| (v & !PCR_DRV_MASK) | ((drive as u16) << PCR_DRV_SHIFT));
    }
}

impl<MODE, const P: u8, const N: u8> InputPin for Pin<Input<MODE>, P, N> {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Infallible> {
        Ok(self.input_high())
    }

    fn is_low(&self) -> Result<bool, Infallible> {
        Ok(!self.input_high())
    }
}

/// Outputs read back the level on the pad
impl<MODE, const P: u8, const N: u8> InputPin for Pin<Output<MODE>, P, N> {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Infallible> {
        Ok(self.input_high())
    }

    fn is_low(&self) -> Result<bool, Infallible> {
        Ok(!self.input_high())
    }
}

impl<MODE, const P: u8, const N: u8> OutputPin for Pin<Output<MODE>, P, N> {
    type Error = Infallible;

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.regs.posr(P).write(Self::MASK);
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.regs.porr(P).write(Self::MASK);
        Ok(())
    }
}

impl<MODE, const P: u8, const N: u8> StatefulOutputPin for Pin<Output<MODE>, P, N> {
    fn is_set_high(&self) -> Result<bool, Infallible> {
        Ok(self.regs.podr(P).read() & Self::MASK != 0)
    }

    fn is_set_low(&self) -> Result<bool, Infallible> {
        Ok(self.regs.podr(P).read() & Self::MASK == 0)
    }
}

impl<MODE, const P: u8, const N: u8> ToggleableOutputPin for Pin<Output<MODE>, P, N> {
    type Error = Infallible;

    fn toggle(&mut self) -> Result<(), Infallible> {
        self.regs.potr(P).write(Self::MASK);
        Ok(())
    }
}

/// Whole-port access, for driving several pins of one port at once
pub struct Port<const P: u8> {
    regs: port::Port,
}

impl<const P: u8> Port<P> {
    /// Input levels of all pins
    pub fn read(&self) -> u16 {
        self.regs.pidr(P).read()
    }

    /// Output latch of all pins
    pub fn output(&self) -> u16 {
        self.regs.podr(P).read()
    }

    pub fn set_bits(&mut self, mask: u16) {
        self.regs.posr(P).write(mask);
    }

    pub fn reset_bits(&mut self, mask: u16) {
        self.regs.porr(P).write(mask);
    }

    pub fn toggle_bits(&mut self, mask: u16) {
        self.regs.potr(P).write(mask);
    }
}

macro_rules! pins {
    (
        ports: [$($(#[$pattr:meta])* $port_ident:ident: $port_no:literal,)+],
        $($(#[$attr:meta])* $PinType:ident: ($pin_ident:ident, $port:literal, $i:literal),)+
    ) => {
        /// Holds the GPIO broken out pin instances (consumes the Ports object)
        pub struct Pins {
            $(
                $(#[$pattr])*
                pub $port_ident: Port<$port_no>,
            )+
            $(
                $(#[$attr])*
                pub $pin_ident: $PinType<Input<Floating>>,
            )+
        }

        impl GpioExt for Ports {
            type Parts = Pins;

            /// Split the PORT peripheral into discrete pins
            fn split(self) -> Pins {
                let regs = self.port.regs();
                Pins {
                    $(
                        $(#[$pattr])*
                        $port_ident: Port { regs },
                    )+
                    $(
                        $(#[$attr])*
                        $pin_ident: Pin::new(regs),
                    )+
                }
            }
        }

        $(
            $(#[$attr])*
            pub type $PinType<MODE> = Pin<MODE, $port, $i>;
        )+
    };
}

pins! {
    ports: [
        port_a: 0,
        port_b: 1,
        port_c: 2,
        #[cfg(feature = "hc32f460_e")]
        port_d: 3,
        #[cfg(feature = "hc32f460_e")]
        port_e: 4,
        port_h: 5,
    ],
    PA0: (pa0, 0, 0),
    PA1: (pa1, 0, 1),
    PA2: (pa2, 0, 2),
    PA3: (pa3, 0, 3),
    PA4: (pa4, 0, 4),
    PA5: (pa5, 0, 5),
    PA6: (pa6, 0, 6),
    PA7: (pa7, 0, 7),
    PA8: (pa8, 0, 8),
    PA9: (pa9, 0, 9),
    PA10: (pa10, 0, 10),
    PA11: (pa11, 0, 11),
    PA12: (pa12, 0, 12),
    PA13: (pa13, 0, 13),
    PA14: (pa14, 0, 14),
    PA15: (pa15, 0, 15),
    PB0: (pb0, 1, 0),
    PB1: (pb1, 1, 1),
    PB2: (pb2, 1, 2),
    PB3: (pb3, 1, 3),
    PB4: (pb4, 1, 4),
    PB5: (pb5, 1, 5),
    PB6: (pb6, 1, 6),
    PB7: (pb7, 1, 7),
    PB8: (pb8, 1, 8),
    PB9: (pb9, 1, 9),
    PB10: (pb10, 1, 10),
    PB11: (pb11, 1, 11),
    PB12: (pb12, 1, 12),
    PB13: (pb13, 1, 13),
    PB14: (pb14, 1, 14),
    PB15: (pb15, 1, 15),
    PC0: (pc0, 2, 0),
    PC1: (pc1, 2, 1),
    PC2: (pc2, 2, 2),
    PC3: (pc3, 2, 3),
    PC4: (pc4, 2, 4),
    PC5: (pc5, 2, 5),
    PC6: (pc6, 2, 6),
    PC7: (pc7, 2, 7),
    PC8: (pc8, 2, 8),
    PC9: (pc9, 2, 9),
    PC10: (pc10, 2, 10),
    PC11: (pc11, 2, 11),
    PC12: (pc12, 2, 12),
    PC13: (pc13, 2, 13),
    PC14: (pc14, 2, 14),
    PC15: (pc15, 2, 15),
    #[cfg(feature = "hc32f460_e")]
    PD0: (pd0, 3, 0),
    #[cfg(feature = "hc32f460_e")]
    PD1: (pd1, 3, 1),
    #[cfg(feature = "hc32f460_e")]
    PD2: (pd2, 3, 2),
    #[cfg(feature = "hc32f460_e")]
    PD3: (pd3, 3, 3),
    #[cfg(feature = "hc32f460_e")]
    PD4: (pd4, 3, 4),
    #[cfg(feature = "hc32f460_e")]
    PD5: (pd5, 3, 5),
    #[cfg(feature = "hc32f460_e")]
    PD6: (pd6, 3, 6),
    #[cfg(feature = "hc32f460_e")]
    PD7: (pd7, 3, 7),
    #[cfg(feature = "hc32f460_e")]
    PD8: (pd8, 3, 8),
    #[cfg(feature = "hc32f460_e")]
    PD9: (pd9, 3, 9),
    #[cfg(feature = "hc32f460_e")]
    PD10: (pd10, 3, 10),
    #[cfg(feature = "hc32f460_e")]
    PD11: (pd11, 3, 11),
    #[cfg(feature = "hc32f460_e")]
    PD12: (pd12, 3, 12),
    #[cfg(feature = "hc32f460_e")]
    PD13: (pd13, 3, 13),
    #[cfg(feature = "hc32f460_e")]
    PD14: (pd14, 3, 14),
    #[cfg(feature = "hc32f460_e")]
    PD15: (pd15, 3, 15),
    #[cfg(feature = "hc32f460_e")]
    PE0: (pe0, 4, 0),
    #[cfg(feature = "hc32f460_e")]
    PE1: (pe1, 4, 1),
    #[cfg(feature = "hc32f460_e")]
    PE2: (pe2, 4, 2),
    #[cfg(feature = "hc32f460_e")]
    PE3: (pe3, 4, 3),
    #[cfg(feature = "hc32f460_e")]
    PE4: (pe4, 4, 4),
    #[cfg(feature = "hc32f460_e")]
    PE5: (pe5, 4, 5),
    #[cfg(feature = "hc32f460_e")]
    PE6: (pe6, 4, 6),
    #[cfg(feature = "hc32f460_e")]
    PE7: (pe7, 4, 7),
    #[cfg(feature = "hc32f460_e")]
    PE8: (pe8, 4, 8),
    #[cfg(feature = "hc32f460_e")]
    PE9: (pe9, 4, 9),
    #[cfg(feature = "hc32f460_e")]
    PE10: (pe10, 4, 10),
    #[cfg(feature = "hc32f460_e")]
    PE11: (pe11, 4, 11),
    #[cfg(feature = "hc32f460_e")]
    PE12: (pe12, 4, 12),
    #[cfg(feature = "hc32f460_e")]
    PE13: (pe13, 4, 13),
    #[cfg(feature = "hc32f460_e")]
    PE14: (pe14, 4, 14),
    #[cfg(feature = "hc32f460_e")]
    PE15: (pe15, 4, 15),
    PH0: (ph0, 5, 0),
    PH1: (ph1, 5, 1),
    PH2: (ph2, 5, 2),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac::ram_block;

    fn pins() -> (Pins, port::Port) {
        let regs = unsafe { port::Port::from_ptr(ram_block(0x800)) };
        (Ports::new(PORT::from_block(regs)).split(), regs)
    }

    #[test]
    fn output_configuration_and_writes() {
        let (pins, regs) = pins();
        let mut led = pins.pb5.into_push_pull_output();
        assert_eq!(regs.pcr(1, 5).read(), PCR_POUTE);
        assert_eq!(regs.pwpr().read(), PWPR_LOCK);

        led.set_high().unwrap();
        assert_eq!(regs.posr(1).read(), 1 << 5);
        led.set_low().unwrap();
        assert_eq!(regs.porr(1).read(), 1 << 5);
        led.toggle().unwrap();
        assert_eq!(regs.potr(1).read(), 1 << 5);

        regs.podr(1).write(1 << 5);
        assert!(led.is_set_high().unwrap());
        led.set_drive(Drive::High);
        assert_eq!(regs.pcr(1, 5).read(), PCR_POUTE | (2 << PCR_DRV_SHIFT));
    }

    #[test]
    fn input_modes() {
        let (pins, regs) = pins();
        let button = pins.pa0.into_pull_up_input();
        assert_eq!(regs.pcr(0, 0).read(), PCR_PUU);
        regs.pidr(0).write(1);
        assert!(button.is_high().unwrap());

        let od = button.into_open_drain_output();
        assert_eq!(regs.pcr(0, 0).read(), PCR_PUU | PCR_NOD | PCR_POUTE);
        let input = od.into_floating_input();
        assert_eq!(regs.pcr(0, 0).read(), 0);
        let analog = input.into_analog();
        assert_eq!(regs.pcr(0, 0).read(), PCR_DDIS);
        assert_eq!(analog.pin_number(), 0);
    }

    #[test]
    fn alternate_function_select() {
        let (pins, regs) = pins();
        let _scl = pins.pc4.into_alternate::<49>();
        assert_eq!(regs.pfsr(2, 4).read() & PFSR_FSEL_MASK, 49);
        let _mco = pins.ph2.into_alternate::<1>();
        assert_eq!(regs.pfsr(5, 2).read(), 1);
    }

    #[test]
    fn port_wide_access() {
        let (mut pins, regs) = pins();
        pins.port_c.set_bits(0x00F0);
        assert_eq!(regs.posr(2).read(), 0x00F0);
        pins.port_c.reset_bits(0x0010);
        assert_eq!(regs.porr(2).read(), 0x0010);
        regs.pidr(2).write(0xA5A5);
        assert_eq!(pins.port_c.read(), 0xA5A5);
    }
}
