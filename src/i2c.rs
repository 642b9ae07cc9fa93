//! Inter-Integrated Circuit (I2C) bus
//!
//! Three channels clocked from PCLK3. Every bus wait is bounded by an
//! iteration budget and reports [`Error::Timeout`] when it runs out.
//!
//! ```ignore
//! let scl = pins.pc4.into_alternate::<49>();
//! let sda = pins.pc5.into_alternate::<48>();
//! let mut eeprom = I2cBuilder::new(p.I2C1, &i2c1_clock, (scl, sda), &clocks)
//!     .baud(400.kHz())
//!     .into_master()?;
//! eeprom.write(0x50, &[0x00, 0xAA])?;
//! ```
use core::marker::PhantomData;
use embedded_hal::blocking::i2c::{Read, Write, WriteRead};
use paste::paste;

use crate::clock::Clocks;
use crate::gpio::{Alternate, Pin};
use crate::pac::i2c::*;
use crate::pac::{I2C1, I2C2, I2C3};
use crate::pwc::{Enabled, I2c1Clock, I2c2Clock, I2c3Clock};
use crate::time::{Hertz, RateExtU32};

pub const DEFAULT_TIMEOUT: u32 = 0x1_0000;

/// Largest `SLOWW` / `SHIGHW` value
const WIDTH_MAX: u32 = 31;
/// Clock cycles each SCL period spends outside the two width fields
const PERIOD_OVERHEAD: u32 = 4;
const CKDIV_MAX: u8 = 7;

// I2C Mode Markers
pub struct MasterMode;
pub struct SlaveMode;

/// I2C error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Address or data byte not acknowledged
    Nack,
    ArbitrationLost,
    /// Bus still busy when a start was requested
    Busy,
    /// Polling budget exhausted
    Timeout,
    /// Requested rate can't be produced from PCLK3
    BaudRate,
}

/// Transfer direction seen by a slave after its address matched
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Master writes, slave receives
    Receive,
    /// Master reads, slave transmits
    Transmit,
}

/// Status events that can raise the channel interrupts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    Start,
    AddressMatch,
    TransmitEnd,
    Stop,
    ReceiveFull,
    TransmitEmpty,
    ArbitrationLost,
    Nack,
    Timeout,
}

impl Event {
    /// CR2 enables sit at the same positions as the SR flags
    fn mask(self) -> u32 {
        match self {
            Event::Start => SR_STARTF,
            Event::AddressMatch => SR_SLADDR0F,
            Event::TransmitEnd => SR_TENDF,
            Event::Stop => SR_STOPF,
            Event::ReceiveFull => SR_RFULLF,
            Event::TransmitEmpty => SR_TEMPTYF,
            Event::ArbitrationLost => SR_ARLOF,
            Event::Nack => SR_NACKF,
            Event::Timeout => SR_TMOUTF,
        }
    }
}

/// Clock dividers for `baud`: (ckdiv, slow width, high width)
///
/// The smallest CKDIV wins, which keeps the width fields as fine grained as
/// possible. The low period gets the odd count so SCL low is never shorter
/// than SCL high.
pub fn clk_dividers(pclk3: Hertz, baud: Hertz) -> Result<(u8, u8, u8), Error> {
    if baud.raw() == 0 {
        return Err(Error::BaudRate);
    }
    for ckdiv in 0..=CKDIV_MAX {
        let fi2c = pclk3.raw() >> ckdiv;
        let cycles = fi2c / baud.raw();
        if cycles < PERIOD_OVERHEAD + 2 {
            // Dividing further only makes it worse
            return Err(Error::BaudRate);
        }
        let n = cycles - PERIOD_OVERHEAD;
        if n <= 2 * WIDTH_MAX {
            let high = n / 2;
            let low = n - high;
            return Ok((ckdiv, low as u8, high as u8));
        }
    }
    Err(Error::BaudRate)
}

/// SCL rate produced by a divider set
pub fn baud_rate(pclk3: Hertz, ckdiv: u8, low: u8, high: u8) -> Hertz {
    let fi2c = pclk3.raw() >> ckdiv;
    Hertz::from_raw(fi2c / (low as u32 + high as u32 + PERIOD_OVERHEAD))
}

/// An I2C channel
pub trait Instance {
    type Clock;
    /// PFSR function number of SDA
    const SDA_FUNC: u8;
    /// PFSR function number of SCL
    const SCL_FUNC: u8;

    fn regs(&self) -> crate::pac::i2c::I2c;
}

pub trait SclPin<I> {}
pub trait SdaPin<I> {}

/// (SCL, SDA)
pub trait Pins<I> {}

impl<I, SCL: SclPin<I>, SDA: SdaPin<I>> Pins<I> for (SCL, SDA) {}

macro_rules! i2c {
    ($($I2C:ident: ($I2c:ident, sda: $sda:literal, scl: $scl:literal),)+) => {
        paste! {
            $(
                impl Instance for $I2C {
                    type Clock = [<$I2c Clock>]<Enabled>;
                    const SDA_FUNC: u8 = $sda;
                    const SCL_FUNC: u8 = $scl;

                    fn regs(&self) -> crate::pac::i2c::I2c {
                        $I2C::regs(self)
                    }
                }

                impl<const P: u8, const N: u8> SclPin<$I2C> for Pin<Alternate<$scl>, P, N> {}
                impl<const P: u8, const N: u8> SdaPin<$I2C> for Pin<Alternate<$sda>, P, N> {}

                pub type [<$I2c Master>]<PINS> = I2c<$I2C, PINS, MasterMode>;
                pub type [<$I2c Slave>]<PINS> = I2c<$I2C, PINS, SlaveMode>;
            )+
        }
    };
}

i2c! {
    I2C1: (I2c1, sda: 48, scl: 49),
    I2C2: (I2c2, sda: 50, scl: 51),
    I2C3: (I2c3, sda: 52, scl: 53),
}

/// Digital noise filter length in PCLK3 cycles
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DigitalFilter {
    Cycles1 = 0,
    Cycles2 = 1,
    Cycles3 = 2,
    Cycles4 = 3,
}

pub struct I2cBuilder<I, PINS> {
    i2c: I,
    pins: PINS,
    pclk3: Hertz,
    baud: Hertz,
    timeout: u32,
    digital_filter: Option<DigitalFilter>,
    analog_filter: bool,
}

impl<I: Instance, PINS: Pins<I>> I2cBuilder<I, PINS> {
    /// Starts at 100 kHz with the analog filter on
    pub fn new(i2c: I, _clock: &I::Clock, pins: PINS, clocks: &Clocks) -> Self {
        I2cBuilder {
            i2c,
            pins,
            pclk3: clocks.pclk3,
            baud: 100_000u32.Hz(),
            timeout: DEFAULT_TIMEOUT,
            digital_filter: None,
            analog_filter: true,
        }
    }

    pub fn baud(mut self, baud: Hertz) -> Self {
        self.baud = baud;
        self
    }

    /// Polling budget of every bus wait
    pub fn timeout(mut self, timeout: u32) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn digital_filter(mut self, filter: Option<DigitalFilter>) -> Self {
        self.digital_filter = filter;
        self
    }

    pub fn analog_filter(mut self, enable: bool) -> Self {
        self.analog_filter = enable;
        self
    }

    fn init<MODE>(self, f: impl FnOnce(crate::pac::i2c::I2c)) -> Result<I2c<I, PINS, MODE>, Error> {
        let (ckdiv, low, high) = clk_dividers(self.pclk3, self.baud)?;
        let regs = self.i2c.regs();

        // Reset, then program the channel while held in reset
        regs.cr1().write(CR1_SWRST);
        regs.ccr().write(
            ((ckdiv as u32) << CCR_FREQ_SHIFT)
                | ((low as u32) << CCR_SLOWW_SHIFT)
                | ((high as u32) << CCR_SHIGHW_SHIFT),
        );
        let mut fltr = 0;
        if let Some(filter) = self.digital_filter {
            fltr |= FLTR_DNFEN | filter as u32;
        }
        if self.analog_filter {
            fltr |= FLTR_ANFEN;
        }
        regs.fltr().write(fltr);
        regs.cr2().write(0);
        f(regs);
        regs.clr().write(CLR_ALL);
        regs.cr1().write(CR1_PE);

        debug!(
            "I2C baud {=u32} Hz (ckdiv {=u8}, low {=u8}, high {=u8})",
            baud_rate(self.pclk3, ckdiv, low, high).raw(),
            ckdiv,
            low,
            high
        );

        Ok(I2c {
            i2c: self.i2c,
            pins: self.pins,
            timeout: self.timeout,
            _mode: PhantomData,
        })
    }

    pub fn into_master(self) -> Result<I2c<I, PINS, MasterMode>, Error> {
        self.init(|regs| {
            regs.slr0().write(0);
            regs.slr1().write(0);
        })
    }

    /// Answers to the 7-bit `address`
    pub fn into_slave(self, address: u8) -> Result<I2c<I, PINS, SlaveMode>, Error> {
        self.init(|regs| {
            regs.slr0()
                .write((((address as u32) << 1) & SLR_ADDR_MASK) | SLR_EN);
            regs.slr1().write(0);
        })
    }
}

pub struct I2c<I, PINS, MODE> {
    i2c: I,
    pins: PINS,
    timeout: u32,
    _mode: PhantomData<MODE>,
}

impl<I: Instance, PINS, MODE> I2c<I, PINS, MODE> {
    fn regs(&self) -> crate::pac::i2c::I2c {
        self.i2c.regs()
    }

    pub fn listen(&mut self, event: Event) {
        self.regs().cr2().set_bits(event.mask());
    }

    pub fn unlisten(&mut self, event: Event) {
        self.regs().cr2().clear_bits(event.mask());
    }

    pub fn is_pending(&self, event: Event) -> bool {
        self.regs().sr().is_set(event.mask())
    }

    pub fn clear(&mut self, event: Event) {
        self.regs().clr().write(event.mask());
    }

    /// Disables the channel and gives back the peripheral and pins
    pub fn free(self) -> (I, PINS) {
        self.regs().cr1().write(0);
        (self.i2c, self.pins)
    }

    /// Polls SR until `flag` is set. Arbitration loss and the polling
    /// budget abort the wait.
    fn wait_flag(&self, flag: u32) -> Result<(), Error> {
        let regs = self.regs();
        for _ in 0..self.timeout {
            let status = regs.sr().read();
            if status & SR_ARLOF != 0 {
                regs.clr().write(SR_ARLOF);
                return Err(Error::ArbitrationLost);
            }
            if status & flag != 0 {
                return Ok(());
            }
        }
        warn!("I2C timeout waiting for {=u32:#x}", flag);
        Err(Error::Timeout)
    }

    fn check_ack(&self) -> Result<(), Error> {
        let regs = self.regs();
        if regs.sr().is_set(SR_NACKF) {
            regs.clr().write(SR_NACKF);
            Err(Error::Nack)
        } else {
            Ok(())
        }
    }
}

impl<I: Instance, PINS> I2c<I, PINS, MasterMode> {
    /// Generates a start condition once the bus is idle
    pub fn start(&mut self) -> Result<(), Error> {
        let regs = self.regs();
        let mut budget = self.timeout;
        while regs.sr().is_set(SR_BUSY) {
            if budget == 0 {
                return Err(Error::Busy);
            }
            budget -= 1;
        }
        regs.clr().write(SR_STARTF);
        regs.cr1().set_bits(CR1_START);
        self.wait_flag(SR_STARTF)
    }

    /// Repeated start without releasing the bus
    pub fn restart(&mut self) -> Result<(), Error> {
        let regs = self.regs();
        regs.clr().write(SR_STARTF);
        regs.cr1().set_bits(CR1_RESTART);
        self.wait_flag(SR_STARTF)
    }

    /// Sends the 7-bit `address` with the R/W bit
    pub fn send_address(&mut self, address: u8, read: bool) -> Result<(), Error> {
        self.write_byte((address << 1) | read as u8)
    }

    /// Transmits one byte and checks that it was acknowledged
    pub fn write_byte(&mut self, byte: u8) -> Result<(), Error> {
        self.wait_flag(SR_TEMPTYF)?;
        self.regs().dtr().write(byte);
        self.wait_flag(SR_TENDF)?;
        self.check_ack()
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        bytes.iter().try_for_each(|&b| self.write_byte(b))
    }

    /// Receives `buffer.len()` bytes, answering the last one with NACK
    pub fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<(), Error> {
        let regs = self.regs();
        let last = buffer.len().saturating_sub(1);
        regs.cr1().clear_bits(CR1_ACK);
        for (i, byte) in buffer.iter_mut().enumerate() {
            if i == last {
                regs.cr1().set_bits(CR1_ACK);
            }
            self.wait_flag(SR_RFULLF)?;
            *byte = regs.drr().read();
        }
        regs.cr1().clear_bits(CR1_ACK);
        Ok(())
    }

    /// Generates a stop condition and waits for it
    pub fn stop(&mut self) -> Result<(), Error> {
        let regs = self.regs();
        regs.clr().write(SR_STOPF);
        regs.cr1().set_bits(CR1_STOP);
        self.wait_flag(SR_STOPF)
    }

    /// Runs `f` between start and stop, sending the stop even when `f` fails
    fn transaction(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<(), Error>,
    ) -> Result<(), Error> {
        self.start()?;
        let result = f(self);
        let stopped = self.stop();
        result.and(stopped)
    }
}

impl<I: Instance, PINS> Write for I2c<I, PINS, MasterMode> {
    type Error = Error;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Error> {
        self.transaction(|i2c| {
            i2c.send_address(address, false)?;
            i2c.write_bytes(bytes)
        })
    }
}

impl<I: Instance, PINS> Read for I2c<I, PINS, MasterMode> {
    type Error = Error;

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Error> {
        self.transaction(|i2c| {
            i2c.send_address(address, true)?;
            i2c.read_bytes(buffer)
        })
    }
}

impl<I: Instance, PINS> WriteRead for I2c<I, PINS, MasterMode> {
    type Error = Error;

    fn write_read(&mut self, address: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<(), Error> {
        self.transaction(|i2c| {
            i2c.send_address(address, false)?;
            i2c.write_bytes(bytes)?;
            i2c.restart()?;
            i2c.send_address(address, true)?;
            i2c.read_bytes(buffer)
        })
    }
}

impl<I: Instance, PINS> I2c<I, PINS, SlaveMode> {
    /// Reports an address match and the direction the master asked for
    pub fn poll_address_match(&mut self) -> nb::Result<Direction, Error> {
        let regs = self.regs();
        let status = regs.sr().read();
        if status & SR_SLADDR0F == 0 {
            return Err(nb::Error::WouldBlock);
        }
        regs.clr().write(SR_SLADDR0F);
        Ok(if status & SR_TRA != 0 {
            Direction::Transmit
        } else {
            Direction::Receive
        })
    }

    pub fn read_byte(&mut self) -> nb::Result<u8, Error> {
        let regs = self.regs();
        if regs.sr().is_set(SR_RFULLF) {
            Ok(regs.drr().read())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    /// Queues a byte for the master. A NACK from the master ends the read.
    pub fn write_byte(&mut self, byte: u8) -> nb::Result<(), Error> {
        let regs = self.regs();
        let status = regs.sr().read();
        if status & SR_NACKF != 0 {
            regs.clr().write(SR_NACKF);
            return Err(nb::Error::Other(Error::Nack));
        }
        if status & SR_TEMPTYF == 0 {
            return Err(nb::Error::WouldBlock);
        }
        regs.dtr().write(byte);
        Ok(())
    }

    /// Whether the master released the bus, clearing the flag
    pub fn take_stop(&mut self) -> bool {
        let regs = self.regs();
        if regs.sr().is_set(SR_STOPF) {
            regs.clr().write(SR_STOPF);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::{GpioExt, Ports};
    use crate::pac::{i2c, port, ram_block, PORT};

    #[test]
    fn dividers_for_standard_rates() {
        let pclk3: Hertz = 50u32.MHz();
        assert_eq!(clk_dividers(pclk3, 400u32.kHz()), Ok((1, 29, 29)));
        assert_eq!(clk_dividers(pclk3, 100u32.kHz()), Ok((3, 29, 29)));
        assert_eq!(
            baud_rate(pclk3, 1, 29, 29),
            Hertz::from_raw(25_000_000 / 62)
        );
    }

    #[test]
    fn dividers_stay_within_fields() {
        let pclk3 = Hertz::from_raw(42_000_000);
        for baud in [10_000, 50_000, 100_000, 250_000, 400_000, 1_000_000] {
            let (ckdiv, low, high) = clk_dividers(pclk3, Hertz::from_raw(baud)).unwrap();
            assert!(ckdiv <= 7);
            assert!(low as u32 <= WIDTH_MAX && high as u32 <= WIDTH_MAX);
            assert!(low >= high);
            let actual = baud_rate(pclk3, ckdiv, low, high).raw();
            // Within one width step of the request
            assert!(actual >= baud && actual < baud + baud / 8, "{} vs {}", actual, baud);
        }
    }

    #[test]
    fn unreachable_rates_are_rejected() {
        let pclk3 = Hertz::from_raw(8_000_000);
        assert_eq!(clk_dividers(pclk3, Hertz::from_raw(2_000_000)), Err(Error::BaudRate));
        assert_eq!(clk_dividers(pclk3, Hertz::from_raw(100)), Err(Error::BaudRate));
        assert_eq!(clk_dividers(pclk3, Hertz::from_raw(0)), Err(Error::BaudRate));
    }

    fn pins() -> (Pin<Alternate<49>, 2, 4>, Pin<Alternate<48>, 2, 5>) {
        let regs = unsafe { port::Port::from_ptr(ram_block(0x800)) };
        let pins = Ports::new(PORT::from_block(regs)).split();
        (pins.pc4.into_alternate(), pins.pc5.into_alternate())
    }

    fn builder() -> (
        I2cBuilder<I2C1, (Pin<Alternate<49>, 2, 4>, Pin<Alternate<48>, 2, 5>)>,
        i2c::I2c,
    ) {
        let regs = unsafe { i2c::I2c::from_ptr(ram_block(0x40)) };
        let clock = crate::pwc::test_clocks().i2c1.into_enabled_clock();
        let clocks = Clocks {
            pclk3: 50u32.MHz(),
            ..Clocks::reset()
        };
        (
            I2cBuilder::new(I2C1::from_block(regs), &clock, pins(), &clocks),
            regs,
        )
    }

    #[test]
    fn master_init_programs_clock_and_filters() {
        let (builder, regs) = builder();
        let _i2c = builder
            .baud(400u32.kHz())
            .digital_filter(Some(DigitalFilter::Cycles2))
            .into_master()
            .unwrap();
        assert_eq!(regs.ccr().read(), (1 << CCR_FREQ_SHIFT) | (29 << 8) | 29);
        assert_eq!(regs.fltr().read(), FLTR_DNFEN | FLTR_ANFEN | 1);
        assert_eq!(regs.cr1().read(), CR1_PE);
    }

    #[test]
    fn slave_address_is_left_aligned() {
        let (builder, regs) = builder();
        let _i2c = builder.into_slave(0x3A).unwrap();
        assert_eq!(regs.slr0().read(), (0x3A << 1) | SLR_EN);
    }

    #[test]
    fn blocking_write_walks_the_bus_sequence() {
        let (builder, regs) = builder();
        let mut i2c = builder.timeout(16).into_master().unwrap();
        regs.sr().write(SR_STARTF | SR_TEMPTYF | SR_TENDF | SR_STOPF);
        i2c.write(0x50, &[0x12, 0x34]).unwrap();
        assert_eq!(regs.dtr().read(), 0x34);
        assert!(regs.cr1().is_set(CR1_START | CR1_STOP));
    }

    #[test]
    fn nack_still_releases_the_bus() {
        let (builder, regs) = builder();
        let mut i2c = builder.timeout(16).into_master().unwrap();
        regs.sr()
            .write(SR_STARTF | SR_TEMPTYF | SR_TENDF | SR_STOPF | SR_NACKF);
        assert_eq!(i2c.write(0x50, &[0x12]), Err(Error::Nack));
        // Only the address went out
        assert_eq!(regs.dtr().read(), 0x50 << 1);
        assert!(regs.cr1().is_set(CR1_STOP));
    }

    #[test]
    fn waits_are_bounded() {
        let (builder, regs) = builder();
        let mut i2c = builder.timeout(16).into_master().unwrap();
        regs.sr().write(SR_BUSY);
        assert_eq!(i2c.start(), Err(Error::Busy));
        regs.sr().write(0);
        assert_eq!(i2c.start(), Err(Error::Timeout));
        regs.sr().write(SR_ARLOF);
        assert_eq!(i2c.restart(), Err(Error::ArbitrationLost));
    }

    #[test]
    fn read_nacks_the_last_byte() {
        let (builder, regs) = builder();
        let mut i2c = builder.timeout(16).into_master().unwrap();
        regs.sr().write(SR_RFULLF);
        regs.drr().write(0xA5);
        let mut buf = [0u8; 3];
        i2c.read_bytes(&mut buf).unwrap();
        assert_eq!(buf, [0xA5; 3]);
        assert!(!regs.cr1().is_set(CR1_ACK));
    }

    #[test]
    fn nack_is_armed_while_waiting_for_the_last_byte() {
        let (builder, regs) = builder();
        let mut i2c = builder.timeout(16).into_master().unwrap();
        // With RFULLF never set the read stops inside the first wait, so CR1
        // still shows the ACK setting that byte was received with.
        regs.sr().write(0);
        let mut single = [0u8; 1];
        assert_eq!(i2c.read_bytes(&mut single), Err(Error::Timeout));
        assert!(regs.cr1().is_set(CR1_ACK));

        let mut several = [0u8; 3];
        assert_eq!(i2c.read_bytes(&mut several), Err(Error::Timeout));
        assert!(!regs.cr1().is_set(CR1_ACK));
    }

    #[test]
    fn slave_polling() {
        let (builder, regs) = builder();
        let mut i2c = builder.into_slave(0x10).unwrap();
        assert!(matches!(i2c.poll_address_match(), Err(nb::Error::WouldBlock)));
        regs.sr().write(SR_SLADDR0F | SR_TRA | SR_TEMPTYF);
        assert_eq!(i2c.poll_address_match(), Ok(Direction::Transmit));
        assert_eq!(i2c.write_byte(0x42), Ok(()));
        assert_eq!(regs.dtr().read(), 0x42);
        assert!(matches!(i2c.read_byte(), Err(nb::Error::WouldBlock)));
        regs.sr().write(SR_NACKF);
        assert_eq!(i2c.write_byte(0x43), Err(nb::Error::Other(Error::Nack)));
    }
}
