//! DMA controller
//!
//! Two units with four channels each. A channel moves `block_size` data
//! items every time its trigger event fires, `transfer_count` times (0 keeps
//! going forever). Triggers are routed through the AOS: any peripheral event
//! number, or the software trigger [`EventSource::AOS_SOFTWARE`] fired with
//! [`Aos::software_trigger`].
//!
//! ```ignore
//! let aos = Aos::new(p.AOS, &clocks.aos.into_enabled_clock());
//! let dma = Dma::new(p.DMA1, &clocks.dma1.into_enabled_clock(), &aos);
//! let channels = dma.split();
//!
//! let transfer = channels.ch0.mem_to_mem(SRC, DST).unwrap();
//! let (ch0, (src, dst)) = transfer.wait().unwrap();
//! ```

use core::fmt;
use core::marker::PhantomData;
use core::sync::atomic::{compiler_fence, Ordering};
use core::{mem, ptr};
use embedded_dma::{ReadBuffer, WriteBuffer};

use crate::interrupt::EventSource;
use crate::pac::dma::*;
use crate::pac::{aos, AOS, DMA1, DMA2};
use crate::pwc::{AosClock, Dma1Clock, Dma2Clock, Enabled};

pub const CHANNELS: u8 = 4;
pub const MAX_BLOCK_SIZE: u16 = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Block or repeat size outside 1..=1024
    BlockSize,
    /// Source and destination buffers differ in length, or a buffer isn't a
    /// whole number of blocks
    LengthMismatch,
    /// More data than one block can carry
    TooLong,
    /// Trigger event number out of range
    InvalidTrigger,
    /// Zero length buffer
    Empty,
    /// The channel flagged a transfer or request error
    Transfer,
}

/// A failed transfer request or a transfer that ended in error: the cause,
/// with the channel and buffers handed back
pub type Rejected<D, const CH: u8, BUFFER> = (Error, Channel<D, CH>, BUFFER);

/// Event routing (AOS)
pub struct Aos {
    aos: AOS,
}

impl Aos {
    pub fn new(aos: AOS, _clock: &AosClock<Enabled>) -> Self {
        Aos { aos }
    }

    /// Fires the software event, starting every target that selected
    /// [`EventSource::AOS_SOFTWARE`].
    pub fn software_trigger(&self) {
        self.aos.regs().intsfttrg().write(aos::INTSFTTRG_STRG);
    }

    pub fn free(self) -> AOS {
        self.aos
    }

    pub(crate) fn regs(&self) -> aos::Aos {
        self.aos.regs()
    }
}

/// How an address moves after each data item
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressMode {
    Fixed = 0,
    Increment = 1,
    Decrement = 2,
}

/// Data item size
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Width {
    Bits8 = 0,
    Bits16 = 1,
    Bits32 = 2,
}

/// Words a channel can move
pub trait DmaWord: Copy {
    const WIDTH: Width;
}

impl DmaWord for u8 {
    const WIDTH: Width = Width::Bits8;
}

impl DmaWord for u16 {
    const WIDTH: Width = Width::Bits16;
}

impl DmaWord for u32 {
    const WIDTH: Width = Width::Bits32;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    pub source: AddressMode,
    pub destination: AddressMode,
    pub width: Width,
    /// Items per trigger, 1..=1024
    pub block_size: u16,
    /// Blocks until the channel completes, 0 for no limit
    pub transfer_count: u16,
    /// Reload the source address every `n` items
    pub source_repeat: Option<u16>,
    /// Reload the destination address every `n` items
    pub destination_repeat: Option<u16>,
    /// Unmask the completion interrupts
    pub interrupt: bool,
    pub trigger: EventSource,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            source: AddressMode::Increment,
            destination: AddressMode::Increment,
            width: Width::Bits32,
            block_size: 1,
            transfer_count: 1,
            source_repeat: None,
            destination_repeat: None,
            interrupt: false,
            trigger: EventSource::AOS_SOFTWARE,
        }
    }
}

/// 1..=1024 items, where 1024 is stored as 0
fn encode_size(size: u16) -> Result<u32, Error> {
    match size {
        1..=MAX_BLOCK_SIZE => Ok((size % MAX_BLOCK_SIZE) as u32),
        _ => Err(Error::BlockSize),
    }
}

/// Channel interrupt events
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    TransferComplete,
    BlockComplete,
    TransferError,
    RequestError,
}

impl Event {
    /// (use the error registers, bit for `ch`)
    fn bit(self, ch: u8) -> (bool, u32) {
        match self {
            Event::TransferComplete => (false, 1 << (INTSTAT1_TC_SHIFT + ch)),
            Event::BlockComplete => (false, 1 << (INTSTAT1_BTC_SHIFT + ch)),
            Event::TransferError => (true, 1 << (INTSTAT0_TRNERR_SHIFT + ch)),
            Event::RequestError => (true, 1 << (INTSTAT0_REQERR_SHIFT + ch)),
        }
    }
}

/// A DMA unit
pub trait Instance {
    /// 1 or 2
    const UNIT: u8;
    type Clock;

    fn regs(&self) -> crate::pac::dma::Dma;
    fn trgsel(aos: aos::Aos, ch: u8) -> &'static crate::pac::Reg<u32>;
}

macro_rules! dma {
    ($($DMA:ident: ($unit:expr, $Clock:ident, $trgsel:ident),)+) => {
        $(
            impl Instance for $DMA {
                const UNIT: u8 = $unit;
                type Clock = $Clock<Enabled>;

                fn regs(&self) -> crate::pac::dma::Dma {
                    $DMA::regs(self)
                }

                fn trgsel(aos: aos::Aos, ch: u8) -> &'static crate::pac::Reg<u32> {
                    aos.$trgsel(ch as usize)
                }
            }
        )+
    };
}

dma! {
    DMA1: (1, Dma1Clock, dma1_trgsel),
    DMA2: (2, Dma2Clock, dma2_trgsel),
}

pub struct Dma<D> {
    dma: D,
    aos: aos::Aos,
}

pub struct Channels<D> {
    pub ch0: Channel<D, 0>,
    pub ch1: Channel<D, 1>,
    pub ch2: Channel<D, 2>,
    pub ch3: Channel<D, 3>,
}

impl<D: Instance> Dma<D> {
    /// Enables the unit. Channels are left disabled.
    pub fn new(dma: D, _clock: &D::Clock, aos: &Aos) -> Self {
        let regs = dma.regs();
        regs.chen().write(0);
        regs.intclr0().write(0xFFFF_FFFF);
        regs.intclr1().write(0xFFFF_FFFF);
        regs.intmask0().write(0xFFFF_FFFF);
        regs.intmask1().write(0xFFFF_FFFF);
        regs.en().write(EN_EN);
        debug!("DMA{} enabled", D::UNIT);

        Dma {
            dma,
            aos: aos.regs(),
        }
    }

    pub fn split(self) -> Channels<D> {
        let regs = self.dma.regs();
        let aos = self.aos;
        Channels {
            ch0: Channel::new(regs, aos),
            ch1: Channel::new(regs, aos),
            ch2: Channel::new(regs, aos),
            ch3: Channel::new(regs, aos),
        }
    }

    /// Disables the unit and releases it
    pub fn free(self) -> D {
        self.dma.regs().en().write(0);
        self.dma
    }
}

pub struct Channel<D, const CH: u8> {
    regs: crate::pac::dma::Dma,
    aos: aos::Aos,
    _unit: PhantomData<D>,
}

impl<D: Instance, const CH: u8> fmt::Debug for Channel<D, CH> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DMA{}_CH{}", D::UNIT, CH)
    }
}

impl<D: Instance, const CH: u8> Channel<D, CH> {
    fn new(regs: crate::pac::dma::Dma, aos: aos::Aos) -> Self {
        Channel {
            regs,
            aos,
            _unit: PhantomData,
        }
    }

    /// Applies `config`. The channel must be disabled.
    pub fn configure(&mut self, config: &ChannelConfig) -> Result<(), Error> {
        if config.trigger.0 > EventSource::AOS_SOFTWARE.0 {
            return Err(Error::InvalidTrigger);
        }
        let block = encode_size(config.block_size)?;
        let regs = self.regs;

        let mut chctl = ((config.source as u32) << CHCTL_SINC_SHIFT)
            | ((config.destination as u32) << CHCTL_DINC_SHIFT)
            | ((config.width as u32) << CHCTL_HSIZE_SHIFT);
        let mut rpt = 0;
        if let Some(n) = config.source_repeat {
            chctl |= CHCTL_SRPTEN;
            rpt |= encode_size(n)? << RPT_SRPT_SHIFT;
        }
        if let Some(n) = config.destination_repeat {
            chctl |= CHCTL_DRPTEN;
            rpt |= encode_size(n)? << RPT_DRPT_SHIFT;
        }
        if config.interrupt {
            chctl |= CHCTL_IE;
        }

        regs.chctl(CH).write(chctl);
        regs.rpt(CH).write(rpt);
        regs.dtctl(CH)
            .write(block | ((config.transfer_count as u32) << DTCTL_CNT_SHIFT));
        D::trgsel(self.aos, CH).write(config.trigger.0 as u32 & aos::TRGSEL_MASK);

        if config.interrupt {
            self.listen(Event::TransferComplete);
            self.listen(Event::TransferError);
        } else {
            self.unlisten(Event::TransferComplete);
            self.unlisten(Event::BlockComplete);
            self.unlisten(Event::TransferError);
            self.unlisten(Event::RequestError);
        }
        self.clear_flags();

        trace!("DMA{} ch{} chctl:{=u32:#x} dtctl:{=u32:#x}", D::UNIT, CH, chctl, regs.dtctl(CH).read());
        Ok(())
    }

    /// Sets the source address.
    ///
    /// # Safety
    ///
    /// The channel reads from `address` once enabled.
    pub unsafe fn set_source(&mut self, address: u32) {
        self.regs.sar(CH).write(address);
    }

    /// Sets the destination address.
    ///
    /// # Safety
    ///
    /// The channel writes to `address` once enabled; nothing else may own
    /// that memory for the duration.
    pub unsafe fn set_destination(&mut self, address: u32) {
        self.regs.dar(CH).write(address);
    }

    pub fn enable(&mut self) {
        self.regs.chen().set_bits(1 << CH);
    }

    pub fn disable(&mut self) {
        self.regs.chen().clear_bits(1 << CH);
    }

    pub fn is_enabled(&self) -> bool {
        self.regs.chen().is_set(1 << CH)
    }

    /// Fires the software event through the AOS
    pub fn trigger(&mut self) {
        self.aos.intsfttrg().write(aos::INTSFTTRG_STRG);
    }

    pub fn listen(&mut self, event: Event) {
        match event.bit(CH) {
            (true, bit) => self.regs.intmask0().clear_bits(bit),
            (false, bit) => self.regs.intmask1().clear_bits(bit),
        }
    }

    pub fn unlisten(&mut self, event: Event) {
        match event.bit(CH) {
            (true, bit) => self.regs.intmask0().set_bits(bit),
            (false, bit) => self.regs.intmask1().set_bits(bit),
        }
    }

    pub fn is_pending(&self, event: Event) -> bool {
        match event.bit(CH) {
            (true, bit) => self.regs.intstat0().is_set(bit),
            (false, bit) => self.regs.intstat1().is_set(bit),
        }
    }

    pub fn is_transfer_complete(&self) -> bool {
        self.is_pending(Event::TransferComplete)
    }

    pub fn is_block_complete(&self) -> bool {
        self.is_pending(Event::BlockComplete)
    }

    pub fn has_error(&self) -> bool {
        self.is_pending(Event::TransferError) || self.is_pending(Event::RequestError)
    }

    pub fn clear_flag(&mut self, event: Event) {
        match event.bit(CH) {
            (true, bit) => self.regs.intclr0().write(bit),
            (false, bit) => self.regs.intclr1().write(bit),
        }
    }

    pub fn clear_flags(&mut self) {
        self.clear_flag(Event::TransferComplete);
        self.clear_flag(Event::BlockComplete);
        self.clear_flag(Event::TransferError);
        self.clear_flag(Event::RequestError);
    }

    /// Event number of this channel's transfer complete interrupt
    pub fn transfer_complete_event(&self) -> EventSource {
        EventSource::dma_tc(D::UNIT, CH)
    }

    /// Copies `source` into `destination` in one software triggered block.
    ///
    /// On error the channel and both buffers are handed back untouched.
    pub fn mem_to_mem<W, S, T>(
        mut self,
        source: S,
        mut destination: T,
    ) -> Result<Transfer<D, CH, (S, T)>, Rejected<D, CH, (S, T)>>
    where
        W: DmaWord,
        S: ReadBuffer<Word = W>,
        T: WriteBuffer<Word = W>,
    {
        let (src, src_len) = unsafe { source.read_buffer() };
        let (dst, dst_len) = unsafe { destination.write_buffer() };
        let checked = if src_len != dst_len {
            Err(Error::LengthMismatch)
        } else if src_len == 0 {
            Err(Error::Empty)
        } else if src_len > MAX_BLOCK_SIZE as usize {
            Err(Error::TooLong)
        } else {
            Ok(())
        };
        if let Err(e) = checked {
            return Err((e, self, (source, destination)));
        }

        self.disable();
        let config = ChannelConfig {
            width: W::WIDTH,
            block_size: src_len as u16,
            ..Default::default()
        };
        if let Err(e) = self.configure(&config) {
            return Err((e, self, (source, destination)));
        }
        unsafe {
            self.set_source(src as u32);
            self.set_destination(dst as u32);
        }

        compiler_fence(Ordering::Release);
        self.enable();
        self.trigger();
        Ok(Transfer::new(self, (source, destination)))
    }

    /// Fills `buffer` from a fixed peripheral address, one block per trigger
    /// event. `config` supplies trigger, block size and interrupt choice.
    ///
    /// # Safety
    ///
    /// `address` must be readable for the whole transfer.
    pub unsafe fn read_from<W, B>(
        mut self,
        address: u32,
        mut buffer: B,
        config: ChannelConfig,
    ) -> Result<Transfer<D, CH, B>, Rejected<D, CH, B>>
    where
        W: DmaWord,
        B: WriteBuffer<Word = W>,
    {
        let (dst, len) = buffer.write_buffer();
        let configured = Self::block_count(len, config.block_size).and_then(|count| {
            self.disable();
            self.configure(&ChannelConfig {
                source: AddressMode::Fixed,
                destination: AddressMode::Increment,
                width: W::WIDTH,
                transfer_count: count,
                ..config
            })
        });
        if let Err(e) = configured {
            return Err((e, self, buffer));
        }
        self.set_source(address);
        self.set_destination(dst as u32);

        compiler_fence(Ordering::Release);
        self.enable();
        Ok(Transfer::new(self, buffer))
    }

    /// Drains `buffer` into a fixed peripheral address, one block per
    /// trigger event.
    ///
    /// # Safety
    ///
    /// `address` must be writable for the whole transfer.
    pub unsafe fn write_to<W, B>(
        mut self,
        buffer: B,
        address: u32,
        config: ChannelConfig,
    ) -> Result<Transfer<D, CH, B>, Rejected<D, CH, B>>
    where
        W: DmaWord,
        B: ReadBuffer<Word = W>,
    {
        let (src, len) = buffer.read_buffer();
        let configured = Self::block_count(len, config.block_size).and_then(|count| {
            self.disable();
            self.configure(&ChannelConfig {
                source: AddressMode::Increment,
                destination: AddressMode::Fixed,
                width: W::WIDTH,
                transfer_count: count,
                ..config
            })
        });
        if let Err(e) = configured {
            return Err((e, self, buffer));
        }
        self.set_source(src as u32);
        self.set_destination(address);

        compiler_fence(Ordering::Release);
        self.enable();
        Ok(Transfer::new(self, buffer))
    }

    fn block_count(len: usize, block_size: u16) -> Result<u16, Error> {
        encode_size(block_size)?;
        let block = block_size as usize;
        if len == 0 {
            return Err(Error::Empty);
        }
        if len % block != 0 {
            return Err(Error::LengthMismatch);
        }
        u16::try_from(len / block).map_err(|_| Error::TooLong)
    }
}

/// An ongoing transfer owning its buffers
pub struct Transfer<D: Instance, const CH: u8, BUFFER> {
    channel: Channel<D, CH>,
    buffer: BUFFER,
}

impl<D: Instance, const CH: u8, BUFFER> Transfer<D, CH, BUFFER> {
    fn new(channel: Channel<D, CH>, buffer: BUFFER) -> Self {
        Transfer { channel, buffer }
    }

    pub fn is_done(&self) -> bool {
        self.channel.is_transfer_complete()
    }

    pub fn has_error(&self) -> bool {
        self.channel.has_error()
    }

    /// Blocks until the channel completes, then hands back channel and
    /// buffers. A transfer or request error stops the wait and comes back
    /// as [`Error::Transfer`] with the flags already cleared.
    pub fn wait(mut self) -> Result<(Channel<D, CH>, BUFFER), Rejected<D, CH, BUFFER>> {
        while !self.is_done() && !self.has_error() {}

        compiler_fence(Ordering::Acquire);
        let failed = self.has_error();
        self.channel.disable();
        self.channel.clear_flags();
        compiler_fence(Ordering::Acquire);

        // `Transfer` has a `Drop` implementation, so the fields are moved out
        // with `ptr::read` and `self` is forgotten.
        //
        // NOTE(unsafe) There is no panic branch between reading the fields
        // and forgetting `self`.
        let (channel, buffer) = unsafe {
            let channel = ptr::read(&self.channel);
            let buffer = ptr::read(&self.buffer);
            mem::forget(self);
            (channel, buffer)
        };
        if failed {
            error!("DMA{} ch{} transfer error", D::UNIT, CH);
            Err((Error::Transfer, channel, buffer))
        } else {
            Ok((channel, buffer))
        }
    }
}

impl<D: Instance, const CH: u8, BUFFER> Drop for Transfer<D, CH, BUFFER> {
    fn drop(&mut self) {
        self.channel.disable();
        compiler_fence(Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac::{dma, ram_block};

    fn setup() -> (Channels<DMA1>, dma::Dma, aos::Aos) {
        let regs = unsafe { dma::Dma::from_ptr(ram_block(0x140)) };
        let aos_regs = unsafe { aos::Aos::from_ptr(ram_block(0x40)) };
        let clocks = crate::pwc::test_clocks();
        let aos = Aos::new(AOS::from_block(aos_regs), &clocks.aos.into_enabled_clock());
        let dma = Dma::new(
            DMA1::from_block(regs),
            &clocks.dma1.into_enabled_clock(),
            &aos,
        );
        assert_eq!(regs.en().read(), EN_EN);
        (dma.split(), regs, aos_regs)
    }

    #[test]
    fn configuration_encodes_fields() {
        let (mut channels, regs, aos_regs) = setup();
        channels
            .ch2
            .configure(&ChannelConfig {
                source: AddressMode::Fixed,
                destination: AddressMode::Increment,
                width: Width::Bits16,
                block_size: 1024,
                transfer_count: 3,
                source_repeat: Some(8),
                destination_repeat: None,
                interrupt: true,
                trigger: EventSource::TMR0_1_CMPA,
            })
            .unwrap();

        assert_eq!(
            regs.chctl(2).read(),
            (1 << CHCTL_DINC_SHIFT) | (1 << CHCTL_HSIZE_SHIFT) | CHCTL_SRPTEN | CHCTL_IE
        );
        assert_eq!(regs.dtctl(2).read(), 3 << DTCTL_CNT_SHIFT);
        assert_eq!(regs.rpt(2).read(), 8);
        assert_eq!(aos_regs.dma1_trgsel(2).read(), 64);
        // Completion and transfer error unmasked
        assert_eq!(regs.intmask1().read() & (1 << 2), 0);
        assert_eq!(regs.intmask0().read() & (1 << 2), 0);
        assert_ne!(regs.intmask0().read() & (1 << 18), 0);
    }

    #[test]
    fn sizes_are_checked() {
        let (mut channels, _, _) = setup();
        let config = ChannelConfig {
            block_size: 0,
            ..Default::default()
        };
        assert_eq!(channels.ch0.configure(&config), Err(Error::BlockSize));
        let config = ChannelConfig {
            destination_repeat: Some(1025),
            ..Default::default()
        };
        assert_eq!(channels.ch0.configure(&config), Err(Error::BlockSize));
    }

    #[test]
    fn mem_to_mem_runs_and_returns_buffers() {
        let (channels, regs, aos_regs) = setup();
        let src: &'static [u32] = Box::leak(Box::new([1u32, 2, 3, 4]));
        let dst: &'static mut [u32] = Box::leak(Box::new([0u32; 4]));
        let (src_addr, dst_addr) = (src.as_ptr() as u32, dst.as_ptr() as u32);

        let transfer = channels.ch1.mem_to_mem(src, dst).unwrap();
        assert_eq!(regs.sar(1).read(), src_addr);
        assert_eq!(regs.dar(1).read(), dst_addr);
        assert_eq!(regs.dtctl(1).read(), 4 | (1 << DTCTL_CNT_SHIFT));
        assert_eq!(regs.chen().read(), 1 << 1);
        assert_eq!(aos_regs.dma1_trgsel(1).read(), 0x1FF);
        assert_eq!(aos_regs.intsfttrg().read(), aos::INTSFTTRG_STRG);
        assert!(!transfer.is_done());

        regs.intstat1().write(1 << 1);
        let (ch1, (src, _dst)) = transfer.wait().unwrap();
        assert_eq!(src.len(), 4);
        assert!(!ch1.is_enabled());
    }

    #[test]
    fn rejected_requests_hand_everything_back() {
        let (channels, regs, _) = setup();
        let src: &'static [u8] = Box::leak(Box::new([0u8; 3]));
        let dst: &'static mut [u8] = Box::leak(Box::new([0u8; 4]));
        let (error, ch0, (src, dst)) = channels.ch0.mem_to_mem(src, dst).err().unwrap();
        assert_eq!(error, Error::LengthMismatch);
        assert_eq!((src.len(), dst.len()), (3, 4));

        // The same channel takes the next request
        let dst: &'static mut [u8] = Box::leak(Box::new([0u8; 3]));
        let transfer = ch0.mem_to_mem(src, dst).unwrap();
        assert_eq!(regs.dtctl(0).read(), 3 | (1 << DTCTL_CNT_SHIFT));
        drop(transfer);
    }

    #[test]
    fn empty_copy_never_starts_the_channel() {
        let (channels, regs, aos_regs) = setup();
        let src: &'static [u32] = &[];
        let dst: &'static mut [u32] = Box::leak(Box::new([0u32; 0]));
        let (error, _ch0, _) = channels.ch0.mem_to_mem(src, dst).err().unwrap();
        assert_eq!(error, Error::Empty);
        assert_eq!(regs.chen().read(), 0);
        assert_eq!(regs.dtctl(0).read(), 0);
        assert_eq!(regs.sar(0).read(), 0);
        assert_eq!(aos_regs.intsfttrg().read(), 0);
    }

    #[test]
    fn peripheral_buffer_must_hold_whole_blocks() {
        let (channels, regs, _) = setup();
        let buf: &'static [u16] = Box::leak(Box::new([0u16; 5]));
        let config = ChannelConfig {
            block_size: 2,
            ..Default::default()
        };
        let (error, ch2, buf) =
            unsafe { channels.ch2.write_to(buf, 0x4005_3C08, config) }.err().unwrap();
        assert_eq!(error, Error::LengthMismatch);
        assert_eq!(regs.chen().read(), 0);

        let (error, _, _) = unsafe { ch2.write_to(&buf[..0], 0x4005_3C08, config) }.err().unwrap();
        assert_eq!(error, Error::Empty);
    }

    #[test]
    fn transfer_error_is_reported_by_wait() {
        let (channels, regs, _) = setup();
        let src: &'static [u32] = Box::leak(Box::new([7u32; 2]));
        let dst: &'static mut [u32] = Box::leak(Box::new([0u32; 2]));
        let transfer = channels.ch1.mem_to_mem(src, dst).unwrap();

        regs.intstat0().write(1 << 1);
        assert!(transfer.has_error());
        let (error, ch1, (src, _dst)) = transfer.wait().err().unwrap();
        assert_eq!(error, Error::Transfer);
        assert_eq!(src.len(), 2);
        assert!(!ch1.is_enabled());
    }

    #[test]
    fn dropping_a_transfer_stops_the_channel() {
        let (channels, regs, _) = setup();
        let buf: &'static mut [u16] = Box::leak(Box::new([0u16; 8]));
        let config = ChannelConfig {
            block_size: 2,
            trigger: EventSource::TMR0_2_CMPB,
            ..Default::default()
        };
        let transfer = unsafe { channels.ch3.read_from(0x4002_4404, buf, config) }.unwrap();
        assert_eq!(regs.dtctl(3).read(), 2 | (4 << DTCTL_CNT_SHIFT));
        assert_eq!(regs.chctl(3).read() & CHCTL_SINC_MASK, 0);
        assert_eq!(regs.chen().read(), 1 << 3);
        drop(transfer);
        assert_eq!(regs.chen().read(), 0);
    }
}
