//! Interrupt routing
//!
//! Peripheral events are not wired to fixed NVIC lines. Each of the IRQs
//! 0..128 has a select register naming the event source it forwards, and
//! IRQs 128..144 are shared vectors that OR together any enabled sources of
//! a 32-source block.
//!
//! * IRQ 0..32 accept any source.
//! * IRQ 32..128 come in 16 groups of six; group `g` only accepts sources
//!   `32 * g .. 32 * g + 32`.
//! * IRQ `128 + k` serves sources `32 * k .. 32 * k + 32`.
//!
//! Handlers are plain `fn()`s kept in a lock-free table. With the `rt`
//! feature every peripheral vector points at a trampoline that looks the
//! active IRQ up in that table.
//!
//! ```ignore
//! let mut irqs = Interrupts::new(p.INTC);
//! irqs.register(IrqNumber::new(0), EventSource::EIRQ0, on_button)?;
//! interrupt::set_priority(&mut cp.NVIC, IrqNumber::new(0), 3);
//! interrupt::enable(IrqNumber::new(0));
//! ```

use core::sync::atomic::{AtomicUsize, Ordering};

use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::NVIC;

use crate::pac::intc::*;
use crate::pac::INTC;

/// Number of peripheral vectors
pub const IRQ_COUNT: usize = 144;

const SHARED_BASE: u8 = 128;
const GROUPED_BASE: u8 = 32;
const GROUP_IRQS: u8 = 6;
const GROUP_SOURCES: u16 = 32;

/// Interrupt service routine
pub type Handler = fn();

#[allow(clippy::declare_interior_mutable_const)]
const EMPTY: AtomicUsize = AtomicUsize::new(0);
static HANDLERS: [AtomicUsize; IRQ_COUNT] = [EMPTY; IRQ_COUNT];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The IRQ already forwards a different source
    IrqInUse,
    /// The source is outside the block this IRQ can select from
    SourceNotRoutable,
    /// Not a valid event source number
    InvalidSource,
}

/// Peripheral event source number, as written to the INTC select registers
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventSource(pub u16);

impl EventSource {
    pub const EIRQ0: EventSource = EventSource(0);
    pub const EIRQ1: EventSource = EventSource(1);
    pub const EIRQ2: EventSource = EventSource(2);
    pub const EIRQ3: EventSource = EventSource(3);
    pub const EIRQ4: EventSource = EventSource(4);
    pub const EIRQ5: EventSource = EventSource(5);
    pub const EIRQ6: EventSource = EventSource(6);
    pub const EIRQ7: EventSource = EventSource(7);
    pub const EIRQ8: EventSource = EventSource(8);
    pub const EIRQ9: EventSource = EventSource(9);
    pub const EIRQ10: EventSource = EventSource(10);
    pub const EIRQ11: EventSource = EventSource(11);
    pub const EIRQ12: EventSource = EventSource(12);
    pub const EIRQ13: EventSource = EventSource(13);
    pub const EIRQ14: EventSource = EventSource(14);
    pub const EIRQ15: EventSource = EventSource(15);

    pub const DMA1_TC0: EventSource = EventSource(32);
    pub const DMA2_TC0: EventSource = EventSource(36);
    pub const DMA1_BTC0: EventSource = EventSource(40);
    pub const DMA2_BTC0: EventSource = EventSource(44);
    pub const DMA1_ERR: EventSource = EventSource(48);
    pub const DMA2_ERR: EventSource = EventSource(49);
    pub const EFM_PEERR: EventSource = EventSource(50);
    pub const EFM_COLERR: EventSource = EventSource(52);
    pub const EFM_OPTEND: EventSource = EventSource(53);

    pub const TMR0_1_CMPA: EventSource = EventSource(64);
    pub const TMR0_1_CMPB: EventSource = EventSource(65);
    pub const TMR0_2_CMPA: EventSource = EventSource(66);
    pub const TMR0_2_CMPB: EventSource = EventSource(67);

    pub const XTAL_STOP: EventSource = EventSource(84);
    pub const LVD1: EventSource = EventSource(88);
    pub const LVD2: EventSource = EventSource(89);

    pub const TMR4_1_GCMUH: EventSource = EventSource(208);
    pub const TMR4_1_GOVF: EventSource = EventSource(214);
    pub const TMR4_1_GUDF: EventSource = EventSource(215);
    pub const TMR4_1_RLOU: EventSource = EventSource(216);
    pub const TMR4_2_GCMUH: EventSource = EventSource(224);
    pub const TMR4_2_GOVF: EventSource = EventSource(230);
    pub const TMR4_2_GUDF: EventSource = EventSource(231);
    pub const TMR4_2_RLOU: EventSource = EventSource(232);
    pub const TMR4_3_GCMUH: EventSource = EventSource(240);
    pub const TMR4_3_GOVF: EventSource = EventSource(246);
    pub const TMR4_3_GUDF: EventSource = EventSource(247);
    pub const TMR4_3_RLOU: EventSource = EventSource(248);

    pub const ACMP1: EventSource = EventSource(400);
    pub const ACMP2: EventSource = EventSource(401);
    pub const ACMP3: EventSource = EventSource(402);

    pub const I2C1_RXI: EventSource = EventSource(416);
    pub const I2C1_TXI: EventSource = EventSource(417);
    pub const I2C1_TEI: EventSource = EventSource(418);
    pub const I2C1_EEI: EventSource = EventSource(419);
    pub const I2C2_RXI: EventSource = EventSource(420);
    pub const I2C3_RXI: EventSource = EventSource(424);

    /// Software trigger of the AOS. Usable as a DMA trigger, never as an
    /// interrupt source.
    pub const AOS_SOFTWARE: EventSource = EventSource(0x1FF);

    /// External interrupt channel `ch` (0..16)
    pub const fn eirq(ch: u8) -> EventSource {
        EventSource(ch as u16)
    }

    /// DMA transfer complete of `unit` (1, 2) channel `ch`
    pub const fn dma_tc(unit: u8, ch: u8) -> EventSource {
        EventSource(32 + (unit as u16 - 1) * 4 + ch as u16)
    }

    /// DMA block complete of `unit` (1, 2) channel `ch`
    pub const fn dma_btc(unit: u8, ch: u8) -> EventSource {
        EventSource(40 + (unit as u16 - 1) * 4 + ch as u16)
    }

    /// TIMER4 `unit` (1..=3) compare match of output channel `ch`
    /// (UH, UL, VH, VL, WH, WL)
    pub const fn tmr4_compare(unit: u8, ch: u8) -> EventSource {
        EventSource(208 + (unit as u16 - 1) * 16 + ch as u16)
    }

    fn is_valid(self) -> bool {
        self.0 < 0x1FF
    }
}

/// NVIC line of a peripheral vector (0..144)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqNumber(u8);

impl IrqNumber {
    pub const fn new(n: u8) -> Self {
        assert!((n as usize) < IRQ_COUNT, "no such IRQ");
        IrqNumber(n)
    }

    /// Vector number, as used by the NVIC
    pub const fn irqn(self) -> u8 {
        self.0
    }

    fn is_shared(self) -> bool {
        self.0 >= SHARED_BASE
    }

    /// Sources this IRQ's select register accepts
    fn accepts(self, source: EventSource) -> bool {
        if self.0 < GROUPED_BASE {
            true
        } else {
            let group = ((self.0 - GROUPED_BASE) / GROUP_IRQS) as u16;
            source.0 / GROUP_SOURCES == group
        }
    }
}

// SAFETY: every value is a valid vector number below IRQ_COUNT
unsafe impl InterruptNumber for IrqNumber {
    fn number(self) -> u16 {
        self.0 as u16
    }
}

/// Event source to IRQ routing
pub struct Interrupts {
    intc: INTC,
}

impl Interrupts {
    pub fn new(intc: INTC) -> Self {
        Interrupts { intc }
    }

    pub fn free(self) -> INTC {
        self.intc
    }

    pub(crate) fn regs(&self) -> Intc {
        self.intc.regs()
    }

    /// Routes `source` to `irq` and installs `handler` for it.
    ///
    /// Registering the source an IRQ already carries just replaces the
    /// handler.
    pub fn register(
        &mut self,
        irq: IrqNumber,
        source: EventSource,
        handler: Handler,
    ) -> Result<(), Error> {
        if !source.is_valid() {
            return Err(Error::InvalidSource);
        }
        if irq.is_shared() || !irq.accepts(source) {
            return Err(Error::SourceNotRoutable);
        }

        let sel = self.intc.regs().sel(irq.0);
        let current = sel.read() & SEL_MASK;
        if current != SEL_NONE && current != source.0 as u32 {
            return Err(Error::IrqInUse);
        }

        sel.write(source.0 as u32);
        HANDLERS[irq.0 as usize].store(handler as usize, Ordering::Release);
        debug!("irq {} <- source {}", irq.0, source.0);
        Ok(())
    }

    /// Frees `irq` and drops its handler.
    pub fn unregister(&mut self, irq: IrqNumber) {
        if !irq.is_shared() {
            self.intc.regs().sel(irq.0).write(SEL_NONE);
        }
        HANDLERS[irq.0 as usize].store(0, Ordering::Release);
    }

    /// Enables `source` on its shared vector and returns that vector.
    /// All sources on one shared vector run the same handler.
    pub fn register_shared(
        &mut self,
        source: EventSource,
        handler: Handler,
    ) -> Result<IrqNumber, Error> {
        if !source.is_valid() {
            return Err(Error::InvalidSource);
        }
        let irq = IrqNumber(SHARED_BASE + (source.0 / GROUP_SOURCES) as u8);
        self.intc
            .regs()
            .vssel(irq.0)
            .set_bits(1 << (source.0 % GROUP_SOURCES));
        HANDLERS[irq.0 as usize].store(handler as usize, Ordering::Release);
        Ok(irq)
    }

    pub fn unregister_shared(&mut self, source: EventSource) {
        if !source.is_valid() {
            return;
        }
        let irq = SHARED_BASE + (source.0 / GROUP_SOURCES) as u8;
        let vssel = self.intc.regs().vssel(irq);
        vssel.clear_bits(1 << (source.0 % GROUP_SOURCES));
        if vssel.read() == 0 {
            HANDLERS[irq as usize].store(0, Ordering::Release);
        }
    }

    /// Software interrupt `ch` (0..32) on the SWIER register. The channel is
    /// raised as event source `ch` like an external pin would.
    pub fn set_software_interrupt(&mut self, ch: u8, enable: bool) {
        let swier = self.intc.regs().swier();
        if enable {
            swier.set_bits(1 << ch);
        } else {
            swier.clear_bits(1 << ch);
        }
    }

    /// Lets channel `ch` produce events (EVTER) for the AOS.
    pub fn set_event(&mut self, ch: u8, enable: bool) {
        let evter = self.intc.regs().evter();
        if enable {
            evter.set_bits(1 << ch);
        } else {
            evter.clear_bits(1 << ch);
        }
    }

    /// Interrupt output enable of channel `ch` (IER)
    pub fn set_channel_interrupt(&mut self, ch: u8, enable: bool) {
        let ier = self.intc.regs().ier();
        if enable {
            ier.set_bits(1 << ch);
        } else {
            ier.clear_bits(1 << ch);
        }
    }
}

/// Runs the handler registered for `irq`, if any.
pub fn dispatch(irq: IrqNumber) {
    let raw = HANDLERS[irq.0 as usize].load(Ordering::Acquire);
    if raw != 0 {
        // SAFETY: only `Handler` values are ever stored in the table
        let handler: Handler = unsafe { core::mem::transmute::<usize, Handler>(raw) };
        handler();
    }
}

/// Sets the NVIC priority, 0 (highest) to 15. The chip implements the upper
/// four priority bits.
pub fn set_priority(nvic: &mut NVIC, irq: IrqNumber, priority: u8) {
    assert!(priority < 16, "priority is 0..15");
    unsafe { nvic.set_priority(irq, priority << 4) };
}

/// Unmasks `irq` in the NVIC.
pub fn enable(irq: IrqNumber) {
    unsafe { NVIC::unmask(irq) };
}

pub fn disable(irq: IrqNumber) {
    NVIC::mask(irq);
}

pub fn clear_pending(irq: IrqNumber) {
    NVIC::unpend(irq);
}

#[cfg(feature = "rt")]
mod vectors {
    use super::{dispatch, IrqNumber, IRQ_COUNT};
    use cortex_m::peripheral::scb::VectActive;
    use cortex_m::peripheral::SCB;

    unsafe extern "C" fn trampoline() {
        if let VectActive::Interrupt { irqn } = SCB::vect_active() {
            dispatch(IrqNumber(irqn));
        }
    }

    const TRAMPOLINE: unsafe extern "C" fn() = trampoline;

    #[doc(hidden)]
    #[link_section = ".vector_table.interrupts"]
    #[no_mangle]
    pub static __INTERRUPTS: [unsafe extern "C" fn(); IRQ_COUNT] = [TRAMPOLINE; IRQ_COUNT];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pac::{intc, ram_block};
    use core::sync::atomic::AtomicU32;

    fn interrupts() -> Interrupts {
        let regs = unsafe { intc::Intc::from_ptr(ram_block(0x2B0)) };
        for n in 0..128 {
            regs.sel(n).write(SEL_NONE);
        }
        Interrupts::new(INTC::from_block(regs))
    }

    static HITS: AtomicU32 = AtomicU32::new(0);

    fn count() {
        HITS.fetch_add(1, Ordering::SeqCst);
    }

    fn other() {}

    #[test]
    fn any_source_on_low_irqs() {
        let mut irqs = interrupts();
        let irq = IrqNumber::new(5);
        irqs.register(irq, EventSource::ACMP1, count).unwrap();
        assert_eq!(irqs.intc.regs().sel(5).read(), 400);

        // Same source again only swaps the handler
        irqs.register(irq, EventSource::ACMP1, other).unwrap();
        assert_eq!(
            irqs.register(irq, EventSource::EIRQ3, other),
            Err(Error::IrqInUse)
        );

        irqs.unregister(irq);
        assert_eq!(irqs.intc.regs().sel(5).read(), SEL_NONE);
        irqs.register(irq, EventSource::EIRQ3, other).unwrap();
    }

    #[test]
    fn grouped_irqs_only_take_their_block() {
        let mut irqs = interrupts();
        // IRQ 38..44 is group 1: sources 32..64
        let irq = IrqNumber::new(40);
        assert_eq!(
            irqs.register(irq, EventSource::EIRQ0, other),
            Err(Error::SourceNotRoutable)
        );
        assert_eq!(
            irqs.register(irq, EventSource::TMR0_1_CMPA, other),
            Err(Error::SourceNotRoutable)
        );
        irqs.register(irq, EventSource::DMA1_TC0, other).unwrap();
        irqs.register(IrqNumber::new(43), EventSource(63), other)
            .unwrap();
        // IRQ 127 is group 15: sources 480..512
        assert_eq!(
            irqs.register(IrqNumber::new(127), EventSource::I2C3_RXI, other),
            Err(Error::SourceNotRoutable)
        );
    }

    #[test]
    fn software_trigger_is_not_an_interrupt() {
        let mut irqs = interrupts();
        assert_eq!(
            irqs.register(IrqNumber::new(1), EventSource::AOS_SOFTWARE, other),
            Err(Error::InvalidSource)
        );
        assert_eq!(
            irqs.register(IrqNumber::new(130), EventSource(70), other),
            Err(Error::SourceNotRoutable)
        );
    }

    #[test]
    fn dispatch_runs_registered_handler() {
        let mut irqs = interrupts();
        let irq = IrqNumber::new(17);
        irqs.register(irq, EventSource::TMR0_2_CMPB, count).unwrap();
        let before = HITS.load(Ordering::SeqCst);
        dispatch(irq);
        dispatch(irq);
        assert_eq!(HITS.load(Ordering::SeqCst), before + 2);

        irqs.unregister(irq);
        dispatch(irq);
        assert_eq!(HITS.load(Ordering::SeqCst), before + 2);
    }

    #[test]
    fn shared_vectors() {
        let mut irqs = interrupts();
        let irq = irqs.register_shared(EventSource::ACMP2, other).unwrap();
        // 401 / 32 = 12
        assert_eq!(irq, IrqNumber::new(140));
        assert_eq!(irqs.intc.regs().vssel(140).read(), 1 << (401 % 32));
        irqs.unregister_shared(EventSource::ACMP2);
        assert_eq!(irqs.intc.regs().vssel(140).read(), 0);
    }

    #[test]
    fn source_helpers() {
        assert_eq!(EventSource::dma_tc(2, 1), EventSource(37));
        assert_eq!(EventSource::dma_btc(1, 3), EventSource(43));
        assert_eq!(EventSource::tmr4_compare(2, 0), EventSource::TMR4_2_GCMUH);
        assert_eq!(EventSource::eirq(7), EventSource::EIRQ7);
    }

    #[test]
    fn channel_enables() {
        let mut irqs = interrupts();
        irqs.set_software_interrupt(3, true);
        irqs.set_event(2, true);
        irqs.set_channel_interrupt(9, true);
        let regs = irqs.intc.regs();
        assert_eq!(regs.swier().read(), 1 << 3);
        assert_eq!(regs.evter().read(), 1 << 2);
        assert_eq!(regs.ier().read(), 1 << 9);
        irqs.set_software_interrupt(3, false);
        assert_eq!(regs.swier().read(), 0);
    }
}
