//! Peripheral access
//!
//! Register blocks are described as thin accessor types holding the block's base
//! pointer. Every register is a method returning a [`Reg`] at a fixed offset, so
//! sparse byte/half-word maps need no padding bookkeeping. Each peripheral
//! instance is represented by an owned token in [`Peripherals`].

use core::sync::atomic::{AtomicBool, Ordering};
use vcell::VolatileCell;

/// A single memory mapped register
#[repr(transparent)]
pub struct Reg<T: Copy> {
    value: VolatileCell<T>,
}

macro_rules! reg_impl {
    ($($T:ty),+) => {
        $(
            impl Reg<$T> {
                /// Volatile read of the whole register
                #[inline(always)]
                pub fn read(&self) -> $T {
                    self.value.get()
                }

                /// Volatile write of the whole register
                #[inline(always)]
                pub fn write(&self, value: $T) {
                    self.value.set(value)
                }

                /// Read-modify-write
                #[inline(always)]
                pub fn modify<F: FnOnce($T) -> $T>(&self, f: F) {
                    self.write(f(self.read()))
                }

                #[inline(always)]
                pub fn set_bits(&self, mask: $T) {
                    self.modify(|v| v | mask)
                }

                #[inline(always)]
                pub fn clear_bits(&self, mask: $T) {
                    self.modify(|v| v & !mask)
                }

                /// Returns `true` when every bit of `mask` is set
                #[inline(always)]
                pub fn is_set(&self, mask: $T) -> bool {
                    self.read() & mask == mask
                }

                #[inline(always)]
                pub fn read_field(&self, mask: $T, shift: u8) -> $T {
                    (self.read() & mask) >> shift
                }

                #[inline(always)]
                pub fn write_field(&self, mask: $T, shift: u8, value: $T) {
                    self.modify(|v| (v & !mask) | ((value << shift) & mask))
                }
            }
        )+
    };
}

reg_impl!(u8, u16, u32);

/// Declares a register block accessor type.
///
/// ```ignore
/// register_block! {
///     /// Doc
///     Crc {
///         cr: u32 = 0x00,
///     }
/// }
/// ```
macro_rules! register_block {
    (
        $(#[$attr:meta])*
        $Block:ident {
            $(
                $(#[$reg_attr:meta])*
                $reg:ident: $T:ty = $offset:expr,
            )*
        }
    ) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq)]
        pub struct $Block {
            ptr: *mut u8,
        }

        unsafe impl Send for $Block {}
        unsafe impl Sync for $Block {}

        #[allow(dead_code)]
        impl $Block {
            /// Creates an accessor for a block starting at `ptr`.
            ///
            /// # Safety
            ///
            /// `ptr` must point at a register block of this layout (or memory
            /// standing in for one) that stays valid for `'static`.
            #[inline(always)]
            pub const unsafe fn from_ptr(ptr: *mut u8) -> Self {
                Self { ptr }
            }

            #[inline(always)]
            pub const fn as_ptr(&self) -> *mut u8 {
                self.ptr
            }

            #[inline(always)]
            fn at<T: Copy>(self, offset: usize) -> &'static $crate::pac::Reg<T> {
                unsafe { &*(self.ptr.wrapping_add(offset) as *const $crate::pac::Reg<T>) }
            }

            $(
                $(#[$reg_attr])*
                #[inline(always)]
                pub fn $reg(self) -> &'static $crate::pac::Reg<$T> {
                    self.at($offset)
                }
            )*
        }
    };
}

pub mod aos;
pub mod cmp;
pub mod crc;
pub mod dma;
pub mod efm;
pub mod i2c;
pub mod intc;
pub mod keyscan;
pub mod port;
pub mod pwc;
pub mod pwr;
pub mod sysreg;
pub mod tmr0;
pub mod tmr4;

static TAKEN: AtomicBool = AtomicBool::new(false);

macro_rules! peripherals {
    (
        $(
            $(#[$attr:meta])*
            $NAME:ident: $Block:ty = $address:expr,
        )+
    ) => {
        $(
            $(#[$attr])*
            #[allow(non_camel_case_types)]
            pub struct $NAME {
                regs: $Block,
            }

            #[allow(dead_code)]
            impl $NAME {
                /// Base address of the register block
                pub const ADDRESS: usize = $address;

                /// Register block accessor
                #[inline(always)]
                pub fn regs(&self) -> $Block {
                    self.regs
                }

                /// Accessor at the fixed hardware address, without ownership.
                #[inline(always)]
                pub(crate) fn regs_unchecked() -> $Block {
                    unsafe { <$Block>::from_ptr(Self::ADDRESS as *mut u8) }
                }

                unsafe fn steal() -> Self {
                    Self { regs: Self::regs_unchecked() }
                }

                /// Token backed by arbitrary memory, for host tests.
                #[cfg(test)]
                pub(crate) fn from_block(regs: $Block) -> Self {
                    Self { regs }
                }
            }
        )+

        /// All peripheral tokens
        #[allow(non_snake_case)]
        pub struct Peripherals {
            $(
                $(#[$attr])*
                pub $NAME: $NAME,
            )+
        }

        impl Peripherals {
            /// Returns all the peripherals *once*
            pub fn take() -> Option<Self> {
                if TAKEN.swap(true, Ordering::AcqRel) {
                    None
                } else {
                    Some(unsafe { Self::steal() })
                }
            }

            /// Unchecked version of `Peripherals::take`
            ///
            /// # Safety
            ///
            /// Each returned token assumes exclusive ownership of its registers.
            pub unsafe fn steal() -> Self {
                Peripherals {
                    $(
                        $NAME: $NAME::steal(),
                    )+
                }
            }
        }
    };
}

peripherals! {
    /// Cyclic redundancy check unit
    CRC: crc::Crc = 0x4000_8C00,
    /// Embedded flash controller
    EFM: efm::Efm = 0x4001_0400,
    /// Automatic operation system (event routing)
    AOS: aos::Aos = 0x4001_0800,
    /// Timer4 unit 1
    TMR4_1: tmr4::Tmr4 = 0x4001_7000,
    /// Timer0 unit 1
    TMR0_1: tmr0::Tmr0 = 0x4002_4000,
    /// Timer0 unit 2
    TMR0_2: tmr0::Tmr0 = 0x4002_4400,
    /// Timer4 unit 2
    TMR4_2: tmr4::Tmr4 = 0x4002_4800,
    /// Timer4 unit 3
    TMR4_3: tmr4::Tmr4 = 0x4002_4C00,
    /// Function clock gates
    PWC: pwc::Pwc = 0x4004_8000,
    /// Analog comparators and reference DACs
    CMP: cmp::Cmp = 0x4004_A000,
    /// Power modes and voltage detection
    PWR: pwr::Pwr = 0x4004_C000,
    /// I2C channel 1
    I2C1: i2c::I2c = 0x4004_E000,
    /// I2C channel 2
    I2C2: i2c::I2c = 0x4004_E400,
    /// I2C channel 3
    I2C3: i2c::I2c = 0x4004_E800,
    /// Key scan controller
    KEYSCAN: keyscan::Keyscan = 0x4005_0C00,
    /// Interrupt controller
    INTC: intc::Intc = 0x4005_1000,
    /// DMA unit 1
    DMA1: dma::Dma = 0x4005_3000,
    /// DMA unit 2
    DMA2: dma::Dma = 0x4005_3400,
    /// GPIO ports
    PORT: port::Port = 0x4005_3800,
    /// Clock controller and system registers
    SYSREG: sysreg::Sysreg = 0x4005_4000,
}

/// Zeroed, leaked memory standing in for a register block of `size` bytes.
#[cfg(test)]
pub(crate) fn ram_block(size: usize) -> *mut u8 {
    let words = vec![0u32; (size + 3) / 4];
    Box::leak(words.into_boxed_slice()).as_mut_ptr() as *mut u8
}

#[cfg(test)]
mod tests {
    use super::*;

    register_block! {
        Sample {
            word: u32 = 0x00,
            half: u16 = 0x04,
            byte: u8 = 0x07,
        }
    }

    fn sample() -> Sample {
        unsafe { Sample::from_ptr(ram_block(8)) }
    }

    #[test]
    fn field_access_masks_and_shifts() {
        let s = sample();
        s.word().write(0xFFFF_0000);
        s.word().write_field(0x0000_0F00, 8, 0x1F);
        assert_eq!(s.word().read(), 0xFFFF_0F00);
        assert_eq!(s.word().read_field(0x0000_0F00, 8), 0xF);
        s.word().clear_bits(0xFF00_0000);
        assert_eq!(s.word().read(), 0x00FF_0F00);
        assert!(s.word().is_set(0x0001_0100));
        assert!(!s.word().is_set(0x0100_0100));
    }

    #[test]
    fn narrow_registers_do_not_touch_neighbours() {
        let s = sample();
        s.half().write(0xBEEF);
        s.byte().write(0x5A);
        assert_eq!(s.word().read(), 0);
        assert_eq!(s.half().read(), 0xBEEF);
        s.byte().set_bits(0x01);
        assert_eq!(s.byte().read(), 0x5B);
    }
}
