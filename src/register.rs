//! ADF4351 configuration registers, reduced to the fields the S5i
//! uses in integer-N operation.
//!
//! Every word carries its register number in the three control bits
//! (DB2:DB0); field updates merge into the stored word by clearing the
//! field's bit range and OR-ing the new value in, so configuration set
//! once at power-up survives every later frequency change.

use core::marker::PhantomData;

/// Register number marker types
macro_rules! gen_register_marker {
    ($r:ident, $n:tt) => {
        /// Register $r marker
        #[derive(Debug, Copy, Clone)]
        pub struct $r {}

        impl Default for Reg<$r> {
            #[inline]
            fn default() -> Self {
                // control bits select the destination latch
                Reg { w: $n, phantom: PhantomData }
            }
        }
    };
}

gen_register_marker!(R0, 0);
gen_register_marker!(R1, 1);
gen_register_marker!(R2, 2);
gen_register_marker!(R3, 3);
gen_register_marker!(R4, 4);
gen_register_marker!(R5, 5);

/// Single config register
#[derive(Debug, Copy, Clone)]
pub struct Reg<R> {
    /// Config register word
    pub w: u32,
    phantom: PhantomData<R>,
}

/// Bit operations on 32bit words
impl<R> Reg<R> {
    #[inline]
    pub fn get<F>(&self) -> F
    where
        F: Sized + BitField<R> + From<u32>,
    {
        F::from((self.w >> F::offset()) & F::mask())
    }

    #[inline]
    pub fn set<F>(mut self, f: F) -> Self
    where
        F: Sized + BitField<R> + Into<u32>,
    {
        let fbits = (f.into() & F::mask()) << F::offset();
        let rbits = self.w & !(F::mask() << F::offset());
        self.w = rbits | fbits;
        self
    }
}

/// Full set of config registers.
///
/// After power-up the ADF4351 needs six writes, one each to R5 down
/// to R0, before the output becomes active.
#[derive(Debug, Copy, Clone, Default)]
pub struct RegisterSet {
    pub r0: Reg<R0>,
    pub r1: Reg<R1>,
    pub r2: Reg<R2>,
    pub r3: Reg<R3>,
    pub r4: Reg<R4>,
    pub r5: Reg<R5>,
}

/// Type-indexed register access
pub trait RIdx<R> {
    fn r(self) -> Reg<R>;
    fn update_r<F>(self, f: F) -> Self
    where
        F: FnOnce(Reg<R>) -> Reg<R>;
}

macro_rules! gen_register_index {
    ($r:ident, $f:tt) => {
        impl RIdx<$r> for RegisterSet {
            #[inline]
            fn r(self) -> Reg<$r> {
                self.$f
            }
            #[inline]
            fn update_r<F>(mut self, f: F) -> Self
            where
                F: FnOnce(Reg<$r>) -> Reg<$r>,
            {
                self.$f = f(self.$f);
                self
            }
        }
    };
}

gen_register_index!(R0, r0);
gen_register_index!(R1, r1);
gen_register_index!(R2, r2);
gen_register_index!(R3, r3);
gen_register_index!(R4, r4);
gen_register_index!(R5, r5);

impl RegisterSet {
    /// Register values in device format, index 0 to 5.
    #[inline]
    pub fn to_words(&self) -> [u32; 6] {
        [
            self.r0.w, self.r1.w, self.r2.w, self.r3.w, self.r4.w, self.r5.w,
        ]
    }

    /// Get register bitfield value
    #[inline]
    pub fn get<F, R>(&self) -> F
    where
        F: Sized + BitField<R> + From<u32>,
        Self: RIdx<R>,
    {
        F::from((self.r().w >> F::offset()) & F::mask())
    }

    /// Update register bitfield
    #[inline]
    pub fn set<F, R>(self, f: F) -> Self
    where
        F: Sized + BitField<R> + Into<u32>,
        Self: RIdx<R>,
    {
        self.update_r(|r| r.set(f))
    }

    /// Static configuration of the S5i, written once at device creation
    /// and untouched by frequency updates: integer-N lock detect with
    /// the 3 ns antibacklash pulse and charge cancelation, digital lock
    /// detect on the LD pin, maximum charge pump current, and the
    /// phase/modulus words the chip wants in integer-N mode.
    pub fn power_up_defaults() -> Self {
        RegisterSet::default()
            .set(Phase(1))
            .set(Mod(2))
            .set(DoubleBuffer::Enabled)
            .set(ChargePumpCurrent(0b111))
            .set(Ldf::IntN)
            .set(Ldp::Ldp6ns)
            .set(PhaseDetectorPolarity::Positive)
            .set(AntiBacklashPulseWidth::AB3ns)
            .set(ChargeCancellation::Enabled)
            .set(OutputLevel::Plus5dBm)
            .set(LockDetectPin::DigitalLockDetect)
            .set(ReservedBits(0b11))
    }
}

/// Bit operations on 32bit words
pub trait BitField<R> {
    /// Number of bits in the bit field
    fn num_bits() -> u8;

    /// Offset from 0
    fn offset() -> u8;

    #[inline]
    fn mask() -> u32 {
        !(0xFFFF_FFFFu32 << Self::num_bits())
    }
}

/// Generate BitField implementation
macro_rules! gen_bitfield_impl {
    ($r:ty, $n:ident, $nb:tt, $off:tt) => {
        impl BitField<$r> for $n {
            #[inline]
            fn num_bits() -> u8 {
                $nb
            }
            #[inline]
            fn offset() -> u8 {
                $off
            }
        }
    };
}

/// Small bitfield-encoded numbers boilerplate
macro_rules! gen_bitfield_struct {
    ($(#[$meta:meta])*, $r:ty, $n:ident, $v:ty, $nb:tt, $off:tt) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub struct $n(pub $v);

        gen_bitfield_impl!($r, $n, $nb, $off);

        impl From<u32> for $n {
            #[inline]
            fn from(x: u32) -> Self {
                $n(x as $v)
            }
        }
        impl From<$n> for u32 {
            #[inline]
            fn from(x: $n) -> u32 {
                x.0 as u32
            }
        }
    };
}

/// Write-only enum bitfields: the variant maps to the field value
macro_rules! gen_bitfield_enum {
    ($r:ty, $n:ident, $nb:tt, $off:tt) => {
        gen_bitfield_impl!($r, $n, $nb, $off);

        impl From<$n> for u32 {
            #[inline]
            fn from(x: $n) -> u32 {
                x as u32
            }
        }
    };
}

gen_bitfield_struct!(
    /// 16-bit INT value, Bits[DB30:DB15]: the integer feedback
    /// division factor. Values from 23 to 65535 are allowed with the
    /// 4/5 prescaler; the 8/9 prescaler raises the minimum to 75.
    , R0, Int, u16, 16, 15
);

/// Dual-modulus prescaler ahead of the feedback counter, Bit DB27.
/// The 4/5 core only works up to 3.6 GHz; above that the 8/9 setting
/// is required.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prescaler {
    /// Prescaler 4/5, minimum INT 23
    P45,
    /// Prescaler 8/9, minimum INT 75
    P89,
}
gen_bitfield_enum!(R1, Prescaler, 1, 27);

impl Prescaler {
    /// Smallest INT value the feedback counter supports in this mode
    #[inline]
    pub fn min_int(self) -> u16 {
        match self {
            Prescaler::P45 => crate::constants::INT_MIN_P45,
            Prescaler::P89 => crate::constants::INT_MIN_P89,
        }
    }
}

gen_bitfield_struct!(
    /// 12-bit phase word, Bits[DB26:DB15]. Must stay below MOD; the
    /// recommended value of 1 is kept for all integer-N use.
    , R1, Phase, u16, 12, 15
);

gen_bitfield_struct!(
    /// 12-bit fractional modulus, Bits[DB14:DB3]. Unused in integer-N
    /// mode but must hold a legal value (2 to 4095).
    , R1, Mod, u16, 12, 3
);

gen_bitfield_struct!(
    /// 10-bit R counter, Bits[DB23:DB14]: divides the reference down
    /// to the PFD clock. Division ratios from 1 to 1023.
    , R2, R, u16, 10, 14
);

/// Double buffering of the R4 divider select, Bit DB13
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DoubleBuffer {
    Disabled,
    Enabled,
}
gen_bitfield_enum!(R2, DoubleBuffer, 1, 13);

gen_bitfield_struct!(
    /// Charge pump current setting, Bits[DB12:DB9]; must match the
    /// loop filter design.
    , R2, ChargePumpCurrent, u8, 4, 9
);

/// Lock detect function, Bit DB8: number of PFD cycles monitored
/// before lock is declared (40 for fractional-N, 5 for integer-N)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ldf {
    FracN,
    IntN,
}
gen_bitfield_enum!(R2, Ldf, 1, 8);

/// Lock detect precision, Bit DB7: 10 ns or 6 ns comparison window
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ldp {
    Ldp10ns,
    Ldp6ns,
}
gen_bitfield_enum!(R2, Ldp, 1, 7);

/// Phase detector polarity, Bit DB6. Positive for a passive or
/// noninverting active loop filter.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhaseDetectorPolarity {
    Negative,
    Positive,
}
gen_bitfield_enum!(R2, PhaseDetectorPolarity, 1, 6);

/// PFD antibacklash pulse width, Bit DB22: 6 ns for fractional-N,
/// 3 ns for integer-N
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AntiBacklashPulseWidth {
    AB6ns,
    AB3ns,
}
gen_bitfield_enum!(R3, AntiBacklashPulseWidth, 1, 22);

/// Charge pump charge cancelation, Bit DB21: reduces PFD spurs in
/// integer-N mode
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChargeCancellation {
    Disabled,
    Enabled,
}
gen_bitfield_enum!(R3, ChargeCancellation, 1, 21);

gen_bitfield_struct!(
    /// RF divider select, Bits[DB22:DB20]: exponent of the output
    /// divide-by-2^n stage that brings the VCO down to the requested
    /// output frequency.
    , R4, RfDividerSelect, u8, 3, 20
);

gen_bitfield_struct!(
    /// Band select clock divider, Bits[DB19:DB12]. The R counter
    /// output clocks the VCO band select logic; if that rate is too
    /// high this divider brings it back under the limit.
    , R4, BandSelectClockDiv, u8, 8, 12
);

/// Primary RF output enable, Bit DB5
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RfOutputEnable {
    Disabled,
    Enabled,
}
gen_bitfield_enum!(R4, RfOutputEnable, 1, 5);

/// Primary RF output power, Bits[DB4:DB3], -4 dBm to +5 dBm in
/// 3 dB steps
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputLevel {
    Minus4dBm,
    Minus1dBm,
    Plus2dBm,
    Plus5dBm,
}
gen_bitfield_enum!(R4, OutputLevel, 2, 3);

/// Lock detect pin operation, Bits[DB23:DB22]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LockDetectPin {
    Low,
    DigitalLockDetect,
    Low1,
    High,
}
gen_bitfield_enum!(R5, LockDetectPin, 2, 22);

gen_bitfield_struct!(
    /// Bits[DB20:DB19] are reserved and must be written as 0b11.
    , R5, ReservedBits, u8, 2, 19
);
