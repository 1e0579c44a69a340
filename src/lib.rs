#![cfg_attr(not(test), no_std)]

//! Driver for the SPI-rack S5i RF source module.
//!
//! The S5i generates 40 MHz to 4.4 GHz with an
//! [ADF4351](https://www.analog.com/en/products/adf4351.html) wideband
//! synthesizer run in integer-N mode. This crate plans the chip's
//! divider set for a requested frequency (RF divider, prescaler,
//! feedback INT, reference R counter, band select clock), packs it into
//! the six 32-bit configuration words and writes them over the rack
//! bus. Planning is validated up front: an impossible request leaves
//! both the register image and the hardware untouched.
//!
//! The bus handle only needs `embedded_hal::blocking::spi::Write<u8>`;
//! module addressing and arbitration between modules sharing the rack
//! controller are the implementor's concern.

pub mod constants;
pub mod device;
pub mod errors;
pub mod frequency;
pub mod register;

pub use device::{ReferenceSource, S5i};
pub use errors::{Error, PlanError};
pub use frequency::FrequencyPlan;
pub use register::{OutputLevel, Prescaler, RegisterSet};
