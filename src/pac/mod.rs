//! I2S register definitions and memory mapped register access.
//!
//! Hand-written register blocks for the two chip generations, plus the
//! [`Samd21I2s`]/[`Samd51I2s`] adapters implementing the driver-facing
//! register traits over them. HAL crates that already own a generated
//! peripheral access crate can implement the traits over that instead;
//! the drivers only see the trait.

mod samd21;
mod samd51;

pub use self::samd21::{Samd21I2s, RegisterBlock as Samd21RegisterBlock};
pub use self::samd51::{Samd51I2s, RegisterBlock as Samd51RegisterBlock};
