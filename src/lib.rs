//! This library supports I2S audio communication on SAMD21 and SAMD51
//! microcontrollers.
//!
//! The two chip generations carry different I2S hardware with different
//! register layouts, so there is one concrete driver per generation,
//! [`samd21::I2sDriver`] and [`samd51::I2sDriver`], sharing the small
//! [`I2sBus`] trait for code that wants to stay generic over the chip.
//!
//! # For HAL and board crate implementers
//!
//! The drivers are built around three injected collaborators: a register
//! access implementation ([`samd21::I2sRegisters`] /
//! [`samd51::I2sRegisters`], with ready-made memory mapped versions in
//! [`pac`]), the external pin multiplexing service ([`PinMux`]) and the
//! generation's clock service ([`samd21::ClockController`] /
//! [`samd51::ClockController`]). HAL crates implement the collaborator
//! traits and hand them to [`I2sDriver::new`](samd21::I2sDriver::new).
//!
//! # Usage
//!
//! ```ignore
//! let pins = Pins::new(Pin::pa(11), Pin::pa(10), Pin::pa(7));
//! let mut i2s = samd21::I2sDriver::new(regs, port, gclk, pins);
//! i2s.begin(Config::new(SlotSize::Bits16, 44100))?;
//! i2s.enable_tx()?;
//! loop {
//!     let (left, right) = next_samples();
//!     i2s.write(left, right)?; // blocks until the hardware drains
//! }
//! ```
//!
//! # Blocking model
//!
//! Every wait is a tight spin on a memory mapped status bit with no
//! timeout, no yield and no cancellation: a hardware fault that never sets
//! a ready bit hangs the calling thread. This mirrors the no-OS targets
//! the driver is written for. [`Config::bounded_wait`] caps each spin and
//! returns [`Error::Timeout`] instead; that is a deviation from the
//! historical behavior, off by default.
//!
//! One driver instance owns one physical I2S block; concurrent instances
//! over the same block are undefined behavior.
#![no_std]

#[cfg(test)]
extern crate std;

mod fmt;

pub mod clocks;
pub mod pac;
pub mod pins;
pub mod samd21;
pub mod samd51;

pub use crate::pins::{Pin, PinFunction, Pins, Port};

/// Number of slots per frame. Stereo, left then right; not configurable.
pub const SLOTS: u32 = 2;

/// Width of one sample slot on the wire.
///
/// Fixed per [`Config`]; changing it requires a full reconfiguration
/// through `begin()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotSize {
    Bits8,
    Bits16,
    Bits24,
    Bits32,
}

impl SlotSize {
    /// Slot width in bits.
    pub fn bits(self) -> u32 {
        match self {
            SlotSize::Bits8 => 8,
            SlotSize::Bits16 => 16,
            SlotSize::Bits24 => 24,
            SlotSize::Bits32 => 32,
        }
    }
}

/// Signal roles a pin can be resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SignalRole {
    FrameSync,
    BitClock,
    Data,
}

/// Errors reported by the drivers.
///
/// Nothing here is fatal; the caller decides whether to retry. The
/// drivers never roll back partial state because they never create any:
/// every failure path returns before the first register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The pin is not wired to the requested I2S signal on this chip.
    InvalidPin(SignalRole),
    /// The block is already enabled and running.
    Busy,
    /// The operation needs a successful `begin()` first, or the direction
    /// has no pin wired.
    NotConfigured,
    /// No divider setting reaches the requested rate from the available
    /// references.
    UnreachableRate,
    /// A bounded wait expired. Only with [`Config::bounded_wait`].
    Timeout,
}

/// Driver configuration, consumed by `begin()`.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Slot width on the wire.
    pub slot_size: SlotSize,
    /// Requested sample rate in Hz.
    pub sample_rate_hz: u32,
    /// Master clock frequency as a multiple of the sample rate.
    pub mclk_multiplier: u32,
    pub(crate) wait_limit: Option<u32>,
}

impl Config {
    /// Configuration with the conventional 256x master clock multiplier.
    pub const fn new(slot_size: SlotSize, sample_rate_hz: u32) -> Self {
        Config {
            slot_size,
            sample_rate_hz,
            mclk_multiplier: 256,
            wait_limit: None,
        }
    }

    /// Override the master clock multiplier.
    ///
    /// Pick a multiple of the frame tick count (two slots of
    /// [`slot_size`](Self::slot_size) bits) or the effective rate drifts;
    /// see [`clocks::ClockPlan::new`].
    pub const fn mclk_multiplier(mut self, multiplier: u32) -> Self {
        self.mclk_multiplier = multiplier;
        self
    }

    /// Cap every status poll at `spins` iterations, turning a hung wait
    /// into [`Error::Timeout`].
    ///
    /// Deviation from the historical unbounded spin; off by default.
    pub const fn bounded_wait(mut self, spins: u32) -> Self {
        self.wait_limit = Some(spins);
        self
    }
}

/// External pin multiplexing service.
///
/// Implemented by the board or HAL layer over its port controller.
pub trait PinMux {
    /// Route `pin` to the peripheral `function`.
    fn set_function(&mut self, pin: Pin, function: PinFunction);
    /// Detach `pin` from any peripheral and leave it a plain input
    /// (tri-stated). Used for the master clock pin on `disable_mclk`.
    fn set_input(&mut self, pin: Pin);
}

/// Common surface of the two generation drivers.
///
/// `write` and `read` move exactly one stereo sample pair and block until
/// the hardware is ready for each half; sustained throughput is entirely
/// the caller's responsibility.
pub trait I2sBus {
    /// One-time hardware configuration. May be repeated to reconfigure.
    fn begin(&mut self, config: Config) -> Result<(), Error>;
    /// Start transmitting.
    fn enable_tx(&mut self) -> Result<(), Error>;
    /// Stop transmitting.
    fn disable_tx(&mut self) -> Result<(), Error>;
    /// Start receiving.
    fn enable_rx(&mut self) -> Result<(), Error>;
    /// Stop receiving.
    fn disable_rx(&mut self) -> Result<(), Error>;
    /// Route the dedicated master clock output pin, if wired.
    fn enable_mclk(&mut self);
    /// Tri-state the dedicated master clock output pin, if wired.
    fn disable_mclk(&mut self);
    /// `true` when `write` would not block for its first slot.
    fn tx_ready(&self) -> bool;
    /// `true` when `read` would not block for its first slot.
    fn rx_ready(&self) -> bool;
    /// Blocking write of one stereo pair, left then right.
    fn write(&mut self, left: i32, right: i32) -> Result<(), Error>;
    /// Blocking read of one stereo pair, left then right.
    fn read(&mut self) -> Result<(i32, i32), Error>;
}

/// Spin until `ready`, optionally bounded.
///
/// A register write followed by `block_on` of the matching sync-busy bit
/// forms one atomic configuration step; callers never reorder or merge
/// these pairs.
pub(crate) fn block_on<F: FnMut() -> bool>(limit: Option<u32>, mut ready: F) -> Result<(), Error> {
    match limit {
        None => {
            while !ready() {}
            Ok(())
        }
        Some(limit) => {
            for _ in 0..limit {
                if ready() {
                    return Ok(());
                }
            }
            Err(Error::Timeout)
        }
    }
}
