//! Driver for the newer generation (SAMD51) I2S block.
//!
//! The newer block has dedicated transmit and receive serializers, both
//! clocked from clock unit 0, and a two-tier reference clock: the board's
//! fast generator with a fixed 12 MHz fallback for sample rates the fast
//! generator cannot be divided down to. All I2S pins share one multiplexer
//! function, so there is no pin table and no unit resolution here.
//!
//! `begin()` runs the full configuration sequence: disable, software reset
//! with wait-for-sync, reference binding, divider programming, serializer
//! programming, re-enable. As on the older generation, every synchronized
//! register write is immediately followed by a wait on its sync-busy bit.

use crate::clocks::{ClockPlan, ClockSource};
use crate::pins::{ClockUnit, Pins, SAMD51_I2S_FUNCTION};
use crate::samd21::data_size_field;
use crate::{block_on, Config, Error, I2sBus, PinMux, SlotSize, SLOTS};

/// Named bit-field access to the SAMD51 I2S register block.
///
/// [`crate::pac::Samd51I2s`] implements this over the memory mapped block;
/// tests implement it over plain memory.
pub trait I2sRegisters {
    /// CTRLA.ENABLE is set.
    fn is_enabled(&self) -> bool;
    /// Write CTRLA.ENABLE.
    fn set_enable(&mut self, enabled: bool);
    /// SYNCBUSY.ENABLE.
    fn enable_busy(&self) -> bool;
    /// Write CTRLA.SWRST.
    fn request_reset(&mut self);
    /// SYNCBUSY.SWRST.
    fn reset_busy(&self) -> bool;
    /// Write CTRLA.CKEN0/CKEN1.
    fn set_clock_enable(&mut self, unit: ClockUnit, enabled: bool);
    /// SYNCBUSY.CKENx.
    fn clock_enable_busy(&self, unit: ClockUnit) -> bool;
    /// CTRLA.TXEN is set.
    fn is_tx_enabled(&self) -> bool;
    /// CTRLA.RXEN is set.
    fn is_rx_enabled(&self) -> bool;
    /// Write CTRLA.TXEN.
    fn set_tx_enable(&mut self, enabled: bool);
    /// SYNCBUSY.TXEN.
    fn tx_enable_busy(&self) -> bool;
    /// Write CTRLA.RXEN.
    fn set_rx_enable(&mut self, enabled: bool);
    /// SYNCBUSY.RXEN.
    fn rx_enable_busy(&self) -> bool;
    /// Write CLKCTRLx as a whole.
    fn write_clock_unit(&mut self, unit: ClockUnit, value: u32);
    /// Write TXCTRL as a whole.
    fn write_tx_control(&mut self, value: u32);
    /// Write RXCTRL as a whole.
    fn write_rx_control(&mut self, value: u32);
    /// INTFLAG.TXRDY0.
    fn tx_ready(&self) -> bool;
    /// SYNCBUSY.TXDATA.
    fn tx_data_busy(&self) -> bool;
    /// Clear INTFLAG.TXUR0.
    fn clear_tx_underrun(&mut self);
    /// INTFLAG.RXRDY0.
    fn rx_ready(&self) -> bool;
    /// SYNCBUSY.RXDATA.
    fn rx_data_busy(&self) -> bool;
    /// Write TXDATA.
    fn write_tx_data(&mut self, value: u32);
    /// Read RXDATA.
    fn read_rx_data(&mut self) -> u32;
}

/// External clock services consumed by the driver.
///
/// The driver only selects the reference tier; binding the peripheral
/// channels to an actual generator is board or HAL business.
pub trait ClockController {
    /// Frequency of the fast reference generator.
    fn fast_reference_hz(&self) -> u32;
    /// Unmask the I2S bus (APB) clock.
    fn enable_bus_clock(&mut self);
    /// Bind the peripheral clock channel of `unit` to `source`.
    fn connect(&mut self, unit: ClockUnit, source: ClockSource);
}

/// I2S driver for the SAMD51.
///
/// `R` is the register access, `P` the external pin multiplexing service,
/// `C` the clock service.
pub struct I2sDriver<R, P, C> {
    regs: R,
    pin_mux: P,
    clocks: C,
    pins: Pins,
    configured: bool,
    wait_limit: Option<u32>,
}

impl<R, P, C> I2sDriver<R, P, C>
where
    R: I2sRegisters,
    P: PinMux,
    C: ClockController,
{
    /// Wrap the register block and collaborators with a pin assignment.
    ///
    /// Nothing is configured until [`begin`](Self::begin).
    pub fn new(regs: R, pin_mux: P, clocks: C, pins: Pins) -> Self {
        I2sDriver {
            regs,
            pin_mux,
            clocks,
            pins,
            configured: false,
            wait_limit: None,
        }
    }

    /// Release the register block and collaborators.
    pub fn release(self) -> (R, P, C) {
        (self.regs, self.pin_mux, self.clocks)
    }

    /// One-time hardware configuration.
    ///
    /// Derives the clock plan, resets the block and programs clock unit 0
    /// and both serializers, then enables the block. Transmit and receive
    /// still need [`enable_tx`](Self::enable_tx) /
    /// [`enable_rx`](Self::enable_rx).
    ///
    /// May be called again to reconfigure: an idle block is disabled,
    /// reset and rebuilt from the arguments alone. A transfer in flight
    /// (either serializer enabled) fails with [`Error::Busy`] instead;
    /// stop it through [`disable_tx`](Self::disable_tx) /
    /// [`disable_rx`](Self::disable_rx) first.
    ///
    /// Fails without touching any register when busy or when the rate is
    /// not reachable from either reference.
    pub fn begin(&mut self, config: Config) -> Result<(), Error> {
        if self.regs.is_enabled() && (self.regs.is_tx_enabled() || self.regs.is_rx_enabled()) {
            warn!("i2s transfer in flight");
            return Err(Error::Busy);
        }
        self.wait_limit = config.wait_limit;

        // The clock plan is pure; derive it before the first write.
        let plan = ClockPlan::new(
            self.clocks.fast_reference_hz(),
            config.sample_rate_hz,
            config.slot_size,
            config.mclk_multiplier,
        )?;
        self.configured = false;

        self.pin_mux.set_function(self.pins.fs, SAMD51_I2S_FUNCTION);
        self.pin_mux.set_function(self.pins.sck, SAMD51_I2S_FUNCTION);
        self.pin_mux
            .set_function(self.pins.data_out, SAMD51_I2S_FUNCTION);
        if let Some(pin) = self.pins.data_in {
            self.pin_mux.set_function(pin, SAMD51_I2S_FUNCTION);
        }

        self.regs.set_enable(false);
        self.wait(|regs| !regs.enable_busy())?;

        self.clocks.enable_bus_clock();
        self.clocks.connect(ClockUnit::Clk0, plan.source);
        self.clocks.connect(ClockUnit::Clk1, plan.source);

        self.regs.request_reset();
        self.wait(|regs| !regs.reset_busy() && !regs.enable_busy())?;

        // Clock unit 0 drives both serializers.
        self.regs
            .write_clock_unit(ClockUnit::Clk0, clkctrl(config.slot_size, &plan));
        self.regs
            .write_tx_control(txctrl(config.slot_size));
        self.regs
            .write_rx_control(rxctrl(config.slot_size));

        self.wait(|regs| !regs.enable_busy())?;
        self.regs.set_enable(true);

        self.configured = true;
        debug!(
            "i2s configured: {} Hz, mckoutdiv {}, sckdiv {}",
            config.sample_rate_hz, plan.mck_out_div, plan.sck_div
        );
        Ok(())
    }

    fn check_configured(&self) -> Result<(), Error> {
        if self.configured {
            Ok(())
        } else {
            Err(Error::NotConfigured)
        }
    }

    /// Start the clock unit and the transmit serializer.
    pub fn enable_tx(&mut self) -> Result<(), Error> {
        self.check_configured()?;
        self.regs.set_clock_enable(ClockUnit::Clk0, true);
        self.wait(|regs| !regs.clock_enable_busy(ClockUnit::Clk0))?;
        self.regs.set_tx_enable(true);
        self.wait(|regs| !regs.tx_enable_busy())
    }

    /// Stop the transmit serializer.
    pub fn disable_tx(&mut self) -> Result<(), Error> {
        self.check_configured()?;
        self.regs.set_tx_enable(false);
        self.wait(|regs| !regs.tx_enable_busy())
    }

    /// Start the clock unit and the receive serializer.
    ///
    /// Fails with [`Error::NotConfigured`] when no data input pin is
    /// wired.
    pub fn enable_rx(&mut self) -> Result<(), Error> {
        self.check_configured()?;
        if self.pins.data_in.is_none() {
            return Err(Error::NotConfigured);
        }
        self.regs.set_clock_enable(ClockUnit::Clk0, true);
        self.wait(|regs| !regs.clock_enable_busy(ClockUnit::Clk0))?;
        self.regs.set_rx_enable(true);
        self.wait(|regs| !regs.rx_enable_busy())
    }

    /// Stop the receive serializer.
    pub fn disable_rx(&mut self) -> Result<(), Error> {
        self.check_configured()?;
        self.regs.set_rx_enable(false);
        self.wait(|regs| !regs.rx_enable_busy())
    }

    /// Route the dedicated master clock pin to the block, if one is wired.
    pub fn enable_mclk(&mut self) {
        if let Some(pin) = self.pins.mclk {
            self.pin_mux.set_function(pin, SAMD51_I2S_FUNCTION);
        }
    }

    /// Tri-state the dedicated master clock pin, if one is wired.
    pub fn disable_mclk(&mut self) {
        if let Some(pin) = self.pins.mclk {
            self.pin_mux.set_input(pin);
        }
    }

    /// `true` when the next sample can be written without blocking.
    ///
    /// Note the polarity: historical versions of this driver family
    /// returned the inverted value.
    pub fn tx_ready(&self) -> bool {
        self.configured && self.regs.tx_ready() && !self.regs.tx_data_busy()
    }

    /// `true` when a received sample can be read without blocking.
    pub fn rx_ready(&self) -> bool {
        self.configured && self.regs.rx_ready() && !self.regs.rx_data_busy()
    }

    /// Write one stereo sample pair, blocking until the hardware drains.
    ///
    /// Left and right are two independent wait-clear-write steps. A
    /// pending underrun flag is cleared before each data write and not
    /// reported; this generation gives the flag no side channel the older
    /// one has.
    pub fn write(&mut self, left: i32, right: i32) -> Result<(), Error> {
        self.check_configured()?;
        for sample in [left, right] {
            self.wait(|regs| regs.tx_ready() && !regs.tx_data_busy())?;
            self.regs.clear_tx_underrun();
            self.regs.write_tx_data(sample as u32);
        }
        Ok(())
    }

    /// Read one stereo sample pair, blocking until both slots arrived.
    pub fn read(&mut self) -> Result<(i32, i32), Error> {
        self.check_configured()?;
        self.wait(|regs| regs.rx_ready() && !regs.rx_data_busy())?;
        let left = self.regs.read_rx_data() as i32;
        self.wait(|regs| regs.rx_ready() && !regs.rx_data_busy())?;
        let right = self.regs.read_rx_data() as i32;
        Ok((left, right))
    }

    /// Non-blocking variant of [`write`](Self::write).
    ///
    /// Returns [`nb::Error::WouldBlock`] while the left slot is not free.
    /// Once the pair is started it completes, blocking for the right slot.
    pub fn try_write(&mut self, left: i32, right: i32) -> nb::Result<(), Error> {
        self.check_configured().map_err(nb::Error::Other)?;
        if !(self.regs.tx_ready() && !self.regs.tx_data_busy()) {
            return Err(nb::Error::WouldBlock);
        }
        self.regs.clear_tx_underrun();
        self.regs.write_tx_data(left as u32);
        self.wait(|regs| regs.tx_ready() && !regs.tx_data_busy())
            .map_err(nb::Error::Other)?;
        self.regs.clear_tx_underrun();
        self.regs.write_tx_data(right as u32);
        Ok(())
    }

    /// Non-blocking variant of [`read`](Self::read).
    pub fn try_read(&mut self) -> nb::Result<(i32, i32), Error> {
        self.check_configured().map_err(nb::Error::Other)?;
        if !(self.regs.rx_ready() && !self.regs.rx_data_busy()) {
            return Err(nb::Error::WouldBlock);
        }
        let left = self.regs.read_rx_data() as i32;
        self.wait(|regs| regs.rx_ready() && !regs.rx_data_busy())
            .map_err(nb::Error::Other)?;
        let right = self.regs.read_rx_data() as i32;
        Ok((left, right))
    }

    fn wait<F: Fn(&R) -> bool>(&self, ready: F) -> Result<(), Error> {
        let regs = &self.regs;
        block_on(self.wait_limit, || ready(regs))
    }
}

impl<R, P, C> I2sBus for I2sDriver<R, P, C>
where
    R: I2sRegisters,
    P: PinMux,
    C: ClockController,
{
    fn begin(&mut self, config: Config) -> Result<(), Error> {
        I2sDriver::begin(self, config)
    }
    fn enable_tx(&mut self) -> Result<(), Error> {
        I2sDriver::enable_tx(self)
    }
    fn disable_tx(&mut self) -> Result<(), Error> {
        I2sDriver::disable_tx(self)
    }
    fn enable_rx(&mut self) -> Result<(), Error> {
        I2sDriver::enable_rx(self)
    }
    fn disable_rx(&mut self) -> Result<(), Error> {
        I2sDriver::disable_rx(self)
    }
    fn enable_mclk(&mut self) {
        I2sDriver::enable_mclk(self)
    }
    fn disable_mclk(&mut self) {
        I2sDriver::disable_mclk(self)
    }
    fn tx_ready(&self) -> bool {
        I2sDriver::tx_ready(self)
    }
    fn rx_ready(&self) -> bool {
        I2sDriver::rx_ready(self)
    }
    fn write(&mut self, left: i32, right: i32) -> Result<(), Error> {
        I2sDriver::write(self, left, right)
    }
    fn read(&mut self) -> Result<(i32, i32), Error> {
        I2sDriver::read(self)
    }
}

// CLKCTRL fields (the newer generation folds the dividers into the unit
// register instead of the generic clock generator).
const CLKCTRL_NBSLOTS_POS: u32 = 2;
const CLKCTRL_FSWIDTH_HALF: u32 = 1 << 5;
const CLKCTRL_BITDELAY_I2S: u32 = 1 << 7;
const CLKCTRL_MCKEN: u32 = 1 << 15;
const CLKCTRL_MCKDIV_POS: u32 = 16;
const CLKCTRL_MCKOUTDIV_POS: u32 = 24;

// TXCTRL/RXCTRL fields.
const CTRL_DATASIZE_POS: u32 = 8;
const RXCTRL_SERMODE_RX: u32 = 0;
const RXCTRL_CLKSEL_CLK0: u32 = 0;

fn slot_size_field(slot_size: SlotSize) -> u32 {
    match slot_size {
        SlotSize::Bits8 => 0,
        SlotSize::Bits16 => 1,
        SlotSize::Bits24 => 2,
        SlotSize::Bits32 => 3,
    }
}

/// Whole-register CLKCTRL value: master clock enabled and divided out from
/// the selected reference, serial clock and half-width frame sync derived
/// by division, I2S bit delay, two slots of the given width. Divider
/// fields hold the divider minus one.
fn clkctrl(slot_size: SlotSize, plan: &ClockPlan) -> u32 {
    ((SLOTS - 1) << CLKCTRL_NBSLOTS_POS)
        | CLKCTRL_FSWIDTH_HALF
        | CLKCTRL_BITDELAY_I2S
        | CLKCTRL_MCKEN
        | ((plan.sck_div - 1) << CLKCTRL_MCKDIV_POS)
        | ((plan.mck_out_div - 1) << CLKCTRL_MCKOUTDIV_POS)
        | slot_size_field(slot_size)
}

/// Whole-register TXCTRL value: stereo, MSB first, zero extended, right
/// adjusted words of the given size, zero output outside slots.
fn txctrl(slot_size: SlotSize) -> u32 {
    data_size_field(slot_size) << CTRL_DATASIZE_POS
}

/// Whole-register RXCTRL value: receive mode from clock unit 0, otherwise
/// mirroring TXCTRL.
fn rxctrl(slot_size: SlotSize) -> u32 {
    RXCTRL_SERMODE_RX | RXCTRL_CLKSEL_CLK0 | (data_size_field(slot_size) << CTRL_DATASIZE_POS)
}
