//! Driver for the older generation (SAMD21) I2S block.
//!
//! The SAMD21 block has two clock units and two serializer units; which
//! unit serves a driver instance is decided by the physical bit clock and
//! data pins, resolved once in [`I2sDriver::begin`] and kept for the
//! lifetime of the instance because every later register access is indexed
//! by it.
//!
//! `begin()` only configures; the block is started by
//! [`enable_tx`](I2sDriver::enable_tx) or [`enable_rx`](I2sDriver::enable_rx),
//! which flip the shared serializer between transmit and receive mode the
//! way the hardware intends. Every register write that the hardware
//! synchronizes into its clock domain is immediately followed by a wait on
//! the matching sync-busy bit; reordering those pairs produces undefined
//! hardware behavior.

use crate::clocks;
use crate::pins::{self, ClockUnit, Pins, SerializerUnit};
use crate::{block_on, Config, Error, I2sBus, PinMux, SlotSize, SLOTS};

/// Serializer direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerMode {
    Receive,
    Transmit,
}

/// Named bit-field access to the SAMD21 I2S register block.
///
/// [`crate::pac::Samd21I2s`] implements this over the memory mapped block;
/// tests implement it over plain memory.
pub trait I2sRegisters {
    /// CTRLA.ENABLE is set.
    fn is_enabled(&self) -> bool;
    /// Any of CTRLA.CKENx / CTRLA.SERENx is set.
    fn any_unit_enabled(&self) -> bool;
    /// Write CTRLA.ENABLE.
    fn set_enable(&mut self, enabled: bool);
    /// SYNCBUSY.ENABLE.
    fn enable_busy(&self) -> bool;
    /// Write CTRLA.CKENx.
    fn set_clock_enable(&mut self, unit: ClockUnit, enabled: bool);
    /// SYNCBUSY.CKENx.
    fn clock_enable_busy(&self, unit: ClockUnit) -> bool;
    /// Write CTRLA.SERENx.
    fn set_serializer_enable(&mut self, unit: SerializerUnit, enabled: bool);
    /// SYNCBUSY.SERENx.
    fn serializer_enable_busy(&self, unit: SerializerUnit) -> bool;
    /// Write CLKCTRLx as a whole.
    fn write_clock_unit(&mut self, unit: ClockUnit, value: u32);
    /// Write SERCTRLx as a whole.
    fn write_serializer(&mut self, unit: SerializerUnit, value: u32);
    /// Rewrite the SERMODE field of SERCTRLx.
    fn set_serializer_mode(&mut self, unit: SerializerUnit, mode: SerMode);
    /// INTFLAG.TXRDYx.
    fn tx_ready(&self, unit: SerializerUnit) -> bool;
    /// INTFLAG.TXURx.
    fn tx_underrun(&self, unit: SerializerUnit) -> bool;
    /// Clear INTFLAG.TXURx.
    fn clear_tx_underrun(&mut self, unit: SerializerUnit);
    /// INTFLAG.RXRDYx.
    fn rx_ready(&self, unit: SerializerUnit) -> bool;
    /// SYNCBUSY.DATAx.
    fn data_busy(&self, unit: SerializerUnit) -> bool;
    /// Write DATAx.
    fn write_data(&mut self, unit: SerializerUnit, value: u32);
    /// Read DATAx.
    fn read_data(&mut self, unit: SerializerUnit) -> u32;
}

/// External generic clock and power services consumed by the driver.
///
/// The driver only selects generator division values and unit ids; the
/// register level clock bookkeeping lives with the board or HAL layer.
pub trait ClockController {
    /// Core clock frequency the generic clock generator divides down.
    fn core_clock_hz(&self) -> u32;
    /// Unmask the I2S bus (APB) clock.
    fn enable_bus_clock(&mut self);
    /// Route a generic clock generator at `division` to the clock unit.
    fn configure_generator(&mut self, unit: ClockUnit, division: u16);
}

/// Clock and serializer units resolved from the pin assignment.
#[derive(Debug, Clone, Copy)]
struct Binding {
    serializer: SerializerUnit,
    clock: ClockUnit,
}

/// I2S driver for the SAMD21.
///
/// `R` is the register access, `P` the external pin multiplexing service,
/// `C` the generic clock service.
pub struct I2sDriver<R, P, C> {
    regs: R,
    pin_mux: P,
    clocks: C,
    pins: Pins,
    binding: Option<Binding>,
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
            binding: None,
            wait_limit: None,
        }
    }

    /// Release the register block and collaborators.
    pub fn release(self) -> (R, P, C) {
        (self.regs, self.pin_mux, self.clocks)
    }

    /// One-time hardware configuration.
    ///
    /// Resolves the pins, derives the generic clock division and programs
    /// the clock and serializer units. May be called again to reconfigure;
    /// the full register set is rebuilt from the arguments alone.
    ///
    /// Fails without touching any register if the block is already
    /// running, if a pin is not wired to its role, or if the rate is not
    /// reachable from the core clock.
    pub fn begin(&mut self, config: Config) -> Result<(), Error> {
        // Entry check: a running block is never reconfigured underneath
        // its units.
        if self.regs.is_enabled() && self.regs.any_unit_enabled() {
            warn!("i2s block already running");
            return Err(Error::Busy);
        }

        // Resolve everything fallible before the first register write.
        let (sck_function, clock) = pins::route_bit_clock(self.pins.sck)?;
        let fs_function = pins::route_frame_sync(self.pins.fs)?;
        let (data_function, serializer) = pins::route_data(self.pins.data_out)?;
        let division = clocks::gclk_division(
            self.clocks.core_clock_hz(),
            config.sample_rate_hz,
            config.slot_size,
        )?;
        self.binding = None;

        self.pin_mux.set_function(self.pins.sck, sck_function);
        self.pin_mux.set_function(self.pins.fs, fs_function);
        self.pin_mux.set_function(self.pins.data_out, data_function);

        self.clocks.enable_bus_clock();
        self.clocks.configure_generator(clock, division);

        self.regs
            .write_clock_unit(clock, clkctrl(config.slot_size));
        self.regs
            .write_serializer(serializer, serctrl(config.slot_size, clock));

        self.binding = Some(Binding { serializer, clock });
        self.wait_limit = config.wait_limit;
        debug!(
            "i2s configured: {} Hz, gclk division {}",
            config.sample_rate_hz, division
        );
        Ok(())
    }

    fn require_binding(&self) -> Result<Binding, Error> {
        self.binding.ok_or(Error::NotConfigured)
    }

    /// Start the serializer in transmit mode and the clock unit.
    pub fn enable_tx(&mut self) -> Result<(), Error> {
        let binding = self.require_binding()?;
        self.regs
            .set_serializer_mode(binding.serializer, SerMode::Transmit);
        self.enable_units(binding)
    }

    /// Stop the serializer and its clock unit.
    ///
    /// Releases the units so that [`begin`](Self::begin) can reconfigure
    /// the block.
    pub fn disable_tx(&mut self) -> Result<(), Error> {
        let binding = self.require_binding()?;
        self.regs.set_serializer_enable(binding.serializer, false);
        self.wait(|regs| !regs.serializer_enable_busy(binding.serializer))?;
        self.regs.set_clock_enable(binding.clock, false);
        self.wait(|regs| !regs.clock_enable_busy(binding.clock))
    }

    /// Start the serializer in receive mode and the clock unit.
    ///
    /// The SAMD21 serializer is shared between directions: enabling
    /// receive takes it away from transmit.
    pub fn enable_rx(&mut self) -> Result<(), Error> {
        let binding = self.require_binding()?;
        self.regs
            .set_serializer_mode(binding.serializer, SerMode::Receive);
        self.enable_units(binding)
    }

    /// Stop the serializer and its clock unit.
    pub fn disable_rx(&mut self) -> Result<(), Error> {
        self.disable_tx()
    }

    fn enable_units(&mut self, binding: Binding) -> Result<(), Error> {
        self.regs.set_serializer_enable(binding.serializer, true);
        self.wait(|regs| !regs.serializer_enable_busy(binding.serializer))?;
        self.regs.set_clock_enable(binding.clock, true);
        self.wait(|regs| !regs.clock_enable_busy(binding.clock))?;
        self.regs.set_enable(true);
        self.wait(|regs| !regs.enable_busy())
    }

    /// Route the dedicated master clock pin to the block, if one is wired.
    pub fn enable_mclk(&mut self) {
        if let Some(pin) = self.pins.mclk {
            self.pin_mux.set_function(pin, pins::PinFunction::G);
        }
    }

    /// Tri-state the dedicated master clock pin, if one is wired.
    pub fn disable_mclk(&mut self) {
        if let Some(pin) = self.pins.mclk {
            self.pin_mux.set_input(pin);
        }
    }

    /// `true` when the next sample can be written without blocking.
    pub fn tx_ready(&self) -> bool {
        match self.binding {
            Some(b) => self.regs.tx_ready(b.serializer) && !self.regs.data_busy(b.serializer),
            None => false,
        }
    }

    /// `true` when a received sample can be read without blocking.
    pub fn rx_ready(&self) -> bool {
        match self.binding {
            Some(b) => self.regs.rx_ready(b.serializer) && !self.regs.data_busy(b.serializer),
            None => false,
        }
    }

    /// `true` when the serializer ran dry since the flag was last cleared.
    ///
    /// The flag is sticky; clear it with
    /// [`clear_tx_underrun`](Self::clear_tx_underrun).
    pub fn tx_underrun(&self) -> bool {
        match self.binding {
            Some(b) => self.regs.tx_underrun(b.serializer),
            None => false,
        }
    }

    /// Clear the underrun flag.
    pub fn clear_tx_underrun(&mut self) {
        if let Some(b) = self.binding {
            self.regs.clear_tx_underrun(b.serializer);
        }
    }

    /// Write one stereo sample pair, blocking until the hardware drains.
    ///
    /// Left and right are two independent wait-clear-write steps; the
    /// calling thread blocks between them until the serializer is ready
    /// again, which is the only backpressure mechanism in this driver.
    pub fn write(&mut self, left: i32, right: i32) -> Result<(), Error> {
        let serializer = self.require_binding()?.serializer;
        for sample in [left, right] {
            self.wait(|regs| regs.tx_ready(serializer) && !regs.data_busy(serializer))?;
            self.regs.clear_tx_underrun(serializer);
            self.regs.write_data(serializer, sample as u32);
        }
        Ok(())
    }

    /// Read one stereo sample pair, blocking until both slots arrived.
    pub fn read(&mut self) -> Result<(i32, i32), Error> {
        let serializer = self.require_binding()?.serializer;
        self.wait(|regs| regs.rx_ready(serializer) && !regs.data_busy(serializer))?;
        let left = self.regs.read_data(serializer) as i32;
        self.wait(|regs| regs.rx_ready(serializer) && !regs.data_busy(serializer))?;
        let right = self.regs.read_data(serializer) as i32;
        Ok((left, right))
    }

    /// Non-blocking variant of [`write`](Self::write).
    ///
    /// Returns [`nb::Error::WouldBlock`] while the left slot is not free.
    /// Once the pair is started it completes, blocking for the right slot.
    pub fn try_write(&mut self, left: i32, right: i32) -> nb::Result<(), Error> {
        let serializer = self.require_binding().map_err(nb::Error::Other)?.serializer;
        if !(self.regs.tx_ready(serializer) && !self.regs.data_busy(serializer)) {
            return Err(nb::Error::WouldBlock);
        }
        self.regs.clear_tx_underrun(serializer);
        self.regs.write_data(serializer, left as u32);
        self.wait(|regs| regs.tx_ready(serializer) && !regs.data_busy(serializer))
            .map_err(nb::Error::Other)?;
        self.regs.clear_tx_underrun(serializer);
        self.regs.write_data(serializer, right as u32);
        Ok(())
    }

    /// Non-blocking variant of [`read`](Self::read).
    pub fn try_read(&mut self) -> nb::Result<(i32, i32), Error> {
        let serializer = self.require_binding().map_err(nb::Error::Other)?.serializer;
        if !(self.regs.rx_ready(serializer) && !self.regs.data_busy(serializer)) {
            return Err(nb::Error::WouldBlock);
        }
        let left = self.regs.read_data(serializer) as i32;
        self.wait(|regs| regs.rx_ready(serializer) && !regs.data_busy(serializer))
            .map_err(nb::Error::Other)?;
        let right = self.regs.read_data(serializer) as i32;
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

// CLKCTRL fields.
const CLKCTRL_NBSLOTS_POS: u32 = 2;
const CLKCTRL_BITDELAY_I2S: u32 = 1 << 7;

// SERCTRL fields.
const SERCTRL_CLKSEL_POS: u32 = 5;
const SERCTRL_DATASIZE_POS: u32 = 8;
const SERCTRL_MONO_STEREO: u32 = 0;
const SERCTRL_DMA_SINGLE: u32 = 0;

/// SLOTSIZE field encoding, bits 1:0.
fn slot_size_field(slot_size: SlotSize) -> u32 {
    match slot_size {
        SlotSize::Bits8 => 0,
        SlotSize::Bits16 => 1,
        SlotSize::Bits24 => 2,
        SlotSize::Bits32 => 3,
    }
}

/// DATASIZE field encoding, shared by SERCTRL and the newer generation's
/// TXCTRL/RXCTRL.
pub(crate) fn data_size_field(slot_size: SlotSize) -> u32 {
    match slot_size {
        SlotSize::Bits32 => 0,
        SlotSize::Bits24 => 1,
        SlotSize::Bits16 => 4,
        SlotSize::Bits8 => 6,
    }
}

/// Whole-register CLKCTRL value: master clock from the generic clock,
/// serial clock and frame sync derived by division, I2S bit delay, two
/// slots of the given width. The generic clock generator already runs at
/// the serial clock rate, so no divider fields are set here.
fn clkctrl(slot_size: SlotSize) -> u32 {
    ((SLOTS - 1) << CLKCTRL_NBSLOTS_POS) | CLKCTRL_BITDELAY_I2S | slot_size_field(slot_size)
}

/// Whole-register SERCTRL value: stereo, MSB first, zero extended, right
/// adjusted words of the given size, clocked by `clock`. The SERMODE field
/// is left at receive and rewritten by enable_tx/enable_rx.
fn serctrl(slot_size: SlotSize, clock: ClockUnit) -> u32 {
    SERCTRL_DMA_SINGLE
        | SERCTRL_MONO_STEREO
        | (data_size_field(slot_size) << SERCTRL_DATASIZE_POS)
        | ((clock.index() as u32) << SERCTRL_CLKSEL_POS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pins::Pin;
    use std::vec::Vec;

    #[derive(Default)]
    struct MockRegisters {
        enabled: bool,
        clock_enabled: [bool; 2],
        serializer_enabled: [bool; 2],
        serializer_mode: [Option<SerMode>; 2],
        clock_units: [u32; 2],
        serializers: [u32; 2],
        tx_ready: bool,
        rx_ready: bool,
        rx_data: u32,
        // (register name, unit, value)
        writes: Vec<(&'static str, usize, u32)>,
    }

    impl I2sRegisters for MockRegisters {
        fn is_enabled(&self) -> bool {
            self.enabled
        }
        fn any_unit_enabled(&self) -> bool {
            self.clock_enabled.iter().any(|&b| b)
                || self.serializer_enabled.iter().any(|&b| b)
        }
        fn set_enable(&mut self, enabled: bool) {
            self.enabled = enabled;
            self.writes.push(("ENABLE", 0, enabled as u32));
        }
        fn enable_busy(&self) -> bool {
            false
        }
        fn set_clock_enable(&mut self, unit: ClockUnit, enabled: bool) {
            self.clock_enabled[unit.index()] = enabled;
            self.writes.push(("CKEN", unit.index(), enabled as u32));
        }
        fn clock_enable_busy(&self, _unit: ClockUnit) -> bool {
            false
        }
        fn set_serializer_enable(&mut self, unit: SerializerUnit, enabled: bool) {
            self.serializer_enabled[unit.index()] = enabled;
            self.writes.push(("SEREN", unit.index(), enabled as u32));
        }
        fn serializer_enable_busy(&self, _unit: SerializerUnit) -> bool {
            false
        }
        fn write_clock_unit(&mut self, unit: ClockUnit, value: u32) {
            self.clock_units[unit.index()] = value;
            self.writes.push(("CLKCTRL", unit.index(), value));
        }
        fn write_serializer(&mut self, unit: SerializerUnit, value: u32) {
            self.serializers[unit.index()] = value;
            self.writes.push(("SERCTRL", unit.index(), value));
        }
        fn set_serializer_mode(&mut self, unit: SerializerUnit, mode: SerMode) {
            self.serializer_mode[unit.index()] = Some(mode);
            self.writes.push(("SERMODE", unit.index(), mode as u32));
        }
        fn tx_ready(&self, _unit: SerializerUnit) -> bool {
            self.tx_ready
        }
        fn tx_underrun(&self, _unit: SerializerUnit) -> bool {
            false
        }
        fn clear_tx_underrun(&mut self, unit: SerializerUnit) {
            self.writes.push(("TXUR", unit.index(), 1));
        }
        fn rx_ready(&self, _unit: SerializerUnit) -> bool {
            self.rx_ready
        }
        fn data_busy(&self, _unit: SerializerUnit) -> bool {
            false
        }
        fn write_data(&mut self, unit: SerializerUnit, value: u32) {
            self.writes.push(("DATA", unit.index(), value));
        }
        fn read_data(&mut self, unit: SerializerUnit) -> u32 {
            self.writes.push(("DATA_RD", unit.index(), 0));
            self.rx_data
        }
    }

    #[derive(Default)]
    struct MockPinMux {
        calls: Vec<(Pin, &'static str)>,
    }

    impl PinMux for MockPinMux {
        fn set_function(&mut self, pin: Pin, _function: pins::PinFunction) {
            self.calls.push((pin, "function"));
        }
        fn set_input(&mut self, pin: Pin) {
            self.calls.push((pin, "input"));
        }
    }

    #[derive(Default)]
    struct MockClocks {
        configured: Vec<(usize, u16)>,
        bus_clock: bool,
    }

    impl ClockController for MockClocks {
        fn core_clock_hz(&self) -> u32 {
            48_000_000
        }
        fn enable_bus_clock(&mut self) {
            self.bus_clock = true;
        }
        fn configure_generator(&mut self, unit: ClockUnit, division: u16) {
            self.configured.push((unit.index(), division));
        }
    }

    fn driver() -> I2sDriver<MockRegisters, MockPinMux, MockClocks> {
        I2sDriver::new(
            MockRegisters::default(),
            MockPinMux::default(),
            MockClocks::default(),
            Pins::default(),
        )
    }

    #[test]
    fn begin_with_default_pins() {
        let mut i2s = driver();
        i2s.begin(Config::new(SlotSize::Bits16, 44100)).unwrap();
        // Default data out pin PA07 resolves to serializer 0, SCK PA10 to
        // clock unit 0.
        assert_eq!(i2s.clocks.configured, [(0, 34)]);
        assert!(i2s.clocks.bus_clock);
        assert_eq!(i2s.regs.clock_units[0], clkctrl(SlotSize::Bits16));
        assert_eq!(
            i2s.regs.serializers[0],
            serctrl(SlotSize::Bits16, ClockUnit::Clk0)
        );
        assert_eq!(i2s.pin_mux.calls.len(), 3);
    }

    #[test]
    fn begin_rejects_invalid_pin_without_register_writes() {
        let mut i2s = I2sDriver::new(
            MockRegisters::default(),
            MockPinMux::default(),
            MockClocks::default(),
            Pins::new(Pin::pa(11), Pin::pa(10), Pin::pb(0)),
        );
        assert_eq!(
            i2s.begin(Config::new(SlotSize::Bits16, 44100)),
            Err(Error::InvalidPin(crate::SignalRole::Data))
        );
        assert!(i2s.regs.writes.is_empty());
        assert!(i2s.pin_mux.calls.is_empty());
        assert!(i2s.clocks.configured.is_empty());
        // Misuse after a failed begin is a defined error.
        assert_eq!(i2s.enable_tx(), Err(Error::NotConfigured));
        assert_eq!(i2s.write(1, 2), Err(Error::NotConfigured));
    }

    #[test]
    fn begin_rejects_running_block() {
        let mut i2s = driver();
        i2s.regs.enabled = true;
        i2s.regs.serializer_enabled[0] = true;
        i2s.regs.writes.clear();
        assert_eq!(
            i2s.begin(Config::new(SlotSize::Bits16, 44100)),
            Err(Error::Busy)
        );
        assert!(i2s.regs.writes.is_empty());
    }

    #[test]
    fn write_is_two_ordered_steps_with_underrun_clear() {
        let mut i2s = driver();
        i2s.begin(Config::new(SlotSize::Bits16, 44100)).unwrap();
        i2s.regs.tx_ready = true;
        assert!(i2s.tx_ready());
        i2s.regs.writes.clear();
        i2s.write(100, -100).unwrap();
        assert_eq!(
            i2s.regs.writes,
            [
                ("TXUR", 0, 1),
                ("DATA", 0, 100),
                ("TXUR", 0, 1),
                ("DATA", 0, -100i32 as u32),
            ]
        );
    }

    #[test]
    fn read_is_two_ordered_steps() {
        let mut i2s = driver();
        i2s.begin(Config::new(SlotSize::Bits16, 44100)).unwrap();
        i2s.regs.rx_ready = true;
        i2s.regs.rx_data = -5i32 as u32;
        assert_eq!(i2s.read().unwrap(), (-5, -5));
    }

    #[test]
    fn begin_twice_rebuilds_identical_register_set() {
        let mut a = driver();
        a.begin(Config::new(SlotSize::Bits16, 44100)).unwrap();
        let first = a.regs.writes.clone();
        a.begin(Config::new(SlotSize::Bits16, 44100)).unwrap();
        let second = a.regs.writes[first.len()..].to_vec();
        assert_eq!(first, second);
        assert_eq!(a.clocks.configured[0], a.clocks.configured[1]);
    }

    #[test]
    fn enable_tx_sets_mode_then_units() {
        let mut i2s = driver();
        i2s.begin(Config::new(SlotSize::Bits16, 44100)).unwrap();
        i2s.regs.writes.clear();
        i2s.enable_tx().unwrap();
        assert_eq!(i2s.regs.serializer_mode[0], Some(SerMode::Transmit));
        assert_eq!(
            i2s.regs.writes,
            [
                ("SERMODE", 0, SerMode::Transmit as u32),
                ("SEREN", 0, 1),
                ("CKEN", 0, 1),
                ("ENABLE", 0, 1),
            ]
        );
        i2s.enable_rx().unwrap();
        assert_eq!(i2s.regs.serializer_mode[0], Some(SerMode::Receive));
    }

    #[test]
    fn disable_releases_units_for_reconfiguration() {
        let mut i2s = driver();
        i2s.begin(Config::new(SlotSize::Bits16, 44100)).unwrap();
        i2s.enable_tx().unwrap();
        // A running block cannot be reconfigured underneath its units.
        assert_eq!(
            i2s.begin(Config::new(SlotSize::Bits16, 48000)),
            Err(Error::Busy)
        );
        i2s.regs.writes.clear();
        i2s.disable_tx().unwrap();
        assert_eq!(i2s.regs.writes, [("SEREN", 0, 0), ("CKEN", 0, 0)]);
        i2s.begin(Config::new(SlotSize::Bits16, 48000)).unwrap();
        assert_eq!(i2s.clocks.configured, [(0, 34), (0, 31)]);
    }

    #[test]
    fn secondary_units_follow_the_pins() {
        let mut i2s = I2sDriver::new(
            MockRegisters::default(),
            MockPinMux::default(),
            MockClocks::default(),
            Pins::new(Pin::pa(11), Pin::pb(11), Pin::pa(8)),
        );
        i2s.begin(Config::new(SlotSize::Bits32, 48000)).unwrap();
        assert_eq!(i2s.clocks.configured, [(1, 15)]);
        assert_eq!(
            i2s.regs.serializers[1],
            serctrl(SlotSize::Bits32, ClockUnit::Clk1)
        );
    }

    #[test]
    fn bounded_wait_times_out() {
        let mut i2s = driver();
        i2s.begin(Config::new(SlotSize::Bits16, 44100).bounded_wait(16))
            .unwrap();
        // tx never becomes ready; the bounded wait turns the historical
        // infinite spin into an error.
        assert_eq!(i2s.write(1, 2), Err(Error::Timeout));
        assert_eq!(i2s.try_write(1, 2), Err(nb::Error::WouldBlock));
    }

    #[test]
    fn mclk_pin_toggles_through_pin_mux() {
        let mut i2s = I2sDriver::new(
            MockRegisters::default(),
            MockPinMux::default(),
            MockClocks::default(),
            Pins::default().with_mclk(Pin::pa(9)),
        );
        i2s.enable_mclk();
        i2s.disable_mclk();
        assert_eq!(
            i2s.pin_mux.calls,
            [(Pin::pa(9), "function"), (Pin::pa(9), "input")]
        );
        // Without an mclk pin both calls are no-ops.
        let mut bare = driver();
        bare.enable_mclk();
        bare.disable_mclk();
        assert!(bare.pin_mux.calls.is_empty());
    }
}
