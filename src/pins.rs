//! Physical pin identities and I2S signal routing.
//!
//! Only a small, fixed set of pins is wired to each I2S signal on a given
//! chip. On the SAMD21 the data pin additionally decides which of the two
//! serializer units (and the bit clock pin, which clock unit) the driver
//! must address for every later register access. The lookup tables here are
//! exhaustive: a pin that is not listed for a role is rejected, never
//! silently tolerated.
//!
//! The mapping from board-level pin labels to port/pin pairs is board
//! support data and out of scope; callers identify pins by port and pin
//! number directly.

use crate::{Error, SignalRole};

/// A GPIO port group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A,
    B,
}

/// A physical pin, identified by port group and pin number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin {
    /// Port group the pin belongs to.
    pub port: Port,
    /// Pin number within the port group.
    pub number: u8,
}

impl Pin {
    /// A pin on port group A.
    pub const fn pa(number: u8) -> Self {
        Pin {
            port: Port::A,
            number,
        }
    }

    /// A pin on port group B.
    pub const fn pb(number: u8) -> Self {
        Pin {
            port: Port::B,
            number,
        }
    }
}

/// Peripheral multiplexer function selection for a pin.
///
/// The letters follow the datasheet naming of the PMUX field. I2S signals
/// sit on function G (SAMD21) or J (SAMD51); the remaining variants exist
/// so that [`PinMux`](crate::PinMux) implementations can be shared with
/// other peripheral drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinFunction {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
}

/// One of the two clock units of the I2S block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockUnit {
    Clk0,
    Clk1,
}

impl ClockUnit {
    /// Index of this unit into the `CLKCTRL` register array.
    pub fn index(self) -> usize {
        match self {
            ClockUnit::Clk0 => 0,
            ClockUnit::Clk1 => 1,
        }
    }
}

/// One of the two serializer units of the SAMD21 I2S block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerializerUnit {
    Ser0,
    Ser1,
}

impl SerializerUnit {
    /// Index of this unit into the `SERCTRL`/`DATA` register arrays.
    pub fn index(self) -> usize {
        match self {
            SerializerUnit::Ser0 => 0,
            SerializerUnit::Ser1 => 1,
        }
    }
}

/// Pin assignment for a driver instance.
///
/// Immutable once the driver is constructed. `data_in` is optional; without
/// it the receive direction is reported as not configured. `mclk` is the
/// dedicated master clock output pin available on some boards; without it
/// `enable_mclk`/`disable_mclk` are no-ops.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pins {
    /// Frame sync (word select) pin.
    pub fs: Pin,
    /// Bit clock pin.
    pub sck: Pin,
    /// Serial data output pin.
    pub data_out: Pin,
    /// Serial data input pin, if wired.
    pub data_in: Option<Pin>,
    /// Master clock output pin, if wired.
    pub mclk: Option<Pin>,
}

impl Pins {
    /// Pin assignment with transmit wiring only.
    pub const fn new(fs: Pin, sck: Pin, data_out: Pin) -> Self {
        Pins {
            fs,
            sck,
            data_out,
            data_in: None,
            mclk: None,
        }
    }

    /// Add a serial data input pin.
    pub const fn with_data_in(mut self, pin: Pin) -> Self {
        self.data_in = Some(pin);
        self
    }

    /// Add a dedicated master clock output pin.
    pub const fn with_mclk(mut self, pin: Pin) -> Self {
        self.mclk = Some(pin);
        self
    }
}

impl Default for Pins {
    /// The most common wiring: FS on PA11, SCK on PA10, data out on PA07.
    fn default() -> Self {
        Pins::new(Pin::pa(11), Pin::pa(10), Pin::pa(7))
    }
}

/// Resolve a bit clock pin to its multiplexer function and clock unit
/// (SAMD21).
///
/// Valid pins: PA10 and PA20 (clock unit 0), PB11 (clock unit 1).
pub fn route_bit_clock(pin: Pin) -> Result<(PinFunction, ClockUnit), Error> {
    match (pin.port, pin.number) {
        (Port::A, 10) => Ok((PinFunction::G, ClockUnit::Clk0)),
        (Port::B, 11) => Ok((PinFunction::G, ClockUnit::Clk1)),
        (Port::A, 20) => Ok((PinFunction::G, ClockUnit::Clk0)),
        _ => {
            error!("bit clock is not on a valid pin");
            Err(Error::InvalidPin(SignalRole::BitClock))
        }
    }
}

/// Resolve a frame sync pin to its multiplexer function (SAMD21).
///
/// Valid pins: PA11 and PA21, both on frame sync unit 0.
pub fn route_frame_sync(pin: Pin) -> Result<PinFunction, Error> {
    match (pin.port, pin.number) {
        (Port::A, 11) => Ok(PinFunction::G),
        (Port::A, 21) => Ok(PinFunction::G),
        _ => {
            error!("frame sync is not on a valid pin");
            Err(Error::InvalidPin(SignalRole::FrameSync))
        }
    }
}

/// Resolve a serial data pin to its multiplexer function and serializer
/// unit (SAMD21).
///
/// Valid pins: PA07 and PA19 (serializer 0), PA08 (serializer 1). The
/// returned unit must be used for every later register access that touches
/// this data line.
pub fn route_data(pin: Pin) -> Result<(PinFunction, SerializerUnit), Error> {
    match (pin.port, pin.number) {
        (Port::A, 7) => Ok((PinFunction::G, SerializerUnit::Ser0)),
        (Port::A, 8) => Ok((PinFunction::G, SerializerUnit::Ser1)),
        (Port::A, 19) => Ok((PinFunction::G, SerializerUnit::Ser0)),
        _ => {
            error!("data is not on a valid pin");
            Err(Error::InvalidPin(SignalRole::Data))
        }
    }
}

/// Multiplexer function of every I2S signal on the SAMD51.
///
/// The newer generation routes all I2S signals through one dedicated
/// function, so there is no per-pin table and no unit resolution.
pub const SAMD51_I2S_FUNCTION: PinFunction = PinFunction::J;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_clock_allowlist() {
        assert_eq!(
            route_bit_clock(Pin::pa(10)).unwrap(),
            (PinFunction::G, ClockUnit::Clk0)
        );
        assert_eq!(
            route_bit_clock(Pin::pb(11)).unwrap(),
            (PinFunction::G, ClockUnit::Clk1)
        );
        assert_eq!(
            route_bit_clock(Pin::pa(20)).unwrap(),
            (PinFunction::G, ClockUnit::Clk0)
        );
    }

    #[test]
    fn frame_sync_allowlist() {
        assert_eq!(route_frame_sync(Pin::pa(11)).unwrap(), PinFunction::G);
        assert_eq!(route_frame_sync(Pin::pa(21)).unwrap(), PinFunction::G);
    }

    #[test]
    fn data_allowlist() {
        assert_eq!(
            route_data(Pin::pa(7)).unwrap(),
            (PinFunction::G, SerializerUnit::Ser0)
        );
        assert_eq!(
            route_data(Pin::pa(8)).unwrap(),
            (PinFunction::G, SerializerUnit::Ser1)
        );
        assert_eq!(
            route_data(Pin::pa(19)).unwrap(),
            (PinFunction::G, SerializerUnit::Ser0)
        );
    }

    #[test]
    fn unlisted_pins_rejected() {
        for number in 0..32 {
            for &port in &[Port::A, Port::B] {
                let pin = Pin { port, number };
                let listed = matches!(
                    (port, number),
                    (Port::A, 10) | (Port::B, 11) | (Port::A, 20)
                );
                assert_eq!(route_bit_clock(pin).is_ok(), listed, "{:?}", pin);
            }
        }
        assert_eq!(
            route_frame_sync(Pin::pb(11)),
            Err(Error::InvalidPin(SignalRole::FrameSync))
        );
        assert_eq!(
            route_data(Pin::pa(10)),
            Err(Error::InvalidPin(SignalRole::Data))
        );
    }

    #[test]
    fn serializer_unit_is_stable() {
        // The unit index is a pure function of the pin identity.
        for _ in 0..4 {
            assert_eq!(route_data(Pin::pa(8)).unwrap().1, SerializerUnit::Ser1);
            assert_eq!(route_data(Pin::pa(7)).unwrap().1, SerializerUnit::Ser0);
        }
    }
}
