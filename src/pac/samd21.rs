//! SAMD21 I2S register block.

use vcell::VolatileCell;

use crate::pins::{ClockUnit, SerializerUnit};
use crate::samd21::{I2sRegisters, SerMode};

/// Memory layout of the SAMD21 I2S block.
#[repr(C)]
pub struct RegisterBlock {
    /// Control A (8 bit).
    pub ctrla: VolatileCell<u8>,
    _reserved0: [u8; 3],
    /// Clock unit control, one per clock unit.
    pub clkctrl: [VolatileCell<u32>; 2],
    /// Interrupt enable clear.
    pub intenclr: VolatileCell<u16>,
    _reserved1: [u8; 2],
    /// Interrupt enable set.
    pub intenset: VolatileCell<u16>,
    _reserved2: [u8; 2],
    /// Interrupt flag status and clear.
    pub intflag: VolatileCell<u16>,
    _reserved3: [u8; 2],
    /// Synchronization busy.
    pub syncbusy: VolatileCell<u16>,
    _reserved4: [u8; 6],
    /// Serializer control, one per serializer.
    pub serctrl: [VolatileCell<u32>; 2],
    _reserved5: [u8; 8],
    /// Sample data, one register per serializer.
    pub data: [VolatileCell<u32>; 2],
}

// CTRLA bits.
const CTRLA_ENABLE: u8 = 1 << 1;
const CTRLA_CKEN0: u8 = 1 << 2;
const CTRLA_SEREN0: u8 = 1 << 4;
const CTRLA_UNITS: u8 = 0b0011_1100; // CKEN0/1 | SEREN0/1

// SYNCBUSY bits.
const SYNCBUSY_ENABLE: u16 = 1 << 1;
const SYNCBUSY_CKEN0: u16 = 1 << 2;
const SYNCBUSY_SEREN0: u16 = 1 << 4;
const SYNCBUSY_DATA0: u16 = 1 << 8;

// INTFLAG bits.
const INTFLAG_RXRDY0: u16 = 1 << 0;
const INTFLAG_TXRDY0: u16 = 1 << 8;
const INTFLAG_TXUR0: u16 = 1 << 10;

// SERCTRL.SERMODE field, bits 1:0.
const SERCTRL_SERMODE_MASK: u32 = 0b11;
const SERCTRL_SERMODE_RX: u32 = 0;
const SERCTRL_SERMODE_TX: u32 = 1;

/// Memory mapped register access for the SAMD21 I2S block.
pub struct Samd21I2s {
    regs: &'static RegisterBlock,
}

impl Samd21I2s {
    /// Address of the I2S block.
    pub const BASE: usize = 0x4200_5000;

    /// Obtain access to the I2S block at its standard address.
    ///
    /// # Safety
    ///
    /// The caller must be the only owner of the I2S register block for
    /// the lifetime of the returned value; concurrent access to the same
    /// block is undefined behavior.
    pub unsafe fn new() -> Self {
        Self::at(Self::BASE)
    }

    /// Obtain access to an I2S block at an explicit address.
    ///
    /// # Safety
    ///
    /// `base` must point at an I2S register block, and the caller must be
    /// its only owner.
    pub unsafe fn at(base: usize) -> Self {
        Samd21I2s {
            regs: &*(base as *const RegisterBlock),
        }
    }

    fn modify_ctrla(&mut self, set: u8, clear: u8) {
        let value = self.regs.ctrla.get();
        self.regs.ctrla.set((value & !clear) | set);
    }
}

impl I2sRegisters for Samd21I2s {
    fn is_enabled(&self) -> bool {
        self.regs.ctrla.get() & CTRLA_ENABLE != 0
    }

    fn any_unit_enabled(&self) -> bool {
        self.regs.ctrla.get() & CTRLA_UNITS != 0
    }

    fn set_enable(&mut self, enabled: bool) {
        if enabled {
            self.modify_ctrla(CTRLA_ENABLE, 0);
        } else {
            self.modify_ctrla(0, CTRLA_ENABLE);
        }
    }

    fn enable_busy(&self) -> bool {
        self.regs.syncbusy.get() & SYNCBUSY_ENABLE != 0
    }

    fn set_clock_enable(&mut self, unit: ClockUnit, enabled: bool) {
        let bit = CTRLA_CKEN0 << unit.index();
        if enabled {
            self.modify_ctrla(bit, 0);
        } else {
            self.modify_ctrla(0, bit);
        }
    }

    fn clock_enable_busy(&self, unit: ClockUnit) -> bool {
        self.regs.syncbusy.get() & (SYNCBUSY_CKEN0 << unit.index()) != 0
    }

    fn set_serializer_enable(&mut self, unit: SerializerUnit, enabled: bool) {
        let bit = CTRLA_SEREN0 << unit.index();
        if enabled {
            self.modify_ctrla(bit, 0);
        } else {
            self.modify_ctrla(0, bit);
        }
    }

    fn serializer_enable_busy(&self, unit: SerializerUnit) -> bool {
        self.regs.syncbusy.get() & (SYNCBUSY_SEREN0 << unit.index()) != 0
    }

    fn write_clock_unit(&mut self, unit: ClockUnit, value: u32) {
        self.regs.clkctrl[unit.index()].set(value);
    }

    fn write_serializer(&mut self, unit: SerializerUnit, value: u32) {
        self.regs.serctrl[unit.index()].set(value);
    }

    fn set_serializer_mode(&mut self, unit: SerializerUnit, mode: SerMode) {
        let field = match mode {
            SerMode::Receive => SERCTRL_SERMODE_RX,
            SerMode::Transmit => SERCTRL_SERMODE_TX,
        };
        let reg = &self.regs.serctrl[unit.index()];
        reg.set((reg.get() & !SERCTRL_SERMODE_MASK) | field);
    }

    fn tx_ready(&self, unit: SerializerUnit) -> bool {
        self.regs.intflag.get() & (INTFLAG_TXRDY0 << unit.index()) != 0
    }

    fn tx_underrun(&self, unit: SerializerUnit) -> bool {
        self.regs.intflag.get() & (INTFLAG_TXUR0 << unit.index()) != 0
    }

    fn clear_tx_underrun(&mut self, unit: SerializerUnit) {
        // Write one to clear.
        self.regs.intflag.set(INTFLAG_TXUR0 << unit.index());
    }

    fn rx_ready(&self, unit: SerializerUnit) -> bool {
        self.regs.intflag.get() & (INTFLAG_RXRDY0 << unit.index()) != 0
    }

    fn data_busy(&self, unit: SerializerUnit) -> bool {
        self.regs.syncbusy.get() & (SYNCBUSY_DATA0 << unit.index()) != 0
    }

    fn write_data(&mut self, unit: SerializerUnit, value: u32) {
        self.regs.data[unit.index()].set(value);
    }

    fn read_data(&mut self, unit: SerializerUnit) -> u32 {
        self.regs.data[unit.index()].get()
    }
}
