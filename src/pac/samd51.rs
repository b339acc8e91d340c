//! SAMD51 I2S register block.

use vcell::VolatileCell;

use crate::pins::ClockUnit;
use crate::samd51::I2sRegisters;

/// Memory layout of the SAMD51 I2S block.
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
    /// Transmit serializer control.
    pub txctrl: VolatileCell<u32>,
    /// Receive serializer control.
    pub rxctrl: VolatileCell<u32>,
    _reserved5: [u8; 8],
    /// Transmit sample data.
    pub txdata: VolatileCell<u32>,
    /// Receive sample data.
    pub rxdata: VolatileCell<u32>,
}

// CTRLA bits.
const CTRLA_SWRST: u8 = 1 << 0;
const CTRLA_ENABLE: u8 = 1 << 1;
const CTRLA_CKEN0: u8 = 1 << 2;
const CTRLA_TXEN: u8 = 1 << 4;
const CTRLA_RXEN: u8 = 1 << 5;

// SYNCBUSY bits.
const SYNCBUSY_SWRST: u16 = 1 << 0;
const SYNCBUSY_ENABLE: u16 = 1 << 1;
const SYNCBUSY_CKEN0: u16 = 1 << 2;
const SYNCBUSY_TXEN: u16 = 1 << 4;
const SYNCBUSY_RXEN: u16 = 1 << 5;
const SYNCBUSY_TXDATA: u16 = 1 << 8;
const SYNCBUSY_RXDATA: u16 = 1 << 9;

// INTFLAG bits.
const INTFLAG_RXRDY0: u16 = 1 << 0;
const INTFLAG_TXRDY0: u16 = 1 << 8;
const INTFLAG_TXUR0: u16 = 1 << 10;

/// Memory mapped register access for the SAMD51 I2S block.
pub struct Samd51I2s {
    regs: &'static RegisterBlock,
}

impl Samd51I2s {
    /// Address of the I2S block.
    pub const BASE: usize = 0x4300_2800;

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
        Samd51I2s {
            regs: &*(base as *const RegisterBlock),
        }
    }

    fn modify_ctrla(&mut self, set: u8, clear: u8) {
        let value = self.regs.ctrla.get();
        self.regs.ctrla.set((value & !clear) | set);
    }
}

impl I2sRegisters for Samd51I2s {
    fn is_enabled(&self) -> bool {
        self.regs.ctrla.get() & CTRLA_ENABLE != 0
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

    fn request_reset(&mut self) {
        self.modify_ctrla(CTRLA_SWRST, 0);
    }

    fn reset_busy(&self) -> bool {
        self.regs.syncbusy.get() & SYNCBUSY_SWRST != 0
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

    fn is_tx_enabled(&self) -> bool {
        self.regs.ctrla.get() & CTRLA_TXEN != 0
    }

    fn is_rx_enabled(&self) -> bool {
        self.regs.ctrla.get() & CTRLA_RXEN != 0
    }

    fn set_tx_enable(&mut self, enabled: bool) {
        if enabled {
            self.modify_ctrla(CTRLA_TXEN, 0);
        } else {
            self.modify_ctrla(0, CTRLA_TXEN);
        }
    }

    fn tx_enable_busy(&self) -> bool {
        self.regs.syncbusy.get() & SYNCBUSY_TXEN != 0
    }

    fn set_rx_enable(&mut self, enabled: bool) {
        if enabled {
            self.modify_ctrla(CTRLA_RXEN, 0);
        } else {
            self.modify_ctrla(0, CTRLA_RXEN);
        }
    }

    fn rx_enable_busy(&self) -> bool {
        self.regs.syncbusy.get() & SYNCBUSY_RXEN != 0
    }

    fn write_clock_unit(&mut self, unit: ClockUnit, value: u32) {
        self.regs.clkctrl[unit.index()].set(value);
    }

    fn write_tx_control(&mut self, value: u32) {
        self.regs.txctrl.set(value);
    }

    fn write_rx_control(&mut self, value: u32) {
        self.regs.rxctrl.set(value);
    }

    fn tx_ready(&self) -> bool {
        self.regs.intflag.get() & INTFLAG_TXRDY0 != 0
    }

    fn tx_data_busy(&self) -> bool {
        self.regs.syncbusy.get() & SYNCBUSY_TXDATA != 0
    }

    fn clear_tx_underrun(&mut self) {
        // Write one to clear.
        self.regs.intflag.set(INTFLAG_TXUR0);
    }

    fn rx_ready(&self) -> bool {
        self.regs.intflag.get() & INTFLAG_RXRDY0 != 0
    }

    fn rx_data_busy(&self) -> bool {
        self.regs.syncbusy.get() & SYNCBUSY_RXDATA != 0
    }

    fn write_tx_data(&mut self, value: u32) {
        self.regs.txdata.set(value);
    }

    fn read_rx_data(&mut self) -> u32 {
        self.regs.rxdata.get()
    }
}
