//! I2C target adapter for the simulated DS3231.
//!
//! [`SimulatedBus`] implements the `embedded-hal` I2C controller trait on top
//! of the device model, so a driver written against `embedded-hal` can run
//! unchanged against the simulation. Each call to `transaction` is one bus
//! transaction: contiguous write operations form a single device write, each
//! read operation is served from the latched register, and the transaction
//! is ended when the call returns.
//!
//! # Example
//!
//! ```rust
//! use embedded_hal::i2c::I2c;
//! use ds3231_sim::{Config, DS3231, SimulatedBus, RegAddr};
//!
//! let mut bus = SimulatedBus::new(DS3231::new(Config::default()), 0x68);
//!
//! let mut data = [0; 7];
//! bus.write_read(0x68, &[RegAddr::Seconds as u8], &mut data).unwrap();
//! assert_eq!(data, [0x00, 0x00, 0x00, 0x01, 0x01, 0x01, 0x00]);
//! ```

use alloc::vec::Vec;

use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};

use crate::DS3231;

/// Default 7-bit I2C address of the DS3231.
pub const DEFAULT_ADDRESS: u8 = 0x68;

/// Value a read returns for bytes the device does not drive.
pub const IDLE_BYTE: u8 = 0xFF;

/// A simulated I2C bus with a single DS3231 attached.
#[derive(Debug, Clone)]
pub struct SimulatedBus {
    device: DS3231,
    address: u8,
}

impl SimulatedBus {
    /// Attaches `device` at `address`.
    pub fn new(device: DS3231, address: u8) -> Self {
        Self { device, address }
    }

    /// Address the device answers on.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// The attached device.
    pub fn device(&self) -> &DS3231 {
        &self.device
    }

    /// The device, for delivering ticks or resets between transactions.
    pub fn device_mut(&mut self) -> &mut DS3231 {
        &mut self.device
    }

    /// Detaches the device from the bus.
    pub fn into_inner(self) -> DS3231 {
        self.device
    }

    fn run(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        if address != self.address {
            debug!("i2c: no device at {:#x}", address);
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        let mut pending: Vec<u8> = Vec::new();
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => pending.extend_from_slice(bytes),
                Operation::Read(buffer) => {
                    self.flush(&mut pending);
                    let data = self.device.read(buffer.len());
                    trace!("i2c: read {} of {} bytes", data.len(), buffer.len());
                    let mut data = data.into_iter();
                    for byte in buffer.iter_mut() {
                        *byte = data.next().unwrap_or(IDLE_BYTE);
                    }
                }
            }
        }
        self.flush(&mut pending);
        self.device.end_transaction();
        Ok(())
    }

    fn flush(&mut self, pending: &mut Vec<u8>) {
        if !pending.is_empty() {
            self.device.write(pending);
            pending.clear();
        }
    }
}

impl ErrorType for SimulatedBus {
    type Error = ErrorKind;
}

impl embedded_hal::i2c::I2c for SimulatedBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.run(address, operations)
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::i2c::I2c for SimulatedBus {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.run(address, operations)
    }
}
