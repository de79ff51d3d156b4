//! Bus transaction state machine.
//!
//! A transaction is opened by a write whose first byte latches the register
//! pointer. Further bytes of the write land at consecutive addresses. A read
//! at the seconds register bursts out the whole date/time block; a read
//! anywhere else returns the single addressed register.

use alloc::vec::Vec;

use crate::register_file::{Intent, RegisterFile};
use crate::registers::RegAddr;

/// Transaction state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransactionState {
    /// No register pointer latched.
    #[default]
    Idle,
    /// A write latched the pointer at this address.
    Addressed(u8),
}

/// Implements write/read/end-transaction against a [`RegisterFile`].
#[derive(Debug, Clone, Default)]
pub struct TransactionController {
    state: TransactionState,
}

impl TransactionController {
    /// Creates an idle controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current transaction state.
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// The latched register pointer, if a transaction is open.
    pub fn pointer(&self) -> Option<u8> {
        match self.state {
            TransactionState::Idle => None,
            TransactionState::Addressed(address) => Some(address),
        }
    }

    /// Latches the pointer from the first byte and writes the remaining bytes
    /// at consecutive addresses, wrapping at 0xFF.
    ///
    /// Returns the last side effect requested by the written registers. An
    /// empty write is ignored.
    pub fn write(&mut self, registers: &mut RegisterFile, bytes: &[u8]) -> Option<Intent> {
        let Some((&first, data)) = bytes.split_first() else {
            warn!("ds3231: write with no data, ignoring");
            return None;
        };

        let mut pointer = first;
        let mut intent = None;
        for &byte in data {
            debug!("ds3231: write {:#x} <- {:#x}", pointer, byte);
            if let Some(requested) = registers.write(pointer, byte) {
                intent = Some(requested);
            }
            pointer = pointer.wrapping_add(1);
        }
        self.state = TransactionState::Addressed(pointer);
        intent
    }

    /// Reads at the latched pointer.
    ///
    /// `count` is accepted for bus compatibility but does not affect the
    /// result: the seconds register yields the seven date/time registers, any
    /// other register yields one byte. Returns nothing if no pointer is
    /// latched. The pointer is not moved.
    pub fn read(&self, registers: &RegisterFile, count: usize) -> Vec<u8> {
        let Some(pointer) = self.pointer() else {
            error!("ds3231: read of {} bytes with no register addressed", count);
            return Vec::new();
        };

        if pointer == RegAddr::Seconds as u8 {
            (0..RegAddr::DATETIME_LEN as u8)
                .map(|address| registers.read(address))
                .collect()
        } else {
            let mut data = Vec::with_capacity(1);
            data.push(registers.read(pointer));
            data
        }
    }

    /// Closes the transaction.
    pub fn end_transaction(&mut self) {
        self.state = TransactionState::Idle;
    }

    /// Returns to idle, as after power-on.
    pub fn reset(&mut self) {
        self.state = TransactionState::Idle;
    }
}
