//! A register-accurate model of the DS3231 real-time clock for hardware
//! simulators.
//!
//! The model answers bus transactions the way the chip does: the first byte
//! of a write latches the register pointer, following bytes auto-increment,
//! and a read at the seconds register bursts out the packed-BCD date/time
//! block. Time advances once per simulated second while the oscillator
//! (Control register EOSC bit) is enabled.
//!
//! # Features
//!
//! - Transaction state machine with auto-increment
//! - Register file with BCD timekeeping, control and status registers
//! - Calendar with Gregorian carries and century rollover
//! - Tick source with configurable crystal frequency and prescalers
//! - `embedded-hal` I2C target adapter ([`bus::SimulatedBus`]) so drivers can
//!   talk to the model directly
//! - Optional `log` or `defmt` diagnostics
//! - Optional `embedded-hal-async` support (`async` feature)
//!
//! # Usage
//!
//! ```rust
//! use ds3231_sim::{Config, DS3231, RegAddr};
//!
//! let mut rtc = DS3231::new(Config::default());
//!
//! // Set 2023-06-15 10:41:59
//! rtc.write(&[RegAddr::Seconds as u8, 0x59, 0x41, 0x10, 0x05, 0x15, 0x06, 0x23]);
//! rtc.end_transaction();
//!
//! // The host scheduler fires once per simulated second
//! rtc.on_tick();
//!
//! rtc.write(&[RegAddr::Seconds as u8]);
//! let time = rtc.read(7);
//! rtc.end_transaction();
//! assert_eq!(time, [0x00, 0x42, 0x10, 0x05, 0x15, 0x06, 0x23]);
//! ```
//!
//! # Concurrency
//!
//! Bus operations and tick delivery both take `&mut self`. A host that drives
//! them from different threads serializes them behind one lock around the
//! device.

#![no_std]

extern crate alloc;

#[macro_use]
mod fmt;

pub mod bcd;
pub mod bus;
pub mod calendar;
pub mod register_file;
pub mod registers;
pub mod tick;
pub mod transaction;

use alloc::vec::Vec;
use core::time::Duration;

use chrono::NaiveDateTime;
use paste::paste;

pub use bus::SimulatedBus;
pub use calendar::{Calendar, CalendarError};
pub use register_file::{Intent, RegisterFile};
pub use registers::*;
pub use tick::TickSource;
pub use transaction::{TransactionController, TransactionState};

/// Configuration for a simulated DS3231.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Crystal frequency in Hz.
    pub frequency: u32,
    /// The two prescale divisors between the crystal and the 1 Hz clock.
    pub prescaler: (u32, u32),
    /// Date and time loaded at power-on and on every reset.
    pub datetime: NaiveDateTime,
    /// Day of week (1-7) loaded at power-on and on every reset.
    pub day_of_week: u8,
}

impl Default for Config {
    /// 32.768 kHz crystal, 1 Hz prescaling, 2000-01-01 00:00:00, day 1.
    fn default() -> Self {
        let calendar = Calendar::default();
        Self {
            frequency: tick::DEFAULT_FREQUENCY,
            prescaler: tick::DEFAULT_PRESCALER,
            datetime: calendar.datetime().unwrap_or_default(),
            day_of_week: calendar.day_of_week(),
        }
    }
}

/// Simulated DS3231 device.
///
/// Owns the register file, the calendar behind it, the transaction state and
/// the tick source.
#[derive(Debug, Clone)]
pub struct DS3231 {
    registers: RegisterFile,
    transaction: TransactionController,
    tick: TickSource,
}

// Typed register access for the host side. Neither direction touches the
// transaction pointer.
macro_rules! impl_register_access {
    ($(($name:ident, $regaddr:expr, $typ:ty)),+) => {
        impl DS3231 {
            $(
                paste! {
                    #[doc = concat!("Returns the current value of the ", stringify!($name), " register.")]
                    pub fn $name(&self) -> $typ {
                        <$typ>::from(self.registers.read($regaddr as u8))
                    }

                    #[doc = concat!("Writes the ", stringify!($name), " register as a bus write would.")]
                    pub fn [<set_ $name>](&mut self, value: $typ) {
                        if let Some(intent) = self.registers.write($regaddr as u8, value.into()) {
                            self.apply(intent);
                        }
                    }
                }
            )+
        }
    }
}

impl_register_access!(
    (second, RegAddr::Seconds, Seconds),
    (minute, RegAddr::Minutes, Minutes),
    (hour, RegAddr::Hours, Hours),
    (day, RegAddr::DayOfWeek, Day),
    (date, RegAddr::DayOfMonth, Date),
    (month, RegAddr::Month, Month),
    (year, RegAddr::Year, Year),
    (control, RegAddr::Control, Control),
    (status, RegAddr::Status, Status),
    (aging_offset, RegAddr::AgingOffset, AgingOffset),
    (temperature, RegAddr::TempMsb, Temperature)
);

impl DS3231 {
    /// Creates a device at power-on defaults.
    ///
    /// If `config.datetime` falls outside 2000-2199 the calendar starts at
    /// 2000-01-01 00:00:00 instead.
    pub fn new(config: Config) -> Self {
        let mut power_on = Calendar::default();
        if let Err(e) = power_on.set_datetime(&config.datetime) {
            error!("ds3231: unusable power-on date/time: {:?}", e);
        }
        power_on.set_day_of_week(config.day_of_week);
        Self {
            registers: RegisterFile::new(power_on),
            transaction: TransactionController::new(),
            tick: TickSource::new(config.frequency, config.prescaler),
        }
    }

    /// Bus write: the first byte selects the register, the rest are stored
    /// at consecutive addresses.
    pub fn write(&mut self, bytes: &[u8]) {
        if let Some(intent) = self.transaction.write(&mut self.registers, bytes) {
            self.apply(intent);
        }
    }

    /// Bus read at the latched register.
    ///
    /// Returns the seven date/time registers when the seconds register is
    /// addressed and a single byte otherwise, regardless of `count`. Returns
    /// an empty vector when no register has been addressed.
    pub fn read(&mut self, count: usize) -> Vec<u8> {
        self.transaction.read(&self.registers, count)
    }

    /// Ends the current bus transaction.
    pub fn end_transaction(&mut self) {
        self.transaction.end_transaction();
    }

    /// Restores power-on defaults and re-arms the tick source.
    pub fn reset(&mut self) {
        debug!("ds3231: reset");
        self.registers.reset();
        self.transaction.reset();
        self.tick.reset();
    }

    /// Called by the host scheduler once per [`DS3231::tick_interval`].
    pub fn on_tick(&mut self) {
        if self.tick.enabled() {
            self.registers.calendar_mut().advance_one_second();
        }
    }

    /// Feeds `ticks` raw oscillator ticks and advances the calendar once per
    /// completed prescaler period. Returns the number of seconds advanced.
    ///
    /// The calendar steps once per fired second, so the cost grows with the
    /// simulated time covered. Feed ticks in scheduler-sized slices.
    pub fn clock(&mut self, ticks: u64) -> u64 {
        let seconds = self.tick.advance(ticks);
        for _ in 0..seconds {
            self.registers.calendar_mut().advance_one_second();
        }
        seconds
    }

    /// Host time between calls to [`DS3231::on_tick`].
    pub fn tick_interval(&self) -> Duration {
        self.tick.interval()
    }

    /// The oscillator tick source.
    pub fn tick_source(&self) -> &TickSource {
        &self.tick
    }

    /// Whether simulated time is currently advancing.
    pub fn oscillator_running(&self) -> bool {
        self.tick.enabled() && self.registers.calendar().oscillator_enabled()
    }

    /// The latched register pointer of the open transaction.
    pub fn pointer(&self) -> Option<u8> {
        self.transaction.pointer()
    }

    /// Reads a register without opening a transaction.
    pub fn peek(&self, address: u8) -> u8 {
        self.registers.read(address)
    }

    /// The calendar behind the timekeeping registers.
    pub fn calendar(&self) -> &Calendar {
        self.registers.calendar()
    }

    /// Gets the current simulated date and time.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidDateTime`] if the bus has written
    /// values that do not form a real date.
    pub fn datetime(&self) -> Result<NaiveDateTime, CalendarError> {
        self.registers.calendar().datetime()
    }

    /// Sets the simulated date and time from the host side.
    ///
    /// # Errors
    ///
    /// Returns an error if the year is outside 2000-2199.
    pub fn set_datetime(&mut self, datetime: &NaiveDateTime) -> Result<(), CalendarError> {
        self.registers.calendar_mut().set_datetime(datetime)
    }

    fn apply(&mut self, intent: Intent) {
        match intent {
            Intent::Oscillator(enabled) => self.tick.set_enabled(enabled),
        }
    }
}

impl Default for DS3231 {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
