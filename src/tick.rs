//! Oscillator tick source.
//!
//! The DS3231 divides its 32.768 kHz crystal down to the 1 Hz timekeeping
//! clock. The host scheduler either calls [`crate::DS3231::on_tick`] every
//! [`TickSource::interval`], or feeds raw oscillator ticks through
//! [`crate::DS3231::clock`] and lets the prescalers count them.

use core::time::Duration;

/// Crystal frequency of the DS3231.
pub const DEFAULT_FREQUENCY: u32 = 32_768;

/// First and second prescale divisors; together they divide the crystal down
/// to 1 Hz.
pub const DEFAULT_PRESCALER: (u32, u32) = (256, 128);

/// Periodic trigger that fires once per simulated second.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickSource {
    frequency: u32,
    prescaler: (u32, u32),
    enabled: bool,
    counter: u64,
}

impl TickSource {
    /// Creates an enabled tick source.
    ///
    /// A zero frequency or divisor is bumped to 1 so the period is never zero.
    pub fn new(frequency: u32, prescaler: (u32, u32)) -> Self {
        Self {
            frequency: frequency.max(1),
            prescaler: (prescaler.0.max(1), prescaler.1.max(1)),
            enabled: true,
            counter: 0,
        }
    }

    /// Crystal frequency in Hz.
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// The two prescale divisors.
    pub fn prescaler(&self) -> (u32, u32) {
        self.prescaler
    }

    /// Number of oscillator ticks between firings.
    pub fn period(&self) -> u64 {
        u64::from(self.prescaler.0) * u64::from(self.prescaler.1)
    }

    /// Host time between firings.
    pub fn interval(&self) -> Duration {
        let period = self.period();
        let frequency = u64::from(self.frequency);
        let secs = period / frequency;
        let nanos = (period % frequency) * 1_000_000_000 / frequency;
        // nanos < 1e9 since the remainder is below the frequency
        Duration::new(secs, nanos as u32)
    }

    /// Whether the source fires.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Starts or stops the source. Pending ticks are kept.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            debug!("ds3231: oscillator {}", if enabled { "started" } else { "stopped" });
        }
        self.enabled = enabled;
    }

    /// Counts `ticks` oscillator ticks and returns how many times the source
    /// fired. A disabled source ignores the ticks.
    pub fn advance(&mut self, ticks: u64) -> u64 {
        if !self.enabled {
            return 0;
        }
        let period = self.period();
        let mut fired = ticks / period;
        let partial = ticks % period;
        // counter < period, so the pending remainder never needs a wider type
        let remaining = period - self.counter;
        if partial >= remaining {
            self.counter = partial - remaining;
            fired += 1;
        } else {
            self.counter += partial;
        }
        fired
    }

    /// Re-arms the source: enabled, with no partial period pending.
    pub fn reset(&mut self) {
        self.enabled = true;
        self.counter = 0;
    }
}

impl Default for TickSource {
    fn default() -> Self {
        Self::new(DEFAULT_FREQUENCY, DEFAULT_PRESCALER)
    }
}
