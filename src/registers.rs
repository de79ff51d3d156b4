//! Register addresses and typed register views for the simulated DS3231.
//!
//! The bitfield wrappers mirror the silicon layout of each register. The
//! device model itself stores raw bytes (see [`crate::register_file`]); these
//! types exist so hosts and tests can pick a register apart without doing the
//! shifting by hand.

use bitfield::bitfield;

/// Register addresses of the DS3231.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegAddr {
    /// Seconds register (0-59)
    Seconds = 0x00,
    /// Minutes register (0-59)
    Minutes = 0x01,
    /// Hours register (0-23, plus mode flags)
    Hours = 0x02,
    /// Day of week register (1-7)
    DayOfWeek = 0x03,
    /// Day of month register (1-31)
    DayOfMonth = 0x04,
    /// Month register (1-12) with century flag
    Month = 0x05,
    /// Year register (0-99)
    Year = 0x06,
    /// Alarm 1 seconds register
    Alarm1Seconds = 0x07,
    /// Alarm 1 minutes register
    Alarm1Minutes = 0x08,
    /// Alarm 1 hours register
    Alarm1Hours = 0x09,
    /// Alarm 1 day/date register
    Alarm1DayDate = 0x0A,
    /// Alarm 2 minutes register
    Alarm2Minutes = 0x0B,
    /// Alarm 2 hours register
    Alarm2Hours = 0x0C,
    /// Alarm 2 day/date register
    Alarm2DayDate = 0x0D,
    /// Control register
    Control = 0x0E,
    /// Control/Status register
    Status = 0x0F,
    /// Aging offset register
    AgingOffset = 0x10,
    /// Temperature MSB register
    TempMsb = 0x11,
    /// Temperature LSB register
    TempLsb = 0x12,
    /// Temperature conversion register
    TempConv = 0x13,
}

impl RegAddr {
    /// Number of registers starting at [`RegAddr::Seconds`] returned by a
    /// burst read of the date/time block.
    pub const DATETIME_LEN: usize = 7;

    /// Returns the register at `address`, if one is defined there.
    pub fn from_address(address: u8) -> Option<Self> {
        let reg = match address {
            0x00 => RegAddr::Seconds,
            0x01 => RegAddr::Minutes,
            0x02 => RegAddr::Hours,
            0x03 => RegAddr::DayOfWeek,
            0x04 => RegAddr::DayOfMonth,
            0x05 => RegAddr::Month,
            0x06 => RegAddr::Year,
            0x07 => RegAddr::Alarm1Seconds,
            0x08 => RegAddr::Alarm1Minutes,
            0x09 => RegAddr::Alarm1Hours,
            0x0A => RegAddr::Alarm1DayDate,
            0x0B => RegAddr::Alarm2Minutes,
            0x0C => RegAddr::Alarm2Hours,
            0x0D => RegAddr::Alarm2DayDate,
            0x0E => RegAddr::Control,
            0x0F => RegAddr::Status,
            0x10 => RegAddr::AgingOffset,
            0x11 => RegAddr::TempMsb,
            0x12 => RegAddr::TempLsb,
            0x13 => RegAddr::TempConv,
            _ => return None,
        };
        Some(reg)
    }
}

impl From<RegAddr> for u8 {
    fn from(v: RegAddr) -> Self {
        v as u8
    }
}

/// Time representation selected by bit 6 of the hours register.
///
/// Only the 24-hour representation changes how the model counts; the flag is
/// stored and read back either way.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeRepresentation {
    /// 24-hour format (0-23)
    TwentyFourHour = 0,
    /// 12-hour format (1-12 + AM/PM)
    TwelveHour = 1,
}
impl From<u8> for TimeRepresentation {
    /// Creates a `TimeRepresentation` from a raw register value.
    ///
    /// # Panics
    /// Panics if the value is not 0 or 1.
    fn from(v: u8) -> Self {
        match v {
            0 => TimeRepresentation::TwentyFourHour,
            1 => TimeRepresentation::TwelveHour,
            _ => panic!("Invalid value for TimeRepresentation: {}", v),
        }
    }
}
impl From<TimeRepresentation> for u8 {
    fn from(v: TimeRepresentation) -> Self {
        v as u8
    }
}

/// Oscillator state as encoded by the EOSC bit (active low).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oscillator {
    /// Oscillator is running
    Enabled = 0,
    /// Oscillator is stopped
    Disabled = 1,
}
impl From<u8> for Oscillator {
    /// Creates an `Oscillator` from a raw register value.
    ///
    /// # Panics
    /// Panics if the value is not 0 or 1.
    fn from(v: u8) -> Self {
        match v {
            0 => Oscillator::Enabled,
            1 => Oscillator::Disabled,
            _ => panic!("Invalid value for Oscillator: {}", v),
        }
    }
}
impl From<Oscillator> for u8 {
    fn from(v: Oscillator) -> Self {
        v as u8
    }
}

/// INT/SQW pin function. Stored only; the pin is not modelled.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptControl {
    /// Output square wave on INT/SQW pin
    SquareWave = 0,
    /// Output interrupt signal on INT/SQW pin
    Interrupt = 1,
}
impl From<u8> for InterruptControl {
    /// # Panics
    /// Panics if the value is not 0 or 1.
    fn from(v: u8) -> Self {
        match v {
            0 => InterruptControl::SquareWave,
            1 => InterruptControl::Interrupt,
            _ => panic!("Invalid value for InterruptControl: {}", v),
        }
    }
}
impl From<InterruptControl> for u8 {
    fn from(v: InterruptControl) -> Self {
        v as u8
    }
}

/// Square wave output frequency selected by RS2/RS1. Stored only.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SquareWaveFrequency {
    /// 1 Hz
    Hz1 = 0b00,
    /// 1.024 kHz
    Hz1024 = 0b01,
    /// 4.096 kHz
    Hz4096 = 0b10,
    /// 8.192 kHz
    Hz8192 = 0b11,
}
impl From<u8> for SquareWaveFrequency {
    /// # Panics
    /// Panics if the value does not fit in two bits.
    fn from(v: u8) -> Self {
        match v {
            0b00 => SquareWaveFrequency::Hz1,
            0b01 => SquareWaveFrequency::Hz1024,
            0b10 => SquareWaveFrequency::Hz4096,
            0b11 => SquareWaveFrequency::Hz8192,
            _ => panic!("Invalid value for SquareWaveFrequency: {}", v),
        }
    }
}
impl From<SquareWaveFrequency> for u8 {
    fn from(v: SquareWaveFrequency) -> Self {
        v as u8
    }
}

// This macro generates the From<u8> and Into<u8> implementations for the
// register type
macro_rules! from_register_u8 {
    ($typ:ty) => {
        impl From<u8> for $typ {
            fn from(v: u8) -> Self {
                paste::paste!([< $typ >](v))
            }
        }
        impl From<$typ> for u8 {
            fn from(v: $typ) -> Self {
                v.0
            }
        }
    };
}

bitfield! {
    /// Seconds register (0-59) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Seconds(u8);
    impl Debug;
    /// Tens place of seconds (0-5)
    pub ten_seconds, set_ten_seconds: 6, 4;
    /// Ones place of seconds (0-9)
    pub seconds, set_seconds: 3, 0;
}
from_register_u8!(Seconds);

bitfield! {
    /// Minutes register (0-59) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Minutes(u8);
    impl Debug;
    pub ten_minutes, set_ten_minutes: 6, 4;
    pub minutes, set_minutes: 3, 0;
}
from_register_u8!(Minutes);

bitfield! {
    /// Hours register with format selection and BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Hours(u8);
    impl Debug;
    /// Time representation format (12/24 hour)
    pub from into TimeRepresentation, time_representation, set_time_representation: 6, 6;
    /// PM flag (12-hour) or 20-hour bit (24-hour)
    pub pm_or_twenty_hours, set_pm_or_twenty_hours: 5, 5;
    /// Tens place of hours
    pub ten_hours, set_ten_hours: 4, 4;
    /// Ones place of hours
    pub hours, set_hours: 3, 0;
}
from_register_u8!(Hours);

#[cfg(feature = "defmt")]
impl defmt::Format for Hours {
    fn format(&self, f: defmt::Formatter) {
        let hours = 10 * self.ten_hours() + self.hours() + 20 * self.pm_or_twenty_hours();
        defmt::write!(f, "Hours({}h)", hours);
    }
}

bitfield! {
    /// Day of week register (1-7).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Day(u8);
    impl Debug;
    pub day, set_day: 2, 0;
}
from_register_u8!(Day);

bitfield! {
    /// Day of month register (1-31) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Date(u8);
    impl Debug;
    pub ten_date, set_ten_date: 5, 4;
    pub date, set_date: 3, 0;
}
from_register_u8!(Date);

bitfield! {
    /// Month register (1-12) with century flag and BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Month(u8);
    impl Debug;
    /// Century flag (set once the year passes 2099)
    pub century, set_century: 7;
    pub ten_month, set_ten_month: 4, 4;
    pub month, set_month: 3, 0;
}
from_register_u8!(Month);

bitfield! {
    /// Year register (0-99) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Year(u8);
    impl Debug;
    pub ten_year, set_ten_year: 7, 4;
    pub year, set_year: 3, 0;
}
from_register_u8!(Year);

bitfield! {
    /// Control register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Control(u8);
    impl Debug;
    /// Oscillator enable (EOSC, active low)
    pub from into Oscillator, oscillator_enable, set_oscillator_enable: 7, 7;
    /// Battery-backed square wave enable (BBSQW)
    pub battery_backed_square_wave, set_battery_backed_square_wave: 6;
    /// Convert temperature (CONV)
    pub convert_temperature, set_convert_temperature: 5;
    /// Rate select (RS2/RS1)
    pub from into SquareWaveFrequency, square_wave_frequency, set_square_wave_frequency: 4, 3;
    /// Interrupt control (INTCN)
    pub from into InterruptControl, interrupt_control, set_interrupt_control: 2, 2;
    /// Alarm 2 interrupt enable (A2IE)
    pub alarm2_interrupt_enable, set_alarm2_interrupt_enable: 1;
    /// Alarm 1 interrupt enable (A1IE)
    pub alarm1_interrupt_enable, set_alarm1_interrupt_enable: 0;
}
from_register_u8!(Control);

#[cfg(feature = "defmt")]
impl defmt::Format for Control {
    fn format(&self, f: defmt::Formatter) {
        match self.oscillator_enable() {
            Oscillator::Enabled => defmt::write!(f, "Oscillator enabled"),
            Oscillator::Disabled => defmt::write!(f, "Oscillator disabled"),
        }
        if self.convert_temperature() {
            defmt::write!(f, ", Temperature conversion requested");
        }
        match self.interrupt_control() {
            InterruptControl::SquareWave => defmt::write!(f, ", Square wave output"),
            InterruptControl::Interrupt => defmt::write!(f, ", Interrupt output"),
        }
    }
}

bitfield! {
    /// Status register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Status(u8);
    impl Debug;
    /// Oscillator stop flag (OSF)
    pub oscillator_stop_flag, set_oscillator_stop_flag: 7;
    /// Enable 32kHz output (EN32kHz)
    pub enable_32khz_output, set_enable_32khz_output: 3;
    /// Busy (BSY)
    pub busy, set_busy: 2;
    /// Alarm 2 flag (A2F)
    pub alarm2_flag, set_alarm2_flag: 1;
    /// Alarm 1 flag (A1F)
    pub alarm1_flag, set_alarm1_flag: 0;
}
from_register_u8!(Status);

bitfield! {
    /// Aging offset register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AgingOffset(u8);
    impl Debug;
    pub i8, aging_offset, set_aging_offset: 7, 0;
}
from_register_u8!(AgingOffset);

bitfield! {
    /// Temperature register (integer part).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Temperature(u8);
    impl Debug;
    pub i8, temperature, set_temperature: 7, 0;
}
from_register_u8!(Temperature);
