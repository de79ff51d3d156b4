//! Timekeeping state of the simulated DS3231.
//!
//! The calendar keeps every field in plain binary form. The register file
//! converts to and from packed BCD when the bus touches a register; nothing
//! here clamps or validates what it is given, so garbage written over the bus
//! shows up as out-of-range fields until the next carry cleans it up.
//!
//! # Errors
//!
//! Conversions to and from chrono's `NaiveDateTime` report problems via
//! [`CalendarError`].

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Base year represented by a year register value of zero with the century
/// flag clear.
pub const BASE_YEAR: i32 = 2000;

/// Years added to the decoded year register when the century flag is set.
pub const CENTURY_OFFSET: i32 = 100;

/// Errors that can occur converting between the calendar and chrono types.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalendarError {
    /// The calendar fields do not form a valid date/time
    InvalidDateTime,
    /// The year is not before 2200 (the DS3231 only counts to 2199)
    YearNotBefore2200,
    /// The year is not after 1999 (the DS3231 starts at 2000)
    YearNotAfter1999,
}

/// Calendar state and mode flags.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calendar {
    second: u8,
    minute: u8,
    hour: u8,
    day_of_week: u8,
    day_of_month: u8,
    month: u8,
    year: i32,
    oscillator_enabled: bool,
    pm_or_20hr_flag: bool,
    hour_mode_flag: bool,
    century: bool,
}

impl Default for Calendar {
    /// 2000-01-01 00:00:00, day of week 1, oscillator running.
    fn default() -> Self {
        Self {
            second: 0,
            minute: 0,
            hour: 0,
            day_of_week: 1,
            day_of_month: 1,
            month: 1,
            year: BASE_YEAR,
            oscillator_enabled: true,
            pm_or_20hr_flag: false,
            hour_mode_flag: false,
            century: false,
        }
    }
}

impl Calendar {
    /// Advances the calendar by one second when the oscillator is running.
    ///
    /// Carries ripple from seconds up to the year using Gregorian month
    /// lengths. The day of week steps 1..=7 at midnight and the century flag
    /// toggles when the year register wraps past 99, so 2199 rolls over to
    /// 2000. Afterwards the 20-hour flag is recomputed as `hour >= 20`.
    pub fn advance_one_second(&mut self) {
        if !self.oscillator_enabled {
            return;
        }

        self.second = self.second.wrapping_add(1);
        if self.second >= 60 {
            self.second = 0;
            self.minute = self.minute.wrapping_add(1);
        }
        if self.minute >= 60 {
            self.minute = 0;
            self.hour = self.hour.wrapping_add(1);
        }
        if self.hour >= 24 {
            self.hour = 0;
            self.day_of_week = if self.day_of_week >= 7 {
                1
            } else {
                self.day_of_week + 1
            };
            self.day_of_month = self.day_of_month.wrapping_add(1);
        }
        if self.day_of_month > days_in_month(self.year, self.month) {
            self.day_of_month = 1;
            self.month = self.month.wrapping_add(1);
        }
        if self.month > 12 {
            self.month = 1;
            self.advance_year();
        }

        self.pm_or_20hr_flag = self.hour >= 20;
    }

    fn advance_year(&mut self) {
        self.year += 1;
        if self.year - BASE_YEAR - self.century_bias() == CENTURY_OFFSET {
            if self.century {
                // Past 2199 the counter starts over at 2000
                self.year -= 2 * CENTURY_OFFSET;
            }
            self.century = !self.century;
            debug!("calendar: century rollover at year {}", self.year);
        }
    }

    /// Seconds (0-59).
    pub fn second(&self) -> u8 {
        self.second
    }

    /// Sets seconds without range checking.
    pub fn set_second(&mut self, second: u8) {
        self.second = second;
    }

    /// Minutes (0-59).
    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Sets minutes without range checking.
    pub fn set_minute(&mut self, minute: u8) {
        self.minute = minute;
    }

    /// Hour in 24-hour form.
    pub fn hour(&self) -> u8 {
        self.hour
    }

    /// Sets the hour in 24-hour form without range checking.
    pub fn set_hour(&mut self, hour: u8) {
        self.hour = hour;
    }

    /// Day of week (1-7). Counted independently of the date.
    pub fn day_of_week(&self) -> u8 {
        self.day_of_week
    }

    /// Sets the day of week without range checking.
    pub fn set_day_of_week(&mut self, day_of_week: u8) {
        self.day_of_week = day_of_week;
    }

    /// Day of month (1-31).
    pub fn day_of_month(&self) -> u8 {
        self.day_of_month
    }

    /// Sets the day of month without range checking.
    pub fn set_day_of_month(&mut self, day_of_month: u8) {
        self.day_of_month = day_of_month;
    }

    /// Month (1-12).
    pub fn month(&self) -> u8 {
        self.month
    }

    /// Sets the month without range checking.
    pub fn set_month(&mut self, month: u8) {
        self.month = month;
    }

    /// Absolute year, e.g. 2023.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Sets the absolute year. The century flag is left alone.
    pub fn set_year(&mut self, year: i32) {
        self.year = year;
    }

    /// Whether the oscillator is running (EOSC clear).
    pub fn oscillator_enabled(&self) -> bool {
        self.oscillator_enabled
    }

    /// Starts or stops timekeeping.
    pub fn set_oscillator_enabled(&mut self, enabled: bool) {
        self.oscillator_enabled = enabled;
    }

    /// The hours register bit 5. Set whenever the hour reaches 20 or later.
    pub fn pm_or_20hr_flag(&self) -> bool {
        self.pm_or_20hr_flag
    }

    /// Sets the hours register bit 5 until the next advance.
    pub fn set_pm_or_20hr_flag(&mut self, flag: bool) {
        self.pm_or_20hr_flag = flag;
    }

    /// The hours register bit 6 (12/24 select).
    pub fn hour_mode_flag(&self) -> bool {
        self.hour_mode_flag
    }

    /// Sets the hours register bit 6.
    pub fn set_hour_mode_flag(&mut self, flag: bool) {
        self.hour_mode_flag = flag;
    }

    /// The month register century bit.
    pub fn century(&self) -> bool {
        self.century
    }

    /// Sets the century bit without touching the year.
    pub fn set_century(&mut self, century: bool) {
        self.century = century;
    }

    /// Years added on top of [`BASE_YEAR`] by the century flag.
    pub fn century_bias(&self) -> i32 {
        if self.century {
            CENTURY_OFFSET
        } else {
            0
        }
    }

    /// Returns the current calendar as a chrono `NaiveDateTime`.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidDateTime`] if the fields do not form a
    /// real date/time, which happens after invalid BCD has been written.
    pub fn datetime(&self) -> Result<NaiveDateTime, CalendarError> {
        NaiveDate::from_ymd_opt(
            self.year,
            u32::from(self.month),
            u32::from(self.day_of_month),
        )
        .and_then(|d| {
            d.and_hms_opt(
                u32::from(self.hour),
                u32::from(self.minute),
                u32::from(self.second),
            )
        })
        .ok_or(CalendarError::InvalidDateTime)
    }

    /// Sets every calendar field from `datetime`.
    ///
    /// The century flag follows the year and the day of week is derived from
    /// the date, counting Sunday as 1. Mode flags other than the 20-hour flag
    /// are left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the year is outside 2000-2199.
    pub fn set_datetime(&mut self, datetime: &NaiveDateTime) -> Result<(), CalendarError> {
        let year = datetime.year();
        if year > 2199 {
            error!("Year {} is too late! must be before 2200", year);
            return Err(CalendarError::YearNotBefore2200);
        }
        if year < BASE_YEAR {
            error!("Year {} is too early! must be greater than 1999", year);
            return Err(CalendarError::YearNotAfter1999);
        }
        let weekday = datetime.weekday().number_from_sunday();

        self.second = u8::try_from(datetime.second()).map_err(|_| CalendarError::InvalidDateTime)?;
        self.minute = u8::try_from(datetime.minute()).map_err(|_| CalendarError::InvalidDateTime)?;
        self.hour = u8::try_from(datetime.hour()).map_err(|_| CalendarError::InvalidDateTime)?;
        self.day_of_week = u8::try_from(weekday).map_err(|_| CalendarError::InvalidDateTime)?;
        self.day_of_month = u8::try_from(datetime.day()).map_err(|_| CalendarError::InvalidDateTime)?;
        self.month = u8::try_from(datetime.month()).map_err(|_| CalendarError::InvalidDateTime)?;
        self.year = year;
        self.century = year - BASE_YEAR >= CENTURY_OFFSET;
        self.pm_or_20hr_flag = self.hour >= 20;
        Ok(())
    }
}

/// Days in `month` of `year`. Months outside 1-12 count as 31 days so that a
/// garbage month still carries over on the next day rollover.
fn days_in_month(year: i32, month: u8) -> u8 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 => {
            let leap = NaiveDate::from_ymd_opt(year, 2, 29).is_some();
            if leap {
                29
            } else {
                28
            }
        }
        _ => 31,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calendar_at(datetime: NaiveDateTime) -> Calendar {
        let mut calendar = Calendar::default();
        calendar.set_datetime(&datetime).unwrap();
        calendar
    }

    fn ymd_hms(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_default_is_power_on_date() {
        let calendar = Calendar::default();
        assert_eq!(calendar.datetime().unwrap(), ymd_hms(2000, 1, 1, 0, 0, 0));
        assert_eq!(calendar.day_of_week(), 1);
        assert!(calendar.oscillator_enabled());
        assert!(!calendar.century());
    }

    #[test]
    fn test_advance_carries_seconds_into_minutes() {
        let mut calendar = calendar_at(ymd_hms(2023, 6, 15, 10, 41, 59));
        calendar.advance_one_second();
        assert_eq!(calendar.second(), 0);
        assert_eq!(calendar.minute(), 42);
        assert_eq!(calendar.hour(), 10);
    }

    #[test]
    fn test_advance_carries_into_next_day() {
        let mut calendar = calendar_at(ymd_hms(2023, 6, 15, 23, 59, 59));
        let weekday = calendar.day_of_week();
        calendar.advance_one_second();
        assert_eq!(calendar.datetime().unwrap(), ymd_hms(2023, 6, 16, 0, 0, 0));
        assert_eq!(calendar.day_of_week(), weekday % 7 + 1);
    }

    #[test]
    fn test_advance_respects_month_lengths() {
        let mut calendar = calendar_at(ymd_hms(2023, 4, 30, 23, 59, 59));
        calendar.advance_one_second();
        assert_eq!(calendar.datetime().unwrap(), ymd_hms(2023, 5, 1, 0, 0, 0));

        let mut calendar = calendar_at(ymd_hms(2023, 2, 28, 23, 59, 59));
        calendar.advance_one_second();
        assert_eq!(calendar.datetime().unwrap(), ymd_hms(2023, 3, 1, 0, 0, 0));

        let mut calendar = calendar_at(ymd_hms(2024, 2, 28, 23, 59, 59));
        calendar.advance_one_second();
        assert_eq!(calendar.datetime().unwrap(), ymd_hms(2024, 2, 29, 0, 0, 0));
    }

    #[test]
    fn test_advance_carries_into_next_year() {
        let mut calendar = calendar_at(ymd_hms(2023, 12, 31, 23, 59, 59));
        calendar.advance_one_second();
        assert_eq!(calendar.datetime().unwrap(), ymd_hms(2024, 1, 1, 0, 0, 0));
        assert!(!calendar.century());
    }

    #[test]
    fn test_advance_sets_century_on_year_wrap() {
        let mut calendar = calendar_at(ymd_hms(2099, 12, 31, 23, 59, 59));
        assert!(!calendar.century());
        calendar.advance_one_second();
        assert_eq!(calendar.year(), 2100);
        assert!(calendar.century());
        assert_eq!(calendar.year() - BASE_YEAR - calendar.century_bias(), 0);
    }

    #[test]
    fn test_advance_clears_century_after_2199() {
        let mut calendar = calendar_at(ymd_hms(2199, 12, 31, 23, 59, 59));
        assert!(calendar.century());
        calendar.advance_one_second();
        assert_eq!(calendar.datetime().unwrap(), ymd_hms(2000, 1, 1, 0, 0, 0));
        assert!(!calendar.century());
        assert_eq!(calendar.year() - BASE_YEAR - calendar.century_bias(), 0);

        // Year register reads 0x00 again, not 0xA0
        let mut registers =
            crate::RegisterFile::new(calendar_at(ymd_hms(2199, 12, 31, 23, 59, 59)));
        registers.calendar_mut().advance_one_second();
        assert_eq!(registers.read(crate::RegAddr::Year as u8), 0x00);
        assert_eq!(registers.read(crate::RegAddr::Month as u8), 0x01);
    }

    #[test]
    fn test_day_of_week_wraps_after_seven() {
        let mut calendar = calendar_at(ymd_hms(2023, 6, 15, 23, 59, 59));
        calendar.set_day_of_week(7);
        calendar.advance_one_second();
        assert_eq!(calendar.day_of_week(), 1);
    }

    #[test]
    fn test_stopped_oscillator_does_not_advance() {
        let mut calendar = calendar_at(ymd_hms(2023, 6, 15, 10, 41, 59));
        calendar.set_oscillator_enabled(false);
        calendar.advance_one_second();
        assert_eq!(calendar.datetime().unwrap(), ymd_hms(2023, 6, 15, 10, 41, 59));
    }

    #[test]
    fn test_twenty_hour_flag_recomputed_on_advance() {
        let mut calendar = calendar_at(ymd_hms(2023, 6, 15, 19, 59, 59));
        assert!(!calendar.pm_or_20hr_flag());
        calendar.advance_one_second();
        assert!(calendar.pm_or_20hr_flag());

        // A flag forced on by a register write is dropped again at 12:00
        let mut calendar = calendar_at(ymd_hms(2023, 6, 15, 12, 0, 0));
        calendar.set_pm_or_20hr_flag(true);
        calendar.advance_one_second();
        assert!(!calendar.pm_or_20hr_flag());
    }

    #[test]
    fn test_out_of_range_fields_carry() {
        let mut calendar = Calendar::default();
        // 0x7F decodes to 85
        calendar.set_second(85);
        calendar.advance_one_second();
        assert_eq!(calendar.second(), 0);
        assert_eq!(calendar.minute(), 1);
    }

    #[test]
    fn test_datetime_rejects_invalid_fields() {
        let mut calendar = Calendar::default();
        calendar.set_month(13);
        assert_eq!(calendar.datetime(), Err(CalendarError::InvalidDateTime));
    }

    #[test]
    fn test_set_datetime_year_limits() {
        let mut calendar = Calendar::default();
        assert_eq!(
            calendar.set_datetime(&ymd_hms(1999, 12, 31, 23, 59, 59)),
            Err(CalendarError::YearNotAfter1999)
        );
        assert_eq!(
            calendar.set_datetime(&ymd_hms(2200, 1, 1, 0, 0, 0)),
            Err(CalendarError::YearNotBefore2200)
        );
        calendar.set_datetime(&ymd_hms(2150, 3, 1, 0, 0, 0)).unwrap();
        assert!(calendar.century());
    }

    #[test]
    fn test_set_datetime_weekday_counts_sunday_as_one() {
        // 2024-03-10 is a Sunday
        let calendar = calendar_at(ymd_hms(2024, 3, 10, 0, 0, 0));
        assert_eq!(calendar.day_of_week(), 1);
        // 2024-03-16 is a Saturday
        let calendar = calendar_at(ymd_hms(2024, 3, 16, 0, 0, 0));
        assert_eq!(calendar.day_of_week(), 7);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2023, 1), 31);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2100, 2), 28);
        assert_eq!(days_in_month(2023, 11), 30);
        assert_eq!(days_in_month(2023, 0x1F), 31);
    }
}
