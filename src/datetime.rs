//! Date and time values read from the DS1307 RTC.
//!
//! This module holds the plain value types returned by the typed accessors,
//! the binary to BCD packing routine, and the decoding of the timekeeping
//! registers into chrono's `NaiveDateTime`.
//!
//! # Encodings
//!
//! [`Time`] and [`Date`] do not record how their fields are encoded. The
//! `*_binary` accessors fill them with the register bytes as stored, the
//! `*_bcd` accessors fill them with those bytes passed through [`pack_bcd`].
//! Callers must track which accessor produced a value.
//!
//! # Register Model
//!
//! The DS1307 stores date and time in 7 consecutive registers:
//! - Seconds, Minutes, Hours, Day, Date, Month, Year

use chrono::{NaiveDate, NaiveDateTime};

use crate::{DateOfMonth, Day, Hours, Minutes, Month, Seconds, TimeRepresentation, Year};

/// Number of registers read for a [`Time`] (seconds, minutes, hours).
pub(crate) const TIME_REGISTERS: usize = 3;
/// Number of registers read for a [`Date`] (day, date, month, year).
pub(crate) const DATE_REGISTERS: usize = 4;
/// Number of timekeeping registers (seconds through year).
pub(crate) const DATETIME_REGISTERS: usize = 7;

/// Hour, minute and second as read from the timekeeping registers.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Weekday, day of month, month and two-digit year.
///
/// The DS1307 has no century register, so `year` is always 0-99 in the chip's
/// native numbering.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Date {
    /// Day of week, 1 (Sunday) through 7 (Saturday)
    pub weekday: u8,
    pub day: u8,
    pub month: u8,
    pub year: u8,
}

/// A [`Date`] and a [`Time`] fetched with two separate register reads.
///
/// The two reads are not latched together: the clock can roll over between
/// them (for example at midnight), leaving a date from before the rollover
/// next to a time from after it.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    pub date: Date,
    pub time: Time,
}

impl DateTime {
    /// Combines the results of a date read followed by a time read.
    ///
    /// A failed date read wins over the time result, so a date error is
    /// never hidden by a successful time read.
    pub(crate) fn from_reads<E>(date: Result<Date, E>, time: Result<Time, E>) -> Result<Self, E> {
        let date = date?;
        let time = time?;
        Ok(DateTime { date, time })
    }
}

impl From<[u8; TIME_REGISTERS]> for Time {
    fn from(data: [u8; TIME_REGISTERS]) -> Self {
        Time {
            second: data[0],
            minute: data[1],
            hour: data[2],
        }
    }
}

impl From<[u8; DATE_REGISTERS]> for Date {
    fn from(data: [u8; DATE_REGISTERS]) -> Self {
        Date {
            weekday: data[0],
            day: data[1],
            month: data[2],
            year: data[3],
        }
    }
}

/// Packs each byte of `data` in place into two BCD digits.
///
/// Every value `v` becomes `((v / 10) << 4) | (v % 10)`: tens in the high
/// nibble, units in the low nibble. Values must be binary and at most 99.
///
/// This is not idempotent. Running it over bytes that are already BCD
/// re-encodes them (`0x59` reads as 89 and becomes `0x89`).
pub fn pack_bcd(data: &mut [u8]) {
    for value in data.iter_mut() {
        *value = ((*value / 10) << 4) | (*value % 10);
    }
}

/// Errors that can occur while decoding the timekeeping registers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DateTimeError {
    /// A BCD nibble held a value above 9
    InvalidDigit,
    /// The decoded fields do not form a valid date and time
    InvalidDateTime,
}

/// Typed view of the seven timekeeping registers.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct DS1307DateTime {
    seconds: Seconds,
    minutes: Minutes,
    hours: Hours,
    #[allow(dead_code)]
    day: Day,
    date: DateOfMonth,
    month: Month,
    year: Year,
}

impl DS1307DateTime {
    fn digits(tens: u8, ones: u8) -> Result<u32, DateTimeError> {
        if tens > 9 || ones > 9 {
            return Err(DateTimeError::InvalidDigit);
        }
        Ok(10 * u32::from(tens) + u32::from(ones))
    }

    fn hour(&self) -> Result<u32, DateTimeError> {
        let hours = Self::digits(self.hours.ten_hours(), self.hours.hours())?;
        let hours = match self.hours.time_representation() {
            TimeRepresentation::TwentyFourHour => {
                hours + 20 * u32::from(self.hours.pm_or_twenty_hours())
            }
            TimeRepresentation::TwelveHour => {
                let is_pm = self.hours.pm_or_twenty_hours() != 0;
                match (hours, is_pm) {
                    (12, false) => 0,
                    (12, true) => 12,
                    (h, false) => h,
                    (h, true) => h + 12,
                }
            }
        };
        Ok(hours)
    }

    /// Decodes the registers into a `NaiveDateTime` in the years 2000-2099.
    ///
    /// The clock-halt bit is ignored and the day-of-week register is not
    /// cross-checked against the date.
    pub(crate) fn into_datetime(self) -> Result<NaiveDateTime, DateTimeError> {
        let seconds = Self::digits(self.seconds.ten_seconds(), self.seconds.seconds())?;
        let minutes = Self::digits(self.minutes.ten_minutes(), self.minutes.minutes())?;
        let hours = self.hour()?;
        debug!(
            "DS1307: raw_hour={:?} h={} m={} s={}",
            self.hours, hours, minutes, seconds
        );

        let year = Self::digits(self.year.ten_year(), self.year.year())?;
        let year = 2000_i32 + i32::try_from(year).map_err(|_| DateTimeError::InvalidDateTime)?;
        let month = Self::digits(self.month.ten_month(), self.month.month())?;
        let date = Self::digits(self.date.ten_date(), self.date.date())?;

        NaiveDate::from_ymd_opt(year, month, date)
            .and_then(|d| d.and_hms_opt(hours, minutes, seconds))
            .ok_or(DateTimeError::InvalidDateTime)
    }
}

impl From<[u8; DATETIME_REGISTERS]> for DS1307DateTime {
    fn from(data: [u8; DATETIME_REGISTERS]) -> Self {
        DS1307DateTime {
            seconds: Seconds::from(data[0]),
            minutes: Minutes::from(data[1]),
            hours: Hours::from(data[2]),
            day: Day::from(data[3]),
            date: DateOfMonth::from(data[4]),
            month: Month::from(data[5]),
            year: Year::from(data[6]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_pack_bcd_all_two_digit_values() {
        for v in 0u8..=99 {
            let mut data = [v];
            pack_bcd(&mut data);
            assert_eq!(data[0], (v / 10) * 16 + (v % 10), "value {}", v);
            assert!(data[0] >> 4 <= 9, "high nibble of {}", v);
            assert!(data[0] & 0x0F <= 9, "low nibble of {}", v);
        }
    }

    #[test]
    fn test_pack_bcd_buffer() {
        let mut data = [9, 59, 23];
        pack_bcd(&mut data);
        assert_eq!(data, [0x09, 0x59, 0x23]);
    }

    #[test]
    fn test_pack_bcd_is_not_idempotent() {
        let mut data = [9, 59, 23];
        pack_bcd(&mut data);
        pack_bcd(&mut data);
        // 0x09 is 9 either way, but 0x59 (89) and 0x23 (35) are re-encoded
        assert_eq!(data, [0x09, 0x89, 0x35]);
        assert_ne!(data, [0x09, 0x59, 0x23]);
    }

    #[test]
    fn test_pack_bcd_empty() {
        let mut data: [u8; 0] = [];
        pack_bcd(&mut data);
    }

    #[test]
    fn test_time_from_registers() {
        let time = Time::from([30, 45, 14]);
        assert_eq!(
            time,
            Time {
                hour: 14,
                minute: 45,
                second: 30
            }
        );
    }

    #[test]
    fn test_date_from_registers() {
        let date = Date::from([5, 14, 3, 24]);
        assert_eq!(date.weekday, 5);
        assert_eq!(date.day, 14);
        assert_eq!(date.month, 3);
        assert_eq!(date.year, 24);
    }

    #[test]
    fn test_from_reads_prefers_date_error() {
        let time = Time::from([30, 45, 14]);
        let result = DateTime::from_reads(Err("date"), Ok(time));
        assert_eq!(result, Err("date"));

        let result = DateTime::from_reads(Err("date"), Err::<Time, _>("time"));
        assert_eq!(result, Err("date"));

        let result = DateTime::from_reads(Ok(Date::default()), Err("time"));
        assert_eq!(result, Err("time"));

        let result = DateTime::from_reads::<&str>(Ok(Date::default()), Ok(time));
        assert_eq!(result.map(|dt| dt.time), Ok(time));
    }

    #[test]
    fn test_into_datetime_24_hour() {
        // 2024-03-14 15:30:07
        let raw = DS1307DateTime::from([0x07, 0x30, 0x15, 0x05, 0x14, 0x03, 0x24]);
        let dt = raw.into_datetime().unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 3);
        assert_eq!(dt.day(), 14);
        assert_eq!(dt.hour(), 15);
        assert_eq!(dt.minute(), 30);
        assert_eq!(dt.second(), 7);
    }

    #[test]
    fn test_into_datetime_twenty_hours() {
        let raw = DS1307DateTime::from([0x59, 0x59, 0x23, 0x01, 0x31, 0x12, 0x99]);
        let dt = raw.into_datetime().unwrap();
        assert_eq!(dt.year(), 2099);
        assert_eq!(dt.hour(), 23);
    }

    #[test]
    fn test_into_datetime_12_hour() {
        // 12 AM is midnight
        let raw = DS1307DateTime::from([0x00, 0x00, 0x52, 0x01, 0x01, 0x01, 0x00]);
        assert_eq!(raw.into_datetime().unwrap().hour(), 0);
        // 12 PM is noon
        let raw = DS1307DateTime::from([0x00, 0x00, 0x72, 0x01, 0x01, 0x01, 0x00]);
        assert_eq!(raw.into_datetime().unwrap().hour(), 12);
        // 8 PM
        let raw = DS1307DateTime::from([0x00, 0x00, 0x68, 0x01, 0x01, 0x01, 0x00]);
        assert_eq!(raw.into_datetime().unwrap().hour(), 20);
        // 8 AM
        let raw = DS1307DateTime::from([0x00, 0x00, 0x48, 0x01, 0x01, 0x01, 0x00]);
        assert_eq!(raw.into_datetime().unwrap().hour(), 8);
    }

    #[test]
    fn test_into_datetime_ignores_clock_halt() {
        let raw = DS1307DateTime::from([0x80 | 0x42, 0x00, 0x00, 0x01, 0x01, 0x01, 0x00]);
        assert_eq!(raw.into_datetime().unwrap().second(), 42);
    }

    #[test]
    fn test_into_datetime_invalid_month() {
        let raw = DS1307DateTime::from([0x00, 0x00, 0x00, 0x01, 0x01, 0x13, 0x24]);
        assert_eq!(raw.into_datetime(), Err(DateTimeError::InvalidDateTime));
    }

    #[test]
    fn test_into_datetime_invalid_digit() {
        // 0x0A is not a BCD digit
        let raw = DS1307DateTime::from([0x0A, 0x00, 0x00, 0x01, 0x01, 0x01, 0x24]);
        assert_eq!(raw.into_datetime(), Err(DateTimeError::InvalidDigit));
    }

    #[test]
    fn test_into_datetime_leap_day() {
        let raw = DS1307DateTime::from([0x00, 0x00, 0x00, 0x05, 0x29, 0x02, 0x24]);
        assert!(raw.into_datetime().is_ok());
        let raw = DS1307DateTime::from([0x00, 0x00, 0x00, 0x05, 0x29, 0x02, 0x23]);
        assert_eq!(raw.into_datetime(), Err(DateTimeError::InvalidDateTime));
    }
}
