//! Register definitions and bitfield structures for the DS1307 RTC.
//!
//! This module contains the register address map, bit definitions and the
//! enumerated configuration values used when talking to the DS1307 over I2C.
//!
//! # Register Map
//!
//! | Address     | Contents                                      |
//! |-------------|-----------------------------------------------|
//! | 0x00..=0x06 | seconds, minutes, hours, day, date, month, year |
//! | 0x07        | control (square-wave output)                  |
//! | 0x08..=0x3F | 56 bytes of battery-backed RAM                |

use bitfield::bitfield;

/// Fixed 7-bit I2C address of the DS1307.
pub const DEFAULT_ADDRESS: u8 = 0x68;

/// Largest number of bytes moved by a single register read or write.
pub const MAX_TRANSFER_SIZE: usize = 64;

/// First address of the battery-backed RAM.
pub const RAM_START: u8 = 0x08;
/// Last address of the battery-backed RAM.
pub const RAM_END: u8 = 0x3F;
/// Size of the battery-backed RAM in bytes.
pub const RAM_SIZE: usize = (RAM_END - RAM_START) as usize + 1;

/// Register addresses for the DS1307 RTC.
#[allow(unused)]
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegAddr {
    /// Seconds register (0-59) and clock-halt bit
    Seconds = 0x00,
    /// Minutes register (0-59)
    Minutes = 0x01,
    /// Hours register (1-12 + AM/PM or 0-23)
    Hours = 0x02,
    /// Day of week register (1-7)
    Day = 0x03,
    /// Date register (1-31)
    Date = 0x04,
    /// Month register (1-12)
    Month = 0x05,
    /// Year register (0-99)
    Year = 0x06,
    /// Control register
    Control = 0x07,
    /// First byte of battery-backed RAM
    Ram = 0x08,
}

/// Time representation format for the DS1307.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeRepresentation {
    /// 24-hour format (0-23)
    TwentyFourHour = 0,
    /// 12-hour format (1-12 + AM/PM)
    TwelveHour = 1,
}
impl From<u8> for TimeRepresentation {
    /// Creates a `TimeRepresentation` from the 12/24 bit of the hours register.
    ///
    /// Only bit 0 is considered, so every value maps to a variant.
    fn from(v: u8) -> Self {
        if v & 0x01 == 0 {
            TimeRepresentation::TwentyFourHour
        } else {
            TimeRepresentation::TwelveHour
        }
    }
}
impl From<TimeRepresentation> for u8 {
    fn from(v: TimeRepresentation) -> Self {
        v as u8
    }
}

/// Square wave output configuration.
///
/// Each variant is the exact byte written to the control register.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SquareWaveOutput {
    /// 1 Hz square wave output
    Hz1 = 0x10,
    /// 4.096 kHz square wave output
    Hz4096 = 0x11,
    /// 8.192 kHz square wave output
    Hz8192 = 0x12,
    /// 32.768 kHz square wave output
    Hz32768 = 0x13,
    /// No square wave, SQW/OUT pin held high
    DisabledHigh = 0x80,
    /// No square wave, SQW/OUT pin held low
    DisabledLow = 0x00,
}
impl TryFrom<u8> for SquareWaveOutput {
    type Error = u8;

    /// Decodes a control register byte, returning the byte itself when it is
    /// not one of the six legal patterns.
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0x10 => Ok(SquareWaveOutput::Hz1),
            0x11 => Ok(SquareWaveOutput::Hz4096),
            0x12 => Ok(SquareWaveOutput::Hz8192),
            0x13 => Ok(SquareWaveOutput::Hz32768),
            0x80 => Ok(SquareWaveOutput::DisabledHigh),
            0x00 => Ok(SquareWaveOutput::DisabledLow),
            _ => Err(v),
        }
    }
}
impl From<SquareWaveOutput> for u8 {
    fn from(v: SquareWaveOutput) -> Self {
        v as u8
    }
}

/// Day of the week as numbered by the DS1307 (Sunday first).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Weekday {
    Sunday = 1,
    Monday = 2,
    Tuesday = 3,
    Wednesday = 4,
    Thursday = 5,
    Friday = 6,
    Saturday = 7,
}
impl TryFrom<u8> for Weekday {
    type Error = u8;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Weekday::Sunday),
            2 => Ok(Weekday::Monday),
            3 => Ok(Weekday::Tuesday),
            4 => Ok(Weekday::Wednesday),
            5 => Ok(Weekday::Thursday),
            6 => Ok(Weekday::Friday),
            7 => Ok(Weekday::Saturday),
            _ => Err(v),
        }
    }
}
impl From<Weekday> for u8 {
    fn from(v: Weekday) -> Self {
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
    /// Seconds register (0-59) with BCD encoding and the clock-halt flag.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Seconds(u8);
    impl Debug;
    /// Clock halt; the oscillator is stopped while set
    pub clock_halt, set_clock_halt: 7;
    /// Tens place of seconds (0-5)
    pub ten_seconds, set_ten_seconds: 6, 4;
    /// Ones place of seconds (0-9)
    pub seconds, set_seconds: 3, 0;
}
from_register_u8!(Seconds);

#[cfg(feature = "defmt")]
impl defmt::Format for Seconds {
    fn format(&self, f: defmt::Formatter) {
        let seconds = 10 * self.ten_seconds() + self.seconds();
        defmt::write!(f, "Seconds({}s", seconds);
        if self.clock_halt() {
            defmt::write!(f, ", halted");
        }
        defmt::write!(f, ")");
    }
}

bitfield! {
    /// Minutes register (0-59) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Minutes(u8);
    impl Debug;
    /// Tens place of minutes (0-5)
    pub ten_minutes, set_ten_minutes: 6, 4;
    /// Ones place of minutes (0-9)
    pub minutes, set_minutes: 3, 0;
}
from_register_u8!(Minutes);

#[cfg(feature = "defmt")]
impl defmt::Format for Minutes {
    fn format(&self, f: defmt::Formatter) {
        let minutes = 10 * self.ten_minutes() + self.minutes();
        defmt::write!(f, "Minutes({}m)", minutes);
    }
}

bitfield! {
    /// Hours register with BCD encoding, 12/24-hour aware.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Hours(u8);
    impl Debug;
    /// 12/24 hour select
    pub from into TimeRepresentation, time_representation, set_time_representation: 6, 6;
    /// PM flag in 12-hour mode, twenty-hours digit in 24-hour mode
    pub pm_or_twenty_hours, set_pm_or_twenty_hours: 5, 5;
    /// Tens place of hours
    pub ten_hours, set_ten_hours: 4, 4;
    /// Ones place of hours (0-9)
    pub hours, set_hours: 3, 0;
}
from_register_u8!(Hours);

#[cfg(feature = "defmt")]
impl defmt::Format for Hours {
    fn format(&self, f: defmt::Formatter) {
        match self.time_representation() {
            TimeRepresentation::TwentyFourHour => {
                let hours = 20 * self.pm_or_twenty_hours() + 10 * self.ten_hours() + self.hours();
                defmt::write!(f, "Hours({}h 24h)", hours);
            }
            TimeRepresentation::TwelveHour => {
                let hours = 10 * self.ten_hours() + self.hours();
                let is_pm = self.pm_or_twenty_hours() != 0;
                defmt::write!(f, "Hours({}h {})", hours, if is_pm { "PM" } else { "AM" });
            }
        }
    }
}

bitfield! {
    /// Day of week register (1-7).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Day(u8);
    impl Debug;
    /// Day of week (1-7)
    pub day, set_day: 2, 0;
}
from_register_u8!(Day);

#[cfg(feature = "defmt")]
impl defmt::Format for Day {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Day({})", self.day());
    }
}

bitfield! {
    /// Date (day of month) register (1-31) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct DateOfMonth(u8);
    impl Debug;
    /// Tens place of date (0-3)
    pub ten_date, set_ten_date: 5, 4;
    /// Ones place of date (0-9)
    pub date, set_date: 3, 0;
}
from_register_u8!(DateOfMonth);

#[cfg(feature = "defmt")]
impl defmt::Format for DateOfMonth {
    fn format(&self, f: defmt::Formatter) {
        let date = 10 * self.ten_date() + self.date();
        defmt::write!(f, "DateOfMonth({})", date);
    }
}

bitfield! {
    /// Month register (1-12) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Month(u8);
    impl Debug;
    /// Tens place of month (0-1)
    pub ten_month, set_ten_month: 4, 4;
    /// Ones place of month (0-9)
    pub month, set_month: 3, 0;
}
from_register_u8!(Month);

#[cfg(feature = "defmt")]
impl defmt::Format for Month {
    fn format(&self, f: defmt::Formatter) {
        let month = 10 * self.ten_month() + self.month();
        defmt::write!(f, "Month({})", month);
    }
}

bitfield! {
    /// Year register (0-99) with BCD encoding.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Year(u8);
    impl Debug;
    /// Tens place of year (0-9)
    pub ten_year, set_ten_year: 7, 4;
    /// Ones place of year (0-9)
    pub year, set_year: 3, 0;
}
from_register_u8!(Year);

#[cfg(feature = "defmt")]
impl defmt::Format for Year {
    fn format(&self, f: defmt::Formatter) {
        let year = 10 * self.ten_year() + self.year();
        defmt::write!(f, "Year({})", year);
    }
}

bitfield! {
    /// Control register driving the SQW/OUT pin.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Control(u8);
    impl Debug;
    /// Output level of SQW/OUT while the square wave is disabled
    pub out, set_out: 7;
    /// Square wave enable
    pub square_wave_enable, set_square_wave_enable: 4;
    /// Rate select (RS1..RS0)
    pub rate_select, set_rate_select: 1, 0;
}
from_register_u8!(Control);

impl Control {
    /// Decodes the register into one of the supported square wave settings.
    ///
    /// Returns `None` when the register holds a bit pattern the driver never
    /// writes (for example OUT set together with SQWE).
    pub fn square_wave_output(&self) -> Option<SquareWaveOutput> {
        SquareWaveOutput::try_from(self.0).ok()
    }
}

impl From<SquareWaveOutput> for Control {
    fn from(v: SquareWaveOutput) -> Self {
        Control(v.into())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Control {
    fn format(&self, f: defmt::Formatter) {
        match self.square_wave_output() {
            Some(SquareWaveOutput::Hz1) => defmt::write!(f, "1 Hz square wave"),
            Some(SquareWaveOutput::Hz4096) => defmt::write!(f, "4.096 kHz square wave"),
            Some(SquareWaveOutput::Hz8192) => defmt::write!(f, "8.192 kHz square wave"),
            Some(SquareWaveOutput::Hz32768) => defmt::write!(f, "32.768 kHz square wave"),
            Some(SquareWaveOutput::DisabledHigh) => defmt::write!(f, "No square wave, pin high"),
            Some(SquareWaveOutput::DisabledLow) => defmt::write!(f, "No square wave, pin low"),
            None => defmt::write!(f, "Unsupported control value {=u8:x}", self.0),
        }
    }
}
