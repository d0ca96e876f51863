//! A platform-agnostic driver for the DS1307 serial real-time clock.
//!
//! The driver talks to the chip through any [`embedded_hal::i2c::I2c`]
//! implementation and exposes:
//!
//! - device detection and square wave configuration ([`DS1307::init`])
//! - raw register reads and writes, including the 56 bytes of battery-backed RAM
//! - time, date and combined date/time accessors in two encodings
//! - a chrono [`NaiveDateTime`] decoded from the BCD registers
//!
//! An async variant of the driver lives in [`asynch`] behind the `async` feature.
//!
//! # Features
//!
//! - `async`: async driver over `embedded-hal-async`
//! - `log`: debug output through the `log` crate
//! - `defmt`: debug output through `defmt`, plus `defmt::Format` for public types
//!
//! # Example
//!
//! ```rust,ignore
//! use ds1307::{SquareWaveOutput, DEFAULT_ADDRESS, DS1307};
//!
//! let mut rtc = DS1307::new(i2c, DEFAULT_ADDRESS);
//! rtc.init(SquareWaveOutput::Hz1)?;
//! let now = rtc.datetime()?;
//! ```

#![no_std]

#[macro_use]
mod fmt;

mod datetime;
mod registers;

#[cfg(feature = "async")]
pub mod asynch;

use chrono::NaiveDateTime;
use embedded_hal::i2c::{Error as _, ErrorKind, I2c};
use paste::paste;

pub(crate) use datetime::{DS1307DateTime, DATETIME_REGISTERS, DATE_REGISTERS, TIME_REGISTERS};
pub use datetime::{pack_bcd, Date, DateTime, DateTimeError, Time};
pub use registers::*;

/// Outcome codes of a driver operation.
///
/// A flat result code for callers that report outcomes as a single value.
/// Use [`DS1307Error::status`] or [`Status::of`] to obtain one from a result.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    /// The operation completed
    Ok,
    /// Generic transport or decoding failure
    Error,
    /// The bus was in use by another controller
    Busy,
    /// The transport gave up waiting. `embedded-hal` has no timeout error
    /// kind, so bus errors never map to this code.
    Timeout,
    /// The device did not respond during initialization
    NotFound,
    /// A transfer exceeded [`MAX_TRANSFER_SIZE`]
    DataSize,
}

impl Status {
    /// Returns the status code for the result of a driver call.
    pub fn of<T, E: embedded_hal::i2c::Error>(result: &Result<T, DS1307Error<E>>) -> Self {
        match result {
            Ok(_) => Status::Ok,
            Err(e) => e.status(),
        }
    }
}

/// Errors reported by the driver.
///
/// `I2c` carries transport failures unchanged. The other variants are
/// conditions the driver itself detects or derives.
#[derive(Debug)]
pub enum DS1307Error<I2CE> {
    /// The I2C transaction failed
    I2c(I2CE),
    /// Clearing the clock-halt bit failed during [`DS1307::init`], so the
    /// device is treated as absent. The underlying bus error is kept.
    NotFound(I2CE),
    /// A register transfer was longer than [`MAX_TRANSFER_SIZE`]; nothing
    /// was sent on the bus.
    DataSize { requested: usize, max: usize },
    /// The timekeeping registers do not hold a valid date and time
    DateTime(DateTimeError),
}

impl<I2CE> From<I2CE> for DS1307Error<I2CE> {
    fn from(e: I2CE) -> Self {
        DS1307Error::I2c(e)
    }
}

impl<I2CE: embedded_hal::i2c::Error> DS1307Error<I2CE> {
    /// Maps the error onto a [`Status`] code.
    pub fn status(&self) -> Status {
        match self {
            DS1307Error::I2c(e) => match e.kind() {
                ErrorKind::ArbitrationLoss => Status::Busy,
                _ => Status::Error,
            },
            DS1307Error::NotFound(_) => Status::NotFound,
            DS1307Error::DataSize { .. } => Status::DataSize,
            DS1307Error::DateTime(_) => Status::Error,
        }
    }
}

/// Rejects transfers the driver's staging buffer cannot hold.
pub(crate) fn check_transfer_size<I2CE>(requested: usize) -> Result<(), DS1307Error<I2CE>> {
    if requested > MAX_TRANSFER_SIZE {
        warn!(
            "DS1307: transfer of {} bytes exceeds {}",
            requested, MAX_TRANSFER_SIZE
        );
        return Err(DS1307Error::DataSize {
            requested,
            max: MAX_TRANSFER_SIZE,
        });
    }
    Ok(())
}

/// Builds the bus payload for a register write: the register address
/// followed by the data. Returns the buffer and the number of bytes used.
pub(crate) fn stage_write<I2CE>(
    register: u8,
    data: &[u8],
) -> Result<([u8; MAX_TRANSFER_SIZE + 1], usize), DS1307Error<I2CE>> {
    check_transfer_size(data.len())?;
    let mut buffer = [0u8; MAX_TRANSFER_SIZE + 1];
    buffer[0] = register;
    buffer[1..=data.len()].copy_from_slice(data);
    Ok((buffer, data.len() + 1))
}

/// Logs the square wave setting read back during initialization.
pub(crate) fn report_control(requested: SquareWaveOutput, control: Control) {
    match control.square_wave_output() {
        Some(SquareWaveOutput::Hz1) => {
            debug!("DS1307: 1 Hz square wave output selected");
        }
        Some(SquareWaveOutput::Hz4096) => {
            debug!("DS1307: 4.096 kHz square wave output selected");
        }
        Some(SquareWaveOutput::Hz8192) => {
            debug!("DS1307: 8.192 kHz square wave output selected");
        }
        Some(SquareWaveOutput::Hz32768) => {
            debug!("DS1307: 32.768 kHz square wave output selected");
        }
        Some(SquareWaveOutput::DisabledHigh) => {
            debug!("DS1307: no square wave, SQW/OUT held high");
        }
        Some(SquareWaveOutput::DisabledLow) => {
            debug!("DS1307: no square wave, SQW/OUT held low");
        }
        None => {
            warn!("DS1307: unsupported control value {:?}", control);
        }
    }
    if control.square_wave_output() != Some(requested) {
        warn!(
            "DS1307: control read back {:?}, expected {:?}",
            control, requested
        );
    }
}

/// DS1307 Real-Time Clock driver.
///
/// Owns the I2C bus handle for its lifetime; use [`DS1307::release`] to get
/// it back. The driver keeps no other state, and is not meant to be shared
/// between execution contexts without external locking.
pub struct DS1307<I2C: I2c> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> DS1307<I2C> {
    /// Creates a new DS1307 driver instance.
    ///
    /// # Arguments
    /// * `i2c` - The I2C bus implementation
    /// * `address` - The I2C address of the device (always [`DEFAULT_ADDRESS`] on real parts)
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Consumes the driver and returns the I2C bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Detects the device, starts the oscillator and configures SQW/OUT.
    ///
    /// Writes zero to the seconds register, which clears the clock-halt bit
    /// (and resets the seconds count). If that write fails the device is
    /// reported as [`DS1307Error::NotFound`]. The square wave configuration
    /// is then written to the control register and read back.
    ///
    /// # Returns
    /// * `Ok(Control)` - The control register as read back from the device.
    ///   A read-back that differs from `output` is logged but is not an error.
    /// * `Err(DS1307Error)` on error
    pub fn init(&mut self, output: SquareWaveOutput) -> Result<Control, DS1307Error<I2C::Error>> {
        let mut seconds = Seconds::default();
        seconds.set_clock_halt(false);
        self.i2c
            .write(self.address, &[RegAddr::Seconds as u8, seconds.into()])
            .map_err(|e| {
                warn!("DS1307: no device found at address {}", self.address);
                DS1307Error::NotFound(e)
            })?;

        debug!("DS1307: writing control: {:?}", output);
        self.set_control(output.into())?;
        let control = self.control()?;
        report_control(output, control);
        Ok(control)
    }

    /// Reads `data.len()` consecutive registers starting at `register`.
    ///
    /// The whole range is fetched in one I2C transaction.
    ///
    /// # Returns
    /// * `Ok(())` with `data` filled on success
    /// * `Err(DS1307Error::DataSize)` if `data` is longer than [`MAX_TRANSFER_SIZE`]
    /// * `Err(DS1307Error::I2c)` on bus error
    pub fn read_register(
        &mut self,
        register: u8,
        data: &mut [u8],
    ) -> Result<(), DS1307Error<I2C::Error>> {
        check_transfer_size(data.len())?;
        self.i2c.write_read(self.address, &[register], data)?;
        Ok(())
    }

    /// Writes `data` to consecutive registers starting at `register`.
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(DS1307Error::DataSize)` if `data` is longer than [`MAX_TRANSFER_SIZE`]
    /// * `Err(DS1307Error::I2c)` on bus error
    pub fn write_register(
        &mut self,
        register: u8,
        data: &[u8],
    ) -> Result<(), DS1307Error<I2C::Error>> {
        let (buffer, len) = stage_write(register, data)?;
        self.i2c.write(self.address, &buffer[..len])?;
        Ok(())
    }

    /// Reads seconds, minutes and hours as stored in the registers.
    ///
    /// No decoding is applied: the chip stores these values as BCD, so the
    /// fields hold BCD bytes (and the clock-halt bit in `second`).
    pub fn time_binary(&mut self) -> Result<Time, DS1307Error<I2C::Error>> {
        let mut data = [0; TIME_REGISTERS];
        self.read_register(RegAddr::Seconds as u8, &mut data)?;
        let time = Time::from(data);
        debug!("DS1307: time {:?}", time);
        Ok(time)
    }

    /// Reads seconds, minutes and hours and runs them through [`pack_bcd`].
    ///
    /// The register bytes are packed as if they were binary, so BCD register
    /// contents get encoded a second time rather than decoded. Use [`DS1307::datetime`] for decoded values.
    pub fn time_bcd(&mut self) -> Result<Time, DS1307Error<I2C::Error>> {
        let mut data = [0; TIME_REGISTERS];
        self.read_register(RegAddr::Seconds as u8, &mut data)?;
        pack_bcd(&mut data);
        let time = Time::from(data);
        debug!("DS1307: time {:?}", time);
        Ok(time)
    }

    /// Reads weekday, date, month and year as stored in the registers.
    pub fn date_binary(&mut self) -> Result<Date, DS1307Error<I2C::Error>> {
        let mut data = [0; DATE_REGISTERS];
        self.read_register(RegAddr::Day as u8, &mut data)?;
        let date = Date::from(data);
        debug!("DS1307: date {:?}", date);
        Ok(date)
    }

    /// Reads weekday, date, month and year and runs them through [`pack_bcd`].
    ///
    /// See [`DS1307::time_bcd`] for how this treats BCD register contents.
    pub fn date_bcd(&mut self) -> Result<Date, DS1307Error<I2C::Error>> {
        let mut data = [0; DATE_REGISTERS];
        self.read_register(RegAddr::Day as u8, &mut data)?;
        pack_bcd(&mut data);
        let date = Date::from(data);
        debug!("DS1307: date {:?}", date);
        Ok(date)
    }

    /// Reads the date and then the time with [`DS1307::date_binary`] and
    /// [`DS1307::time_binary`].
    ///
    /// Both reads are always issued. If the date read fails its error is
    /// returned even when the time read succeeds. The reads are not atomic;
    /// see [`DateTime`].
    pub fn datetime_binary(&mut self) -> Result<DateTime, DS1307Error<I2C::Error>> {
        let date = self.date_binary();
        let time = self.time_binary();
        DateTime::from_reads(date, time)
    }

    /// Reads the date and then the time with [`DS1307::date_bcd`] and
    /// [`DS1307::time_bcd`], with the same error handling as
    /// [`DS1307::datetime_binary`].
    pub fn datetime_bcd(&mut self) -> Result<DateTime, DS1307Error<I2C::Error>> {
        let date = self.date_bcd();
        let time = self.time_bcd();
        DateTime::from_reads(date, time)
    }

    /// Reads all seven timekeeping registers in one transaction and decodes
    /// them into a `NaiveDateTime` (years 2000-2099).
    ///
    /// # Returns
    /// * `Ok(NaiveDateTime)` - The current date and time
    /// * `Err(DS1307Error::DateTime)` if the registers do not hold a valid date
    /// * `Err(DS1307Error::I2c)` on bus error
    pub fn datetime(&mut self) -> Result<NaiveDateTime, DS1307Error<I2C::Error>> {
        let mut data = [0; DATETIME_REGISTERS];
        self.read_register(RegAddr::Seconds as u8, &mut data)?;
        DS1307DateTime::from(data)
            .into_datetime()
            .map_err(DS1307Error::DateTime)
    }

    /// Returns `true` when the oscillator is running (clock-halt bit clear).
    pub fn is_running(&mut self) -> Result<bool, DS1307Error<I2C::Error>> {
        Ok(!self.second()?.clock_halt())
    }

    /// Writes the control register.
    pub fn set_control(&mut self, value: Control) -> Result<(), DS1307Error<I2C::Error>> {
        self.i2c
            .write(self.address, &[RegAddr::Control as u8, value.into()])?;
        Ok(())
    }
}

// Single register getters
macro_rules! impl_register_access {
    ($(($name:ident, $regaddr:expr, $typ:ty)),+) => {
        impl<I2C: I2c> DS1307<I2C> {
            $(
                paste! {
                    #[doc = concat!("Gets the value of the ", stringify!($name), " register.")]
                    #[doc = "\n\n# Returns"]
                    #[doc = concat!("* `Ok(", stringify!($typ), ")` - The register value on success")]
                    #[doc = "* `Err(DS1307Error)` on error"]
                    pub fn $name(&mut self) -> Result<$typ, DS1307Error<I2C::Error>> {
                        let mut data = [0];
                        self.i2c
                            .write_read(self.address, &[$regaddr as u8], &mut data)?;
                        Ok(<$typ>::from(data[0]))
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
    (day, RegAddr::Day, Day),
    (date, RegAddr::Date, DateOfMonth),
    (month, RegAddr::Month, Month),
    (year, RegAddr::Year, Year),
    (control, RegAddr::Control, Control)
);
