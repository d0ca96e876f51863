//! Async implementation of the DS1307 driver.
//!
//! This module provides an async interface to the DS1307 RTC device using
//! `embedded-hal-async` traits. It is only available when the `async` feature
//! is enabled. The operations and their error handling match the blocking
//! [`crate::DS1307`].
//!
//! # Example
//!
//! ```rust,ignore
//! use ds1307::asynch::DS1307;
//!
//! // Initialize device
//! let mut rtc = DS1307::new(i2c, 0x68);
//! rtc.init(SquareWaveOutput::Hz1).await?;
//!
//! // Get current date/time asynchronously
//! let datetime = rtc.datetime().await?;
//! ```

use chrono::NaiveDateTime;
use embedded_hal_async::i2c::I2c;
use paste::paste;

use crate::{
    check_transfer_size, pack_bcd, report_control, stage_write, Control, DS1307DateTime,
    DS1307Error, Date, DateOfMonth, DateTime, Day, Hours, Minutes, Month, RegAddr, Seconds,
    SquareWaveOutput, Time, Year, DATETIME_REGISTERS, DATE_REGISTERS, TIME_REGISTERS,
};

/// DS1307 Real-Time Clock async driver.
///
/// This struct provides the async interface to the DS1307 RTC device.
/// It supports async I2C operations through the `embedded-hal-async` traits.
pub struct DS1307<I2C: I2c> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> DS1307<I2C> {
    /// Creates a new DS1307 async driver instance.
    ///
    /// # Arguments
    /// * `i2c` - The async I2C bus implementation
    /// * `address` - The I2C address of the device (typically 0x68)
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Consumes the driver and returns the I2C bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Detects the device, starts the oscillator and configures SQW/OUT.
    ///
    /// See [`crate::DS1307::init`].
    pub async fn init(
        &mut self,
        output: SquareWaveOutput,
    ) -> Result<Control, DS1307Error<I2C::Error>> {
        let mut seconds = Seconds::default();
        seconds.set_clock_halt(false);
        if let Err(e) = self
            .i2c
            .write(self.address, &[RegAddr::Seconds as u8, seconds.into()])
            .await
        {
            warn!("DS1307: no device found at address {}", self.address);
            return Err(DS1307Error::NotFound(e));
        }

        debug!("DS1307: writing control: {:?}", output);
        self.set_control(output.into()).await?;
        let control = self.control().await?;
        report_control(output, control);
        Ok(control)
    }

    /// Reads `data.len()` consecutive registers starting at `register`.
    ///
    /// # Returns
    /// * `Ok(())` with `data` filled on success
    /// * `Err(DS1307Error::DataSize)` if `data` is longer than [`crate::MAX_TRANSFER_SIZE`]
    /// * `Err(DS1307Error::I2c)` on bus error
    pub async fn read_register(
        &mut self,
        register: u8,
        data: &mut [u8],
    ) -> Result<(), DS1307Error<I2C::Error>> {
        check_transfer_size(data.len())?;
        self.i2c.write_read(self.address, &[register], data).await?;
        Ok(())
    }

    /// Writes `data` to consecutive registers starting at `register`.
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(DS1307Error::DataSize)` if `data` is longer than [`crate::MAX_TRANSFER_SIZE`]
    /// * `Err(DS1307Error::I2c)` on bus error
    pub async fn write_register(
        &mut self,
        register: u8,
        data: &[u8],
    ) -> Result<(), DS1307Error<I2C::Error>> {
        let (buffer, len) = stage_write(register, data)?;
        self.i2c.write(self.address, &buffer[..len]).await?;
        Ok(())
    }

    /// Reads seconds, minutes and hours as stored in the registers.
    pub async fn time_binary(&mut self) -> Result<Time, DS1307Error<I2C::Error>> {
        let mut data = [0; TIME_REGISTERS];
        self.read_register(RegAddr::Seconds as u8, &mut data).await?;
        Ok(Time::from(data))
    }

    /// Reads seconds, minutes and hours and runs them through [`pack_bcd`].
    ///
    /// See [`crate::DS1307::time_bcd`] for how this treats BCD register contents.
    pub async fn time_bcd(&mut self) -> Result<Time, DS1307Error<I2C::Error>> {
        let mut data = [0; TIME_REGISTERS];
        self.read_register(RegAddr::Seconds as u8, &mut data).await?;
        pack_bcd(&mut data);
        Ok(Time::from(data))
    }

    /// Reads weekday, date, month and year as stored in the registers.
    pub async fn date_binary(&mut self) -> Result<Date, DS1307Error<I2C::Error>> {
        let mut data = [0; DATE_REGISTERS];
        self.read_register(RegAddr::Day as u8, &mut data).await?;
        Ok(Date::from(data))
    }

    /// Reads weekday, date, month and year and runs them through [`pack_bcd`].
    pub async fn date_bcd(&mut self) -> Result<Date, DS1307Error<I2C::Error>> {
        let mut data = [0; DATE_REGISTERS];
        self.read_register(RegAddr::Day as u8, &mut data).await?;
        pack_bcd(&mut data);
        Ok(Date::from(data))
    }

    /// Reads the date and then the time; a date error is never masked by a
    /// successful time read.
    pub async fn datetime_binary(&mut self) -> Result<DateTime, DS1307Error<I2C::Error>> {
        let date = self.date_binary().await;
        let time = self.time_binary().await;
        DateTime::from_reads(date, time)
    }

    /// BCD-packed variant of [`DS1307::datetime_binary`].
    pub async fn datetime_bcd(&mut self) -> Result<DateTime, DS1307Error<I2C::Error>> {
        let date = self.date_bcd().await;
        let time = self.time_bcd().await;
        DateTime::from_reads(date, time)
    }

    /// Gets the current date and time decoded from the BCD registers.
    ///
    /// # Returns
    /// * `Ok(NaiveDateTime)` - The current date and time
    /// * `Err(DS1307Error)` on error
    pub async fn datetime(&mut self) -> Result<NaiveDateTime, DS1307Error<I2C::Error>> {
        let mut data = [0; DATETIME_REGISTERS];
        self.read_register(RegAddr::Seconds as u8, &mut data)
            .await?;
        DS1307DateTime::from(data)
            .into_datetime()
            .map_err(DS1307Error::DateTime)
    }

    /// Returns `true` when the oscillator is running (clock-halt bit clear).
    pub async fn is_running(&mut self) -> Result<bool, DS1307Error<I2C::Error>> {
        Ok(!self.second().await?.clock_halt())
    }

    /// Writes the control register.
    pub async fn set_control(&mut self, value: Control) -> Result<(), DS1307Error<I2C::Error>> {
        self.i2c
            .write(self.address, &[RegAddr::Control as u8, value.into()])
            .await?;
        Ok(())
    }
}

// Register access implementations
macro_rules! impl_register_access {
    ($(($name:ident, $regaddr:expr, $typ:ty)),+) => {
        impl<I2C: I2c> DS1307<I2C> {
            $(
                paste! {
                    #[doc = concat!("Gets the value of the ", stringify!($name), " register.")]
                    #[doc = "\n\n# Returns"]
                    #[doc = concat!("* `Ok(", stringify!($typ), ")` - The register value on success")]
                    #[doc = "* `Err(DS1307Error)` on error"]
                    pub async fn $name(&mut self) -> Result<$typ, DS1307Error<I2C::Error>> {
                        let mut data = [0];
                        self.i2c
                            .write_read(self.address, &[$regaddr as u8], &mut data)
                            .await?;
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

#[cfg(test)]
mod tests {
    extern crate alloc;
    use super::*;
    use crate::{Status, MAX_TRANSFER_SIZE};
    use alloc::vec;
    use chrono::{Datelike, Timelike};
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};

    const DEVICE_ADDRESS: u8 = 0x68;

    async fn setup_mock(expectations: &[I2cTrans]) -> I2cMock {
        I2cMock::new(expectations)
    }

    #[tokio::test]
    async fn test_async_init() {
        let mock = setup_mock(&[
            I2cTrans::write(DEVICE_ADDRESS, vec![RegAddr::Seconds as u8, 0x00]),
            I2cTrans::write(DEVICE_ADDRESS, vec![RegAddr::Control as u8, 0x12]),
            I2cTrans::write_read(DEVICE_ADDRESS, vec![RegAddr::Control as u8], vec![0x12]),
        ])
        .await;
        let mut dev = DS1307::new(mock, DEVICE_ADDRESS);

        let control = dev.init(SquareWaveOutput::Hz8192).await.unwrap();
        assert_eq!(
            control.square_wave_output(),
            Some(SquareWaveOutput::Hz8192)
        );
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_init_not_found() {
        let mock = setup_mock(&[I2cTrans::write(
            DEVICE_ADDRESS,
            vec![RegAddr::Seconds as u8, 0x00],
        )
        .with_error(ErrorKind::Other)])
        .await;
        let mut dev = DS1307::new(mock, DEVICE_ADDRESS);

        let result = dev.init(SquareWaveOutput::Hz1).await;
        assert!(matches!(result, Err(DS1307Error::NotFound(ErrorKind::Other))));
        assert_eq!(Status::of(&result), Status::NotFound);
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_write_register_too_long() {
        let mock = setup_mock(&[]).await;
        let mut dev = DS1307::new(mock, DEVICE_ADDRESS);

        let data = [0u8; MAX_TRANSFER_SIZE + 1];
        let result = dev.write_register(0x08, &data).await;
        assert!(matches!(result, Err(DS1307Error::DataSize { .. })));
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_read_write_register() {
        let mock = setup_mock(&[
            I2cTrans::write(DEVICE_ADDRESS, vec![0x08, 0x01, 0x02]),
            I2cTrans::write_read(DEVICE_ADDRESS, vec![0x08], vec![0x01, 0x02]),
        ])
        .await;
        let mut dev = DS1307::new(mock, DEVICE_ADDRESS);

        dev.write_register(0x08, &[0x01, 0x02]).await.unwrap();
        let mut data = [0u8; 2];
        dev.read_register(0x08, &mut data).await.unwrap();
        assert_eq!(data, [0x01, 0x02]);
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_time_binary_and_bcd() {
        let mock = setup_mock(&[
            I2cTrans::write_read(
                DEVICE_ADDRESS,
                vec![RegAddr::Seconds as u8],
                vec![30, 45, 14],
            ),
            I2cTrans::write_read(
                DEVICE_ADDRESS,
                vec![RegAddr::Seconds as u8],
                vec![0x30, 0x45, 0x14],
            ),
        ])
        .await;
        let mut dev = DS1307::new(mock, DEVICE_ADDRESS);

        let time = dev.time_binary().await.unwrap();
        assert_eq!((time.hour, time.minute, time.second), (14, 45, 30));
        let time = dev.time_bcd().await.unwrap();
        assert_eq!((time.hour, time.minute, time.second), (0x20, 0x69, 0x48));
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_datetime_binary_reports_date_failure() {
        let mock = setup_mock(&[
            I2cTrans::write_read(DEVICE_ADDRESS, vec![RegAddr::Day as u8], vec![0, 0, 0, 0])
                .with_error(ErrorKind::Bus),
            I2cTrans::write_read(
                DEVICE_ADDRESS,
                vec![RegAddr::Seconds as u8],
                vec![30, 45, 14],
            ),
        ])
        .await;
        let mut dev = DS1307::new(mock, DEVICE_ADDRESS);

        let result = dev.datetime_binary().await;
        assert!(matches!(result, Err(DS1307Error::I2c(ErrorKind::Bus))));
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_datetime_bcd() {
        let mock = setup_mock(&[
            I2cTrans::write_read(DEVICE_ADDRESS, vec![RegAddr::Day as u8], vec![1, 31, 12, 99]),
            I2cTrans::write_read(
                DEVICE_ADDRESS,
                vec![RegAddr::Seconds as u8],
                vec![59, 59, 23],
            ),
        ])
        .await;
        let mut dev = DS1307::new(mock, DEVICE_ADDRESS);

        let dt = dev.datetime_bcd().await.unwrap();
        assert_eq!(dt.date.day, 0x31);
        assert_eq!(dt.date.year, 0x99);
        assert_eq!(dt.time.hour, 0x23);
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_read_datetime() {
        // 2024-03-14 15:30:00
        let datetime_registers = [
            0x00, // seconds
            0x30, // minutes
            0x15, // hours (24-hour mode)
            0x05, // day (Thursday)
            0x14, // date
            0x03, // month
            0x24, // year
        ];

        let mock = setup_mock(&[I2cTrans::write_read(
            DEVICE_ADDRESS,
            vec![RegAddr::Seconds as u8],
            datetime_registers.to_vec(),
        )])
        .await;
        let mut dev = DS1307::new(mock, DEVICE_ADDRESS);

        let dt = dev.datetime().await.unwrap();
        assert_eq!(dt.hour(), 15);
        assert_eq!(dt.minute(), 30);
        assert_eq!(dt.second(), 0);
        assert_eq!(dt.day(), 14);
        assert_eq!(dt.month(), 3);
        assert_eq!(dt.year(), 2024);
        dev.i2c.done();
    }

    #[tokio::test]
    async fn test_async_is_running() {
        let mock = setup_mock(&[I2cTrans::write_read(
            DEVICE_ADDRESS,
            vec![RegAddr::Seconds as u8],
            vec![0x80],
        )])
        .await;
        let mut dev = DS1307::new(mock, DEVICE_ADDRESS);

        assert!(!dev.is_running().await.unwrap());
        dev.i2c.done();
    }
}
