//! The interface every sensor driver implements, and the bus/pin plumbing
//! the drivers share.
// Each driver uses a different subset of the shared plumbing.
#![cfg_attr(
    not(all(
        feature = "gc2607",
        feature = "sc202cs",
        feature = "sc035hgs",
        feature = "mira220",
        feature = "pivariety"
    )),
    allow(dead_code)
)]

use embedded_hal::{delay::DelayNs, digital::OutputPin, i2c::I2c};
use fugit::{HertzU32, MillisDurationU32};

use crate::{
    error::Error,
    format::{pid_from_bytes, Capability, Port, SensorFormat, SensorId},
    param::{ParamDesc, ParamId, ParamValue},
    power::PowerControl,
    program::{RegList, RegValue},
    sccb::Sccb,
    xclk::XclkGenerator,
};

/// Common operations of a camera sensor driver.
pub trait CameraSensor {
    type Error;

    fn name(&self) -> &'static str;

    /// Id read at detect time.
    fn id(&self) -> SensorId;

    fn port(&self) -> Port;

    fn query_para_desc(&self, id: ParamId) -> Result<ParamDesc, Self::Error>;

    fn get_para_value(&self, id: ParamId) -> Result<ParamValue, Self::Error>;

    fn set_para_value(&mut self, value: ParamValue) -> Result<(), Self::Error>;

    fn query_support_formats(&self) -> &'static [SensorFormat];

    fn query_support_capability(&self) -> Capability;

    /// Program a mode. `None` selects the configured default mode.
    fn set_format(&mut self, format: Option<&'static SensorFormat>) -> Result<(), Self::Error>;

    fn get_format(&self) -> &'static SensorFormat;

    /// Pulse the reset line.
    fn hw_reset(&mut self) -> Result<(), Self::Error>;

    fn soft_reset(&mut self) -> Result<(), Self::Error>;

    fn set_register(&mut self, reg: u16, value: u32) -> Result<(), Self::Error>;

    fn get_register(&mut self, reg: u16) -> Result<u32, Self::Error>;

    fn set_stream(&mut self, on: bool) -> Result<(), Self::Error>;

    fn stream_status(&self) -> bool;

    fn set_test_pattern(&mut self, on: bool) -> Result<(), Self::Error>;

    /// Read the id registers again.
    fn chip_id(&mut self) -> Result<SensorId, Self::Error>;
}

/// Board level settings of one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorConfig {
    /// 7-bit SCCB address
    pub sccb_addr: u8,
    /// Index into the sensor's format table used when no format is given
    pub format_index: usize,
}

impl SensorConfig {
    pub const fn new(sccb_addr: u8, format_index: usize) -> Self {
        Self { sccb_addr, format_index }
    }

    pub const fn with_format_index(self, format_index: usize) -> Self {
        Self { format_index, ..self }
    }

    pub(crate) fn default_format<E>(&self, formats: &'static [SensorFormat]) -> Result<&'static SensorFormat, Error<E>> {
        formats.get(self.format_index).ok_or(Error::InvalidArgument)
    }

    /// The requested mode if it is an entry of `formats`, the configured
    /// default for `None`.
    pub(crate) fn select_format<E>(
        &self,
        requested: Option<&'static SensorFormat>,
        formats: &'static [SensorFormat],
    ) -> Result<&'static SensorFormat, Error<E>> {
        match requested {
            Some(f) if formats.iter().any(|x| x.is(f)) => Ok(f),
            Some(f) => {
                error!("{} is not a mode of this sensor", f.name);
                Err(Error::InvalidArgument)
            }
            None => self.default_format(formats),
        }
    }
}

/// Where a model keeps its product id.
pub(crate) enum IdRegs {
    /// High and low byte in two 8-bit registers
    Split { high: u16, low: u16 },
    /// One 32-bit register
    Wide(u16),
}

/// Per-model constants used by [`SensorIo::detect`].
pub(crate) struct Identity {
    pub name: &'static str,
    pub pid: u32,
    pub id: IdRegs,
    /// Wait after starting XCLK, only applied when a generator is fitted
    pub xclk_settle: MillisDurationU32,
}

impl Identity {
    fn check<E>(&self, pid: u32) -> Result<SensorId, Error<E>> {
        if pid != self.pid {
            error!("sensor is not {}, pid {:#x}", self.name, pid);
            return Err(Error::UnexpectedId { expected: self.pid, found: pid });
        }
        info!("detected {}, pid {:#x}", self.name, pid);
        Ok(SensorId { pid })
    }
}

/// Bus, power control and delay of one sensor.
pub struct SensorIo<I2C, RST, PWDN, X, D> {
    pub(crate) sccb: Sccb<I2C>,
    pub(crate) power: PowerControl<RST, PWDN, X>,
    pub(crate) delay: D,
}

impl<I2C, RST, PWDN, X, D> SensorIo<I2C, RST, PWDN, X, D> {
    pub fn new(i2c: I2C, addr: u8, power: PowerControl<RST, PWDN, X>, delay: D) -> Self {
        Self { sccb: Sccb::new(i2c, addr), power, delay }
    }

    /// Give back the bus, power control and delay.
    pub fn release(self) -> (I2C, PowerControl<RST, PWDN, X>, D) {
        (self.sccb.release(), self.power, self.delay)
    }
}

impl<I2C, RST, PWDN, X, D> SensorIo<I2C, RST, PWDN, X, D>
where
    I2C: I2c,
    RST: OutputPin,
    PWDN: OutputPin,
    X: XclkGenerator,
    D: DelayNs,
{
    /// Power the sensor on with XCLK at `xclk` and check its id. On any
    /// failure the sensor is powered off again.
    pub(crate) fn detect(&mut self, ident: &Identity, xclk: HertzU32) -> Result<SensorId, Error<I2C::Error>> {
        let res = self.power_on(xclk, ident.xclk_settle).and_then(|_| ident.check(self.read_id(ident)?));
        if res.is_err() && self.power_off().is_err() {
            error!("{}: power off after failed detect failed", ident.name);
        }
        res
    }

    pub fn power_on(&mut self, xclk: HertzU32, xclk_settle: MillisDurationU32) -> Result<(), Error<I2C::Error>> {
        Ok(self.power.power_on(&mut self.delay, xclk, xclk_settle)?)
    }

    pub fn power_off(&mut self) -> Result<(), Error<I2C::Error>> {
        Ok(self.power.power_off(&mut self.delay)?)
    }

    pub fn hw_reset(&mut self) -> Result<(), Error<I2C::Error>> {
        Ok(self.power.hw_reset(&mut self.delay)?)
    }

    pub(crate) fn sleep(&mut self, duration: MillisDurationU32) {
        crate::sleep(&mut self.delay, duration);
    }

    pub(crate) fn read<V: RegValue>(&mut self, reg: u16) -> Result<V, Error<I2C::Error>> {
        self.sccb.read(reg).map_err(Error::Bus)
    }

    pub(crate) fn write<V: RegValue>(&mut self, reg: u16, val: V) -> Result<(), Error<I2C::Error>> {
        self.sccb.write(reg, val).map_err(Error::Bus)
    }

    pub(crate) fn set_reg_bits(&mut self, reg: u16, offset: u8, length: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        self.sccb.set_reg_bits(reg, offset, length, value).map_err(Error::Bus)
    }

    /// Read the product id without checking it.
    pub(crate) fn read_id(&mut self, ident: &Identity) -> Result<u32, Error<I2C::Error>> {
        match ident.id {
            IdRegs::Split { high, low } => {
                let h: u8 = self.read(high)?;
                let l: u8 = self.read(low)?;
                Ok(pid_from_bytes(h, l))
            }
            IdRegs::Wide(reg) => self.read(reg),
        }
    }

    /// Apply a mode program; a failure is reported as [`Error::SetFormat`].
    pub(crate) fn write_list(&mut self, list: &RegList, name: &'static str) -> Result<(), Error<I2C::Error>> {
        debug!("{}: {} writes, {} ms of pauses", name, list.write_count(), list.pause_ms());
        self.sccb.write_list(list, &mut self.delay).map_err(|e| {
            error!("{}: set format registers failed", name);
            Error::SetFormat(e)
        })
    }
}

impl<I2C, RST, PWDN, X, D> SensorIo<I2C, RST, PWDN, X, D>
where
    I2C: embedded_hal_async::i2c::I2c,
    RST: OutputPin,
    PWDN: OutputPin,
    X: XclkGenerator,
    D: embedded_hal_async::delay::DelayNs,
{
    pub(crate) async fn detect_async(&mut self, ident: &Identity, xclk: HertzU32) -> Result<SensorId, Error<I2C::Error>> {
        let res = match self.power_on_async(xclk, ident.xclk_settle).await {
            Ok(()) => match self.read_id_async(ident).await {
                Ok(pid) => ident.check(pid),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        if res.is_err() && self.power_off_async().await.is_err() {
            error!("{}: power off after failed detect failed", ident.name);
        }
        res
    }

    pub async fn power_on_async(
        &mut self,
        xclk: HertzU32,
        xclk_settle: MillisDurationU32,
    ) -> Result<(), Error<I2C::Error>> {
        Ok(self.power.power_on_async(&mut self.delay, xclk, xclk_settle).await?)
    }

    pub async fn power_off_async(&mut self) -> Result<(), Error<I2C::Error>> {
        Ok(self.power.power_off_async(&mut self.delay).await?)
    }

    pub(crate) async fn sleep_async(&mut self, duration: MillisDurationU32) {
        self.delay.delay_ms(duration.to_millis()).await;
    }

    pub(crate) async fn read_async<V: RegValue>(&mut self, reg: u16) -> Result<V, Error<I2C::Error>> {
        self.sccb.read_async(reg).await.map_err(Error::Bus)
    }

    pub(crate) async fn write_async<V: RegValue>(&mut self, reg: u16, val: V) -> Result<(), Error<I2C::Error>> {
        self.sccb.write_async(reg, val).await.map_err(Error::Bus)
    }

    pub(crate) async fn set_reg_bits_async(
        &mut self,
        reg: u16,
        offset: u8,
        length: u8,
        value: u8,
    ) -> Result<(), Error<I2C::Error>> {
        self.sccb
            .set_reg_bits_async(reg, offset, length, value)
            .await
            .map_err(Error::Bus)
    }

    pub(crate) async fn read_id_async(&mut self, ident: &Identity) -> Result<u32, Error<I2C::Error>> {
        match ident.id {
            IdRegs::Split { high, low } => {
                let h: u8 = self.read_async(high).await?;
                let l: u8 = self.read_async(low).await?;
                Ok(pid_from_bytes(h, l))
            }
            IdRegs::Wide(reg) => self.read_async(reg).await,
        }
    }

    pub(crate) async fn write_list_async(&mut self, list: &RegList, name: &'static str) -> Result<(), Error<I2C::Error>> {
        debug!("{}: {} writes, {} ms of pauses", name, list.write_count(), list.pause_ms());
        self.sccb
            .write_list_async(list, &mut self.delay)
            .await
            .map_err(|e| {
                error!("{}: set format registers failed", name);
                Error::SetFormat(e)
            })
    }
}

/// Register value for an 8-bit register, rejecting values that do not fit.
pub(crate) fn narrow_u8<E>(value: u32) -> Result<u8, Error<E>> {
    u8::try_from(value).map_err(|_| Error::InvalidArgument)
}
