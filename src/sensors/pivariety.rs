//! Arducam Pivariety: a sensor module with an on-board controller that
//! takes 32-bit commands.
//!
//! Modes are selected by index and V4L2-style controls are written as a
//! control id followed by a value. Flip, mirror, test pattern and resets are
//! handled by the module firmware and accepted as no-ops.

use embedded_hal::{delay::DelayNs, digital::OutputPin, i2c::I2c};
use fugit::{HertzU32, MillisDurationU32};

use crate::{
    error::Error,
    exposure::{Exposure, ExposureModel, ExposureUnit},
    format::{Bayer, Capability, IspInfo, MipiInfo, PixelFormat, Port, SensorFormat, SensorId},
    gain::{GainTable, STEP_1024_GAIN},
    param::{ParamDesc, ParamId, ParamValue},
    power::{NoPin, PowerControl, NO_SETTLE},
    program::{RegList, RegProgram},
    sensor::{CameraSensor, IdRegs, Identity, SensorConfig, SensorIo},
    xclk::{NoXclk, XclkGenerator},
};

pub const NAME: &str = "PIVARIETY";
pub const SCCB_ADDR: u8 = 0x0c;
pub const PID: u32 = 0x0030;

pub const REG_DELAY: u16 = 0xfffe;
pub const REG_END: u16 = 0xffff;
const REG_STREAM_ON: u16 = 0x0100;
const REG_DEVICE_ID: u16 = 0x0103;
const REG_PIXFORMAT_INDEX: u16 = 0x0200;
const REG_RESOLUTION_INDEX: u16 = 0x0300;
const REG_CTRL_ID: u16 = 0x0401;
const REG_CTRL_VALUE: u16 = 0x0406;

const CID_EXPOSURE: u32 = 0x0098_0911;
const CID_ANALOGUE_GAIN: u32 = 0x009e_0903;

const EXPOSURE: ExposureModel = ExposureModel {
    unit: ExposureUnit::Lines,
    min: 9,
    max_offset: 0x15,
};

static GAIN: GainTable = GainTable::new(&STEP_1024_GAIN);

/// Settings of a Pivariety module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PivarietyConfig {
    pub sensor: SensorConfig,
    /// Highest usable total gain, x1000
    pub abs_gain_limit: u32,
}

impl PivarietyConfig {
    pub const fn new(sensor: SensorConfig) -> Self {
        Self { sensor, abs_gain_limit: 16_000 }
    }

    pub const fn with_abs_gain_limit(self, abs_gain_limit: u32) -> Self {
        Self { abs_gain_limit, ..self }
    }
}

/// Default configuration: address 0x0c, 1920x1080, gain up to 16x.
pub const CONFIG: PivarietyConfig = PivarietyConfig::new(SensorConfig::new(SCCB_ADDR, 0));

macro_rules! mode {
    ($index:expr) => {
        [
            (REG_PIXFORMAT_INDEX, 0),
            (REG_RESOLUTION_INDEX, $index),
            (REG_STREAM_ON, 1),
            (REG_END, 0),
        ]
    };
}

static MIPI_2LANE_RAW10_1920X1080_30FPS: [(u16, u32); 4] = mode!(0);
static MIPI_2LANE_RAW10_1600X1200_30FPS: [(u16, u32); 4] = mode!(1);
static MIPI_2LANE_RAW10_1280X720_60FPS: [(u16, u32); 4] = mode!(2);
static MIPI_2LANE_RAW10_1024X600_60FPS: [(u16, u32); 4] = mode!(3);
static MIPI_2LANE_RAW10_640X480_30FPS: [(u16, u32); 4] = mode!(4);

const fn isp(pclk: u32, vts: u32, hts: u32, tline_ns: u32) -> IspInfo {
    IspInfo {
        pclk: HertzU32::from_raw(pclk),
        vts,
        hts,
        tline_ns,
        gain_def: 500,
        exp_def: 0x2dc,
        bayer: Bayer::Rggb,
    }
}

const fn mipi(clk: u32) -> Option<MipiInfo> {
    Some(MipiInfo { mipi_clk: HertzU32::from_raw(clk), lane_num: 2, line_sync_en: false })
}

const fn program(regs: &'static [(u16, u32)]) -> RegList {
    RegList::A16V32(RegProgram::terminated(regs, REG_DELAY, REG_END))
}

pub static FORMATS: [SensorFormat; 5] = [
    SensorFormat {
        name: "MIPI_2lane_24Minput_RAW10_1920x1080_30fps",
        format: PixelFormat::Raw10,
        port: Port::MipiCsi,
        xclk: HertzU32::from_raw(24_000_000),
        width: 1920,
        height: 1080,
        fps: 30,
        regs: program(&MIPI_2LANE_RAW10_1920X1080_30FPS),
        isp_info: isp(945_000_000, 1436, 19167, 20282),
        mipi: mipi(480_000_000),
    },
    SensorFormat {
        name: "MIPI_2lane_24Minput_RAW10_1600x1200_30fps",
        format: PixelFormat::Raw10,
        port: Port::MipiCsi,
        xclk: HertzU32::from_raw(24_000_000),
        width: 1600,
        height: 1200,
        fps: 30,
        regs: program(&MIPI_2LANE_RAW10_1600X1200_30FPS),
        isp_info: isp(945_000_000, 1602, 16492, 17451),
        mipi: mipi(480_000_000),
    },
    SensorFormat {
        name: "MIPI_2lane_24Minput_RAW10_1280x720_60fps",
        format: PixelFormat::Raw10,
        port: Port::MipiCsi,
        xclk: HertzU32::from_raw(24_000_000),
        width: 1280,
        height: 720,
        fps: 60,
        regs: program(&MIPI_2LANE_RAW10_1280X720_60FPS),
        isp_info: isp(1_900_800_000, 1602, 17900, 9417),
        mipi: mipi(480_000_000),
    },
    SensorFormat {
        name: "MIPI_2lane_24Minput_RAW10_1024x600_60fps",
        format: PixelFormat::Raw10,
        port: Port::MipiCsi,
        xclk: HertzU32::from_raw(24_000_000),
        width: 1024,
        height: 600,
        fps: 60,
        regs: program(&MIPI_2LANE_RAW10_1024X600_60FPS),
        isp_info: isp(1_900_800_000, 1802, 18900, 9617),
        mipi: mipi(640_000_000),
    },
    SensorFormat {
        name: "MIPI_2lane_24Minput_RAW10_640x480_30fps",
        format: PixelFormat::Raw10,
        port: Port::MipiCsi,
        xclk: HertzU32::from_raw(24_000_000),
        width: 640,
        height: 480,
        fps: 30,
        regs: program(&MIPI_2LANE_RAW10_640X480_30FPS),
        isp_info: isp(772_200_000, 3138, 8276, 9522),
        mipi: mipi(640_000_000),
    },
];

const IDENTITY: Identity = Identity {
    name: NAME,
    pid: PID,
    id: IdRegs::Wide(REG_DEVICE_ID),
    xclk_settle: NO_SETTLE,
};

/// Wait before a mode switch.
const MODE_SWITCH_LEAD: MillisDurationU32 = MillisDurationU32::from_ticks(100);
/// Wait for the module firmware to apply a mode.
const MODE_SWITCH_SETTLE: MillisDurationU32 = MillisDurationU32::from_ticks(1000);

pub struct Pivariety<I2C, D, RST = NoPin, PWDN = NoPin, X = NoXclk> {
    io: SensorIo<I2C, RST, PWDN, X, D>,
    config: PivarietyConfig,
    id: SensorId,
    format: &'static SensorFormat,
    exposure: Exposure,
    gain: GainTable,
    gain_index: u32,
    streaming: bool,
}

impl<I2C, D, RST, PWDN, X> Pivariety<I2C, D, RST, PWDN, X> {
    fn with_io(
        io: SensorIo<I2C, RST, PWDN, X, D>,
        config: PivarietyConfig,
        id: SensorId,
        format: &'static SensorFormat,
    ) -> Self {
        let gain = GAIN.limited(config.abs_gain_limit);
        debug!("gain limited to index {}", gain.last_index());
        Self {
            io,
            config,
            id,
            format,
            exposure: EXPOSURE.for_format(format),
            gain,
            gain_index: gain.clamp_index(format.isp_info.gain_def),
            streaming: false,
        }
    }

    pub fn release(self) -> (I2C, PowerControl<RST, PWDN, X>, D) {
        self.io.release()
    }

    /// The gain table limited by the configured absolute gain.
    pub fn gain_table(&self) -> GainTable {
        self.gain
    }

    fn format_applied(&mut self, format: &'static SensorFormat) {
        debug!("set format {}", format.name);
        self.format = format;
        self.exposure = EXPOSURE.for_format(format);
        self.gain_index = self.gain.clamp_index(format.isp_info.gain_def);
    }
}

impl<I2C, D, RST, PWDN, X> Pivariety<I2C, D, RST, PWDN, X>
where
    I2C: I2c,
    D: DelayNs,
    RST: OutputPin,
    PWDN: OutputPin,
    X: XclkGenerator,
{
    pub fn detect(
        i2c: I2C,
        power: PowerControl<RST, PWDN, X>,
        delay: D,
        config: PivarietyConfig,
    ) -> Result<Self, Error<I2C::Error>> {
        let format = config.sensor.default_format(&FORMATS)?;
        let mut io = SensorIo::new(i2c, config.sensor.sccb_addr, power, delay);
        let id = io.detect(&IDENTITY, format.xclk)?;
        Ok(Self::with_io(io, config, id, format))
    }

    pub fn power_off(&mut self) -> Result<(), Error<I2C::Error>> {
        self.io.power_off()
    }

    fn write_ctrl(&mut self, id: u32, value: u32) -> Result<(), Error<I2C::Error>> {
        self.io.write(REG_CTRL_ID, id)?;
        self.io.write(REG_CTRL_VALUE, value)
    }

    fn set_exposure(&mut self, val: u32) -> Result<(), Error<I2C::Error>> {
        let val = self.exposure.clamp(val);
        debug!("set exposure {:#x}, max {:#x}", val, self.exposure.limits().max);
        self.write_ctrl(CID_EXPOSURE, val)?;
        self.exposure.commit(val);
        Ok(())
    }

    fn set_gain(&mut self, index: u32) -> Result<(), Error<I2C::Error>> {
        let index = self.gain.clamp_index(index);
        let value = self.gain.value(index);
        debug!("gain {}", value);
        self.write_ctrl(CID_ANALOGUE_GAIN, value)?;
        self.gain_index = index;
        Ok(())
    }
}

impl<I2C, D, RST, PWDN, X> Pivariety<I2C, D, RST, PWDN, X>
where
    I2C: embedded_hal_async::i2c::I2c,
    D: embedded_hal_async::delay::DelayNs,
    RST: OutputPin,
    PWDN: OutputPin,
    X: XclkGenerator,
{
    pub async fn detect_async(
        i2c: I2C,
        power: PowerControl<RST, PWDN, X>,
        delay: D,
        config: PivarietyConfig,
    ) -> Result<Self, Error<I2C::Error>> {
        let format = config.sensor.default_format(&FORMATS)?;
        let mut io = SensorIo::new(i2c, config.sensor.sccb_addr, power, delay);
        let id = io.detect_async(&IDENTITY, format.xclk).await?;
        Ok(Self::with_io(io, config, id, format))
    }

    pub async fn power_off_async(&mut self) -> Result<(), Error<I2C::Error>> {
        self.io.power_off_async().await
    }

    pub async fn set_format_async(&mut self, format: Option<&'static SensorFormat>) -> Result<(), Error<I2C::Error>> {
        let format = self.config.sensor.select_format(format, &FORMATS)?;
        self.io.sleep_async(MODE_SWITCH_LEAD).await;
        let res = self.io.write_list_async(&format.regs, NAME).await;
        self.io.sleep_async(MODE_SWITCH_SETTLE).await;
        res?;

        self.format_applied(format);
        self.set_exposure_async(format.isp_info.exp_def).await?;
        self.set_gain_async(format.isp_info.gain_def).await
    }

    pub async fn set_para_value_async(&mut self, value: ParamValue) -> Result<(), Error<I2C::Error>> {
        match value {
            ParamValue::ExposureVal(v) => self.set_exposure_async(v).await,
            ParamValue::ExposureTime(t) => self.set_exposure_async(self.exposure.clamp_time(t)).await,
            ParamValue::Gain(i) => self.set_gain_async(i).await,
            ParamValue::VFlip(_) | ParamValue::HMirror(_) => Ok(()),
            ParamValue::GroupExpGain { .. } => {
                error!("set {} is not supported", value.id());
                Err(Error::InvalidArgument)
            }
        }
    }

    pub async fn set_stream_async(&mut self, on: bool) -> Result<(), Error<I2C::Error>> {
        self.io.write_async(REG_STREAM_ON, on as u32).await?;
        self.streaming = on;
        debug!("stream {}", on);
        Ok(())
    }

    async fn write_ctrl_async(&mut self, id: u32, value: u32) -> Result<(), Error<I2C::Error>> {
        self.io.write_async(REG_CTRL_ID, id).await?;
        self.io.write_async(REG_CTRL_VALUE, value).await
    }

    async fn set_exposure_async(&mut self, val: u32) -> Result<(), Error<I2C::Error>> {
        let val = self.exposure.clamp(val);
        debug!("set exposure {:#x}, max {:#x}", val, self.exposure.limits().max);
        self.write_ctrl_async(CID_EXPOSURE, val).await?;
        self.exposure.commit(val);
        Ok(())
    }

    async fn set_gain_async(&mut self, index: u32) -> Result<(), Error<I2C::Error>> {
        let index = self.gain.clamp_index(index);
        let value = self.gain.value(index);
        debug!("gain {}", value);
        self.write_ctrl_async(CID_ANALOGUE_GAIN, value).await?;
        self.gain_index = index;
        Ok(())
    }
}

impl<I2C, D, RST, PWDN, X> CameraSensor for Pivariety<I2C, D, RST, PWDN, X>
where
    I2C: I2c,
    D: DelayNs,
    RST: OutputPin,
    PWDN: OutputPin,
    X: XclkGenerator,
{
    type Error = Error<I2C::Error>;

    fn name(&self) -> &'static str {
        NAME
    }

    fn id(&self) -> SensorId {
        self.id
    }

    fn port(&self) -> Port {
        Port::MipiCsi
    }

    fn query_para_desc(&self, id: ParamId) -> Result<ParamDesc, Self::Error> {
        match id {
            ParamId::ExposureVal | ParamId::ExposureTime => self.exposure.descriptor(id).ok_or(Error::InvalidArgument),
            ParamId::Gain => Ok(self.gain.descriptor(self.format.isp_info.gain_def)),
            ParamId::VFlip | ParamId::HMirror => Ok(ParamDesc::SWITCH),
            ParamId::GroupExpGain => {
                error!("id {} is not supported", id);
                Err(Error::InvalidArgument)
            }
        }
    }

    fn get_para_value(&self, id: ParamId) -> Result<ParamValue, Self::Error> {
        match id {
            ParamId::ExposureVal => Ok(ParamValue::ExposureVal(self.exposure.value())),
            ParamId::ExposureTime => Ok(ParamValue::ExposureTime(self.exposure.time())),
            ParamId::Gain => Ok(ParamValue::Gain(self.gain_index)),
            _ => Err(Error::NotSupported),
        }
    }

    fn set_para_value(&mut self, value: ParamValue) -> Result<(), Self::Error> {
        match value {
            ParamValue::ExposureVal(v) => self.set_exposure(v),
            ParamValue::ExposureTime(t) => self.set_exposure(self.exposure.clamp_time(t)),
            ParamValue::Gain(i) => self.set_gain(i),
            ParamValue::VFlip(_) | ParamValue::HMirror(_) => Ok(()),
            ParamValue::GroupExpGain { .. } => {
                error!("set {} is not supported", value.id());
                Err(Error::InvalidArgument)
            }
        }
    }

    fn query_support_formats(&self) -> &'static [SensorFormat] {
        &FORMATS
    }

    fn query_support_capability(&self) -> Capability {
        Capability::RAW
    }

    /// Select a mode, wait for the module to switch, then write the mode's
    /// default exposure and gain.
    fn set_format(&mut self, format: Option<&'static SensorFormat>) -> Result<(), Self::Error> {
        let format = self.config.sensor.select_format(format, &FORMATS)?;
        self.io.sleep(MODE_SWITCH_LEAD);
        let res = self.io.write_list(&format.regs, NAME);
        self.io.sleep(MODE_SWITCH_SETTLE);
        res?;

        self.format_applied(format);
        self.set_exposure(format.isp_info.exp_def)?;
        self.set_gain(format.isp_info.gain_def)
    }

    fn get_format(&self) -> &'static SensorFormat {
        self.format
    }

    fn hw_reset(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn soft_reset(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_register(&mut self, reg: u16, value: u32) -> Result<(), Self::Error> {
        self.io.write(reg, value)
    }

    fn get_register(&mut self, reg: u16) -> Result<u32, Self::Error> {
        self.io.read::<u32>(reg)
    }

    fn set_stream(&mut self, on: bool) -> Result<(), Self::Error> {
        self.io.write(REG_STREAM_ON, on as u32)?;
        self.streaming = on;
        debug!("stream {}", on);
        Ok(())
    }

    fn stream_status(&self) -> bool {
        self.streaming
    }

    fn set_test_pattern(&mut self, _on: bool) -> Result<(), Self::Error> {
        Ok(())
    }

    fn chip_id(&mut self) -> Result<SensorId, Self::Error> {
        Ok(SensorId { pid: self.io.read_id(&IDENTITY)? })
    }
}
