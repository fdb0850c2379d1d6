//! GalaxyCore GC2607: 1920x1080 RAW10 over 2-lane MIPI.
//!
//! Exposure is programmed in 1/16 line steps. The sensor runs at fixed 1x
//! gain, so gain requests are only recorded. Streaming starts with the mode
//! program and the stream switch only tracks state.

use embedded_hal::{delay::DelayNs, digital::OutputPin, i2c::I2c};
use fugit::{ExtU32 as _, HertzU32, MillisDurationU32};

use crate::{
    error::Error,
    exposure::{Exposure, ExposureModel, ExposureUnit},
    format::{Bayer, Capability, IspInfo, MipiInfo, PixelFormat, Port, SensorFormat, SensorId},
    gain::{GainTable, UNITY_GAIN},
    param::{ParamDesc, ParamId, ParamValue},
    power::{NoPin, PowerControl},
    program::{RegList, RegProgram},
    sensor::{narrow_u8, CameraSensor, IdRegs, Identity, SensorConfig, SensorIo},
    xclk::{NoXclk, XclkGenerator},
};

pub const NAME: &str = "GC2607";
pub const SCCB_ADDR: u8 = 0x37;
pub const PID: u32 = 0x2607;

/// Default board configuration: address 0x37, 960x540 mode.
pub const CONFIG: SensorConfig = SensorConfig::new(SCCB_ADDR, 0);

pub const REG_DELAY: u16 = 0xfefe;
const REG_ID_HIGH: u16 = 0x03f0;
const REG_ID_LOW: u16 = 0x03f1;
const REG_PAGE_RESET: u16 = 0x03fe;
const REG_MIRROR_FLIP: u16 = 0x0101;
const REG_SOFT_RESET: u16 = 0x0103;
const REG_TEST_PATTERN: u16 = 0x008c;
const REG_SHUTTER_TIME_H: u16 = 0x0202;
const REG_SHUTTER_TIME_L: u16 = 0x0203;
const REG_FRAME_LENGTH_H: u16 = 0x0340;
const REG_FRAME_LENGTH_L: u16 = 0x0341;
const REG_LINE_LENGTH_H: u16 = 0x0342;
const REG_LINE_LENGTH_L: u16 = 0x0343;
const REG_BINNING_ROW: u16 = 0x0218;
const REG_BINNING_COL: u16 = 0x005e;

const XCLK_SETTLE: MillisDurationU32 = MillisDurationU32::from_ticks(2);

const EXPOSURE: ExposureModel = ExposureModel {
    unit: ExposureUnit::FrameSteps(16),
    min: 0x10,
    max_offset: 6,
};

static GAIN: GainTable = GainTable::new(&UNITY_GAIN);

static MIPI_2LANE_960X540_RAW10_30FPS: [(u16, u8); 14] = [
    (REG_PAGE_RESET, 0xf0),
    (REG_PAGE_RESET, 0x00),
    (REG_DELAY, 5),
    (REG_BINNING_ROW, 0x01),
    (REG_BINNING_COL, 0x01),
    (REG_FRAME_LENGTH_H, 0x05),
    (REG_FRAME_LENGTH_L, 0x57),
    (REG_LINE_LENGTH_H, 0x08),
    (REG_LINE_LENGTH_L, 0x00),
    (REG_SHUTTER_TIME_H, 0x04),
    (REG_SHUTTER_TIME_L, 0x38),
    (REG_MIRROR_FLIP, 0x00),
    (REG_DELAY, 10),
    (REG_PAGE_RESET, 0x10),
];

static MIPI_2LANE_1920X1080_RAW10_30FPS: [(u16, u8); 14] = [
    (REG_PAGE_RESET, 0xf0),
    (REG_PAGE_RESET, 0x00),
    (REG_DELAY, 5),
    (REG_BINNING_ROW, 0x00),
    (REG_BINNING_COL, 0x00),
    (REG_FRAME_LENGTH_H, 0x06),
    (REG_FRAME_LENGTH_L, 0x68),
    (REG_LINE_LENGTH_H, 0x08),
    (REG_LINE_LENGTH_L, 0x00),
    (REG_SHUTTER_TIME_H, 0x04),
    (REG_SHUTTER_TIME_L, 0x38),
    (REG_MIRROR_FLIP, 0x00),
    (REG_DELAY, 10),
    (REG_PAGE_RESET, 0x10),
];

const fn isp(vts: u32) -> IspInfo {
    IspInfo {
        pclk: HertzU32::from_raw(84_000_000),
        vts,
        hts: 2048,
        tline_ns: 0,
        gain_def: 0,
        exp_def: 0x438,
        bayer: Bayer::Grbg,
    }
}

const fn mipi(clk: u32) -> Option<MipiInfo> {
    Some(MipiInfo { mipi_clk: HertzU32::from_raw(clk), lane_num: 2, line_sync_en: false })
}

pub static FORMATS: [SensorFormat; 3] = [
    SensorFormat {
        name: "MIPI_2lane_24Minput_raw10_960x540_30fps",
        format: PixelFormat::Raw10,
        port: Port::MipiCsi,
        xclk: HertzU32::from_raw(24_000_000),
        width: 960,
        height: 540,
        fps: 30,
        regs: RegList::A16V8(RegProgram::new(&MIPI_2LANE_960X540_RAW10_30FPS, REG_DELAY)),
        isp_info: isp(1367),
        mipi: mipi(336_000_000),
    },
    SensorFormat {
        name: "MIPI_2lane_24Minput_raw10_1920x1080_30fps",
        format: PixelFormat::Raw10,
        port: Port::MipiCsi,
        xclk: HertzU32::from_raw(24_000_000),
        width: 1920,
        height: 1080,
        fps: 30,
        regs: RegList::A16V8(RegProgram::new(&MIPI_2LANE_1920X1080_RAW10_30FPS, REG_DELAY)),
        isp_info: isp(1640),
        mipi: mipi(672_000_000),
    },
    SensorFormat {
        name: "MIPI_2lane_24Minput_raw10_960x540_30fps",
        format: PixelFormat::Raw10,
        port: Port::MipiCsi,
        xclk: HertzU32::from_raw(24_000_000),
        width: 960,
        height: 540,
        fps: 30,
        regs: RegList::A16V8(RegProgram::new(&MIPI_2LANE_960X540_RAW10_30FPS, REG_DELAY)),
        isp_info: isp(1367),
        mipi: mipi(336_000_000),
    },
];

const IDENTITY: Identity = Identity {
    name: NAME,
    pid: PID,
    id: IdRegs::Split { high: REG_ID_HIGH, low: REG_ID_LOW },
    xclk_settle: XCLK_SETTLE,
};

pub struct Gc2607<I2C, D, RST = NoPin, PWDN = NoPin, X = NoXclk> {
    io: SensorIo<I2C, RST, PWDN, X, D>,
    config: SensorConfig,
    id: SensorId,
    format: &'static SensorFormat,
    exposure: Exposure,
    gain_index: u32,
    vflip: bool,
    hmirror: bool,
    streaming: bool,
}

impl<I2C, D, RST, PWDN, X> Gc2607<I2C, D, RST, PWDN, X> {
    fn with_io(
        io: SensorIo<I2C, RST, PWDN, X, D>,
        config: SensorConfig,
        id: SensorId,
        format: &'static SensorFormat,
    ) -> Self {
        Self {
            io,
            config,
            id,
            format,
            exposure: EXPOSURE.for_format(format),
            gain_index: format.isp_info.gain_def,
            vflip: false,
            hmirror: false,
            streaming: false,
        }
    }

    /// Give back the bus, power control and delay without touching the sensor.
    pub fn release(self) -> (I2C, PowerControl<RST, PWDN, X>, D) {
        self.io.release()
    }

    fn format_applied(&mut self, format: &'static SensorFormat) {
        debug!("set format {}", format.name);
        self.format = format;
        self.exposure = EXPOSURE.for_format(format);
        self.gain_index = format.isp_info.gain_def;
    }

    fn set_gain(&mut self, index: u32) {
        self.gain_index = GAIN.clamp_index(index);
        debug!("gain index {}", self.gain_index);
    }
}

impl<I2C, D, RST, PWDN, X> Gc2607<I2C, D, RST, PWDN, X>
where
    I2C: I2c,
    D: DelayNs,
    RST: OutputPin,
    PWDN: OutputPin,
    X: XclkGenerator,
{
    /// Power the sensor on and check that a GC2607 answers at `config.sccb_addr`.
    pub fn detect(
        i2c: I2C,
        power: PowerControl<RST, PWDN, X>,
        delay: D,
        config: SensorConfig,
    ) -> Result<Self, Error<I2C::Error>> {
        let format = config.default_format(&FORMATS)?;
        let mut io = SensorIo::new(i2c, config.sccb_addr, power, delay);
        let id = io.detect(&IDENTITY, format.xclk)?;
        Ok(Self::with_io(io, config, id, format))
    }

    pub fn power_off(&mut self) -> Result<(), Error<I2C::Error>> {
        self.io.power_off()
    }

    fn set_exposure(&mut self, val: u32) -> Result<(), Error<I2C::Error>> {
        let val = self.exposure.clamp(val);
        debug!("set exposure {:#x}", val);
        self.io.write(REG_SHUTTER_TIME_H, ((val >> 8) & 0x3f) as u8)?;
        self.io.write(REG_SHUTTER_TIME_L, (val & 0xff) as u8)?;
        self.exposure.commit(val);
        Ok(())
    }
}

impl<I2C, D, RST, PWDN, X> Gc2607<I2C, D, RST, PWDN, X>
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
        config: SensorConfig,
    ) -> Result<Self, Error<I2C::Error>> {
        let format = config.default_format(&FORMATS)?;
        let mut io = SensorIo::new(i2c, config.sccb_addr, power, delay);
        let id = io.detect_async(&IDENTITY, format.xclk).await?;
        Ok(Self::with_io(io, config, id, format))
    }

    pub async fn power_off_async(&mut self) -> Result<(), Error<I2C::Error>> {
        self.io.power_off_async().await
    }

    pub async fn set_format_async(&mut self, format: Option<&'static SensorFormat>) -> Result<(), Error<I2C::Error>> {
        let format = self.config.select_format(format, &FORMATS)?;
        self.io.write_list_async(&format.regs, NAME).await?;
        self.format_applied(format);
        Ok(())
    }

    pub async fn set_para_value_async(&mut self, value: ParamValue) -> Result<(), Error<I2C::Error>> {
        match value {
            ParamValue::ExposureVal(v) => self.set_exposure_async(v).await,
            ParamValue::ExposureTime(t) => self.set_exposure_async(self.exposure.clamp_time(t)).await,
            ParamValue::Gain(i) => {
                self.set_gain(i);
                Ok(())
            }
            ParamValue::GroupExpGain { exposure_time, gain_index } => {
                self.set_exposure_async(self.exposure.clamp_time(exposure_time)).await?;
                self.set_gain(gain_index);
                Ok(())
            }
            ParamValue::VFlip(on) => {
                self.io.set_reg_bits_async(REG_MIRROR_FLIP, 1, 1, on as u8).await?;
                self.vflip = on;
                Ok(())
            }
            ParamValue::HMirror(on) => {
                self.io.set_reg_bits_async(REG_MIRROR_FLIP, 0, 1, on as u8).await?;
                self.hmirror = on;
                Ok(())
            }
        }
    }

    pub async fn set_stream_async(&mut self, on: bool) -> Result<(), Error<I2C::Error>> {
        self.streaming = on;
        debug!("stream {}", on);
        Ok(())
    }

    async fn set_exposure_async(&mut self, val: u32) -> Result<(), Error<I2C::Error>> {
        let val = self.exposure.clamp(val);
        debug!("set exposure {:#x}", val);
        self.io.write_async(REG_SHUTTER_TIME_H, ((val >> 8) & 0x3f) as u8).await?;
        self.io.write_async(REG_SHUTTER_TIME_L, (val & 0xff) as u8).await?;
        self.exposure.commit(val);
        Ok(())
    }
}

impl<I2C, D, RST, PWDN, X> CameraSensor for Gc2607<I2C, D, RST, PWDN, X>
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
            ParamId::Gain => Ok(GAIN.descriptor(self.format.isp_info.gain_def)),
            ParamId::GroupExpGain => Ok(ParamDesc::GROUP_EXP_GAIN),
            ParamId::VFlip | ParamId::HMirror => Ok(ParamDesc::SWITCH),
        }
    }

    fn get_para_value(&self, id: ParamId) -> Result<ParamValue, Self::Error> {
        match id {
            ParamId::ExposureVal => Ok(ParamValue::ExposureVal(self.exposure.value())),
            ParamId::ExposureTime => Ok(ParamValue::ExposureTime(self.exposure.time())),
            ParamId::Gain => Ok(ParamValue::Gain(self.gain_index)),
            ParamId::VFlip => Ok(ParamValue::VFlip(self.vflip)),
            ParamId::HMirror => Ok(ParamValue::HMirror(self.hmirror)),
            ParamId::GroupExpGain => Err(Error::NotSupported),
        }
    }

    fn set_para_value(&mut self, value: ParamValue) -> Result<(), Self::Error> {
        match value {
            ParamValue::ExposureVal(v) => self.set_exposure(v),
            ParamValue::ExposureTime(t) => self.set_exposure(self.exposure.clamp_time(t)),
            ParamValue::Gain(i) => {
                self.set_gain(i);
                Ok(())
            }
            ParamValue::GroupExpGain { exposure_time, gain_index } => {
                self.set_exposure(self.exposure.clamp_time(exposure_time))?;
                self.set_gain(gain_index);
                Ok(())
            }
            ParamValue::VFlip(on) => {
                self.io.set_reg_bits(REG_MIRROR_FLIP, 1, 1, on as u8)?;
                self.vflip = on;
                Ok(())
            }
            ParamValue::HMirror(on) => {
                self.io.set_reg_bits(REG_MIRROR_FLIP, 0, 1, on as u8)?;
                self.hmirror = on;
                Ok(())
            }
        }
    }

    fn query_support_formats(&self) -> &'static [SensorFormat] {
        &FORMATS
    }

    fn query_support_capability(&self) -> Capability {
        Capability::RAW
    }

    fn set_format(&mut self, format: Option<&'static SensorFormat>) -> Result<(), Self::Error> {
        let format = self.config.select_format(format, &FORMATS)?;
        self.io.write_list(&format.regs, NAME)?;
        self.format_applied(format);
        Ok(())
    }

    fn get_format(&self) -> &'static SensorFormat {
        self.format
    }

    fn hw_reset(&mut self) -> Result<(), Self::Error> {
        self.io.hw_reset()
    }

    fn soft_reset(&mut self) -> Result<(), Self::Error> {
        let res = self.io.set_reg_bits(REG_SOFT_RESET, 0, 1, 0x01);
        self.io.sleep(5.millis());
        res
    }

    fn set_register(&mut self, reg: u16, value: u32) -> Result<(), Self::Error> {
        let value = narrow_u8(value)?;
        self.io.write(reg, value)
    }

    fn get_register(&mut self, reg: u16) -> Result<u32, Self::Error> {
        self.io.read::<u8>(reg).map(u32::from)
    }

    fn set_stream(&mut self, on: bool) -> Result<(), Self::Error> {
        self.streaming = on;
        debug!("stream {}", on);
        Ok(())
    }

    fn stream_status(&self) -> bool {
        self.streaming
    }

    fn set_test_pattern(&mut self, on: bool) -> Result<(), Self::Error> {
        self.io.set_reg_bits(REG_TEST_PATTERN, 2, 1, on as u8)
    }

    fn chip_id(&mut self) -> Result<SensorId, Self::Error> {
        Ok(SensorId { pid: self.io.read_id(&IDENTITY)? })
    }
}
