//! ams OSRAM Mira220: 2-lane MIPI global shutter sensor.
//!
//! The sensor has no analog gain stage. Its PWDN line is active-low, which
//! [`Mira220::detect`] applies to the given [`PowerControl`].

use embedded_hal::{delay::DelayNs, digital::OutputPin, i2c::I2c};
use fugit::HertzU32;

use crate::{
    error::Error,
    exposure::{Exposure, ExposureModel, ExposureUnit},
    format::{Bayer, Capability, IspInfo, MipiInfo, PixelFormat, Port, SensorFormat, SensorId},
    param::{ParamDesc, ParamId, ParamValue},
    power::{NoPin, Polarity, PowerControl, NO_SETTLE},
    program::{RegList, RegProgram},
    sensor::{narrow_u8, CameraSensor, IdRegs, Identity, SensorConfig, SensorIo},
    xclk::{NoXclk, XclkGenerator},
};

pub const NAME: &str = "MIRA220";
pub const SCCB_ADDR: u8 = 0x54;
pub const PID: u32 = 0x0130;

/// Default board configuration: address 0x54, 1024x600 RAW12.
pub const CONFIG: SensorConfig = SensorConfig::new(SCCB_ADDR, 0);

pub const REG_DELAY: u16 = 0x7000;
const REG_SENSOR_ID_L: u16 = 0x102b;
const REG_SENSOR_ID_H: u16 = 0x102c;
const REG_TEST_PATTERN: u16 = 0x2091;
const REG_SW_RESET: u16 = 0x0040;
const REG_EXPOSURE_L: u16 = 0x100c;
const REG_EXPOSURE_H: u16 = 0x100d;
const REG_VBLANK_L: u16 = 0x1012;
const REG_VBLANK_H: u16 = 0x1013;
const REG_HFLIP: u16 = 0x209c;
const REG_VFLIP: u16 = 0x1095;
const REG_OTP_CMD: u16 = 0x0080;
const REG_IMAGER_STATE: u16 = 0x1003;
const REG_IMAGER_RUN: u16 = 0x10f0;
const REG_IMAGER_RUN_CONT: u16 = 0x1002;

const OTP_CMD_UP: u8 = 0x04;
const OTP_CMD_DOWN: u8 = 0x08;
const IMAGER_RUN_CONT_ENABLE: u8 = 0x04;
const IMAGER_STATE_STREAM: u8 = 0x10;
const IMAGER_STATE_IDLE: u8 = 0x02;

const EXPOSURE: ExposureModel = ExposureModel {
    unit: ExposureUnit::FrameSteps(1),
    min: 8,
    max_offset: 6,
};

// 340 lines of vertical blanking on top of the 600 active ones
static MIPI_2LANE_1024X600_RAW12: [(u16, u8); 14] = [
    (REG_SW_RESET, 0x01),
    (REG_DELAY, 10),
    (REG_OTP_CMD, OTP_CMD_UP),
    (REG_DELAY, 10),
    (REG_IMAGER_STATE, IMAGER_STATE_IDLE),
    (REG_IMAGER_RUN, 0x00),
    (REG_IMAGER_RUN_CONT, IMAGER_RUN_CONT_ENABLE),
    (REG_VBLANK_L, 0x54),
    (REG_VBLANK_H, 0x01),
    (REG_EXPOSURE_L, 0x00),
    (REG_EXPOSURE_H, 0x01),
    (REG_HFLIP, 0x00),
    (REG_VFLIP, 0x00),
    (REG_OTP_CMD, OTP_CMD_DOWN),
];

static MIPI_2LANE_1280X720_RAW8: [(u16, u8); 14] = [
    (REG_SW_RESET, 0x01),
    (REG_DELAY, 10),
    (REG_OTP_CMD, OTP_CMD_UP),
    (REG_DELAY, 10),
    (REG_IMAGER_STATE, IMAGER_STATE_IDLE),
    (REG_IMAGER_RUN, 0x00),
    (REG_IMAGER_RUN_CONT, IMAGER_RUN_CONT_ENABLE),
    (REG_VBLANK_L, 0x54),
    (REG_VBLANK_H, 0x01),
    (REG_EXPOSURE_L, 0x00),
    (REG_EXPOSURE_H, 0x01),
    (REG_HFLIP, 0x00),
    (REG_VFLIP, 0x00),
    (REG_OTP_CMD, OTP_CMD_DOWN),
];

const ISP: IspInfo = IspInfo {
    pclk: HertzU32::from_raw(25_190_400),
    vts: 600,
    hts: 1024,
    tline_ns: 0,
    gain_def: 0,
    exp_def: 0,
    bayer: Bayer::Bggr,
};

const MIPI: Option<MipiInfo> = Some(MipiInfo {
    mipi_clk: HertzU32::from_raw(200_000_000),
    lane_num: 2,
    line_sync_en: false,
});

pub static FORMATS: [SensorFormat; 2] = [
    SensorFormat {
        name: "MIPI_2lane_RAW12_1600_1400_25fps",
        format: PixelFormat::Raw12,
        port: Port::MipiCsi,
        xclk: HertzU32::from_raw(38_400_000),
        width: 1024,
        height: 600,
        fps: 6,
        regs: RegList::A16V8(RegProgram::new(&MIPI_2LANE_1024X600_RAW12, REG_DELAY)),
        isp_info: ISP,
        mipi: MIPI,
    },
    SensorFormat {
        name: "MIPI_2lane_RAW12_1280_720_25fps",
        format: PixelFormat::Raw8,
        port: Port::MipiCsi,
        xclk: HertzU32::from_raw(38_400_000),
        width: 1280,
        height: 720,
        fps: 25,
        regs: RegList::A16V8(RegProgram::new(&MIPI_2LANE_1280X720_RAW8, REG_DELAY)),
        isp_info: ISP,
        mipi: MIPI,
    },
];

const IDENTITY: Identity = Identity {
    name: NAME,
    pid: PID,
    id: IdRegs::Split { high: REG_SENSOR_ID_H, low: REG_SENSOR_ID_L },
    xclk_settle: NO_SETTLE,
};

pub struct Mira220<I2C, D, RST = NoPin, PWDN = NoPin, X = NoXclk> {
    io: SensorIo<I2C, RST, PWDN, X, D>,
    config: SensorConfig,
    id: SensorId,
    format: &'static SensorFormat,
    exposure: Exposure,
    vflip: bool,
    hmirror: bool,
    streaming: bool,
}

impl<I2C, D, RST, PWDN, X> Mira220<I2C, D, RST, PWDN, X> {
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
            vflip: false,
            hmirror: false,
            streaming: false,
        }
    }

    pub fn release(self) -> (I2C, PowerControl<RST, PWDN, X>, D) {
        self.io.release()
    }

    fn format_applied(&mut self, format: &'static SensorFormat) {
        debug!("set format {}", format.name);
        self.format = format;
        self.exposure = EXPOSURE.for_format(format);
    }
}

impl<I2C, D, RST, PWDN, X> Mira220<I2C, D, RST, PWDN, X>
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
        config: SensorConfig,
    ) -> Result<Self, Error<I2C::Error>> {
        let format = config.default_format(&FORMATS)?;
        let power = power.with_polarity(Polarity::ActiveLow);
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
        self.io.write(REG_EXPOSURE_L, (val & 0xff) as u8)?;
        self.io.write(REG_EXPOSURE_H, ((val >> 8) & 0xff) as u8)?;
        self.exposure.commit(val);
        Ok(())
    }
}

impl<I2C, D, RST, PWDN, X> Mira220<I2C, D, RST, PWDN, X>
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
        let power = power.with_polarity(Polarity::ActiveLow);
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
            ParamValue::GroupExpGain { exposure_time, .. } => {
                self.set_exposure_async(self.exposure.clamp_time(exposure_time)).await
            }
            ParamValue::VFlip(on) => {
                self.io.write_async(REG_VFLIP, on as u8).await?;
                self.vflip = on;
                Ok(())
            }
            ParamValue::HMirror(on) => {
                self.io.write_async(REG_HFLIP, on as u8).await?;
                self.hmirror = on;
                Ok(())
            }
            ParamValue::Gain(_) => {
                error!("set {} is not supported", value.id());
                Err(Error::InvalidArgument)
            }
        }
    }

    pub async fn set_stream_async(&mut self, on: bool) -> Result<(), Error<I2C::Error>> {
        let state = if on { IMAGER_STATE_STREAM } else { IMAGER_STATE_IDLE };
        self.io.write_async(REG_IMAGER_STATE, state).await?;
        self.io.write_async(REG_IMAGER_RUN, on as u8).await?;
        self.streaming = on;
        debug!("stream {}", on);
        Ok(())
    }

    async fn set_exposure_async(&mut self, val: u32) -> Result<(), Error<I2C::Error>> {
        let val = self.exposure.clamp(val);
        debug!("set exposure {:#x}", val);
        self.io.write_async(REG_EXPOSURE_L, (val & 0xff) as u8).await?;
        self.io.write_async(REG_EXPOSURE_H, ((val >> 8) & 0xff) as u8).await?;
        self.exposure.commit(val);
        Ok(())
    }
}

impl<I2C, D, RST, PWDN, X> CameraSensor for Mira220<I2C, D, RST, PWDN, X>
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
            ParamId::GroupExpGain => Ok(ParamDesc::GROUP_EXP_GAIN),
            ParamId::VFlip | ParamId::HMirror => Ok(ParamDesc::SWITCH),
            ParamId::Gain => {
                error!("id {} is not supported", id);
                Err(Error::InvalidArgument)
            }
        }
    }

    fn get_para_value(&self, id: ParamId) -> Result<ParamValue, Self::Error> {
        match id {
            ParamId::ExposureVal => Ok(ParamValue::ExposureVal(self.exposure.value())),
            ParamId::ExposureTime => Ok(ParamValue::ExposureTime(self.exposure.time())),
            ParamId::VFlip => Ok(ParamValue::VFlip(self.vflip)),
            ParamId::HMirror => Ok(ParamValue::HMirror(self.hmirror)),
            ParamId::Gain | ParamId::GroupExpGain => Err(Error::NotSupported),
        }
    }

    fn set_para_value(&mut self, value: ParamValue) -> Result<(), Self::Error> {
        match value {
            ParamValue::ExposureVal(v) => self.set_exposure(v),
            ParamValue::ExposureTime(t) => self.set_exposure(self.exposure.clamp_time(t)),
            ParamValue::GroupExpGain { exposure_time, .. } => self.set_exposure(self.exposure.clamp_time(exposure_time)),
            ParamValue::VFlip(on) => {
                self.io.write(REG_VFLIP, on as u8)?;
                self.vflip = on;
                Ok(())
            }
            ParamValue::HMirror(on) => {
                self.io.write(REG_HFLIP, on as u8)?;
                self.hmirror = on;
                Ok(())
            }
            ParamValue::Gain(_) => {
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
        self.io.write(REG_SW_RESET, 0x01u8)
    }

    fn set_register(&mut self, reg: u16, value: u32) -> Result<(), Self::Error> {
        let value = narrow_u8(value)?;
        self.io.write(reg, value)
    }

    fn get_register(&mut self, reg: u16) -> Result<u32, Self::Error> {
        self.io.read::<u8>(reg).map(u32::from)
    }

    fn set_stream(&mut self, on: bool) -> Result<(), Self::Error> {
        let state = if on { IMAGER_STATE_STREAM } else { IMAGER_STATE_IDLE };
        self.io.write(REG_IMAGER_STATE, state)?;
        self.io.write(REG_IMAGER_RUN, on as u8)?;
        self.streaming = on;
        debug!("stream {}", on);
        Ok(())
    }

    fn stream_status(&self) -> bool {
        self.streaming
    }

    fn set_test_pattern(&mut self, on: bool) -> Result<(), Self::Error> {
        self.io.set_reg_bits(REG_TEST_PATTERN, 0, 1, on as u8)
    }

    fn chip_id(&mut self) -> Result<SensorId, Self::Error> {
        Ok(SensorId { pid: self.io.read_id(&IDENTITY)? })
    }
}
