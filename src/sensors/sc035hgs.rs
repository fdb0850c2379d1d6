//! SmartSens SC035HGS: 640x480 global shutter, RAW10 over 1-lane MIPI.

use embedded_hal::{delay::DelayNs, digital::OutputPin, i2c::I2c};
use fugit::{ExtU32 as _, HertzU32};

use crate::{
    error::Error,
    format::{Bayer, Capability, IspInfo, MipiInfo, PixelFormat, Port, SensorFormat, SensorId},
    param::{ParamDesc, ParamId, ParamValue},
    power::{NoPin, PowerControl, NO_SETTLE},
    program::{RegList, RegProgram},
    sensor::{narrow_u8, CameraSensor, IdRegs, Identity, SensorConfig, SensorIo},
    xclk::{NoXclk, XclkGenerator},
};

pub const NAME: &str = "SC035HGS";
pub const SCCB_ADDR: u8 = 0x30;
pub const PID: u32 = 0x0031;

pub const CONFIG: SensorConfig = SensorConfig::new(SCCB_ADDR, 0);

pub const REG_DELAY: u16 = 0xfefe;
const REG_ID_HIGH: u16 = 0x3107;
const REG_ID_LOW: u16 = 0x3108;
const REG_SLEEP_MODE: u16 = 0x0100;
const REG_SOFT_RESET: u16 = 0x0103;
const REG_GROUP_HOLD: u16 = 0x3812;
const REG_BLC_CTRL0: u16 = 0x3900;
const REG_BLC_CTRL1: u16 = 0x3902;
const REG_MIRROR_FLIP: u16 = 0x3221;
const REG_TEST_PATTERN: u16 = 0x4501;
const REG_OUT_WIDTH_H: u16 = 0x3208;
const REG_OUT_WIDTH_L: u16 = 0x3209;
const REG_OUT_HEIGHT_H: u16 = 0x320a;
const REG_OUT_HEIGHT_L: u16 = 0x320b;
const REG_HTS_H: u16 = 0x320c;
const REG_HTS_L: u16 = 0x320d;
const REG_VTS_H: u16 = 0x320e;
const REG_VTS_L: u16 = 0x320f;

static MIPI_1LANE_RAW10_640X480_48FPS: [(u16, u8); 18] = [
    (REG_SOFT_RESET, 0x01),
    (REG_SLEEP_MODE, 0x00),
    (REG_DELAY, 10),
    (REG_GROUP_HOLD, 0x00),
    (REG_OUT_WIDTH_H, 0x02),
    (REG_OUT_WIDTH_L, 0x80),
    (REG_OUT_HEIGHT_H, 0x01),
    (REG_OUT_HEIGHT_L, 0xe0),
    (REG_HTS_H, 0x04),
    (REG_HTS_L, 0x70),
    (REG_VTS_H, 0x03),
    (REG_VTS_L, 0x94),
    (REG_BLC_CTRL0, 0x01),
    (REG_BLC_CTRL1, 0xc5),
    (REG_MIRROR_FLIP, 0x00),
    (REG_GROUP_HOLD, 0x30),
    (REG_DELAY, 5),
    (REG_SLEEP_MODE, 0x00),
];

pub static FORMATS: [SensorFormat; 1] = [SensorFormat {
    name: "MIPI_1lane_20Minput_raw10_640x480_48fps",
    format: PixelFormat::Raw10,
    port: Port::MipiCsi,
    xclk: HertzU32::from_raw(20_000_000),
    width: 640,
    height: 480,
    fps: 48,
    regs: RegList::A16V8(RegProgram::new(&MIPI_1LANE_RAW10_640X480_48FPS, REG_DELAY)),
    isp_info: IspInfo {
        pclk: HertzU32::from_raw(50_056_704),
        vts: 0x394,
        hts: 0x470,
        tline_ns: 0,
        gain_def: 0,
        exp_def: 0,
        bayer: Bayer::Bggr,
    },
    mipi: Some(MipiInfo { mipi_clk: HertzU32::from_raw(500_000_000), lane_num: 1, line_sync_en: false }),
}];

const IDENTITY: Identity = Identity {
    name: NAME,
    pid: PID,
    id: IdRegs::Split { high: REG_ID_HIGH, low: REG_ID_LOW },
    xclk_settle: NO_SETTLE,
};

pub struct Sc035hgs<I2C, D, RST = NoPin, PWDN = NoPin, X = NoXclk> {
    io: SensorIo<I2C, RST, PWDN, X, D>,
    config: SensorConfig,
    id: SensorId,
    format: &'static SensorFormat,
    streaming: bool,
}

impl<I2C, D, RST, PWDN, X> Sc035hgs<I2C, D, RST, PWDN, X> {
    pub fn release(self) -> (I2C, PowerControl<RST, PWDN, X>, D) {
        self.io.release()
    }
}

impl<I2C, D, RST, PWDN, X> Sc035hgs<I2C, D, RST, PWDN, X>
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
        let mut io = SensorIo::new(i2c, config.sccb_addr, power, delay);
        let id = io.detect(&IDENTITY, format.xclk)?;
        Ok(Self { io, config, id, format, streaming: false })
    }

    pub fn power_off(&mut self) -> Result<(), Error<I2C::Error>> {
        self.io.power_off()
    }
}

impl<I2C, D, RST, PWDN, X> Sc035hgs<I2C, D, RST, PWDN, X>
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
        Ok(Self { io, config, id, format, streaming: false })
    }

    pub async fn power_off_async(&mut self) -> Result<(), Error<I2C::Error>> {
        self.io.power_off_async().await
    }

    pub async fn set_format_async(&mut self, format: Option<&'static SensorFormat>) -> Result<(), Error<I2C::Error>> {
        let format = self.config.select_format(format, &FORMATS)?;
        self.io.write_list_async(&format.regs, NAME).await?;
        self.format = format;
        Ok(())
    }

    pub async fn set_para_value_async(&mut self, value: ParamValue) -> Result<(), Error<I2C::Error>> {
        match value {
            ParamValue::VFlip(on) => {
                self.io
                    .set_reg_bits_async(REG_MIRROR_FLIP, 5, 2, if on { 0x03 } else { 0x00 })
                    .await
            }
            ParamValue::HMirror(on) => {
                self.io
                    .set_reg_bits_async(REG_MIRROR_FLIP, 1, 2, if on { 0x03 } else { 0x00 })
                    .await
            }
            _ => {
                error!("set {} is not supported", value.id());
                Err(Error::InvalidArgument)
            }
        }
    }

    pub async fn set_stream_async(&mut self, on: bool) -> Result<(), Error<I2C::Error>> {
        self.io.write_async(REG_SLEEP_MODE, on as u8).await?;
        self.streaming = on;
        debug!("stream {}", on);
        Ok(())
    }
}

impl<I2C, D, RST, PWDN, X> CameraSensor for Sc035hgs<I2C, D, RST, PWDN, X>
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
            ParamId::VFlip | ParamId::HMirror => Ok(ParamDesc::SWITCH),
            _ => {
                error!("id {} is not supported", id);
                Err(Error::InvalidArgument)
            }
        }
    }

    fn get_para_value(&self, _id: ParamId) -> Result<ParamValue, Self::Error> {
        Err(Error::NotSupported)
    }

    fn set_para_value(&mut self, value: ParamValue) -> Result<(), Self::Error> {
        match value {
            ParamValue::VFlip(on) => self.io.set_reg_bits(REG_MIRROR_FLIP, 5, 2, if on { 0x03 } else { 0x00 }),
            ParamValue::HMirror(on) => self.io.set_reg_bits(REG_MIRROR_FLIP, 1, 2, if on { 0x03 } else { 0x00 }),
            _ => {
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
        self.format = format;
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
        self.io.write(REG_SLEEP_MODE, on as u8)?;
        self.streaming = on;
        debug!("stream {}", on);
        Ok(())
    }

    fn stream_status(&self) -> bool {
        self.streaming
    }

    fn set_test_pattern(&mut self, on: bool) -> Result<(), Self::Error> {
        self.io.set_reg_bits(REG_TEST_PATTERN, 3, 1, on as u8)
    }

    fn chip_id(&mut self) -> Result<SensorId, Self::Error> {
        Ok(SensorId { pid: self.io.read_id(&IDENTITY)? })
    }
}
