//! Sensor modes and the static facts a driver reports about itself.

use fugit::HertzU32;

use crate::program::RegList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PixelFormat {
    Raw8,
    Raw10,
    Raw12,
    Yuv420,
    Yuv422,
    Rgb565,
    Rgb888,
    Grayscale,
    Jpeg,
}

impl PixelFormat {
    pub fn is_raw(&self) -> bool {
        matches!(self, PixelFormat::Raw8 | PixelFormat::Raw10 | PixelFormat::Raw12)
    }

    /// Bits per pixel on the wire.
    pub fn bits_per_pixel(&self) -> u32 {
        match self {
            PixelFormat::Raw8 | PixelFormat::Grayscale | PixelFormat::Jpeg => 8,
            PixelFormat::Raw10 => 10,
            PixelFormat::Raw12 | PixelFormat::Yuv420 => 12,
            PixelFormat::Yuv422 | PixelFormat::Rgb565 => 16,
            PixelFormat::Rgb888 => 24,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    MipiCsi,
    Dvp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bayer {
    Rggb,
    Grbg,
    Gbrg,
    Bggr,
}

/// Timing facts the ISP needs to run AE/AGC for a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IspInfo {
    pub pclk: HertzU32,
    /// Frame length in lines
    pub vts: u32,
    /// Line length in pixel clocks
    pub hts: u32,
    /// Line time in ns, 0 when the sensor does not use it
    pub tline_ns: u32,
    /// Default gain index
    pub gain_def: u32,
    /// Default exposure in register units
    pub exp_def: u32,
    pub bayer: Bayer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MipiInfo {
    pub mipi_clk: HertzU32,
    pub lane_num: u8,
    pub line_sync_en: bool,
}

/// One selectable sensor mode.
#[derive(Debug, Clone, Copy)]
pub struct SensorFormat {
    pub name: &'static str,
    pub format: PixelFormat,
    pub port: Port,
    pub xclk: HertzU32,
    pub width: u16,
    pub height: u16,
    pub fps: u32,
    pub regs: RegList,
    pub isp_info: IspInfo,
    pub mipi: Option<MipiInfo>,
}

impl SensorFormat {
    /// Identity comparison: the same table entry.
    pub fn is(&self, other: &SensorFormat) -> bool {
        core::ptr::eq(self, other)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorFormat {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str} {}x{}@{} {}", self.name, self.width, self.height, self.fps, self.format)
    }
}

/// Output formats a sensor can produce.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Capability {
    pub fmt_raw: bool,
    pub fmt_yuv: bool,
    pub fmt_rgb: bool,
    pub fmt_jpeg: bool,
}

impl Capability {
    pub const RAW: Capability = Capability { fmt_raw: true, fmt_yuv: false, fmt_rgb: false, fmt_jpeg: false };
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorId {
    pub pid: u32,
}

/// Product id from separate high and low id registers.
#[inline]
#[cfg_attr(
    not(any(
        feature = "gc2607",
        feature = "sc202cs",
        feature = "sc035hgs",
        feature = "mira220",
        feature = "pivariety"
    )),
    allow(dead_code)
)]
pub(crate) fn pid_from_bytes(high: u8, low: u8) -> u32 {
    u16::from_be_bytes([high, low]) as u32
}
