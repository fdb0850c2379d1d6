//! Register-level drivers for MIPI-CSI / DVP camera sensors controlled over
//! SCCB.
//!
//! Each driver in [`sensors`] owns the sensor's SCCB bus handle, its
//! optional RESET/PWDN pins and XCLK generator, and a delay provider, and
//! implements [`CameraSensor`]. Drivers program the sensor into a mode by
//! replaying a register table, and translate exposure and gain requests
//! between the sensor's register units and the standard units in
//! [`exposure`] and [`gain`].
//!
//! Over an `embedded-hal-async` bus and delay the drivers also offer
//! `detect_async`, `set_format_async`, `set_para_value_async`,
//! `set_stream_async` and `power_off_async`.
//!
//! ```ignore
//! let power = PowerControl::new(Some(rst), None::<NoPin>).with_xclk(PwmXclk::new(timer, channel));
//! let mut cam = Gc2607::detect(i2c, power, delay, sensors::gc2607::CONFIG)?;
//! cam.set_format(None)?;
//! cam.set_para_value(ParamValue::ExposureTime(100))?;
//! cam.set_stream(true)?;
//! ```
//!
//! The image data path (CSI/DVP receiver, DMA, ISP) is not part of this crate.
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod macros;

pub mod error;
pub mod exposure;
pub mod format;
pub mod gain;
pub mod param;
pub mod power;
pub mod program;
pub mod sccb;
pub mod sensor;
pub mod sensors;
pub mod xclk;

use embedded_hal::delay::DelayNs;
use fugit::MillisDurationU32;

pub use error::{Error, XclkError};
pub use format::{Bayer, Capability, IspInfo, MipiInfo, PixelFormat, Port, SensorFormat, SensorId};
pub use param::{ParamDesc, ParamId, ParamValue};
pub use power::{NoPin, Polarity, PowerControl, PowerError};
pub use program::{RegList, RegProgram};
pub use sccb::Sccb;
pub use sensor::{CameraSensor, SensorConfig};
pub use xclk::{NoXclk, PwmXclk, XclkGenerator, XclkTimer};

#[cfg(feature = "gc2607")]
pub use sensors::gc2607::Gc2607;
#[cfg(feature = "mira220")]
pub use sensors::mira220::Mira220;
#[cfg(feature = "pivariety")]
pub use sensors::pivariety::{Pivariety, PivarietyConfig};
#[cfg(feature = "sc035hgs")]
pub use sensors::sc035hgs::Sc035hgs;
#[cfg(feature = "sc202cs")]
pub use sensors::sc202cs::Sc202cs;

pub(crate) fn sleep<D: DelayNs>(delay: &mut D, duration: MillisDurationU32) {
    delay.delay_ms(duration.to_millis());
}
