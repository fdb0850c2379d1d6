//! Exposure: conversion between register units and exposure time, and the
//! clamped state a driver keeps for the current mode.
//!
//! Register units are either sub-line steps tied to the frame timing
//! (`1 / (fps * vts * steps_per_line)` seconds each) or whole lines of a
//! known line time. Exposure time is counted in units of
//! [`EXPOSURE_TIME_UNIT_US`]. All conversions round to nearest.

use crate::{
    format::SensorFormat,
    param::{ParamDesc, ParamId},
};

/// Exposure time unit in microseconds.
pub const EXPOSURE_TIME_UNIT_US: u32 = 100;

const UNITS_PER_SECOND: u64 = 1_000_000 / EXPOSURE_TIME_UNIT_US as u64;
const UNIT_NS: u64 = EXPOSURE_TIME_UNIT_US as u64 * 1000;

#[inline]
fn div_round(n: u64, d: u64) -> u32 {
    if d == 0 {
        return 0;
    }
    ((n + d / 2) / d).min(u32::MAX as u64) as u32
}

/// How long one exposure register step lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineTime {
    /// `steps_per_line` steps per line, `vts` lines per frame, `fps` frames per second
    Frame { fps: u32, vts: u32, steps_per_line: u32 },
    /// One step per line of `tline_ns`
    Line { tline_ns: u32 },
}

impl LineTime {
    /// Exposure time to register units.
    pub fn to_register(&self, time: u32) -> u32 {
        match *self {
            LineTime::Frame { fps, vts, steps_per_line } => {
                let steps = fps as u64 * vts as u64 * steps_per_line as u64;
                div_round(time as u64 * steps, UNITS_PER_SECOND)
            }
            LineTime::Line { tline_ns } => div_round(time as u64 * UNIT_NS, tline_ns as u64),
        }
    }

    /// Register units to exposure time.
    pub fn to_time(&self, reg: u32) -> u32 {
        match *self {
            LineTime::Frame { fps, vts, steps_per_line } => {
                let steps = fps as u64 * vts as u64 * steps_per_line as u64;
                div_round(reg as u64 * UNITS_PER_SECOND, steps)
            }
            LineTime::Line { tline_ns } => div_round(reg as u64 * tline_ns as u64, UNIT_NS),
        }
    }
}

/// Register unit flavour of a sensor, independent of the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureUnit {
    /// Steps of `1 / steps_per_line` lines, derived from fps and VTS
    FrameSteps(u32),
    /// Whole lines of the mode's `tline_ns`
    Lines,
}

/// Per-sensor exposure rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExposureModel {
    pub unit: ExposureUnit,
    /// Smallest register value the sensor accepts
    pub min: u32,
    /// Maximum is `vts - max_offset`
    pub max_offset: u32,
}

impl ExposureModel {
    pub fn line_time(&self, format: &SensorFormat) -> LineTime {
        match self.unit {
            ExposureUnit::FrameSteps(steps_per_line) => LineTime::Frame {
                fps: format.fps,
                vts: format.isp_info.vts,
                steps_per_line,
            },
            ExposureUnit::Lines => LineTime::Line { tline_ns: format.isp_info.tline_ns },
        }
    }

    pub fn limits(&self, format: &SensorFormat) -> ExposureLimits {
        ExposureLimits {
            min: self.min,
            max: format.isp_info.vts.saturating_sub(self.max_offset),
        }
    }

    /// Fresh state for `format`, holding its default exposure.
    pub fn for_format(&self, format: &SensorFormat) -> Exposure {
        let info = &format.isp_info;
        Exposure {
            line: self.line_time(format),
            limits: self.limits(format),
            default: info.exp_def,
            value: info.exp_def,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExposureLimits {
    pub min: u32,
    pub max: u32,
}

impl ExposureLimits {
    /// `min(max(v, min), max)`: the upper bound wins when the range is empty.
    pub fn clamp(&self, v: u32) -> u32 {
        v.max(self.min).min(self.max)
    }
}

/// Exposure of the current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exposure {
    line: LineTime,
    limits: ExposureLimits,
    default: u32,
    value: u32,
}

impl Exposure {
    pub fn line_time(&self) -> LineTime {
        self.line
    }

    pub fn limits(&self) -> ExposureLimits {
        self.limits
    }

    /// Current value in register units.
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Current value as exposure time.
    pub fn time(&self) -> u32 {
        self.line.to_time(self.value)
    }

    /// Clamped register value for a raw request.
    pub fn clamp(&self, reg: u32) -> u32 {
        self.limits.clamp(reg)
    }

    /// Clamped register value for an exposure time request.
    pub fn clamp_time(&self, time: u32) -> u32 {
        self.limits.clamp(self.line.to_register(time))
    }

    /// Record a value that has been written to the sensor.
    pub fn commit(&mut self, reg: u32) {
        self.value = reg;
    }

    /// Descriptor for [`ParamId::ExposureVal`] or [`ParamId::ExposureTime`].
    pub fn descriptor(&self, id: ParamId) -> Option<ParamDesc> {
        let ExposureLimits { min, max } = self.limits;
        match id {
            ParamId::ExposureVal => Some(ParamDesc::Number { min, max, step: 1, default: self.default }),
            ParamId::ExposureTime => Some(ParamDesc::Number {
                min: self.line.to_time(min).max(1),
                max: self.line.to_time(max),
                step: self.line.to_time(1).max(1),
                default: self.line.to_time(self.default),
            }),
            _ => None,
        }
    }
}
