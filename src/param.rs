//! Sensor parameters: ids, descriptors and values.

/// Parameters a sensor may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamId {
    /// Exposure in raw register units
    ExposureVal,
    /// Exposure in units of [`EXPOSURE_TIME_UNIT_US`](crate::exposure::EXPOSURE_TIME_UNIT_US)
    ExposureTime,
    /// Index into the gain table
    Gain,
    /// Exposure time and gain index, applied together
    GroupExpGain,
    VFlip,
    HMirror,
}

impl core::fmt::Display for ParamId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ParamId::ExposureVal => "exposure_val",
            ParamId::ExposureTime => "exposure_time",
            ParamId::Gain => "gain",
            ParamId::GroupExpGain => "group_exp_gain",
            ParamId::VFlip => "vflip",
            ParamId::HMirror => "hmirror",
        })
    }
}

/// Shape and range of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamDesc {
    Number { min: u32, max: u32, step: u32, default: u32 },
    /// `elements` are total gain x1000, `default` is an index into them
    Enumeration { elements: &'static [u32], default: u32 },
    /// Opaque payload of `size` bytes
    Bytes { size: usize },
}

impl ParamDesc {
    /// Boolean switch, off by default.
    pub const SWITCH: ParamDesc = ParamDesc::Number { min: 0, max: 1, step: 1, default: 0 };

    /// Descriptor of [`ParamId::GroupExpGain`]: exposure time and gain index as two u32.
    pub const GROUP_EXP_GAIN: ParamDesc = ParamDesc::Bytes { size: 8 };
}

#[cfg(feature = "defmt")]
impl defmt::Format for ParamDesc {
    fn format(&self, f: defmt::Formatter) {
        match *self {
            ParamDesc::Number { min, max, step, default } => {
                defmt::write!(f, "Number({}..={} step {}, default {})", min, max, step, default)
            }
            ParamDesc::Enumeration { elements, default } => {
                defmt::write!(f, "Enumeration({} entries, default {})", elements.len(), default)
            }
            ParamDesc::Bytes { size } => defmt::write!(f, "Bytes({})", size),
        }
    }
}

/// A parameter value, tagged with its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamValue {
    ExposureVal(u32),
    ExposureTime(u32),
    Gain(u32),
    GroupExpGain { exposure_time: u32, gain_index: u32 },
    VFlip(bool),
    HMirror(bool),
}

impl ParamValue {
    pub fn id(&self) -> ParamId {
        match self {
            ParamValue::ExposureVal(_) => ParamId::ExposureVal,
            ParamValue::ExposureTime(_) => ParamId::ExposureTime,
            ParamValue::Gain(_) => ParamId::Gain,
            ParamValue::GroupExpGain { .. } => ParamId::GroupExpGain,
            ParamValue::VFlip(_) => ParamId::VFlip,
            ParamValue::HMirror(_) => ParamId::HMirror,
        }
    }
}
