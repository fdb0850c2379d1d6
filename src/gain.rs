//! Gain tables: total gain x1000 per index, ascending.

use crate::param::ParamDesc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GainTable {
    values: &'static [u32],
    /// Last usable index
    last: usize,
}

impl GainTable {
    /// Table with every entry usable. `values` must not be empty.
    pub const fn new(values: &'static [u32]) -> Self {
        Self { values, last: values.len().saturating_sub(1) }
    }

    /// Restrict the table to entries not above `abs_limit`.
    ///
    /// When the first entry is already above the limit it stays usable, so
    /// there is always at least one gain to select.
    pub fn limited(self, abs_limit: u32) -> Self {
        let last = match self.values.iter().position(|&v| v > abs_limit) {
            Some(i) => i.saturating_sub(1),
            None => self.values.len().saturating_sub(1),
        };
        Self { last, ..self }
    }

    /// The usable entries.
    pub fn usable(&self) -> &'static [u32] {
        let values: &'static [u32] = self.values;
        &values[..(self.last + 1).min(values.len())]
    }

    pub fn last_index(&self) -> usize {
        self.last
    }

    pub fn clamp_index(&self, index: u32) -> u32 {
        index.min(self.last as u32)
    }

    /// Total gain x1000 at `index`, clamped to the usable range.
    pub fn value(&self, index: u32) -> u32 {
        self.values
            .get(self.clamp_index(index) as usize)
            .copied()
            .unwrap_or(1000)
    }

    /// Usable index whose gain is closest to `target_x1000`. Ties go to the lower index.
    pub fn nearest_index(&self, target_x1000: u32) -> u32 {
        let mut best = 0usize;
        let mut best_diff = u32::MAX;
        for (i, &v) in self.usable().iter().enumerate() {
            let diff = v.abs_diff(target_x1000);
            if diff < best_diff {
                best = i;
                best_diff = diff;
            }
        }
        best as u32
    }

    /// Enumeration of the usable entries. `default` is clamped into them.
    pub fn descriptor(&self, default: u32) -> ParamDesc {
        ParamDesc::Enumeration { elements: self.usable(), default: self.clamp_index(default) }
    }
}

/// Single 1x entry, for sensors without programmable gain.
pub static UNITY_GAIN: [u32; 1] = [1000];

/// Size of the 1/1024 step analog gain table.
pub const STEP_1024_LEN: usize = 979;

/// Analog gain of `1024 / (1024 - code)` for code `0..979`, x1000 rounded.
pub static STEP_1024_GAIN: [u32; STEP_1024_LEN] = step_1024_table();

const fn step_1024_table() -> [u32; STEP_1024_LEN] {
    let mut t = [0u32; STEP_1024_LEN];
    let mut i = 0;
    while i < STEP_1024_LEN {
        let d = 1024 - i as u32;
        t[i] = (1_024_000 + d / 2) / d;
        i += 1;
    }
    t
}
