//! Register programs: ordered `(register, value)` tables with a reserved
//! "pause" address, applied verbatim to switch a sensor into a mode.

/// A register value width the SCCB layer knows how to put on the wire.
pub trait RegValue: Copy {
    /// Number of value bytes following the 16-bit register address.
    const WIDTH: usize;

    /// Big-endian value bytes, `WIDTH` long, left aligned in the array.
    fn to_be_bytes4(self) -> [u8; 4];

    /// Decode from big-endian bytes, `WIDTH` long, left aligned in the array.
    fn from_be_bytes4(bytes: [u8; 4]) -> Self;

    /// Value interpreted as a pause length in milliseconds.
    fn as_millis(self) -> u32;

    /// Widen to the common `u32` representation.
    fn widen(self) -> u32;
}

impl RegValue for u8 {
    const WIDTH: usize = 1;

    fn to_be_bytes4(self) -> [u8; 4] {
        [self, 0, 0, 0]
    }

    fn from_be_bytes4(bytes: [u8; 4]) -> Self {
        bytes[0]
    }

    fn as_millis(self) -> u32 {
        self as u32
    }

    fn widen(self) -> u32 {
        self as u32
    }
}

impl RegValue for u32 {
    const WIDTH: usize = 4;

    fn to_be_bytes4(self) -> [u8; 4] {
        self.to_be_bytes()
    }

    fn from_be_bytes4(bytes: [u8; 4]) -> Self {
        u32::from_be_bytes(bytes)
    }

    fn as_millis(self) -> u32 {
        self
    }

    fn widen(self) -> u32 {
        self
    }
}

/// One decoded entry of a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step<V> {
    /// Write `V` to the register
    Write(u16, V),
    /// Sleep for the given number of milliseconds, no bus traffic
    Pause(u32),
}

/// A read-only register program.
///
/// Entries whose address equals `delay` are pauses. When `end` is set, the
/// first entry with that address terminates the program.
#[derive(Debug, Clone, Copy)]
pub struct RegProgram<'a, V> {
    entries: &'a [(u16, V)],
    delay: u16,
    end: Option<u16>,
}

impl<'a, V: RegValue> RegProgram<'a, V> {
    /// Program that runs over every entry of `entries`.
    pub const fn new(entries: &'a [(u16, V)], delay: u16) -> Self {
        Self { entries, delay, end: None }
    }

    /// Program that stops at the first `end` entry.
    pub const fn terminated(entries: &'a [(u16, V)], delay: u16, end: u16) -> Self {
        Self { entries, delay, end: Some(end) }
    }

    pub const fn entries(&self) -> &'a [(u16, V)] {
        self.entries
    }

    pub fn steps(&self) -> Steps<'a, V> {
        Steps { entries: self.entries.iter(), delay: self.delay, end: self.end }
    }

    /// Total pause time in milliseconds.
    pub fn pause_ms(&self) -> u32 {
        self.steps()
            .map(|s| match s {
                Step::Pause(ms) => ms,
                Step::Write(..) => 0,
            })
            .sum()
    }

    /// Number of bus writes the program performs.
    pub fn write_count(&self) -> usize {
        self.steps().filter(|s| matches!(s, Step::Write(..))).count()
    }
}

/// Iterator over the steps of a [`RegProgram`].
pub struct Steps<'a, V> {
    entries: core::slice::Iter<'a, (u16, V)>,
    delay: u16,
    end: Option<u16>,
}

impl<V: RegValue> Iterator for Steps<'_, V> {
    type Item = Step<V>;

    fn next(&mut self) -> Option<Self::Item> {
        let &(reg, val) = self.entries.next()?;
        if Some(reg) == self.end {
            // Drain so the iterator stays fused
            self.entries = [].iter();
            return None;
        }
        if reg == self.delay {
            Some(Step::Pause(val.as_millis()))
        } else {
            Some(Step::Write(reg, val))
        }
    }
}

/// A program of either register width, so that formats of every sensor share
/// one type.
#[derive(Debug, Clone, Copy)]
pub enum RegList {
    /// 16-bit address, 8-bit value
    A16V8(RegProgram<'static, u8>),
    /// 16-bit address, 32-bit value
    A16V32(RegProgram<'static, u32>),
}

impl RegList {
    pub fn write_count(&self) -> usize {
        match self {
            RegList::A16V8(p) => p.write_count(),
            RegList::A16V32(p) => p.write_count(),
        }
    }

    pub fn pause_ms(&self) -> u32 {
        match self {
            RegList::A16V8(p) => p.pause_ms(),
            RegList::A16V32(p) => p.pause_ms(),
        }
    }
}
