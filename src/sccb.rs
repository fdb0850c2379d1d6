//! SCCB register access with 16-bit register addresses.
//!
//! SCCB is I2C compatible for the transactions used here, so the bus is any
//! [`embedded_hal::i2c::I2c`] (or the async flavour for the `_async`
//! methods). Values are 8 bit (`a16v8`) or 32 bit big-endian (`a16v32`).

use embedded_hal::{delay::DelayNs, i2c::I2c};
use fugit::ExtU32 as _;

use crate::program::{RegList, RegProgram, RegValue, Step};

/// A sensor sitting at `addr` on an SCCB bus.
pub struct Sccb<I2C> {
    i2c: I2C,
    addr: u8,
}

#[inline]
fn frame<V: RegValue>(reg: u16, val: V) -> ([u8; 6], usize) {
    let [hi, lo] = reg.to_be_bytes();
    let v = val.to_be_bytes4();
    ([hi, lo, v[0], v[1], v[2], v[3]], 2 + V::WIDTH)
}

/// Field mask for `length` bits starting at `offset`.
#[inline]
fn field_mask(offset: u8, length: u8) -> u8 {
    ((((1u16 << length) - 1) << offset) & 0xff) as u8
}

/// Replace the bit field `[offset, offset + length)` of `old` with `value`.
pub(crate) fn merge_bits(old: u8, offset: u8, length: u8, value: u8) -> u8 {
    let mask = field_mask(offset, length);
    let shifted = ((value as u16) << offset) as u8;
    (old & !mask) | (shifted & mask)
}

impl<I2C> Sccb<I2C> {
    pub fn new(i2c: I2C, addr: u8) -> Self {
        Self { i2c, addr }
    }

    /// 7-bit bus address of the sensor.
    pub fn addr(&self) -> u8 {
        self.addr
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> Sccb<I2C> {
    pub fn read<V: RegValue>(&mut self, reg: u16) -> Result<V, I2C::Error> {
        let mut buf = [0u8; 4];
        self.i2c
            .write_read(self.addr, &reg.to_be_bytes(), &mut buf[..V::WIDTH])?;
        let val = V::from_be_bytes4(buf);
        trace!("read {:#x} = {:#x}", reg, val.widen());
        Ok(val)
    }

    pub fn write<V: RegValue>(&mut self, reg: u16, val: V) -> Result<(), I2C::Error> {
        trace!("write {:#x} to {:#x}", val.widen(), reg);
        let (buf, len) = frame(reg, val);
        self.i2c.write(self.addr, &buf[..len])
    }

    /// Read-modify-write of an 8-bit register field.
    pub fn set_reg_bits(&mut self, reg: u16, offset: u8, length: u8, value: u8) -> Result<(), I2C::Error> {
        let old: u8 = self.read(reg)?;
        self.write(reg, merge_bits(old, offset, length, value))
    }

    /// Apply `program` in order, stopping at the first bus error.
    pub fn write_program<V: RegValue, D: DelayNs>(
        &mut self,
        program: &RegProgram<'_, V>,
        delay: &mut D,
    ) -> Result<(), I2C::Error> {
        let mut written = 0usize;
        for step in program.steps() {
            match step {
                Step::Write(reg, val) => {
                    self.write(reg, val)?;
                    written += 1;
                }
                Step::Pause(ms) => crate::sleep(delay, ms.millis()),
            }
        }
        debug!("program done, {} writes", written);
        Ok(())
    }

    /// Apply a program of whichever width.
    pub fn write_list<D: DelayNs>(&mut self, list: &RegList, delay: &mut D) -> Result<(), I2C::Error> {
        match list {
            RegList::A16V8(p) => self.write_program(p, delay),
            RegList::A16V32(p) => self.write_program(p, delay),
        }
    }
}

impl<I2C: embedded_hal_async::i2c::I2c> Sccb<I2C> {
    pub async fn read_async<V: RegValue>(&mut self, reg: u16) -> Result<V, I2C::Error> {
        let mut buf = [0u8; 4];
        self.i2c
            .write_read(self.addr, &reg.to_be_bytes(), &mut buf[..V::WIDTH])
            .await?;
        let val = V::from_be_bytes4(buf);
        trace!("read {:#x} = {:#x}", reg, val.widen());
        Ok(val)
    }

    pub async fn write_async<V: RegValue>(&mut self, reg: u16, val: V) -> Result<(), I2C::Error> {
        trace!("write {:#x} to {:#x}", val.widen(), reg);
        let (buf, len) = frame(reg, val);
        self.i2c.write(self.addr, &buf[..len]).await
    }

    pub async fn set_reg_bits_async(
        &mut self,
        reg: u16,
        offset: u8,
        length: u8,
        value: u8,
    ) -> Result<(), I2C::Error> {
        let old: u8 = self.read_async(reg).await?;
        self.write_async(reg, merge_bits(old, offset, length, value)).await
    }

    pub async fn write_program_async<V: RegValue, D: embedded_hal_async::delay::DelayNs>(
        &mut self,
        program: &RegProgram<'_, V>,
        delay: &mut D,
    ) -> Result<(), I2C::Error> {
        let mut written = 0usize;
        for step in program.steps() {
            match step {
                Step::Write(reg, val) => {
                    self.write_async(reg, val).await?;
                    written += 1;
                }
                Step::Pause(ms) => delay.delay_ms(ms).await,
            }
        }
        debug!("program done, {} writes", written);
        Ok(())
    }

    pub async fn write_list_async<D: embedded_hal_async::delay::DelayNs>(
        &mut self,
        list: &RegList,
        delay: &mut D,
    ) -> Result<(), I2C::Error> {
        match list {
            RegList::A16V8(p) => self.write_program_async(p, delay).await,
            RegList::A16V32(p) => self.write_program_async(p, delay).await,
        }
    }
}
