#![allow(dead_code)]

use cam_sensor::program::{RegList, RegValue, Step};
use embedded_hal_mock::eh1::i2c::Transaction as I2cTx;

/// Delay that records every requested sleep in milliseconds.
#[derive(Debug, Default, Clone)]
pub struct Sleeps(pub Vec<u32>);

impl embedded_hal::delay::DelayNs for Sleeps {
    fn delay_ns(&mut self, ns: u32) {
        self.0.push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.push(ms);
    }
}

impl embedded_hal_async::delay::DelayNs for Sleeps {
    async fn delay_ns(&mut self, ns: u32) {
        self.0.push(ns / 1_000_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.0.push(ms);
    }
}

/// XCLK generator that records start frequencies, and 0 for every stop.
#[derive(Debug, Default)]
pub struct Clock(pub Vec<u32>);

impl cam_sensor::XclkGenerator for Clock {
    type Error = core::convert::Infallible;

    fn start(&mut self, freq: fugit::HertzU32) -> Result<(), Self::Error> {
        self.0.push(freq.raw());
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        self.0.push(0);
        Ok(())
    }
}

pub fn write8(addr: u8, reg: u16, val: u8) -> I2cTx {
    let [hi, lo] = reg.to_be_bytes();
    I2cTx::write(addr, vec![hi, lo, val])
}

pub fn write32(addr: u8, reg: u16, val: u32) -> I2cTx {
    let mut bytes = reg.to_be_bytes().to_vec();
    bytes.extend_from_slice(&val.to_be_bytes());
    I2cTx::write(addr, bytes)
}

pub fn read8(addr: u8, reg: u16, val: u8) -> I2cTx {
    I2cTx::write_read(addr, reg.to_be_bytes().to_vec(), vec![val])
}

pub fn read32(addr: u8, reg: u16, val: u32) -> I2cTx {
    I2cTx::write_read(addr, reg.to_be_bytes().to_vec(), val.to_be_bytes().to_vec())
}

fn program_writes<V: RegValue>(addr: u8, steps: impl Iterator<Item = Step<V>>, out: &mut Vec<I2cTx>) -> Vec<u32> {
    let mut pauses = Vec::new();
    for step in steps {
        match step {
            Step::Write(reg, val) => {
                let mut bytes = reg.to_be_bytes().to_vec();
                bytes.extend_from_slice(&val.to_be_bytes4()[..V::WIDTH]);
                out.push(I2cTx::write(addr, bytes));
            }
            Step::Pause(ms) => pauses.push(ms),
        }
    }
    pauses
}

/// Bus transactions a mode program produces, and the pauses between them.
pub fn expect_program(addr: u8, list: &RegList) -> (Vec<I2cTx>, Vec<u32>) {
    let mut out = Vec::new();
    let pauses = match list {
        RegList::A16V8(p) => program_writes(addr, p.steps(), &mut out),
        RegList::A16V32(p) => program_writes(addr, p.steps(), &mut out),
    };
    (out, pauses)
}
