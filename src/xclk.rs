//! Sensor master clock (XCLK) generation from a timer-driven PWM channel.

use core::convert::Infallible;

use embedded_hal::pwm::SetDutyCycle;
use fugit::HertzU32;

use crate::error::XclkError;

/// Something that can drive the sensor's XCLK input.
pub trait XclkGenerator {
    type Error;

    /// Start (or retune) the clock at `freq`.
    fn start(&mut self, freq: HertzU32) -> Result<(), Self::Error>;

    /// Stop the clock and leave the line at its idle (low) level.
    fn stop(&mut self) -> Result<(), Self::Error>;
}

/// The frequency half of a PWM peripheral.
pub trait XclkTimer {
    type Error;

    fn set_frequency(&mut self, freq: HertzU32) -> Result<(), Self::Error>;
}

/// XCLK from a timer and one of its PWM channels, at 50 % duty.
pub struct PwmXclk<T, P> {
    timer: T,
    channel: P,
    freq: Option<HertzU32>,
}

impl<T, P> PwmXclk<T, P>
where
    T: XclkTimer,
    P: SetDutyCycle,
{
    pub fn new(timer: T, channel: P) -> Self {
        Self { timer, channel, freq: None }
    }

    /// Frequency of the running clock, `None` when stopped.
    pub fn frequency(&self) -> Option<HertzU32> {
        self.freq
    }

    pub fn release(self) -> (T, P) {
        (self.timer, self.channel)
    }
}

impl<T, P> XclkGenerator for PwmXclk<T, P>
where
    T: XclkTimer,
    P: SetDutyCycle,
{
    type Error = XclkError<T::Error, P::Error>;

    fn start(&mut self, freq: HertzU32) -> Result<(), Self::Error> {
        if freq.raw() == 0 {
            error!("xclk frequency must be non-zero");
            return Err(XclkError::InvalidFrequency);
        }
        self.timer.set_frequency(freq).map_err(XclkError::Timer)?;
        self.channel.set_duty_cycle_percent(50).map_err(XclkError::Channel)?;
        self.freq = Some(freq);
        debug!("xclk running at {} Hz", freq.raw());
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        if self.freq.is_none() {
            return Ok(());
        }
        self.channel.set_duty_cycle_fully_off().map_err(XclkError::Channel)?;
        self.freq = None;
        debug!("xclk stopped");
        Ok(())
    }
}

/// The clock comes from a crystal or another part of the board.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoXclk;

impl XclkGenerator for NoXclk {
    type Error = Infallible;

    fn start(&mut self, _freq: HertzU32) -> Result<(), Self::Error> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
