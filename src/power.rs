//! Master clock, reset and power-down sequencing.

use core::convert::Infallible;

use embedded_hal::{
    delay::DelayNs,
    digital::{ErrorType, OutputPin},
};
use fugit::{HertzU32, MillisDurationU32};

use crate::xclk::{NoXclk, XclkGenerator};

/// Settle time after every pin edge.
pub const EDGE_SETTLE: MillisDurationU32 = MillisDurationU32::from_ticks(10);

/// No settle time after starting XCLK.
pub const NO_SETTLE: MillisDurationU32 = MillisDurationU32::from_ticks(0);

/// Placeholder for a pin the board does not wire up.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Level that puts the sensor in power-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

/// A power sequencing step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerError {
    /// A GPIO could not be driven
    Pin,
    /// The XCLK generator could not be started or stopped
    Xclk,
}

#[derive(Clone, Copy)]
enum Edge {
    /// `true` asserts power-down
    Pwdn(bool),
    /// Level of the RESET line
    Reset(bool),
}

const POWER_ON: [Edge; 4] = [Edge::Pwdn(true), Edge::Pwdn(false), Edge::Reset(false), Edge::Reset(true)];
const POWER_OFF: [Edge; 4] = [Edge::Pwdn(false), Edge::Pwdn(true), Edge::Reset(true), Edge::Reset(false)];
const RESET_PULSE: [Edge; 2] = [Edge::Reset(false), Edge::Reset(true)];

/// Optional XCLK generator, RESET and PWDN lines of one sensor.
pub struct PowerControl<RST = NoPin, PWDN = NoPin, X = NoXclk> {
    reset: Option<RST>,
    pwdn: Option<PWDN>,
    xclk: Option<X>,
    polarity: Polarity,
}

impl PowerControl<NoPin, NoPin, NoXclk> {
    /// No pins and no clock: the board powers the sensor and feeds XCLK.
    pub fn none() -> Self {
        Self { reset: None, pwdn: None, xclk: None, polarity: Polarity::ActiveHigh }
    }
}

impl<RST: OutputPin, PWDN: OutputPin> PowerControl<RST, PWDN, NoXclk> {
    pub fn new(reset: Option<RST>, pwdn: Option<PWDN>) -> Self {
        Self { reset, pwdn, xclk: None, polarity: Polarity::ActiveHigh }
    }
}

impl<RST: OutputPin, PWDN: OutputPin, X: XclkGenerator> PowerControl<RST, PWDN, X> {
    /// Drive XCLK from `xclk` while the sensor is powered.
    pub fn with_xclk<X2: XclkGenerator>(self, xclk: X2) -> PowerControl<RST, PWDN, X2> {
        PowerControl { reset: self.reset, pwdn: self.pwdn, xclk: Some(xclk), polarity: self.polarity }
    }

    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Give the pins and the clock back.
    pub fn release(self) -> (Option<RST>, Option<PWDN>, Option<X>) {
        (self.reset, self.pwdn, self.xclk)
    }

    /// Drive one edge. Returns whether a pin was there to drive.
    fn drive(&mut self, edge: Edge) -> Result<bool, PowerError> {
        let res = match edge {
            Edge::Pwdn(asserted) => {
                let high = asserted == (self.polarity == Polarity::ActiveHigh);
                match self.pwdn.as_mut() {
                    Some(pin) => set_level(pin, high),
                    None => return Ok(false),
                }
            }
            Edge::Reset(high) => match self.reset.as_mut() {
                Some(pin) => set_level(pin, high),
                None => return Ok(false),
            },
        };
        res.map(|_| true)
    }

    /// Start XCLK. Returns whether a generator is fitted.
    fn start_xclk(&mut self, freq: HertzU32) -> Result<bool, PowerError> {
        let Some(xclk) = self.xclk.as_mut() else {
            return Ok(false);
        };
        xclk.start(freq).map_err(|_| {
            error!("failed to start xclk at {} Hz", freq.raw());
            PowerError::Xclk
        })?;
        Ok(true)
    }

    fn stop_xclk(&mut self) -> Result<(), PowerError> {
        if let Some(xclk) = self.xclk.as_mut() {
            xclk.stop().map_err(|_| PowerError::Xclk)?;
        }
        Ok(())
    }

    /// Bring the sensor up: start XCLK at `freq` and let it settle, pulse
    /// PWDN, then pulse RESET.
    pub fn power_on<D: DelayNs>(
        &mut self,
        delay: &mut D,
        freq: HertzU32,
        xclk_settle: MillisDurationU32,
    ) -> Result<(), PowerError> {
        if self.start_xclk(freq)? && xclk_settle.ticks() > 0 {
            crate::sleep(delay, xclk_settle);
        }
        self.run(&POWER_ON, delay)?;
        debug!("sensor powered on");
        Ok(())
    }

    /// Stop XCLK, put the sensor into power-down and hold it in reset.
    pub fn power_off<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), PowerError> {
        self.stop_xclk()?;
        self.run(&POWER_OFF, delay)?;
        debug!("sensor powered off");
        Ok(())
    }

    /// Pulse RESET low then high.
    pub fn hw_reset<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), PowerError> {
        self.run(&RESET_PULSE, delay)
    }

    pub async fn power_on_async<D: embedded_hal_async::delay::DelayNs>(
        &mut self,
        delay: &mut D,
        freq: HertzU32,
        xclk_settle: MillisDurationU32,
    ) -> Result<(), PowerError> {
        if self.start_xclk(freq)? && xclk_settle.ticks() > 0 {
            delay.delay_ms(xclk_settle.to_millis()).await;
        }
        self.run_async(&POWER_ON, delay).await?;
        debug!("sensor powered on");
        Ok(())
    }

    pub async fn power_off_async<D: embedded_hal_async::delay::DelayNs>(
        &mut self,
        delay: &mut D,
    ) -> Result<(), PowerError> {
        self.stop_xclk()?;
        self.run_async(&POWER_OFF, delay).await?;
        debug!("sensor powered off");
        Ok(())
    }

    fn run<D: DelayNs>(&mut self, edges: &[Edge], delay: &mut D) -> Result<(), PowerError> {
        for &edge in edges {
            if self.drive(edge)? {
                crate::sleep(delay, EDGE_SETTLE);
            }
        }
        Ok(())
    }

    async fn run_async<D: embedded_hal_async::delay::DelayNs>(
        &mut self,
        edges: &[Edge],
        delay: &mut D,
    ) -> Result<(), PowerError> {
        for &edge in edges {
            if self.drive(edge)? {
                delay.delay_ms(EDGE_SETTLE.to_millis()).await;
            }
        }
        Ok(())
    }
}

fn set_level<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), PowerError> {
    let res = if high { pin.set_high() } else { pin.set_low() };
    res.map_err(|_| PowerError::Pin)
}
