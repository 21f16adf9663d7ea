//! Sensor sampling with stale-reading fallback.
//!
//! The hardware side is a [`SensorHal`]: a raw battery ADC read, an optional
//! calibration, and the die temperature. [`Sampler`] turns those into a
//! [`Reading`] once per slow tick and never fails the tick:
//!
//! | Hardware result               | Sample returned                          |
//! |-------------------------------|------------------------------------------|
//! | All reads succeed             | Fresh reading                            |
//! | Calibration unavailable       | Fresh reading using the last calibration |
//! | ADC or temperature read fails | Last good reading, marked stale          |
//! | Nothing good read yet         | `None`, the tick is skipped              |
//!
//! Sampling has non-trivial latency and jitter, so it is only ever invoked on
//! the slow tick.

use crate::clock::Millis;
use crate::error::SensorError;

/// Immutable snapshot produced once per slow tick.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    /// Battery voltage after the board divider.
    pub voltage_mv: u32,
    pub temperature_c: f32,
    pub sample_time: Millis,
}

/// Linear ADC-to-millivolt conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    /// Voltage at `full_scale` counts, at the ADC pin.
    pub vref_mv: u32,
    /// Maximum raw count (4095 for a 12-bit ADC).
    pub full_scale: u16,
    /// Board voltage divider ratio between battery and ADC pin.
    pub divider: u32,
}

impl Calibration {
    /// Raspberry Pi Pico 2: 3.3 V reference, VSYS through a 3:1 divider on GPIO29.
    pub const PICO_VSYS: Self = Self {
        vref_mv: 3300,
        full_scale: 4095,
        divider: 3,
    };

    /// Convert a raw count to battery millivolts.
    pub const fn to_millivolts(
        &self,
        raw: u16,
    ) -> u32 {
        if self.full_scale == 0 {
            return 0;
        }
        raw as u32 * self.vref_mv / self.full_scale as u32 * self.divider
    }
}

/// Hardware sensor collaborator.
pub trait SensorHal {
    fn read_raw_adc(&mut self) -> Result<u16, SensorError>;

    /// Current ADC characterization. `None` when temporarily unavailable.
    fn calibration(&mut self) -> Option<Calibration>;

    fn read_die_temperature(&mut self) -> Result<f32, SensorError>;
}

/// Whether a sample reflects this tick's hardware read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Freshness {
    Fresh,
    /// The read failed; the reading is the last good one.
    Stale(SensorError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample {
    pub reading: Reading,
    pub freshness: Freshness,
    /// The calibration came from an earlier tick.
    pub reused_calibration: bool,
}

impl Sample {
    #[inline]
    pub const fn is_fresh(&self) -> bool { matches!(self.freshness, Freshness::Fresh) }
}

/// Turns [`SensorHal`] reads into readings, remembering the last good state.
pub struct Sampler<H> {
    hal: H,
    last_calibration: Option<Calibration>,
    last_reading: Option<Reading>,
}

impl<H: SensorHal> Sampler<H> {
    pub const fn new(hal: H) -> Self {
        Self {
            hal,
            last_calibration: None,
            last_reading: None,
        }
    }

    /// Start with a known calibration (e.g. the board's nominal one).
    pub const fn with_calibration(
        hal: H,
        calibration: Calibration,
    ) -> Self {
        Self {
            hal,
            last_calibration: Some(calibration),
            last_reading: None,
        }
    }

    /// Read the hardware once. See the module table for failure handling.
    pub fn sample(
        &mut self,
        now: Millis,
    ) -> Option<Sample> {
        let (calibration, reused_calibration) = match self.hal.calibration() {
            Some(cal) => {
                self.last_calibration = Some(cal);
                (Some(cal), false)
            }
            None => (self.last_calibration, true),
        };

        match self.read(now, calibration) {
            Ok(reading) => {
                self.last_reading = Some(reading);
                Some(Sample {
                    reading,
                    freshness: Freshness::Fresh,
                    reused_calibration,
                })
            }
            Err(e) => self.last_reading.map(|reading| Sample {
                reading,
                freshness: Freshness::Stale(e),
                reused_calibration,
            }),
        }
    }

    fn read(
        &mut self,
        now: Millis,
        calibration: Option<Calibration>,
    ) -> Result<Reading, SensorError> {
        let calibration = calibration.ok_or(SensorError::Uncalibrated)?;
        let raw = self.hal.read_raw_adc()?;
        let temperature_c = self.hal.read_die_temperature()?;
        Ok(Reading {
            voltage_mv: calibration.to_millivolts(raw),
            temperature_c,
            sample_time: now,
        })
    }

    /// Last good reading, if any.
    #[inline]
    pub const fn last_reading(&self) -> Option<Reading> { self.last_reading }

    pub fn hal_mut(&mut self) -> &mut H { &mut self.hal }
}

// =============================================================================
// Unit Tests
// =============================================================================
