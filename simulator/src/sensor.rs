//! Synthetic sensor: a slowly discharging battery and a drifting die
//! temperature, with scheduled read failures and calibration outages.

use panel_common::{Calibration, SensorError, SensorHal};

/// Knobs for [`SynthSensor`]. Intervals count samples; `0` disables.
#[derive(Debug, Clone, Copy)]
pub struct SynthProfile {
    pub start_mv: u32,
    /// Battery drop per sample.
    pub discharge_mv: u32,
    pub floor_mv: u32,
    pub base_temperature_c: f32,
    /// Peak deviation of the temperature drift.
    pub drift_c: f32,
    pub adc_fail_every: u32,
    pub calibration_outage_every: u32,
}

impl Default for SynthProfile {
    fn default() -> Self {
        Self {
            start_mv: 4150,
            discharge_mv: 7,
            floor_mv: 3200,
            base_temperature_c: 31.0,
            drift_c: 2.5,
            adc_fail_every: 13,
            calibration_outage_every: 17,
        }
    }
}

pub struct SynthSensor {
    profile: SynthProfile,
    calibration: Calibration,
    /// Samples taken so far (advanced on every calibration query).
    step: u32,
}

impl SynthSensor {
    pub fn new(
        profile: SynthProfile,
        calibration: Calibration,
    ) -> Self {
        Self {
            profile,
            calibration,
            step: 0,
        }
    }

    /// Battery voltage the sensor is modelling right now.
    pub fn battery_mv(&self) -> u32 {
        let drop = self.profile.discharge_mv.saturating_mul(self.step);
        self.profile.start_mv.saturating_sub(drop).max(self.profile.floor_mv)
    }

    /// Inverse of `Calibration::to_millivolts`, clamped to the ADC range.
    fn raw_for(
        &self,
        mv: u32,
    ) -> u16 {
        let cal = self.calibration;
        let raw = u64::from(mv) * u64::from(cal.full_scale) / (u64::from(cal.vref_mv) * u64::from(cal.divider));
        raw.min(u64::from(cal.full_scale)) as u16
    }

    fn hits(
        &self,
        every: u32,
    ) -> bool {
        every != 0 && self.step % every == 0
    }
}

impl SensorHal for SynthSensor {
    fn read_raw_adc(&mut self) -> Result<u16, SensorError> {
        if self.hits(self.profile.adc_fail_every) {
            return Err(SensorError::Adc);
        }
        Ok(self.raw_for(self.battery_mv()))
    }

    // Queried first on every sample, so it drives the step counter.
    fn calibration(&mut self) -> Option<Calibration> {
        self.step += 1;
        if self.hits(self.profile.calibration_outage_every) {
            None
        } else {
            Some(self.calibration)
        }
    }

    fn read_die_temperature(&mut self) -> Result<f32, SensorError> {
        let phase = self.step as f32 / 20.0;
        Ok(self.profile.base_temperature_c + self.profile.drift_c * phase.sin())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> SynthProfile {
        SynthProfile {
            adc_fail_every: 0,
            calibration_outage_every: 0,
            ..SynthProfile::default()
        }
    }

    #[test]
    fn test_battery_discharges_to_floor() {
        let mut sensor = SynthSensor::new(quiet(), Calibration::PICO_VSYS);
        let first = sensor.battery_mv();
        for _ in 0..10 {
            sensor.calibration();
        }
        assert_eq!(sensor.battery_mv(), first - 70);
        for _ in 0..1000 {
            sensor.calibration();
        }
        assert_eq!(sensor.battery_mv(), 3200);
    }

    #[test]
    fn test_raw_round_trips_through_calibration() {
        let mut sensor = SynthSensor::new(quiet(), Calibration::PICO_VSYS);
        sensor.calibration();
        let raw = sensor.read_raw_adc().unwrap();
        let mv = Calibration::PICO_VSYS.to_millivolts(raw);
        // Integer conversion loses at most one count (~2.4 mV at 3:1)
        assert!(sensor.battery_mv() - mv < 5, "{} vs {}", sensor.battery_mv(), mv);
    }

    #[test]
    fn test_scheduled_failures() {
        let profile = SynthProfile {
            adc_fail_every: 3,
            calibration_outage_every: 4,
            ..SynthProfile::default()
        };
        let mut sensor = SynthSensor::new(profile, Calibration::PICO_VSYS);
        let mut adc_failures = 0;
        let mut outages = 0;
        for _ in 0..12 {
            if sensor.calibration().is_none() {
                outages += 1;
            }
            if sensor.read_raw_adc().is_err() {
                adc_failures += 1;
            }
        }
        assert_eq!(adc_failures, 4);
        assert_eq!(outages, 3);
    }
}
