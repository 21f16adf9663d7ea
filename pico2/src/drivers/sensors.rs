//! On-chip sensors: VSYS through ADC3 and the RP2350 die temperature sensor.

use embassy_rp::adc::{Adc, Blocking, Channel};
use panel_common::{Calibration, SensorError, SensorHal};
use panel_pico2::adc::{VSYS_CALIBRATION, die_temperature_c};

/// Blocking ADC reads for the sampler.
pub struct PicoSensors<'d> {
    adc: Adc<'d, Blocking>,
    vsys: Channel<'d>,
    temperature: Channel<'d>,
}

impl<'d> PicoSensors<'d> {
    pub fn new(
        adc: Adc<'d, Blocking>,
        vsys: Channel<'d>,
        temperature: Channel<'d>,
    ) -> Self {
        Self { adc, vsys, temperature }
    }
}

impl SensorHal for PicoSensors<'_> {
    fn read_raw_adc(&mut self) -> Result<u16, SensorError> {
        self.adc.blocking_read(&mut self.vsys).map_err(|_| SensorError::Adc)
    }

    // The RP2350 has no factory ADC characterization; the board's divider
    // and the 3.3 V reference are fixed.
    fn calibration(&mut self) -> Option<Calibration> { Some(VSYS_CALIBRATION) }

    fn read_die_temperature(&mut self) -> Result<f32, SensorError> {
        let raw = self
            .adc
            .blocking_read(&mut self.temperature)
            .map_err(|_| SensorError::Temperature)?;
        Ok(die_temperature_c(raw))
    }
}
