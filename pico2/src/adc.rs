//! RP2350 ADC conversions.
//!
//! The ADC is 12-bit with a 3.3 V reference. Two channels are used:
//!
//! | Channel | Source                     | Conversion                        |
//! |---------|----------------------------|-----------------------------------|
//! | GPIO29  | VSYS through a 3:1 divider | [`Calibration::PICO_VSYS`]        |
//! | 4       | On-die temperature sensor  | [`die_temperature_c`]             |

use panel_common::Calibration;

/// ADC reference voltage in volts.
pub const ADC_VREF: f32 = 3.3;

/// Counts per reference voltage (12-bit).
pub const ADC_COUNTS: f32 = 4096.0;

/// Sensor voltage at 27 °C (RP2350 datasheet).
const TEMP_SENSOR_V27: f32 = 0.706;

/// Sensor slope in volts per °C (negative: voltage drops as it warms).
const TEMP_SENSOR_SLOPE: f32 = 0.001_721;

/// Nominal VSYS calibration. The RP2350 has no per-chip ADC trim, so this
/// never changes at runtime.
pub const VSYS_CALIBRATION: Calibration = Calibration::PICO_VSYS;

/// Convert a raw temperature sensor count to °C.
///
/// `T = 27 - (V - 0.706) / 0.001721`
pub fn die_temperature_c(raw: u16) -> f32 {
    let volts = f32::from(raw) * ADC_VREF / ADC_COUNTS;
    27.0 - (volts - TEMP_SENSOR_V27) / TEMP_SENSOR_SLOPE
}

/// Battery millivolts for a raw VSYS count.
#[inline]
pub const fn vsys_millivolts(raw: u16) -> u32 { VSYS_CALIBRATION.to_millivolts(raw) }

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_at_reference_point() {
        // 0.706 V ≈ 876 counts
        let t = die_temperature_c(876);
        assert!((t - 27.0).abs() < 0.5, "got {t}");
    }

    #[test]
    fn test_temperature_slope_is_negative() {
        assert!(die_temperature_c(800) > die_temperature_c(900));
        // One count is about 0.47 °C
        let step = die_temperature_c(876) - die_temperature_c(877);
        assert!((step - 0.468).abs() < 0.01, "got {step}");
    }

    #[test]
    fn test_vsys_conversion() {
        assert_eq!(vsys_millivolts(0), 0);
        // Full scale: 3.3 V at the pin, 9.9 V at VSYS
        assert_eq!(vsys_millivolts(4095), 9900);
        // USB powered: 5.0 V / 3 = 1.667 V ≈ 2068 counts
        let mv = vsys_millivolts(2068);
        assert!((4990..=5010).contains(&mv), "got {mv}");
    }
}
