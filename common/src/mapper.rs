//! Reading to display text.
//!
//! Pure functions, no side effects. All output goes into fixed-capacity
//! [`FieldText`] through [`TruncatingWriter`], so an oversized value is cut
//! deterministically instead of panicking.
//!
//! # Charge Percentage
//!
//! ```text
//! v >= max  →  100
//! v <= min  →  0
//! otherwise →  floor((v - min) * 100 / (max - min))
//! ```
//!
//! This is integer floor division, NOT rounding: with the 3300-4200 mV curve,
//! 3308 mV is 0% and 4199 mV is 99%. Matching the floor exactly matters because
//! the text is the unit of redraw, so a rounding mismatch at a boundary voltage
//! would show up as a spurious redraw.

use core::fmt::{self, Write};

use heapless::String;

use crate::config::BatteryCurve;
use crate::sensor::Reading;

/// Maximum characters in a rendered field.
pub const FIELD_TEXT_CAPACITY: usize = 16;

/// Rendered text of one field.
pub type FieldText = String<FIELD_TEXT_CAPACITY>;

/// Largest hour count that fits next to `:MM:SS` in a [`FieldText`].
pub const MAX_UPTIME_HOURS: u64 = 9_999_999_999;

/// `fmt::Write` adapter that silently drops what does not fit.
///
/// Stops at a `char` boundary, so the result is always valid UTF-8.
pub struct TruncatingWriter<'a, const N: usize> {
    out: &'a mut String<N>,
}

impl<'a, const N: usize> TruncatingWriter<'a, N> {
    pub fn new(out: &'a mut String<N>) -> Self { Self { out } }
}

impl<const N: usize> Write for TruncatingWriter<'_, N> {
    fn write_str(
        &mut self,
        s: &str,
    ) -> fmt::Result {
        for c in s.chars() {
            if self.out.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Format into a fresh [`FieldText`], truncating on overflow.
pub fn format_field(args: fmt::Arguments<'_>) -> FieldText {
    let mut text = FieldText::new();
    // TruncatingWriter never reports an error
    let _ = TruncatingWriter::new(&mut text).write_fmt(args);
    text
}

/// Clamped floor interpolation of `voltage_mv` onto `[0, 100]`.
pub const fn battery_percentage(
    voltage_mv: u32,
    curve: BatteryCurve,
) -> u8 {
    if voltage_mv >= curve.max_mv {
        return 100;
    }
    if voltage_mv <= curve.min_mv {
        return 0;
    }
    // u64 so a wide curve cannot overflow the multiplication
    ((voltage_mv - curve.min_mv) as u64 * 100 / curve.span_mv() as u64) as u8
}

/// `"23.5 C"`: one decimal place with a unit suffix.
pub fn format_temperature(celsius: f32) -> FieldText { format_field(format_args!("{celsius:.1} C")) }

/// `"4012 mV"`
pub fn format_voltage(voltage_mv: u32) -> FieldText { format_field(format_args!("{voltage_mv} mV")) }

/// `"50%"`
pub fn format_charge(percentage: u8) -> FieldText { format_field(format_args!("{percentage}%")) }

/// `"HH:MM:SS"` with unbounded hours and zero-padded minutes and seconds.
///
/// Hours saturate at [`MAX_UPTIME_HOURS`] (with `59:59`) so the text always
/// fits its field.
pub fn format_uptime(seconds: u64) -> FieldText {
    let hours = seconds / 3600;
    if hours > MAX_UPTIME_HOURS {
        return format_field(format_args!("{MAX_UPTIME_HOURS}:59:59"));
    }
    let minutes = (seconds / 60) % 60;
    let secs = seconds % 60;
    format_field(format_args!("{hours:02}:{minutes:02}:{secs:02}"))
}

/// The three sensor-derived field texts for one reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorTexts {
    pub temperature: FieldText,
    pub voltage: FieldText,
    pub charge: FieldText,
    /// Numeric charge, for widgets bound to the percentage.
    pub percentage: u8,
}

/// Map a reading to display text.
pub fn map(
    reading: &Reading,
    curve: BatteryCurve,
) -> SensorTexts {
    let percentage = battery_percentage(reading.voltage_mv, curve);
    SensorTexts {
        temperature: format_temperature(reading.temperature_c),
        voltage: format_voltage(reading.voltage_mv),
        charge: format_charge(percentage),
        percentage,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
