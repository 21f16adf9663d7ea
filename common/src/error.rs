//! Error types for the refresh core.
//!
//! Sensor errors never escape the scheduler: a failed sample degrades to the
//! last known reading. Bus errors are fatal and are returned to the control
//! loop as [`PanelError::Bus`].

use thiserror::Error;

/// Invalid [`PanelConfig`](crate::config::PanelConfig) values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    #[error("battery curve min {min_mv} mV must be below max {max_mv} mV")]
    InvertedCurve { min_mv: u32, max_mv: u32 },

    #[error("tick periods must be non-zero")]
    ZeroPeriod,

    #[error("fast period {fast_ms} ms must be shorter than slow period {slow_ms} ms")]
    FastNotFaster { fast_ms: u32, slow_ms: u32 },
}

/// Failures reported by a [`SensorHal`](crate::sensor::SensorHal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    #[error("ADC read failed")]
    Adc,

    #[error("die temperature read failed")]
    Temperature,

    #[error("no ADC calibration available")]
    Uncalibrated,
}

/// Failures of the redraw path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelError {
    /// The display bus rejected a transfer. The device has no fallback output.
    #[error("display bus transfer failed")]
    Bus,

    /// A buffer was requested for writing while its transfer is outstanding.
    #[error("frame buffer {index} is still being transferred")]
    BufferBusy { index: usize },

    /// A transfer was confirmed or cancelled for a buffer that was not submitted.
    #[error("frame buffer {index} has no outstanding transfer")]
    NotTransferring { index: usize },

    /// A region does not fit the staging buffer.
    #[error("region of {bytes} bytes exceeds the {capacity} byte staging buffer")]
    RegionTooLarge { bytes: usize, capacity: usize },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
