//! Layout, timing and battery curve configuration.
//!
//! # Pre-computed Layout Constants
//!
//! The panel has a single fixed layout. Every region is a `const` so field
//! positions cost nothing per frame and can be checked at compile time.
//!
//! # Runtime Configuration
//!
//! The battery curve, tick periods and refresh strategy are carried in
//! [`PanelConfig`], which is validated once at startup.

use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::primitives::Rectangle;

use crate::error::ConfigError;

// =============================================================================
// Display Configuration
// =============================================================================

/// Display width in pixels (ST7789 on Pimoroni PIM715: 320x240)
pub const SCREEN_WIDTH: u32 = 320;

/// Display height in pixels
pub const SCREEN_HEIGHT: u32 = 240;

/// Size of one full-screen RGB565 framebuffer in bytes.
pub const FRAMEBUFFER_BYTES: usize = (SCREEN_WIDTH * SCREEN_HEIGHT * 2) as usize;

/// Full screen as a size.
pub const fn screen_size() -> Size { Size::new(SCREEN_WIDTH, SCREEN_HEIGHT) }

/// Corner radius of the border drawn around the panel.
pub const BORDER_RADIUS: u32 = 10;

// =============================================================================
// Field Layout
// =============================================================================

/// X position of the static labels.
pub const LABEL_X: i32 = 20;

/// X position of every value region.
pub const VALUE_X: i32 = 175;

/// Width of a value region. Wide enough for a full 13-character field.
pub const VALUE_WIDTH: u32 = 130;

/// Height of a value region (one line of the value font plus margin).
pub const VALUE_HEIGHT: u32 = 22;

/// Top edge of each row, in scene order: temperature, voltage, charge, uptime.
pub const ROW_Y: [i32; 4] = [40, 80, 120, 160];

/// Charge bar position and size.
pub const CHARGE_BAR_X: i32 = 20;
pub const CHARGE_BAR_Y: i32 = 200;
pub const CHARGE_BAR_WIDTH: u32 = 280;
pub const CHARGE_BAR_HEIGHT: u32 = 16;

/// Bytes needed to stage the largest redraw region (the charge bar).
pub const REGION_BUFFER_BYTES: usize = (CHARGE_BAR_WIDTH * CHARGE_BAR_HEIGHT * 2) as usize;

/// Region of the value text in `row`.
pub const fn value_region(row: usize) -> Rectangle {
    Rectangle::new(Point::new(VALUE_X, ROW_Y[row]), Size::new(VALUE_WIDTH, VALUE_HEIGHT))
}

/// Region of the charge bar.
pub const fn charge_bar_region() -> Rectangle {
    Rectangle::new(
        Point::new(CHARGE_BAR_X, CHARGE_BAR_Y),
        Size::new(CHARGE_BAR_WIDTH, CHARGE_BAR_HEIGHT),
    )
}

// Compile-time validation: every region stays on screen and fits the staging buffer
const _: () = assert!(VALUE_X as u32 + VALUE_WIDTH < SCREEN_WIDTH);
const _: () = assert!(ROW_Y[3] as u32 + VALUE_HEIGHT < CHARGE_BAR_Y as u32);
const _: () = assert!(CHARGE_BAR_X as u32 + CHARGE_BAR_WIDTH < SCREEN_WIDTH);
const _: () = assert!(CHARGE_BAR_Y as u32 + CHARGE_BAR_HEIGHT < SCREEN_HEIGHT);
const _: () = assert!((VALUE_WIDTH * VALUE_HEIGHT * 2) as usize <= REGION_BUFFER_BYTES);

// =============================================================================
// Charge Bar Thresholds
// =============================================================================

/// At or below this percentage the bar turns orange.
pub const CHARGE_LOW: u8 = 20;

/// At or below this percentage the bar turns red.
pub const CHARGE_CRITICAL: u8 = 10;

const _: () = assert!(CHARGE_CRITICAL < CHARGE_LOW);

// =============================================================================
// Timing
// =============================================================================

/// Sensor sampling period (slow tick).
pub const SLOW_PERIOD_MS: u32 = 1000;

/// Display servicing period (fast tick, 50 Hz).
pub const FAST_PERIOD_MS: u32 = 20;

const _: () = assert!(FAST_PERIOD_MS < SLOW_PERIOD_MS);

// =============================================================================
// Battery Curve
// =============================================================================

/// Linear battery curve used for the charge percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryCurve {
    /// Voltage reported as 0%.
    pub min_mv: u32,
    /// Voltage reported as 100%.
    pub max_mv: u32,
}

impl BatteryCurve {
    /// Full Li-ion range, 3300-4200 mV (900 mV span).
    pub const LIION: Self = Self::new(3300, 4200);

    /// Shallow range, 3300-3900 mV (600 mV span), for cells that never
    /// reach a full 4.2 V under the board's charger.
    pub const SHALLOW: Self = Self::new(3300, 3900);

    pub const fn new(
        min_mv: u32,
        max_mv: u32,
    ) -> Self {
        Self { min_mv, max_mv }
    }

    /// Span between empty and full in millivolts.
    #[inline]
    pub const fn span_mv(&self) -> u32 { self.max_mv - self.min_mv }

    pub const fn validate(self) -> Result<Self, ConfigError> {
        if self.min_mv >= self.max_mv {
            return Err(ConfigError::InvertedCurve {
                min_mv: self.min_mv,
                max_mv: self.max_mv,
            });
        }
        Ok(self)
    }
}

impl Default for BatteryCurve {
    fn default() -> Self { Self::LIION }
}

const _: () = assert!(BatteryCurve::LIION.min_mv < BatteryCurve::LIION.max_mv);
const _: () = assert!(BatteryCurve::SHALLOW.min_mv < BatteryCurve::SHALLOW.max_mv);

// =============================================================================
// Refresh Strategy
// =============================================================================

/// How dirty regions reach the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RefreshStrategy {
    /// Stage and flush each dirty region on its own.
    #[default]
    Partial,
    /// Draw into one of two full-screen buffers and flush the whole buffer.
    DoubleBuffered,
}

// =============================================================================
// Panel Configuration
// =============================================================================

/// Runtime configuration for the refresh core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelConfig {
    pub curve: BatteryCurve,
    pub slow_period_ms: u32,
    pub fast_period_ms: u32,
    pub strategy: RefreshStrategy,
}

impl PanelConfig {
    pub const fn new() -> Self {
        Self {
            curve: BatteryCurve::LIION,
            slow_period_ms: SLOW_PERIOD_MS,
            fast_period_ms: FAST_PERIOD_MS,
            strategy: RefreshStrategy::Partial,
        }
    }

    pub const fn with_curve(
        mut self,
        curve: BatteryCurve,
    ) -> Self {
        self.curve = curve;
        self
    }

    pub const fn with_periods(
        mut self,
        slow_period_ms: u32,
        fast_period_ms: u32,
    ) -> Self {
        self.slow_period_ms = slow_period_ms;
        self.fast_period_ms = fast_period_ms;
        self
    }

    pub const fn with_strategy(
        mut self,
        strategy: RefreshStrategy,
    ) -> Self {
        self.strategy = strategy;
        self
    }

    /// Check the curve and tick periods.
    pub const fn validate(self) -> Result<Self, ConfigError> {
        if let Err(e) = self.curve.validate() {
            return Err(e);
        }
        if self.slow_period_ms == 0 || self.fast_period_ms == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        if self.fast_period_ms >= self.slow_period_ms {
            return Err(ConfigError::FastNotFaster {
                fast_ms: self.fast_period_ms,
                slow_ms: self.slow_period_ms,
            });
        }
        Ok(self)
    }
}

impl Default for PanelConfig {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Unit Tests
// =============================================================================
