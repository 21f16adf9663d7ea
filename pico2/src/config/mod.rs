//! Board configuration for the Pico 2 + PIM715 build.
//!
//! Pin assignments match the Pimoroni Display Pack 2.8" wiring. The panel
//! configuration is selected at compile time by cargo features:
//!
//! - `curve-3900`: 100% charge at 3900 mV instead of 4200 mV
//! - `double-buffer`: two full-screen buffers, whole-screen flush per frame

use panel_common::{BatteryCurve, PanelConfig, RefreshStrategy};

// =============================================================================
// Pins
// =============================================================================

/// Display data/command select.
pub const PIN_DC: u8 = 16;
/// Display chip select.
pub const PIN_CS: u8 = 17;
/// SPI0 clock.
pub const PIN_CLK: u8 = 18;
/// SPI0 MOSI.
pub const PIN_MOSI: u8 = 19;
/// Backlight enable.
pub const PIN_BACKLIGHT: u8 = 20;
/// VSYS/3 sense input (ADC3).
pub const PIN_VSYS: u8 = 29;

// =============================================================================
// Display Bus
// =============================================================================

/// SPI clock for the ST7789. 62.5 MHz is the ST7789 write-cycle limit.
pub const SPI_FREQUENCY_HZ: u32 = 62_500_000;

/// Delay after SWRESET before the next command.
pub const RESET_DELAY_MS: u64 = 150;

/// Delay after SLPOUT before the next command.
pub const SLEEP_OUT_DELAY_MS: u64 = 10;

// =============================================================================
// Panel
// =============================================================================

/// Battery curve for this build.
pub const fn battery_curve() -> BatteryCurve {
    if cfg!(feature = "curve-3900") {
        BatteryCurve::SHALLOW
    } else {
        BatteryCurve::LIION
    }
}

/// Refresh strategy for this build.
pub const fn refresh_strategy() -> RefreshStrategy {
    if cfg!(feature = "double-buffer") {
        RefreshStrategy::DoubleBuffered
    } else {
        RefreshStrategy::Partial
    }
}

/// Complete panel configuration for this build.
pub const fn panel_config() -> PanelConfig {
    PanelConfig::new()
        .with_curve(battery_curve())
        .with_strategy(refresh_strategy())
}

// =============================================================================
// Unit Tests
// =============================================================================
