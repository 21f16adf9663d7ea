//! Color constants for the status panel.
//!
//! Rgb565 uses 16 bits per pixel: 5 bits red, 6 bits green, 5 bits blue.
//! This format is native to the ST7789 and requires no conversion when
//! writing to the display buffer.

use embedded_graphics::pixelcolor::{Rgb565, RgbColor};

// =============================================================================
// Standard Colors (from RgbColor trait - guaranteed optimal values)
// =============================================================================

/// Pure black (0, 0, 0).
pub const BLACK: Rgb565 = Rgb565::BLACK;

/// Pure white (31, 63, 31).
pub const WHITE: Rgb565 = Rgb565::WHITE;

/// Pure red (31, 0, 0).
pub const RED: Rgb565 = Rgb565::RED;

/// Pure green (0, 63, 0).
pub const GREEN: Rgb565 = Rgb565::GREEN;

// =============================================================================
// Custom Colors (application-specific)
// =============================================================================

/// Orange warning color. RGB565: (31, 32, 0) - slightly darker than yellow.
pub const ORANGE: Rgb565 = Rgb565::new(31, 32, 0);

/// Dark gray for the charge bar track.
pub const GRAY: Rgb565 = Rgb565::new(8, 16, 8);

// =============================================================================
// Semantic Roles
// =============================================================================

/// Panel background. Field regions are cleared to this before redraw.
pub const BACKGROUND: Rgb565 = BLACK;

/// Label, value and border color.
pub const FOREGROUND: Rgb565 = RED;
