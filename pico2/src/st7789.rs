//! ST7789 command set and window encoding.
//!
//! Pure protocol helpers shared by the SPI driver; no hardware access.

use embedded_graphics::primitives::Rectangle;

// ST7789 Commands
pub const SWRESET: u8 = 0x01;
pub const SLPOUT: u8 = 0x11;
pub const NORON: u8 = 0x13;
pub const INVON: u8 = 0x21;
pub const DISPON: u8 = 0x29;
pub const CASET: u8 = 0x2A;
pub const RASET: u8 = 0x2B;
pub const RAMWR: u8 = 0x2C;
pub const MADCTL: u8 = 0x36;
pub const COLMOD: u8 = 0x3A;

// MADCTL flags
pub const MADCTL_MX: u8 = 0x40; // Column address order
pub const MADCTL_MV: u8 = 0x20; // Row/column exchange

/// COLMOD value for 16-bit RGB565.
pub const COLMOD_RGB565: u8 = 0x55;

/// Landscape orientation for the PIM715 (90° rotation).
pub const MADCTL_LANDSCAPE: u8 = MADCTL_MV | MADCTL_MX;

/// CASET and RASET parameters for `area`: big-endian inclusive start/end.
///
/// Returns `None` for an empty area or one with negative or out-of-range
/// coordinates.
pub fn window_params(area: &Rectangle) -> Option<([u8; 4], [u8; 4])> {
    let bottom_right = area.bottom_right()?;
    let x0 = u16::try_from(area.top_left.x).ok()?;
    let y0 = u16::try_from(area.top_left.y).ok()?;
    let x1 = u16::try_from(bottom_right.x).ok()?;
    let y1 = u16::try_from(bottom_right.y).ok()?;

    let [x0h, x0l] = x0.to_be_bytes();
    let [x1h, x1l] = x1.to_be_bytes();
    let [y0h, y0l] = y0.to_be_bytes();
    let [y1h, y1l] = y1.to_be_bytes();
    Some(([x0h, x0l, x1h, x1l], [y0h, y0l, y1h, y1l]))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use embedded_graphics::prelude::*;

    use super::*;

    #[test]
    fn test_full_screen_window() {
        let area = Rectangle::new(Point::zero(), Size::new(320, 240));
        let (cols, rows) = window_params(&area).unwrap();
        assert_eq!(cols, [0x00, 0x00, 0x01, 0x3F]); // 0..=319
        assert_eq!(rows, [0x00, 0x00, 0x00, 0xEF]); // 0..=239
    }

    #[test]
    fn test_region_window_is_inclusive() {
        let area = Rectangle::new(Point::new(175, 40), Size::new(130, 22));
        let (cols, rows) = window_params(&area).unwrap();
        assert_eq!(cols, [0x00, 175, 0x01, 0x30]); // 175..=304
        assert_eq!(rows, [0x00, 40, 0x00, 61]);
    }

    #[test]
    fn test_invalid_windows_rejected() {
        assert!(window_params(&Rectangle::zero()).is_none());
        let negative = Rectangle::new(Point::new(-1, 0), Size::new(4, 4));
        assert!(window_params(&negative).is_none());
    }

    #[test]
    fn test_landscape_flags() {
        assert_eq!(MADCTL_LANDSCAPE, 0x60);
    }
}
