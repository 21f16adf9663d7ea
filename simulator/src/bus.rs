//! Display bus backed by a `SimulatorDisplay`.
//!
//! Pixels arrive exactly as they would on the ST7789: a window followed by
//! big-endian RGB565 bytes in row-major order.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics_simulator::SimulatorDisplay;
use panel_common::DisplayBus;
use panel_common::config::screen_size;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SimBusError {
    #[error("window {0:?} is outside the screen")]
    Window(Rectangle),

    #[error("expected {expected} pixel bytes, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("injected bus fault after {0} transfers")]
    Injected(u32),
}

pub struct SimBus {
    display: SimulatorDisplay<Rgb565>,
    window: Rectangle,
    transfers: u32,
    /// Fail every transfer once this many have completed.
    fail_after: Option<u32>,
    last_error: Option<SimBusError>,
}

impl SimBus {
    pub fn new(fail_after: Option<u32>) -> Self {
        Self {
            display: SimulatorDisplay::new(screen_size()),
            window: Rectangle::zero(),
            transfers: 0,
            fail_after,
            last_error: None,
        }
    }

    pub fn display(&self) -> &SimulatorDisplay<Rgb565> { &self.display }

    /// Completed pixel transfers.
    pub fn transfers(&self) -> u32 { self.transfers }

    /// The error behind the most recent failed call, if any.
    pub fn last_error(&self) -> Option<SimBusError> { self.last_error }

    fn fail(
        &mut self,
        error: SimBusError,
    ) -> Result<(), SimBusError> {
        self.last_error = Some(error);
        Err(error)
    }
}

impl DisplayBus for SimBus {
    type Error = SimBusError;

    fn set_window(
        &mut self,
        area: &Rectangle,
    ) -> Result<(), SimBusError> {
        let screen = Rectangle::new(Point::zero(), screen_size());
        if area.is_zero_sized() || screen.intersection(area) != *area {
            return self.fail(SimBusError::Window(*area));
        }
        self.window = *area;
        Ok(())
    }

    fn push_pixels(
        &mut self,
        pixels: &[u8],
    ) -> Result<(), SimBusError> {
        if self.fail_after.is_some_and(|limit| self.transfers >= limit) {
            return self.fail(SimBusError::Injected(self.transfers));
        }
        let expected = (self.window.size.width * self.window.size.height * 2) as usize;
        if pixels.len() != expected {
            return self.fail(SimBusError::Length {
                expected,
                actual: pixels.len(),
            });
        }

        let colors = pixels
            .chunks_exact(2)
            .map(|be| Rgb565::from(RawU16::new(u16::from_be_bytes([be[0], be[1]]))));
        let window = self.window;
        // SimulatorDisplay drawing is infallible
        let _ = self.display.fill_contiguous(&window, colors);
        self.transfers += 1;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn be(color: Rgb565) -> [u8; 2] { RawU16::from(color).into_inner().to_be_bytes() }

    #[test]
    fn test_pixels_land_in_window() {
        let mut bus = SimBus::new(None);
        let window = Rectangle::new(Point::new(10, 20), Size::new(2, 2));
        bus.set_window(&window).unwrap();

        let mut bytes = Vec::new();
        for color in [Rgb565::RED, Rgb565::GREEN, Rgb565::BLUE, Rgb565::WHITE] {
            bytes.extend_from_slice(&be(color));
        }
        bus.push_pixels(&bytes).unwrap();

        assert_eq!(bus.display().get_pixel(Point::new(10, 20)), Rgb565::RED);
        assert_eq!(bus.display().get_pixel(Point::new(11, 20)), Rgb565::GREEN);
        assert_eq!(bus.display().get_pixel(Point::new(10, 21)), Rgb565::BLUE);
        assert_eq!(bus.display().get_pixel(Point::new(11, 21)), Rgb565::WHITE);
        assert_eq!(bus.transfers(), 1);
    }

    #[test]
    fn test_rejects_offscreen_window() {
        let mut bus = SimBus::new(None);
        let window = Rectangle::new(Point::new(310, 0), Size::new(20, 4));
        assert_eq!(bus.set_window(&window), Err(SimBusError::Window(window)));
        assert_eq!(bus.last_error(), Some(SimBusError::Window(window)));
    }

    #[test]
    fn test_rejects_short_transfer() {
        let mut bus = SimBus::new(None);
        bus.set_window(&Rectangle::new(Point::zero(), Size::new(4, 1))).unwrap();
        assert_eq!(
            bus.push_pixels(&[0; 6]),
            Err(SimBusError::Length { expected: 8, actual: 6 })
        );
    }

    #[test]
    fn test_injected_fault() {
        let mut bus = SimBus::new(Some(1));
        bus.set_window(&Rectangle::new(Point::zero(), Size::new(1, 1))).unwrap();
        bus.push_pixels(&[0, 0]).unwrap();
        assert_eq!(bus.push_pixels(&[0, 0]), Err(SimBusError::Injected(1)));
    }
}
