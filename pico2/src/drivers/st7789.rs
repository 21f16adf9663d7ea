//! ST7789 display bus for embassy-rp.
//!
//! Initialization is async (it needs reset/sleep-out delays); region
//! transfers after that are blocking so they fit the synchronous
//! [`DisplayBus`] seam the refresh core drives.
//!
//! # Transfer sequence
//!
//! ```text
//! set_window:  CASET x0 x1 | RASET y0 y1
//! push_pixels: RAMWR <RGB565 big-endian bytes>   (CS held low throughout)
//! ```

use embassy_rp::gpio::Output;
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Async, Error as SpiError, Spi};
use embassy_time::Timer;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use panel_common::DisplayBus;
use panel_common::config::screen_size;
use panel_pico2::config::{RESET_DELAY_MS, SLEEP_OUT_DELAY_MS};
use panel_pico2::st7789::{
    CASET,
    COLMOD,
    COLMOD_RGB565,
    DISPON,
    INVON,
    MADCTL,
    MADCTL_LANDSCAPE,
    NORON,
    RAMWR,
    RASET,
    SLPOUT,
    SWRESET,
    window_params,
};

/// Errors from the ST7789 bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum BusError {
    Spi,
    /// The window lies outside the panel's address range.
    Window,
}

impl From<SpiError> for BusError {
    fn from(_: SpiError) -> Self { Self::Spi }
}

/// ST7789 on SPI0 - owns the SPI peripheral and the control pins.
pub struct St7789Bus<'d> {
    spi: Spi<'d, SPI0, Async>,
    dc: Output<'d>,
    cs: Output<'d>,
}

impl<'d> St7789Bus<'d> {
    /// Create a new bus from SPI and control pins.
    pub fn new(
        spi: Spi<'d, SPI0, Async>,
        dc: Output<'d>,
        cs: Output<'d>,
    ) -> Self {
        Self { spi, dc, cs }
    }

    /// Initialize the display hardware.
    pub async fn init(&mut self) -> Result<(), BusError> {
        // Software reset
        self.command(SWRESET, &[])?;
        Timer::after_millis(RESET_DELAY_MS).await;

        // Exit sleep mode
        self.command(SLPOUT, &[])?;
        Timer::after_millis(SLEEP_OUT_DELAY_MS).await;

        self.command(COLMOD, &[COLMOD_RGB565])?;

        // Memory access control for 90° rotation (landscape)
        self.command(MADCTL, &[MADCTL_LANDSCAPE])?;

        // Inversion on (required for PIM715)
        self.command(INVON, &[])?;
        Timer::after_millis(10).await;

        self.command(NORON, &[])?;
        Timer::after_millis(10).await;

        self.command(DISPON, &[])?;
        Timer::after_millis(10).await;
        Ok(())
    }

    /// Send a command byte followed by its parameters with CS held low.
    fn command(
        &mut self,
        cmd: u8,
        params: &[u8],
    ) -> Result<(), BusError> {
        self.cs.set_low();
        self.dc.set_low();
        let mut result = self.spi.blocking_write(&[cmd]);
        if result.is_ok() && !params.is_empty() {
            self.dc.set_high();
            result = self.spi.blocking_write(params);
        }
        self.cs.set_high();
        result.map_err(BusError::from)
    }
}

impl DisplayBus for St7789Bus<'_> {
    type Error = BusError;

    fn set_window(
        &mut self,
        area: &Rectangle,
    ) -> Result<(), BusError> {
        let screen = Rectangle::new(Point::zero(), screen_size());
        if screen.intersection(area) != *area {
            return Err(BusError::Window);
        }
        let (cols, rows) = window_params(area).ok_or(BusError::Window)?;
        self.command(CASET, &cols)?;
        self.command(RASET, &rows)
    }

    fn push_pixels(
        &mut self,
        pixels: &[u8],
    ) -> Result<(), BusError> {
        self.command(RAMWR, pixels)
    }
}
