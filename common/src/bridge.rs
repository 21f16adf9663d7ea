//! Flush bridge: moves drawn pixels from RAM to the display bus.
//!
//! # Strategies
//!
//! | Bridge             | Buffer                  | Flush unit          |
//! |--------------------|-------------------------|---------------------|
//! | [`RegionBridge`]   | one `N`-byte region     | each dirty region   |
//! | [`PingPongBridge`] | two full-screen buffers | whole write buffer  |
//!
//! A successful [`DisplayBus::push_pixels`] is the flush-ready confirmation:
//! only then does the scheduler commit a field as rendered.
//!
//! # Ping-Pong Sync
//!
//! Each buffer only receives the regions redrawn while it was the write
//! buffer. Before drawing a new frame, the regions changed in the previous
//! frame are copied from the front buffer, so both buffers converge on the
//! same content:
//!
//! ```text
//! frame 1: draw R1 → buf0, present buf0
//! frame 2: copy R1 buf0 → buf1, draw R2 → buf1, present buf1
//! frame 3: copy R2 buf1 → buf0, draw R3 → buf0, present buf0
//! ```

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use heapless::Vec;

use crate::config::{SCREEN_HEIGHT, SCREEN_WIDTH, screen_size};
use crate::error::PanelError;
use crate::framebuffer::{BYTES_PER_PIXEL, Framebuffer, PingPong, bytes_for};
use crate::scene::Scene;

/// Byte-level display collaborator (SPI + command protocol on hardware).
pub trait DisplayBus {
    type Error;

    /// Address the rectangle the next pixels go to.
    fn set_window(
        &mut self,
        area: &Rectangle,
    ) -> Result<(), Self::Error>;

    /// Write big-endian RGB565 pixels into the current window, row-major.
    /// Returning `Ok` means the transfer completed.
    fn push_pixels(
        &mut self,
        pixels: &[u8],
    ) -> Result<(), Self::Error>;
}

/// Confirmation of one completed flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlushAck {
    pub area: Rectangle,
    pub bytes: usize,
}

/// Running flush counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeStats {
    pub flushes: u32,
    pub bytes: u64,
}

impl BridgeStats {
    fn record(
        &mut self,
        ack: &FlushAck,
    ) {
        self.flushes = self.flushes.wrapping_add(1);
        self.bytes += ack.bytes as u64;
    }
}

/// Send `pixels` to `area` on the bus.
pub fn flush<B: DisplayBus>(
    bus: &mut B,
    area: Rectangle,
    pixels: &[u8],
) -> Result<FlushAck, PanelError> {
    bus.set_window(&area).map_err(|_| PanelError::Bus)?;
    bus.push_pixels(pixels).map_err(|_| PanelError::Bus)?;
    Ok(FlushAck {
        area,
        bytes: pixels.len(),
    })
}

/// Refresh strategy used by the render scheduler.
///
/// Per frame: `begin_frame`, then `canvas`/`region_done` for each dirty
/// region in scene order, then `end_frame`. A region is confirmed either by
/// the ack from its own `region_done` or by the ack from `end_frame`.
pub trait FlushBridge {
    /// Draw the static chrome and put it on screen.
    fn init(
        &mut self,
        scene: &Scene,
    ) -> Result<(), PanelError>;

    fn begin_frame(&mut self) -> Result<(), PanelError>;

    /// Draw target for `region`. Drawing outside `region` may be dropped.
    fn canvas(
        &mut self,
        region: Rectangle,
    ) -> Result<Framebuffer<'_>, PanelError>;

    /// `region` is drawn. Returns an ack if it was flushed on its own.
    fn region_done(
        &mut self,
        region: Rectangle,
    ) -> Result<Option<FlushAck>, PanelError>;

    /// Returns an ack covering every region staged since `begin_frame`
    /// without one of its own.
    fn end_frame(&mut self) -> Result<Option<FlushAck>, PanelError>;

    fn stats(&self) -> BridgeStats;
}

// =============================================================================
// Region Bridge (partial refresh)
// =============================================================================

/// Partial refresh: each dirty region is staged in an `N`-byte buffer and
/// flushed on its own.
///
/// The chrome is drawn in full-width horizontal bands of as many rows as
/// fit in the staging buffer, so no full-screen buffer is needed.
pub struct RegionBridge<B, const N: usize> {
    bus: B,
    staging: [u8; N],
    stats: BridgeStats,
}

impl<B: DisplayBus, const N: usize> RegionBridge<B, N> {
    /// Screen rows that fit in one band.
    pub const BAND_ROWS: u32 = (N / (SCREEN_WIDTH as usize * BYTES_PER_PIXEL)) as u32;

    pub const fn new(bus: B) -> Self {
        Self {
            bus,
            staging: [0u8; N],
            stats: BridgeStats { flushes: 0, bytes: 0 },
        }
    }

    #[inline]
    pub fn bus(&self) -> &B { &self.bus }

    #[inline]
    pub fn bus_mut(&mut self) -> &mut B { &mut self.bus }

    fn flush_staged(
        &mut self,
        area: Rectangle,
    ) -> Result<FlushAck, PanelError> {
        let len = bytes_for(&area);
        if len > N {
            return Err(PanelError::RegionTooLarge { bytes: len, capacity: N });
        }
        let ack = flush(&mut self.bus, area, &self.staging[..len])?;
        self.stats.record(&ack);
        Ok(ack)
    }
}

impl<B: DisplayBus, const N: usize> FlushBridge for RegionBridge<B, N> {
    fn init(
        &mut self,
        scene: &Scene,
    ) -> Result<(), PanelError> {
        if Self::BAND_ROWS == 0 {
            return Err(PanelError::RegionTooLarge {
                bytes: SCREEN_WIDTH as usize * BYTES_PER_PIXEL,
                capacity: N,
            });
        }
        let mut y = 0;
        while y < SCREEN_HEIGHT {
            let rows = Self::BAND_ROWS.min(SCREEN_HEIGHT - y);
            let band = Rectangle::new(Point::new(0, y as i32), Size::new(SCREEN_WIDTH, rows));
            let mut canvas = Framebuffer::new(&mut self.staging, band)?;
            scene.draw_chrome(&mut canvas).ok();
            self.flush_staged(band)?;
            y += rows;
        }
        Ok(())
    }

    fn begin_frame(&mut self) -> Result<(), PanelError> { Ok(()) }

    fn canvas(
        &mut self,
        region: Rectangle,
    ) -> Result<Framebuffer<'_>, PanelError> {
        Framebuffer::new(&mut self.staging, region)
    }

    fn region_done(
        &mut self,
        region: Rectangle,
    ) -> Result<Option<FlushAck>, PanelError> {
        self.flush_staged(region).map(Some)
    }

    fn end_frame(&mut self) -> Result<Option<FlushAck>, PanelError> { Ok(None) }

    fn stats(&self) -> BridgeStats { self.stats }
}

// =============================================================================
// Ping-Pong Bridge (double-buffered)
// =============================================================================

/// Regions remembered per frame for sync. Overflow falls back to a
/// full-screen copy.
const SYNC_CAPACITY: usize = 8;

/// Double-buffered retained refresh: fields are drawn into the write buffer
/// and the whole buffer is flushed at the end of the frame.
pub struct PingPongBridge<'a, B> {
    bus: B,
    pair: PingPong<'a>,
    /// Regions changed in the last presented frame.
    sync: Vec<Rectangle, SYNC_CAPACITY>,
    sync_all: bool,
    /// Regions drawn since `begin_frame`.
    drawn: Vec<Rectangle, SYNC_CAPACITY>,
    drawn_overflow: bool,
    stats: BridgeStats,
}

impl<'a, B: DisplayBus> PingPongBridge<'a, B> {
    pub fn new(
        bus: B,
        pair: PingPong<'a>,
    ) -> Self {
        Self {
            bus,
            pair,
            sync: Vec::new(),
            sync_all: false,
            drawn: Vec::new(),
            drawn_overflow: false,
            stats: BridgeStats::default(),
        }
    }

    #[inline]
    pub fn bus(&self) -> &B { &self.bus }

    #[inline]
    pub fn bus_mut(&mut self) -> &mut B { &mut self.bus }

    #[inline]
    pub fn buffers(&self) -> &PingPong<'a> { &self.pair }

    /// Submit the write buffer and flush all of it.
    fn present(&mut self) -> Result<FlushAck, PanelError> {
        let index = self.pair.submit()?;
        let screen = Rectangle::new(Point::zero(), screen_size());
        match flush(&mut self.bus, screen, self.pair.bytes(index)) {
            Ok(ack) => {
                self.pair.confirm(index)?;
                self.stats.record(&ack);
                Ok(ack)
            }
            Err(e) => {
                self.pair.cancel(index)?;
                Err(e)
            }
        }
    }
}

impl<B: DisplayBus> FlushBridge for PingPongBridge<'_, B> {
    fn init(
        &mut self,
        scene: &Scene,
    ) -> Result<(), PanelError> {
        for index in 0..2 {
            let mut canvas = self.pair.buffer_mut(index)?;
            scene.draw_chrome(&mut canvas).ok();
        }
        self.present()?;
        self.sync.clear();
        self.sync_all = false;
        Ok(())
    }

    fn begin_frame(&mut self) -> Result<(), PanelError> {
        if self.sync_all {
            self.pair.copy_from_front(&Rectangle::new(Point::zero(), screen_size()))?;
        } else {
            for region in &self.sync {
                self.pair.copy_from_front(region)?;
            }
        }
        self.sync.clear();
        self.sync_all = false;
        self.drawn.clear();
        self.drawn_overflow = false;
        Ok(())
    }

    fn canvas(
        &mut self,
        _region: Rectangle,
    ) -> Result<Framebuffer<'_>, PanelError> {
        self.pair.write_buffer()
    }

    fn region_done(
        &mut self,
        region: Rectangle,
    ) -> Result<Option<FlushAck>, PanelError> {
        if self.drawn.push(region).is_err() {
            self.drawn_overflow = true;
        }
        Ok(None)
    }

    fn end_frame(&mut self) -> Result<Option<FlushAck>, PanelError> {
        if self.drawn.is_empty() && !self.drawn_overflow {
            return Ok(None);
        }
        let ack = self.present()?;
        // The buffer just presented becomes the front; the next write buffer
        // still lacks these regions.
        core::mem::swap(&mut self.sync, &mut self.drawn);
        self.sync_all = self.drawn_overflow;
        self.drawn.clear();
        self.drawn_overflow = false;
        Ok(Some(ack))
    }

    fn stats(&self) -> BridgeStats { self.stats }
}

// =============================================================================
// Unit Tests
// =============================================================================
