//! RGB565 byte framebuffers.
//!
//! Pixels are stored big-endian, the ST7789's wire format, so a buffer can be
//! handed to the bus as-is.
//!
//! # Architecture
//!
//! - [`Framebuffer`]: `DrawTarget` over a byte slice covering any screen
//!   rectangle. Used both for full-screen buffers and for region staging.
//! - [`PingPong`]: two full-screen buffers. One is written while the other
//!   is on screen; they trade places when a flush is confirmed.
//!
//! ```text
//!            submit()                 confirm(i)
//!   Idle{write=i} ───▶ Transferring{i} ─────────▶ Idle{write=1-i}
//!                           │ cancel(i)
//!                           └───────────▶ Idle{write=i}
//! ```

use core::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::config::{SCREEN_WIDTH, screen_size};
use crate::error::PanelError;

/// Bytes per RGB565 pixel.
pub const BYTES_PER_PIXEL: usize = 2;

#[inline]
fn to_wire(color: Rgb565) -> [u8; 2] {
    let raw: RawU16 = color.into();
    raw.into_inner().to_be_bytes()
}

/// Bytes needed to hold `area`.
pub const fn bytes_for(area: &Rectangle) -> usize {
    area.size.width as usize * area.size.height as usize * BYTES_PER_PIXEL
}

// =============================================================================
// Framebuffer
// =============================================================================

/// Draw target over a big-endian RGB565 byte slice.
///
/// The slice covers `area` in screen coordinates; drawing outside it is
/// clipped.
pub struct Framebuffer<'a> {
    bytes: &'a mut [u8],
    area: Rectangle,
}

impl<'a> Framebuffer<'a> {
    /// Wrap the first `bytes_for(area)` bytes of `storage`.
    pub fn new(
        storage: &'a mut [u8],
        area: Rectangle,
    ) -> Result<Self, PanelError> {
        let needed = bytes_for(&area);
        if storage.len() < needed {
            return Err(PanelError::RegionTooLarge {
                bytes: needed,
                capacity: storage.len(),
            });
        }
        Ok(Self {
            bytes: &mut storage[..needed],
            area,
        })
    }

    /// A full-screen framebuffer.
    pub fn screen(storage: &'a mut [u8]) -> Result<Self, PanelError> {
        Self::new(storage, Rectangle::new(Point::zero(), screen_size()))
    }

    #[inline]
    pub const fn area(&self) -> Rectangle { self.area }

    /// Pixel data, row-major, ready for the bus.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] { self.bytes }

    /// Byte offset of a screen point inside this buffer.
    #[inline]
    fn offset(
        &self,
        point: Point,
    ) -> usize {
        let x = (point.x - self.area.top_left.x) as usize;
        let y = (point.y - self.area.top_left.y) as usize;
        (y * self.area.size.width as usize + x) * BYTES_PER_PIXEL
    }

    /// Read back one pixel. `None` outside the buffer's area.
    pub fn pixel(
        &self,
        point: Point,
    ) -> Option<Rgb565> {
        if !self.area.contains(point) {
            return None;
        }
        let idx = self.offset(point);
        let raw = u16::from_be_bytes([self.bytes[idx], self.bytes[idx + 1]]);
        Some(RawU16::new(raw).into())
    }
}

impl Dimensions for Framebuffer<'_> {
    fn bounding_box(&self) -> Rectangle { self.area }
}

impl DrawTarget for Framebuffer<'_> {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(
        &mut self,
        pixels: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if self.area.contains(point) {
                let idx = self.offset(point);
                self.bytes[idx..idx + 2].copy_from_slice(&to_wire(color));
            }
        }
        Ok(())
    }

    fn fill_contiguous<I>(
        &mut self,
        area: &Rectangle,
        colors: I,
    ) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        let drawable_area = area.intersection(&self.area);
        if drawable_area.is_zero_sized() {
            return Ok(());
        }

        // Colors cover all of `area`; skip the ones that fall outside
        for (point, color) in area.points().zip(colors) {
            if drawable_area.contains(point) {
                let idx = self.offset(point);
                self.bytes[idx..idx + 2].copy_from_slice(&to_wire(color));
            }
        }
        Ok(())
    }

    fn fill_solid(
        &mut self,
        area: &Rectangle,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        let drawable_area = area.intersection(&self.area);
        if drawable_area.is_zero_sized() {
            return Ok(());
        }

        let pixel = to_wire(color);
        let row_bytes = drawable_area.size.width as usize * BYTES_PER_PIXEL;
        for y in drawable_area.rows() {
            let start = self.offset(Point::new(drawable_area.top_left.x, y));
            for chunk in self.bytes[start..start + row_bytes].chunks_exact_mut(BYTES_PER_PIXEL) {
                chunk.copy_from_slice(&pixel);
            }
        }
        Ok(())
    }

    fn clear(
        &mut self,
        color: Self::Color,
    ) -> Result<(), Self::Error> {
        let pixel = to_wire(color);
        for chunk in self.bytes.chunks_exact_mut(BYTES_PER_PIXEL) {
            chunk.copy_from_slice(&pixel);
        }
        Ok(())
    }
}

/// Copy `region` between two full-screen buffers.
fn copy_region(
    src: &[u8],
    dst: &mut [u8],
    region: &Rectangle,
) {
    let region = region.intersection(&Rectangle::new(Point::zero(), screen_size()));
    if region.is_zero_sized() {
        return;
    }
    let stride = SCREEN_WIDTH as usize * BYTES_PER_PIXEL;
    let row_bytes = region.size.width as usize * BYTES_PER_PIXEL;
    let x_offset = region.top_left.x as usize * BYTES_PER_PIXEL;
    for y in region.rows() {
        let start = y as usize * stride + x_offset;
        dst[start..start + row_bytes].copy_from_slice(&src[start..start + row_bytes]);
    }
}

// =============================================================================
// Ping-Pong Buffer Pair
// =============================================================================

/// Two full-screen buffers that alternate between being written and being
/// presented.
///
/// The write buffer is never the one being transferred. Once any flush was
/// confirmed, `write_index() == 1 - last_confirmed()`.
pub struct PingPong<'a> {
    buffers: [&'a mut [u8]; 2],
    write: usize,
    in_transfer: Option<usize>,
    last_confirmed: Option<usize>,
}

impl<'a> PingPong<'a> {
    /// Both buffers must hold at least one full screen.
    pub fn new(
        a: &'a mut [u8],
        b: &'a mut [u8],
    ) -> Result<Self, PanelError> {
        let needed = bytes_for(&Rectangle::new(Point::zero(), screen_size()));
        let capacity = a.len().min(b.len());
        if capacity < needed {
            return Err(PanelError::RegionTooLarge { bytes: needed, capacity });
        }
        Ok(Self {
            buffers: [&mut a[..needed], &mut b[..needed]],
            write: 0,
            in_transfer: None,
            last_confirmed: None,
        })
    }

    /// Index of the buffer drawing goes to.
    #[inline]
    pub const fn write_index(&self) -> usize { self.write }

    /// Index of the buffer confirmed on screen, if any.
    #[inline]
    pub const fn last_confirmed(&self) -> Option<usize> { self.last_confirmed }

    #[inline]
    pub const fn in_transfer(&self) -> Option<usize> { self.in_transfer }

    /// Draw target over the write buffer.
    pub fn write_buffer(&mut self) -> Result<Framebuffer<'_>, PanelError> {
        if self.in_transfer.is_some() {
            return Err(PanelError::BufferBusy { index: self.write });
        }
        Framebuffer::screen(&mut *self.buffers[self.write])
    }

    /// Draw target over buffer `index`, for writing static content into both
    /// buffers before the first frame.
    pub fn buffer_mut(
        &mut self,
        index: usize,
    ) -> Result<Framebuffer<'_>, PanelError> {
        if self.in_transfer == Some(index) {
            return Err(PanelError::BufferBusy { index });
        }
        Framebuffer::screen(&mut *self.buffers[index & 1])
    }

    /// Hand the write buffer to the bus. Returns its index.
    pub fn submit(&mut self) -> Result<usize, PanelError> {
        if let Some(index) = self.in_transfer {
            return Err(PanelError::BufferBusy { index });
        }
        self.in_transfer = Some(self.write);
        Ok(self.write)
    }

    /// Bytes of buffer `index`.
    pub fn bytes(
        &self,
        index: usize,
    ) -> &[u8] {
        &*self.buffers[index & 1]
    }

    /// The bus finished presenting `index`; drawing moves to the other buffer.
    pub fn confirm(
        &mut self,
        index: usize,
    ) -> Result<(), PanelError> {
        if self.in_transfer != Some(index) {
            return Err(PanelError::NotTransferring { index });
        }
        self.in_transfer = None;
        self.last_confirmed = Some(index);
        self.write = 1 - index;
        Ok(())
    }

    /// The transfer of `index` failed; drawing stays on it.
    pub fn cancel(
        &mut self,
        index: usize,
    ) -> Result<(), PanelError> {
        if self.in_transfer != Some(index) {
            return Err(PanelError::NotTransferring { index });
        }
        self.in_transfer = None;
        Ok(())
    }

    /// The buffer currently on screen.
    pub fn front(&self) -> Option<&[u8]> { self.last_confirmed.map(|i| &*self.buffers[i]) }

    /// Copy `region` from the front buffer into the write buffer.
    ///
    /// Does nothing before the first confirmed flush.
    pub fn copy_from_front(
        &mut self,
        region: &Rectangle,
    ) -> Result<(), PanelError> {
        if self.in_transfer.is_some() {
            return Err(PanelError::BufferBusy { index: self.write });
        }
        let Some(front) = self.last_confirmed else {
            return Ok(());
        };
        if front == self.write {
            return Ok(());
        }
        let [a, b] = &mut self.buffers;
        let (src, dst) = if front == 0 { (&**a, &mut **b) } else { (&**b, &mut **a) };
        copy_region(src, dst, region);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    use super::*;
    use crate::colors::{BLACK, GREEN, RED};
    use crate::config::FRAMEBUFFER_BYTES;

    #[test]
    fn test_region_buffer_clips_and_offsets() {
        let mut storage = [0u8; 64];
        let area = Rectangle::new(Point::new(10, 20), Size::new(4, 2));
        let mut fb = Framebuffer::new(&mut storage, area).unwrap();
        assert_eq!(fb.as_bytes().len(), 16);

        Pixel(Point::new(11, 21), RED).draw(&mut fb).unwrap();
        // Outside: silently dropped
        Pixel(Point::new(0, 0), RED).draw(&mut fb).unwrap();

        assert_eq!(fb.pixel(Point::new(11, 21)), Some(RED));
        assert_eq!(fb.pixel(Point::new(10, 20)), Some(BLACK));
        assert_eq!(fb.pixel(Point::new(0, 0)), None);
        // Row 1, column 1 of a 4-wide buffer
        assert_eq!(&fb.as_bytes()[10..12], &to_wire(RED));
    }

    #[test]
    fn test_wire_format_is_big_endian() {
        assert_eq!(to_wire(RED), [0xF8, 0x00]);
        assert_eq!(to_wire(GREEN), [0x07, 0xE0]);
    }

    #[test]
    fn test_too_small_storage_rejected() {
        let mut storage = [0u8; 10];
        let area = Rectangle::new(Point::zero(), Size::new(4, 2));
        assert_eq!(
            Framebuffer::new(&mut storage, area).err(),
            Some(PanelError::RegionTooLarge { bytes: 16, capacity: 10 })
        );
    }

    #[test]
    fn test_fill_solid_clipped_to_area() {
        let mut storage = [0u8; 32];
        let area = Rectangle::new(Point::new(2, 2), Size::new(4, 4));
        let mut fb = Framebuffer::new(&mut storage, area).unwrap();
        Rectangle::new(Point::new(0, 0), Size::new(4, 4))
            .into_styled(PrimitiveStyle::with_fill(GREEN))
            .draw(&mut fb)
            .unwrap();

        assert_eq!(fb.pixel(Point::new(2, 2)), Some(GREEN));
        assert_eq!(fb.pixel(Point::new(3, 3)), Some(GREEN));
        assert_eq!(fb.pixel(Point::new(4, 4)), Some(BLACK));
        assert_eq!(fb.pixel(Point::new(4, 2)), Some(BLACK));
    }

    #[test]
    fn test_fill_contiguous_skips_clipped_colors() {
        let mut storage = [0u8; 8];
        let area = Rectangle::new(Point::new(1, 0), Size::new(2, 2));
        let mut fb = Framebuffer::new(&mut storage, area).unwrap();
        let colors = [RED, GREEN, RED, GREEN, GREEN, RED];
        fb.fill_contiguous(&Rectangle::new(Point::zero(), Size::new(3, 2)), colors)
            .unwrap();

        assert_eq!(fb.pixel(Point::new(1, 0)), Some(GREEN));
        assert_eq!(fb.pixel(Point::new(2, 0)), Some(RED));
        assert_eq!(fb.pixel(Point::new(1, 1)), Some(GREEN));
        assert_eq!(fb.pixel(Point::new(2, 1)), Some(RED));
    }

    fn pair() -> (Vec<u8>, Vec<u8>) { (vec![0u8; FRAMEBUFFER_BYTES], vec![0u8; FRAMEBUFFER_BYTES]) }

    #[test]
    fn test_ping_pong_alternates_on_confirm() {
        let (mut a, mut b) = pair();
        let mut pp = PingPong::new(&mut a, &mut b).unwrap();
        assert_eq!(pp.write_index(), 0);
        assert_eq!(pp.last_confirmed(), None);

        for expected in [0, 1, 0, 1] {
            let index = pp.submit().unwrap();
            assert_eq!(index, expected);
            pp.confirm(index).unwrap();
            assert_eq!(pp.last_confirmed(), Some(index));
            assert_eq!(pp.write_index(), 1 - index);
        }
    }

    #[test]
    fn test_write_buffer_busy_during_transfer() {
        let (mut a, mut b) = pair();
        let mut pp = PingPong::new(&mut a, &mut b).unwrap();
        let index = pp.submit().unwrap();
        assert_eq!(pp.write_buffer().err(), Some(PanelError::BufferBusy { index }));
        assert_eq!(pp.submit(), Err(PanelError::BufferBusy { index }));
        assert_eq!(pp.confirm(1 - index), Err(PanelError::NotTransferring { index: 1 - index }));

        pp.cancel(index).unwrap();
        assert_eq!(pp.write_index(), index);
        assert!(pp.write_buffer().is_ok());
    }

    #[test]
    fn test_copy_from_front_syncs_region() {
        let (mut a, mut b) = pair();
        let mut pp = PingPong::new(&mut a, &mut b).unwrap();
        let region = Rectangle::new(Point::new(100, 50), Size::new(8, 3));

        // Nothing confirmed yet: no-op
        pp.copy_from_front(&region).unwrap();

        region
            .into_styled(PrimitiveStyle::with_fill(RED))
            .draw(&mut pp.write_buffer().unwrap())
            .unwrap();
        let index = pp.submit().unwrap();
        pp.confirm(index).unwrap();

        pp.copy_from_front(&region).unwrap();
        let fb = pp.write_buffer().unwrap();
        assert_eq!(fb.pixel(Point::new(100, 50)), Some(RED));
        assert_eq!(fb.pixel(Point::new(107, 52)), Some(RED));
        assert_eq!(fb.pixel(Point::new(108, 52)), Some(BLACK));
        assert_eq!(fb.pixel(Point::new(100, 53)), Some(BLACK));
    }

    #[test]
    fn test_undersized_pair_rejected() {
        let mut a = vec![0u8; FRAMEBUFFER_BYTES];
        let mut b = vec![0u8; 16];
        assert!(PingPong::new(&mut a, &mut b).is_err());
    }
}
