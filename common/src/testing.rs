//! Test doubles for the hardware collaborators.

use std::cell::Cell;
use std::collections::VecDeque;
use std::vec::Vec;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::bridge::DisplayBus;
use crate::clock::{Clock, Millis};
use crate::config::{FRAMEBUFFER_BYTES, SCREEN_WIDTH, screen_size};
use crate::error::SensorError;
use crate::sensor::{Calibration, SensorHal};

// =============================================================================
// Sensor
// =============================================================================

/// Sensor that replays queued results, then falls back to steady values.
pub struct ScriptedSensor {
    pub raw: VecDeque<Result<u16, SensorError>>,
    pub temperatures: VecDeque<Result<f32, SensorError>>,
    pub calibrations: VecDeque<Option<Calibration>>,
    pub steady_raw: u16,
    pub steady_temperature: f32,
    pub steady_calibration: Calibration,
}

impl ScriptedSensor {
    pub fn steady(
        raw: u16,
        temperature: f32,
        calibration: Calibration,
    ) -> Self {
        Self {
            raw: VecDeque::new(),
            temperatures: VecDeque::new(),
            calibrations: VecDeque::new(),
            steady_raw: raw,
            steady_temperature: temperature,
            steady_calibration: calibration,
        }
    }
}

impl SensorHal for ScriptedSensor {
    fn read_raw_adc(&mut self) -> Result<u16, SensorError> { self.raw.pop_front().unwrap_or(Ok(self.steady_raw)) }

    fn calibration(&mut self) -> Option<Calibration> {
        self.calibrations.pop_front().unwrap_or(Some(self.steady_calibration))
    }

    fn read_die_temperature(&mut self) -> Result<f32, SensorError> {
        self.temperatures.pop_front().unwrap_or(Ok(self.steady_temperature))
    }
}

/// Calibration where raw counts are millivolts.
pub const IDENTITY: Calibration = Calibration {
    vref_mv: 4095,
    full_scale: 4095,
    divider: 1,
};

// =============================================================================
// Display Bus
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

/// Bus that records every window and mirrors pushed pixels into a
/// full-screen shadow.
pub struct RecordingBus {
    pub windows: Vec<Rectangle>,
    pub pushes: Vec<usize>,
    /// Fail every transfer while set.
    pub fail: bool,
    window: Rectangle,
    shadow: Vec<u8>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self {
            windows: Vec::new(),
            pushes: Vec::new(),
            fail: false,
            window: Rectangle::zero(),
            shadow: vec![0u8; FRAMEBUFFER_BYTES],
        }
    }

    /// Pixel as last written to the screen.
    pub fn pixel(
        &self,
        point: Point,
    ) -> Option<Rgb565> {
        if !Rectangle::new(Point::zero(), screen_size()).contains(point) {
            return None;
        }
        let idx = (point.y as usize * SCREEN_WIDTH as usize + point.x as usize) * 2;
        Some(RawU16::new(u16::from_be_bytes([self.shadow[idx], self.shadow[idx + 1]])).into())
    }

    pub fn clear_log(&mut self) {
        self.windows.clear();
        self.pushes.clear();
    }
}

impl DisplayBus for RecordingBus {
    type Error = BusFault;

    fn set_window(
        &mut self,
        area: &Rectangle,
    ) -> Result<(), BusFault> {
        if self.fail {
            return Err(BusFault);
        }
        self.window = *area;
        self.windows.push(*area);
        Ok(())
    }

    fn push_pixels(
        &mut self,
        pixels: &[u8],
    ) -> Result<(), BusFault> {
        if self.fail {
            return Err(BusFault);
        }
        for (point, chunk) in self.window.points().zip(pixels.chunks_exact(2)) {
            let idx = (point.y as usize * SCREEN_WIDTH as usize + point.x as usize) * 2;
            self.shadow[idx..idx + 2].copy_from_slice(chunk);
        }
        self.pushes.push(pixels.len());
        Ok(())
    }
}

// =============================================================================
// Clock
// =============================================================================

/// Manually driven clock. Optionally advances on every read to model
/// sampling latency.
pub struct FakeClock {
    now: Cell<u32>,
    pub step_per_read: u32,
}

impl FakeClock {
    pub fn at(ms: u32) -> Self {
        Self {
            now: Cell::new(ms),
            step_per_read: 0,
        }
    }

    pub fn set(
        &self,
        ms: u32,
    ) {
        self.now.set(ms);
    }

    pub fn advance(
        &self,
        ms: u32,
    ) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Millis {
        let now = self.now.get();
        self.now.set(now.wrapping_add(self.step_per_read));
        Millis(now)
    }
}
