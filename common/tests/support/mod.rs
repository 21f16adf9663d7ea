//! Shared fakes for the end-to-end scenarios.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use panel_common::config::{FRAMEBUFFER_BYTES, SCREEN_WIDTH};
use panel_common::{Calibration, Clock, DisplayBus, Millis, SensorError, SensorHal};

/// Raw counts are millivolts.
pub const IDENTITY: Calibration = Calibration {
    vref_mv: 4095,
    full_scale: 4095,
    divider: 1,
};

/// Sensor fed one reading per slow tick from queues.
pub struct QueueSensor {
    pub voltages: VecDeque<u16>,
    pub temperatures: VecDeque<f32>,
    last_voltage: u16,
    last_temperature: f32,
}

impl QueueSensor {
    pub fn new(
        voltage_mv: u16,
        temperature: f32,
    ) -> Self {
        Self {
            voltages: VecDeque::new(),
            temperatures: VecDeque::new(),
            last_voltage: voltage_mv,
            last_temperature: temperature,
        }
    }
}

impl SensorHal for QueueSensor {
    fn read_raw_adc(&mut self) -> Result<u16, SensorError> {
        if let Some(v) = self.voltages.pop_front() {
            self.last_voltage = v;
        }
        Ok(self.last_voltage)
    }

    fn calibration(&mut self) -> Option<Calibration> { Some(IDENTITY) }

    fn read_die_temperature(&mut self) -> Result<f32, SensorError> {
        if let Some(t) = self.temperatures.pop_front() {
            self.last_temperature = t;
        }
        Ok(self.last_temperature)
    }
}

/// Bus mirroring every push into a screen-sized shadow.
pub struct ShadowBus {
    pub windows: Vec<Rectangle>,
    window: Rectangle,
    shadow: Vec<u8>,
}

impl ShadowBus {
    pub fn new() -> Self {
        Self {
            windows: Vec::new(),
            window: Rectangle::zero(),
            shadow: vec![0u8; FRAMEBUFFER_BYTES],
        }
    }

    pub fn pixel(
        &self,
        p: Point,
    ) -> Rgb565 {
        let idx = (p.y as usize * SCREEN_WIDTH as usize + p.x as usize) * 2;
        RawU16::new(u16::from_be_bytes([self.shadow[idx], self.shadow[idx + 1]])).into()
    }

    /// Any pixel of `region` equals `color`.
    pub fn region_has(
        &self,
        region: Rectangle,
        color: Rgb565,
    ) -> bool {
        region.points().any(|p| self.pixel(p) == color)
    }
}

impl DisplayBus for ShadowBus {
    type Error = ();

    fn set_window(
        &mut self,
        area: &Rectangle,
    ) -> Result<(), ()> {
        self.window = *area;
        self.windows.push(*area);
        Ok(())
    }

    fn push_pixels(
        &mut self,
        pixels: &[u8],
    ) -> Result<(), ()> {
        for (p, px) in self.window.points().zip(pixels.chunks_exact(2)) {
            let idx = (p.y as usize * SCREEN_WIDTH as usize + p.x as usize) * 2;
            self.shadow[idx..idx + 2].copy_from_slice(px);
        }
        Ok(())
    }
}

pub struct StepClock(pub Cell<u32>);

impl StepClock {
    pub fn set(
        &self,
        ms: u32,
    ) {
        self.0.set(ms);
    }
}

impl Clock for StepClock {
    fn now(&self) -> Millis { Millis(self.0.get()) }
}
