//! Render scheduler: slow/fast tick cadence and the redraw pump.
//!
//! # Cadence
//!
//! | Tick | Period (default) | Work                                            |
//! |------|------------------|-------------------------------------------------|
//! | Slow | 1000 ms          | sample → map → tracker (temperature, voltage, charge, bar) |
//! | Fast | 20 ms            | uptime → tracker, then pump dirty regions       |
//!
//! The slow tick is never slept on: each fast tick compares the clock with a
//! stored [`Deadline`]. After sampling, the next slow deadline is measured
//! from the clock *after* the sample returned (fixed-delay), so a slow
//! sampler pushes later ticks back instead of making them bunch up.
//!
//! # Pump
//!
//! Dirty regions are redrawn in scene order, fields first, then the charge
//! bar. Each dirty state gets exactly one redraw:
//!
//! ```text
//! begin_redraw ─▶ clear region + draw text ─▶ bridge ack ─▶ commit
//!                                              └─ error ─▶ abort (stays dirty)
//! ```

use embedded_graphics::primitives::Rectangle;
use heapless::Vec;

use crate::bridge::{FlushAck, FlushBridge};
use crate::clock::{Clock, Deadline, Millis, UptimeCounter};
use crate::config::PanelConfig;
use crate::error::{ConfigError, PanelError};
use crate::framebuffer::Framebuffer;
use crate::mapper::{self, format_uptime};
use crate::scene::{Scene, draw_charge_bar, draw_field};
use crate::sensor::{Sample, Sampler, SensorHal};
use crate::tracker::{FIELD_COUNT, FieldId};

// =============================================================================
// Reports
// =============================================================================

/// What one pump redrew.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameReport {
    /// Fields committed this frame, in redraw order.
    pub fields: Vec<FieldId, FIELD_COUNT>,
    pub charge_bar: bool,
    pub flushes: u32,
    pub bytes: usize,
}

impl FrameReport {
    #[inline]
    pub fn is_empty(&self) -> bool { self.fields.is_empty() && !self.charge_bar }

    pub fn redrew(
        &self,
        id: FieldId,
    ) -> bool {
        self.fields.contains(&id)
    }

    fn record(
        &mut self,
        ack: &FlushAck,
    ) {
        self.flushes += 1;
        self.bytes += ack.bytes;
    }
}

/// Outcome of a slow tick that produced a reading.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlowTickReport {
    pub sample: Sample,
    /// Sensor-derived fields that became dirty.
    pub changed: Vec<FieldId, FIELD_COUNT>,
    pub charge_bar_changed: bool,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlowTick {
    NotDue,
    /// Due, but no reading has ever succeeded.
    Skipped,
    Sampled(SlowTickReport),
}

/// Everything one [`RenderScheduler::service`] call did.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServiceReport {
    pub now: Millis,
    pub slow: SlowTick,
    pub frame: FrameReport,
}

// =============================================================================
// Scheduler
// =============================================================================

/// Drives sampling, uptime and redraws for one [`Scene`].
pub struct RenderScheduler {
    config: PanelConfig,
    slow: Deadline,
    fast: Deadline,
    uptime: UptimeCounter,
}

impl RenderScheduler {
    /// The first slow tick is due immediately so the panel fills in on boot.
    pub fn new(
        config: PanelConfig,
        now: Millis,
    ) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        Ok(Self {
            slow: Deadline::immediate(now, config.slow_period_ms),
            fast: Deadline::new(now, config.fast_period_ms),
            uptime: UptimeCounter::new(now),
            config,
        })
    }

    #[inline]
    pub const fn config(&self) -> &PanelConfig { &self.config }

    #[inline]
    pub const fn uptime(&self) -> &UptimeCounter { &self.uptime }

    #[inline]
    pub const fn slow_tick_due(
        &self,
        now: Millis,
    ) -> bool {
        self.slow.is_due(now)
    }

    #[inline]
    pub const fn fast_tick_due(
        &self,
        now: Millis,
    ) -> bool {
        self.fast.is_due(now)
    }

    /// Milliseconds until the next fast tick.
    #[inline]
    pub const fn fast_tick_remaining(
        &self,
        now: Millis,
    ) -> u32 {
        self.fast.remaining(now)
    }

    /// Sample once and feed the sensor-derived fields.
    ///
    /// Rearms the slow deadline from the clock reading taken after the
    /// sample. Returns `None` when no reading is available yet.
    pub fn on_slow_tick<C, H>(
        &mut self,
        clock: &C,
        sampler: &mut Sampler<H>,
        scene: &mut Scene,
    ) -> Option<SlowTickReport>
    where
        C: Clock,
        H: SensorHal,
    {
        let sample = sampler.sample(clock.now());
        self.slow.rearm(clock.now());
        let sample = sample?;

        let texts = mapper::map(&sample.reading, self.config.curve);
        let mut changed = Vec::new();
        for (id, text) in [
            (FieldId::Temperature, texts.temperature),
            (FieldId::Voltage, texts.voltage),
            (FieldId::Charge, texts.charge),
        ] {
            if scene.update(id, text) {
                // At most three sensor fields
                let _ = changed.push(id);
            }
        }
        let charge_bar_changed = scene.set_charge(texts.percentage);

        Some(SlowTickReport {
            sample,
            changed,
            charge_bar_changed,
        })
    }

    /// Refresh the uptime field. Returns `true` if it became dirty.
    pub fn on_fast_tick(
        &mut self,
        now: Millis,
        scene: &mut Scene,
    ) -> bool {
        self.fast.rearm(now);
        self.uptime.advance(now);
        scene.update(FieldId::Uptime, format_uptime(self.uptime.seconds()))
    }

    /// Redraw every dirty region through `bridge`.
    ///
    /// A region is committed only after the bridge acknowledges its flush.
    /// On error, every region not yet acknowledged goes back to dirty.
    pub fn pump<B>(
        &mut self,
        scene: &mut Scene,
        bridge: &mut B,
    ) -> Result<FrameReport, PanelError>
    where
        B: FlushBridge + ?Sized,
    {
        let mut report = FrameReport::default();
        if !scene.is_dirty() {
            return Ok(report);
        }
        bridge.begin_frame()?;

        // Drawn but waiting for the end-of-frame ack
        let mut staged: Vec<FieldId, FIELD_COUNT> = Vec::new();
        let mut bar_staged = false;

        for id in FieldId::ALL {
            let field = scene.field_mut(id);
            let region = field.region();
            let Some(text) = field.begin_redraw().cloned() else {
                continue;
            };
            let result = stage(bridge, region, |canvas| {
                draw_field(canvas, region, &text).ok();
            });
            match result {
                Ok(Some(ack)) => {
                    scene.field_mut(id).commit();
                    let _ = report.fields.push(id);
                    report.record(&ack);
                }
                Ok(None) => {
                    let _ = staged.push(id);
                }
                Err(e) => {
                    scene.field_mut(id).abort_redraw();
                    abort_staged(scene, &staged, bar_staged);
                    return Err(e);
                }
            }
        }

        let bar = scene.charge_bar_mut();
        let region = bar.region();
        if let Some(percentage) = bar.begin_redraw() {
            let result = stage(bridge, region, |canvas| {
                draw_charge_bar(canvas, region, percentage).ok();
            });
            match result {
                Ok(Some(ack)) => {
                    scene.charge_bar_mut().commit();
                    report.charge_bar = true;
                    report.record(&ack);
                }
                Ok(None) => bar_staged = true,
                Err(e) => {
                    scene.charge_bar_mut().abort_redraw();
                    abort_staged(scene, &staged, bar_staged);
                    return Err(e);
                }
            }
        }

        match bridge.end_frame() {
            Ok(Some(ack)) => {
                for &id in &staged {
                    scene.field_mut(id).commit();
                    let _ = report.fields.push(id);
                }
                if bar_staged {
                    scene.charge_bar_mut().commit();
                    report.charge_bar = true;
                }
                report.record(&ack);
            }
            Ok(None) => abort_staged(scene, &staged, bar_staged),
            Err(e) => {
                abort_staged(scene, &staged, bar_staged);
                return Err(e);
            }
        }
        Ok(report)
    }

    /// One fast tick: uptime, the slow tick when due, then the pump.
    pub fn service<C, H, B>(
        &mut self,
        clock: &C,
        sampler: &mut Sampler<H>,
        scene: &mut Scene,
        bridge: &mut B,
    ) -> Result<ServiceReport, PanelError>
    where
        C: Clock,
        H: SensorHal,
        B: FlushBridge + ?Sized,
    {
        let now = clock.now();
        self.on_fast_tick(now, scene);
        let slow = if self.slow_tick_due(now) {
            match self.on_slow_tick(clock, sampler, scene) {
                Some(report) => SlowTick::Sampled(report),
                None => SlowTick::Skipped,
            }
        } else {
            SlowTick::NotDue
        };
        let frame = self.pump(scene, bridge)?;
        Ok(ServiceReport { now, slow, frame })
    }
}

/// Draw one region into the bridge's canvas and hand it back.
fn stage<B, F>(
    bridge: &mut B,
    region: Rectangle,
    draw: F,
) -> Result<Option<FlushAck>, PanelError>
where
    B: FlushBridge + ?Sized,
    F: FnOnce(&mut Framebuffer<'_>),
{
    let mut canvas = bridge.canvas(region)?;
    draw(&mut canvas);
    bridge.region_done(region)
}

fn abort_staged(
    scene: &mut Scene,
    staged: &[FieldId],
    bar_staged: bool,
) {
    for &id in staged {
        scene.field_mut(id).abort_redraw();
    }
    if bar_staged {
        scene.charge_bar_mut().abort_redraw();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
