//! Status panel simulator for desktop platforms.
//!
//! Drives the same refresh core as the firmware against an
//! `embedded-graphics-simulator` display, with a synthetic sensor.
//! Headless by default: runs a fixed number of simulated seconds and logs
//! what each tick redrew. Build with `--features window` to watch it live.

// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

mod bus;
mod clock;
mod sensor;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum, ValueHint};
use embedded_graphics_simulator::OutputSettingsBuilder;
use env_logger::Env;
use log::{debug, error, info, warn};
use panel_common::config::{FRAMEBUFFER_BYTES, REGION_BUFFER_BYTES};
use panel_common::framebuffer::PingPong;
use panel_common::{
    BatteryCurve,
    BridgeStats,
    Calibration,
    Clock,
    ConfigError,
    FlushBridge,
    Freshness,
    PanelConfig,
    PanelError,
    PingPongBridge,
    RefreshStrategy,
    RegionBridge,
    RenderScheduler,
    Sampler,
    Scene,
    ServiceReport,
    SlowTick,
};
use thiserror::Error;

use crate::bus::{SimBus, SimBusError};
use crate::clock::SimClock;
use crate::sensor::{SynthProfile, SynthSensor};

// =============================================================================
// Command Line
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// Flush each dirty region on its own
    Partial,
    /// Two full-screen buffers, whole-screen flush per frame
    Double,
}

#[derive(Debug, Parser, Clone)]
#[command(name = "simulator", about = "Battery/temperature status panel simulator")]
struct Cli {
    /// Simulated seconds to run (headless mode)
    #[arg(long, default_value_t = 30)]
    seconds: u32,
    /// Refresh strategy (defaults to `double` with the `double-buffer` feature)
    #[arg(long, value_enum)]
    strategy: Option<Strategy>,
    /// Battery voltage shown as 0%
    #[arg(long, default_value_t = 3300)]
    empty_mv: u32,
    /// Battery voltage shown as 100%
    #[arg(long, default_value_t = 4200)]
    full_mv: u32,
    /// Fail one ADC read in every N samples (0 disables)
    #[arg(long, default_value_t = 13)]
    adc_fail_every: u32,
    /// Withhold the ADC calibration in every N samples (0 disables)
    #[arg(long, default_value_t = 17)]
    calibration_outage_every: u32,
    /// Fail the display bus after this many pixel transfers
    #[arg(long)]
    bus_fail_after: Option<u32>,
    /// Save the final screen as a PNG
    #[arg(long, value_hint = ValueHint::FilePath)]
    snapshot: Option<PathBuf>,
    /// Log every frame
    #[arg(long, action = clap::ArgAction::SetTrue)]
    debug: bool,
}

impl Cli {
    fn strategy(&self) -> RefreshStrategy {
        match self.strategy {
            Some(Strategy::Partial) => RefreshStrategy::Partial,
            Some(Strategy::Double) => RefreshStrategy::DoubleBuffered,
            None if cfg!(feature = "double-buffer") => RefreshStrategy::DoubleBuffered,
            None => RefreshStrategy::Partial,
        }
    }

    fn panel_config(&self) -> Result<PanelConfig, ConfigError> {
        PanelConfig::new()
            .with_curve(BatteryCurve::new(self.empty_mv, self.full_mv))
            .with_strategy(self.strategy())
            .validate()
    }

    fn profile(&self) -> SynthProfile {
        SynthProfile {
            adc_fail_every: self.adc_fail_every,
            calibration_outage_every: self.calibration_outage_every,
            ..SynthProfile::default()
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("display bus failed: {0}")]
    Bus(SimBusError),

    #[error(transparent)]
    Panel(#[from] PanelError),

    #[error("could not save snapshot: {0}")]
    Snapshot(String),
}

impl SimError {
    /// Attach the bus's own error to a `PanelError::Bus`.
    fn from_panel(
        error: PanelError,
        bus: &SimBus,
    ) -> Self {
        match (error, bus.last_error()) {
            (PanelError::Bus, Some(cause)) => Self::Bus(cause),
            (error, _) => Self::Panel(error),
        }
    }
}

// =============================================================================
// Bridges
// =============================================================================

/// A flush bridge whose bus is the simulator display.
trait SimBridge: FlushBridge {
    fn sim_bus(&self) -> &SimBus;
}

impl<const N: usize> SimBridge for RegionBridge<SimBus, N> {
    fn sim_bus(&self) -> &SimBus { self.bus() }
}

impl SimBridge for PingPongBridge<'_, SimBus> {
    fn sim_bus(&self) -> &SimBus { self.bus() }
}

// =============================================================================
// Run Loop
// =============================================================================

/// Totals from one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RunSummary {
    ticks: u32,
    samples: u32,
    stale_samples: u32,
    frames: u32,
    uptime_s: u64,
    stats: BridgeStats,
}

impl RunSummary {
    fn record(
        &mut self,
        report: &ServiceReport,
    ) {
        self.ticks += 1;
        if let SlowTick::Sampled(slow) = &report.slow {
            self.samples += 1;
            if !slow.sample.is_fresh() {
                self.stale_samples += 1;
            }
        }
        if !report.frame.is_empty() {
            self.frames += 1;
        }
    }
}

fn log_report(report: &ServiceReport) {
    match &report.slow {
        SlowTick::NotDue => {}
        SlowTick::Skipped => warn!("no sensor reading yet, tick skipped"),
        SlowTick::Sampled(slow) => {
            let reading = &slow.sample.reading;
            match slow.sample.freshness {
                Freshness::Fresh => info!(
                    "sample @ {} ms: {} mV, {:.1} C, changed {:?}, bar {}",
                    report.now.0,
                    reading.voltage_mv,
                    reading.temperature_c,
                    slow.changed.as_slice(),
                    slow.charge_bar_changed
                ),
                Freshness::Stale(e) => warn!("sample @ {} ms: {e}, showing last reading", report.now.0),
            }
            if slow.sample.reused_calibration {
                warn!("calibration unavailable, reusing last");
            }
        }
    }
    if !report.frame.is_empty() {
        debug!(
            "frame @ {} ms: {:?} bar={} flushes={} bytes={}",
            report.now.0,
            report.frame.fields.as_slice(),
            report.frame.charge_bar,
            report.frame.flushes,
            report.frame.bytes
        );
    }
}

/// Run `seconds` of simulated time, one fast tick at a time.
#[cfg_attr(feature = "window", allow(dead_code))]
fn run_headless<B: SimBridge>(
    config: PanelConfig,
    seconds: u32,
    sampler: &mut Sampler<SynthSensor>,
    bridge: &mut B,
) -> Result<RunSummary, SimError> {
    let clock = SimClock::new();
    let mut scene = Scene::new();
    let mut scheduler = RenderScheduler::new(config, clock.now())?;
    bridge
        .init(&scene)
        .map_err(|e| SimError::from_panel(e, bridge.sim_bus()))?;

    let mut summary = RunSummary::default();
    let ticks = seconds.saturating_mul(1000) / config.fast_period_ms;
    for _ in 0..ticks {
        clock.advance(config.fast_period_ms);
        let report = scheduler
            .service(&clock, sampler, &mut scene, bridge)
            .map_err(|e| SimError::from_panel(e, bridge.sim_bus()))?;
        log_report(&report);
        summary.record(&report);
    }
    summary.uptime_s = scheduler.uptime().seconds();
    summary.stats = bridge.stats();
    Ok(summary)
}

/// Run against the wall clock in an SDL window until it is closed.
#[cfg(feature = "window")]
fn run_window<B: SimBridge>(
    config: PanelConfig,
    sampler: &mut Sampler<SynthSensor>,
    bridge: &mut B,
) -> Result<RunSummary, SimError> {
    use std::thread;
    use std::time::{Duration, Instant};

    use embedded_graphics_simulator::{SimulatorEvent, Window};

    use crate::clock::WallClock;

    let frame_time = Duration::from_millis(u64::from(config.fast_period_ms));
    let clock = WallClock::new();
    let mut scene = Scene::new();
    let mut scheduler = RenderScheduler::new(config, clock.now())?;
    bridge
        .init(&scene)
        .map_err(|e| SimError::from_panel(e, bridge.sim_bus()))?;

    let output_settings = OutputSettingsBuilder::new().scale(2).build();
    let mut window = Window::new("Status Panel Sim", &output_settings);
    let mut summary = RunSummary::default();
    'run: loop {
        let tick_start = Instant::now();
        let report = scheduler
            .service(&clock, sampler, &mut scene, bridge)
            .map_err(|e| SimError::from_panel(e, bridge.sim_bus()))?;
        log_report(&report);
        summary.record(&report);

        window.update(bridge.sim_bus().display());
        for event in window.events() {
            if matches!(event, SimulatorEvent::Quit) {
                break 'run;
            }
        }
        if let Some(rest) = frame_time.checked_sub(tick_start.elapsed()) {
            thread::sleep(rest);
        }
    }
    summary.uptime_s = scheduler.uptime().seconds();
    summary.stats = bridge.stats();
    Ok(summary)
}

fn drive<B: SimBridge>(
    cli: &Cli,
    config: PanelConfig,
    bridge: &mut B,
) -> Result<RunSummary, SimError> {
    let mut sampler = Sampler::new(SynthSensor::new(cli.profile(), Calibration::PICO_VSYS));

    #[cfg(feature = "window")]
    let summary = run_window(config, &mut sampler, bridge)?;
    #[cfg(not(feature = "window"))]
    let summary = run_headless(config, cli.seconds, &mut sampler, bridge)?;

    if let Some(path) = &cli.snapshot {
        bridge
            .sim_bus()
            .display()
            .to_rgb_output_image(&OutputSettingsBuilder::new().build())
            .save_png(path)
            .map_err(|e| SimError::Snapshot(e.to_string()))?;
        info!("snapshot saved to {}", path.display());
    }
    Ok(summary)
}

fn run(cli: &Cli) -> Result<RunSummary, SimError> {
    let config = cli.panel_config()?;
    info!(
        "config: curve {}..{} mV, slow {} ms, fast {} ms, {:?}",
        config.curve.min_mv, config.curve.max_mv, config.slow_period_ms, config.fast_period_ms, config.strategy
    );

    let bus = SimBus::new(cli.bus_fail_after);
    match config.strategy {
        RefreshStrategy::Partial => {
            let mut bridge = RegionBridge::<_, REGION_BUFFER_BYTES>::new(bus);
            drive(cli, config, &mut bridge)
        }
        RefreshStrategy::DoubleBuffered => {
            let mut front = vec![0u8; FRAMEBUFFER_BYTES];
            let mut back = vec![0u8; FRAMEBUFFER_BYTES];
            let pair = PingPong::new(&mut front, &mut back)?;
            let mut bridge = PingPongBridge::new(bus, pair);
            drive(cli, config, &mut bridge)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(if cli.debug { "debug" } else { "info" }))
        .format_timestamp_millis()
        .init();
    info!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match run(&cli) {
        Ok(summary) => {
            info!(
                "done: {} ticks, {} samples ({} stale), {} frames, {} flushes, {} bytes, uptime {} s",
                summary.ticks,
                summary.samples,
                summary.stale_samples,
                summary.frames,
                summary.stats.flushes,
                summary.stats.bytes,
                summary.uptime_s
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
