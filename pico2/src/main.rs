//! Battery/temperature status panel firmware for Raspberry Pi Pico 2 (RP2350)
//!
//! Shows die temperature, VSYS voltage, battery charge and uptime on the
//! Pimoroni PIM715 Display Pack 2.8".
//!
//! # Architecture
//!
//! A single task ticks at the fast period (20 ms):
//! - Uptime is advanced and tracked every tick
//! - Sensors are sampled once the slow period (1 s) has elapsed since the
//!   previous sample finished
//! - Every dirty region is redrawn and flushed; unchanged regions are never
//!   touched
//!
//! With the `double-buffer` feature the panel draws into two full-screen
//! framebuffers and flushes the whole screen per frame. Otherwise each dirty
//! region is staged in a small buffer and flushed on its own.

#![no_std]
#![no_main]
// Crate-level lints (match lib.rs for consistency)
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

// Modules only used in the binary (not testable on host)
mod drivers;

use defmt::{debug, error, info, warn};
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, Config as AdcConfig};
use embassy_rp::gpio::{Level, Output, Pull};
use embassy_rp::spi::Spi;
use embassy_time::{Duration, Instant, Ticker, Timer};
use panel_common::{
    Clock,
    FlushBridge,
    Freshness,
    Millis,
    RenderScheduler,
    Sampler,
    Scene,
    ServiceReport,
    SlowTick,
};
use panel_pico2::adc::VSYS_CALIBRATION;
use panel_pico2::config::panel_config;
use {defmt_rtt as _, panic_probe as _};

use crate::drivers::{PicoSensors, St7789Bus, display_spi_config};

// =============================================================================
// Program Metadata (for picotool)
// =============================================================================

#[unsafe(link_section = ".bi_entries")]
#[used]
pub static PICOTOOL_ENTRIES: [embassy_rp::binary_info::EntryAddr; 4] = [
    embassy_rp::binary_info::rp_program_name!(c"pico2-status-panel"),
    embassy_rp::binary_info::rp_program_description!(c"Battery/temperature status panel on PIM715 Display"),
    embassy_rp::binary_info::rp_cargo_version!(),
    embassy_rp::binary_info::rp_program_build_attribute!(),
];

// =============================================================================
// Clock
// =============================================================================

/// Monotonic milliseconds from the embassy time driver.
struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now(&self) -> Millis { Millis::from_u64(Instant::now().as_millis()) }
}

// =============================================================================
// Refresh Strategy
// =============================================================================

#[cfg(feature = "double-buffer")]
fn make_bridge(bus: St7789Bus<'static>) -> Result<impl FlushBridge, panel_common::PanelError> {
    use panel_common::PingPongBridge;
    use panel_common::config::FRAMEBUFFER_BYTES;
    use panel_common::framebuffer::PingPong;
    use static_cell::ConstStaticCell;

    // Two full-screen framebuffers (153,600 bytes each)
    static FRAMEBUFFERS: ConstStaticCell<[[u8; FRAMEBUFFER_BYTES]; 2]> =
        ConstStaticCell::new([[0u8; FRAMEBUFFER_BYTES]; 2]);
    let [a, b] = FRAMEBUFFERS.take();
    let pair = PingPong::new(a, b)?;
    info!("Refresh: double-buffered ({} bytes)", 2 * FRAMEBUFFER_BYTES);
    Ok(PingPongBridge::new(bus, pair))
}

#[cfg(not(feature = "double-buffer"))]
fn make_bridge(bus: St7789Bus<'static>) -> Result<impl FlushBridge, panel_common::PanelError> {
    use panel_common::RegionBridge;
    use panel_common::config::REGION_BUFFER_BYTES;

    info!("Refresh: partial ({} byte staging buffer)", REGION_BUFFER_BYTES);
    Ok(RegionBridge::<_, REGION_BUFFER_BYTES>::new(bus))
}

// =============================================================================
// Main
// =============================================================================

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Status panel starting...");
    let p = embassy_rp::init(Default::default());

    // PIM715 pinout: CS=17, DC=16, CLK=18, MOSI=19, Backlight=20
    let cs = Output::new(p.PIN_17, Level::High);
    let dc = Output::new(p.PIN_16, Level::Low);
    let mut backlight = Output::new(p.PIN_20, Level::Low);

    // TX-only SPI (display doesn't need MISO)
    let spi = Spi::new_txonly(p.SPI0, p.PIN_18, p.PIN_19, p.DMA_CH0, display_spi_config());
    let mut bus = St7789Bus::new(spi, dc, cs);
    if let Err(e) = bus.init().await {
        error!("Display init failed: {}", e);
        park().await;
    }
    info!("Display initialized");

    // VSYS/3 on ADC3 (GPIO29) and the internal temperature sensor
    let adc = Adc::new_blocking(p.ADC, AdcConfig::default());
    let vsys = Channel::new_pin(p.PIN_29, Pull::None);
    let temperature = Channel::new_temp_sensor(p.ADC_TEMP_SENSOR);
    let mut sampler = Sampler::with_calibration(PicoSensors::new(adc, vsys, temperature), VSYS_CALIBRATION);

    let config = panel_config();
    info!("Config: {}", config);

    let clock = EmbassyClock;
    let mut scheduler = match RenderScheduler::new(config, clock.now()) {
        Ok(scheduler) => scheduler,
        Err(e) => {
            error!("Invalid panel config: {}", e);
            park().await
        }
    };
    let mut scene = Scene::new();

    let mut bridge = match make_bridge(bus) {
        Ok(bridge) => bridge,
        Err(e) => {
            error!("Frame buffers unavailable: {}", e);
            park().await
        }
    };
    if let Err(e) = bridge.init(&scene) {
        error!("Chrome flush failed: {}", e);
        park().await;
    }

    // Backlight on once the chrome is visible
    backlight.set_high();
    info!("Backlight on");

    let mut ticker = Ticker::every(Duration::from_millis(u64::from(config.fast_period_ms)));
    loop {
        match scheduler.service(&clock, &mut sampler, &mut scene, &mut bridge) {
            Ok(report) => log_report(&report),
            Err(e) => {
                // Aborted regions stay dirty, but a failed bus does not recover
                error!("Display flush failed: {}, halting redraws", e);
                park().await;
            }
        }
        ticker.next().await;
    }
}

fn log_report(report: &ServiceReport) {
    match &report.slow {
        SlowTick::NotDue => {}
        SlowTick::Skipped => warn!("No sensor reading yet, tick skipped"),
        SlowTick::Sampled(slow) => {
            let reading = &slow.sample.reading;
            match slow.sample.freshness {
                Freshness::Fresh => info!(
                    "Sample: {} mV, {} C, {} fields changed",
                    reading.voltage_mv,
                    reading.temperature_c,
                    slow.changed.len()
                ),
                Freshness::Stale(e) => warn!("Sensor read failed ({}), showing last reading", e),
            }
            if slow.sample.reused_calibration {
                warn!("ADC calibration unavailable, reusing last");
            }
        }
    }
    if !report.frame.is_empty() {
        debug!(
            "Frame @ {} ms: {} fields, bar={}, {} flushes, {} bytes",
            report.now.0,
            report.frame.fields.len(),
            report.frame.charge_bar,
            report.frame.flushes,
            report.frame.bytes
        );
    }
}

/// Stop doing anything useful, forever.
async fn park() -> ! {
    loop {
        Timer::after_secs(60).await;
    }
}
