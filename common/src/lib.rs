//! Display refresh core for the battery/temperature status panel.
//!
//! This crate contains the platform-agnostic logic shared between the
//! simulator and the Pico 2 firmware:
//!
//! - [`config`]: Layout constants, tick periods, battery curve, refresh strategy
//! - [`clock`]: Wraparound-safe millisecond clock, deadlines and uptime
//! - [`sensor`]: Sensor collaborator trait and the stale-tolerant [`Sampler`](sensor::Sampler)
//! - [`mapper`]: Reading to display text (charge percentage, uptime formatting)
//! - [`tracker`]: Per-field dirty state (`CLEAN → DIRTY → REDRAWING → CLEAN`)
//! - [`scene`]: Fixed layout, static chrome and field drawing
//! - [`framebuffer`]: RGB565 byte framebuffers and the ping-pong buffer pair
//! - [`bridge`]: Display bus trait and the two flush strategies
//! - [`scheduler`]: Slow/fast tick cadence and the redraw pump
//!
//! # Data Flow
//!
//! ```text
//! Sampler → mapper → tracker (diff) → Scene (dirty) → scheduler pump → bridge → bus
//! ```
//!
//! # no_std Compatibility
//!
//! The crate is `no_std` outside of tests. Run the host tests with:
//! ```bash
//! cargo test -p panel-common
//! ```

#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

pub mod bridge;
pub mod clock;
pub mod colors;
pub mod config;
pub mod error;
pub mod framebuffer;
pub mod mapper;
pub mod scene;
pub mod scheduler;
pub mod sensor;
pub mod styles;
pub mod tracker;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used items
pub use bridge::{BridgeStats, DisplayBus, FlushAck, FlushBridge, PingPongBridge, RegionBridge};
pub use clock::{Clock, Deadline, Millis, UptimeCounter};
pub use config::{BatteryCurve, PanelConfig, RefreshStrategy};
pub use error::{ConfigError, PanelError, SensorError};
pub use scene::Scene;
pub use scheduler::{FrameReport, RenderScheduler, ServiceReport, SlowTick, SlowTickReport};
pub use sensor::{Calibration, Freshness, Reading, Sample, Sampler, SensorHal};
pub use tracker::{DisplayField, FieldId, FieldState};
