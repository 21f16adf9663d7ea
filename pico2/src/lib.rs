//! Status panel library - host-testable parts of the Pico 2 firmware.
//!
//! This library contains the board-specific logic that can be tested on the
//! host machine. The binary (`main.rs`) uses it and adds the embedded-specific
//! code (SPI, ADC, executor).
//!
//! # Testing
//!
//! Run tests on host with:
//! ```bash
//! cargo test -p panel-pico2 --lib --target x86_64-unknown-linux-gnu  # Linux/macOS
//! cargo test -p panel-pico2 --lib --target x86_64-pc-windows-msvc    # Windows
//! ```
//!
//! Tests run with `std` enabled (via `cfg_attr`), allowing use of the standard
//! test framework while the actual firmware runs as `no_std`.

// Use no_std only when NOT testing (tests need std for the test harness)
#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

// === Pure logic modules (testable on host, no ARM dependencies) ===

pub mod adc;
pub mod config;
pub mod st7789;
