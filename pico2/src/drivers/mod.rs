//! Hardware drivers for the panel.
//!
//! - `st7789`: ST7789 display bus (SPI0, blocking region transfers)
//! - `display`: SPI configuration for the Pimoroni PIM715 Display Pack 2.8"
//! - `sensors`: VSYS and die temperature through the RP2350 ADC

mod display;
mod sensors;
mod st7789;

pub use display::display_spi_config;
pub use sensors::PicoSensors;
pub use st7789::{BusError, St7789Bus};
