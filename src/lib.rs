//! Driver core for the ST LIS3DF 3-axis accelerometer.
//!
//! A [`Lis3df`] polls the output registers on a background sampler, smooths the readings
//! through a fixed-window moving average and publishes calibrated frames to an
//! [`InputSink`](input::InputSink). The [`ControlSurface`] maps external commands onto the
//! device and keeps the calibration offset in sync with an [`OffsetStore`](offset::OffsetStore).

mod error;
mod log;

pub mod config;
pub mod control;
pub mod device;
pub mod filter;
pub mod input;
pub mod interface;
pub mod offset;
pub mod params;
pub mod registers;
pub mod sample;
pub mod sampler;

#[cfg(test)]
mod testing;

pub use crate::control::ControlSurface;
pub use crate::device::Lis3df;
pub use crate::error::{Error, Result};
