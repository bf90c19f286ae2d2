//! Core types and utilities

pub mod angles;
pub mod units;
pub mod wavelengths;

pub use angles::{wrap_relative_azimuth, SolarAngles};
pub use units::{Celsius, Degrees, Kelvin};
pub use wavelengths::WaveLengths;
