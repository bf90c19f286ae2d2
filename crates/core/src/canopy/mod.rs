//! Canopy description: structure, leaf and soil optics, forcing, and the
//! buffers the geometry engine and flux pipelines write into

pub mod forcing;
pub mod leaf;
pub mod optics;
pub mod rads;
pub mod soil;
pub mod structure;

pub use forcing::{IncomingRadiation, LeafTemperatures, SunlitTemperature};
pub use leaf::{check_leaf_count, LeafBios};
pub use optics::CanopyOpticals;
pub use rads::CanopyRads;
pub use soil::SoilOpticals;
pub use structure::{spherical_lidf, verhoef_lidf, CanopyStructure, DEFAULT_LITAB};
