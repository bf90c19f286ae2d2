//! Flux pipelines sharing one two-stream diffuse solver
//!
//! Shortwave, fluorescence and thermal radiation differ only in the layer
//! optics and sources they hand to `diffusive_s` and in how they
//! post-process its edge fluxes.

pub mod diffusive;
pub mod fluorescence;
pub mod matrices;
pub mod shortwave;
pub mod thermal;

pub use diffusive::{diffusive_s, DiffusiveFluxes};
pub use fluorescence::sif_fluxes;
pub use matrices::{canopy_matrices, LayerOptics};
pub use shortwave::short_wave;
pub use thermal::{layer_emissivity, thermal_fluxes, EmissionModel, STEFAN_BOLTZMANN};
