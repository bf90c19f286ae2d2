//! Canopy Radiative Transfer Core Library
//!
//! A layered SAIL (Scattering by Arbitrarily Inclined Leaves) canopy model.
//! Computes sun/view gap fractions with the hot-spot correlation, then solves
//! the two-stream diffuse equations for solar shortwave, chlorophyll
//! fluorescence and thermal longwave radiation.
//!
//! ## Pipeline
//!
//! 1. `geometry::canopy_geometry` fills `CanopyOpticals` (extinction,
//!    scattering coefficients, `Ps`/`Po`/`Pso`)
//! 2. `radiative::short_wave` computes fluxes, absorption and reflectance
//! 3. `radiative::sif_fluxes` emits and reabsorbs fluorescence
//! 4. `radiative::thermal_fluxes` exchanges longwave between leaves, soil and sky
//!
//! `CanopySimulation` owns the buffers and runs the stages in order.

// Core types and utilities
pub mod core_types;
pub mod error;

// Canopy description and the geometry engine
pub mod canopy;
pub mod config;
pub mod geometry;

// Flux pipelines and the driver
pub mod radiative;
pub mod simulation;

pub use canopy::{
    CanopyOpticals, CanopyRads, CanopyStructure, IncomingRadiation, LeafBios, LeafTemperatures,
    SoilOpticals, SunlitTemperature,
};
pub use config::{PsoClamp, RtConfig};
pub use core_types::{Celsius, Degrees, Kelvin, SolarAngles, WaveLengths};
pub use error::{CanopyError, Result};
pub use geometry::{canopy_geometry, create_angle_container, AngleContainer, QuadratureConfig};
pub use radiative::{
    diffusive_s, short_wave, sif_fluxes, thermal_fluxes, DiffusiveFluxes, EmissionModel,
};
pub use simulation::{CanopySimulation, StepForcing};
