//! Sun/view geometry: volume scattering, leaf projections and gap fractions

pub mod angles;
pub mod canopy_geometry;
pub mod quadrature;

pub use angles::{clumping_factor, create_angle_container, volscatt, AngleContainer};
pub use canopy_geometry::{canopy_geometry, finite_layer_factor, hot_spot_distance, psofunction};
pub use quadrature::{quadgk, QuadEstimate, QuadratureConfig};
