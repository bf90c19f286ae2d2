//! Error types for canopy radiative transfer
//!
//! Configuration problems (leaf count, array shapes, out-of-range parameters)
//! are reported before any numerical kernel runs. A failed step produces no
//! partial output.

use crate::radiative::EmissionModel;
use thiserror::Error;

/// Errors raised while validating or running a canopy simulation step
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CanopyError {
    /// Leaf optics must be given once (big leaf) or once per layer
    #[error("expected 1 or {layers} leaves (one per layer), got {leaves}")]
    LeafCountMismatch { leaves: usize, layers: usize },

    #[error("canopy must have at least one layer, got {0}")]
    InvalidLayerCount(usize),

    /// A caller-supplied array does not match the configured dimensions
    #[error("{what}: expected length {expected}, found {found}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Sun and view zenith must stay below the horizon (< 90°)
    #[error("invalid {name} = {value}° (must be within [0, 90))")]
    InvalidAngle { name: &'static str, value: f64 },

    #[error("emission model {0:?} is not implemented")]
    UnsupportedEmissionModel(EmissionModel),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, CanopyError>;

/// Fail with `ShapeMismatch` unless `found == expected`
pub(crate) fn check_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(CanopyError::ShapeMismatch {
            what,
            expected,
            found,
        })
    }
}
