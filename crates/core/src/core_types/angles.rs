//! Sun-sensor geometry for one simulation step

use super::units::Degrees;
use crate::error::{CanopyError, Result};
use serde::{Deserialize, Serialize};

/// Solar and viewing angles
///
/// Read-only to the geometry engines; a new step builds a new value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarAngles {
    /// Solar zenith angle
    pub tts: Degrees,
    /// Viewing zenith angle
    pub tto: Degrees,
    /// Relative azimuth between sun and viewer
    pub psi: Degrees,
}

impl Default for SolarAngles {
    fn default() -> Self {
        Self {
            tts: Degrees::new(30.0),
            tto: Degrees::new(0.0),
            psi: Degrees::new(0.0),
        }
    }
}

impl SolarAngles {
    /// Create a new geometry from raw degree values
    #[must_use]
    pub fn new(tts: f64, tto: f64, psi: f64) -> Self {
        Self {
            tts: Degrees::new(tts),
            tto: Degrees::new(tto),
            psi: Degrees::new(psi),
        }
    }

    /// Check that both zenith angles are above the horizon
    ///
    /// # Errors
    /// `InvalidAngle` when a zenith angle is outside [0, 90) or `psi` is not finite.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("tts", *self.tts), ("tto", *self.tto)] {
            if !(0.0..90.0).contains(&value) {
                return Err(CanopyError::InvalidAngle { name, value });
            }
        }
        if !self.psi.is_finite() {
            return Err(CanopyError::InvalidAngle {
                name: "psi",
                value: *self.psi,
            });
        }
        Ok(())
    }

    /// Relative azimuth folded into [0, 180] as required by `volscatt`
    #[must_use]
    pub fn psi_vol(&self) -> f64 {
        wrap_relative_azimuth(*self.psi)
    }
}

/// Fold any relative azimuth into the principal range [0, 180]
#[must_use]
pub fn wrap_relative_azimuth(psi: f64) -> f64 {
    (psi - 360.0 * (psi / 360.0).round()).abs()
}
