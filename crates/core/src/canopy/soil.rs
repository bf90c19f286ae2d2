//! Soil boundary condition

use crate::core_types::{Kelvin, WaveLengths};
use crate::error::{check_len, CanopyError, Result};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// Soil reflectance spectra and skin temperature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilOpticals {
    /// Shortwave reflectance on the full wavelength grid
    pub rho_sw: DVector<f64>,
    /// Broadband longwave reflectance (emissivity is `1 - rho_lw`)
    pub rho_lw: f64,
    pub skin_t: Kelvin,
}

impl SoilOpticals {
    /// Spectrally flat soil
    #[must_use]
    pub fn uniform(wl: &WaveLengths, rho_sw: f64, rho_lw: f64, skin_t: Kelvin) -> Self {
        Self {
            rho_sw: DVector::from_element(wl.len(), rho_sw),
            rho_lw,
            skin_t,
        }
    }

    #[must_use]
    pub fn emissivity_lw(&self) -> f64 {
        1.0 - self.rho_lw
    }

    /// # Errors
    /// `ShapeMismatch` for a wrongly sized spectrum, `InvalidParameter` for
    /// reflectances outside [0, 1].
    pub fn validate(&self, wl: &WaveLengths) -> Result<()> {
        check_len("soil rho_sw", wl.len(), self.rho_sw.len())?;
        if let Some(&r) = self.rho_sw.iter().find(|&&r| !(0.0..=1.0).contains(&r)) {
            return Err(CanopyError::InvalidParameter {
                name: "soil rho_sw",
                value: r,
                reason: "soil reflectance must lie in [0, 1]",
            });
        }
        if !(0.0..=1.0).contains(&self.rho_lw) {
            return Err(CanopyError::InvalidParameter {
                name: "soil rho_lw",
                value: self.rho_lw,
                reason: "soil reflectance must lie in [0, 1]",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_soil() {
        let wl = WaveLengths::uniform(400.0, 800.0, 100.0).unwrap();
        let soil = SoilOpticals::uniform(&wl, 0.2, 0.06, Kelvin::new(300.0));
        assert!(soil.validate(&wl).is_ok());
        assert!((soil.emissivity_lw() - 0.94).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_reflectance() {
        let wl = WaveLengths::uniform(400.0, 800.0, 100.0).unwrap();
        let soil = SoilOpticals::uniform(&wl, 1.2, 0.06, Kelvin::new(300.0));
        assert!(soil.validate(&wl).is_err());
    }
}
