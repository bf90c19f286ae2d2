//! Per-step forcing: incoming shortwave and leaf temperatures

use crate::core_types::{Kelvin, WaveLengths};
use crate::error::{check_len, CanopyError, Result};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Top-of-canopy shortwave irradiance (W m⁻² nm⁻¹)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingRadiation {
    /// Direct solar beam on a horizontal plane
    pub e_direct: DVector<f64>,
    /// Diffuse sky irradiance
    pub e_diffuse: DVector<f64>,
}

impl IncomingRadiation {
    #[must_use]
    pub fn uniform(wl: &WaveLengths, e_direct: f64, e_diffuse: f64) -> Self {
        Self {
            e_direct: DVector::from_element(wl.len(), e_direct),
            e_diffuse: DVector::from_element(wl.len(), e_diffuse),
        }
    }

    /// # Errors
    /// `ShapeMismatch` for wrongly sized spectra, `InvalidParameter` for
    /// negative irradiance.
    pub fn validate(&self, wl: &WaveLengths) -> Result<()> {
        check_len("e_direct", wl.len(), self.e_direct.len())?;
        check_len("e_diffuse", wl.len(), self.e_diffuse.len())?;
        if let Some(&e) = self
            .e_direct
            .iter()
            .chain(self.e_diffuse.iter())
            .find(|&&e| e < 0.0)
        {
            return Err(CanopyError::InvalidParameter {
                name: "incoming shortwave",
                value: e,
                reason: "irradiance must be non-negative",
            });
        }
        Ok(())
    }
}

/// Temperature of the sunlit leaves of one layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SunlitTemperature {
    /// One temperature for every leaf orientation
    Uniform(Kelvin),
    /// Kelvin per leaf inclination (rows) and azimuth (columns)
    Resolved(DMatrix<f64>),
}

impl SunlitTemperature {
    /// ⟨T⁴⟩ over leaf orientations, weighted by `lidf` and uniform in azimuth
    #[must_use]
    pub fn mean_pow4(&self, lidf: &[f64]) -> f64 {
        match self {
            SunlitTemperature::Uniform(t) => t.pow4(),
            SunlitTemperature::Resolved(t) => {
                let n_azi = t.ncols() as f64;
                lidf.iter()
                    .enumerate()
                    .map(|(i, &f)| f * t.row(i).iter().map(|v| v.powi(4)).sum::<f64>() / n_azi)
                    .sum()
            }
        }
    }
}

/// Leaf temperatures driving thermal emission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafTemperatures {
    /// Shaded leaf temperature per layer
    pub t_shade: Vec<Kelvin>,
    /// Sunlit leaf temperature per layer
    pub t_sun: Vec<SunlitTemperature>,
}

impl LeafTemperatures {
    /// Every leaf of every layer at `t`
    #[must_use]
    pub fn isothermal(n_layer: usize, t: Kelvin) -> Self {
        Self {
            t_shade: vec![t; n_layer],
            t_sun: vec![SunlitTemperature::Uniform(t); n_layer],
        }
    }

    /// # Errors
    /// `ShapeMismatch` when a profile or resolved matrix does not fit the canopy.
    pub fn validate(&self, n_layer: usize, n_incl: usize, n_azi: usize) -> Result<()> {
        check_len("t_shade", n_layer, self.t_shade.len())?;
        check_len("t_sun", n_layer, self.t_sun.len())?;
        for t in &self.t_sun {
            if let SunlitTemperature::Resolved(m) = t {
                check_len("t_sun inclination bins", n_incl, m.nrows())?;
                check_len("t_sun azimuth bins", n_azi, m.ncols())?;
            }
        }
        Ok(())
    }
}
