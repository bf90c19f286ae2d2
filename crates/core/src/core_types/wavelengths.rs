//! Spectral grid shared by the shortwave and fluorescence pipelines

use crate::error::{CanopyError, Result};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// Excitation band of chlorophyll fluorescence (nm)
pub const EXCITATION_BAND: (f64, f64) = (400.0, 750.0);

/// Emission band of chlorophyll fluorescence (nm)
pub const FLUORESCENCE_BAND: (f64, f64) = (640.0, 850.0);

/// Wavelength grid with the excitation/fluorescence sub-bands marked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveLengths {
    /// Band centres in nm, strictly increasing
    pub wl: Vec<f64>,
    /// Indices into `wl` of the excitation band
    pub iwle: Vec<usize>,
    /// Indices into `wl` of the fluorescence band
    pub iwlf: Vec<usize>,
}

impl WaveLengths {
    /// Build a grid from explicit band centres
    ///
    /// # Errors
    /// `InvalidParameter` if the grid is empty or not strictly increasing.
    pub fn new(wl: Vec<f64>) -> Result<Self> {
        if wl.is_empty() {
            return Err(CanopyError::InvalidParameter {
                name: "wl",
                value: 0.0,
                reason: "wavelength grid is empty",
            });
        }
        if let Some(w) = wl.windows(2).find(|w| w[1] <= w[0]) {
            return Err(CanopyError::InvalidParameter {
                name: "wl",
                value: w[1],
                reason: "wavelength grid must be strictly increasing",
            });
        }

        let band = |(lo, hi): (f64, f64)| -> Vec<usize> {
            wl.iter()
                .enumerate()
                .filter(|&(_, &w)| w >= lo && w <= hi)
                .map(|(i, _)| i)
                .collect()
        };
        let iwle = band(EXCITATION_BAND);
        let iwlf = band(FLUORESCENCE_BAND);

        Ok(Self { wl, iwle, iwlf })
    }

    /// Uniform grid from `start` to `end` (inclusive) in steps of `step` nm
    ///
    /// # Errors
    /// `InvalidParameter` for a non-positive step or an empty range.
    pub fn uniform(start: f64, end: f64, step: f64) -> Result<Self> {
        if step <= 0.0 || !step.is_finite() {
            return Err(CanopyError::InvalidParameter {
                name: "step",
                value: step,
                reason: "wavelength step must be positive",
            });
        }
        let n = ((end - start) / step + 1e-9).floor() as usize + 1;
        Self::new((0..n).map(|i| start + i as f64 * step).collect())
    }

    /// 400–2500 nm at 10 nm, enough for broadband albedo and SIF
    ///
    /// # Errors
    /// Never fails for the built-in grid; the signature mirrors `uniform`.
    pub fn optical() -> Result<Self> {
        Self::uniform(400.0, 2500.0, 10.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.wl.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wl.is_empty()
    }

    /// Excitation band centres
    #[must_use]
    pub fn wle(&self) -> Vec<f64> {
        self.iwle.iter().map(|&i| self.wl[i]).collect()
    }

    /// Fluorescence band centres
    #[must_use]
    pub fn wlf(&self) -> Vec<f64> {
        self.iwlf.iter().map(|&i| self.wl[i]).collect()
    }

    /// Trapezoidal integral of a spectrum sampled on the full grid
    #[must_use]
    pub fn integrate(&self, spectrum: &DVector<f64>) -> f64 {
        trapezoid(&self.wl, spectrum.as_slice())
    }

    /// Trapezoidal integral of a spectrum sampled on the fluorescence band
    #[must_use]
    pub fn integrate_fluorescence(&self, spectrum: &DVector<f64>) -> f64 {
        trapezoid(&self.wlf(), spectrum.as_slice())
    }
}

/// Trapezoidal rule; a single sample integrates to zero
fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xw, yw)| 0.5 * (xw[1] - xw[0]) * (yw[0] + yw[1]))
        .sum()
}

/// Select `rows` of a spectrum
pub(crate) fn select(spectrum: &DVector<f64>, rows: &[usize]) -> DVector<f64> {
    DVector::from_iterator(rows.len(), rows.iter().map(|&i| spectrum[i]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_grid_bands() {
        let wl = WaveLengths::uniform(400.0, 900.0, 10.0).unwrap();
        assert_eq!(wl.len(), 51);
        assert_eq!(wl.wl[0], 400.0);
        assert_eq!(*wl.wl.last().unwrap(), 900.0);

        // 400..=750 step 10
        assert_eq!(wl.iwle.len(), 36);
        // 640..=850 step 10
        assert_eq!(wl.iwlf.len(), 22);
        assert_eq!(wl.wlf()[0], 640.0);
    }

    #[test]
    fn test_rejects_bad_grid() {
        assert!(WaveLengths::new(vec![]).is_err());
        assert!(WaveLengths::new(vec![500.0, 500.0]).is_err());
        assert!(WaveLengths::uniform(400.0, 500.0, 0.0).is_err());
    }

    #[test]
    fn test_integrate_constant() {
        let wl = WaveLengths::uniform(400.0, 700.0, 10.0).unwrap();
        let ones = DVector::from_element(wl.len(), 2.0);
        assert!((wl.integrate(&ones) - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_select() {
        let v = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(select(&v, &[1, 3]).as_slice(), &[2.0, 4.0]);
    }
}
