//! Leaf optical and biochemical state consumed by the flux pipelines
//!
//! Spectra come from an external leaf optics model; this crate only reads
//! them. Fluorescence matrices are expressed per unit quantum efficiency so
//! `fqe` scales emission without regenerating the matrices.

use crate::core_types::WaveLengths;
use crate::error::{check_len, CanopyError, Result};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Optical state of one leaf (or one layer's leaves)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafBios {
    /// Shortwave reflectance on the full wavelength grid
    pub rho_sw: DVector<f64>,
    /// Shortwave transmittance on the full wavelength grid
    pub tau_sw: DVector<f64>,
    /// Broadband longwave reflectance
    pub rho_lw: f64,
    /// Broadband longwave transmittance
    pub tau_lw: f64,
    /// Fluorescence quantum efficiency
    pub fqe: f64,
    /// Xanthophyll de-epoxidation state used by the leaf optics model
    pub cx: f64,
    /// Backward fluorescence matrix (fluorescence band × excitation band)
    pub mb: DMatrix<f64>,
    /// Forward fluorescence matrix (fluorescence band × excitation band)
    pub mf: DMatrix<f64>,
}

impl LeafBios {
    /// Spectrally flat leaf without fluorescence
    #[must_use]
    pub fn uniform(wl: &WaveLengths, rho: f64, tau: f64) -> Self {
        Self {
            rho_sw: DVector::from_element(wl.len(), rho),
            tau_sw: DVector::from_element(wl.len(), tau),
            rho_lw: 0.01,
            tau_lw: 0.01,
            fqe: 0.01,
            cx: 0.0,
            mb: DMatrix::zeros(wl.iwlf.len(), wl.iwle.len()),
            mf: DMatrix::zeros(wl.iwlf.len(), wl.iwle.len()),
        }
    }

    /// Leaf with the given shortwave spectra
    #[must_use]
    pub fn with_spectra(mut self, rho_sw: DVector<f64>, tau_sw: DVector<f64>) -> Self {
        self.rho_sw = rho_sw;
        self.tau_sw = tau_sw;
        self
    }

    /// Leaf with the given fluorescence matrices (per unit `fqe`)
    #[must_use]
    pub fn with_fluorescence(mut self, mb: DMatrix<f64>, mf: DMatrix<f64>) -> Self {
        self.mb = mb;
        self.mf = mf;
        self
    }

    #[must_use]
    pub fn with_longwave(mut self, rho_lw: f64, tau_lw: f64) -> Self {
        self.rho_lw = rho_lw;
        self.tau_lw = tau_lw;
        self
    }

    /// Check spectra against the wavelength grid and energy bounds
    ///
    /// # Errors
    /// `ShapeMismatch` for wrongly sized spectra, `InvalidParameter` when
    /// reflectance + transmittance leaves [0, 1].
    pub fn validate(&self, wl: &WaveLengths) -> Result<()> {
        check_len("leaf rho_sw", wl.len(), self.rho_sw.len())?;
        check_len("leaf tau_sw", wl.len(), self.tau_sw.len())?;
        check_len("leaf mb rows", wl.iwlf.len(), self.mb.nrows())?;
        check_len("leaf mb cols", wl.iwle.len(), self.mb.ncols())?;
        check_len("leaf mf rows", wl.iwlf.len(), self.mf.nrows())?;
        check_len("leaf mf cols", wl.iwle.len(), self.mf.ncols())?;

        for (&r, &t) in self.rho_sw.iter().zip(self.tau_sw.iter()) {
            if r < 0.0 || t < 0.0 || r + t > 1.0 + 1e-9 {
                return Err(CanopyError::InvalidParameter {
                    name: "leaf rho_sw + tau_sw",
                    value: r + t,
                    reason: "leaf reflectance and transmittance must lie in [0, 1] together",
                });
            }
        }
        if self.rho_lw < 0.0 || self.tau_lw < 0.0 || self.rho_lw + self.tau_lw > 1.0 {
            return Err(CanopyError::InvalidParameter {
                name: "leaf rho_lw + tau_lw",
                value: self.rho_lw + self.tau_lw,
                reason: "longwave reflectance and transmittance must lie in [0, 1] together",
            });
        }
        if self.fqe < 0.0 {
            return Err(CanopyError::InvalidParameter {
                name: "fqe",
                value: self.fqe,
                reason: "fluorescence quantum efficiency must be non-negative",
            });
        }
        Ok(())
    }
}

/// Accept one shared leaf or exactly one leaf per layer
///
/// # Errors
/// `LeafCountMismatch` for any other count.
pub fn check_leaf_count(leaves: &[LeafBios], n_layer: usize) -> Result<()> {
    if leaves.len() == 1 || leaves.len() == n_layer {
        Ok(())
    } else {
        Err(CanopyError::LeafCountMismatch {
            leaves: leaves.len(),
            layers: n_layer,
        })
    }
}

/// Leaf governing layer `j` (the shared leaf under the big-leaf assumption)
pub(crate) fn leaf_for_layer(leaves: &[LeafBios], j: usize) -> &LeafBios {
    if leaves.len() == 1 {
        &leaves[0]
    } else {
        &leaves[j]
    }
}
