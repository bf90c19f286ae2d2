//! Extinction and scattering state produced by the geometry engine

use super::CanopyStructure;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Canopy optical geometry, overwritten in place on every geometry update
///
/// Matrices are (leaf inclination × leaf azimuth). Gap-fraction profiles have
/// `n_layer + 1` entries: layer averages followed by the value at the soil.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanopyOpticals {
    /// Extinction coefficient in the solar direction
    pub ks: f64,
    /// Extinction coefficient in the viewing direction
    pub ko: f64,
    /// Mean of cos² of leaf inclination
    pub bf: f64,
    /// Bidirectional backscatter weight
    pub sob: f64,
    /// Bidirectional forward-scatter weight
    pub sof: f64,
    pub sdb: f64,
    pub sdf: f64,
    pub dob: f64,
    pub dof: f64,
    pub ddb: f64,
    pub ddf: f64,

    /// Solar projection per leaf orientation, `cds / cos(tts)`
    pub fs: DMatrix<f64>,
    /// View projection per leaf orientation, `cdo / cos(tto)`
    pub fo: DMatrix<f64>,
    pub fsfo: DMatrix<f64>,
    pub absfs: DMatrix<f64>,
    pub absfo: DMatrix<f64>,
    pub absfsfo: DMatrix<f64>,
    /// cos of leaf inclination broadcast over azimuth
    pub cos_ttli: DMatrix<f64>,
    pub cos2_ttli: DMatrix<f64>,

    /// Probability of seeing the sun
    pub ps: Vec<f64>,
    /// Probability of seeing the viewer
    pub po: Vec<f64>,
    /// Joint probability, including the hot-spot correlation
    pub pso: Vec<f64>,
}

impl CanopyOpticals {
    /// Zeroed buffers sized for `can`
    #[must_use]
    pub fn new(can: &CanopyStructure) -> Self {
        let (ni, na) = (can.n_incl(), can.n_azi());
        let zeros = || DMatrix::zeros(ni, na);
        Self {
            ks: 0.0,
            ko: 0.0,
            bf: 0.0,
            sob: 0.0,
            sof: 0.0,
            sdb: 0.0,
            sdf: 0.0,
            dob: 0.0,
            dof: 0.0,
            ddb: 0.0,
            ddf: 0.0,
            fs: zeros(),
            fo: zeros(),
            fsfo: zeros(),
            absfs: zeros(),
            absfo: zeros(),
            absfsfo: zeros(),
            cos_ttli: zeros(),
            cos2_ttli: zeros(),
            ps: vec![0.0; can.n_layer + 1],
            po: vec![0.0; can.n_layer + 1],
            pso: vec![0.0; can.n_layer + 1],
        }
    }

    /// Sunlit fraction at mid-layer, the mean of `ps` at the bounding edges
    #[must_use]
    pub fn sunlit_fraction(&self) -> Vec<f64> {
        self.ps.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }

    /// Leaf-orientation-weighted mean of |fs|, the direct-beam projection
    /// seen by an average sunlit leaf
    #[must_use]
    pub fn mean_absfs(&self, lidf: &[f64]) -> f64 {
        let n_azi = self.absfs.ncols() as f64;
        lidf.iter()
            .enumerate()
            .map(|(i, &f)| f * self.absfs.row(i).sum() / n_azi)
            .sum()
    }
}
