//! Per-layer, per-wavelength optical properties of thin canopy layers
//!
//! Leaf reflectance ρ and transmittance τ are distributed over the SAIL
//! directions with the geometry coefficients. Each output matrix is
//! (nwl × `n_layer`), top layer in column 0.

use crate::canopy::leaf::leaf_for_layer;
use crate::canopy::{check_leaf_count, CanopyOpticals, CanopyStructure, LeafBios};
use crate::error::{check_len, Result};
use nalgebra::DMatrix;

/// Scattering coefficients and thin-layer transfer terms
#[derive(Debug, Clone, PartialEq)]
pub struct LayerOptics {
    /// Diffuse backscatter `ddb ρ + ddf τ`
    pub sigb: DMatrix<f64>,
    /// Diffuse forward scatter `ddf ρ + ddb τ`
    pub sigf: DMatrix<f64>,
    /// Direct to diffuse backscatter `sdb ρ + sdf τ`
    pub sb: DMatrix<f64>,
    /// Direct to diffuse forward scatter `sdf ρ + sdb τ`
    pub sf: DMatrix<f64>,
    /// Downward diffuse flux scattered to the viewer `dob ρ + dof τ`
    pub vb: DMatrix<f64>,
    /// Upward diffuse flux scattered to the viewer `dof ρ + dob τ`
    pub vf: DMatrix<f64>,
    /// Bidirectional scattering `sob ρ + sof τ`
    pub w: DMatrix<f64>,
    pub tau_dd: DMatrix<f64>,
    pub rho_dd: DMatrix<f64>,
    pub tau_sd: DMatrix<f64>,
    pub rho_sd: DMatrix<f64>,
    /// Leaf absorptance `1 − ρ − τ`
    pub leaf_abs: DMatrix<f64>,
    /// Direct beam transmittance of one layer
    pub tau_ss: f64,
}

/// Build the layer optics for the current geometry
///
/// # Errors
/// `LeafCountMismatch` unless there is one leaf or one per layer, and
/// `ShapeMismatch` when the leaves disagree in spectral length.
pub fn canopy_matrices(
    leaves: &[LeafBios],
    can: &CanopyStructure,
    optics: &CanopyOpticals,
) -> Result<LayerOptics> {
    check_leaf_count(leaves, can.n_layer)?;
    let nwl = leaves[0].rho_sw.len();
    for leaf in leaves {
        check_len("leaf rho_sw", nwl, leaf.rho_sw.len())?;
        check_len("leaf tau_sw", nwl, leaf.tau_sw.len())?;
    }

    let n = can.n_layer;
    let i_lai = can.i_lai();
    let zeros = || DMatrix::zeros(nwl, n);
    let mut lo = LayerOptics {
        sigb: zeros(),
        sigf: zeros(),
        sb: zeros(),
        sf: zeros(),
        vb: zeros(),
        vf: zeros(),
        w: zeros(),
        tau_dd: zeros(),
        rho_dd: zeros(),
        tau_sd: zeros(),
        rho_sd: zeros(),
        leaf_abs: zeros(),
        tau_ss: (-optics.ks * i_lai).exp(),
    };

    let o = optics;
    for j in 0..n {
        let leaf = leaf_for_layer(leaves, j);
        for i in 0..nwl {
            let (rho, tau) = (leaf.rho_sw[i], leaf.tau_sw[i]);
            let sigb = o.ddb * rho + o.ddf * tau;
            let sigf = o.ddf * rho + o.ddb * tau;
            let sb = o.sdb * rho + o.sdf * tau;
            let sf = o.sdf * rho + o.sdb * tau;

            lo.sigb[(i, j)] = sigb;
            lo.sigf[(i, j)] = sigf;
            lo.sb[(i, j)] = sb;
            lo.sf[(i, j)] = sf;
            lo.vb[(i, j)] = o.dob * rho + o.dof * tau;
            lo.vf[(i, j)] = o.dof * rho + o.dob * tau;
            lo.w[(i, j)] = o.sob * rho + o.sof * tau;
            lo.tau_dd[(i, j)] = 1.0 - (1.0 - sigf) * i_lai;
            lo.rho_dd[(i, j)] = sigb * i_lai;
            lo.tau_sd[(i, j)] = sf * i_lai;
            lo.rho_sd[(i, j)] = sb * i_lai;
            lo.leaf_abs[(i, j)] = 1.0 - rho - tau;
        }
    }
    Ok(lo)
}
