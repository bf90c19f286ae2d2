//! Solar-induced chlorophyll fluorescence (SIF) emission and reabsorption
//!
//! Leaves convert absorbed excitation-band radiation (400-750 nm) into
//! fluorescence (640-850 nm) through the backward and forward matrices
//! `Mb`, `Mf`. Emission is distributed with the same SAIL coefficients that
//! distribute reflectance (ρ → Mb, τ → Mf), reabsorbed and scattered by the
//! canopy through the diffuse solver, and observed in the viewing direction.
//!
//! Requires the shortwave fluxes of the same step in `CanopyRads`.

use super::diffusive::diffusive_s;
use super::matrices::canopy_matrices;
use crate::canopy::leaf::leaf_for_layer;
use crate::canopy::{CanopyOpticals, CanopyRads, CanopyStructure, LeafBios, SoilOpticals};
use crate::core_types::wavelengths::select;
use crate::core_types::WaveLengths;
use crate::error::{check_len, Result};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Excitation-band rows of column `j` of `m`
fn excitation(m: &DMatrix<f64>, iwle: &[usize], j: usize) -> DVector<f64> {
    DVector::from_iterator(iwle.len(), iwle.iter().map(|&i| m[(i, j)]))
}

/// Fluorescence-band rows of `m`
fn fluorescence_rows(m: &DMatrix<f64>, iwlf: &[usize]) -> DMatrix<f64> {
    m.select_rows(iwlf)
}

/// Emitted fluorescence of one layer, split by excitation source
struct LayerEmission {
    mb_sun: DVector<f64>,
    mf_sun: DVector<f64>,
    mb_down: DVector<f64>,
    mf_down: DVector<f64>,
    mb_up: DVector<f64>,
    mf_up: DVector<f64>,
}

/// Run the fluorescence pipeline and write the SIF spectra into `rads`
///
/// # Errors
/// Leaf count, leaf or soil validation errors, or `ShapeMismatch` when
/// `rads` does not match the wavelength grid.
pub fn sif_fluxes(
    leaves: &[LeafBios],
    can: &CanopyStructure,
    optics: &CanopyOpticals,
    soil: &SoilOpticals,
    wl: &WaveLengths,
    rads: &mut CanopyRads,
) -> Result<()> {
    for leaf in leaves {
        leaf.validate(wl)?;
    }
    soil.validate(wl)?;
    check_len("rads wavelengths", wl.len(), rads.e_down.nrows())?;
    check_len("rads layers", can.n_layer, rads.n_layer())?;
    check_len("rads fluorescence bins", wl.iwlf.len(), rads.sif_obs.len())?;

    let lo = canopy_matrices(leaves, can, optics)?;
    let n = can.n_layer;
    let n_wlf = wl.iwlf.len();
    let i_lai = can.i_lai();
    let o = optics;

    let e_sun = select(&rads.e_sun, &wl.iwle);

    // Layer-mean excitation fluxes through each leaf's matrices
    let emission: Vec<LayerEmission> = (0..n)
        .map(|j| {
            let leaf = leaf_for_layer(leaves, j);
            let mb = &leaf.mb * leaf.fqe;
            let mf = &leaf.mf * leaf.fqe;
            let down = (excitation(&rads.e_down, &wl.iwle, j)
                + excitation(&rads.e_down, &wl.iwle, j + 1))
                * 0.5;
            let up = (excitation(&rads.e_up, &wl.iwle, j)
                + excitation(&rads.e_up, &wl.iwle, j + 1))
                * 0.5;
            LayerEmission {
                mb_sun: &mb * &e_sun,
                mf_sun: &mf * &e_sun,
                mb_down: &mb * &down,
                mf_down: &mf * &down,
                mb_up: &mb * &up,
                mf_up: &mf * &up,
            }
        })
        .collect();

    let mut f_down: DMatrix<f64> = DMatrix::zeros(n_wlf, n);
    let mut f_up: DMatrix<f64> = DMatrix::zeros(n_wlf, n);
    let mut sunlit: DVector<f64> = DVector::zeros(n_wlf);
    let mut shaded: DVector<f64> = DVector::zeros(n_wlf);
    for (j, e) in emission.iter().enumerate() {
        let ps = o.ps[j];
        let down = (&e.mb_sun * o.sdf + &e.mf_sun * o.sdb) * ps
            + &e.mb_down * o.ddf
            + &e.mf_down * o.ddb
            + &e.mb_up * o.ddb
            + &e.mf_up * o.ddf;
        let up = (&e.mb_sun * o.sdb + &e.mf_sun * o.sdf) * ps
            + &e.mb_down * o.ddb
            + &e.mf_down * o.ddf
            + &e.mb_up * o.ddf
            + &e.mf_up * o.ddb;
        f_down.set_column(j, &(down * i_lai));
        f_up.set_column(j, &(up * i_lai));

        sunlit += (&e.mb_sun * o.sob + &e.mf_sun * o.sof) * o.pso[j];
        shaded += (&e.mb_down * o.dob + &e.mf_down * o.dof + &e.mb_up * o.dof + &e.mf_up * o.dob)
            * o.po[j];
    }
    sunlit *= i_lai;
    shaded *= i_lai;

    // Reabsorption and scattering of the emitted fluorescence
    let rs = select(&soil.rho_sw, &wl.iwlf);
    let fl = diffusive_s(
        &fluorescence_rows(&lo.tau_dd, &wl.iwlf),
        &fluorescence_rows(&lo.rho_dd, &wl.iwlf),
        &f_down,
        &f_up,
        &DVector::zeros(n_wlf),
        &rs,
        &DVector::zeros(n_wlf),
    )?;

    let vb = fluorescence_rows(&lo.vb, &wl.iwlf);
    let vf = fluorescence_rows(&lo.vf, &wl.iwlf);
    let mut scattered: DVector<f64> = DVector::zeros(n_wlf);
    for j in 0..n {
        for i in 0..n_wlf {
            let down = 0.5 * (fl.e_down[(i, j)] + fl.e_down[(i, j + 1)]);
            let up = 0.5 * (fl.e_up[(i, j)] + fl.e_up[(i, j + 1)]);
            scattered[i] += o.po[j] * (vb[(i, j)] * down + vf[(i, j)] * up);
        }
    }
    scattered *= i_lai;

    let soil_term = DVector::from_iterator(
        n_wlf,
        (0..n_wlf).map(|i| rs[i] * o.po[n] * fl.e_down[(i, n)]),
    );

    rads.sif_obs = &sunlit + &shaded + &scattered + &soil_term;
    rads.sif_obs_sunlit = sunlit;
    rads.sif_obs_shaded = shaded;
    rads.sif_obs_scattered = scattered;
    rads.sif_obs_soil = soil_term;
    rads.sif_hemi = fl.e_up.column(0).into_owned();

    debug!(
        sif_obs = wl.integrate_fluorescence(&rads.sif_obs),
        sif_hemi = wl.integrate_fluorescence(&rads.sif_hemi),
        "Fluorescence fluxes computed"
    );
    Ok(())
}
