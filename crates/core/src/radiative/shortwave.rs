//! Solar shortwave fluxes, absorption and reflectance
//!
//! The attenuated direct beam feeds the diffuse streams through the
//! direct-to-diffuse scattering terms; the diffuse solution then gives
//! absorption per layer and the canopy reflectance factors.

use super::diffusive::diffusive_s;
use super::matrices::canopy_matrices;
use crate::canopy::{
    CanopyOpticals, CanopyRads, CanopyStructure, IncomingRadiation, LeafBios, SoilOpticals,
};
use crate::core_types::WaveLengths;
use crate::error::{check_len, Result};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// `num / den`, zero where there is no illumination
#[inline]
pub(crate) fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// Run the shortwave pipeline and write its outputs into `rads`
///
/// Fills `e_sun`, `e_direct`, `e_down`, `e_up`, the sunlit/shaded/soil net
/// fluxes and their integrals, and the four reflectance spectra.
///
/// # Errors
/// Leaf, soil or forcing validation errors, or `ShapeMismatch` when `rads`
/// was sized for another grid.
pub fn short_wave(
    leaves: &[LeafBios],
    can: &CanopyStructure,
    optics: &CanopyOpticals,
    soil: &SoilOpticals,
    incoming: &IncomingRadiation,
    wl: &WaveLengths,
    rads: &mut CanopyRads,
) -> Result<()> {
    for leaf in leaves {
        leaf.validate(wl)?;
    }
    soil.validate(wl)?;
    incoming.validate(wl)?;
    check_len("rads wavelengths", wl.len(), rads.e_down.nrows())?;
    check_len("rads layers", can.n_layer, rads.n_layer())?;

    let lo = canopy_matrices(leaves, can, optics)?;
    let (nwl, n) = (wl.len(), can.n_layer);
    let i_lai = can.i_lai();
    let e_dir = &incoming.e_direct;
    let e_dif = &incoming.e_diffuse;
    let rs = &soil.rho_sw;

    // Direct beam at every layer edge
    let mut es: DMatrix<f64> = DMatrix::zeros(nwl, n + 1);
    let mut attenuation = 1.0;
    for j in 0..=n {
        es.set_column(j, &(e_dir * attenuation));
        attenuation *= lo.tau_ss;
    }

    let mut s_down: DMatrix<f64> = DMatrix::zeros(nwl, n);
    let mut s_up: DMatrix<f64> = DMatrix::zeros(nwl, n);
    for j in 0..n {
        for i in 0..nwl {
            s_down[(i, j)] = lo.tau_sd[(i, j)] * es[(i, j)];
            s_up[(i, j)] = lo.rho_sd[(i, j)] * es[(i, j)];
        }
    }
    let soil_emission = rs.component_mul(&es.column(n));

    let fluxes = diffusive_s(&lo.tau_dd, &lo.rho_dd, &s_down, &s_up, e_dif, rs, &soil_emission)?;
    let (e_down, e_up) = (&fluxes.e_down, &fluxes.e_up);

    // Mean direct-beam projection on an average leaf
    let k_mean = optics.mean_absfs(&can.lidf);

    let mut alb_obs: DVector<f64> = DVector::zeros(nwl);
    for i in 0..nwl {
        let mut pi_l = 0.0;
        for j in 0..n {
            let down = 0.5 * (e_down[(i, j)] + e_down[(i, j + 1)]);
            let up = 0.5 * (e_up[(i, j)] + e_up[(i, j + 1)]);
            pi_l += optics.po[j] * (lo.vb[(i, j)] * down + lo.vf[(i, j)] * up)
                + optics.pso[j] * lo.w[(i, j)] * e_dir[i];
        }
        pi_l *= i_lai;
        pi_l += rs[i] * (optics.po[n] * e_down[(i, n)] + optics.pso[n] * e_dir[i]);
        alb_obs[i] = ratio(pi_l, e_dir[i] + e_dif[i]);
    }

    rads.e_sun.copy_from(e_dir);
    rads.e_direct.copy_from(&es);
    rads.e_down.copy_from(e_down);
    rads.e_up.copy_from(e_up);
    rads.alb_obs = alb_obs;
    rads.alb_diffuse.copy_from(&fluxes.r_top);
    for i in 0..nwl {
        rads.alb_direct[i] = ratio(fluxes.u_top[i], e_dir[i]);
        rads.alb_hemi[i] = ratio(e_up[(i, 0)], e_dir[i] + e_dif[i]);
    }

    rads.net_sw_shade.copy_from(&fluxes.net_diffuse);
    for j in 0..n {
        for i in 0..nwl {
            rads.net_sw_sunlit[(i, j)] =
                fluxes.net_diffuse[(i, j)] + i_lai * lo.leaf_abs[(i, j)] * e_dir[i] * k_mean;
        }
        rads.int_net_sw_shade[j] = wl.integrate(&rads.net_sw_shade.column(j).into_owned());
        rads.int_net_sw_sunlit[j] = wl.integrate(&rads.net_sw_sunlit.column(j).into_owned());
    }

    for i in 0..nwl {
        rads.net_sw_soil[i] = (1.0 - rs[i]) * (e_down[(i, n)] + es[(i, n)]);
    }
    rads.int_net_sw_soil = wl.integrate(&rads.net_sw_soil);

    debug!(
        tau_ss = lo.tau_ss,
        k_mean,
        int_net_sw_soil = rads.int_net_sw_soil,
        "Shortwave fluxes computed"
    );
    Ok(())
}
