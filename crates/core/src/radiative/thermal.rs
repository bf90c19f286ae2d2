//! Broadband thermal (longwave) emission and exchange
//!
//! Leaves and soil emit by the Stefan-Boltzmann law; emission and the
//! incoming sky longwave are redistributed by the diffuse solver with
//! broadband leaf optics.
//!
//! # Physics Implementation
//!
//! ```text
//! ε        = 1 − τ_dd − ρ_dd = iLAI·(1 − ρ_LW − τ_LW)
//! S_shade  = σ ε T_shade⁴
//! S_sun    = σ ε ⟨T_sun⁴⟩       (lidf- and azimuth-weighted)
//! S⁺ = S⁻  = iLAI·(fSun S_sun + (1 − fSun) S_shade)
//! ```
//!
//! Each layer emits `S⁺` upward and `S⁻` downward. The reported sunlit and
//! shaded balances are the diffuse absorption minus `2 S_sun` and
//! `2 S_shade`.
//!
//! # Scientific References
//!
//! - Verhoef, W. et al. (2007). "Unified optical-thermal four-stream
//!   radiative transfer theory for homogeneous vegetation canopies".
//!   IEEE TGRS, 45(6), 1808-1822

use super::diffusive::diffusive_s;
use crate::canopy::leaf::leaf_for_layer;
use crate::canopy::{
    check_leaf_count, CanopyOpticals, CanopyRads, CanopyStructure, LeafBios, LeafTemperatures,
    SoilOpticals,
};
use crate::config::RtConfig;
use crate::error::{check_len, CanopyError, Result};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Stefan-Boltzmann constant (W/m²K⁴)
pub const STEFAN_BOLTZMANN: f64 = 5.670374419e-8;

/// Thermal emission law
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EmissionModel {
    /// Spectrally integrated `σ ε T⁴`
    #[default]
    StefanBoltzmann,
    /// Spectrally resolved Planck emission (not implemented)
    Planck,
}

/// Broadband diffuse transmittance and reflectance of one layer
fn longwave_layer(leaf: &LeafBios, optics: &CanopyOpticals, i_lai: f64) -> (f64, f64) {
    let sigf = optics.ddf * leaf.rho_lw + optics.ddb * leaf.tau_lw;
    let sigb = optics.ddb * leaf.rho_lw + optics.ddf * leaf.tau_lw;
    (1.0 - (1.0 - sigf) * i_lai, sigb * i_lai)
}

/// Effective emissivity of every layer, `1 − τ_dd − ρ_dd`
///
/// # Errors
/// `LeafCountMismatch` unless there is one leaf or one per layer.
pub fn layer_emissivity(
    leaves: &[LeafBios],
    can: &CanopyStructure,
    optics: &CanopyOpticals,
) -> Result<Vec<f64>> {
    check_leaf_count(leaves, can.n_layer)?;
    let i_lai = can.i_lai();
    Ok((0..can.n_layer)
        .map(|j| {
            let (tau, rho) = longwave_layer(leaf_for_layer(leaves, j), optics, i_lai);
            1.0 - tau - rho
        })
        .collect())
}

/// Run the thermal pipeline and write the longwave balances into `rads`
///
/// `incoming_lw` is the broadband sky longwave (one value, W m⁻²).
///
/// # Errors
/// `LeafCountMismatch`, `UnsupportedEmissionModel` for `Planck`,
/// `ShapeMismatch` for a non-broadband `incoming_lw` or mis-sized
/// temperatures.
pub fn thermal_fluxes(
    leaves: &[LeafBios],
    optics: &CanopyOpticals,
    rads: &mut CanopyRads,
    can: &CanopyStructure,
    soil: &SoilOpticals,
    incoming_lw: &[f64],
    temps: &LeafTemperatures,
    config: &RtConfig,
) -> Result<()> {
    check_leaf_count(leaves, can.n_layer)?;
    if config.emission == EmissionModel::Planck {
        error!("Spectrally resolved Planck emission is not implemented");
        return Err(CanopyError::UnsupportedEmissionModel(config.emission));
    }
    check_len("incoming longwave", 1, incoming_lw.len())?;
    temps.validate(can.n_layer, can.n_incl(), can.n_azi())?;
    check_len("rads layers", can.n_layer, rads.n_layer())?;

    let n = can.n_layer;
    let i_lai = can.i_lai();
    let f_sun = optics.sunlit_fraction();

    let mut tau_dd: DMatrix<f64> = DMatrix::zeros(1, n);
    let mut rho_dd: DMatrix<f64> = DMatrix::zeros(1, n);
    let mut source: DMatrix<f64> = DMatrix::zeros(1, n);
    let mut s_sun = vec![0.0; n];
    let mut s_shade = vec![0.0; n];
    for j in 0..n {
        let (tau, rho) = longwave_layer(leaf_for_layer(leaves, j), optics, i_lai);
        let eps = 1.0 - tau - rho;
        tau_dd[(0, j)] = tau;
        rho_dd[(0, j)] = rho;

        s_shade[j] = STEFAN_BOLTZMANN * eps * temps.t_shade[j].pow4();
        s_sun[j] = STEFAN_BOLTZMANN * eps * temps.t_sun[j].mean_pow4(&can.lidf);
        source[(0, j)] = i_lai * (f_sun[j] * s_sun[j] + (1.0 - f_sun[j]) * s_shade[j]);
    }

    let soil_emission = STEFAN_BOLTZMANN * soil.emissivity_lw() * soil.skin_t.pow4();
    let fluxes = diffusive_s(
        &tau_dd,
        &rho_dd,
        &source,
        &source,
        &DVector::from_element(1, incoming_lw[0]),
        &DVector::from_element(1, soil.rho_lw),
        &DVector::from_element(1, soil_emission),
    )?;

    for j in 0..n {
        let net = fluxes.net_diffuse[(0, j)];
        rads.int_net_lw_sunlit[j] = net - 2.0 * s_sun[j];
        rads.int_net_lw_shade[j] = net - 2.0 * s_shade[j];
    }
    rads.int_net_lw_soil = fluxes.e_down[(0, n)] - fluxes.e_up[(0, n)];
    rads.int_lw_up_top = fluxes.e_up[(0, 0)];

    debug!(
        lw_up_top = rads.int_lw_up_top,
        lw_soil = rads.int_net_lw_soil,
        "Thermal fluxes computed"
    );
    Ok(())
}
