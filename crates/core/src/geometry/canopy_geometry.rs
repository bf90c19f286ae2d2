//! Extinction, scattering and gap-fraction profiles for one sun/view geometry
//!
//! `canopy_geometry` runs once per geometry update and overwrites the
//! `CanopyOpticals` buffers in place. It is the only producer of `Ps`, `Po`
//! and `Pso`; the flux pipelines only read them.

use super::angles::{clumping_factor, volscatt, AngleContainer};
use super::quadrature::quadgk;
use crate::canopy::{CanopyOpticals, CanopyStructure};
use crate::config::{PsoClamp, RtConfig};
use crate::core_types::SolarAngles;
use crate::error::{check_len, Result};
use std::f64::consts::PI;
use tracing::{debug, warn};

/// Below this optical depth the layer-average factor uses its Taylor limit
const THIN_LAYER_DEPTH: f64 = 1e-9;

/// Tolerance for reporting `Pso > min(Ps, Po)`
const PSO_EXCESS_TOLERANCE: f64 = 1e-6;

/// Layer-average of `exp(k·x)` relative to its value at the top of a layer
/// of optical depth `z`: `(1 − e^{−z}) / z`
#[inline]
pub fn finite_layer_factor(z: f64) -> f64 {
    if z < THIN_LAYER_DEPTH {
        1.0 - 0.5 * z
    } else {
        -(-z).exp_m1() / z
    }
}

/// Joint probability of seeing sun and viewer at normalised depth `x` ≤ 0
///
/// `big_k` and `k` are the view and solar extinction coefficients, `q` the
/// hot-spot parameter and `dso` the sun-view directional distance.
#[must_use]
pub fn psofunction(big_k: f64, k: f64, omega: f64, lai: f64, q: f64, dso: f64, x: f64) -> f64 {
    let depth = omega * lai;
    if dso == 0.0 {
        ((big_k + k) * depth * x - (big_k * k).sqrt() * depth * x).exp()
    } else if q == 0.0 {
        ((big_k + k) * depth * x).exp()
    } else {
        let alf = (dso / q) * 2.0 / (k + big_k);
        ((big_k + k) * depth * x - (big_k * k).sqrt() * depth / alf * (x * alf).exp_m1()).exp()
    }
}

/// Bidirectional backward and forward scattering `(sob, sof)` of one
/// inclination bin, given `kk = ksli·koli`
///
/// A negative `ftau` swaps the roles of `frho` and `ftau`.
#[inline]
fn bidirectional_scattering(kk: f64, frho: f64, ftau: f64) -> (f64, f64) {
    if kk == 0.0 {
        (0.0, 0.0)
    } else if ftau < 0.0 {
        (ftau.abs() * PI / kk, frho.abs() * PI / kk)
    } else {
        (frho * PI / kk, ftau * PI / kk)
    }
}

/// Sun-view directional distance driving the hot-spot correlation
#[must_use]
pub fn hot_spot_distance(angles: &SolarAngles) -> f64 {
    let tan_s = angles.tts.tan();
    let tan_o = angles.tto.tan();
    (tan_s * tan_s + tan_o * tan_o - 2.0 * tan_s * tan_o * angles.psi.cos())
        .max(0.0)
        .sqrt()
}

/// Layer-averaged gap probability for extinction `k`: `n_layer` layer means
/// followed by the value at the soil surface
fn gap_profile(out: &mut [f64], k: f64, can: &CanopyStructure) {
    let depth = k * can.omega * can.lai;
    let factor = finite_layer_factor(depth * can.dx);
    let n = can.n_layer;
    for (j, p) in out.iter_mut().enumerate() {
        let base = (depth * can.xl_e[j]).exp();
        *p = if j < n { base * factor } else { base };
    }
}

/// Update every geometry-dependent buffer for the current angles
///
/// Steps: clumping, hot-spot distance, view azimuth refresh, per-bin
/// volume scattering accumulated over `lidf`, paired coefficients, leaf
/// projection matrices, `Ps`/`Po`, and the `Pso` integral per layer.
///
/// # Errors
/// `InvalidAngle` for zeniths outside [0, 90), any structure validation
/// error, or `ShapeMismatch` when the buffers were sized for another canopy.
pub fn canopy_geometry(
    can: &mut CanopyStructure,
    angles: &SolarAngles,
    optics: &mut CanopyOpticals,
    container: &mut AngleContainer,
    config: &RtConfig,
) -> Result<()> {
    angles.validate()?;
    can.validate()?;
    check_len("angle container inclination bins", can.n_incl(), container.n_incl())?;
    check_len("angle container azimuth bins", can.n_azi(), container.n_azi())?;
    check_len("optics inclination bins", can.n_incl(), optics.fs.nrows())?;
    check_len("optics azimuth bins", can.n_azi(), optics.fs.ncols())?;
    check_len("gap fraction profile", can.n_layer + 1, optics.ps.len())?;

    clumping_factor(can, angles);
    can.validate()?;

    let cos_tts = angles.tts.cos();
    let cos_tto = angles.tto.cos();
    let psi_vol = angles.psi_vol();
    let dso = hot_spot_distance(angles);

    container.refresh_view_azimuth(&can.lazitab, angles.psi);

    let (mut ks, mut ko, mut bf, mut sob, mut sof) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (&ttl, &weight) in can.litab.iter().zip(&can.lidf) {
        let [chi_s, chi_o, frho, ftau] = volscatt(*angles.tts, *angles.tto, psi_vol, ttl);
        container.vol_scatt = [chi_s, chi_o, frho, ftau];

        let ksli = (chi_s / cos_tts).abs();
        let koli = (chi_o / cos_tto).abs();
        let (sobli, sofli) = bidirectional_scattering(ksli * koli, frho, ftau);
        let bfli = ttl.to_radians().cos().powi(2);

        ks += ksli * weight;
        ko += koli * weight;
        bf += bfli * weight;
        sob += sobli * weight;
        sof += sofli * weight;
    }

    optics.ks = ks;
    optics.ko = ko;
    optics.bf = bf;
    optics.sob = sob;
    optics.sof = sof;
    optics.sdb = 0.5 * (ks + bf);
    optics.sdf = 0.5 * (ks - bf);
    optics.dob = 0.5 * (ko + bf);
    optics.dof = 0.5 * (ko - bf);
    optics.ddb = 0.5 * (1.0 + bf);
    optics.ddf = 0.5 * (1.0 - bf);

    container.project(angles.tts, angles.tto);

    optics.fs.copy_from(&container.cds);
    optics.fs /= cos_tts;
    optics.fo.copy_from(&container.cdo);
    optics.fo /= cos_tto;
    optics.fsfo.copy_from(&optics.fs);
    optics.fsfo.component_mul_assign(&optics.fo);
    optics.absfs.copy_from(&optics.fs);
    optics.absfs.apply(|v| *v = v.abs());
    optics.absfo.copy_from(&optics.fo);
    optics.absfo.apply(|v| *v = v.abs());
    optics.absfsfo.copy_from(&optics.fsfo);
    optics.absfsfo.apply(|v| *v = v.abs());
    for (i, &c) in container.cos_ttli.iter().enumerate() {
        optics.cos_ttli.row_mut(i).fill(c);
        optics.cos2_ttli.row_mut(i).fill(c * c);
    }

    gap_profile(&mut optics.ps, ks, can);
    gap_profile(&mut optics.po, ko, can);

    let (omega, lai, hot) = (can.omega, can.lai, can.hot);
    let pso_at = |x: f64| psofunction(ko, ks, omega, lai, hot, dso, x);
    let n = can.n_layer;
    for j in 0..n {
        let top = can.xl[j];
        let est = quadgk(pso_at, top - can.dx, top, &config.quadrature);
        optics.pso[j] = est.value / can.dx;
    }
    optics.pso[n] = pso_at(-1.0);

    match config.pso_clamp {
        PsoClamp::MinOfPsPo => {
            for j in 0..=n {
                optics.pso[j] = optics.pso[j].min(optics.ps[j]).min(optics.po[j]);
            }
        }
        PsoClamp::Disabled => {
            let excess = (0..=n)
                .filter(|&j| optics.pso[j] > optics.ps[j].min(optics.po[j]) + PSO_EXCESS_TOLERANCE)
                .count();
            if excess > 0 {
                warn!(
                    layers = excess,
                    "Pso exceeds min(Ps, Po); enable PsoClamp::MinOfPsPo to bound it"
                );
            }
        }
    }

    debug!(
        ks = optics.ks,
        ko = optics.ko,
        omega = can.omega,
        dso,
        "Canopy geometry updated"
    );
    Ok(())
}
