//! Two-stream diffuse transport through a stack of thin layers (adding method)
//!
//! One kernel serves shortwave, fluorescence and thermal radiation. Each
//! wavelength is an independent recursion: the layers are swept bottom-up
//! to build the effective reflectance `R` and upward source `U` seen from
//! each edge, then top-down to recover the edge fluxes.
//!
//! ```text
//! R[n] = r_s                         U[n] = e_s
//! X_j  = τ_j / (1 − ρ_j R_{j+1})     Y_j  = (ρ_j U_{j+1} + S⁻_j) / (1 − ρ_j R_{j+1})
//! R_j  = ρ_j + τ_j R_{j+1} X_j       U_j  = τ_j (R_{j+1} Y_j + U_{j+1}) + S⁺_j
//!
//! E⁻[0] = top     E⁺[j] = R_j E⁻[j] + U_j     E⁻[j+1] = X_j E⁻[j] + Y_j
//! ```
//!
//! Net absorption per layer is `(E⁻[j] + E⁺[j+1])·(1 − τ_j − ρ_j)`, which
//! closes the energy budget exactly when the sources are zero.

use crate::error::{check_len, CanopyError, Result};
use nalgebra::{DMatrix, DVector};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Solution of `diffusive_s`
#[derive(Debug, Clone, PartialEq)]
pub struct DiffusiveFluxes {
    /// Downward flux at layer edges (nwl × n+1)
    pub e_down: DMatrix<f64>,
    /// Upward flux at layer edges (nwl × n+1)
    pub e_up: DMatrix<f64>,
    /// Flux absorbed by each layer (nwl × n)
    pub net_diffuse: DMatrix<f64>,
    /// Effective reflectance of canopy plus soil seen from the top
    pub r_top: DVector<f64>,
    /// Upward flux leaving the top due to internal sources alone
    pub u_top: DVector<f64>,
}

/// One wavelength's recursion result
struct Column {
    e_down: Vec<f64>,
    e_up: Vec<f64>,
    net: Vec<f64>,
    r_top: f64,
    u_top: f64,
}

/// Layer properties of a single wavelength
struct Stack<'a> {
    tau: &'a [f64],
    rho: &'a [f64],
    s_down: &'a [f64],
    s_up: &'a [f64],
}

fn solve_column(stack: &Stack<'_>, top: f64, r_soil: f64, e_soil: f64) -> Column {
    let n = stack.tau.len();
    let mut r = vec![0.0; n + 1];
    let mut u = vec![0.0; n + 1];
    let mut x = vec![0.0; n];
    let mut y = vec![0.0; n];

    r[n] = r_soil;
    u[n] = e_soil;
    for j in (0..n).rev() {
        let (tau, rho) = (stack.tau[j], stack.rho[j]);
        let dnorm = 1.0 - rho * r[j + 1];
        x[j] = tau / dnorm;
        y[j] = (rho * u[j + 1] + stack.s_down[j]) / dnorm;
        r[j] = rho + tau * r[j + 1] * x[j];
        u[j] = tau * (r[j + 1] * y[j] + u[j + 1]) + stack.s_up[j];
    }

    let mut e_down = vec![0.0; n + 1];
    let mut e_up = vec![0.0; n + 1];
    e_down[0] = top;
    for j in 0..n {
        e_up[j] = r[j] * e_down[j] + u[j];
        e_down[j + 1] = x[j] * e_down[j] + y[j];
    }
    e_up[n] = r[n] * e_down[n] + u[n];

    let net = (0..n)
        .map(|j| (e_down[j] + e_up[j + 1]) * (1.0 - stack.tau[j] - stack.rho[j]))
        .collect();

    Column {
        e_down,
        e_up,
        net,
        r_top: r[0],
        u_top: u[0],
    }
}

/// Solve the two-stream equations for every wavelength
///
/// Matrices are (nwl × `n_layer`) with the top layer in column 0; vectors have
/// one entry per wavelength.
///
/// # Errors
/// `ShapeMismatch` when the inputs disagree in size, `InvalidParameter` if a
/// layer has ρ·R ≥ 1 (no physical solution).
pub fn diffusive_s(
    tau_dd: &DMatrix<f64>,
    rho_dd: &DMatrix<f64>,
    s_down: &DMatrix<f64>,
    s_up: &DMatrix<f64>,
    top: &DVector<f64>,
    soil_reflectance: &DVector<f64>,
    soil_emission: &DVector<f64>,
) -> Result<DiffusiveFluxes> {
    let (nwl, n) = tau_dd.shape();
    check_len("rho_dd wavelengths", nwl, rho_dd.nrows())?;
    check_len("rho_dd layers", n, rho_dd.ncols())?;
    check_len("s_down wavelengths", nwl, s_down.nrows())?;
    check_len("s_down layers", n, s_down.ncols())?;
    check_len("s_up wavelengths", nwl, s_up.nrows())?;
    check_len("s_up layers", n, s_up.ncols())?;
    check_len("top boundary", nwl, top.len())?;
    check_len("soil reflectance", nwl, soil_reflectance.len())?;
    check_len("soil emission", nwl, soil_emission.len())?;
    if n == 0 {
        return Err(CanopyError::InvalidLayerCount(0));
    }
    if let Some(&rho) = rho_dd.iter().find(|&&rho| !(0.0..1.0).contains(&rho)) {
        return Err(CanopyError::InvalidParameter {
            name: "rho_dd",
            value: rho,
            reason: "layer diffuse reflectance must lie in [0, 1)",
        });
    }

    // Row-major copies so each wavelength's layers are contiguous
    let rows = |m: &DMatrix<f64>| m.transpose();
    let (tau_t, rho_t, sd_t, su_t) = (rows(tau_dd), rows(rho_dd), rows(s_down), rows(s_up));
    let solve = |i: usize| {
        let span = i * n..(i + 1) * n;
        let stack = Stack {
            tau: &tau_t.as_slice()[span.clone()],
            rho: &rho_t.as_slice()[span.clone()],
            s_down: &sd_t.as_slice()[span.clone()],
            s_up: &su_t.as_slice()[span],
        };
        solve_column(&stack, top[i], soil_reflectance[i], soil_emission[i])
    };

    #[cfg(feature = "parallel")]
    let columns: Vec<Column> = (0..nwl).into_par_iter().map(solve).collect();
    #[cfg(not(feature = "parallel"))]
    let columns: Vec<Column> = (0..nwl).map(solve).collect();

    let mut out = DiffusiveFluxes {
        e_down: DMatrix::zeros(nwl, n + 1),
        e_up: DMatrix::zeros(nwl, n + 1),
        net_diffuse: DMatrix::zeros(nwl, n),
        r_top: DVector::zeros(nwl),
        u_top: DVector::zeros(nwl),
    };
    for (i, col) in columns.into_iter().enumerate() {
        for j in 0..=n {
            out.e_down[(i, j)] = col.e_down[j];
            out.e_up[(i, j)] = col.e_up[j];
        }
        for j in 0..n {
            out.net_diffuse[(i, j)] = col.net[j];
        }
        out.r_top[i] = col.r_top;
        out.u_top[i] = col.u_top;
    }
    Ok(out)
}
