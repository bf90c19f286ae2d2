//! Sun/view/leaf angle bookkeeping and SAIL volume scattering
//!
//! # Scientific References
//!
//! - Verhoef, W. (1998). "Theory of radiative transfer models applied in
//!   optical remote sensing of vegetation canopies". PhD thesis, Wageningen
//! - van der Tol, C. et al. (2009). "An integrated model of soil-canopy
//!   spectral radiances, photosynthesis, fluorescence, temperature and energy
//!   balance". Biogeosciences, 6, 3109-3129

use crate::canopy::CanopyStructure;
use crate::core_types::{Degrees, SolarAngles};
use nalgebra::{DMatrix, DVector};
use std::f64::consts::{FRAC_PI_2, PI};

/// Reusable trigonometric work buffers for one leaf-angle table
///
/// Vectors indexed by leaf inclination have `n_incl` entries, those indexed
/// by leaf azimuth `n_azi`; `cds`/`cdo` are `n_incl × n_azi`.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleContainer {
    /// cos of leaf azimuth relative to the sun
    pub cos_ttlo: DVector<f64>,
    /// cos of leaf azimuth relative to the viewer, refreshed per geometry update
    pub cos_philo: DVector<f64>,
    pub cos_ttli: DVector<f64>,
    pub sin_ttli: DVector<f64>,
    /// Last `[chi_s, chi_o, frho, ftau]` returned by `volscatt`
    pub vol_scatt: [f64; 4],
    pub cs: DVector<f64>,
    pub ss: DVector<f64>,
    pub co: DVector<f64>,
    pub so: DVector<f64>,
    /// Leaf-normal projection on the solar direction
    pub cds: DMatrix<f64>,
    /// Leaf-normal projection on the viewing direction
    pub cdo: DMatrix<f64>,
    unit_azi: DVector<f64>,
}

impl AngleContainer {
    pub fn n_incl(&self) -> usize {
        self.cos_ttli.len()
    }

    pub fn n_azi(&self) -> usize {
        self.cos_ttlo.len()
    }

    /// Point `cos_philo` at the current relative azimuth
    pub fn refresh_view_azimuth(&mut self, lazitab: &[f64], psi: Degrees) {
        for (c, &phi) in self.cos_philo.iter_mut().zip(lazitab) {
            *c = (Degrees::new(phi) - psi).cos();
        }
    }

    /// Recompute `cs, ss, co, so` for the given zeniths and rebuild
    /// `cds = cs·1ᵀ + ss·cos_ttloᵀ` and `cdo = co·1ᵀ + so·cos_philoᵀ` in place
    pub fn project(&mut self, tts: Degrees, tto: Degrees) {
        let (cos_tts, sin_tts) = (tts.cos(), tts.sin());
        let (cos_tto, sin_tto) = (tto.cos(), tto.sin());

        self.cs.copy_from(&self.cos_ttli);
        self.cs *= cos_tts;
        self.ss.copy_from(&self.sin_ttli);
        self.ss *= sin_tts;
        self.co.copy_from(&self.cos_ttli);
        self.co *= cos_tto;
        self.so.copy_from(&self.sin_ttli);
        self.so *= sin_tto;

        self.cds.ger(1.0, &self.cs, &self.unit_azi, 0.0);
        self.cds.ger(1.0, &self.ss, &self.cos_ttlo, 1.0);
        self.cdo.ger(1.0, &self.co, &self.unit_azi, 0.0);
        self.cdo.ger(1.0, &self.so, &self.cos_philo, 1.0);
    }
}

/// Refresh Ω from the zenith-dependent clumping model
///
/// With `clump_b == 0` Ω is a user override and is left untouched.
pub fn clumping_factor(can: &mut CanopyStructure, angles: &SolarAngles) {
    if can.clump_b > 0.0 {
        can.omega = can.clump_a + can.clump_b * (1.0 - angles.tts.cos());
    }
}

/// Build the angle container for the canopy's leaf-angle tables
pub fn create_angle_container(can: &CanopyStructure, angles: &SolarAngles) -> AngleContainer {
    let (n_incl, n_azi) = (can.n_incl(), can.n_azi());
    let cos_ttlo =
        DVector::from_iterator(n_azi, can.lazitab.iter().map(|&a| Degrees::new(a).cos()));
    let cos_ttli = DVector::from_iterator(n_incl, can.litab.iter().map(|&t| Degrees::new(t).cos()));
    let sin_ttli = DVector::from_iterator(n_incl, can.litab.iter().map(|&t| Degrees::new(t).sin()));

    let mut container = AngleContainer {
        cos_ttlo,
        cos_philo: DVector::zeros(n_azi),
        cos_ttli,
        sin_ttli,
        vol_scatt: [0.0; 4],
        cs: DVector::zeros(n_incl),
        ss: DVector::zeros(n_incl),
        co: DVector::zeros(n_incl),
        so: DVector::zeros(n_incl),
        cds: DMatrix::zeros(n_incl, n_azi),
        cdo: DMatrix::zeros(n_incl, n_azi),
        unit_azi: DVector::from_element(n_azi, 1.0),
    };
    container.refresh_view_azimuth(&can.lazitab, angles.psi);
    container
}

/// SAIL volume scattering functions for one leaf inclination
///
/// All angles in degrees; `psi` must already be wrapped into [0, 180].
/// Returns `[chi_s, chi_o, frho, ftau]`. `frho` and `ftau` keep their sign.
#[must_use]
pub fn volscatt(tts: f64, tto: f64, psi: f64, ttl: f64) -> [f64; 4] {
    let psi_rad = psi.to_radians();
    let cos_psi = psi_rad.cos();

    let (sin_ttl, cos_ttl) = ttl.to_radians().sin_cos();
    let (sin_tts, cos_tts) = tts.to_radians().sin_cos();
    let (sin_tto, cos_tto) = tto.to_radians().sin_cos();

    let cs = cos_ttl * cos_tts;
    let ss = sin_ttl * sin_tts;
    let co = cos_ttl * cos_tto;
    let so = sin_ttl * sin_tto;

    let a_s = ss.max(cs);
    let a_o = so.max(co);

    // Transition angles where the leaf switches from lit to shaded side
    let bts = (-cs / a_s).clamp(-1.0, 1.0).acos();
    let bto = (-co / a_o).clamp(-1.0, 1.0).acos();

    let chi_o = 2.0 / PI * ((bto - FRAC_PI_2) * co + bto.sin() * so);
    let chi_s = 2.0 / PI * ((bts - FRAC_PI_2) * cs + bts.sin() * ss);

    let delta1 = (bts - bto).abs();
    let delta2 = PI - (bts + bto - PI).abs();

    let total = psi_rad + delta1 + delta2;
    let bt1 = psi_rad.min(delta1);
    let bt3 = psi_rad.max(delta2);
    let bt2 = total - bt1 - bt3;

    let t1 = 2.0 * cs * co + ss * so * cos_psi;
    let t2 = bt2.sin() * (2.0 * a_s * a_o + ss * so * bt1.cos() * bt3.cos());

    let j_min = bt2 * t1 - t2;
    let j_plus = (PI - bt2) * t1 + t2;

    let frho = j_plus / (2.0 * PI * PI);
    let ftau = -j_min / (2.0 * PI * PI);

    [chi_s, chi_o, frho, ftau]
}
