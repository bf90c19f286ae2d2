//! Canopy structure: leaf area, layering, leaf orientation and clumping
//!
//! The canopy is a turbid medium of `n_layer` equal slabs. Depth is
//! normalised to [0, -1] from the top of the canopy to the soil.
//!
//! # Scientific References
//!
//! - Verhoef, W. (1984). "Light scattering by leaf layers with application to
//!   canopy reflectance modeling: the SAIL model". Remote Sensing of
//!   Environment, 16(2), 125-141
//! - Verhoef, W. (1998). "Theory of radiative transfer models applied in
//!   optical remote sensing of vegetation canopies". PhD thesis, Wageningen

use crate::error::{check_len, CanopyError, Result};
use serde::{Deserialize, Serialize};

/// Leaf inclination bin centres (degrees): 10° bins to 80°, 2° bins above
pub const DEFAULT_LITAB: [f64; 13] = [
    5.0, 15.0, 25.0, 35.0, 45.0, 55.0, 65.0, 75.0, 81.0, 83.0, 85.0, 87.0, 89.0,
];

/// Upper edges of the `DEFAULT_LITAB` bins
const LITAB_EDGES: [f64; 13] = [
    10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 82.0, 84.0, 86.0, 88.0, 90.0,
];

/// Allowed drift of `dx`, `xl` and `xl_e` from the uniform layering
const LAYERING_TOLERANCE: f64 = 1e-12;

/// Structural description of a layered canopy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanopyStructure {
    /// Leaf area index (m² m⁻²)
    pub lai: f64,
    /// Number of layers
    pub n_layer: usize,
    /// Normalised layer thickness, `1 / n_layer`
    pub dx: f64,
    /// Leaf inclination distribution, probability mass per `litab` bin
    pub lidf: Vec<f64>,
    /// Leaf inclination bin centres (degrees)
    pub litab: Vec<f64>,
    /// Leaf azimuth bin centres (degrees)
    pub lazitab: Vec<f64>,
    /// Hot-spot parameter (leaf size / canopy height)
    pub hot: f64,
    pub clump_a: f64,
    /// Zenith dependence of clumping; 0 keeps `omega` as a fixed override
    pub clump_b: f64,
    /// Clumping index Ω, refreshed by `clumping_factor` when `clump_b > 0`
    pub omega: f64,
    /// Normalised depth of the top of each layer (`n_layer` entries)
    pub xl: Vec<f64>,
    /// Normalised depth of every layer edge, soil last (`n_layer + 1` entries)
    pub xl_e: Vec<f64>,
}

impl CanopyStructure {
    /// Create a canopy with the default leaf angle tables
    ///
    /// Defaults: Verhoef LIDF (a = -0.35, b = -0.15), 36 azimuth bins,
    /// hot spot 0.05, no clumping (Ω = 1).
    ///
    /// # Errors
    /// `InvalidLayerCount` for zero layers, `InvalidParameter` for a negative
    /// or non-finite LAI or more than one unit of leaf area per layer.
    pub fn new(lai: f64, n_layer: usize) -> Result<Self> {
        if n_layer == 0 {
            return Err(CanopyError::InvalidLayerCount(n_layer));
        }
        let litab = DEFAULT_LITAB.to_vec();
        let lidf = verhoef_lidf(-0.35, -0.15)?;
        let lazitab = (0..36).map(|i| 5.0 + 10.0 * f64::from(i)).collect();

        let dx = 1.0 / n_layer as f64;
        let xl_e: Vec<f64> = (0..=n_layer).map(|j| -(j as f64) * dx).collect();
        let xl = xl_e[..n_layer].to_vec();

        let can = Self {
            lai,
            n_layer,
            dx,
            lidf,
            litab,
            lazitab,
            hot: 0.05,
            clump_a: 1.0,
            clump_b: 0.0,
            omega: 1.0,
            xl,
            xl_e,
        };
        can.validate()?;
        Ok(can)
    }

    /// Replace the leaf inclination distribution
    ///
    /// # Errors
    /// `ShapeMismatch` if `lidf` does not match `litab`.
    pub fn with_lidf(mut self, lidf: Vec<f64>) -> Result<Self> {
        check_len("lidf", self.litab.len(), lidf.len())?;
        self.lidf = lidf;
        self.validate()?;
        Ok(self)
    }

    /// Set the clumping model `Ω = a + b·(1 − cos tts)`
    pub fn with_clumping(mut self, clump_a: f64, clump_b: f64) -> Self {
        self.clump_a = clump_a;
        self.clump_b = clump_b;
        self
    }

    /// Fix Ω directly (disables the zenith-dependent model)
    pub fn with_omega(mut self, omega: f64) -> Self {
        self.clump_b = 0.0;
        self.omega = omega;
        self
    }

    pub fn with_hot_spot(mut self, hot: f64) -> Self {
        self.hot = hot;
        self
    }

    /// Leaf area of a single layer, `LAI·Ω / n_layer`
    #[must_use]
    pub fn i_lai(&self) -> f64 {
        self.lai * self.omega / self.n_layer as f64
    }

    #[must_use]
    pub fn n_incl(&self) -> usize {
        self.litab.len()
    }

    #[must_use]
    pub fn n_azi(&self) -> usize {
        self.lazitab.len()
    }

    /// Check every array against `n_layer` and the physical ranges
    ///
    /// # Errors
    /// The first violated precondition.
    pub fn validate(&self) -> Result<()> {
        if self.n_layer == 0 {
            return Err(CanopyError::InvalidLayerCount(self.n_layer));
        }
        if !(self.lai >= 0.0 && self.lai.is_finite()) {
            return Err(CanopyError::InvalidParameter {
                name: "lai",
                value: self.lai,
                reason: "leaf area index must be finite and non-negative",
            });
        }
        if !(self.omega > 0.0 && self.omega.is_finite()) {
            return Err(CanopyError::InvalidParameter {
                name: "omega",
                value: self.omega,
                reason: "clumping index must be positive",
            });
        }
        if !(self.hot >= 0.0 && self.hot.is_finite()) {
            return Err(CanopyError::InvalidParameter {
                name: "hot",
                value: self.hot,
                reason: "hot-spot parameter must be non-negative",
            });
        }
        if self.i_lai() > 1.0 {
            return Err(CanopyError::InvalidParameter {
                name: "i_lai",
                value: self.i_lai(),
                reason: "leaf area per layer must not exceed 1; use more layers",
            });
        }
        check_len("lidf", self.litab.len(), self.lidf.len())?;
        check_len("xl", self.n_layer, self.xl.len())?;
        check_len("xl_e", self.n_layer + 1, self.xl_e.len())?;
        let dx = 1.0 / self.n_layer as f64;
        if (self.dx - dx).abs() > LAYERING_TOLERANCE {
            return Err(CanopyError::InvalidParameter {
                name: "dx",
                value: self.dx,
                reason: "layer thickness must be 1 / n_layer",
            });
        }
        for (j, &x) in self.xl_e.iter().enumerate() {
            let expected = -(j as f64) * dx;
            if (x - expected).abs() > LAYERING_TOLERANCE {
                return Err(CanopyError::InvalidParameter {
                    name: "xl_e",
                    value: x,
                    reason: "layer edges must sit at -j / n_layer",
                });
            }
        }
        if let Some((&x, _)) = self
            .xl
            .iter()
            .zip(&self.xl_e)
            .find(|(x, e)| (**x - **e).abs() > LAYERING_TOLERANCE)
        {
            return Err(CanopyError::InvalidParameter {
                name: "xl",
                value: x,
                reason: "layer tops must match the upper layer edges",
            });
        }
        if self.lazitab.is_empty() {
            return Err(CanopyError::ShapeMismatch {
                what: "lazitab",
                expected: 36,
                found: 0,
            });
        }
        if self.lidf.iter().any(|&f| f < 0.0) {
            return Err(CanopyError::InvalidParameter {
                name: "lidf",
                value: self.lidf.iter().copied().fold(f64::INFINITY, f64::min),
                reason: "leaf inclination probabilities must be non-negative",
            });
        }
        let total: f64 = self.lidf.iter().sum();
        if (total - 1.0).abs() > 1e-6 {
            return Err(CanopyError::InvalidParameter {
                name: "lidf",
                value: total,
                reason: "leaf inclination distribution must sum to 1",
            });
        }
        Ok(())
    }
}

/// Cumulative leaf inclination distribution of Verhoef (1998) at angle `t`
fn verhoef_cumulative(a: f64, b: f64, t: f64) -> f64 {
    let rd = std::f64::consts::PI / 180.0;
    if a >= 1.0 {
        return 1.0 - (rd * t).cos();
    }

    let p = 2.0 * rd * t;
    let mut x = p;
    let mut y = 0.0;
    for _ in 0..200 {
        y = a * x.sin() + 0.5 * b * (2.0 * x).sin();
        let dx = 0.5 * (y - x + p);
        x += dx;
        if dx.abs() < 1e-8 {
            break;
        }
    }
    (2.0 * y + p) / std::f64::consts::PI
}

/// Two-parameter leaf inclination distribution on `DEFAULT_LITAB`
///
/// `a` controls the average leaf slope, `b` the bimodality; `|a| + |b| <= 1`.
///
/// # Errors
/// `InvalidParameter` when `|a| + |b| > 1`.
pub fn verhoef_lidf(a: f64, b: f64) -> Result<Vec<f64>> {
    if a.abs() + b.abs() > 1.0 {
        return Err(CanopyError::InvalidParameter {
            name: "lidf_a",
            value: a,
            reason: "Verhoef LIDF requires |a| + |b| <= 1",
        });
    }

    let cumulative: Vec<f64> = LITAB_EDGES
        .iter()
        .map(|&t| verhoef_cumulative(a, b, t))
        .collect();
    let mut freq = Vec::with_capacity(cumulative.len());
    let mut previous = 0.0;
    for (i, &c) in cumulative.iter().enumerate() {
        // last edge is 90°, where the cumulative is 1 by construction
        let c = if i + 1 == cumulative.len() { 1.0 } else { c };
        freq.push(c - previous);
        previous = c;
    }
    Ok(freq)
}

/// Spherical leaf inclination distribution on `DEFAULT_LITAB`
#[must_use]
pub fn spherical_lidf() -> Vec<f64> {
    let mut lower = 0.0_f64;
    LITAB_EDGES
        .iter()
        .map(|&upper| {
            let f = lower.to_radians().cos() - upper.to_radians().cos();
            lower = upper;
            f
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layering() {
        let can = CanopyStructure::new(3.0, 20).unwrap();
        assert_eq!(can.xl.len(), 20);
        assert_eq!(can.xl_e.len(), 21);
        assert_eq!(can.xl[0], 0.0);
        assert!((can.xl_e[20] + 1.0).abs() < 1e-12);
        assert!((can.dx - 0.05).abs() < 1e-15);
        assert!((can.i_lai() - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_zero_layers_rejected() {
        assert_eq!(
            CanopyStructure::new(3.0, 0),
            Err(CanopyError::InvalidLayerCount(0))
        );
    }

    #[test]
    fn test_negative_lai_rejected() {
        assert!(matches!(
            CanopyStructure::new(-1.0, 10),
            Err(CanopyError::InvalidParameter { name: "lai", .. })
        ));
    }

    #[test]
    fn test_thick_layers_rejected() {
        for n_layer in [1, 2] {
            assert!(matches!(
                CanopyStructure::new(3.0, n_layer),
                Err(CanopyError::InvalidParameter { name: "i_lai", .. })
            ));
        }
        assert!(CanopyStructure::new(6.0, 5).is_err());
        assert!(CanopyStructure::new(3.0, 3).is_ok());

        // Clumping above 1 can push an accepted canopy over the limit
        let can = CanopyStructure::new(3.0, 3).unwrap().with_omega(1.5);
        assert!(matches!(
            can.validate(),
            Err(CanopyError::InvalidParameter { name: "i_lai", .. })
        ));
    }

    #[test]
    fn test_inconsistent_layering_rejected() {
        let can = CanopyStructure::new(3.0, 10).unwrap();

        let mut wrong_dx = can.clone();
        wrong_dx.dx = 0.2;
        assert!(matches!(
            wrong_dx.validate(),
            Err(CanopyError::InvalidParameter { name: "dx", .. })
        ));

        let mut shifted = can.clone();
        shifted.xl_e[4] = -0.5;
        assert!(matches!(
            shifted.validate(),
            Err(CanopyError::InvalidParameter { name: "xl_e", .. })
        ));

        let mut tops = can.clone();
        tops.xl[3] = -0.35;
        assert!(matches!(
            tops.validate(),
            Err(CanopyError::InvalidParameter { name: "xl", .. })
        ));

        // A round trip through serde keeps a valid layering
        let json = serde_json::to_string(&can).unwrap();
        let back: CanopyStructure = serde_json::from_str(&json).unwrap();
        assert!(back.validate().is_ok());
    }

    #[test]
    fn test_verhoef_lidf_sums_to_one() {
        for (a, b) in [(-0.35, -0.15), (0.0, 0.0), (-0.9, 0.0), (0.5, 0.5)] {
            let lidf = verhoef_lidf(a, b).unwrap();
            assert_eq!(lidf.len(), 13);
            let total: f64 = lidf.iter().sum();
            assert!((total - 1.0).abs() < 1e-9, "a={a}, b={b}: sum {total}");
            assert!(lidf.iter().all(|&f| f >= -1e-12));
        }
    }

    #[test]
    fn test_verhoef_lidf_planophile_vs_erectophile() {
        // positive a favours horizontal leaves, negative a vertical ones
        let planophile = verhoef_lidf(0.9, 0.0).unwrap();
        let erectophile = verhoef_lidf(-0.9, 0.0).unwrap();
        assert!(planophile[0] > erectophile[0]);
        assert!(planophile[12] < erectophile[12]);
    }

    #[test]
    fn test_verhoef_lidf_rejects_out_of_range() {
        assert!(verhoef_lidf(0.8, 0.5).is_err());
    }

    #[test]
    fn test_spherical_lidf() {
        let lidf = spherical_lidf();
        let total: f64 = lidf.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        // steep leaves dominate a spherical distribution
        assert!(lidf[7] > lidf[0]);
    }

    #[test]
    fn test_clumping_builders() {
        let can = CanopyStructure::new(3.0, 10).unwrap().with_omega(0.48);
        assert_eq!(can.omega, 0.48);
        assert_eq!(can.clump_b, 0.0);

        let can = can.with_clumping(0.6, 0.2);
        assert_eq!(can.clump_a, 0.6);
        assert_eq!(can.clump_b, 0.2);
    }

    #[test]
    fn test_with_lidf_checks_length() {
        let can = CanopyStructure::new(3.0, 10).unwrap();
        assert!(matches!(
            can.clone().with_lidf(vec![1.0]),
            Err(CanopyError::ShapeMismatch { what: "lidf", .. })
        ));
        let uniform = vec![1.0 / 13.0; 13];
        assert!(can.with_lidf(uniform).is_ok());
    }
}
