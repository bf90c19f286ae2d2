//! Numerical settings for a simulation run
//!
//! Everything here is serde-serialisable so scenario files can carry it
//! next to the canopy description.

use crate::geometry::QuadratureConfig;
use crate::radiative::EmissionModel;
use serde::{Deserialize, Serialize};

/// Post-processing applied to the joint gap fraction `Pso`
///
/// The hot-spot integral can return `Pso` slightly above `min(Ps, Po)`
/// near the canopy top when the sun and view extinctions differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PsoClamp {
    /// Keep the integral as computed
    #[default]
    Disabled,
    /// Bound `Pso[j]` by `min(Ps[j], Po[j])`
    MinOfPsPo,
}

/// Run configuration shared by the geometry engine and the flux pipelines
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RtConfig {
    pub pso_clamp: PsoClamp,
    /// Tolerances of the per-layer `Pso` integral
    pub quadrature: QuadratureConfig,
    /// Leaf and soil thermal emission law
    pub emission: EmissionModel,
}

impl RtConfig {
    /// Tight `Pso` quadrature for reference runs
    ///
    /// The clamp stays disabled so results remain comparable with the
    /// default configuration.
    #[must_use]
    pub fn high_accuracy() -> Self {
        Self {
            quadrature: QuadratureConfig {
                rtol: 1e-8,
                atol: 1e-14,
                max_segments: 512,
            },
            ..Self::default()
        }
    }

    /// Same settings with the `Pso ≤ min(Ps, Po)` clamp switched on
    #[must_use]
    pub fn with_pso_clamp(mut self) -> Self {
        self.pso_clamp = PsoClamp::MinOfPsPo;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RtConfig::default();
        assert_eq!(config.pso_clamp, PsoClamp::Disabled);
        assert_eq!(config.emission, EmissionModel::StefanBoltzmann);
        assert_eq!(config.quadrature.rtol, 1e-2);
    }

    #[test]
    fn test_high_accuracy_keeps_clamp_disabled() {
        let config = RtConfig::high_accuracy();
        assert_eq!(config.pso_clamp, PsoClamp::Disabled);
        assert!(config.quadrature.rtol < RtConfig::default().quadrature.rtol);
        assert_eq!(config.with_pso_clamp().pso_clamp, PsoClamp::MinOfPsPo);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RtConfig = serde_json::from_str(r#"{"pso_clamp":"MinOfPsPo"}"#).unwrap();
        assert_eq!(config.pso_clamp, PsoClamp::MinOfPsPo);
        assert_eq!(config.quadrature, QuadratureConfig::default());
    }
}
