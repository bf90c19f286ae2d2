//! Pipeline outputs
//!
//! Every field is overwritten by the pipeline that owns it; nothing here is
//! read back as input except the shortwave fluxes consumed by the
//! fluorescence pipeline.

use nalgebra::{DMatrix, DVector};
use serde::Serialize;

/// Radiative outputs of one simulation step
///
/// Profiles indexed by layer edge have `n_layer + 1` columns (top first, soil
/// last). Net fluxes are per unit leaf area of each layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanopyRads {
    // Shortwave (nwl)
    /// Direct solar irradiance reaching a sunlit leaf
    pub e_sun: DVector<f64>,
    /// Downward diffuse irradiance at layer edges (nwl × n+1)
    pub e_down: DMatrix<f64>,
    /// Upward diffuse irradiance at layer edges (nwl × n+1)
    pub e_up: DMatrix<f64>,
    /// Attenuated direct beam at layer edges (nwl × n+1)
    pub e_direct: DMatrix<f64>,
    /// Diffuse absorption by shaded leaves (nwl × n)
    pub net_sw_shade: DMatrix<f64>,
    /// Diffuse plus direct absorption by sunlit leaves (nwl × n)
    pub net_sw_sunlit: DMatrix<f64>,
    pub int_net_sw_shade: Vec<f64>,
    pub int_net_sw_sunlit: Vec<f64>,
    pub net_sw_soil: DVector<f64>,
    pub int_net_sw_soil: f64,
    /// Reflectance in the viewing direction
    pub alb_obs: DVector<f64>,
    /// Hemispherical reflectance for direct illumination
    pub alb_direct: DVector<f64>,
    /// Hemispherical reflectance for diffuse illumination
    pub alb_diffuse: DVector<f64>,
    /// Hemispherical reflectance for the actual illumination mix
    pub alb_hemi: DVector<f64>,

    // Fluorescence (n_wlf)
    pub sif_obs: DVector<f64>,
    pub sif_obs_sunlit: DVector<f64>,
    pub sif_obs_shaded: DVector<f64>,
    pub sif_obs_scattered: DVector<f64>,
    pub sif_obs_soil: DVector<f64>,
    /// Hemispherical fluorescence leaving the canopy top
    pub sif_hemi: DVector<f64>,

    // Thermal (broadband, W m⁻²)
    pub int_net_lw_sunlit: Vec<f64>,
    pub int_net_lw_shade: Vec<f64>,
    pub int_net_lw_soil: f64,
    pub int_lw_up_top: f64,
}

impl CanopyRads {
    /// Zeroed outputs for `nwl` wavelengths, `n_wlf` fluorescence bins and
    /// `n_layer` layers
    #[must_use]
    pub fn new(nwl: usize, n_wlf: usize, n_layer: usize) -> Self {
        Self {
            e_sun: DVector::zeros(nwl),
            e_down: DMatrix::zeros(nwl, n_layer + 1),
            e_up: DMatrix::zeros(nwl, n_layer + 1),
            e_direct: DMatrix::zeros(nwl, n_layer + 1),
            net_sw_shade: DMatrix::zeros(nwl, n_layer),
            net_sw_sunlit: DMatrix::zeros(nwl, n_layer),
            int_net_sw_shade: vec![0.0; n_layer],
            int_net_sw_sunlit: vec![0.0; n_layer],
            net_sw_soil: DVector::zeros(nwl),
            int_net_sw_soil: 0.0,
            alb_obs: DVector::zeros(nwl),
            alb_direct: DVector::zeros(nwl),
            alb_diffuse: DVector::zeros(nwl),
            alb_hemi: DVector::zeros(nwl),
            sif_obs: DVector::zeros(n_wlf),
            sif_obs_sunlit: DVector::zeros(n_wlf),
            sif_obs_shaded: DVector::zeros(n_wlf),
            sif_obs_scattered: DVector::zeros(n_wlf),
            sif_obs_soil: DVector::zeros(n_wlf),
            sif_hemi: DVector::zeros(n_wlf),
            int_net_lw_sunlit: vec![0.0; n_layer],
            int_net_lw_shade: vec![0.0; n_layer],
            int_net_lw_soil: 0.0,
            int_lw_up_top: 0.0,
        }
    }

    /// Number of layers the outputs are sized for
    #[must_use]
    pub fn n_layer(&self) -> usize {
        self.net_sw_shade.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        let rads = CanopyRads::new(211, 21, 20);
        assert_eq!(rads.e_down.shape(), (211, 21));
        assert_eq!(rads.net_sw_sunlit.shape(), (211, 20));
        assert_eq!(rads.sif_obs.len(), 21);
        assert_eq!(rads.int_net_lw_shade.len(), 20);
        assert_eq!(rads.n_layer(), 20);
    }
}
