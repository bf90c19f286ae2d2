//! Simulation driver owning every buffer of a canopy run
//!
//! The driver validates the whole configuration up front, then runs the
//! geometry engine and the flux pipelines in their required order. Geometry
//! is recomputed lazily whenever angles or structure change.

use crate::canopy::{
    check_leaf_count, CanopyOpticals, CanopyRads, CanopyStructure, IncomingRadiation, LeafBios,
    LeafTemperatures, SoilOpticals,
};
use crate::config::RtConfig;
use crate::core_types::{SolarAngles, WaveLengths};
use crate::error::Result;
use crate::geometry::{canopy_geometry, create_angle_container, AngleContainer};
use crate::radiative::{short_wave, sif_fluxes, thermal_fluxes};
use tracing::{debug, info};

/// Forcing for one full step
#[derive(Debug, Clone, PartialEq)]
pub struct StepForcing {
    pub shortwave: IncomingRadiation,
    /// Broadband sky longwave (W m⁻²)
    pub longwave: f64,
    pub temperatures: LeafTemperatures,
}

/// Canopy radiative transfer simulation
pub struct CanopySimulation {
    structure: CanopyStructure,
    angles: SolarAngles,
    container: AngleContainer,
    optics: CanopyOpticals,
    rads: CanopyRads,
    leaves: Vec<LeafBios>,
    soil: SoilOpticals,
    wavelengths: WaveLengths,
    config: RtConfig,
    geometry_stale: bool,
}

impl CanopySimulation {
    /// Create a simulation, validating every input before allocating buffers
    ///
    /// # Errors
    /// The first configuration error found (structure, angles, leaf count,
    /// leaf or soil spectra).
    pub fn new(
        structure: CanopyStructure,
        angles: SolarAngles,
        leaves: Vec<LeafBios>,
        soil: SoilOpticals,
        wavelengths: WaveLengths,
        config: RtConfig,
    ) -> Result<Self> {
        info!("Creating canopy radiative transfer simulation");

        structure.validate()?;
        angles.validate()?;
        check_leaf_count(&leaves, structure.n_layer)?;
        for leaf in &leaves {
            leaf.validate(&wavelengths)?;
        }
        soil.validate(&wavelengths)?;

        let container = create_angle_container(&structure, &angles);
        let optics = CanopyOpticals::new(&structure);
        let rads = CanopyRads::new(wavelengths.len(), wavelengths.iwlf.len(), structure.n_layer);

        info!(
            "Canopy initialized: LAI={:.2}, {} layers, {} leaf optics, {} wavelengths, Pso clamp {:?}",
            structure.lai,
            structure.n_layer,
            leaves.len(),
            wavelengths.len(),
            config.pso_clamp
        );

        Ok(Self {
            structure,
            angles,
            container,
            optics,
            rads,
            leaves,
            soil,
            wavelengths,
            config,
            geometry_stale: true,
        })
    }

    /// Set new sun/view angles; geometry is recomputed on the next run
    ///
    /// # Errors
    /// `InvalidAngle` for zeniths outside [0, 90).
    pub fn set_angles(&mut self, angles: SolarAngles) -> Result<()> {
        angles.validate()?;
        self.angles = angles;
        self.geometry_stale = true;
        Ok(())
    }

    /// Override the clumping index Ω
    pub fn set_omega(&mut self, omega: f64) {
        self.structure.clump_b = 0.0;
        self.structure.omega = omega;
        self.geometry_stale = true;
    }

    /// Replace the leaf optics (one shared leaf or one per layer)
    ///
    /// # Errors
    /// `LeafCountMismatch` or leaf validation errors; the previous leaves are
    /// kept on failure.
    pub fn set_leaves(&mut self, leaves: Vec<LeafBios>) -> Result<()> {
        check_leaf_count(&leaves, self.structure.n_layer)?;
        for leaf in &leaves {
            leaf.validate(&self.wavelengths)?;
        }
        self.leaves = leaves;
        Ok(())
    }

    /// Replace the soil optics
    ///
    /// # Errors
    /// Soil validation errors; the previous soil is kept on failure.
    pub fn set_soil(&mut self, soil: SoilOpticals) -> Result<()> {
        soil.validate(&self.wavelengths)?;
        self.soil = soil;
        Ok(())
    }

    /// Recompute Ω, extinction coefficients and gap fractions now
    ///
    /// # Errors
    /// Geometry validation errors.
    pub fn update_geometry(&mut self) -> Result<()> {
        canopy_geometry(
            &mut self.structure,
            &self.angles,
            &mut self.optics,
            &mut self.container,
            &self.config,
        )?;
        self.geometry_stale = false;
        Ok(())
    }

    fn ensure_geometry(&mut self) -> Result<()> {
        if self.geometry_stale {
            self.update_geometry()?;
        }
        Ok(())
    }

    /// Shortwave pipeline: fluxes, absorption and reflectance
    ///
    /// # Errors
    /// Geometry or forcing validation errors.
    pub fn run_shortwave(&mut self, incoming: &IncomingRadiation) -> Result<()> {
        self.ensure_geometry()?;
        short_wave(
            &self.leaves,
            &self.structure,
            &self.optics,
            &self.soil,
            incoming,
            &self.wavelengths,
            &mut self.rads,
        )
    }

    /// Shortwave followed by fluorescence, which is excited by its fluxes
    ///
    /// # Errors
    /// Geometry or forcing validation errors.
    pub fn run_fluorescence(&mut self, incoming: &IncomingRadiation) -> Result<()> {
        self.run_shortwave(incoming)?;
        sif_fluxes(
            &self.leaves,
            &self.structure,
            &self.optics,
            &self.soil,
            &self.wavelengths,
            &mut self.rads,
        )
    }

    /// Thermal pipeline for the given sky longwave and leaf temperatures
    ///
    /// # Errors
    /// `UnsupportedEmissionModel` in Planck mode, or shape errors.
    pub fn run_thermal(&mut self, incoming_lw: f64, temps: &LeafTemperatures) -> Result<()> {
        self.ensure_geometry()?;
        thermal_fluxes(
            &self.leaves,
            &self.optics,
            &mut self.rads,
            &self.structure,
            &self.soil,
            &[incoming_lw],
            temps,
            &self.config,
        )
    }

    /// Geometry plus all three pipelines
    ///
    /// # Errors
    /// The first failing stage; outputs of a failed step must not be used.
    pub fn step(&mut self, forcing: &StepForcing) -> Result<&CanopyRads> {
        self.update_geometry()?;
        self.run_fluorescence(&forcing.shortwave)?;
        self.run_thermal(forcing.longwave, &forcing.temperatures)?;

        debug!(
            "Step complete: ks={:.4}, ko={:.4}, omega={:.3}, net SW soil={:.2}, LW up={:.2}",
            self.optics.ks,
            self.optics.ko,
            self.structure.omega,
            self.rads.int_net_sw_soil,
            self.rads.int_lw_up_top
        );
        Ok(&self.rads)
    }

    pub fn structure(&self) -> &CanopyStructure {
        &self.structure
    }

    pub fn angles(&self) -> &SolarAngles {
        &self.angles
    }

    pub fn optics(&self) -> &CanopyOpticals {
        &self.optics
    }

    pub fn container(&self) -> &AngleContainer {
        &self.container
    }

    pub fn rads(&self) -> &CanopyRads {
        &self.rads
    }

    pub fn leaves(&self) -> &[LeafBios] {
        &self.leaves
    }

    pub fn soil(&self) -> &SoilOpticals {
        &self.soil
    }

    pub fn wavelengths(&self) -> &WaveLengths {
        &self.wavelengths
    }

    pub fn config(&self) -> &RtConfig {
        &self.config
    }
}
