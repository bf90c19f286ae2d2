use canopy_rt_core::canopy::verhoef_lidf;
use canopy_rt_core::{
    CanopyRads, CanopySimulation, CanopyStructure, Celsius, IncomingRadiation, Kelvin, LeafBios,
    LeafTemperatures, RtConfig, SoilOpticals, SolarAngles, StepForcing, WaveLengths,
};
use clap::Parser;
use nalgebra::{DMatrix, DVector};
use serde::Deserialize;
use std::error::Error;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Canopy radiative transfer demo with configurable scene
#[derive(Parser, Debug)]
#[command(name = "canopy-demo")]
#[command(about = "Layered SAIL canopy radiative transfer demo", long_about = None)]
struct Args {
    /// JSON scenario file (fields not given keep their defaults)
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Solar zenith angle in degrees (overrides the scenario)
    #[arg(long)]
    tts: Option<f64>,

    /// Viewing zenith angle in degrees
    #[arg(long)]
    tto: Option<f64>,

    /// Relative azimuth in degrees
    #[arg(long)]
    psi: Option<f64>,

    /// Leaf area index
    #[arg(short, long)]
    lai: Option<f64>,

    /// Number of canopy layers
    #[arg(short = 'n', long)]
    layers: Option<usize>,

    /// Clamp Pso to min(Ps, Po)
    #[arg(long)]
    clamp_pso: bool,

    /// Use the high-accuracy quadrature preset
    #[arg(long)]
    accurate: bool,

    /// Sweep the solar zenith from 0 to 80° and print a table
    #[arg(long)]
    sweep: bool,

    /// Dump every output of the step as JSON instead of the summary
    #[arg(long)]
    json: bool,
}

/// Scene description loaded from JSON
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct Scenario {
    lai: f64,
    layers: usize,
    /// Verhoef LIDF parameters
    lidf_a: f64,
    lidf_b: f64,
    hot: f64,
    omega: f64,
    tts: f64,
    tto: f64,
    psi: f64,
    /// Leaf reflectance and transmittance below and above the red edge
    leaf_rho_vis: f64,
    leaf_tau_vis: f64,
    leaf_rho_nir: f64,
    leaf_tau_nir: f64,
    red_edge_nm: f64,
    fqe: f64,
    soil_rho: f64,
    soil_rho_lw: f64,
    /// Broadband direct and diffuse irradiance per nm (W m⁻² nm⁻¹)
    e_direct: f64,
    e_diffuse: f64,
    /// Sky longwave (W m⁻²)
    longwave: f64,
    t_leaf_c: f64,
    t_soil_c: f64,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            lai: 3.0,
            layers: 20,
            lidf_a: -0.35,
            lidf_b: -0.15,
            hot: 0.05,
            omega: 1.0,
            tts: 30.0,
            tto: 0.0,
            psi: 0.0,
            leaf_rho_vis: 0.06,
            leaf_tau_vis: 0.04,
            leaf_rho_nir: 0.46,
            leaf_tau_nir: 0.42,
            red_edge_nm: 705.0,
            fqe: 0.01,
            soil_rho: 0.15,
            soil_rho_lw: 0.06,
            e_direct: 1.4,
            e_diffuse: 0.4,
            longwave: 350.0,
            t_leaf_c: 25.0,
            t_soil_c: 30.0,
        }
    }
}

impl Scenario {
    fn apply_overrides(&mut self, args: &Args) {
        if let Some(v) = args.tts {
            self.tts = v;
        }
        if let Some(v) = args.tto {
            self.tto = v;
        }
        if let Some(v) = args.psi {
            self.psi = v;
        }
        if let Some(v) = args.lai {
            self.lai = v;
        }
        if let Some(v) = args.layers {
            self.layers = v;
        }
    }

    fn kelvin(celsius: f64) -> Result<Kelvin, Box<dyn Error>> {
        if celsius < -273.15 || !celsius.is_finite() {
            return Err(format!("temperature {celsius}°C is below absolute zero").into());
        }
        Ok(Celsius::new(celsius).to_kelvin())
    }

    /// Leaf with a logistic red edge and a two-peak fluorescence emission
    fn leaf(&self, wl: &WaveLengths) -> LeafBios {
        let edge = |w: f64| 1.0 / (1.0 + (-(w - self.red_edge_nm) / 12.0).exp());
        let rho = DVector::from_iterator(
            wl.len(),
            wl.wl
                .iter()
                .map(|&w| self.leaf_rho_vis + (self.leaf_rho_nir - self.leaf_rho_vis) * edge(w)),
        );
        let tau = DVector::from_iterator(
            wl.len(),
            wl.wl
                .iter()
                .map(|&w| self.leaf_tau_vis + (self.leaf_tau_nir - self.leaf_tau_vis) * edge(w)),
        );

        let wle = wl.wle();
        let wlf = wl.wlf();
        let emission = |f: f64| {
            (-((f - 685.0) / 12.0).powi(2)).exp() + 0.8 * (-((f - 740.0) / 25.0).powi(2)).exp()
        };
        let mb = DMatrix::from_fn(wlf.len(), wle.len(), |i, k| {
            2e-4 * emission(wlf[i]) * (1.0 - edge(wle[k]))
        });
        let mf = &mb * 0.9;

        let mut leaf = LeafBios::uniform(wl, self.leaf_rho_vis, self.leaf_tau_vis)
            .with_spectra(rho, tau)
            .with_fluorescence(mb, mf);
        leaf.fqe = self.fqe;
        leaf
    }

    fn build(&self, config: RtConfig) -> Result<(CanopySimulation, StepForcing), Box<dyn Error>> {
        let wl = WaveLengths::uniform(400.0, 2500.0, 5.0)?;
        let structure = CanopyStructure::new(self.lai, self.layers)?
            .with_lidf(verhoef_lidf(self.lidf_a, self.lidf_b)?)?
            .with_hot_spot(self.hot)
            .with_omega(self.omega);

        let soil = SoilOpticals::uniform(
            &wl,
            self.soil_rho,
            self.soil_rho_lw,
            Self::kelvin(self.t_soil_c)?,
        );
        let forcing = StepForcing {
            shortwave: IncomingRadiation::uniform(&wl, self.e_direct, self.e_diffuse),
            longwave: self.longwave,
            temperatures: LeafTemperatures::isothermal(self.layers, Self::kelvin(self.t_leaf_c)?),
        };
        let leaf = self.leaf(&wl);

        let sim = CanopySimulation::new(
            structure,
            SolarAngles::new(self.tts, self.tto, self.psi),
            vec![leaf],
            soil,
            wl,
            config,
        )?;
        Ok((sim, forcing))
    }
}

/// Mean of `spectrum` over `[lo, hi)` nm
fn band_mean(wl: &WaveLengths, spectrum: &DVector<f64>, lo: f64, hi: f64) -> f64 {
    let (sum, count) = wl
        .wl
        .iter()
        .zip(spectrum.iter())
        .filter(|(w, _)| (lo..hi).contains(*w))
        .fold((0.0, 0usize), |(s, c), (_, &v)| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn print_summary(scenario: &Scenario, wl: &WaveLengths, rads: &CanopyRads) {
    println!("=== Canopy Radiative Transfer Demo ===\n");
    println!(
        "LAI {:.2} in {} layers, Ω {:.2}, hot spot {:.3}",
        scenario.lai, scenario.layers, scenario.omega, scenario.hot
    );
    println!(
        "Sun zenith {:.1}°, view zenith {:.1}°, relative azimuth {:.1}°\n",
        scenario.tts, scenario.tto, scenario.psi
    );

    println!("Band        | Obs refl | Hemi refl | Direct | Diffuse");
    println!("------------|----------|-----------|--------|--------");
    for (name, lo, hi) in [
        ("Blue", 450.0, 500.0),
        ("Green", 530.0, 570.0),
        ("Red", 640.0, 690.0),
        ("NIR", 780.0, 900.0),
        ("SWIR", 1550.0, 1750.0),
    ] {
        println!(
            "{:11} | {:8.4} | {:9.4} | {:6.4} | {:7.4}",
            name,
            band_mean(wl, &rads.alb_obs, lo, hi),
            band_mean(wl, &rads.alb_hemi, lo, hi),
            band_mean(wl, &rads.alb_direct, lo, hi),
            band_mean(wl, &rads.alb_diffuse, lo, hi),
        );
    }

    let sw_sun: f64 = rads.int_net_sw_sunlit.iter().sum();
    let sw_shade: f64 = rads.int_net_sw_shade.iter().sum();
    println!("\nShortwave absorbed (per unit leaf area, summed over layers)");
    println!("  Sunlit leaves: {:.1} W/m²", sw_sun);
    println!("  Shaded leaves: {:.1} W/m²", sw_shade);
    println!("  Soil:          {:.1} W/m²", rads.int_net_sw_soil);

    let wlf = wl.wlf();
    if let Some((peak, value)) = wlf
        .iter()
        .zip(rads.sif_obs.iter())
        .max_by(|a, b| a.1.total_cmp(b.1))
    {
        println!("\nFluorescence");
        println!("  Peak observed SIF: {:.4e} at {:.0} nm", value, peak);
        println!(
            "  Total observed: {:.4e}, hemispherical: {:.4e}",
            wl.integrate_fluorescence(&rads.sif_obs),
            wl.integrate_fluorescence(&rads.sif_hemi)
        );
    }

    let lw_sun: f64 = rads.int_net_lw_sunlit.iter().sum();
    let lw_shade: f64 = rads.int_net_lw_shade.iter().sum();
    println!("\nLongwave (W/m²)");
    println!("  Net sunlit leaves: {:8.2}", lw_sun);
    println!("  Net shaded leaves: {:8.2}", lw_shade);
    println!("  Net soil:          {:8.2}", rads.int_net_lw_soil);
    println!("  Emitted at top:    {:8.2}", rads.int_lw_up_top);
}

fn run_sweep(scenario: &Scenario, config: RtConfig) -> Result<(), Box<dyn Error>> {
    let (mut sim, forcing) = scenario.build(config)?;
    let wl = sim.wavelengths().clone();

    println!("SZA(°) | Red refl | NIR refl | NIR hemi | Sunlit SW | Soil SW | SIF 740");
    println!("-------|----------|----------|----------|-----------|---------|--------");
    for step in 0..=16 {
        let tts = f64::from(step) * 5.0;
        sim.set_angles(SolarAngles::new(tts, scenario.tto, scenario.psi))?;
        let rads = sim.step(&forcing)?;
        let sif_740 = wl
            .wlf()
            .iter()
            .position(|&f| (f - 740.0).abs() < 2.5)
            .map_or(0.0, |i| rads.sif_obs[i]);
        println!(
            "{:6.1} | {:8.4} | {:8.4} | {:8.4} | {:9.1} | {:7.1} | {:.3e}",
            tts,
            band_mean(&wl, &rads.alb_obs, 640.0, 690.0),
            band_mean(&wl, &rads.alb_obs, 780.0, 900.0),
            band_mean(&wl, &rads.alb_hemi, 780.0, 900.0),
            rads.int_net_sw_sunlit.iter().sum::<f64>(),
            rads.int_net_sw_soil,
            sif_740,
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut scenario = match &args.scenario {
        Some(path) => {
            info!("Loading scenario from {}", path.display());
            serde_json::from_str(&std::fs::read_to_string(path)?)?
        }
        None => Scenario::default(),
    };
    scenario.apply_overrides(&args);

    let mut config = if args.accurate {
        RtConfig::high_accuracy()
    } else {
        RtConfig::default()
    };
    if args.clamp_pso {
        config = config.with_pso_clamp();
    }

    if args.sweep {
        return run_sweep(&scenario, config);
    }

    let (mut sim, forcing) = scenario.build(config)?;
    let wl = sim.wavelengths().clone();
    let rads = sim.step(&forcing)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(rads)?);
    } else {
        print_summary(&scenario, &wl, rads);
    }
    Ok(())
}
