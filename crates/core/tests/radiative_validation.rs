//! End-to-end validation of the shortwave, fluorescence and thermal pipelines
//!
//! # Test Categories
//! 1. Two-stream solver against closed-form single-layer results
//! 2. Big-leaf vs per-layer leaf optics equivalence
//! 3. Thermal energy conservation
//! 4. Reference scene (LAI 3, 20 layers, sun 30°, nadir view)
//! 5. Fluorescence decoupling from canopy structure
//!
//! Run with: `cargo test --test radiative_validation`

mod common;

use approx::assert_relative_eq;
use canopy_rt_core::canopy::CanopyOpticals;
use canopy_rt_core::geometry::{canopy_geometry, create_angle_container};
use canopy_rt_core::radiative::{layer_emissivity, STEFAN_BOLTZMANN};
use canopy_rt_core::{
    diffusive_s, thermal_fluxes, CanopyError, CanopyRads, CanopySimulation, CanopyStructure,
    EmissionModel, Kelvin, LeafBios, LeafTemperatures, RtConfig, SoilOpticals, SolarAngles,
    StepForcing, SunlitTemperature, WaveLengths,
};
use common::{reference_simulation, soil, sunlight, synthetic_leaf, wavelengths};
use nalgebra::{DMatrix, DVector};

fn forcing(wl: &WaveLengths, n_layer: usize) -> StepForcing {
    StepForcing {
        shortwave: sunlight(wl),
        longwave: 320.0,
        temperatures: LeafTemperatures::isothermal(n_layer, Kelvin::new(298.0)),
    }
}

fn geometry(can: &mut CanopyStructure, angles: &SolarAngles) -> CanopyOpticals {
    let mut optics = CanopyOpticals::new(can);
    let mut container = create_angle_container(can, angles);
    canopy_geometry(can, angles, &mut optics, &mut container, &RtConfig::default()).unwrap();
    optics
}

// ═══════════════════════════════════════════════════════════════════════════════
// SECTION 1: TWO-STREAM SOLVER
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn single_layer_over_soil_matches_closed_form() {
    // Multiple reflections between one layer and the soil sum to a
    // geometric series
    let cases = [(0.6, 0.25, 0.3), (0.9, 0.05, 0.1), (0.2, 0.4, 0.8)];
    let n = cases.len();
    let tau = DMatrix::from_fn(n, 1, |i, _| cases[i].0);
    let rho = DMatrix::from_fn(n, 1, |i, _| cases[i].1);
    let rs = DVector::from_fn(n, |i, _| cases[i].2);
    let zeros = DMatrix::zeros(n, 1);

    let out = diffusive_s(
        &tau,
        &rho,
        &zeros,
        &zeros,
        &DVector::from_element(n, 1.0),
        &rs,
        &DVector::zeros(n),
    )
    .unwrap();

    for (i, &(t, r, s)) in cases.iter().enumerate() {
        assert_relative_eq!(out.e_up[(i, 0)], r + t * t * s / (1.0 - r * s), max_relative = 1e-14);
        assert_relative_eq!(
            out.net_diffuse[(i, 0)],
            (1.0 + s * t / (1.0 - r * s)) * (1.0 - t - r),
            max_relative = 1e-14
        );
    }
}

#[test]
fn two_identical_layers_match_adding_formula() {
    let (t, r) = (0.7, 0.2);
    let zeros = DMatrix::zeros(1, 2);
    let out = diffusive_s(
        &DMatrix::from_element(1, 2, t),
        &DMatrix::from_element(1, 2, r),
        &zeros,
        &zeros,
        &DVector::from_element(1, 1.0),
        &DVector::zeros(1),
        &DVector::zeros(1),
    )
    .unwrap();
    let denom = 1.0 - r * r;
    assert_relative_eq!(out.e_up[(0, 0)], r + t * t * r / denom, max_relative = 1e-14);
    assert_relative_eq!(out.e_down[(0, 2)], t * t / denom, max_relative = 1e-14);
}

// ═══════════════════════════════════════════════════════════════════════════════
// SECTION 2: BIG LEAF VS PER-LAYER LEAVES
// ═══════════════════════════════════════════════════════════════════════════════

fn simulation_with(leaves: Vec<LeafBios>) -> CanopySimulation {
    let wl = wavelengths();
    CanopySimulation::new(
        CanopyStructure::new(3.0, 20).unwrap(),
        SolarAngles::new(30.0, 0.0, 0.0),
        leaves,
        soil(&wl),
        wl,
        RtConfig::default(),
    )
    .unwrap()
}

#[test]
fn shared_leaf_equals_identical_per_layer_leaves() {
    let wl = wavelengths();
    let leaf = synthetic_leaf(&wl, 0.2, 0.01);

    let mut shared = simulation_with(vec![leaf.clone()]);
    let mut layered = simulation_with(vec![leaf; 20]);
    let forcing = forcing(&wl, 20);

    let a: CanopyRads = shared.step(&forcing).unwrap().clone();
    let b: CanopyRads = layered.step(&forcing).unwrap().clone();
    assert_eq!(a, b);
}

#[test]
fn emissivity_varies_with_per_layer_leaves() {
    let wl = wavelengths();
    let mut can = CanopyStructure::new(3.0, 20).unwrap();
    let optics = geometry(&mut can, &SolarAngles::default());

    let shared = layer_emissivity(&[synthetic_leaf(&wl, 0.0, 0.01)], &can, &optics).unwrap();
    assert!(shared.iter().all(|&e| e == shared[0]));

    let leaves: Vec<LeafBios> = (0..20)
        .map(|j| synthetic_leaf(&wl, 0.0, 0.01).with_longwave(0.005 * f64::from(j), 0.01))
        .collect();
    let layered = layer_emissivity(&leaves, &can, &optics).unwrap();
    for j in 1..20 {
        assert!(layered[j] < layered[j - 1]);
    }
}

#[test]
fn leaf_count_must_be_one_or_per_layer() {
    let wl = wavelengths();
    let mut can = CanopyStructure::new(3.0, 20).unwrap();
    let optics = geometry(&mut can, &SolarAngles::default());
    let mut rads = CanopyRads::new(wl.len(), wl.iwlf.len(), 20);
    let leaves = vec![synthetic_leaf(&wl, 0.0, 0.01); 3];
    let result = thermal_fluxes(
        &leaves,
        &optics,
        &mut rads,
        &can,
        &soil(&wl),
        &[300.0],
        &LeafTemperatures::isothermal(20, Kelvin::new(295.0)),
        &RtConfig::default(),
    );
    assert_eq!(
        result,
        Err(CanopyError::LeafCountMismatch {
            leaves: 3,
            layers: 20
        })
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// SECTION 3: THERMAL ENERGY CONSERVATION
// ═══════════════════════════════════════════════════════════════════════════════

fn resolved_sunlit(can: &CanopyStructure, base: f64) -> Vec<SunlitTemperature> {
    (0..can.n_layer)
        .map(|j| {
            SunlitTemperature::Resolved(DMatrix::from_fn(can.n_incl(), can.n_azi(), |i, k| {
                base + 0.2 * i as f64 + 0.05 * k as f64 - 0.1 * j as f64
            }))
        })
        .collect()
}

/// Net leaf loss `Σ (S⁺ + S⁻ − net_diffuse)` of a thermal run, with
/// `S⁺ = S⁻ = iLAI·(fSun·S_sun + (1 − fSun)·S_shade)`
fn leaf_emission_budget(
    leaf: &LeafBios,
    can: &CanopyStructure,
    optics: &CanopyOpticals,
    temps: &LeafTemperatures,
    rads: &CanopyRads,
) -> f64 {
    let eps = layer_emissivity(std::slice::from_ref(leaf), can, optics).unwrap();
    let f_sun = optics.sunlit_fraction();
    let i_lai = can.i_lai();
    (0..can.n_layer)
        .map(|j| {
            let s_shade = STEFAN_BOLTZMANN * eps[j] * temps.t_shade[j].pow4();
            let s_sun = STEFAN_BOLTZMANN * eps[j] * temps.t_sun[j].mean_pow4(&can.lidf);
            let source = i_lai * (f_sun[j] * s_sun + (1.0 - f_sun[j]) * s_shade);
            let net = rads.int_net_lw_shade[j] + 2.0 * s_shade;
            2.0 * source - net
        })
        .sum()
}

#[test]
fn thermal_emission_leaves_through_top_or_into_soil() {
    let wl = wavelengths();
    let mut can = CanopyStructure::new(3.0, 20).unwrap();
    let optics = geometry(&mut can, &SolarAngles::new(35.0, 0.0, 0.0));
    let leaf = synthetic_leaf(&wl, 0.0, 0.01).with_longwave(0.04, 0.03);
    let black_cold_soil = SoilOpticals {
        rho_sw: DVector::from_element(wl.len(), 0.1),
        rho_lw: 0.0,
        skin_t: Kelvin::ABSOLUTE_ZERO,
    };
    let temps = LeafTemperatures {
        t_shade: (0..20).map(|j| Kelvin::new(290.0 + 0.3 * f64::from(j))).collect(),
        t_sun: resolved_sunlit(&can, 302.0),
    };

    let mut rads = CanopyRads::new(wl.len(), wl.iwlf.len(), 20);
    thermal_fluxes(
        std::slice::from_ref(&leaf),
        &optics,
        &mut rads,
        &can,
        &black_cold_soil,
        &[0.0],
        &temps,
        &RtConfig::default(),
    )
    .unwrap();

    let emitted = leaf_emission_budget(&leaf, &can, &optics, &temps, &rads);
    assert!(emitted > 0.0);
    assert!(rads.int_net_lw_soil > 0.0);
    assert_relative_eq!(
        emitted,
        rads.int_lw_up_top + rads.int_net_lw_soil,
        max_relative = 1e-10
    );
}

#[test]
fn thermal_budget_closes_with_sky_and_soil_exchange() {
    let wl = wavelengths();
    let mut can = CanopyStructure::new(4.5, 30).unwrap();
    let optics = geometry(&mut can, &SolarAngles::new(50.0, 20.0, 90.0));
    let leaf = synthetic_leaf(&wl, 0.0, 0.01).with_longwave(0.02, 0.01);
    let sky = 310.0;
    let temps = LeafTemperatures {
        t_shade: vec![Kelvin::new(296.0); 30],
        t_sun: resolved_sunlit(&can, 305.0),
    };

    let mut rads = CanopyRads::new(wl.len(), wl.iwlf.len(), 30);
    thermal_fluxes(
        std::slice::from_ref(&leaf),
        &optics,
        &mut rads,
        &can,
        &soil(&wl),
        &[sky],
        &temps,
        &RtConfig::default(),
    )
    .unwrap();

    // Leaves lose what leaves the top, minus the sky input, plus what the
    // soil absorbs net
    let emitted = leaf_emission_budget(&leaf, &can, &optics, &temps, &rads);
    assert_relative_eq!(
        emitted,
        rads.int_lw_up_top - sky + rads.int_net_lw_soil,
        max_relative = 1e-10
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// SECTION 4: REFERENCE SCENE
// ═══════════════════════════════════════════════════════════════════════════════

fn index_of(wl: &WaveLengths, nm: f64) -> usize {
    wl.wl.iter().position(|&w| (w - nm).abs() < 1e-9).unwrap()
}

#[test]
fn reference_scene_is_deterministic() {
    let mut a = reference_simulation(RtConfig::default());
    let mut b = reference_simulation(RtConfig::default());
    let wl = a.wavelengths().clone();
    let f = forcing(&wl, 20);
    let ra = a.step(&f).unwrap().clone();
    let rb = b.step(&f).unwrap().clone();
    assert_eq!(ra, rb);

    // A repeated step on the same simulation reproduces itself
    let again = a.step(&f).unwrap();
    assert_eq!(&ra, again);
}

#[test]
fn reference_scene_reflectance_is_vegetation_like() {
    let mut sim = reference_simulation(RtConfig::default());
    let wl = sim.wavelengths().clone();
    let rads = sim.step(&forcing(&wl, 20)).unwrap();

    for i in 0..wl.len() {
        for a in [rads.alb_obs[i], rads.alb_hemi[i], rads.alb_direct[i], rads.alb_diffuse[i]] {
            assert!(a > 0.0 && a < 1.0, "albedo {a} at {} nm", wl.wl[i]);
        }
    }

    let red = index_of(&wl, 670.0);
    let green = index_of(&wl, 550.0);
    let nir = index_of(&wl, 850.0);
    assert!(rads.alb_obs[green] > rads.alb_obs[red]);
    assert!(rads.alb_obs[nir] > 4.0 * rads.alb_obs[red]);
    assert!(rads.alb_hemi[nir] > 0.3);
}

#[test]
fn reference_scene_matches_scalar_reference_run() {
    // Values from an independent scalar implementation of the same scene
    // (Verhoef LIDF -0.35/-0.15, hot spot 0.05, G7/K15 Pso integral)
    let mut sim = reference_simulation(RtConfig::default());
    let wl = sim.wavelengths().clone();
    let rads = sim.step(&forcing(&wl, 20)).unwrap();

    let expected = [
        (450.0, 0.031_581_288_848, 0.015_888_570_090),
        (550.0, 0.076_819_191_463, 0.042_073_048_212),
        (670.0, 0.050_833_177_006, 0.026_133_225_757),
        (850.0, 0.537_591_631_373, 0.407_861_533_518),
    ];
    for (nm, obs, hemi) in expected {
        let i = index_of(&wl, nm);
        assert_relative_eq!(rads.alb_obs[i], obs, max_relative = 1e-6);
        assert_relative_eq!(rads.alb_hemi[i], hemi, max_relative = 1e-6);
    }
}

#[test]
fn black_scene_reflects_nothing() {
    let wl = wavelengths();
    let black = LeafBios::uniform(&wl, 0.0, 0.0);
    let mut dark_soil = soil(&wl);
    dark_soil.rho_sw.fill(0.0);
    let mut sim = CanopySimulation::new(
        CanopyStructure::new(3.0, 20).unwrap(),
        SolarAngles::new(30.0, 0.0, 0.0),
        vec![black],
        dark_soil,
        wl.clone(),
        RtConfig::default(),
    )
    .unwrap();
    sim.run_shortwave(&sunlight(&wl)).unwrap();
    assert!(sim.rads().alb_obs.iter().all(|&a| a == 0.0));
    assert!(sim.rads().alb_hemi.iter().all(|&a| a == 0.0));
}

#[test]
fn planck_emission_is_rejected() {
    let config = RtConfig {
        emission: EmissionModel::Planck,
        ..RtConfig::default()
    };
    let mut sim = reference_simulation(config);
    let wl = sim.wavelengths().clone();
    let result = sim.step(&forcing(&wl, 20));
    assert_eq!(
        result.err(),
        Some(CanopyError::UnsupportedEmissionModel(EmissionModel::Planck))
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// SECTION 5: FLUORESCENCE DECOUPLING
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn leaf_biochemistry_changes_sif_but_not_gap_fractions() {
    let mut sim = reference_simulation(RtConfig::default());
    let wl = sim.wavelengths().clone();
    let f = forcing(&wl, 20);

    let before = sim.step(&f).unwrap().sif_obs.clone();
    let (ps, po, pso) = {
        let o = sim.optics();
        (o.ps.clone(), o.po.clone(), o.pso.clone())
    };

    sim.set_leaves(vec![synthetic_leaf(&wl, 0.6, 0.02)]).unwrap();
    let after = sim.step(&f).unwrap().sif_obs.clone();

    assert_eq!(sim.optics().ps, ps);
    assert_eq!(sim.optics().po, po);
    assert_eq!(sim.optics().pso, pso);

    let changed = before
        .iter()
        .zip(after.iter())
        .filter(|(b, a)| (*a - *b).abs() > 1e-6 * b.abs())
        .count();
    assert!(changed > wl.iwlf.len() / 2);
    assert!(before.iter().all(|&v| v > 0.0));
}

#[test]
fn sif_peaks_in_the_red_and_far_red() {
    let mut sim = reference_simulation(RtConfig::default());
    let wl = sim.wavelengths().clone();
    let rads = sim.step(&forcing(&wl, 20)).unwrap();
    let wlf = wl.wlf();
    let peak = rads
        .sif_obs
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| wlf[i])
        .unwrap();
    assert!((670.0..=760.0).contains(&peak), "SIF peak at {peak} nm");
    assert!(wl.integrate_fluorescence(&rads.sif_hemi) > 0.0);
}
