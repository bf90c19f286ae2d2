//! Shared fixtures for the integration tests

#![allow(dead_code)]

use canopy_rt_core::{
    CanopySimulation, CanopyStructure, IncomingRadiation, Kelvin, LeafBios, RtConfig,
    SoilOpticals, SolarAngles, WaveLengths,
};
use ctor::ctor;
use nalgebra::{DMatrix, DVector};

#[ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// 400-900 nm at 5 nm: covers both fluorescence bands
pub fn wavelengths() -> WaveLengths {
    WaveLengths::uniform(400.0, 900.0, 5.0).unwrap()
}

/// Smooth step from 0 to 1 centred on `centre` nm
fn red_edge(wl: f64, centre: f64) -> f64 {
    1.0 / (1.0 + (-(wl - centre) / 12.0).exp())
}

/// Stand-in for the leaf optics model: a green leaf whose xanthophyll state
/// `cx` darkens the 531 nm band and quenches fluorescence
pub fn synthetic_leaf(wl: &WaveLengths, cx: f64, fqe: f64) -> LeafBios {
    let edge = |w: f64| red_edge(w, 705.0);
    let green = |w: f64| (-((w - 550.0) / 30.0).powi(2)).exp();
    let pri = |w: f64| (-((w - 531.0) / 10.0).powi(2)).exp();

    let rho = DVector::from_iterator(
        wl.len(),
        wl.wl
            .iter()
            .map(|&w| 0.04 + 0.06 * green(w) * (1.0 - 0.3 * cx * pri(w)) + 0.42 * edge(w)),
    );
    let tau = DVector::from_iterator(
        wl.len(),
        wl.wl.iter().map(|&w| 0.02 + 0.04 * green(w) + 0.40 * edge(w)),
    );

    let wle = wl.wle();
    let wlf = wl.wlf();
    let quench = 1.0 - 0.4 * cx;
    let emission = |f: f64| {
        (-((f - 685.0) / 12.0).powi(2)).exp() + 0.8 * (-((f - 740.0) / 25.0).powi(2)).exp()
    };
    let absorption = |e: f64| 1.0 - edge(e);
    let mb = DMatrix::from_fn(wlf.len(), wle.len(), |i, k| {
        2e-4 * quench * emission(wlf[i]) * absorption(wle[k])
    });
    let mf = &mb * 0.9;

    let mut leaf = LeafBios::uniform(wl, 0.1, 0.05)
        .with_spectra(rho, tau)
        .with_fluorescence(mb, mf)
        .with_longwave(0.01, 0.01);
    leaf.cx = cx;
    leaf.fqe = fqe;
    leaf
}

pub fn soil(wl: &WaveLengths) -> SoilOpticals {
    let rho = DVector::from_iterator(
        wl.len(),
        wl.wl.iter().map(|&w| 0.1 + 0.15 * (w - 400.0) / 500.0),
    );
    SoilOpticals {
        rho_sw: rho,
        rho_lw: 0.06,
        skin_t: Kelvin::new(300.0),
    }
}

pub fn sunlight(wl: &WaveLengths) -> IncomingRadiation {
    IncomingRadiation {
        e_direct: DVector::from_iterator(
            wl.len(),
            wl.wl.iter().map(|&w| 1.6 - 0.0008 * (w - 400.0)),
        ),
        e_diffuse: DVector::from_iterator(
            wl.len(),
            wl.wl.iter().map(|&w| 0.5 - 0.0004 * (w - 400.0)),
        ),
    }
}

/// The reference scene: LAI 3 in 20 layers, sun at 30°, nadir view
pub fn reference_simulation(config: RtConfig) -> CanopySimulation {
    let wl = wavelengths();
    let leaf = synthetic_leaf(&wl, 0.0, 0.01);
    CanopySimulation::new(
        CanopyStructure::new(3.0, 20).unwrap(),
        SolarAngles::new(30.0, 0.0, 0.0),
        vec![leaf],
        soil(&wl),
        wl,
        config,
    )
    .unwrap()
}
