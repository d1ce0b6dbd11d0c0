//! Scenario glue: validated configuration in, propagated samples out.

use thiserror::Error;

use twobody_config::{ConfigError, OrbitConfig, ScenarioConfig, SolverConfig, validate_scenario};
use twobody_elements::{ClassicalElements, coe2rv};
use twobody_export::trajectory::Sample;
use twobody_propagation::{KeplerSolver, PropagationError};

/// Default number of samples along the propagated arc.
const DEFAULT_SAMPLES: usize = 50;

/// Scenario execution failures.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("requested solver has no implementation")]
    UnsupportedSolver,
    #[error("propagation failed: {0}")]
    Propagation(#[from] PropagationError),
}

/// Outcome of a scenario run.
#[derive(Debug)]
pub struct ScenarioResult {
    pub solver: KeplerSolver,
    pub final_elements: ClassicalElements,
    pub samples: Vec<Sample>,
}

/// Map a configured solver onto a runtime strategy.
///
/// The catch-all `Unsupported` tag rejects loudly instead of silently falling
/// back to a default.
pub fn solver_from_config(config: &SolverConfig) -> Result<KeplerSolver, ScenarioError> {
    match config {
        SolverConfig::Farnocchia => Ok(KeplerSolver::Farnocchia),
        SolverConfig::Danby => Ok(KeplerSolver::Danby),
        SolverConfig::Markley => Ok(KeplerSolver::Markley),
        SolverConfig::Mikkola => Ok(KeplerSolver::Mikkola),
        SolverConfig::Gooding => Ok(KeplerSolver::Gooding),
        SolverConfig::Unsupported => Err(ScenarioError::UnsupportedSolver),
    }
}

/// Convert manifest elements (degrees) into runtime elements (radians).
pub fn elements_from_config(orbit: &OrbitConfig) -> ClassicalElements {
    ClassicalElements {
        p_km: orbit.p_km,
        ecc: orbit.ecc,
        inc_rad: orbit.inc_deg.to_radians(),
        raan_rad: orbit.raan_deg.to_radians(),
        argp_rad: orbit.argp_deg.to_radians(),
        nu_rad: orbit.nu_deg.to_radians(),
    }
}

/// Run a propagation scenario: validate, select the solver, sample the arc.
pub fn run_scenario(config: &ScenarioConfig) -> Result<ScenarioResult, ScenarioError> {
    validate_scenario(config)?;
    let solver = solver_from_config(&config.propagation.solver)?;
    let coe = elements_from_config(&config.orbit);
    let k = config.attractor.mu_km3_s2;

    let num = config.propagation.samples.unwrap_or(DEFAULT_SAMPLES).max(2);
    let mut samples = Vec::with_capacity(num);
    let mut nu = coe.nu_rad;
    for i in 0..num {
        let t = config.propagation.tof_s * i as f64 / (num - 1) as f64;
        nu = solver.solve(k, &coe, t)?;
        let state = coe2rv(k, &ClassicalElements { nu_rad: nu, ..coe });
        samples.push(Sample {
            time_s: t,
            nu_rad: nu,
            position_km: state.position_km,
            velocity_km_s: state.velocity_km_s,
        });
    }

    Ok(ScenarioResult {
        solver,
        final_elements: ClassicalElements { nu_rad: nu, ..coe },
        samples,
    })
}
