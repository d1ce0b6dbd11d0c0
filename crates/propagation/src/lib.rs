//! Analytic two-body propagation.
//!
//! A family of Kepler-equation solvers shares a single contract: given the
//! gravitational parameter, a set of classical elements, and an elapsed time,
//! return the true anomaly reached. The solvers differ in update rule and in
//! the eccentricity regimes they support; every one performs its own regime
//! dispatch so callers never special-case circular or near-parabolic inputs.

pub mod farnocchia;
pub mod solvers;
pub mod stumpff;
pub mod vallado;

use rayon::prelude::*;
use thiserror::Error;

use twobody_anomaly::AnomalyError;
use twobody_elements::{ClassicalElements, StateVector};

/// Propagation failures, kept distinct by cause.
#[derive(Debug, Error)]
pub enum PropagationError {
    /// The requested true anomaly lies beyond the asymptote of a hyperbolic
    /// orbit; no elapsed time corresponds to it.
    #[error("true anomaly {nu_rad} rad is outside the reachable arc for eccentricity {ecc}")]
    UnreachableAnomaly { nu_rad: f64, ecc: f64 },
    /// An iterative scheme ran out of its iteration budget. Retrying with a
    /// looser tolerance or larger budget may succeed; the input itself is valid.
    #[error(
        "kepler solver did not converge after {iterations} iterations (last residual {residual:e})"
    )]
    DidNotConverge { iterations: usize, residual: f64 },
    /// The chosen solver does not implement the requested eccentricity regime.
    #[error("{solver} solver does not support eccentricity {ecc}")]
    UnsupportedRegime { solver: &'static str, ecc: f64 },
    #[error(transparent)]
    Anomaly(#[from] AnomalyError),
}

/// Interchangeable Kepler-equation solving strategies.
///
/// All variants take the same inputs and produce the same output; they trade
/// robustness, supported regimes, and per-call cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeplerSolver {
    /// Near-parabolic-safe dispatch over anomaly formulations; supports every
    /// eccentricity. The default choice.
    Farnocchia,
    /// Quartic-correction Newton iteration; elliptic and hyperbolic.
    Danby,
    /// Non-iterative cubic starter plus quintic correction; elliptic only.
    Markley,
    /// Cubic auxiliary-variable starter with a seventh-order correction;
    /// elliptic and hyperbolic.
    Mikkola,
    /// Halley-refined iteration on the shifted eccentric anomaly; elliptic only.
    Gooding,
}

impl KeplerSolver {
    /// True anomaly reached `tof` seconds after the epoch described by `coe`.
    pub fn solve(
        self,
        k: f64,
        coe: &ClassicalElements,
        tof: f64,
    ) -> Result<f64, PropagationError> {
        match self {
            KeplerSolver::Farnocchia => farnocchia::farnocchia_coe(k, coe, tof),
            KeplerSolver::Danby => solvers::danby(k, coe, tof, 20, 1e-8),
            KeplerSolver::Markley => solvers::markley(k, coe, tof),
            KeplerSolver::Mikkola => solvers::mikkola(k, coe, tof),
            KeplerSolver::Gooding => solvers::gooding(k, coe, tof, 150, 1e-8),
        }
    }

    /// Name used in diagnostics and exported artifacts.
    pub fn name(self) -> &'static str {
        match self {
            KeplerSolver::Farnocchia => "farnocchia",
            KeplerSolver::Danby => "danby",
            KeplerSolver::Markley => "markley",
            KeplerSolver::Mikkola => "mikkola",
            KeplerSolver::Gooding => "gooding",
        }
    }
}

/// One solver applied independently across a batch of orbits.
///
/// Each slot carries its own result: a failing orbit reports its error in
/// place without disturbing its siblings.
pub fn propagate_many(
    solver: KeplerSolver,
    ks: &[f64],
    orbits: &[ClassicalElements],
    tofs: &[f64],
) -> Vec<Result<f64, PropagationError>> {
    assert_eq!(ks.len(), orbits.len());
    assert_eq!(ks.len(), tofs.len());
    (0..orbits.len())
        .into_par_iter()
        .map(|i| solver.solve(ks[i], &orbits[i], tofs[i]))
        .collect()
}

/// Propagate a state vector by `tof` seconds with the default solver.
///
/// `tol` is the degenerate-geometry tolerance forwarded to the element
/// recovery step.
pub fn propagate(
    k: f64,
    state: &StateVector,
    tof: f64,
    tol: f64,
) -> Result<StateVector, PropagationError> {
    farnocchia::farnocchia_rv(k, state, tof, tol)
}
