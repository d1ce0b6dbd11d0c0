//! Universal-variable propagation after Vallado.
//!
//! One Newton iteration on the universal anomaly covers every conic; the
//! Stumpff functions absorb the elliptic/parabolic/hyperbolic distinction, so
//! no explicit regime branch is needed beyond the initial guess.

use twobody_core::linalg::{Vector3, add, dot, norm, scale};
use twobody_core::util::sign;
use twobody_elements::StateVector;

use crate::PropagationError;
use crate::stumpff::{c2, c3};

/// Convergence tolerance on the universal anomaly.
const XI_TOL: f64 = 1e-7;

/// Lagrange coefficients `(f, g, fdot, gdot)` for a transfer of `tof` seconds
/// from the state `(r0, v0)`.
pub fn lagrange_coefficients(
    k: f64,
    r0: &Vector3,
    v0: &Vector3,
    tof: f64,
    numiter: usize,
) -> Result<(f64, f64, f64, f64), PropagationError> {
    let dot_r0v0 = dot(r0, v0);
    let norm_r0 = norm(r0);
    let sqrt_mu = k.sqrt();
    // Reciprocal semi-major axis; its sign classifies the conic.
    let alpha = -dot(v0, v0) / k + 2.0 / norm_r0;

    let mut xi_new = if alpha > 0.0 {
        // Elliptic
        sqrt_mu * tof * alpha
    } else if alpha < 0.0 {
        // Hyperbolic
        sign(tof)
            * (-1.0 / alpha).sqrt()
            * ((-2.0 * k * alpha * tof)
                / (dot_r0v0 + sign(tof) * (-k / alpha).sqrt() * (1.0 - norm_r0 * alpha)))
                .ln()
    } else {
        // Parabolic; conservative starter
        sqrt_mu * tof / norm_r0
    };

    let mut count = 0;
    loop {
        let xi = xi_new;
        let psi = xi * xi * alpha;
        let c2_psi = c2(psi);
        let c3_psi = c3(psi);
        let norm_r = xi * xi * c2_psi
            + dot_r0v0 / sqrt_mu * xi * (1.0 - psi * c3_psi)
            + norm_r0 * (1.0 - psi * c2_psi);
        xi_new = xi
            + (sqrt_mu * tof
                - xi.powi(3) * c3_psi
                - dot_r0v0 / sqrt_mu * xi * xi * c2_psi
                - norm_r0 * xi * (1.0 - psi * c3_psi))
                / norm_r;

        if (xi_new - xi).abs() < XI_TOL {
            let f = 1.0 - xi * xi / norm_r0 * c2_psi;
            let g = tof - xi.powi(3) / sqrt_mu * c3_psi;
            let gdot = 1.0 - xi * xi / norm_r * c2_psi;
            let fdot = sqrt_mu / (norm_r * norm_r0) * xi * (psi * c3_psi - 1.0);
            return Ok((f, g, fdot, gdot));
        }

        count += 1;
        if count >= numiter {
            return Err(PropagationError::DidNotConverge {
                iterations: numiter,
                residual: (xi_new - xi).abs(),
            });
        }
    }
}

/// State-vector propagation through the Lagrange coefficients.
pub fn vallado_rv(
    k: f64,
    state: &StateVector,
    tof: f64,
    numiter: usize,
) -> Result<StateVector, PropagationError> {
    let (f, g, fdot, gdot) =
        lagrange_coefficients(k, &state.position_km, &state.velocity_km_s, tof, numiter)?;
    Ok(StateVector {
        position_km: add(
            &scale(&state.position_km, f),
            &scale(&state.velocity_km_s, g),
        ),
        velocity_km_s: add(
            &scale(&state.position_km, fdot),
            &scale(&state.velocity_km_s, gdot),
        ),
    })
}
