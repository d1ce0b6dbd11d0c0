//! Propagation through mean anomaly with a dedicated near-parabolic path,
//! after Farnocchia, Bernardi & Valsecchi (2013).
//!
//! Away from `ecc = 1` the classical eccentric/hyperbolic Kepler equations are
//! well conditioned and used directly. Inside a band around the parabola both
//! become victims of catastrophic cancellation, so the equation is rewritten
//! in the parabolic anomaly `D` with the auxiliary series `S(x)`; that form
//! stays finite and smooth straight across `ecc = 1`.

use twobody_anomaly as anomaly;
use twobody_core::util::wrap_anomaly;
use twobody_elements::{ClassicalElements, StateVector, coe2rv, rv2coe};

use crate::PropagationError;

use std::f64::consts::PI;

/// Half-width of the eccentricity band handled by the parabolic formulation.
pub const NEAR_PARABOLIC_DELTA: f64 = 1e-2;

/// Newton tolerance for the near-parabolic Kepler equation.
const NEWTON_TOL: f64 = 1.48e-8;
const NEWTON_MAXITER: usize = 50;

/// Truncation tolerance of the auxiliary series; far below `NEWTON_TOL` so the
/// series error never dominates the solver's convergence criterion.
const SERIES_ATOL: f64 = 1e-12;

/// The auxiliary series `S(ecc, x) = sum_k (ecc - 1/(2k+3)) x^k`.
///
/// Converges only for `|x| < 1`; calling it outside that domain is a
/// programming error, not a recoverable condition.
pub fn s_x(ecc: f64, x: f64, atol: f64) -> f64 {
    assert!(x.abs() < 1.0, "S(x) series only converges for |x| < 1");
    let mut s = 0.0;
    let mut x_pow = 1.0;
    let mut k = 0u32;
    loop {
        let term = (ecc - 1.0 / (2.0 * f64::from(k) + 3.0)) * x_pow;
        s += term;
        if term.abs() < atol {
            return s;
        }
        x_pow *= x;
        k += 1;
    }
}

/// Term-rearranged first derivative of the auxiliary series:
/// `sum_k (ecc - 1/(2k+3)) (2k+3) x^k`.
///
/// Not the plain d/dx of [`s_x`]; the `(2k+3)` weights come from rearranging
/// the derivative of the full near-parabolic equation. Defined for `|x| < 1`.
pub fn ds_x_alt(ecc: f64, x: f64, atol: f64) -> f64 {
    assert!(x.abs() < 1.0, "S'(x) series only converges for |x| < 1");
    let mut s = 0.0;
    let mut x_pow = 1.0;
    let mut k = 0u32;
    loop {
        let n = 2.0 * f64::from(k) + 3.0;
        let term = (ecc - 1.0 / n) * n * x_pow;
        s += term;
        if term.abs() < atol {
            return s;
        }
        x_pow *= x;
        k += 1;
    }
}

/// Term-rearranged second derivative of the auxiliary series:
/// `sum_k (ecc - 1/(2k+3)) (2k+3) (2k+2) x^k`. Defined for `|x| < 1`.
pub fn d2s_x_alt(ecc: f64, x: f64, atol: f64) -> f64 {
    assert!(x.abs() < 1.0, "S''(x) series only converges for |x| < 1");
    let mut s = 0.0;
    let mut x_pow = 1.0;
    let mut k = 0u32;
    loop {
        let n = 2.0 * f64::from(k) + 3.0;
        let term = (ecc - 1.0 / n) * n * (n - 1.0) * x_pow;
        s += term;
        if term.abs() < atol {
            return s;
        }
        x_pow *= x;
        k += 1;
    }
}

/// Mean anomaly from parabolic anomaly in the near-parabolic band.
pub fn parabolic_to_mean_near_parabolic(d: f64, ecc: f64) -> f64 {
    let x = (ecc - 1.0) / (ecc + 1.0) * d * d;
    let s = s_x(ecc, x, SERIES_ATOL);
    (2.0 / (1.0 + ecc)).sqrt() * d + (2.0 / (1.0 + ecc).powi(3)).sqrt() * d.powi(3) * s
}

/// Residual of the near-parabolic Kepler equation at `d`.
pub fn kepler_equation_near_parabolic(d: f64, m: f64, ecc: f64) -> f64 {
    parabolic_to_mean_near_parabolic(d, ecc) - m
}

/// Derivative of the near-parabolic Kepler equation with respect to `d`.
pub fn kepler_equation_prime_near_parabolic(d: f64, ecc: f64) -> f64 {
    let x = (ecc - 1.0) / (ecc + 1.0) * d * d;
    let s = ds_x_alt(ecc, x, SERIES_ATOL);
    (2.0 / (1.0 + ecc)).sqrt() + (2.0 / (1.0 + ecc).powi(3)).sqrt() * d * d * s
}

/// Parabolic anomaly from mean anomaly in the near-parabolic band.
///
/// Newton iteration bootstrapped by the exact Barker solution, which is an
/// excellent starter throughout the band.
pub fn mean_to_parabolic_near_parabolic(
    m: f64,
    ecc: f64,
    tol: f64,
    maxiter: usize,
) -> Result<f64, PropagationError> {
    let mut d = anomaly::mean_to_parabolic(m);
    let mut residual = f64::NAN;
    for _ in 0..maxiter {
        let fval = kepler_equation_near_parabolic(d, m, ecc);
        residual = fval;
        let fder = kepler_equation_prime_near_parabolic(d, ecc);
        let d_new = d - fval / fder;
        if (d_new - d).abs() < tol {
            return Ok(d_new);
        }
        d = d_new;
    }
    Err(PropagationError::DidNotConverge {
        iterations: maxiter,
        residual,
    })
}

/// Time since periapsis passage for a given true anomaly.
///
/// `q` is the periapsis distance and `delta` the half-width of the
/// near-parabolic band. `nu` must already be wrapped to `[-pi, pi)`.
pub fn time_since_periapsis(
    nu: f64,
    ecc: f64,
    k: f64,
    q: f64,
    delta: f64,
) -> Result<f64, PropagationError> {
    assert!((-PI..PI).contains(&nu), "nu must be wrapped to [-pi, pi)");

    let (m, n) = if ecc < 1.0 - delta {
        // Strong elliptic
        let e_anom = anomaly::true_to_eccentric(nu, ecc);
        let m = anomaly::eccentric_to_mean(e_anom, ecc);
        (m, elliptic_mean_motion(k, ecc, q))
    } else if ecc < 1.0 {
        let e_anom = anomaly::true_to_eccentric(nu, ecc);
        if delta <= 1.0 - ecc * e_anom.cos() {
            // Still well conditioned in E near apoapsis
            let m = anomaly::eccentric_to_mean(e_anom, ecc);
            (m, elliptic_mean_motion(k, ecc, q))
        } else {
            let d = anomaly::true_to_parabolic(nu);
            (
                parabolic_to_mean_near_parabolic(d, ecc),
                parabolic_mean_motion(k, q),
            )
        }
    } else if ecc == 1.0 {
        let d = anomaly::true_to_parabolic(nu);
        (anomaly::parabolic_to_mean(d), parabolic_mean_motion(k, q))
    } else if 1.0 + ecc * nu.cos() < 0.0 {
        return Err(PropagationError::UnreachableAnomaly { nu_rad: nu, ecc });
    } else if ecc <= 1.0 + delta {
        let f_anom = anomaly::true_to_hyperbolic(nu, ecc);
        if delta <= ecc * f_anom.cosh() - 1.0 {
            // Far enough from periapsis for the F form
            let m = anomaly::hyperbolic_to_mean(f_anom, ecc);
            (m, hyperbolic_mean_motion(k, ecc, q))
        } else {
            let d = anomaly::true_to_parabolic(nu);
            (
                parabolic_to_mean_near_parabolic(d, ecc),
                parabolic_mean_motion(k, q),
            )
        }
    } else {
        // Strong hyperbolic
        let f_anom = anomaly::true_to_hyperbolic(nu, ecc);
        let m = anomaly::hyperbolic_to_mean(f_anom, ecc);
        (m, hyperbolic_mean_motion(k, ecc, q))
    };

    Ok(m / n)
}

/// True anomaly reached a given time after periapsis passage.
///
/// The inverse of [`time_since_periapsis`], with the same regime dispatch. The
/// elliptic paths wrap the mean anomaly, so multi-revolution times fold back
/// onto the fundamental interval.
pub fn true_anomaly_from_elapsed(
    delta_t: f64,
    ecc: f64,
    k: f64,
    q: f64,
    delta: f64,
) -> Result<f64, PropagationError> {
    if ecc < 1.0 - delta {
        // Strong elliptic
        let n = elliptic_mean_motion(k, ecc, q);
        let e_anom = anomaly::mean_to_eccentric(wrap_anomaly(n * delta_t), ecc)?;
        Ok(anomaly::eccentric_to_true(e_anom, ecc))
    } else if ecc < 1.0 {
        // Compute M as if strong elliptic, then verify against the anomaly at
        // which the E form loses conditioning.
        let e_delta = ((1.0 - delta) / ecc).acos();
        let n = elliptic_mean_motion(k, ecc, q);
        let m = n * delta_t;
        if anomaly::eccentric_to_mean(e_delta, ecc) <= m.abs() {
            let e_anom = anomaly::mean_to_eccentric(wrap_anomaly(m), ecc)?;
            Ok(anomaly::eccentric_to_true(e_anom, ecc))
        } else {
            let n = parabolic_mean_motion(k, q);
            let d = mean_to_parabolic_near_parabolic(n * delta_t, ecc, NEWTON_TOL, NEWTON_MAXITER)?;
            Ok(anomaly::parabolic_to_true(d))
        }
    } else if ecc == 1.0 {
        let n = parabolic_mean_motion(k, q);
        Ok(anomaly::parabolic_to_true(anomaly::mean_to_parabolic(
            n * delta_t,
        )))
    } else if ecc <= 1.0 + delta {
        let f_delta = ((1.0 + delta) / ecc).acosh();
        let n = hyperbolic_mean_motion(k, ecc, q);
        let m = n * delta_t;
        if anomaly::hyperbolic_to_mean(f_delta, ecc) <= m.abs() {
            let f_anom = anomaly::mean_to_hyperbolic(m, ecc)?;
            Ok(anomaly::hyperbolic_to_true(f_anom, ecc))
        } else {
            let n = parabolic_mean_motion(k, q);
            let d = mean_to_parabolic_near_parabolic(n * delta_t, ecc, NEWTON_TOL, NEWTON_MAXITER)?;
            Ok(anomaly::parabolic_to_true(d))
        }
    } else {
        // Strong hyperbolic
        let n = hyperbolic_mean_motion(k, ecc, q);
        let f_anom = anomaly::mean_to_hyperbolic(n * delta_t, ecc)?;
        Ok(anomaly::hyperbolic_to_true(f_anom, ecc))
    }
}

#[inline]
fn elliptic_mean_motion(k: f64, ecc: f64, q: f64) -> f64 {
    (k * (1.0 - ecc).powi(3) / q.powi(3)).sqrt()
}

#[inline]
fn hyperbolic_mean_motion(k: f64, ecc: f64, q: f64) -> f64 {
    (k * (ecc - 1.0).powi(3) / q.powi(3)).sqrt()
}

#[inline]
fn parabolic_mean_motion(k: f64, q: f64) -> f64 {
    (k / (2.0 * q.powi(3))).sqrt()
}

/// True anomaly `tof` seconds after the epoch described by `coe`.
pub fn farnocchia_coe(
    k: f64,
    coe: &ClassicalElements,
    tof: f64,
) -> Result<f64, PropagationError> {
    let q = coe.periapsis_radius_km();
    let delta_t0 = time_since_periapsis(coe.nu_rad, coe.ecc, k, q, NEAR_PARABOLIC_DELTA)?;
    true_anomaly_from_elapsed(delta_t0 + tof, coe.ecc, k, q, NEAR_PARABOLIC_DELTA)
}

/// State-vector propagation through [`farnocchia_coe`].
///
/// The orbit shape is constant under two-body motion, so the elements are
/// recovered once and only the anomaly advances.
pub fn farnocchia_rv(
    k: f64,
    state: &StateVector,
    tof: f64,
    tol: f64,
) -> Result<StateVector, PropagationError> {
    let coe = rv2coe(k, &state.position_km, &state.velocity_km_s, tol);
    let nu = farnocchia_coe(k, &coe, tof)?;
    Ok(coe2rv(k, &ClassicalElements { nu_rad: nu, ..coe }))
}
