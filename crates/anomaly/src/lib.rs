//! Conversions between the anomalies that parametrize position along a conic.
//!
//! True anomaly (nu) relates to eccentric (E), hyperbolic (F), and parabolic (D)
//! anomaly through closed forms; mean anomaly (M) requires a Newton iteration in
//! the eccentric and hyperbolic cases. All angles are in radians.

use std::f64::consts::PI;

use thiserror::Error;

/// Absolute tolerance on the Newton step for the iterative inverses.
pub const NEWTON_TOLERANCE: f64 = 1.48e-8;

/// Iterative inverse failure.
#[derive(Debug, Error)]
pub enum AnomalyError {
    #[error(
        "anomaly iteration did not converge after {iterations} iterations (last residual {residual:e})"
    )]
    DidNotConverge { iterations: usize, residual: f64 },
}

/// True anomaly from parabolic anomaly.
#[inline]
pub fn parabolic_to_true(d: f64) -> f64 {
    2.0 * d.atan()
}

/// Parabolic anomaly from true anomaly.
#[inline]
pub fn true_to_parabolic(nu: f64) -> f64 {
    (nu / 2.0).tan()
}

/// Eccentric anomaly from true anomaly, for ecc < 1.
#[inline]
pub fn true_to_eccentric(nu: f64, ecc: f64) -> f64 {
    2.0 * (((1.0 - ecc) / (1.0 + ecc)).sqrt() * (nu / 2.0).tan()).atan()
}

/// True anomaly from eccentric anomaly, for ecc < 1.
#[inline]
pub fn eccentric_to_true(e_anom: f64, ecc: f64) -> f64 {
    2.0 * (((1.0 + ecc) / (1.0 - ecc)).sqrt() * (e_anom / 2.0).tan()).atan()
}

/// Hyperbolic anomaly from true anomaly, for ecc > 1.
///
/// Only defined on the reachable arc `|nu| < acos(-1 / ecc)`.
#[inline]
pub fn true_to_hyperbolic(nu: f64, ecc: f64) -> f64 {
    2.0 * (((ecc - 1.0) / (ecc + 1.0)).sqrt() * (nu / 2.0).tan()).atanh()
}

/// True anomaly from hyperbolic anomaly, for ecc > 1.
#[inline]
pub fn hyperbolic_to_true(f_anom: f64, ecc: f64) -> f64 {
    2.0 * (((ecc + 1.0) / (ecc - 1.0)).sqrt() * (f_anom / 2.0).tanh()).atan()
}

/// Kepler's equation: mean anomaly from eccentric anomaly.
#[inline]
pub fn eccentric_to_mean(e_anom: f64, ecc: f64) -> f64 {
    e_anom - ecc * e_anom.sin()
}

/// Hyperbolic Kepler equation: mean anomaly from hyperbolic anomaly.
#[inline]
pub fn hyperbolic_to_mean(f_anom: f64, ecc: f64) -> f64 {
    ecc * f_anom.sinh() - f_anom
}

/// Barker's equation: mean anomaly from parabolic anomaly.
#[inline]
pub fn parabolic_to_mean(d: f64) -> f64 {
    d + d.powi(3) / 3.0
}

/// Closed-form solution of Barker's equation: parabolic anomaly from mean anomaly.
pub fn mean_to_parabolic(m: f64) -> f64 {
    let b = 3.0 * m / 2.0;
    let a = (b + (1.0 + b * b).sqrt()).powf(2.0 / 3.0);
    2.0 * a * b / (1.0 + a + a * a)
}

/// Eccentric anomaly from mean anomaly by Newton iteration, for ecc < 1.
pub fn mean_to_eccentric(m: f64, ecc: f64) -> Result<f64, AnomalyError> {
    // Starter on the correct side of M keeps the iteration monotone.
    let e0 = if (-PI < m && m < 0.0) || m > PI {
        m - ecc
    } else {
        m + ecc
    };
    newton(e0, 50, |e| {
        (eccentric_to_mean(e, ecc) - m, 1.0 - ecc * e.cos())
    })
}

/// Hyperbolic anomaly from mean anomaly by Newton iteration, for ecc > 1.
pub fn mean_to_hyperbolic(m: f64, ecc: f64) -> Result<f64, AnomalyError> {
    let f0 = (m / ecc).asinh();
    newton(f0, 100, |f| {
        (hyperbolic_to_mean(f, ecc) - m, ecc * f.cosh() - 1.0)
    })
}

/// Flight path angle between the velocity and the local horizontal.
#[inline]
pub fn flight_path_angle(nu: f64, ecc: f64) -> f64 {
    (ecc * nu.sin()).atan2(1.0 + ecc * nu.cos())
}

fn newton(x0: f64, maxiter: usize, f: impl Fn(f64) -> (f64, f64)) -> Result<f64, AnomalyError> {
    let mut p0 = x0;
    let mut residual = f64::NAN;
    for _ in 0..maxiter {
        let (fval, fder) = f(p0);
        residual = fval;
        let p = p0 - fval / fder;
        if (p - p0).abs() < NEWTON_TOLERANCE {
            return Ok(p);
        }
        p0 = p;
    }
    Err(AnomalyError::DidNotConverge {
        iterations: maxiter,
        residual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eccentric_round_trip() {
        let ecc = 0.2056;
        for nu in [-2.5, -1.0, 0.0, 0.3, 1.7, 3.0] {
            let e_anom = true_to_eccentric(nu, ecc);
            let back = eccentric_to_true(e_anom, ecc);
            assert!((back - nu).abs() < 1e-12, "nu = {nu}: got {back}");
        }
    }

    #[test]
    fn hyperbolic_round_trip() {
        let ecc = 1.5;
        // Stay inside the reachable arc |nu| < acos(-1/ecc).
        for nu in [-1.8, -0.4, 0.0, 0.9, 2.0] {
            let f_anom = true_to_hyperbolic(nu, ecc);
            let back = hyperbolic_to_true(f_anom, ecc);
            assert!((back - nu).abs() < 1e-12, "nu = {nu}: got {back}");
        }
    }

    #[test]
    fn kepler_equation_is_satisfied() {
        for (m, ecc) in [(0.1, 0.0167), (1.5, 0.2056), (2.8, 0.9), (-1.2, 0.5)] {
            let e_anom = mean_to_eccentric(m, ecc).unwrap();
            assert!((eccentric_to_mean(e_anom, ecc) - m).abs() < 1e-10);
        }
    }

    #[test]
    fn hyperbolic_kepler_equation_is_satisfied() {
        for (m, ecc) in [(0.5, 1.1), (4.0, 2.5), (-3.0, 1.00002)] {
            let f_anom = mean_to_hyperbolic(m, ecc).unwrap();
            assert!((hyperbolic_to_mean(f_anom, ecc) - m).abs() < 1e-9);
        }
    }

    #[test]
    fn barker_closed_form_inverts_cubic() {
        for m in [-2.0, -0.3, 0.0, 0.7, 5.0] {
            let d = mean_to_parabolic(m);
            assert!((parabolic_to_mean(d) - m).abs() < 1e-10, "m = {m}");
        }
    }

    #[test]
    fn circular_orbit_mean_equals_eccentric() {
        let e_anom = mean_to_eccentric(1.0, 0.0).unwrap();
        assert!((e_anom - 1.0).abs() < 1e-12);
    }

    #[test]
    fn flight_path_angle_vanishes_at_apses() {
        assert!(flight_path_angle(0.0, 0.3).abs() < 1e-15);
        assert!(flight_path_angle(PI, 0.3).abs() < 1e-12);
    }
}
