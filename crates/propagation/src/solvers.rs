//! The alternative Kepler-equation solving schemes.
//!
//! Each function implements the shared contract from the crate root with a
//! different update rule. Anomaly identities come from `twobody_anomaly`; the
//! solvers only own the iteration (or the non-iterative correction ladder).

use std::f64::consts::{PI, TAU};

use twobody_anomaly::{
    eccentric_to_mean, eccentric_to_true, hyperbolic_to_mean, hyperbolic_to_true,
    true_to_eccentric, true_to_hyperbolic,
};
use twobody_core::util::{sign, wrap_anomaly};
use twobody_elements::ClassicalElements;

use crate::PropagationError;

/// Danby's quartic-correction Newton scheme (elliptic and hyperbolic).
///
/// Each iteration applies the third-order Householder step built from the
/// first three derivatives of the Kepler residual.
pub fn danby(
    k: f64,
    coe: &ClassicalElements,
    tof: f64,
    numiter: usize,
    rtol: f64,
) -> Result<f64, PropagationError> {
    let ecc = coe.ecc;
    let a = coe.semi_major_axis_km();
    let n = (k / a.abs().powi(3)).sqrt();

    if ecc == 0.0 {
        // Circular orbit: M, E, and nu coincide.
        let m = coe.nu_rad + n * tof;
        return Ok(m - TAU * (m / TAU).floor());
    }

    let (xma, mut e_anom) = if ecc < 1.0 {
        let m0 = eccentric_to_mean(true_to_eccentric(coe.nu_rad, ecc), ecc);
        let m = m0 + n * tof;
        let xma = m - TAU * (m / TAU).floor();
        (xma, xma + 0.85 * sign(xma.sin()) * ecc)
    } else {
        let m0 = hyperbolic_to_mean(true_to_hyperbolic(coe.nu_rad, ecc), ecc);
        let m = m0 + n * tof;
        let xma = m - TAU * (m / TAU).floor();
        (xma, (2.0 * xma / ecc + 1.8).ln())
    };

    let mut residual = f64::NAN;
    for _ in 0..=numiter {
        let (f, fp, fpp, fppp) = if ecc < 1.0 {
            let s = ecc * e_anom.sin();
            let c = ecc * e_anom.cos();
            (e_anom - s - xma, 1.0 - c, s, c)
        } else {
            let s = ecc * e_anom.sinh();
            let c = ecc * e_anom.cosh();
            (s - e_anom - xma, c - 1.0, s, c)
        };
        residual = f;

        if f.abs() < rtol {
            let (sta, cta) = if ecc < 1.0 {
                ((1.0 - ecc * ecc).sqrt() * e_anom.sin(), e_anom.cos() - ecc)
            } else {
                ((ecc * ecc - 1.0).sqrt() * e_anom.sinh(), ecc - e_anom.cosh())
            };
            return Ok(sta.atan2(cta));
        }

        let delta = -f / fp;
        let delta_star = -f / (fp + 0.5 * delta * fpp);
        let deltak = -f / (fp + 0.5 * delta_star * fpp + delta_star * delta_star * fppp / 6.0);
        e_anom += deltak;
    }

    Err(PropagationError::DidNotConverge {
        iterations: numiter,
        residual,
    })
}

/// Markley's non-iterative solver (elliptic only).
///
/// A cubic polynomial starter followed by one fifth-order correction reaches
/// machine precision for any 0 <= ecc < 1 without looping.
pub fn markley(k: f64, coe: &ClassicalElements, tof: f64) -> Result<f64, PropagationError> {
    let ecc = coe.ecc;
    if ecc >= 1.0 {
        return Err(PropagationError::UnsupportedRegime {
            solver: "markley",
            ecc,
        });
    }

    let m0 = eccentric_to_mean(true_to_eccentric(coe.nu_rad, ecc), ecc);
    let a = coe.semi_major_axis_km();
    let n = (k / a.powi(3)).sqrt();
    let m = wrap_anomaly(m0 + n * tof);

    let alpha = (3.0 * PI * PI + 1.6 * PI * (PI - m.abs()) / (1.0 + ecc)) / (PI * PI - 6.0);
    let d = 3.0 * (1.0 - ecc) + alpha * ecc;
    let q = 2.0 * alpha * d * (1.0 - ecc) - m * m;
    let r = 3.0 * alpha * d * (d - 1.0 + ecc) * m + m.powi(3);
    let w = (r.abs() + (q.powi(3) + r * r).sqrt()).powf(2.0 / 3.0);
    let mut e_anom = (2.0 * r * w / (w * w + w * q + q * q) + m) / d;

    let f0 = e_anom - ecc * e_anom.sin() - m;
    let f1 = 1.0 - ecc * e_anom.cos();
    let f2 = ecc * e_anom.sin();
    let f3 = ecc * e_anom.cos();
    let f4 = -f2;

    let delta3 = -f0 / (f1 - 0.5 * f0 * f2 / f1);
    let delta4 = -f0 / (f1 + 0.5 * delta3 * f2 + delta3 * delta3 * f3 / 6.0);
    let delta5 = -f0
        / (f1 + 0.5 * delta4 * f2 + delta4 * delta4 * f3 / 6.0 + delta4.powi(3) * f4 / 24.0);
    e_anom += delta5;

    Ok(eccentric_to_true(e_anom, ecc))
}

/// Mikkola's cubic-approximation solver (elliptic and hyperbolic).
///
/// Solves an auxiliary cubic for a trigonometric substitution variable, applies
/// a small empirical correction, then polishes with a seventh-order Taylor
/// ladder.
pub fn mikkola(k: f64, coe: &ClassicalElements, tof: f64) -> Result<f64, PropagationError> {
    let ecc = coe.ecc;
    let a = coe.semi_major_axis_km();
    let n = (k / a.abs().powi(3)).sqrt();

    let (alpha, m0) = if ecc < 1.0 {
        (
            (1.0 - ecc) / (4.0 * ecc + 0.5),
            eccentric_to_mean(true_to_eccentric(coe.nu_rad, ecc), ecc),
        )
    } else {
        (
            (ecc - 1.0) / (4.0 * ecc + 0.5),
            hyperbolic_to_mean(true_to_hyperbolic(coe.nu_rad, ecc), ecc),
        )
    };
    let m = m0 + n * tof;
    let beta = m / 2.0 / (4.0 * ecc + 0.5);

    let z = if beta >= 0.0 {
        (beta + (beta * beta + alpha.powi(3)).sqrt()).cbrt()
    } else {
        (beta - (beta * beta + alpha.powi(3)).sqrt()).cbrt()
    };
    let mut s = z - alpha / z;

    let ds = if ecc < 1.0 {
        -0.078 * s.powi(5) / (1.0 + ecc)
    } else {
        0.071 * s.powi(5) / ((1.0 + 0.45 * s * s) * (1.0 + 4.0 * s * s) * ecc)
    };
    s += ds;

    let (mut e_anom, f, f1, f2, f3, f4, f5) = if ecc < 1.0 {
        let e = m + ecc * (3.0 * s - 4.0 * s.powi(3));
        let f2 = ecc * e.sin();
        let f3 = ecc * e.cos();
        (e, e - f2 - m, 1.0 - f3, f2, f3, -f2, -f3)
    } else {
        let e = 3.0 * s.asinh();
        let f2 = ecc * e.sinh();
        let f3 = ecc * e.cosh();
        (e, -e + f2 - m, f3 - 1.0, f2, f3, f2, f3)
    };

    let u1 = -f / f1;
    let u2 = -f / (f1 + 0.5 * f2 * u1);
    let u3 = -f / (f1 + 0.5 * f2 * u2 + f3 * u2 * u2 / 6.0);
    let u4 = -f / (f1 + 0.5 * f2 * u3 + f3 * u3 * u3 / 6.0 + f4 * u3.powi(3) / 24.0);
    let u5 = -f
        / (f1
            + 0.5 * f2 * u4
            + f3 * u4 * u4 / 6.0
            + f4 * u4.powi(3) / 24.0
            + f5 * u4.powi(4) / 120.0);
    e_anom += u5;

    Ok(if ecc < 1.0 {
        eccentric_to_true(e_anom, ecc)
    } else {
        hyperbolic_to_true(e_anom, ecc)
    })
}

/// Gooding's scheme (elliptic only): iterate on the shift `psi = E - M` with
/// Halley-accelerated steps.
pub fn gooding(
    k: f64,
    coe: &ClassicalElements,
    tof: f64,
    numiter: usize,
    rtol: f64,
) -> Result<f64, PropagationError> {
    let ecc = coe.ecc;
    if ecc >= 1.0 {
        return Err(PropagationError::UnsupportedRegime {
            solver: "gooding",
            ecc,
        });
    }

    let m0 = eccentric_to_mean(true_to_eccentric(coe.nu_rad, ecc), ecc);
    let a = coe.semi_major_axis_km();
    let n = (k / a.abs().powi(3)).sqrt();
    let m = m0 + n * tof;

    let c = ecc * m.cos();
    let s = ecc * m.sin();
    let mut psi = s / (1.0 - 2.0 * c + ecc * ecc).sqrt();
    let mut f = 1.0;
    let mut count = 0;
    while f * f >= rtol && count <= numiter {
        let xi = psi.cos();
        let eta = psi.sin();
        let fd = (1.0 - c * xi) + s * eta;
        let fdd = c * eta + s * xi;
        f = psi - fdd;
        psi -= f * fd / (fd * fd - 0.5 * f * fdd);
        count += 1;
    }
    if f * f >= rtol {
        return Err(PropagationError::DidNotConverge {
            iterations: numiter,
            residual: f,
        });
    }

    Ok(eccentric_to_true(m + psi, ecc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use twobody_core::constants::GM_EARTH_KM3_S2;

    fn moderately_elliptic() -> ClassicalElements {
        ClassicalElements {
            p_km: 11_067.790,
            ecc: 0.83285,
            inc_rad: 87.87_f64.to_radians(),
            raan_rad: 227.89_f64.to_radians(),
            argp_rad: 53.38_f64.to_radians(),
            nu_rad: 0.2,
        }
    }

    #[test]
    fn solvers_agree_on_an_elliptic_orbit() {
        let coe = moderately_elliptic();
        let tof = 1800.0;
        let reference = crate::farnocchia::farnocchia_coe(GM_EARTH_KM3_S2, &coe, tof).unwrap();
        for solve in [
            danby(GM_EARTH_KM3_S2, &coe, tof, 20, 1e-8),
            markley(GM_EARTH_KM3_S2, &coe, tof),
            mikkola(GM_EARTH_KM3_S2, &coe, tof),
            gooding(GM_EARTH_KM3_S2, &coe, tof, 150, 1e-8),
        ] {
            let nu = solve.unwrap();
            assert_relative_eq!(
                wrap_anomaly(nu),
                wrap_anomaly(reference),
                max_relative = 1e-5,
                epsilon = 1e-6
            );
        }
    }

    #[test]
    fn danby_and_mikkola_handle_hyperbolic_orbits() {
        let coe = ClassicalElements {
            p_km: 20_000.0,
            ecc: 1.5,
            inc_rad: 0.3,
            raan_rad: 0.0,
            argp_rad: 0.0,
            nu_rad: 0.1,
        };
        let tof = 600.0;
        let nu_danby = danby(GM_EARTH_KM3_S2, &coe, tof, 20, 1e-8).unwrap();
        let nu_mikkola = mikkola(GM_EARTH_KM3_S2, &coe, tof).unwrap();
        let reference = crate::farnocchia::farnocchia_coe(GM_EARTH_KM3_S2, &coe, tof).unwrap();
        assert_relative_eq!(nu_danby, reference, max_relative = 1e-5);
        assert_relative_eq!(nu_mikkola, reference, max_relative = 1e-5);
    }

    #[test]
    fn elliptic_only_solvers_reject_hyperbolic_input() {
        let coe = ClassicalElements {
            p_km: 20_000.0,
            ecc: 1.2,
            inc_rad: 0.0,
            raan_rad: 0.0,
            argp_rad: 0.0,
            nu_rad: 0.0,
        };
        assert!(matches!(
            markley(GM_EARTH_KM3_S2, &coe, 100.0),
            Err(PropagationError::UnsupportedRegime { solver: "markley", .. })
        ));
        assert!(matches!(
            gooding(GM_EARTH_KM3_S2, &coe, 100.0, 150, 1e-8),
            Err(PropagationError::UnsupportedRegime { solver: "gooding", .. })
        ));
    }

    #[test]
    fn danby_circular_shortcut() {
        let coe = ClassicalElements {
            p_km: 7000.0,
            ecc: 0.0,
            inc_rad: 0.5,
            raan_rad: 0.0,
            argp_rad: 0.0,
            nu_rad: 0.25,
        };
        let period = coe.period_s(GM_EARTH_KM3_S2);
        let nu = danby(GM_EARTH_KM3_S2, &coe, period, 20, 1e-8).unwrap();
        assert_relative_eq!(nu, 0.25, max_relative = 1e-8);
    }
}
