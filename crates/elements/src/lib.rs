//! Conversions between the orbital state representations: classical orbital
//! elements, Cartesian position/velocity, and modified equinoctial elements.
//!
//! Every function here is a pure closed-form map; nothing iterates except the
//! anomaly identities pulled in from `twobody_anomaly`. Units are km, km/s, and
//! radians throughout, with the gravitational parameter in km^3/s^2.

use std::f64::consts::{PI, TAU};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use twobody_anomaly::{eccentric_to_true, hyperbolic_to_true};
use twobody_core::linalg::{Matrix3, Vector3, cross, dot, mat_mul, mat_vec, norm, scale, sub};
use twobody_core::util::{Axis, rotation_matrix, wrap_anomaly};

/// Conversion failures with no recovery path.
#[derive(Debug, Error)]
pub enum ElementsError {
    #[error(
        "modified equinoctial elements are singular for a 180 degree inclination (h and k are undefined)"
    )]
    EquinoctialSingularity,
}

/// Classical (Keplerian) orbital elements.
///
/// `p_km` is the semi-latus rectum, so the set stays meaningful for parabolic
/// and hyperbolic orbits where the semi-major axis degenerates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassicalElements {
    pub p_km: f64,
    pub ecc: f64,
    pub inc_rad: f64,
    pub raan_rad: f64,
    pub argp_rad: f64,
    pub nu_rad: f64,
}

impl ClassicalElements {
    /// Semi-major axis (negative for hyperbolic orbits).
    pub fn semi_major_axis_km(&self) -> f64 {
        self.p_km / (1.0 - self.ecc * self.ecc)
    }

    /// Periapsis distance.
    pub fn periapsis_radius_km(&self) -> f64 {
        self.p_km / (1.0 + self.ecc)
    }

    /// Orbital period around an attractor with gravitational parameter `k`.
    ///
    /// Only meaningful for closed orbits (ecc < 1).
    pub fn period_s(&self, k: f64) -> f64 {
        TAU * (self.semi_major_axis_km().powi(3) / k).sqrt()
    }
}

/// Inertial position and velocity of an orbiting body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    pub position_km: Vector3,
    pub velocity_km_s: Vector3,
}

/// Modified equinoctial elements after Walker, Ireland & Owens (1985).
///
/// Non-singular for circular and equatorial orbits; the `h`/`k` pair is
/// undefined at exactly 180 degrees of inclination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModifiedEquinoctialElements {
    pub p_km: f64,
    pub f: f64,
    pub g: f64,
    pub h: f64,
    pub k: f64,
    pub l_rad: f64,
}

/// Speed of a circular orbit of semi-major axis `a` around an attractor `k`.
#[inline]
pub fn circular_velocity(k: f64, a: f64) -> f64 {
    (k / a).sqrt()
}

/// Eccentricity vector, pointing from the focus toward periapsis.
pub fn eccentricity_vector(k: f64, r: &Vector3, v: &Vector3) -> Vector3 {
    let lhs = scale(r, dot(v, v) - k / norm(r));
    let rhs = scale(v, dot(r, v));
    scale(&sub(&lhs, &rhs), 1.0 / k)
}

/// Position and velocity in the perifocal (PQW) frame from the conic equation.
///
/// Undefined where `1 + ecc * cos(nu) = 0` (the hyperbolic asymptote); the
/// caller is responsible for keeping `nu` on the reachable arc.
pub fn rv_pqw(k: f64, p: f64, ecc: f64, nu: f64) -> (Vector3, Vector3) {
    let (sin_nu, cos_nu) = nu.sin_cos();
    let r_mag = p / (1.0 + ecc * cos_nu);
    let v_scale = (k / p).sqrt();
    (
        [r_mag * cos_nu, r_mag * sin_nu, 0.0],
        [-v_scale * sin_nu, v_scale * (ecc + cos_nu), 0.0],
    )
}

/// Perifocal-to-inertial rotation from the 3-1-3 Euler sequence
/// `R3(raan) R1(inc) R3(argp)`.
pub fn coe_rotation_matrix(inc: f64, raan: f64, argp: f64) -> Matrix3 {
    let r = rotation_matrix(raan, Axis::Z);
    let r = mat_mul(&r, &rotation_matrix(inc, Axis::X));
    mat_mul(&r, &rotation_matrix(argp, Axis::Z))
}

/// Classical elements to inertial state vector.
pub fn coe2rv(k: f64, coe: &ClassicalElements) -> StateVector {
    let (r_pqw, v_pqw) = rv_pqw(k, coe.p_km, coe.ecc, coe.nu_rad);
    let rm = coe_rotation_matrix(coe.inc_rad, coe.raan_rad, coe.argp_rad);
    StateVector {
        position_km: mat_vec(&rm, &r_pqw),
        velocity_km_s: mat_vec(&rm, &v_pqw),
    }
}

/// [`coe2rv`] applied independently across a batch of orbits.
///
/// Slots are fully independent, so the map runs data-parallel over the batch.
pub fn coe2rv_many(ks: &[f64], orbits: &[ClassicalElements]) -> Vec<StateVector> {
    assert_eq!(ks.len(), orbits.len());
    ks.par_iter()
        .zip(orbits.par_iter())
        .map(|(k, coe)| coe2rv(*k, coe))
        .collect()
}

/// Degenerate-geometry classification used by [`rv2coe`].
///
/// The caller-supplied tolerance is compared against the eccentricity and the
/// inclination separately; it is the single knob deciding which closed-form
/// branch applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbitGeometry {
    /// inc within tolerance of zero, ecc above tolerance.
    EquatorialNonCircular,
    /// ecc within tolerance of zero, inc above tolerance.
    CircularInclined,
    /// Both within tolerance.
    CircularEquatorial,
    /// Neither degenerate.
    General,
}

/// Classify an orbit's degenerate geometry against `tol`.
pub fn classify_geometry(ecc: f64, inc: f64, tol: f64) -> OrbitGeometry {
    let circular = ecc < tol;
    let equatorial = inc.abs() < tol;
    match (circular, equatorial) {
        (false, true) => OrbitGeometry::EquatorialNonCircular,
        (true, false) => OrbitGeometry::CircularInclined,
        (true, true) => OrbitGeometry::CircularEquatorial,
        (false, false) => OrbitGeometry::General,
    }
}

/// Inertial state vector to classical elements.
///
/// Degenerate geometries collapse `raan`/`argp` to zero by convention and fold
/// the missing angle into the returned anomaly (longitude of periapsis,
/// argument of latitude, or true longitude). The exactly parabolic input
/// `ecc = 1` is not treated specially and will produce a non-finite semi-major
/// axis in the general branch; callers avoid it.
pub fn rv2coe(k: f64, r: &Vector3, v: &Vector3, tol: f64) -> ClassicalElements {
    let h = cross(r, v);
    let n = cross(&[0.0, 0.0, 1.0], &h);
    let e = eccentricity_vector(k, r, v);
    let ecc = norm(&e);
    let p = dot(&h, &h) / k;
    let inc = (h[2] / norm(&h)).acos();

    let (raan, argp, nu) = match classify_geometry(ecc, inc, tol) {
        OrbitGeometry::EquatorialNonCircular => {
            // Longitude of periapsis stands in for raan + argp.
            let argp = e[1].atan2(e[0]).rem_euclid(TAU);
            let nu = (dot(&h, &cross(&e, r)) / norm(&h)).atan2(dot(r, &e));
            (0.0, argp, nu)
        }
        OrbitGeometry::CircularInclined => {
            let raan = n[1].atan2(n[0]).rem_euclid(TAU);
            // Argument of latitude
            let nu = (dot(r, &cross(&h, &n)) / norm(&h)).atan2(dot(r, &n));
            (raan, 0.0, nu)
        }
        OrbitGeometry::CircularEquatorial => {
            // True longitude
            let nu = r[1].atan2(r[0]).rem_euclid(TAU);
            (0.0, 0.0, nu)
        }
        OrbitGeometry::General => {
            let a = p / (1.0 - ecc * ecc);
            let ka = k * a;
            let nu = if a > 0.0 {
                let e_se = dot(r, v) / ka.sqrt();
                let e_ce = norm(r) * dot(v, v) / k - 1.0;
                eccentric_to_true(e_se.atan2(e_ce), ecc)
            } else {
                let e_sh = dot(r, v) / (-ka).sqrt();
                let e_ch = norm(r) * dot(v, v) / k - 1.0;
                hyperbolic_to_true(((e_ch + e_sh) / (e_ch - e_sh)).ln() / 2.0, ecc)
            };
            let raan = n[1].atan2(n[0]).rem_euclid(TAU);
            let px = dot(r, &n);
            let py = dot(r, &cross(&h, &n)) / norm(&h);
            let argp = (py.atan2(px) - nu).rem_euclid(TAU);
            (raan, argp, nu)
        }
    };

    ClassicalElements {
        p_km: p,
        ecc,
        inc_rad: inc,
        raan_rad: raan,
        argp_rad: argp,
        nu_rad: wrap_anomaly(nu),
    }
}

/// Classical elements to modified equinoctial elements.
///
/// Fails for an inclination of exactly 180 degrees, where the retrograde
/// factor would be needed to keep `h` and `k` finite.
pub fn coe2mee(coe: &ClassicalElements) -> Result<ModifiedEquinoctialElements, ElementsError> {
    if coe.inc_rad == PI {
        return Err(ElementsError::EquinoctialSingularity);
    }
    let lonper = coe.raan_rad + coe.argp_rad;
    let half_inc_tan = (coe.inc_rad / 2.0).tan();
    Ok(ModifiedEquinoctialElements {
        p_km: coe.p_km,
        f: coe.ecc * lonper.cos(),
        g: coe.ecc * lonper.sin(),
        h: half_inc_tan * coe.raan_rad.cos(),
        k: half_inc_tan * coe.raan_rad.sin(),
        l_rad: lonper + coe.nu_rad,
    })
}

/// Modified equinoctial elements back to classical elements.
///
/// Total inverse: `atan2` is well defined at (0, 0), so no input is rejected.
pub fn mee2coe(mee: &ModifiedEquinoctialElements) -> ClassicalElements {
    let ecc = (mee.f * mee.f + mee.g * mee.g).sqrt();
    let inc = 2.0 * (mee.h * mee.h + mee.k * mee.k).sqrt().atan();
    let lonper = mee.g.atan2(mee.f);
    let raan = mee.k.atan2(mee.h).rem_euclid(TAU);
    ClassicalElements {
        p_km: mee.p_km,
        ecc,
        inc_rad: inc,
        raan_rad: raan,
        argp_rad: (lonper - raan).rem_euclid(TAU),
        nu_rad: (mee.l_rad - lonper).rem_euclid(TAU),
    }
}

/// Inertial state vector directly from modified equinoctial elements, without
/// passing back through the classical set.
///
/// Implements equations 3a/3b of the JPL modified-equinoctial note; `k` is the
/// gravitational parameter of the attractor.
pub fn mee2rv(k: f64, mee: &ModifiedEquinoctialElements) -> StateVector {
    let ModifiedEquinoctialElements {
        p_km: p,
        f,
        g,
        h,
        k: k_e,
        l_rad: l,
    } = *mee;

    let (sin_l, cos_l) = l.sin_cos();
    let w = 1.0 + f * cos_l + g * sin_l;
    let r = p / w;
    let s2 = 1.0 + h * h + k_e * k_e;
    let alpha2 = h * h - k_e * k_e;
    let v_scale = (k / p).sqrt();

    let position_km = [
        (r / s2) * (cos_l + alpha2 * cos_l + 2.0 * h * k_e * sin_l),
        (r / s2) * (sin_l - alpha2 * sin_l + 2.0 * h * k_e * cos_l),
        (2.0 * r / s2) * (h * sin_l - k_e * cos_l),
    ];
    let velocity_km_s = [
        (-1.0 / s2)
            * v_scale
            * (sin_l + alpha2 * sin_l - 2.0 * h * k_e * cos_l + g - 2.0 * f * h * k_e + alpha2 * g),
        (-1.0 / s2)
            * v_scale
            * (-cos_l + alpha2 * cos_l + 2.0 * h * k_e * sin_l - f
                + 2.0 * g * h * k_e
                + alpha2 * f),
        (2.0 / s2) * v_scale * (h * cos_l + k_e * sin_l + f * h + g * k_e),
    ];

    StateVector {
        position_km,
        velocity_km_s,
    }
}
