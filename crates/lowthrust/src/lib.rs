//! Closed-form low-thrust guidance laws.
//!
//! Each law freezes its geometry from the initial orbit and yields a thrust
//! acceleration as a function of time and instantaneous state, plus the
//! aggregate delta-v and time of flight predicted by the underlying model.
//! The laws are guidance only; integrating the perturbed trajectory is the
//! caller's concern.
//!
//! References: Pollard, "Simplified Approach for Assessment of Low-Thrust
//! Elliptical Orbit Transfers" (1997); Pollard, "Simplified Analysis of
//! Low-Thrust Orbital Maneuvers" (2000); Edelbaum's circle-to-circle transfer.

use std::f64::consts::FRAC_PI_2;

use serde::Serialize;
use thiserror::Error;

use twobody_core::linalg::{Vector3, add, cross, norm, scale};
use twobody_core::util::sign;
use twobody_elements::{circular_velocity, eccentricity_vector, rv2coe};

/// Eccentricity below which the periapsis direction is considered undefined
/// and the position vector is used as the in-plane reference instead.
const ECC_REFERENCE_TOLERANCE: f64 = 0.001;

/// Degenerate-geometry tolerance used when a law recovers elements in flight.
const GEOMETRY_TOLERANCE: f64 = 1e-8;

/// Rejected guidance inputs.
#[derive(Debug, Error)]
pub enum GuidanceError {
    #[error("eccentricity {0} is outside the [0, 1) range supported by the guidance law")]
    EccentricityOutOfRange(f64),
    #[error("thrust acceleration must be positive, got {0}")]
    NonPositiveThrust(f64),
}

/// Thrust acceleration as a function of elapsed time and instantaneous state.
pub trait GuidanceLaw {
    /// Acceleration vector in km/s^2 for time `t` seconds after activation.
    fn acceleration(&self, t: f64, r: &Vector3, v: &Vector3) -> Vector3;
}

/// Aggregate cost of a guidance law.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GuidanceSummary {
    pub delta_v_km_s: f64,
    pub t_f_s: f64,
}

/// Inertially fixed thrust direction (eccentricity-only change).
#[derive(Debug, Clone, Copy)]
pub struct FixedDirectionThrust {
    pub thrust_unit: Vector3,
    pub accel_km_s2: f64,
}

impl GuidanceLaw for FixedDirectionThrust {
    fn acceleration(&self, _t: f64, _r: &Vector3, _v: &Vector3) -> Vector3 {
        scale(&self.thrust_unit, self.accel_km_s2)
    }
}

/// Quasi-optimal eccentricity-only change (Pollard 1997).
///
/// Thrust is aligned with an inertially fixed direction perpendicular to the
/// semi-major axis, frozen from the state `(r, v)` at activation.
pub fn change_ecc_quasioptimal(
    k: f64,
    a: f64,
    ecc_0: f64,
    ecc_f: f64,
    f: f64,
    r: &Vector3,
    v: &Vector3,
) -> Result<(FixedDirectionThrust, GuidanceSummary), GuidanceError> {
    validate_ecc(ecc_0)?;
    validate_ecc(ecc_f)?;
    validate_thrust(f)?;

    let thrust_unit = fixed_thrust_direction(k, ecc_0, ecc_f, r, v);
    let v_0 = circular_velocity(k, a);
    let delta_v = 2.0 / 3.0 * v_0 * (ecc_0.asin() - ecc_f.asin()).abs();

    Ok((
        FixedDirectionThrust {
            thrust_unit,
            accel_km_s2: f,
        },
        GuidanceSummary {
            delta_v_km_s: delta_v,
            t_f_s: delta_v / f,
        },
    ))
}

/// Simultaneous eccentricity and inclination change (Pollard 2000).
///
/// The in-plane component keeps the fixed direction of the eccentricity-only
/// law; the out-of-plane angle `beta` reverses sign at each minor-axis
/// crossing, detected through the instantaneous true anomaly.
#[derive(Debug, Clone, Copy)]
pub struct EccIncThrust {
    pub thrust_unit: Vector3,
    pub beta_0_rad: f64,
    pub accel_km_s2: f64,
    k: f64,
}

impl GuidanceLaw for EccIncThrust {
    fn acceleration(&self, _t: f64, r: &Vector3, v: &Vector3) -> Vector3 {
        let nu = rv2coe(self.k, r, v, GEOMETRY_TOLERANCE).nu_rad;
        let beta = self.beta_0_rad * sign(nu.cos());
        let h = cross(r, v);
        let w_unit = scale(&h, 1.0 / norm(&h));
        let direction = add(
            &scale(&self.thrust_unit, beta.cos()),
            &scale(&w_unit, beta.sin()),
        );
        scale(&direction, self.accel_km_s2)
    }
}

/// Out-of-plane angle of the combined eccentricity/inclination law.
///
/// The argument of periapsis drifts during the transfer, but the closed form
/// still gives a good estimate of the required thrust angle.
pub fn beta_change_ecc_inc(ecc_0: f64, ecc_f: f64, inc_0: f64, inc_f: f64, argp: f64) -> f64 {
    (3.0 * std::f64::consts::PI * (inc_f - inc_0)
        / (4.0
            * argp.cos()
            * (ecc_0 - ecc_f
                + ((1.0 + ecc_f) * (-1.0 + ecc_0) / ((1.0 + ecc_0) * (-1.0 + ecc_f))).ln())))
    .abs()
    .atan()
}

/// Build the combined eccentricity/inclination law from the activation state.
#[allow(clippy::too_many_arguments)]
pub fn change_ecc_inc(
    k: f64,
    a: f64,
    ecc_0: f64,
    ecc_f: f64,
    inc_0: f64,
    inc_f: f64,
    argp: f64,
    r: &Vector3,
    v: &Vector3,
    f: f64,
) -> Result<(EccIncThrust, GuidanceSummary), GuidanceError> {
    validate_ecc(ecc_0)?;
    validate_ecc(ecc_f)?;
    validate_thrust(f)?;

    let thrust_unit = fixed_thrust_direction(k, ecc_0, ecc_f, r, v);
    let beta_0 = beta_change_ecc_inc(ecc_0, ecc_f, inc_0, inc_f, argp);
    let v_0 = circular_velocity(k, a);
    let delta_v = 2.0 * v_0 * (ecc_0.asin() - ecc_f.asin()).abs() / (3.0 * beta_0.cos());

    Ok((
        EccIncThrust {
            thrust_unit,
            beta_0_rad: beta_0,
            accel_km_s2: f,
            k,
        },
        GuidanceSummary {
            delta_v_km_s: delta_v,
            t_f_s: delta_v / f,
        },
    ))
}

/// Combined semi-major-axis and inclination change (Edelbaum).
///
/// Thrust stays in the velocity/out-of-plane frame with a yaw angle that
/// evolves as the transfer progresses and flips sign with the out-of-plane
/// position.
#[derive(Debug, Clone, Copy)]
pub struct AIncThrust {
    pub v_0_km_s: f64,
    pub beta_0_rad: f64,
    pub accel_km_s2: f64,
}

impl GuidanceLaw for AIncThrust {
    fn acceleration(&self, t: f64, r: &Vector3, v: &Vector3) -> Vector3 {
        let beta = beta_change_a_inc(t, self.v_0_km_s, self.accel_km_s2, self.beta_0_rad)
            * sign(r[0] * v[2] - r[2] * v[0]);
        let t_unit = scale(v, 1.0 / norm(v));
        let h = cross(r, v);
        let w_unit = scale(&h, 1.0 / norm(&h));
        let direction = add(&scale(&t_unit, beta.cos()), &scale(&w_unit, beta.sin()));
        scale(&direction, self.accel_km_s2)
    }
}

/// Initial yaw angle of the Edelbaum transfer.
pub fn beta_0_change_a_inc(v_0: f64, v_f: f64, inc_0: f64, inc_f: f64) -> f64 {
    let delta_i = (inc_f - inc_0).abs();
    (FRAC_PI_2 * delta_i)
        .sin()
        .atan2(v_0 / v_f - (FRAC_PI_2 * delta_i).cos())
}

/// Yaw angle as a function of time along the Edelbaum transfer.
pub fn beta_change_a_inc(t: f64, v_0: f64, f: f64, beta_0: f64) -> f64 {
    (v_0 * beta_0.sin()).atan2(v_0 * beta_0.cos() - f * t)
}

/// Total velocity increment of the Edelbaum transfer.
pub fn delta_v_change_a_inc(v_0: f64, v_f: f64, beta_0: f64, inc_0: f64, inc_f: f64) -> f64 {
    let delta_i = (inc_f - inc_0).abs();
    if delta_i == 0.0 {
        return (v_f - v_0).abs();
    }
    v_0 * beta_0.cos() - v_0 * beta_0.sin() / (FRAC_PI_2 * delta_i + beta_0).tan()
}

/// Build the Edelbaum law for a circle-to-circle transfer.
pub fn change_a_inc(
    k: f64,
    a_0: f64,
    a_f: f64,
    inc_0: f64,
    inc_f: f64,
    f: f64,
) -> Result<(AIncThrust, GuidanceSummary), GuidanceError> {
    validate_thrust(f)?;

    let v_0 = circular_velocity(k, a_0);
    let v_f = circular_velocity(k, a_f);
    let beta_0 = beta_0_change_a_inc(v_0, v_f, inc_0, inc_f);
    let delta_v = delta_v_change_a_inc(v_0, v_f, beta_0, inc_0, inc_f);

    Ok((
        AIncThrust {
            v_0_km_s: v_0,
            beta_0_rad: beta_0,
            accel_km_s2: f,
        },
        GuidanceSummary {
            delta_v_km_s: delta_v,
            t_f_s: delta_v / f,
        },
    ))
}

/// Inertially fixed thrust unit vector `sign(ecc_f - ecc_0) * (h_unit x ref)`.
///
/// The reference is the periapsis direction, falling back to the position
/// direction when the orbit is too close to circular to define one.
fn fixed_thrust_direction(k: f64, ecc_0: f64, ecc_f: f64, r: &Vector3, v: &Vector3) -> Vector3 {
    let ref_vec = if ecc_0 > ECC_REFERENCE_TOLERANCE {
        scale(&eccentricity_vector(k, r, v), 1.0 / ecc_0)
    } else {
        scale(r, 1.0 / norm(r))
    };
    let h = cross(r, v);
    let h_unit = scale(&h, 1.0 / norm(&h));
    scale(&cross(&h_unit, &ref_vec), sign(ecc_f - ecc_0))
}

fn validate_ecc(ecc: f64) -> Result<(), GuidanceError> {
    if !(0.0..1.0).contains(&ecc) {
        return Err(GuidanceError::EccentricityOutOfRange(ecc));
    }
    Ok(())
}

fn validate_thrust(f: f64) -> Result<(), GuidanceError> {
    if f <= 0.0 {
        return Err(GuidanceError::NonPositiveThrust(f));
    }
    Ok(())
}
