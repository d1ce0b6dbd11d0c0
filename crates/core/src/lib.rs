//! Core constants, vector/matrix helpers, and angle utilities shared across the workspace.

/// Gravitational parameters expressed in km^3/s^2.
pub mod constants {
    /// Standard gravitational parameter of the Earth (km^3/s^2).
    pub const GM_EARTH_KM3_S2: f64 = 398_600.4418;
    /// Standard gravitational parameter of the Sun (km^3/s^2).
    pub const GM_SUN_KM3_S2: f64 = 1.327_124_400_18e11;
    /// Standard gravitational parameter of Mars (km^3/s^2).
    pub const GM_MARS_KM3_S2: f64 = 42_828.372;
}

/// Minimal vector and matrix helpers to avoid ad-hoc `[f64; 3]` math everywhere.
pub mod linalg {
    /// Alias for a 3D vector in kilometres or km/s depending on context.
    pub type Vector3 = [f64; 3];

    /// Alias for a row-major 3x3 matrix.
    pub type Matrix3 = [[f64; 3]; 3];

    /// Euclidean norm of a vector.
    #[inline]
    pub fn norm(v: &Vector3) -> f64 {
        dot(v, v).sqrt()
    }

    /// Dot product of two vectors.
    #[inline]
    pub fn dot(a: &Vector3, b: &Vector3) -> f64 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    /// Cross product of two vectors.
    #[inline]
    pub fn cross(a: &Vector3, b: &Vector3) -> Vector3 {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    /// Vector addition.
    #[inline]
    pub fn add(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
    }

    /// Vector subtraction.
    #[inline]
    pub fn sub(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    /// Scale a vector by a scalar.
    #[inline]
    pub fn scale(v: &Vector3, s: f64) -> Vector3 {
        [v[0] * s, v[1] * s, v[2] * s]
    }

    /// Matrix-vector product.
    #[inline]
    pub fn mat_vec(m: &Matrix3, v: &Vector3) -> Vector3 {
        [dot(&m[0], v), dot(&m[1], v), dot(&m[2], v)]
    }

    /// Matrix-matrix product.
    pub fn mat_mul(a: &Matrix3, b: &Matrix3) -> Matrix3 {
        let mut out = [[0.0; 3]; 3];
        for (i, row) in a.iter().enumerate() {
            for j in 0..3 {
                out[i][j] = row[0] * b[0][j] + row[1] * b[1][j] + row[2] * b[2][j];
            }
        }
        out
    }

    /// Matrix transpose.
    pub fn transpose(m: &Matrix3) -> Matrix3 {
        [
            [m[0][0], m[1][0], m[2][0]],
            [m[0][1], m[1][1], m[2][1]],
            [m[0][2], m[1][2], m[2][2]],
        ]
    }
}

/// Rotations, spherical conversions, and angle-range utilities.
pub mod util {
    use super::linalg::{Matrix3, Vector3, norm};
    use std::f64::consts::{PI, TAU};

    /// Principal rotation axis.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Axis {
        X,
        Y,
        Z,
    }

    /// Right-handed rotation matrix by `angle` radians about a principal axis.
    ///
    /// Applying the returned matrix to a column vector rotates it counterclockwise
    /// when looking down the axis toward the origin.
    pub fn rotation_matrix(angle: f64, axis: Axis) -> Matrix3 {
        let (s, c) = angle.sin_cos();
        match axis {
            Axis::X => [[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]],
            Axis::Y => [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]],
            Axis::Z => [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Convert a `(norm, theta, phi)` triple to Cartesian coordinates.
    ///
    /// `theta` is the polar angle measured from the +z axis, `phi` the azimuth
    /// in the x-y plane. The domain is unrestricted.
    pub fn spherical_to_cartesian(v: &Vector3) -> Vector3 {
        let (r, theta, phi) = (v[0], v[1], v[2]);
        [
            r * theta.sin() * phi.cos(),
            r * theta.sin() * phi.sin(),
            r * theta.cos(),
        ]
    }

    /// Inverse of [`spherical_to_cartesian`].
    pub fn cartesian_to_spherical(v: &Vector3) -> Vector3 {
        let r = norm(v);
        [r, (v[2] / r).acos(), v[1].atan2(v[0])]
    }

    /// Batched [`spherical_to_cartesian`].
    pub fn spherical_to_cartesian_many(vs: &[Vector3]) -> Vec<Vector3> {
        vs.iter().map(spherical_to_cartesian).collect()
    }

    /// Batched [`cartesian_to_spherical`].
    pub fn cartesian_to_spherical_many(vs: &[Vector3]) -> Vec<Vector3> {
        vs.iter().map(cartesian_to_spherical).collect()
    }

    /// Evenly spaced, non-decreasing angular values over `[start, stop]`.
    ///
    /// When `stop` is `None` the range spans one full turn; a `stop` at or below
    /// `start` is lifted by whole turns so the result never decreases.
    pub fn alinspace(start: f64, stop: Option<f64>, num: usize, endpoint: bool) -> Vec<f64> {
        let stop = match stop {
            Some(s) if s > start => s,
            // Lift by as many turns as needed so the range never decreases.
            Some(s) => s + (((start - s) / TAU).floor() + 1.0) * TAU,
            None => start + TAU,
        };
        if num == 0 {
            return Vec::new();
        }
        if num == 1 {
            return vec![start];
        }
        let div = if endpoint { num - 1 } else { num };
        let step = (stop - start) / div as f64;
        (0..num).map(|i| start + step * i as f64).collect()
    }

    /// Wrap an anomaly to the canonical interval around zero.
    #[inline]
    pub fn wrap_anomaly(nu: f64) -> f64 {
        (nu + PI).rem_euclid(TAU) - PI
    }

    /// Sign of `x` as -1, 0, or +1, with zero mapped to zero.
    #[inline]
    pub fn sign(x: f64) -> f64 {
        if x > 0.0 {
            1.0
        } else if x < 0.0 {
            -1.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::linalg::*;
    use super::util::*;
    use std::f64::consts::{PI, TAU};

    fn assert_mat_close(a: &Matrix3, b: &Matrix3, tol: f64) {
        for i in 0..3 {
            for j in 0..3 {
                assert!(
                    (a[i][j] - b[i][j]).abs() < tol,
                    "mismatch at ({i},{j}): {} vs {}",
                    a[i][j],
                    b[i][j]
                );
            }
        }
    }

    #[test]
    fn rotation_matrix_reference_values() {
        assert_mat_close(
            &rotation_matrix(0.0, Axis::X),
            &[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            1e-15,
        );
        assert_mat_close(
            &rotation_matrix((-90.0_f64).to_radians(), Axis::Y),
            &[[0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]],
            1e-12,
        );
        assert_mat_close(
            &rotation_matrix(90.0_f64.to_radians(), Axis::Z),
            &[[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            1e-12,
        );
    }

    #[test]
    fn rotation_preserves_norm() {
        let v = [-0.30387748, -1.4202498, 0.24305655];
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            let rotated = mat_vec(&rotation_matrix(0.5, axis), &v);
            assert!((norm(&rotated) - norm(&v)).abs() < 1e-12);
        }
    }

    #[test]
    fn spherical_reference_values() {
        let cases = [
            ([0.5, PI / 4.0, -PI / 4.0], [0.25, -0.25, 0.35355339]),
            ([0.5, -PI / 4.0, PI / 4.0], [-0.25, -0.25, 0.35355339]),
            (
                [2.60564963, 1.75305207, 4.4458828],
                [-0.674864797187, -2.472029259161, -0.472269863940],
            ),
        ];
        for (sph, car) in cases {
            let result = spherical_to_cartesian(&sph);
            for i in 0..3 {
                assert!((result[i] - car[i]).abs() < 1e-8, "{result:?} vs {car:?}");
            }
            let back = spherical_to_cartesian(&cartesian_to_spherical(&car));
            for i in 0..3 {
                assert!((back[i] - car[i]).abs() < 1e-8);
            }
        }
    }

    #[test]
    fn alinspace_defaults_to_full_turn() {
        let vals = alinspace(1.0, None, 50, true);
        assert_eq!(vals.len(), 50);
        assert!((vals[0] - 1.0).abs() < 1e-15);
        assert!((vals[49] - (1.0 + TAU)).abs() < 1e-12);
        assert!(vals.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn alinspace_lifts_descending_stop() {
        let vals = alinspace(2.0, Some(1.0), 10, true);
        assert!(vals.windows(2).all(|w| w[1] >= w[0]));
        assert!((vals[9] - (1.0 + TAU)).abs() < 1e-12);
    }

    #[test]
    fn wrap_anomaly_interval() {
        assert!((wrap_anomaly(3.0 * PI) - (-PI)).abs() < 1e-12 || wrap_anomaly(3.0 * PI) < PI);
        assert!((wrap_anomaly(0.5) - 0.5).abs() < 1e-15);
        assert!((wrap_anomaly(TAU + 0.5) - 0.5).abs() < 1e-12);
        let w = wrap_anomaly(-PI - 0.1);
        assert!((-PI..PI).contains(&w));
    }

    #[test]
    fn cross_follows_right_hand_rule() {
        let x = [1.0, 0.0, 0.0];
        let y = [0.0, 1.0, 0.0];
        assert_eq!(cross(&x, &y), [0.0, 0.0, 1.0]);
        assert_eq!(cross(&y, &x), [0.0, 0.0, -1.0]);
    }
}
