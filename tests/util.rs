use std::f64::consts::TAU;

use twobody_toolkit::core::linalg::{Matrix3, mat_mul, mat_vec, norm, sub};
use twobody_toolkit::core::util::{Axis, alinspace, rotation_matrix};
use twobody_toolkit::elements::coe_rotation_matrix;

/// 3-1-3 Euler matrix expanded term by term (Vallado, eq. 3-31 transposed for
/// the perifocal-to-inertial direction).
fn euler_313(raan: f64, inc: f64, argp: f64) -> Matrix3 {
    let (so, co) = raan.sin_cos();
    let (si, ci) = inc.sin_cos();
    let (sw, cw) = argp.sin_cos();
    [
        [
            co * cw - so * sw * ci,
            -co * sw - so * cw * ci,
            so * si,
        ],
        [
            so * cw + co * sw * ci,
            -so * sw + co * cw * ci,
            -co * si,
        ],
        [sw * si, cw * si, ci],
    ]
}

#[test]
fn composed_rotations_match_explicit_euler_sequence() {
    let cases = [
        (0.3, 0.7, 1.1),
        (4.0, 2.9, 5.5),
        (-1.2, 0.01, 0.0),
        (227.89_f64.to_radians(), 87.87_f64.to_radians(), 53.38_f64.to_radians()),
    ];
    for (raan, inc, argp) in cases {
        let composed = coe_rotation_matrix(inc, raan, argp);
        let explicit = euler_313(raan, inc, argp);
        for i in 0..3 {
            for j in 0..3 {
                assert!(
                    (composed[i][j] - explicit[i][j]).abs() < 1e-12,
                    "({raan}, {inc}, {argp}) mismatch at ({i},{j})"
                );
            }
        }
    }
}

#[test]
fn rotation_composition_is_orthonormal() {
    let rm = coe_rotation_matrix(1.1, 0.4, 2.2);
    let elem = mat_mul(
        &rotation_matrix(0.4, Axis::Z),
        &mat_mul(&rotation_matrix(1.1, Axis::X), &rotation_matrix(2.2, Axis::Z)),
    );
    for i in 0..3 {
        let diff = sub(&rm[i], &elem[i]);
        assert!(norm(&diff) < 1e-13);
    }
    // Columns stay unit length under the map.
    for basis in [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]] {
        assert!((norm(&mat_vec(&rm, &basis)) - 1.0).abs() < 1e-13);
    }
}

#[test]
fn alinspace_is_always_non_decreasing() {
    let bounds = [-TAU, -3.0, -0.5, 0.0, 0.5, 3.0, TAU];
    for &start in &bounds {
        for stop in bounds.iter().map(|&b| Some(b)).chain([None]) {
            let vals = alinspace(start, stop, 50, true);
            assert!(
                vals.windows(2).all(|w| w[1] >= w[0]),
                "decreasing sequence for start = {start}, stop = {stop:?}"
            );
        }
    }
}

#[test]
fn alinspace_without_stop_spans_a_full_turn() {
    for start in [-3.0, 0.0, 1.0, 6.0] {
        let vals = alinspace(start, None, 64, true);
        let span = vals.last().unwrap() - vals.first().unwrap();
        assert!((span - TAU).abs() < 1e-12, "span {span} for start {start}");
    }
}
