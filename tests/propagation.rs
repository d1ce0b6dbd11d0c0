use approx::assert_relative_eq;

use twobody_toolkit::core::constants::GM_EARTH_KM3_S2;
use twobody_toolkit::core::linalg::norm;
use twobody_toolkit::elements::{ClassicalElements, StateVector, coe2rv};
use twobody_toolkit::propagation::{
    KeplerSolver, PropagationError, farnocchia::farnocchia_rv, propagate_many,
    vallado::vallado_rv,
};

/// ISS-like orbit: a ~ 6772 km, nearly circular, 51.6 degrees of inclination.
fn iss_like() -> ClassicalElements {
    let a = 6772.0;
    let ecc = 0.0006;
    ClassicalElements {
        p_km: a * (1.0 - ecc * ecc),
        ecc,
        inc_rad: 51.6_f64.to_radians(),
        raan_rad: 1.0,
        argp_rad: 0.7,
        nu_rad: 0.3,
    }
}

#[test]
fn every_solver_returns_to_the_start_after_one_period() {
    let coe = iss_like();
    let period = coe.period_s(GM_EARTH_KM3_S2);
    for solver in [
        KeplerSolver::Farnocchia,
        KeplerSolver::Danby,
        KeplerSolver::Markley,
        KeplerSolver::Mikkola,
        KeplerSolver::Gooding,
    ] {
        let nu = solver.solve(GM_EARTH_KM3_S2, &coe, period).unwrap();
        assert_relative_eq!(nu, coe.nu_rad, epsilon = 1e-6, max_relative = 1e-6);
    }
}

#[test]
fn half_period_lands_opposite_periapsis_offset() {
    // Sanity beyond periodicity: after half a period from periapsis a
    // nearly circular orbit sits near apoapsis.
    let coe = ClassicalElements {
        nu_rad: 0.0,
        ..iss_like()
    };
    let period = coe.period_s(GM_EARTH_KM3_S2);
    for solver in [KeplerSolver::Farnocchia, KeplerSolver::Danby, KeplerSolver::Markley] {
        let nu = solver.solve(GM_EARTH_KM3_S2, &coe, period / 2.0).unwrap();
        assert_relative_eq!(nu.abs(), std::f64::consts::PI, epsilon = 5e-3);
    }
}

#[test]
fn hyperbolic_flyby_advances_monotonically() {
    let coe = ClassicalElements {
        p_km: 25_000.0,
        ecc: 2.0,
        inc_rad: 0.5,
        raan_rad: 0.1,
        argp_rad: 0.2,
        nu_rad: -0.5,
    };
    let mut previous = coe.nu_rad;
    for solver in [KeplerSolver::Farnocchia, KeplerSolver::Danby, KeplerSolver::Mikkola] {
        let nu = solver.solve(GM_EARTH_KM3_S2, &coe, 900.0).unwrap();
        assert!(nu.is_finite());
        assert!(nu > coe.nu_rad, "{}: {nu}", solver.name());
    }
    // Increasing elapsed time keeps increasing the anomaly toward the asymptote.
    for tof in [300.0, 900.0, 2700.0, 8100.0] {
        let nu = KeplerSolver::Farnocchia
            .solve(GM_EARTH_KM3_S2, &coe, tof)
            .unwrap();
        assert!(nu > previous);
        assert!(nu < (-1.0 / coe.ecc).acos());
        previous = nu;
    }
}

#[test]
fn universal_variable_agrees_with_mean_anomaly_propagation() {
    let state = StateVector {
        position_km: [7000.0, 0.0, 200.0],
        velocity_km_s: [0.1, 7.8, 0.5],
    };
    for tof in [120.0, 1800.0, 5400.0] {
        let via_vallado = vallado_rv(GM_EARTH_KM3_S2, &state, tof, 350).unwrap();
        let via_farnocchia = farnocchia_rv(GM_EARTH_KM3_S2, &state, tof, 1e-8).unwrap();
        let dr = norm(&[
            via_vallado.position_km[0] - via_farnocchia.position_km[0],
            via_vallado.position_km[1] - via_farnocchia.position_km[1],
            via_vallado.position_km[2] - via_farnocchia.position_km[2],
        ]);
        assert!(dr < 1e-3, "tof = {tof}: position gap {dr} km");
    }
}

#[test]
fn state_vector_propagation_is_periodic() {
    let coe = iss_like();
    let state = coe2rv(GM_EARTH_KM3_S2, &coe);
    let period = coe.period_s(GM_EARTH_KM3_S2);
    let out = farnocchia_rv(GM_EARTH_KM3_S2, &state, period, 1e-8).unwrap();
    for i in 0..3 {
        assert_relative_eq!(
            out.position_km[i],
            state.position_km[i],
            epsilon = 1e-2,
            max_relative = 1e-5
        );
    }
}

#[test]
fn batch_failures_stay_in_their_slot() {
    let good = iss_like();
    let hyperbolic = ClassicalElements {
        p_km: 25_000.0,
        ecc: 1.3,
        inc_rad: 0.0,
        raan_rad: 0.0,
        argp_rad: 0.0,
        nu_rad: 0.0,
    };
    let orbits = [good, hyperbolic, good];
    let ks = [GM_EARTH_KM3_S2; 3];
    let tofs = [600.0; 3];
    // Gooding refuses hyperbolic input; its slot fails alone.
    let results = propagate_many(KeplerSolver::Gooding, &ks, &orbits, &tofs);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(PropagationError::UnsupportedRegime { .. })
    ));
    assert!(results[2].is_ok());

    // The regime-complete solver handles every slot.
    let results = propagate_many(KeplerSolver::Farnocchia, &ks, &orbits, &tofs);
    assert!(results.iter().all(|r| r.is_ok()));
}

#[test]
fn near_circular_boundary_needs_no_caller_special_casing() {
    let coe = ClassicalElements {
        p_km: 7000.0,
        ecc: 0.0,
        inc_rad: 0.9,
        raan_rad: 0.0,
        argp_rad: 0.0,
        nu_rad: 1.0,
    };
    let period = coe.period_s(GM_EARTH_KM3_S2);
    for solver in [
        KeplerSolver::Farnocchia,
        KeplerSolver::Danby,
        KeplerSolver::Markley,
        KeplerSolver::Mikkola,
        KeplerSolver::Gooding,
    ] {
        let nu = solver.solve(GM_EARTH_KM3_S2, &coe, period).unwrap();
        assert_relative_eq!(nu, 1.0, epsilon = 1e-7, max_relative = 1e-7);
    }
}
