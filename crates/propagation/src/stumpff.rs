//! Stumpff functions c2 and c3.
//!
//! Closed trigonometric/hyperbolic forms away from zero, with a series
//! fallback on the band |psi| <= 1 where both closed forms cancel
//! catastrophically. The series are summed until they stop changing the
//! accumulator, so the switchover is seamless at the band edges.

/// Band half-width inside which the series evaluation is used.
const SERIES_BAND: f64 = 1.0;

/// Stumpff function `c2(psi) = (1 - cos(sqrt(psi))) / psi`, continued to
/// negative and small arguments.
pub fn c2(psi: f64) -> f64 {
    if psi > SERIES_BAND {
        (1.0 - psi.sqrt().cos()) / psi
    } else if psi < -SERIES_BAND {
        ((-psi).sqrt().cosh() - 1.0) / (-psi)
    } else {
        // sum_k (-psi)^k / (2k + 2)!
        let mut res = 0.0;
        let mut term = 0.5;
        let mut k = 0u32;
        while res + term != res {
            res += term;
            term *= -psi / f64::from((2 * k + 3) * (2 * k + 4));
            k += 1;
        }
        res
    }
}

/// Stumpff function `c3(psi) = (sqrt(psi) - sin(sqrt(psi))) / sqrt(psi^3)`,
/// continued to negative and small arguments.
pub fn c3(psi: f64) -> f64 {
    if psi > SERIES_BAND {
        let sqrt_psi = psi.sqrt();
        (sqrt_psi - sqrt_psi.sin()) / (psi * sqrt_psi)
    } else if psi < -SERIES_BAND {
        let sqrt_neg = (-psi).sqrt();
        (sqrt_neg.sinh() - sqrt_neg) / (-psi * sqrt_neg)
    } else {
        // sum_k (-psi)^k / (2k + 3)!
        let mut res = 0.0;
        let mut term = 1.0 / 6.0;
        let mut k = 0u32;
        while res + term != res {
            res += term;
            term *= -psi / f64::from((2 * k + 4) * (2 * k + 5));
            k += 1;
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_at_zero() {
        assert!((c2(0.0) - 0.5).abs() < 1e-15);
        assert!((c3(0.0) - 1.0 / 6.0).abs() < 1e-15);
    }

    #[test]
    fn series_meets_closed_form_at_band_edges() {
        for psi in [0.999, 1.001, -0.999, -1.001] {
            let c2_series = {
                let mut res = 0.0;
                let mut term = 0.5;
                let mut k = 0u32;
                while res + term != res {
                    res += term;
                    term *= -psi / f64::from((2 * k + 3) * (2 * k + 4));
                    k += 1;
                }
                res
            };
            assert!(
                (c2(psi) - c2_series).abs() < 1e-14,
                "c2 discontinuity at psi = {psi}"
            );
        }
    }

    #[test]
    fn closed_forms_for_large_arguments() {
        let psi = 4.0;
        assert!((c2(psi) - (1.0 - 2.0_f64.cos()) / 4.0).abs() < 1e-15);
        assert!((c3(psi) - (2.0 - 2.0_f64.sin()) / 8.0).abs() < 1e-15);

        let psi = -4.0;
        assert!((c2(psi) - (2.0_f64.cosh() - 1.0) / 4.0).abs() < 1e-15);
        assert!((c3(psi) - (2.0_f64.sinh() - 2.0) / 8.0).abs() < 1e-15);
    }
}
