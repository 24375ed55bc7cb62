use std::f64::consts::PI;

use roots::{find_root_newton_raphson, SimpleConvergency};

use crate::{cometfit_errors::CometfitError, constants::DPI, constants::Radian};

/// Principal value of an angle in radians, in [0, 2π).
pub(crate) fn principal_angle(a: f64) -> f64 {
    a.rem_euclid(DPI)
}

/// Wrap an angle into the half-open interval (-π, π].
pub(crate) fn wrap_to_pi(a: f64) -> f64 {
    let wrapped = principal_angle(a);
    if wrapped > PI {
        wrapped - DPI
    } else {
        wrapped
    }
}

/// Principal difference `a - b` between two angles, in (-π, π].
pub(crate) fn angle_diff(a: f64, b: f64) -> f64 {
    wrap_to_pi(a - b)
}

/// Newton–Raphson solver for the elliptic Kepler equation `M = E - e·sin(E)`.
///
/// Fields
/// ------
/// * `eps`: convergence tolerance on both the equation residual and the Newton step (radians).
/// * `max_iter`: iteration cap; exceeding it is reported as
///   [`CometfitError::KeplerDivergence`], never silently approximated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeplerSolver {
    pub eps: f64,
    pub max_iter: usize,
}

impl Default for KeplerSolver {
    fn default() -> Self {
        KeplerSolver {
            eps: 1e-12,
            max_iter: 50,
        }
    }
}

impl KeplerSolver {
    pub fn new(eps: f64, max_iter: usize) -> Self {
        KeplerSolver { eps, max_iter }
    }

    /// Solve Kepler's equation for the eccentric anomaly.
    ///
    /// Arguments
    /// ---------
    /// * `mean_anomaly`: mean anomaly `M` in radians (any value, reduced to (-π, π] internally).
    /// * `eccentricity`: orbital eccentricity, `0 ≤ e < 1`.
    ///
    /// Return
    /// ------
    /// * The eccentric anomaly `E` in (-π, π] (modulo the Newton tolerance), or
    ///   [`CometfitError::KeplerDivergence`] if the iteration cap is reached.
    pub fn solve(&self, mean_anomaly: Radian, eccentricity: f64) -> Result<Radian, CometfitError> {
        let m = wrap_to_pi(mean_anomaly);

        if eccentricity == 0.0 {
            return Ok(m);
        }

        let f = |ecc_anom: f64| -> f64 { ecc_anom - eccentricity * ecc_anom.sin() - m };
        let df = |ecc_anom: f64| -> f64 { 1.0 - eccentricity * ecc_anom.cos() };

        // Highly eccentric orbits converge reliably from E0 = ±π
        let x0 = if eccentricity < 0.8 {
            m + eccentricity * m.sin()
        } else if m >= 0.0 {
            PI
        } else {
            -PI
        };

        let mut tol = SimpleConvergency {
            eps: self.eps,
            max_iter: self.max_iter,
        };

        find_root_newton_raphson(x0, &f, &df, &mut tol).map_err(|err| {
            CometfitError::KeplerDivergence {
                mean_anomaly,
                eccentricity,
                cause: err.to_string(),
            }
        })
    }
}
