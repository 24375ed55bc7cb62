//! # Differential correction
//!
//! Refines a starting orbit by bounded nonlinear least squares on the RA/DEC residuals.
//!
//! ## Parameterisation
//! -----------------
//! The solver works on
//!
//! ```text
//! x = (a [AU], e, i [deg], Ω [deg], ω [deg], t_p - t_ref [days])
//! ```
//!
//! where `t_ref` is the mean observation epoch. Angles in degrees and a perihelion epoch
//! relative to the data keep the six components within a few orders of magnitude of each
//! other, so the relative step tolerance means the same thing for all of them.
//!
//! ## Residuals
//! -----------------
//! For every observation, in order, the RA difference wrapped into (-180°, 180°] and the
//! plain DEC difference, both in arcseconds (see
//! [`ObservationsExt::residuals`](crate::observations::ObservationsExt::residuals)).
//!
//! ## Box
//! -----------------
//! | parameter | [`BoundsPolicy::FirstPass`] | [`BoundsPolicy::Seeded`] |
//! |-----------|-----------------------------|--------------------------|
//! | `a`       | `[a_min, a_max first pass]` | `[a_min, a_max seeded]`  |
//! | `e`       | `[0, e_max]`                | `[0, e_max]`             |
//! | `i`       | `[0, 180]`                  | `[0, 180]`               |
//! | `Ω`, `ω`  | `[0, 360]`                  | `[0, 360]`               |
//! | `t_p`     | observation span ± window   | seed `t_p` ± window      |
//!
//! A starting point outside the box is projected onto it.

use std::f64::consts::PI;

use nalgebra::DVector;
use tracing::{info, warn};

use crate::{
    cometfit_errors::CometfitError,
    constants::{ArcSec, MJD},
    ephemeris::EphemerisProvider,
    kepler::principal_angle,
    least_squares::{Bounds, LeastSquaresSolver},
    observations::{Observation, ObservationsExt},
    orbit_determination::{BoundsPolicy, FitParams, MIN_REFINE_OBSERVATIONS},
    orbit_type::OrbitState,
};

/// Outcome of a successful differential correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectedOrbit {
    pub orbit: OrbitState,
    /// RMS of the RA/DEC residuals at the solution (arcsec).
    pub rms: ArcSec,
    /// Number of residual evaluations used by the solver.
    pub n_evaluations: usize,
}

/// Solver parameter vector of an orbit.
fn to_parameters(orbit: &OrbitState, t_ref: MJD) -> DVector<f64> {
    DVector::from_vec(vec![
        orbit.semi_major_axis,
        orbit.eccentricity,
        orbit.inclination.to_degrees(),
        orbit.ascending_node_longitude.to_degrees(),
        orbit.periapsis_argument.to_degrees(),
        orbit.perihelion_epoch - t_ref,
    ])
}

/// Orbit described by a solver parameter vector.
///
/// The closed ends of the angular box (`i = 180°`, `Ω = 360°`) may round one ulp past
/// their radian limits, hence the clamp and the reduction to `[0, 2π)`.
fn from_parameters(x: &DVector<f64>, t_ref: MJD) -> Result<OrbitState, CometfitError> {
    OrbitState::new(
        x[0],
        x[1],
        x[2].to_radians().clamp(0.0, PI),
        principal_angle(x[3].to_radians()),
        principal_angle(x[4].to_radians()),
        x[5] + t_ref,
    )
}

/// Refines orbits against a set of observations.
pub struct DifferentialCorrector<'a> {
    ephemeris: &'a dyn EphemerisProvider,
    solver: &'a dyn LeastSquaresSolver,
    params: &'a FitParams,
}

impl<'a> DifferentialCorrector<'a> {
    pub fn new(
        ephemeris: &'a dyn EphemerisProvider,
        solver: &'a dyn LeastSquaresSolver,
        params: &'a FitParams,
    ) -> Self {
        DifferentialCorrector {
            ephemeris,
            solver,
            params,
        }
    }

    /// Solver box for a given policy.
    ///
    /// Arguments
    /// ---------
    /// * `policy`: first-pass or seeded box.
    /// * `initial_guess`: starting orbit, centre of the seeded perihelion window.
    /// * `span`: earliest and latest observation epochs.
    /// * `t_ref`: reference epoch of the perihelion parameter.
    pub fn bounds(
        &self,
        policy: BoundsPolicy,
        initial_guess: &OrbitState,
        span: (MJD, MJD),
        t_ref: MJD,
    ) -> Result<Bounds, CometfitError> {
        let p = self.params;
        let (a_max, tp_min, tp_max) = match policy {
            BoundsPolicy::FirstPass => (
                p.max_semi_major_axis_first_pass,
                span.0 - p.perihelion_window_first_pass,
                span.1 + p.perihelion_window_first_pass,
            ),
            BoundsPolicy::Seeded => (
                p.max_semi_major_axis_seeded,
                initial_guess.perihelion_epoch - p.perihelion_window_seeded,
                initial_guess.perihelion_epoch + p.perihelion_window_seeded,
            ),
        };

        Bounds::new(
            vec![p.min_semi_major_axis, 0.0, 0.0, 0.0, 0.0, tp_min - t_ref],
            vec![a_max, p.max_eccentricity, 180.0, 360.0, 360.0, tp_max - t_ref],
        )
    }

    /// Refine `initial_guess` against `observations`.
    ///
    /// Arguments
    /// ---------
    /// * `observations`: at least five observations.
    /// * `initial_guess`: starting orbit, projected onto the box if needed.
    /// * `policy`: which box to use.
    ///
    /// Return
    /// ------
    /// * The converged orbit with its RMS residual and evaluation count.
    ///
    /// Errors
    /// ------
    /// * [`CometfitError::InsufficientObservations`] with fewer than five observations.
    /// * [`CometfitError::SolverNonConvergence`] if the solver stops without converging.
    /// * Propagation and ephemeris errors raised while evaluating the residuals.
    pub fn refine(
        &self,
        observations: &[Observation],
        initial_guess: &OrbitState,
        policy: BoundsPolicy,
    ) -> Result<CorrectedOrbit, CometfitError> {
        if observations.len() < MIN_REFINE_OBSERVATIONS {
            return Err(CometfitError::InsufficientObservations {
                stage: "differential correction",
                required: MIN_REFINE_OBSERVATIONS,
                provided: observations.len(),
            });
        }
        let (span, t_ref) = observations
            .time_span()
            .zip(observations.mean_epoch())
            .ok_or(CometfitError::InsufficientObservations {
                stage: "differential correction",
                required: MIN_REFINE_OBSERVATIONS,
                provided: 0,
            })?;

        let bounds = self.bounds(policy, initial_guess, span, t_ref)?;
        let x0 = to_parameters(initial_guess, t_ref);
        let kepler = self.params.kepler_solver();

        let residuals = |x: &DVector<f64>| -> Result<DVector<f64>, CometfitError> {
            let orbit = from_parameters(x, t_ref)?;
            Ok(DVector::from_vec(observations.residuals(
                &orbit,
                self.ephemeris,
                &kepler,
            )?))
        };

        let outcome = self
            .solver
            .minimize(&residuals, &x0, &bounds, &self.params.tolerances())?;

        if !outcome.converged {
            warn!(
                n_evaluations = outcome.n_evaluations,
                cost = outcome.cost,
                message = %outcome.message,
                "differential correction failed"
            );
            return Err(CometfitError::SolverNonConvergence(format!(
                "{} after {} evaluations (cost = {:e})",
                outcome.message, outcome.n_evaluations, outcome.cost
            )));
        }

        let orbit = from_parameters(&outcome.x, t_ref)?;
        let rms = (2.0 * outcome.cost / (2 * observations.len()) as f64).sqrt();
        info!(
            a = orbit.semi_major_axis,
            e = orbit.eccentricity,
            rms_arcsec = rms,
            n_evaluations = outcome.n_evaluations,
            message = %outcome.message,
            "differential correction converged"
        );

        Ok(CorrectedOrbit {
            orbit,
            rms,
            n_evaluations: outcome.n_evaluations,
        })
    }
}

#[cfg(test)]
mod differential_correction_test {
    use super::*;
    use crate::{
        ephemeris::AnalyticEphemeris, least_squares::LevenbergMarquardt, projection::predict_radec,
    };
    use approx::assert_abs_diff_eq;

    fn synthetic_observations(truth: &OrbitState, ephem: &AnalyticEphemeris) -> Vec<Observation> {
        (0..10)
            .map(|k| {
                let time = 60640.0 + 12.5 * k as f64;
                let (ra, dec) = predict_radec(truth, time, ephem).unwrap();
                Observation::new(ra, dec, time)
            })
            .collect()
    }

    #[test]
    fn test_parameter_mapping() {
        let orbit = OrbitState::from_degrees(2.5, 0.3, 12.0, 80.0, 60.0, 60700.0).unwrap();
        let x = to_parameters(&orbit, 60650.0);
        assert_abs_diff_eq!(x[2], 12.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[5], 50.0, epsilon = 1e-12);
        let back = from_parameters(&x, 60650.0).unwrap();
        assert_abs_diff_eq!(back.inclination, orbit.inclination, epsilon = 1e-15);
        assert_abs_diff_eq!(back.perihelion_epoch, 60700.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bounds_policies() {
        let ephem = AnalyticEphemeris::default();
        let params = FitParams::default();
        let solver = LevenbergMarquardt::new();
        let corrector = DifferentialCorrector::new(&ephem, &solver, &params);
        let guess = OrbitState::from_degrees(2.5, 0.3, 12.0, 80.0, 60.0, 60700.0).unwrap();

        let first = corrector
            .bounds(BoundsPolicy::FirstPass, &guess, (60600.0, 60800.0), 60700.0)
            .unwrap();
        assert_eq!(first.upper[0], 50.0);
        assert_eq!(first.lower[5], -465.0);
        assert_eq!(first.upper[5], 465.0);

        let seeded = corrector
            .bounds(BoundsPolicy::Seeded, &guess, (60600.0, 60800.0), 60650.0)
            .unwrap();
        assert_eq!(seeded.upper[0], 10.0);
        assert_eq!(seeded.lower[5], -950.0);
        assert_eq!(seeded.upper[5], 1050.0);
        assert_eq!(seeded.upper[1], 0.99);
    }

    #[test]
    fn test_refine_recovers_truth() {
        let ephem = AnalyticEphemeris::default();
        let params = FitParams::default();
        let solver = LevenbergMarquardt::new();
        let corrector = DifferentialCorrector::new(&ephem, &solver, &params);

        let truth = OrbitState::from_degrees(2.5, 0.3, 12.0, 80.0, 60.0, 60700.0).unwrap();
        let observations = synthetic_observations(&truth, &ephem);
        let guess = OrbitState::from_degrees(2.55, 0.32, 12.5, 80.5, 60.5, 60705.0).unwrap();

        let corrected = corrector
            .refine(&observations, &guess, BoundsPolicy::Seeded)
            .unwrap();

        assert_abs_diff_eq!(corrected.orbit.semi_major_axis, 2.5, epsilon = 1e-6);
        assert_abs_diff_eq!(corrected.orbit.eccentricity, 0.3, epsilon = 1e-6);
        assert_abs_diff_eq!(
            corrected.orbit.inclination.to_degrees(),
            12.0,
            epsilon = 1e-5
        );
        assert_abs_diff_eq!(
            corrected.orbit.ascending_node_longitude.to_degrees(),
            80.0,
            epsilon = 1e-5
        );
        assert_abs_diff_eq!(
            corrected.orbit.periapsis_argument.to_degrees(),
            60.0,
            epsilon = 1e-5
        );
        assert_abs_diff_eq!(corrected.orbit.perihelion_epoch, 60700.0, epsilon = 1e-4);
        assert!(corrected.rms < 1e-4);
        assert!(corrected.n_evaluations <= params.max_evaluations);
    }

    #[test]
    fn test_refine_needs_five_observations() {
        let ephem = AnalyticEphemeris::default();
        let params = FitParams::default();
        let solver = LevenbergMarquardt::new();
        let corrector = DifferentialCorrector::new(&ephem, &solver, &params);

        let truth = OrbitState::from_degrees(2.5, 0.3, 12.0, 80.0, 60.0, 60700.0).unwrap();
        let observations = synthetic_observations(&truth, &ephem);

        let err = corrector
            .refine(&observations[..4], &truth, BoundsPolicy::Seeded)
            .unwrap_err();
        assert_eq!(
            err,
            CometfitError::InsufficientObservations {
                stage: "differential correction",
                required: 5,
                provided: 4
            }
        );
    }

    #[test]
    fn test_budget_exhaustion_is_an_error() {
        let ephem = AnalyticEphemeris::default();
        let params = FitParams::builder().max_evaluations(8).build().unwrap();
        let solver = LevenbergMarquardt::new();
        let corrector = DifferentialCorrector::new(&ephem, &solver, &params);

        let truth = OrbitState::from_degrees(2.5, 0.3, 12.0, 80.0, 60.0, 60700.0).unwrap();
        let observations = synthetic_observations(&truth, &ephem);
        let guess = OrbitState::from_degrees(3.0, 0.1, 20.0, 90.0, 40.0, 60650.0).unwrap();

        let err = corrector
            .refine(&observations, &guess, BoundsPolicy::FirstPass)
            .unwrap_err();
        assert!(matches!(err, CometfitError::SolverNonConvergence(_)));
    }
}
