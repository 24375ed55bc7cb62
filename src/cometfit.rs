//! # Cometfit facade
//!
//! [`Cometfit`] owns everything a fit needs: the loaded ephemeris, the least-squares backend
//! and the [`FitParams`]. Ephemeris loading happens once, in the constructor, and fails
//! loudly; every method afterwards is a pure function of its inputs and of that state, so a
//! single instance can be shared by reference across threads.
//!
//! ## Request boundary
//! -----------------
//! [`Cometfit::calculate_orbit`] is the service entry point. It takes raw
//! [`ObservationRecord`]s (degrees, ISO-8601 UTC) and always answers with an
//! [`OrbitResponse`]: either an [`OrbitReport`] or `{"error": "<message>"}`. It never panics
//! on bad input.
//!
//! ```rust,no_run
//! use cometfit::cometfit::Cometfit;
//! use cometfit::ephemeris::EphemerisSource;
//! use cometfit::observations::ObservationRecord;
//! use cometfit::orbit_determination::FitParams;
//!
//! let cometfit = Cometfit::new(&EphemerisSource::Analytic, FitParams::default()).unwrap();
//! let records: Vec<ObservationRecord> = vec![/* ... */];
//! let response = cometfit.calculate_orbit(&records);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    close_approach::{scan, CloseApproach, ScanWindow},
    cometfit_errors::CometfitError,
    constants::{AstronomicalUnit, Degree},
    ephemeris::{Ephemeris, EphemerisProvider, EphemerisSource},
    least_squares::{LeastSquaresSolver, LevenbergMarquardt},
    observations::{observations_from_records, Observation, ObservationRecord},
    orbit_determination::{
        coarse_seed,
        differential_correction::{CorrectedOrbit, DifferentialCorrector},
        BoundsPolicy, FitParams, SeedStrategy, MIN_REFINE_OBSERVATIONS,
    },
    orbit_type::OrbitState,
    time::mjd_to_iso,
};

pub struct Cometfit {
    ephemeris: Box<dyn EphemerisProvider>,
    solver: Box<dyn LeastSquaresSolver>,
    params: FitParams,
}

impl Cometfit {
    /// Construct a new [`Cometfit`] context.
    ///
    /// The ephemeris described by `source` is loaded immediately; the solver is the default
    /// [`LevenbergMarquardt`] backend.
    ///
    /// Arguments
    /// -----------------
    /// * `source`: the ephemeris backend (`analytic` or `table:<path>`).
    /// * `params`: pipeline configuration.
    ///
    /// Return
    /// ----------
    /// * A ready-to-use context, or [`CometfitError::EphemerisLoad`] if the table cannot be
    ///   loaded.
    ///
    /// See also
    /// ------------
    /// * [`Cometfit::from_env`] – same, with the source read from `COMETFIT_EPHEMERIS`.
    /// * [`Cometfit::with_ephemeris`] – inject any [`EphemerisProvider`].
    pub fn new(source: &EphemerisSource, params: FitParams) -> Result<Self, CometfitError> {
        let ephemeris = Ephemeris::new(source)?;
        Ok(Cometfit::with_ephemeris(Box::new(ephemeris), params))
    }

    /// Construct a context from the `COMETFIT_EPHEMERIS` environment variable
    /// (analytic ephemeris when unset).
    pub fn from_env(params: FitParams) -> Result<Self, CometfitError> {
        Cometfit::new(&EphemerisSource::from_env()?, params)
    }

    pub fn with_ephemeris(ephemeris: Box<dyn EphemerisProvider>, params: FitParams) -> Self {
        Cometfit {
            ephemeris,
            solver: Box::new(LevenbergMarquardt::new()),
            params,
        }
    }

    /// Replace the least-squares backend.
    pub fn with_solver(mut self, solver: Box<dyn LeastSquaresSolver>) -> Self {
        self.solver = solver;
        self
    }

    pub fn ephemeris(&self) -> &dyn EphemerisProvider {
        self.ephemeris.as_ref()
    }

    pub fn params(&self) -> &FitParams {
        &self.params
    }

    /// Coarse seed orbit from the first three observations.
    ///
    /// See [`coarse_seed::estimate`].
    pub fn initial_orbit(&self, observations: &[Observation]) -> Result<OrbitState, CometfitError> {
        coarse_seed::estimate(observations, self.ephemeris(), self.params.seed_range_au)
    }

    /// Refine `initial_guess` with the seeded box.
    pub fn refine(
        &self,
        observations: &[Observation],
        initial_guess: &OrbitState,
    ) -> Result<CorrectedOrbit, CometfitError> {
        self.corrector()
            .refine(observations, initial_guess, BoundsPolicy::Seeded)
    }

    /// Fit an orbit to `observations` following the configured [`SeedStrategy`].
    ///
    /// * [`SeedStrategy::CoarseSeed`]: coarse seed, then refinement in the seeded box.
    /// * [`SeedStrategy::Fixed`]: refinement of the fixed orbit in the first-pass box.
    ///
    /// Errors
    /// ------
    /// * [`CometfitError::InsufficientObservations`] with fewer than five observations,
    ///   before any seed is attempted.
    /// * Any seed or refinement error.
    pub fn fit_orbit(&self, observations: &[Observation]) -> Result<CorrectedOrbit, CometfitError> {
        if observations.len() < MIN_REFINE_OBSERVATIONS {
            return Err(CometfitError::InsufficientObservations {
                stage: "orbit fit",
                required: MIN_REFINE_OBSERVATIONS,
                provided: observations.len(),
            });
        }

        let corrector = self.corrector();
        match self.params.seed_strategy {
            SeedStrategy::CoarseSeed => {
                let seed = self.initial_orbit(observations)?;
                corrector.refine(observations, &seed, BoundsPolicy::Seeded)
            }
            SeedStrategy::Fixed(seed) => {
                corrector.refine(observations, &seed, BoundsPolicy::FirstPass)
            }
        }
    }

    /// Closest approach of `orbit` to the Earth over `window`, or over
    /// [`ScanWindow::default_for`] the orbit when `window` is `None`.
    pub fn close_approach(
        &self,
        orbit: &OrbitState,
        window: Option<ScanWindow>,
    ) -> Result<CloseApproach, CometfitError> {
        let window = window.unwrap_or_else(|| ScanWindow::default_for(orbit, &self.params));
        scan(
            orbit,
            &window,
            self.ephemeris(),
            &self.params.kepler_solver(),
            self.params.scan_max_samples,
        )
    }

    /// Service entry point: records in, report or error message out.
    ///
    /// A failed close-approach scan does not fail the request; the report then carries no
    /// `close_approach` entry.
    pub fn calculate_orbit(&self, records: &[ObservationRecord]) -> OrbitResponse {
        match self.try_calculate_orbit(records) {
            Ok(report) => OrbitResponse::Orbit(report),
            Err(err) => {
                warn!(error = %err, n_records = records.len(), "orbit request rejected");
                OrbitResponse::Error {
                    error: err.to_string(),
                }
            }
        }
    }

    fn try_calculate_orbit(
        &self,
        records: &[ObservationRecord],
    ) -> Result<OrbitReport, CometfitError> {
        let observations = observations_from_records(records)?;
        let fit = self.fit_orbit(&observations)?;

        let close_approach = match self.close_approach(&fit.orbit, None) {
            Ok(approach) => Some(CloseApproachReport::from(approach)),
            Err(err) => {
                warn!(error = %err, "close-approach scan skipped");
                None
            }
        };

        info!(
            n_observations = observations.len(),
            rms_arcsec = fit.rms,
            "orbit request served"
        );
        Ok(OrbitReport::new(&fit.orbit, close_approach))
    }

    fn corrector(&self) -> DifferentialCorrector<'_> {
        DifferentialCorrector::new(self.ephemeris(), self.solver.as_ref(), &self.params)
    }
}

/// Fitted elements as returned to a client: angles in degrees, perihelion time as a UTC
/// timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitReport {
    pub a: AstronomicalUnit,
    pub eccentricity: f64,
    pub inclination: Degree,
    pub longitude_of_ascending_node: Degree,
    pub argument_of_perihelion: Degree,
    pub time_of_perihelion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_approach: Option<CloseApproachReport>,
}

impl OrbitReport {
    pub fn new(orbit: &OrbitState, close_approach: Option<CloseApproachReport>) -> Self {
        OrbitReport {
            a: orbit.semi_major_axis,
            eccentricity: orbit.eccentricity,
            inclination: orbit.inclination.to_degrees(),
            longitude_of_ascending_node: orbit.ascending_node_longitude.to_degrees(),
            argument_of_perihelion: orbit.periapsis_argument.to_degrees(),
            time_of_perihelion: mjd_to_iso(orbit.perihelion_epoch),
            close_approach,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseApproachReport {
    pub closest_date: String,
    pub distance_au: AstronomicalUnit,
}

impl From<CloseApproach> for CloseApproachReport {
    fn from(approach: CloseApproach) -> Self {
        CloseApproachReport {
            closest_date: mjd_to_iso(approach.time),
            distance_au: approach.distance,
        }
    }
}

/// Response of [`Cometfit::calculate_orbit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrbitResponse {
    Orbit(OrbitReport),
    Error { error: String },
}

#[cfg(test)]
mod cometfit_test {
    use super::*;
    use crate::{ephemeris::AnalyticEphemeris, projection::predict_radec, time::iso_to_mjd};
    use approx::assert_abs_diff_eq;

    fn truth() -> OrbitState {
        OrbitState::from_degrees(2.2, 0.15, 9.0, 75.0, 140.0, 60720.0).unwrap()
    }

    fn records(orbit: &OrbitState, n: usize) -> Vec<ObservationRecord> {
        let ephem = AnalyticEphemeris::default();
        (0..n)
            .map(|k| {
                let iso = mjd_to_iso(60650.0 + 9.0 * k as f64);
                let time = iso_to_mjd(&iso).unwrap();
                let (ra, dec) = predict_radec(orbit, time, &ephem).unwrap();
                ObservationRecord {
                    ra: ra.to_degrees(),
                    dec: dec.to_degrees(),
                    time: iso,
                }
            })
            .collect()
    }

    fn cometfit_with_fixed_seed(seed: OrbitState) -> Cometfit {
        let params = FitParams::builder()
            .seed_strategy(SeedStrategy::Fixed(seed))
            .build()
            .unwrap();
        Cometfit::new(&EphemerisSource::Analytic, params).unwrap()
    }

    #[test]
    fn test_fit_from_fixed_seed_at_truth() {
        let truth = truth();
        let cometfit = cometfit_with_fixed_seed(truth);

        let report = match cometfit.calculate_orbit(&records(&truth, 8)) {
            OrbitResponse::Orbit(report) => report,
            other => panic!("expected an orbit, got {other:?}"),
        };
        assert_abs_diff_eq!(report.a, 2.2, epsilon = 1e-6);
        assert_abs_diff_eq!(report.eccentricity, 0.15, epsilon = 1e-6);
        assert_abs_diff_eq!(report.inclination, 9.0, epsilon = 1e-4);
        assert_abs_diff_eq!(report.longitude_of_ascending_node, 75.0, epsilon = 1e-4);
        assert_abs_diff_eq!(report.argument_of_perihelion, 140.0, epsilon = 1e-4);
        assert_abs_diff_eq!(
            iso_to_mjd(&report.time_of_perihelion).unwrap(),
            60720.0,
            epsilon = 1e-3
        );

        let approach = report.close_approach.expect("scan over the default window");
        assert!(approach.distance_au > 0.0);
        let closest = iso_to_mjd(&approach.closest_date).unwrap();
        assert!((60720.0..=60720.0 + 1826.25).contains(&closest));
    }

    #[test]
    fn test_insufficient_records_is_an_error_response() {
        let truth = truth();
        let cometfit = cometfit_with_fixed_seed(truth);
        let response = cometfit.calculate_orbit(&records(&truth, 4));
        assert_eq!(
            response,
            OrbitResponse::Error {
                error: CometfitError::InsufficientObservations {
                    stage: "orbit fit",
                    required: 5,
                    provided: 4
                }
                .to_string()
            }
        );
    }

    #[test]
    fn test_invalid_records_are_error_responses() {
        let cometfit = Cometfit::new(&EphemerisSource::Analytic, FitParams::default()).unwrap();
        let mut bad = records(&truth(), 6);
        bad[2].time = "yesterday".into();
        assert!(matches!(
            cometfit.calculate_orbit(&bad),
            OrbitResponse::Error { error } if error.contains("yesterday")
        ));

        let mut bad = records(&truth(), 6);
        bad[3].dec = 95.0;
        assert!(matches!(
            cometfit.calculate_orbit(&bad),
            OrbitResponse::Error { error } if error.contains("record 3")
        ));

        assert!(matches!(
            cometfit.calculate_orbit(&[]),
            OrbitResponse::Error { .. }
        ));
    }

    #[test]
    fn test_close_approach_with_explicit_window() {
        let cometfit = Cometfit::new(&EphemerisSource::Analytic, FitParams::default()).unwrap();
        let orbit = truth();
        let window = ScanWindow::new(60700.0, 60800.0, 1.0);
        let approach = cometfit.close_approach(&orbit, Some(window)).unwrap();
        assert!((60700.0..=60800.0).contains(&approach.time));

        let bad = ScanWindow::new(60800.0, 60700.0, 1.0);
        assert!(matches!(
            cometfit.close_approach(&orbit, Some(bad)),
            Err(CometfitError::InvalidScanWindow(_))
        ));
    }

    #[test]
    fn test_facade_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Cometfit>();
    }
}
