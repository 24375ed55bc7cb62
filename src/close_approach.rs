//! # Close-approach scanner
//!
//! Brute-force search for the minimum Earth–object distance of a fitted orbit over a time
//! window. The orbit and the Earth are sampled on the uniform grid
//! `t_k = start + k·step`, `t_k ≤ end`, and the sample with the smallest heliocentric
//! separation wins; ties go to the earliest sample.
//!
//! The true minimum can fall between two samples, so the reported distance overestimates it
//! by at most the relative Earth–object travel over one step. Refine with a smaller step
//! around the reported time when more precision is needed.

use tracing::info;

use crate::{
    cometfit_errors::CometfitError,
    constants::{AstronomicalUnit, Day, MJD},
    ephemeris::{Body, EphemerisProvider},
    kepler::KeplerSolver,
    orbit_determination::FitParams,
    orbit_type::OrbitState,
    propagation::propagate_with,
};

/// Closest sampled approach between the object and the Earth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloseApproach {
    /// Epoch of the closest sample (MJD, TT).
    pub time: MJD,
    /// Earth–object distance at that epoch (AU).
    pub distance: AstronomicalUnit,
}

/// A scan grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanWindow {
    pub start: MJD,
    pub end: MJD,
    pub step: Day,
}

impl ScanWindow {
    pub fn new(start: MJD, end: MJD, step: Day) -> Self {
        ScanWindow { start, end, step }
    }

    /// Default window of an orbit: from its perihelion epoch, `scan_window_days` long,
    /// sampled every `scan_step_days`.
    pub fn default_for(orbit: &OrbitState, params: &FitParams) -> Self {
        ScanWindow {
            start: orbit.perihelion_epoch,
            end: orbit.perihelion_epoch + params.scan_window_days,
            step: params.scan_step_days,
        }
    }

    /// Number of grid samples, after checking the window.
    ///
    /// Errors
    /// ------
    /// * [`CometfitError::InvalidScanWindow`] if a bound is not finite, `end ≤ start`,
    ///   `step ≤ 0`, or the grid holds more than `max_samples` samples.
    pub fn sample_count(&self, max_samples: usize) -> Result<usize, CometfitError> {
        if !self.start.is_finite() || !self.end.is_finite() || !self.step.is_finite() {
            return Err(CometfitError::InvalidScanWindow(format!(
                "non-finite window {self:?}"
            )));
        }
        if self.end <= self.start {
            return Err(CometfitError::InvalidScanWindow(format!(
                "end ({}) must be after start ({})",
                self.end, self.start
            )));
        }
        if self.step <= 0.0 {
            return Err(CometfitError::InvalidScanWindow(format!(
                "step must be positive, got {}",
                self.step
            )));
        }

        let intervals = ((self.end - self.start) / self.step).floor();
        if intervals >= max_samples as f64 {
            return Err(CometfitError::InvalidScanWindow(format!(
                "{} samples exceed the limit of {max_samples}",
                intervals + 1.0
            )));
        }
        Ok(intervals as usize + 1)
    }
}

/// Keep the closer of the two samples; the earlier one wins on ties.
fn keep_closest(closest: Option<CloseApproach>, sample: CloseApproach) -> Option<CloseApproach> {
    match closest {
        Some(best) if best.distance <= sample.distance => Some(best),
        _ => Some(sample),
    }
}

/// Scan `orbit` over `window` for its closest approach to the Earth.
///
/// Arguments
/// ---------
/// * `orbit`: the fitted orbit.
/// * `window`: the sampling grid.
/// * `ephemeris`: source of the Earth positions.
/// * `solver`: Kepler solver used by the propagation.
/// * `max_samples`: upper limit on the grid size.
///
/// Return
/// ------
/// * The closest sample.
///
/// Errors
/// ------
/// * [`CometfitError::InvalidScanWindow`] for an invalid or oversized grid.
/// * Propagation and ephemeris errors at any sample.
pub fn scan(
    orbit: &OrbitState,
    window: &ScanWindow,
    ephemeris: &dyn EphemerisProvider,
    solver: &KeplerSolver,
    max_samples: usize,
) -> Result<CloseApproach, CometfitError> {
    let n_samples = window.sample_count(max_samples)?;

    // Grid samples are folded one at a time: the first failing sample stops the scan
    let closest = (0..n_samples)
        .try_fold(None, |closest, k| {
            let time = window.start + k as f64 * window.step;
            let body = propagate_with(solver, orbit, time)?;
            let earth = ephemeris.position_of(Body::Earth, time)?;
            let sample = CloseApproach {
                time,
                distance: (body - earth).norm(),
            };
            Ok::<_, CometfitError>(keep_closest(closest, sample))
        })?
        .ok_or_else(|| CometfitError::InvalidScanWindow(format!("empty scan grid {window:?}")))?;
    info!(
        time = closest.time,
        distance_au = closest.distance,
        n_samples,
        "close-approach scan done"
    );
    Ok(closest)
}

#[cfg(test)]
mod close_approach_test {
    use nalgebra::Vector3;

    use super::*;
    use crate::{constants::GAUSS_GRAV, ephemeris::AnalyticEphemeris};

    /// Earth on a circular 1 AU orbit in the equatorial plane, at longitude 0 at `t0`.
    struct CircularEarth {
        t0: MJD,
    }

    impl EphemerisProvider for CircularEarth {
        fn position_of(&self, body: Body, time: MJD) -> Result<Vector3<f64>, CometfitError> {
            match body {
                Body::Sun => Ok(Vector3::zeros()),
                Body::Earth => {
                    let theta = GAUSS_GRAV * (time - self.t0);
                    Ok(Vector3::new(theta.cos(), theta.sin(), 0.0))
                }
            }
        }
    }

    #[test]
    fn test_node_crossing_is_found() {
        // Same circular orbit as the Earth, tilted by 30°: both bodies meet at the nodes,
        // every half period
        let t0 = 60000.0;
        let earth = CircularEarth { t0 };
        let orbit = OrbitState::from_degrees(1.0, 0.0, 30.0, 0.0, 0.0, t0).unwrap();
        let half_period = orbit.period() / 2.0;

        let window = ScanWindow::new(t0 + 10.0, t0 + 300.0, 1.0);
        let approach = scan(&orbit, &window, &earth, &KeplerSolver::default(), 10_000).unwrap();

        // Relative speed at the node: 2·sin(15°)·k AU/day
        let travel_per_step = 2.0 * 15.0_f64.to_radians().sin() * GAUSS_GRAV * window.step;
        assert!(approach.distance <= travel_per_step, "{approach:?}");
        assert!((approach.time - (t0 + half_period)).abs() <= window.step);
    }

    #[test]
    fn test_ties_resolve_to_earliest_sample() {
        let samples = [(10.0, 0.5), (11.0, 0.2), (12.0, 0.3), (13.0, 0.2), (14.0, 0.2)]
            .map(|(time, distance)| CloseApproach { time, distance });
        let closest = samples.into_iter().fold(None, keep_closest).unwrap();
        assert_eq!(closest.time, 11.0);
        assert_eq!(closest.distance, 0.2);
    }

    #[test]
    fn test_grid_includes_end_point() {
        let window = ScanWindow::new(0.0, 10.0, 2.5);
        assert_eq!(window.sample_count(100).unwrap(), 5);
        let window = ScanWindow::new(0.0, 10.0, 3.0);
        assert_eq!(window.sample_count(100).unwrap(), 4);
    }

    #[test]
    fn test_invalid_windows() {
        let orbit = OrbitState::from_degrees(2.5, 0.3, 12.0, 80.0, 60.0, 60700.0).unwrap();
        let ephem = AnalyticEphemeris::default();
        let solver = KeplerSolver::default();

        for window in [
            ScanWindow::new(60700.0, 60700.0, 1.0),
            ScanWindow::new(60700.0, 60600.0, 1.0),
            ScanWindow::new(60700.0, 60800.0, 0.0),
            ScanWindow::new(60700.0, 60800.0, -1.0),
            ScanWindow::new(f64::NAN, 60800.0, 1.0),
            ScanWindow::new(60700.0, 70000.0, 0.001),
        ] {
            assert!(matches!(
                scan(&orbit, &window, &ephem, &solver, 100_000),
                Err(CometfitError::InvalidScanWindow(_))
            ));
        }
    }

    #[test]
    fn test_default_window() {
        let orbit = OrbitState::from_degrees(2.5, 0.3, 12.0, 80.0, 60.0, 60700.0).unwrap();
        let window = ScanWindow::default_for(&orbit, &FitParams::default());
        assert_eq!(window.start, 60700.0);
        assert_eq!(window.end, 60700.0 + 1826.25);
        assert_eq!(window.step, 1.0);
        assert_eq!(window.sample_count(1_000_000).unwrap(), 1827);
    }
}
