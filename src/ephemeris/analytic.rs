//! Analytic Earth ephemeris.
//!
//! Keplerian elements of the Earth–Moon barycentre with linear rates, from the JPL
//! "Approximate Positions of the Planets" table valid from 1800 AD to 2050 AD
//! (E. M. Standish). Elements are referred to the mean ecliptic and equinox J2000; the time
//! argument is the number of Julian centuries of TT since J2000.0.
//!
//! The position is obtained with the same two-body solver as the propagator and then
//! rotated to equatorial J2000.

use nalgebra::Vector3;

use crate::{
    cometfit_errors::CometfitError,
    constants::{MJD, RADEG},
    ephemeris::{Body, EphemerisProvider},
    kepler::KeplerSolver,
    propagation::solve_two_body_problem,
    ref_system::ecliptic_to_equatorial,
    time::julian_centuries_since_j2000,
};

/// 1800-01-01T00:00 TT
const VALID_FROM: MJD = -21504.0;
/// 2051-01-01T00:00 TT
const VALID_UNTIL: MJD = 70172.0;

/// `(value at J2000, rate per Julian century)` for each element.
/// Angles in degrees, semi-major axis in AU.
const SEMI_MAJOR_AXIS: (f64, f64) = (1.00000261, 0.00000562);
const ECCENTRICITY: (f64, f64) = (0.01671123, -0.00004392);
const INCLINATION: (f64, f64) = (-0.00001531, -0.01294668);
const MEAN_LONGITUDE: (f64, f64) = (100.46457166, 35999.37244981);
const PERIHELION_LONGITUDE: (f64, f64) = (102.93768193, 0.32327364);
const ASCENDING_NODE: (f64, f64) = (0.0, 0.0);

fn element_at((value, rate): (f64, f64), centuries: f64) -> f64 {
    value + rate * centuries
}

/// Earth positions from low-precision mean elements, no data file required.
#[derive(Debug, Clone, Default)]
pub struct AnalyticEphemeris {
    solver: KeplerSolver,
}

impl AnalyticEphemeris {
    pub fn new(solver: KeplerSolver) -> Self {
        AnalyticEphemeris { solver }
    }

    /// Validity range `[start, end)` of the model (MJD, TT).
    pub fn time_span(&self) -> (MJD, MJD) {
        (VALID_FROM, VALID_UNTIL)
    }

    fn earth_position(&self, time: MJD) -> Result<Vector3<f64>, CometfitError> {
        if !(VALID_FROM..VALID_UNTIL).contains(&time) {
            return Err(CometfitError::EphemerisUnavailable {
                body: Body::Earth.to_string(),
                time,
                reason: format!(
                    "outside the analytic model validity range [{VALID_FROM}, {VALID_UNTIL})"
                ),
            });
        }

        let t = julian_centuries_since_j2000(time);
        let node = element_at(ASCENDING_NODE, t);
        let varpi = element_at(PERIHELION_LONGITUDE, t);
        let mean_anomaly = element_at(MEAN_LONGITUDE, t) - varpi;

        let (position, _) = solve_two_body_problem(
            &self.solver,
            element_at(SEMI_MAJOR_AXIS, t),
            element_at(ECCENTRICITY, t),
            element_at(INCLINATION, t) * RADEG,
            node * RADEG,
            (varpi - node) * RADEG,
            mean_anomaly * RADEG,
        )?;

        Ok(ecliptic_to_equatorial(&position))
    }
}

impl EphemerisProvider for AnalyticEphemeris {
    fn position_of(&self, body: Body, time: MJD) -> Result<Vector3<f64>, CometfitError> {
        match body {
            Body::Sun => Ok(Vector3::zeros()),
            Body::Earth => self.earth_position(time),
        }
    }
}
