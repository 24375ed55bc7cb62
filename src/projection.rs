//! # Observation projector
//!
//! Maps a heliocentric position to the apparent right ascension and declination seen from
//! Earth, and back to a unit line of sight. Both positions are equatorial J2000, so the
//! resulting angles live in the same frame as the observations.
//!
//! [`predict_radec`] chains propagation, the Earth lookup and the projection. It is the only
//! forward model of the crate: the differential corrector, the synthetic-data helpers of the
//! test-suite and the benches all go through it.

use nalgebra::Vector3;

use crate::{
    cometfit_errors::CometfitError,
    constants::{ArcSec, Radian, ARCSEC_PER_RAD, MJD},
    ephemeris::{Body, EphemerisProvider},
    kepler::{angle_diff, principal_angle, KeplerSolver},
    observations::Observation,
    orbit_type::OrbitState,
    propagation::propagate_with,
};

/// Geocentric lines of sight shorter than this (AU) are treated as coincident positions.
const MIN_LINE_OF_SIGHT: f64 = 1e-12;

/// Project a heliocentric body position onto the sky of a geocentric observer.
///
/// Arguments
/// ---------
/// * `body_position`: heliocentric equatorial position of the object (AU).
/// * `earth_position`: heliocentric equatorial position of the Earth (AU).
///
/// Return
/// ------
/// * `(ra, dec)` in radians, `ra ∈ [0, 2π)` and `dec ∈ [-π/2, π/2]`.
///
/// Errors
/// ------
/// * [`CometfitError::DegenerateLineOfSight`] if both positions coincide.
pub fn project(
    body_position: &Vector3<f64>,
    earth_position: &Vector3<f64>,
) -> Result<(Radian, Radian), CometfitError> {
    let line_of_sight = body_position - earth_position;
    let distance = line_of_sight.norm();
    if distance < MIN_LINE_OF_SIGHT {
        return Err(CometfitError::DegenerateLineOfSight);
    }
    let unit = line_of_sight / distance;

    let ra = principal_angle(unit.y.atan2(unit.x));
    let dec = unit.z.clamp(-1.0, 1.0).asin();
    Ok((ra, dec))
}

/// Unit vector pointing to `(ra, dec)`, inverse of [`project`].
pub fn radec_to_unit_vector(ra: Radian, dec: Radian) -> Vector3<f64> {
    let (sin_ra, cos_ra) = ra.sin_cos();
    let (sin_dec, cos_dec) = dec.sin_cos();
    Vector3::new(cos_dec * cos_ra, cos_dec * sin_ra, sin_dec)
}

/// Predicted `(ra, dec)` of an orbit at `time`, as seen from the Earth.
///
/// See also
/// --------
/// * [`predict_radec_with`] – same with an explicit Kepler solver.
pub fn predict_radec(
    elements: &OrbitState,
    time: MJD,
    ephemeris: &dyn EphemerisProvider,
) -> Result<(Radian, Radian), CometfitError> {
    predict_radec_with(&KeplerSolver::default(), elements, time, ephemeris)
}

/// Same as [`predict_radec`] with an explicit Kepler solver configuration.
pub fn predict_radec_with(
    solver: &KeplerSolver,
    elements: &OrbitState,
    time: MJD,
    ephemeris: &dyn EphemerisProvider,
) -> Result<(Radian, Radian), CometfitError> {
    let body = propagate_with(solver, elements, time)?;
    let earth = ephemeris.position_of(Body::Earth, time)?;
    project(&body, &earth)
}

/// Residuals `predicted - observed` in arcseconds.
///
/// The RA difference is taken on the circle, in (-π, π], so that a prediction at 359° and
/// an observation at 1° differ by -2°, not 358°. The declination difference is plain.
pub fn radec_residual(predicted: (Radian, Radian), observation: &Observation) -> (ArcSec, ArcSec) {
    let (ra, dec) = predicted;
    (
        angle_diff(ra, observation.ra) * ARCSEC_PER_RAD,
        (dec - observation.dec) * ARCSEC_PER_RAD,
    )
}
