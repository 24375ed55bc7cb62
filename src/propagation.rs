//! # Two-body Kepler propagation
//!
//! Analytic propagation of a bound heliocentric orbit given by classical elements.
//!
//! For a target time `t`:
//!
//! 1. mean anomaly `M = n (t - t_p)` with `n = sqrt(k² / a³)`; the mean anomaly is zero at
//!    the perihelion epoch `t_p`,
//! 2. Kepler's equation `M = E - e·sin(E)` is solved by Newton–Raphson
//!    ([`KeplerSolver`]) for the eccentric anomaly `E`,
//! 3. the perifocal position `(a(cos E - e), a·sqrt(1 - e²)·sin E, 0)` (radius
//!    `r = a(1 - e·cos E)`) is rotated by `ω`, `i` and `Ω` into the equatorial J2000
//!    frame shared with the ephemeris providers and the observations.
//!
//! Propagation is deterministic and free of side effects. A non-converging Kepler solve is
//! reported as [`CometfitError::KeplerDivergence`].

use nalgebra::{Matrix3, Vector3};

use crate::{
    cometfit_errors::CometfitError,
    constants::{Radian, GAUSS_GRAV_SQUARED, MJD},
    kepler::KeplerSolver,
    orbit_type::{OrbitState, StateVector},
    ref_system::rotmt,
};

/// Rotation from the perifocal frame to the equatorial frame of the elements:
/// `R = Rz(Ω) · Rx(i) · Rz(ω)`.
pub(crate) fn perifocal_to_reference(
    inclination: Radian,
    ascending_node_longitude: Radian,
    periapsis_argument: Radian,
) -> Matrix3<f64> {
    rotmt(ascending_node_longitude, 2) * rotmt(inclination, 0) * rotmt(periapsis_argument, 2)
}

/// Solve the two-body problem in the frame of the elements (no validation).
///
/// Return
/// ------
/// * `(position [AU], velocity [AU/day])` in the reference frame of the angular elements.
#[allow(clippy::too_many_arguments)]
pub(crate) fn solve_two_body_problem(
    solver: &KeplerSolver,
    semi_major_axis: f64,
    eccentricity: f64,
    inclination: Radian,
    ascending_node_longitude: Radian,
    periapsis_argument: Radian,
    mean_anomaly: Radian,
) -> Result<(Vector3<f64>, Vector3<f64>), CometfitError> {
    let ecc_anom = solver.solve(mean_anomaly, eccentricity)?;
    let (sin_e, cos_e) = ecc_anom.sin_cos();
    let beta = (1.0 - eccentricity * eccentricity).sqrt();
    let mean_motion = (GAUSS_GRAV_SQUARED / semi_major_axis.powi(3)).sqrt();

    let perifocal_position = Vector3::new(
        semi_major_axis * (cos_e - eccentricity),
        semi_major_axis * beta * sin_e,
        0.0,
    );

    // dE/dt = n / (1 - e·cos E)
    let edot = mean_motion / (1.0 - eccentricity * cos_e);
    let perifocal_velocity = Vector3::new(
        -semi_major_axis * sin_e * edot,
        semi_major_axis * beta * cos_e * edot,
        0.0,
    );

    let rot = perifocal_to_reference(inclination, ascending_node_longitude, periapsis_argument);
    Ok((rot * perifocal_position, rot * perifocal_velocity))
}

/// Heliocentric equatorial J2000 position of the body at `target_time`.
///
/// Uses the default [`KeplerSolver`] (tolerance `1e-12` rad, 50 iterations).
///
/// Arguments
/// ---------
/// * `elements`: the orbit to propagate.
/// * `target_time`: requested instant (MJD, TT).
///
/// Return
/// ------
/// * The position vector in AU.
///
/// Errors
/// ------
/// * [`CometfitError::BoundsViolation`] if `elements` is not a valid bound orbit.
/// * [`CometfitError::KeplerDivergence`] if Kepler's equation does not converge.
pub fn propagate(elements: &OrbitState, target_time: MJD) -> Result<Vector3<f64>, CometfitError> {
    propagate_with(&KeplerSolver::default(), elements, target_time)
}

/// Same as [`propagate`] with an explicit Kepler solver configuration.
pub fn propagate_with(
    solver: &KeplerSolver,
    elements: &OrbitState,
    target_time: MJD,
) -> Result<Vector3<f64>, CometfitError> {
    Ok(propagate_state_with(solver, elements, target_time)?.position)
}

/// Heliocentric equatorial J2000 state (position and velocity) at `target_time`.
pub fn propagate_state(
    elements: &OrbitState,
    target_time: MJD,
) -> Result<StateVector, CometfitError> {
    propagate_state_with(&KeplerSolver::default(), elements, target_time)
}

/// Same as [`propagate_state`] with an explicit Kepler solver configuration.
pub fn propagate_state_with(
    solver: &KeplerSolver,
    elements: &OrbitState,
    target_time: MJD,
) -> Result<StateVector, CometfitError> {
    elements.validate()?;

    let (position, velocity) = solve_two_body_problem(
        solver,
        elements.semi_major_axis,
        elements.eccentricity,
        elements.inclination,
        elements.ascending_node_longitude,
        elements.periapsis_argument,
        elements.mean_anomaly_at(target_time),
    )?;

    Ok(StateVector::new(position, velocity, target_time))
}
