//! # Reference frames
//!
//! Orbital elements, observed right ascension / declination and the Earth positions
//! returned by the ephemeris providers all live in the **mean equatorial frame of J2000**.
//! The **mean ecliptic and equinox of J2000** only appears inside the analytic Earth
//! theory, whose elements are ecliptic. The two frames share the x axis (vernal equinox)
//! and differ by a fixed rotation of the J2000 mean obliquity about that axis.
//!
//! Precession and nutation are not modelled: every quantity handled by the crate is
//! referred to the J2000 frames.

use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::constants::OBLIQUITY_J2000;

/// Reference frames understood by the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefSystem {
    /// Mean ecliptic and equinox J2000.
    EclipticJ2000,
    /// Mean equator and equinox J2000.
    EquatorialJ2000,
}

/// Construct a rotation matrix around one of the principal axes (X, Y, or Z).
///
/// The rotation is **applied to the vector** in a fixed frame (active rotation):
/// `rotmt(α, 2) * x̂` turns the x unit vector by `α` towards the y axis.
///
/// Arguments
/// ---------
/// * `alpha`: rotation angle in radians.
/// * `k`: axis index (0 = X, 1 = Y, 2 = Z).
///
/// # Panics
///
/// Panics if `k > 2`, as only axes 0–2 are valid.
pub fn rotmt(alpha: f64, k: usize) -> Matrix3<f64> {
    let axis = match k {
        0 => Vector3::x_axis(),
        1 => Vector3::y_axis(),
        2 => Vector3::z_axis(),
        _ => panic!("**** ROTMT: invalid axis index {k} (must be 0,1,2) ****"),
    };

    Rotation3::from_axis_angle(&axis, alpha).into()
}

/// Rotation matrix transforming coordinates from `from` to `to`.
///
/// The matrix is orthonormal, so the reverse transformation is its transpose.
///
/// # See also
/// * [`ecliptic_to_equatorial`] – convenience wrapper for the common direction.
pub fn rotpn(from: RefSystem, to: RefSystem) -> Matrix3<f64> {
    match (from, to) {
        (RefSystem::EclipticJ2000, RefSystem::EquatorialJ2000) => rotmt(OBLIQUITY_J2000, 0),
        (RefSystem::EquatorialJ2000, RefSystem::EclipticJ2000) => rotmt(-OBLIQUITY_J2000, 0),
        _ => Matrix3::identity(),
    }
}

/// Transform a vector from ecliptic J2000 to equatorial J2000 coordinates.
#[inline]
pub fn ecliptic_to_equatorial(v: &Vector3<f64>) -> Vector3<f64> {
    rotpn(RefSystem::EclipticJ2000, RefSystem::EquatorialJ2000) * v
}

/// Transform a vector from equatorial J2000 to ecliptic J2000 coordinates.
#[inline]
pub fn equatorial_to_ecliptic(v: &Vector3<f64>) -> Vector3<f64> {
    rotpn(RefSystem::EquatorialJ2000, RefSystem::EclipticJ2000) * v
}
