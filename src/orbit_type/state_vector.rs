use nalgebra::Vector3;

use crate::constants::{GAUSS_GRAV_SQUARED, MJD};

/// Heliocentric Cartesian state, equatorial J2000.
///
/// Units: position in AU, velocity in AU/day, epoch in MJD (TT).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub epoch: MJD,
}

impl StateVector {
    pub fn new(position: Vector3<f64>, velocity: Vector3<f64>, epoch: MJD) -> Self {
        StateVector {
            position,
            velocity,
            epoch,
        }
    }

    /// Specific orbital energy `v²/2 - k²/r` (AU²/day²). Negative for bound orbits.
    pub fn specific_energy(&self) -> f64 {
        self.velocity.norm_squared() / 2.0 - GAUSS_GRAV_SQUARED / self.position.norm()
    }

    /// Specific angular momentum `r × v` (AU²/day).
    pub fn angular_momentum(&self) -> Vector3<f64> {
        self.position.cross(&self.velocity)
    }
}
