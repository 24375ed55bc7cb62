use std::fmt;

use crate::{
    cometfit_errors::CometfitError,
    constants::{AstronomicalUnit, Day, Degree, Radian, DPI, GAUSS_GRAV_SQUARED, MJD, RADEG},
};

/// Classical orbital elements of a bound heliocentric orbit, referred to the
/// mean equator and equinox J2000.
///
/// Units:
/// * `semi_major_axis`: AU
/// * `eccentricity`: unitless, `0 ≤ e < 1`
/// * `inclination`: radians, `[0, π]`
/// * `ascending_node_longitude`: radians, `[0, 2π)`
/// * `periapsis_argument`: radians, `[0, 2π)`
/// * `perihelion_epoch`: MJD (TT) of a perihelion passage
///
/// The perihelion epoch plays the role of the element epoch: the mean anomaly is zero there.
/// A fit never mutates an `OrbitState` in place; every solver iteration builds a new one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitState {
    pub semi_major_axis: AstronomicalUnit,
    pub eccentricity: f64,
    pub inclination: Radian,
    pub ascending_node_longitude: Radian,
    pub periapsis_argument: Radian,
    pub perihelion_epoch: MJD,
}

impl OrbitState {
    /// Build a validated orbit state from elements in radians.
    ///
    /// Return
    /// ------
    /// * The orbit state, or [`CometfitError::BoundsViolation`] if any element lies outside
    ///   its physical domain (see [`OrbitState::validate`]).
    pub fn new(
        semi_major_axis: AstronomicalUnit,
        eccentricity: f64,
        inclination: Radian,
        ascending_node_longitude: Radian,
        periapsis_argument: Radian,
        perihelion_epoch: MJD,
    ) -> Result<Self, CometfitError> {
        let orbit = OrbitState {
            semi_major_axis,
            eccentricity,
            inclination,
            ascending_node_longitude,
            periapsis_argument,
            perihelion_epoch,
        };
        orbit.validate()?;
        Ok(orbit)
    }

    /// Build a validated orbit state from angles given in degrees.
    pub fn from_degrees(
        semi_major_axis: AstronomicalUnit,
        eccentricity: f64,
        inclination: Degree,
        ascending_node_longitude: Degree,
        periapsis_argument: Degree,
        perihelion_epoch: MJD,
    ) -> Result<Self, CometfitError> {
        OrbitState::new(
            semi_major_axis,
            eccentricity,
            inclination * RADEG,
            ascending_node_longitude * RADEG,
            periapsis_argument * RADEG,
            perihelion_epoch,
        )
    }

    /// Check the physical domain of every element.
    ///
    /// Rules
    /// -----
    /// * all elements are finite,
    /// * `a > 0` and `0 ≤ e < 1`, hence `a(1 - e) > 0`,
    /// * `0 ≤ i ≤ π`,
    /// * `0 ≤ Ω ≤ 2π` and `0 ≤ ω ≤ 2π` (the closed upper end matches the solver box).
    pub fn validate(&self) -> Result<(), CometfitError> {
        let values = [
            self.semi_major_axis,
            self.eccentricity,
            self.inclination,
            self.ascending_node_longitude,
            self.periapsis_argument,
            self.perihelion_epoch,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(CometfitError::BoundsViolation(format!(
                "non-finite orbital element in {values:?}"
            )));
        }
        if self.semi_major_axis <= 0.0 {
            return Err(CometfitError::BoundsViolation(format!(
                "semi-major axis must be positive, got {}",
                self.semi_major_axis
            )));
        }
        if !(0.0..1.0).contains(&self.eccentricity) {
            return Err(CometfitError::BoundsViolation(format!(
                "eccentricity must lie in [0, 1), got {}",
                self.eccentricity
            )));
        }
        if !(0.0..=std::f64::consts::PI).contains(&self.inclination) {
            return Err(CometfitError::BoundsViolation(format!(
                "inclination must lie in [0, π], got {}",
                self.inclination
            )));
        }
        for (name, angle) in [
            ("longitude of the ascending node", self.ascending_node_longitude),
            ("argument of perihelion", self.periapsis_argument),
        ] {
            if !(0.0..=DPI).contains(&angle) {
                return Err(CometfitError::BoundsViolation(format!(
                    "{name} must lie in [0, 2π], got {angle}"
                )));
            }
        }
        Ok(())
    }

    /// Mean motion `n = sqrt(k² / a³)` in radians per day.
    pub fn mean_motion(&self) -> f64 {
        (GAUSS_GRAV_SQUARED / self.semi_major_axis.powi(3)).sqrt()
    }

    /// Orbital period `2π·sqrt(a³ / k²)` in days.
    pub fn period(&self) -> Day {
        DPI / self.mean_motion()
    }

    /// Perihelion distance `q = a(1 - e)` in AU.
    pub fn perihelion_distance(&self) -> AstronomicalUnit {
        self.semi_major_axis * (1.0 - self.eccentricity)
    }

    /// Aphelion distance `Q = a(1 + e)` in AU.
    pub fn aphelion_distance(&self) -> AstronomicalUnit {
        self.semi_major_axis * (1.0 + self.eccentricity)
    }

    /// Mean anomaly (unreduced) at `time`, zero at the perihelion epoch.
    pub fn mean_anomaly_at(&self, time: MJD) -> Radian {
        self.mean_motion() * (time - self.perihelion_epoch)
    }
}

impl fmt::Display for OrbitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rad_to_deg = 180.0 / std::f64::consts::PI;
        writeln!(
            f,
            "Orbit State @ perihelion epoch (MJD): {:.6}",
            self.perihelion_epoch
        )?;
        writeln!(f, "-------------------------------------------")?;
        writeln!(
            f,
            "  a   (semi-major axis)       = {:.6} AU",
            self.semi_major_axis
        )?;
        writeln!(
            f,
            "  e   (eccentricity)          = {:.6}",
            self.eccentricity
        )?;
        writeln!(
            f,
            "  i   (inclination)           = {:.6} rad ({:.6}°)",
            self.inclination,
            self.inclination * rad_to_deg
        )?;
        writeln!(
            f,
            "  Ω   (longitude of node)     = {:.6} rad ({:.6}°)",
            self.ascending_node_longitude,
            self.ascending_node_longitude * rad_to_deg
        )?;
        write!(
            f,
            "  ω   (argument of periapsis) = {:.6} rad ({:.6}°)",
            self.periapsis_argument,
            self.periapsis_argument * rad_to_deg
        )
    }
}
