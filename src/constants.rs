//! # Constants and type definitions for Cometfit
//!
//! This module centralizes the **physical constants**, **conversion factors**, and **common type
//! aliases** used throughout the `cometfit` library.
//!
//! ## Overview
//!
//! - Astronomical constants (Gaussian gravitational constant, obliquity)
//! - Unit conversions (degrees ↔ radians, radians ↔ arcseconds, years ↔ days)
//! - Core type aliases used across the crate
//! - Container type for a set of observations
//!
//! Lengths are expressed in astronomical units and times in days everywhere in the crate,
//! so the heliocentric gravitational parameter is the Gaussian constant squared.

use crate::observations::Observation;
use smallvec::SmallVec;

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Number of days in a Julian year
pub const DAYS_PER_JULIAN_YEAR: f64 = 365.25;

/// MJD epoch of J2000.0 (2000-01-01 12:00:00 TT)
pub const T2000: f64 = 51544.5;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Arcseconds → radians
pub const RADSEC: f64 = std::f64::consts::PI / 648000.0;

/// Radians → arcseconds
pub const ARCSEC_PER_RAD: f64 = 648000.0 / std::f64::consts::PI;

/// Gaussian gravitational constant k (AU^(3/2) / day)
pub const GAUSS_GRAV: f64 = 0.01720209895;

/// k², the heliocentric gravitational parameter GM_sun in AU³/day²
pub const GAUSS_GRAV_SQUARED: f64 = GAUSS_GRAV * GAUSS_GRAV;

/// Mean obliquity of the ecliptic at J2000 (IAU 1980, 84381.448″) in radians
pub const OBLIQUITY_J2000: f64 = 84381.448 * RADSEC;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in arcseconds
pub type ArcSec = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in astronomical units
pub type AstronomicalUnit = f64;
/// Duration in days
pub type Day = f64;

/// Modified Julian Date (days, TT time scale)
pub type MJD = f64;

// -------------------------------------------------------------------------------------------------
// Data containers
// -------------------------------------------------------------------------------------------------

/// A small, inline-optimized container for the observations of a single object.
pub type Observations = SmallVec<[Observation; 8]>;
